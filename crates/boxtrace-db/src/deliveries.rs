//! Delivery state tracker repository.

use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use boxtrace_core::{new_v7, DeliveryRecord, Error, ProcessingStatus, Result};

/// PostgreSQL webhook delivery tracker.
///
/// One row per external notification id, upserted on every lifecycle
/// transition so the latest attempt's outcome always wins. Writes run on
/// their own pool connection, never inside the entity transaction: a
/// `failed` record must survive the rollback of the entity writes it
/// describes.
#[derive(Clone)]
pub struct PgDeliveryRepository {
    pool: Pool<Postgres>,
}

impl PgDeliveryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record a lifecycle transition for a notification.
    ///
    /// `processed_at` is stamped only on terminal states (`completed`,
    /// `failed`); it stays NULL while the notification is `processing`.
    pub async fn record(
        &self,
        notification_id: Uuid,
        event_type: &str,
        status: ProcessingStatus,
        error: Option<&str>,
    ) -> Result<Uuid> {
        let now = Utc::now();
        let processed_at = status.is_terminal().then_some(now);

        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO webhook_deliveries (
                id, external_notification_id, event_type,
                processing_status, processing_error, received_at, processed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (external_notification_id) DO UPDATE SET
                processing_status = EXCLUDED.processing_status,
                processing_error = EXCLUDED.processing_error,
                processed_at = EXCLUDED.processed_at
            RETURNING id",
        )
        .bind(new_v7())
        .bind(notification_id)
        .bind(event_type)
        .bind(status.as_str())
        .bind(error)
        .bind(now)
        .bind(processed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        tracing::debug!(
            subsystem = "db",
            db_table = "webhook_deliveries",
            notification_id = %notification_id,
            status = status.as_str(),
            "Delivery state recorded"
        );
        Ok(id)
    }

    /// Fetch the delivery record for a notification.
    pub async fn get(&self, notification_id: Uuid) -> Result<Option<DeliveryRecord>> {
        let row = sqlx::query(
            "SELECT id, external_notification_id, event_type, processing_status,
                    processing_error, received_at, processed_at
             FROM webhook_deliveries WHERE external_notification_id = $1",
        )
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| DeliveryRecord {
            id: r.get("id"),
            external_notification_id: r.get("external_notification_id"),
            event_type: r.get("event_type"),
            processing_status: ProcessingStatus::from_str(r.get::<String, _>("processing_status").as_str()),
            processing_error: r.get("processing_error"),
            received_at: r.get("received_at"),
            processed_at: r.get("processed_at"),
        }))
    }
}
