//! Relay queue repository.
//!
//! The durable queue between the inbound webhook path and the consumer is
//! a PostgreSQL table. The payload body is stored byte-for-byte as
//! received; routing metadata lives in attribute columns beside it so the
//! consumer can filter without deserializing the body.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use boxtrace_core::defaults::RELAY_MAX_DELIVERIES;
use boxtrace_core::{new_v7, Error, Result};

/// A claimed relay message.
#[derive(Debug, Clone)]
pub struct RelayMessage {
    pub id: Uuid,
    /// Dotted event category attribute.
    pub event_type: String,
    /// Correlation id minted on the inbound request.
    pub correlation_id: String,
    /// External notification id attribute, when the payload carried one.
    pub external_notification_id: Option<String>,
    /// Byte-exact payload as received by the webhook endpoint.
    pub payload: Vec<u8>,
    pub published_at: DateTime<Utc>,
    /// Delivery attempts so far, including the claim that produced this value.
    pub delivery_count: i32,
    pub max_deliveries: i32,
}

/// PostgreSQL relay queue repository.
#[derive(Clone)]
pub struct PgRelayRepository {
    pool: Pool<Postgres>,
}

impl PgRelayRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Publish a message: byte-exact payload plus attribute columns.
    pub async fn publish(
        &self,
        payload: &[u8],
        event_type: &str,
        correlation_id: &str,
        notification_id: Option<&str>,
    ) -> Result<Uuid> {
        let id = new_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO relay_queue (
                id, event_type, correlation_id, external_notification_id,
                source, payload, status, delivery_count, max_deliveries, published_at
            ) VALUES ($1, $2, $3, $4, $5, $6, 'pending', 0, $7, $8)",
        )
        .bind(id)
        .bind(event_type)
        .bind(correlation_id)
        .bind(notification_id)
        .bind("ingest")
        .bind(payload)
        .bind(RELAY_MAX_DELIVERIES)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    /// Claim the oldest pending message, if any.
    ///
    /// `FOR UPDATE SKIP LOCKED` lets concurrent consumers claim without
    /// blocking each other; the claim increments the delivery counter.
    pub async fn claim_next(&self) -> Result<Option<RelayMessage>> {
        let now = Utc::now();

        let row = sqlx::query(
            "UPDATE relay_queue
             SET status = 'processing', claimed_at = $1, delivery_count = delivery_count + 1
             WHERE id = (
                 SELECT id FROM relay_queue
                 WHERE status = 'pending'
                 ORDER BY published_at ASC
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING id, event_type, correlation_id, external_notification_id,
                       payload, published_at, delivery_count, max_deliveries",
        )
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| RelayMessage {
            id: r.get("id"),
            event_type: r.get("event_type"),
            correlation_id: r.get("correlation_id"),
            external_notification_id: r.get("external_notification_id"),
            payload: r.get("payload"),
            published_at: r.get("published_at"),
            delivery_count: r.get("delivery_count"),
            max_deliveries: r.get("max_deliveries"),
        }))
    }

    /// Mark a message as successfully consumed.
    pub async fn complete(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE relay_queue SET status = 'completed', completed_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Mark a message as failed.
    ///
    /// A retryable failure returns the message to `pending` until its
    /// delivery budget is exhausted (queue redelivery); a terminal failure
    /// parks it as `dead` immediately.
    pub async fn fail(&self, id: Uuid, error: &str, retryable: bool) -> Result<()> {
        sqlx::query(
            "UPDATE relay_queue
             SET status = CASE
                     WHEN $2 AND delivery_count < max_deliveries THEN 'pending'
                     ELSE 'dead'
                 END,
                 last_error = $3
             WHERE id = $1",
        )
        .bind(id)
        .bind(retryable)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Number of messages waiting to be claimed.
    pub async fn pending_count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM relay_queue WHERE status = 'pending'")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }

    /// Current status string of a message (test and diagnostics helper).
    pub async fn status(&self, id: Uuid) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT status FROM relay_queue WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
    }
}
