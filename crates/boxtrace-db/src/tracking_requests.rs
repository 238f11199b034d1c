//! Tracking request repository.

use chrono::Utc;
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use boxtrace_core::defaults::STATUS_UNKNOWN;
use boxtrace_core::{new_v7, EntityFragment, Error, Result, TrackingRequestRecord};

/// PostgreSQL tracking request repository.
#[derive(Clone)]
pub struct PgTrackingRequestRepository {
    pool: Pool<Postgres>,
}

impl PgTrackingRequestRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Upsert a tracking request fragment within a transaction, returning
    /// its surrogate key.
    pub async fn upsert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        fragment: &EntityFragment,
    ) -> Result<Uuid> {
        let external_id = fragment.external_id()?;
        let raw_json = serde_json::to_value(fragment)?;
        let now = Utc::now();

        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO tracking_requests (
                id, external_id,
                request_number, request_type, scac, status, failed_reason,
                raw_json, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            ON CONFLICT (external_id) DO UPDATE SET
                request_number = EXCLUDED.request_number,
                request_type = EXCLUDED.request_type,
                scac = EXCLUDED.scac,
                status = EXCLUDED.status,
                failed_reason = EXCLUDED.failed_reason,
                raw_json = EXCLUDED.raw_json,
                updated_at = EXCLUDED.updated_at
            RETURNING id",
        )
        .bind(new_v7())
        .bind(external_id)
        .bind(fragment.attr_str("request_number"))
        .bind(fragment.attr_str("request_type"))
        .bind(fragment.attr_str("scac"))
        .bind(fragment.attr_str_or("status", STATUS_UNKNOWN))
        .bind(fragment.attr_str("failed_reason"))
        .bind(&raw_json)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        tracing::debug!(
            subsystem = "db",
            db_table = "tracking_requests",
            external_id,
            tracking_request_id = %id,
            "Tracking request upserted"
        );
        Ok(id)
    }

    /// Fetch a tracking request by its external id.
    pub async fn get_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<TrackingRequestRecord>> {
        let row = sqlx::query(
            "SELECT id, external_id, request_number, request_type, scac, status,
                    failed_reason, raw_json, created_at, updated_at
             FROM tracking_requests WHERE external_id = $1",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| TrackingRequestRecord {
            id: r.get("id"),
            external_id: r.get("external_id"),
            request_number: r.get("request_number"),
            request_type: r.get("request_type"),
            scac: r.get("scac"),
            status: r.get("status"),
            failed_reason: r.get("failed_reason"),
            raw_json: r.get("raw_json"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }
}
