//! Container transport event repository (append-only ledger).

use chrono::Utc;
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use boxtrace_core::defaults::STATUS_UNKNOWN;
use boxtrace_core::{
    new_v7, parse_optional_timestamp, ContainerEventRecord, EntityFragment, Error, Result,
};

/// PostgreSQL transport event repository.
///
/// Rows are append-only and deduplicated by external event id: redelivery
/// of the same event id leaves the pre-existing row untouched.
#[derive(Clone)]
pub struct PgContainerEventRepository {
    pool: Pool<Postgres>,
}

impl PgContainerEventRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a transport event within a transaction.
    ///
    /// Returns `Some(id)` for a fresh insert and `None` when a row with the
    /// same external event id already exists, so callers can report accurate
    /// counts without treating duplicates as errors.
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        fragment: &EntityFragment,
        container_id: Uuid,
        shipment_id: Option<Uuid>,
    ) -> Result<Option<Uuid>> {
        let external_id = fragment.external_id()?;
        let raw_json = serde_json::to_value(fragment)?;
        let now = Utc::now();

        let id: Option<Uuid> = sqlx::query_scalar(
            "INSERT INTO container_events (
                id, external_id, container_id, shipment_id,
                event_type, event_timestamp,
                location_locode, location_name,
                vessel_name, vessel_imo, voyage_number, data_source,
                raw_json, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (external_id) DO NOTHING
            RETURNING id",
        )
        .bind(new_v7())
        .bind(external_id)
        .bind(container_id)
        .bind(shipment_id)
        .bind(fragment.attr_str("event"))
        .bind(parse_optional_timestamp(fragment.attr_str("timestamp")))
        .bind(fragment.attr_str("location_locode"))
        .bind(fragment.attr_str("location_name"))
        .bind(fragment.attr_str("vessel_name"))
        .bind(fragment.attr_str("vessel_imo"))
        .bind(fragment.attr_str("voyage_number"))
        .bind(fragment.attr_str_or("data_source", STATUS_UNKNOWN))
        .bind(&raw_json)
        .bind(now)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;

        match id {
            Some(id) => {
                tracing::debug!(
                    subsystem = "db",
                    db_table = "container_events",
                    external_id,
                    event_id = %id,
                    "Transport event inserted"
                );
            }
            None => {
                tracing::debug!(
                    subsystem = "db",
                    db_table = "container_events",
                    external_id,
                    "Transport event already exists (duplicate delivery)"
                );
            }
        }
        Ok(id)
    }

    /// Fetch a transport event by its external id.
    pub async fn get_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ContainerEventRecord>> {
        let row = sqlx::query(
            "SELECT id, external_id, container_id, shipment_id, event_type, event_timestamp,
                    location_locode, location_name, vessel_name, vessel_imo, voyage_number,
                    data_source, raw_json, created_at
             FROM container_events WHERE external_id = $1",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| ContainerEventRecord {
            id: r.get("id"),
            external_id: r.get("external_id"),
            container_id: r.get("container_id"),
            shipment_id: r.get("shipment_id"),
            event_type: r.get("event_type"),
            event_timestamp: r.get("event_timestamp"),
            location_locode: r.get("location_locode"),
            location_name: r.get("location_name"),
            vessel_name: r.get("vessel_name"),
            vessel_imo: r.get("vessel_imo"),
            voyage_number: r.get("voyage_number"),
            data_source: r.get("data_source"),
            raw_json: r.get("raw_json"),
            created_at: r.get("created_at"),
        }))
    }

    /// Count events recorded for a container (test and diagnostics helper).
    pub async fn count_for_container(&self, container_id: Uuid) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM container_events WHERE container_id = $1")
            .bind(container_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}
