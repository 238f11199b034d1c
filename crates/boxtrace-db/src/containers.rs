//! Container repository.

use chrono::Utc;
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use boxtrace_core::defaults::STATUS_UNKNOWN;
use boxtrace_core::{
    new_v7, parse_optional_timestamp, ContainerRecord, EntityFragment, Error, Result,
};

/// PostgreSQL container repository.
#[derive(Clone)]
pub struct PgContainerRepository {
    pool: Pool<Postgres>,
}

impl PgContainerRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Upsert a container fragment within a transaction, returning its
    /// surrogate key.
    ///
    /// `shipment_id` is the resolved surrogate key of the owning shipment,
    /// or None when the referenced shipment was not part of the
    /// notification. On conflict every attribute column is replaced,
    /// including the shipment reference.
    pub async fn upsert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        fragment: &EntityFragment,
        shipment_id: Option<Uuid>,
    ) -> Result<Uuid> {
        let external_id = fragment.external_id()?;
        let raw_json = serde_json::to_value(fragment)?;
        let now = Utc::now();

        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO containers (
                id, external_id, shipment_id,
                number, seal_number, equipment_type, equipment_length, equipment_height,
                pod_arrived_at, pod_discharged_at, pickup_lfd,
                available_for_pickup, current_status,
                raw_json, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
            ON CONFLICT (external_id) DO UPDATE SET
                shipment_id = EXCLUDED.shipment_id,
                number = EXCLUDED.number,
                seal_number = EXCLUDED.seal_number,
                equipment_type = EXCLUDED.equipment_type,
                equipment_length = EXCLUDED.equipment_length,
                equipment_height = EXCLUDED.equipment_height,
                pod_arrived_at = EXCLUDED.pod_arrived_at,
                pod_discharged_at = EXCLUDED.pod_discharged_at,
                pickup_lfd = EXCLUDED.pickup_lfd,
                available_for_pickup = EXCLUDED.available_for_pickup,
                current_status = EXCLUDED.current_status,
                raw_json = EXCLUDED.raw_json,
                updated_at = EXCLUDED.updated_at
            RETURNING id",
        )
        .bind(new_v7())
        .bind(external_id)
        .bind(shipment_id)
        .bind(fragment.attr_str("number"))
        .bind(fragment.attr_str("seal_number"))
        .bind(fragment.attr_str("equipment_type"))
        .bind(fragment.attr_i32("equipment_length"))
        .bind(fragment.attr_str("equipment_height"))
        .bind(parse_optional_timestamp(fragment.attr_str("pod_arrived_at")))
        .bind(parse_optional_timestamp(
            fragment.attr_str("pod_discharged_at"),
        ))
        .bind(parse_optional_timestamp(fragment.attr_str("pickup_lfd")))
        .bind(fragment.attr_bool("available_for_pickup"))
        .bind(fragment.attr_str_or("current_status", STATUS_UNKNOWN))
        .bind(&raw_json)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        tracing::debug!(
            subsystem = "db",
            db_table = "containers",
            external_id,
            container_id = %id,
            "Container upserted"
        );
        Ok(id)
    }

    /// Fetch a container by its external id.
    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<ContainerRecord>> {
        let row = sqlx::query(
            "SELECT id, external_id, shipment_id, number, seal_number, equipment_type,
                    equipment_length, equipment_height, pod_arrived_at, pod_discharged_at,
                    pickup_lfd, available_for_pickup, current_status,
                    raw_json, created_at, updated_at
             FROM containers WHERE external_id = $1",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| ContainerRecord {
            id: r.get("id"),
            external_id: r.get("external_id"),
            shipment_id: r.get("shipment_id"),
            number: r.get("number"),
            seal_number: r.get("seal_number"),
            equipment_type: r.get("equipment_type"),
            equipment_length: r.get("equipment_length"),
            equipment_height: r.get("equipment_height"),
            pod_arrived_at: r.get("pod_arrived_at"),
            pod_discharged_at: r.get("pod_discharged_at"),
            pickup_lfd: r.get("pickup_lfd"),
            available_for_pickup: r.get("available_for_pickup"),
            current_status: r.get("current_status"),
            raw_json: r.get("raw_json"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    /// Count stored containers (test and diagnostics helper).
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM containers")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}
