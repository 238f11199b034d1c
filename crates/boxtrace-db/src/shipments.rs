//! Shipment repository.

use chrono::Utc;
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use boxtrace_core::{
    new_v7, parse_optional_timestamp, EntityFragment, Error, Result, ShipmentRecord,
};

/// PostgreSQL shipment repository.
///
/// Shipments are upserted by external id: on conflict every attribute
/// column is replaced with the incoming value and `updated_at` refreshed,
/// while the surrogate key of the original row is preserved.
#[derive(Clone)]
pub struct PgShipmentRepository {
    pool: Pool<Postgres>,
}

impl PgShipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Upsert a shipment fragment within a transaction, returning its
    /// surrogate key.
    pub async fn upsert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        fragment: &EntityFragment,
    ) -> Result<Uuid> {
        let external_id = fragment.external_id()?;
        let raw_json = serde_json::to_value(fragment)?;
        let now = Utc::now();

        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO shipments (
                id, external_id,
                bill_of_lading_number, normalized_number, shipping_line_scac,
                port_of_lading_locode, port_of_discharge_locode, destination_locode,
                pod_vessel_name, pod_vessel_imo,
                pol_etd_at, pol_atd_at, pod_eta_at, pod_ata_at,
                raw_json, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)
            ON CONFLICT (external_id) DO UPDATE SET
                bill_of_lading_number = EXCLUDED.bill_of_lading_number,
                normalized_number = EXCLUDED.normalized_number,
                shipping_line_scac = EXCLUDED.shipping_line_scac,
                port_of_lading_locode = EXCLUDED.port_of_lading_locode,
                port_of_discharge_locode = EXCLUDED.port_of_discharge_locode,
                destination_locode = EXCLUDED.destination_locode,
                pod_vessel_name = EXCLUDED.pod_vessel_name,
                pod_vessel_imo = EXCLUDED.pod_vessel_imo,
                pol_etd_at = EXCLUDED.pol_etd_at,
                pol_atd_at = EXCLUDED.pol_atd_at,
                pod_eta_at = EXCLUDED.pod_eta_at,
                pod_ata_at = EXCLUDED.pod_ata_at,
                raw_json = EXCLUDED.raw_json,
                updated_at = EXCLUDED.updated_at
            RETURNING id",
        )
        .bind(new_v7())
        .bind(external_id)
        .bind(fragment.attr_str("bill_of_lading_number"))
        .bind(fragment.attr_str("normalized_number"))
        .bind(fragment.attr_str("shipping_line_scac"))
        .bind(fragment.attr_str("port_of_lading_locode"))
        .bind(fragment.attr_str("port_of_discharge_locode"))
        .bind(fragment.attr_str("destination_locode"))
        .bind(fragment.attr_str("pod_vessel_name"))
        .bind(fragment.attr_str("pod_vessel_imo"))
        .bind(parse_optional_timestamp(fragment.attr_str("pol_etd_at")))
        .bind(parse_optional_timestamp(fragment.attr_str("pol_atd_at")))
        .bind(parse_optional_timestamp(fragment.attr_str("pod_eta_at")))
        .bind(parse_optional_timestamp(fragment.attr_str("pod_ata_at")))
        .bind(&raw_json)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        tracing::debug!(
            subsystem = "db",
            db_table = "shipments",
            external_id,
            shipment_id = %id,
            "Shipment upserted"
        );
        Ok(id)
    }

    /// Fetch a shipment by its external id.
    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<ShipmentRecord>> {
        let row = sqlx::query(
            "SELECT id, external_id, bill_of_lading_number, normalized_number,
                    shipping_line_scac, port_of_lading_locode, port_of_discharge_locode,
                    destination_locode, pod_vessel_name, pod_vessel_imo,
                    pol_etd_at, pol_atd_at, pod_eta_at, pod_ata_at,
                    raw_json, created_at, updated_at
             FROM shipments WHERE external_id = $1",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| ShipmentRecord {
            id: r.get("id"),
            external_id: r.get("external_id"),
            bill_of_lading_number: r.get("bill_of_lading_number"),
            normalized_number: r.get("normalized_number"),
            shipping_line_scac: r.get("shipping_line_scac"),
            port_of_lading_locode: r.get("port_of_lading_locode"),
            port_of_discharge_locode: r.get("port_of_discharge_locode"),
            destination_locode: r.get("destination_locode"),
            pod_vessel_name: r.get("pod_vessel_name"),
            pod_vessel_imo: r.get("pod_vessel_imo"),
            pol_etd_at: r.get("pol_etd_at"),
            pol_atd_at: r.get("pol_atd_at"),
            pod_eta_at: r.get("pod_eta_at"),
            pod_ata_at: r.get("pod_ata_at"),
            raw_json: r.get("raw_json"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    /// Count stored shipments (test and diagnostics helper).
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM shipments")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}
