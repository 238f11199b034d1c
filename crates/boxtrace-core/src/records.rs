//! Row types for stored entities.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A stored shipment row.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentRecord {
    pub id: Uuid,
    pub external_id: String,
    pub bill_of_lading_number: Option<String>,
    pub normalized_number: Option<String>,
    pub shipping_line_scac: Option<String>,
    pub port_of_lading_locode: Option<String>,
    pub port_of_discharge_locode: Option<String>,
    pub destination_locode: Option<String>,
    pub pod_vessel_name: Option<String>,
    pub pod_vessel_imo: Option<String>,
    pub pol_etd_at: Option<DateTime<Utc>>,
    pub pol_atd_at: Option<DateTime<Utc>>,
    pub pod_eta_at: Option<DateTime<Utc>>,
    pub pod_ata_at: Option<DateTime<Utc>>,
    pub raw_json: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored container row.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerRecord {
    pub id: Uuid,
    pub external_id: String,
    /// Surrogate key of the owning shipment; null when the referenced
    /// shipment was not included in any notification seen so far.
    pub shipment_id: Option<Uuid>,
    pub number: Option<String>,
    pub seal_number: Option<String>,
    pub equipment_type: Option<String>,
    pub equipment_length: Option<i32>,
    pub equipment_height: Option<String>,
    pub pod_arrived_at: Option<DateTime<Utc>>,
    pub pod_discharged_at: Option<DateTime<Utc>>,
    pub pickup_lfd: Option<DateTime<Utc>>,
    pub available_for_pickup: Option<bool>,
    pub current_status: String,
    pub raw_json: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored transport event row. Append-only: created once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerEventRecord {
    pub id: Uuid,
    pub external_id: String,
    pub container_id: Uuid,
    pub shipment_id: Option<Uuid>,
    pub event_type: Option<String>,
    pub event_timestamp: Option<DateTime<Utc>>,
    pub location_locode: Option<String>,
    pub location_name: Option<String>,
    pub vessel_name: Option<String>,
    pub vessel_imo: Option<String>,
    pub voyage_number: Option<String>,
    pub data_source: String,
    pub raw_json: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// A stored tracking request row.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingRequestRecord {
    pub id: Uuid,
    pub external_id: String,
    pub request_number: Option<String>,
    pub request_type: Option<String>,
    pub scac: Option<String>,
    pub status: String,
    pub failed_reason: Option<String>,
    pub raw_json: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Processing lifecycle of one webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse from the database string representation.
    pub fn from_str(s: &str) -> Self {
        match s {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Processing,
        }
    }

    /// Terminal states carry a `processed_at` timestamp.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A delivery-tracking row, upserted by external notification id.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRecord {
    pub id: Uuid,
    pub external_notification_id: Uuid,
    pub event_type: String,
    pub processing_status: ProcessingStatus,
    pub processing_error: Option<String>,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_status_roundtrip() {
        for status in [
            ProcessingStatus::Processing,
            ProcessingStatus::Completed,
            ProcessingStatus::Failed,
        ] {
            assert_eq!(ProcessingStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn test_processing_status_unknown_string_falls_back() {
        assert_eq!(
            ProcessingStatus::from_str("garbage"),
            ProcessingStatus::Processing
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ProcessingStatus::Processing.is_terminal());
        assert!(ProcessingStatus::Completed.is_terminal());
        assert!(ProcessingStatus::Failed.is_terminal());
    }
}
