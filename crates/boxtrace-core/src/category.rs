//! Event category taxonomy.

use std::fmt;

/// Closed set of event categories this pipeline routes on.
///
/// Categories arrive as dotted strings (`container.transport.vessel_arrived`);
/// parsing is total — anything outside the known set maps to `Unrecognized`,
/// which is tracked through the delivery lifecycle but mutates no entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// `container.transport.*` — full entity graph plus transport event rows.
    ContainerTransport,
    /// `container.updated` — shipment + container upsert only.
    ContainerUpdated,
    /// `container.created` — shipment + container upsert only.
    ContainerCreated,
    /// `container.pickup_lfd.changed` — shipment + container upsert only.
    ContainerPickupLfdChanged,
    /// `shipment.estimated.arrival` — shipment upsert only.
    ShipmentEstimatedArrival,
    /// `tracking_request.*` — single tracking-request upsert from `data`.
    TrackingRequest,
    /// Anything else — tracked as a successful no-op.
    Unrecognized,
}

impl EventCategory {
    /// Parse a dotted category string into its routing variant.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("container.transport.") {
            return Self::ContainerTransport;
        }
        if raw.starts_with("tracking_request.") {
            return Self::TrackingRequest;
        }
        match raw {
            "container.updated" => Self::ContainerUpdated,
            "container.created" => Self::ContainerCreated,
            "container.pickup_lfd.changed" => Self::ContainerPickupLfdChanged,
            "shipment.estimated.arrival" => Self::ShipmentEstimatedArrival,
            _ => Self::Unrecognized,
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ContainerTransport => "container_transport",
            Self::ContainerUpdated => "container_updated",
            Self::ContainerCreated => "container_created",
            Self::ContainerPickupLfdChanged => "container_pickup_lfd_changed",
            Self::ShipmentEstimatedArrival => "shipment_estimated_arrival",
            Self::TrackingRequest => "tracking_request",
            Self::Unrecognized => "unrecognized",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_container_transport_prefix() {
        assert_eq!(
            EventCategory::parse("container.transport.vessel_arrived"),
            EventCategory::ContainerTransport
        );
        assert_eq!(
            EventCategory::parse("container.transport.rail_departed"),
            EventCategory::ContainerTransport
        );
    }

    #[test]
    fn test_parse_exact_matches() {
        assert_eq!(
            EventCategory::parse("container.updated"),
            EventCategory::ContainerUpdated
        );
        assert_eq!(
            EventCategory::parse("container.created"),
            EventCategory::ContainerCreated
        );
        assert_eq!(
            EventCategory::parse("container.pickup_lfd.changed"),
            EventCategory::ContainerPickupLfdChanged
        );
        assert_eq!(
            EventCategory::parse("shipment.estimated.arrival"),
            EventCategory::ShipmentEstimatedArrival
        );
    }

    #[test]
    fn test_parse_tracking_request_prefix() {
        for raw in [
            "tracking_request.succeeded",
            "tracking_request.failed",
            "tracking_request.awaiting_manifest",
            "tracking_request.tracking_stopped",
        ] {
            assert_eq!(EventCategory::parse(raw), EventCategory::TrackingRequest);
        }
    }

    #[test]
    fn test_parse_unrecognized() {
        assert_eq!(
            EventCategory::parse("shipment.created"),
            EventCategory::Unrecognized
        );
        assert_eq!(EventCategory::parse(""), EventCategory::Unrecognized);
        // Prefix matching requires the trailing dot segment
        assert_eq!(
            EventCategory::parse("container.transport"),
            EventCategory::Unrecognized
        );
        assert_eq!(
            EventCategory::parse("tracking_request"),
            EventCategory::Unrecognized
        );
    }

    #[test]
    fn test_display_names() {
        assert_eq!(
            EventCategory::ContainerTransport.to_string(),
            "container_transport"
        );
        assert_eq!(EventCategory::Unrecognized.to_string(), "unrecognized");
    }
}
