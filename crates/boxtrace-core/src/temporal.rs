//! Timestamp parsing for notification attributes.

use chrono::{DateTime, Utc};
use tracing::warn;

/// Parse an ISO-8601 timestamp string into a UTC timestamp.
///
/// The provider sends `2024-01-15T10:30:00Z`; explicit offsets are also
/// accepted. Unparseable input is a data-quality warning, never fatal —
/// callers persist NULL instead.
pub fn parse_event_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            warn!(timestamp = raw, error = %e, "Failed to parse timestamp");
            None
        }
    }
}

/// Parse an optional timestamp attribute, flattening absence and garbage
/// into `None`.
pub fn parse_optional_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_event_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_trailing_z() {
        let dt = parse_event_timestamp("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_explicit_offset() {
        let dt = parse_event_timestamp("2024-01-15T10:30:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let dt = parse_event_timestamp("2024-01-15T10:30:00.123Z").unwrap();
        assert_eq!(dt.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_parse_garbage_returns_none() {
        assert!(parse_event_timestamp("not-a-timestamp").is_none());
        assert!(parse_event_timestamp("2024-13-45T99:99:99Z").is_none());
        assert!(parse_event_timestamp("").is_none());
    }

    #[test]
    fn test_parse_optional() {
        assert!(parse_optional_timestamp(None).is_none());
        assert!(parse_optional_timestamp(Some("garbage")).is_none());
        assert!(parse_optional_timestamp(Some("2024-01-15T10:30:00Z")).is_some());
    }
}
