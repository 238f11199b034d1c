//! UUID helpers.

use uuid::Uuid;

/// Generate a UUIDv7 (time-ordered) identifier.
///
/// Surrogate keys and synthetic notification ids are v7 so they sort
/// chronologically, which keeps index pages warm and makes log correlation
/// trivial.
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Validate an external notification id, generating a synthetic one when
/// it is missing or malformed.
///
/// Returns the id plus whether it was synthesized, so the caller can emit
/// a data-quality warning — a malformed id must never make a notification
/// untrackable.
pub fn validate_or_generate(raw: Option<&str>) -> (Uuid, bool) {
    match raw.and_then(|s| Uuid::parse_str(s).ok()) {
        Some(id) => (id, false),
        None => (new_v7(), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_v7_is_v7() {
        assert_eq!(new_v7().get_version_num(), 7);
    }

    #[test]
    fn test_valid_uuid_passes_through() {
        let raw = "0195c7a2-1111-7def-8000-0123456789ab";
        let (id, synthetic) = validate_or_generate(Some(raw));
        assert_eq!(id, Uuid::parse_str(raw).unwrap());
        assert!(!synthetic);
    }

    #[test]
    fn test_missing_id_is_synthesized() {
        let (id, synthetic) = validate_or_generate(None);
        assert!(synthetic);
        assert_eq!(id.get_version_num(), 7);
    }

    #[test]
    fn test_malformed_id_is_synthesized() {
        let (_, synthetic) = validate_or_generate(Some("evt-12345"));
        assert!(synthetic);
    }

    #[test]
    fn test_synthetic_ids_are_unique() {
        let (a, _) = validate_or_generate(None);
        let (b, _) = validate_or_generate(None);
        assert_ne!(a, b);
    }
}
