//! Tunable default constants.

/// Maximum number of pooled database connections.
///
/// The consumer processes one notification per invocation and each
/// invocation holds one connection for the duration of its transaction, so
/// a small pool bounds concurrent transformations.
pub const POOL_MAX_CONNECTIONS: u32 = 5;

/// Minimum number of pooled database connections to keep warm.
pub const POOL_MIN_CONNECTIONS: u32 = 1;

/// Connection acquire timeout in seconds.
pub const POOL_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Idle connection timeout in seconds.
pub const POOL_IDLE_TIMEOUT_SECS: u64 = 600;

/// Bounded wait for relay publish acknowledgment, in seconds. The inbound
/// caller gets a definitive success/failure inside this window.
pub const PUBLISH_ACK_TIMEOUT_SECS: u64 = 5;

/// Consumer polling interval when the relay queue is empty, in milliseconds.
pub const CONSUMER_POLL_INTERVAL_MS: u64 = 500;

/// Delivery attempts before a relay message is parked as dead.
pub const RELAY_MAX_DELIVERIES: i32 = 5;

/// Maximum accepted webhook body size in bytes.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Sentinel stored when a status-like attribute is absent.
pub const STATUS_UNKNOWN: &str = "unknown";
