//! Structured logging schema and field name constants for boxtrace.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across the
//! inbound and consumer paths.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the inbound request through the relay
/// into the consumer. Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "ingest", "relay", "pipeline", "db"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "signature_gate", "publisher", "dispatcher", "pool", "consumer"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "verify", "publish", "dispatch", "claim_next"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// External notification id being processed.
pub const NOTIFICATION_ID: &str = "notification_id";

/// Dotted event category string from the payload.
pub const EVENT_TYPE: &str = "event_type";

/// Relay queue message UUID.
pub const MESSAGE_ID: &str = "message_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a payload body.
pub const BODY_LEN: &str = "body_len";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Database table or entity affected.
pub const DB_TABLE: &str = "db_table";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
