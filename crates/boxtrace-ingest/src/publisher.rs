//! Relay publisher.

use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::info;
use uuid::Uuid;

use boxtrace_core::defaults::PUBLISH_ACK_TIMEOUT_SECS;
use boxtrace_core::{Error, Result};
use boxtrace_db::Database;

/// Publishes verified payloads onto the relay queue.
///
/// This is the only synchronous point of failure exposed to the original
/// caller: the publish is awaited under a bounded timeout so the sender
/// gets a definitive success or failure (and retries on 5xx). Downstream
/// transformation failures are invisible here — the relay's redelivery
/// handles those.
pub struct RelayPublisher {
    db: Database,
    ack_timeout: Duration,
}

impl RelayPublisher {
    pub fn new(db: Database) -> Self {
        Self::with_timeout(db, Duration::from_secs(PUBLISH_ACK_TIMEOUT_SECS))
    }

    pub fn with_timeout(db: Database, ack_timeout: Duration) -> Self {
        Self { db, ack_timeout }
    }

    /// Publish the byte-exact payload with its routing attributes.
    ///
    /// The body is stored as received — no re-encoding — so the queued
    /// content stays signature-verifiable for audit.
    pub async fn publish(
        &self,
        payload: &[u8],
        event_type: &str,
        correlation_id: &str,
        notification_id: Option<&str>,
    ) -> Result<Uuid> {
        let start = Instant::now();

        let publish = self
            .db
            .relay
            .publish(payload, event_type, correlation_id, notification_id);

        let message_id = match timeout(self.ack_timeout, publish).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Publish(format!(
                    "acknowledgment not received within {}s",
                    self.ack_timeout.as_secs()
                )))
            }
        };

        info!(
            subsystem = "ingest",
            component = "publisher",
            op = "publish",
            request_id = correlation_id,
            event_type,
            message_id = %message_id,
            body_len = payload.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Event published to relay"
        );
        Ok(message_id)
    }
}
