//! Relay consumer loop.
//!
//! Claims messages from the relay queue, decodes them, and hands them to
//! the event dispatcher. One notification per invocation; failures either
//! return the message to the queue (retryable) or park it as dead
//! (terminal). The consumer never retries internally — redelivery is the
//! queue's job, idempotence is the correctness mechanism.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use boxtrace_core::defaults::CONSUMER_POLL_INTERVAL_MS;
use boxtrace_core::NotificationDocument;
use boxtrace_db::{Database, RelayMessage};

use crate::dispatcher::EventDispatcher;

/// Configuration for the relay consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Polling interval in milliseconds when the queue is empty.
    pub poll_interval_ms: u64,
    /// Whether to process messages at all.
    pub enabled: bool,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: CONSUMER_POLL_INTERVAL_MS,
            enabled: true,
        }
    }
}

impl ConsumerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CONSUMER_ENABLED` | `true` | Enable/disable message processing |
    /// | `CONSUMER_POLL_INTERVAL_MS` | `500` | Polling interval when queue is empty |
    pub fn from_env() -> Self {
        let enabled = std::env::var("CONSUMER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let poll_interval_ms = std::env::var("CONSUMER_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(CONSUMER_POLL_INTERVAL_MS);

        Self {
            poll_interval_ms,
            enabled,
        }
    }

    /// Create a new config with custom poll interval.
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Enable or disable message processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Handle for controlling a running consumer.
pub struct ConsumerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl ConsumerHandle {
    /// Signal the consumer to shut down gracefully.
    pub async fn shutdown(&self) -> boxtrace_core::Result<()> {
        self.shutdown_tx.send(()).await.map_err(|_| {
            boxtrace_core::Error::Internal("Failed to send shutdown signal".into())
        })?;
        Ok(())
    }
}

/// Consumer that processes relay messages from the queue.
pub struct RelayConsumer {
    db: Database,
    dispatcher: EventDispatcher,
    config: ConsumerConfig,
}

impl RelayConsumer {
    /// Create a new consumer over the given database.
    pub fn new(db: Database, config: ConsumerConfig) -> Self {
        let dispatcher = EventDispatcher::new(db.clone());
        Self {
            db,
            dispatcher,
            config,
        }
    }

    /// Start the consumer and return a handle for control.
    pub fn start(self) -> ConsumerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        ConsumerHandle { shutdown_tx }
    }

    /// Run the consumer loop.
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Relay consumer is disabled, not starting");
            return;
        }

        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            "Relay consumer started"
        );

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            if shutdown_rx.try_recv().is_ok() {
                info!("Relay consumer received shutdown signal");
                break;
            }

            match self.db.relay.claim_next().await {
                Ok(Some(message)) => {
                    self.process_message(message).await;
                    // Queue may have more — claim again immediately.
                }
                Ok(None) => {
                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            info!("Relay consumer received shutdown signal");
                            break;
                        }
                        _ = sleep(poll_interval) => {}
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to claim relay message");
                    sleep(poll_interval).await;
                }
            }
        }

        info!("Relay consumer stopped");
    }

    /// Process a single claimed message.
    pub async fn process_message(&self, message: RelayMessage) {
        let start = Instant::now();
        let message_id = message.id;

        info!(
            subsystem = "pipeline",
            component = "consumer",
            message_id = %message_id,
            event_type = %message.event_type,
            request_id = %message.correlation_id,
            delivery_count = message.delivery_count,
            "Processing relay message"
        );

        let doc: NotificationDocument = match serde_json::from_slice(&message.payload) {
            Ok(doc) => doc,
            Err(e) => {
                // Redelivering an unparseable payload can never succeed.
                warn!(
                    message_id = %message_id,
                    error = %e,
                    "Malformed relay payload, dropping without retry"
                );
                if let Err(fail_err) = self
                    .db
                    .relay
                    .fail(message_id, &format!("malformed payload: {e}"), false)
                    .await
                {
                    error!(error = %fail_err, message_id = %message_id, "Failed to park malformed message");
                }
                return;
            }
        };

        match self.dispatcher.dispatch(&message.event_type, &doc).await {
            Ok(_) => {
                if let Err(e) = self.db.relay.complete(message_id).await {
                    error!(error = %e, message_id = %message_id, "Failed to mark message as completed");
                } else {
                    info!(
                        subsystem = "pipeline",
                        component = "consumer",
                        message_id = %message_id,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Relay message completed"
                    );
                }
            }
            Err(e) => {
                let retryable = e.is_retryable();
                warn!(
                    message_id = %message_id,
                    error = %e,
                    retryable,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Relay message failed"
                );
                if let Err(fail_err) = self
                    .db
                    .relay
                    .fail(message_id, &e.to_string(), retryable)
                    .await
                {
                    error!(error = %fail_err, message_id = %message_id, "Failed to mark message as failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_config_default() {
        let config = ConsumerConfig::default();
        assert_eq!(config.poll_interval_ms, CONSUMER_POLL_INTERVAL_MS);
        assert!(config.enabled);
    }

    #[test]
    fn test_consumer_config_builder() {
        let config = ConsumerConfig::default()
            .with_poll_interval(1000)
            .with_enabled(false);

        assert_eq!(config.poll_interval_ms, 1000);
        assert!(!config.enabled);
    }
}
