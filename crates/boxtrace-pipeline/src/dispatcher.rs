//! Event dispatcher.
//!
//! Routes a decoded notification to the right handling routine by event
//! category and brackets the work with delivery-state transitions. Entity
//! writes for one notification run inside a single transaction; the
//! delivery tracker writes outside it so a `failed` record survives the
//! rollback it describes.

use tracing::{info, warn};
use uuid::Uuid;

use boxtrace_core::{
    validate_or_generate, EventCategory, FragmentKind, NotificationDocument, ProcessingStatus,
    Result,
};
use boxtrace_db::Database;

use crate::resolver::{apply_entity_graph, upsert_shipments};

/// Counts reported after handling one notification.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub shipments_upserted: usize,
    pub containers_upserted: usize,
    pub tracking_requests_upserted: usize,
    pub events_inserted: usize,
    pub events_duplicate: usize,
    pub events_skipped: usize,
}

/// Routes notifications by event category and tracks their lifecycle.
pub struct EventDispatcher {
    db: Database,
}

impl EventDispatcher {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Process one notification end to end.
    ///
    /// Records `processing` before any handler work, `completed` after it
    /// all succeeds, and `failed` (with the error text) when a handler
    /// errors — then propagates the error so the relay redelivers.
    pub async fn dispatch(
        &self,
        raw_event: &str,
        doc: &NotificationDocument,
    ) -> Result<DispatchOutcome> {
        let (notification_id, synthetic) = validate_or_generate(doc.notification_id());
        if synthetic {
            warn!(
                subsystem = "pipeline",
                component = "dispatcher",
                raw_id = doc.notification_id().unwrap_or("(missing)"),
                notification_id = %notification_id,
                "Notification id missing or malformed, tracking under synthetic id"
            );
        }

        self.db
            .deliveries
            .record(notification_id, raw_event, ProcessingStatus::Processing, None)
            .await?;

        match self.apply(raw_event, doc).await {
            Ok(outcome) => {
                self.db
                    .deliveries
                    .record(notification_id, raw_event, ProcessingStatus::Completed, None)
                    .await?;
                info!(
                    subsystem = "pipeline",
                    component = "dispatcher",
                    notification_id = %notification_id,
                    event_type = raw_event,
                    shipments = outcome.shipments_upserted,
                    containers = outcome.containers_upserted,
                    events_inserted = outcome.events_inserted,
                    events_duplicate = outcome.events_duplicate,
                    events_skipped = outcome.events_skipped,
                    "Notification processed"
                );
                Ok(outcome)
            }
            Err(e) => {
                self.record_failure(notification_id, raw_event, &e).await;
                Err(e)
            }
        }
    }

    /// Route to the category handler inside one transaction.
    async fn apply(&self, raw_event: &str, doc: &NotificationDocument) -> Result<DispatchOutcome> {
        let category = EventCategory::parse(raw_event);
        let mut outcome = DispatchOutcome::default();
        let mut tx = self.db.begin().await?;

        match category {
            EventCategory::ContainerTransport => {
                let graph = apply_entity_graph(&self.db, &mut tx, doc, true).await?;
                outcome.shipments_upserted = graph.shipment_keys.len();
                outcome.containers_upserted = graph.container_keys.len();
                outcome.events_inserted = graph.events_inserted;
                outcome.events_duplicate = graph.events_duplicate;
                outcome.events_skipped = graph.events_skipped;
            }
            EventCategory::ContainerUpdated
            | EventCategory::ContainerCreated
            | EventCategory::ContainerPickupLfdChanged => {
                let graph = apply_entity_graph(&self.db, &mut tx, doc, false).await?;
                outcome.shipments_upserted = graph.shipment_keys.len();
                outcome.containers_upserted = graph.container_keys.len();
            }
            EventCategory::ShipmentEstimatedArrival => {
                let keys = upsert_shipments(&self.db, &mut tx, doc).await?;
                outcome.shipments_upserted = keys.len();
            }
            EventCategory::TrackingRequest => {
                // The tracked entity arrives as the top-level object, not in
                // `included`.
                if doc.data.kind == FragmentKind::TrackingRequest {
                    self.db.tracking_requests.upsert_tx(&mut tx, &doc.data).await?;
                    outcome.tracking_requests_upserted = 1;
                } else {
                    warn!(
                        subsystem = "pipeline",
                        component = "dispatcher",
                        event_type = raw_event,
                        "Tracking request event without tracking_request data"
                    );
                }
            }
            EventCategory::Unrecognized => {
                // Still fully tracked through the delivery lifecycle; no
                // entity mutation.
                warn!(
                    subsystem = "pipeline",
                    component = "dispatcher",
                    event_type = raw_event,
                    "Unrecognized event category, recording delivery only"
                );
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }

    /// Best-effort failure record; the handler error always wins.
    async fn record_failure(
        &self,
        notification_id: Uuid,
        raw_event: &str,
        error: &boxtrace_core::Error,
    ) {
        warn!(
            subsystem = "pipeline",
            component = "dispatcher",
            notification_id = %notification_id,
            event_type = raw_event,
            error = %error,
            "Notification processing failed"
        );
        if let Err(record_err) = self
            .db
            .deliveries
            .record(
                notification_id,
                raw_event,
                ProcessingStatus::Failed,
                Some(&error.to_string()),
            )
            .await
        {
            tracing::error!(
                subsystem = "pipeline",
                component = "dispatcher",
                notification_id = %notification_id,
                error = %record_err,
                "Failed to record delivery failure"
            );
        }
    }
}
