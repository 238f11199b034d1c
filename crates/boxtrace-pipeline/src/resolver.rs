//! Entity graph resolution.
//!
//! Turns a notification's `included` collection into normalized rows in
//! dependency order: shipments first, then containers (resolving their
//! shipment references), then transport events (resolving container and
//! shipment references). All writes go through the caller's transaction so
//! one notification commits or rolls back as a unit.

use std::collections::HashMap;

use sqlx::{Postgres, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use boxtrace_core::{EntityFragment, FragmentKind, NotificationDocument, Result};
use boxtrace_db::Database;

/// External-id → surrogate-key maps and event counts produced by applying
/// one notification's entity graph.
#[derive(Debug, Default)]
pub struct ResolvedGraph {
    pub shipment_keys: HashMap<String, Uuid>,
    pub container_keys: HashMap<String, Uuid>,
    pub events_inserted: usize,
    pub events_duplicate: usize,
    pub events_skipped: usize,
}

/// Resolve a transport event's container and shipment references.
///
/// The fallback order is a fixed contract:
/// 1. the event fragment's own relationship pointer (direct reference);
/// 2. the relationships of the `transport_event` fragment in `included`
///    carrying the same external id — covers payloads where the event's
///    pointers live only on the included copy.
///
/// Each step returns an optional result; the first hit wins.
pub fn resolve_event_refs<'a>(
    event: &'a EntityFragment,
    included: &'a [EntityFragment],
) -> (Option<&'a str>, Option<&'a str>) {
    let nested = included
        .iter()
        .find(|f| f.kind == FragmentKind::TransportEvent && f.id.is_some() && f.id == event.id)
        .map(|f| &f.relationships);

    let container = event
        .relationships
        .container_id()
        .or_else(|| nested.and_then(|r| r.container_id()));
    let shipment = event
        .relationships
        .shipment_id()
        .or_else(|| nested.and_then(|r| r.shipment_id()));

    (container, shipment)
}

/// Upsert every shipment fragment, returning external id → surrogate key.
pub async fn upsert_shipments(
    db: &Database,
    tx: &mut Transaction<'_, Postgres>,
    doc: &NotificationDocument,
) -> Result<HashMap<String, Uuid>> {
    let mut keys = HashMap::new();
    for fragment in doc.fragments_of(FragmentKind::Shipment) {
        let external_id = fragment.external_id()?.to_string();
        let id = db.shipments.upsert_tx(tx, fragment).await?;
        keys.insert(external_id, id);
    }
    Ok(keys)
}

/// Upsert every container fragment, resolving shipment references against
/// the same-notification key map. A container whose referenced shipment was
/// not included gets a NULL shipment reference.
pub async fn upsert_containers(
    db: &Database,
    tx: &mut Transaction<'_, Postgres>,
    doc: &NotificationDocument,
    shipment_keys: &HashMap<String, Uuid>,
) -> Result<HashMap<String, Uuid>> {
    let mut keys = HashMap::new();
    for fragment in doc.fragments_of(FragmentKind::Container) {
        let external_id = fragment.external_id()?.to_string();
        let shipment_id = fragment
            .relationships
            .shipment_id()
            .and_then(|sid| shipment_keys.get(sid))
            .copied();
        let id = db.containers.upsert_tx(tx, fragment, shipment_id).await?;
        keys.insert(external_id, id);
    }
    Ok(keys)
}

/// Insert every transport event fragment, resolving references against the
/// resolved graph. Events whose container cannot be resolved are skipped
/// with a diagnostic — never attached to the wrong container.
pub async fn insert_transport_events(
    db: &Database,
    tx: &mut Transaction<'_, Postgres>,
    doc: &NotificationDocument,
    graph: &mut ResolvedGraph,
) -> Result<()> {
    for fragment in doc.fragments_of(FragmentKind::TransportEvent) {
        let external_id = fragment.external_id()?;
        let (container_ref, shipment_ref) = resolve_event_refs(fragment, &doc.included);

        let container_id = container_ref.and_then(|cid| graph.container_keys.get(cid)).copied();
        let shipment_id = shipment_ref.and_then(|sid| graph.shipment_keys.get(sid)).copied();

        let Some(container_id) = container_id else {
            warn!(
                subsystem = "pipeline",
                component = "resolver",
                event_external_id = external_id,
                container_ref = container_ref.unwrap_or("(none)"),
                "Transport event missing container reference, skipping"
            );
            graph.events_skipped += 1;
            continue;
        };

        match db
            .container_events
            .insert_tx(tx, fragment, container_id, shipment_id)
            .await?
        {
            Some(_) => graph.events_inserted += 1,
            None => graph.events_duplicate += 1,
        }
    }
    Ok(())
}

/// Apply the full entity graph in dependency order.
///
/// `include_events` is false for categories that update shipments and
/// containers without carrying transport history.
pub async fn apply_entity_graph(
    db: &Database,
    tx: &mut Transaction<'_, Postgres>,
    doc: &NotificationDocument,
    include_events: bool,
) -> Result<ResolvedGraph> {
    let mut graph = ResolvedGraph {
        shipment_keys: upsert_shipments(db, tx, doc).await?,
        ..Default::default()
    };
    graph.container_keys = upsert_containers(db, tx, doc, &graph.shipment_keys).await?;

    if include_events {
        insert_transport_events(db, tx, doc, &mut graph).await?;
    }

    debug!(
        subsystem = "pipeline",
        component = "resolver",
        shipments = graph.shipment_keys.len(),
        containers = graph.container_keys.len(),
        events_inserted = graph.events_inserted,
        events_duplicate = graph.events_duplicate,
        events_skipped = graph.events_skipped,
        "Entity graph applied"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fragment(value: serde_json::Value) -> EntityFragment {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_direct_relationship_wins() {
        let event = fragment(json!({
            "id": "evt-1",
            "type": "transport_event",
            "relationships": {
                "container": {"data": {"id": "cont-direct", "type": "container"}},
                "shipment": {"data": {"id": "ship-direct", "type": "shipment"}}
            }
        }));
        // An included copy with different pointers must not shadow the
        // direct relationship.
        let included = vec![fragment(json!({
            "id": "evt-1",
            "type": "transport_event",
            "relationships": {
                "container": {"data": {"id": "cont-nested", "type": "container"}},
                "shipment": {"data": {"id": "ship-nested", "type": "shipment"}}
            }
        }))];

        let (container, shipment) = resolve_event_refs(&event, &included);
        assert_eq!(container, Some("cont-direct"));
        assert_eq!(shipment, Some("ship-direct"));
    }

    #[test]
    fn test_nested_fallback_when_direct_absent() {
        let event = fragment(json!({
            "id": "evt-1",
            "type": "transport_event"
        }));
        let included = vec![fragment(json!({
            "id": "evt-1",
            "type": "transport_event",
            "relationships": {
                "container": {"data": {"id": "cont-nested", "type": "container"}}
            }
        }))];

        let (container, shipment) = resolve_event_refs(&event, &included);
        assert_eq!(container, Some("cont-nested"));
        assert_eq!(shipment, None);
    }

    #[test]
    fn test_fallbacks_resolve_independently() {
        // Direct container pointer, nested shipment pointer: each reference
        // walks the chain on its own.
        let event = fragment(json!({
            "id": "evt-1",
            "type": "transport_event",
            "relationships": {
                "container": {"data": {"id": "cont-direct", "type": "container"}}
            }
        }));
        let included = vec![fragment(json!({
            "id": "evt-1",
            "type": "transport_event",
            "relationships": {
                "shipment": {"data": {"id": "ship-nested", "type": "shipment"}}
            }
        }))];

        let (container, shipment) = resolve_event_refs(&event, &included);
        assert_eq!(container, Some("cont-direct"));
        assert_eq!(shipment, Some("ship-nested"));
    }

    #[test]
    fn test_no_reference_anywhere() {
        let event = fragment(json!({"id": "evt-1", "type": "transport_event"}));
        let (container, shipment) = resolve_event_refs(&event, &[]);
        assert_eq!(container, None);
        assert_eq!(shipment, None);
    }

    #[test]
    fn test_nested_lookup_ignores_other_kinds_and_ids() {
        let event = fragment(json!({"id": "evt-1", "type": "transport_event"}));
        let included = vec![
            // Same id, wrong kind
            fragment(json!({
                "id": "evt-1",
                "type": "container",
                "relationships": {"container": {"data": {"id": "cont-x", "type": "container"}}}
            })),
            // Right kind, different id
            fragment(json!({
                "id": "evt-2",
                "type": "transport_event",
                "relationships": {"container": {"data": {"id": "cont-y", "type": "container"}}}
            })),
        ];

        let (container, _) = resolve_event_refs(&event, &included);
        assert_eq!(container, None);
    }
}
