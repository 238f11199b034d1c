//! Notification document model.
//!
//! The upstream provider delivers JSON:API-shaped payloads: a top-level
//! `data` object describing the notification itself, and an `included`
//! collection of heterogeneous entity fragments (shipments, containers,
//! transport events, tracking requests) cross-referenced by external id
//! through `relationships` pointers.
//!
//! For most categories `data` has type `notification`; for
//! `tracking_request.*` categories the tracked entity itself arrives as
//! the top-level object. Both cases parse as an [`EntityFragment`].

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

/// Top-level webhook notification payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDocument {
    /// The notification object (or, for tracking-request categories, the
    /// tracked entity itself).
    pub data: EntityFragment,
    /// Entity fragments delivered alongside the notification.
    #[serde(default)]
    pub included: Vec<EntityFragment>,
}

/// Discriminator for entity fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Notification,
    Shipment,
    Container,
    TransportEvent,
    TrackingRequest,
    /// Any entity type this pipeline does not recognize.
    #[serde(other)]
    Other,
}

/// One typed entity fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityFragment {
    /// External id, unique within the fragment's type.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: FragmentKind,
    /// Attribute mapping; semantics vary per fragment type.
    #[serde(default)]
    pub attributes: JsonValue,
    /// Cross-references to other fragments by external id.
    #[serde(default)]
    pub relationships: Relationships,
}

/// Named relationship pointers of a fragment or notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relationships {
    #[serde(default)]
    pub shipment: Option<Relationship>,
    #[serde(default)]
    pub container: Option<Relationship>,
    #[serde(default)]
    pub transport_event: Option<Relationship>,
}

/// A single relationship, wrapping its resource reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<RelationshipRef>,
}

/// Reference to another entity by external id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRef {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl NotificationDocument {
    /// External notification id, when the payload carries one.
    pub fn notification_id(&self) -> Option<&str> {
        self.data.id.as_deref()
    }

    /// Declared event category string.
    pub fn event(&self) -> Option<&str> {
        self.data.attr_str("event")
    }

    /// Iterate the included fragments of one kind.
    pub fn fragments_of(&self, kind: FragmentKind) -> impl Iterator<Item = &EntityFragment> {
        self.included.iter().filter(move |f| f.kind == kind)
    }
}

impl Relationships {
    /// External id of the referenced shipment, if any.
    pub fn shipment_id(&self) -> Option<&str> {
        self.shipment
            .as_ref()
            .and_then(|r| r.data.as_ref())
            .map(|d| d.id.as_str())
    }

    /// External id of the referenced container, if any.
    pub fn container_id(&self) -> Option<&str> {
        self.container
            .as_ref()
            .and_then(|r| r.data.as_ref())
            .map(|d| d.id.as_str())
    }
}

impl EntityFragment {
    /// The fragment's external id, or a validation error when absent.
    ///
    /// A missing external id aborts the whole notification, not just the
    /// fragment: without it the row cannot be keyed idempotently.
    pub fn external_id(&self) -> Result<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::Validation(format!("{:?} fragment missing 'id' field", self.kind))
            })
    }

    /// String attribute, absent when missing or not a string.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }

    /// String attribute with a sentinel fallback for missing values.
    pub fn attr_str_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.attr_str(key).unwrap_or(fallback)
    }

    /// Boolean attribute, absent when missing or not a boolean.
    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(|v| v.as_bool())
    }

    /// Integer attribute, absent when missing or not a number.
    pub fn attr_i32(&self, key: &str) -> Option<i32> {
        self.attributes
            .get(key)
            .and_then(|v| v.as_i64())
            .map(|v| v as i32)
    }
}
