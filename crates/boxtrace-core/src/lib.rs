//! # boxtrace-core
//!
//! Core types, traits, and abstractions for the boxtrace ingestion pipeline.
//!
//! This crate provides the notification document model, the event category
//! taxonomy, the error type shared by every other crate, and small utilities
//! (timestamp parsing, identifier validation, logging field constants) that
//! the ingest and consumer paths both depend on.

pub mod category;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod notification;
pub mod records;
pub mod temporal;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use category::EventCategory;
pub use error::{Error, Result};
pub use notification::{
    EntityFragment, FragmentKind, NotificationDocument, Relationship, RelationshipRef,
    Relationships,
};
pub use records::{
    ContainerEventRecord, ContainerRecord, DeliveryRecord, ProcessingStatus, ShipmentRecord,
    TrackingRequestRecord,
};
pub use temporal::{parse_event_timestamp, parse_optional_timestamp};
pub use uuid_utils::{new_v7, validate_or_generate};
