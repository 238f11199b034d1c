//! # boxtrace-pipeline
//!
//! The asynchronous consumer path: relay consumer loop, event dispatcher,
//! and entity graph resolver. The inbound webhook path publishes verified
//! payloads onto the relay queue; this crate drains it, routing each
//! notification by event category into idempotent, dependency-ordered
//! entity writes bracketed by delivery-state tracking.

pub mod consumer;
pub mod dispatcher;
pub mod resolver;

pub use consumer::{ConsumerConfig, ConsumerHandle, RelayConsumer};
pub use dispatcher::{DispatchOutcome, EventDispatcher};
pub use resolver::{apply_entity_graph, resolve_event_refs, ResolvedGraph};
