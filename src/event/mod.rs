//! Event binding: a registry of bound handlers and the hub that installs
//! them on the host with namespaces, delegation and one-shot semantics.

pub mod hub;
pub mod registry;

pub use hub::EventHub;
pub use registry::{parse_event_spec, parse_event_specs, Entry, EntryId, EventRegistry, EventSpec};
