//! Host DOM: slotmap-backed node arena with a native selector engine,
//! computed style, transitions, events and a virtual clock.

pub mod node;
pub mod tree;
pub mod query;
pub mod style;
pub mod event;
pub mod timers;
pub mod document;
pub mod fragment;

pub use document::{Document, WeakDocument};
pub use event::{Event, Listener};
pub use fragment::FragmentError;
pub use node::{NodeData, NodeId, NodeKind};
pub use timers::TimerId;
pub use tree::Dom;
