//! Layout engine: taffy integration and inline style resolution.

pub mod engine;
pub mod resolve;

pub use engine::LayoutEngine;
