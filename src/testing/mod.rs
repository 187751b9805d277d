//! Headless testing helpers: Pilot, Recorder, snapshot helpers.
//!
//! Use the [`Pilot`] to drive a [`Page`](crate::page::Page) by selector:
//! load HTML, click, dispatch events, advance the clock. Use a [`Recorder`]
//! to log which listeners and completion callbacks ran, and the snapshot
//! helpers to describe nodes compactly in assertions.

pub mod pilot;
pub mod snapshot;

pub use pilot::Pilot;
pub use snapshot::{describe, describe_all, outer_html, Recorder};
