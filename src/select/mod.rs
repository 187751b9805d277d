//! Selector resolution on top of the native engine: jQuery-style pseudo
//! suffixes, the `#id` fast path and HTML construction.

pub mod pseudo;
pub mod resolve;

pub use pseudo::{split_pseudo, Pseudo, SelectorDescriptor};
pub use resolve::{matches, query, resolve, try_query, try_resolve, Mode, QueryError, Resolution};
