//! # domkit
//!
//! A jQuery-style selection layer over an in-memory DOM.
//!
//! domkit wraps sets of matched nodes in a [`Selection`] with chainable
//! traversal, event binding, element data and property animation. Selector
//! strings may end in a jQuery pseudo-selector such as `:eq(2)`,
//! `:contains(text)` or `:visible`; everything else goes to the native
//! selector engine.
//!
//! ## Core Systems
//!
//! - **[`select`]** — Pseudo-selector resolver and query façade
//! - **[`event`]** — Event registry with namespaces, delegation and one-shot handlers
//! - **[`lifecycle`]** — Per-element data and animation state
//! - **[`page`]** / **[`selection`]** — Entry point and the matched-set handle
//! - **[`dom`]** — Slotmap-backed DOM arena: native queries, style, events, timers, HTML
//! - **[`css`]** — Selector tokenizer, parser and matcher; inline declarations; timing functions
//! - **[`layout`]** — Taffy-powered box measurement
//! - **[`testing`]** — Pilot, Recorder and snapshot helpers
//!
//! ## Example
//!
//! ```
//! use domkit::{Animation, Listener, Page};
//!
//! let page = Page::from_html(r#"<ul id="menu"><li>a</li><li>b</li><li>c</li></ul>"#).unwrap();
//! assert_eq!(page.select("li:eq(-1)").text(), "c");
//!
//! let clicked = Listener::new(|event| println!("clicked {:?}", event.target));
//! page.select("#menu").on_delegate("click.menu", "li:contains(b)", &clicked);
//! page.select("li").eq(1).trigger("click");
//!
//! page.select("li").animate(&Animation::new().property("opacity", 0).speed("fast"));
//! page.advance(1000);
//! assert!(!page.select("li").is_animating());
//! ```

// Foundation
pub mod config;
pub mod geometry;

// Host DOM
pub mod css;
pub mod dom;
pub mod layout;

// Core
pub mod event;
pub mod lifecycle;
pub mod select;

// Entry point
pub mod page;
pub mod selection;

pub mod testing;

pub use config::Config;
pub use dom::{Document, Event, Listener, NodeId};
pub use event::EventHub;
pub use lifecycle::{Animation, Speed};
pub use page::{Page, Target};
pub use select::{Mode, QueryError, Resolution};
pub use selection::Selection;
