//! Snapshot helpers: compact node descriptions and call recording.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::event::{Event, Listener};
use crate::dom::fragment;
use crate::dom::node::NodeId;
use crate::dom::tree::Dom;
use crate::lifecycle::Completion;
use crate::selection::Selection;

// ---------------------------------------------------------------------------
// Node descriptions
// ---------------------------------------------------------------------------

/// Describe a node as `tag#id.class1.class2`, text nodes as `"text"`.
pub fn describe(dom: &Dom, node: NodeId) -> String {
    let Some(data) = dom.get(node) else {
        return "<stale>".to_string();
    };
    if data.is_text() {
        return format!("{:?}", data.text);
    }
    if !data.is_element() {
        return "#document".to_string();
    }
    let mut out = data.tag.clone();
    if let Some(id) = data.id() {
        out.push('#');
        out.push_str(id);
    }
    for class in data.classes() {
        out.push('.');
        out.push_str(class);
    }
    out
}

/// [`describe`] every node of a selection.
pub fn describe_all(selection: &Selection) -> Vec<String> {
    let dom = selection.page().document().borrow();
    selection.nodes().iter().map(|&n| describe(&dom, n)).collect()
}

/// Outer HTML of the first node of a selection; empty when it is empty.
pub fn outer_html(selection: &Selection) -> String {
    match selection.nodes().first() {
        Some(&node) => fragment::outer_html(&selection.page().document().borrow(), node),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Collects labels from the listeners and callbacks it hands out, in call
/// order. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    log: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener that records `label` each time it runs.
    pub fn listener(&self, label: &str) -> Listener {
        let log = self.log.clone();
        let label = label.to_string();
        Listener::new(move |_: &Event| log.borrow_mut().push(label.clone()))
    }

    /// A listener that records `label:<event type>` each time it runs.
    pub fn typed_listener(&self, label: &str) -> Listener {
        let log = self.log.clone();
        let label = label.to_string();
        Listener::new(move |event: &Event| log.borrow_mut().push(format!("{label}:{}", event.event_type)))
    }

    /// An animation completion callback that records `label`.
    pub fn completion(&self, label: &str) -> Completion {
        let log = self.log.clone();
        let label = label.to_string();
        Rc::new(move |_: NodeId| log.borrow_mut().push(label.clone()))
    }

    /// Record `label` directly.
    pub fn record(&self, label: &str) {
        self.log.borrow_mut().push(label.to_string());
    }

    /// Everything recorded so far.
    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    /// How many times `label` was recorded.
    pub fn count(&self, label: &str) -> usize {
        self.log.borrow().iter().filter(|l| *l == label).count()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
