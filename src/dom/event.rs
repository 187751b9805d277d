//! Native events and listeners.
//!
//! A [`Listener`] is a reference-counted callback; two listeners are the same
//! listener when they share the same allocation. The host keeps listeners per
//! node and event type in registration order. Dispatch itself lives on
//! [`Document`](super::Document) because it must release the DOM borrow
//! around every callback.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::node::NodeId;
use super::tree::Dom;

/// A native event listener.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    /// Identity comparison: same allocation.
    pub fn ptr_eq(&self, other: &Listener) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0))
    }
}

/// An event travelling from its target up through the ancestors.
#[derive(Debug)]
pub struct Event {
    pub event_type: String,
    pub target: NodeId,
    current_target: Cell<NodeId>,
    pub bubbles: bool,
    /// Transitioned property for `transitionend` events.
    pub property_name: Option<String>,
    propagation_stopped: Cell<bool>,
    immediate_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl Event {
    /// A bubbling event of the given type.
    pub fn new(event_type: impl Into<String>, target: NodeId) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            current_target: Cell::new(target),
            bubbles: true,
            property_name: None,
            propagation_stopped: Cell::new(false),
            immediate_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    /// Make the event stay on its target (builder).
    pub fn non_bubbling(mut self) -> Self {
        self.bubbles = false;
        self
    }

    /// Attach a transitioned property name (builder).
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property_name = Some(property.into());
        self
    }

    /// The node whose listener is currently running.
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    pub(crate) fn set_current_target(&self, node: NodeId) {
        self.current_target.set(node);
    }

    /// Do not visit further ancestors.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Do not run any further listener, not even on the current node.
    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_stopped.set(true);
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub(crate) fn immediate_stopped(&self) -> bool {
        self.immediate_stopped.get()
    }
}

impl Dom {
    /// Install a listener. Installing the same listener for the same type
    /// twice is a no-op.
    pub fn add_listener(&mut self, node: NodeId, event_type: &str, listener: Listener) {
        if !self.contains(node) {
            return;
        }
        let Some(entry) = self.listeners.entry(node) else {
            return;
        };
        let list = entry.or_default();
        if list
            .iter()
            .any(|(ty, existing)| ty == event_type && existing.ptr_eq(&listener))
        {
            return;
        }
        list.push((event_type.to_string(), listener));
    }

    /// Uninstall a listener. Returns whether it was installed.
    pub fn remove_listener(&mut self, node: NodeId, event_type: &str, listener: &Listener) -> bool {
        let Some(list) = self.listeners.get_mut(node) else {
            return false;
        };
        let before = list.len();
        list.retain(|(ty, existing)| !(ty == event_type && existing.ptr_eq(listener)));
        let removed = list.len() != before;
        if list.is_empty() {
            self.listeners.remove(node);
        }
        removed
    }

    /// Whether `listener` is currently installed on `node` for `event_type`.
    pub fn has_listener(&self, node: NodeId, event_type: &str, listener: &Listener) -> bool {
        self.listeners.get(node).is_some_and(|list| {
            list.iter()
                .any(|(ty, existing)| ty == event_type && existing.ptr_eq(listener))
        })
    }

    /// Installed listeners of `node` for `event_type`, in installation order.
    pub fn listeners_for(&self, node: NodeId, event_type: &str) -> Vec<Listener> {
        self.listeners
            .get(node)
            .map(|list| {
                list.iter()
                    .filter(|(ty, _)| ty == event_type)
                    .map(|(_, l)| l.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of installed listeners on `node`.
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners.get(node).map_or(0, Vec::len)
    }

    /// Nodes an event on `target` visits: the target, then its ancestors.
    pub fn bubble_path(&self, target: NodeId, bubbles: bool) -> Vec<NodeId> {
        if !self.contains(target) {
            return Vec::new();
        }
        let mut path = vec![target];
        if bubbles {
            path.extend(self.ancestors(target));
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::NodeData;

    #[test]
    fn listener_identity() {
        let a = Listener::new(|_| {});
        let b = Listener::new(|_| {});
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn add_is_deduplicated() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let div = dom.append_new(doc, NodeData::element("div"));
        let l = Listener::new(|_| {});
        dom.add_listener(div, "click", l.clone());
        dom.add_listener(div, "click", l.clone());
        dom.add_listener(div, "keyup", l.clone());
        assert_eq!(dom.listener_count(div), 2);
        assert_eq!(dom.listeners_for(div, "click").len(), 1);
    }

    #[test]
    fn remove_only_matching_type() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let div = dom.append_new(doc, NodeData::element("div"));
        let l = Listener::new(|_| {});
        dom.add_listener(div, "click", l.clone());
        dom.add_listener(div, "keyup", l.clone());
        assert!(dom.remove_listener(div, "click", &l));
        assert!(!dom.remove_listener(div, "click", &l));
        assert!(dom.has_listener(div, "keyup", &l));
    }

    #[test]
    fn bubble_path_order() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let outer = dom.append_new(doc, NodeData::element("div"));
        let inner = dom.append_new(outer, NodeData::element("span"));
        assert_eq!(dom.bubble_path(inner, true), vec![inner, outer, doc]);
        assert_eq!(dom.bubble_path(inner, false), vec![inner]);
    }

    #[test]
    fn event_flags() {
        let dom = Dom::new();
        let ev = Event::new("click", dom.document());
        assert!(!ev.propagation_stopped());
        ev.stop_immediate_propagation();
        assert!(ev.propagation_stopped());
        assert!(ev.immediate_stopped());
        ev.prevent_default();
        assert!(ev.default_prevented());
    }
}
