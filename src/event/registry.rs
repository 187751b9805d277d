//! Registration bookkeeping for bound handlers.
//!
//! [`EventRegistry`] maps an event type to the entries bound for it, in
//! registration order. It only records what was installed on the host; the
//! host owns dispatch. Installing and uninstalling the listeners themselves
//! is [`EventHub`](super::EventHub)'s job.

use std::collections::HashMap;

use crate::dom::event::Listener;
use crate::dom::node::NodeId;

// ---------------------------------------------------------------------------
// EventSpec
// ---------------------------------------------------------------------------

/// One `type[.namespace]` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpec {
    pub event_type: String,
    /// Everything after the first dot; empty when absent.
    pub namespace: String,
}

/// Parse a single token. `"click.menu.main"` has type `click` and namespace
/// `menu.main`.
pub fn parse_event_spec(token: &str) -> EventSpec {
    let (event_type, namespace) = token.split_once('.').unwrap_or((token, ""));
    EventSpec {
        event_type: event_type.to_string(),
        namespace: namespace.to_string(),
    }
}

/// Parse a whitespace-separated list of tokens.
pub fn parse_event_specs(spec: &str) -> Vec<EventSpec> {
    spec.split_whitespace().map(parse_event_spec).collect()
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// Stable identity of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u64);

/// One bound handler.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: EntryId,
    pub element: NodeId,
    /// The caller's callback; `off` matches against this.
    pub callback: Listener,
    pub namespace: String,
    /// Delegation selector.
    pub selector: Option<String>,
    pub once: bool,
    /// What is actually installed on the host: an intermediary when
    /// delegation, one-shot wrapping or a shared callback needs one,
    /// otherwise `callback` itself.
    pub installed: Listener,
}

impl Entry {
    /// Whether this entry is the same binding as `(element, namespace,
    /// callback)`.
    pub fn is_binding(&self, element: NodeId, namespace: &str, callback: &Listener) -> bool {
        self.element == element && self.namespace == namespace && self.callback.ptr_eq(callback)
    }

    /// The `off` filter: same element, and the callback and namespace when
    /// they were given.
    pub fn matches(&self, element: NodeId, namespace: Option<&str>, callback: Option<&Listener>) -> bool {
        self.element == element
            && callback.is_none_or(|cb| self.callback.ptr_eq(cb))
            && namespace.is_none_or(|ns| self.namespace == ns)
    }
}

// ---------------------------------------------------------------------------
// EventRegistry
// ---------------------------------------------------------------------------

/// Event type -> bound entries, in registration order.
#[derive(Debug, Default)]
pub struct EventRegistry {
    entries: HashMap<String, Vec<Entry>>,
    next_id: u64,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an id for an entry about to be built.
    pub fn allocate_id(&mut self) -> EntryId {
        self.next_id += 1;
        EntryId(self.next_id)
    }

    /// Whether an identical binding is already registered for `event_type`.
    pub fn contains(&self, event_type: &str, element: NodeId, namespace: &str, callback: &Listener) -> bool {
        self.entries(event_type)
            .iter()
            .any(|e| e.is_binding(element, namespace, callback))
    }

    /// Whether `listener` is already the installed listener of some entry
    /// of `element` for `event_type`.
    pub fn installs(&self, event_type: &str, element: NodeId, listener: &Listener) -> bool {
        self.entries(event_type)
            .iter()
            .any(|e| e.element == element && e.installed.ptr_eq(listener))
    }

    /// Append `entry`. Returns `false`, leaving the registry unchanged, when
    /// an identical binding already exists.
    pub fn insert(&mut self, event_type: &str, entry: Entry) -> bool {
        if self.contains(event_type, entry.element, &entry.namespace, &entry.callback) {
            tracing::debug!(event_type, namespace = %entry.namespace, "duplicate registration ignored");
            return false;
        }
        self.entries.entry(event_type.to_string()).or_default().push(entry);
        true
    }

    /// Entries for `event_type`, in registration order.
    pub fn entries(&self, event_type: &str) -> &[Entry] {
        self.entries.get(event_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Known event types, sorted.
    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.entries.keys().cloned().collect();
        types.sort();
        types
    }

    /// Remove every entry of `event_type` satisfying `predicate`.
    ///
    /// Walks the list from the back so earlier removals never shift entries
    /// still to be visited. The removed entries come back in registration
    /// order. An emptied type is pruned.
    pub fn remove_where(&mut self, event_type: &str, predicate: impl Fn(&Entry) -> bool) -> Vec<Entry> {
        let Some(list) = self.entries.get_mut(event_type) else {
            return Vec::new();
        };
        let mut removed = Vec::new();
        for index in (0..list.len()).rev() {
            if predicate(&list[index]) {
                removed.push(list.remove(index));
            }
        }
        removed.reverse();
        if list.is_empty() {
            self.entries.remove(event_type);
            tracing::debug!(event_type, "pruned empty event type");
        }
        removed
    }

    /// Remove the entries `off` would: see [`Entry::matches`].
    pub fn remove_matching(
        &mut self,
        event_type: &str,
        element: NodeId,
        namespace: Option<&str>,
        callback: Option<&Listener>,
    ) -> Vec<Entry> {
        self.remove_where(event_type, |e| e.matches(element, namespace, callback))
    }

    /// Remove one entry by id.
    pub fn remove_by_id(&mut self, event_type: &str, id: EntryId) -> Option<Entry> {
        self.remove_where(event_type, |e| e.id == id).pop()
    }

    /// Remove every entry bound on `element`, across all types.
    pub fn remove_element(&mut self, element: NodeId) -> Vec<(String, Entry)> {
        let mut removed = Vec::new();
        for event_type in self.event_types() {
            for entry in self.remove_where(&event_type, |e| e.element == element) {
                removed.push((event_type.clone(), entry));
            }
        }
        removed
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::NodeData;
    use crate::dom::tree::Dom;
    use pretty_assertions::assert_eq;

    fn two_elements() -> (NodeId, NodeId) {
        let mut dom = Dom::new();
        let doc = dom.document();
        let a = dom.append_new(doc, NodeData::element("div"));
        let b = dom.append_new(doc, NodeData::element("div"));
        (a, b)
    }

    fn entry(reg: &mut EventRegistry, element: NodeId, namespace: &str, callback: &Listener) -> Entry {
        Entry {
            id: reg.allocate_id(),
            element,
            callback: callback.clone(),
            namespace: namespace.to_string(),
            selector: None,
            once: false,
            installed: callback.clone(),
        }
    }

    // ── Spec parsing ─────────────────────────────────────────────────

    #[test]
    fn parse_tokens() {
        assert_eq!(
            parse_event_spec("click.menu.main"),
            EventSpec {
                event_type: "click".into(),
                namespace: "menu.main".into()
            }
        );
        assert_eq!(parse_event_spec("keyup").namespace, "");
        assert_eq!(parse_event_spec(".ns").event_type, "");
        let specs = parse_event_specs("  click.a   keyup ");
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].event_type, "keyup");
    }

    // ── Insert ───────────────────────────────────────────────────────

    #[test]
    fn insert_keeps_registration_order() {
        let (a, b) = two_elements();
        let mut reg = EventRegistry::new();
        let cb1 = Listener::new(|_| {});
        let cb2 = Listener::new(|_| {});
        let e1 = entry(&mut reg, a, "", &cb1);
        let e2 = entry(&mut reg, b, "", &cb2);
        assert!(reg.insert("click", e1));
        assert!(reg.insert("click", e2));
        let elements: Vec<NodeId> = reg.entries("click").iter().map(|e| e.element).collect();
        assert_eq!(elements, vec![a, b]);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn duplicate_binding_is_ignored() {
        let (a, _) = two_elements();
        let mut reg = EventRegistry::new();
        let cb = Listener::new(|_| {});
        let first = entry(&mut reg, a, "ns", &cb);
        let again = entry(&mut reg, a, "ns", &cb);
        let other_ns = entry(&mut reg, a, "other", &cb);
        assert!(reg.insert("click", first));
        assert!(!reg.insert("click", again));
        assert!(reg.insert("click", other_ns));
        assert_eq!(reg.len(), 2);
    }

    // ── Removal ──────────────────────────────────────────────────────

    #[test]
    fn remove_by_namespace_keeps_others_in_order() {
        let (a, _) = two_elements();
        let mut reg = EventRegistry::new();
        let cbs: Vec<Listener> = (0..4).map(|_| Listener::new(|_| {})).collect();
        for (i, cb) in cbs.iter().enumerate() {
            let ns = if i % 2 == 0 { "ns" } else { "" };
            let e = entry(&mut reg, a, ns, cb);
            reg.insert("click", e);
        }
        let removed = reg.remove_matching("click", a, Some("ns"), None);
        assert_eq!(removed.len(), 2);
        assert!(removed[0].callback.ptr_eq(&cbs[0]));
        assert!(removed[1].callback.ptr_eq(&cbs[2]));
        let left: Vec<bool> = reg
            .entries("click")
            .iter()
            .map(|e| e.callback.ptr_eq(&cbs[1]) || e.callback.ptr_eq(&cbs[3]))
            .collect();
        assert_eq!(left, vec![true, true]);
    }

    #[test]
    fn remove_by_callback_and_element() {
        let (a, b) = two_elements();
        let mut reg = EventRegistry::new();
        let cb = Listener::new(|_| {});
        let other = Listener::new(|_| {});
        for (el, listener) in [(a, &cb), (a, &other), (b, &cb)] {
            let e = entry(&mut reg, el, "", listener);
            reg.insert("click", e);
        }
        let removed = reg.remove_matching("click", a, None, Some(&cb));
        assert_eq!(removed.len(), 1);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn emptied_type_is_pruned() {
        let (a, _) = two_elements();
        let mut reg = EventRegistry::new();
        let cb = Listener::new(|_| {});
        let e = entry(&mut reg, a, "", &cb);
        reg.insert("click", e);
        let e = entry(&mut reg, a, "", &cb);
        reg.insert("keyup", e);
        assert_eq!(reg.event_types(), vec!["click".to_string(), "keyup".to_string()]);
        reg.remove_matching("click", a, None, None);
        assert_eq!(reg.event_types(), vec!["keyup".to_string()]);
        assert!(reg.entries("click").is_empty());
    }

    #[test]
    fn remove_by_id_and_element() {
        let (a, b) = two_elements();
        let mut reg = EventRegistry::new();
        let cb = Listener::new(|_| {});
        let e = entry(&mut reg, a, "", &cb);
        let id = e.id;
        reg.insert("click", e);
        let e = entry(&mut reg, b, "", &cb);
        reg.insert("click", e);
        let e = entry(&mut reg, b, "", &cb);
        reg.insert("keyup", e);

        assert_eq!(reg.remove_by_id("click", id).map(|e| e.element), Some(a));
        assert!(reg.remove_by_id("click", id).is_none());

        let removed = reg.remove_element(b);
        assert_eq!(removed.len(), 2);
        assert!(reg.is_empty());
    }

    #[test]
    fn remove_from_unknown_type() {
        let (a, _) = two_elements();
        let mut reg = EventRegistry::new();
        assert!(reg.remove_matching("click", a, None, None).is_empty());
        assert!(reg.is_empty());
    }
}
