//! Binding handlers to elements: registry bookkeeping plus host listeners.
//!
//! [`EventHub`] turns `on`/`one`/`off` requests into registry entries and
//! the listeners that back them. Intermediary listeners live inside the DOM,
//! so they only hold weak handles to the document and the registry.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::dom::document::{Document, WeakDocument};
use crate::dom::event::{Event, Listener};
use crate::dom::node::NodeId;
use crate::select;

use super::registry::{parse_event_specs, Entry, EntryId, EventRegistry};

/// Owns the registry for one document.
#[derive(Clone)]
pub struct EventHub {
    doc: Document,
    registry: Rc<RefCell<EventRegistry>>,
}

impl EventHub {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            registry: Rc::new(RefCell::new(EventRegistry::new())),
        }
    }

    /// Shared access to the registry.
    pub fn registry(&self) -> std::cell::Ref<'_, EventRegistry> {
        self.registry.borrow()
    }

    /// Bind `callback` on every element for every token of `spec`.
    ///
    /// With a `selector`, the handler only runs for events whose target is a
    /// descendant of the element matching `selector`. With `once`, the
    /// binding removes itself before the callback runs. Re-registering an
    /// identical binding is ignored.
    pub fn register(
        &self,
        elements: &[NodeId],
        spec: &str,
        selector: Option<&str>,
        callback: &Listener,
        once: bool,
    ) {
        let selector = selector.map(str::trim).filter(|s| !s.is_empty());
        for token in parse_event_specs(spec) {
            if token.event_type.is_empty() {
                tracing::warn!(spec, "ignoring event token without a type");
                continue;
            }
            for &element in elements {
                self.register_one(element, &token.event_type, &token.namespace, selector, callback, once);
            }
        }
    }

    fn register_one(
        &self,
        element: NodeId,
        event_type: &str,
        namespace: &str,
        selector: Option<&str>,
        callback: &Listener,
        once: bool,
    ) {
        let mut registry = self.registry.borrow_mut();
        if registry.contains(event_type, element, namespace, callback) {
            tracing::debug!(event_type, namespace, "duplicate registration ignored");
            return;
        }
        let id = registry.allocate_id();
        // The host deduplicates identical listeners, so a callback already
        // installed on this element for this type needs its own wrapper.
        let shared = registry.installs(event_type, element, callback);
        let installed = if selector.is_some() || once || shared {
            self.intermediary(id, element, event_type, selector, callback, once)
        } else {
            callback.clone()
        };
        let entry = Entry {
            id,
            element,
            callback: callback.clone(),
            namespace: namespace.to_string(),
            selector: selector.map(str::to_string),
            once,
            installed: installed.clone(),
        };
        if registry.insert(event_type, entry) {
            drop(registry);
            self.doc.borrow_mut().add_listener(element, event_type, installed);
        }
    }

    fn intermediary(
        &self,
        id: EntryId,
        element: NodeId,
        event_type: &str,
        selector: Option<&str>,
        callback: &Listener,
        once: bool,
    ) -> Listener {
        let doc = self.doc.downgrade();
        let registry = Rc::downgrade(&self.registry);
        let event_type = event_type.to_string();
        let selector = selector.map(str::to_string);
        let callback = callback.clone();
        Listener::new(move |event: &Event| {
            let Some(document) = doc.upgrade() else {
                return;
            };
            if let Some(selector) = &selector {
                if event.target == element {
                    return;
                }
                let delegated = select::matches(&document.borrow(), event.target, selector);
                if !delegated {
                    return;
                }
            }
            if once {
                retire_entry(&doc, &registry, &event_type, id);
            }
            callback.call(event);
        })
    }

    /// Unbind handlers from every element.
    ///
    /// `spec` of `None` (or blank) covers every known type. A token with a
    /// namespace but no type, such as `.menu`, covers every type within that
    /// namespace. With a `callback`, only bindings of that callback go.
    pub fn deregister(&self, elements: &[NodeId], spec: Option<&str>, callback: Option<&Listener>) {
        let tokens = spec.map(parse_event_specs).unwrap_or_default();
        let mut scopes: Vec<(Vec<String>, Option<String>)> = Vec::new();
        if tokens.is_empty() {
            scopes.push((self.registry.borrow().event_types(), None));
        }
        for token in tokens {
            let namespace = (!token.namespace.is_empty()).then_some(token.namespace);
            if token.event_type.is_empty() {
                if namespace.is_none() {
                    continue;
                }
                scopes.push((self.registry.borrow().event_types(), namespace));
            } else {
                scopes.push((vec![token.event_type], namespace));
            }
        }

        for (types, namespace) in scopes {
            for event_type in types {
                for &element in elements {
                    let removed = self.registry.borrow_mut().remove_matching(
                        &event_type,
                        element,
                        namespace.as_deref(),
                        callback,
                    );
                    uninstall(&self.doc, &event_type, &removed);
                }
            }
        }
    }

    /// Drop every binding of `element`.
    pub fn forget(&self, element: NodeId) {
        let removed = self.registry.borrow_mut().remove_element(element);
        let mut dom = self.doc.borrow_mut();
        for (event_type, entry) in removed {
            dom.remove_listener(entry.element, &event_type, &entry.installed);
        }
    }

    /// Number of bindings on `element`, across all types.
    pub fn binding_count(&self, element: NodeId) -> usize {
        let registry = self.registry.borrow();
        registry
            .event_types()
            .iter()
            .map(|ty| registry.entries(ty).iter().filter(|e| e.element == element).count())
            .sum()
    }
}

/// Uninstall the host listeners backing `entries`.
fn uninstall(doc: &Document, event_type: &str, entries: &[Entry]) {
    if entries.is_empty() {
        return;
    }
    let mut dom = doc.borrow_mut();
    for entry in entries {
        dom.remove_listener(entry.element, event_type, &entry.installed);
    }
}

/// One-shot removal, through the same path as `off`.
fn retire_entry(doc: &WeakDocument, registry: &Weak<RefCell<EventRegistry>>, event_type: &str, id: EntryId) {
    let (Some(doc), Some(registry)) = (doc.upgrade(), registry.upgrade()) else {
        return;
    };
    let removed: Vec<Entry> = registry
        .borrow_mut()
        .remove_by_id(event_type, id)
        .into_iter()
        .collect();
    uninstall(&doc, event_type, &removed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fragment::load_html;
    use crate::dom::tree::Dom;
    use std::cell::Cell;

    fn fixture() -> (Document, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        load_html(&mut dom, r#"<ul id="list"><li class="item">a</li><li>b</li></ul>"#).unwrap();
        let list = dom.get_element_by_id("list").unwrap();
        let items = dom.element_children(list);
        (Document::new(dom), list, items[0], items[1])
    }

    fn counter() -> (Rc<Cell<u32>>, Listener) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, Listener::new(move |_| c.set(c.get() + 1)))
    }

    #[test]
    fn plain_binding_installs_callback() {
        let (doc, list, ..) = fixture();
        let hub = EventHub::new(doc.clone());
        let (count, cb) = counter();
        hub.register(&[list], "click", None, &cb, false);
        assert!(doc.borrow().has_listener(list, "click", &cb));
        doc.dispatch(Event::new("click", list));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn delegation_checks_target() {
        let (doc, list, item, other) = fixture();
        let hub = EventHub::new(doc.clone());
        let (count, cb) = counter();
        hub.register(&[list], "click", Some(".item"), &cb, false);

        doc.dispatch(Event::new("click", item));
        assert_eq!(count.get(), 1);
        doc.dispatch(Event::new("click", other));
        doc.dispatch(Event::new("click", list));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn off_uninstalls_intermediary() {
        let (doc, list, item, _) = fixture();
        let hub = EventHub::new(doc.clone());
        let (count, cb) = counter();
        hub.register(&[list], "click", Some("li"), &cb, false);
        assert_eq!(doc.borrow().listener_count(list), 1);

        hub.deregister(&[list], Some("click"), Some(&cb));
        assert_eq!(doc.borrow().listener_count(list), 0);
        assert!(hub.registry().is_empty());
        doc.dispatch(Event::new("click", item));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn once_runs_once_under_reentrant_dispatch() {
        let (doc, list, ..) = fixture();
        let hub = EventHub::new(doc.clone());
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let weak = doc.downgrade();
        let cb = Listener::new(move |_| {
            c.set(c.get() + 1);
            if let Some(doc) = weak.upgrade() {
                doc.dispatch(Event::new("click", list));
            }
        });
        hub.register(&[list], "click", None, &cb, true);
        doc.dispatch(Event::new("click", list));
        doc.dispatch(Event::new("click", list));
        assert_eq!(count.get(), 1);
        assert!(hub.registry().is_empty());
        assert_eq!(doc.borrow().listener_count(list), 0);
    }

    #[test]
    fn namespaced_off_leaves_plain_handlers() {
        let (doc, list, ..) = fixture();
        let hub = EventHub::new(doc.clone());
        let (plain, plain_cb) = counter();
        let (spaced, spaced_cb) = counter();
        hub.register(&[list], "click", None, &plain_cb, false);
        hub.register(&[list], "click.ns", None, &spaced_cb, false);

        hub.deregister(&[list], Some("click.ns"), None);
        doc.dispatch(Event::new("click", list));
        assert_eq!((plain.get(), spaced.get()), (1, 0));
    }

    #[test]
    fn namespace_only_token_covers_every_type() {
        let (doc, list, ..) = fixture();
        let hub = EventHub::new(doc.clone());
        let (_, cb) = counter();
        hub.register(&[list], "click.ns keyup.ns focus", None, &cb, false);
        hub.deregister(&[list], Some(".ns"), None);
        assert_eq!(hub.registry().event_types(), vec!["focus".to_string()]);
        assert_eq!(doc.borrow().listener_count(list), 1);
    }

    #[test]
    fn same_callback_in_two_namespaces() {
        let (doc, list, ..) = fixture();
        let hub = EventHub::new(doc.clone());
        let (count, cb) = counter();
        hub.register(&[list], "click.a click.b", None, &cb, false);
        doc.dispatch(Event::new("click", list));
        assert_eq!(count.get(), 2);

        hub.deregister(&[list], Some("click.a"), None);
        doc.dispatch(Event::new("click", list));
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn empty_type_is_skipped() {
        let (doc, list, ..) = fixture();
        let hub = EventHub::new(doc);
        let (_, cb) = counter();
        hub.register(&[list], ".ns", None, &cb, false);
        assert!(hub.registry().is_empty());
    }

    #[test]
    fn forget_drops_everything() {
        let (doc, list, item, _) = fixture();
        let hub = EventHub::new(doc.clone());
        let (_, cb) = counter();
        hub.register(&[list, item], "click keyup", None, &cb, false);
        hub.register(&[list], "click.delegated", Some("li"), &cb, true);
        assert_eq!(hub.binding_count(list), 3);

        hub.forget(list);
        assert_eq!(hub.binding_count(list), 0);
        assert_eq!(doc.borrow().listener_count(list), 0);
        assert_eq!(hub.binding_count(item), 2);
    }
}
