//! Selection: an ordered set of matched nodes with chainable operations.
//!
//! A selection never changes membership. Traversal and filtering return a
//! new selection; everything else acts on the nodes it holds and returns
//! `&Self` for chaining. Getters read the first node.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::css::declarations::with_default_unit;
use crate::dom::event::{Event, Listener};
use crate::dom::fragment::{inner_html, outer_html, parse_fragment};
use crate::dom::node::NodeId;
use crate::event::parse_event_spec;
use crate::lifecycle::Animation;
use crate::page::{Page, Target};
use crate::select::{self, pseudo, split_pseudo};

/// Matched nodes of one [`Page`].
#[derive(Debug, Clone)]
pub struct Selection {
    page: Page,
    nodes: Vec<NodeId>,
}

impl Selection {
    pub(crate) fn new(page: Page, nodes: Vec<NodeId>) -> Self {
        Self { page, nodes }
    }

    fn derive(&self, nodes: Vec<NodeId>) -> Selection {
        Selection::new(self.page.clone(), nodes)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node at `index`; negative counts from the end.
    pub fn get(&self, index: isize) -> Option<NodeId> {
        let index = if index < 0 {
            self.nodes.len().checked_sub(index.unsigned_abs())?
        } else {
            index as usize
        };
        self.nodes.get(index).copied()
    }

    // ── Traversal ────────────────────────────────────────────────────

    pub fn first(&self) -> Selection {
        self.eq(0)
    }

    pub fn last(&self) -> Selection {
        self.eq(-1)
    }

    /// The node at `index` as a selection; empty when out of range.
    pub fn eq(&self, index: isize) -> Selection {
        self.derive(self.get(index).into_iter().collect())
    }

    /// Descendants of every node matching `selector`, without duplicates.
    pub fn find(&self, selector: &str) -> Selection {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for &node in &self.nodes {
            let matches = self.page.resolve(selector, node, select::Mode::All).into_nodes();
            found.extend(matches.into_iter().filter(|n| seen.insert(*n)));
        }
        self.derive(found)
    }

    /// Nodes matching `selector`. A positional suffix such as `:even`
    /// indexes into the nodes matching the base.
    pub fn filter(&self, selector: &str) -> Selection {
        let dom = self.page.document().borrow();
        if let Some(descriptor) = split_pseudo(selector).filter(|d| d.pseudo.is_positional()) {
            let base: Vec<NodeId> = self
                .nodes
                .iter()
                .copied()
                .filter(|&n| select::matches(&dom, n, &descriptor.base))
                .collect();
            let kept = pseudo::apply(&dom, descriptor.pseudo, descriptor.arg.as_deref(), base)
                .unwrap_or_default();
            return self.derive(kept);
        }
        let kept = self
            .nodes
            .iter()
            .copied()
            .filter(|&n| select::matches(&dom, n, selector))
            .collect();
        self.derive(kept)
    }

    /// Whether any node matches `selector`.
    pub fn is(&self, selector: &str) -> bool {
        !self.filter(selector).is_empty()
    }

    /// Parent elements, without duplicates.
    pub fn parent(&self) -> Selection {
        let dom = self.page.document().borrow();
        let mut seen = HashSet::new();
        let parents = self
            .nodes
            .iter()
            .filter_map(|&n| dom.parent_element(n))
            .filter(|p| seen.insert(*p))
            .collect();
        self.derive(parents)
    }

    /// Element children, optionally filtered by `selector`.
    pub fn children(&self, selector: Option<&str>) -> Selection {
        let dom = self.page.document().borrow();
        let children = self
            .nodes
            .iter()
            .flat_map(|&n| dom.element_children(n))
            .filter(|&c| selector.is_none_or(|s| select::matches(&dom, c, s)))
            .collect();
        self.derive(children)
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Bind `callback` for each `type[.namespace]` token of `events`.
    pub fn on(&self, events: &str, callback: &Listener) -> &Self {
        self.page.events().register(&self.nodes, events, None, callback, false);
        self
    }

    /// Bind `callback` for events on descendants matching `selector`.
    pub fn on_delegate(&self, events: &str, selector: &str, callback: &Listener) -> &Self {
        self.page
            .events()
            .register(&self.nodes, events, Some(selector), callback, false);
        self
    }

    /// Like [`on`](Self::on), removed after the first call.
    pub fn one(&self, events: &str, callback: &Listener) -> &Self {
        self.page.events().register(&self.nodes, events, None, callback, true);
        self
    }

    /// Like [`on_delegate`](Self::on_delegate), removed after the first call.
    pub fn one_delegate(&self, events: &str, selector: &str, callback: &Listener) -> &Self {
        self.page
            .events()
            .register(&self.nodes, events, Some(selector), callback, true);
        self
    }

    /// Unbind handlers. `None` events covers every type; `.ns` covers every
    /// type in a namespace. With a callback, only its bindings go.
    pub fn off(&self, events: Option<&str>, callback: Option<&Listener>) -> &Self {
        self.page.events().deregister(&self.nodes, events, callback);
        self
    }

    /// Dispatch a bubbling event of `event_type` on every node. A namespace
    /// suffix is ignored.
    pub fn trigger(&self, event_type: &str) -> &Self {
        let spec = parse_event_spec(event_type.trim());
        if spec.event_type.is_empty() {
            return self;
        }
        for &node in &self.nodes {
            self.page.document().dispatch(Event::new(spec.event_type.clone(), node));
        }
        self
    }

    // ── Data ─────────────────────────────────────────────────────────

    /// Value of `key` on the first node.
    pub fn data(&self, key: &str) -> Option<Value> {
        let node = self.get(0)?;
        let dom = self.page.document().borrow();
        self.page.store().data(&dom, node, key)
    }

    /// Every key of the first node.
    pub fn data_all(&self) -> Map<String, Value> {
        let Some(node) = self.get(0) else {
            return Map::new();
        };
        let dom = self.page.document().borrow();
        self.page.store().data_all(&dom, node)
    }

    /// Store `value` under `key` on every node. Strings that are valid JSON
    /// read back parsed; see [`ElementStore::set_data`](crate::lifecycle::ElementStore::set_data).
    pub fn set_data(&self, key: &str, value: impl Into<Value>) -> &Self {
        let value = value.into();
        let mut store = self.page.store_cell().borrow_mut();
        for &node in &self.nodes {
            store.set_data(node, key, value.clone());
        }
        self
    }

    /// Remove `key`, or every key, from every node.
    pub fn remove_data(&self, key: Option<&str>) -> &Self {
        let mut dom = self.page.document().borrow_mut();
        let mut store = self.page.store_cell().borrow_mut();
        for &node in &self.nodes {
            store.remove_data(&mut dom, node, key);
        }
        self
    }

    // ── Animation ────────────────────────────────────────────────────

    pub fn animate(&self, animation: &Animation) -> &Self {
        self.page.animator().animate(&self.nodes, animation);
        self
    }

    /// Stop running animations; see [`Animator::stop`](crate::lifecycle::Animator::stop).
    pub fn stop(&self, jump_to_end: bool) -> &Self {
        self.page.animator().stop(&self.nodes, jump_to_end);
        self
    }

    /// Whether any node is animating.
    pub fn is_animating(&self) -> bool {
        self.nodes.iter().any(|&n| self.page.animator().is_animating(n))
    }

    // ── Attributes, style and content ────────────────────────────────

    /// Computed value of `property` on the first node.
    pub fn css(&self, property: &str) -> Option<String> {
        let node = self.get(0)?;
        Some(self.page.document().borrow().computed_style(node, property))
    }

    /// Set an inline declaration; bare numbers get `px` unless unitless.
    pub fn set_css(&self, property: &str, value: &str) -> &Self {
        let value = with_default_unit(property, value);
        let mut dom = self.page.document().borrow_mut();
        for &node in &self.nodes {
            dom.set_style(node, property, &value);
        }
        self
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        let node = self.get(0)?;
        self.page.document().borrow().attr(node, name)
    }

    pub fn set_attr(&self, name: &str, value: &str) -> &Self {
        let mut dom = self.page.document().borrow_mut();
        for &node in &self.nodes {
            dom.set_attr(node, name, value);
        }
        self
    }

    pub fn remove_attr(&self, name: &str) -> &Self {
        let mut dom = self.page.document().borrow_mut();
        for &node in &self.nodes {
            dom.remove_attr(node, name);
        }
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        let dom = self.page.document().borrow();
        self.nodes
            .iter()
            .any(|&n| dom.get(n).is_some_and(|d| d.has_class(class)))
    }

    pub fn add_class(&self, class: &str) -> &Self {
        let mut dom = self.page.document().borrow_mut();
        for &node in &self.nodes {
            if let Some(data) = dom.get_mut(node) {
                data.add_class(class);
            }
        }
        self
    }

    pub fn remove_class(&self, class: &str) -> &Self {
        let mut dom = self.page.document().borrow_mut();
        for &node in &self.nodes {
            if let Some(data) = dom.get_mut(node) {
                data.remove_class(class);
            }
        }
        self
    }

    /// Combined text content of every node.
    pub fn text(&self) -> String {
        let dom = self.page.document().borrow();
        self.nodes.iter().map(|&n| dom.text_content(n)).collect()
    }

    /// Replace the children of every node with one text node. The old
    /// children are released as by [`remove`](Self::remove).
    pub fn set_text(&self, text: &str) -> &Self {
        for &node in &self.nodes {
            self.clear_contents(node);
            self.page.document().borrow_mut().set_text_content(node, text);
        }
        self
    }

    /// Inner HTML of the first node.
    pub fn html(&self) -> Option<String> {
        let node = self.get(0)?;
        Some(inner_html(&self.page.document().borrow(), node))
    }

    /// Outer HTML of the first node.
    pub fn outer_html(&self) -> Option<String> {
        let node = self.get(0)?;
        Some(outer_html(&self.page.document().borrow(), node))
    }

    /// Replace the children of every node with `html`. The old children
    /// are released as by [`remove`](Self::remove). A fragment that fails to
    /// parse leaves the nodes untouched.
    pub fn set_html(&self, html: &str) -> &Self {
        for &node in &self.nodes {
            let parsed = parse_fragment(&mut self.page.document().borrow_mut(), html);
            let fresh = match parsed {
                Ok(fresh) => fresh,
                Err(err) => {
                    tracing::warn!(error = %err, "set_html: invalid fragment");
                    break;
                }
            };
            self.clear_contents(node);
            let mut dom = self.page.document().borrow_mut();
            for child in fresh {
                dom.append_child(node, child);
            }
        }
        self
    }

    /// Append `content` to the first node. Content that is already in the
    /// tree moves.
    pub fn append(&self, content: impl Into<Target>) -> &Self {
        let Some(parent) = self.get(0) else {
            return self;
        };
        let children = self.page.select(content);
        let mut dom = self.page.document().borrow_mut();
        for &child in children.nodes() {
            dom.detach(child);
            dom.append_child(parent, child);
        }
        self
    }

    /// Detach every node from the tree, stopping animations and dropping
    /// event bindings and data of the nodes and their descendants.
    pub fn remove(&self) -> &Self {
        for &node in &self.nodes {
            self.release(node);
            self.page.document().borrow_mut().detach(node);
        }
        self
    }

    /// Stop animations and drop the event bindings and data of `node` and
    /// its descendants.
    fn release(&self, node: NodeId) {
        let subtree = self.page.document().borrow().walk_depth_first(node);
        self.page.animator().stop(&subtree, false);
        for &n in &subtree {
            self.page.events().forget(n);
            self.page.store_cell().borrow_mut().forget(n);
        }
    }

    /// Release and detach every child of `node`.
    fn clear_contents(&self, node: NodeId) {
        let children = self.page.document().borrow().children(node).to_vec();
        for &child in &children {
            self.release(child);
        }
        self.page.document().borrow_mut().clear_children(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    const HTML: &str = r#"<ul id="list"><li class="a">one</li><li class="b">two</li><li class="a">three</li></ul><p id="out"></p>"#;

    fn page() -> Page {
        Page::from_html(HTML).unwrap()
    }

    fn counter() -> (Rc<Cell<u32>>, Listener) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, Listener::new(move |_| c.set(c.get() + 1)))
    }

    #[test]
    fn indexing() {
        let page = page();
        let items = page.select("li");
        assert_eq!(items.get(-1), items.get(2));
        assert_eq!(items.get(3), None);
        assert_eq!(items.get(-4), None);
        assert_eq!(items.last().text(), "three");
        assert!(items.eq(7).is_empty());
    }

    #[test]
    fn traversal_returns_new_selections() {
        let page = page();
        let list = page.select("#list");
        let items = list.find("li");
        assert_eq!(items.len(), 3);
        assert_eq!(list.len(), 1);
        assert_eq!(items.filter(".a").len(), 2);
        assert_eq!(items.filter(":odd").text(), "two");
        assert_eq!(items.filter(".a:last").text(), "three");
        assert!(items.is(":contains(two)"));
        assert_eq!(items.parent().nodes(), list.nodes());
        assert_eq!(list.children(Some(".b")).text(), "two");
    }

    #[test]
    fn trigger_reaches_handlers() {
        let page = page();
        let (count, cb) = counter();
        let items = page.select("li");
        items.on("click.test", &cb).trigger("click");
        assert_eq!(count.get(), 3);
        items.off(Some(".test"), None).trigger("click");
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn data_through_selection() {
        let page = page();
        let items = page.select("li");
        items.set_data("state", json!({"open": true}));
        assert_eq!(items.last().data("state"), Some(json!({"open": true})));
        items.remove_data(Some("state"));
        assert_eq!(items.data("state"), None);
    }

    #[test]
    fn content_wrappers() {
        let page = page();
        let out = page.select("#out");
        out.set_text("hi").add_class("ready").set_attr("title", "t").set_css("width", "40");
        assert_eq!(out.text(), "hi");
        assert!(out.has_class("ready"));
        assert_eq!(out.attr("title").as_deref(), Some("t"));
        assert_eq!(out.css("width").as_deref(), Some("40px"));

        out.set_html("<b>x</b>");
        assert_eq!(out.html().as_deref(), Some("<b>x</b>"));
        out.append("<i>y</i>");
        assert_eq!(out.find("i").text(), "y");
    }

    #[test]
    fn remove_drops_bindings_and_data() {
        let page = page();
        let list = page.select("#list");
        let items = page.select("li");
        let (count, cb) = counter();
        items.on("click", &cb).set_data("k", 1);
        list.on("click", &cb);

        list.remove();
        assert!(page.select("li").is_empty());
        assert!(page.events().registry().is_empty());
        assert_eq!(items.data("k"), None);
        items.trigger("click");
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn set_html_releases_replaced_children() {
        let page = page();
        let list = page.select("#list");
        let items = page.select("li");
        let (count, cb) = counter();
        items.on("click", &cb).set_data("k", 1);
        list.on("click.keep", &cb);

        list.set_html("<li>new</li>");
        assert_eq!(page.select("li").text(), "new");
        assert!(items.nodes().iter().all(|&n| page.events().binding_count(n) == 0));
        assert_eq!(items.data("k"), None);
        assert_eq!(page.events().registry().len(), 1);
        items.trigger("click");
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn set_text_releases_replaced_children() {
        let page = page();
        let items = page.select("li");
        let (count, cb) = counter();
        items.on("click", &cb).set_data("k", 1);

        page.select("#list").set_text("gone");
        assert!(page.events().registry().is_empty());
        assert_eq!(items.data("k"), None);
        items.trigger("click");
        assert_eq!(count.get(), 0);
        assert_eq!(page.select("#list").text(), "gone");
    }

    #[test]
    fn failed_set_html_keeps_children_bound() {
        let page = page();
        let items = page.select("li");
        let (count, cb) = counter();
        items.on("click", &cb);

        let deep = "<div>".repeat(crate::dom::fragment::MAX_DEPTH + 1);
        page.select("#list").set_html(&deep);
        assert_eq!(page.select("li").len(), 3);
        items.trigger("click");
        assert_eq!(count.get(), 3);
    }
}
