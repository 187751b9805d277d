//! Page: the entry point tying a document to its event registry, element
//! store and configuration.
//!
//! [`Page::select`] accepts anything a caller may want to wrap, as a
//! [`Target`], and resolves it once into a [`Selection`].

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::config::Config;
use crate::dom::document::Document;
use crate::dom::fragment::{load_html, FragmentError};
use crate::dom::node::NodeId;
use crate::dom::tree::Dom;
use crate::event::EventHub;
use crate::lifecycle::{Animator, ElementStore};
use crate::select::{self, Mode, QueryError, Resolution};
use crate::selection::Selection;

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// Anything [`Page::select`] can turn into a [`Selection`].
#[derive(Debug, Clone)]
pub enum Target {
    /// A selector, possibly ending in a pseudo suffix.
    Selector(String),
    /// An HTML fragment to build detached content from.
    Html(String),
    /// An existing node; the document node stands in for the document.
    Node(NodeId),
    Nodes(Vec<NodeId>),
    /// An existing selection, passed through.
    Selection(Selection),
}

impl From<&str> for Target {
    fn from(text: &str) -> Self {
        if text.trim_start().starts_with('<') {
            Target::Html(text.to_string())
        } else {
            Target::Selector(text.to_string())
        }
    }
}

impl From<String> for Target {
    fn from(text: String) -> Self {
        Target::from(text.as_str())
    }
}

impl From<NodeId> for Target {
    fn from(node: NodeId) -> Self {
        Target::Node(node)
    }
}

impl From<Vec<NodeId>> for Target {
    fn from(nodes: Vec<NodeId>) -> Self {
        Target::Nodes(nodes)
    }
}

impl From<&[NodeId]> for Target {
    fn from(nodes: &[NodeId]) -> Self {
        Target::Nodes(nodes.to_vec())
    }
}

impl From<Selection> for Target {
    fn from(selection: Selection) -> Self {
        Target::Selection(selection)
    }
}

impl From<&Selection> for Target {
    fn from(selection: &Selection) -> Self {
        Target::Selection(selection.clone())
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// A document plus the state bound to its elements.
///
/// Cloning is cheap; clones share everything.
#[derive(Clone)]
pub struct Page {
    doc: Document,
    events: EventHub,
    store: Rc<RefCell<ElementStore>>,
    animator: Animator,
    config: Rc<Config>,
}

impl Page {
    /// An empty page with the default config.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// An empty page with the given config.
    pub fn with_config(config: Config) -> Self {
        let doc = Document::new(Dom::with_viewport(config.viewport, config.line_height));
        let store = Rc::new(RefCell::new(ElementStore::new()));
        let config = Rc::new(config);
        Self {
            events: EventHub::new(doc.clone()),
            animator: Animator::new(doc.clone(), store.clone(), config.clone()),
            doc,
            store,
            config,
        }
    }

    /// A page whose document holds `html`.
    pub fn from_html(html: &str) -> Result<Self, FragmentError> {
        let page = Self::new();
        page.load(html)?;
        Ok(page)
    }

    /// Parse `html` and append it to the document.
    pub fn load(&self, html: &str) -> Result<Vec<NodeId>, FragmentError> {
        load_html(&mut self.doc.borrow_mut(), html)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.doc.root()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Shared access to element data and animation state.
    pub fn store(&self) -> Ref<'_, ElementStore> {
        self.store.borrow()
    }

    pub(crate) fn store_cell(&self) -> &RefCell<ElementStore> {
        &self.store
    }

    /// Wrap `target` in a selection.
    pub fn select(&self, target: impl Into<Target>) -> Selection {
        let nodes = match target.into() {
            Target::Selector(selector) | Target::Html(selector) => {
                self.resolve(&selector, self.root(), Mode::All).into_nodes()
            }
            Target::Node(node) => {
                if self.doc.borrow().contains(node) {
                    vec![node]
                } else {
                    Vec::new()
                }
            }
            Target::Nodes(nodes) => {
                let dom = self.doc.borrow();
                nodes.into_iter().filter(|&n| dom.contains(n)).collect()
            }
            Target::Selection(selection) => selection.nodes().to_vec(),
        };
        Selection::new(self.clone(), nodes)
    }

    /// Resolve `selector` below `context`.
    pub fn select_in(&self, selector: &str, context: NodeId) -> Selection {
        let nodes = self.resolve(selector, context, Mode::All).into_nodes();
        Selection::new(self.clone(), nodes)
    }

    /// See [`select::resolve`].
    pub fn resolve(&self, selector: &str, context: NodeId, mode: Mode) -> Resolution {
        select::resolve(&self.doc, selector, context, mode)
    }

    /// See [`select::try_resolve`].
    pub fn try_resolve(&self, selector: &str, context: NodeId, mode: Mode) -> Result<Resolution, QueryError> {
        select::try_resolve(&self.doc, selector, context, mode)
    }

    /// Move virtual time forward, running transitions and timers.
    pub fn advance(&self, ms: u64) {
        self.doc.advance(ms);
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.doc.now()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("nodes", &self.doc.borrow().len())
            .field("bindings", &self.events.registry().len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HTML: &str = r#"<div id="app"><p class="a">one</p><p class="b">two</p></div>"#;

    #[test]
    fn target_from_text() {
        assert!(matches!(Target::from("p.a"), Target::Selector(_)));
        assert!(matches!(Target::from("  <b>x</b>"), Target::Html(_)));
        assert!(matches!(Target::from(String::from("<i></i>")), Target::Html(_)));
    }

    #[test]
    fn select_each_target_kind() {
        let page = Page::from_html(HTML).unwrap();
        let ps = page.select("p");
        assert_eq!(ps.len(), 2);

        let first = ps.nodes()[0];
        assert_eq!(page.select(first).nodes(), &[first]);
        assert_eq!(page.select(ps.nodes().to_vec()).len(), 2);
        assert_eq!(page.select(&ps).nodes(), ps.nodes());
        assert_eq!(page.select(page.root()).len(), 1);

        let built = page.select("<span>new</span>");
        assert_eq!(built.len(), 1);
        assert!(!page.document().borrow().is_connected(built.nodes()[0]));
    }

    #[test]
    fn select_in_context() {
        let page = Page::from_html(HTML).unwrap();
        let app = page.select("#app").nodes()[0];
        assert_eq!(page.select_in("p:last", app).len(), 1);
        assert!(page.select_in("#app", app).is_empty());
    }

    #[test]
    fn invalid_selector_gives_empty_selection() {
        let page = Page::from_html(HTML).unwrap();
        assert!(page.select("p >").is_empty());
        assert!(page.select("").is_empty());
    }

    #[test]
    fn config_reaches_the_dom() {
        let page = Page::with_config(Config::new().with_viewport(320.0, 200.0));
        page.load(r#"<div id="x"></div>"#).unwrap();
        let x = page.select("#x").nodes()[0];
        assert_eq!(page.document().borrow().computed_style(x, "width"), "320px");
    }
}
