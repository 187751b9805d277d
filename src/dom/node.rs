//! Node types: NodeId, NodeKind, NodeData.

use slotmap::new_key_type;

use crate::css::declarations::{parse_inline_style, serialize_inline_style};

new_key_type! {
    /// Unique identifier for a DOM node. Copy, lightweight (u64).
    pub struct NodeId;
}

/// What kind of node a [`NodeData`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. There is exactly one per [`Dom`](super::Dom).
    Document,
    /// An element with a tag name, attributes and inline style.
    Element,
    /// A text node.
    Text,
}

/// Data associated with a single DOM node.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    /// Lowercase tag name; empty for non-elements.
    pub tag: String,
    /// Attributes in source order, excluding `style`.
    pub attributes: Vec<(String, String)>,
    /// Inline style declarations (the `style` attribute), kebab-case names.
    pub style: Vec<(String, String)>,
    /// Character data of a text node.
    pub text: String,
}

impl NodeData {
    fn blank(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: String::new(),
            attributes: Vec::new(),
            style: Vec::new(),
            text: String::new(),
        }
    }

    /// The document node.
    pub fn document() -> Self {
        Self::blank(NodeKind::Document)
    }

    /// A new element with the given tag (lowercased).
    pub fn element(tag: impl Into<String>) -> Self {
        let mut data = Self::blank(NodeKind::Element);
        data.tag = tag.into().to_ascii_lowercase();
        data
    }

    /// A new text node.
    pub fn text(text: impl Into<String>) -> Self {
        let mut data = Self::blank(NodeKind::Text);
        data.text = text.into();
        data
    }

    /// Set the `id` attribute (builder).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.set_attr("id", &id.into());
        self
    }

    /// Add a single CSS class (builder).
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class(&class.into());
        self
    }

    /// Set an attribute (builder).
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, &value.into());
        self
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Read an attribute. `style` is serialized from the inline declarations.
    pub fn attr(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        if name == "style" {
            if self.style.is_empty() {
                return None;
            }
            return Some(serialize_inline_style(&self.style));
        }
        self.attributes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
    }

    /// Borrowing attribute lookup; does not see `style`.
    pub fn attr_ref(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        if name == "style" {
            return !self.style.is_empty();
        }
        self.attributes.iter().any(|(n, _)| *n == name)
    }

    /// Write an attribute. `style` replaces the inline declarations.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if name == "style" {
            self.style = parse_inline_style(value);
            return;
        }
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attributes.push((name, value.to_string())),
        }
    }

    /// Remove an attribute. Returns whether it was present.
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        if name == "style" {
            let had = !self.style.is_empty();
            self.style.clear();
            return had;
        }
        let before = self.attributes.len();
        self.attributes.retain(|(n, _)| *n != name);
        before != self.attributes.len()
    }

    /// The `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attr_ref("id")
    }

    /// Classes from the `class` attribute, in order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr_ref("class").unwrap_or("").split_ascii_whitespace()
    }

    /// Check whether this node has a given CSS class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add a CSS class. No-op if already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut classes: Vec<&str> = self.classes().collect();
        classes.push(class);
        let value = classes.join(" ");
        self.set_attr("class", &value);
    }

    /// Remove a CSS class. No-op if not present.
    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let value = self.classes().filter(|c| *c != class).collect::<Vec<_>>().join(" ");
        self.set_attr("class", &value);
    }
}
