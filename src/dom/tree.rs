//! Tree operations: create, append, detach, walk.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::event::Listener;
use super::node::{NodeData, NodeId, NodeKind};
use super::style::RunningTransition;
use super::timers::Clock;
use crate::geometry::Size;
use crate::layout::LayoutEngine;

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// The central DOM tree, backed by a slotmap arena.
///
/// All nodes live in a single `SlotMap`, connected or not. Parent/child
/// relationships are stored in secondary maps so lookup is O(1). A node is
/// *connected* when the document node is among its ancestors.
pub struct Dom {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    document: NodeId,
    pub(crate) listeners: SecondaryMap<NodeId, Vec<(String, Listener)>>,
    pub(crate) transitions: SecondaryMap<NodeId, Vec<RunningTransition>>,
    pub(crate) clock: Clock,
    pub(crate) layout: RefCell<LayoutEngine>,
    pub(crate) layout_dirty: Cell<bool>,
    pub(crate) viewport: Size,
    pub(crate) line_height: f32,
}

impl Dom {
    /// Create a DOM holding only the document node, with a 1024x768 viewport.
    pub fn new() -> Self {
        Self::with_viewport(Size::new(1024.0, 768.0), 16.0)
    }

    /// Create a DOM with the given viewport and text line height.
    pub fn with_viewport(viewport: Size, line_height: f32) -> Self {
        let mut nodes = SlotMap::with_key();
        let document = nodes.insert(NodeData::document());
        let mut children = SecondaryMap::new();
        children.insert(document, Vec::new());
        Self {
            nodes,
            children,
            parent: SecondaryMap::new(),
            document,
            listeners: SecondaryMap::new(),
            transitions: SecondaryMap::new(),
            clock: Clock::new(),
            layout: RefCell::new(LayoutEngine::new()),
            layout_dirty: Cell::new(true),
            viewport,
            line_height,
        }
    }

    /// The document node.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Create a detached node.
    pub fn create(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        id
    }

    /// Create a node and append it to `parent`.
    pub fn append_new(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.create(data);
        self.append_child(parent, id);
        id
    }

    /// Move `child` (with its subtree) to the end of `parent`'s children.
    ///
    /// Returns `false` without changing anything when the move would create a
    /// cycle, when `child` is the document, or when either node is unknown.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.contains(parent) || !self.contains(child) || child == self.document {
            return false;
        }
        if parent == child || self.ancestors(parent).contains(&child) {
            return false;
        }
        if self.nodes.get(parent).is_some_and(NodeData::is_text) {
            return false;
        }

        self.unlink(child);
        self.parent.insert(child, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.push(child);
        }
        self.invalidate_layout();
        true
    }

    /// Detach `node` from its parent, keeping its subtree intact.
    ///
    /// Running transitions in the subtree are cancelled without events.
    pub fn detach(&mut self, node: NodeId) {
        if !self.contains(node) || node == self.document {
            return;
        }
        if self.parent(node).is_none() {
            return;
        }
        for id in self.walk_depth_first(node) {
            self.transitions.remove(id);
        }
        self.unlink(node);
        self.invalidate_layout();
    }

    fn unlink(&mut self, node: NodeId) {
        if let Some(parent_id) = self.parent.remove(node) {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                siblings.retain(|&c| c != node);
            }
        }
    }

    /// Detach `node` and free it with its whole subtree.
    ///
    /// Freed ids go stale: lookups return `None` and a later node never
    /// reuses them. Returns how many nodes were freed.
    pub fn remove_subtree(&mut self, node: NodeId) -> usize {
        if !self.contains(node) || node == self.document {
            return 0;
        }
        self.detach(node);
        let subtree = self.walk_depth_first(node);
        for &id in &subtree {
            self.nodes.remove(id);
            self.children.remove(id);
            self.parent.remove(id);
            self.listeners.remove(id);
            self.transitions.remove(id);
        }
        subtree.len()
    }

    /// Remove every child of `node`, detaching them.
    pub fn clear_children(&mut self, node: NodeId) {
        for child in self.children(node).to_vec() {
            self.detach(child);
        }
    }

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Returns an empty slice if the node has no children
    /// or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to the topmost ancestor, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself; it starts with the
    /// immediate parent.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Whether `node` is in the document tree.
    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.document || self.ancestors(node).last() == Some(&self.document)
    }

    /// Whether `ancestor` is a proper ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        while let Some(p) = self.parent.get(current).copied() {
            if p == ancestor {
                return true;
            }
            current = p;
        }
        false
    }

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data. Invalidates layout.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.layout_dirty.set(true);
        self.nodes.get_mut(id)
    }

    /// Whether the DOM contains a node with the given id.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes in the arena, connected or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(NodeData::is_element)
    }

    /// Lowercase tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.get(id)
            .filter(|n| n.kind == NodeKind::Element)
            .map(|n| n.tag.as_str())
    }

    /// The parent, if it is an element.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    /// Element children in order.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    /// Element siblings of `id` (including `id`) in order. A detached node
    /// without a parent is its own only sibling.
    pub fn element_siblings(&self, id: NodeId) -> Vec<NodeId> {
        match self.parent(id) {
            Some(p) => self.element_children(p),
            None => vec![id],
        }
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.element_siblings(id);
        let pos = siblings.iter().position(|&s| s == id)?;
        pos.checked_sub(1).map(|i| siblings[i])
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.element_siblings(id);
        let pos = siblings.iter().position(|&s| s == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Pre-order depth-first traversal starting from `start` (inclusive).
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Breadth-first traversal starting from `start` (inclusive).
    pub fn walk_breadth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current) {
                queue.push_back(child);
            }
        }
        result
    }

    /// Element descendants of `root` in document order, excluding `root`.
    pub fn descendant_elements(&self, root: NodeId) -> Vec<NodeId> {
        self.walk_depth_first(root)
            .into_iter()
            .skip(1)
            .filter(|&id| self.is_element(id))
            .collect()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        self.walk_depth_first(id)
            .into_iter()
            .filter_map(|n| self.get(n).filter(|d| d.is_text()))
            .map(|d| d.text.as_str())
            .collect()
    }

    /// Replace the children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            if node.is_text() {
                node.text = text.to_string();
                self.invalidate_layout();
                return;
            }
        }
        self.clear_children(id);
        if !text.is_empty() {
            self.append_new(id, NodeData::text(text));
        }
    }

    /// Read an attribute of an element.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<String> {
        self.get(id).and_then(|n| n.attr(name))
    }

    /// Write an attribute of an element.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(id).filter(|n| n.is_element()) {
            node.set_attr(name, value);
            self.invalidate_layout();
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        let removed = self
            .nodes
            .get_mut(id)
            .is_some_and(|node| node.remove_attr(name));
        if removed {
            self.invalidate_layout();
        }
        removed
    }

    /// First connected element whose `id` attribute equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.walk_depth_first(self.document)
            .into_iter()
            .find(|&n| self.get(n).is_some_and(|d| d.is_element() && d.id() == Some(id)))
    }

    pub(crate) fn invalidate_layout(&self) {
        self.layout_dirty.set(true);
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
