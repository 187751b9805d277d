//! TaffyTree wrapper for layout computation.
//!
//! [`LayoutEngine`] synchronizes the connected part of the DOM to a taffy
//! layout tree, runs layout computation, and provides results as [`Region`]s.
//! Detached subtrees are never synced and so have no layout.

use std::collections::{HashMap, HashSet};

use taffy::prelude::*;

use crate::dom::node::{NodeId, NodeKind};
use crate::dom::tree::Dom;
use crate::geometry::{Region, Size as Viewport};

use super::resolve::{resolve_document_style, resolve_element_style, resolve_text_style};

/// Wraps a [`TaffyTree`] and maintains a mapping from DOM [`NodeId`]s to
/// taffy node ids.
pub struct LayoutEngine {
    /// The taffy tree, parameterized with our DOM NodeId as context data.
    tree: TaffyTree<NodeId>,
    /// Maps DOM NodeId -> taffy NodeId for quick lookup.
    node_map: HashMap<NodeId, taffy::prelude::NodeId>,
    /// The taffy root node, if a layout has been synced.
    root: Option<taffy::prelude::NodeId>,
}

impl LayoutEngine {
    /// Create a new, empty layout engine.
    pub fn new() -> Self {
        Self {
            tree: TaffyTree::new(),
            node_map: HashMap::new(),
            root: None,
        }
    }

    /// Synchronize the taffy tree with the document.
    ///
    /// Walks the DOM depth-first from the document node, creating or updating
    /// taffy nodes to match. Taffy nodes whose DOM node is gone or no longer
    /// connected are removed, and parent/child links are rebuilt.
    pub fn sync_tree(&mut self, dom: &Dom, viewport: Viewport, line_height: f32) {
        let document = dom.document();
        let live_nodes = dom.walk_depth_first(document);
        let live_set: HashSet<NodeId> = live_nodes.iter().copied().collect();

        let stale_keys: Vec<NodeId> = self
            .node_map
            .keys()
            .filter(|k| !live_set.contains(k))
            .copied()
            .collect();
        for key in stale_keys {
            if let Some(taffy_id) = self.node_map.remove(&key) {
                let _ = self.tree.remove(taffy_id);
            }
        }

        for &dom_id in &live_nodes {
            let Some(node) = dom.get(dom_id) else {
                continue;
            };
            let taffy_style = match node.kind {
                NodeKind::Document => resolve_document_style(viewport),
                NodeKind::Element => resolve_element_style(node, viewport),
                NodeKind::Text => resolve_text_style(&node.text, line_height),
            };

            if let Some(&taffy_id) = self.node_map.get(&dom_id) {
                if let Err(err) = self.tree.set_style(taffy_id, taffy_style) {
                    tracing::warn!(?dom_id, %err, "failed to update layout style");
                }
            } else {
                match self.tree.new_leaf_with_context(taffy_style, dom_id) {
                    Ok(taffy_id) => {
                        self.node_map.insert(dom_id, taffy_id);
                    }
                    Err(err) => tracing::warn!(?dom_id, %err, "failed to create layout node"),
                }
            }
        }

        for &dom_id in &live_nodes {
            let taffy_children: Vec<taffy::prelude::NodeId> = dom
                .children(dom_id)
                .iter()
                .filter_map(|child_id| self.node_map.get(child_id).copied())
                .collect();

            if let Some(&taffy_id) = self.node_map.get(&dom_id) {
                if let Err(err) = self.tree.set_children(taffy_id, &taffy_children) {
                    tracing::warn!(?dom_id, %err, "failed to link layout children");
                }
            }
        }

        self.root = self.node_map.get(&document).copied();
    }

    /// Run taffy layout computation on the root node.
    pub fn compute(&mut self, viewport: Viewport) {
        if let Some(root) = self.root {
            let result = self.tree.compute_layout(
                root,
                taffy::geometry::Size {
                    width: AvailableSpace::Definite(viewport.width),
                    height: AvailableSpace::Definite(viewport.height),
                },
            );
            if let Err(err) = result {
                tracing::warn!(%err, "layout computation failed");
            }
        }
    }

    /// Get the layout result for a single DOM node as a [`Region`].
    ///
    /// Returns `None` if the node is not in the layout tree.
    pub fn get_layout(&self, node: NodeId) -> Option<Region> {
        let taffy_id = self.node_map.get(&node)?;
        let layout = self.tree.layout(*taffy_id).ok()?;
        Some(Region::new(
            layout.location.x,
            layout.location.y,
            layout.size.width,
            layout.size.height,
        ))
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::NodeData;

    const VP: Viewport = Viewport::new(200.0, 100.0);

    fn computed(dom: &Dom) -> LayoutEngine {
        let mut engine = LayoutEngine::new();
        engine.sync_tree(dom, VP, 16.0);
        engine.compute(VP);
        engine
    }

    #[test]
    fn document_fills_viewport() {
        let dom = Dom::new();
        let engine = computed(&dom);
        let region = engine.get_layout(dom.document()).unwrap();
        assert_eq!(region.size(), VP);
    }

    #[test]
    fn blocks_stack_and_stretch() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let a = dom.append_new(doc, NodeData::element("div").with_attr("style", "height: 30px"));
        let b = dom.append_new(doc, NodeData::element("div").with_attr("style", "height: 20px"));
        let engine = computed(&dom);

        let ra = engine.get_layout(a).unwrap();
        let rb = engine.get_layout(b).unwrap();
        assert_eq!(ra, Region::new(0.0, 0.0, 200.0, 30.0));
        assert_eq!(rb, Region::new(0.0, 30.0, 200.0, 20.0));
    }

    #[test]
    fn text_gives_height() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let p = dom.append_new(doc, NodeData::element("p"));
        dom.append_new(p, NodeData::text("hello"));
        let engine = computed(&dom);
        assert_eq!(engine.get_layout(p).unwrap().height, 16.0);
    }

    #[test]
    fn display_none_collapses_subtree() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let outer = dom.append_new(doc, NodeData::element("div").with_attr("style", "display: none"));
        let inner = dom.append_new(outer, NodeData::element("div").with_attr("style", "height: 10px"));
        let engine = computed(&dom);
        assert!(!engine.get_layout(outer).unwrap().has_extent());
        assert!(!engine.get_layout(inner).unwrap().has_extent());
    }

    #[test]
    fn detached_nodes_have_no_layout() {
        let mut dom = Dom::new();
        let loose = dom.create(NodeData::element("div"));
        let engine = computed(&dom);
        assert!(engine.get_layout(loose).is_none());
    }

    #[test]
    fn resync_drops_removed_nodes() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let a = dom.append_new(doc, NodeData::element("div"));
        let mut engine = computed(&dom);
        assert!(engine.get_layout(a).is_some());

        dom.detach(a);
        engine.sync_tree(&dom, VP, 16.0);
        engine.compute(VP);
        assert!(engine.get_layout(a).is_none());
    }
}
