//! Native selector queries: query all, query first, element matches.

use super::node::NodeId;
use super::tree::Dom;
use crate::css::matching::matches_list;
use crate::css::model::SelectorList;
use crate::css::parser::{parse_selector_list, SelectorError};

impl Dom {
    /// Every element below `context` (excluding `context`) matching
    /// `selector`, in document order.
    pub fn query_all(&self, context: NodeId, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = parse_selector_list(selector)?;
        Ok(self.select_all(context, &list))
    }

    /// The first element below `context` matching `selector`.
    pub fn query_first(&self, context: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let list = parse_selector_list(selector)?;
        Ok(self
            .descendant_elements(context)
            .into_iter()
            .find(|&node| matches_list(self, &list, node)))
    }

    /// Whether the element `node` itself matches `selector`.
    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, SelectorError> {
        let list = parse_selector_list(selector)?;
        Ok(matches_list(self, &list, node))
    }

    /// [`query_all`](Self::query_all) with an already-parsed selector.
    pub fn select_all(&self, context: NodeId, list: &SelectorList) -> Vec<NodeId> {
        self.descendant_elements(context)
            .into_iter()
            .filter(|&node| matches_list(self, list, node))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::css::parser::SelectorError;
    use crate::dom::fragment::load_html;
    use crate::dom::tree::Dom;

    /// Build a test tree for queries:
    /// ```text
    ///        section#root
    ///       /            \
    ///   nav.menu        main#content
    ///    |  \              |
    ///   a.x  a.y          p.x
    /// ```
    fn fixture() -> Dom {
        let mut dom = Dom::new();
        load_html(
            &mut dom,
            r#"<section id="root"><nav class="menu"><a class="x">1</a><a class="y">2</a></nav><main id="content"><p class="x">3</p></main></section>"#,
        )
        .unwrap();
        dom
    }

    #[test]
    fn query_all_document_order() {
        let dom = fixture();
        let found = dom.query_all(dom.document(), ".x").unwrap();
        let tags: Vec<&str> = found.iter().filter_map(|&n| dom.tag(n)).collect();
        assert_eq!(tags, vec!["a", "p"]);
    }

    #[test]
    fn query_scoped_to_context() {
        let dom = fixture();
        let content = dom.get_element_by_id("content").unwrap();
        assert_eq!(dom.query_all(content, ".x").unwrap().len(), 1);
        assert!(dom.query_all(content, "main").unwrap().is_empty());
    }

    #[test]
    fn query_first() {
        let dom = fixture();
        let first = dom.query_first(dom.document(), "a").unwrap().unwrap();
        assert!(dom.get(first).unwrap().has_class("x"));
        assert_eq!(dom.query_first(dom.document(), "table").unwrap(), None);
    }

    #[test]
    fn matches_element() {
        let dom = fixture();
        let root = dom.get_element_by_id("root").unwrap();
        assert!(dom.matches(root, "section#root").unwrap());
        assert!(!dom.matches(root, "nav").unwrap());
    }

    #[test]
    fn invalid_selectors_error() {
        let dom = fixture();
        assert!(matches!(
            dom.query_all(dom.document(), "a:eq(1)"),
            Err(SelectorError::UnsupportedPseudoClass(_))
        ));
        assert!(dom.query_first(dom.document(), "a >").is_err());
    }
}
