//! HTML fragment parsing and serialization.
//!
//! Fragments go through html5ever's tree builder in a `<body>` context, the
//! way `innerHTML` parses, and the resulting `RcDom` is converted into
//! detached [`Dom`] nodes. Comments, doctypes and processing instructions
//! are dropped; `template` contents become ordinary children.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_fragment as parse_html5_fragment, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use super::node::{NodeData, NodeId, NodeKind};
use super::tree::Dom;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Deepest element nesting a fragment may have.
pub const MAX_DEPTH: usize = 512;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Errors from fragment parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FragmentError {
    #[error("fragment nests deeper than {limit} elements")]
    TooDeep { limit: usize },
    #[error("html parser produced no fragment root")]
    MissingRoot,
}

/// Whether `tag` is a void element.
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Parse `html` into new detached nodes; returns the top-level nodes in order.
///
/// On error every node built so far is freed again.
pub fn parse_fragment(dom: &mut Dom, html: &str) -> Result<Vec<NodeId>, FragmentError> {
    let context = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from("body"));
    let parsed = parse_html5_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new(), false)
        .one(html);
    let root = parsed
        .document
        .children
        .borrow()
        .first()
        .cloned()
        .ok_or(FragmentError::MissingRoot)?;

    let mut top = Vec::new();
    for child in root.children.borrow().iter() {
        match convert(dom, child, 1) {
            Ok(Some(node)) => top.push(node),
            Ok(None) => {}
            Err(err) => {
                for node in top {
                    dom.remove_subtree(node);
                }
                return Err(err);
            }
        }
    }
    tracing::trace!(nodes = top.len(), "parsed html fragment");
    Ok(top)
}

/// Build the detached node for `handle` and its subtree.
fn convert(dom: &mut Dom, handle: &Handle, depth: usize) -> Result<Option<NodeId>, FragmentError> {
    if depth > MAX_DEPTH {
        return Err(FragmentError::TooDeep { limit: MAX_DEPTH });
    }
    match &handle.data {
        RcNodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            Ok(Some(dom.create(NodeData::text(text))))
        }
        RcNodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let mut data = NodeData::element(&*name.local);
            for attr in attrs.borrow().iter() {
                data.set_attr(&attr.name.local, &attr.value);
            }
            let id = dom.create(data);

            let contents = template_contents
                .borrow()
                .clone()
                .unwrap_or_else(|| handle.clone());
            for child in contents.children.borrow().iter() {
                match convert(dom, child, depth + 1) {
                    Ok(Some(node)) => {
                        dom.append_child(id, node);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        dom.remove_subtree(id);
                        return Err(err);
                    }
                }
            }
            Ok(Some(id))
        }
        RcNodeData::Document
        | RcNodeData::Doctype { .. }
        | RcNodeData::Comment { .. }
        | RcNodeData::ProcessingInstruction { .. } => Ok(None),
    }
}

/// Parse `html` and append the resulting nodes to the document node.
pub fn load_html(dom: &mut Dom, html: &str) -> Result<Vec<NodeId>, FragmentError> {
    let nodes = parse_fragment(dom, html)?;
    let document = dom.document();
    for &node in &nodes {
        dom.append_child(document, node);
    }
    Ok(nodes)
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Serialize a node and its subtree.
pub fn outer_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, &mut out);
    out
}

/// Serialize the children of a node.
pub fn inner_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    for &child in dom.children(id) {
        write_node(dom, child, &mut out);
    }
    out
}

fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };
    match node.kind {
        NodeKind::Text => {
            let raw_parent = dom
                .tag(dom.parent(id).unwrap_or(id))
                .is_some_and(|t| t == "script" || t == "style");
            if raw_parent {
                out.push_str(&node.text);
            } else {
                out.push_str(&escape_text(&node.text));
            }
        }
        NodeKind::Document => {
            for &child in dom.children(id) {
                write_node(dom, child, out);
            }
        }
        NodeKind::Element => {
            out.push('<');
            out.push_str(&node.tag);
            for (name, value) in &node.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
            if let Some(style) = node.attr("style") {
                out.push_str(" style=\"");
                out.push_str(&escape_attr(&style));
                out.push('"');
            }
            out.push('>');
            if is_void(&node.tag) {
                return;
            }
            for &child in dom.children(id) {
                write_node(dom, child, out);
            }
            out.push_str("</");
            out.push_str(&node.tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round_trip(html: &str) -> String {
        let mut dom = Dom::new();
        let nodes = parse_fragment(&mut dom, html).unwrap();
        nodes.iter().map(|&n| outer_html(&dom, n)).collect()
    }

    #[test]
    fn nested_elements_and_text() {
        assert_eq!(
            round_trip(r#"<ul id="list"><li class="a">One</li><li>Two</li></ul>"#),
            r#"<ul id="list"><li class="a">One</li><li>Two</li></ul>"#
        );
    }

    #[test]
    fn void_and_self_closing() {
        assert_eq!(round_trip(r#"<p>a<br>b<img src="x.png"/></p>"#), r#"<p>a<br>b<img src="x.png"></p>"#);
        // A self-closing slash on a normal element is ignored.
        assert_eq!(round_trip("<div/><span></span>"), "<div><span></span></div>");
    }

    #[test]
    fn attribute_forms() {
        let mut dom = Dom::new();
        let nodes = parse_fragment(&mut dom, r#"<input type=checkbox checked data-x='1 2' ID="a" id="b">"#).unwrap();
        let input = dom.get(nodes[0]).unwrap();
        assert_eq!(input.attr("type").as_deref(), Some("checkbox"));
        assert_eq!(input.attr("checked").as_deref(), Some(""));
        assert_eq!(input.attr("data-x").as_deref(), Some("1 2"));
        assert_eq!(input.id(), Some("a"));
    }

    #[test]
    fn style_attribute_is_parsed() {
        let mut dom = Dom::new();
        let nodes = parse_fragment(&mut dom, r#"<div style="width:10px;display:none"></div>"#).unwrap();
        assert_eq!(dom.inline_style(nodes[0], "display").as_deref(), Some("none"));
        insta::assert_snapshot!(outer_html(&dom, nodes[0]), @r#"<div style="width: 10px; display: none;"></div>"#);
    }

    #[test]
    fn entities_decode_and_reescape() {
        let mut dom = Dom::new();
        let nodes = parse_fragment(&mut dom, "<p>1 &lt; 2 &amp;&#65;&nbsp;</p>").unwrap();
        assert_eq!(dom.text_content(nodes[0]), "1 < 2 &A\u{a0}");
        assert_eq!(round_trip("<p>1 &lt; 2</p>"), "<p>1 &lt; 2</p>");
    }

    #[test]
    fn unclosed_elements_are_closed() {
        assert_eq!(round_trip("<div><p>text"), "<div><p>text</p></div>");
    }

    #[test]
    fn closing_ancestor_closes_intermediates() {
        assert_eq!(round_trip("<div><p>a</div>b"), "<div><p>a</p></div>b");
    }

    #[test]
    fn paragraphs_close_each_other() {
        assert_eq!(round_trip("<p>a<p>b"), "<p>a</p><p>b</p>");
        assert_eq!(round_trip("<ul><li>1<li>2</ul>"), "<ul><li>1</li><li>2</li></ul>");
    }

    #[test]
    fn stray_markup_is_tolerated() {
        assert_eq!(round_trip("<p></span>x</p>"), "<p>x</p>");
        assert_eq!(round_trip("<p>ok</p><div"), "<p>ok</p>");
        assert_eq!(round_trip("a < b"), "a &lt; b");
    }

    #[test]
    fn comments_dropped() {
        assert_eq!(round_trip("<p><!-- hi -->x</p>"), "<p>x</p>");
        assert_eq!(round_trip("<!-- only -->"), "");
    }

    #[test]
    fn script_body_is_raw() {
        assert_eq!(round_trip("<script>if (a < b) {}</script>"), "<script>if (a < b) {}</script>");
    }

    #[test]
    fn template_contents_become_children() {
        assert_eq!(round_trip("<template><b>x</b></template>"), "<template><b>x</b></template>");
    }

    #[test]
    fn nesting_limit() {
        let mut dom = Dom::new();
        let before = dom.len();
        let deepest = "<div>".repeat(MAX_DEPTH);
        assert_eq!(parse_fragment(&mut dom, &deepest).unwrap().len(), 1);
        assert_eq!(dom.len(), before + MAX_DEPTH);

        let mut dom = Dom::new();
        let before = dom.len();
        let too_deep = format!("<p>kept</p>{}", "<div>".repeat(MAX_DEPTH + 1));
        assert_eq!(
            parse_fragment(&mut dom, &too_deep),
            Err(FragmentError::TooDeep { limit: MAX_DEPTH })
        );
        assert_eq!(dom.len(), before);
    }

    #[test]
    fn load_appends_to_document() {
        let mut dom = Dom::new();
        let nodes = load_html(&mut dom, "<main></main><footer></footer>").unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|&n| dom.is_connected(n)));
    }

    #[test]
    fn inner_html_serializes_children() {
        let mut dom = Dom::new();
        let nodes = load_html(&mut dom, r#"<div><b>old</b> &amp; <i title="a&quot;b">new</i></div>"#).unwrap();
        assert_eq!(inner_html(&dom, nodes[0]), r#"<b>old</b> &amp; <i title="a&quot;b">new</i>"#);
    }
}
