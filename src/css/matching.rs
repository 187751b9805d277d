//! Selector matching against DOM elements.
//!
//! Walks the selector parts from right to left, matching compound selectors
//! and navigating the DOM tree via combinators. Descendant and subsequent
//! sibling combinators backtrack: if the rest of the selector fails from
//! the nearest candidate, farther candidates are tried.

use crate::css::model::{
    Combinator, CompoundSelector, PseudoClass, Selector, SelectorComponent, SelectorList,
    SelectorPart,
};
use crate::dom::node::{NodeData, NodeId};
use crate::dom::tree::Dom;

/// Tags that can be `:disabled` / `:enabled`.
const FORM_CONTROLS: &[&str] = &[
    "button", "fieldset", "input", "optgroup", "option", "select", "textarea",
];

/// Whether any selector of the list matches `node`.
pub fn matches_list(dom: &Dom, list: &SelectorList, node: NodeId) -> bool {
    list.selectors.iter().any(|sel| matches_selector(dom, sel, node))
}

/// Check whether a full selector matches a given element.
pub fn matches_selector(dom: &Dom, selector: &Selector, node: NodeId) -> bool {
    let parts = &selector.parts;
    match parts.last() {
        Some(SelectorPart::Compound(compound)) => {
            matches_compound(dom, compound, node) && matches_from(dom, parts, parts.len() - 1, node)
        }
        _ => false,
    }
}

/// `parts[..=index]` has matched up to and including `parts[index]` at
/// `node`; match the remainder to the left.
fn matches_from(dom: &Dom, parts: &[SelectorPart], index: usize, node: NodeId) -> bool {
    if index == 0 {
        return true;
    }
    let (Some(SelectorPart::Combinator(combinator)), Some(SelectorPart::Compound(compound))) =
        (parts.get(index - 1), index.checked_sub(2).and_then(|i| parts.get(i)))
    else {
        return false;
    };
    let next = index - 2;
    let try_candidate =
        |candidate: NodeId| matches_compound(dom, compound, candidate) && matches_from(dom, parts, next, candidate);

    match combinator {
        Combinator::Child => dom.parent_element(node).is_some_and(try_candidate),
        Combinator::Descendant => {
            let mut current = dom.parent_element(node);
            while let Some(ancestor) = current {
                if try_candidate(ancestor) {
                    return true;
                }
                current = dom.parent_element(ancestor);
            }
            false
        }
        Combinator::NextSibling => dom.previous_element_sibling(node).is_some_and(try_candidate),
        Combinator::SubsequentSibling => {
            let mut current = dom.previous_element_sibling(node);
            while let Some(sibling) = current {
                if try_candidate(sibling) {
                    return true;
                }
                current = dom.previous_element_sibling(sibling);
            }
            false
        }
    }
}

/// Check whether a compound selector matches a single element.
fn matches_compound(dom: &Dom, compound: &CompoundSelector, id: NodeId) -> bool {
    let Some(node) = dom.get(id).filter(|n| n.is_element()) else {
        return false;
    };
    compound
        .components
        .iter()
        .all(|component| matches_component(dom, component, id, node))
}

fn matches_component(dom: &Dom, component: &SelectorComponent, id: NodeId, node: &NodeData) -> bool {
    match component {
        SelectorComponent::Type(tag) => node.tag == *tag,
        SelectorComponent::Universal => true,
        SelectorComponent::Class(class) => node.has_class(class),
        SelectorComponent::Id(expected) => node.id() == Some(expected.as_str()),
        SelectorComponent::Attribute(attr) => attr.matches(node.attr(&attr.name).as_deref()),
        SelectorComponent::PseudoClass(pseudo) => matches_pseudo(dom, pseudo, id, node),
    }
}

fn matches_pseudo(dom: &Dom, pseudo: &PseudoClass, id: NodeId, node: &NodeData) -> bool {
    let position = || {
        let siblings = dom.element_siblings(id);
        let index = siblings.iter().position(|&s| s == id).unwrap_or(0);
        (index + 1, siblings.len())
    };
    let type_position = || {
        let siblings: Vec<NodeId> = dom
            .element_siblings(id)
            .into_iter()
            .filter(|&s| dom.tag(s) == Some(node.tag.as_str()))
            .collect();
        let index = siblings.iter().position(|&s| s == id).unwrap_or(0);
        (index + 1, siblings.len())
    };

    match pseudo {
        PseudoClass::FirstChild => position().0 == 1,
        PseudoClass::LastChild => {
            let (pos, len) = position();
            pos == len
        }
        PseudoClass::OnlyChild => position().1 == 1,
        PseudoClass::NthChild(nth) => nth.matches(position().0),
        PseudoClass::NthLastChild(nth) => {
            let (pos, len) = position();
            nth.matches(len + 1 - pos)
        }
        PseudoClass::FirstOfType => type_position().0 == 1,
        PseudoClass::LastOfType => {
            let (pos, len) = type_position();
            pos == len
        }
        PseudoClass::Empty => dom.children(id).iter().all(|&c| {
            dom.get(c)
                .is_some_and(|child| child.is_text() && child.text.is_empty())
        }),
        PseudoClass::Root => dom.parent(id) == Some(dom.document()),
        PseudoClass::Checked => match node.tag.as_str() {
            "input" => node.has_attr("checked"),
            "option" => node.has_attr("selected"),
            _ => false,
        },
        PseudoClass::Disabled => FORM_CONTROLS.contains(&node.tag.as_str()) && node.has_attr("disabled"),
        PseudoClass::Enabled => FORM_CONTROLS.contains(&node.tag.as_str()) && !node.has_attr("disabled"),
        PseudoClass::Not(list) => !matches_list(dom, list, id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::parser::parse_selector_list;
    use crate::dom::fragment::load_html;

    fn fixture() -> Dom {
        let mut dom = Dom::new();
        load_html(
            &mut dom,
            concat!(
                r#"<div id="app" class="shell">"#,
                r#"<ul class="list"><li id="one" class="item">One</li><li class="item done">Two</li><li id="three">Three</li></ul>"#,
                r#"<p lang="en-US">Para</p><p></p>"#,
                r#"<input type="checkbox" checked><input disabled>"#,
                "</div>"
            ),
        )
        .unwrap();
        dom
    }

    fn matches(dom: &Dom, selector: &str, id: &str) -> bool {
        let list = parse_selector_list(selector).unwrap();
        let node = dom.get_element_by_id(id).unwrap();
        matches_list(dom, &list, node)
    }

    fn matches_node(dom: &Dom, selector: &str, node: NodeId) -> bool {
        let list = parse_selector_list(selector).unwrap();
        matches_list(dom, &list, node)
    }

    #[test]
    fn simple_components() {
        let dom = fixture();
        assert!(matches(&dom, "li", "one"));
        assert!(matches(&dom, "*", "one"));
        assert!(matches(&dom, ".item", "one"));
        assert!(matches(&dom, "#one", "one"));
        assert!(matches(&dom, "li.item#one", "one"));
        assert!(!matches(&dom, "li.done", "one"));
        assert!(!matches(&dom, "LI#three.item", "three"));
    }

    #[test]
    fn combinators() {
        let dom = fixture();
        assert!(matches(&dom, "#app li", "one"));
        assert!(matches(&dom, "ul > li", "one"));
        assert!(!matches(&dom, "#app > li", "one"));
        assert!(matches(&dom, ".item + li", "three"));
        assert!(matches(&dom, "#one ~ li", "three"));
        assert!(!matches(&dom, "#three ~ li", "one"));
    }

    #[test]
    fn descendant_backtracks() {
        let dom = fixture();
        // The nearest div-ish ancestor is #app; ".shell ul li" needs the ul
        // between them.
        assert!(matches(&dom, ".shell ul li", "three"));
        assert!(matches(&dom, "div > ul li", "three"));
    }

    #[test]
    fn structural_pseudos() {
        let dom = fixture();
        assert!(matches(&dom, "li:first-child", "one"));
        assert!(matches(&dom, "li:last-child", "three"));
        assert!(matches(&dom, "li:nth-child(odd)", "three"));
        assert!(matches(&dom, "li:nth-last-child(3)", "one"));
        assert!(matches(&dom, "li:first-of-type", "one"));
        assert!(matches(&dom, "#app:root", "app"));
        assert!(!matches(&dom, "li:only-child", "one"));
        assert!(matches(&dom, "li:not(.done, #three)", "one"));
        assert!(!matches(&dom, "li:not(.item)", "one"));
    }

    #[test]
    fn attributes_and_states() {
        let dom = fixture();
        let app = dom.get_element_by_id("app").unwrap();
        let children = dom.element_children(app);
        let para = children[1];
        let empty_para = children[2];
        let checkbox = children[3];
        let disabled = children[4];

        assert!(matches_node(&dom, "[lang|=en]", para));
        assert!(matches_node(&dom, "p:empty", empty_para));
        assert!(!matches_node(&dom, "p:empty", para));
        assert!(matches_node(&dom, "input:checked", checkbox));
        assert!(matches_node(&dom, "input:enabled", checkbox));
        assert!(matches_node(&dom, "input:disabled", disabled));
        assert!(matches_node(&dom, "p:last-of-type", empty_para));
    }

    #[test]
    fn text_nodes_never_match() {
        let dom = fixture();
        let one = dom.get_element_by_id("one").unwrap();
        let text = dom.children(one)[0];
        assert!(!matches_node(&dom, "*", text));
    }
}
