//! Query façade: one entry point for every way of asking the document for
//! elements.
//!
//! [`try_query`] is the pure path over a borrowed [`Dom`]: empty selectors,
//! the `#id` fast path, pseudo suffixes and native delegation.
//! [`try_resolve`] adds HTML fragment construction, which needs the document
//! mutably. [`resolve`], [`query`] and [`matches`] are the failure boundary:
//! they log the error and degrade to an empty result.

use thiserror::Error;

use crate::css::parser::SelectorError;
use crate::dom::document::Document;
use crate::dom::fragment::{parse_fragment, FragmentError};
use crate::dom::node::NodeId;
use crate::dom::tree::Dom;

use super::pseudo::{self, split_pseudo};

/// What the caller wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Every match in document order.
    #[default]
    All,
    /// The first match.
    First,
    /// Whether the context node itself matches.
    Matches,
}

/// Result of a resolution, shaped by its [`Mode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    All(Vec<NodeId>),
    First(Option<NodeId>),
    Matches(bool),
}

impl Resolution {
    /// The "nothing found" result for `mode`.
    pub fn empty(mode: Mode) -> Self {
        match mode {
            Mode::All => Resolution::All(Vec::new()),
            Mode::First => Resolution::First(None),
            Mode::Matches => Resolution::Matches(false),
        }
    }

    fn from_nodes(mode: Mode, nodes: Vec<NodeId>) -> Self {
        match mode {
            Mode::All => Resolution::All(nodes),
            Mode::First => Resolution::First(nodes.into_iter().next()),
            Mode::Matches => Resolution::Matches(!nodes.is_empty()),
        }
    }

    /// Matched nodes; a `Matches` result has none.
    pub fn into_nodes(self) -> Vec<NodeId> {
        match self {
            Resolution::All(nodes) => nodes,
            Resolution::First(node) => node.into_iter().collect(),
            Resolution::Matches(_) => Vec::new(),
        }
    }

    pub fn first(&self) -> Option<NodeId> {
        match self {
            Resolution::All(nodes) => nodes.first().copied(),
            Resolution::First(node) => *node,
            Resolution::Matches(_) => None,
        }
    }

    pub fn is_match(&self) -> bool {
        match self {
            Resolution::All(nodes) => !nodes.is_empty(),
            Resolution::First(node) => node.is_some(),
            Resolution::Matches(matched) => *matched,
        }
    }
}

/// Reasons a resolution can fail.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid selector: {0}")]
    InvalidSelector(#[from] SelectorError),

    #[error("positional pseudo-selector :{pseudo} cannot test a single element")]
    PositionalInMatches { pseudo: &'static str },

    #[error("invalid html fragment: {0}")]
    Fragment(#[from] FragmentError),

    #[error("html fragment contains no element")]
    NoElement,
}

/// `#ident` with nothing else; returns the ident.
fn id_only(selector: &str) -> Option<&str> {
    let ident = selector.strip_prefix('#')?;
    let valid = !ident.is_empty()
        && ident
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    valid.then_some(ident)
}

/// Resolve `selector` against `context` without touching the document
/// mutably. A leading `<` is not special here.
pub fn try_query(dom: &Dom, selector: &str, context: NodeId, mode: Mode) -> Result<Resolution, QueryError> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Ok(Resolution::empty(mode));
    }

    if mode != Mode::Matches {
        if let Some(ident) = id_only(selector) {
            if dom.is_connected(context) {
                let found = dom
                    .get_element_by_id(ident)
                    .filter(|&node| context == dom.document() || dom.is_ancestor(context, node));
                if let Some(node) = found {
                    return Ok(Resolution::from_nodes(mode, vec![node]));
                }
            }
        }
    }

    if let Some(descriptor) = split_pseudo(selector) {
        let arg = descriptor.arg.as_deref();
        if mode == Mode::Matches {
            if descriptor.pseudo.is_positional() {
                return Err(QueryError::PositionalInMatches {
                    pseudo: descriptor.pseudo.name(),
                });
            }
            let matched = dom.matches(context, &descriptor.base)?
                && pseudo::test(dom, descriptor.pseudo, arg, context)?;
            return Ok(Resolution::Matches(matched));
        }
        let base = dom.query_all(context, &descriptor.base)?;
        let filtered = pseudo::apply(dom, descriptor.pseudo, arg, base)?;
        return Ok(Resolution::from_nodes(mode, filtered));
    }

    let resolution = match mode {
        Mode::All => Resolution::All(dom.query_all(context, selector)?),
        Mode::First => Resolution::First(dom.query_first(context, selector)?),
        Mode::Matches => Resolution::Matches(dom.matches(context, selector)?),
    };
    Ok(resolution)
}

/// [`try_query`] plus HTML construction: a selector starting with `<` is
/// parsed as a fragment and its first top-level element comes back as a
/// new detached node. The other top-level nodes are freed. In `Matches`
/// mode nothing is built.
pub fn try_resolve(doc: &Document, selector: &str, context: NodeId, mode: Mode) -> Result<Resolution, QueryError> {
    let trimmed = selector.trim_start();
    if !trimmed.starts_with('<') {
        return try_query(&doc.borrow(), selector, context, mode);
    }
    if mode == Mode::Matches {
        return Ok(Resolution::Matches(false));
    }
    let element = {
        let mut dom = doc.borrow_mut();
        let nodes = parse_fragment(&mut dom, trimmed)?;
        let element = nodes.iter().copied().find(|&node| dom.is_element(node));
        for node in nodes {
            if Some(node) != element {
                dom.remove_subtree(node);
            }
        }
        element
    };
    match element {
        Some(node) => Ok(Resolution::from_nodes(mode, vec![node])),
        None => Err(QueryError::NoElement),
    }
}

/// [`try_resolve`] that logs failures and degrades to [`Resolution::empty`].
pub fn resolve(doc: &Document, selector: &str, context: NodeId, mode: Mode) -> Resolution {
    try_resolve(doc, selector, context, mode).unwrap_or_else(|err| {
        tracing::warn!(selector, ?mode, error = %err, "selector resolution failed");
        Resolution::empty(mode)
    })
}

/// Every element below `context` matching `selector`; empty on error.
pub fn query(dom: &Dom, selector: &str, context: NodeId) -> Vec<NodeId> {
    match try_query(dom, selector, context, Mode::All) {
        Ok(resolution) => resolution.into_nodes(),
        Err(err) => {
            tracing::warn!(selector, error = %err, "selector query failed");
            Vec::new()
        }
    }
}

/// Whether `node` matches `selector`; `false` on error.
pub fn matches(dom: &Dom, node: NodeId, selector: &str) -> bool {
    match try_query(dom, selector, node, Mode::Matches) {
        Ok(resolution) => resolution.is_match(),
        Err(err) => {
            tracing::warn!(selector, error = %err, "selector match failed");
            false
        }
    }
}
