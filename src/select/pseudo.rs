//! Pseudo-selector suffixes the native engine does not understand.
//!
//! A selector such as `ul.menu li:eq(2)` is split into the native base
//! `ul.menu li`, the pseudo `eq` and its argument `2`. The base is resolved
//! natively and the pseudo then filters the result.

use crate::dom::node::NodeId;
use crate::dom::tree::Dom;

use super::resolve::{try_query, Mode, QueryError, Resolution};

/// A recognized pseudo-selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    First,
    Last,
    Even,
    Odd,
    Eq,
    Gt,
    Lt,
    Has,
    Contains,
    Visible,
    Hidden,
    Parent,
    Header,
    Input,
    Text,
    Checkbox,
    Radio,
    Password,
    Submit,
    Reset,
    Button,
    File,
    Image,
}

impl Pseudo {
    /// Look up a pseudo by name (ASCII case-insensitive).
    pub fn from_name(name: &str) -> Option<Pseudo> {
        let pseudo = match name.to_ascii_lowercase().as_str() {
            "first" => Pseudo::First,
            "last" => Pseudo::Last,
            "even" => Pseudo::Even,
            "odd" => Pseudo::Odd,
            "eq" => Pseudo::Eq,
            "gt" => Pseudo::Gt,
            "lt" => Pseudo::Lt,
            "has" => Pseudo::Has,
            "contains" => Pseudo::Contains,
            "visible" => Pseudo::Visible,
            "hidden" => Pseudo::Hidden,
            "parent" => Pseudo::Parent,
            "header" => Pseudo::Header,
            "input" => Pseudo::Input,
            "text" => Pseudo::Text,
            "checkbox" => Pseudo::Checkbox,
            "radio" => Pseudo::Radio,
            "password" => Pseudo::Password,
            "submit" => Pseudo::Submit,
            "reset" => Pseudo::Reset,
            "button" => Pseudo::Button,
            "file" => Pseudo::File,
            "image" => Pseudo::Image,
            _ => return None,
        };
        Some(pseudo)
    }

    pub fn name(self) -> &'static str {
        match self {
            Pseudo::First => "first",
            Pseudo::Last => "last",
            Pseudo::Even => "even",
            Pseudo::Odd => "odd",
            Pseudo::Eq => "eq",
            Pseudo::Gt => "gt",
            Pseudo::Lt => "lt",
            Pseudo::Has => "has",
            Pseudo::Contains => "contains",
            Pseudo::Visible => "visible",
            Pseudo::Hidden => "hidden",
            Pseudo::Parent => "parent",
            Pseudo::Header => "header",
            Pseudo::Input => "input",
            Pseudo::Text => "text",
            Pseudo::Checkbox => "checkbox",
            Pseudo::Radio => "radio",
            Pseudo::Password => "password",
            Pseudo::Submit => "submit",
            Pseudo::Reset => "reset",
            Pseudo::Button => "button",
            Pseudo::File => "file",
            Pseudo::Image => "image",
        }
    }

    /// Positional pseudos depend on the whole match set and cannot test a
    /// single node.
    pub fn is_positional(self) -> bool {
        matches!(
            self,
            Pseudo::First | Pseudo::Last | Pseudo::Even | Pseudo::Odd | Pseudo::Eq | Pseudo::Gt | Pseudo::Lt
        )
    }

    /// Whether the pseudo is written with a parenthesized argument.
    pub fn takes_argument(self) -> bool {
        matches!(self, Pseudo::Eq | Pseudo::Gt | Pseudo::Lt | Pseudo::Has | Pseudo::Contains)
    }

    /// For the input-type pseudos, the `type` attribute value they select.
    fn input_type(self) -> Option<&'static str> {
        match self {
            Pseudo::Text
            | Pseudo::Checkbox
            | Pseudo::Radio
            | Pseudo::Password
            | Pseudo::Submit
            | Pseudo::Reset
            | Pseudo::Button
            | Pseudo::File
            | Pseudo::Image => Some(self.name()),
            _ => None,
        }
    }
}

/// A selector split into its native base and trailing pseudo.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorDescriptor {
    pub pseudo: Pseudo,
    pub arg: Option<String>,
    /// Native selector, completed with `*` when it would otherwise be empty
    /// or end in a combinator.
    pub base: String,
}

/// Split off a trailing recognized pseudo-selector.
///
/// Only a colon outside quotes, brackets and parentheses can start the
/// suffix, and the suffix must run to the end of the selector. Returns
/// `None` when there is no recognized suffix, which leaves the selector to
/// the native engine.
pub fn split_pseudo(selector: &str) -> Option<SelectorDescriptor> {
    let selector = selector.trim();
    let colon = last_top_level_colon(selector)?;
    if colon > 0 && selector.as_bytes()[colon - 1] == b':' {
        return None;
    }

    let suffix = &selector[colon + 1..];
    let name_len = suffix
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(suffix.len());
    let pseudo = Pseudo::from_name(&suffix[..name_len])?;
    let rest = &suffix[name_len..];

    let arg = if rest.is_empty() {
        None
    } else {
        let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
        if !pseudo.takes_argument() || !is_balanced(inner) {
            return None;
        }
        Some(inner.trim().to_string())
    };

    Some(SelectorDescriptor {
        pseudo,
        arg,
        base: complete_base(&selector[..colon]),
    })
}

/// Byte index of the last `:` at nesting depth zero, outside quotes.
fn last_top_level_colon(selector: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut last = None;
    for (i, c) in selector.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                ':' if depth == 0 => last = Some(i),
                _ => {}
            },
        }
    }
    last
}

fn is_balanced(inner: &str) -> bool {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return false;
                    }
                }
                _ => {}
            },
        }
    }
    depth == 0 && quote.is_none()
}

fn complete_base(base: &str) -> String {
    let needs_universal = base.trim().is_empty()
        || base.ends_with(char::is_whitespace)
        || base.trim_end().ends_with(['>', '+', '~', ',']);
    if needs_universal {
        format!("{base}*")
    } else {
        base.to_string()
    }
}

fn strip_quotes(arg: &str) -> &str {
    let arg = arg.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = arg.strip_prefix(quote).and_then(|a| a.strip_suffix(quote)) {
            return inner;
        }
    }
    arg
}

/// Resolve a negative index against `len`; `None` when it stays negative.
fn normalize_index(n: i64, len: usize) -> Option<i64> {
    let n = if n < 0 { n + len as i64 } else { n };
    (n >= 0).then_some(n)
}

/// Apply `pseudo` to the base match set `nodes` (in document order).
///
/// Positional pseudos index into `nodes`; the others test each node on its
/// own. A missing or unparsable numeric argument, and a missing or empty
/// `has`/`contains` argument, select nothing. An invalid `has` selector is
/// an error.
pub fn apply(
    dom: &Dom,
    pseudo: Pseudo,
    arg: Option<&str>,
    nodes: Vec<NodeId>,
) -> Result<Vec<NodeId>, QueryError> {
    let index_arg = || arg.and_then(|a| a.trim().parse::<i64>().ok());
    let selected = match pseudo {
        Pseudo::First => nodes.into_iter().take(1).collect(),
        Pseudo::Last => nodes.last().copied().into_iter().collect(),
        Pseudo::Even => nodes.into_iter().step_by(2).collect(),
        Pseudo::Odd => nodes.into_iter().skip(1).step_by(2).collect(),
        Pseudo::Eq => match index_arg().and_then(|n| normalize_index(n, nodes.len())) {
            Some(n) => nodes.get(n as usize).copied().into_iter().collect(),
            None => Vec::new(),
        },
        Pseudo::Gt => match index_arg() {
            Some(n) => {
                let len = nodes.len() as i64;
                let n = if n < 0 { n + len } else { n };
                nodes
                    .into_iter()
                    .enumerate()
                    .filter(|&(i, _)| i as i64 > n)
                    .map(|(_, node)| node)
                    .collect()
            }
            None => Vec::new(),
        },
        Pseudo::Lt => match index_arg() {
            Some(n) => {
                let len = nodes.len() as i64;
                let n = if n < 0 { n + len } else { n };
                nodes
                    .into_iter()
                    .enumerate()
                    .filter(|&(i, _)| (i as i64) < n)
                    .map(|(_, node)| node)
                    .collect()
            }
            None => Vec::new(),
        },
        _ => {
            let mut kept = Vec::with_capacity(nodes.len());
            for node in nodes {
                if test(dom, pseudo, arg, node)? {
                    kept.push(node);
                }
            }
            kept
        }
    };
    Ok(selected)
}

/// Test one node against a non-positional pseudo.
pub fn test(dom: &Dom, pseudo: Pseudo, arg: Option<&str>, node: NodeId) -> Result<bool, QueryError> {
    let Some(data) = dom.get(node).filter(|n| n.is_element()) else {
        return Ok(false);
    };
    let tag = data.tag.as_str();
    let matched = match pseudo {
        Pseudo::Has => match arg.map(str::trim).filter(|a| !a.is_empty()) {
            Some(selector) => matches!(
                try_query(dom, selector, node, Mode::First)?,
                Resolution::First(Some(_))
            ),
            None => false,
        },
        Pseudo::Contains => match arg.map(strip_quotes).filter(|a| !a.is_empty()) {
            Some(text) => dom.text_content(node).contains(text),
            None => false,
        },
        Pseudo::Visible => dom.is_rendered(node),
        Pseudo::Hidden => !dom.is_rendered(node),
        Pseudo::Parent => !dom.children(node).is_empty(),
        Pseudo::Header => matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6"),
        Pseudo::Input => matches!(tag, "input" | "textarea" | "select" | "button"),
        _ => match pseudo.input_type() {
            Some(kind) => {
                tag == "input" && data.attr_ref("type").is_some_and(|t| t.eq_ignore_ascii_case(kind))
            }
            None => return Err(QueryError::PositionalInMatches { pseudo: pseudo.name() }),
        },
    };
    Ok(matched)
}
