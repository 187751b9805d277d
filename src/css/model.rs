//! Selector AST: SelectorList, Selector, CompoundSelector, components.

/// A single simple selector inside a compound selector.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Type selector: matches the lowercase tag name (e.g. `li`).
    Type(String),
    /// Universal selector: `*`.
    Universal,
    /// Class selector: `.classname`.
    Class(String),
    /// ID selector: `#id`.
    Id(String),
    /// Attribute selector: `[name]`, `[name=value]`, ...
    Attribute(AttributeSelector),
    /// Structural or state pseudo-class understood by the native engine.
    PseudoClass(PseudoClass),
}

/// Operator of an attribute selector with a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    /// `[a=v]`: exact match.
    Equals,
    /// `[a~=v]`: whitespace-separated word match.
    Includes,
    /// `[a|=v]`: exact match or `v-` prefix.
    DashMatch,
    /// `[a^=v]`: prefix.
    Prefix,
    /// `[a$=v]`: suffix.
    Suffix,
    /// `[a*=v]`: substring.
    Substring,
}

/// `[name op value]`. `condition` is `None` for a bare presence test.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    pub condition: Option<(AttributeOp, String)>,
}

impl AttributeSelector {
    /// Test an attribute value (or its absence) against this selector.
    pub fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        let Some((op, expected)) = &self.condition else {
            return true;
        };
        let expected = expected.as_str();
        match op {
            AttributeOp::Equals => value == expected,
            AttributeOp::Includes => {
                !expected.is_empty() && value.split_ascii_whitespace().any(|w| w == expected)
            }
            AttributeOp::DashMatch => {
                value == expected
                    || value
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttributeOp::Prefix => !expected.is_empty() && value.starts_with(expected),
            AttributeOp::Suffix => !expected.is_empty() && value.ends_with(expected),
            AttributeOp::Substring => !expected.is_empty() && value.contains(expected),
        }
    }
}

/// `an+b` argument of `:nth-child()` and `:nth-last-child()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    pub step: i32,
    pub offset: i32,
}

impl Nth {
    /// Whether the 1-based `position` is selected by `an+b` for some `n >= 0`.
    pub fn matches(&self, position: usize) -> bool {
        let position = position as i64;
        let step = self.step as i64;
        let offset = self.offset as i64;
        if step == 0 {
            return position == offset;
        }
        let delta = position - offset;
        delta % step == 0 && delta / step >= 0
    }
}

/// Pseudo-classes the native engine understands.
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    NthChild(Nth),
    NthLastChild(Nth),
    FirstOfType,
    LastOfType,
    Empty,
    Root,
    Checked,
    Disabled,
    Enabled,
    Not(SelectorList),
}

/// A combinator between compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (whitespace): `A B`.
    Descendant,
    /// Child combinator: `A > B`.
    Child,
    /// Next-sibling combinator: `A + B`.
    NextSibling,
    /// Subsequent-sibling combinator: `A ~ B`.
    SubsequentSibling,
}

/// A single compound selector (sequence of components without combinators).
///
/// For example, `li.item:first-child` is one `CompoundSelector` with three
/// components: `Type("li")`, `Class("item")`, `PseudoClass(FirstChild)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
    pub components: Vec<SelectorComponent>,
}

impl CompoundSelector {
    /// Create an empty compound selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component to this compound selector.
    pub fn push(&mut self, component: SelectorComponent) {
        self.components.push(component);
    }
}

/// One element in a selector chain: either a compound selector or a combinator.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorPart {
    /// A compound selector (one or more simple selectors).
    Compound(CompoundSelector),
    /// A combinator between compound selectors.
    Combinator(Combinator),
}

/// A complex selector: chain of compound selectors joined by combinators.
///
/// For example, `ul > li.item` is a `Selector` with parts:
/// `[Compound(ul), Combinator(Child), Compound(li.item)]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    /// Alternating compound selectors and combinators.
    /// Always starts and ends with a `SelectorPart::Compound`.
    pub parts: Vec<SelectorPart>,
}

/// A comma-separated selector list. Matches when any selector matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectorList {
    pub selectors: Vec<Selector>,
}
