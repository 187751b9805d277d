//! Inline style -> taffy Style conversion.
//!
//! Maps an element's inline declarations (plus the per-tag default display)
//! to taffy's layout types ([`taffy::Style`], [`Dimension`], etc.).

use taffy::prelude::*;

use crate::css::declarations::{get_declaration, parse_numeric};
use crate::dom::node::NodeData;
use crate::geometry::Size as Viewport;

/// Tags that are not rendered unless styled otherwise.
const HIDDEN_TAGS: &[&str] = &[
    "head", "link", "meta", "noscript", "script", "style", "template", "title",
];

/// The `display` an element has when no inline declaration says otherwise.
pub fn default_display(tag: &str) -> &'static str {
    match tag {
        t if HIDDEN_TAGS.contains(&t) => "none",
        "a" | "b" | "button" | "code" | "em" | "i" | "img" | "input" | "label" | "select"
        | "small" | "span" | "strong" | "textarea" => "inline",
        "li" => "list-item",
        _ => "block",
    }
}

/// A resolved CSS length.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Length {
    Px(f32),
    Percent(f32),
    Auto,
}

/// Parse a length value: `px`, `%`, `vw`, `vh`, `em`/`rem` (16px), bare
/// numbers as px, `auto`. Anything else is `None`.
fn parse_length(value: &str, viewport: Viewport) -> Option<Length> {
    if value.trim() == "auto" {
        return Some(Length::Auto);
    }
    let (number, unit) = parse_numeric(value)?;
    let number = number as f32;
    let length = match unit.as_str() {
        "" | "px" => Length::Px(number),
        "%" => Length::Percent(number / 100.0),
        "vw" => Length::Px(number / 100.0 * viewport.width),
        "vh" => Length::Px(number / 100.0 * viewport.height),
        "em" | "rem" => Length::Px(number * 16.0),
        _ => return None,
    };
    Some(length)
}

fn dimension(value: Option<&str>, viewport: Viewport) -> Dimension {
    match value.and_then(|v| parse_length(v, viewport)) {
        Some(Length::Px(px)) => Dimension::from_length(px.max(0.0)),
        Some(Length::Percent(p)) => Dimension::from_percent(p),
        Some(Length::Auto) | None => Dimension::AUTO,
    }
}

fn length_percentage(value: Option<&str>, viewport: Viewport) -> LengthPercentage {
    match value.and_then(|v| parse_length(v, viewport)) {
        Some(Length::Px(px)) => LengthPercentage::from_length(px),
        Some(Length::Percent(p)) => LengthPercentage::from_percent(p),
        Some(Length::Auto) | None => LengthPercentage::ZERO,
    }
}

fn length_percentage_auto(value: Option<&str>, viewport: Viewport) -> LengthPercentageAuto {
    match value.and_then(|v| parse_length(v, viewport)) {
        Some(Length::Px(px)) => LengthPercentageAuto::from_length(px),
        Some(Length::Percent(p)) => LengthPercentageAuto::from_percent(p),
        Some(Length::Auto) => LengthPercentageAuto::AUTO,
        None => LengthPercentageAuto::from_length(0.0),
    }
}

/// Expand a 1-4 value box shorthand into `[top, right, bottom, left]`,
/// letting longhands (`padding-left`, ...) override.
fn box_sides<'a>(decls: &'a [(String, String)], shorthand: &str) -> [Option<&'a str>; 4] {
    let mut sides: [Option<&str>; 4] = [None; 4];
    if let Some(value) = get_declaration(decls, shorthand) {
        let parts: Vec<&str> = value.split_ascii_whitespace().collect();
        sides = match parts.as_slice() {
            [a] => [Some(*a), Some(*a), Some(*a), Some(*a)],
            [a, b] => [Some(*a), Some(*b), Some(*a), Some(*b)],
            [a, b, c] => [Some(*a), Some(*b), Some(*c), Some(*b)],
            [a, b, c, d, ..] => [Some(*a), Some(*b), Some(*c), Some(*d)],
            [] => sides,
        };
    }
    for (i, side) in ["top", "right", "bottom", "left"].iter().enumerate() {
        if let Some(v) = get_declaration(decls, &format!("{shorthand}-{side}")) {
            sides[i] = Some(v);
        }
    }
    sides
}

/// Convert an element's inline declarations into a [`taffy::Style`].
///
/// Mapping summary:
/// - `display: none` -> `Display::None`, `display: flex` -> row flexbox,
///   everything else -> column flexbox (block stacking)
/// - `width/height` -> `size`, `min-*`/`max-*` -> `min_size`/`max_size`
/// - `margin`/`padding` (shorthand and longhands) -> `margin`/`padding`
/// - children never shrink below their content
pub fn resolve_element_style(node: &NodeData, viewport: Viewport) -> taffy::Style {
    let decls = &node.style;
    let mut style = taffy::Style::default();

    let display = get_declaration(decls, "display").unwrap_or_else(|| default_display(&node.tag));
    match display {
        "none" => style.display = Display::None,
        "flex" | "inline-flex" => {
            style.display = Display::Flex;
            style.flex_direction = match get_declaration(decls, "flex-direction") {
                Some("column") => FlexDirection::Column,
                _ => FlexDirection::Row,
            };
        }
        _ => {
            style.display = Display::Flex;
            style.flex_direction = FlexDirection::Column;
        }
    }
    style.flex_shrink = 0.0;

    style.size.width = dimension(get_declaration(decls, "width"), viewport);
    style.size.height = dimension(get_declaration(decls, "height"), viewport);
    style.min_size.width = dimension(get_declaration(decls, "min-width"), viewport);
    style.min_size.height = dimension(get_declaration(decls, "min-height"), viewport);
    style.max_size.width = dimension(get_declaration(decls, "max-width"), viewport);
    style.max_size.height = dimension(get_declaration(decls, "max-height"), viewport);

    let [top, right, bottom, left] = box_sides(decls, "padding");
    style.padding = taffy::geometry::Rect {
        top: length_percentage(top, viewport),
        right: length_percentage(right, viewport),
        bottom: length_percentage(bottom, viewport),
        left: length_percentage(left, viewport),
    };
    let [top, right, bottom, left] = box_sides(decls, "margin");
    style.margin = taffy::geometry::Rect {
        top: length_percentage_auto(top, viewport),
        right: length_percentage_auto(right, viewport),
        bottom: length_percentage_auto(bottom, viewport),
        left: length_percentage_auto(left, viewport),
    };

    style
}

/// A text node is a line-high leaf when it has visible characters.
pub fn resolve_text_style(text: &str, line_height: f32) -> taffy::Style {
    let height = if text.trim().is_empty() { 0.0 } else { line_height };
    taffy::Style {
        flex_shrink: 0.0,
        size: taffy::geometry::Size {
            width: Dimension::AUTO,
            height: Dimension::from_length(height),
        },
        ..Default::default()
    }
}

/// The document node fills the viewport.
pub fn resolve_document_style(viewport: Viewport) -> taffy::Style {
    taffy::Style {
        display: Display::Flex,
        flex_direction: FlexDirection::Column,
        size: taffy::geometry::Size {
            width: Dimension::from_length(viewport.width),
            height: Dimension::from_length(viewport.height),
        },
        ..Default::default()
    }
}
