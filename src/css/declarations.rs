//! Inline style declarations and CSS value helpers.
//!
//! An element's `style` attribute is kept as an ordered list of
//! `(property, value)` pairs. Property names are stored in kebab-case.

/// CSS properties whose numeric values carry no length unit.
pub const UNITLESS_PROPERTIES: &[&str] = &[
    "animation-iteration-count",
    "column-count",
    "fill-opacity",
    "flex-grow",
    "flex-shrink",
    "font-weight",
    "line-height",
    "opacity",
    "order",
    "orphans",
    "widows",
    "z-index",
    "zoom",
];

/// Whether `property` (either case convention) takes unitless numbers.
pub fn is_unitless(property: &str) -> bool {
    let property = kebab_case(property);
    UNITLESS_PROPERTIES.contains(&property.as_str())
}

/// Parse a `style` attribute (`"a: b; c: d"`) into declarations.
///
/// Empty declarations and declarations without a colon are skipped. A later
/// declaration of the same property replaces the earlier one.
pub fn parse_inline_style(text: &str) -> Vec<(String, String)> {
    let mut declarations: Vec<(String, String)> = Vec::new();
    for chunk in text.split(';') {
        let Some((name, value)) = chunk.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        set_declaration(&mut declarations, &name, value);
    }
    declarations
}

/// Serialize declarations back into `style` attribute text.
pub fn serialize_inline_style(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Set (or replace in place) a declaration. An empty value removes it.
pub fn set_declaration(declarations: &mut Vec<(String, String)>, name: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        declarations.retain(|(n, _)| n != name);
        return;
    }
    match declarations.iter_mut().find(|(n, _)| n == name) {
        Some(slot) => slot.1 = value.to_string(),
        None => declarations.push((name.to_string(), value.to_string())),
    }
}

/// Look up a declaration value.
pub fn get_declaration<'a>(declarations: &'a [(String, String)], name: &str) -> Option<&'a str> {
    declarations
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

/// Collapse every `-<letter>` into the uppercase letter: `font-size` becomes
/// `fontSize`. A hyphen not followed by an ASCII letter is kept.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '-' {
            if let Some(next) = chars.peek().copied().filter(char::is_ascii_alphabetic) {
                out.push(next.to_ascii_uppercase());
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Inverse of [`camel_case`]: `fontSize` becomes `font-size`.
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Split a CSS value such as `12.5px`, `-3`, `50%` into number and unit.
///
/// Returns `None` if the value does not start with a number.
pub fn parse_numeric(value: &str) -> Option<(f64, String)> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0)))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    let number = value[..end].parse::<f64>().ok()?;
    let unit = value[end..].trim();
    if unit.chars().all(|c| c.is_ascii_alphabetic() || c == '%') {
        Some((number, unit.to_string()))
    } else {
        None
    }
}

/// Format a number the way computed styles report it: integers without a
/// fraction, other values rounded to at most four decimals.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let text = format!("{value:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Render a target value for `property`: bare decimal numbers get `px`
/// unless the property is unitless.
pub fn with_default_unit(property: &str, value: &str) -> String {
    let value = value.trim();
    let bare = matches!(parse_numeric(value), Some((_, unit)) if unit.is_empty());
    if bare && !is_unitless(property) {
        format!("{value}px")
    } else {
        value.to_string()
    }
}
