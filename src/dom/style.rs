//! Inline and computed style, CSS transitions, layout queries.
//!
//! Setting a numeric inline value while the element's own `transition`
//! declaration covers the property starts a [`RunningTransition`]. Computed
//! style reports the interpolated value until the transition ends, at which
//! point the document dispatches `transitionend`.

use crate::css::declarations::{
    format_number, get_declaration, kebab_case, parse_numeric, set_declaration,
};
use crate::css::timing::{parse_transition, TimingFunction};
use crate::geometry::Region;
use crate::layout::resolve::default_display;

use super::node::NodeId;
use super::tree::Dom;

/// Properties whose computed value comes from the parent when not set.
const INHERITED: &[&str] = &["color", "font-family", "font-size", "line-height", "visibility"];

/// A transition in flight on one property of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningTransition {
    pub property: String,
    from: f64,
    to: f64,
    unit: String,
    start_ms: u64,
    delay_ms: f64,
    duration_ms: f64,
    timing: TimingFunction,
    /// Virtual time at which the transition ends.
    pub end_ms: u64,
}

impl RunningTransition {
    /// Interpolated numeric value at virtual time `now`.
    pub fn value_at(&self, now: u64) -> f64 {
        let elapsed = now.saturating_sub(self.start_ms) as f64 - self.delay_ms;
        if elapsed <= 0.0 {
            return self.from;
        }
        let progress = (elapsed / self.duration_ms).min(1.0);
        self.from + (self.to - self.from) * self.timing.evaluate(progress)
    }

    fn css_value_at(&self, now: u64) -> String {
        format!("{}{}", format_number(self.value_at(now)), self.unit)
    }
}

/// Numeric start and end compatible for interpolation. A unitless zero takes
/// the other side's unit.
fn interpolation_endpoints(from: &str, to: &str) -> Option<(f64, f64, String)> {
    let (a, unit_a) = parse_numeric(from)?;
    let (b, unit_b) = parse_numeric(to)?;
    let unit = match (unit_a.as_str(), unit_b.as_str()) {
        (x, y) if x == y => unit_a.clone(),
        ("", _) if a == 0.0 => unit_b.clone(),
        (_, "") if b == 0.0 => unit_a.clone(),
        _ => return None,
    };
    Some((a, b, unit))
}

fn initial_value(property: &str) -> &'static str {
    match property {
        "opacity" => "1",
        "visibility" => "visible",
        "color" => "rgb(0, 0, 0)",
        "font-size" => "16px",
        "position" => "static",
        "transition" => "all 0s ease 0s",
        "z-index" | "top" | "left" | "right" | "bottom" => "auto",
        p if p.starts_with("margin") || p.starts_with("padding") => "0px",
        _ => "",
    }
}

impl Dom {
    /// The element's own inline declaration of `property`.
    pub fn inline_style(&self, id: NodeId, property: &str) -> Option<String> {
        let property = kebab_case(property);
        let node = self.get(id)?;
        get_declaration(&node.style, &property).map(str::to_string)
    }

    /// Set (or with an empty value, remove) an inline declaration.
    ///
    /// A change to a numeric value on a connected element whose `transition`
    /// declaration covers `property` with a positive duration starts a
    /// transition from the current computed value. Setting `transition`
    /// to `none` (or removing it) cancels the element's running transitions
    /// without events.
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        let property = kebab_case(property).to_ascii_lowercase();
        if !self.is_element(id) {
            return;
        }

        if property == "transition" {
            if let Some(node) = self.nodes.get_mut(id) {
                set_declaration(&mut node.style, &property, value);
            }
            let active = parse_transition(value).iter().any(|t| t.duration_ms + t.delay_ms > 0.0);
            if !active {
                self.cancel_transitions(id);
            }
            return;
        }

        let previous = self.computed_style(id, &property);
        if let Some(node) = self.nodes.get_mut(id) {
            set_declaration(&mut node.style, &property, value);
        }
        self.invalidate_layout();
        self.start_transition(id, &property, &previous, value.trim());
    }

    fn start_transition(&mut self, id: NodeId, property: &str, from: &str, to: &str) {
        let now = self.clock.now();
        if let Some(running) = self.transitions.get_mut(id) {
            running.retain(|t| t.property != property);
            if running.is_empty() {
                self.transitions.remove(id);
            }
        }
        if !self.is_connected(id) {
            return;
        }
        let Some(spec) = self
            .inline_style(id, "transition")
            .map(|v| parse_transition(&v))
            .and_then(|list| list.into_iter().rev().find(|t| t.covers(property)))
        else {
            return;
        };
        if spec.duration_ms <= 0.0 {
            return;
        }
        let Some((from, to, unit)) = interpolation_endpoints(from, to) else {
            return;
        };
        if from == to {
            return;
        }

        let transition = RunningTransition {
            property: property.to_string(),
            from,
            to,
            unit,
            start_ms: now,
            delay_ms: spec.delay_ms.max(0.0),
            duration_ms: spec.duration_ms,
            timing: spec.timing,
            end_ms: now + (spec.delay_ms.max(0.0) + spec.duration_ms).ceil() as u64,
        };
        tracing::trace!(?id, property, from, to, end_ms = transition.end_ms, "transition started");
        if let Some(entry) = self.transitions.entry(id) {
            entry.or_default().push(transition);
        }
    }

    /// Drop every running transition of `id` without events.
    pub(crate) fn cancel_transitions(&mut self, id: NodeId) {
        if self.transitions.remove(id).is_some() {
            tracing::trace!(?id, "transitions cancelled");
        }
    }

    /// Properties of `id` currently transitioning.
    pub fn running_transitions(&self, id: NodeId) -> Vec<String> {
        self.transitions
            .get(id)
            .map(|list| list.iter().map(|t| t.property.clone()).collect())
            .unwrap_or_default()
    }

    /// Earliest end time over all running transitions.
    pub(crate) fn next_transition_end(&self) -> Option<u64> {
        self.transitions
            .values()
            .flat_map(|list| list.iter().map(|t| t.end_ms))
            .min()
    }

    /// Remove the transitions ending at or before `up_to` that end first,
    /// returning the element and property names.
    pub(crate) fn take_finished_transitions(&mut self, up_to: u64) -> Option<(NodeId, Vec<String>)> {
        let (node, end) = self
            .transitions
            .iter()
            .flat_map(|(node, list)| list.iter().map(move |t| (node, t.end_ms)))
            .filter(|&(_, end)| end <= up_to)
            .min_by_key(|&(_, end)| end)?;
        let list = self.transitions.get_mut(node)?;
        let finished: Vec<String> = list
            .iter()
            .filter(|t| t.end_ms == end)
            .map(|t| t.property.clone())
            .collect();
        list.retain(|t| t.end_ms != end);
        if list.is_empty() {
            self.transitions.remove(node);
        }
        Some((node, finished))
    }

    /// Resolved value of `property` for an element, the way a browser's
    /// computed style reports it.
    ///
    /// Resolution order: running transition, `width`/`height` from layout,
    /// inline declaration, inherited value, per-tag default `display`,
    /// initial value. Non-elements resolve to the empty string.
    pub fn computed_style(&self, id: NodeId, property: &str) -> String {
        let property = kebab_case(property).to_ascii_lowercase();
        let Some(node) = self.get(id).filter(|n| n.is_element()) else {
            return String::new();
        };

        if let Some(running) = self
            .transitions
            .get(id)
            .and_then(|list| list.iter().find(|t| t.property == property))
        {
            return running.css_value_at(self.clock.now());
        }

        if property == "width" || property == "height" {
            let displayed = self.computed_style(id, "display") != "none";
            if displayed {
                if let Some(region) = self.layout_box(id) {
                    let px = if property == "width" { region.width } else { region.height };
                    return format!("{}px", format_number(px as f64));
                }
            }
            return get_declaration(&node.style, &property)
                .unwrap_or("auto")
                .to_string();
        }

        if let Some(value) = get_declaration(&node.style, &property) {
            return value.to_string();
        }

        if INHERITED.contains(&property.as_str()) {
            if let Some(parent) = self.parent_element(id) {
                return self.computed_style(parent, &property);
            }
        }

        if property == "display" {
            return default_display(&node.tag).to_string();
        }

        initial_value(&property).to_string()
    }

    /// Bring layout up to date with the tree.
    pub fn reflow(&self) {
        if !self.layout_dirty.get() {
            return;
        }
        let mut engine = self.layout.borrow_mut();
        engine.sync_tree(self, self.viewport, self.line_height);
        engine.compute(self.viewport);
        self.layout_dirty.set(false);
    }

    /// Layout box of a connected node, relative to its parent's box.
    pub fn layout_box(&self, id: NodeId) -> Option<Region> {
        if !self.is_connected(id) {
            return None;
        }
        self.reflow();
        self.layout.borrow().get_layout(id)
    }

    /// Whether the element is rendered: connected, with a non-empty layout
    /// box, and not hidden by `display`, `visibility` or `opacity`.
    pub fn is_rendered(&self, id: NodeId) -> bool {
        if !self.is_element(id) || !self.is_connected(id) {
            return false;
        }
        let has_box = self.layout_box(id).is_some_and(Region::has_extent);
        if !has_box {
            return false;
        }
        if self.computed_style(id, "display") == "none" {
            return false;
        }
        if self.computed_style(id, "visibility") == "hidden" {
            return false;
        }
        let opacity = self.computed_style(id, "opacity");
        !parse_numeric(&opacity).is_some_and(|(v, _)| v == 0.0)
    }
}
