//! CSS transitions: timing functions and the `transition` shorthand.

/// Curve used for `linear` animations.
pub const LINEAR_BEZIER: &str = "cubic-bezier(0.25, 0.25, 0.75, 0.75)";
/// Curve used for `swing` animations, and for unrecognized easings.
pub const SWING_BEZIER: &str = "cubic-bezier(0.02, 0.01, 0.47, 1)";

/// CSS transition timing function.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TimingFunction {
    /// linear
    Linear,
    /// ease
    #[default]
    Ease,
    /// ease-in
    EaseIn,
    /// ease-out
    EaseOut,
    /// ease-in-out
    EaseInOut,
    /// cubic-bezier(x1, y1, x2, y2)
    CubicBezier(f64, f64, f64, f64),
}

impl TimingFunction {
    /// Evaluate the timing function at progress `t` (clamped to 0.0..=1.0).
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            TimingFunction::Linear => t,
            TimingFunction::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            TimingFunction::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            TimingFunction::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            TimingFunction::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            TimingFunction::CubicBezier(x1, y1, x2, y2) => cubic_bezier(x1, y1, x2, y2, t),
        }
    }

    /// Parse a timing keyword or `cubic-bezier(...)` function.
    pub fn parse(s: &str) -> Option<TimingFunction> {
        let s = s.trim();
        match s {
            "linear" => Some(TimingFunction::Linear),
            "ease" => Some(TimingFunction::Ease),
            "ease-in" => Some(TimingFunction::EaseIn),
            "ease-out" => Some(TimingFunction::EaseOut),
            "ease-in-out" => Some(TimingFunction::EaseInOut),
            _ => {
                let inner = s.strip_prefix("cubic-bezier(")?.strip_suffix(')')?;
                let vals = inner
                    .split(',')
                    .map(|v| v.trim().parse::<f64>().ok())
                    .collect::<Option<Vec<f64>>>()?;
                match vals.as_slice() {
                    &[x1, y1, x2, y2] if (0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2) => {
                        Some(TimingFunction::CubicBezier(x1, y1, x2, y2))
                    }
                    _ => None,
                }
            }
        }
    }
}

/// Map an animation easing name onto a CSS timing function string.
///
/// `ease`, `ease-in`, `ease-out`, `ease-in-out` and well-formed
/// `cubic-bezier(...)` pass through; `linear` and `swing` map to fixed curves;
/// anything else behaves as `swing`.
pub fn normalize_easing(easing: Option<&str>) -> String {
    let Some(easing) = easing.map(str::trim) else {
        return SWING_BEZIER.to_string();
    };
    match easing {
        "linear" => LINEAR_BEZIER.to_string(),
        "swing" => SWING_BEZIER.to_string(),
        "ease" | "ease-in" | "ease-out" | "ease-in-out" => easing.to_string(),
        _ if easing.starts_with("cubic-bezier(") && TimingFunction::parse(easing).is_some() => {
            easing.to_string()
        }
        _ => SWING_BEZIER.to_string(),
    }
}

/// Cubic bezier evaluation (Newton-Raphson on the x component).
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, t: f64) -> f64 {
    let mut guess = t;
    for _ in 0..8 {
        let x = bezier_component(x1, x2, guess) - t;
        if x.abs() < 1e-6 {
            break;
        }
        let dx = bezier_derivative(x1, x2, guess);
        if dx.abs() < 1e-6 {
            break;
        }
        guess = (guess - x / dx).clamp(0.0, 1.0);
    }
    bezier_component(y1, y2, guess)
}

fn bezier_component(p1: f64, p2: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;
    3.0 * mt2 * t * p1 + 3.0 * mt * t2 * p2 + t3
}

fn bezier_derivative(p1: f64, p2: f64, t: f64) -> f64 {
    let t2 = t * t;
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t2 * (1.0 - p2)
}

/// One entry of a `transition` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Property being transitioned (`all` covers every property).
    pub property: String,
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub timing: TimingFunction,
}

impl Transition {
    /// Whether this entry applies to `property` (kebab-case).
    pub fn covers(&self, property: &str) -> bool {
        self.property == "all" || self.property == property
    }
}

/// Parse a `transition` value such as `all 300ms ease-in, opacity 1s`.
///
/// `none` and unparsable entries yield nothing. Entries with a zero duration
/// are kept; callers decide whether they start anything.
pub fn parse_transition(value: &str) -> Vec<Transition> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Vec::new();
    }
    split_top_level(value, ',')
        .into_iter()
        .filter_map(|entry| parse_entry(&entry))
        .collect()
}

fn parse_entry(entry: &str) -> Option<Transition> {
    let mut transition = Transition {
        property: "all".to_string(),
        duration_ms: 0.0,
        delay_ms: 0.0,
        timing: TimingFunction::Ease,
    };
    let mut seen_duration = false;
    for part in split_top_level(entry, ' ') {
        if let Some(ms) = parse_time(&part) {
            if seen_duration {
                transition.delay_ms = ms;
            } else {
                transition.duration_ms = ms;
                seen_duration = true;
            }
        } else if let Some(timing) = TimingFunction::parse(&part) {
            transition.timing = timing;
        } else if part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            transition.property = part.to_ascii_lowercase();
        } else {
            return None;
        }
    }
    Some(transition)
}

fn parse_time(s: &str) -> Option<f64> {
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse().ok()
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<f64>().ok().map(|v| v * 1000.0)
    } else {
        None
    }
}

/// Split on `sep` outside parentheses, trimming and dropping empty pieces.
fn split_top_level(input: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in input.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        let is_sep = depth == 0 && (c == sep || (sep == ' ' && c.is_whitespace()));
        if is_sep {
            if !current.trim().is_empty() {
                parts.push(current.trim().to_string());
            }
            current.clear();
        } else {
            current.push(c);
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_endpoints() {
        for timing in [
            TimingFunction::Linear,
            TimingFunction::Ease,
            TimingFunction::EaseInOut,
            TimingFunction::CubicBezier(0.02, 0.01, 0.47, 1.0),
        ] {
            assert!(timing.evaluate(0.0).abs() < 1e-6);
            assert!((timing.evaluate(1.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn timing_linear_midpoint() {
        assert_eq!(TimingFunction::Linear.evaluate(0.5), 0.5);
        let bezier_linear = TimingFunction::parse(LINEAR_BEZIER).unwrap();
        assert!((bezier_linear.evaluate(0.5) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn timing_ease_is_ahead() {
        assert!(TimingFunction::Ease.evaluate(0.5) > 0.5);
    }

    #[test]
    fn parse_bezier_rejects_bad_input() {
        assert!(TimingFunction::parse("cubic-bezier(1, 2)").is_none());
        assert!(TimingFunction::parse("cubic-bezier(2, 0, 0.5, 1)").is_none());
        assert!(TimingFunction::parse("bounce").is_none());
    }

    #[test]
    fn transition_shorthand() {
        let list = parse_transition("all 300ms cubic-bezier(0.25, 0.25, 0.75, 0.75), opacity 1s ease-in 50ms");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].property, "all");
        assert_eq!(list[0].duration_ms, 300.0);
        assert_eq!(list[0].timing, TimingFunction::CubicBezier(0.25, 0.25, 0.75, 0.75));
        assert_eq!(list[1].property, "opacity");
        assert_eq!(list[1].duration_ms, 1000.0);
        assert_eq!(list[1].delay_ms, 50.0);
        assert_eq!(list[1].timing, TimingFunction::EaseIn);
        assert!(list[1].covers("opacity"));
        assert!(!list[1].covers("width"));
    }

    #[test]
    fn transition_none() {
        assert!(parse_transition("none").is_empty());
        assert!(parse_transition("").is_empty());
    }

    #[test]
    fn easing_names() {
        assert_eq!(normalize_easing(Some("linear")), LINEAR_BEZIER);
        assert_eq!(normalize_easing(Some("swing")), SWING_BEZIER);
        assert_eq!(normalize_easing(Some("ease-out")), "ease-out");
        assert_eq!(normalize_easing(Some("cubic-bezier(0.1, 0.2, 0.3, 0.4)")), "cubic-bezier(0.1, 0.2, 0.3, 0.4)");
        assert_eq!(normalize_easing(Some("bounce")), SWING_BEZIER);
        assert_eq!(normalize_easing(None), SWING_BEZIER);
    }
}
