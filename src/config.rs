//! Page configuration: viewport, text metrics, animation timings.

use crate::geometry::Size;

/// Configuration for a [`Page`](crate::page::Page).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Size of the initial containing block in CSS pixels.
    pub viewport: Size,
    /// Height of one line of text, used when measuring text nodes.
    pub line_height: f32,
    /// Duration used by `animate` when no speed is given.
    pub default_duration_ms: u64,
    /// Duration of the `"fast"` speed.
    pub fast_duration_ms: u64,
    /// Duration of the `"slow"` speed.
    pub slow_duration_ms: u64,
    /// Extra time after a transition's duration before the fallback timer
    /// forces completion.
    pub completion_grace_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            viewport: Size::new(1024.0, 768.0),
            line_height: 16.0,
            default_duration_ms: 400,
            fast_duration_ms: 200,
            slow_duration_ms: 600,
            completion_grace_ms: 50,
        }
    }
}

impl Config {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the viewport size (builder).
    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = Size::new(width, height);
        self
    }

    /// Set the text line height (builder).
    pub fn with_line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height;
        self
    }

    /// Set the default animation duration (builder).
    pub fn with_default_duration(mut self, ms: u64) -> Self {
        self.default_duration_ms = ms;
        self
    }

    /// Set the durations of the named `"fast"` and `"slow"` speeds (builder).
    pub fn with_named_speeds(mut self, fast_ms: u64, slow_ms: u64) -> Self {
        self.fast_duration_ms = fast_ms;
        self.slow_duration_ms = slow_ms;
        self
    }

    /// Set the fallback grace period for animation completion (builder).
    pub fn with_completion_grace(mut self, ms: u64) -> Self {
        self.completion_grace_ms = ms;
        self
    }
}
