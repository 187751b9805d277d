//! Pilot: programmatic interaction with a headless page.

use crate::config::Config;
use crate::dom::event::Event;
use crate::dom::fragment::FragmentError;
use crate::page::Page;
use crate::selection::Selection;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A page driver for tests.
///
/// # Examples
///
/// ```
/// use domkit::testing::Pilot;
///
/// let pilot = Pilot::from_html(r#"<button id="go">Go</button>"#).unwrap();
/// assert_eq!(pilot.click("#go"), 1);
/// pilot.advance(100);
/// assert_eq!(pilot.now(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct Pilot {
    page: Page,
}

impl Pilot {
    /// A pilot over an empty page.
    pub fn new() -> Self {
        Self { page: Page::new() }
    }

    /// A pilot over an empty page with the given config.
    pub fn with_config(config: Config) -> Self {
        Self {
            page: Page::with_config(config),
        }
    }

    /// A pilot whose document holds `html`.
    pub fn from_html(html: &str) -> Result<Self, FragmentError> {
        let pilot = Self::new();
        pilot.page.load(html)?;
        Ok(pilot)
    }

    // ── Input simulation ─────────────────────────────────────────────

    /// Dispatch a bubbling `click` on every element matching `selector`.
    /// Returns how many elements were clicked.
    pub fn click(&self, selector: &str) -> usize {
        self.dispatch(selector, "click")
    }

    /// Dispatch a bubbling `event_type` on every element matching
    /// `selector`. Returns how many elements received it.
    pub fn dispatch(&self, selector: &str, event_type: &str) -> usize {
        let targets = self.page.select(selector);
        for &node in targets.nodes() {
            self.page.document().dispatch(Event::new(event_type, node));
        }
        targets.len()
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Move virtual time forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.page.advance(ms);
    }

    pub fn now(&self) -> u64 {
        self.page.now()
    }

    // ── Query ────────────────────────────────────────────────────────

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Shorthand for `page().select(selector)`.
    pub fn select(&self, selector: &str) -> Selection {
        self.page.select(selector)
    }
}

impl Default for Pilot {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
