//! Property animation on top of host transitions.
//!
//! [`Animator::animate`] freezes the current computed values as inline
//! styles, declares a transition, then writes the target values so the host
//! interpolates between the two. Completion arrives through `transitionend`
//! or, when the host never runs a transition (detached element, unchanged
//! value, non-numeric property), through a fallback timer. Both go through
//! one cleanup path guarded by the descriptor's `animating` flag.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::Config;
use crate::css::declarations::{kebab_case, with_default_unit};
use crate::css::timing::normalize_easing;
use crate::dom::document::{Document, WeakDocument};
use crate::dom::event::{Event, Listener};
use crate::dom::node::NodeId;
use crate::dom::timers::TimerId;

use super::data::ElementStore;

/// Called once per element when its animation completes.
pub type Completion = Rc<dyn Fn(NodeId)>;

// ---------------------------------------------------------------------------
// Speed
// ---------------------------------------------------------------------------

/// Animation duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Speed {
    Fast,
    Slow,
    Millis(u64),
    #[default]
    Default,
}

impl Speed {
    pub fn duration_ms(self, config: &Config) -> u64 {
        match self {
            Speed::Fast => config.fast_duration_ms,
            Speed::Slow => config.slow_duration_ms,
            Speed::Millis(ms) => ms,
            Speed::Default => config.default_duration_ms,
        }
    }
}

impl From<u64> for Speed {
    fn from(ms: u64) -> Self {
        Speed::Millis(ms)
    }
}

impl From<&str> for Speed {
    /// `"fast"`, `"slow"`, a millisecond count, or anything else for the
    /// default.
    fn from(name: &str) -> Self {
        match name.trim() {
            "fast" => Speed::Fast,
            "slow" => Speed::Slow,
            other => other.parse().map(Speed::Millis).unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

/// What to animate and how.
#[derive(Clone, Default)]
pub struct Animation {
    pub properties: Vec<(String, String)>,
    pub speed: Speed,
    pub easing: Option<String>,
    pub on_complete: Option<Completion>,
}

impl Animation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target value. Bare numbers get `px` unless the property is
    /// unitless.
    pub fn property(mut self, name: &str, value: impl ToString) -> Self {
        self.properties.push((name.to_string(), value.to_string()));
        self
    }

    pub fn speed(mut self, speed: impl Into<Speed>) -> Self {
        self.speed = speed.into();
        self
    }

    pub fn easing(mut self, easing: &str) -> Self {
        self.easing = Some(easing.to_string());
        self
    }

    pub fn on_complete(mut self, callback: impl Fn(NodeId) + 'static) -> Self {
        self.on_complete = Some(Rc::new(callback));
        self
    }

    /// Target declarations with kebab-case names and units applied.
    fn targets(&self) -> Vec<(String, String)> {
        self.properties
            .iter()
            .map(|(name, value)| {
                let name = kebab_case(name).to_ascii_lowercase();
                let value = with_default_unit(&name, value);
                (name, value)
            })
            .collect()
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("properties", &self.properties)
            .field("speed", &self.speed)
            .field("easing", &self.easing)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AnimationDescriptor
// ---------------------------------------------------------------------------

/// The one animation an element may have in flight.
#[derive(Default)]
pub struct AnimationDescriptor {
    /// Target declarations, in the order given.
    pub target: Vec<(String, String)>,
    listener: Option<Listener>,
    timer: Option<TimerId>,
    pub animating: bool,
    on_complete: Option<Completion>,
}

impl fmt::Debug for AnimationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationDescriptor")
            .field("target", &self.target)
            .field("timer", &self.timer)
            .field("animating", &self.animating)
            .finish()
    }
}

/// Handles taken out of a descriptor when it is retired.
struct Retired {
    target: Vec<(String, String)>,
    listener: Option<Listener>,
    timer: Option<TimerId>,
    on_complete: Option<Completion>,
}

impl ElementStore {
    /// Whether `element` has an animation in flight.
    pub fn is_animating(&self, element: NodeId) -> bool {
        self.animations.get(element).is_some_and(|d| d.animating)
    }

    /// The in-flight animation's target declarations.
    pub fn animation_target(&self, element: NodeId) -> Option<&[(String, String)]> {
        self.animations
            .get(element)
            .filter(|d| d.animating)
            .map(|d| d.target.as_slice())
    }

    /// Clear the active descriptor of `element`, handing back its handles.
    fn retire(&mut self, element: NodeId) -> Option<Retired> {
        let descriptor = self.animations.get_mut(element).filter(|d| d.animating)?;
        descriptor.animating = false;
        Some(Retired {
            target: std::mem::take(&mut descriptor.target),
            listener: descriptor.listener.take(),
            timer: descriptor.timer.take(),
            on_complete: descriptor.on_complete.take(),
        })
    }
}

// ---------------------------------------------------------------------------
// Animator
// ---------------------------------------------------------------------------

/// Starts, stops and completes animations for one document.
#[derive(Clone)]
pub struct Animator {
    doc: Document,
    store: Rc<RefCell<ElementStore>>,
    config: Rc<Config>,
}

impl Animator {
    pub fn new(doc: Document, store: Rc<RefCell<ElementStore>>, config: Rc<Config>) -> Self {
        Self { doc, store, config }
    }

    /// Animate every element towards `animation`'s target values.
    ///
    /// A running animation on an element is stopped in place first.
    pub fn animate(&self, elements: &[NodeId], animation: &Animation) {
        let duration = animation.speed.duration_ms(&self.config);
        let easing = normalize_easing(animation.easing.as_deref());
        let targets = animation.targets();
        for &element in elements {
            if !self.doc.borrow().is_element(element) {
                continue;
            }
            self.stop_one(element, false);
            self.start_one(element, &targets, duration, &easing, animation.on_complete.clone());
        }
    }

    fn start_one(
        &self,
        element: NodeId,
        targets: &[(String, String)],
        duration: u64,
        easing: &str,
        on_complete: Option<Completion>,
    ) {
        let listener = {
            let doc = self.doc.downgrade();
            let store = Rc::downgrade(&self.store);
            Listener::new(move |event: &Event| {
                if event.target == element {
                    finish(&doc, &store, element);
                }
            })
        };

        {
            let mut dom = self.doc.borrow_mut();
            for (name, _) in targets {
                let current = dom.computed_style(element, name);
                dom.set_style(element, name, &current);
            }
            dom.set_style(element, "transition", &format!("all {duration}ms {easing}"));
            dom.reflow();
            for (name, value) in targets {
                dom.set_style(element, name, value);
            }
            dom.add_listener(element, "transitionend", listener.clone());
        }

        let timer = {
            let doc = self.doc.downgrade();
            let store = Rc::downgrade(&self.store);
            self.doc
                .set_timeout(duration + self.config.completion_grace_ms, move || finish(&doc, &store, element))
        };

        let mut store = self.store.borrow_mut();
        let Some(slot) = store.animations.entry(element) else {
            return;
        };
        *slot.or_default() = AnimationDescriptor {
            target: targets.to_vec(),
            listener: Some(listener),
            timer: Some(timer),
            animating: true,
            on_complete,
        };
        tracing::debug!(?element, duration, easing, properties = targets.len(), "animation started");
    }

    /// Stop every element's animation. With `jump_to_end` the target values
    /// are applied; otherwise the current values are frozen. Completion
    /// callbacks do not run.
    pub fn stop(&self, elements: &[NodeId], jump_to_end: bool) {
        for &element in elements {
            self.stop_one(element, jump_to_end);
        }
    }

    fn stop_one(&self, element: NodeId, jump_to_end: bool) {
        let Some(retired) = self.store.borrow_mut().retire(element) else {
            return;
        };
        let mut dom = self.doc.borrow_mut();
        if let Some(listener) = &retired.listener {
            dom.remove_listener(element, "transitionend", listener);
        }
        if let Some(timer) = retired.timer {
            dom.clock.cancel(timer);
        }
        // Live values must be read before `transition: none` drops the
        // running transitions.
        let snapshot: Vec<(String, String)> = retired
            .target
            .iter()
            .map(|(name, _)| (name.clone(), dom.computed_style(element, name)))
            .collect();
        dom.set_style(element, "transition", "none");
        let values = if jump_to_end { &retired.target } else { &snapshot };
        for (name, value) in values {
            dom.set_style(element, name, value);
        }
        dom.reflow();
        dom.set_style(element, "transition", "");
        tracing::debug!(?element, jump_to_end, "animation stopped");
    }

    pub fn is_animating(&self, element: NodeId) -> bool {
        self.store.borrow().is_animating(element)
    }
}

/// Shared completion path for `transitionend` and the fallback timer.
fn finish(doc: &WeakDocument, store: &Weak<RefCell<ElementStore>>, element: NodeId) {
    let (Some(doc), Some(store)) = (doc.upgrade(), store.upgrade()) else {
        return;
    };
    let Some(retired) = store.borrow_mut().retire(element) else {
        return;
    };
    {
        let mut dom = doc.borrow_mut();
        if let Some(listener) = &retired.listener {
            dom.remove_listener(element, "transitionend", listener);
        }
        if let Some(timer) = retired.timer {
            dom.clock.cancel(timer);
        }
        dom.set_style(element, "transition", "");
    }
    tracing::debug!(?element, "animation finished");
    if let Some(on_complete) = retired.on_complete {
        on_complete(element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fragment::load_html;
    use crate::dom::tree::Dom;
    use std::cell::Cell;

    fn setup(html: &str) -> (Document, Animator, NodeId) {
        let mut dom = Dom::new();
        load_html(&mut dom, html).unwrap();
        let el = dom.get_element_by_id("box").unwrap();
        let doc = Document::new(dom);
        let animator = Animator::new(
            doc.clone(),
            Rc::new(RefCell::new(ElementStore::new())),
            Rc::new(Config::default()),
        );
        (doc, animator, el)
    }

    fn completions() -> (Rc<Cell<u32>>, Animation) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, Animation::new().on_complete(move |_| c.set(c.get() + 1)))
    }

    #[test]
    fn speeds() {
        let config = Config::default();
        assert_eq!(Speed::from("fast").duration_ms(&config), 200);
        assert_eq!(Speed::from("slow").duration_ms(&config), 600);
        assert_eq!(Speed::from("250").duration_ms(&config), 250);
        assert_eq!(Speed::from("quick").duration_ms(&config), 400);
        assert_eq!(Speed::from(75u64).duration_ms(&config), 75);
    }

    #[test]
    fn targets_get_units() {
        let animation = Animation::new()
            .property("width", 100)
            .property("opacity", 0.5)
            .property("marginLeft", "2em");
        assert_eq!(
            animation.targets(),
            vec![
                ("width".to_string(), "100px".to_string()),
                ("opacity".to_string(), "0.5".to_string()),
                ("margin-left".to_string(), "2em".to_string()),
            ]
        );
    }

    #[test]
    fn completes_once_for_several_properties() {
        let (doc, animator, el) = setup(r#"<div id="box" style="width: 10px; height: 10px"></div>"#);
        let (count, animation) = completions();
        let animation = animation.property("width", 100).property("height", 50).speed(300u64);
        animator.animate(&[el], &animation);
        assert!(animator.is_animating(el));
        assert_eq!(doc.borrow().running_transitions(el).len(), 2);

        doc.advance(150);
        let mid = doc.borrow().computed_style(el, "width");
        assert_ne!(mid, "10px");
        assert_ne!(mid, "100px");

        doc.advance(1000);
        assert_eq!(count.get(), 1);
        assert!(!animator.is_animating(el));
        assert_eq!(doc.borrow().inline_style(el, "width").as_deref(), Some("100px"));
        assert_eq!(doc.borrow().inline_style(el, "transition"), None);
        assert_eq!(doc.borrow().listener_count(el), 0);
    }

    #[test]
    fn fallback_timer_completes_detached_element() {
        let (doc, animator, el) = setup(r#"<div id="box" style="opacity: 1"></div>"#);
        doc.borrow_mut().detach(el);
        let (count, animation) = completions();
        animator.animate(&[el], &animation.property("opacity", 0).speed(100u64));
        assert!(doc.borrow().running_transitions(el).is_empty());

        doc.advance(149);
        assert_eq!(count.get(), 0);
        doc.advance(1);
        assert_eq!(count.get(), 1);
        assert!(!animator.is_animating(el));
    }

    #[test]
    fn stop_after_completion_is_noop() {
        let (doc, animator, el) = setup(r#"<div id="box" style="opacity: 1"></div>"#);
        let (count, animation) = completions();
        animator.animate(&[el], &animation.property("opacity", 0).speed(300u64));
        doc.advance(400);
        assert_eq!(count.get(), 1);
        let before = doc.borrow().inline_style(el, "opacity");
        animator.stop(&[el], true);
        assert_eq!(doc.borrow().inline_style(el, "opacity"), before);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn stop_jump_to_end() {
        let (doc, animator, el) = setup(r#"<div id="box" style="width: 0px"></div>"#);
        let (count, animation) = completions();
        animator.animate(&[el], &animation.property("width", 200).speed(400u64));
        doc.advance(100);
        animator.stop(&[el], true);

        assert!(!animator.is_animating(el));
        assert_eq!(doc.borrow().computed_style(el, "width"), "200px");
        assert!(doc.borrow().running_transitions(el).is_empty());
        assert_eq!(doc.borrow().inline_style(el, "transition"), None);
        doc.advance(1000);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn stop_freezes_current_value() {
        let (doc, animator, el) = setup(r#"<div id="box" style="opacity: 1"></div>"#);
        animator.animate(&[el], &Animation::new().property("opacity", 0).speed(400u64).easing("linear"));
        doc.advance(200);
        let live = doc.borrow().computed_style(el, "opacity");
        animator.stop(&[el], false);
        assert_eq!(doc.borrow().inline_style(el, "opacity"), Some(live.clone()));
        doc.advance(1000);
        assert_eq!(doc.borrow().computed_style(el, "opacity"), live);
    }

    #[test]
    fn restart_retires_previous() {
        let (doc, animator, el) = setup(r#"<div id="box" style="width: 0px"></div>"#);
        let (first, animation) = completions();
        animator.animate(&[el], &animation.property("width", 100).speed(400u64));
        doc.advance(100);
        let (second, animation) = completions();
        animator.animate(&[el], &animation.property("width", 300).speed(200u64));
        doc.advance(1000);
        assert_eq!((first.get(), second.get()), (0, 1));
        assert_eq!(doc.borrow().computed_style(el, "width"), "300px");
        assert_eq!(doc.borrow().listener_count(el), 0);
    }
}
