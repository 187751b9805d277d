//! Shared document handle: dispatch, timers, virtual time.
//!
//! [`Document`] is the `Rc<RefCell<Dom>>` every other part of the crate
//! shares. Every method that runs user code (listeners, timer callbacks)
//! takes what it needs out of the DOM first and releases the borrow before
//! calling, so callbacks are free to query and mutate the document.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use super::event::Event;
use super::node::NodeId;
use super::timers::TimerId;
use super::tree::Dom;

/// Reference-counted handle to a [`Dom`].
#[derive(Clone)]
pub struct Document(Rc<RefCell<Dom>>);

/// Non-owning handle, held by closures stored inside the DOM itself.
#[derive(Clone)]
pub struct WeakDocument(Weak<RefCell<Dom>>);

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.0.upgrade().map(Document)
    }
}

impl Document {
    pub fn new(dom: Dom) -> Self {
        Self(Rc::new(RefCell::new(dom)))
    }

    /// Shared access. Do not hold across calls that may run listeners.
    pub fn borrow(&self) -> Ref<'_, Dom> {
        self.0.borrow()
    }

    /// Exclusive access. Do not hold across calls that may run listeners.
    pub fn borrow_mut(&self) -> RefMut<'_, Dom> {
        self.0.borrow_mut()
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.0.borrow().document()
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.0.borrow().clock.now()
    }

    /// Dispatch `event` at its target and, if it bubbles, at every ancestor.
    ///
    /// The propagation path is fixed before the first listener runs.
    /// Listeners run in installation order; a listener removed by an earlier
    /// one during the same dispatch is skipped. Returns `false` if a
    /// listener called `prevent_default`.
    pub fn dispatch(&self, event: Event) -> bool {
        let path = self.0.borrow().bubble_path(event.target, event.bubbles);
        tracing::trace!(event = %event.event_type, target = ?event.target, hops = path.len(), "dispatch");

        for node in path {
            event.set_current_target(node);
            let listeners = self.0.borrow().listeners_for(node, &event.event_type);
            for listener in listeners {
                let installed = self
                    .0
                    .borrow()
                    .has_listener(node, &event.event_type, &listener);
                if !installed {
                    continue;
                }
                listener.call(&event);
                if event.immediate_stopped() {
                    break;
                }
            }
            if event.propagation_stopped() {
                break;
            }
        }
        !event.default_prevented()
    }

    /// Run `callback` once after `delay_ms` of virtual time.
    pub fn set_timeout(&self, delay_ms: u64, callback: impl Fn() + 'static) -> TimerId {
        self.0.borrow_mut().clock.schedule(delay_ms, Rc::new(callback))
    }

    /// Cancel a pending timer. Returns whether it was still pending.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        self.0.borrow_mut().clock.cancel(id)
    }

    /// Move virtual time forward by `ms`, ending transitions and firing
    /// timers in time order along the way.
    ///
    /// Each finished transition dispatches one bubbling `transitionend` per
    /// property. When a transition end and a timer fall on the same
    /// millisecond, the transition goes first.
    pub fn advance(&self, ms: u64) {
        let target = self.now().saturating_add(ms);
        loop {
            let (transition_end, timer_due) = {
                let dom = self.0.borrow();
                (dom.next_transition_end(), dom.clock.next_due())
            };
            match (transition_end, timer_due) {
                (Some(end), due) if end <= target && due.is_none_or(|d| end <= d) => {
                    let finished = {
                        let mut dom = self.0.borrow_mut();
                        dom.clock.set_now(end);
                        dom.take_finished_transitions(end)
                    };
                    if let Some((node, properties)) = finished {
                        for property in properties {
                            self.dispatch(Event::new("transitionend", node).with_property(property));
                        }
                    }
                }
                (_, Some(due)) if due <= target => {
                    let timer = {
                        let mut dom = self.0.borrow_mut();
                        dom.clock.set_now(due);
                        dom.clock.take_due(due)
                    };
                    if let Some(timer) = timer {
                        (timer.callback)();
                    }
                }
                _ => break,
            }
        }
        self.0.borrow_mut().clock.set_now(target);
    }
}
