//! Virtual clock and one-shot timers.
//!
//! Time only moves when [`Document::advance`](super::Document::advance) is
//! called, which makes animations deterministic under test.

use std::fmt;
use std::rc::Rc;

/// Handle returned by `set_timeout`, used to cancel the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

pub(crate) struct Timer {
    pub(crate) id: TimerId,
    pub(crate) due_ms: u64,
    pub(crate) callback: Rc<dyn Fn()>,
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("due_ms", &self.due_ms)
            .finish()
    }
}

/// Current virtual time plus pending timers.
#[derive(Debug, Default)]
pub struct Clock {
    now_ms: u64,
    timers: Vec<Timer>,
    next_id: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds since the document was created.
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    pub(crate) fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Schedule `callback` to run `delay_ms` from now.
    pub(crate) fn schedule(&mut self, delay_ms: u64, callback: Rc<dyn Fn()>) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.push(Timer {
            id,
            due_ms: self.now_ms.saturating_add(delay_ms),
            callback,
        });
        id
    }

    /// Cancel a pending timer. Returns whether it was pending.
    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        before != self.timers.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Due time of the earliest pending timer.
    pub(crate) fn next_due(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due_ms).min()
    }

    /// Remove and return the earliest timer due at or before `up_to`.
    /// Timers due at the same time run in scheduling order.
    pub(crate) fn take_due(&mut self, up_to: u64) -> Option<Timer> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= up_to)
            .min_by_key(|(_, t)| (t.due_ms, t.id.0))
            .map(|(i, _)| i)?;
        Some(self.timers.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Rc<dyn Fn()> {
        Rc::new(|| {})
    }

    #[test]
    fn timers_come_out_in_due_order() {
        let mut clock = Clock::new();
        let late = clock.schedule(100, noop());
        let early = clock.schedule(10, noop());
        let tie = clock.schedule(10, noop());

        assert_eq!(clock.next_due(), Some(10));
        assert_eq!(clock.take_due(50).map(|t| t.id), Some(early));
        assert_eq!(clock.take_due(50).map(|t| t.id), Some(tie));
        assert!(clock.take_due(50).is_none());
        assert!(clock.is_pending(late));
    }

    #[test]
    fn cancel_removes() {
        let mut clock = Clock::new();
        let id = clock.schedule(5, noop());
        assert!(clock.cancel(id));
        assert!(!clock.cancel(id));
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn time_never_goes_back() {
        let mut clock = Clock::new();
        clock.set_now(20);
        clock.set_now(10);
        assert_eq!(clock.now(), 20);
    }
}
