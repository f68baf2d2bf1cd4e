#![forbid(unsafe_code)]

//! Host-driven time: a deterministic clock, a cancellable timer queue and a
//! restartable debouncer.
//!
//! Nothing here reads a wall clock. The host reports the current monotonic
//! time on every call and asks [`TimerQueue::next_deadline`] when it should
//! wake up next, which keeps every delayed effect reproducible in tests.

use core::time::Duration;

use crate::page::ElementId;

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current monotonic time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock to `now`. Earlier values are ignored.
    pub fn observe(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

/// Identifier returned by [`TimerQueue::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Deferred work, stored as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    /// Reveal a staggered text element.
    Reveal(ElementId),
    /// Put a skill bar back to the width captured before it was collapsed.
    RestoreSkillWidth { bar: ElementId, width: String },
    /// Drop a finished ripple.
    RemoveRipple(ElementId),
    /// Return a copy button to its idle label.
    ResetCopyButton(ElementId),
}

/// A timer whose deadline has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTimer {
    pub id: TimerId,
    /// Element whose removal voids the timer.
    pub owner: Option<ElementId>,
    pub action: TimerAction,
}

#[derive(Debug, Clone)]
struct PendingTimer {
    deadline: Duration,
    id: TimerId,
    owner: Option<ElementId>,
    action: TimerAction,
}

/// One-shot timers keyed by deadline.
///
/// Timers with equal deadlines fire in scheduling order.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: Vec<PendingTimer>,
}

impl TimerQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to run once `deadline` has been reached.
    pub fn schedule(
        &mut self,
        deadline: Duration,
        owner: Option<ElementId>,
        action: TimerAction,
    ) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingTimer {
            deadline,
            id,
            owner,
            action,
        });
        id
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.id != id);
        self.pending.len() != before
    }

    /// Cancel every timer owned by `element`; returns how many were dropped.
    pub fn cancel_owned_by(&mut self, element: ElementId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.owner != Some(element));
        before - self.pending.len()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|timer| timer.deadline).min()
    }

    /// Whether `id` is still pending.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|timer| timer.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every timer due at `now`, in firing order.
    pub fn drain_due(&mut self, now: Duration) -> Vec<DueTimer> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|timer| timer.deadline <= now);
        self.pending = pending;
        due.sort_by_key(|timer| (timer.deadline, timer.id));
        due.into_iter()
            .map(|timer| DueTimer {
                id: timer.id,
                owner: timer.owner,
                action: timer.action,
            })
            .collect()
    }
}

/// Cancellable deferred callback.
///
/// Every [`trigger`](Self::trigger) cancels the pending deadline and arms a
/// new one `delay` later; [`poll`](Self::poll) fires once per armed deadline.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Duration>,
}

impl Debouncer {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Restart the quiet period from `now`.
    pub fn trigger(&mut self, now: Duration) {
        self.deadline = Some(now.saturating_add(self.delay));
    }

    /// Drop the pending deadline without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Pending deadline, if armed.
    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Returns `true` exactly once when the armed deadline has passed.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn clock_is_monotonic() {
        let mut c = DeterministicClock::new();
        c.observe(ms(10));
        c.observe(ms(5));
        assert_eq!(c.now(), ms(10));
        c.advance(ms(5));
        assert_eq!(c.now(), ms(15));

        // Saturation: don't panic or wrap.
        c.observe(Duration::MAX);
        c.advance(Duration::from_secs(1));
        assert_eq!(c.now(), Duration::MAX);
    }

    #[test]
    fn due_timers_fire_in_deadline_then_schedule_order() {
        let mut q = TimerQueue::new();
        let late = q.schedule(ms(30), None, TimerAction::RemoveRipple(ElementId(1)));
        let a = q.schedule(ms(10), None, TimerAction::Reveal(ElementId(2)));
        let b = q.schedule(ms(10), None, TimerAction::Reveal(ElementId(3)));
        assert_eq!(q.next_deadline(), Some(ms(10)));

        let due = q.drain_due(ms(20));
        assert_eq!(due.iter().map(|t| t.id).collect::<Vec<_>>(), vec![a, b]);
        assert!(q.is_pending(late));
        assert_eq!(q.next_deadline(), Some(ms(30)));
        assert!(q.drain_due(ms(29)).is_empty());
        assert_eq!(q.drain_due(ms(30)).len(), 1);
        assert!(q.is_empty());
    }

    #[test]
    fn cancel_by_id_and_owner() {
        let mut q = TimerQueue::new();
        let owner = ElementId(7);
        let a = q.schedule(ms(5), Some(owner), TimerAction::ResetCopyButton(owner));
        q.schedule(ms(6), Some(owner), TimerAction::RemoveRipple(owner));
        let other = q.schedule(ms(7), None, TimerAction::Reveal(ElementId(1)));

        assert!(q.cancel(a));
        assert!(!q.cancel(a));
        assert_eq!(q.cancel_owned_by(owner), 1);
        assert_eq!(q.len(), 1);
        assert!(q.is_pending(other));
    }

    #[test]
    fn debouncer_restarts_on_each_trigger() {
        let mut d = Debouncer::new(ms(100));
        assert!(!d.poll(ms(0)));

        d.trigger(ms(0));
        d.trigger(ms(60));
        assert!(!d.poll(ms(100)));
        assert_eq!(d.deadline(), Some(ms(160)));
        assert!(d.poll(ms(160)));
        assert!(!d.poll(ms(500)));

        d.trigger(ms(600));
        d.cancel();
        assert!(!d.poll(ms(1000)));
    }
}
