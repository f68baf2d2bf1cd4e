#![forbid(unsafe_code)]

//! Mobile/desktop classification of the viewport width.
//!
//! Resize and orientation events only restart a quiet period; the mode is
//! re-evaluated once events have settled, and listeners hear about it only
//! when the classification actually flips.

use core::fmt;
use core::time::Duration;

use tracing::debug;

use crate::config::ViewportConfig;
use crate::timer::Debouncer;

/// Coarse classification of the page width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportMode {
    Desktop,
    Mobile,
}

impl ViewportMode {
    /// `Mobile` iff `width <= mobile_max_width`.
    #[must_use]
    pub fn classify(width: f64, mobile_max_width: f64) -> Self {
        if width <= mobile_max_width {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    #[must_use]
    pub const fn is_mobile(self) -> bool {
        matches!(self, Self::Mobile)
    }
}

/// Result of a settled resize burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSettle {
    /// Mode after settling.
    pub mode: ViewportMode,
    /// Whether `mode` differs from the mode before the burst.
    pub changed: bool,
}

type ModeListener = Box<dyn FnMut(ViewportMode)>;

/// Tracks the viewport width and its settled [`ViewportMode`].
pub struct ViewportClassifier {
    mobile_max_width: f64,
    width: f64,
    mode: ViewportMode,
    settle: Debouncer,
    listeners: Vec<ModeListener>,
}

impl fmt::Debug for ViewportClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportClassifier")
            .field("mobile_max_width", &self.mobile_max_width)
            .field("width", &self.width)
            .field("mode", &self.mode)
            .field("settle", &self.settle)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ViewportClassifier {
    /// Create a classifier for an initial viewport `width`.
    #[must_use]
    pub fn new(config: &ViewportConfig, width: f64) -> Self {
        Self {
            mobile_max_width: config.mobile_max_width,
            width,
            mode: ViewportMode::classify(width, config.mobile_max_width),
            settle: Debouncer::new(Duration::from_millis(config.settle_delay_ms)),
            listeners: Vec::new(),
        }
    }

    /// Whether the most recently reported width is mobile.
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        ViewportMode::classify(self.width, self.mobile_max_width).is_mobile()
    }

    /// Last settled mode.
    #[must_use]
    pub const fn mode(&self) -> ViewportMode {
        self.mode
    }

    /// Most recently reported width.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Register a listener called with the new mode on every flip.
    pub fn on_mode_change(&mut self, listener: impl FnMut(ViewportMode) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Record a resize or orientation change and restart the quiet period.
    pub fn observe_resize(&mut self, width: f64, now: Duration) {
        self.width = width;
        self.settle.trigger(now);
    }

    /// Record a width without debouncing and settle immediately.
    ///
    /// Used for late layout corrections such as the page `load` event.
    pub fn settle_now(&mut self, width: f64) -> ViewportSettle {
        self.width = width;
        self.settle.cancel();
        self.reclassify()
    }

    /// Deadline of the pending settle, if a resize burst is in progress.
    #[must_use]
    pub const fn pending_deadline(&self) -> Option<Duration> {
        self.settle.deadline()
    }

    /// Settle the classification if the quiet period has elapsed.
    pub fn poll(&mut self, now: Duration) -> Option<ViewportSettle> {
        if self.settle.poll(now) {
            Some(self.reclassify())
        } else {
            None
        }
    }

    fn reclassify(&mut self) -> ViewportSettle {
        let mode = ViewportMode::classify(self.width, self.mobile_max_width);
        let changed = mode != self.mode;
        if changed {
            debug!(from = ?self.mode, to = ?mode, width = self.width, "viewport mode changed");
            self.mode = mode;
            for listener in &mut self.listeners {
                listener(mode);
            }
        }
        ViewportSettle { mode, changed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(ViewportMode::classify(768.0, 768.0), ViewportMode::Mobile);
        assert_eq!(ViewportMode::classify(768.5, 768.0), ViewportMode::Desktop);
        assert_eq!(ViewportMode::classify(320.0, 768.0), ViewportMode::Mobile);
    }

    #[test]
    fn is_mobile_tracks_latest_width_before_settling() {
        let mut v = ViewportClassifier::new(&ViewportConfig::default(), 1024.0);
        v.observe_resize(500.0, ms(0));
        assert!(v.is_mobile());
        assert_eq!(v.mode(), ViewportMode::Desktop);
        assert_eq!(v.pending_deadline(), Some(ms(100)));
    }

    #[test]
    fn listeners_fire_only_on_flips_after_settle() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut v = ViewportClassifier::new(&ViewportConfig::default(), 1024.0);
        let sink = Rc::clone(&seen);
        v.on_mode_change(move |mode| sink.borrow_mut().push(mode));

        // Interactive drag through the threshold and back: no flip.
        v.observe_resize(700.0, ms(0));
        v.observe_resize(900.0, ms(50));
        assert_eq!(v.poll(ms(100)), None);
        assert_eq!(
            v.poll(ms(150)),
            Some(ViewportSettle {
                mode: ViewportMode::Desktop,
                changed: false,
            })
        );
        assert!(seen.borrow().is_empty());

        v.observe_resize(600.0, ms(200));
        let settle = v.poll(ms(300)).expect("settled");
        assert!(settle.changed);
        assert_eq!(*seen.borrow(), vec![ViewportMode::Mobile]);

        // Resizing within the same mode settles without notifying.
        v.observe_resize(400.0, ms(400));
        assert_eq!(v.poll(ms(500)).map(|s| s.changed), Some(false));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn settle_now_cancels_pending_burst() {
        let mut v = ViewportClassifier::new(&ViewportConfig::default(), 1200.0);
        v.observe_resize(1000.0, ms(0));
        let settle = v.settle_now(500.0);
        assert_eq!(settle.mode, ViewportMode::Mobile);
        assert!(settle.changed);
        assert_eq!(v.pending_deadline(), None);
        assert_eq!(v.poll(ms(1000)), None);
    }
}
