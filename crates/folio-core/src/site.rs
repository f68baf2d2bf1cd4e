#![forbid(unsafe_code)]

//! The page runtime.
//!
//! [`Site`] owns one instance of every controller plus the timer queue, and
//! turns host [`PageEvent`]s into page mutations and [`HostRequest`]s:
//!
//! - push events via [`Site::handle`],
//! - run delayed work via [`Site::advance_to`],
//! - sleep until [`Site::next_deadline`].
//!
//! Controllers attach on [`PageEvent::Ready`]; everything before that is
//! dropped.

use core::time::Duration;

use tracing::{debug, trace};

use crate::config::SiteConfig;
use crate::copy::CopyButtons;
use crate::effects::{LazyImages, Ripples};
use crate::host::{Dispatch, HostRequest, ObserverGroup, PageEvent};
use crate::links::{AnchorClick, ClickableRows, SmoothAnchors};
use crate::nav::{NavClick, NavigationController};
use crate::page::{ElementId, Page};
use crate::reveal::{self, VisibilityRevealController};
use crate::scroll::ScrollEffectsController;
use crate::timer::{DeterministicClock, TimerAction, TimerQueue};
use crate::viewport::{ViewportClassifier, ViewportMode};

#[derive(Debug, Clone)]
struct Controllers {
    nav: NavigationController,
    scroll: ScrollEffectsController,
    reveal: VisibilityRevealController,
    copy: CopyButtons,
    lazy: LazyImages,
}

/// Every page behavior, driven by the host.
#[derive(Debug)]
pub struct Site {
    config: SiteConfig,
    clock: DeterministicClock,
    timers: TimerQueue,
    viewport: ViewportClassifier,
    ripples: Ripples,
    rows: ClickableRows,
    anchors: SmoothAnchors,
    attached: Option<Controllers>,
}

impl Site {
    /// Create a runtime for a viewport `width` wide. Nothing touches the
    /// page until [`PageEvent::Ready`].
    #[must_use]
    pub fn new(config: SiteConfig, width: f64) -> Self {
        Self {
            viewport: ViewportClassifier::new(&config.viewport, width),
            ripples: Ripples::new(&config.ripple),
            rows: ClickableRows::new(&config.rows),
            anchors: SmoothAnchors::new(&config.anchors),
            clock: DeterministicClock::new(),
            timers: TimerQueue::new(),
            attached: None,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SiteConfig {
        &self.config
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.clock.now()
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.attached.is_some()
    }

    #[must_use]
    pub const fn viewport(&self) -> &ViewportClassifier {
        &self.viewport
    }

    /// Mutable access for registering mode listeners.
    pub fn viewport_mut(&mut self) -> &mut ViewportClassifier {
        &mut self.viewport
    }

    #[must_use]
    pub const fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    #[must_use]
    pub fn nav(&self) -> Option<&NavigationController> {
        self.attached.as_ref().map(|c| &c.nav)
    }

    #[must_use]
    pub fn scroll(&self) -> Option<&ScrollEffectsController> {
        self.attached.as_ref().map(|c| &c.scroll)
    }

    #[must_use]
    pub fn reveal(&self) -> Option<&VisibilityRevealController> {
        self.attached.as_ref().map(|c| &c.reveal)
    }

    #[must_use]
    pub fn copy_buttons(&self) -> Option<&CopyButtons> {
        self.attached.as_ref().map(|c| &c.copy)
    }

    #[must_use]
    pub fn lazy_images(&self) -> Option<&LazyImages> {
        self.attached.as_ref().map(|c| &c.lazy)
    }

    /// Earliest time at which [`advance_to`](Self::advance_to) has work.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.timers.next_deadline(), self.viewport.pending_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Dispatch one host event observed at `now`.
    pub fn handle(&mut self, page: &mut impl Page, now: Duration, event: PageEvent) -> Dispatch {
        self.clock.observe(now);
        let now = self.clock.now();
        let mut dispatch = Dispatch::default();

        if let PageEvent::Ready = event {
            if self.attached.is_none() {
                dispatch.requests = self.attach(page);
            }
            return dispatch;
        }
        let Some(controllers) = self.attached.as_mut() else {
            trace!(?event, "event before ready dropped");
            return dispatch;
        };

        match event {
            PageEvent::Ready => {}
            PageEvent::Load { width } => {
                let settle = self.viewport.settle_now(width);
                controllers.nav.apply_layout(page, settle.mode);
            }
            PageEvent::Resize { width } => self.viewport.observe_resize(width, now),
            PageEvent::Scroll(metrics) => {
                let mode = if self.viewport.is_mobile() {
                    ViewportMode::Mobile
                } else {
                    ViewportMode::Desktop
                };
                controllers.scroll.on_scroll(page, metrics, mode);
            }
            PageEvent::Click { target, x, y } => {
                if controllers.nav.handle_click(page, target) == NavClick::Consumed {
                    return dispatch;
                }
                if let Some(request) = controllers.copy.handle_click(page, target) {
                    dispatch.requests.push(request);
                }
                self.ripples
                    .handle_click(page, &mut self.timers, now, target, x, y);
                if let AnchorClick::Handled { .. } = self.anchors.handle_click(page, target) {
                    dispatch.prevent_default = true;
                }
                self.rows.handle_click(page, target);
            }
            PageEvent::KeyDown { key } => {
                controllers.nav.handle_key(page, &key);
            }
            PageEvent::Intersection { group, entries } => {
                dispatch.requests = match group {
                    ObserverGroup::LazyImage => controllers.lazy.on_intersection(page, &entries),
                    ObserverGroup::Fade | ObserverGroup::Skill | ObserverGroup::Text => controllers
                        .reveal
                        .on_intersection(page, &mut self.timers, now, &entries),
                };
            }
            PageEvent::ImageLoaded { image } => controllers.lazy.on_loaded(page, image),
            PageEvent::ClipboardResult { button, result } => {
                controllers
                    .copy
                    .complete(page, &mut self.timers, now, button, result);
            }
        }
        dispatch
    }

    /// Run everything due at `now`: a settled resize burst, then timers in
    /// deadline order. Timers whose owner left the page are dropped.
    pub fn advance_to(&mut self, page: &mut impl Page, now: Duration) {
        self.clock.observe(now);
        let now = self.clock.now();

        if let Some(settle) = self.viewport.poll(now)
            && let Some(controllers) = self.attached.as_mut()
            && (settle.changed || settle.mode.is_mobile())
        {
            controllers.nav.apply_layout(page, settle.mode);
        }

        for due in self.timers.drain_due(now) {
            if let Some(owner) = due.owner
                && !page.is_connected(owner)
            {
                trace!(owner = owner.0, "timer owner detached; dropped");
                continue;
            }
            match due.action {
                TimerAction::Reveal(target) => reveal::reveal(page, target),
                TimerAction::RestoreSkillWidth { bar, width } => {
                    reveal::restore_skill_width(page, bar, &width);
                }
                TimerAction::RemoveRipple(ripple) => page.remove_element(ripple),
                TimerAction::ResetCopyButton(button) => {
                    if let Some(controllers) = self.attached.as_mut() {
                        controllers.copy.reset(page, button);
                    }
                }
            }
        }
    }

    /// Remove `element` and cancel every timer it owns.
    pub fn remove_element(&mut self, page: &mut impl Page, element: ElementId) -> usize {
        page.remove_element(element);
        self.timers.cancel_owned_by(element)
    }

    fn attach(&mut self, page: &mut impl Page) -> Vec<HostRequest> {
        let mut nav = NavigationController::attach(page, &self.config.nav);
        if self.viewport.mode().is_mobile() {
            nav.apply_layout(page, ViewportMode::Mobile);
        }
        let scroll = ScrollEffectsController::attach(page, &self.config.scroll);
        let (reveal, mut requests) = VisibilityRevealController::attach(page, &self.config.reveal);
        let copy = CopyButtons::inject(page, &self.config.copy);
        let (lazy, lazy_requests) = LazyImages::attach(page, &self.config.lazy);
        requests.extend(lazy_requests);
        debug!(
            mode = ?self.viewport.mode(),
            observers = requests.len(),
            "page behaviors attached"
        );
        self.attached = Some(Controllers {
            nav,
            scroll,
            reveal,
            copy,
            lazy,
        });
        requests
    }
}
