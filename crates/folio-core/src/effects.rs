#![forbid(unsafe_code)]

//! Cosmetic effects: click ripples and lazily loaded images.

use core::time::Duration;
use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::config::{LazyImageConfig, RippleConfig};
use crate::host::{HostRequest, IntersectionEntry, ObserverGroup};
use crate::page::{ElementId, Page};
use crate::timer::{TimerAction, TimerQueue};

// ---------------------------------------------------------------------------
// Ripples
// ---------------------------------------------------------------------------

/// Spawns a transient expanding circle inside clicked buttons.
#[derive(Debug, Clone)]
pub struct Ripples {
    config: RippleConfig,
}

impl Ripples {
    #[must_use]
    pub fn new(config: &RippleConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Spawn a ripple if the click at client `(x, y)` hit a ripple button.
    ///
    /// The ripple is a square as large as the button's longer side, centred
    /// on the click point, and is removed after `ripple.duration_ms`.
    pub fn handle_click(
        &self,
        page: &mut impl Page,
        timers: &mut TimerQueue,
        now: Duration,
        target: ElementId,
        x: f64,
        y: f64,
    ) -> Option<ElementId> {
        let button = page.closest(target, &self.config.selector)?;
        let rect = page.bounding_rect(button);
        let size = rect.width.max(rect.height);
        let ripple = page.create_element("span")?;
        page.add_class(ripple, &self.config.class);
        page.set_style(ripple, "width", &format!("{size}px"));
        page.set_style(ripple, "height", &format!("{size}px"));
        page.set_style(ripple, "left", &format!("{}px", x - rect.left - size / 2.0));
        page.set_style(ripple, "top", &format!("{}px", y - rect.top - size / 2.0));
        page.append_child(button, ripple);
        timers.schedule(
            now + Duration::from_millis(self.config.duration_ms),
            Some(ripple),
            TimerAction::RemoveRipple(ripple),
        );
        trace!(button = button.0, size, "ripple spawned");
        Some(ripple)
    }
}

// ---------------------------------------------------------------------------
// Lazy images
// ---------------------------------------------------------------------------

/// Swaps deferred image sources in once images approach the viewport.
#[derive(Debug, Clone)]
pub struct LazyImages {
    config: LazyImageConfig,
    waiting: BTreeSet<ElementId>,
    loading: BTreeSet<ElementId>,
}

impl LazyImages {
    /// Hide deferred images and return the observe requests.
    pub fn attach(page: &mut impl Page, config: &LazyImageConfig) -> (Self, Vec<HostRequest>) {
        let mut waiting = BTreeSet::new();
        let mut requests = Vec::new();
        for image in page.query_all(&format!("img[{}]", config.attribute)) {
            page.set_style(image, "opacity", "0");
            page.set_style(image, "transition", "opacity 0.3s ease");
            waiting.insert(image);
            requests.push(HostRequest::Observe {
                group: ObserverGroup::LazyImage,
                target: image,
            });
        }
        debug!(count = waiting.len(), "lazy images observed");
        (
            Self {
                config: config.clone(),
                waiting,
                loading: BTreeSet::new(),
            },
            requests,
        )
    }

    /// Images not yet triggered.
    #[must_use]
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// Whether `image` has its real source and is waiting for `load`.
    #[must_use]
    pub fn is_loading(&self, image: ElementId) -> bool {
        self.loading.contains(&image)
    }

    /// Swap in real sources for images entering the (margin-extended) viewport.
    pub fn on_intersection(
        &mut self,
        page: &mut impl Page,
        entries: &[IntersectionEntry],
    ) -> Vec<HostRequest> {
        let mut requests = Vec::new();
        for entry in entries {
            if !entry.is_intersecting || !self.waiting.remove(&entry.target) {
                continue;
            }
            if let Some(src) = page.attribute(entry.target, &self.config.attribute) {
                page.set_attribute(entry.target, "src", &src);
                page.remove_attribute(entry.target, &self.config.attribute);
                self.loading.insert(entry.target);
            }
            requests.push(HostRequest::Unobserve {
                group: ObserverGroup::LazyImage,
                target: entry.target,
            });
        }
        requests
    }

    /// Fade in an image whose real source finished loading.
    pub fn on_loaded(&mut self, page: &mut impl Page, image: ElementId) {
        if self.loading.remove(&image) {
            page.add_class(image, &self.config.loaded_class);
            page.set_style(image, "opacity", "1");
        }
    }
}
