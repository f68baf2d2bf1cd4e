#![forbid(unsafe_code)]

//! Scroll-driven header compaction and the page progress bar.

use tracing::trace;

use crate::config::ScrollConfig;
use crate::page::{ElementId, Page};
use crate::viewport::ViewportMode;

/// Document scroll geometry at one scroll tick, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    /// Vertical scroll offset of the document.
    pub scroll_top: f64,
    /// Full height of the document content.
    pub scroll_height: f64,
    /// Height of the visible viewport.
    pub client_height: f64,
}

/// Percentage of the page scrolled, clamped to `[0, 100]`.
///
/// A page that cannot scroll reports `0`.
#[must_use]
pub fn scroll_progress(metrics: ScrollMetrics) -> f64 {
    let range = metrics.scroll_height - metrics.client_height;
    if !(range > 0.0) {
        return 0.0;
    }
    (metrics.scroll_top / range * 100.0).clamp(0.0, 100.0)
}

/// Owns the header's scrolled marker and the progress bar width.
#[derive(Debug, Clone)]
pub struct ScrollEffectsController {
    config: ScrollConfig,
    header: Option<ElementId>,
    progress_bar: Option<ElementId>,
    scrolled: bool,
    progress: f64,
}

impl ScrollEffectsController {
    /// Find the header and progress bar, creating the bar when configured.
    pub fn attach(page: &mut impl Page, config: &ScrollConfig) -> Self {
        let header = page.query_first(&config.header_selector);
        let mut progress_bar = page.query_first(&config.progress_selector);
        if progress_bar.is_none() && config.create_progress_bar {
            progress_bar = page.body().and_then(|body| {
                let bar = page.create_element("div")?;
                page.add_class(bar, &config.progress_class);
                page.append_child(body, bar);
                Some(bar)
            });
        }
        let scrolled = header.is_some_and(|h| page.has_class(h, &config.scrolled_class));
        Self {
            config: config.clone(),
            header,
            progress_bar,
            scrolled,
            progress: 0.0,
        }
    }

    /// Whether the header currently carries the scrolled marker.
    #[must_use]
    pub const fn is_scrolled(&self) -> bool {
        self.scrolled
    }

    /// Last progress value written to the bar.
    #[must_use]
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    #[must_use]
    pub const fn progress_bar(&self) -> Option<ElementId> {
        self.progress_bar
    }

    /// React to one scroll tick.
    ///
    /// The header marker is left untouched while the viewport is mobile; the
    /// progress bar updates in every mode.
    pub fn on_scroll(&mut self, page: &mut impl Page, metrics: ScrollMetrics, mode: ViewportMode) {
        if let Some(header) = self.header
            && !mode.is_mobile()
        {
            let scrolled = metrics.scroll_top > self.config.scrolled_offset_px;
            if scrolled != self.scrolled {
                if scrolled {
                    page.add_class(header, &self.config.scrolled_class);
                } else {
                    page.remove_class(header, &self.config.scrolled_class);
                }
                trace!(scrolled, "header scroll state changed");
                self.scrolled = scrolled;
            }
        }

        self.progress = scroll_progress(metrics);
        if let Some(bar) = self.progress_bar {
            page.set_style(bar, "width", &format!("{}%", self.progress));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPage;

    use pretty_assertions::assert_eq;

    fn metrics(top: f64) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: top,
            scroll_height: 3000.0,
            client_height: 1000.0,
        }
    }

    #[test]
    fn progress_is_a_clamped_percentage() {
        assert_eq!(scroll_progress(metrics(0.0)), 0.0);
        assert_eq!(scroll_progress(metrics(500.0)), 25.0);
        assert_eq!(scroll_progress(metrics(2000.0)), 100.0);
        // Rubber-band overscroll on touch devices.
        assert_eq!(scroll_progress(metrics(2100.0)), 100.0);
        assert_eq!(scroll_progress(metrics(-40.0)), 0.0);
        assert_eq!(
            scroll_progress(ScrollMetrics {
                scroll_top: 0.0,
                scroll_height: 800.0,
                client_height: 800.0,
            }),
            0.0
        );
    }

    #[test]
    fn header_marker_follows_offset_on_desktop() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let navbar = page.append(body, "nav.navbar");
        let mut fx = ScrollEffectsController::attach(&mut page, &ScrollConfig::default());

        fx.on_scroll(&mut page, metrics(50.0), ViewportMode::Desktop);
        assert!(!page.has_class(navbar, "scrolled"));
        fx.on_scroll(&mut page, metrics(51.0), ViewportMode::Desktop);
        assert!(page.has_class(navbar, "scrolled"));
        fx.on_scroll(&mut page, metrics(10.0), ViewportMode::Desktop);
        assert!(!page.has_class(navbar, "scrolled"));
    }

    #[test]
    fn mobile_leaves_header_but_updates_progress() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let navbar = page.append(body, "nav.navbar");
        let bar = page.append(body, "div.scroll-progress");
        let mut fx = ScrollEffectsController::attach(&mut page, &ScrollConfig::default());
        assert_eq!(fx.progress_bar(), Some(bar));

        fx.on_scroll(&mut page, metrics(1000.0), ViewportMode::Mobile);
        assert!(!page.has_class(navbar, "scrolled"));
        assert!(!fx.is_scrolled());
        assert_eq!(page.style(bar, "width").as_deref(), Some("50%"));
    }

    #[test]
    fn progress_bar_is_created_when_absent() {
        let mut page = MemoryPage::new();
        let mut fx = ScrollEffectsController::attach(&mut page, &ScrollConfig::default());
        let bar = fx.progress_bar().expect("bar created");
        assert_eq!(page.query_first(".scroll-progress"), Some(bar));
        fx.on_scroll(&mut page, metrics(2000.0), ViewportMode::Desktop);
        assert_eq!(page.style(bar, "width").as_deref(), Some("100%"));

        let config = ScrollConfig {
            create_progress_bar: false,
            ..ScrollConfig::default()
        };
        let mut bare = MemoryPage::new();
        let fx = ScrollEffectsController::attach(&mut bare, &config);
        assert_eq!(fx.progress_bar(), None);
    }
}
