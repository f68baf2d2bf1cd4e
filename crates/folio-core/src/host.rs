#![forbid(unsafe_code)]

//! Messages exchanged with the embedding host.
//!
//! The host pushes [`PageEvent`]s into [`Site`](crate::site::Site) and
//! executes the [`HostRequest`]s it gets back. Requests cover the platform
//! facilities that are not part of [`Page`](crate::page::Page): visibility
//! observers and the asynchronous clipboard.

use crate::config::SiteConfig;
use crate::copy::ClipboardError;
use crate::page::ElementId;
use crate::scroll::ScrollMetrics;

/// Visibility observers the host maintains, one per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObserverGroup {
    /// Generic fade-in sections.
    Fade,
    /// Skill items whose bars animate a fill.
    Skill,
    /// Grouped text revealed with a cascade.
    Text,
    /// Images carrying a deferred source.
    LazyImage,
}

impl ObserverGroup {
    pub const ALL: [Self; 4] = [Self::Fade, Self::Skill, Self::Text, Self::LazyImage];

    /// Threshold and root margin the host observer must use.
    #[must_use]
    pub fn options(self, config: &SiteConfig) -> ObserverOptions {
        match self {
            Self::Fade => ObserverOptions {
                threshold: config.reveal.fade_threshold,
                root_margin_px: 0.0,
            },
            Self::Skill => ObserverOptions {
                threshold: config.reveal.skill_threshold,
                root_margin_px: 0.0,
            },
            Self::Text => ObserverOptions {
                threshold: config.reveal.text_threshold,
                root_margin_px: 0.0,
            },
            Self::LazyImage => ObserverOptions {
                threshold: 0.0,
                root_margin_px: config.lazy.root_margin_px,
            },
        }
    }
}

/// Intersection observer settings for one [`ObserverGroup`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    pub threshold: f64,
    pub root_margin_px: f64,
}

/// One visibility change reported by a host observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: ElementId,
    /// Visible fraction of the target in `[0, 1]`.
    pub ratio: f64,
    pub is_intersecting: bool,
}

/// Input pushed by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// The document content is ready; controllers attach.
    Ready,
    /// The page finished loading; viewport metrics are final.
    Load { width: f64 },
    /// Resize or orientation change.
    Resize { width: f64 },
    Scroll(ScrollMetrics),
    /// Click at client coordinates `x`, `y`.
    Click { target: ElementId, x: f64, y: f64 },
    KeyDown { key: String },
    Intersection {
        group: ObserverGroup,
        entries: Vec<IntersectionEntry>,
    },
    /// A lazy image finished loading its real source.
    ImageLoaded { image: ElementId },
    /// The clipboard write requested for `button` settled.
    ClipboardResult {
        button: ElementId,
        result: Result<(), ClipboardError>,
    },
}

/// Platform work the host must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    Observe {
        group: ObserverGroup,
        target: ElementId,
    },
    Unobserve {
        group: ObserverGroup,
        target: ElementId,
    },
    /// Write `text` to the system clipboard and report back with
    /// [`PageEvent::ClipboardResult`].
    WriteClipboard { button: ElementId, text: String },
}

/// Outcome of dispatching one [`PageEvent`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    /// The host must cancel the event's default action.
    pub prevent_default: bool,
    pub requests: Vec<HostRequest>,
}
