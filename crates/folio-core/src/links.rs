#![forbid(unsafe_code)]

//! Click-to-navigate table rows and smooth in-page anchors.

use percent_encoding::percent_decode_str;
use tracing::trace;

use crate::config::{AnchorConfig, RowConfig};
use crate::page::{ElementId, Page};

/// Rows that navigate to their `data-href` when clicked.
#[derive(Debug, Clone)]
pub struct ClickableRows {
    config: RowConfig,
}

impl ClickableRows {
    #[must_use]
    pub fn new(config: &RowConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Navigate if `target` sits in a clickable row outside its action
    /// region. Returns the URL navigated to.
    pub fn handle_click(&self, page: &mut impl Page, target: ElementId) -> Option<String> {
        let row = page.closest(target, &self.config.selector)?;
        let in_actions = page
            .closest(target, &self.config.action_selector)
            .is_some_and(|actions| page.contains(row, actions));
        if in_actions {
            return None;
        }
        let href = page
            .attribute(row, &self.config.href_attribute)
            .filter(|href| !href.is_empty())?;
        trace!(%href, "row navigation");
        page.navigate(&href);
        Some(href)
    }
}

/// In-page `#fragment` links scrolled smoothly instead of jumping.
#[derive(Debug, Clone)]
pub struct SmoothAnchors {
    config: AnchorConfig,
}

/// Result of an anchor click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorClick {
    /// Not an in-page anchor.
    Ignored,
    /// Default jump suppressed; `target` was scrolled into view if present.
    Handled { target: Option<ElementId> },
}

impl SmoothAnchors {
    #[must_use]
    pub fn new(config: &AnchorConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn handle_click(&self, page: &mut impl Page, target: ElementId) -> AnchorClick {
        let Some(anchor) = page.closest(target, &self.config.selector) else {
            return AnchorClick::Ignored;
        };
        let Some(href) = page.attribute(anchor, "href") else {
            return AnchorClick::Ignored;
        };
        let destination = match href.strip_prefix('#') {
            Some(fragment) => find_fragment(page, fragment),
            None => None,
        };
        if let Some(destination) = destination {
            page.scroll_into_view(destination);
        }
        AnchorClick::Handled {
            target: destination,
        }
    }
}

/// Element named by `fragment`: the raw text first, then its
/// percent-decoded form.
fn find_fragment(page: &mut impl Page, fragment: &str) -> Option<ElementId> {
    if fragment.is_empty() {
        return None;
    }
    if let Some(found) = page.element_by_id(fragment) {
        return Some(found);
    }
    let decoded = percent_decode_str(fragment).decode_utf8().ok()?;
    if decoded == fragment {
        return None;
    }
    page.element_by_id(&decoded)
}
