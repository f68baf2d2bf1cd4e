#![forbid(unsafe_code)]

//! Copy-to-clipboard buttons on code blocks.
//!
//! A button is injected into every configured code block that does not
//! already carry one. Clicking it asks the host to write the block's text to
//! the clipboard; the settled result flips the label to a confirmation or an
//! error, and a timer reverts it after `copy.reset_ms`.

use core::fmt;
use core::time::Duration;
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::CopyConfig;
use crate::host::HostRequest;
use crate::page::{ElementId, Page};
use crate::timer::{TimerAction, TimerId, TimerQueue};

pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied!";
pub const ERROR_LABEL: &str = "Error";
pub const ARIA_LABEL: &str = "Copy code";

/// Why the platform rejected a clipboard write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// The write was attempted and rejected (permission, focus, ...).
    Denied(String),
    /// The environment has no asynchronous clipboard.
    Unsupported,
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denied(reason) => write!(f, "clipboard write denied: {reason}"),
            Self::Unsupported => f.write_str("clipboard unavailable"),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// Visible state of one copy button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyButtonState {
    #[default]
    Idle,
    Copied,
    Failed,
}

#[derive(Debug, Clone)]
struct CopyButton {
    label: ElementId,
    text: String,
    state: CopyButtonState,
    reset: Option<TimerId>,
}

/// Every injected copy button on the page.
#[derive(Debug, Clone)]
pub struct CopyButtons {
    config: CopyConfig,
    buttons: BTreeMap<ElementId, CopyButton>,
}

impl CopyButtons {
    /// Inject buttons into the configured code blocks.
    pub fn inject(page: &mut impl Page, config: &CopyConfig) -> Self {
        let mut buttons = BTreeMap::new();
        let button_selector = format!(".{}", config.button_class);
        for selector in &config.code_block_selectors {
            for block in page.query_all(selector) {
                if !page.query_within(block, &button_selector).is_empty() {
                    continue;
                }
                let source = page
                    .query_within(block, "code")
                    .into_iter()
                    .next()
                    .unwrap_or(block);
                let text = page.text_content(source);
                let Some(button) = page.create_element("button") else {
                    continue;
                };
                let Some(label) = page.create_element("span") else {
                    continue;
                };
                page.add_class(button, &config.button_class);
                page.set_attribute(button, "type", "button");
                page.set_attribute(button, "aria-label", ARIA_LABEL);
                page.set_text(label, COPY_LABEL);
                page.append_child(button, label);
                page.set_style(block, "position", "relative");
                page.append_child(block, button);
                buttons.insert(
                    button,
                    CopyButton {
                        label,
                        text,
                        state: CopyButtonState::Idle,
                        reset: None,
                    },
                );
            }
        }
        debug!(count = buttons.len(), "copy buttons injected");
        Self {
            config: config.clone(),
            buttons,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    /// Injected buttons in handle order.
    pub fn buttons(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.buttons.keys().copied()
    }

    #[must_use]
    pub fn state(&self, button: ElementId) -> Option<CopyButtonState> {
        self.buttons.get(&button).map(|b| b.state)
    }

    /// Text the button copies.
    #[must_use]
    pub fn text(&self, button: ElementId) -> Option<&str> {
        self.buttons.get(&button).map(|b| b.text.as_str())
    }

    /// Turn a click into a clipboard write request when it hits a button.
    pub fn handle_click(&self, page: &mut impl Page, target: ElementId) -> Option<HostRequest> {
        let button = page.closest(target, &format!(".{}", self.config.button_class))?;
        let entry = self.buttons.get(&button)?;
        Some(HostRequest::WriteClipboard {
            button,
            text: entry.text.clone(),
        })
    }

    /// Apply the settled clipboard result and schedule the revert.
    pub fn complete(
        &mut self,
        page: &mut impl Page,
        timers: &mut TimerQueue,
        now: Duration,
        button: ElementId,
        result: Result<(), ClipboardError>,
    ) {
        let Some(entry) = self.buttons.get_mut(&button) else {
            return;
        };
        if let Some(previous) = entry.reset.take() {
            timers.cancel(previous);
        }
        match result {
            Ok(()) => {
                page.add_class(button, &self.config.copied_class);
                page.set_text(entry.label, COPIED_LABEL);
                entry.state = CopyButtonState::Copied;
            }
            Err(err) => {
                warn!(error = %err, "failed to copy code");
                page.remove_class(button, &self.config.copied_class);
                page.set_text(entry.label, ERROR_LABEL);
                entry.state = CopyButtonState::Failed;
            }
        }
        entry.reset = Some(timers.schedule(
            now + Duration::from_millis(self.config.reset_ms),
            Some(button),
            TimerAction::ResetCopyButton(button),
        ));
    }

    /// Return a button to its idle label.
    pub fn reset(&mut self, page: &mut impl Page, button: ElementId) {
        let Some(entry) = self.buttons.get_mut(&button) else {
            return;
        };
        page.remove_class(button, &self.config.copied_class);
        page.set_text(entry.label, COPY_LABEL);
        entry.state = CopyButtonState::Idle;
        entry.reset = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPage;

    use pretty_assertions::assert_eq;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn page_with_block(code: &str) -> (MemoryPage, ElementId) {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let post = page.append(body, "div.post-body");
        let pre = page.append(post, "pre");
        page.append_text(pre, "code", code);
        (page, pre)
    }

    #[test]
    fn injects_one_button_per_block() {
        let (mut page, pre) = page_with_block("print(1)");
        let body = page.body_id();
        let stray = page.append(body, "pre");
        let copy = CopyButtons::inject(&mut page, &CopyConfig::default());
        assert_eq!(copy.len(), 1);

        let button = copy.buttons().next().unwrap();
        assert_eq!(page.closest(button, "pre"), Some(pre));
        assert_eq!(page.attribute(button, "aria-label").as_deref(), Some(ARIA_LABEL));
        assert_eq!(page.text_content(button), COPY_LABEL);
        assert_eq!(page.style(pre, "position").as_deref(), Some("relative"));
        assert_eq!(copy.text(button), Some("print(1)"));
        assert!(page.query_within(stray, ".code-copy-btn").is_empty());

        // A second pass finds the existing button and skips the block.
        let again = CopyButtons::inject(&mut page, &CopyConfig::default());
        assert!(again.is_empty());
    }

    #[test]
    fn block_without_code_element_copies_its_own_text() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let topic = page.append(body, "div.topic-body");
        page.append_text(topic, "pre", "ls -la");
        let copy = CopyButtons::inject(&mut page, &CopyConfig::default());
        let button = copy.buttons().next().unwrap();
        assert_eq!(copy.text(button), Some("ls -la"));
    }

    #[test]
    fn click_on_label_requests_write() {
        let (mut page, _) = page_with_block("print(1)");
        let copy = CopyButtons::inject(&mut page, &CopyConfig::default());
        let button = copy.buttons().next().unwrap();
        let label = page.children(button)[0];
        assert_eq!(
            copy.handle_click(&mut page, label),
            Some(HostRequest::WriteClipboard {
                button,
                text: "print(1)".into(),
            })
        );
        let body = page.body_id();
        assert_eq!(copy.handle_click(&mut page, body), None);
    }

    #[test]
    fn success_then_revert() {
        let (mut page, _) = page_with_block("print(1)");
        let mut copy = CopyButtons::inject(&mut page, &CopyConfig::default());
        let button = copy.buttons().next().unwrap();
        let mut timers = TimerQueue::new();

        copy.complete(&mut page, &mut timers, ms(10), button, Ok(()));
        assert_eq!(page.text_content(button), COPIED_LABEL);
        assert!(page.has_class(button, "copied"));
        assert_eq!(copy.state(button), Some(CopyButtonState::Copied));
        assert_eq!(timers.next_deadline(), Some(ms(2010)));

        copy.reset(&mut page, button);
        assert_eq!(page.text_content(button), COPY_LABEL);
        assert!(!page.has_class(button, "copied"));
    }

    #[test]
    fn failure_shows_error_and_repeated_results_replace_the_revert() {
        let (mut page, _) = page_with_block("print(1)");
        let mut copy = CopyButtons::inject(&mut page, &CopyConfig::default());
        let button = copy.buttons().next().unwrap();
        let mut timers = TimerQueue::new();

        copy.complete(&mut page, &mut timers, ms(0), button, Ok(()));
        copy.complete(
            &mut page,
            &mut timers,
            ms(500),
            button,
            Err(ClipboardError::Denied("NotAllowedError".into())),
        );
        assert_eq!(page.text_content(button), ERROR_LABEL);
        assert!(!page.has_class(button, "copied"));
        assert_eq!(copy.state(button), Some(CopyButtonState::Failed));
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(ms(2500)));
    }
}
