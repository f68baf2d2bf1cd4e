#![forbid(unsafe_code)]

//! One-shot visibility reveals.
//!
//! Targets start hidden (transparent and pushed down by `reveal.offset_px`)
//! and settle into place the first time their visible fraction reaches the
//! group threshold. A revealed target is unobserved and forgotten, so it can
//! never trigger again.
//!
//! Two variants refine the plain fade:
//! - skill items collapse their inner bar to `0%` and restore the captured
//!   width after `reveal.skill_fill_delay_ms`, animating a fill;
//! - text elements revealed in one observer batch cascade, the Nth one
//!   delayed by `N * reveal.stagger_ms`.

use core::time::Duration;
use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::config::RevealConfig;
use crate::host::{HostRequest, IntersectionEntry, ObserverGroup};
use crate::page::{ElementId, Page};
use crate::timer::{TimerAction, TimerQueue};

/// Slack when comparing a reported visible fraction with its threshold.
/// Browsers round intersection ratios, so a target that crossed a `0.5`
/// threshold may report `0.4999`.
const RATIO_TOLERANCE: f64 = 1e-3;

/// How a target is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealKind {
    Fade,
    SkillBar,
    Text,
}

impl RevealKind {
    #[must_use]
    pub const fn group(self) -> ObserverGroup {
        match self {
            Self::Fade => ObserverGroup::Fade,
            Self::SkillBar => ObserverGroup::Skill,
            Self::Text => ObserverGroup::Text,
        }
    }
}

/// Tracks unrevealed targets.
#[derive(Debug, Clone)]
pub struct VisibilityRevealController {
    config: RevealConfig,
    pending: BTreeMap<ElementId, RevealKind>,
    revealed: usize,
}

impl VisibilityRevealController {
    /// Hide every target on `page` and return the observe requests.
    pub fn attach(page: &mut impl Page, config: &RevealConfig) -> (Self, Vec<HostRequest>) {
        let mut controller = Self {
            config: config.clone(),
            pending: BTreeMap::new(),
            revealed: 0,
        };
        let mut requests = Vec::new();
        for selector in &config.fade_selectors {
            for target in page.query_all(selector) {
                requests.extend(controller.observe(page, target, RevealKind::Fade));
            }
        }
        for target in page.query_all(&config.skill_item_selector) {
            requests.extend(controller.observe(page, target, RevealKind::SkillBar));
        }
        for target in page.query_all(&config.text_selector) {
            requests.extend(controller.observe(page, target, RevealKind::Text));
        }
        debug!(targets = controller.pending.len(), "reveal targets observed");
        (controller, requests)
    }

    /// Start tracking `target`. Already tracked targets are ignored.
    pub fn observe(
        &mut self,
        page: &mut impl Page,
        target: ElementId,
        kind: RevealKind,
    ) -> Option<HostRequest> {
        if self.pending.contains_key(&target) {
            return None;
        }
        if kind != RevealKind::SkillBar {
            page.set_style(target, "opacity", "0");
            page.set_style(
                target,
                "transform",
                &format!("translateY({}px)", self.config.offset_px),
            );
            page.set_style(target, "transition", &self.config.transition);
        }
        self.pending.insert(target, kind);
        Some(HostRequest::Observe {
            group: kind.group(),
            target,
        })
    }

    /// Whether `target` is still waiting for its reveal.
    #[must_use]
    pub fn is_pending(&self, target: ElementId) -> bool {
        self.pending.contains_key(&target)
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of reveals triggered so far.
    #[must_use]
    pub const fn revealed_count(&self) -> usize {
        self.revealed
    }

    /// Process one observer batch; returns the unobserve requests.
    pub fn on_intersection(
        &mut self,
        page: &mut impl Page,
        timers: &mut TimerQueue,
        now: Duration,
        entries: &[IntersectionEntry],
    ) -> Vec<HostRequest> {
        let mut requests = Vec::new();
        let mut cascade = 0u32;
        for entry in entries {
            let Some(&kind) = self.pending.get(&entry.target) else {
                continue;
            };
            if !entry.is_intersecting || entry.ratio + RATIO_TOLERANCE < self.threshold(kind) {
                continue;
            }
            self.pending.remove(&entry.target);
            self.revealed += 1;
            match kind {
                RevealKind::Fade => reveal(page, entry.target),
                RevealKind::Text => {
                    let delay = self.config.stagger_ms.saturating_mul(u64::from(cascade));
                    cascade += 1;
                    if delay == 0 {
                        reveal(page, entry.target);
                    } else {
                        timers.schedule(
                            now + Duration::from_millis(delay),
                            Some(entry.target),
                            TimerAction::Reveal(entry.target),
                        );
                    }
                }
                RevealKind::SkillBar => self.start_fill(page, timers, now, entry.target),
            }
            trace!(target = entry.target.0, ?kind, "revealed");
            requests.push(HostRequest::Unobserve {
                group: kind.group(),
                target: entry.target,
            });
        }
        requests
    }

    fn threshold(&self, kind: RevealKind) -> f64 {
        match kind {
            RevealKind::Fade => self.config.fade_threshold,
            RevealKind::SkillBar => self.config.skill_threshold,
            RevealKind::Text => self.config.text_threshold,
        }
    }

    fn start_fill(
        &self,
        page: &mut impl Page,
        timers: &mut TimerQueue,
        now: Duration,
        item: ElementId,
    ) {
        let Some(bar) = page
            .query_within(item, &self.config.skill_progress_selector)
            .into_iter()
            .next()
        else {
            return;
        };
        let width = page.style(bar, "width").unwrap_or_default();
        page.set_style(bar, "width", "0%");
        timers.schedule(
            now + Duration::from_millis(self.config.skill_fill_delay_ms),
            Some(bar),
            TimerAction::RestoreSkillWidth { bar, width },
        );
    }
}

/// Settle a hidden target into place.
pub fn reveal(page: &mut impl Page, target: ElementId) {
    page.set_style(target, "opacity", "1");
    page.set_style(target, "transform", "translateY(0)");
}

/// Put a collapsed skill bar back to its captured width.
pub fn restore_skill_width(page: &mut impl Page, bar: ElementId, width: &str) {
    if width.is_empty() {
        page.remove_style(bar, "width");
    } else {
        page.set_style(bar, "width", width);
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

    fn visible(target: ElementId, ratio: f64) -> IntersectionEntry {
        IntersectionEntry {
            target,
            ratio,
            is_intersecting: ratio > 0.0,
        }
    }

    #[test]
    fn fade_targets_start_hidden_and_reveal_once() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let card = page.append(body, "div.project-card");
        let (mut rc, requests) = VisibilityRevealController::attach(&mut page, &RevealConfig::default());
        assert_eq!(
            requests,
            vec![HostRequest::Observe {
                group: ObserverGroup::Fade,
                target: card,
            }]
        );
        assert_eq!(page.style(card, "opacity").as_deref(), Some("0"));
        assert_eq!(page.style(card, "transform").as_deref(), Some("translateY(20px)"));

        let mut timers = TimerQueue::new();
        assert!(rc.on_intersection(&mut page, &mut timers, ms(0), &[visible(card, 0.05)]).is_empty());
        assert!(rc.is_pending(card));

        let out = rc.on_intersection(&mut page, &mut timers, ms(0), &[visible(card, 0.2)]);
        assert_eq!(
            out,
            vec![HostRequest::Unobserve {
                group: ObserverGroup::Fade,
                target: card,
            }]
        );
        assert_eq!(page.style(card, "opacity").as_deref(), Some("1"));
        assert_eq!(page.style(card, "transform").as_deref(), Some("translateY(0)"));

        // Late deliveries for an unobserved target are ignored.
        page.set_style(card, "opacity", "0.5");
        assert!(rc.on_intersection(&mut page, &mut timers, ms(10), &[visible(card, 1.0)]).is_empty());
        assert_eq!(page.style(card, "opacity").as_deref(), Some("0.5"));
        assert_eq!(rc.revealed_count(), 1);
    }

    #[test]
    fn skill_bar_collapses_then_restores_width() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let item = page.append(body, "div.skill-item");
        let bar = page.append(item, "div.skill-progress");
        page.set_style(bar, "width", "85%");
        let (mut rc, _) = VisibilityRevealController::attach(&mut page, &RevealConfig::default());
        assert_eq!(page.style(item, "opacity"), None);

        let mut timers = TimerQueue::new();
        assert!(rc.on_intersection(&mut page, &mut timers, ms(0), &[visible(item, 0.4)]).is_empty());
        rc.on_intersection(&mut page, &mut timers, ms(1000), &[visible(item, 0.6)]);
        assert_eq!(page.style(bar, "width").as_deref(), Some("0%"));

        let due = timers.drain_due(ms(1100));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].owner, Some(bar));
        let TimerAction::RestoreSkillWidth { bar: b, width } = &due[0].action else {
            panic!("unexpected action");
        };
        restore_skill_width(&mut page, *b, width);
        assert_eq!(page.style(bar, "width").as_deref(), Some("85%"));
    }

    #[test]
    fn ratio_rounded_just_below_threshold_still_reveals() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let item = page.append(body, "div.skill-item");
        let bar = page.append(item, "div.skill-progress");
        page.set_style(bar, "width", "60%");
        let (mut rc, _) = VisibilityRevealController::attach(&mut page, &RevealConfig::default());
        let mut timers = TimerQueue::new();

        assert!(rc.on_intersection(&mut page, &mut timers, ms(0), &[visible(item, 0.49)]).is_empty());
        assert!(rc.is_pending(item));
        let out = rc.on_intersection(&mut page, &mut timers, ms(0), &[visible(item, 0.4999)]);
        assert_eq!(out.len(), 1);
        assert!(!rc.is_pending(item));
        assert_eq!(page.style(bar, "width").as_deref(), Some("0%"));
    }

    #[test]
    fn text_batch_cascades_by_position() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let lines: Vec<_> = (0..3).map(|_| page.append(body, "p.reveal-text")).collect();
        let (mut rc, _) = VisibilityRevealController::attach(&mut page, &RevealConfig::default());
        let mut timers = TimerQueue::new();

        let entries: Vec<_> = lines.iter().map(|&l| visible(l, 0.3)).collect();
        rc.on_intersection(&mut page, &mut timers, ms(500), &entries);

        assert_eq!(page.style(lines[0], "opacity").as_deref(), Some("1"));
        assert_eq!(page.style(lines[1], "opacity").as_deref(), Some("0"));
        let due: Vec<_> = timers.drain_due(ms(600)).into_iter().map(|t| t.action).collect();
        assert_eq!(
            due,
            vec![TimerAction::Reveal(lines[1]), TimerAction::Reveal(lines[2])]
        );
        assert_eq!(rc.pending_len(), 0);
    }

    #[test]
    fn observe_ignores_duplicates() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let section = page.append(body, "section.resume-section");
        let (mut rc, requests) = VisibilityRevealController::attach(&mut page, &RevealConfig::default());
        assert_eq!(requests.len(), 1);
        assert_eq!(rc.observe(&mut page, section, RevealKind::Fade), None);
    }
}
