#![forbid(unsafe_code)]

//! Mobile navigation menu.
//!
//! [`NavigationController`] owns the open/closed state of the menu and the
//! mobile layout override of the navbar. State is reflected into the page
//! purely through marker classes:
//!
//! | element   | open marker            | mobile marker               |
//! |-----------|------------------------|-----------------------------|
//! | menu      | `nav.open_class`       |                             |
//! | toggle    | `nav.open_class`       |                             |
//! | body      | `nav.body_open_class`  |                             |
//! | navbar    |                        | `nav.mobile_layout_class`   |
//! | container |                        | `nav.container_full_class`  |
//!
//! The stylesheet rules backing the mobile markers are produced by
//! [`mobile_layout_css`].

use tracing::{debug, trace};

use crate::config::NavConfig;
use crate::page::{ElementId, Page};
use crate::viewport::ViewportMode;

/// Open/closed state of the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuState {
    #[default]
    Closed,
    Open,
}

/// What caused the menu to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCause {
    Toggle,
    OutsideClick,
    LinkClick,
    Escape,
}

/// How a click was handled by the navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavClick {
    /// The toggle consumed the click; nothing else may observe it.
    Consumed,
    /// The click may continue to other handlers.
    PassThrough,
}

#[derive(Debug, Clone, Copy)]
struct MenuHooks {
    toggle: ElementId,
    menu: ElementId,
    body: Option<ElementId>,
}

/// Menu state machine plus the mobile layout override.
#[derive(Debug, Clone)]
pub struct NavigationController {
    config: NavConfig,
    state: MenuState,
    hooks: Option<MenuHooks>,
    navbar: Option<ElementId>,
    container: Option<ElementId>,
    layout: Option<ViewportMode>,
}

impl NavigationController {
    /// Look up the navigation hooks on `page`.
    ///
    /// Without both a toggle and a menu the state machine is disabled; the
    /// layout override still works when a navbar exists.
    pub fn attach(page: &mut impl Page, config: &NavConfig) -> Self {
        let toggle = page.query_first(&config.toggle_selector);
        let menu = page.query_first(&config.menu_selector);
        let hooks = match (toggle, menu) {
            (Some(toggle), Some(menu)) => Some(MenuHooks {
                toggle,
                menu,
                body: page.body(),
            }),
            _ => {
                debug!("menu toggle or menu missing; mobile menu disabled");
                None
            }
        };
        let navbar = page.query_first(&config.navbar_selector);
        let container = navbar.and_then(|navbar| {
            page.query_within(navbar, &config.container_selector)
                .into_iter()
                .next()
        });
        Self {
            config: config.clone(),
            state: MenuState::Closed,
            hooks,
            navbar,
            container,
            layout: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> MenuState {
        self.state
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, MenuState::Open)
    }

    /// Layout most recently applied, if any.
    #[must_use]
    pub const fn layout(&self) -> Option<ViewportMode> {
        self.layout
    }

    /// Flip the menu; returns the new state.
    pub fn toggle(&mut self, page: &mut impl Page) -> MenuState {
        match self.state {
            MenuState::Closed => self.open(page),
            MenuState::Open => {
                self.close(page, CloseCause::Toggle);
            }
        }
        self.state
    }

    /// Open the menu. Opening an open menu is a no-op.
    pub fn open(&mut self, page: &mut impl Page) {
        let Some(hooks) = self.hooks else {
            return;
        };
        if self.is_open() {
            return;
        }
        self.state = MenuState::Open;
        page.add_class(hooks.menu, &self.config.open_class);
        page.add_class(hooks.toggle, &self.config.open_class);
        if let Some(body) = hooks.body {
            page.add_class(body, &self.config.body_open_class);
        }
        debug!("menu opened");
    }

    /// Close the menu. Returns `true` if it was open.
    pub fn close(&mut self, page: &mut impl Page, cause: CloseCause) -> bool {
        let Some(hooks) = self.hooks else {
            return false;
        };
        if !self.is_open() {
            return false;
        }
        self.state = MenuState::Closed;
        page.remove_class(hooks.menu, &self.config.open_class);
        page.remove_class(hooks.toggle, &self.config.open_class);
        if let Some(body) = hooks.body {
            page.remove_class(body, &self.config.body_open_class);
        }
        debug!(?cause, "menu closed");
        true
    }

    /// Route a document click.
    ///
    /// Clicks on the toggle flip the menu and are consumed, so the
    /// outside-click rule never sees them. Clicks on a link inside the menu
    /// and clicks outside both menu and toggle close an open menu.
    pub fn handle_click(&mut self, page: &mut impl Page, target: ElementId) -> NavClick {
        let Some(hooks) = self.hooks else {
            return NavClick::PassThrough;
        };
        if page.contains(hooks.toggle, target) {
            self.toggle(page);
            return NavClick::Consumed;
        }
        if page.contains(hooks.menu, target) {
            let on_link = page
                .closest(target, &self.config.link_selector)
                .is_some_and(|link| page.contains(hooks.menu, link));
            if on_link {
                self.close(page, CloseCause::LinkClick);
            }
        } else {
            self.close(page, CloseCause::OutsideClick);
        }
        NavClick::PassThrough
    }

    /// Route a key press; `Escape` closes an open menu.
    pub fn handle_key(&mut self, page: &mut impl Page, key: &str) -> bool {
        if key == "Escape" {
            self.close(page, CloseCause::Escape)
        } else {
            false
        }
    }

    /// Apply or clear the mobile layout override.
    pub fn apply_layout(&mut self, page: &mut impl Page, mode: ViewportMode) {
        let Some(navbar) = self.navbar else {
            return;
        };
        match mode {
            ViewportMode::Mobile => {
                page.add_class(navbar, &self.config.mobile_layout_class);
                if let Some(container) = self.container {
                    page.add_class(container, &self.config.container_full_class);
                }
            }
            ViewportMode::Desktop => {
                page.remove_class(navbar, &self.config.mobile_layout_class);
                if let Some(container) = self.container {
                    page.remove_class(container, &self.config.container_full_class);
                }
            }
        }
        trace!(?mode, "navbar layout applied");
        self.layout = Some(mode);
    }
}

/// Stylesheet rules for the mobile layout markers.
///
/// The navbar is pinned to the top edge at full viewport width with any
/// desktop transform or margin neutralised; the nested container is
/// stretched to full width.
#[must_use]
pub fn mobile_layout_css(config: &NavConfig) -> String {
    format!(
        "{navbar}.{mobile} {{ position: fixed !important; top: 0 !important; left: 0 !important; \
         right: 0 !important; width: 100% !important; max-width: 100vw !important; \
         transform: none !important; margin: 0 !important; }}\n\
         .{full} {{ width: 100% !important; max-width: 100% !important; }}\n",
        navbar = config.navbar_selector,
        mobile = config.mobile_layout_class,
        full = config.container_full_class,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPage;

    use pretty_assertions::assert_eq;

    struct Fixture {
        page: MemoryPage,
        nav: NavigationController,
        navbar: ElementId,
        container: ElementId,
        toggle: ElementId,
        menu: ElementId,
        link: ElementId,
        content: ElementId,
    }

    fn fixture() -> Fixture {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let navbar = page.append(body, "nav.navbar");
        let container = page.append(navbar, "div.container");
        let toggle = page.append(container, "button#menu-toggle");
        page.append(toggle, "span.bar");
        let menu = page.append(container, "ul.nav-menu");
        let item = page.append(menu, "li");
        let link = page.append_text(item, "a", "Blog");
        let content = page.append(body, "main");
        let nav = NavigationController::attach(&mut page, &NavConfig::default());
        Fixture {
            page,
            nav,
            navbar,
            container,
            toggle,
            menu,
            link,
            content,
        }
    }

    fn markers(f: &Fixture) -> (bool, bool, bool) {
        (
            f.page.has_class(f.menu, "active"),
            f.page.has_class(f.toggle, "active"),
            f.page.has_class(f.page.body_id(), "menu-open"),
        )
    }

    #[test]
    fn toggle_twice_returns_to_closed_without_markers() {
        let mut f = fixture();
        assert_eq!(f.nav.toggle(&mut f.page), MenuState::Open);
        assert_eq!(markers(&f), (true, true, true));
        assert_eq!(f.nav.toggle(&mut f.page), MenuState::Closed);
        assert_eq!(markers(&f), (false, false, false));
    }

    #[test]
    fn toggle_click_is_consumed_and_not_treated_as_outside() {
        let mut f = fixture();
        let icon = f.page.children(f.toggle)[0];
        assert_eq!(f.nav.handle_click(&mut f.page, icon), NavClick::Consumed);
        assert!(f.nav.is_open());
    }

    #[test]
    fn outside_click_closes_only_when_open() {
        let mut f = fixture();
        assert_eq!(
            f.nav.handle_click(&mut f.page, f.content),
            NavClick::PassThrough
        );
        assert!(!f.nav.is_open());

        f.nav.open(&mut f.page);
        f.nav.handle_click(&mut f.page, f.content);
        assert_eq!(f.nav.state(), MenuState::Closed);
        assert_eq!(markers(&f), (false, false, false));
    }

    #[test]
    fn click_inside_menu_off_link_keeps_menu_open() {
        let mut f = fixture();
        f.nav.open(&mut f.page);
        f.nav.handle_click(&mut f.page, f.menu);
        assert!(f.nav.is_open());
        f.nav.handle_click(&mut f.page, f.link);
        assert!(!f.nav.is_open());
    }

    #[test]
    fn escape_closes_and_close_is_idempotent() {
        let mut f = fixture();
        assert!(!f.nav.handle_key(&mut f.page, "Escape"));
        f.nav.open(&mut f.page);
        assert!(!f.nav.handle_key(&mut f.page, "Enter"));
        assert!(f.nav.handle_key(&mut f.page, "Escape"));
        assert!(!f.nav.close(&mut f.page, CloseCause::Escape));
    }

    #[test]
    fn mobile_layout_marks_navbar_and_container() {
        let mut f = fixture();
        f.nav.apply_layout(&mut f.page, ViewportMode::Mobile);
        assert!(f.page.has_class(f.navbar, "nav-mobile-fixed"));
        assert!(f.page.has_class(f.container, "container-full"));

        f.nav.apply_layout(&mut f.page, ViewportMode::Desktop);
        assert!(!f.page.has_class(f.navbar, "nav-mobile-fixed"));
        assert!(!f.page.has_class(f.container, "container-full"));
        assert_eq!(f.nav.layout(), Some(ViewportMode::Desktop));
    }

    #[test]
    fn missing_hooks_disable_menu_silently() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let target = page.append(body, "div");
        let mut nav = NavigationController::attach(&mut page, &NavConfig::default());
        assert_eq!(nav.toggle(&mut page), MenuState::Closed);
        assert_eq!(nav.handle_click(&mut page, target), NavClick::PassThrough);
        nav.apply_layout(&mut page, ViewportMode::Mobile);
        assert_eq!(nav.layout(), None);
    }

    #[test]
    fn layout_css_targets_configured_classes() {
        let css = mobile_layout_css(&NavConfig::default());
        assert!(css.starts_with(".navbar.nav-mobile-fixed {"));
        assert!(css.contains("width: 100% !important"));
        assert!(css.contains(".container-full {"));
    }
}
