#![cfg(target_arch = "wasm32")]
#![forbid(unsafe_code)]

use core::time::Duration;

use folio_core::{MenuState, Page, PageEvent, Site, SiteConfig};
use folio_web::dom_page::DomPage;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

const FIXTURE: &str = r##"
<nav class="navbar">
  <button id="menu-toggle"><span class="bar"></span></button>
  <ul class="nav-menu"><li><a href="#about">About</a></li></ul>
</nav>
<div class="container">
  <section id="about" class="resume-section"></section>
  <section id="über-uns"></section>
  <button class="btn" id="contact">Contact</button>
  <div class="post-body"><pre><code>cargo run</code></pre></div>
</div>
"##;

fn fixture_page() -> DomPage {
    let window = web_sys::window().expect("window");
    let document = window.document().expect("document");
    document.body().expect("body").set_inner_html(FIXTURE);
    DomPage::new(window, document)
}

#[wasm_bindgen_test]
fn registered_handles_are_stable() {
    let mut page = fixture_page();
    let toggle = page.query_first("#menu-toggle").expect("toggle");
    let again = page.query_first("button").expect("button");
    assert_eq!(toggle, again);

    let bar = page.query_first(".bar").expect("bar");
    assert_eq!(page.closest(bar, "#menu-toggle"), Some(toggle));
    let navbar = page.query_first(".navbar").expect("navbar");
    assert!(page.contains(navbar, bar));
    assert!(!page.contains(bar, navbar));
}

#[wasm_bindgen_test]
fn toggle_click_opens_menu_in_the_dom() {
    let mut page = fixture_page();
    let mut site = Site::new(SiteConfig::default(), 1280.0);
    site.handle(&mut page, Duration::ZERO, PageEvent::Ready);

    let bar = page.query_first(".bar").expect("bar");
    let dispatch = site.handle(
        &mut page,
        Duration::from_millis(10),
        PageEvent::Click {
            target: bar,
            x: 0.0,
            y: 0.0,
        },
    );
    assert!(!dispatch.prevent_default);
    assert_eq!(site.nav().map(|n| n.state()), Some(MenuState::Open));

    let menu = page.query_first(".nav-menu").expect("menu");
    let body = page.body().expect("body");
    assert!(page.has_class(menu, "active"));
    assert!(page.has_class(body, "menu-open"));
}

#[wasm_bindgen_test]
fn ready_injects_copy_button_and_hides_sections() {
    let mut page = fixture_page();
    let mut site = Site::new(SiteConfig::default(), 1280.0);
    let dispatch = site.handle(&mut page, Duration::ZERO, PageEvent::Ready);
    assert!(!dispatch.requests.is_empty());

    let button = page.query_first(".code-copy-btn").expect("copy button");
    assert_eq!(page.text_content(button), "Copy");
    let section = page.query_first("#about").expect("section");
    assert_eq!(page.style(section, "opacity").as_deref(), Some("0"));
}

#[wasm_bindgen_test]
fn element_by_id_accepts_any_id_text() {
    let mut page = fixture_page();
    let section = page.element_by_id("über-uns").expect("section");
    assert_eq!(page.attribute(section, "id").as_deref(), Some("über-uns"));
    assert_eq!(page.element_by_id("über-uns"), Some(section));
    assert_eq!(page.element_by_id("nowhere"), None);
}

#[wasm_bindgen_test]
fn removed_ripples_release_their_handles() {
    let mut page = fixture_page();
    let mut site = Site::new(SiteConfig::default(), 1280.0);
    site.handle(&mut page, Duration::ZERO, PageEvent::Ready);
    let button = page.element_by_id("contact").expect("button");

    let mut now = Duration::from_millis(10);
    let mut click_and_settle = |page: &mut DomPage, site: &mut Site| {
        site.handle(
            page,
            now,
            PageEvent::Click {
                target: button,
                x: 1.0,
                y: 1.0,
            },
        );
        now += Duration::from_secs(1);
        site.advance_to(page, now);
    };

    click_and_settle(&mut page, &mut site);
    let baseline = page.registered();
    for _ in 0..50 {
        click_and_settle(&mut page, &mut site);
    }
    assert_eq!(page.registered(), baseline);
    assert!(page.query_all(".ripple").is_empty());
}
