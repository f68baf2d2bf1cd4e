#![forbid(unsafe_code)]

//! Browser wiring: DOM listeners, intersection observers, clipboard and the
//! wake timer, all feeding one [`Site`].
//!
//! Only compiled on `wasm32` targets.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use folio_core::nav::mobile_layout_css;
use folio_core::{
    ClipboardError, ElementId, HostRequest, IntersectionEntry, ObserverGroup, PageEvent,
    ScrollMetrics, Site, SiteConfig,
};
use js_sys::Array;
use tracing::{debug, trace};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, Event, EventTarget, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, KeyboardEvent, MouseEvent, Window,
};
use web_time::Instant;

use crate::dom_page::DomPage;
use crate::{CONFIG_ELEMENT_ID, load_inline_config};

type Shared = Rc<RefCell<Runtime>>;

struct Runtime {
    site: Site,
    page: DomPage,
    observers: HashMap<ObserverGroup, IntersectionObserver>,
    origin: Instant,
    /// Pending `setTimeout` handle and the deadline it was armed for.
    wake: Option<(i32, core::time::Duration)>,
    wake_callback: Option<Closure<dyn FnMut()>>,
}

impl Runtime {
    fn now(&self) -> core::time::Duration {
        self.origin.elapsed()
    }
}

fn console_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

fn viewport_width(window: &Window) -> f64 {
    window
        .inner_width()
        .ok()
        .and_then(|width| width.as_f64())
        .unwrap_or(0.0)
}

/// Module entry point: boots once the document content is parsed.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    if document.ready_state() == "loading" {
        let target: EventTarget = document.clone().into();
        let on_ready = Closure::once(move || {
            if let Err(err) = boot(window, document) {
                web_sys::console::error_1(&err);
            }
        });
        target.add_event_listener_with_callback(
            "DOMContentLoaded",
            on_ready.as_ref().unchecked_ref(),
        )?;
        on_ready.forget();
        Ok(())
    } else {
        boot(window, document)
    }
}

fn boot(window: Window, document: Document) -> Result<(), JsValue> {
    let inline = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content());
    let config = load_inline_config(inline.as_deref());
    inject_layout_css(&document, &config)?;

    let site = Site::new(config, viewport_width(&window));
    let rt: Shared = Rc::new(RefCell::new(Runtime {
        site,
        page: DomPage::new(window.clone(), document.clone()),
        observers: HashMap::new(),
        origin: Instant::now(),
        wake: None,
        wake_callback: None,
    }));

    let weak = Rc::downgrade(&rt);
    rt.borrow_mut().wake_callback = Some(Closure::<dyn FnMut()>::new(move || {
        if let Some(rt) = weak.upgrade() {
            wake(&rt);
        }
    }));

    create_observers(&rt)?;
    install_listeners(&rt, &window, &document)?;
    dispatch(&rt, PageEvent::Ready);
    debug!("folio booted");
    Ok(())
}

fn inject_layout_css(document: &Document, config: &SiteConfig) -> Result<(), JsValue> {
    let Some(head) = document.head() else {
        return Ok(());
    };
    let style = document.create_element("style")?;
    style.set_text_content(Some(&mobile_layout_css(&config.nav)));
    head.append_child(&style)?;
    Ok(())
}

fn listen(
    target: &EventTarget,
    kind: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn install_listeners(rt: &Shared, window: &Window, document: &Document) -> Result<(), JsValue> {
    let weak = Rc::downgrade(rt);
    listen(document, "click", move |event: Event| {
        let Some(rt) = weak.upgrade() else { return };
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        let (x, y) = event.dyn_ref::<MouseEvent>().map_or((0.0, 0.0), |mouse| {
            (f64::from(mouse.client_x()), f64::from(mouse.client_y()))
        });
        let target = rt.borrow_mut().page.register(target);
        if dispatch(&rt, PageEvent::Click { target, x, y }).prevent_default {
            event.prevent_default();
        }
    })?;

    let weak = Rc::downgrade(rt);
    listen(document, "keydown", move |event: Event| {
        let Some(rt) = weak.upgrade() else { return };
        if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
            dispatch(&rt, PageEvent::KeyDown { key: key.key() });
        }
    })?;

    let weak = Rc::downgrade(rt);
    let scroll_window = window.clone();
    listen(window, "scroll", move |_| {
        let Some(rt) = weak.upgrade() else { return };
        let Some(root) = scroll_window
            .document()
            .and_then(|d| d.document_element())
        else {
            return;
        };
        let metrics = ScrollMetrics {
            scroll_top: scroll_window.scroll_y().unwrap_or(0.0),
            scroll_height: f64::from(root.scroll_height()),
            client_height: f64::from(root.client_height()),
        };
        dispatch(&rt, PageEvent::Scroll(metrics));
    })?;

    for kind in ["resize", "orientationchange"] {
        let weak = Rc::downgrade(rt);
        let resize_window = window.clone();
        listen(window, kind, move |_| {
            let Some(rt) = weak.upgrade() else { return };
            let width = viewport_width(&resize_window);
            dispatch(&rt, PageEvent::Resize { width });
        })?;
    }

    let weak = Rc::downgrade(rt);
    let load_window = window.clone();
    listen(window, "load", move |_| {
        let Some(rt) = weak.upgrade() else { return };
        let width = viewport_width(&load_window);
        dispatch(&rt, PageEvent::Load { width });
    })
}

fn create_observers(rt: &Shared) -> Result<(), JsValue> {
    for group in ObserverGroup::ALL {
        let options = group.options(rt.borrow().site.config());
        let weak = Rc::downgrade(rt);
        let callback = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, _observer: IntersectionObserver| {
                let Some(rt) = weak.upgrade() else { return };
                let entries: Vec<IntersectionEntry> = {
                    let mut guard = rt.borrow_mut();
                    entries
                        .iter()
                        .filter_map(|value| value.dyn_into::<IntersectionObserverEntry>().ok())
                        .map(|entry| IntersectionEntry {
                            target: guard.page.register(entry.target()),
                            ratio: entry.intersection_ratio(),
                            is_intersecting: entry.is_intersecting(),
                        })
                        .collect()
                };
                dispatch(&rt, PageEvent::Intersection { group, entries });
            },
        );
        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&format!("{}px", options.root_margin_px));
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        callback.forget();
        rt.borrow_mut().observers.insert(group, observer);
    }
    Ok(())
}

/// Feed one event to the site, then carry out its requests.
fn dispatch(rt: &Shared, event: PageEvent) -> folio_core::Dispatch {
    let result = {
        let mut guard = rt.borrow_mut();
        let runtime = &mut *guard;
        let now = runtime.now();
        runtime.site.handle(&mut runtime.page, now, event)
    };
    for request in &result.requests {
        execute(rt, request);
    }
    schedule_wake(rt);
    result
}

fn execute(rt: &Shared, request: &HostRequest) {
    match request {
        HostRequest::Observe { group, target } => {
            let element = {
                let guard = rt.borrow();
                let (Some(observer), Some(element)) =
                    (guard.observers.get(group), guard.page.element(*target))
                else {
                    return;
                };
                observer.observe(element);
                element.clone()
            };
            if *group == ObserverGroup::LazyImage {
                watch_image_load(rt, &element, *target);
            }
        }
        HostRequest::Unobserve { group, target } => {
            let guard = rt.borrow();
            if let (Some(observer), Some(element)) =
                (guard.observers.get(group), guard.page.element(*target))
            {
                observer.unobserve(element);
            }
        }
        HostRequest::WriteClipboard { button, text } => {
            wasm_bindgen_futures::spawn_local(write_clipboard(
                Rc::downgrade(rt),
                *button,
                text.clone(),
            ));
        }
    }
}

fn watch_image_load(rt: &Shared, element: &Element, image: ElementId) {
    let weak = Rc::downgrade(rt);
    let result = listen(element, "load", move |_| {
        if let Some(rt) = weak.upgrade() {
            dispatch(&rt, PageEvent::ImageLoaded { image });
        }
    });
    if result.is_err() {
        trace!(image = image.0, "could not watch image load");
    }
}

async fn write_clipboard(rt: Weak<RefCell<Runtime>>, button: ElementId, text: String) {
    let result = match web_sys::window() {
        Some(window) => {
            let clipboard = window.navigator().clipboard();
            if clipboard.is_undefined() {
                Err(ClipboardError::Unsupported)
            } else {
                JsFuture::from(clipboard.write_text(&text))
                    .await
                    .map(|_| ())
                    .map_err(|err| ClipboardError::Denied(describe_js_error(&err)))
            }
        }
        None => Err(ClipboardError::Unsupported),
    };
    if let Err(err) = &result {
        console_error(&format!("Failed to copy code: {err}"));
    }
    if let Some(rt) = rt.upgrade() {
        dispatch(&rt, PageEvent::ClipboardResult { button, result });
    }
}

fn describe_js_error(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| "unknown error".to_owned())
}

fn wake(rt: &Shared) {
    {
        let mut guard = rt.borrow_mut();
        let runtime = &mut *guard;
        runtime.wake = None;
        let now = runtime.now();
        runtime.site.advance_to(&mut runtime.page, now);
    }
    schedule_wake(rt);
}

/// Arm `setTimeout` for the site's next deadline unless an earlier one is
/// already armed.
fn schedule_wake(rt: &Shared) {
    let mut guard = rt.borrow_mut();
    let Some(deadline) = guard.site.next_deadline() else {
        return;
    };
    let window = guard.page.window().clone();
    if let Some((handle, armed_for)) = guard.wake {
        if armed_for <= deadline {
            return;
        }
        window.clear_timeout_with_handle(handle);
        guard.wake = None;
    }
    let delay = deadline.saturating_sub(guard.now());
    let Some(callback) = guard.wake_callback.as_ref() else {
        return;
    };
    let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    let armed = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.as_ref().unchecked_ref(),
        millis,
    );
    match armed {
        Ok(handle) => guard.wake = Some((handle, deadline)),
        Err(err) => console_error(&format!(
            "folio: could not arm timer: {}",
            describe_js_error(&err)
        )),
    }
}
