#![forbid(unsafe_code)]

//! [`Page`] over the live document.
//!
//! Elements are registered on first sight and keep their [`ElementId`] until
//! [`Page::remove_element`] retires them. Retiring frees the slot of the
//! removed element and of every registered element inside it; freed slots are
//! handed out again, so transient elements such as ripples do not grow the
//! registry. Lookup is a linear identity scan.

use folio_core::{ElementId, Page, Rect};
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlElement, Node, NodeList, ScrollBehavior, ScrollIntoViewOptions,
    ScrollLogicalPosition, Window,
};

pub struct DomPage {
    window: Window,
    document: Document,
    elements: Vec<Option<Element>>,
    free: Vec<u32>,
}

impl DomPage {
    #[must_use]
    pub fn new(window: Window, document: Document) -> Self {
        Self {
            window,
            document,
            elements: Vec::new(),
            free: Vec::new(),
        }
    }

    #[must_use]
    pub const fn window(&self) -> &Window {
        &self.window
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Handle for `element`, assigning a fresh one on first sight.
    pub fn register(&mut self, element: Element) -> ElementId {
        if let Some(idx) = self
            .elements
            .iter()
            .position(|known| known.as_ref() == Some(&element))
        {
            return ElementId(idx as u32);
        }
        if let Some(idx) = self.free.pop() {
            self.elements[idx as usize] = Some(element);
            return ElementId(idx);
        }
        self.elements.push(Some(element));
        ElementId((self.elements.len() - 1) as u32)
    }

    /// The element behind `id`.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0 as usize)?.as_ref()
    }

    /// Number of live handles.
    #[must_use]
    pub fn registered(&self) -> usize {
        self.elements.len() - self.free.len()
    }

    /// Free the slots of `removed` and of every registered element inside it.
    fn retire(&mut self, removed: &Element) {
        let root: &Node = removed;
        for (idx, slot) in self.elements.iter_mut().enumerate() {
            let inside = slot.as_ref().is_some_and(|known| {
                let known: &Node = known;
                root.contains(Some(known))
            });
            if inside {
                *slot = None;
                self.free.push(idx as u32);
            }
        }
    }

    fn html(&self, id: ElementId) -> Option<&HtmlElement> {
        self.element(id)?.dyn_ref::<HtmlElement>()
    }

    fn collect(&mut self, list: NodeList) -> Vec<ElementId> {
        let mut out = Vec::with_capacity(list.length() as usize);
        for idx in 0..list.length() {
            if let Some(node) = list.item(idx)
                && let Ok(element) = node.dyn_into::<Element>()
            {
                out.push(self.register(element));
            }
        }
        out
    }
}

impl core::fmt::Debug for DomPage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomPage")
            .field("registered", &self.registered())
            .finish_non_exhaustive()
    }
}

impl Page for DomPage {
    fn body(&mut self) -> Option<ElementId> {
        let body: Element = self.document.body()?.into();
        Some(self.register(body))
    }

    fn query_all(&mut self, selector: &str) -> Vec<ElementId> {
        match self.document.query_selector_all(selector) {
            Ok(list) => self.collect(list),
            Err(_) => Vec::new(),
        }
    }

    fn query_within(&mut self, root: ElementId, selector: &str) -> Vec<ElementId> {
        let Some(root) = self.element(root).cloned() else {
            return Vec::new();
        };
        match root.query_selector_all(selector) {
            Ok(list) => self.collect(list),
            Err(_) => Vec::new(),
        }
    }

    fn element_by_id(&mut self, id: &str) -> Option<ElementId> {
        let element = self.document.get_element_by_id(id)?;
        Some(self.register(element))
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        match (self.element(ancestor), self.element(node)) {
            (Some(ancestor), Some(node)) => {
                let node: &Node = node;
                ancestor.contains(Some(node))
            }
            _ => false,
        }
    }

    fn closest(&mut self, node: ElementId, selector: &str) -> Option<ElementId> {
        let element = self.element(node)?.clone();
        let found = element.closest(selector).ok()??;
        Some(self.register(found))
    }

    fn add_class(&mut self, element: ElementId, class: &str) {
        if let Some(el) = self.element(element) {
            let _ = el.class_list().add_1(class);
        }
    }

    fn remove_class(&mut self, element: ElementId, class: &str) {
        if let Some(el) = self.element(element) {
            let _ = el.class_list().remove_1(class);
        }
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.element(element)
            .is_some_and(|el| el.class_list().contains(class))
    }

    fn style(&self, element: ElementId, property: &str) -> Option<String> {
        self.html(element)?
            .style()
            .get_property_value(property)
            .ok()
            .filter(|value| !value.is_empty())
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) {
        if let Some(el) = self.html(element) {
            let _ = el.style().set_property(property, value);
        }
    }

    fn remove_style(&mut self, element: ElementId, property: &str) {
        if let Some(el) = self.html(element) {
            let _ = el.style().remove_property(property);
        }
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.element(element)?.get_attribute(name)
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(el) = self.element(element) {
            let _ = el.set_attribute(name, value);
        }
    }

    fn remove_attribute(&mut self, element: ElementId, name: &str) {
        if let Some(el) = self.element(element) {
            let _ = el.remove_attribute(name);
        }
    }

    fn text_content(&self, element: ElementId) -> String {
        self.element(element)
            .and_then(|el| el.text_content())
            .unwrap_or_default()
    }

    fn set_text(&mut self, element: ElementId, text: &str) {
        if let Some(el) = self.element(element) {
            el.set_text_content(Some(text));
        }
    }

    fn create_element(&mut self, tag: &str) -> Option<ElementId> {
        let element = self.document.create_element(tag).ok()?;
        Some(self.register(element))
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if let (Some(parent), Some(child)) = (self.element(parent), self.element(child)) {
            let _ = parent.append_child(child);
        }
    }

    fn remove_element(&mut self, element: ElementId) {
        let Some(el) = self.element(element).cloned() else {
            return;
        };
        el.remove();
        self.retire(&el);
    }

    fn is_connected(&self, element: ElementId) -> bool {
        self.element(element).is_some_and(|el| el.is_connected())
    }

    fn bounding_rect(&self, element: ElementId) -> Rect {
        let Some(el) = self.element(element) else {
            return Rect::default();
        };
        let rect = el.get_bounding_client_rect();
        Rect {
            left: rect.left(),
            top: rect.top(),
            width: rect.width(),
            height: rect.height(),
        }
    }

    fn navigate(&mut self, url: &str) {
        let _ = self.window.location().set_href(url);
    }

    fn scroll_into_view(&mut self, element: ElementId) {
        if let Some(el) = self.element(element) {
            let options = ScrollIntoViewOptions::new();
            options.set_behavior(ScrollBehavior::Smooth);
            options.set_block(ScrollLogicalPosition::Start);
            el.scroll_into_view_with_scroll_into_view_options(&options);
        }
    }
}
