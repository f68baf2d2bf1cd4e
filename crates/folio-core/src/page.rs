#![forbid(unsafe_code)]

//! The document seam.
//!
//! Controllers never touch a DOM directly. They read and mutate the page
//! through [`Page`], which the browser host implements over `web-sys` and
//! tests implement with [`MemoryPage`](crate::memory::MemoryPage).
//!
//! Elements are addressed by opaque [`ElementId`] handles handed out by the
//! implementation. A handle whose element has been removed (or was never
//! attached) reports `false` from [`Page::is_connected`]. Removing an element
//! through [`Page::remove_element`] retires its handle; an implementation may
//! hand the slot out again for a later element.

/// Opaque handle to an element in a [`Page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

/// Viewport-relative bounding box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Read/write access to a live document.
///
/// Selectors follow CSS syntax. Implementations must support at least
/// `tag`, `#id`, `.class`, `[attr]`, `[attr^="prefix"]`, compounds of
/// those, descendant combinators and comma-separated lists.
pub trait Page {
    /// The document body, if the page has one.
    fn body(&mut self) -> Option<ElementId>;

    /// All elements matching `selector`, in document order.
    fn query_all(&mut self, selector: &str) -> Vec<ElementId>;

    /// Descendants of `root` matching `selector`, in document order.
    fn query_within(&mut self, root: ElementId, selector: &str) -> Vec<ElementId>;

    /// The connected element whose `id` attribute equals `id` exactly.
    ///
    /// Unlike a `#id` selector this accepts any id text, including dots and
    /// non-ASCII characters.
    fn element_by_id(&mut self, id: &str) -> Option<ElementId>;

    /// First element matching `selector`.
    fn query_first(&mut self, selector: &str) -> Option<ElementId> {
        self.query_all(selector).into_iter().next()
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;

    /// Nearest inclusive ancestor of `node` matching `selector`.
    fn closest(&mut self, node: ElementId, selector: &str) -> Option<ElementId>;

    fn add_class(&mut self, element: ElementId, class: &str);
    fn remove_class(&mut self, element: ElementId, class: &str);
    fn has_class(&self, element: ElementId, class: &str) -> bool;

    /// Inline style value; `None` when the property is not set inline.
    fn style(&self, element: ElementId, property: &str) -> Option<String>;
    fn set_style(&mut self, element: ElementId, property: &str, value: &str);
    fn remove_style(&mut self, element: ElementId, property: &str);

    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str);
    fn remove_attribute(&mut self, element: ElementId, name: &str);

    /// Concatenated text of the element and its descendants.
    fn text_content(&self, element: ElementId) -> String;

    /// Replace the element's children with a single text node.
    fn set_text(&mut self, element: ElementId, text: &str);

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> Option<ElementId>;
    fn append_child(&mut self, parent: ElementId, child: ElementId);
    fn remove_element(&mut self, element: ElementId);
    fn is_connected(&self, element: ElementId) -> bool;

    fn bounding_rect(&self, element: ElementId) -> Rect;

    /// Send the browser to `url`.
    fn navigate(&mut self, url: &str);

    /// Smooth-scroll `element` into view, aligned to its top.
    fn scroll_into_view(&mut self, element: ElementId);
}
