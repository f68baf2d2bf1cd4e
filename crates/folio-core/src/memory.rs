#![forbid(unsafe_code)]

//! In-memory [`Page`] implementation.
//!
//! `MemoryPage` is a small element tree with enough selector support to run
//! every controller without a browser. It records navigations and
//! scroll-into-view requests so hosts and tests can assert on them.
//!
//! ```
//! use folio_core::memory::MemoryPage;
//! use folio_core::page::Page;
//!
//! let mut page = MemoryPage::new();
//! let body = page.body_id();
//! let nav = page.append(body, "nav.navbar");
//! let menu = page.append(nav, "ul.nav-menu");
//! assert_eq!(page.query_first(".navbar .nav-menu"), Some(menu));
//! ```

use std::collections::BTreeMap;

use crate::page::{ElementId, Page, Rect};

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    attributes: BTreeMap<String, String>,
    text: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    rect: Rect,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
            styles: BTreeMap::new(),
            attributes: BTreeMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
            rect: Rect::default(),
        }
    }
}

/// Element tree rooted at `<html>` with a `<body>` child.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    nodes: Vec<Node>,
    root: ElementId,
    body: ElementId,
    navigations: Vec<String>,
    scrolled_into_view: Vec<ElementId>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    /// Create a page containing only `<html><body></body></html>`.
    #[must_use]
    pub fn new() -> Self {
        let mut page = Self {
            nodes: vec![Node::new("html")],
            root: ElementId(0),
            body: ElementId(0),
            navigations: Vec::new(),
            scrolled_into_view: Vec::new(),
        };
        let body = page.alloc(Node::new("body"));
        page.attach(page.root, body);
        page.body = body;
        page
    }

    /// The `<body>` element.
    #[must_use]
    pub const fn body_id(&self) -> ElementId {
        self.body
    }

    /// Append a child built from a compact shape such as `"a.btn.primary#go"`.
    ///
    /// The shape is a tag name followed by any number of `.class` and at most
    /// one `#id` suffix.
    pub fn append(&mut self, parent: ElementId, shape: &str) -> ElementId {
        let mut tag_end = shape.len();
        for (idx, ch) in shape.char_indices() {
            if ch == '.' || ch == '#' {
                tag_end = idx;
                break;
            }
        }
        let tag = if tag_end == 0 { "div" } else { &shape[..tag_end] };
        let mut node = Node::new(tag);
        let mut rest = &shape[tag_end..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let name = &body[..end];
            if marker == '.' {
                node.classes.push(name.to_owned());
            } else {
                node.attributes.insert("id".to_owned(), name.to_owned());
            }
            rest = &body[end..];
        }
        let id = self.alloc(node);
        self.attach(parent, id);
        id
    }

    /// Append a child carrying `text` as its own text content.
    pub fn append_text(&mut self, parent: ElementId, shape: &str, text: &str) -> ElementId {
        let id = self.append(parent, shape);
        if let Some(node) = self.node_mut(id) {
            node.text = text.to_owned();
        }
        id
    }

    /// Set the layout box reported by [`Page::bounding_rect`].
    pub fn set_rect(&mut self, element: ElementId, rect: Rect) {
        if let Some(node) = self.node_mut(element) {
            node.rect = rect;
        }
    }

    /// Tag name of an element.
    #[must_use]
    pub fn tag(&self, element: ElementId) -> Option<&str> {
        self.node(element).map(|node| node.tag.as_str())
    }

    /// Classes on an element, in insertion order.
    #[must_use]
    pub fn classes(&self, element: ElementId) -> Vec<&str> {
        self.node(element)
            .map(|node| node.classes.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Direct children of an element.
    #[must_use]
    pub fn children(&self, element: ElementId) -> &[ElementId] {
        self.node(element)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// URLs passed to [`Page::navigate`], oldest first.
    #[must_use]
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    /// Elements passed to [`Page::scroll_into_view`], oldest first.
    #[must_use]
    pub fn scrolled_into_view(&self) -> &[ElementId] {
        &self.scrolled_into_view
    }

    fn alloc(&mut self, node: Node) -> ElementId {
        let id = ElementId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn node(&self, id: ElementId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    fn detach(&mut self, child: ElementId) {
        let Some(parent) = self.node(child).and_then(|node| node.parent) else {
            return;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
    }

    fn attach(&mut self, parent: ElementId, child: ElementId) {
        if parent == child || self.node(parent).is_none() || self.contains(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    fn descendants(&self, root: ElementId, out: &mut Vec<ElementId>) {
        if let Some(node) = self.node(root) {
            for &child in &node.children {
                out.push(child);
                self.descendants(child, out);
            }
        }
    }

    fn collect_text(&self, id: ElementId, out: &mut String) {
        if let Some(node) = self.node(id) {
            out.push_str(&node.text);
            for &child in &node.children {
                self.collect_text(child, out);
            }
        }
    }

    fn matches(&self, id: ElementId, selector: &SelectorList) -> bool {
        selector.0.iter().any(|complex| self.matches_complex(id, complex))
    }

    fn matches_complex(&self, id: ElementId, complex: &[Compound]) -> bool {
        let Some((subject, ancestors)) = complex.split_last() else {
            return false;
        };
        if !self.matches_compound(id, subject) {
            return false;
        }
        let mut cursor = self.node(id).and_then(|node| node.parent);
        for compound in ancestors.iter().rev() {
            loop {
                let Some(current) = cursor else {
                    return false;
                };
                cursor = self.node(current).and_then(|node| node.parent);
                if self.matches_compound(current, compound) {
                    break;
                }
            }
        }
        true
    }

    fn matches_compound(&self, id: ElementId, compound: &Compound) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        compound.0.iter().all(|simple| match simple {
            Simple::Tag(tag) => node.tag == *tag,
            Simple::Id(want) => node.attributes.get("id") == Some(want),
            Simple::Class(class) => node.classes.iter().any(|c| c == class),
            Simple::Attr(name) => node.attributes.contains_key(name),
            Simple::AttrPrefix(name, prefix) => node
                .attributes
                .get(name)
                .is_some_and(|value| value.starts_with(prefix.as_str())),
        })
    }

    fn select(&self, root: ElementId, selector: &str) -> Vec<ElementId> {
        let Some(selector) = SelectorList::parse(selector) else {
            return Vec::new();
        };
        let mut all = Vec::new();
        self.descendants(root, &mut all);
        all.into_iter()
            .filter(|&id| self.matches(id, &selector))
            .collect()
    }
}

impl Page for MemoryPage {
    fn body(&mut self) -> Option<ElementId> {
        Some(self.body)
    }

    fn query_all(&mut self, selector: &str) -> Vec<ElementId> {
        self.select(self.root, selector)
    }

    fn query_within(&mut self, root: ElementId, selector: &str) -> Vec<ElementId> {
        self.select(root, selector)
    }

    fn element_by_id(&mut self, id: &str) -> Option<ElementId> {
        let mut all = Vec::new();
        self.descendants(self.root, &mut all);
        all.into_iter().find(|&element| {
            self.node(element)
                .and_then(|node| node.attributes.get("id"))
                .is_some_and(|value| value == id)
        })
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.node(current).and_then(|n| n.parent);
        }
        false
    }

    fn closest(&mut self, node: ElementId, selector: &str) -> Option<ElementId> {
        let selector = SelectorList::parse(selector)?;
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.matches(current, &selector) {
                return Some(current);
            }
            cursor = self.node(current).and_then(|n| n.parent);
        }
        None
    }

    fn add_class(&mut self, element: ElementId, class: &str) {
        if let Some(node) = self.node_mut(element)
            && !node.classes.iter().any(|c| c == class)
        {
            node.classes.push(class.to_owned());
        }
    }

    fn remove_class(&mut self, element: ElementId, class: &str) {
        if let Some(node) = self.node_mut(element) {
            node.classes.retain(|c| c != class);
        }
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.node(element)
            .is_some_and(|node| node.classes.iter().any(|c| c == class))
    }

    fn style(&self, element: ElementId, property: &str) -> Option<String> {
        self.node(element)?.styles.get(property).cloned()
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) {
        if let Some(node) = self.node_mut(element) {
            if value.is_empty() {
                node.styles.remove(property);
            } else {
                node.styles.insert(property.to_owned(), value.to_owned());
            }
        }
    }

    fn remove_style(&mut self, element: ElementId, property: &str) {
        if let Some(node) = self.node_mut(element) {
            node.styles.remove(property);
        }
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.node(element)?.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(element) {
            node.attributes.insert(name.to_owned(), value.to_owned());
        }
    }

    fn remove_attribute(&mut self, element: ElementId, name: &str) {
        if let Some(node) = self.node_mut(element) {
            node.attributes.remove(name);
        }
    }

    fn text_content(&self, element: ElementId) -> String {
        let mut out = String::new();
        self.collect_text(element, &mut out);
        out
    }

    fn set_text(&mut self, element: ElementId, text: &str) {
        let children = self.children(element).to_vec();
        for child in children {
            self.detach(child);
        }
        if let Some(node) = self.node_mut(element) {
            node.text = text.to_owned();
        }
    }

    fn create_element(&mut self, tag: &str) -> Option<ElementId> {
        Some(self.alloc(Node::new(tag)))
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) {
        self.attach(parent, child);
    }

    fn remove_element(&mut self, element: ElementId) {
        self.detach(element);
    }

    fn is_connected(&self, element: ElementId) -> bool {
        self.node(element).is_some() && self.contains(self.root, element)
    }

    fn bounding_rect(&self, element: ElementId) -> Rect {
        self.node(element).map(|node| node.rect).unwrap_or_default()
    }

    fn navigate(&mut self, url: &str) {
        self.navigations.push(url.to_owned());
    }

    fn scroll_into_view(&mut self, element: ElementId) {
        self.scrolled_into_view.push(element);
    }
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
    Tag(String),
    Id(String),
    Class(String),
    Attr(String),
    AttrPrefix(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound(Vec<Simple>);

/// Comma-separated list of descendant chains.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectorList(Vec<Vec<Compound>>);

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn take_ident(input: &str) -> (&str, &str) {
    let end = input
        .char_indices()
        .find(|&(_, ch)| !is_ident_char(ch))
        .map_or(input.len(), |(idx, _)| idx);
    input.split_at(end)
}

impl SelectorList {
    /// Parse the supported subset; `None` for anything else.
    fn parse(input: &str) -> Option<Self> {
        let mut list = Vec::new();
        for part in split_outside_brackets(input, |ch| ch == ',') {
            let mut chain = Vec::new();
            for compound in split_outside_brackets(part, char::is_whitespace) {
                chain.push(Compound::parse(compound)?);
            }
            if chain.is_empty() {
                return None;
            }
            list.push(chain);
        }
        if list.is_empty() { None } else { Some(Self(list)) }
    }
}

impl Compound {
    fn parse(mut input: &str) -> Option<Self> {
        let mut parts = Vec::new();
        let (tag, rest) = take_ident(input);
        if !tag.is_empty() {
            parts.push(Simple::Tag(tag.to_ascii_lowercase()));
        }
        input = rest;
        while let Some(marker) = input.chars().next() {
            input = &input[marker.len_utf8()..];
            match marker {
                '#' | '.' => {
                    let (name, rest) = take_ident(input);
                    if name.is_empty() {
                        return None;
                    }
                    parts.push(if marker == '#' {
                        Simple::Id(name.to_owned())
                    } else {
                        Simple::Class(name.to_owned())
                    });
                    input = rest;
                }
                '[' => {
                    let close = input.find(']')?;
                    let inner = &input[..close];
                    input = &input[close + 1..];
                    let (name, rest) = take_ident(inner.trim());
                    if name.is_empty() {
                        return None;
                    }
                    let rest = rest.trim();
                    if rest.is_empty() {
                        parts.push(Simple::Attr(name.to_owned()));
                    } else {
                        let value = rest.strip_prefix("^=")?.trim();
                        let value = value.trim_matches(|c| c == '"' || c == '\'');
                        parts.push(Simple::AttrPrefix(name.to_owned(), value.to_owned()));
                    }
                }
                _ => return None,
            }
        }
        if parts.is_empty() { None } else { Some(Self(parts)) }
    }
}

fn split_outside_brackets(input: &str, is_sep: impl Fn(char) -> bool) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in input.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 && is_sep(ch) => {
                let piece = input[start..idx].trim();
                if !piece.is_empty() {
                    out.push(piece);
                }
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }
    let piece = input[start..].trim();
    if !piece.is_empty() {
        out.push(piece);
    }
    out
}
