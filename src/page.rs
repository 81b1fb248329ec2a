//! Typed HTML document model.
//!
//! The theming pipeline operates on a page the way a browser script operates
//! on the DOM: query elements by class, rewrite class lists, insert chrome
//! fragments at fixed anchors, mutate image sources. This module supplies
//! that page as an explicit value — an arena-backed element tree addressed by
//! [`NodeId`], with a forgiving parser and a serializer.
//!
//! The parser is a host-page stand-in, not an HTML5 conformance effort. It
//! handles elements, attributes (quoted and bare), text, comments, doctype,
//! void elements, and raw-text elements (`script`/`style`). Anything it does
//! not understand is kept as text; parsing never fails. Re-serializing a
//! parsed page preserves structure and content, not byte-level formatting:
//! attribute order is normalized (class first) and known character entities
//! are decoded on the way in and re-escaped on the way out.

use std::fmt::Write as _;

/// Handle to a node in a [`Document`]. Only valid for the document that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Verbatim markup emitted untouched: doctype, comments, and the
    /// contents of raw-text elements.
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct Element {
    /// Tag name, lowercased.
    pub tag: String,
    /// Class list, split out of the `class` attribute.
    pub classes: Vec<String>,
    /// Remaining attributes in source order (`class` excluded).
    attrs: Vec<(String, String)>,
    pub children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Attribute value by (case-insensitive) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name, value.to_string())),
        }
    }

    fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }
}

/// Where to splice markup into a document. See [`Document::insert_markup`].
#[derive(Debug, Clone, Copy)]
pub enum InsertAt {
    /// First child of `<body>` (or of the document when there is no body).
    BodyStart,
    /// Last child of `<body>` (or of the document).
    BodyEnd,
    /// Last child of `<head>`; falls back to [`InsertAt::BodyStart`] when
    /// the page has no head.
    HeadEnd,
    /// Immediately after the given node, as a sibling.
    After(NodeId),
}

struct Entry {
    node: Node,
    parent: Option<NodeId>,
}

/// An HTML page as a mutable tree of nodes.
#[derive(Default)]
pub struct Document {
    entries: Vec<Entry>,
    roots: Vec<NodeId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an HTML string into a document. Forgiving and total: malformed
    /// input degrades to text or gets auto-closed, it never errors.
    pub fn parse(html: &str) -> Self {
        let mut doc = Self::new();
        let roots = parse_into(&mut doc, html);
        for &id in &roots {
            doc.entries[id.0].parent = None;
        }
        doc.roots = roots;
        doc
    }

    // ------------------------------------------------------------------
    // Node access
    // ------------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> &Node {
        &self.entries[id.0].node
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.entries[id.0].node {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.entries[id.0].node {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Children of an element node (empty for text/raw nodes).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.entries[id.0].node {
            Node::Element(el) => &el.children,
            _ => &[],
        }
    }

    /// Top-level nodes of the document.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a detached element. Attach it with [`Document::append_child`]
    /// or [`Document::insert_node`].
    pub fn push_element(&mut self, tag: &str) -> NodeId {
        self.push_node(Node::Element(Element::new(tag)))
    }

    pub fn push_text(&mut self, text: &str) -> NodeId {
        self.push_node(Node::Text(text.to_string()))
    }

    /// Create a detached raw node, serialized verbatim. Used for content
    /// that must not be entity-escaped, such as inline CSS.
    pub fn push_raw(&mut self, markup: &str) -> NodeId {
        self.push_node(Node::Raw(markup.to_string()))
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.entries.len());
        self.entries.push(Entry { node, parent: None });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Node::Element(el) = &mut self.entries[parent.0].node {
            el.children.push(child);
            self.entries[child.0].parent = Some(parent);
        }
    }

    /// Splice a detached node into the document at an anchor point.
    pub fn insert_node(&mut self, at: InsertAt, node: NodeId) {
        self.insert_nodes(at, &[node]);
    }

    fn insert_nodes(&mut self, at: InsertAt, nodes: &[NodeId]) {
        let (parent, index) = self.resolve_anchor(at);
        for (offset, &id) in nodes.iter().enumerate() {
            match parent {
                Some(p) => {
                    if let Node::Element(el) = &mut self.entries[p.0].node {
                        el.children.insert(index + offset, id);
                    }
                    self.entries[id.0].parent = Some(p);
                }
                None => {
                    self.roots.insert(index + offset, id);
                    self.entries[id.0].parent = None;
                }
            }
        }
    }

    /// Parse a markup fragment and splice its top-level nodes at an anchor.
    /// Returns the inserted top-level node ids in document order.
    pub fn insert_markup(&mut self, at: InsertAt, markup: &str) -> Vec<NodeId> {
        let nodes = parse_into(self, markup);
        self.insert_nodes(at, &nodes);
        nodes
    }

    /// Resolve an anchor to (parent element, child index).
    fn resolve_anchor(&self, at: InsertAt) -> (Option<NodeId>, usize) {
        match at {
            InsertAt::BodyStart => match self.body() {
                Some(body) => (Some(body), 0),
                None => (None, 0),
            },
            InsertAt::BodyEnd => match self.body() {
                Some(body) => (Some(body), self.children(body).len()),
                None => (None, self.roots.len()),
            },
            InsertAt::HeadEnd => match self.head() {
                Some(head) => (Some(head), self.children(head).len()),
                None => self.resolve_anchor(InsertAt::BodyStart),
            },
            InsertAt::After(id) => {
                let parent = self.entries[id.0].parent;
                let siblings: &[NodeId] = match parent {
                    Some(p) => self.children(p),
                    None => &self.roots,
                };
                let pos = siblings.iter().position(|&s| s == id);
                match pos {
                    Some(pos) => (parent, pos + 1),
                    // Detached anchor: degrade to the end of the body.
                    None => self.resolve_anchor(InsertAt::BodyEnd),
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All nodes in document (pre-)order.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            for &child in self.children(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// First element with the given tag name, in document order.
    pub fn first_tag(&self, tag: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|&id| self.element(id).is_some_and(|el| el.tag == tag))
    }

    pub fn body(&self) -> Option<NodeId> {
        self.first_tag("body")
    }

    pub fn head(&self) -> Option<NodeId> {
        self.first_tag("head")
    }

    /// All elements bearing the given class, in document order.
    pub fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|&id| self.has_class(id, class))
            .collect()
    }

    pub fn first_with_class(&self, class: &str) -> Option<NodeId> {
        self.walk().into_iter().find(|&id| self.has_class(id, class))
    }

    /// All `<img>` elements in document order.
    pub fn images(&self) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(|el| el.tag == "img"))
            .collect()
    }

    /// `<img>` elements at or below the given node, in document order.
    pub fn images_under(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.element(id).is_some_and(|el| el.tag == "img") {
                out.push(id);
            }
            for &child in self.children(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Class and attribute operations
    // ------------------------------------------------------------------

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id)
            .is_some_and(|el| el.classes.iter().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if class.is_empty() || self.has_class(id, class) {
            return;
        }
        if let Some(el) = self.element_mut(id) {
            el.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            el.classes.retain(|c| c != class);
        }
    }

    /// Toggle a class; returns true when the class is present afterwards.
    pub fn toggle_class(&mut self, id: NodeId, class: &str) -> bool {
        if self.has_class(id, class) {
            self.remove_class(id, class);
            false
        } else {
            self.add_class(id, class);
            true
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.remove_attr(name);
        }
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for &id in &self.roots {
            self.write_node(&mut out, id);
        }
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId) {
        match &self.entries[id.0].node {
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Raw(markup) => out.push_str(markup),
            Node::Element(el) => {
                let _ = write!(out, "<{}", el.tag);
                if !el.classes.is_empty() {
                    let _ = write!(out, " class=\"{}\"", escape_attr(&el.classes.join(" ")));
                }
                for (name, value) in &el.attrs {
                    let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
                }
                out.push('>');
                if !is_void(&el.tag) {
                    for &child in &el.children {
                        self.write_node(out, child);
                    }
                    let _ = write!(out, "</{}>", el.tag);
                }
            }
        }
    }
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_raw_text(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

pub(crate) fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Decode the character entities the serializer can round-trip, plus numeric
/// references. Unknown named entities are kept literally.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match rest[1..].find(';') {
            Some(end) if end <= 10 => {
                let name = &rest[1..end + 1];
                let decoded = match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => name
                        .strip_prefix("#x")
                        .or_else(|| name.strip_prefix("#X"))
                        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                        .or_else(|| {
                            name.strip_prefix('#').and_then(|dec| dec.parse().ok())
                        })
                        .and_then(char::from_u32),
                };
                match decoded {
                    Some(c) => {
                        out.push(c);
                        rest = &rest[end + 2..];
                    }
                    None => {
                        out.push('&');
                        rest = &rest[1..];
                    }
                }
            }
            _ => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ----------------------------------------------------------------------
// Parser
// ----------------------------------------------------------------------

/// Parse markup into detached nodes owned by `doc`; returns top-level ids.
fn parse_into(doc: &mut Document, html: &str) -> Vec<NodeId> {
    let mut parser = Parser {
        src: html,
        pos: 0,
        doc,
        roots: Vec::new(),
        stack: Vec::new(),
        text: String::new(),
    };
    parser.run();
    parser.roots
}

struct Parser<'a, 'd> {
    src: &'a str,
    pos: usize,
    doc: &'d mut Document,
    roots: Vec<NodeId>,
    stack: Vec<NodeId>,
    text: String,
}

impl<'a> Parser<'a, '_> {
    fn run(&mut self) {
        while self.pos < self.src.len() {
            match self.rest().find('<') {
                None => {
                    let len = self.rest().len();
                    self.take_text(len);
                    break;
                }
                Some(lt) => {
                    self.take_text(lt);
                    if !self.markup() {
                        // Stray '<': keep it as text and move on.
                        self.text.push('<');
                        self.pos += 1;
                    }
                }
            }
        }
        self.flush_text();
        // Unclosed elements at EOF are auto-closed by draining the stack.
        self.stack.clear();
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn take_text(&mut self, len: usize) {
        self.text.push_str(&self.src[self.pos..self.pos + len]);
        self.pos += len;
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let decoded = decode_entities(&self.text);
        self.text.clear();
        let id = self.doc.push_text(&decoded);
        self.attach(id);
    }

    fn attach(&mut self, id: NodeId) {
        match self.stack.last() {
            Some(&parent) => self.doc.append_child(parent, id),
            None => {
                self.doc.entries[id.0].parent = None;
                self.roots.push(id);
            }
        }
    }

    /// Consume one `<...>` construct. Returns false when the '<' at the
    /// cursor does not start markup.
    fn markup(&mut self) -> bool {
        let rest = self.rest();
        if let Some(comment) = rest.strip_prefix("<!--") {
            self.flush_text();
            let len = match comment.find("-->") {
                Some(end) => 4 + end + 3,
                None => rest.len(),
            };
            let raw = &self.src[self.pos..self.pos + len];
            self.pos += len;
            let id = self.doc.push_raw(raw);
            self.attach(id);
            return true;
        }
        if rest.starts_with("<!") {
            self.flush_text();
            let len = match rest.find('>') {
                Some(end) => end + 1,
                None => rest.len(),
            };
            let raw = &self.src[self.pos..self.pos + len];
            self.pos += len;
            let id = self.doc.push_raw(raw);
            self.attach(id);
            return true;
        }
        if let Some(close) = rest.strip_prefix("</") {
            let Some(end) = close.find('>') else {
                self.pos = self.src.len();
                return true;
            };
            self.flush_text();
            let name = close[..end].trim().to_ascii_lowercase();
            self.pos += 2 + end + 1;
            self.close_tag(&name);
            return true;
        }
        let mut chars = rest[1..].chars();
        if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
            return false;
        }
        self.flush_text();
        self.open_tag();
        true
    }

    /// Pop the stack down to (and including) the nearest matching open tag.
    /// A close tag with no matching open element is ignored.
    fn close_tag(&mut self, name: &str) {
        let matched = self
            .stack
            .iter()
            .rposition(|&id| self.doc.element(id).is_some_and(|el| el.tag == name));
        if let Some(pos) = matched {
            self.stack.truncate(pos);
        }
    }

    fn open_tag(&mut self) {
        self.pos += 1; // consume '<'
        let name_len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
            .unwrap_or(self.rest().len());
        let tag = self.rest()[..name_len].to_ascii_lowercase();
        self.pos += name_len;

        let id = self.doc.push_element(&tag);
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            match self.rest().chars().next() {
                None => break,
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                Some('/') => {
                    self.pos += 1;
                    if self.rest().starts_with('>') {
                        self.pos += 1;
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => self.attribute(id),
            }
        }
        self.attach(id);

        if self_closing || is_void(&tag) {
            return;
        }
        if is_raw_text(&tag) {
            self.raw_text_content(id, &tag);
            return;
        }
        self.stack.push(id);
    }

    /// Consume everything up to the matching close tag of a raw-text element
    /// and store it verbatim as a single child.
    fn raw_text_content(&mut self, id: NodeId, tag: &str) {
        let rest = self.rest();
        let lower = rest.to_ascii_lowercase();
        let close = format!("</{tag}");
        let (content_len, consumed) = match lower.find(&close) {
            Some(start) => {
                let after = match lower[start..].find('>') {
                    Some(gt) => start + gt + 1,
                    None => lower.len(),
                };
                (start, after)
            }
            None => (rest.len(), rest.len()),
        };
        if content_len > 0 {
            let raw = &rest[..content_len];
            let child = self.doc.push_raw(raw);
            self.doc.append_child(id, child);
        }
        self.pos += consumed;
    }

    fn attribute(&mut self, id: NodeId) {
        let name_len = self
            .rest()
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '>' || c == '/')
            .unwrap_or(self.rest().len());
        if name_len == 0 {
            self.pos += 1;
            return;
        }
        let name = self.rest()[..name_len].to_ascii_lowercase();
        self.pos += name_len;
        self.skip_whitespace();

        let value = if self.rest().starts_with('=') {
            self.pos += 1;
            self.skip_whitespace();
            self.attribute_value()
        } else {
            String::new()
        };

        if name == "class" {
            if let Some(el) = self.doc.element_mut(id) {
                el.classes = value.split_whitespace().map(str::to_string).collect();
            }
        } else if let Some(el) = self.doc.element_mut(id) {
            // First occurrence wins, as in browsers.
            if !el.has_attr(&name) {
                el.attrs.push((name, value));
            }
        }
    }

    fn attribute_value(&mut self) -> String {
        match self.rest().chars().next() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                match self.rest().find(quote) {
                    Some(end) => {
                        let value = decode_entities(&self.rest()[..end]);
                        self.pos += end + 1;
                        value
                    }
                    // Unterminated quote: the rest of the input is the value.
                    None => {
                        let value = decode_entities(self.rest());
                        self.pos = self.src.len();
                        value
                    }
                }
            }
            _ => {
                let end = self
                    .rest()
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(self.rest().len());
                let value = decode_entities(&self.rest()[..end]);
                self.pos += end;
                value
            }
        }
    }

    fn skip_whitespace(&mut self) {
        let skip = self
            .rest()
            .find(|c: char| !c.is_ascii_whitespace())
            .unwrap_or(self.rest().len());
        self.pos += skip;
    }
}
