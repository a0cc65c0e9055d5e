//! Deterministic markup serialization of a live subtree for tests and logs.
//! Not a stable format.
//!
//! - Attributes are emitted sorted by name.
//! - Void elements (`br`, `img`, `hr`, `input`) have no closing tag.
//! - Comments render as `<!--data-->`, fragments as their children.
//! - With `show_selection`, the native selection renders as `[` and `]`
//!   (`[]` when collapsed) at its boundary points.
//! - With `filler`, every occurrence of that string inside text renders as
//!   `{filler}`.

use std::fmt::Write;

use core_types::DomId;

use crate::selection::DomPoint;
use crate::tree::{DomTree, NodeKind};

#[derive(Clone, Debug, Default)]
pub struct MarkupOptions {
    pub show_selection: bool,
    pub filler: Option<String>,
}

impl MarkupOptions {
    pub fn with_selection(mut self) -> Self {
        self.show_selection = true;
        self
    }

    pub fn with_filler(mut self, filler: &str) -> Self {
        self.filler = Some(filler.to_string());
        self
    }
}

const VOID_ELEMENTS: &[&str] = &["br", "img", "hr", "input"];

/// Serialize `node` and its descendants.
pub fn to_markup(tree: &DomTree, node: DomId, options: &MarkupOptions) -> String {
    let markers = if options.show_selection {
        Markers::from_tree(tree)
    } else {
        Markers::default()
    };
    let mut out = String::new();
    write_node(tree, node, options, &markers, &mut out);
    out
}

/// Serialize only the children of `node`.
pub fn inner_markup(tree: &DomTree, node: DomId, options: &MarkupOptions) -> String {
    let markers = if options.show_selection {
        Markers::from_tree(tree)
    } else {
        Markers::default()
    };
    let mut out = String::new();
    write_children(tree, node, options, &markers, &mut out);
    out
}

#[derive(Default)]
struct Markers {
    start: Option<DomPoint>,
    end: Option<DomPoint>,
}

impl Markers {
    fn from_tree(tree: &DomTree) -> Self {
        match tree.selection_range() {
            Some((start, end)) => Self {
                start: Some(start),
                end: Some(end),
            },
            None => Self::default(),
        }
    }

    fn at(&self, node: DomId, offset: usize) -> &'static str {
        let point = Some(DomPoint::new(node, offset));
        match (self.start == point, self.end == point) {
            (true, true) => "[]",
            (true, false) => "[",
            (false, true) => "]",
            (false, false) => "",
        }
    }
}

fn write_node(
    tree: &DomTree,
    node: DomId,
    options: &MarkupOptions,
    markers: &Markers,
    out: &mut String,
) {
    match tree.kind(node) {
        Some(NodeKind::Element { name, attributes }) => {
            out.push('<');
            out.push_str(name);
            for (key, value) in attributes {
                let _ = write!(out, " {key}=\"{}\"", escape(value, true));
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&name.as_ref()) && tree.child_count(node) == 0 {
                return;
            }
            write_children(tree, node, options, markers, out);
            let _ = write!(out, "</{name}>");
        }
        Some(NodeKind::Text { data }) => write_text(node, data, options, markers, out),
        Some(NodeKind::Comment { data }) => {
            let _ = write!(out, "<!--{data}-->");
        }
        Some(NodeKind::Document | NodeKind::Fragment) => {
            write_children(tree, node, options, markers, out)
        }
        None => {}
    }
}

fn write_children(
    tree: &DomTree,
    node: DomId,
    options: &MarkupOptions,
    markers: &Markers,
    out: &mut String,
) {
    let children = tree.children(node);
    for (index, child) in children.iter().enumerate() {
        out.push_str(markers.at(node, index));
        write_node(tree, *child, options, markers, out);
    }
    out.push_str(markers.at(node, children.len()));
}

fn write_text(node: DomId, data: &str, options: &MarkupOptions, markers: &Markers, out: &mut String) {
    let mut raw = String::new();
    let mut count = 0;
    for (index, ch) in data.chars().enumerate() {
        raw.push_str(markers.at(node, index));
        raw.push(ch);
        count = index + 1;
    }
    raw.push_str(markers.at(node, count));
    let mut text = escape(&raw, false);
    if let Some(filler) = options.filler.as_deref()
        && !filler.is_empty()
    {
        text = text.replace(filler, "{filler}");
    }
    out.push_str(&text);
}

fn escape(s: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
