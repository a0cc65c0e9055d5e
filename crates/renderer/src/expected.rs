//! What the live children of a rendered view element should look like.
//!
//! The expected list is described lazily: nothing is created in the live tree
//! until the diff decides an entry has to be inserted.

use core_types::{DomId, ViewId};
use dom::DomTree;
use indexmap::IndexSet;
use view::{ViewDocument, ViewPosition};

use crate::converter::{Converter, CreateOptions};
use crate::error::RenderError;
use crate::filler::{INLINE_FILLER, is_inline_filler};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Expected {
    /// View element that already has a live counterpart.
    Bound { view: ViewId, dom: DomId },
    /// View element without a live counterpart yet.
    Element(ViewId),
    /// View text; `data` includes the filler marker when the inline filler
    /// goes in front of it.
    Text { view: ViewId, data: String },
    BlockFiller,
    InlineFiller,
}

impl Expected {
    pub(crate) fn view(&self) -> Option<ViewId> {
        match self {
            Expected::Bound { view, .. } | Expected::Element(view) | Expected::Text { view, .. } => {
                Some(*view)
            }
            Expected::BlockFiller | Expected::InlineFiller => None,
        }
    }
}

/// Expected children of `element`, with block fillers at its natural filler
/// offset and, when `filler` points into `element`, the inline filler.
pub(crate) fn expected_children<C: Converter + ?Sized>(
    doc: &ViewDocument,
    converter: &C,
    element: ViewId,
    filler: Option<ViewPosition>,
) -> Vec<Expected> {
    let filler_offset = doc.filler_offset(element);
    let children = doc.children(element);
    let mut expected = Vec::with_capacity(children.len() + 1);
    for (index, child) in children.iter().enumerate() {
        if filler_offset == Some(index) {
            expected.push(Expected::BlockFiller);
        }
        expected.push(expected_child(doc, converter, *child));
    }
    if filler_offset == Some(children.len()) {
        expected.push(Expected::BlockFiller);
    }

    if let Some(filler) = filler
        && filler.parent == element
    {
        let at = filler.offset.min(expected.len());
        match expected.get_mut(at) {
            Some(Expected::Text { data, .. }) => data.insert_str(0, INLINE_FILLER),
            _ => expected.insert(at, Expected::InlineFiller),
        }
    }
    expected
}

fn expected_child<C: Converter + ?Sized>(doc: &ViewDocument, converter: &C, child: ViewId) -> Expected {
    if let Some(data) = doc.data(child) {
        return Expected::Text {
            view: child,
            data: data.to_string(),
        };
    }
    match converter.map_view_to_dom(child) {
        Some(dom) => Expected::Bound { view: child, dom },
        None => Expected::Element(child),
    }
}

/// Identity predicate: the actual node already is the expected one.
pub(crate) fn same_nodes<C: Converter + ?Sized>(
    tree: &DomTree,
    converter: &C,
    actual: DomId,
    expected: &Expected,
) -> bool {
    match expected {
        Expected::Bound { dom, .. } => *dom == actual,
        Expected::Element(_) => false,
        Expected::Text { data, .. } => tree.is_text(actual) && tree.data(actual) == Some(data.as_str()),
        Expected::BlockFiller => converter.is_block_filler(tree, actual),
        Expected::InlineFiller => is_inline_filler(tree, actual),
    }
}

/// Mapping-refresh similarity: elements with the same tag name.
pub(crate) fn similar_elements(doc: &ViewDocument, tree: &DomTree, actual: DomId, expected: &Expected) -> bool {
    if !tree.is_element(actual) {
        return false;
    }
    match expected {
        Expected::Bound { view, .. } | Expected::Element(view) => {
            doc.name(*view).is_some_and(|name| tree.name(actual) == Some(name))
        }
        Expected::BlockFiller => tree.name(actual) == Some("br"),
        Expected::Text { .. } | Expected::InlineFiller => false,
    }
}

/// Children-patch similarity: both sides are text, so the actual node can be
/// rewritten in place.
pub(crate) fn both_text(tree: &DomTree, actual: DomId, expected: &Expected) -> bool {
    tree.is_text(actual) && matches!(expected, Expected::Text { .. } | Expected::InlineFiller)
}

pub(crate) fn expected_data(expected: &Expected) -> Option<&str> {
    match expected {
        Expected::Text { data, .. } => Some(data),
        Expected::InlineFiller => Some(INLINE_FILLER),
        _ => None,
    }
}

/// Create (or, for bound elements, reuse) the live node for an entry.
pub(crate) fn materialize<C: Converter + ?Sized>(
    doc: &ViewDocument,
    tree: &mut DomTree,
    converter: &mut C,
    expected: &Expected,
) -> Result<DomId, RenderError> {
    let options = CreateOptions {
        bind: true,
        with_children: true,
    };
    Ok(match expected {
        Expected::Bound { dom, .. } => *dom,
        Expected::Element(view) => converter.create_dom_subtree(doc, tree, *view, options)?,
        Expected::Text { data, .. } => tree.create_text(data),
        Expected::BlockFiller => converter.create_block_filler(tree)?,
        Expected::InlineFiller => tree.create_text(INLINE_FILLER),
    })
}

/// Queue the text nodes under an entry that stayed in place.
pub(crate) fn mark_descendant_text(doc: &ViewDocument, expected: &Expected, text: &mut IndexSet<ViewId>) {
    match expected {
        Expected::Text { view, .. } => {
            text.insert(*view);
        }
        Expected::Bound { view, .. } => mark_text_below(doc, *view, text),
        _ => {}
    }
}

fn mark_text_below(doc: &ViewDocument, node: ViewId, text: &mut IndexSet<ViewId>) {
    if doc.role(node).is_some_and(|r| r.is_opaque()) {
        return;
    }
    for child in doc.children(node) {
        if doc.is_text(*child) {
            text.insert(*child);
        } else {
            mark_text_below(doc, *child, text);
        }
    }
}
