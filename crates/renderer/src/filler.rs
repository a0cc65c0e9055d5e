//! Caret fillers.
//!
//! Some caret positions cannot be reached natively: between two inline
//! elements with no text in between, or inside an empty block. The renderer
//! makes them reachable with two kinds of fillers:
//!
//! - the *block filler*, a `<br>` the converter emits at an element's natural
//!   filler offset;
//! - the *inline filler*, a run of [`INLINE_FILLER`] chars at the start of a
//!   text node, placed at the selection while it needs one.
//!
//! This module holds the live-tree side of the inline filler and the view-side
//! decision of whether the selection needs one.

use core_types::{DomId, ViewId};
use dom::{DomError, DomPoint, DomTree};
use view::{ViewDocument, ViewPosition};

use crate::error::RenderError;

/// Number of chars in [`INLINE_FILLER`].
pub const INLINE_FILLER_LENGTH: usize = 7;

/// Seven WORD JOINER chars.
pub const INLINE_FILLER: &str = "\u{2060}\u{2060}\u{2060}\u{2060}\u{2060}\u{2060}\u{2060}";

/// Text node whose data starts with the filler marker.
pub fn starts_with_filler(tree: &DomTree, node: DomId) -> bool {
    tree.is_text(node) && tree.data(node).is_some_and(|d| d.starts_with(INLINE_FILLER))
}

/// Text node consisting of the filler marker only.
pub fn is_inline_filler(tree: &DomTree, node: DomId) -> bool {
    tree.is_text(node) && tree.data(node) == Some(INLINE_FILLER)
}

/// Put the marker at `offset` in `parent`: prefixed to the text node found
/// there, or as a new marker-only text node. Returns the filler node.
pub fn add_inline_filler(tree: &mut DomTree, parent: DomId, offset: usize) -> Result<DomId, DomError> {
    if let Some(after) = tree.child_at(parent, offset)
        && tree.is_text(after)
    {
        tree.insert_data(after, 0, INLINE_FILLER)?;
        log::trace!(target: "view.filler", "prefixed filler to {after}");
        return Ok(after);
    }
    let filler = tree.create_text(INLINE_FILLER);
    tree.insert_at(parent, offset, filler)?;
    log::trace!(target: "view.filler", "inserted filler {filler} at {}", DomPoint::new(parent, offset));
    Ok(filler)
}

/// Take the marker out of `node`: detach a marker-only node, or delete the
/// prefix of a node that gained content.
pub fn remove_inline_filler(tree: &mut DomTree, node: DomId) -> Result<(), RenderError> {
    if !starts_with_filler(tree, node) {
        return Err(RenderError::FillerLost { node });
    }
    if is_inline_filler(tree, node) {
        tree.remove(node)?;
        log::trace!(target: "view.filler", "removed filler {node}");
    } else {
        tree.delete_data(node, 0, INLINE_FILLER_LENGTH)?;
        log::trace!(target: "view.filler", "stripped filler prefix from {node}");
    }
    Ok(())
}

/// Whether the collapsed selection sits where native editing cannot put the
/// caret without an inline filler.
///
/// `rendered` reports whether a view element has a live counterpart.
pub fn needs_inline_filler(doc: &ViewDocument, rendered: impl Fn(ViewId) -> bool) -> bool {
    let selection = doc.selection();
    if selection.range_count() != 1 || !selection.is_collapsed() {
        return false;
    }
    let Some(position) = selection.first_position(doc) else {
        return false;
    };
    let parent = position.parent;
    if !rendered(doc.root_of(parent)) {
        return false;
    }
    if !doc.is_element(parent) {
        return false;
    }
    if !doc.is_editable(parent) {
        return false;
    }
    if doc.filler_offset(parent) == Some(position.offset) {
        return false;
    }
    let text_before = position.node_before(doc).is_some_and(|n| doc.is_text(n));
    let text_after = position.node_after(doc).is_some_and(|n| doc.is_text(n));
    !(text_before || text_after)
}

/// Where the inline filler belongs for the current selection: the first
/// position, moved out in front of its text node when it points into text.
pub fn inline_filler_position(doc: &ViewDocument) -> Option<ViewPosition> {
    let first = doc.selection().first_position(doc)?;
    if doc.is_text(first.parent) {
        ViewPosition::before(doc, first.parent)
    } else {
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use view::{ElementRole, ViewSelection, ViewWriter};

    #[test]
    fn marker_is_seven_word_joiners() {
        assert_eq!(INLINE_FILLER.chars().count(), INLINE_FILLER_LENGTH);
        assert!(INLINE_FILLER.chars().all(|c| c == '\u{2060}'));
    }

    #[test]
    fn add_prefixes_following_text() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        let text = tree.create_text("bar");
        tree.append_child(p, text).unwrap();

        let filler = add_inline_filler(&mut tree, p, 0).unwrap();
        assert_eq!(filler, text);
        assert!(starts_with_filler(&tree, text));
        assert!(!is_inline_filler(&tree, text));

        remove_inline_filler(&mut tree, text).unwrap();
        assert_eq!(tree.data(text), Some("bar"));
        assert!(matches!(
            remove_inline_filler(&mut tree, text),
            Err(RenderError::FillerLost { node }) if node == text
        ));
    }

    #[test]
    fn add_creates_standalone_filler_between_elements() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        let a = tree.create_element("b");
        let b = tree.create_element("b");
        tree.append_child(p, a).unwrap();
        tree.append_child(p, b).unwrap();

        let filler = add_inline_filler(&mut tree, p, 1).unwrap();
        assert_eq!(tree.children(p), &[a, filler, b]);
        assert!(is_inline_filler(&tree, filler));
        remove_inline_filler(&mut tree, filler).unwrap();
        assert_eq!(tree.children(p), &[a, b]);
    }

    fn two_bold_runs() -> (ViewDocument, ViewId) {
        let mut doc = ViewDocument::new();
        let root = doc.create_root("div");
        let p = doc.create_element("p", ElementRole::Container);
        let s1 = doc.create_element("strong", ElementRole::Attribute);
        let s2 = doc.create_element("strong", ElementRole::Attribute);
        let foo = doc.create_text("foo");
        let bar = doc.create_text("bar");
        let mut sink = ();
        let mut w = ViewWriter::new(&mut doc, &mut sink);
        w.append(root, p).unwrap();
        w.append(p, s1).unwrap();
        w.append(p, s2).unwrap();
        w.append(s1, foo).unwrap();
        w.append(s2, bar).unwrap();
        (doc, p)
    }

    #[test]
    fn filler_needed_between_inline_elements() {
        let (mut doc, p) = two_bold_runs();
        ViewWriter::new(&mut doc, &mut ()).set_selection(ViewSelection::collapsed(ViewPosition::new(p, 1)));
        assert!(needs_inline_filler(&doc, |_| true));
        assert!(!needs_inline_filler(&doc, |_| false));

        ViewWriter::new(&mut doc, &mut ())
            .set_attribute(p, "contenteditable", "false")
            .unwrap();
        assert!(!needs_inline_filler(&doc, |_| true));
    }

    #[test]
    fn filler_not_needed_next_to_text_or_at_filler_offset() {
        let (mut doc, p) = two_bold_runs();
        let s1 = doc.child(p, 0).unwrap();
        let foo = doc.child(s1, 0).unwrap();
        ViewWriter::new(&mut doc, &mut ()).set_selection(ViewSelection::collapsed(ViewPosition::new(s1, 1)));
        assert!(!needs_inline_filler(&doc, |_| true));

        ViewWriter::new(&mut doc, &mut ()).set_selection(ViewSelection::collapsed(ViewPosition::new(foo, 1)));
        assert!(!needs_inline_filler(&doc, |_| true));
        assert_eq!(inline_filler_position(&doc), Some(ViewPosition::new(s1, 0)));

        let empty = doc.create_element("p", ElementRole::Container);
        let root = doc.roots()[0];
        let mut sink = ();
        let mut w = ViewWriter::new(&mut doc, &mut sink);
        w.append(root, empty).unwrap();
        w.set_selection(ViewSelection::collapsed(ViewPosition::new(empty, 0)));
        assert!(!needs_inline_filler(&doc, |_| true));
    }
}
