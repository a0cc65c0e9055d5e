//! Positions and ranges in the view tree.
//!
//! A position is a `(parent, offset)` pair. Inside an element the offset
//! counts children; inside a text node it counts chars.

use core_types::ViewId;

use crate::document::ViewDocument;
use crate::node::ElementRole;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewPosition {
    pub parent: ViewId,
    pub offset: usize,
}

impl ViewPosition {
    pub fn new(parent: ViewId, offset: usize) -> Self {
        Self { parent, offset }
    }

    /// Position right before `node` in its parent.
    pub fn before(doc: &ViewDocument, node: ViewId) -> Option<Self> {
        Some(Self::new(doc.parent(node)?, doc.index_in_parent(node)?))
    }

    /// Position right after `node` in its parent.
    pub fn after(doc: &ViewDocument, node: ViewId) -> Option<Self> {
        Some(Self::new(doc.parent(node)?, doc.index_in_parent(node)? + 1))
    }

    /// Position at the end of `node`'s content.
    pub fn at_end(doc: &ViewDocument, node: ViewId) -> Self {
        Self::new(node, doc.max_offset(node))
    }

    /// Node directly before the position. Always `None` inside text.
    pub fn node_before(&self, doc: &ViewDocument) -> Option<ViewId> {
        if doc.is_text(self.parent) {
            return None;
        }
        self.offset
            .checked_sub(1)
            .and_then(|i| doc.child(self.parent, i))
    }

    /// Node directly after the position. Always `None` inside text.
    pub fn node_after(&self, doc: &ViewDocument) -> Option<ViewId> {
        if doc.is_text(self.parent) {
            return None;
        }
        doc.child(self.parent, self.offset)
    }

    pub fn is_at_start(&self) -> bool {
        self.offset == 0
    }

    pub fn is_at_end(&self, doc: &ViewDocument) -> bool {
        self.offset == doc.max_offset(self.parent)
    }

    /// Move forward over inline structure that does not change where the
    /// caret renders: into attribute elements, over UI elements and out of the
    /// end of attribute elements.
    fn trim_forward(self, doc: &ViewDocument) -> Self {
        let mut pos = self;
        loop {
            if doc.is_text(pos.parent) {
                return pos;
            }
            let next = match pos.node_after(doc) {
                Some(node) => match doc.role(node) {
                    Some(ElementRole::Attribute) => Some(Self::new(node, 0)),
                    Some(ElementRole::Ui) => Self::after(doc, node),
                    _ => None,
                },
                None if doc.role(pos.parent) == Some(ElementRole::Attribute) => {
                    Self::after(doc, pos.parent)
                }
                None => None,
            };
            match next {
                Some(next) => pos = next,
                None => return pos,
            }
        }
    }

    fn trim_backward(self, doc: &ViewDocument) -> Self {
        let mut pos = self;
        loop {
            if doc.is_text(pos.parent) {
                return pos;
            }
            let next = match pos.node_before(doc) {
                Some(node) => match doc.role(node) {
                    Some(ElementRole::Attribute) => Some(Self::at_end(doc, node)),
                    Some(ElementRole::Ui) => Self::before(doc, node),
                    _ => None,
                },
                None if doc.role(pos.parent) == Some(ElementRole::Attribute) => {
                    Self::before(doc, pos.parent)
                }
                None => None,
            };
            match next {
                Some(next) => pos = next,
                None => return pos,
            }
        }
    }
}

/// An ordered pair of positions, `start` never after `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewRange {
    pub start: ViewPosition,
    pub end: ViewPosition,
}

impl ViewRange {
    pub fn new(start: ViewPosition, end: ViewPosition) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: ViewPosition) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Shrink the range past attribute and UI element boundaries, then into
    /// adjacent text nodes. Two ranges covering the same visible content trim
    /// to the same range.
    pub fn trimmed(&self, doc: &ViewDocument) -> Self {
        let mut start = self.start.trim_forward(doc);
        if doc.compare_positions(&start, &self.end).is_ge() {
            return Self::collapsed(start);
        }
        let mut end = self.end.trim_backward(doc);

        if let Some(node) = start.node_after(doc)
            && doc.is_text(node)
        {
            start = ViewPosition::new(node, 0);
        }
        if let Some(node) = end.node_before(doc)
            && doc.is_text(node)
        {
            end = ViewPosition::at_end(doc, node);
        }
        Self { start, end }
    }
}
