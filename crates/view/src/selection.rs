//! Selection snapshot of the view document.

use core_types::ViewId;

use crate::document::ViewDocument;
use crate::position::{ViewPosition, ViewRange};

/// Ranges plus direction and the fake-selection flag.
///
/// The anchor and focus are taken from the last range: `start`/`end` for a
/// forward selection, `end`/`start` for a backward one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewSelection {
    ranges: Vec<ViewRange>,
    backward: bool,
    fake: bool,
    fake_label: String,
}

impl ViewSelection {
    pub fn new(ranges: Vec<ViewRange>, backward: bool) -> Self {
        Self {
            ranges,
            backward,
            fake: false,
            fake_label: String::new(),
        }
    }

    pub fn collapsed(at: ViewPosition) -> Self {
        Self::new(vec![ViewRange::collapsed(at)], false)
    }

    pub fn from_range(range: ViewRange, backward: bool) -> Self {
        Self::new(vec![range], backward)
    }

    /// Mark the selection as fake, i.e. rendered through a hidden container
    /// holding `label` instead of a native caret or highlight.
    pub fn with_fake(mut self, label: impl Into<String>) -> Self {
        self.fake = true;
        self.fake_label = label.into();
        self
    }

    pub fn ranges(&self) -> &[ViewRange] {
        &self.ranges
    }

    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_backward(&self) -> bool {
        self.backward
    }

    pub fn is_fake(&self) -> bool {
        self.fake
    }

    pub fn fake_label(&self) -> &str {
        &self.fake_label
    }

    pub fn anchor(&self) -> Option<ViewPosition> {
        let last = self.ranges.last()?;
        Some(if self.backward { last.end } else { last.start })
    }

    pub fn focus(&self) -> Option<ViewPosition> {
        let last = self.ranges.last()?;
        Some(if self.backward { last.start } else { last.end })
    }

    /// Exactly one range, and that range is collapsed.
    pub fn is_collapsed(&self) -> bool {
        self.ranges.len() == 1 && self.ranges[0].is_collapsed()
    }

    /// Range starting first in document order.
    pub fn first_range(&self, doc: &ViewDocument) -> Option<ViewRange> {
        self.ranges
            .iter()
            .copied()
            .min_by(|a, b| doc.compare_positions(&a.start, &b.start))
    }

    pub fn first_position(&self, doc: &ViewDocument) -> Option<ViewPosition> {
        self.first_range(doc).map(|r| r.start)
    }

    /// Editable root containing the anchor.
    pub fn editable_element(&self, doc: &ViewDocument) -> Option<ViewId> {
        doc.editable_element(self.anchor()?.parent)
    }

    /// Same fake state, same anchor and focus, and the same set of ranges.
    pub fn is_equal(&self, other: &ViewSelection) -> bool {
        if self.fake != other.fake {
            return false;
        }
        if self.fake && self.fake_label != other.fake_label {
            return false;
        }
        if self.ranges.len() != other.ranges.len() {
            return false;
        }
        if self.ranges.is_empty() {
            return true;
        }
        if self.anchor() != other.anchor() || self.focus() != other.focus() {
            return false;
        }
        self.ranges.iter().all(|r| other.ranges.contains(r))
    }

    /// Same direction and range count, and every range matches a range of
    /// `other` once both are trimmed. Fake state is ignored.
    pub fn is_similar(&self, other: &ViewSelection, doc: &ViewDocument) -> bool {
        if self.backward != other.backward {
            return false;
        }
        if self.ranges.len() != other.ranges.len() {
            return false;
        }
        let theirs: Vec<ViewRange> = other.ranges.iter().map(|r| r.trimmed(doc)).collect();
        self.ranges.iter().all(|r| {
            let ours = r.trimmed(doc);
            theirs.iter().any(|t| *t == ours)
        })
    }
}
