//! Native selection of the live tree.
//!
//! At most one range, stored as anchor and focus boundary points. The tree
//! keeps the points valid across mutations (see [`DomTree`]).

use std::cmp::Ordering;
use std::fmt;

use core_types::DomId;

use crate::error::DomError;
use crate::tree::DomTree;

/// Boundary point: a node and an offset into its children, or into its chars
/// for character data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DomPoint {
    pub node: DomId,
    pub offset: usize,
}

impl DomPoint {
    pub fn new(node: DomId, offset: usize) -> Self {
        Self { node, offset }
    }
}

impl fmt::Display for DomPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.node, self.offset)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NativeSelection {
    pub(crate) anchor: Option<DomPoint>,
    pub(crate) focus: Option<DomPoint>,
}

impl NativeSelection {
    pub fn anchor(&self) -> Option<DomPoint> {
        self.anchor
    }

    pub fn focus(&self) -> Option<DomPoint> {
        self.focus
    }

    pub fn range_count(&self) -> usize {
        usize::from(self.anchor.is_some())
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

impl DomTree {
    pub fn selection(&self) -> &NativeSelection {
        &self.selection
    }

    /// Bumped on every explicit selection change made through this API.
    /// Adjustments caused by tree mutations do not count.
    pub fn selection_revision(&self) -> u64 {
        self.selection_revision
    }

    /// Focus before anchor in tree order.
    pub fn is_selection_backward(&self) -> bool {
        match (self.selection.anchor, self.selection.focus) {
            (Some(anchor), Some(focus)) => self.compare_points(anchor, focus) == Ordering::Greater,
            _ => false,
        }
    }

    /// Selection range as `(start, end)` in tree order.
    pub fn selection_range(&self) -> Option<(DomPoint, DomPoint)> {
        let anchor = self.selection.anchor?;
        let focus = self.selection.focus?;
        if self.is_selection_backward() {
            Some((focus, anchor))
        } else {
            Some((anchor, focus))
        }
    }

    fn check_point(&self, point: DomPoint) -> Result<(), DomError> {
        if !self.exists(point.node) {
            return Err(DomError::MissingNode(point.node));
        }
        if point.offset > self.length(point.node) {
            return Err(DomError::OffsetOutOfBounds {
                node: point.node,
                offset: point.offset,
            });
        }
        Ok(())
    }

    pub fn collapse(&mut self, point: DomPoint) -> Result<(), DomError> {
        self.check_point(point)?;
        log::trace!(target: "dom.selection", "collapse to {point}");
        self.selection.anchor = Some(point);
        self.selection.focus = Some(point);
        self.selection_revision += 1;
        Ok(())
    }

    /// Move the focus, keeping the anchor.
    pub fn extend(&mut self, point: DomPoint) -> Result<(), DomError> {
        self.check_point(point)?;
        if self.selection.anchor.is_none() {
            return Err(DomError::NoSelection);
        }
        log::trace!(target: "dom.selection", "extend to {point}");
        self.selection.focus = Some(point);
        self.selection_revision += 1;
        Ok(())
    }

    pub fn select_node_contents(&mut self, node: DomId) -> Result<(), DomError> {
        let end = DomPoint::new(node, self.length(node));
        self.check_point(end)?;
        self.selection.anchor = Some(DomPoint::new(node, 0));
        self.selection.focus = Some(end);
        self.selection_revision += 1;
        Ok(())
    }

    pub fn remove_all_ranges(&mut self) {
        if self.selection.anchor.is_none() {
            return;
        }
        log::trace!(target: "dom.selection", "remove all ranges");
        self.selection = NativeSelection::default();
        self.selection_revision += 1;
    }
}
