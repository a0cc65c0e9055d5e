//! Identity types shared by the view tree, the live tree and the renderer.
//!
//! Both ids are opaque, copyable keys. `0` is reserved as the invalid id on
//! both sides so a zeroed value is never mistaken for a real node.

use std::fmt;

pub type NodeIndex = u32;

/// Identity of a node in the abstract view tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub NodeIndex);

impl ViewId {
    /// Reserved sentinel for "unassigned/invalid" identity.
    pub const INVALID: ViewId = ViewId(0);

    /// Arena slot for this id. Only meaningful for valid ids.
    #[inline]
    pub fn index(self) -> usize {
        debug_assert!(self != Self::INVALID, "invalid view id has no slot");
        (self.0 as usize).wrapping_sub(1)
    }

    #[inline]
    pub fn from_index(index: usize) -> Self {
        ViewId(index as NodeIndex + 1)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Identity of a node in the live (DOM) tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomId(pub NodeIndex);

impl DomId {
    /// Reserved sentinel for "unassigned/invalid" identity.
    pub const INVALID: DomId = DomId(0);

    #[inline]
    pub fn index(self) -> usize {
        debug_assert!(self != Self::INVALID, "invalid dom id has no slot");
        (self.0 as usize).wrapping_sub(1)
    }

    #[inline]
    pub fn from_index(index: usize) -> Self {
        DomId(index as NodeIndex + 1)
    }
}

impl fmt::Display for DomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dom#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_arena_index() {
        assert_eq!(ViewId::from_index(0), ViewId(1));
        assert_eq!(ViewId(7).index(), 6);
        assert_eq!(DomId::from_index(41).index(), 41);
    }

    #[test]
    fn display_names_the_tree() {
        assert_eq!(ViewId(3).to_string(), "view#3");
        assert_eq!(DomId(3).to_string(), "dom#3");
    }
}
