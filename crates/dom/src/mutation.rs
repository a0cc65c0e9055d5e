//! Journal of mutations applied to connected live nodes.
//!
//! Only changes visible from the document are recorded: building a detached
//! subtree and then inserting it produces a single `Insert`.

use core_types::DomId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomMutation {
    Insert {
        parent: DomId,
        index: usize,
        node: DomId,
    },
    Remove {
        parent: DomId,
        index: usize,
        node: DomId,
    },
    SetAttribute {
        node: DomId,
        key: String,
        value: String,
    },
    RemoveAttribute {
        node: DomId,
        key: String,
    },
    InsertData {
        node: DomId,
        offset: usize,
        data: String,
    },
    DeleteData {
        node: DomId,
        offset: usize,
        count: usize,
    },
    SetData {
        node: DomId,
        data: String,
    },
}

impl DomMutation {
    /// Node whose state the mutation changed (the parent for child list
    /// changes).
    pub fn target(&self) -> DomId {
        match self {
            DomMutation::Insert { parent, .. } | DomMutation::Remove { parent, .. } => *parent,
            DomMutation::SetAttribute { node, .. }
            | DomMutation::RemoveAttribute { node, .. }
            | DomMutation::InsertData { node, .. }
            | DomMutation::DeleteData { node, .. }
            | DomMutation::SetData { node, .. } => *node,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, DomMutation::Insert { .. } | DomMutation::Remove { .. })
    }
}
