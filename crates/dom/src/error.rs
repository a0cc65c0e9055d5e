use core_types::DomId;

/// Mutation or query rejected by the live tree.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("unknown live node {0}")]
    MissingNode(DomId),
    #[error("{0} has the wrong node kind for this operation")]
    WrongNodeKind(DomId),
    #[error("{0} cannot have children")]
    InvalidParent(DomId),
    #[error("inserting {child} under {parent} would create a cycle")]
    CycleDetected { parent: DomId, child: DomId },
    #[error("the selection has no range to extend")]
    NoSelection,
    #[error("offset {offset} is out of bounds in {node}")]
    OffsetOutOfBounds { node: DomId, offset: usize },
}
