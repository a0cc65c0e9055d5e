use core_types::ViewId;

/// Structural misuse of the view document.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("unknown view node {0}")]
    MissingNode(ViewId),
    #[error("{0} is not an element")]
    NotAnElement(ViewId),
    #[error("{0} is not a text node")]
    NotText(ViewId),
    #[error("{0} cannot have children")]
    CannotHaveChildren(ViewId),
    #[error("{0} is already attached")]
    AlreadyAttached(ViewId),
    #[error("inserting {child} under {parent} would create a cycle")]
    Cycle { parent: ViewId, child: ViewId },
    #[error("offset {offset} is out of bounds in {node}")]
    OffsetOutOfBounds { node: ViewId, offset: usize },
}
