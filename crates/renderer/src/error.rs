use core_types::DomId;
use dom::DomError;
use view::ViewError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// `render` was called while a pass was running, or after a pass unwound
    /// through a panic.
    #[error("a render pass is already in progress")]
    RenderInProgress,
    /// The tracked inline filler no longer starts with the filler marker; the
    /// live tree was changed behind the renderer's back.
    #[error("inline filler {node} lost its marker")]
    FillerLost { node: DomId },
    #[error("unknown change type `{0}`")]
    UnknownChangeType(String),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    View(#[from] ViewError),
}
