//! Abstract view tree.
//!
//! The view is the framework-owned side of the editing surface: an arena of
//! elements, text and fragments, a selection snapshot and a focus flag. It
//! knows nothing about the live tree; changes are announced through
//! [`ChangeSink`] and reconciled elsewhere.

pub mod document;
pub mod error;
pub mod node;
pub mod position;
pub mod selection;
pub mod writer;

pub use core_types::ViewId;
pub use document::ViewDocument;
pub use error::ViewError;
pub use node::{ElementData, ElementRole, Is, ViewKind, ViewNode};
pub use position::{ViewPosition, ViewRange};
pub use selection::ViewSelection;
pub use writer::{ChangeSink, ViewWriter};
