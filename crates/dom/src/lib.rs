//! In-memory live tree.
//!
//! Stands in for a browser DOM: elements, text, comments and fragments in an
//! arena, a single-range native selection, the active element, and an opt-in
//! journal of every mutation applied to connected nodes. Nodes are never
//! freed: a detached node keeps its slot for the life of the tree.

pub mod error;
pub mod mutation;
pub mod selection;
pub mod snapshot;
pub mod tree;

pub use core_types::DomId;
pub use error::DomError;
pub use mutation::DomMutation;
pub use selection::{DomPoint, NativeSelection};
pub use snapshot::{MarkupOptions, inner_markup, to_markup};
pub use tree::{DomTree, NodeKind};
