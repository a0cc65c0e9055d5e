//! Reconciles a view tree onto a live tree.
//!
//! Changes made through [`view::ViewWriter`] are collected by a [`Renderer`]
//! (it is a [`view::ChangeSink`]); [`Renderer::render`] then patches the live
//! [`dom::DomTree`] with the smallest set of mutations it can find, keeps the
//! caret reachable with fillers and syncs the native selection.

pub mod config;
pub mod converter;
pub mod diff;
pub mod error;
mod expected;
pub mod filler;
pub mod renderer;
pub mod replace;
pub mod selection;
pub mod settle;
pub mod tracker;

pub use config::{ConverterConfig, RendererConfig};
pub use converter::{Converter, CreateOptions, DomConverter};
pub use diff::{DiffOp, EXACT_DIFF_LIMIT, TextEdit, apply_text_edits, diff, diff_text};
pub use error::RenderError;
pub use filler::{INLINE_FILLER, INLINE_FILLER_LENGTH};
pub use renderer::{RenderPhase, Renderer};
pub use replace::{UpdateAction, find_update_actions};
pub use selection::SelectionSync;
pub use settle::SelectionSettleTracker;
pub use tracker::{ChangeTracker, ChangeType, DirtySets};
