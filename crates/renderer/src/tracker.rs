//! Dirty-set bookkeeping between render passes.

use std::fmt;
use std::str::FromStr;

use core_types::ViewId;
use indexmap::IndexSet;
use view::ViewDocument;

use crate::converter::Converter;
use crate::error::RenderError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Attributes,
    Children,
    Text,
}

impl FromStr for ChangeType {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attributes" => Ok(ChangeType::Attributes),
            "children" => Ok(ChangeType::Children),
            "text" => Ok(ChangeType::Text),
            other => Err(RenderError::UnknownChangeType(other.to_string())),
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeType::Attributes => "attributes",
            ChangeType::Children => "children",
            ChangeType::Text => "text",
        })
    }
}

/// Nodes waiting for a render pass, in the order they were first marked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtySets {
    pub attributes: IndexSet<ViewId>,
    pub children: IndexSet<ViewId>,
    pub text: IndexSet<ViewId>,
}

impl DirtySets {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty() && self.text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attributes.len() + self.children.len() + self.text.len()
    }

    /// Add everything in `other`, keeping the order of nodes already present.
    pub fn merge(&mut self, other: DirtySets) {
        self.attributes.extend(other.attributes);
        self.children.extend(other.children);
        self.text.extend(other.text);
    }
}

#[derive(Debug, Default)]
pub struct ChangeTracker {
    dirty: DirtySets,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dirty(&self) -> &DirtySets {
        &self.dirty
    }

    /// Record a change. Nodes without a live counterpart (for text: whose
    /// parent has none) are ignored, as are children of opaque elements.
    /// Returns whether the node was recorded.
    pub fn mark<C: Converter + ?Sized>(
        &mut self,
        doc: &ViewDocument,
        converter: &C,
        kind: ChangeType,
        node: ViewId,
    ) -> bool {
        let anchor = match kind {
            ChangeType::Attributes | ChangeType::Children => Some(node),
            ChangeType::Text => doc.parent(node),
        };
        let Some(anchor) = anchor else {
            return false;
        };
        if converter.map_view_to_dom(anchor).is_none() {
            log::trace!(target: "view.renderer", "{kind} change on unrendered {node} ignored");
            return false;
        }
        if kind != ChangeType::Attributes && doc.role(anchor).is_some_and(|r| r.is_opaque()) {
            return false;
        }
        match kind {
            ChangeType::Attributes => self.dirty.attributes.insert(node),
            ChangeType::Children => self.dirty.children.insert(node),
            ChangeType::Text => self.dirty.text.insert(node),
        };
        true
    }

    pub fn mark_attributes_dirty<C: Converter + ?Sized>(&mut self, doc: &ViewDocument, converter: &C, node: ViewId) -> bool {
        self.mark(doc, converter, ChangeType::Attributes, node)
    }

    pub fn mark_children_dirty<C: Converter + ?Sized>(&mut self, doc: &ViewDocument, converter: &C, node: ViewId) -> bool {
        self.mark(doc, converter, ChangeType::Children, node)
    }

    pub fn mark_text_dirty<C: Converter + ?Sized>(&mut self, doc: &ViewDocument, converter: &C, node: ViewId) -> bool {
        self.mark(doc, converter, ChangeType::Text, node)
    }

    /// Take all pending changes, leaving the tracker clean.
    pub fn drain(&mut self) -> DirtySets {
        std::mem::take(&mut self.dirty)
    }

    /// Put back changes taken by [`drain`](Self::drain) after a failed pass.
    /// Changes recorded since then are kept after the restored ones.
    pub fn restore(&mut self, mut drained: DirtySets) {
        drained.merge(std::mem::take(&mut self.dirty));
        self.dirty = drained;
    }
}
