//! Arena-backed view document.
//!
//! Nodes are never freed: detaching a node keeps its slot so ids stay valid
//! for as long as the document lives. Structural mutation goes through
//! [`ViewWriter`](crate::ViewWriter), which reports every change to a
//! [`ChangeSink`](crate::ChangeSink); this module only exposes queries.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use core_types::ViewId;

use crate::ViewError;
use crate::node::{ElementData, ElementRole, ViewKind, ViewNode};
use crate::position::ViewPosition;
use crate::selection::ViewSelection;

#[derive(Debug, Default)]
pub struct ViewDocument {
    nodes: Vec<ViewNode>,
    roots: Vec<ViewId>,
    selection: ViewSelection,
    focused: bool,
}

impl ViewDocument {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Creation (detached nodes; no change notifications needed)
    // =========================================================================

    pub fn create_element(&mut self, name: &str, role: ElementRole) -> ViewId {
        self.push(ViewKind::Element(ElementData {
            name: Arc::from(name),
            role,
            attributes: BTreeMap::new(),
        }))
    }

    pub fn create_text(&mut self, data: &str) -> ViewId {
        self.push(ViewKind::Text {
            data: data.to_string(),
        })
    }

    pub fn create_fragment(&mut self) -> ViewId {
        self.push(ViewKind::Fragment)
    }

    /// Create an editable root. Roots are the only parentless elements the
    /// renderer ever binds to the live tree.
    pub fn create_root(&mut self, name: &str) -> ViewId {
        let id = self.create_element(name, ElementRole::Editable);
        self.roots.push(id);
        id
    }

    fn push(&mut self, kind: ViewKind) -> ViewId {
        let id = ViewId::from_index(self.nodes.len());
        self.nodes.push(ViewNode::new(kind));
        id
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn roots(&self) -> &[ViewId] {
        &self.roots
    }

    pub fn node(&self, id: ViewId) -> Option<&ViewNode> {
        if id == ViewId::INVALID {
            return None;
        }
        self.nodes.get(id.index())
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.node(id).is_some()
    }

    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: ViewId) -> &[ViewId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn child(&self, id: ViewId, index: usize) -> Option<ViewId> {
        self.children(id).get(index).copied()
    }

    pub fn child_count(&self, id: ViewId) -> usize {
        self.children(id).len()
    }

    pub fn index_in_parent(&self, id: ViewId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn previous_sibling(&self, id: ViewId) -> Option<ViewId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).and_then(|i| self.child(parent, i))
    }

    pub fn next_sibling(&self, id: ViewId) -> Option<ViewId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.child(parent, index + 1)
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: ViewId) -> impl Iterator<Item = ViewId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    pub fn root_of(&self, id: ViewId) -> ViewId {
        self.ancestors(id).last().unwrap_or(id)
    }

    pub fn is_text(&self, id: ViewId) -> bool {
        matches!(self.node(id).map(ViewNode::kind), Some(ViewKind::Text { .. }))
    }

    pub fn is_element(&self, id: ViewId) -> bool {
        matches!(self.node(id).map(ViewNode::kind), Some(ViewKind::Element(_)))
    }

    pub fn role(&self, id: ViewId) -> Option<ElementRole> {
        self.node(id).and_then(ViewNode::role)
    }

    pub fn name(&self, id: ViewId) -> Option<&str> {
        self.node(id).and_then(ViewNode::name)
    }

    pub fn data(&self, id: ViewId) -> Option<&str> {
        self.node(id).and_then(ViewNode::data)
    }

    pub fn attribute(&self, id: ViewId, key: &str) -> Option<&str> {
        self.node(id).and_then(|n| n.attribute(key))
    }

    pub fn max_offset(&self, id: ViewId) -> usize {
        self.node(id).map(ViewNode::max_offset).unwrap_or(0)
    }

    /// Number of children that are not UI elements.
    pub fn non_ui_child_count(&self, id: ViewId) -> usize {
        self.children(id)
            .iter()
            .filter(|c| self.role(**c) != Some(ElementRole::Ui))
            .count()
    }

    /// Offset at which this element needs a block filler to stay editable, if
    /// any.
    pub fn filler_offset(&self, id: ViewId) -> Option<usize> {
        let role = self.role(id)?;
        let count = self.child_count(id);
        match role {
            ElementRole::Container | ElementRole::Editable => {
                let children = self.children(id);
                if let Some(last) = children.last()
                    && self.is_element(*last)
                    && self.name(*last) == Some("br")
                {
                    return Some(count);
                }
                if children
                    .iter()
                    .all(|c| self.role(*c) == Some(ElementRole::Ui))
                {
                    return Some(count);
                }
                None
            }
            ElementRole::Attribute => {
                if self.non_ui_child_count(id) > 0 {
                    return None;
                }
                let mut current = self.parent(id);
                while let Some(ancestor) = current {
                    if self.role(ancestor) != Some(ElementRole::Attribute) {
                        break;
                    }
                    if self.non_ui_child_count(ancestor) > 1 {
                        return None;
                    }
                    current = self.parent(ancestor);
                }
                match current {
                    Some(ancestor) if self.non_ui_child_count(ancestor) <= 1 => Some(count),
                    _ => None,
                }
            }
            ElementRole::Empty | ElementRole::Ui | ElementRole::Raw => None,
        }
    }

    /// Whether content inside `id` may be edited natively.
    ///
    /// `contenteditable="false"` on the node itself disables editing; otherwise
    /// the nearest ancestor carrying `contenteditable` decides, and the default
    /// is editable.
    pub fn is_editable(&self, id: ViewId) -> bool {
        if self.attribute(id, "contenteditable") == Some("false") {
            return false;
        }
        match self
            .ancestors(id)
            .find_map(|a| self.attribute(a, "contenteditable"))
        {
            Some(value) => value == "true",
            None => true,
        }
    }

    /// Nearest editable root containing `id` (inclusive).
    pub fn editable_element(&self, id: ViewId) -> Option<ViewId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| self.role(*n) == Some(ElementRole::Editable))
    }

    /// Child-index path from the root down to `id`.
    pub fn path(&self, id: ViewId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(index) = self.index_in_parent(current) {
            path.push(index);
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Document order of two positions. Positions in different trees are
    /// ordered by their root ids.
    pub fn compare_positions(&self, a: &ViewPosition, b: &ViewPosition) -> Ordering {
        let root_a = self.root_of(a.parent);
        let root_b = self.root_of(b.parent);
        if root_a != root_b {
            return root_a.cmp(&root_b);
        }
        let mut key_a = self.path(a.parent);
        key_a.push(a.offset);
        let mut key_b = self.path(b.parent);
        key_b.push(b.offset);
        key_a.cmp(&key_b)
    }

    pub fn selection(&self) -> &ViewSelection {
        &self.selection
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    // =========================================================================
    // Raw mutation, used by the writer
    // =========================================================================

    fn node_mut(&mut self, id: ViewId) -> Result<&mut ViewNode, ViewError> {
        if id == ViewId::INVALID {
            return Err(ViewError::MissingNode(id));
        }
        self.nodes.get_mut(id.index()).ok_or(ViewError::MissingNode(id))
    }

    pub(crate) fn insert_child(
        &mut self,
        parent: ViewId,
        index: usize,
        child: ViewId,
    ) -> Result<(), ViewError> {
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(ViewError::Cycle { parent, child });
        }
        let parent_node = self.node(parent).ok_or(ViewError::MissingNode(parent))?;
        if !parent_node.can_have_children() {
            return Err(ViewError::CannotHaveChildren(parent));
        }
        if index > parent_node.children.len() {
            return Err(ViewError::OffsetOutOfBounds {
                node: parent,
                offset: index,
            });
        }
        if self.node(child).is_none() {
            return Err(ViewError::MissingNode(child));
        }
        if self.parent(child).is_some() {
            return Err(ViewError::AlreadyAttached(child));
        }
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach `id` from its parent, returning the former parent.
    pub(crate) fn detach(&mut self, id: ViewId) -> Result<Option<ViewId>, ViewError> {
        let Some(parent) = self.node(id).ok_or(ViewError::MissingNode(id))?.parent else {
            return Ok(None);
        };
        self.node_mut(parent)?.children.retain(|c| *c != id);
        self.node_mut(id)?.parent = None;
        Ok(Some(parent))
    }

    pub(crate) fn element_mut(&mut self, id: ViewId) -> Result<&mut ElementData, ViewError> {
        match &mut self.node_mut(id)?.kind {
            ViewKind::Element(data) => Ok(data),
            _ => Err(ViewError::NotAnElement(id)),
        }
    }

    pub(crate) fn text_mut(&mut self, id: ViewId) -> Result<&mut String, ViewError> {
        match &mut self.node_mut(id)?.kind {
            ViewKind::Text { data } => Ok(data),
            _ => Err(ViewError::NotText(id)),
        }
    }

    pub(crate) fn set_selection(&mut self, selection: ViewSelection) {
        self.selection = selection;
    }

    pub(crate) fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ViewWriter;

    fn paragraph_with(children: &[(&str, ElementRole)]) -> (ViewDocument, ViewId, Vec<ViewId>) {
        let mut doc = ViewDocument::new();
        let root = doc.create_root("div");
        let p = doc.create_element("p", ElementRole::Container);
        let ids: Vec<_> = children
            .iter()
            .map(|(name, role)| doc.create_element(name, *role))
            .collect();
        let mut sink = ();
        let mut writer = ViewWriter::new(&mut doc, &mut sink);
        writer.append(root, p).expect("append p");
        for id in &ids {
            writer.append(p, *id).expect("append child");
        }
        (doc, p, ids)
    }

    #[test]
    fn empty_container_needs_block_filler_at_zero() {
        let (doc, p, _) = paragraph_with(&[]);
        assert_eq!(doc.filler_offset(p), Some(0));
    }

    #[test]
    fn container_with_trailing_br_needs_block_filler() {
        let (doc, p, _) = paragraph_with(&[("br", ElementRole::Empty)]);
        assert_eq!(doc.filler_offset(p), Some(1));
    }

    #[test]
    fn container_with_only_ui_children_needs_block_filler() {
        let (doc, p, _) = paragraph_with(&[("span", ElementRole::Ui)]);
        assert_eq!(doc.filler_offset(p), Some(1));

        let (doc, p, _) = paragraph_with(&[("b", ElementRole::Attribute)]);
        assert_eq!(doc.filler_offset(p), None);
    }

    #[test]
    fn lone_empty_attribute_element_takes_the_filler() {
        let (doc, _, ids) = paragraph_with(&[("b", ElementRole::Attribute)]);
        assert_eq!(doc.filler_offset(ids[0]), Some(0));

        let (doc, _, ids) = paragraph_with(&[
            ("b", ElementRole::Attribute),
            ("i", ElementRole::Attribute),
        ]);
        assert_eq!(doc.filler_offset(ids[0]), None);
    }

    #[test]
    fn editability_follows_nearest_explicit_flag() {
        let (mut doc, p, ids) = paragraph_with(&[("span", ElementRole::Attribute)]);
        assert!(doc.is_editable(ids[0]));
        {
            let mut sink = ();
            let mut writer = ViewWriter::new(&mut doc, &mut sink);
            writer
                .set_attribute(p, "contenteditable", "false")
                .expect("set attribute");
        }
        assert!(!doc.is_editable(p));
        assert!(!doc.is_editable(ids[0]));
        {
            let mut sink = ();
            let mut writer = ViewWriter::new(&mut doc, &mut sink);
            writer
                .set_attribute(ids[0], "contenteditable", "true")
                .expect("set attribute");
        }
        // The element's own "true" does not override its non-editable parent.
        assert!(!doc.is_editable(ids[0]));
    }

    #[test]
    fn positions_compare_in_document_order() {
        let (doc, p, ids) = paragraph_with(&[
            ("b", ElementRole::Attribute),
            ("i", ElementRole::Attribute),
        ]);
        let before = ViewPosition::new(p, 0);
        let inside = ViewPosition::new(ids[0], 0);
        let after = ViewPosition::new(p, 1);
        assert_eq!(doc.compare_positions(&before, &inside), Ordering::Less);
        assert_eq!(doc.compare_positions(&inside, &after), Ordering::Less);
        assert_eq!(doc.compare_positions(&after, &after), Ordering::Equal);
        assert_eq!(doc.editable_element(ids[1]), doc.roots().first().copied());
    }
}
