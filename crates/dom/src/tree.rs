//! Arena-backed live tree.
//!
//! Nodes are allocated once and never freed, so a `DomId` stays valid after
//! the node is detached. A node is *connected* when the document node is one
//! of its inclusive ancestors. The native selection is kept consistent with
//! structural and character data changes the same way browsers update live
//! ranges.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use core_types::DomId;

use crate::error::DomError;
use crate::mutation::DomMutation;
use crate::selection::{DomPoint, NativeSelection};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element {
        name: Arc<str>,
        attributes: BTreeMap<String, String>,
    },
    Text {
        data: String,
    },
    Comment {
        data: String,
    },
    /// Inserting a fragment moves its children instead.
    Fragment,
}

#[derive(Clone, Debug)]
struct NodeRecord {
    kind: NodeKind,
    parent: Option<DomId>,
    children: Vec<DomId>,
}

impl NodeRecord {
    fn allows_children(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Document | NodeKind::Element { .. } | NodeKind::Fragment
        )
    }
}

#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<NodeRecord>,
    document: DomId,
    pub(crate) selection: NativeSelection,
    pub(crate) selection_revision: u64,
    active: Option<DomId>,
    recording: bool,
    journal: Vec<DomMutation>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            document: DomId::INVALID,
            selection: NativeSelection::default(),
            selection_revision: 0,
            active: None,
            recording: false,
            journal: Vec::new(),
        };
        tree.document = tree.push(NodeKind::Document);
        tree
    }

    pub fn document(&self) -> DomId {
        self.document
    }

    // =========================================================================
    // Creation
    // =========================================================================

    pub fn create_element(&mut self, name: &str) -> DomId {
        self.push(NodeKind::Element {
            name: Arc::from(name),
            attributes: BTreeMap::new(),
        })
    }

    pub fn create_text(&mut self, data: &str) -> DomId {
        self.push(NodeKind::Text {
            data: data.to_string(),
        })
    }

    pub fn create_comment(&mut self, data: &str) -> DomId {
        self.push(NodeKind::Comment {
            data: data.to_string(),
        })
    }

    pub fn create_fragment(&mut self) -> DomId {
        self.push(NodeKind::Fragment)
    }

    fn push(&mut self, kind: NodeKind) -> DomId {
        let id = DomId::from_index(self.nodes.len());
        self.nodes.push(NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn record(&self, id: DomId) -> Result<&NodeRecord, DomError> {
        if id == DomId::INVALID {
            debug_assert!(false, "invalid dom id");
            return Err(DomError::MissingNode(id));
        }
        self.nodes.get(id.index()).ok_or(DomError::MissingNode(id))
    }

    fn record_mut(&mut self, id: DomId) -> Result<&mut NodeRecord, DomError> {
        if id == DomId::INVALID {
            debug_assert!(false, "invalid dom id");
            return Err(DomError::MissingNode(id));
        }
        self.nodes.get_mut(id.index()).ok_or(DomError::MissingNode(id))
    }

    fn get(&self, id: DomId) -> Option<&NodeRecord> {
        if id == DomId::INVALID {
            return None;
        }
        self.nodes.get(id.index())
    }

    pub fn exists(&self, id: DomId) -> bool {
        self.get(id).is_some()
    }

    pub fn kind(&self, id: DomId) -> Option<&NodeKind> {
        self.get(id).map(|n| &n.kind)
    }

    pub fn parent(&self, id: DomId) -> Option<DomId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: DomId) -> &[DomId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn child_count(&self, id: DomId) -> usize {
        self.children(id).len()
    }

    pub fn child_at(&self, id: DomId, index: usize) -> Option<DomId> {
        self.children(id).get(index).copied()
    }

    pub fn first_child(&self, id: DomId) -> Option<DomId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: DomId) -> Option<DomId> {
        self.children(id).last().copied()
    }

    pub fn index_of(&self, id: DomId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn previous_sibling(&self, id: DomId) -> Option<DomId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        index.checked_sub(1).and_then(|i| self.child_at(parent, i))
    }

    pub fn next_sibling(&self, id: DomId) -> Option<DomId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        self.child_at(parent, index + 1)
    }

    /// Inclusive ancestor check.
    pub fn contains(&self, ancestor: DomId, node: DomId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn is_connected(&self, id: DomId) -> bool {
        self.contains(self.document, id)
    }

    pub fn is_element(&self, id: DomId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element { .. }))
    }

    pub fn is_text(&self, id: DomId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text { .. }))
    }

    pub fn is_comment(&self, id: DomId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Comment { .. }))
    }

    /// Lower-case tag name for elements.
    pub fn name(&self, id: DomId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { name, .. } => Some(name.as_ref()),
            _ => None,
        }
    }

    /// Character data of text and comment nodes.
    pub fn data(&self, id: DomId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text { data } | NodeKind::Comment { data } => Some(data.as_str()),
            _ => None,
        }
    }

    pub fn attribute(&self, id: DomId, key: &str) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { attributes, .. } => attributes.get(key).map(String::as_str),
            _ => None,
        }
    }

    pub fn attributes(&self, id: DomId) -> impl Iterator<Item = (&str, &str)> {
        let attributes = match self.kind(id) {
            Some(NodeKind::Element { attributes, .. }) => Some(attributes),
            _ => None,
        };
        attributes
            .into_iter()
            .flat_map(|a| a.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Length in the live-range sense: chars for character data, children
    /// otherwise.
    pub fn length(&self, id: DomId) -> usize {
        match self.data(id) {
            Some(data) => data.chars().count(),
            None => self.child_count(id),
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: DomId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: DomId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text { data }) => out.push_str(data),
            Some(NodeKind::Comment { .. }) | None => {}
            Some(_) => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Child-index path from the topmost ancestor down to `id`.
    fn path(&self, id: DomId) -> (DomId, Vec<usize>) {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(self.index_of(current).unwrap_or(0));
            current = parent;
        }
        path.reverse();
        (current, path)
    }

    /// Tree order of two boundary points. Points in disconnected trees are
    /// ordered by their topmost ancestors.
    pub fn compare_points(&self, a: DomPoint, b: DomPoint) -> Ordering {
        let (top_a, mut key_a) = self.path(a.node);
        let (top_b, mut key_b) = self.path(b.node);
        if top_a != top_b {
            return top_a.cmp(&top_b);
        }
        key_a.push(a.offset);
        key_b.push(b.offset);
        key_a.cmp(&key_b)
    }

    // =========================================================================
    // Focus
    // =========================================================================

    pub fn active_element(&self) -> Option<DomId> {
        self.active
    }

    /// Make `id` the active element. Only connected elements can take focus.
    pub fn focus(&mut self, id: DomId) -> Result<(), DomError> {
        self.record(id)?;
        if !self.is_element(id) {
            return Err(DomError::WrongNodeKind(id));
        }
        if self.is_connected(id) && self.active != Some(id) {
            log::trace!(target: "dom.tree", "focus {id}");
            self.active = Some(id);
        }
        Ok(())
    }

    pub fn blur(&mut self) {
        self.active = None;
    }

    // =========================================================================
    // Journal
    // =========================================================================

    /// Start or stop journaling mutations of connected nodes. Off by
    /// default; stopping drops what was recorded. While recording, the host
    /// owns draining the journal with [`take_journal`](Self::take_journal).
    pub fn record_journal(&mut self, recording: bool) {
        self.recording = recording;
        if !recording {
            self.journal = Vec::new();
        }
    }

    pub fn is_recording_journal(&self) -> bool {
        self.recording
    }

    pub fn journal(&self) -> &[DomMutation] {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<DomMutation> {
        std::mem::take(&mut self.journal)
    }

    fn record_mutation(&mut self, target: DomId, mutation: DomMutation) {
        if !self.is_connected(target) {
            return;
        }
        log::trace!(target: "dom.tree", "{mutation:?}");
        if self.recording {
            self.journal.push(mutation);
        }
    }

    // =========================================================================
    // Structural mutation
    // =========================================================================

    /// Insert `node` at `index` in `parent`, moving it if it is attached
    /// elsewhere. A fragment is replaced by its children.
    pub fn insert_at(&mut self, parent: DomId, index: usize, node: DomId) -> Result<(), DomError> {
        if !self.record(parent)?.allows_children() {
            return Err(DomError::InvalidParent(parent));
        }
        if matches!(self.record(node)?.kind, NodeKind::Fragment) {
            let children = self.children(node).to_vec();
            for (offset, child) in children.into_iter().enumerate() {
                self.insert_at(parent, index + offset, child)?;
            }
            return Ok(());
        }
        if matches!(self.record(node)?.kind, NodeKind::Document) {
            return Err(DomError::WrongNodeKind(node));
        }
        if self.contains(node, parent) {
            debug_assert!(false, "cannot create cycle");
            return Err(DomError::CycleDetected {
                parent,
                child: node,
            });
        }
        let same_parent = self.parent(node) == Some(parent);
        if index > self.child_count(parent) {
            return Err(DomError::OffsetOutOfBounds {
                node: parent,
                offset: index,
            });
        }
        let mut index = index;
        if same_parent && self.index_of(node).is_some_and(|i| i < index) {
            index -= 1;
        }
        if self.parent(node).is_some() {
            self.remove(node)?;
        }

        self.adjust_points(|_, p| {
            if p.node == parent && p.offset > index {
                DomPoint::new(p.node, p.offset + 1)
            } else {
                p
            }
        });
        self.record_mut(parent)?.children.insert(index, node);
        self.record_mut(node)?.parent = Some(parent);
        self.record_mutation(parent, DomMutation::Insert {
            parent,
            index,
            node,
        });
        Ok(())
    }

    pub fn append_child(&mut self, parent: DomId, node: DomId) -> Result<(), DomError> {
        let index = self.child_count(parent);
        self.insert_at(parent, index, node)
    }

    /// Detach `node` from its parent. Detaching a parentless node is a no-op.
    pub fn remove(&mut self, node: DomId) -> Result<(), DomError> {
        let Some(parent) = self.record(node)?.parent else {
            return Ok(());
        };
        let index = self.index_of(node).ok_or(DomError::MissingNode(node))?;
        self.adjust_points(|tree, p| {
            if tree.contains(node, p.node) {
                DomPoint::new(parent, index)
            } else if p.node == parent && p.offset > index {
                DomPoint::new(parent, p.offset - 1)
            } else {
                p
            }
        });
        if self.active.is_some_and(|a| self.contains(node, a)) {
            self.active = None;
        }
        self.record_mutation(parent, DomMutation::Remove {
            parent,
            index,
            node,
        });
        self.record_mut(parent)?.children.remove(index);
        self.record_mut(node)?.parent = None;
        Ok(())
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    fn attributes_mut(&mut self, id: DomId) -> Result<&mut BTreeMap<String, String>, DomError> {
        match &mut self.record_mut(id)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            _ => Err(DomError::WrongNodeKind(id)),
        }
    }

    pub fn set_attribute(&mut self, id: DomId, key: &str, value: &str) -> Result<(), DomError> {
        self.attributes_mut(id)?
            .insert(key.to_string(), value.to_string());
        self.record_mutation(id, DomMutation::SetAttribute {
            node: id,
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: DomId, key: &str) -> Result<(), DomError> {
        if self.attributes_mut(id)?.remove(key).is_some() {
            self.record_mutation(id, DomMutation::RemoveAttribute {
                node: id,
                key: key.to_string(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Character data
    // =========================================================================

    fn data_mut(&mut self, id: DomId) -> Result<&mut String, DomError> {
        match &mut self.record_mut(id)?.kind {
            NodeKind::Text { data } | NodeKind::Comment { data } => Ok(data),
            _ => Err(DomError::WrongNodeKind(id)),
        }
    }

    pub fn insert_data(&mut self, id: DomId, offset: usize, data: &str) -> Result<(), DomError> {
        let current = self.data_mut(id)?;
        let byte = byte_offset(current, offset).ok_or(DomError::OffsetOutOfBounds {
            node: id,
            offset,
        })?;
        current.insert_str(byte, data);
        let inserted = data.chars().count();
        self.adjust_points(|_, p| {
            if p.node == id && p.offset > offset {
                DomPoint::new(id, p.offset + inserted)
            } else {
                p
            }
        });
        self.record_mutation(id, DomMutation::InsertData {
            node: id,
            offset,
            data: data.to_string(),
        });
        Ok(())
    }

    pub fn delete_data(&mut self, id: DomId, offset: usize, count: usize) -> Result<(), DomError> {
        let current = self.data_mut(id)?;
        let out_of_bounds = DomError::OffsetOutOfBounds {
            node: id,
            offset: offset + count,
        };
        let start = byte_offset(current, offset).ok_or(out_of_bounds.clone())?;
        let end = byte_offset(current, offset + count).ok_or(out_of_bounds)?;
        current.replace_range(start..end, "");
        self.adjust_points(|_, p| {
            if p.node != id || p.offset <= offset {
                p
            } else if p.offset <= offset + count {
                DomPoint::new(id, offset)
            } else {
                DomPoint::new(id, p.offset - count)
            }
        });
        self.record_mutation(id, DomMutation::DeleteData {
            node: id,
            offset,
            count,
        });
        Ok(())
    }

    /// Replace all character data of `id`.
    pub fn set_data(&mut self, id: DomId, data: &str) -> Result<(), DomError> {
        let current = self.data_mut(id)?;
        current.clear();
        current.push_str(data);
        self.adjust_points(|_, p| if p.node == id { DomPoint::new(id, 0) } else { p });
        self.record_mutation(id, DomMutation::SetData {
            node: id,
            data: data.to_string(),
        });
        Ok(())
    }

    /// Replace all children of `id` with a single text node (none when `text`
    /// is empty).
    pub fn set_text_content(&mut self, id: DomId, text: &str) -> Result<(), DomError> {
        if !self.record(id)?.allows_children() {
            return self.set_data(id, text);
        }
        while let Some(child) = self.last_child(id) {
            self.remove(child)?;
        }
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node)?;
        }
        Ok(())
    }

    fn adjust_points(&mut self, f: impl Fn(&DomTree, DomPoint) -> DomPoint) {
        let anchor = self.selection.anchor.map(|p| f(self, p));
        let focus = self.selection.focus.map(|p| f(self, p));
        self.selection.anchor = anchor;
        self.selection.focus = focus;
    }
}

fn byte_offset(s: &str, chars: usize) -> Option<usize> {
    s.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .nth(chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(tree: &mut DomTree) -> (DomId, DomId) {
        let p = tree.create_element("p");
        let text = tree.create_text("foo");
        tree.append_child(p, text).unwrap();
        let doc = tree.document();
        tree.append_child(doc, p).unwrap();
        (p, text)
    }

    #[test]
    fn journal_records_only_connected_mutations() {
        let mut tree = DomTree::new();
        tree.record_journal(true);
        let p = tree.create_element("p");
        let text = tree.create_text("a");
        tree.append_child(p, text).unwrap();
        tree.set_attribute(p, "class", "x").unwrap();
        assert!(tree.journal().is_empty());

        let doc = tree.document();
        tree.append_child(doc, p).unwrap();
        tree.insert_data(text, 1, "b").unwrap();
        assert_eq!(
            tree.take_journal(),
            vec![
                DomMutation::Insert {
                    parent: doc,
                    index: 0,
                    node: p
                },
                DomMutation::InsertData {
                    node: text,
                    offset: 1,
                    data: "b".into()
                },
            ]
        );
        assert!(tree.journal().is_empty());
        assert_eq!(tree.text_content(p), "ab");
    }

    #[test]
    fn journal_is_off_until_requested() {
        let mut tree = DomTree::new();
        let (p, text) = paragraph(&mut tree);
        tree.insert_data(text, 3, "bar").unwrap();
        assert!(!tree.is_recording_journal());
        assert!(tree.journal().is_empty());

        tree.record_journal(true);
        tree.set_attribute(p, "class", "x").unwrap();
        assert_eq!(tree.journal().len(), 1);
        tree.record_journal(false);
        assert!(tree.journal().is_empty());
        tree.delete_data(text, 0, 1).unwrap();
        assert!(tree.journal().is_empty());
        assert_eq!(tree.text_content(p), "oobar");
    }

    #[test]
    fn fragment_insert_moves_children() {
        let mut tree = DomTree::new();
        let (p, text) = paragraph(&mut tree);
        let fragment = tree.create_fragment();
        let a = tree.create_element("b");
        let b = tree.create_element("i");
        tree.append_child(fragment, a).unwrap();
        tree.append_child(fragment, b).unwrap();
        tree.insert_at(p, 0, fragment).unwrap();
        assert_eq!(tree.children(p), &[a, b, text]);
        assert!(tree.children(fragment).is_empty());
    }

    #[test]
    fn selection_follows_character_data_changes() {
        let mut tree = DomTree::new();
        let (_, text) = paragraph(&mut tree);
        tree.collapse(DomPoint::new(text, 2)).unwrap();
        tree.insert_data(text, 0, "xx").unwrap();
        assert_eq!(tree.selection().anchor(), Some(DomPoint::new(text, 4)));
        tree.delete_data(text, 1, 4).unwrap();
        assert_eq!(tree.selection().anchor(), Some(DomPoint::new(text, 1)));
        assert_eq!(tree.data(text), Some("x"));
    }

    #[test]
    fn removing_a_node_moves_selection_to_its_parent() {
        let mut tree = DomTree::new();
        let (p, text) = paragraph(&mut tree);
        let after = tree.create_element("br");
        tree.append_child(p, after).unwrap();
        tree.collapse(DomPoint::new(text, 1)).unwrap();
        tree.extend(DomPoint::new(p, 2)).unwrap();
        tree.remove(text).unwrap();
        assert_eq!(tree.selection().anchor(), Some(DomPoint::new(p, 0)));
        assert_eq!(tree.selection().focus(), Some(DomPoint::new(p, 1)));
        assert_eq!(tree.parent(text), None);
    }

    #[test]
    fn rejects_cycles_and_childless_parents() {
        let mut tree = DomTree::new();
        let (p, text) = paragraph(&mut tree);
        let span = tree.create_element("span");
        assert_eq!(
            tree.insert_at(text, 0, span),
            Err(DomError::InvalidParent(text))
        );
        assert_eq!(
            tree.insert_at(p, 5, span),
            Err(DomError::OffsetOutOfBounds { node: p, offset: 5 })
        );
        assert_eq!(tree.set_attribute(text, "a", "b"), Err(DomError::WrongNodeKind(text)));
    }

    #[test]
    fn focus_requires_connected_element() {
        let mut tree = DomTree::new();
        let (p, _) = paragraph(&mut tree);
        let detached = tree.create_element("div");
        tree.focus(detached).unwrap();
        assert_eq!(tree.active_element(), None);
        tree.focus(p).unwrap();
        assert_eq!(tree.active_element(), Some(p));
        tree.remove(p).unwrap();
        assert_eq!(tree.active_element(), None);
    }

    #[test]
    fn points_compare_in_tree_order() {
        let mut tree = DomTree::new();
        let (p, text) = paragraph(&mut tree);
        assert_eq!(
            tree.compare_points(DomPoint::new(p, 0), DomPoint::new(text, 0)),
            Ordering::Less
        );
        assert_eq!(
            tree.compare_points(DomPoint::new(p, 1), DomPoint::new(text, 3)),
            Ordering::Greater
        );
    }
}
