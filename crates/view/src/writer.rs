//! Mutation API of the view document.
//!
//! Every structural, attribute or text change made through [`ViewWriter`] is
//! reported to a [`ChangeSink`] right after it is applied. The sink sees the
//! document in its post-change state.

use core_types::ViewId;

use crate::ViewError;
use crate::document::ViewDocument;
use crate::node::ViewKind;
use crate::position::ViewPosition;
use crate::selection::ViewSelection;

/// Receiver of view change notifications.
///
/// Implementors must not assume anything about batching: one writer call may
/// produce several notifications, and the same node may be reported many times
/// before anything consumes them.
pub trait ChangeSink {
    /// The child list of `element` changed.
    fn children_changed(&mut self, doc: &ViewDocument, element: ViewId);
    /// One or more attributes of `element` changed.
    fn attributes_changed(&mut self, doc: &ViewDocument, element: ViewId);
    /// The data of text node `text` changed.
    fn text_changed(&mut self, doc: &ViewDocument, text: ViewId);
}

/// Discards every notification.
impl ChangeSink for () {
    fn children_changed(&mut self, _: &ViewDocument, _: ViewId) {}
    fn attributes_changed(&mut self, _: &ViewDocument, _: ViewId) {}
    fn text_changed(&mut self, _: &ViewDocument, _: ViewId) {}
}

impl<S: ChangeSink + ?Sized> ChangeSink for &mut S {
    fn children_changed(&mut self, doc: &ViewDocument, element: ViewId) {
        (**self).children_changed(doc, element);
    }
    fn attributes_changed(&mut self, doc: &ViewDocument, element: ViewId) {
        (**self).attributes_changed(doc, element);
    }
    fn text_changed(&mut self, doc: &ViewDocument, text: ViewId) {
        (**self).text_changed(doc, text);
    }
}

pub struct ViewWriter<'a, S: ChangeSink + ?Sized> {
    doc: &'a mut ViewDocument,
    sink: &'a mut S,
}

impl<'a, S: ChangeSink + ?Sized> ViewWriter<'a, S> {
    pub fn new(doc: &'a mut ViewDocument, sink: &'a mut S) -> Self {
        Self { doc, sink }
    }

    pub fn document(&self) -> &ViewDocument {
        self.doc
    }

    pub fn create_element(&mut self, name: &str, role: crate::ElementRole) -> ViewId {
        self.doc.create_element(name, role)
    }

    pub fn create_text(&mut self, data: &str) -> ViewId {
        self.doc.create_text(data)
    }

    /// Insert `node` at `index` in `parent`. An attached node is moved; a
    /// fragment is unpacked and its children inserted in order.
    pub fn insert(&mut self, parent: ViewId, index: usize, node: ViewId) -> Result<(), ViewError> {
        let is_fragment = matches!(
            self.doc.node(node).map(|n| n.kind()),
            Some(ViewKind::Fragment)
        );
        if is_fragment {
            let children = self.doc.children(node).to_vec();
            for (offset, child) in children.into_iter().enumerate() {
                self.doc.detach(child)?;
                self.doc.insert_child(parent, index + offset, child)?;
            }
            self.sink.children_changed(self.doc, node);
            self.sink.children_changed(self.doc, parent);
            return Ok(());
        }

        let mut index = index;
        if let Some(old_parent) = self.doc.parent(node) {
            if old_parent == parent
                && self.doc.index_in_parent(node).is_some_and(|i| i < index)
            {
                index -= 1;
            }
            self.doc.detach(node)?;
            if old_parent != parent {
                self.sink.children_changed(self.doc, old_parent);
            }
        }
        self.doc.insert_child(parent, index, node)?;
        self.sink.children_changed(self.doc, parent);
        Ok(())
    }

    pub fn append(&mut self, parent: ViewId, node: ViewId) -> Result<(), ViewError> {
        let index = self.doc.child_count(parent);
        self.insert(parent, index, node)
    }

    /// Detach `node` from its parent. Returns the former parent.
    pub fn remove(&mut self, node: ViewId) -> Result<Option<ViewId>, ViewError> {
        let parent = self.doc.detach(node)?;
        if let Some(parent) = parent {
            self.sink.children_changed(self.doc, parent);
        }
        Ok(parent)
    }

    pub fn set_attribute(&mut self, element: ViewId, key: &str, value: &str) -> Result<(), ViewError> {
        let data = self.doc.element_mut(element)?;
        if data.attributes.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        data.attributes.insert(key.to_string(), value.to_string());
        self.sink.attributes_changed(self.doc, element);
        Ok(())
    }

    pub fn remove_attribute(&mut self, element: ViewId, key: &str) -> Result<(), ViewError> {
        if self.doc.element_mut(element)?.attributes.remove(key).is_some() {
            self.sink.attributes_changed(self.doc, element);
        }
        Ok(())
    }

    pub fn set_text(&mut self, text: ViewId, data: &str) -> Result<(), ViewError> {
        let current = self.doc.text_mut(text)?;
        if current == data {
            return Ok(());
        }
        *current = data.to_string();
        self.sink.text_changed(self.doc, text);
        Ok(())
    }

    /// Insert `text` at `position`, merging into an adjacent text node when
    /// there is one. Returns the position right after the inserted text.
    pub fn insert_text(&mut self, position: ViewPosition, text: &str) -> Result<ViewPosition, ViewError> {
        let inserted = text.chars().count();
        if self.doc.is_text(position.parent) {
            let current = self.doc.text_mut(position.parent)?;
            let byte = byte_offset(current, position.offset).ok_or(ViewError::OffsetOutOfBounds {
                node: position.parent,
                offset: position.offset,
            })?;
            current.insert_str(byte, text);
            self.sink.text_changed(self.doc, position.parent);
            return Ok(ViewPosition::new(position.parent, position.offset + inserted));
        }

        if position.offset > self.doc.child_count(position.parent) {
            return Err(ViewError::OffsetOutOfBounds {
                node: position.parent,
                offset: position.offset,
            });
        }
        if let Some(before) = position.node_before(self.doc)
            && self.doc.is_text(before)
        {
            let end = self.doc.max_offset(before);
            return self.insert_text(ViewPosition::new(before, end), text);
        }
        if let Some(after) = position.node_after(self.doc)
            && self.doc.is_text(after)
        {
            return self.insert_text(ViewPosition::new(after, 0), text);
        }
        let node = self.doc.create_text(text);
        self.insert(position.parent, position.offset, node)?;
        Ok(ViewPosition::new(node, inserted))
    }

    pub fn set_selection(&mut self, selection: ViewSelection) {
        self.doc.set_selection(selection);
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.doc.set_focused(focused);
    }
}

fn byte_offset(s: &str, chars: usize) -> Option<usize> {
    if chars == 0 {
        return Some(0);
    }
    s.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .nth(chars)
}
