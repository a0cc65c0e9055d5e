//! Identity mapping between the view and the live tree.
//!
//! Only elements are mapped. Text nodes are found through their neighbours:
//! a view text node corresponds to the live node right after the live
//! counterpart of its previous sibling, or to the first live child of its
//! parent when it has no previous sibling.
//!
//! [`Converter`] has a small required core (mapping, node creation, filler
//! and fake-selection bookkeeping). Position and selection translation are
//! provided on top of it.

use std::collections::HashMap;

use core_types::{DomId, ViewId};
use dom::{DomError, DomPoint, DomTree};
use view::{ViewDocument, ViewKind, ViewPosition, ViewRange, ViewSelection};

use crate::config::ConverterConfig;
use crate::error::RenderError;
use crate::filler::{INLINE_FILLER_LENGTH, is_inline_filler, starts_with_filler};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateOptions {
    /// Bind created elements to their view counterparts.
    pub bind: bool,
    /// Create descendants too.
    pub with_children: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            bind: false,
            with_children: true,
        }
    }
}

pub trait Converter {
    fn map_view_to_dom(&self, view: ViewId) -> Option<DomId>;

    fn map_dom_to_view(&self, dom: DomId) -> Option<ViewId>;

    /// Map `dom` and `view` to each other, dropping whatever either was mapped
    /// to before.
    fn bind(&mut self, dom: DomId, view: ViewId);

    /// Drop the mappings of `dom` and all its live descendants.
    fn unbind(&mut self, tree: &DomTree, dom: DomId);

    /// Build the live counterpart of a view node. Elements that are already
    /// mapped are returned as they are.
    fn create_dom_subtree(
        &mut self,
        doc: &ViewDocument,
        tree: &mut DomTree,
        node: ViewId,
        options: CreateOptions,
    ) -> Result<DomId, RenderError>;

    fn create_block_filler(&self, tree: &mut DomTree) -> Result<DomId, DomError>;

    fn is_block_filler(&self, tree: &DomTree, node: DomId) -> bool;

    /// Associate a fake selection with the live container rendering it.
    fn bind_fake_selection(&mut self, container: DomId, selection: ViewSelection);

    fn fake_selection_to_view(&self, container: DomId) -> Option<ViewSelection>;

    // =========================================================================
    // Provided
    // =========================================================================

    /// Outermost opaque (UI or raw) view element whose live counterpart
    /// contains `dom`.
    fn host_view_element(&self, doc: &ViewDocument, tree: &DomTree, dom: DomId) -> Option<ViewId> {
        let mut host = None;
        let mut current = Some(dom);
        while let Some(id) = current {
            if let Some(view) = self.map_dom_to_view(id)
                && doc.role(view).is_some_and(|r| r.is_opaque())
            {
                host = Some(view);
            }
            current = tree.parent(id);
        }
        host
    }

    fn find_dom_text(&self, doc: &ViewDocument, tree: &DomTree, text: ViewId) -> Option<DomId> {
        let candidate = match doc.previous_sibling(text) {
            Some(previous) => tree.next_sibling(self.map_view_to_dom(previous)?),
            None => tree.first_child(self.map_view_to_dom(doc.parent(text)?)?),
        }?;
        tree.is_text(candidate).then_some(candidate)
    }

    fn find_view_text(&self, doc: &ViewDocument, tree: &DomTree, text: DomId) -> Option<ViewId> {
        if is_inline_filler(tree, text) {
            return None;
        }
        if self.host_view_element(doc, tree, text).is_some() {
            return None;
        }
        let candidate = match tree.previous_sibling(text) {
            Some(previous) => {
                if !tree.is_element(previous) {
                    return None;
                }
                doc.next_sibling(self.map_dom_to_view(previous)?)
            }
            None => doc.child(self.map_dom_to_view(tree.parent(text)?)?, 0),
        }?;
        doc.is_text(candidate).then_some(candidate)
    }

    fn view_position_to_dom(
        &self,
        doc: &ViewDocument,
        tree: &DomTree,
        position: ViewPosition,
    ) -> Option<DomPoint> {
        let parent = position.parent;
        if doc.is_text(parent) {
            let dom_text = self.find_dom_text(doc, tree, parent)?;
            let mut offset = position.offset;
            if starts_with_filler(tree, dom_text) {
                offset += INLINE_FILLER_LENGTH;
            }
            return Some(DomPoint::new(dom_text, offset));
        }

        let (dom_parent, dom_before, dom_after) = match position.node_before(doc) {
            None => {
                let dom_parent = self.map_view_to_dom(parent)?;
                (dom_parent, None, tree.first_child(dom_parent))
            }
            Some(before) => {
                let dom_before = if doc.is_text(before) {
                    self.find_dom_text(doc, tree, before)
                } else {
                    self.map_view_to_dom(before)
                }?;
                (tree.parent(dom_before)?, Some(dom_before), tree.next_sibling(dom_before))
            }
        };
        if let Some(after) = dom_after
            && starts_with_filler(tree, after)
        {
            return Some(DomPoint::new(after, INLINE_FILLER_LENGTH));
        }
        let offset = match dom_before {
            Some(before) => tree.index_of(before)? + 1,
            None => 0,
        };
        Some(DomPoint::new(dom_parent, offset))
    }

    fn dom_position_to_view(
        &self,
        doc: &ViewDocument,
        tree: &DomTree,
        point: DomPoint,
    ) -> Option<ViewPosition> {
        let DomPoint { node, offset } = point;
        if self.is_block_filler(tree, node) {
            let parent = tree.parent(node)?;
            return self.dom_position_to_view(doc, tree, DomPoint::new(parent, tree.index_of(node)?));
        }
        if let Some(host) = self.host_view_element(doc, tree, node) {
            return ViewPosition::before(doc, host);
        }

        if tree.is_text(node) {
            if is_inline_filler(tree, node) {
                let parent = tree.parent(node)?;
                return self.dom_position_to_view(doc, tree, DomPoint::new(parent, tree.index_of(node)?));
            }
            let view_text = self.find_view_text(doc, tree, node)?;
            let mut offset = offset;
            if starts_with_filler(tree, node) {
                offset = offset.saturating_sub(INLINE_FILLER_LENGTH);
            }
            return Some(ViewPosition::new(view_text, offset));
        }

        if offset == 0 {
            return Some(ViewPosition::new(self.map_dom_to_view(node)?, 0));
        }
        let dom_before = tree.child_at(node, offset - 1)?;
        if is_inline_filler(tree, dom_before) || self.is_block_filler(tree, dom_before) {
            return self.dom_position_to_view(
                doc,
                tree,
                DomPoint::new(node, tree.index_of(dom_before)?),
            );
        }
        let view_before = if tree.is_text(dom_before) {
            self.find_view_text(doc, tree, dom_before)
        } else {
            self.map_dom_to_view(dom_before)
        }?;
        ViewPosition::after(doc, view_before)
    }

    /// Translate the native selection. A selection inside a bound fake
    /// selection container yields the bound selection.
    fn dom_selection_to_view(&self, doc: &ViewDocument, tree: &DomTree) -> ViewSelection {
        let Some((start, end)) = tree.selection_range() else {
            return ViewSelection::default();
        };
        let container = if tree.is_text(start.node) {
            tree.parent(start.node)
        } else {
            Some(start.node)
        };
        if let Some(container) = container
            && let Some(fake) = self.fake_selection_to_view(container)
        {
            return fake;
        }

        let mut ranges = Vec::new();
        if let (Some(start), Some(end)) = (
            self.dom_position_to_view(doc, tree, start),
            self.dom_position_to_view(doc, tree, end),
        ) {
            ranges.push(ViewRange::new(start, end));
        }
        ViewSelection::new(ranges, tree.is_selection_backward())
    }

    /// False when a native boundary sits before or inside the filler marker,
    /// or inside an opaque element.
    fn is_dom_selection_correct(&self, doc: &ViewDocument, tree: &DomTree) -> bool {
        let selection = tree.selection();
        [selection.anchor(), selection.focus()]
            .into_iter()
            .flatten()
            .all(|point| self.is_dom_point_correct(doc, tree, point))
    }

    fn is_dom_point_correct(&self, doc: &ViewDocument, tree: &DomTree, point: DomPoint) -> bool {
        if starts_with_filler(tree, point.node) && point.offset < INLINE_FILLER_LENGTH {
            return false;
        }
        if tree.is_element(point.node)
            && tree
                .child_at(point.node, point.offset)
                .is_some_and(|child| starts_with_filler(tree, child))
        {
            return false;
        }
        !self
            .map_dom_to_view(point.node)
            .and_then(|view| doc.role(view))
            .is_some_and(|r| r.is_opaque())
    }

    /// Focus the live counterpart of `editable` unless it is already active.
    fn focus(&self, tree: &mut DomTree, editable: ViewId) -> Result<(), DomError> {
        if let Some(dom) = self.map_view_to_dom(editable)
            && tree.active_element() != Some(dom)
        {
            tree.focus(dom)?;
        }
        Ok(())
    }
}

impl<C: Converter + ?Sized> Converter for &mut C {
    fn map_view_to_dom(&self, view: ViewId) -> Option<DomId> {
        (**self).map_view_to_dom(view)
    }

    fn map_dom_to_view(&self, dom: DomId) -> Option<ViewId> {
        (**self).map_dom_to_view(dom)
    }

    fn bind(&mut self, dom: DomId, view: ViewId) {
        (**self).bind(dom, view)
    }

    fn unbind(&mut self, tree: &DomTree, dom: DomId) {
        (**self).unbind(tree, dom)
    }

    fn create_dom_subtree(
        &mut self,
        doc: &ViewDocument,
        tree: &mut DomTree,
        node: ViewId,
        options: CreateOptions,
    ) -> Result<DomId, RenderError> {
        (**self).create_dom_subtree(doc, tree, node, options)
    }

    fn create_block_filler(&self, tree: &mut DomTree) -> Result<DomId, DomError> {
        (**self).create_block_filler(tree)
    }

    fn is_block_filler(&self, tree: &DomTree, node: DomId) -> bool {
        (**self).is_block_filler(tree, node)
    }

    fn bind_fake_selection(&mut self, container: DomId, selection: ViewSelection) {
        (**self).bind_fake_selection(container, selection)
    }

    fn fake_selection_to_view(&self, container: DomId) -> Option<ViewSelection> {
        (**self).fake_selection_to_view(container)
    }
}

/// Hash-map backed converter.
#[derive(Debug, Default)]
pub struct DomConverter {
    config: ConverterConfig,
    view_to_dom: HashMap<ViewId, DomId>,
    dom_to_view: HashMap<DomId, ViewId>,
    fake_selections: HashMap<DomId, ViewSelection>,
}

impl DomConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Number of mapped elements.
    pub fn mapped_len(&self) -> usize {
        self.view_to_dom.len()
    }

    fn append_view_children(
        &mut self,
        doc: &ViewDocument,
        tree: &mut DomTree,
        view_parent: ViewId,
        dom_parent: DomId,
        options: CreateOptions,
    ) -> Result<(), RenderError> {
        let filler = doc.filler_offset(view_parent);
        let children = doc.children(view_parent);
        for (index, child) in children.iter().enumerate() {
            if filler == Some(index) {
                let block_filler = self.create_block_filler(tree)?;
                tree.append_child(dom_parent, block_filler)?;
            }
            let dom = self.create_dom_subtree(doc, tree, *child, options)?;
            tree.append_child(dom_parent, dom)?;
        }
        if filler == Some(children.len()) {
            let block_filler = self.create_block_filler(tree)?;
            tree.append_child(dom_parent, block_filler)?;
        }
        Ok(())
    }
}

impl Converter for DomConverter {
    fn map_view_to_dom(&self, view: ViewId) -> Option<DomId> {
        self.view_to_dom.get(&view).copied()
    }

    fn map_dom_to_view(&self, dom: DomId) -> Option<ViewId> {
        self.dom_to_view.get(&dom).copied()
    }

    fn bind(&mut self, dom: DomId, view: ViewId) {
        if let Some(old_view) = self.dom_to_view.insert(dom, view)
            && old_view != view
            && self.view_to_dom.get(&old_view) == Some(&dom)
        {
            self.view_to_dom.remove(&old_view);
        }
        if let Some(old_dom) = self.view_to_dom.insert(view, dom)
            && old_dom != dom
            && self.dom_to_view.get(&old_dom) == Some(&view)
        {
            self.dom_to_view.remove(&old_dom);
        }
        log::trace!(target: "view.converter", "bind {dom} <-> {view}");
    }

    fn unbind(&mut self, tree: &DomTree, dom: DomId) {
        if let Some(view) = self.dom_to_view.remove(&dom) {
            if self.view_to_dom.get(&view) == Some(&dom) {
                self.view_to_dom.remove(&view);
            }
            log::trace!(target: "view.converter", "unbind {dom} <-> {view}");
        }
        self.fake_selections.remove(&dom);
        for child in tree.children(dom) {
            self.unbind(tree, *child);
        }
    }

    fn create_dom_subtree(
        &mut self,
        doc: &ViewDocument,
        tree: &mut DomTree,
        node: ViewId,
        options: CreateOptions,
    ) -> Result<DomId, RenderError> {
        let kind = doc
            .node(node)
            .map(|n| n.kind())
            .ok_or(view::ViewError::MissingNode(node))?;
        match kind {
            ViewKind::Text { data } => Ok(tree.create_text(data)),
            ViewKind::Fragment => {
                let fragment = tree.create_fragment();
                if options.with_children {
                    self.append_view_children(doc, tree, node, fragment, options)?;
                }
                Ok(fragment)
            }
            ViewKind::Element(data) => {
                if let Some(existing) = self.map_view_to_dom(node) {
                    return Ok(existing);
                }
                let element = tree.create_element(&data.name);
                for (key, value) in &data.attributes {
                    tree.set_attribute(element, key, value)?;
                }
                if options.bind {
                    self.bind(element, node);
                }
                if options.with_children {
                    self.append_view_children(doc, tree, node, element, options)?;
                }
                Ok(element)
            }
        }
    }

    fn create_block_filler(&self, tree: &mut DomTree) -> Result<DomId, DomError> {
        let br = tree.create_element("br");
        tree.set_attribute(br, &self.config.block_filler_attribute, "true")?;
        Ok(br)
    }

    fn is_block_filler(&self, tree: &DomTree, node: DomId) -> bool {
        tree.name(node) == Some("br")
            && tree
                .attribute(node, &self.config.block_filler_attribute)
                .is_some()
    }

    fn bind_fake_selection(&mut self, container: DomId, selection: ViewSelection) {
        self.fake_selections.insert(container, selection);
    }

    fn fake_selection_to_view(&self, container: DomId) -> Option<ViewSelection> {
        self.fake_selections.get(&container).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filler::INLINE_FILLER;
    use view::{ElementRole, ViewWriter};

    struct Fixture {
        doc: ViewDocument,
        tree: DomTree,
        converter: DomConverter,
        p: ViewId,
        s1: ViewId,
        s2: ViewId,
        foo: ViewId,
        bar: ViewId,
    }

    /// `<p><strong>foo</strong><strong>bar</strong></p>` rendered and bound.
    fn fixture() -> Fixture {
        let mut doc = ViewDocument::new();
        let root = doc.create_root("div");
        let p = doc.create_element("p", ElementRole::Container);
        let s1 = doc.create_element("strong", ElementRole::Attribute);
        let s2 = doc.create_element("strong", ElementRole::Attribute);
        let foo = doc.create_text("foo");
        let bar = doc.create_text("bar");
        let mut sink = ();
        let mut w = ViewWriter::new(&mut doc, &mut sink);
        w.append(root, p).unwrap();
        w.append(p, s1).unwrap();
        w.append(p, s2).unwrap();
        w.append(s1, foo).unwrap();
        w.append(s2, bar).unwrap();

        let mut tree = DomTree::new();
        let mut converter = DomConverter::default();
        let options = CreateOptions {
            bind: true,
            with_children: true,
        };
        let dom_root = converter
            .create_dom_subtree(&doc, &mut tree, root, options)
            .unwrap();
        let document = tree.document();
        tree.append_child(document, dom_root).unwrap();
        Fixture {
            doc,
            tree,
            converter,
            p,
            s1,
            s2,
            foo,
            bar,
        }
    }

    #[test]
    fn created_subtree_is_bound_and_texts_are_found() {
        let f = fixture();
        let dom_p = f.converter.map_view_to_dom(f.p).unwrap();
        let dom_s1 = f.converter.map_view_to_dom(f.s1).unwrap();
        assert_eq!(f.converter.map_dom_to_view(dom_p), Some(f.p));
        assert_eq!(f.tree.children(dom_p).len(), 2);

        let dom_foo = f.converter.find_dom_text(&f.doc, &f.tree, f.foo).unwrap();
        assert_eq!(f.tree.data(dom_foo), Some("foo"));
        assert_eq!(f.tree.parent(dom_foo), Some(dom_s1));
        assert_eq!(f.converter.find_view_text(&f.doc, &f.tree, dom_foo), Some(f.foo));
    }

    #[test]
    fn rebinding_drops_stale_entries() {
        let mut f = fixture();
        let dom_s1 = f.converter.map_view_to_dom(f.s1).unwrap();
        f.converter.bind(dom_s1, f.s2);
        assert_eq!(f.converter.map_view_to_dom(f.s1), None);
        assert_eq!(f.converter.map_dom_to_view(dom_s1), Some(f.s2));

        let dom_p = f.converter.map_view_to_dom(f.p).unwrap();
        f.converter.unbind(&f.tree, dom_p);
        assert_eq!(f.converter.map_view_to_dom(f.p), None);
        assert_eq!(f.converter.map_view_to_dom(f.s2), None);
    }

    #[test]
    fn positions_skip_the_filler_both_ways() {
        let mut f = fixture();
        let dom_p = f.converter.map_view_to_dom(f.p).unwrap();
        let filler = crate::filler::add_inline_filler(&mut f.tree, dom_p, 1).unwrap();

        let between = ViewPosition::new(f.p, 1);
        let point = f.converter.view_position_to_dom(&f.doc, &f.tree, between).unwrap();
        assert_eq!(point, DomPoint::new(filler, INLINE_FILLER_LENGTH));
        assert_eq!(
            f.converter.dom_position_to_view(&f.doc, &f.tree, point),
            Some(between)
        );
        assert_eq!(
            f.converter
                .dom_position_to_view(&f.doc, &f.tree, DomPoint::new(dom_p, 2)),
            Some(between)
        );
        assert_eq!(
            f.converter.view_position_to_dom(&f.doc, &f.tree, ViewPosition::new(f.p, 2)),
            Some(DomPoint::new(dom_p, 3))
        );
        assert_eq!(f.tree.data(filler), Some(INLINE_FILLER));
    }

    #[test]
    fn text_positions_account_for_prefixed_filler() {
        let mut f = fixture();
        let dom_bar = f.converter.find_dom_text(&f.doc, &f.tree, f.bar).unwrap();
        f.tree.insert_data(dom_bar, 0, INLINE_FILLER).unwrap();
        let point = f
            .converter
            .view_position_to_dom(&f.doc, &f.tree, ViewPosition::new(f.bar, 1))
            .unwrap();
        assert_eq!(point, DomPoint::new(dom_bar, INLINE_FILLER_LENGTH + 1));
        assert_eq!(
            f.converter
                .dom_position_to_view(&f.doc, &f.tree, DomPoint::new(dom_bar, 3)),
            Some(ViewPosition::new(f.bar, 0))
        );

        f.tree.collapse(DomPoint::new(dom_bar, 3)).unwrap();
        assert!(!f.converter.is_dom_selection_correct(&f.doc, &f.tree));
        f.tree.collapse(point).unwrap();
        assert!(f.converter.is_dom_selection_correct(&f.doc, &f.tree));
    }

    #[test]
    fn empty_container_gets_block_filler() {
        let mut doc = ViewDocument::new();
        let p = doc.create_element("p", ElementRole::Container);
        let mut tree = DomTree::new();
        let mut converter = DomConverter::default();
        let dom_p = converter
            .create_dom_subtree(&doc, &mut tree, p, CreateOptions::default())
            .unwrap();
        let filler = tree.first_child(dom_p).unwrap();
        assert!(converter.is_block_filler(&tree, filler));
        assert_eq!(converter.map_view_to_dom(p), None);

        converter.bind(dom_p, p);
        assert_eq!(
            converter.dom_position_to_view(&doc, &tree, DomPoint::new(dom_p, 1)),
            Some(ViewPosition::new(p, 0))
        );
        assert_eq!(
            converter.dom_position_to_view(&doc, &tree, DomPoint::new(filler, 0)),
            Some(ViewPosition::new(p, 0))
        );
    }
}
