//! The render pass.
//!
//! A pass takes the dirty sets collected since the previous pass and brings
//! the live tree in line with the view for exactly those nodes:
//!
//! 1. refresh mappings, so live elements that can be reused for new view
//!    elements of the same tag are rebound instead of recreated;
//! 2. retire the inline filler when the selection left it, or decide where a
//!    new one goes;
//! 3. patch attributes, then children, then text;
//! 4. place the inline filler, then sync the native selection and focus.
//!
//! A pass always runs to completion or fails. While the user composes text
//! the inline filler node keeps its identity across passes, so the host's
//! composition is not disturbed.

use core_types::{DomId, ViewId};
use dom::DomTree;
use log::{debug, trace, warn};
use view::{ChangeSink, ViewDocument, ViewPosition};

use crate::config::RendererConfig;
use crate::converter::Converter;
use crate::diff::{TextEdit, diff, diff_text};
use crate::error::RenderError;
use crate::expected::{
    both_text, expected_children, expected_data, mark_descendant_text, materialize, same_nodes, similar_elements,
};
use crate::filler::{
    INLINE_FILLER, add_inline_filler, inline_filler_position, needs_inline_filler, remove_inline_filler,
    starts_with_filler,
};
use crate::replace::{UpdateAction, find_update_actions};
use crate::selection::SelectionSync;
use crate::tracker::{ChangeTracker, ChangeType, DirtySets};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    /// A pass is running. A pass that panicked leaves the renderer here and
    /// every later [`Renderer::render`] fails with
    /// [`RenderError::RenderInProgress`].
    Rendering,
}

pub struct Renderer<C: Converter> {
    converter: C,
    config: RendererConfig,
    tracker: ChangeTracker,
    selection: SelectionSync,
    inline_filler: Option<DomId>,
    phase: RenderPhase,
}

impl<C: Converter + Default> Default for Renderer<C> {
    fn default() -> Self {
        Self::new(C::default(), RendererConfig::default())
    }
}

impl<C: Converter> Renderer<C> {
    pub fn new(converter: C, config: RendererConfig) -> Self {
        Self {
            converter,
            config,
            tracker: ChangeTracker::new(),
            selection: SelectionSync::new(),
            inline_filler: None,
            phase: RenderPhase::Idle,
        }
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn converter_mut(&mut self) -> &mut C {
        &mut self.converter
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    /// The live text node currently carrying the inline filler.
    pub fn inline_filler(&self) -> Option<DomId> {
        self.inline_filler
    }

    /// Changes waiting for the next pass.
    pub fn dirty(&self) -> &DirtySets {
        self.tracker.dirty()
    }

    pub fn selection_sync(&self) -> &SelectionSync {
        &self.selection
    }

    /// Record a change to a rendered view node. Returns whether it was
    /// recorded.
    pub fn mark(&mut self, doc: &ViewDocument, kind: ChangeType, node: ViewId) -> bool {
        self.tracker.mark(doc, &self.converter, kind, node)
    }

    /// [`mark`](Self::mark) with the change type given by name.
    pub fn mark_changed(&mut self, doc: &ViewDocument, kind: &str, node: ViewId) -> Result<bool, RenderError> {
        let kind: ChangeType = kind.parse()?;
        Ok(self.mark(doc, kind, node))
    }

    /// Bind a view root to its live element and schedule it for a full
    /// render.
    pub fn attach_dom_root(&mut self, doc: &ViewDocument, view_root: ViewId, dom_root: DomId) {
        self.converter.bind(dom_root, view_root);
        self.mark(doc, ChangeType::Attributes, view_root);
        self.mark(doc, ChangeType::Children, view_root);
        debug!(target: "view.renderer", "attached {view_root} to {dom_root}");
    }

    /// Whether the native selection differs from the view selection enough to
    /// be rewritten.
    pub fn needs_dom_update(&self, doc: &ViewDocument, tree: &DomTree) -> bool {
        self.selection.needs_dom_update(doc, tree, &self.converter)
    }

    /// Run one render pass. On failure the changes it consumed are put back,
    /// so a later pass can retry them.
    pub fn render(&mut self, doc: &ViewDocument, tree: &mut DomTree) -> Result<(), RenderError> {
        if self.phase == RenderPhase::Rendering {
            return Err(RenderError::RenderInProgress);
        }

        self.phase = RenderPhase::Rendering;
        let mut dirty = self.tracker.drain();
        let result = self.render_pass(doc, tree, &mut dirty);
        if let Err(err) = &result {
            warn!(target: "view.renderer", "render pass failed: {err}");
            self.tracker.restore(dirty);
        }
        self.phase = RenderPhase::Idle;
        result
    }

    fn render_pass(&mut self, doc: &ViewDocument, tree: &mut DomTree, dirty: &mut DirtySets) -> Result<(), RenderError> {
        debug!(
            target: "view.renderer",
            "render pass: {} attributes, {} children, {} text",
            dirty.attributes.len(),
            dirty.children.len(),
            dirty.text.len()
        );

        // Elements rebound here join the worklist.
        let mut index = 0;
        while let Some(element) = dirty.children.get_index(index).copied() {
            index += 1;
            self.refresh_mappings(doc, tree, element, dirty);
        }

        if let Some(filler) = self.inline_filler
            && !self.is_selection_in_inline_filler(doc, tree)
        {
            self.inline_filler = None;
            remove_inline_filler(tree, filler)?;
        }

        let filler_position = if self.inline_filler.is_some() {
            inline_filler_position(doc)
        } else if needs_inline_filler(doc, |view| self.converter.map_view_to_dom(view).is_some()) {
            let position = doc.selection().first_position(doc);
            if let Some(position) = position {
                dirty.children.insert(position.parent);
            }
            position
        } else {
            None
        };

        for element in &dirty.attributes {
            self.update_attributes(doc, tree, *element)?;
        }
        let children: Vec<ViewId> = dirty.children.iter().copied().collect();
        for element in children {
            self.update_children(doc, tree, element, filler_position, dirty)?;
        }
        let texts: Vec<ViewId> = dirty.text.iter().copied().collect();
        for text in texts {
            let Some(parent) = doc.parent(text) else {
                continue;
            };
            if dirty.children.contains(&parent) || self.converter.map_view_to_dom(parent).is_none() {
                continue;
            }
            self.update_text(doc, tree, text, filler_position)?;
        }

        self.inline_filler = match filler_position {
            Some(position) => self.place_inline_filler(doc, tree, position)?,
            None => None,
        };

        self.selection.update(doc, tree, &mut self.converter, &self.config)?;
        self.selection.update_focus(doc, tree, &self.converter)?;
        Ok(())
    }

    fn is_selection_in_inline_filler(&self, doc: &ViewDocument, tree: &DomTree) -> bool {
        let selection = doc.selection();
        if selection.range_count() != 1 || !selection.is_collapsed() {
            return false;
        }
        let Some(position) = selection.first_position(doc) else {
            return false;
        };
        self.converter
            .view_position_to_dom(doc, tree, position)
            .is_some_and(|point| starts_with_filler(tree, point.node))
    }

    fn place_inline_filler(
        &self,
        doc: &ViewDocument,
        tree: &mut DomTree,
        position: ViewPosition,
    ) -> Result<Option<DomId>, RenderError> {
        let Some(point) = self.converter.view_position_to_dom(doc, tree, position) else {
            trace!(target: "view.filler", "filler position {position:?} is not rendered");
            return Ok(None);
        };
        if starts_with_filler(tree, point.node) {
            return Ok(Some(point.node));
        }
        if tree.is_element(point.node) {
            return Ok(Some(add_inline_filler(tree, point.node, point.offset)?));
        }
        Ok(None)
    }

    /// Live children of `dom`, without the fake selection container.
    fn actual_children(&self, tree: &DomTree, dom: DomId) -> Vec<DomId> {
        let container = self.selection.fake_container();
        tree.children(dom)
            .iter()
            .copied()
            .filter(|child| Some(*child) != container)
            .collect()
    }

    /// Live counterpart of `element`, unless it is unrendered or opaque.
    fn open_dom_element(&self, doc: &ViewDocument, element: ViewId) -> Option<DomId> {
        if doc.role(element).is_some_and(|r| r.is_opaque()) {
            return None;
        }
        self.converter.map_view_to_dom(element)
    }

    fn refresh_mappings(&mut self, doc: &ViewDocument, tree: &DomTree, element: ViewId, dirty: &mut DirtySets) {
        let Some(dom) = self.open_dom_element(doc, element) else {
            return;
        };
        let actual = self.actual_children(tree, dom);
        let expected = expected_children(doc, &self.converter, element, None);
        let ops = diff(&actual, &expected, |a, e| same_nodes(tree, &self.converter, *a, e));
        let actions = find_update_actions(&ops, &actual, &expected, |a, e| similar_elements(doc, tree, *a, e));

        let (mut equal, mut inserted, mut deleted) = (0, 0, 0);
        for action in actions {
            match action {
                UpdateAction::Equal => equal += 1,
                UpdateAction::Insert => inserted += 1,
                UpdateAction::Delete => deleted += 1,
                UpdateAction::Update => {
                    let dom_child = actual[equal + deleted];
                    if let Some(view_child) = expected[equal + inserted].view()
                        && !doc.role(view_child).is_some_and(|r| r.is_opaque())
                    {
                        self.converter.unbind(tree, dom_child);
                        self.converter.bind(dom_child, view_child);
                        dirty.children.insert(view_child);
                        dirty.attributes.insert(view_child);
                        trace!(target: "view.renderer", "reusing {dom_child} for {view_child}");
                    }
                    equal += 1;
                }
            }
        }
    }

    fn update_attributes(&self, doc: &ViewDocument, tree: &mut DomTree, element: ViewId) -> Result<(), RenderError> {
        let Some(dom) = self.converter.map_view_to_dom(element) else {
            return Ok(());
        };
        let Some(data) = doc.node(element).and_then(|n| n.element()) else {
            return Ok(());
        };
        for (key, value) in &data.attributes {
            if tree.attribute(dom, key) != Some(value.as_str()) {
                tree.set_attribute(dom, key, value)?;
            }
        }
        let stale: Vec<String> = tree
            .attributes(dom)
            .filter(|(key, _)| !data.attributes.contains_key(*key))
            .map(|(key, _)| key.to_string())
            .collect();
        for key in stale {
            tree.remove_attribute(dom, &key)?;
        }
        Ok(())
    }

    fn update_children(
        &mut self,
        doc: &ViewDocument,
        tree: &mut DomTree,
        element: ViewId,
        filler_position: Option<ViewPosition>,
        dirty: &mut DirtySets,
    ) -> Result<(), RenderError> {
        let Some(dom) = self.open_dom_element(doc, element) else {
            trace!(target: "view.renderer", "children of {element} skipped");
            return Ok(());
        };
        let live: &DomTree = tree;
        let actual = self.actual_children(live, dom);
        let expected = expected_children(doc, &self.converter, element, filler_position);
        let ops = diff(&actual, &expected, |a, e| same_nodes(live, &self.converter, *a, e));
        let actions = find_update_actions(&ops, &actual, &expected, |a, e| both_text(live, *a, e));

        let mut removed = Vec::new();
        let mut cursor = 0;
        for action in &actions {
            match action {
                UpdateAction::Delete => {
                    tree.remove(actual[cursor])?;
                    removed.push(actual[cursor]);
                    cursor += 1;
                }
                UpdateAction::Equal | UpdateAction::Update => cursor += 1,
                UpdateAction::Insert => {}
            }
        }

        let (mut index, mut cursor) = (0, 0);
        for action in &actions {
            match action {
                UpdateAction::Insert => {
                    let node = materialize(doc, tree, &mut self.converter, &expected[index])?;
                    tree.insert_at(dom, index, node)?;
                    index += 1;
                }
                UpdateAction::Update => {
                    let data = expected_data(&expected[index]).unwrap_or_default();
                    update_text_node(tree, actual[cursor], data)?;
                    index += 1;
                    cursor += 1;
                }
                UpdateAction::Equal => {
                    mark_descendant_text(doc, &expected[index], &mut dirty.text);
                    index += 1;
                    cursor += 1;
                }
                UpdateAction::Delete => cursor += 1,
            }
        }

        for node in removed {
            if tree.parent(node).is_none() {
                self.converter.unbind(tree, node);
            }
        }
        trace!(target: "view.renderer", "children of {element} patched");
        Ok(())
    }

    fn update_text(
        &self,
        doc: &ViewDocument,
        tree: &mut DomTree,
        text: ViewId,
        filler_position: Option<ViewPosition>,
    ) -> Result<(), RenderError> {
        let Some(dom_text) = self.converter.find_dom_text(doc, tree, text) else {
            trace!(target: "view.renderer", "{text} has no live text node");
            return Ok(());
        };
        let mut expected = doc.data(text).unwrap_or_default().to_string();
        if let Some(filler) = filler_position
            && doc.parent(text) == Some(filler.parent)
            && doc.index_in_parent(text) == Some(filler.offset)
        {
            expected.insert_str(0, INLINE_FILLER);
        }
        update_text_node(tree, dom_text, &expected)
    }
}

/// Rewrite the data of a live text node with the fewest char edits.
fn update_text_node(tree: &mut DomTree, node: DomId, expected: &str) -> Result<(), RenderError> {
    let actual = tree.data(node).unwrap_or_default();
    if actual == expected {
        return Ok(());
    }
    for edit in diff_text(actual, expected) {
        match edit {
            TextEdit::Insert { offset, text } => tree.insert_data(node, offset, &text)?,
            TextEdit::Delete { offset, len } => tree.delete_data(node, offset, len)?,
        }
    }
    Ok(())
}

impl<C: Converter> ChangeSink for Renderer<C> {
    fn children_changed(&mut self, doc: &ViewDocument, element: ViewId) {
        self.mark(doc, ChangeType::Children, element);
    }

    fn attributes_changed(&mut self, doc: &ViewDocument, element: ViewId) {
        self.mark(doc, ChangeType::Attributes, element);
    }

    fn text_changed(&mut self, doc: &ViewDocument, text: ViewId) {
        self.mark(doc, ChangeType::Text, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::DomConverter;
    use view::{ElementRole, ViewWriter};

    fn setup() -> (ViewDocument, ViewId, DomTree, DomId, Renderer<DomConverter>) {
        let mut doc = ViewDocument::new();
        let root = doc.create_root("div");
        let mut tree = DomTree::new();
        let dom_root = tree.create_element("div");
        let document = tree.document();
        tree.append_child(document, dom_root).unwrap();
        let mut renderer = Renderer::default();
        renderer.attach_dom_root(&doc, root, dom_root);
        (doc, root, tree, dom_root, renderer)
    }

    #[test]
    fn attaching_marks_root_dirty() {
        let (_doc, root, _tree, dom_root, renderer) = setup();
        assert_eq!(renderer.converter().map_view_to_dom(root), Some(dom_root));
        assert!(renderer.dirty().children.contains(&root));
        assert!(renderer.dirty().attributes.contains(&root));
    }

    #[test]
    fn stale_attributes_are_removed() {
        let (mut doc, root, mut tree, dom_root, mut renderer) = setup();
        tree.set_attribute(dom_root, "spellcheck", "false").unwrap();
        ViewWriter::new(&mut doc, &mut renderer)
            .set_attribute(root, "class", "editable")
            .unwrap();
        renderer.render(&doc, &mut tree).unwrap();
        assert_eq!(tree.attribute(dom_root, "class"), Some("editable"));
        assert_eq!(tree.attribute(dom_root, "spellcheck"), None);
    }

    #[test]
    fn unknown_change_type_is_rejected() {
        let (doc, root, _tree, _dom_root, mut renderer) = setup();
        assert!(matches!(
            renderer.mark_changed(&doc, "style", root),
            Err(RenderError::UnknownChangeType(_))
        ));
        assert!(renderer.mark_changed(&doc, "children", root).unwrap());
    }

    #[test]
    fn children_render_in_order() {
        let (mut doc, root, mut tree, dom_root, mut renderer) = setup();
        let p = doc.create_element("p", ElementRole::Container);
        let text = doc.create_text("hello");
        let mut w = ViewWriter::new(&mut doc, &mut renderer);
        w.append(root, p).unwrap();
        w.append(p, text).unwrap();
        renderer.render(&doc, &mut tree).unwrap();

        let dom_p = renderer.converter().map_view_to_dom(p).unwrap();
        assert_eq!(tree.children(dom_root), &[dom_p]);
        assert_eq!(tree.text_content(dom_p), "hello");
        assert!(renderer.dirty().is_empty());
        assert_eq!(renderer.phase(), RenderPhase::Idle);
    }
}
