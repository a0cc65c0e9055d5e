//! Native selection and focus synchronization.
//!
//! The native selection is only touched when it has to be: rewriting it while
//! the user composes text or drags a selection interrupts the interaction, so
//! an equal (or, for non-collapsed selections, similar) native selection is
//! left alone.

use core_types::DomId;
use dom::DomTree;
use view::ViewDocument;

use crate::config::RendererConfig;
use crate::converter::Converter;
use crate::error::RenderError;

/// Inline style keeping the fake selection container out of sight.
const FAKE_SELECTION_STYLE: &str = "position:fixed;top:0;left:-9999px;width:42px";

#[derive(Debug, Default)]
pub struct SelectionSync {
    fake_container: Option<DomId>,
}

impl SelectionSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reusable fake selection container, once created.
    pub fn fake_container(&self) -> Option<DomId> {
        self.fake_container
    }

    /// Bring the native selection in line with the view selection.
    pub fn update<C: Converter + ?Sized>(
        &mut self,
        doc: &ViewDocument,
        tree: &mut DomTree,
        converter: &mut C,
        config: &RendererConfig,
    ) -> Result<(), RenderError> {
        let selection = doc.selection();
        if selection.range_count() == 0 {
            self.remove_dom_selection(tree, converter);
            self.remove_fake_selection(tree)?;
            return Ok(());
        }

        let Some(editable) = selection.editable_element(doc) else {
            return Ok(());
        };
        let Some(dom_root) = converter.map_view_to_dom(editable) else {
            log::trace!(target: "view.selection", "editable {editable} is not rendered");
            return Ok(());
        };
        if !doc.is_focused() {
            return Ok(());
        }

        if selection.is_fake() {
            self.apply_fake_selection(doc, tree, converter, config, dom_root)
        } else if self
            .fake_container
            .is_some_and(|container| tree.is_connected(container))
        {
            self.remove_fake_selection(tree)?;
            self.apply_dom_selection(doc, tree, converter, dom_root)
        } else {
            self.apply_dom_selection(doc, tree, converter, dom_root)
        }
    }

    /// Whether the native selection has to be rewritten to match the view.
    pub fn needs_dom_update<C: Converter + ?Sized>(
        &self,
        doc: &ViewDocument,
        tree: &DomTree,
        converter: &C,
    ) -> bool {
        if !converter.is_dom_selection_correct(doc, tree) {
            return true;
        }
        let selection = doc.selection();
        let native = converter.dom_selection_to_view(doc, tree);
        if selection.is_equal(&native) {
            return false;
        }
        if !selection.is_collapsed() && selection.is_similar(&native, doc) {
            return false;
        }
        true
    }

    /// Focus the editable root, then set the native selection from the view
    /// anchor and focus.
    pub fn apply_dom_selection<C: Converter + ?Sized>(
        &mut self,
        doc: &ViewDocument,
        tree: &mut DomTree,
        converter: &mut C,
        dom_root: DomId,
    ) -> Result<(), RenderError> {
        if !self.needs_dom_update(doc, tree, converter) {
            log::trace!(target: "view.selection", "native selection already matches");
            return Ok(());
        }
        let selection = doc.selection();
        let anchor = selection
            .anchor()
            .and_then(|p| converter.view_position_to_dom(doc, tree, p));
        let focus = selection
            .focus()
            .and_then(|p| converter.view_position_to_dom(doc, tree, p));
        let (Some(anchor), Some(focus)) = (anchor, focus) else {
            log::trace!(target: "view.selection", "selection boundaries are not rendered");
            return Ok(());
        };
        if tree.active_element() != Some(dom_root) {
            tree.focus(dom_root)?;
        }
        tree.collapse(anchor)?;
        tree.extend(focus)?;
        log::debug!(target: "view.selection", "native selection set to {anchor} .. {focus}");
        Ok(())
    }

    /// Whether the fake selection container has to be (re)rendered.
    pub fn needs_fake_selection_update(
        &self,
        doc: &ViewDocument,
        tree: &DomTree,
        config: &RendererConfig,
        dom_root: DomId,
    ) -> bool {
        let Some(container) = self.fake_container else {
            return true;
        };
        if tree.parent(container) != Some(dom_root) {
            return true;
        }
        let anchor_inside = tree
            .selection()
            .anchor()
            .is_some_and(|a| tree.contains(container, a.node));
        if !anchor_inside {
            return true;
        }
        tree.text_content(container) != effective_label(doc, config)
    }

    /// Render the fake selection: the hidden container, labelled and fully
    /// selected, inside the editable root.
    pub fn apply_fake_selection<C: Converter + ?Sized>(
        &mut self,
        doc: &ViewDocument,
        tree: &mut DomTree,
        converter: &mut C,
        config: &RendererConfig,
        dom_root: DomId,
    ) -> Result<(), RenderError> {
        let container = match self.fake_container {
            Some(container) => container,
            None => {
                let container = tree.create_element("div");
                tree.set_attribute(container, "class", &config.fake_selection_class)?;
                tree.set_attribute(container, "style", FAKE_SELECTION_STYLE)?;
                self.fake_container = Some(container);
                container
            }
        };
        converter.bind_fake_selection(container, doc.selection().clone());

        if !self.needs_fake_selection_update(doc, tree, config, dom_root) {
            log::trace!(target: "view.selection", "fake selection container up to date");
            return Ok(());
        }
        if tree.parent(container) != Some(dom_root) {
            tree.append_child(dom_root, container)?;
        }
        let label = effective_label(doc, config);
        if tree.text_content(container) != label {
            tree.set_text_content(container, label)?;
        }
        tree.remove_all_ranges();
        tree.select_node_contents(container)?;
        log::debug!(target: "view.selection", "fake selection rendered with label {label:?}");
        Ok(())
    }

    /// Clear the native selection, but only while focus is inside content the
    /// view owns.
    pub fn remove_dom_selection<C: Converter + ?Sized>(&self, tree: &mut DomTree, converter: &C) {
        if tree.selection().range_count() == 0 {
            return;
        }
        let owned = tree
            .active_element()
            .and_then(|active| converter.map_dom_to_view(active))
            .is_some();
        if owned {
            tree.remove_all_ranges();
        }
    }

    pub fn remove_fake_selection(&self, tree: &mut DomTree) -> Result<(), RenderError> {
        if let Some(container) = self.fake_container {
            tree.remove(container)?;
        }
        Ok(())
    }

    /// Move focus to the selection's editable root when the view is focused.
    pub fn update_focus<C: Converter + ?Sized>(
        &self,
        doc: &ViewDocument,
        tree: &mut DomTree,
        converter: &C,
    ) -> Result<(), RenderError> {
        if !doc.is_focused() {
            return Ok(());
        }
        if let Some(editable) = doc.selection().editable_element(doc) {
            converter.focus(tree, editable)?;
        }
        Ok(())
    }
}

fn effective_label<'a>(doc: &'a ViewDocument, config: &'a RendererConfig) -> &'a str {
    let label = doc.selection().fake_label();
    if label.is_empty() {
        &config.fake_selection_label
    } else {
        label
    }
}
