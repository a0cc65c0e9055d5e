#![allow(dead_code)]

use core_types::{DomId, ViewId};
use dom::{DomTree, MarkupOptions, inner_markup};
use renderer::{Converter, DomConverter, INLINE_FILLER, Renderer};
use view::{ElementRole, ViewDocument, ViewPosition, ViewSelection, ViewWriter};

/// A view document with one editable root, rendered into a connected live
/// `<div>`.
pub struct Editor {
    pub doc: ViewDocument,
    pub tree: DomTree,
    pub renderer: Renderer<DomConverter>,
    pub root: ViewId,
    pub dom_root: DomId,
}

impl Editor {
    pub fn new() -> Self {
        let mut doc = ViewDocument::new();
        let root = doc.create_root("div");
        let mut tree = DomTree::new();
        tree.record_journal(true);
        let dom_root = tree.create_element("div");
        let document = tree.document();
        tree.append_child(document, dom_root).unwrap();
        let mut renderer = Renderer::default();
        renderer.attach_dom_root(&doc, root, dom_root);
        Self {
            doc,
            tree,
            renderer,
            root,
            dom_root,
        }
    }

    pub fn writer(&mut self) -> ViewWriter<'_, Renderer<DomConverter>> {
        ViewWriter::new(&mut self.doc, &mut self.renderer)
    }

    pub fn element(&mut self, name: &str, role: ElementRole) -> ViewId {
        self.doc.create_element(name, role)
    }

    pub fn text(&mut self, data: &str) -> ViewId {
        self.doc.create_text(data)
    }

    pub fn append(&mut self, parent: ViewId, child: ViewId) {
        self.writer().append(parent, child).unwrap();
    }

    pub fn select(&mut self, at: ViewPosition) {
        self.writer().set_selection(ViewSelection::collapsed(at));
    }

    pub fn render(&mut self) {
        self.renderer.render(&self.doc, &mut self.tree).unwrap();
    }

    pub fn dom(&self, view: ViewId) -> DomId {
        self.renderer.converter().map_view_to_dom(view).unwrap()
    }

    pub fn dom_text(&self, view: ViewId) -> DomId {
        self.renderer
            .converter()
            .find_dom_text(&self.doc, &self.tree, view)
            .unwrap()
    }

    /// Children of the live root, with the selection and the inline filler
    /// made visible.
    pub fn markup(&self) -> String {
        let options = MarkupOptions::default()
            .with_selection()
            .with_filler(INLINE_FILLER);
        inner_markup(&self.tree, self.dom_root, &options)
    }
}

pub struct BoldRuns {
    pub p: ViewId,
    pub s1: ViewId,
    pub s2: ViewId,
    pub foo: ViewId,
    pub bar: ViewId,
}

/// `<p><strong>foo</strong><strong>bar</strong></p>`, rendered, view focused.
pub fn bold_runs(editor: &mut Editor) -> BoldRuns {
    let p = editor.element("p", ElementRole::Container);
    let s1 = editor.element("strong", ElementRole::Attribute);
    let s2 = editor.element("strong", ElementRole::Attribute);
    let foo = editor.text("foo");
    let bar = editor.text("bar");
    editor.append(s1, foo);
    editor.append(s2, bar);
    editor.append(p, s1);
    editor.append(p, s2);
    let root = editor.root;
    editor.append(root, p);
    editor.writer().set_focused(true);
    editor.render();
    editor.tree.take_journal();
    BoldRuns { p, s1, s2, foo, bar }
}
