mod common;

use std::panic::{AssertUnwindSafe, catch_unwind};

use common::{Editor, bold_runs};
use core_types::{DomId, ViewId};
use dom::{DomError, DomMutation, DomTree};
use renderer::{
    ChangeType, Converter, CreateOptions, DomConverter, RenderError, RenderPhase, Renderer, RendererConfig,
};
use view::{ElementRole, ViewDocument, ViewSelection, ViewWriter};

#[test]
fn first_render_builds_tree_and_block_fillers() {
    let mut editor = Editor::new();
    let p = editor.element("p", ElementRole::Container);
    let root = editor.root;
    editor.append(root, p);
    editor.render();
    assert_eq!(editor.markup(), "<p><br data-view-filler=\"true\"></p>");
    assert!(editor.renderer.dirty().is_empty());

    editor.tree.take_journal();
    editor.writer().insert_text(view::ViewPosition::new(p, 0), "a").unwrap();
    editor.render();
    assert_eq!(editor.markup(), "<p>a</p>");
    let journal = editor.tree.take_journal();
    assert_eq!(journal.len(), 2);
    assert!(matches!(journal[0], DomMutation::Remove { .. }));
    assert!(matches!(journal[1], DomMutation::Insert { index: 0, .. }));
}

#[test]
fn appended_text_is_a_single_insert_data() {
    let mut editor = Editor::new();
    let runs = bold_runs(&mut editor);
    let dom_foo = editor.dom_text(runs.foo);

    editor.writer().set_text(runs.foo, "foox").unwrap();
    editor.render();
    assert_eq!(
        editor.tree.take_journal(),
        vec![DomMutation::InsertData {
            node: dom_foo,
            offset: 3,
            data: "x".to_string(),
        }]
    );
    assert_eq!(editor.markup(), "<p><strong>foox</strong><strong>bar</strong></p>");
}

#[test]
fn replaced_elements_reuse_live_nodes_of_the_same_tag() {
    let mut editor = Editor::new();
    let root = editor.root;
    let mut old = Vec::new();
    for (name, role, data) in [
        ("div", ElementRole::Container, "a"),
        ("span", ElementRole::Attribute, "b"),
        ("div", ElementRole::Container, "c"),
    ] {
        let element = editor.element(name, role);
        let text = editor.text(data);
        editor.append(element, text);
        editor.append(root, element);
        old.push(element);
    }
    editor.render();
    let live: Vec<DomId> = old.iter().map(|v| editor.dom(*v)).collect();
    editor.tree.take_journal();

    for element in &old {
        editor.writer().remove(*element).unwrap();
    }
    let span = editor.element("span", ElementRole::Attribute);
    let div = editor.element("div", ElementRole::Container);
    let b = editor.text("b");
    let c = editor.text("c");
    editor.append(span, b);
    editor.append(div, c);
    editor.append(root, span);
    editor.append(root, div);
    editor.render();

    assert_eq!(
        editor.tree.take_journal(),
        vec![DomMutation::Remove {
            parent: editor.dom_root,
            index: 0,
            node: live[0],
        }]
    );
    assert_eq!(editor.dom(span), live[1]);
    assert_eq!(editor.dom(div), live[2]);
    let converter = editor.renderer.converter();
    assert_eq!(converter.map_dom_to_view(live[0]), None);
    assert_eq!(converter.map_view_to_dom(old[0]), None);
    assert_eq!(converter.map_view_to_dom(old[1]), None);
    assert_eq!(editor.markup(), "<span>b</span><div>c</div>");
}

#[test]
fn reordered_children_are_moved_not_recreated() {
    let mut editor = Editor::new();
    let runs = bold_runs(&mut editor);
    let dom_s1 = editor.dom(runs.s1);
    let dom_s2 = editor.dom(runs.s2);

    editor.writer().insert(runs.p, 0, runs.s2).unwrap();
    editor.render();
    assert_eq!(editor.tree.children(editor.dom(runs.p)), &[dom_s2, dom_s1]);
    assert_eq!(editor.markup(), "<p><strong>bar</strong><strong>foo</strong></p>");
    let structural = editor
        .tree
        .take_journal()
        .into_iter()
        .filter(DomMutation::is_structural)
        .count();
    assert_eq!(structural, 2);
}

#[test]
fn attribute_patch_is_idempotent() {
    let mut editor = Editor::new();
    let runs = bold_runs(&mut editor);
    editor.writer().set_attribute(runs.p, "class", "lead").unwrap();
    editor.render();
    assert_eq!(editor.tree.take_journal().len(), 1);
    assert_eq!(editor.tree.attribute(editor.dom(runs.p), "class"), Some("lead"));

    assert!(editor.renderer.mark(&editor.doc, ChangeType::Attributes, runs.p));
    editor.render();
    assert!(editor.tree.journal().is_empty());

    editor.writer().remove_attribute(runs.p, "class").unwrap();
    editor.render();
    assert_eq!(
        editor.tree.take_journal(),
        vec![DomMutation::RemoveAttribute {
            node: editor.dom(runs.p),
            key: "class".to_string(),
        }]
    );
}

#[test]
fn changes_to_unrendered_nodes_are_ignored() {
    let mut editor = Editor::new();
    let p = editor.element("p", ElementRole::Container);
    let text = editor.text("x");
    editor.append(p, text);
    assert!(!editor.renderer.dirty().children.contains(&p));
    assert!(!editor.renderer.mark(&editor.doc, ChangeType::Text, text));
}

#[test]
fn replaced_text_reuses_live_text_node() {
    let mut editor = Editor::new();
    let p = editor.element("p", ElementRole::Container);
    let hello = editor.text("hello");
    editor.append(p, hello);
    let root = editor.root;
    editor.append(root, p);
    editor.render();
    let live = editor.dom_text(hello);
    editor.tree.take_journal();

    editor.writer().remove(hello).unwrap();
    let help = editor.text("help");
    editor.append(p, help);
    editor.render();

    assert_eq!(
        editor.tree.take_journal(),
        vec![
            DomMutation::DeleteData {
                node: live,
                offset: 3,
                count: 2,
            },
            DomMutation::InsertData {
                node: live,
                offset: 3,
                data: "p".to_string(),
            },
        ]
    );
    assert_eq!(editor.dom_text(help), live);
    assert_eq!(editor.markup(), "<p>help</p>");
}

#[test]
fn removed_subtrees_lose_their_mappings() {
    let mut editor = Editor::new();
    let runs = bold_runs(&mut editor);
    let root = editor.root;
    let before = editor.renderer.converter().mapped_len();
    editor.writer().remove(runs.p).unwrap();
    editor.render();
    assert_eq!(editor.markup(), "<br data-view-filler=\"true\">");
    assert_eq!(editor.renderer.converter().mapped_len(), before - 3);
    assert_eq!(editor.renderer.converter().map_view_to_dom(runs.s2), None);
    assert_eq!(editor.dom(root), editor.dom_root);
}

#[test]
fn opaque_elements_keep_their_content() {
    let mut editor = Editor::new();
    let root = editor.root;
    let widget = editor.element("div", ElementRole::Raw);
    let inner = editor.text("external");
    editor.append(widget, inner);
    editor.append(root, widget);
    editor.render();
    let dom_widget = editor.dom(widget);
    let foreign = editor.tree.create_element("canvas");
    editor.tree.append_child(dom_widget, foreign).unwrap();

    editor.writer().set_text(inner, "changed").unwrap();
    assert!(!editor.renderer.mark(&editor.doc, ChangeType::Children, widget));
    editor.render();
    assert_eq!(editor.markup(), "<div>external<canvas></canvas></div>");
}

/// Converter that blows up while creating nodes.
#[derive(Default)]
struct PanickingConverter {
    inner: DomConverter,
}

impl Converter for PanickingConverter {
    fn map_view_to_dom(&self, view: ViewId) -> Option<DomId> {
        self.inner.map_view_to_dom(view)
    }

    fn map_dom_to_view(&self, dom: DomId) -> Option<ViewId> {
        self.inner.map_dom_to_view(dom)
    }

    fn bind(&mut self, dom: DomId, view: ViewId) {
        self.inner.bind(dom, view)
    }

    fn unbind(&mut self, tree: &DomTree, dom: DomId) {
        self.inner.unbind(tree, dom)
    }

    fn create_dom_subtree(
        &mut self,
        _doc: &ViewDocument,
        _tree: &mut DomTree,
        _node: ViewId,
        _options: CreateOptions,
    ) -> Result<DomId, RenderError> {
        panic!("converter failure");
    }

    fn create_block_filler(&self, tree: &mut DomTree) -> Result<DomId, DomError> {
        self.inner.create_block_filler(tree)
    }

    fn is_block_filler(&self, tree: &DomTree, node: DomId) -> bool {
        self.inner.is_block_filler(tree, node)
    }

    fn bind_fake_selection(&mut self, container: DomId, selection: ViewSelection) {
        self.inner.bind_fake_selection(container, selection)
    }

    fn fake_selection_to_view(&self, container: DomId) -> Option<ViewSelection> {
        self.inner.fake_selection_to_view(container)
    }
}

#[test]
fn panicking_pass_leaves_renderer_unusable() {
    let mut doc = ViewDocument::new();
    let root = doc.create_root("div");
    let p = doc.create_element("p", ElementRole::Container);
    let mut tree = DomTree::new();
    let dom_root = tree.create_element("div");
    let mut renderer = Renderer::new(PanickingConverter::default(), RendererConfig::default());
    renderer.attach_dom_root(&doc, root, dom_root);
    ViewWriter::new(&mut doc, &mut renderer).append(root, p).unwrap();

    let outcome = catch_unwind(AssertUnwindSafe(|| renderer.render(&doc, &mut tree)));
    assert!(outcome.is_err());
    assert_eq!(renderer.phase(), RenderPhase::Rendering);
    assert!(matches!(
        renderer.render(&doc, &mut tree),
        Err(RenderError::RenderInProgress)
    ));
}
