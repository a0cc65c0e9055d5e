use std::error::Error;

use dom::{DomTree, MarkupOptions, to_markup};
use mimalloc::MiMalloc;
use renderer::{DomConverter, INLINE_FILLER, Renderer};
use view::{ElementRole, ViewDocument, ViewPosition, ViewSelection, ViewWriter};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Renders a small document, moves the caret between two bold runs, types a
/// character there and prints the live markup after every step.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut doc = ViewDocument::new();
    let root = doc.create_root("div");
    let mut tree = DomTree::new();
    tree.record_journal(true);
    let dom_root = tree.create_element("div");
    let document = tree.document();
    tree.append_child(document, dom_root)?;

    let mut renderer: Renderer<DomConverter> = Renderer::default();
    renderer.attach_dom_root(&doc, root, dom_root);

    let p = doc.create_element("p", ElementRole::Container);
    let first = doc.create_element("strong", ElementRole::Attribute);
    let second = doc.create_element("strong", ElementRole::Attribute);
    let foo = doc.create_text("foo");
    let bar = doc.create_text("bar");
    {
        let mut writer = ViewWriter::new(&mut doc, &mut renderer);
        writer.append(first, foo)?;
        writer.append(second, bar)?;
        writer.append(p, first)?;
        writer.append(p, second)?;
        writer.append(root, p)?;
        writer.set_focused(true);
    }
    renderer.render(&doc, &mut tree)?;
    print_markup("initial", &mut tree, dom_root);

    ViewWriter::new(&mut doc, &mut renderer).set_selection(ViewSelection::collapsed(ViewPosition::new(p, 1)));
    renderer.render(&doc, &mut tree)?;
    print_markup("caret between runs", &mut tree, dom_root);

    {
        let mut writer = ViewWriter::new(&mut doc, &mut renderer);
        let caret = writer.insert_text(ViewPosition::new(p, 1), "x")?;
        writer.set_selection(ViewSelection::collapsed(caret));
    }
    renderer.render(&doc, &mut tree)?;
    print_markup("typed", &mut tree, dom_root);

    ViewWriter::new(&mut doc, &mut renderer).set_selection(ViewSelection::collapsed(ViewPosition::new(foo, 1)));
    renderer.render(&doc, &mut tree)?;
    print_markup("caret moved", &mut tree, dom_root);
    Ok(())
}

/// Logs the markup and drains the mutations that produced it.
fn print_markup(step: &str, tree: &mut DomTree, root: core_types::DomId) {
    let options = MarkupOptions::default().with_selection().with_filler(INLINE_FILLER);
    let applied = tree.take_journal().len();
    log::info!("{step} ({applied} mutations): {}", to_markup(tree, root, &options));
}
