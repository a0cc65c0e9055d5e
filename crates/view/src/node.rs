//! View node kinds.
//!
//! The view tree is a closed set of node kinds. Elements additionally carry an
//! [`ElementRole`] which decides how the renderer treats them: whether they can
//! hold a block filler, whether their children are tracked, and whether they
//! are collapsed away when comparing selections.

use std::collections::BTreeMap;
use std::sync::Arc;

use core_types::ViewId;

/// Rendering role of a view element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementRole {
    /// Block-level structure (`<p>`, `<li>`, ...).
    Container,
    /// Inline formatting wrapper (`<strong>`, `<a>`, ...).
    Attribute,
    /// Root of an editable region.
    Editable,
    /// Element that never has children (`<img>`, `<br>`).
    Empty,
    /// UI-only element. Its live content is owned by whoever rendered it.
    Ui,
    /// Element with raw live content the view does not model.
    Raw,
}

impl ElementRole {
    /// Opaque elements render their own content: their view children are not
    /// tracked and never diffed.
    #[inline]
    pub fn is_opaque(self) -> bool {
        matches!(self, ElementRole::Ui | ElementRole::Raw)
    }

    /// Roles that behave like block containers for filler purposes.
    #[inline]
    pub fn is_container(self) -> bool {
        matches!(self, ElementRole::Container | ElementRole::Editable)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    pub name: Arc<str>,
    pub role: ElementRole,
    /// Attribute order is not significant; a sorted map keeps iteration stable.
    pub attributes: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewKind {
    Element(ElementData),
    Text { data: String },
    Fragment,
}

/// Capability query over node kinds, see [`ViewNode::is`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Is {
    Element,
    Text,
    Fragment,
    Role(ElementRole),
}

#[derive(Clone, Debug)]
pub struct ViewNode {
    pub(crate) kind: ViewKind,
    pub(crate) parent: Option<ViewId>,
    pub(crate) children: Vec<ViewId>,
}

impl ViewNode {
    pub(crate) fn new(kind: ViewKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> &ViewKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<ViewId> {
        self.parent
    }

    pub fn children(&self) -> &[ViewId] {
        &self.children
    }

    pub fn is(&self, what: Is) -> bool {
        match (what, &self.kind) {
            (Is::Element, ViewKind::Element(_)) => true,
            (Is::Text, ViewKind::Text { .. }) => true,
            (Is::Fragment, ViewKind::Fragment) => true,
            (Is::Role(role), ViewKind::Element(data)) => data.role == role,
            _ => false,
        }
    }

    pub fn element(&self) -> Option<&ElementData> {
        match &self.kind {
            ViewKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<ElementRole> {
        self.element().map(|data| data.role)
    }

    pub fn name(&self) -> Option<&str> {
        self.element().map(|data| &*data.name)
    }

    pub fn data(&self) -> Option<&str> {
        match &self.kind {
            ViewKind::Text { data } => Some(data),
            _ => None,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.element()
            .and_then(|data| data.attributes.get(key))
            .map(String::as_str)
    }

    /// Offsets inside this node: chars for text, children for everything else.
    pub fn max_offset(&self) -> usize {
        match &self.kind {
            ViewKind::Text { data } => data.chars().count(),
            _ => self.children.len(),
        }
    }

    pub(crate) fn can_have_children(&self) -> bool {
        match &self.kind {
            ViewKind::Element(data) => !matches!(data.role, ElementRole::Empty),
            ViewKind::Fragment => true,
            ViewKind::Text { .. } => false,
        }
    }
}
