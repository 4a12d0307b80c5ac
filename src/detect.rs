//! Component and graphic detection over a DOM snapshot.

use serde::Serialize;

use crate::dom::{DomNode, DomSnapshot, PxRect};
use crate::style::{is_decorative, is_visually_styled};

/// Minimum width and height (CSS px) for a non-decorative component.
pub const MIN_COMPONENT_PX: f64 = 60.0;

/// Tags that only carry text; they become components only when styled.
pub const TEXT_ONLY_TAGS: &[&str] = &["P", "H1", "H2", "H3", "H4", "H5", "H6", "SPAN", "A", "STRONG", "EM", "B", "I"];

const ROOT_TAGS: &[&str] = &["HTML", "BODY"];

/// A visually self-contained node to capture as a skeleton image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub node: usize,
    pub id: String,
    pub rect: PxRect,
}

/// An image or inline SVG captured on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graphic {
    pub node: usize,
    pub id: String,
    pub rect: PxRect,
}

fn renders(node: &DomNode) -> bool {
    node.style.is_visible() && !node.rect.is_empty()
}

/// `(styled AND ≥ 60×60) OR decorative`, for visible non-root nodes whose
/// tag is not a bare text tag.
pub fn qualifies(node: &DomNode) -> bool {
    if ROOT_TAGS.contains(&node.tag.as_str()) || !renders(node) {
        return false;
    }
    let styled = is_visually_styled(&node.style);
    if TEXT_ONLY_TAGS.contains(&node.tag.as_str()) && !styled {
        return false;
    }
    let significant = node.rect.width >= MIN_COMPONENT_PX && node.rect.height >= MIN_COMPONENT_PX;
    (styled && significant) || is_decorative(&node.style)
}

fn stable_id(node: &DomNode, prefix: &str) -> String {
    match node.id() {
        Some(id) => id.to_string(),
        None => format!("{}-{}", prefix, node.index),
    }
}

/// Every qualifying node, in document order.
pub fn detect_components(snapshot: &DomSnapshot) -> Vec<Component> {
    snapshot
        .nodes()
        .iter()
        .filter(|n| qualifies(n))
        .map(|n| Component {
            node: n.index,
            id: stable_id(n, "pptx-comp"),
            rect: n.rect,
        })
        .collect()
}

/// Visible images and SVGs that are not components themselves.
///
/// Graphics inside a component are kept: the skeleton hides them, so they
/// must be captured separately.
pub fn detect_graphics(snapshot: &DomSnapshot, components: &[Component]) -> Vec<Graphic> {
    snapshot
        .nodes()
        .iter()
        .filter(|n| n.is_graphic() && renders(n))
        .filter(|n| !components.iter().any(|c| c.node == n.index))
        .map(|n| Graphic {
            node: n.index,
            id: stable_id(n, "pptx-img"),
            rect: n.rect,
        })
        .collect()
}

/// `(node, id)` pairs for nodes whose id was generated here.
pub fn generated_ids<'a, I>(snapshot: &DomSnapshot, items: I) -> Vec<(usize, String)>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    items
        .into_iter()
        .filter(|(node, _)| snapshot.node(*node).id().is_none())
        .map(|(node, id)| (node, id.to_string()))
        .collect()
}
