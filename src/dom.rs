//! Owned snapshot of the rendered tree.
//!
//! The snapshot script tags every element with its pre-order index
//! (`data-h2s-node`) and reports tag, id, class, bounding box, resolved style
//! and child list. All detection and extraction runs on this value; the live
//! tree is only touched again through index-addressed session operations.

use serde::{Deserialize, Serialize};

use crate::style::ResolvedStyle;
use crate::{Error, Result};

/// Attribute the snapshot script writes on every element.
pub const NODE_ATTR: &str = "data-h2s-node";

/// A viewport-relative box in CSS pixels (`getBoundingClientRect`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PxRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PxRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Intersection with the `width × height` viewport at the origin.
    pub fn clip_to(&self, width: f64, height: f64) -> Option<PxRect> {
        let left = self.x.max(0.0);
        let top = self.y.max(0.0);
        let right = (self.x + self.width).min(width);
        let bottom = (self.y + self.height).min(height);
        let clipped = PxRect::new(left, top, right - left, bottom - top);
        if clipped.is_empty() {
            None
        } else {
            Some(clipped)
        }
    }
}

/// A child of an element: a text node or another element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DomChild {
    Text { text: String },
    Element { index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomNode {
    pub index: usize,
    pub parent: Option<usize>,
    /// Upper-case tag name (`DIV`, `SVG`, ...)
    pub tag: String,
    pub id: String,
    pub class_name: String,
    /// Resolved `src` for images
    pub src: Option<String>,
    pub rect: PxRect,
    pub style: ResolvedStyle,
    pub children: Vec<DomChild>,
}

impl DomNode {
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn id(&self) -> Option<&str> {
        if self.id.is_empty() {
            None
        } else {
            Some(&self.id)
        }
    }

    /// At least one direct text child with non-whitespace content.
    pub fn has_direct_text(&self) -> bool {
        self.children.iter().any(|c| match c {
            DomChild::Text { text } => !text.trim().is_empty(),
            DomChild::Element { .. } => false,
        })
    }

    pub fn child_elements(&self) -> impl Iterator<Item = usize> + '_ {
        self.children.iter().filter_map(|c| match c {
            DomChild::Element { index } => Some(*index),
            DomChild::Text { .. } => None,
        })
    }

    pub fn is_graphic(&self) -> bool {
        self.tag == "IMG" || self.tag == "SVG"
    }
}

/// Pre-order list of every element in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomSnapshot {
    nodes: Vec<DomNode>,
}

impl DomSnapshot {
    /// Build a snapshot, checking that indices match positions and that
    /// parents precede their children.
    pub fn from_nodes(nodes: Vec<DomNode>) -> Result<Self> {
        for (pos, node) in nodes.iter().enumerate() {
            if node.index != pos {
                return Err(Error::RenderError(format!(
                    "snapshot node at position {} reports index {}",
                    pos, node.index
                )));
            }
            if let Some(parent) = node.parent {
                if parent >= pos {
                    return Err(Error::RenderError(format!(
                        "snapshot node {} has parent {} that does not precede it",
                        pos, parent
                    )));
                }
            }
            for child in node.child_elements() {
                if child <= pos || child >= nodes.len() {
                    return Err(Error::RenderError(format!(
                        "snapshot node {} lists out-of-order child {}",
                        pos, child
                    )));
                }
            }
        }
        Ok(Self { nodes })
    }

    /// Parse the JSON produced by the snapshot script.
    pub fn from_json(json: &str) -> Result<Self> {
        let nodes: Vec<DomNode> = serde_json::from_str(json)
            .map_err(|e| Error::RenderError(format!("Malformed DOM snapshot: {}", e)))?;
        Self::from_nodes(nodes)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &DomNode {
        &self.nodes[index]
    }

    pub fn get(&self, index: usize) -> Option<&DomNode> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[DomNode] {
        &self.nodes
    }

    pub fn is_descendant_of(&self, node: usize, ancestor: usize) -> bool {
        let mut cur = self.nodes[node].parent;
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.nodes[p].parent;
        }
        false
    }

    /// Indices of every strict descendant of `index`, in document order.
    ///
    /// Pre-order makes a subtree contiguous, so the walk stops at the first
    /// node outside it.
    pub fn descendants(&self, index: usize) -> std::ops::Range<usize> {
        let mut end = index + 1;
        while end < self.nodes.len() && self.is_descendant_of(end, index) {
            end += 1;
        }
        index + 1..end
    }

    /// Whether the node or one of its ancestors is `<svg>`.
    pub fn within_svg(&self, index: usize) -> bool {
        let mut cur = Some(index);
        while let Some(i) = cur {
            if self.nodes[i].is("SVG") {
                return true;
            }
            cur = self.nodes[i].parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(index: usize, parent: Option<usize>, tag: &str, children: Vec<DomChild>) -> DomNode {
        DomNode {
            index,
            parent,
            tag: tag.into(),
            children,
            ..Default::default()
        }
    }

    fn sample() -> DomSnapshot {
        DomSnapshot::from_nodes(vec![
            node(0, None, "BODY", vec![DomChild::Element { index: 1 }, DomChild::Element { index: 3 }]),
            node(1, Some(0), "DIV", vec![DomChild::Element { index: 2 }]),
            node(2, Some(1), "P", vec![DomChild::Text { text: "hi".into() }]),
            node(3, Some(0), "SVG", vec![]),
        ])
        .unwrap()
    }

    #[test]
    fn subtree_ranges_are_contiguous() {
        let s = sample();
        assert_eq!(s.descendants(0), 1..4);
        assert_eq!(s.descendants(1), 2..3);
        assert_eq!(s.descendants(2), 3..3);
        assert!(s.is_descendant_of(2, 0));
        assert!(!s.is_descendant_of(3, 1));
    }

    #[test]
    fn direct_text_ignores_whitespace() {
        let s = sample();
        assert!(s.node(2).has_direct_text());
        let blank = node(0, None, "P", vec![DomChild::Text { text: " \n ".into() }]);
        assert!(!blank.has_direct_text());
    }

    #[test]
    fn rejects_misordered_nodes() {
        let err = DomSnapshot::from_nodes(vec![node(1, None, "BODY", vec![])]).unwrap_err();
        assert!(err.to_string().contains("reports index"));
    }

    #[test]
    fn parses_script_json() {
        let json = r#"[
            {"index":0,"parent":null,"tag":"BODY","rect":{"x":0,"y":0,"width":960,"height":540},
             "style":{"display":"block","backgroundColor":"rgb(255, 255, 255)"},
             "children":[{"kind":"text","text":"Hello"}]}
        ]"#;
        let s = DomSnapshot::from_json(json).unwrap();
        assert_eq!(s.node(0).rect.width, 960.0);
        assert_eq!(s.node(0).style.background_color, "rgb(255, 255, 255)");
        assert!(s.node(0).has_direct_text());
    }

    #[test]
    fn clipping_to_viewport() {
        let r = PxRect::new(-20.0, 10.0, 100.0, 50.0);
        assert_eq!(r.clip_to(960.0, 540.0), Some(PxRect::new(0.0, 10.0, 80.0, 50.0)));
        assert_eq!(PxRect::new(1000.0, 0.0, 10.0, 10.0).clip_to(960.0, 540.0), None);
    }

    #[test]
    fn svg_ancestry() {
        let s = sample();
        assert!(s.within_svg(3));
        assert!(!s.within_svg(2));
    }
}
