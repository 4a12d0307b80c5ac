#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use html2slide::dom::{DomChild, DomNode, DomSnapshot, PxRect};
use html2slide::session::{CaptureBackground, CaptureRequest, RenderSession, RootMetrics};
use html2slide::style::ResolvedStyle;
use html2slide::suppress::SuppressionPlan;
use html2slide::{Error, Result};

/// Smallest valid PNG signature, enough for the files to be non-empty.
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub fn visible(display: &str) -> ResolvedStyle {
    ResolvedStyle {
        display: display.into(),
        visibility: "visible".into(),
        opacity: "1".into(),
        position: "static".into(),
        color: "rgb(0, 0, 0)".into(),
        background_color: "rgba(0, 0, 0, 0)".into(),
        background_image: "none".into(),
        border_top_width: "0px".into(),
        border_right_width: "0px".into(),
        border_bottom_width: "0px".into(),
        border_left_width: "0px".into(),
        border_radius: "0px".into(),
        box_shadow: "none".into(),
        backdrop_filter: "none".into(),
        font_family: "Arial, sans-serif".into(),
        font_weight: "400".into(),
        font_style: "normal".into(),
        font_size: "16px".into(),
        text_decoration: "none".into(),
        text_transform: "none".into(),
        text_align: "left".into(),
        line_height: "normal".into(),
        margin_top: "0px".into(),
        margin_bottom: "0px".into(),
        padding_left: "0px".into(),
        transform: "none".into(),
        ..Default::default()
    }
}

/// Builds a pre-order node list; nodes must be added in document order.
pub struct Doc {
    nodes: Vec<DomNode>,
}

impl Doc {
    /// `<html><body>` with a body of the given size.
    pub fn new(width: f64, height: f64) -> Self {
        let html = DomNode {
            index: 0,
            tag: "HTML".into(),
            rect: PxRect::new(0.0, 0.0, width, height),
            style: visible("block"),
            children: vec![DomChild::Element { index: 1 }],
            ..Default::default()
        };
        let mut body_style = visible("block");
        body_style.background_color = "rgb(255, 255, 255)".into();
        let body = DomNode {
            index: 1,
            parent: Some(0),
            tag: "BODY".into(),
            rect: PxRect::new(0.0, 0.0, width, height),
            style: body_style,
            ..Default::default()
        };
        Doc { nodes: vec![html, body] }
    }

    pub const BODY: usize = 1;

    pub fn el(&mut self, parent: usize, tag: &str, rect: (f64, f64, f64, f64)) -> usize {
        let index = self.nodes.len();
        let display = match tag {
            "SPAN" | "STRONG" | "EM" | "B" | "I" | "A" | "IMG" | "SVG" => "inline",
            "LI" => "list-item",
            _ => "block",
        };
        self.nodes.push(DomNode {
            index,
            parent: Some(parent),
            tag: tag.into(),
            rect: PxRect::new(rect.0, rect.1, rect.2, rect.3),
            style: visible(display),
            ..Default::default()
        });
        self.nodes[parent].children.push(DomChild::Element { index });
        index
    }

    pub fn text(&mut self, parent: usize, text: &str) -> &mut Self {
        self.nodes[parent].children.push(DomChild::Text { text: text.into() });
        self
    }

    pub fn style(&mut self, node: usize) -> &mut ResolvedStyle {
        &mut self.nodes[node].style
    }

    pub fn node(&mut self, node: usize) -> &mut DomNode {
        &mut self.nodes[node]
    }

    pub fn build(self) -> Vec<DomNode> {
        self.nodes
    }
}

/// Record of what a fake session was asked to do.
#[derive(Debug, Default)]
pub struct Journal {
    pub calls: Vec<String>,
    pub captures: Vec<CaptureRecord>,
    pub active: HashMap<u64, usize>,
    pub closed: bool,
}

#[derive(Debug, Clone)]
pub struct CaptureRecord {
    pub clip: PxRect,
    pub scale: f64,
    pub background: CaptureBackground,
    /// Directives in force while the capture ran
    pub suppressed: usize,
}

/// In-memory `RenderSession` over a fixed node list.
pub struct FakeSession {
    pub metrics: RootMetrics,
    pub nodes: Vec<DomNode>,
    pub fail_capture_at: Option<usize>,
    /// Record the plan as applied, then report failure
    pub fail_apply: bool,
    pub journal: Arc<Mutex<Journal>>,
    loaded: bool,
}

impl FakeSession {
    pub fn new(nodes: Vec<DomNode>, width: f64, height: f64) -> Self {
        Self {
            metrics: RootMetrics {
                width,
                height,
                scroll_width: width,
                scroll_height: height,
            },
            nodes,
            fail_capture_at: None,
            fail_apply: false,
            journal: Arc::new(Mutex::new(Journal::default())),
            loaded: false,
        }
    }

    pub fn journal(&self) -> Arc<Mutex<Journal>> {
        self.journal.clone()
    }

    fn log(&self, call: impl Into<String>) {
        self.journal.lock().unwrap().calls.push(call.into());
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(Error::RenderError("no document loaded".into()))
        }
    }
}

impl RenderSession for FakeSession {
    fn load(&mut self, url: &str) -> Result<()> {
        if !url.starts_with("file://") {
            return Err(Error::LoadError(format!("unexpected url {}", url)));
        }
        self.loaded = true;
        self.log("load");
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        self.ensure_loaded()?;
        let j = self.journal.lock().unwrap();
        assert!(j.active.is_empty(), "reload with a plan still applied");
        drop(j);
        self.log("reload");
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32) -> Result<()> {
        self.log(format!("viewport {}x{}", width, height));
        Ok(())
    }

    fn measure_root(&mut self) -> Result<RootMetrics> {
        self.ensure_loaded()?;
        self.log("measure");
        Ok(self.metrics)
    }

    fn snapshot(&mut self) -> Result<DomSnapshot> {
        self.ensure_loaded()?;
        self.log("snapshot");
        DomSnapshot::from_nodes(self.nodes.clone())
    }

    fn assign_ids(&mut self, ids: &[(usize, String)]) -> Result<()> {
        for (node, id) in ids {
            if self.nodes[*node].id.is_empty() {
                self.nodes[*node].id = id.clone();
            }
        }
        self.log(format!("assign {}", ids.len()));
        Ok(())
    }

    fn apply_plan(&mut self, plan: &SuppressionPlan) -> Result<()> {
        self.journal
            .lock()
            .unwrap()
            .active
            .insert(plan.token, plan.directives.len());
        self.log(format!("apply {}", plan.token));
        if self.fail_apply {
            return Err(Error::ScriptError("apply script threw".into()));
        }
        Ok(())
    }

    fn restore_plan(&mut self, plan: &SuppressionPlan) -> Result<()> {
        self.journal.lock().unwrap().active.remove(&plan.token);
        self.log(format!("restore {}", plan.token));
        Ok(())
    }

    fn node_rect(&mut self, node: usize) -> Result<Option<PxRect>> {
        Ok(self.nodes.get(node).map(|n| n.rect))
    }

    fn capture(&mut self, request: &CaptureRequest) -> Result<Vec<u8>> {
        let mut j = self.journal.lock().unwrap();
        let n = j.captures.len();
        if self.fail_capture_at == Some(n) {
            return Err(Error::CaptureError("screenshot timed out".into()));
        }
        let suppressed = j.active.values().sum();
        j.captures.push(CaptureRecord {
            clip: request.clip,
            scale: request.scale,
            background: request.background,
            suppressed,
        });
        j.calls.push("capture".into());
        Ok(PNG.to_vec())
    }

    fn close(self) -> Result<()> {
        let mut j = self.journal.lock().unwrap();
        j.closed = true;
        j.calls.push("close".into());
        Ok(())
    }
}

/// Write a placeholder HTML file; the fake session never reads it.
pub fn html_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "<html><body></body></html>").unwrap();
    path
}

/// A 960×540 slide: a styled card holding a heading and an icon, a
/// standalone photo, a paragraph, a bullet list and a chart placeholder.
pub fn sample_slide() -> Vec<DomNode> {
    let mut doc = Doc::new(960.0, 540.0);

    let card = doc.el(Doc::BODY, "DIV", (40.0, 40.0, 400.0, 200.0));
    doc.style(card).background_color = "rgb(240, 244, 255)".into();
    doc.style(card).border_radius = "12px".into();
    let h2 = doc.el(card, "H2", (60.0, 60.0, 360.0, 40.0));
    doc.text(h2, "Quarterly Results");
    doc.style(h2).font_size = "32px".into();
    doc.style(h2).font_weight = "700".into();
    let icon = doc.el(card, "SVG", (60.0, 120.0, 24.0, 24.0));
    let _ = icon;

    let photo = doc.el(Doc::BODY, "IMG", (500.0, 40.0, 400.0, 300.0));
    doc.node(photo).src = Some("file:///tmp/photo.png".into());

    let p = doc.el(Doc::BODY, "P", (40.0, 280.0, 400.0, 24.0));
    doc.text(p, "Revenue grew ");
    let strong = doc.el(p, "STRONG", (140.0, 280.0, 40.0, 24.0));
    doc.style(strong).font_weight = "700".into();
    doc.text(strong, "18%");
    doc.text(p, " year over year.");

    let ul = doc.el(Doc::BODY, "UL", (40.0, 320.0, 400.0, 60.0));
    doc.style(ul).padding_left = "32px".into();
    let li1 = doc.el(ul, "LI", (72.0, 320.0, 368.0, 24.0));
    doc.text(li1, "• Revenue Growth");
    let li2 = doc.el(ul, "LI", (72.0, 344.0, 368.0, 24.0));
    doc.text(li2, "Margin expansion");

    let chart = doc.el(Doc::BODY, "DIV", (500.0, 360.0, 400.0, 150.0));
    doc.node(chart).class_name = "chart-placeholder".into();
    doc.node(chart).id = "revenue-chart".into();

    doc.build()
}
