//! Text, list and placeholder extraction from an unmodified snapshot.
//!
//! Nodes are visited in document order. A node already merged into an
//! ancestor's runs is skipped; every other visible node is checked in turn
//! for being a placeholder, a graphic, a list, or a block with its own text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::dom::{DomChild, DomNode, DomSnapshot};
use crate::geometry::Frame;
use crate::style::{StyleRecord, TextTransform};
use crate::units;
use crate::ExtractionMode;

/// A span of text sharing one style, or a line break.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub style: StyleRecord,
    /// Break the line after this run
    pub break_line: bool,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: StyleRecord) -> Self {
        Self {
            text: text.into(),
            style,
            break_line: false,
        }
    }

    /// Zero-width run that only breaks the line.
    pub fn line_break(style: &StyleRecord) -> Self {
        let mut style = style.clone();
        style.para_space_before = 0.0;
        style.para_space_after = 0.0;
        Self {
            text: String::new(),
            style,
            break_line: true,
        }
    }

    fn is_break(&self) -> bool {
        self.break_line && self.text.is_empty()
    }
}

/// A positioned unit of slide content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentElement {
    Text {
        frame: Frame,
        style: StyleRecord,
        runs: Vec<TextRun>,
    },
    List {
        frame: Frame,
        style: StyleRecord,
        items: Vec<TextRun>,
    },
    Image {
        frame: Frame,
        src: String,
    },
}

impl ContentElement {
    pub fn frame(&self) -> Frame {
        match self {
            ContentElement::Text { frame, .. }
            | ContentElement::List { frame, .. }
            | ContentElement::Image { frame, .. } => *frame,
        }
    }

    /// Runs of a text or list element.
    pub fn runs(&self) -> &[TextRun] {
        match self {
            ContentElement::Text { runs, .. } => runs,
            ContentElement::List { items, .. } => items,
            ContentElement::Image { .. } => &[],
        }
    }

    /// Concatenated run text.
    pub fn plain_text(&self) -> String {
        self.runs().iter().map(|r| r.text.as_str()).collect()
    }
}

/// A region reserved for the caller (charts, tables, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placeholder {
    pub id: String,
    #[serde(flatten)]
    pub frame: Frame,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    pub elements: Vec<ContentElement>,
    pub placeholders: Vec<Placeholder>,
}

const BLOCK_DISPLAYS: &[&str] = &["block", "flex", "grid", "table", "table-row", "list-item"];
const BLOCK_TAGS: &[&str] = &[
    "DIV", "P", "H1", "H2", "H3", "H4", "H5", "H6", "UL", "OL", "LI", "TABLE", "TR", "TD", "TH", "BLOCKQUOTE",
];

pub fn is_block(node: &DomNode) -> bool {
    BLOCK_DISPLAYS.contains(&node.style.display.as_str()) || BLOCK_TAGS.contains(&node.tag.as_str())
}

/// Class attribute contains the literal `placeholder`.
pub fn is_placeholder(node: &DomNode) -> bool {
    node.class_name.contains("placeholder")
}

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[•\-\*▪▸]\s*").expect("valid bullet pattern"));

/// Drop an authored bullet glyph at the start of an item.
pub fn strip_bullet(text: &str) -> String {
    BULLET_RE.replace(text, "").into_owned()
}

/// Merge same-style neighbours and trim whitespace at both ends.
///
/// Whitespace-only runs at the edges are dropped; interior ones are kept
/// since they separate differently styled words.
pub fn normalize_runs(runs: Vec<TextRun>) -> Vec<TextRun> {
    let mut merged: Vec<TextRun> = Vec::with_capacity(runs.len());
    for mut run in runs {
        if let Some(last) = merged.last_mut() {
            if !last.break_line && last.text.ends_with(' ') && run.text.starts_with(' ') {
                run.text.remove(0);
            }
            if !last.break_line && !run.break_line && last.style == run.style {
                last.text.push_str(&run.text);
                continue;
            }
        }
        if run.text.is_empty() && !run.break_line {
            continue;
        }
        merged.push(run);
    }

    while let Some(first) = merged.iter().position(|r| !r.is_break()) {
        let trimmed = merged[first].text.trim_start().to_string();
        if trimmed.is_empty() && !merged[first].break_line {
            merged.remove(first);
            continue;
        }
        merged[first].text = trimmed;
        break;
    }
    while let Some(last) = merged.iter().rposition(|r| !r.is_break()) {
        let trimmed = merged[last].text.trim_end().to_string();
        if trimmed.is_empty() && !merged[last].break_line {
            merged.remove(last);
            continue;
        }
        merged[last].text = trimmed;
        break;
    }
    merged
}

fn has_visible_text(runs: &[TextRun]) -> bool {
    runs.iter().any(|r| !r.text.trim().is_empty())
}

/// Resolve an image `src` to a local path when it is a file URL.
pub fn image_path(src: &str) -> String {
    match url::Url::parse(src) {
        Ok(u) if u.scheme() == "file" => match u.to_file_path() {
            Ok(path) => path.display().to_string(),
            Err(()) => src.to_string(),
        },
        _ => src.to_string(),
    }
}

struct Extractor<'a> {
    snapshot: &'a DomSnapshot,
    mode: ExtractionMode,
    consumed: Vec<bool>,
    out: Extraction,
}

/// Walk the snapshot and collect text, list, image and placeholder elements.
pub fn extract(snapshot: &DomSnapshot, mode: ExtractionMode) -> Extraction {
    let mut ex = Extractor {
        snapshot,
        mode,
        consumed: vec![false; snapshot.len()],
        out: Extraction::default(),
    };
    for index in 0..snapshot.len() {
        ex.visit(index);
    }
    ex.out
}

impl<'a> Extractor<'a> {
    fn visit(&mut self, index: usize) {
        if self.consumed[index] {
            return;
        }
        let snapshot = self.snapshot;
        let node = snapshot.node(index);
        if !node.style.is_visible() {
            return;
        }

        if is_placeholder(node) {
            if !node.rect.is_empty() {
                let id = match node.id() {
                    Some(id) => id.to_string(),
                    None => format!("placeholder-{}", self.out.placeholders.len()),
                };
                self.out.placeholders.push(Placeholder {
                    id,
                    frame: Frame::from_px(&node.rect),
                });
            }
            self.consumed[index] = true;
            for d in snapshot.descendants(index) {
                self.consumed[d] = true;
            }
            return;
        }

        if node.is_graphic() || snapshot.within_svg(index) {
            if self.mode == ExtractionMode::Flat && node.is("IMG") && !node.rect.is_empty() {
                if let Some(src) = node.src.as_deref().filter(|s| !s.is_empty()) {
                    self.out.elements.push(ContentElement::Image {
                        frame: Frame::from_px(&node.rect),
                        src: image_path(src),
                    });
                }
            }
            return;
        }

        if node.is("UL") || node.is("OL") {
            self.list(index);
            return;
        }

        if node.has_direct_text() {
            self.text(index);
            self.consumed[index] = true;
        }
    }

    fn text(&mut self, index: usize) {
        let snapshot = self.snapshot;
        let node = snapshot.node(index);
        if node.rect.is_empty() {
            return;
        }
        let style = StyleRecord::for_element(&node.style);
        let mut runs = Vec::new();
        self.inline_runs(index, &style, &mut runs);
        let runs = normalize_runs(runs);
        if !has_visible_text(&runs) {
            return;
        }
        self.out.elements.push(ContentElement::Text {
            frame: Frame::from_px(&node.rect),
            style,
            runs,
        });
    }

    fn list(&mut self, index: usize) {
        let snapshot = self.snapshot;
        let node = snapshot.node(index);
        let items: Vec<usize> = node.child_elements().filter(|&c| snapshot.node(c).is("LI")).collect();
        if items.is_empty() {
            return;
        }
        self.consumed[index] = true;

        let indent = units::parse_pt(&node.style.padding_left).unwrap_or(0.0) * 0.5;
        let mut emitted: Vec<Vec<TextRun>> = Vec::new();
        for &li in &items {
            self.consumed[li] = true;
            let li_node = snapshot.node(li);
            if !li_node.style.is_visible() {
                continue;
            }
            let base = StyleRecord::for_element(&li_node.style);
            let mut runs = Vec::new();
            self.inline_runs(li, &base, &mut runs);
            let mut runs = normalize_runs(runs);
            if runs.is_empty() {
                continue;
            }
            runs[0].text = strip_bullet(&runs[0].text);
            runs[0].style.bullet_indent = Some(indent);
            emitted.push(runs);
        }
        let count = emitted.len();
        let mut all = Vec::new();
        for (k, mut runs) in emitted.into_iter().enumerate() {
            if k + 1 < count {
                if let Some(last) = runs.last_mut() {
                    last.break_line = true;
                }
            }
            all.extend(runs);
        }

        if node.rect.is_empty() || !has_visible_text(&all) {
            return;
        }
        let first = snapshot.node(items[0]);
        let mut style = StyleRecord::for_element(&first.style);
        style.para_space_before = units::parse_pt(&first.style.margin_top).unwrap_or(0.0);
        style.para_space_after = units::parse_pt(&first.style.margin_bottom).unwrap_or(0.0);
        style.margin = Some(indent);
        self.out.elements.push(ContentElement::List {
            frame: Frame::from_px(&node.rect),
            style,
            items: all,
        });
    }

    /// Append the runs of `index`'s inline content; block children are left
    /// for their own visit.
    fn inline_runs(&mut self, index: usize, base: &StyleRecord, runs: &mut Vec<TextRun>) {
        let snapshot = self.snapshot;
        let node = snapshot.node(index);
        let transform: TextTransform = node.style.text_transform();
        for child in &node.children {
            match child {
                DomChild::Text { text } => {
                    let text = transform.apply(&WHITESPACE_RE.replace_all(text, " "));
                    if !text.is_empty() {
                        runs.push(TextRun::new(text, base.clone()));
                    }
                }
                DomChild::Element { index: ci } => {
                    let child_node = snapshot.node(*ci);
                    if child_node.is("BR") {
                        runs.push(TextRun::line_break(base));
                        continue;
                    }
                    if is_block(child_node) || child_node.is_graphic() {
                        continue;
                    }
                    self.consumed[*ci] = true;
                    if !child_node.style.is_visible() {
                        continue;
                    }
                    let style = base.inherit(&child_node.style);
                    self.inline_runs(*ci, &style, runs);
                }
            }
        }
    }
}
