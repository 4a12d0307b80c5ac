//! The presentation-document side of the conversion.
//!
//! `PresentationBuilder` is implemented by whatever writes the final file; the
//! pipeline only adds slides, sets backgrounds, and places images and text.
//! `RecordingPresentation` records those calls so a conversion can be
//! inspected or serialized without a real presentation library.

use serde::Serialize;

use crate::extract::TextRun;
use crate::geometry::Frame;
use crate::style::StyleRecord;
use crate::units;
use crate::{Error, Result};

/// Handle to a slide inside a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SlideId(pub usize);

/// Declared page size in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSize {
    pub width_emu: u64,
    pub height_emu: u64,
}

impl PageSize {
    pub fn from_inches(width: f64, height: f64) -> Self {
        Self {
            width_emu: units::in_to_emu(width).round() as u64,
            height_emu: units::in_to_emu(height).round() as u64,
        }
    }

    pub fn width_in(&self) -> f64 {
        units::emu_to_in(self.width_emu as f64)
    }

    pub fn height_in(&self) -> f64 {
        units::emu_to_in(self.height_emu as f64)
    }
}

/// Common slide layouts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageLayout {
    /// 10 × 5.625 in
    Widescreen16x9,
    /// 10 × 6.25 in
    Widescreen16x10,
    /// 10 × 7.5 in
    Standard4x3,
    /// 13.333 × 7.5 in
    Wide,
    /// Width and height in inches
    Custom(f64, f64),
}

impl PageLayout {
    pub fn page_size(self) -> PageSize {
        match self {
            PageLayout::Widescreen16x9 => PageSize::from_inches(10.0, 5.625),
            PageLayout::Widescreen16x10 => PageSize::from_inches(10.0, 6.25),
            PageLayout::Standard4x3 => PageSize::from_inches(10.0, 7.5),
            PageLayout::Wide => PageSize {
                width_emu: 12_192_000,
                height_emu: 6_858_000,
            },
            PageLayout::Custom(w, h) => PageSize::from_inches(w, h),
        }
    }

    /// Parse `16x9`, `16x10`, `4x3`, `wide`, or `<w>x<h>` in inches.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "16x9" | "layout_16x9" => Ok(PageLayout::Widescreen16x9),
            "16x10" | "layout_16x10" => Ok(PageLayout::Widescreen16x10),
            "4x3" | "layout_4x3" => Ok(PageLayout::Standard4x3),
            "wide" | "layout_wide" => Ok(PageLayout::Wide),
            other => {
                let (w, h) = other
                    .split_once('x')
                    .ok_or_else(|| Error::ConfigError(format!("Unknown layout '{}'", value)))?;
                let parse = |s: &str| {
                    s.trim()
                        .parse::<f64>()
                        .ok()
                        .filter(|v| *v > 0.0)
                        .ok_or_else(|| Error::ConfigError(format!("Invalid layout dimension '{}'", s)))
                };
                Ok(PageLayout::Custom(parse(w)?, parse(h)?))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBoxKind {
    Paragraph,
    List,
}

/// Placement and box options for one text or list box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBoxOptions {
    pub kind: TextBoxKind,
    pub frame: Frame,
    pub style: StyleRecord,
    pub valign: VerticalAlign,
    /// Internal padding in points
    pub inset: f64,
    pub wrap: bool,
    pub auto_fit: bool,
}

impl TextBoxOptions {
    /// Top-anchored, no inset, wrapping on, no auto-shrink.
    pub fn new(kind: TextBoxKind, frame: Frame, style: StyleRecord) -> Self {
        Self {
            kind,
            frame,
            style,
            valign: VerticalAlign::Top,
            inset: 0.0,
            wrap: true,
            auto_fit: false,
        }
    }
}

/// Operations the pipeline needs from a presentation document.
pub trait PresentationBuilder {
    /// Declared page size, if the document has one
    fn page_size(&self) -> Option<PageSize>;

    /// Append a new empty slide
    fn add_slide(&mut self) -> Result<SlideId>;

    /// Use an image file as the slide background
    fn set_background_image(&mut self, slide: SlideId, path: &str) -> Result<()>;

    /// Place an image file on the slide
    fn add_image(&mut self, slide: SlideId, path: &str, frame: Frame) -> Result<()>;

    /// Place a text or list box made of styled runs
    fn add_text(&mut self, slide: SlideId, runs: &[TextRun], options: &TextBoxOptions) -> Result<()>;
}

/// One recorded shape, in insertion (z) order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecordedShape {
    Image { path: String, frame: Frame },
    Text { runs: Vec<TextRun>, options: TextBoxOptions },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordedSlide {
    pub background: Option<String>,
    pub shapes: Vec<RecordedShape>,
}

/// In-memory builder that keeps every call for inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordingPresentation {
    pub layout: Option<PageSize>,
    pub slides: Vec<RecordedSlide>,
}

impl RecordingPresentation {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            layout: Some(layout.page_size()),
            slides: Vec::new(),
        }
    }

    /// A builder that declares no page size (dimension checks are skipped).
    pub fn without_page_size() -> Self {
        Self::default()
    }

    pub fn slide(&self, id: SlideId) -> Option<&RecordedSlide> {
        self.slides.get(id.0)
    }

    fn slide_mut(&mut self, id: SlideId) -> Result<&mut RecordedSlide> {
        self.slides
            .get_mut(id.0)
            .ok_or_else(|| Error::BuilderError(format!("No slide with index {}", id.0)))
    }
}

impl PresentationBuilder for RecordingPresentation {
    fn page_size(&self) -> Option<PageSize> {
        self.layout
    }

    fn add_slide(&mut self) -> Result<SlideId> {
        self.slides.push(RecordedSlide::default());
        Ok(SlideId(self.slides.len() - 1))
    }

    fn set_background_image(&mut self, slide: SlideId, path: &str) -> Result<()> {
        self.slide_mut(slide)?.background = Some(path.to_string());
        Ok(())
    }

    fn add_image(&mut self, slide: SlideId, path: &str, frame: Frame) -> Result<()> {
        self.slide_mut(slide)?.shapes.push(RecordedShape::Image {
            path: path.to_string(),
            frame,
        });
        Ok(())
    }

    fn add_text(&mut self, slide: SlideId, runs: &[TextRun], options: &TextBoxOptions) -> Result<()> {
        self.slide_mut(slide)?.shapes.push(RecordedShape::Text {
            runs: runs.to_vec(),
            options: options.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_in_emu() {
        let s = PageLayout::Widescreen16x9.page_size();
        assert_eq!(s.width_emu, 9_144_000);
        assert_eq!(s.height_emu, 5_143_500);
        assert!((PageLayout::Wide.page_size().width_in() - 13.333).abs() < 0.001);
    }

    #[test]
    fn parses_layout_names() {
        assert_eq!(PageLayout::parse("16x9").unwrap(), PageLayout::Widescreen16x9);
        assert_eq!(PageLayout::parse("WIDE").unwrap(), PageLayout::Wide);
        assert_eq!(PageLayout::parse("8x4.5").unwrap(), PageLayout::Custom(8.0, 4.5));
        assert!(PageLayout::parse("square").is_err());
        assert!(PageLayout::parse("0x4").is_err());
    }

    #[test]
    fn recording_rejects_unknown_slides() {
        let mut pres = RecordingPresentation::new(PageLayout::Widescreen16x9);
        assert!(pres.add_image(SlideId(3), "a.png", Frame::default()).is_err());
        let id = pres.add_slide().unwrap();
        pres.set_background_image(id, "bg.png").unwrap();
        assert_eq!(pres.slide(id).unwrap().background.as_deref(), Some("bg.png"));
    }
}
