//! Slide assembly in fixed z-order.

use log::debug;
use serde::Serialize;

use crate::builder::{PresentationBuilder, SlideId, TextBoxKind, TextBoxOptions};
use crate::extract::{ContentElement, Extraction, Placeholder};
use crate::geometry::correct_text_frame;
use crate::raster::{CapturedLayer, LayerKind};
use crate::Result;

/// What the caller gets back from one conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideConversion {
    pub slide: SlideId,
    pub placeholders: Vec<Placeholder>,
}

/// Background, then components, then standalone graphics, then content.
///
/// Within a layer the capture order is kept.
pub fn assemble<B>(
    builder: &mut B,
    slide: Option<SlideId>,
    layers: &[CapturedLayer],
    extraction: Extraction,
) -> Result<SlideConversion>
where
    B: PresentationBuilder + ?Sized,
{
    let slide = match slide {
        Some(slide) => slide,
        None => builder.add_slide()?,
    };

    let mut ordered: Vec<&CapturedLayer> = layers.iter().collect();
    ordered.sort_by_key(|l| l.kind);
    for layer in ordered {
        let path = layer.path.to_string_lossy();
        match layer.kind {
            LayerKind::Background => builder.set_background_image(slide, &path)?,
            LayerKind::Component | LayerKind::StandaloneGraphic => builder.add_image(slide, &path, layer.frame)?,
        }
    }

    for element in &extraction.elements {
        match element {
            ContentElement::Text { frame, style, runs } => {
                let options = TextBoxOptions::new(TextBoxKind::Paragraph, correct_text_frame(*frame, style), style.clone());
                builder.add_text(slide, runs, &options)?;
            }
            ContentElement::List { frame, style, items } => {
                let options = TextBoxOptions::new(TextBoxKind::List, correct_text_frame(*frame, style), style.clone());
                builder.add_text(slide, items, &options)?;
            }
            ContentElement::Image { frame, src } => builder.add_image(slide, src, *frame)?,
        }
    }
    debug!(
        "assembled {} layers and {} elements onto slide {}",
        layers.len(),
        extraction.elements.len(),
        slide.0
    );

    Ok(SlideConversion {
        slide,
        placeholders: extraction.placeholders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{PageLayout, RecordedShape, RecordingPresentation};
    use crate::extract::TextRun;
    use crate::geometry::Frame;
    use crate::style::{Alignment, StyleRecord};
    use std::path::PathBuf;

    fn layer(kind: LayerKind, name: &str) -> CapturedLayer {
        CapturedLayer {
            kind,
            path: PathBuf::from(name),
            frame: Frame::new(0.0, 0.0, 1.0, 1.0),
        }
    }

    fn paragraph(text: &str) -> ContentElement {
        let style = StyleRecord {
            font_size: 18.0,
            line_spacing: 21.6,
            align: Alignment::Center,
            ..Default::default()
        };
        ContentElement::Text {
            frame: Frame::new(3.0, 1.0, 4.0, 0.3),
            runs: vec![TextRun::new(text, style.clone())],
            style,
        }
    }

    #[test]
    fn layers_come_before_content_in_z_order() {
        let mut pres = RecordingPresentation::new(PageLayout::Widescreen16x9);
        let layers = vec![
            layer(LayerKind::StandaloneGraphic, "img.png"),
            layer(LayerKind::Component, "comp.png"),
            layer(LayerKind::Background, "bg.png"),
        ];
        let extraction = Extraction {
            elements: vec![paragraph("Title")],
            placeholders: vec![],
        };
        let out = assemble(&mut pres, None, &layers, extraction).unwrap();
        let slide = pres.slide(out.slide).unwrap();
        assert_eq!(slide.background.as_deref(), Some("bg.png"));
        let kinds: Vec<String> = slide
            .shapes
            .iter()
            .map(|s| match s {
                RecordedShape::Image { path, .. } => path.clone(),
                RecordedShape::Text { .. } => "text".into(),
            })
            .collect();
        assert_eq!(kinds, vec!["comp.png", "img.png", "text"]);
    }

    #[test]
    fn text_boxes_are_corrected_and_top_anchored() {
        let mut pres = RecordingPresentation::new(PageLayout::Widescreen16x9);
        let extraction = Extraction {
            elements: vec![paragraph("Hello")],
            placeholders: vec![],
        };
        let out = assemble(&mut pres, None, &[], extraction).unwrap();
        let RecordedShape::Text { options, .. } = &pres.slide(out.slide).unwrap().shapes[0] else {
            panic!("expected a text shape");
        };
        assert!((options.frame.w - 4.35).abs() < 1e-9);
        assert!((options.frame.x - 2.825).abs() < 1e-9);
        assert_eq!(options.valign, crate::builder::VerticalAlign::Top);
        assert_eq!(options.inset, 0.0);
        assert!(options.wrap && !options.auto_fit);
    }

    #[test]
    fn reuses_a_given_slide() {
        let mut pres = RecordingPresentation::new(PageLayout::Widescreen16x9);
        let existing = pres.add_slide().unwrap();
        let out = assemble(&mut pres, Some(existing), &[], Extraction::default()).unwrap();
        assert_eq!(out.slide, existing);
        assert_eq!(pres.slides.len(), 1);
    }
}
