//! Slide-space frames and the text box correction applied before emission.
//!
//! The target renderer lays text out slightly wider than the browser did, so
//! text boxes are widened and re-anchored according to their alignment.

use serde::{Deserialize, Serialize};

use crate::dom::PxRect;
use crate::style::{Alignment, StyleRecord};
use crate::units;

/// Position and size on the slide, in inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Frame {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Convert a pixel box; negative coordinates are clamped to the slide edge.
    pub fn from_px(rect: &PxRect) -> Self {
        Self {
            x: units::px_to_in(rect.x.max(0.0)),
            y: units::px_to_in(rect.y.max(0.0)),
            w: units::px_to_in(rect.width.max(0.0)),
            h: units::px_to_in(rect.height.max(0.0)),
        }
    }
}

/// Added width for single-line boxes beyond the proportional part.
pub const SINGLE_LINE_PAD_IN: f64 = 0.15;
/// Added width for wrapped boxes beyond the proportional part.
pub const MULTI_LINE_PAD_IN: f64 = 0.10;
/// Proportional widening.
pub const WIDTH_BUFFER_RATIO: f64 = 0.05;

/// Height up to 1.5 line heights counts as one line.
pub fn is_single_line(frame: &Frame, style: &StyleRecord) -> bool {
    let line_pt = if style.line_spacing > 0.0 {
        style.line_spacing
    } else {
        style.font_size * 1.2
    };
    frame.h <= units::pt_to_in(line_pt) * 1.5
}

/// Widen a text frame and shift it so the text keeps its visual anchor.
///
/// Vertical placement is untouched: text is always top-anchored.
pub fn correct_text_frame(frame: Frame, style: &StyleRecord) -> Frame {
    let pad = if is_single_line(&frame, style) {
        SINGLE_LINE_PAD_IN
    } else {
        MULTI_LINE_PAD_IN
    };
    let buffer = frame.w * WIDTH_BUFFER_RATIO + pad;
    let x = match style.align {
        Alignment::Center => frame.x - buffer / 2.0,
        Alignment::Right => frame.x - buffer,
        Alignment::Left | Alignment::Justify => frame.x,
    };
    Frame {
        x: x.max(0.0),
        y: frame.y,
        w: frame.w + buffer,
        h: frame.h,
    }
}
