//! Layout probe and dimension validation.

use crate::builder::PageSize;
use crate::session::RootMetrics;
use crate::units;

/// Maximum difference, in inches, tolerated between the document box and
/// the declared page size.
pub const DIMENSION_TOLERANCE_IN: f64 = 0.1;

/// Content that does not fit the root box, in points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overflow {
    pub horizontal_pt: f64,
    pub vertical_pt: f64,
}

impl Overflow {
    /// `max(0, scroll − declared − 1)` per axis, converted to points.
    pub fn measure(metrics: &RootMetrics) -> Self {
        let horizontal_px = (metrics.scroll_width - metrics.width - 1.0).max(0.0);
        let vertical_px = (metrics.scroll_height - metrics.height - 1.0).max(0.0);
        Self {
            horizontal_pt: units::px_to_pt(horizontal_px),
            vertical_pt: units::px_to_pt(vertical_px),
        }
    }

    pub fn is_overflowing(&self) -> bool {
        self.horizontal_pt > 0.0 || self.vertical_pt > 0.0
    }

    pub fn message(&self) -> Option<String> {
        if !self.is_overflowing() {
            return None;
        }
        let mut directions = Vec::new();
        if self.horizontal_pt > 0.0 {
            directions.push(format!("{:.1}pt horizontally", self.horizontal_pt));
        }
        if self.vertical_pt > 0.0 {
            directions.push(format!("{:.1}pt vertically", self.vertical_pt));
        }
        let reminder = if self.vertical_pt > 0.0 {
            " (Remember: leave 0.5\" margin at bottom of slide)"
        } else {
            ""
        };
        Some(format!(
            "HTML content overflows body by {}{}",
            directions.join(" and "),
            reminder
        ))
    }
}

/// Overflow problems for the measured root box.
pub fn check_overflow(metrics: &RootMetrics) -> Vec<String> {
    Overflow::measure(metrics).message().into_iter().collect()
}

/// Compare the root box against the declared page size.
pub fn check_dimensions(metrics: &RootMetrics, page: Option<PageSize>) -> Vec<String> {
    let Some(page) = page else {
        return Vec::new();
    };
    let width_in = units::px_to_in(metrics.width);
    let height_in = units::px_to_in(metrics.height);
    let layout_w = page.width_in();
    let layout_h = page.height_in();
    if (layout_w - width_in).abs() > DIMENSION_TOLERANCE_IN || (layout_h - height_in).abs() > DIMENSION_TOLERANCE_IN {
        vec![format!(
            "HTML dimensions ({:.1}\" × {:.1}\") don't match presentation layout ({:.1}\" × {:.1}\")",
            width_in, height_in, layout_w, layout_h
        )]
    } else {
        Vec::new()
    }
}
