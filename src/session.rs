//! The rendering session seam.
//!
//! A `RenderSession` owns one browser tab for the duration of one conversion.
//! Operations are typed rather than raw script strings so the pipeline can be
//! driven by any backend (the CDP adapter in production, an in-memory fake in
//! tests).

use serde::{Deserialize, Serialize};

use crate::dom::{DomSnapshot, PxRect};
use crate::suppress::SuppressionPlan;
use crate::Result;

/// Root content box as laid out by the browser, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootMetrics {
    pub width: f64,
    pub height: f64,
    pub scroll_width: f64,
    pub scroll_height: f64,
}

/// Whether the page's default white canvas is painted under a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureBackground {
    Transparent,
    Opaque,
}

/// A screenshot of one viewport region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRequest {
    pub clip: PxRect,
    /// Device pixels per CSS pixel
    pub scale: f64,
    pub background: CaptureBackground,
}

/// Typed operations the pipeline performs against a loaded document.
///
/// Node arguments are snapshot indices; they stay valid until the next
/// `load` or `reload`, after which a fresh snapshot must be taken.
pub trait RenderSession {
    /// Navigate to a URL and wait until the page settles
    fn load(&mut self, url: &str) -> Result<()>;

    /// Reload the current document from source, discarding all mutations
    fn reload(&mut self) -> Result<()>;

    /// Resize the layout viewport
    fn set_viewport(&mut self, width: u32, height: u32) -> Result<()>;

    /// Measure the root (`<body>`) content and scroll box
    fn measure_root(&mut self) -> Result<RootMetrics>;

    /// Tag every element with its pre-order index and return the tree
    fn snapshot(&mut self) -> Result<DomSnapshot>;

    /// Write `id` attributes onto the given nodes
    fn assign_ids(&mut self, ids: &[(usize, String)]) -> Result<()>;

    /// Apply a hide plan, remembering the inline styles it overwrote
    fn apply_plan(&mut self, plan: &SuppressionPlan) -> Result<()>;

    /// Put back exactly what `apply_plan` overwrote for this plan
    fn restore_plan(&mut self, plan: &SuppressionPlan) -> Result<()>;

    /// Current bounding box of a node, `None` if it is gone
    fn node_rect(&mut self, node: usize) -> Result<Option<PxRect>>;

    /// Capture a PNG of a viewport region
    fn capture(&mut self, request: &CaptureRequest) -> Result<Vec<u8>>;

    /// Close the session and release the browser
    fn close(self) -> Result<()>
    where
        Self: Sized;
}
