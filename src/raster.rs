//! Capture passes: component skeletons, standalone graphics and the
//! flattened background.
//!
//! Every capture is written as a PNG into the caller's temporary directory
//! under a name that is unique across concurrent conversions sharing it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info};
use serde::Serialize;

use crate::detect::{self, Component, Graphic};
use crate::dom::{DomSnapshot, PxRect};
use crate::geometry::Frame;
use crate::session::{CaptureBackground, CaptureRequest, RenderSession};
use crate::suppress::{self, SuppressionPlan};
use crate::{Error, ExtractionMode, Result};

/// Which layer of the slide a raster belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKind {
    Background,
    Component,
    StandaloneGraphic,
}

/// A PNG written to disk together with where it goes on the slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedLayer {
    pub kind: LayerKind,
    pub path: PathBuf,
    pub frame: Frame,
}

static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Builds `<prefix>_<id>_<millis>_<seq>.png` paths inside one directory.
#[derive(Debug, Clone)]
pub struct RasterNamer {
    dir: PathBuf,
}

impl RasterNamer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, prefix: &str, id: &str) -> PathBuf {
        let millis = chrono::Utc::now().timestamp_millis();
        let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!("{}_{}_{}_{}.png", prefix, file_safe(id), millis, seq))
    }
}

fn file_safe(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "slide".to_string()
    } else {
        cleaned
    }
}

/// Shared state of the capture passes of one conversion.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    namer: RasterNamer,
    scale: f64,
    viewport_w: f64,
    viewport_h: f64,
}

impl Rasterizer {
    pub fn new(dir: impl Into<PathBuf>, scale: f64, viewport: (u32, u32)) -> Self {
        Self {
            namer: RasterNamer::new(dir),
            scale,
            viewport_w: viewport.0 as f64,
            viewport_h: viewport.1 as f64,
        }
    }

    fn viewport(&self) -> PxRect {
        PxRect::new(0.0, 0.0, self.viewport_w, self.viewport_h)
    }

    fn write(&self, path: &Path, png: &[u8]) -> Result<()> {
        if png.is_empty() {
            return Err(Error::CaptureError(format!("empty image for {}", path.display())));
        }
        std::fs::write(path, png)
            .map_err(|e| Error::CaptureError(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Capture `rect` clipped to the viewport; `None` when nothing of it is on screen.
    fn capture_box<S: RenderSession>(
        &self,
        session: &mut S,
        rect: &PxRect,
        background: CaptureBackground,
    ) -> Result<Option<Vec<u8>>> {
        let Some(clip) = rect.clip_to(self.viewport_w, self.viewport_h) else {
            return Ok(None);
        };
        let png = session.capture(&CaptureRequest {
            clip,
            scale: self.scale,
            background,
        })?;
        Ok(Some(png))
    }

    /// Skeleton capture of every component, each under its own plan.
    pub fn capture_components<S: RenderSession>(
        &self,
        session: &mut S,
        snapshot: &DomSnapshot,
        components: &[Component],
    ) -> Result<Vec<CapturedLayer>> {
        let mut layers = Vec::with_capacity(components.len());
        for component in components {
            let plan = SuppressionPlan::skeleton(snapshot, component);
            let png = suppress::scoped(session, &plan, |s| {
                self.capture_box(s, &component.rect, CaptureBackground::Transparent)
            })
            .map_err(|e| capture_context(e, &component.id))?;
            let Some(png) = png else {
                debug!("component {} is outside the viewport, skipped", component.id);
                continue;
            };
            // the box may differ once the plan is lifted
            let rect = session.node_rect(component.node)?.unwrap_or(component.rect);
            let path = self.namer.path("comp", &component.id);
            self.write(&path, &png)?;
            debug!("captured component {} -> {}", component.id, path.display());
            layers.push(CapturedLayer {
                kind: LayerKind::Component,
                path,
                frame: clipped_frame(&rect, self.viewport_w, self.viewport_h),
            });
        }
        info!("component pass captured {} layers", layers.len());
        Ok(layers)
    }

    /// Capture every graphic as is.
    pub fn capture_graphics<S: RenderSession>(
        &self,
        session: &mut S,
        graphics: &[Graphic],
    ) -> Result<Vec<CapturedLayer>> {
        let mut layers = Vec::with_capacity(graphics.len());
        for graphic in graphics {
            let png = self
                .capture_box(session, &graphic.rect, CaptureBackground::Transparent)
                .map_err(|e| capture_context(e, &graphic.id))?;
            let Some(png) = png else {
                debug!("graphic {} is outside the viewport, skipped", graphic.id);
                continue;
            };
            let path = self.namer.path("img", &graphic.id);
            self.write(&path, &png)?;
            debug!("captured graphic {} -> {}", graphic.id, path.display());
            layers.push(CapturedLayer {
                kind: LayerKind::StandaloneGraphic,
                path,
                frame: clipped_frame(&graphic.rect, self.viewport_w, self.viewport_h),
            });
        }
        info!("standalone pass captured {} layers", layers.len());
        Ok(layers)
    }

    /// Whole-viewport capture with every separately delivered node faded out.
    ///
    /// Components and graphics are re-detected on a fresh snapshot so the
    /// plan matches the tree as it is now.
    pub fn capture_background<S: RenderSession>(
        &self,
        session: &mut S,
        stem: &str,
        mode: ExtractionMode,
    ) -> Result<CapturedLayer> {
        let snapshot = session.snapshot()?;
        let (components, graphics) = match mode {
            ExtractionMode::Layered => {
                let components = detect::detect_components(&snapshot);
                let graphics = detect::detect_graphics(&snapshot, &components);
                (components, graphics)
            }
            ExtractionMode::Flat => (Vec::new(), Vec::new()),
        };
        let plan = SuppressionPlan::background(&snapshot, &components, &graphics, mode);
        let viewport = self.viewport();
        let png = suppress::scoped(session, &plan, |s| {
            s.capture(&CaptureRequest {
                clip: viewport,
                scale: self.scale,
                background: CaptureBackground::Opaque,
            })
        })?;
        let path = self.namer.path("bg", stem);
        self.write(&path, &png)?;
        info!("background captured -> {}", path.display());
        Ok(CapturedLayer {
            kind: LayerKind::Background,
            path,
            frame: Frame::from_px(&viewport),
        })
    }
}

fn clipped_frame(rect: &PxRect, w: f64, h: f64) -> Frame {
    Frame::from_px(&rect.clip_to(w, h).unwrap_or(*rect))
}

fn capture_context(err: Error, id: &str) -> Error {
    match err {
        Error::CaptureError(msg) => Error::CaptureError(format!("#{}: {}", id, msg)),
        other => other,
    }
}
