//! End-to-end conversion of one HTML slide.
//!
//! Stages run strictly in order against one exclusively owned session:
//! load, probe and validate, component pass, standalone pass, background
//! pass, reload, extraction. The session is closed before assembly whatever
//! happened, and nothing is added to the presentation unless every stage
//! succeeded.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::assemble::{assemble, SlideConversion};
use crate::builder::{PageSize, PresentationBuilder};
use crate::extract::{self, Extraction};
use crate::raster::{CapturedLayer, Rasterizer};
use crate::session::RenderSession;
use crate::{detect, probe};
use crate::{ConvertOptions, Error, ExtractionMode, Result, ValidationReport};

/// Absolute path of the input, failing with `Io` when it does not exist.
pub fn resolve_input(html_path: &Path) -> Result<PathBuf> {
    Ok(std::fs::canonicalize(html_path)?)
}

/// `file://` URL for an absolute path.
pub fn document_url(path: &Path) -> Result<String> {
    url::Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| Error::LoadError(format!("Cannot build a file URL for {}", path.display())))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "slide".to_string())
}

/// Probe the loaded document and collect every validation problem.
pub fn validate<S: RenderSession>(session: &mut S, page: Option<PageSize>) -> Result<(u32, u32)> {
    let metrics = session.measure_root()?;
    debug!(
        "root box {}x{} (scroll {}x{})",
        metrics.width, metrics.height, metrics.scroll_width, metrics.scroll_height
    );
    let mut report = ValidationReport::new();
    report.extend(probe::check_overflow(&metrics));
    report.extend(probe::check_dimensions(&metrics, page));
    report.into_result()?;
    Ok((metrics.width.round().max(1.0) as u32, metrics.height.round().max(1.0) as u32))
}

fn run_stages<S: RenderSession>(
    session: &mut S,
    input: &Path,
    page: Option<PageSize>,
    options: &ConvertOptions,
) -> Result<(Vec<CapturedLayer>, Extraction)> {
    let url = document_url(input)?;
    session.load(&url)?;

    let viewport = validate(session, page)?;
    session.set_viewport(viewport.0, viewport.1)?;

    let rasterizer = Rasterizer::new(&options.tmp_dir, options.session.device_scale_factor, viewport);
    let mut layers = Vec::new();

    if options.mode == ExtractionMode::Layered {
        let snapshot = session.snapshot()?;
        let components = detect::detect_components(&snapshot);
        let graphics = detect::detect_graphics(&snapshot, &components);
        debug!("detected {} components and {} graphics", components.len(), graphics.len());

        let ids = detect::generated_ids(
            &snapshot,
            components
                .iter()
                .map(|c| (c.node, c.id.as_str()))
                .chain(graphics.iter().map(|g| (g.node, g.id.as_str()))),
        );
        session.assign_ids(&ids)?;

        layers.extend(rasterizer.capture_components(session, &snapshot, &components)?);
        layers.extend(rasterizer.capture_graphics(session, &graphics)?);
    }

    layers.push(rasterizer.capture_background(session, &file_stem(input), options.mode)?);

    session.reload()?;
    let snapshot = session.snapshot()?;
    let extraction = extract::extract(&snapshot, options.mode);
    info!(
        "extracted {} elements and {} placeholders",
        extraction.elements.len(),
        extraction.placeholders.len()
    );
    Ok((layers, extraction))
}

/// Convert `html_path` using an already opened session.
///
/// The session is consumed and closed on every path. Errors carry the input
/// path.
pub fn convert_with_session<S, B>(
    mut session: S,
    html_path: &Path,
    builder: &mut B,
    options: &ConvertOptions,
) -> Result<SlideConversion>
where
    S: RenderSession,
    B: PresentationBuilder + ?Sized,
{
    let label = html_path.display().to_string();
    let staged = resolve_input(html_path).and_then(|input| run_stages(&mut session, &input, builder.page_size(), options));

    let closed = session.close();
    let (layers, extraction) = match (staged, closed) {
        (Ok(out), Ok(())) => out,
        (Ok(out), Err(e)) => {
            warn!("closing the render session failed: {}", e);
            out
        }
        (Err(e), _) => return Err(e.in_file(label)),
    };

    assemble(builder, options.slide, &layers, extraction).map_err(|e| e.in_file(label))
}

/// Convert `html_path` in a fresh headless Chrome session.
#[cfg(feature = "cdp")]
pub fn convert<B>(html_path: &Path, builder: &mut B, options: &ConvertOptions) -> Result<SlideConversion>
where
    B: PresentationBuilder + ?Sized,
{
    let label = html_path.display().to_string();
    // a missing input never launches a browser
    resolve_input(html_path).map_err(|e| e.in_file(label.as_str()))?;
    let session = crate::cdp::CdpSession::launch(&options.session).map_err(|e| e.in_file(label.as_str()))?;
    convert_with_session(session, html_path, builder, options)
}
