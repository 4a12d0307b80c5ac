//! html2slide
//!
//! Converts one HTML slide into the layered model of a presentation slide:
//! a flattened background image, skeleton images of styled components,
//! standalone graphics, and editable text and list boxes with normalized
//! styles.
//!
//! # Features
//!
//! - **CDP Backend** (default): renders through headless Chrome
//! - **Typed session seam**: the pipeline only talks to a `RenderSession`,
//!   so any backend (or a test fake) can drive it
//! - **Builder seam**: output goes through a `PresentationBuilder`
//!
//! # Example
//!
//! ```no_run
//! use html2slide::builder::{PageLayout, RecordingPresentation};
//! use html2slide::ConvertOptions;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pres = RecordingPresentation::new(PageLayout::Widescreen16x9);
//! let out = html2slide::convert("slides/intro.html".as_ref(), &mut pres, &ConvertOptions::default())?;
//! println!("{} placeholders", out.placeholders.len());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use serde::Serialize;

pub mod error;
pub use error::{Error, Result, ValidationReport};

pub mod units;
pub mod style;
pub mod dom;
pub mod geometry;
pub mod session;
pub mod probe;
pub mod detect;
pub mod suppress;
pub mod raster;
pub mod extract;
pub mod builder;
pub mod assemble;
pub mod pipeline;

#[cfg(feature = "cdp")]
pub mod cdp;

// Async facade (conversions on a worker thread)
pub mod async_api;

pub use assemble::SlideConversion;
pub use builder::{PageLayout, PageSize, PresentationBuilder, RecordingPresentation, SlideId};
pub use extract::{ContentElement, Placeholder, TextRun};
pub use geometry::Frame;
pub use pipeline::convert_with_session;
pub use session::RenderSession;
pub use style::StyleRecord;

#[cfg(feature = "cdp")]
pub use pipeline::convert;

/// How images and boxes are delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Components and graphics become image layers; only text is extracted
    #[default]
    Layered,
    /// No component or graphic layers; `<img>` elements are emitted as
    /// image elements pointing at their source
    Flat,
}

impl std::str::FromStr for ExtractionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "layered" => Ok(ExtractionMode::Layered),
            "flat" => Ok(ExtractionMode::Flat),
            other => Err(Error::ConfigError(format!("Unknown extraction mode '{}'", other))),
        }
    }
}

/// Configuration for the rendering session
///
/// The defaults match a local headless Chrome: a 30s load timeout, a short
/// settle delay after navigation, and 2x captures.
///
/// # Examples
///
/// ```
/// let cfg = html2slide::SessionConfig::default();
/// assert_eq!(cfg.device_scale_factor, 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Initial window size, before it is fitted to the document
    pub viewport: Viewport,
    /// Timeout for page loads in milliseconds
    pub timeout_ms: u64,
    /// Delay after navigation for fonts and layout to settle
    pub settle_ms: u64,
    /// Device pixels per CSS pixel in captures
    pub device_scale_factor: f64,
    /// Chrome binary; auto-detected when `None`
    pub chrome_path: Option<PathBuf>,
    /// Run Chrome with its sandbox
    pub sandbox: bool,
    /// Additional Chrome command-line switches
    pub extra_args: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            timeout_ms: 30000,
            settle_ms: 500,
            device_scale_factor: 2.0,
            chrome_path: None,
            sandbox: true,
            extra_args: Vec::new(),
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
        }
    }
}

/// Per-conversion options
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Where raster layers are written; files are left for the caller
    pub tmp_dir: PathBuf,
    /// Existing slide to draw on; a new one is added when `None`
    pub slide: Option<SlideId>,
    pub mode: ExtractionMode,
    pub session: SessionConfig,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            tmp_dir: std::env::temp_dir(),
            slide: None,
            mode: ExtractionMode::default(),
            session: SessionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.timeout_ms, 30000);
        assert_eq!(config.settle_ms, 500);
        assert!(config.sandbox);
        assert!(config.chrome_path.is_none());
    }

    #[test]
    fn test_default_options() {
        let options = ConvertOptions::default();
        assert_eq!(options.mode, ExtractionMode::Layered);
        assert!(options.slide.is_none());
        assert_eq!(options.tmp_dir, std::env::temp_dir());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("flat".parse::<ExtractionMode>().unwrap(), ExtractionMode::Flat);
        assert_eq!("Layered".parse::<ExtractionMode>().unwrap(), ExtractionMode::Layered);
        assert!("fancy".parse::<ExtractionMode>().is_err());
    }
}
