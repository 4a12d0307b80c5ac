//! Error types for the slide conversion pipeline

use std::fmt;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a slide
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to start the rendering session
    #[error("Session initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load (or reload) the document
    #[error("Failed to load document: {0}")]
    LoadError(String),

    /// Failed to measure or snapshot the rendered tree
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// A page script failed or returned something unexpected
    #[error("Script execution failed: {0}")]
    ScriptError(String),

    /// A node or viewport could not be captured or written to disk
    #[error("Capture failed: {0}")]
    CaptureError(String),

    /// The document does not fit the target slide
    #[error("{0}")]
    Validation(ValidationReport),

    /// Reading the input or writing a raster failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The presentation builder rejected an operation
    #[error("Presentation builder error: {0}")]
    BuilderError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Any failure of one conversion, carrying the input path
    #[error("{path}: {source}")]
    Conversion {
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Attach the input path to an error unless it already carries one.
    pub fn in_file(self, path: impl Into<String>) -> Self {
        match self {
            Error::Conversion { .. } => self,
            other => Error::Conversion {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// The validation report behind this error, if it is one.
    pub fn validation(&self) -> Option<&ValidationReport> {
        match self {
            Error::Validation(report) => Some(report),
            Error::Conversion { source, .. } => source.validation(),
            _ => None,
        }
    }
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}

/// Validation problems gathered across the probe and dimension checks.
///
/// Problems are collected rather than raised one at a time; the pipeline
/// refuses to build a slide while the report is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, messages: I) {
        self.errors.extend(messages);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// `Ok(())` when nothing was reported, otherwise a `Validation` error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => Ok(()),
            [only] => f.write_str(only),
            many => {
                write!(f, "Multiple validation errors found:")?;
                for (i, e) in many.iter().enumerate() {
                    write!(f, "\n  {}. {}", i + 1, e)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_validation_error_is_shown_verbatim() {
        let mut report = ValidationReport::new();
        report.push("HTML content overflows body by 37.5pt horizontally");
        let err = report.into_result().unwrap_err();
        assert_eq!(err.to_string(), "HTML content overflows body by 37.5pt horizontally");
    }

    #[cfg(feature = "cdp")]
    #[test]
    fn protocol_errors_become_cdp_errors() {
        let err: Error = anyhow::anyhow!("Method not found").into();
        assert!(matches!(err, Error::CdpError(_)));
        assert!(err.to_string().contains("Method not found"));
    }

    #[test]
    fn multiple_validation_errors_are_numbered() {
        let mut report = ValidationReport::new();
        report.push("first");
        report.push("second");
        assert_eq!(
            report.to_string(),
            "Multiple validation errors found:\n  1. first\n  2. second"
        );
    }

    #[test]
    fn path_prefix_is_applied_once() {
        let err = Error::CaptureError("node #a".into())
            .in_file("slide.html")
            .in_file("slide.html");
        assert_eq!(err.to_string(), "slide.html: Capture failed: node #a");
    }

    #[test]
    fn validation_report_is_reachable_through_context() {
        let mut report = ValidationReport::new();
        report.push("x");
        let err = Error::Validation(report).in_file("a.html");
        assert_eq!(err.validation().map(|r| r.len()), Some(1));
    }
}
