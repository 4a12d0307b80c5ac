//! Async-friendly conversion facade.
//!
//! A render session is not `Send`, so each conversion runs on a dedicated
//! worker thread that opens the session, runs the pipeline and hands the
//! result back over a oneshot channel. Concurrent calls get separate threads
//! and separate sessions.

use std::path::PathBuf;
use std::thread;

use tokio::sync::oneshot;

use crate::assemble::SlideConversion;
use crate::builder::PresentationBuilder;
use crate::pipeline;
use crate::session::RenderSession;
use crate::{ConvertOptions, Error, Result, SessionConfig};

/// Run a conversion on a worker thread with a session opened by `open`.
///
/// The builder is moved to the worker and returned alongside the result so
/// the caller can keep using it.
pub async fn convert_with<S, F, B>(
    open: F,
    html_path: impl Into<PathBuf>,
    builder: B,
    options: ConvertOptions,
) -> Result<(B, SlideConversion)>
where
    S: RenderSession,
    F: FnOnce(&SessionConfig) -> Result<S> + Send + 'static,
    B: PresentationBuilder + Send + 'static,
{
    let html_path = html_path.into();
    let (tx, rx) = oneshot::channel::<Result<(B, SlideConversion)>>();

    thread::Builder::new()
        .name("html2slide-worker".into())
        .spawn(move || {
            let mut builder = builder;
            let label = html_path.display().to_string();
            let res = pipeline::resolve_input(&html_path)
                .and_then(|_| open(&options.session))
                .map_err(|e| e.in_file(label.as_str()))
                .and_then(|session| pipeline::convert_with_session(session, &html_path, &mut builder, &options));
            let _ = tx.send(res.map(|conversion| (builder, conversion)));
        })?;

    rx.await
        .map_err(|e| Error::Other(format!("Conversion worker canceled: {}", e)))?
}

/// Run a conversion in a fresh headless Chrome on a worker thread.
#[cfg(feature = "cdp")]
pub async fn convert<B>(
    html_path: impl Into<PathBuf>,
    builder: B,
    options: ConvertOptions,
) -> Result<(B, SlideConversion)>
where
    B: PresentationBuilder + Send + 'static,
{
    convert_with(crate::cdp::CdpSession::launch, html_path, builder, options).await
}
