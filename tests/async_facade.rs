//! Conversions through the async facade

mod common;

use common::{html_file, sample_slide, FakeSession};
use html2slide::async_api;
use html2slide::builder::{PageLayout, RecordingPresentation};
use html2slide::{ConvertOptions, Error};

#[tokio::test]
async fn converts_on_a_worker_thread() {
    let dir = tempfile::tempdir().unwrap();
    let html = html_file(dir.path(), "slide.html");
    let options = ConvertOptions {
        tmp_dir: dir.path().to_path_buf(),
        ..Default::default()
    };

    let (pres, out) = async_api::convert_with(
        |_cfg| Ok(FakeSession::new(sample_slide(), 960.0, 540.0)),
        html,
        RecordingPresentation::new(PageLayout::Widescreen16x9),
        options,
    )
    .await
    .unwrap();

    assert_eq!(pres.slides.len(), 1);
    assert_eq!(out.placeholders.len(), 1);
}

#[tokio::test]
async fn concurrent_conversions_do_not_share_state() {
    let dir = tempfile::tempdir().unwrap();
    let options = ConvertOptions {
        tmp_dir: dir.path().to_path_buf(),
        ..Default::default()
    };

    let jobs = (0..4).map(|i| {
        let html = html_file(dir.path(), &format!("slide{}.html", i));
        async_api::convert_with(
            |_cfg| Ok(FakeSession::new(sample_slide(), 960.0, 540.0)),
            html,
            RecordingPresentation::new(PageLayout::Widescreen16x9),
            options.clone(),
        )
    });
    let results = futures_join(jobs.collect()).await;

    let mut backgrounds = Vec::new();
    for res in results {
        let (pres, _) = res.unwrap();
        backgrounds.push(pres.slides[0].background.clone().unwrap());
    }
    backgrounds.sort();
    backgrounds.dedup();
    assert_eq!(backgrounds.len(), 4);
}

#[tokio::test]
async fn session_open_failure_carries_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let html = html_file(dir.path(), "slide.html");

    let err = async_api::convert_with(
        |_cfg| -> html2slide::Result<FakeSession> { Err(Error::InitializationError("no chrome".into())) },
        html.clone(),
        RecordingPresentation::new(PageLayout::Widescreen16x9),
        ConvertOptions::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        format!("{}: Session initialization failed: no chrome", html.display())
    );
}

async fn futures_join<F: std::future::Future>(futures: Vec<F>) -> Vec<F::Output>
where
    F: Send + 'static,
    F::Output: Send + 'static,
{
    let handles: Vec<_> = futures.into_iter().map(tokio::spawn).collect();
    let mut out = Vec::with_capacity(handles.len());
    for h in handles {
        out.push(h.await.unwrap());
    }
    out
}

#[cfg(feature = "cdp")]
#[tokio::test]
#[ignore] // Requires Chrome to be installed
async fn converts_a_real_slide_in_chrome() {
    let dir = tempfile::tempdir().unwrap();
    let html = dir.path().join("real.html");
    std::fs::write(
        &html,
        r#"<!DOCTYPE html>
<html><head><style>
body { margin: 0; width: 960px; height: 540px; font-family: Arial; }
.card { position: absolute; left: 40px; top: 40px; width: 400px; height: 200px;
        background: #eef; border-radius: 12px; }
</style></head>
<body>
<div class="card"><h2>Quarterly Results</h2></div>
<p style="position:absolute; top: 300px; left: 40px;">Revenue grew <b>18%</b>.</p>
</body></html>"#,
    )
    .unwrap();
    let options = ConvertOptions {
        tmp_dir: dir.path().to_path_buf(),
        ..Default::default()
    };

    let (pres, _) = async_api::convert(html, RecordingPresentation::new(PageLayout::Widescreen16x9), options)
        .await
        .expect("conversion failed");
    assert_eq!(pres.slides.len(), 1);
    assert!(pres.slides[0].background.is_some());
}
