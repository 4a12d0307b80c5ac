//! Convert one HTML slide and print the recorded slide plan as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use html2slide::{ConvertOptions, ExtractionMode, PageLayout, RecordingPresentation};

#[derive(Parser, Debug)]
#[command(name = "html2slide")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTML slide to convert
    file: PathBuf,

    /// Page layout: 16x9, 16x10, 4x3, wide, or <w>x<h> in inches
    #[arg(short, long, default_value = "16x9")]
    layout: String,

    /// Directory for raster layers (default: system temp dir)
    #[arg(short, long)]
    tmp_dir: Option<PathBuf>,

    /// Extraction mode: layered or flat
    #[arg(short, long, default_value = "layered")]
    mode: ExtractionMode,

    /// Page load timeout in milliseconds
    #[arg(long, default_value = "30000")]
    timeout_ms: u64,

    /// Chrome binary to use instead of the detected one
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Run Chrome without its sandbox (containers)
    #[arg(long)]
    no_sandbox: bool,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> Result<String> {
    let layout = PageLayout::parse(&args.layout)?;
    let mut options = ConvertOptions {
        mode: args.mode,
        ..Default::default()
    };
    if let Some(dir) = &args.tmp_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        options.tmp_dir = dir.clone();
    }
    options.session.timeout_ms = args.timeout_ms;
    options.session.chrome_path = args.chrome.clone();
    options.session.sandbox = !args.no_sandbox;

    let mut presentation = RecordingPresentation::new(layout);
    let conversion = html2slide::convert(&args.file, &mut presentation, &options)?;
    log::info!(
        "converted {} into slide {} with {} placeholders",
        args.file.display(),
        conversion.slide.0,
        conversion.placeholders.len()
    );

    let report = serde_json::json!({
        "presentation": presentation,
        "conversion": conversion,
    });
    let text = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    Ok(text)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match run(&args) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
