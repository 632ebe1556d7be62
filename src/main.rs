mod app;
mod document;
mod graph;
mod interaction;
mod layout;
mod util;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use document::{DocumentSource, ScanRequest};
use layout::ForceParams;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Analysis result to open at startup.
    #[arg(long)]
    document: Option<PathBuf>,

    #[arg(long, default_value = "http://localhost:8000/scan")]
    scan_endpoint: String,

    /// Repository to scan through the analysis backend at startup.
    #[arg(long)]
    repo_root: Option<String>,

    #[arg(long)]
    include_tests: bool,

    #[arg(long, default_value_t = 10)]
    max_depth: u32,

    /// JSON file overriding force parameters.
    #[arg(long)]
    forces: Option<PathBuf>,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arch_visualizer=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn launch_options(args: Args) -> Result<app::LaunchOptions> {
    let params = match &args.forces {
        Some(path) => ForceParams::from_json_file(path)?,
        None => ForceParams::default(),
    };

    let scan = ScanRequest {
        endpoint: args.scan_endpoint,
        repo_root: args.repo_root.clone().unwrap_or_default(),
        include_tests: args.include_tests,
        max_depth: args.max_depth,
    };

    let initial_source = match (&args.document, &args.repo_root) {
        (Some(path), _) => Some(DocumentSource::File(path.clone())),
        (None, Some(_)) => Some(DocumentSource::Scan(scan.clone())),
        (None, None) => None,
    };

    Ok(app::LaunchOptions {
        params,
        initial_source,
        document_path: args
            .document
            .map(|path| path.display().to_string())
            .unwrap_or_default(),
        scan,
    })
}

fn main() -> Result<()> {
    init_tracing();
    let options = launch_options(Args::parse()).context("invalid startup configuration")?;
    tracing::info!(forces = ?options.params, "starting arch-visualizer");

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "arch-visualizer",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::ArchVisualizerApp::new(cc, options)))),
    )
    .map_err(|error| anyhow!("failed to start the window: {error}"))
}
