//! ODF Browser - desktop viewer for categorized game object definitions.

use anyhow::Result;
use clap::Parser;
use odf_browser::{BrowserConfig, DeepLink, LoadedDataset, Startup, run_gui};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "odf-browser")]
#[command(about = "Browse, search and compare ODF game object definitions")]
struct Args {
    /// Dataset to open (.json, .json5 or .gz); defaults to the configured path
    dataset: Option<PathBuf>,

    /// JSON5 config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial selection as a query string, e.g. "?odf=avtank&cat=Weapon"
    #[arg(short, long)]
    link: Option<String>,

    /// Treat the dataset as a flat filename -> record dump and categorize it
    #[arg(long)]
    flat: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

/// Directives for the log filter: `RUST_LOG` when set, otherwise the level
/// chosen by `--debug`.
fn log_directives(debug: bool, rust_log: Option<&str>) -> String {
    match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => directives.to_string(),
        None if debug => "debug".to_string(),
        None => "info".to_string(),
    }
}

fn log_filter(debug: bool) -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = log_directives(debug, rust_log.as_deref());
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("Ignoring invalid {}: {e}", EnvFilter::DEFAULT_ENV);
        EnvFilter::new(log_directives(debug, None))
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    FmtSubscriber::builder()
        .with_env_filter(log_filter(args.debug))
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting ODF Browser {}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => BrowserConfig::load_path(path)?,
        None => BrowserConfig::default(),
    };

    let path = args
        .dataset
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.dataset_path));
    let loaded = if args.flat {
        LoadedDataset::load_flat_path(&path)
    } else {
        LoadedDataset::load_path(&path)
    };

    // A missing or broken dataset is not fatal: the window opens on its
    // placeholder screen with the error shown.
    let (dataset, load_error) = match loaded {
        Ok(loaded) => (Some(loaded), None),
        Err(e) => {
            let e = anyhow::Error::new(e);
            error!("Failed to load {}: {e:#}", path.display());
            (None, Some(format!("Failed to load {}: {e:#}", path.display())))
        }
    };

    let link = args
        .link
        .as_deref()
        .map(DeepLink::parse)
        .unwrap_or_default();

    run_gui(Startup {
        dataset,
        load_error,
        config,
        link,
    })
    .map_err(|e| anyhow::anyhow!("GUI failed: {e}"))
}
