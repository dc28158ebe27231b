//! CLI entry point for seispick.
//!
//! Provides a command-line interface for:
//! - Scanning the configured waveform tree and printing the catalog
//! - Running a headless annotation pass that saves the automated pick for
//!   every entry
//!
//! The rendering frontend (plot window, click-to-pick) lives outside this
//! crate; both commands here run the full acquisition → admission → oracle →
//! arbitration → ledger pipeline without it. The detector and the binary
//! waveform codec are wired to their mock implementations, so the binary
//! works end-to-end against any tree that holds mock descriptor files.
//!
//! # Usage
//!
//! Scan the catalog:
//! ```bash
//! seispick --config seispick.toml scan
//! ```
//!
//! Annotate every entry:
//! ```bash
//! seispick --config seispick.toml annotate
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seispick::admission::AdmissionPipeline;
use seispick::arbiter::PickArbitrator;
use seispick::config::Config;
use seispick::ledger::Ledger;
use seispick::logging;
use seispick::mock::{MockCodec, MockOracle};
use seispick::oracle::DetectionOracle;
use seispick::remote::{LocalStore, RemoteCatalog, RemoteStore, SecureChannel};
use seispick::session::{AnnotationSession, Step};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "seispick")]
#[command(about = "Remote seismic phase-pick annotation", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "seispick.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enumerate the waveform catalog and print its entries
    Scan {
        /// Print entries as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Run a headless annotation pass over every catalog entry
    Annotate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    config.validate().map_err(anyhow::Error::msg)?;
    logging::init_from_config(&config).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Scan { json } => scan(&config, json),
        Commands::Annotate => annotate(&config),
    }
}

/// Picks the store the configuration asks for: a local archive when
/// `local_root` is set, the SSH hop chain otherwise.
fn open_store(config: &Config) -> Result<(Box<dyn RemoteStore>, String)> {
    if let Some(local_root) = &config.remote.local_root {
        println!("📁 Using local archive at {}", local_root.display());
        return Ok((
            Box::new(LocalStore::new()),
            local_root.to_string_lossy().into_owned(),
        ));
    }
    let hops = config.enabled_hops();
    println!("🔐 Establishing {}-hop secure channel...", hops.len());
    let channel = SecureChannel::establish(&hops).context("establishing the secure channel")?;
    Ok((Box::new(channel), config.remote.root.clone()))
}

fn scan(config: &Config, json: bool) -> Result<()> {
    let (store, root) = open_store(config)?;
    let catalog = RemoteCatalog::new(config.remote.waveform_suffix.clone());
    let entries = catalog
        .enumerate(store.as_ref(), &root)
        .context("enumerating the catalog")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        let reference = if entry.reference_raw.is_empty() {
            "-"
        } else {
            entry.reference_raw.as_str()
        };
        println!("{:<8} {:<16} {}", entry.station, reference, entry.path);
    }
    println!("{} entries under {}", entries.len(), root);
    Ok(())
}

fn annotate(config: &Config) -> Result<()> {
    let (store, root) = open_store(config)?;
    let catalog = RemoteCatalog::new(config.remote.waveform_suffix.clone());
    let entries = catalog
        .enumerate(store.as_ref(), &root)
        .context("enumerating the catalog")?;
    if entries.is_empty() {
        println!("No waveform files under {root}, nothing to annotate");
        return Ok(());
    }
    let total = entries.len();

    let oracle = MockOracle::new(100.0);
    let admission = AdmissionPipeline::new(
        Box::new(MockCodec::new()),
        config.annotation.min_trace_duration_secs,
        oracle.sample_rate_hz(),
    );
    let arbitrator = PickArbitrator::new(config.annotation.tolerance_secs);
    let ledger = Ledger::new(config.ledger.path.clone());

    let mut session = AnnotationSession::new(
        store,
        admission,
        Box::new(oracle),
        arbitrator,
        ledger,
        entries,
    )
    .context("starting the annotation session")?;

    session.load(0);
    while !session.is_finished() {
        session
            .advance(Step::Forward)
            .context("saving annotation record")?;
    }

    println!("✅ Annotated {total} entries into {}", config.ledger.path.display());
    Ok(())
}
