//! Sync command - reconcile a manifest against a store file

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;
use typesync_schema::{
    coordinator, load_manifest, synchronize_all, MemorySchemaStore, RunReport, SyncReport,
};

use super::load_typesync_config;

/// Arguments for the `sync` command
#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Declared model manifest (TOML)
    #[arg(long)]
    pub model: PathBuf,

    /// Schema store snapshot (JSON); created if missing
    #[arg(long)]
    pub store: PathBuf,

    /// Config file (default: ~/.typesync/config.toml)
    #[arg(long, env = "TYPESYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output the run report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SyncArgs) -> Result<()> {
    let config = load_typesync_config(args.config.as_deref())?;
    let mappings = config
        .type_mappings()
        .context("Failed to build type mappings from config")?;

    let model = load_manifest(&args.model)
        .with_context(|| format!("Failed to load manifest: {}", args.model.display()))?;
    let mut store = MemorySchemaStore::open(&args.store)
        .with_context(|| format!("Failed to open store: {}", args.store.display()))?;

    info!(
        "Synchronizing {} declared types into {}",
        model.len(),
        args.store.display()
    );

    let outcome = coordinator().run_once(|| synchronize_all(&mut store, &model, &mappings, &config.sync));

    // Types saved before a failure stay saved, so flush either way.
    store
        .flush(&args.store)
        .with_context(|| format!("Failed to write store: {}", args.store.display()))?;

    let Some(run) = outcome.context("Synchronization failed")? else {
        println!("Synchronization already ran in this process");
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print_summary(&run);
    }

    if !run.is_success() {
        anyhow::bail!("{} content types failed to synchronize", run.failed());
    }
    Ok(())
}

fn print_summary(run: &RunReport) {
    for report in &run.reports {
        print_report(report);
    }
    println!();
    println!(
        "Total: {} created, {} updated, {} failed",
        run.created(),
        run.updated(),
        run.failed()
    );
}

fn print_report(report: &SyncReport) {
    println!(
        "{:<10} {:>3} created  {:>3} updated  {:>3} failed  {:>3} rebound",
        report.kind.as_str(),
        report.created.len(),
        report.updated.len(),
        report.failed.len(),
        report.rebound_properties
    );
    for failure in &report.failed {
        println!("  FAILED {}: {}", failure.alias, failure.message);
    }
}
