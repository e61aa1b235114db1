//! Resolve command - show the data-type definition for a declared type

use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;
use typesync_schema::DeclaredType;

use super::load_typesync_config;

/// Arguments for the `resolve` command
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Declared type, e.g. `i32`, `decimal?` or an application type name
    #[arg(long = "type")]
    pub declared_type: String,

    /// UI hint naming a data-type definition or editor
    #[arg(long)]
    pub ui_hint: Option<String>,

    /// Config file (default: ~/.typesync/config.toml)
    #[arg(long, env = "TYPESYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ResolveArgs) -> Result<()> {
    let declared: DeclaredType = args.declared_type.parse().map_err(|e: String| anyhow!(e))?;

    let config = load_typesync_config(args.config.as_deref())?;
    let mappings = config
        .type_mappings()
        .context("Failed to build type mappings from config")?;

    let definition = mappings.resolve(args.ui_hint.as_deref(), &declared)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&definition)?);
    } else {
        println!("{} -> {}", declared, definition.name);
        println!("  id:      {}", definition.id);
        println!("  editor:  {}", definition.editor_alias);
        println!("  storage: {}", definition.storage.as_str());
    }
    Ok(())
}
