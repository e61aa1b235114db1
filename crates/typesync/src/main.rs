//! Typesync Launcher
//!
//! Reconciles a declared content-type manifest against a schema store file,
//! and exposes the type mapping and value conversion registries for
//! inspection.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use typesync_logging::{init_logging, LogConfig};

mod cli;

#[derive(Parser, Debug)]
#[command(name = "typesync", about = "Content type schema reconciliation")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synchronize a declared model into a schema store
    Sync(cli::sync::SyncArgs),

    /// Show which data-type definition a declared type resolves to
    Resolve(cli::resolve::ResolveArgs),

    /// Convert a stored raw value to a declared type
    Convert(cli::convert::ConvertArgs),
}

fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync(args) => cli::sync::run(args),
        Commands::Resolve(args) => cli::resolve::run(args),
        Commands::Convert(args) => cli::convert::run(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig::new("typesync").verbose(cli.verbose)) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:?}", err);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_args() {
        let cli = Cli::try_parse_from([
            "typesync", "-v", "sync", "--model", "model.toml", "--store", "store.json",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Sync(args) => {
                assert_eq!(args.model.to_str(), Some("model.toml"));
                assert!(args.config.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_convert_defaults_stored_type() {
        let cli = Cli::try_parse_from(["typesync", "convert", "--type", "f64", "--value", "1.5"]).unwrap();
        match cli.command {
            Commands::Convert(args) => assert_eq!(args.stored, "string"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
