//! Convert command - run a stored value through the converter registry

use anyhow::{anyhow, Result};
use clap::Args;
use serde_json::Value;
use typesync_schema::{default_converters, DeclaredType};

/// Arguments for the `convert` command
#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Target type, e.g. `f64` or `decimal?`
    #[arg(long = "type")]
    pub target: String,

    /// Raw stored value; omit for null
    #[arg(long)]
    pub value: Option<String>,

    /// Type the backend stored the value as
    #[arg(long, default_value = "string")]
    pub stored: String,

    /// UI hint of the property
    #[arg(long)]
    pub ui_hint: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ConvertArgs) -> Result<()> {
    let target = parse_type(&args.target)?;
    let stored = parse_type(&args.stored)?;
    let raw = args.value.map(Value::String).unwrap_or(Value::Null);

    let converters = default_converters();
    if converters.resolve(args.ui_hint.as_deref(), &stored, &target).is_none() {
        anyhow::bail!("No converter from {} to {}", stored, target);
    }

    let converted = converters.convert(args.ui_hint.as_deref(), &stored, &target, &raw);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&converted)?);
    } else {
        match converted {
            Some(value) => println!("{}", value),
            None => println!("null"),
        }
    }
    Ok(())
}

fn parse_type(s: &str) -> Result<DeclaredType> {
    s.parse().map_err(|e: String| anyhow!(e))
}
