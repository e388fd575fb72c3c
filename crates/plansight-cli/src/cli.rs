//! Plansight CLI - parse EXPLAIN output into a plan document
//!
//! Reads raw plan text from a file argument or stdin, runs the parse
//! pipeline, and prints the resulting document as JSON. One input, one
//! document (or an error) - the same request/response contract the
//! library offers embedders.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use plansight::{Dialect, parse_plan};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plansight", version, about = "Parse EXPLAIN output into a normalized plan tree")]
struct Cli {
    /// File containing the raw EXPLAIN output; reads stdin when omitted
    input: Option<PathBuf>,

    /// Skip auto-detection and parse as this dialect
    #[arg(long, value_enum)]
    dialect: Option<DialectArg>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DialectArg {
    Text,
    Json,
    Tabular,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Text => Dialect::TextTree,
            DialectArg::Json => Dialect::Json,
            DialectArg::Tabular => Dialect::Tabular,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let raw = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };

    let document = parse_plan(&raw, cli.dialect.map(Into::into)).context("parsing plan")?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    println!("{json}");

    Ok(())
}
