//! mik-search command-line tool
//!
//! Loads a TOML schema, applies JSON search params to one entity and prints
//! the compiled fragment as JSON:
//!
//! ```text
//! mik-search --schema schema.toml --entity Account \
//!     --params '{"name_contains": "Binary", "users": {"first_name_like": "Ben"}}'
//! ```

mod output;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mik_search::{Catalog, Registry, parse_params};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Compile search params to a parameterized SQL fragment.
#[derive(Parser, Debug)]
#[command(name = "mik-search")]
#[command(version, about = "Compile search params to a parameterized SQL fragment")]
struct Args {
    /// Schema file (TOML)
    #[arg(short, long)]
    schema: PathBuf,

    /// Entity to filter
    #[arg(short, long)]
    entity: String,

    /// JSON params; `-` reads them from stdin
    #[arg(short, long, default_value = "{}")]
    params: String,

    /// Treat params as untrusted input
    #[arg(long)]
    protected: bool,

    /// List the entity's condition names instead of compiling
    #[arg(long)]
    names: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mik_search=info")),
        )
        .init();

    run(Args::parse())
}

fn run(args: Args) -> Result<()> {
    let source = std::fs::read_to_string(&args.schema)
        .with_context(|| format!("reading schema {}", args.schema.display()))?;
    let registry = Registry::standard().context("building condition registry")?;
    let catalog = Arc::new(
        Catalog::from_toml(registry, &source)
            .with_context(|| format!("loading schema {}", args.schema.display()))?,
    );
    info!(entities = catalog.entities().len(), "schema loaded");

    let mut tree = if args.protected {
        catalog.protected_conditions(&args.entity)?
    } else {
        catalog.conditions(&args.entity)?
    };

    let report = if args.names {
        output::names(&tree)
    } else {
        let raw = read_params(&args.params)?;
        let params = parse_params(&raw).context("parsing params")?;
        debug!(protected = args.protected, "applying params");
        tree.apply(params)?;
        output::compiled(&tree)?
    };

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{rendered}");
    Ok(())
}

fn read_params(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("reading params from stdin")?;
    if buf.trim().is_empty() {
        bail!("no params on stdin");
    }
    Ok(buf)
}
