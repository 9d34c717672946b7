//! tap-gorgias command line entry point

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use singer::{Catalog, MessageWriter};
use std::path::PathBuf;
use std::process;
use tap_gorgias::config::{settings_schema, TapConfig};
use tap_gorgias::{sync, Tap};

/// Singer tap for Gorgias
#[derive(Parser, Debug)]
#[command(name = "tap-gorgias")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the config file (JSON, or YAML by extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a state file from a previous run
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Path to a catalog selecting streams
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print the catalog of available streams and exit
    #[arg(long)]
    discover: bool,

    /// Print tap metadata and the settings it accepts, then exit
    #[arg(long)]
    about: bool,
}

fn main() {
    if let Err(e) = tap_gorgias::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.about {
        let about = json!({
            "name": "tap-gorgias",
            "version": env!("CARGO_PKG_VERSION"),
            "capabilities": ["catalog", "discover", "state"],
            "settings": settings_schema(),
        });
        println!("{}", serde_json::to_string_pretty(&about)?);
        return Ok(());
    }

    if cli.discover {
        println!("{}", sync::discover().to_json_pretty()?);
        return Ok(());
    }

    let config_path = cli
        .config
        .context("--config is required unless --about or --discover is given")?;
    let config = TapConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let state = sync::load_state(cli.state.as_deref()).context("Failed to load state file")?;

    let catalog = cli
        .catalog
        .map(|path| {
            Catalog::load(&path)
                .with_context(|| format!("Failed to load catalog from {}", path.display()))
        })
        .transpose()?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async {
        let tap = Tap::new(config)?;
        let mut writer = MessageWriter::stdout();
        tap.sync(&mut writer, state, catalog.as_ref()).await?;
        Ok::<(), anyhow::Error>(())
    })
}
