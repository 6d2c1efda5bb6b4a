//! Adorn command-line tool
//!
//! Runs the annotation showcase and exposes the metadata the annotations
//! record: the parameter watch list and per-class metadata.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::AdornConfig;

#[derive(Parser)]
#[command(name = "adorn")]
#[command(about = "Declarative class annotations: showcase and metadata inspection", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to adorn.toml (defaults to ./adorn.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Define the demonstration classes and exercise every annotation
    Showcase,

    /// Print the parameter watch list as JSON
    Watched {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print the metadata recorded for a showcase class as JSON
    Metadata {
        /// Class name (e.g. ProfileComponenet2)
        class: String,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

fn init_tracing(verbose: bool) {
    // ADORN_LOG takes precedence over RUST_LOG
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("ADORN_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AdornConfig::load(cli.config.as_deref())?;
    tracing::debug!("loaded config: {:?}", config);

    match cli.command {
        Commands::Showcase => commands::showcase::execute(&config),
        Commands::Watched { pretty } => commands::watched::execute(&config, pretty),
        Commands::Metadata { class, pretty } => {
            commands::metadata::execute(&config, &class, pretty)
        }
    }
}
