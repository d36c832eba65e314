//! Jsonshop CLI - Seeding and export tools for the JSON collections.
//!
//! # Usage
//!
//! ```bash
//! # Load products and carts from a YAML file
//! jsonshop seed fixtures/shop.yaml
//!
//! # Empty both collections first
//! jsonshop seed fixtures/shop.yaml --clear
//!
//! # Export the catalog as CSV
//! jsonshop export --output productsList.csv
//! ```
//!
//! Collection locations come from the same `JSONSHOP_*` environment
//! variables as the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use jsonshop_server::config::StoreConfig;

mod commands;

#[derive(Parser)]
#[command(name = "jsonshop")]
#[command(author, version, about = "Jsonshop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the collections from a YAML file
    Seed {
        /// YAML file with `products` and `carts` lists
        file: PathBuf,

        /// Delete all existing products and carts first
        #[arg(long)]
        clear: bool,
    },
    /// Export the product catalog as CSV
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so `export` can write CSV to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db = StoreConfig::from_env()?.open();

    match cli.command {
        Commands::Seed { file, clear } => commands::seed::run(&db, &file, clear).await?,
        Commands::Export { output } => commands::export::run(&db, output.as_deref()).await?,
    }
    Ok(())
}
