//! Command-line front end for interlinear glossed text corpora.
//!
//! Loads database settings from flags and the environment, connects to an
//! in-memory or remote `SurrealDB`, and runs one import, export, statistics,
//! analysis or round-trip command against it.

mod commands;
mod config;
mod connection;

use clap::Parser;
use igt_core::control::IgtControlPlane;
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, run};
use crate::config::{DbArgs, IgtConfig};
use crate::connection::{connect_memory, connect_remote};

#[derive(Parser, Debug)]
#[command(name = "igt", version, about = "Import, export and inspect FLEx interlinear texts.")]
struct Cli {
    #[command(flatten)]
    db: DbArgs,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = IgtConfig::try_from(cli.db)?;

    if let Some(uri) = config.remote_uri() {
        let db = connect_remote(&config, uri).await?;
        run(&IgtControlPlane::new(db), cli.command).await
    } else {
        let db = connect_memory(&config).await?;
        run(&IgtControlPlane::new(db), cli.command).await
    }
}
