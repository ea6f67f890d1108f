//! CLI interface for pricing-hub
//!
//! Provides subcommands for:
//! - `serve`: Ingest prices and serve them over HTTP
//! - `config`: Show the effective configuration

mod serve;

pub use serve::{run_service, ServeArgs};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pricing-hub")]
#[command(about = "Live exchange prices, cached in memory and served over HTTP")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest prices and serve them over HTTP
    Serve(ServeArgs),
    /// Show the effective configuration
    Config,
}
