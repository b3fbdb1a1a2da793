//! devloop - incremental rebuild coordinator and live preview server.

mod actor;
mod bundle;
mod cli;
mod config;
mod core;
mod embed;
mod hooks;
mod logger;
mod page;
mod rebuild;
mod reload;
mod server;
mod source;
mod store;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SiteConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = Arc::new(SiteConfig::load(&cli)?);

    match &cli.command {
        Commands::Develop { .. } => cli::develop::develop(config),
    }
}
