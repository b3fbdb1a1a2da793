//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::Mode;

/// devloop development server CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: devloop.toml)
    #[arg(
        short = 'C',
        long,
        default_value = "devloop.toml",
        value_hint = clap::ValueHint::FilePath
    )]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start development server with live updates
    #[command(visible_aliases = ["d", "serve"])]
    Develop {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short = 'H', long)]
        host: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Port for the live-update channel
        #[arg(long)]
        ws_port: Option<u16>,

        /// Build mode
        #[arg(short, long, value_enum)]
        mode: Option<Mode>,

        /// Cache directory (relative to project root)
        #[arg(long, value_hint = clap::ValueHint::DirPath)]
        cache_dir: Option<PathBuf>,

        /// Enable verbose output for debugging
        #[arg(short = 'V', long)]
        verbose: bool,
    },
}
