//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Live reload server for stylesheets, images and pages
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Watch the project and push reload commands to connected browsers
    #[command(visible_alias = "s")]
    Start {
        /// WebSocket port (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Config file path (default: watchreload.toml, searched upward)
        #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
        config: Option<PathBuf>,

        /// Base directory for watched files (relative to the current directory)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        base: Option<PathBuf>,
    },

    /// Write a commented default watchreload.toml into the current directory
    #[command(visible_alias = "i")]
    Init {
        /// Print the template instead of writing it
        #[arg(long)]
        dry: bool,
    },
}
