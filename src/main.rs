//! watchreload - live reload server for stylesheets, images and pages.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use watchreload::cli::{self, Cli, Commands};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    watchreload::core::setup_shutdown_handler()?;

    let args = Cli::parse();

    // Set global color override based on CLI option
    match args.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    match &args.command {
        Commands::Start { port, config, base } => {
            cli::start::start(*port, config.as_deref(), base.as_deref())
        }
        Commands::Init { dry } => cli::init::init(*dry),
    }
}
