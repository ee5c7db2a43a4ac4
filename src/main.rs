//! Kiln - a front-end asset pipeline with a live reloading dev server.

mod cli;
mod config;
mod core;
mod logger;
mod pipeline;
mod reload;
mod serve;
mod step;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::KilnConfig;

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
    logger::set_verbose(cli.verbose);

    let config = KilnConfig::load(&cli)?;

    match cli.command() {
        Commands::Dev => pipeline::dev(&config),
        Commands::Build => pipeline::build(&config).map(|_| ()),
        Commands::Clean => pipeline::clean(&config).map(|_| ()),
    }
}
