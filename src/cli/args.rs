//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Kiln front-end asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: kiln.toml, searched upward from cwd)
    #[arg(short = 'C', long, global = true, default_value = "kiln.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands (defaults to `dev`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Clean, build, serve the output and rebuild on change
    #[command(visible_alias = "d")]
    Dev,

    /// Clean and build once, then exit
    #[command(visible_alias = "b")]
    Build,

    /// Delete the output directory
    #[command(visible_alias = "c")]
    Clean,
}

impl Cli {
    /// The command to run; `dev` when none was given.
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Dev)
    }
}
