//! authop CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// authop - OAuth server Deployment synthesis
#[derive(Parser, Debug)]
#[command(name = "authop")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit JSON log lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the OAuth server Deployment
    Render(commands::render::RenderArgs),
    /// Print the rollout-trigger hash for a set of resource versions
    Hash(commands::hash::HashArgs),
}

impl Cli {
    /// Run the CLI command, writing its output to stdout
    pub fn run(self) -> Result<()> {
        let output = match self.command {
            Commands::Render(args) => commands::render::run(args)?,
            Commands::Hash(args) => commands::hash::run(args),
        };
        println!("{}", output.trim_end());
        Ok(())
    }
}
