mod api;
mod commands;
mod config;
mod crypto;
mod error;
mod fragment;
mod shamir;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hrcx")]
#[command(about = "Split your files into encrypted fragments", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the default total/threshold used by interactive prompts
    Init,

    /// Split a file into encrypted horcruxes
    Split {
        /// The file to split
        file: PathBuf,

        /// Total number of horcruxes to create
        #[arg(short, long)]
        total: Option<u8>,

        /// Minimum horcruxes needed to reconstruct
        #[arg(short = 'k', long)]
        threshold: Option<u8>,

        /// Output directory for the horcruxes
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reconstruct the original file from horcruxes
    Bind {
        /// Horcrux files, or directories to scan for them
        #[arg(default_value = ".")]
        sources: Vec<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init()?,
        Commands::Split {
            file,
            total,
            threshold,
            output,
        } => {
            let config = config::Config::load().context("Failed to load configuration")?;
            commands::split(config, file, total, threshold, output)?;
        }
        Commands::Bind {
            sources,
            output,
            force,
        } => commands::bind(sources, output, force)?,
    }

    Ok(())
}
