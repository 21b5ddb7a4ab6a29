//! Photostrip CLI: four-photo strips from the command line.
//!
//! Usage:
//!   photostrip styles                 List the frame style catalog
//!   photostrip shoot <IMAGE>...       Capture four frames and export a strip
//!   photostrip booth [<IMAGE>...]     Drive the booth interactively from stdin

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use photostrip_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "photostrip",
    about = "Capture four photos and export a decorated photo strip",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the user config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available frame styles
    Styles {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Capture four frames and export the strip
    Shoot {
        /// Image files used as camera frames (cycled in order)
        images: Vec<PathBuf>,

        /// Use generated test-pattern frames instead of files
        #[arg(long, conflicts_with = "images")]
        synthetic: bool,

        /// Frame style name
        #[arg(short, long, default_value = "None")]
        style: String,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the booth as a line-driven event loop on stdin
    Booth {
        /// Image files used as camera frames (cycled in order)
        images: Vec<PathBuf>,

        /// Use generated test-pattern frames instead of files
        #[arg(long, conflicts_with = "images")]
        synthetic: bool,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    photostrip_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Styles { json } => commands::styles::run(&config, json),
        Commands::Shoot {
            images,
            synthetic,
            style,
            output,
        } => commands::shoot::run(&config, images, synthetic, style, output).await,
        Commands::Booth {
            images,
            synthetic,
            output,
        } => commands::booth::run(&config, images, synthetic, output).await,
    }
}
