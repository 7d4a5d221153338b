//! Autolabel CLI - label a folder of images without human annotation.
//!
//! Each image is captioned, the caption's nouns prompt an open-vocabulary
//! detector, and the detected phrases are counted into a corpus-wide tag
//! frequency table.
//!
//! # Usage
//!
//! ```bash
//! # Label a directory with precomputed captions
//! autolabel run ./frames --captions captions.json
//!
//! # Caption with a local Ollama model and write per-image artifacts
//! autolabel run ./frames --captioner ollama --annotate-dir outputs/
//!
//! # Inspect the tags extracted from a caption
//! autolabel tags "a cat sitting on a wooden table"
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Autolabel - caption-driven open-vocabulary image auto-labeling.
#[derive(Parser, Debug)]
#[command(name = "autolabel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Label a directory of images and print the tag frequency table
    Run(cli::run::RunArgs),

    /// Show the noun tags and detector prompt extracted from a caption
    Tags(cli::tags::TagsArgs),

    /// Locate and list detector models
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't up yet, so config warnings go straight to stderr.
    let config = match autolabel_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `autolabel config path`."
            );
            autolabel_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Autolabel v{}", autolabel_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args).await,
        Commands::Tags(args) => cli::tags::execute(args),
        Commands::Models(args) => cli::models::execute(args),
        Commands::Config(args) => cli::config::execute(args),
    }
}
