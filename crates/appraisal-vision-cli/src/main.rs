//! AppraisalVision CLI — compare two photograph sets and print the valuation as JSON.

mod input;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde_json::{json, Value};

use appraisal_vision::{analyze, extract_features_with, EngineConfig, ImageBlob};

#[derive(Parser)]
#[command(
    name = "appraisal-vision",
    about = "Compare property photograph sets and derive a valuation judgment",
    version
)]
struct Cli {
    /// Path to a JSON engine config file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a reference directory of photographs against a candidate directory.
    Compare {
        /// Directory of reference photographs.
        #[arg(short, long)]
        reference: PathBuf,

        /// Directory of candidate photographs.
        #[arg(short = 'k', long)]
        candidate: PathBuf,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Print the feature vector of each image file.
    Extract {
        /// Image files to analyze.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Print the effective engine configuration as JSON.
    Config,

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn print_json(value: &Value, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compare {
            reference,
            candidate,
            pretty,
        } => {
            let config = EngineConfig::load(cli.config.as_deref())?;
            let reference = input::load_image_set(&reference)?;
            let candidate = input::load_image_set(&candidate)?;
            let report = analyze(reference, candidate, config).await?;
            print_json(&serde_json::to_value(&report)?, pretty)?;
        }

        Commands::Extract { files, pretty } => {
            let config = EngineConfig::load(cli.config.as_deref())?;
            let mut results = Vec::with_capacity(files.len());
            for path in files {
                let entry = match ImageBlob::from_file(&path)
                    .and_then(|blob| extract_features_with(&blob, &config))
                {
                    Ok(features) => json!({ "file": path, "features": features }),
                    Err(e) => {
                        tracing::warn!("Failed to extract {}: {e}", path.display());
                        json!({ "file": path, "error": e.to_string() })
                    }
                };
                results.push(entry);
            }
            print_json(&Value::Array(results), pretty)?;
        }

        Commands::Config => {
            let config = EngineConfig::load(cli.config.as_deref())?;
            print_json(&serde_json::to_value(&config)?, true)?;
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "appraisal-vision", &mut std::io::stdout());
        }
    }

    Ok(())
}
