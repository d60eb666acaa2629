//! stackforge CLI tool.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod stacks;

#[derive(Parser)]
#[command(name = "stackforge")]
#[command(about = "Declarative stack synthesis CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize deployment templates for all declared stacks
    Synth {
        /// Path to the deployment configuration file
        #[arg(long, env = "STACKFORGE_CONFIG", default_value = "stackforge.kdl")]
        config: String,
        /// Directory templates are written to
        #[arg(long, default_value = "out")]
        out: String,
    },
    /// Validate a deployment configuration
    Validate {
        /// Path to the configuration file
        #[arg(default_value = "stackforge.kdl")]
        path: String,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Synth { config, out } => {
            commands::synth(&config, &out)?;
        }
        Commands::Validate { path } => {
            commands::validate(&path)?;
        }
    }

    Ok(())
}
