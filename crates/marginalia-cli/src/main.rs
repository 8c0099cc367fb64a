//! Marginalia CLI
//!
//! Authoring tool for scaffolding, validating and inspecting data essays.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Marginalia - Data-driven scrollytelling essays
#[derive(Parser)]
#[command(name = "marginalia")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file or project directory
    #[arg(short, long, default_value = "marginalia.yaml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new essay project
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Essay title (defaults to directory name)
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Validate configuration and report every problem
    Validate,

    /// Show the data health report and diagnostics
    Health {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a date column and show how each value was read
    Dates {
        /// Column to parse (defaults to the configured date column)
        #[arg(long)]
        column: Option<String>,
    },

    /// Walk the story and dashboard, summarising each step
    Story {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the relationship network and rank nodes by centrality
    Network {
        /// Source column (defaults to the configured source role)
        #[arg(long)]
        source: Option<String>,

        /// Target column (defaults to the configured target role)
        #[arg(long)]
        target: Option<String>,

        /// Number of nodes to show
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init { path, title } => {
            commands::init::run(&path, title.as_deref()).await?;
        }
        Commands::Validate => {
            commands::validate::run(&cli.config).await?;
        }
        Commands::Health { json } => {
            commands::health::run(&cli.config, json).await?;
        }
        Commands::Dates { column } => {
            commands::dates::run(&cli.config, column.as_deref()).await?;
        }
        Commands::Story { json } => {
            commands::story::run(&cli.config, json).await?;
        }
        Commands::Network {
            source,
            target,
            top,
        } => {
            commands::network::run(&cli.config, source.as_deref(), target.as_deref(), top)
                .await?;
        }
    }

    Ok(())
}
