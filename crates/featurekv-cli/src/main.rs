//! featurekv CLI - operate a featurekv online store
//!
//! Commands:
//! - `write` - Write feature records from a JSON Lines file
//! - `read` - Read features for one or more entities
//! - `ping` - Check that the online store is reachable

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{ping, read, write};

/// featurekv CLI - operate a featurekv online store
#[derive(Parser)]
#[command(name = "featurekv")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Write and read features through a raw key-value online store", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FEATUREKV_CONFIG")]
    config: Option<String>,

    /// Project namespace (overrides the config file)
    #[arg(short, long, env = "FEATUREKV_PROJECT")]
    project: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: String,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write feature records from a JSON Lines file
    Write {
        /// Feature view name
        #[arg(long)]
        view: String,

        /// Input file, one JSON record per line
        #[arg(short, long)]
        input: String,
    },

    /// Read features for one or more entities
    Read {
        /// Feature view name
        #[arg(long)]
        view: String,

        /// Entity as name=value[,name=value] (repeatable)
        #[arg(short, long, required = true)]
        entity: Vec<String>,

        /// Features to read (default: all declared features of the view)
        #[arg(short, long, value_delimiter = ',')]
        features: Option<Vec<String>>,
    },

    /// Check that the online store is reachable
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    let filter = match cli.verbose {
        0 => "warn,featurekv=info",
        1 => "info,featurekv=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config = config::load_config(cli.config.as_deref(), cli.project.as_deref())?;

    let format = output::OutputFormat::parse(&cli.output);

    // Execute command
    match cli.command {
        Commands::Write { view, input } => {
            write::run(&config, &view, &input, format).await?;
        }

        Commands::Read {
            view,
            entity,
            features,
        } => {
            read::run(&config, &view, &entity, features.as_deref(), format).await?;
        }

        Commands::Ping => {
            ping::run(&config, format).await?;
        }
    }

    Ok(())
}
