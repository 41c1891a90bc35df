use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use delivery_board::config::Config;
use delivery_board::error::{BoardErrorTrait, Error};

mod commands;

use commands::ShowParams;

#[derive(Parser)]
#[command(
    name = "delivery-board",
    version,
    about = "Delivery schedule board fed from a published spreadsheet",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configuration file
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the feed once and print the board
    Show {
        /// Reference day (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Show the full week this many weeks from the current one
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        week_offset: i32,

        /// Only show this customer
        #[arg(long)]
        customer: Option<String>,

        /// Only show this carrier
        #[arg(long)]
        carrier: Option<String>,

        /// Print one calendar month (YYYY-MM) instead of the board
        #[arg(long)]
        month: Option<String>,

        /// Output JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Keep the feed fresh and log every refresh until Ctrl-C
    Watch,

    /// Search deliveries by postcode fragment
    Search {
        /// At least two characters of a postcode
        query: String,

        /// Output JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;

    // Initialize tracing/logging
    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    tracing::info!(url = %config.feed.url, "delivery-board starting");

    if let Err(err) = run(cli.command, &config).await {
        report_failure(&err);
        return Err(err);
    }

    tracing::info!("delivery-board completed successfully");
    Ok(())
}

async fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Show {
            date,
            week_offset,
            customer,
            carrier,
            month,
            json,
        } => {
            tracing::info!(
                date = ?date,
                week_offset = %week_offset,
                customer = ?customer,
                carrier = ?carrier,
                month = ?month,
                "Starting show command"
            );
            commands::show(
                config,
                ShowParams {
                    date,
                    week_offset,
                    customer,
                    carrier,
                    month,
                    json,
                },
            )
            .await
        }

        Commands::Watch => {
            tracing::info!("Starting watch command");
            commands::watch(config).await
        }

        Commands::Search { query, json } => {
            tracing::info!(query = %query, "Starting search command");
            commands::search(config, query, json).await
        }
    }
}

/// Log a failed command, with its category when it came from the pipeline
fn report_failure(err: &anyhow::Error) {
    match err.downcast_ref::<Error>() {
        Some(board_err) => tracing::error!(
            error = %board_err,
            category = board_err.category().as_str(),
            recoverable = board_err.is_recoverable(),
            "Command failed"
        ),
        None => tracing::error!(error = %err, "Command failed"),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env().context("No --config given and environment is incomplete")?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            tracing_subscriber::EnvFilter::new("delivery_board=debug,info")
        } else {
            tracing_subscriber::EnvFilter::new(format!("delivery_board={level},warn"))
        }
    });

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
