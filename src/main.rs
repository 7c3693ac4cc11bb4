use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use idxcmp::core::PriceField;
use idxcmp::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display monthly performance of four stocks against the S&P 500
    Report {
        /// Exactly four comma separated tickers, e.g. "AAPL, MSFT, GOOGL, TSLA"
        #[arg(short, long)]
        tickers: Option<String>,

        /// First day of the comparison (YYYY-MM-DD)
        #[arg(short, long)]
        start: Option<NaiveDate>,

        /// Write the monthly records to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write a line chart of the monthly changes to this SVG file
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Price column to compare: "adjusted_close" or "close"
        #[arg(long)]
        price_field: Option<PriceField>,
    },
    /// Prompt for tickers and start date repeatedly
    Interactive {
        /// Price column to compare: "adjusted_close" or "close"
        #[arg(long)]
        price_field: Option<PriceField>,
    },
}

impl From<Commands> for idxcmp::AppCommand {
    fn from(cmd: Commands) -> idxcmp::AppCommand {
        match cmd {
            Commands::Report {
                tickers,
                start,
                csv,
                chart,
                price_field,
            } => idxcmp::AppCommand::Report(idxcmp::ReportArgs {
                tickers,
                start,
                csv_path: csv,
                chart_path: chart,
                price_field,
            }),
            Commands::Interactive { price_field } => {
                idxcmp::AppCommand::Interactive(idxcmp::ReportArgs {
                    price_field,
                    ..Default::default()
                })
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => idxcmp::cli::setup::setup(),
        Some(cmd) => idxcmp::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
