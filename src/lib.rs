pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::report::ReportRequest;
use crate::core::{PriceField, ReportService};
use crate::core::config::AppConfig;
use anyhow::Result;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{debug, info};

/// Report overrides from the command line. Anything left `None` falls back
/// to the config file.
#[derive(Debug, Default, Clone)]
pub struct ReportArgs {
    pub tickers: Option<String>,
    pub start: Option<NaiveDate>,
    pub csv_path: Option<PathBuf>,
    pub chart_path: Option<PathBuf>,
    pub price_field: Option<PriceField>,
}

pub enum AppCommand {
    Report(ReportArgs),
    /// Prompts for tickers and start date; the args supply the defaults.
    Interactive(ReportArgs),
}

impl AppCommand {
    fn args(&self) -> &ReportArgs {
        match self {
            AppCommand::Report(args) | AppCommand::Interactive(args) => args,
        }
    }
}

impl ReportArgs {
    fn price_field(&self, config: &AppConfig) -> PriceField {
        self.price_field.unwrap_or(config.price_field)
    }

    fn into_request(self, config: &AppConfig) -> ReportRequest {
        ReportRequest {
            tickers: self.tickers.unwrap_or_else(|| config.tickers.clone()),
            start: self.start.unwrap_or(config.start_date),
            csv_path: self.csv_path.or_else(|| config.output.csv_path.clone()),
            chart_path: self.chart_path.or_else(|| config.output.chart_path.clone()),
        }
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("idxcmp starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let price_field = command.args().price_field(&config);
    debug!(%price_field, "Using price column");
    let provider = providers::YahooFinanceProvider::new(config.yahoo_base_url(), price_field)?;
    let service = ReportService::new(&provider);

    match command {
        AppCommand::Report(args) => {
            let request = args.into_request(&config);
            cli::report::run(&service, &request).await
        }
        AppCommand::Interactive(args) => {
            let defaults = args.into_request(&config);
            let mut reader = tokio::io::BufReader::new(tokio::io::stdin());
            let mut out = std::io::stdout();
            cli::interactive::run_session(&service, &defaults, &mut reader, &mut out).await
        }
    }
}
