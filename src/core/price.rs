//! Daily price history abstractions

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

/// Closing prices keyed by trading date. Ordering of the map keeps dates
/// strictly increasing.
pub type DailyPriceSeries = BTreeMap<NaiveDate, f64>;

/// Daily series for every fetched symbol.
pub type PriceHistory = HashMap<String, DailyPriceSeries>;

/// Which daily price a source reports as the close of a trading day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    /// Close adjusted for dividends and splits.
    #[default]
    AdjustedClose,
    /// Raw session close.
    Close,
}

impl Display for PriceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PriceField::AdjustedClose => "adjusted close",
                PriceField::Close => "close",
            }
        )
    }
}

impl FromStr for PriceField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "adjusted_close" | "adj_close" => Ok(PriceField::AdjustedClose),
            "close" => Ok(PriceField::Close),
            _ => Err(anyhow::anyhow!("Invalid price field: {}", s)),
        }
    }
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Daily prices for `symbol` from `start` (inclusive) up to the latest
    /// available trading day.
    async fn fetch_history(&self, symbol: &str, start: NaiveDate) -> Result<DailyPriceSeries>;
}

/// Fetches every symbol concurrently. The first failing symbol fails the
/// whole history.
pub async fn fetch_all(
    source: &dyn PriceSource,
    symbols: &[String],
    start: NaiveDate,
) -> Result<PriceHistory> {
    let futures = symbols.iter().map(|symbol| async move {
        let series = source
            .fetch_history(symbol, start)
            .await
            .with_context(|| format!("Failed to fetch prices for {symbol}"));
        (symbol.clone(), series)
    });

    let mut history = PriceHistory::new();
    for (symbol, series) in join_all(futures).await {
        let series = series?;
        debug!(%symbol, days = series.len(), "Fetched daily prices");
        history.insert(symbol, series);
    }
    Ok(history)
}
