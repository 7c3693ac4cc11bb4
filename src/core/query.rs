//! Input validation and the cached fetch → aggregate request path.

use super::cache::Cache;
use super::monthly::{MonthlyReport, aggregate};
use super::price::{PriceSource, fetch_all};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

/// S&P 500 index symbol every comparison is measured against.
pub const INDEX_SYMBOL: &str = "^GSPC";

/// Number of comparison symbols a query must carry.
pub const COMPARISON_COUNT: usize = 4;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Please enter exactly {expected} stock tickers (got {actual})")]
    Validation { expected: usize, actual: usize },

    #[error("Ticker {position} is blank; please enter exactly 4 stock tickers")]
    BlankTicker { position: usize },

    #[error("Error fetching data: {0:#}")]
    DataUnavailable(anyhow::Error),
}

impl QueryError {
    /// Input problems the user can correct; nothing was fetched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            QueryError::Validation { .. } | QueryError::BlankTicker { .. }
        )
    }
}

/// Splits a comma separated ticker list, trimming and uppercasing each entry.
/// Blank entries are kept so they count towards the number of tickers.
pub fn parse_tickers(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|t| t.trim().to_uppercase())
        .collect()
}

/// A validated request. Also the cache key: two queries are equal only if
/// their symbols (in order) and start date are identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    symbols: Vec<String>,
    start: NaiveDate,
}

impl Query {
    pub fn new(tickers: &str, start: NaiveDate) -> Result<Self, QueryError> {
        let symbols = parse_tickers(tickers);
        if symbols.len() != COMPARISON_COUNT {
            return Err(QueryError::Validation {
                expected: COMPARISON_COUNT,
                actual: symbols.len(),
            });
        }
        if let Some(index) = symbols.iter().position(String::is_empty) {
            return Err(QueryError::BlankTicker {
                position: index + 1,
            });
        }
        Ok(Self { symbols, start })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Index first, then the comparison symbols.
    pub fn all_symbols(&self) -> Vec<String> {
        std::iter::once(INDEX_SYMBOL.to_string())
            .chain(self.symbols.iter().cloned())
            .collect()
    }
}

/// Runs queries against a price source, memoizing successful reports for the
/// lifetime of the service.
pub struct ReportService<'a> {
    source: &'a dyn PriceSource,
    cache: Cache<Query, MonthlyReport>,
}

impl<'a> ReportService<'a> {
    pub fn new(source: &'a dyn PriceSource) -> Self {
        Self {
            source,
            cache: Cache::new(),
        }
    }

    /// Validates `tickers`, then returns the monthly report for it. Nothing is
    /// fetched when validation fails.
    pub async fn report(
        &self,
        tickers: &str,
        start: NaiveDate,
    ) -> Result<MonthlyReport, QueryError> {
        let query = Query::new(tickers, start)?;
        self.run(&query).await
    }

    pub async fn run(&self, query: &Query) -> Result<MonthlyReport, QueryError> {
        if let Some(report) = self.cache.get(query).await {
            return Ok(report);
        }

        info!(symbols = ?query.symbols(), start = %query.start(), "Fetching daily prices");
        let history = fetch_all(self.source, &query.all_symbols(), query.start())
            .await
            .map_err(QueryError::DataUnavailable)?;

        let report = aggregate(&history, INDEX_SYMBOL, query.symbols())
            .map_err(QueryError::DataUnavailable)?;
        debug!(months = report.records.len(), "Caching monthly report");

        self.cache.put(query.clone(), report.clone()).await;
        Ok(report)
    }

    pub async fn cached_queries(&self) -> usize {
        self.cache.len().await
    }
}
