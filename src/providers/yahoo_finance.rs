use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::price::{DailyPriceSeries, PriceField, PriceSource};

// YahooFinanceProvider implementation for PriceSource
pub struct YahooFinanceProvider {
    base_url: String,
    price_field: PriceField,
    client: reqwest::Client,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str, price_field: PriceField) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("idxcmp/1.0")
            .build()?;
        Ok(YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            price_field,
            client,
        })
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug, Default)]
struct ChartMeta {
    /// Exchange offset from UTC, in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

impl ChartItem {
    fn prices(&self, field: PriceField) -> Option<&[Option<f64>]> {
        let indicators = self.indicators.as_ref()?;
        let column = match field {
            PriceField::AdjustedClose => indicators.adjclose.first()?.adjclose.as_ref(),
            PriceField::Close => indicators.quote.first()?.close.as_ref(),
        };
        column.map(Vec::as_slice)
    }
}

/// Pairs bar timestamps with prices, dropping null prices and bars before
/// `start`. Timestamps are shifted into exchange-local time before taking the
/// date.
fn daily_series(
    timestamps: &[i64],
    prices: &[Option<f64>],
    gmtoffset: i64,
    start: NaiveDate,
) -> DailyPriceSeries {
    timestamps
        .iter()
        .zip(prices)
        .filter_map(|(ts, price)| {
            let date = DateTime::<Utc>::from_timestamp(ts + gmtoffset, 0)?.date_naive();
            Some((date, (*price)?))
        })
        .filter(|(date, _)| *date >= start)
        .collect()
}

fn start_timestamp(start: NaiveDate) -> i64 {
    start
        .and_hms_opt(0, 0, 0)
        .map_or(0, |dt| dt.and_utc().timestamp())
}

#[async_trait]
impl PriceSource for YahooFinanceProvider {
    #[instrument(
        name = "YahooHistoryFetch",
        skip(self),
        fields(symbol = %symbol, start = %start)
    )]
    async fn fetch_history(&self, symbol: &str, start: NaiveDate) -> Result<DailyPriceSeries> {
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events={}",
            self.base_url,
            urlencoding::encode(symbol),
            start_timestamp(start),
            Utc::now().timestamp(),
            urlencoding::encode("div,split")
        );
        debug!("Requesting daily prices from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {} URL: {}", e, symbol, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        if let Some(error) = data.chart.error {
            return Err(anyhow!(
                "Yahoo Finance error for {}: {} - {}",
                symbol,
                error.code,
                error.description
            ));
        }

        let item = data
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;

        let Some(timestamps) = item.timestamp.as_deref() else {
            debug!("No trading days since {}", start);
            return Ok(DailyPriceSeries::new());
        };
        let prices = item
            .prices(self.price_field)
            .ok_or_else(|| anyhow!("No {} prices for symbol: {}", self.price_field, symbol))?;

        let series = daily_series(timestamps, prices, item.meta.gmtoffset, start);
        debug!(days = series.len(), "Parsed daily prices");
        Ok(series)
    }
}
