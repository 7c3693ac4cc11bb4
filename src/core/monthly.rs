//! Monthly resampling of daily prices and per-symbol percentage change.

use super::price::{DailyPriceSeries, PriceHistory};
use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Months, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// One calendar month of the comparison. `None` means the symbol had no
/// trading day in that month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRecord {
    pub month_end: NaiveDate,
    pub index_open: Option<f64>,
    pub index_close: Option<f64>,
    pub index_change: Option<f64>,
    /// Percent change per comparison symbol, in `MonthlyReport::symbols` order.
    pub symbol_changes: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReport {
    pub index_symbol: String,
    pub symbols: Vec<String>,
    pub records: Vec<MonthlyRecord>,
}

impl MonthlyReport {
    /// Column labels in display order, `Date` first.
    pub fn column_labels(&self) -> Vec<String> {
        let mut labels = vec![
            "Date".to_string(),
            "Index Open".to_string(),
            "Index Close".to_string(),
            "Index % Change".to_string(),
        ];
        labels.extend(self.symbols.iter().map(|s| change_label(s)));
        labels
    }
}

pub fn change_label(symbol: &str) -> String {
    format!("{symbol} % Chg")
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// `None` when the month opened at zero, since no finite change exists.
pub fn percent_change(open: f64, close: f64) -> Option<f64> {
    let change = (close / open - 1.0) * 100.0;
    change.is_finite().then_some(change)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenClose {
    open: f64,
    close: f64,
}

impl OpenClose {
    fn change(&self) -> Option<f64> {
        percent_change(self.open, self.close)
    }
}

fn resample(series: &DailyPriceSeries) -> Result<BTreeMap<NaiveDate, OpenClose>> {
    let mut months: BTreeMap<NaiveDate, OpenClose> = BTreeMap::new();
    for (date, price) in series {
        let key = month_end(*date).ok_or_else(|| anyhow!("Date out of range: {date}"))?;
        months
            .entry(key)
            .and_modify(|m| m.close = *price)
            .or_insert(OpenClose {
                open: *price,
                close: *price,
            });
    }
    Ok(months)
}

/// Resamples the index and every comparison symbol to monthly open/close and
/// builds one record per calendar month between the earliest and latest
/// trading day found in `history`.
pub fn aggregate(
    history: &PriceHistory,
    index_symbol: &str,
    symbols: &[String],
) -> Result<MonthlyReport> {
    let requested: Vec<&str> = std::iter::once(index_symbol)
        .chain(symbols.iter().map(String::as_str))
        .collect();

    let mut series = Vec::with_capacity(requested.len());
    for symbol in &requested {
        let daily = history
            .get(*symbol)
            .ok_or_else(|| anyhow!("No price data returned for symbol: {symbol}"))?;
        series.push(resample(daily).with_context(|| format!("Failed to resample {symbol}"))?);
    }

    let first = series.iter().filter_map(|m| m.keys().next()).min().copied();
    let last = series.iter().filter_map(|m| m.keys().next_back()).max().copied();
    let (Some(first), Some(last)) = (first, last) else {
        return Err(anyhow!(
            "No price data returned for symbols: {}",
            requested.join(", ")
        ));
    };

    let (index_months, symbol_months) = series.split_at(1);
    let index_months = &index_months[0];

    let mut records = Vec::new();
    let mut current = first;
    while current <= last {
        let index = index_months.get(&current);
        records.push(MonthlyRecord {
            month_end: current,
            index_open: index.map(|m| m.open),
            index_close: index.map(|m| m.close),
            index_change: index.and_then(OpenClose::change),
            symbol_changes: symbol_months
                .iter()
                .map(|months| months.get(&current).and_then(OpenClose::change))
                .collect(),
        });

        let next = current
            .succ_opt()
            .and_then(month_end)
            .ok_or_else(|| anyhow!("Date out of range after {current}"))?;
        current = next;
    }

    debug!(
        months = records.len(),
        from = %first,
        to = %last,
        "Aggregated monthly records"
    );

    Ok(MonthlyReport {
        index_symbol: index_symbol.to_string(),
        symbols: symbols.to_vec(),
        records,
    })
}
