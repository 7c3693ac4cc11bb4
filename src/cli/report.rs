use super::{chart, export, ui};
use crate::core::{MonthlyReport, ReportService};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use std::path::PathBuf;
use tracing::info;

/// Everything one report run needs, after CLI flags and config are merged.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub tickers: String,
    pub start: NaiveDate,
    pub csv_path: Option<PathBuf>,
    pub chart_path: Option<PathBuf>,
}

impl MonthlyReport {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(
            self.column_labels()
                .iter()
                .map(|label| ui::header_cell(label))
                .collect::<Vec<_>>(),
        );

        for record in &self.records {
            let mut row = vec![
                Cell::new(record.month_end.format("%Y-%m-%d")),
                ui::format_optional_cell(record.index_open, |p| format!("{p:.2}")),
                ui::format_optional_cell(record.index_close, |p| format!("{p:.2}")),
                ui::optional_change_cell(record.index_change),
            ];
            row.extend(
                record
                    .symbol_changes
                    .iter()
                    .map(|change| ui::optional_change_cell(*change)),
            );
            table.add_row(row);
        }

        let mut output = format!(
            "{}\n{}\n\n",
            ui::style_text("Monthly Performance Summary", ui::StyleType::Title),
            ui::style_text(
                &format!("{} vs {}", self.symbols.join(", "), self.index_symbol),
                ui::StyleType::Subtle
            )
        );
        output.push_str(&table.to_string());
        output
    }
}

/// Fetches, aggregates and renders one report. Validation problems are shown
/// to the user and are not treated as failures.
pub async fn run(service: &ReportService<'_>, request: &ReportRequest) -> Result<()> {
    let pb = ui::new_spinner("Fetching daily prices...");
    let result = service.report(&request.tickers, request.start).await;
    pb.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) if e.is_validation() => {
            eprintln!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", report.display_as_table());
    write_outputs(&report, request)
}

/// Writes the optional CSV and chart files for a report.
pub fn write_outputs(report: &MonthlyReport, request: &ReportRequest) -> Result<()> {
    if let Some(path) = &request.csv_path {
        export::export_csv(report, path)?;
        info!("Wrote CSV to {}", path.display());
        println!("CSV saved to {}", path.display());
    }
    if let Some(path) = &request.chart_path {
        chart::write_chart(report, path)?;
        info!("Wrote chart to {}", path.display());
        println!("Chart saved to {}", path.display());
    }
    Ok(())
}
