use crate::core::MonthlyReport;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

fn raw(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes the unformatted monthly records as CSV. Missing values become
/// empty fields.
pub fn write_csv<W: Write>(report: &MonthlyReport, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(report.column_labels())?;

    for record in &report.records {
        let mut row = vec![
            record.month_end.format("%Y-%m-%d").to_string(),
            raw(record.index_open),
            raw(record.index_close),
            raw(record.index_change),
        ];
        row.extend(record.symbol_changes.iter().map(|c| raw(*c)));
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn export_csv(report: &MonthlyReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    write_csv(report, file).with_context(|| format!("Failed to write CSV to {}", path.display()))
}
