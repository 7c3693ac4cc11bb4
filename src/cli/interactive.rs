use super::report::{ReportRequest, write_outputs};
use super::ui;
use crate::core::ReportService;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

const QUIT_COMMANDS: [&str; 3] = ["q", "quit", "exit"];

/// Reads one trimmed line. `None` on EOF or a quit command.
async fn prompt<R, W>(
    reader: &mut R,
    out: &mut W,
    label: &str,
    default: &str,
) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(
        out,
        "{} {}: ",
        ui::style_text(label, ui::StyleType::Label),
        ui::style_text(&format!("[{default}]"), ui::StyleType::Subtle)
    )?;
    out.flush()?;

    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    let line = line.trim();
    if QUIT_COMMANDS.contains(&line.to_lowercase().as_str()) {
        return Ok(None);
    }
    Ok(Some(if line.is_empty() {
        default.to_string()
    } else {
        line.to_string()
    }))
}

/// Prompt loop: every submitted ticker list and start date is one request to
/// `service`. Errors are reported and the loop continues; repeated queries
/// are answered from the service cache.
pub async fn run_session<R, W>(
    service: &ReportService<'_>,
    defaults: &ReportRequest,
    reader: &mut R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        out,
        "{}",
        ui::style_text(
            "Compare four stocks against the S&P 500 Index. Type 'quit' to exit.",
            ui::StyleType::Subtle
        )
    )?;

    loop {
        let Some(tickers) = prompt(reader, out, "Tickers", &defaults.tickers).await? else {
            break;
        };
        let default_start = defaults.start.format("%Y-%m-%d").to_string();
        let Some(start) = prompt(reader, out, "Start date", &default_start).await? else {
            break;
        };

        let start = match NaiveDate::parse_from_str(&start, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                writeln!(
                    out,
                    "{}",
                    ui::style_text(
                        &format!("Invalid start date '{start}': {e}"),
                        ui::StyleType::Error
                    )
                )?;
                continue;
            }
        };

        debug!(%tickers, %start, "Interactive query");
        match service.report(&tickers, start).await {
            Ok(report) => {
                writeln!(out, "{}", report.display_as_table())?;
                let request = ReportRequest {
                    tickers,
                    start,
                    ..defaults.clone()
                };
                if let Err(e) = write_outputs(&report, &request) {
                    writeln!(out, "{}", ui::style_text(&format!("{e:#}"), ui::StyleType::Error))?;
                }
            }
            Err(e) => {
                writeln!(out, "{}", ui::style_text(&e.to_string(), ui::StyleType::Error))?;
            }
        }
    }

    writeln!(out).context("Failed to write to output")?;
    Ok(())
}
