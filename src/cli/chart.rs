use crate::core::MonthlyReport;
use crate::core::monthly::change_label;
use anyhow::{Context, Result};
use plotters::prelude::*;
use std::path::Path;

const CHART_SIZE: (u32, u32) = (1200, 640);

const SERIES_COLORS: [RGBColor; 5] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
];

/// Splits a series into runs of consecutive months with data, so that a
/// missing month leaves a gap instead of being bridged.
fn segments(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => current.push((i as f64, *v)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Label and monthly % change for every plotted line, index first.
fn change_series(report: &MonthlyReport) -> Vec<(String, Vec<Option<f64>>)> {
    let mut series = vec![(
        "Index % Change".to_string(),
        report.records.iter().map(|r| r.index_change).collect(),
    )];
    for (i, symbol) in report.symbols.iter().enumerate() {
        series.push((
            change_label(symbol),
            report
                .records
                .iter()
                .map(|r| r.symbol_changes.get(i).copied().flatten())
                .collect(),
        ));
    }
    series
}

fn y_range(series: &[(String, Vec<Option<f64>>)]) -> (f64, f64) {
    let (min, max) = series
        .iter()
        .flat_map(|(_, values)| values.iter().flatten())
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let pad = ((max - min) * 0.1).max(1.0);
    (min - pad, max + pad)
}

/// Renders the percent change lines against month as an SVG document, with a
/// zero reference line.
pub fn render_svg(report: &MonthlyReport) -> Result<String> {
    let series = change_series(report);
    let (y_min, y_max) = y_range(&series);
    let x_max = (report.records.len().saturating_sub(1) as f64).max(1.0);
    let months: Vec<String> = report
        .records
        .iter()
        .map(|r| r.month_end.format("%b %Y").to_string())
        .collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Monthly % Change", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..x_max, y_min..y_max)?;

        let x_formatter = |x: &f64| {
            let i = x.round();
            if (x - i).abs() > f64::EPSILON || i < 0.0 {
                return String::new();
            }
            months.get(i as usize).cloned().unwrap_or_default()
        };
        chart
            .configure_mesh()
            .x_labels(months.len().clamp(2, 12))
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&|y: &f64| format!("{y:.0}%"))
            .y_desc("% change")
            .draw()?;

        chart.draw_series(LineSeries::new(
            vec![(0.0, 0.0), (x_max, 0.0)],
            BLACK.mix(0.6).stroke_width(1),
        ))?;

        for (i, (label, values)) in series.iter().enumerate() {
            let color = SERIES_COLORS[i % SERIES_COLORS.len()];
            for (n, run) in segments(values).into_iter().enumerate() {
                let drawn = chart.draw_series(LineSeries::new(run, color.stroke_width(2)))?;
                if n == 0 {
                    drawn.label(label.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                }
            }
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .position(SeriesLabelPosition::UpperLeft)
            .draw()?;

        root.present()?;
    }
    Ok(svg)
}

pub fn write_chart(report: &MonthlyReport, path: &Path) -> Result<()> {
    let svg = render_svg(report).context("Failed to render chart")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, svg)
        .with_context(|| format!("Failed to write chart to {}", path.display()))
}
