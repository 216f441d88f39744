use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use bytes::Bytes;
use plotters::prelude::*;
use plotters::style::register_font;

use super::ExportArtifact;
use crate::error::ExportError;
use crate::series::ChartSeries;

pub const PNG_MIME: &str = "image/png";
pub const SNAPSHOT_SIZE: (u32, u32) = (1280, 720);

const LINE_COLORS: [RGBColor; 2] = [RGBColor(200, 16, 46), RGBColor(16, 46, 200)];
const MAX_X_LABELS: usize = 12;

const FONT_FAMILY: &str = "sans-serif";
static CHART_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static FONT_READY: OnceLock<bool> = OnceLock::new();

/// Registers the bundled font under the family every chart element draws with.
fn ensure_font() -> Result<(), ExportError> {
    let ready = *FONT_READY
        .get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, CHART_FONT).is_ok());
    if ready {
        Ok(())
    } else {
        Err(ExportError::Snapshot("bundled chart font could not be loaded".to_string()))
    }
}

pub fn snapshot_id(chart_index: usize) -> String {
    format!("chart-{chart_index}")
}

/// Rasterizes one chart series to PNG. Only reads `series`.
pub fn render_snapshot(series: &ChartSeries, id: &str) -> Result<ExportArtifact, ExportError> {
    ensure_font()?;
    let scratch = tempfile::Builder::new()
        .prefix("sensorgraph-")
        .suffix(".png")
        .tempfile()
        .map_err(|err| ExportError::Snapshot(err.to_string()))?;

    draw_chart(scratch.path(), series).map_err(|err| ExportError::Snapshot(format!("{err:#}")))?;
    let bytes =
        std::fs::read(scratch.path()).map_err(|err| ExportError::Snapshot(err.to_string()))?;

    Ok(ExportArtifact {
        file_name: format!("{id}.png"),
        mime_type: PNG_MIME,
        bytes: Bytes::from(bytes),
    })
}

fn value_range(series: &ChartSeries) -> (f64, f64) {
    let values = series
        .lines()
        .flat_map(|line| line.points.iter().flatten().copied())
        .map(|value| value as f64);
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.1).max(1.0);
    (min.min(0.0), max + pad)
}

fn draw_chart(path: &Path, series: &ChartSeries) -> Result<()> {
    let root = BitMapBackend::new(path, SNAPSHOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (y_min, y_max) = value_range(series);
    let x_max = series.len().max(1);
    let labels = &series.labels;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} ({})", series.title, series.unit), (FONT_FAMILY, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0usize..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_labels(labels.len().clamp(1, MAX_X_LABELS))
        .x_label_formatter(&|idx| labels.get(*idx).cloned().unwrap_or_default())
        .y_label_formatter(&|v| format!("{:.0}", v))
        .draw()?;

    for (line, color) in series.lines().zip(LINE_COLORS) {
        let legend = match line.average {
            Some(_) => format!("{} (avg {})", line.legend, line.display_average()),
            None => format!("{} (no average)", line.legend),
        };
        chart
            .draw_series(LineSeries::new(
                line.points
                    .iter()
                    .enumerate()
                    .filter_map(|(idx, point)| point.map(|value| (idx, value as f64))),
                &color,
            ))?
            .label(legend)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present().context("failed to encode chart snapshot")?;
    Ok(())
}
