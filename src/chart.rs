/// Bar chart of the response-time distribution with the latency SLO drawn
/// as a dashed horizontal line.
use crate::evaluate::ChartData;
use crate::output::{self, OutputError};
use crate::report::format_limit;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

const SIZE: (u32, u32) = (1200, 600);
const BAR_COLOR: RGBColor = RGBColor(135, 206, 235);
const FONT: &str = "sans-serif";

/// Render `data` as a PNG at `path`. The image is drawn into a staging file
/// first and only renamed into place once the encoder has finished.
pub fn render_chart(path: &Path, data: &ChartData) -> Result<(), ChartError> {
    output::ensure_parent(path)?;
    let staged = output::staging_path(path);

    if let Err(e) = draw(&staged, data) {
        let _ = std::fs::remove_file(&staged);
        return Err(ChartError::Draw(e.to_string()));
    }
    output::commit(&staged, path)?;

    tracing::info!(path = %path.display(), "chart written");
    Ok(())
}

fn draw(path: &Path, data: &ChartData) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let labels: Vec<&str> = data.bars.iter().map(|b| b.label).collect();
    let threshold = data.threshold_ms;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("Response Time Distribution", (FONT, 24).into_font())
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((0..data.bars.len()).into_segmented(), 0.0..y_upper_bound(data))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(&BLACK.mix(0.15))
        .light_line_style(&TRANSPARENT)
        .y_desc("Time (ms)")
        .y_label_formatter(&|v| format!("{v:.2}"))
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => labels.get(*i).map(|s| s.to_string()).unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR_COLOR.filled())
            .margin(30)
            .data(data.bars.iter().enumerate().map(|(i, b)| (i, b.value_ms))),
    )?;

    chart
        .draw_series(DashedLineSeries::new(
            vec![
                (SegmentValue::Exact(0), threshold),
                (SegmentValue::Last, threshold),
            ],
            10,
            6,
            RED.stroke_width(2),
        ))?
        .label(format!("{}ms Requirement", format_limit(threshold)))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

    let label_style =
        TextStyle::from((FONT, 16).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(data.bars.iter().enumerate().map(|(i, b)| {
        Text::new(
            value_label(b.value_ms),
            (SegmentValue::CenterOf(i), b.value_ms),
            label_style.clone(),
        )
    }))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Text drawn above each bar.
fn value_label(ms: f64) -> String {
    format!("{ms:.3}ms")
}

/// Top of the y axis: leave headroom above both the tallest bar and the
/// threshold line so neither the value labels nor the legend get clipped.
fn y_upper_bound(data: &ChartData) -> f64 {
    let top = data
        .bars
        .iter()
        .map(|b| b.value_ms)
        .fold(data.threshold_ms, f64::max);
    if top > 0.0 {
        top * 1.15
    } else {
        1.0
    }
}

#[derive(Debug)]
pub enum ChartError {
    Output(OutputError),
    Draw(String),
}

impl From<OutputError> for ChartError {
    fn from(e: OutputError) -> Self {
        ChartError::Output(e)
    }
}

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartError::Output(e) => write!(f, "failed to save chart: {e}"),
            ChartError::Draw(msg) => write!(f, "failed to draw chart: {msg}"),
        }
    }
}

impl std::error::Error for ChartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChartError::Output(e) => Some(e),
            ChartError::Draw(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::ChartBar;
    use tempfile::tempdir;

    fn data(values: [f64; 4], threshold_ms: f64) -> ChartData {
        let labels = ["Median", "p90", "p95", "Average"];
        ChartData {
            bars: labels
                .into_iter()
                .zip(values)
                .map(|(label, value_ms)| ChartBar { label, value_ms })
                .collect(),
            threshold_ms,
        }
    }

    #[test]
    fn axis_covers_threshold_when_bars_are_small() {
        let top = y_upper_bound(&data([0.1, 0.3, 0.45, 0.12], 3.0));
        assert!((top - 3.45).abs() < 1e-9);
    }

    #[test]
    fn axis_covers_tallest_bar() {
        let top = y_upper_bound(&data([4.0, 8.0, 10.0, 5.0], 3.0));
        assert!((top - 11.5).abs() < 1e-9);
    }

    #[test]
    fn axis_never_empty() {
        assert_eq!(y_upper_bound(&data([0.0; 4], 0.0)), 1.0);
    }

    #[test]
    fn bar_labels_use_three_decimals() {
        assert_eq!(value_label(0.45), "0.450ms");
        assert_eq!(value_label(2.0), "2.000ms");
    }

    #[test]
    fn renders_png_without_leftover_staging_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("charts").join("response_time_percentiles.png");
        render_chart(&path, &data([0.1, 0.3, 0.45, 0.12], 3.0)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
        assert!(!output::staging_path(&path).exists());
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn rerender_replaces_existing_chart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("response_time_percentiles.png");
        std::fs::write(&path, b"stale").unwrap();
        render_chart(&path, &data([4.0, 8.0, 10.0, 5.0], 2.5)).unwrap();
        assert!(std::fs::read(&path).unwrap().starts_with(b"\x89PNG"));
    }
}
