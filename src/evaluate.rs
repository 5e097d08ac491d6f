//! Pass/fail evaluation of an extracted [`MetricRecord`].
//!
//! Three independent requirements are checked:
//! - latency: p95 strictly below `p95_ms`
//! - error rate: failure fraction strictly below `max_error_rate`
//! - throughput: `iterations / window_secs` at least `min_rps`

use crate::config::ThresholdConfig;
use crate::extract::{DurationStats, MetricRecord};
use serde::Serialize;

/// Outcome of a single requirement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Passed,
    Failed,
}

impl Verdict {
    fn from_bool(ok: bool) -> Self {
        if ok {
            Verdict::Passed
        } else {
            Verdict::Failed
        }
    }

    pub fn passed(self) -> bool {
        self == Verdict::Passed
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Passed => f.write_str("PASSED"),
            Verdict::Failed => f.write_str("FAILED"),
        }
    }
}

/// Headline numbers, already formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_requests: u64,
    pub error_rate: String,
    pub avg_response_time: String,
    pub p95_response_time: String,
    pub max_response_time: String,
}

/// One labelled bar of the latency chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBar {
    pub label: &'static str,
    pub value_ms: f64,
}

/// Chart-ready dataset: four duration statistics plus the SLO line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub bars: Vec<ChartBar>,
    pub threshold_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOutcome {
    pub summary: SummaryStats,
    pub latency: Verdict,
    pub error_rate: Verdict,
    pub throughput: Verdict,
    /// Requests per second over the observation window.
    pub observed_rps: f64,
    #[serde(skip)]
    pub duration: DurationStats,
    #[serde(skip)]
    pub thresholds: ThresholdConfig,
}

impl ReportOutcome {
    pub fn all_passed(&self) -> bool {
        self.latency.passed() && self.error_rate.passed() && self.throughput.passed()
    }

    /// Median, p90, p95 and average, in that order.
    pub fn chart_data(&self) -> ChartData {
        let d = &self.duration;
        ChartData {
            bars: vec![
                ChartBar {
                    label: "Median",
                    value_ms: d.med,
                },
                ChartBar {
                    label: "p90",
                    value_ms: d.p90,
                },
                ChartBar {
                    label: "p95",
                    value_ms: d.p95,
                },
                ChartBar {
                    label: "Average",
                    value_ms: d.avg,
                },
            ],
            threshold_ms: self.thresholds.p95_ms,
        }
    }
}

/// Judge a record against the thresholds.
///
/// Fails with [`ReportError::MissingMetric`] when the duration or iteration
/// block was not found in the log. A missing failure rate is not an error;
/// extraction already defaulted it to zero.
pub fn evaluate(
    record: &MetricRecord,
    thresholds: &ThresholdConfig,
) -> Result<ReportOutcome, ReportError> {
    let duration = record
        .duration
        .clone()
        .ok_or(ReportError::MissingMetric("http_req_duration"))?;
    let total = record
        .iterations
        .ok_or(ReportError::MissingMetric("iterations"))?;

    let observed_rps = total as f64 / thresholds.window_secs;

    let latency = Verdict::from_bool(duration.p95 < thresholds.p95_ms);
    let error_rate = Verdict::from_bool(record.error_rate < thresholds.max_error_rate);
    let throughput = Verdict::from_bool(observed_rps >= thresholds.min_rps);

    tracing::debug!(
        min_ms = duration.min,
        p95_ms = duration.p95,
        failure_rate = record.error_rate,
        observed_rps,
        %latency,
        %error_rate,
        %throughput,
        "evaluated requirements"
    );

    let summary = SummaryStats {
        total_requests: total,
        error_rate: format!("{:.2}%", record.error_rate * 100.0),
        avg_response_time: format!("{:.2}ms", duration.avg),
        p95_response_time: format!("{:.2}ms", duration.p95),
        max_response_time: format!("{:.2}ms", duration.max),
    };

    Ok(ReportOutcome {
        summary,
        latency,
        error_rate,
        throughput,
        observed_rps,
        duration,
        thresholds: thresholds.clone(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// A metric block required for the report was absent from the log.
    MissingMetric(&'static str),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::MissingMetric(name) => {
                write!(f, "missing metric {name:?} in load-test output")
            }
        }
    }
}

impl std::error::Error for ReportError {}
