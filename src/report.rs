//! Plain-text performance report and console summary.

use crate::evaluate::ReportOutcome;
use crate::output::{self, OutputError};
use chrono::{DateTime, Local};
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the report body. Lines are joined with `\n` and there is no
/// trailing newline; `generated_at` is the only non-deterministic input.
pub fn render_report(outcome: &ReportOutcome, generated_at: DateTime<Local>) -> String {
    let s = &outcome.summary;
    let d = &outcome.duration;
    let t = &outcome.thresholds;

    let lines = [
        "Performance Test Results".to_string(),
        "=====================\n".to_string(),
        format!("Test Date: {}\n", generated_at.format(TIMESTAMP_FORMAT)),
        "Key Metrics:".to_string(),
        format!("- Total Requests: {}", s.total_requests),
        format!("- Error Rate: {}", s.error_rate),
        format!("- Average Response Time: {}", s.avg_response_time),
        format!("- 95th Percentile: {}", s.p95_response_time),
        format!("- Maximum Response Time: {}\n", s.max_response_time),
        "Performance Requirements Analysis:".to_string(),
        format!(
            "- Response Time Requirement (< {}ms): {}",
            format_limit(t.p95_ms),
            outcome.latency
        ),
        format!(
            "- Error Rate Requirement (< {}%): {}",
            format_limit(t.max_error_rate * 100.0),
            outcome.error_rate
        ),
        format!(
            "- Throughput Requirement ({} req/s): {}\n",
            format_limit(t.target_rps),
            outcome.throughput
        ),
        "Detailed Analysis:".to_string(),
        "- Response Time Distribution:".to_string(),
        format!("  * 50th percentile (median): {:.2}ms", d.med),
        format!("  * 90th percentile: {:.2}ms", d.p90),
        format!("  * 95th percentile: {:.2}ms", d.p95),
        format!("  * Average: {:.2}ms", d.avg),
    ];

    lines.join("\n")
}

/// Threshold as shown in labels: at most four decimals, trailing zeros
/// dropped, so `0.07 * 100.0` reads `7` and `3.0` reads `3`.
pub fn format_limit(value: f64) -> String {
    let fixed = format!("{value:.4}");
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Render and atomically write the report to `path`.
pub fn write_report(
    path: &Path,
    outcome: &ReportOutcome,
    generated_at: DateTime<Local>,
) -> Result<(), OutputError> {
    let text = render_report(outcome, generated_at);
    output::write_atomic(path, text.as_bytes())?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}

/// Console banner printed after a successful run.
pub fn render_console_summary(outcome: &ReportOutcome, written: &[&Path]) -> String {
    let s = &outcome.summary;
    let mut out = String::new();
    out.push_str("\n=== Performance Analysis Results ===\n");
    out.push_str("\nKey Performance Metrics:\n");
    out.push_str(&format!("- Total Requests: {}\n", s.total_requests));
    out.push_str(&format!("- Error Rate: {}\n", s.error_rate));
    out.push_str(&format!("- Average Response Time: {}\n", s.avg_response_time));
    out.push_str(&format!("- 95th Percentile: {}\n", s.p95_response_time));

    if !written.is_empty() {
        out.push_str("\nDetailed results have been saved to:\n");
        for path in written {
            out.push_str(&format!("- {}\n", path.display()));
        }
    }
    out
}
