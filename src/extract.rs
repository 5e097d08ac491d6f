/// Metric extraction: turn a k6 end-of-test summary into a [`MetricRecord`].
///
/// Two input shapes are understood:
/// - the human-readable summary k6 prints to stdout, matched with regexes
/// - the JSON document written by `k6 run --summary-export`
///
/// Only three metric families are read: `http_req_duration`, `iterations`
/// and `http_req_failed`.
use crate::value::{clean_value, ValueError};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;

/// `max` is printed in ms while the other trend stats are in µs.
static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"http_req_duration.*?avg=([\d.]+µs)\s+min=([\d.]+µs)\s+med=([\d.]+µs)\s+max=([\d.]+ms)\s+p\(90\)=([\d.]+µs)\s+p\(95\)=([\d.]+µs)",
    )
    .unwrap()
});

static ITERATIONS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\biterations\.*?:\s*([\d,]+)(?:\s|$)").unwrap());

static FAILED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http_req_failed.*?:\s*([\d.]+%)").unwrap());

/// Request duration distribution, all values in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationStats {
    pub avg: f64,
    pub min: f64,
    pub med: f64,
    pub max: f64,
    pub p90: f64,
    pub p95: f64,
}

/// Everything extracted from one load-test log.
///
/// `duration` and `iterations` stay `None` when their block is missing;
/// `error_rate` falls back to 0.0 because older k6 builds never print it.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub duration: Option<DurationStats>,
    pub iterations: Option<u64>,
    pub error_rate: f64,
}

/// Read a file and extract metrics from it.
pub fn extract_from_file(path: &Path) -> Result<MetricRecord, ExtractError> {
    let text = std::fs::read_to_string(path).map_err(|e| ExtractError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    extract_metrics(&text)
}

/// Dispatch on input shape: JSON summary export or human-readable summary.
pub fn extract_metrics(text: &str) -> Result<MetricRecord, ExtractError> {
    let record = if text.trim_start().starts_with('{') {
        tracing::debug!("input looks like a JSON summary export");
        parse_summary_export(text)?
    } else {
        parse_k6_metrics(text)?
    };

    tracing::debug!(
        duration = record.duration.is_some(),
        iterations = ?record.iterations,
        error_rate = record.error_rate,
        "extracted metrics"
    );
    Ok(record)
}

/// Pattern-match the human-readable k6 summary.
pub fn parse_k6_metrics(text: &str) -> Result<MetricRecord, ExtractError> {
    let duration = match DURATION_PATTERN.captures(text) {
        Some(caps) => {
            let field = |name: &'static str, idx: usize| {
                clean_value(&caps[idx]).map_err(|e| ExtractError::InvalidValue {
                    field: name,
                    source: e,
                })
            };
            Some(DurationStats {
                avg: field("http_req_duration.avg", 1)?,
                min: field("http_req_duration.min", 2)?,
                med: field("http_req_duration.med", 3)?,
                max: field("http_req_duration.max", 4)?,
                p90: field("http_req_duration.p90", 5)?,
                p95: field("http_req_duration.p95", 6)?,
            })
        }
        None => {
            tracing::debug!("no http_req_duration block found");
            None
        }
    };

    let iterations = match ITERATIONS_PATTERN.captures(text) {
        Some(caps) => Some(parse_count(&caps[1])?),
        None => {
            tracing::debug!("no iterations line found");
            None
        }
    };

    let error_rate = match FAILED_PATTERN.captures(text) {
        Some(caps) => clean_value(&caps[1]).map_err(|e| ExtractError::InvalidValue {
            field: "http_req_failed",
            source: e,
        })?,
        None => 0.0,
    };

    Ok(MetricRecord {
        duration,
        iterations,
        error_rate,
    })
}

/// Strip thousands separators and parse an iteration count.
fn parse_count(raw: &str) -> Result<u64, ExtractError> {
    let digits = raw.replace(',', "");
    digits.parse::<u64>().map_err(|_| ExtractError::InvalidValue {
        field: "iterations",
        source: ValueError::Unparseable {
            token: raw.to_string(),
        },
    })
}

/// Read the `--summary-export` JSON document. Trend values there are
/// already milliseconds and rates are already fractions.
pub fn parse_summary_export(text: &str) -> Result<MetricRecord, ExtractError> {
    let root: Value = serde_json::from_str(text).map_err(ExtractError::Json)?;
    let metrics = root.get("metrics").unwrap_or(&Value::Null);

    let duration = metrics.get("http_req_duration").and_then(|d| {
        Some(DurationStats {
            avg: d.get("avg")?.as_f64()?,
            min: d.get("min")?.as_f64()?,
            med: d.get("med")?.as_f64()?,
            max: d.get("max")?.as_f64()?,
            p90: d.get("p(90)")?.as_f64()?,
            p95: d.get("p(95)")?.as_f64()?,
        })
    });
    if duration.is_none() {
        tracing::debug!("summary export has no complete http_req_duration trend");
    }

    let iterations = metrics
        .get("iterations")
        .and_then(|i| i.get("count"))
        .and_then(|c| c.as_u64().or_else(|| c.as_f64().map(|f| f as u64)));

    let error_rate = metrics
        .get("http_req_failed")
        .and_then(|f| f.get("value").or_else(|| f.get("rate")))
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);

    Ok(MetricRecord {
        duration,
        iterations,
        error_rate,
    })
}

#[derive(Debug)]
pub enum ExtractError {
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    InvalidValue {
        field: &'static str,
        source: ValueError,
    },
    Json(serde_json::Error),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ExtractError::InvalidValue { field, source } => {
                write!(f, "invalid value for {field}: {source}")
            }
            ExtractError::Json(e) => write!(f, "malformed summary export: {e}"),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Read { source, .. } => Some(source),
            ExtractError::InvalidValue { source, .. } => Some(source),
            ExtractError::Json(e) => Some(e),
        }
    }
}
