/// One analysis run: read the log, evaluate it, write the chart and report.
use crate::chart::{self, ChartError};
use crate::config::{ConfigError, ReportConfig, ThresholdConfig};
use crate::evaluate::{self, ReportError, ReportOutcome};
use crate::extract::{self, ExtractError};
use crate::output::OutputError;
use crate::report;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Fully resolved settings for a run (config file merged with CLI flags).
#[derive(Debug, Clone)]
pub struct Analysis {
    pub input: PathBuf,
    pub report_file: PathBuf,
    /// `None` skips chart rendering.
    pub chart_file: Option<PathBuf>,
    pub thresholds: ThresholdConfig,
}

impl Analysis {
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            input: config.input.file.clone(),
            report_file: config.output.report_file.clone(),
            chart_file: config
                .output
                .chart
                .then(|| config.output.chart_file.clone()),
            thresholds: config.thresholds.clone(),
        }
    }

    /// Files this run writes, in the order they are produced.
    pub fn outputs(&self) -> Vec<&Path> {
        let mut out = Vec::new();
        out.push(self.report_file.as_path());
        if let Some(chart) = &self.chart_file {
            out.push(chart.as_path());
        }
        out
    }
}

/// Run the analysis. Nothing is written unless extraction and evaluation
/// both succeed.
pub fn run(job: &Analysis) -> Result<ReportOutcome, AnalysisError> {
    tracing::info!(input = %job.input.display(), "analyzing load-test output");

    let record = extract::extract_from_file(&job.input)?;
    let outcome = evaluate::evaluate(&record, &job.thresholds)?;

    if let Some(path) = &job.chart_file {
        chart::render_chart(path, &outcome.chart_data())?;
    }
    report::write_report(&job.report_file, &outcome, Local::now())?;

    if outcome.all_passed() {
        tracing::info!("all performance requirements passed");
    } else {
        tracing::warn!(
            latency = %outcome.latency,
            error_rate = %outcome.error_rate,
            throughput = %outcome.throughput,
            "performance requirements not met"
        );
    }
    Ok(outcome)
}

#[derive(Debug)]
pub enum AnalysisError {
    Config(ConfigError),
    Extract(ExtractError),
    Report(ReportError),
    Output(OutputError),
    Chart(ChartError),
    Json(serde_json::Error),
}

impl From<ConfigError> for AnalysisError {
    fn from(e: ConfigError) -> Self {
        AnalysisError::Config(e)
    }
}

impl From<ExtractError> for AnalysisError {
    fn from(e: ExtractError) -> Self {
        AnalysisError::Extract(e)
    }
}

impl From<ReportError> for AnalysisError {
    fn from(e: ReportError) -> Self {
        AnalysisError::Report(e)
    }
}

impl From<OutputError> for AnalysisError {
    fn from(e: OutputError) -> Self {
        AnalysisError::Output(e)
    }
}

impl From<ChartError> for AnalysisError {
    fn from(e: ChartError) -> Self {
        AnalysisError::Chart(e)
    }
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::Config(e) => write!(f, "configuration error: {e}"),
            AnalysisError::Extract(e) => write!(f, "extraction error: {e}"),
            AnalysisError::Report(e) => write!(f, "evaluation error: {e}"),
            AnalysisError::Output(e) => write!(f, "output error: {e}"),
            AnalysisError::Chart(e) => write!(f, "chart error: {e}"),
            AnalysisError::Json(e) => write!(f, "failed to serialize summary: {e}"),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalysisError::Config(e) => Some(e),
            AnalysisError::Extract(e) => Some(e),
            AnalysisError::Report(e) => Some(e),
            AnalysisError::Output(e) => Some(e),
            AnalysisError::Chart(e) => Some(e),
            AnalysisError::Json(e) => Some(e),
        }
    }
}
