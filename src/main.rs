mod analyze;
mod chart;
mod config;
mod evaluate;
mod extract;
mod output;
mod report;
mod value;

use analyze::{Analysis, AnalysisError};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Summarize a k6 load-test log: extract latency, throughput and error
/// metrics, judge them against the service-level objective, and write a
/// text report plus a latency bar chart.
#[derive(Parser, Debug)]
#[command(name = "k6-report", version, about)]
pub struct Cli {
    /// k6 output to analyze: the printed summary or a --summary-export JSON
    /// file (default: from config, k6_output.txt)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, default_value = "k6-report.toml")]
    config: PathBuf,

    /// Report file path (overrides config)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Chart image path (overrides config)
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long)]
    no_chart: bool,

    /// Print summary statistics and verdicts as JSON instead of the banner
    #[arg(long)]
    json: bool,

    /// Extra logging (pattern matches, threshold decisions)
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);
    tracing::debug!(?cli, "parsed CLI arguments");

    if let Err(e) = run(&cli) {
        println!("Error during analysis: {e}");
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            println!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "k6_report=debug"
    } else if cli.quiet {
        "k6_report=error"
    } else {
        "k6_report=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), AnalysisError> {
    let config = config::load_config(&cli.config)?;
    let job = resolve(cli, &config);
    let outcome = analyze::run(&job)?;

    if cli.json {
        println!("{}", render_json(&outcome)?);
    } else {
        print!("{}", report::render_console_summary(&outcome, &job.outputs()));
    }
    Ok(())
}

fn render_json(outcome: &evaluate::ReportOutcome) -> Result<String, AnalysisError> {
    serde_json::to_string_pretty(outcome).map_err(AnalysisError::Json)
}

/// Merge CLI overrides on top of the config file.
fn resolve(cli: &Cli, config: &config::ReportConfig) -> Analysis {
    let mut job = Analysis::from_config(config);
    if let Some(input) = &cli.input {
        job.input = input.clone();
    }
    if let Some(report) = &cli.report {
        job.report_file = report.clone();
    }
    if let Some(chart) = &cli.chart {
        job.chart_file = Some(chart.clone());
    }
    if cli.no_chart {
        job.chart_file = None;
    }
    job
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("k6-report").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_without_arguments() {
        let cli = parse(&[]);
        let job = resolve(&cli, &config::ReportConfig::default());
        assert_eq!(job.input, PathBuf::from("k6_output.txt"));
        assert_eq!(job.report_file, PathBuf::from("performance_report.txt"));
        assert_eq!(
            job.chart_file,
            Some(PathBuf::from("response_time_percentiles.png"))
        );
        assert_eq!(cli.config, PathBuf::from("k6-report.toml"));
    }

    #[test]
    fn positional_input_overrides_config() {
        let cli = parse(&["results/run-42.txt"]);
        let job = resolve(&cli, &config::ReportConfig::default());
        assert_eq!(job.input, PathBuf::from("results/run-42.txt"));
    }

    #[test]
    fn output_overrides() {
        let cli = parse(&["--report", "r.txt", "--chart", "c.png"]);
        let job = resolve(&cli, &config::ReportConfig::default());
        assert_eq!(job.report_file, PathBuf::from("r.txt"));
        assert_eq!(job.chart_file, Some(PathBuf::from("c.png")));
    }

    #[test]
    fn no_chart_wins_over_chart_path() {
        let cli = parse(&["--chart", "c.png", "--no-chart"]);
        let job = resolve(&cli, &config::ReportConfig::default());
        assert_eq!(job.chart_file, None);
    }

    #[test]
    fn json_summary_has_verdicts() {
        let record = extract::parse_k6_metrics(
            "http_req_duration: avg=120µs min=50µs med=100µs max=2ms p(90)=300µs p(95)=450µs\niterations: 150,000\n",
        )
        .unwrap();
        let outcome =
            evaluate::evaluate(&record, &config::ThresholdConfig::default()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&outcome).unwrap()).unwrap();
        assert_eq!(json["summary"]["total_requests"], 150_000);
        assert_eq!(json["latency"], "PASSED");
        assert_eq!(json["throughput"], "PASSED");
    }

    #[test]
    fn json_failure_is_an_analysis_error() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = AnalysisError::Json(cause);
        assert!(err.to_string().starts_with("failed to serialize summary"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let res = Cli::try_parse_from(["k6-report", "-v", "-q"]);
        assert!(res.is_err());
    }
}
