use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from k6-report.toml.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ReportConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub thresholds: ThresholdConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_file: PathBuf,
    pub chart_file: PathBuf,
    pub chart: bool,
}

/// Service-level objective the run is judged against.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// p95 must be strictly below this many milliseconds.
    pub p95_ms: f64,
    /// Failure fraction must be strictly below this.
    pub max_error_rate: f64,
    /// Advertised target, only used in report labels.
    pub target_rps: f64,
    /// Observed throughput must reach at least this.
    pub min_rps: f64,
    /// Length of the load phase used to turn iterations into a rate.
    pub window_secs: f64,
}

// --- Default implementations ---

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("k6_output.txt"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_file: PathBuf::from("performance_report.txt"),
            chart_file: PathBuf::from("response_time_percentiles.png"),
            chart: true,
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            p95_ms: 3.0,
            max_error_rate: 0.01,
            target_rps: 5000.0,
            min_rps: 4950.0,
            window_secs: 30.0,
        }
    }
}

/// Load config from `path`. A missing file yields the defaults; a file that
/// exists but does not parse is an error.
pub fn load_config(path: &Path) -> Result<ReportConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(ReportConfig::default());
        }
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let config: ReportConfig = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;
    tracing::debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

impl ReportConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let window = self.thresholds.window_secs;
        if window.is_nan() || window <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "thresholds.window_secs must be positive, got {}",
                self.thresholds.window_secs
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}
