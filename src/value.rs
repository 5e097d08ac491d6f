//! Unit normalization for k6 metric tokens.
//!
//! k6 prints values like `120µs`, `2.01ms`, `1.5s`, `2.50%` or
//! `4960.674276/s`. Everything is folded into one convention per family:
//! milliseconds for durations, a 0-1 fraction for percentages, the bare
//! magnitude for rates and counts.

/// Marker checks in precedence order. First match wins.
const MICROS: &[&str] = &["µs", "us"];
const MILLIS: &str = "ms";
const SECONDS: &str = "s";
const PERCENT: &str = "%";
const RATE_SEPARATOR: char = '/';

/// Normalize a single token into milliseconds, a fraction, or a raw count.
pub fn clean_value(token: &str) -> Result<f64, ValueError> {
    let value = token.trim();

    for marker in MICROS {
        if let Some(n) = magnitude(value, marker) {
            return Ok(n / 1000.0);
        }
    }
    if let Some(n) = magnitude(value, MILLIS) {
        return Ok(n);
    }
    if let Some(n) = magnitude(value, SECONDS) {
        return Ok(n * 1000.0);
    }
    if let Some(n) = magnitude(value, PERCENT) {
        return Ok(n / 100.0);
    }
    if let Some((head, _unit)) = value.split_once(RATE_SEPARATOR) {
        if let Ok(n) = head.trim().parse::<f64>() {
            return Ok(n);
        }
    }

    value.parse::<f64>().map_err(|_| ValueError::Unparseable {
        token: token.to_string(),
    })
}

/// Numeric part of `value` when it is exactly `<number><marker>`.
fn magnitude(value: &str, marker: &str) -> Option<f64> {
    value
        .strip_suffix(marker)
        .and_then(|n| n.trim_end().parse::<f64>().ok())
}

/// A token that no unit rule could turn into a number.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueError {
    Unparseable { token: String },
}

impl std::fmt::Display for ValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueError::Unparseable { token } => {
                write!(f, "cannot normalize metric value {token:?}")
            }
        }
    }
}

impl std::error::Error for ValueError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn micros_divide_by_thousand() {
        assert!(approx(clean_value("3.2µs").unwrap(), 0.0032));
        assert!(approx(clean_value("450µs").unwrap(), 0.45));
        assert!(approx(clean_value("1000µs").unwrap(), 1.0));
    }

    #[test]
    fn ascii_micro_marker() {
        assert!(approx(clean_value("250us").unwrap(), 0.25));
    }

    #[test]
    fn millis_pass_through() {
        assert_eq!(clean_value("12.5ms").unwrap(), 12.5);
        assert_eq!(clean_value("2ms").unwrap(), 2.0);
    }

    #[test]
    fn seconds_multiply_by_thousand() {
        assert_eq!(clean_value("1.0s").unwrap(), 1000.0);
        assert_eq!(clean_value("0.25s").unwrap(), 250.0);
    }

    #[test]
    fn percent_becomes_fraction() {
        assert_eq!(clean_value("2.50%").unwrap(), 0.025);
        assert_eq!(clean_value("100%").unwrap(), 1.0);
        assert_eq!(clean_value("0.00%").unwrap(), 0.0);
    }

    #[test]
    fn percent_in_unit_range() {
        for p in ["0%", "0.5%", "12.34%", "99.99%", "100%"] {
            let v = clean_value(p).unwrap();
            assert!((0.0..=1.0).contains(&v), "{p} -> {v}");
        }
    }

    #[test]
    fn rate_keeps_numeric_head() {
        assert_eq!(clean_value("4960.674276/s").unwrap(), 4960.674276);
        assert_eq!(clean_value("12/min").unwrap(), 12.0);
    }

    #[test]
    fn bare_number() {
        assert_eq!(clean_value("150000").unwrap(), 150000.0);
        assert_eq!(clean_value("  3.5 ").unwrap(), 3.5);
    }

    #[test]
    fn micro_marker_wins_over_seconds() {
        // "µs" also ends in "s"; the micro rule must fire first.
        assert!(approx(clean_value("500µs").unwrap(), 0.5));
    }

    #[test]
    fn millis_marker_wins_over_seconds() {
        assert_eq!(clean_value("7ms").unwrap(), 7.0);
    }

    #[test]
    fn unparseable_token_is_typed_error() {
        let err = clean_value("n/a-ish").unwrap_err();
        assert_eq!(
            err,
            ValueError::Unparseable {
                token: "n/a-ish".to_string()
            }
        );
        assert!(err.to_string().contains("n/a-ish"));
    }

    #[test]
    fn empty_token_is_error() {
        assert!(clean_value("").is_err());
        assert!(clean_value("ms").is_err());
    }
}
