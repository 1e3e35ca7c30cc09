//! Runtime configuration read from the process environment.
//!
//! Every variable is optional; unset or empty variables fall back to the
//! defaults below. Malformed values are an error at startup rather than a
//! silently ignored setting.

use std::time::Duration;

use crate::report::ReportFormat;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value `{value}` for `{var}`: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

const DEFAULT_REPORT_INTERVAL_SECS: u64 = 2;
const DEFAULT_REPORT_TOP: usize = 20;
const DEFAULT_ENERGY_ALERT_THRESHOLD: f64 = 100.0;

/// Tunables for the monitor runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Upper bound on concurrently tracked processes
    /// (`MAX_TRACKED_PROCESSES`, default unbounded).
    pub max_tracked_processes: Option<usize>,
    /// Cadence of snapshot reports (`REPORT_INTERVAL_SECS`, default 2).
    pub report_interval: Duration,
    /// Rows rendered per report (`REPORT_TOP`, default 20).
    pub report_top: usize,
    /// Table or JSON output (`REPORT_FORMAT`, default `table`).
    pub report_format: ReportFormat,
    /// Energy advisory threshold in joules (`ENERGY_ALERT_THRESHOLD`,
    /// default 100).
    pub energy_alert_threshold: f64,
    /// Whether the reporter removes records of exited processes
    /// (`PRUNE_EXITED`, default false).
    pub prune_exited: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_tracked_processes: None,
            report_interval: Duration::from_secs(DEFAULT_REPORT_INTERVAL_SECS),
            report_top: DEFAULT_REPORT_TOP,
            report_format: ReportFormat::default(),
            energy_alert_threshold: DEFAULT_ENERGY_ALERT_THRESHOLD,
            prune_exited: false,
        }
    }
}

impl Config {
    /// Builds a config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalid`] if a set variable fails to parse.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(value) = read_var("MAX_TRACKED_PROCESSES") {
            cfg.max_tracked_processes = Some(parse("MAX_TRACKED_PROCESSES", &value)?);
        }
        if let Some(value) = read_var("REPORT_INTERVAL_SECS") {
            cfg.report_interval = Duration::from_secs(parse("REPORT_INTERVAL_SECS", &value)?);
        }
        if let Some(value) = read_var("REPORT_TOP") {
            cfg.report_top = parse("REPORT_TOP", &value)?;
        }
        if let Some(value) = read_var("REPORT_FORMAT") {
            cfg.report_format = parse("REPORT_FORMAT", &value)?;
        }
        if let Some(value) = read_var("ENERGY_ALERT_THRESHOLD") {
            cfg.energy_alert_threshold = parse("ENERGY_ALERT_THRESHOLD", &value)?;
        }
        if let Some(value) = read_var("PRUNE_EXITED") {
            cfg.prune_exited = parse("PRUNE_EXITED", &value)?;
        }

        Ok(cfg)
    }
}

fn read_var(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|value| !value.is_empty())
}

fn parse<T>(var: &'static str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err: T::Err| Error::Invalid {
        var,
        value: value.to_owned(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.max_tracked_processes, None);
        assert_eq!(cfg.report_interval, Duration::from_secs(2));
        assert_eq!(cfg.report_top, 20);
        assert_eq!(cfg.report_format, ReportFormat::Table);
        assert_eq!(cfg.energy_alert_threshold, 100.0);
        assert!(!cfg.prune_exited);
    }

    #[test]
    fn test_parse_reports_variable_and_value() {
        let err = parse::<usize>("REPORT_TOP", "lots").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("REPORT_TOP"));
        assert!(message.contains("lots"));
    }

    #[test]
    fn test_parse_accepts_valid_values() {
        assert_eq!(parse::<usize>("REPORT_TOP", "5").unwrap(), 5);
        assert!(parse::<bool>("PRUNE_EXITED", "true").unwrap());
        assert_eq!(
            parse::<ReportFormat>("REPORT_FORMAT", "json").unwrap(),
            ReportFormat::Json
        );
    }
}
