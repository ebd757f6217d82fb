//! Controller configuration with page-level overrides.
//!
//! # Design
//! - Defaults match the server templates, so a bare page needs no attributes.
//! - Overrides come from `<body data-*>` attributes through a lookup closure.
//! - Invalid overrides are rejected as a whole; callers fall back to defaults.

use std::time::Duration;

use crate::core::error::ConfigError;

/// Delay between a job status response and the next status request.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
/// Lifetime of a flash notification.
pub const DEFAULT_FLASH_TTL: Duration = Duration::from_millis(5000);

/// Attribute holding the API base URL override.
pub const ATTR_API_BASE: &str = "data-api-base";
/// Attribute holding the poll interval override, in milliseconds.
pub const ATTR_POLL_INTERVAL_MS: &str = "data-poll-interval-ms";
/// Attribute holding the flash lifetime override, in milliseconds.
pub const ATTR_FLASH_TTL_MS: &str = "data-flash-ttl-ms";
/// Attribute holding the log level override.
pub const ATTR_LOG_LEVEL: &str = "data-log-level";

const MIN_DELAY_MS: u64 = 100;
const MAX_DELAY_MS: u64 = 60_000;

/// Console log verbosity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Everything, including per-poll traces.
    Trace,
    /// Debug diagnostics.
    Debug,
    /// Lifecycle events (default).
    #[default]
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Parse a level name, case-insensitively.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownLogLevel`] for unrecognised names.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::UnknownLogLevel {
                value: value.to_string(),
            }),
        }
    }

    /// Matching `tracing` level.
    #[must_use]
    pub const fn as_tracing(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

/// Runtime settings for the controllers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Prefix joined in front of every request path; empty means same origin.
    pub api_base: String,
    /// Delay between consecutive job status polls.
    pub poll_interval: Duration,
    /// Flash notification lifetime.
    pub flash_ttl: Duration,
    /// Console log verbosity.
    pub log_level: LogLevel,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            flash_ttl: DEFAULT_FLASH_TTL,
            log_level: LogLevel::default(),
        }
    }
}

impl ControllerConfig {
    /// Build a configuration from attribute lookups, starting from defaults.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when any present attribute fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(base) = lookup(ATTR_API_BASE) {
            config.api_base = base.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(ATTR_POLL_INTERVAL_MS) {
            config.poll_interval = parse_delay(ATTR_POLL_INTERVAL_MS, &raw)?;
        }
        if let Some(raw) = lookup(ATTR_FLASH_TTL_MS) {
            config.flash_ttl = parse_delay(ATTR_FLASH_TTL_MS, &raw)?;
        }
        if let Some(raw) = lookup(ATTR_LOG_LEVEL) {
            config.log_level = LogLevel::parse(&raw)?;
        }
        Ok(config)
    }

    /// Join a request path onto the configured base.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}

fn parse_delay(field: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let value = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::NotANumber {
            field,
            value: raw.to_string(),
        })?;
    if !(MIN_DELAY_MS..=MAX_DELAY_MS).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min: MIN_DELAY_MS,
            max: MAX_DELAY_MS,
        });
    }
    Ok(Duration::from_millis(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_page_constants() {
        let config = ControllerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.flash_ttl, Duration::from_secs(5));
        assert_eq!(config.url("/check_job_status/x"), "/check_job_status/x");
    }

    #[test]
    fn overrides_are_applied() {
        let config = ControllerConfig::from_lookup(lookup(&[
            (ATTR_API_BASE, "https://compose.local/app/"),
            (ATTR_POLL_INTERVAL_MS, "250"),
            (ATTR_FLASH_TTL_MS, " 8000 "),
            (ATTR_LOG_LEVEL, "DEBUG"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "https://compose.local/app");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.flash_ttl, Duration::from_millis(8000));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(
            config.url("api/toggle_selection"),
            "https://compose.local/app/api/toggle_selection"
        );
    }

    #[test]
    fn out_of_range_interval_is_rejected() {
        let err = ControllerConfig::from_lookup(lookup(&[(ATTR_POLL_INTERVAL_MS, "5")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: ATTR_POLL_INTERVAL_MS,
                value: 5,
                ..
            }
        ));
    }

    #[test]
    fn garbage_values_are_rejected() {
        assert!(matches!(
            ControllerConfig::from_lookup(lookup(&[(ATTR_FLASH_TTL_MS, "soon")])),
            Err(ConfigError::NotANumber { .. })
        ));
        assert!(matches!(
            ControllerConfig::from_lookup(lookup(&[(ATTR_LOG_LEVEL, "loud")])),
            Err(ConfigError::UnknownLogLevel { .. })
        ));
    }

    #[test]
    fn log_levels_map_to_tracing() {
        assert_eq!(LogLevel::parse("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::Error.as_tracing(), tracing::Level::ERROR);
    }
}
