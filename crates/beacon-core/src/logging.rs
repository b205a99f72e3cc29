//! Logging setup, driven by `BEACON_LOG` and `BEACON_LOG_FORMAT`.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::error::{BeaconError, BeaconResult};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-readable.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = BeaconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(BeaconError::config(format!("unknown log format `{other}`"))),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used when no filter directive is given.
    pub level: Level,
    pub format: LogFormat,
    /// Filter directives, e.g. `beacon_sw=debug,tower_http=warn`.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Read `BEACON_LOG` and `BEACON_LOG_FORMAT` from the process environment.
    pub fn from_env() -> BeaconResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the logging variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> BeaconResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(format) = lookup("BEACON_LOG_FORMAT").filter(|v| !v.trim().is_empty()) {
            config.format = format.trim().parse()?;
        }
        config.filter = lookup("BEACON_LOG").filter(|v| !v.trim().is_empty());
        Ok(config)
    }

    /// `BEACON_LOG` first, then `RUST_LOG`, then the default level.
    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.as_str().to_ascii_lowercase());
        match self.filter {
            Some(ref directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }
}

/// Install the global subscriber. Call once, from the binary.
pub fn init_logging(config: &LogConfig) {
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => fmt::layer().with_target(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(config.env_filter())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = LogConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.filter, None);
    }

    #[test]
    fn test_env_selects_format_and_filter() {
        let config = LogConfig::from_lookup(lookup(&[
            ("BEACON_LOG_FORMAT", "JSON"),
            ("BEACON_LOG", "beacon_sw=debug,tower_http=warn"),
        ]))
        .unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter.as_deref(), Some("beacon_sw=debug,tower_http=warn"));
        assert!(config
            .env_filter()
            .to_string()
            .contains("beacon_sw=debug"));
    }

    #[test]
    fn test_unknown_format_is_config_error() {
        let err = LogConfig::from_lookup(lookup(&[("BEACON_LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, BeaconError::Config(_)));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config =
            LogConfig::from_lookup(lookup(&[("BEACON_LOG_FORMAT", " "), ("BEACON_LOG", "")]))
                .unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.filter, None);
    }
}
