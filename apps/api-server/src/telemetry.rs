//! Tracing subscriber setup.

use std::str::FromStr;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Used when `RUST_LOG` is unset or unparsable.
const DEFAULT_FILTER: &str = "info,api_server=debug,merpati_core=debug,merpati_infra=debug";

/// Shape of each log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human oriented.
    Pretty,
    /// One line per event.
    Compact,
    /// One JSON object per event, for log shippers.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    pub environment: String,
    pub service_name: String,
}

impl TelemetryConfig {
    /// Read `LOG_FORMAT` and `RUST_ENV`.
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var("LOG_FORMAT").ok().as_deref(),
            std::env::var("RUST_ENV").ok().as_deref(),
        )
    }

    /// An explicit `LOG_FORMAT` wins; otherwise production logs JSON.
    fn from_values(log_format: Option<&str>, rust_env: Option<&str>) -> Self {
        let environment = rust_env.unwrap_or("development").to_string();
        let fallback = if environment.eq_ignore_ascii_case("production") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        let format = match log_format.map(str::parse::<LogFormat>) {
            Some(Ok(format)) => format,
            Some(Err(e)) => {
                // The subscriber is not up yet.
                eprintln!("{e}; falling back to {fallback:?}");
                fallback
            }
            None => fallback,
        };

        Self {
            format,
            environment,
            service_name: "merpati-api".to_string(),
        }
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(false))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        format = ?config.format,
        "Telemetry initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_follows_environment_when_unset() {
        assert_eq!(TelemetryConfig::from_values(None, None).format, LogFormat::Pretty);
        assert_eq!(
            TelemetryConfig::from_values(None, Some("Production")).format,
            LogFormat::Json
        );
    }

    #[test]
    fn test_explicit_format_overrides_environment() {
        let config = TelemetryConfig::from_values(Some("compact"), Some("production"));
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.environment, "production");

        let config = TelemetryConfig::from_values(Some("JSON"), None);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_unknown_format_falls_back() {
        assert_eq!(
            TelemetryConfig::from_values(Some("xml"), Some("production")).format,
            LogFormat::Json
        );
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
