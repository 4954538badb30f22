//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development, unless the
//!   config names one
//! - `RUST_LOG` overrides the configured level
//! - Logs go to stderr; stdout carries CLI output

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Environment, LogFormat, ObservabilityConfig};

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    format!("route_resolver={level},tower_http={level}")
}

/// Output format after applying the environment default.
pub fn effective_format(config: &ObservabilityConfig, environment: Environment) -> LogFormat {
    config.log_format.unwrap_or(match environment {
        Environment::Development => LogFormat::Pretty,
        Environment::Production => LogFormat::Json,
    })
}

/// Install the global tracing subscriber.
///
/// Returns an error if a subscriber is already installed.
pub fn init_logging(
    config: &ObservabilityConfig,
    environment: Environment,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match effective_format(config, environment) {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter("DEBUG"), "route_resolver=debug,tower_http=debug");
    }

    #[test]
    fn test_format_follows_environment() {
        let mut config = ObservabilityConfig::default();
        assert_eq!(effective_format(&config, Environment::Development), LogFormat::Pretty);
        assert_eq!(effective_format(&config, Environment::Production), LogFormat::Json);

        config.log_format = Some(LogFormat::Pretty);
        assert_eq!(effective_format(&config, Environment::Production), LogFormat::Pretty);
    }
}
