//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, parseable addresses)
//! - Check route declarations (patterns, methods, duplicates, shadowing)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ResolverConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ResolverConfig;
use crate::routing::RouteDefinitions;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: {reason}")]
    Field { field: String, reason: String },

    #[error("routes[{index}]: {reason}")]
    Route { index: usize, reason: String },

    #[error("routes: {0}")]
    Routes(String),
}

fn field(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::Field {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &ResolverConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(field(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(field("timeouts.request_secs", "must be greater than 0"));
    }

    if config.limits.max_body_size == 0 {
        errors.push(field("limits.max_body_size", "must be greater than 0"));
    }

    let file_name = config.cache.file_name.as_str();
    if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name == "." || file_name == ".." {
        errors.push(field("cache.file_name", "must be a plain, non-empty file name"));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(field(
            "observability.log_level",
            format!("unknown level `{}`", config.observability.log_level),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(field(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    let mut routes_ok = true;
    for (index, route) in config.routes.iter().enumerate() {
        let mut reject = |reason: &str| {
            routes_ok = false;
            errors.push(ValidationError::Route {
                index,
                reason: reason.to_string(),
            });
        };
        if route.methods.as_slice().is_empty() {
            reject("at least one method is required");
        }
        if route.methods.as_slice().iter().any(|m| m.trim().is_empty()) {
            reject("method names cannot be empty");
        }
        if !route.pattern.starts_with('/') {
            reject("pattern must start with '/'");
        }
        if route.handler.trim().is_empty() {
            reject("handler is required");
        }
    }

    if routes_ok {
        if let Err(e) = RouteDefinitions::from_config(&config.routes) {
            errors.push(ValidationError::Routes(e.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RouteConfig, RouteMethods};

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ResolverConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ResolverConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.timeouts.request_secs = 0;
        config.cache.file_name = "../routes.json".into();
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_route_entries_are_checked() {
        let mut config = ResolverConfig::default();
        config.routes = vec![
            RouteConfig {
                methods: RouteMethods::Many(vec![]),
                pattern: "/".into(),
                handler: "home".into(),
            },
            RouteConfig::new("GET", "sql", ""),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::Route {
                    index: 0,
                    reason: "at least one method is required".into()
                },
                ValidationError::Route {
                    index: 1,
                    reason: "pattern must start with '/'".into()
                },
                ValidationError::Route {
                    index: 1,
                    reason: "handler is required".into()
                },
            ]
        );
    }

    #[test]
    fn test_route_conflicts_are_reported() {
        let mut config = ResolverConfig::default();
        config.routes = vec![
            RouteConfig::new("GET", "/users/{name}", "users.by_name"),
            RouteConfig::new("GET", "/users/me", "users.me"),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(&errors[0], ValidationError::Routes(msg) if msg.contains("shadowed")));
    }
}
