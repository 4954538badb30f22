//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the resolver.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Production uses the route cache, development bypasses it.
    pub environment: Environment,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Compiled route cache location.
    pub cache: CacheConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route definitions, in declaration order.
    pub routes: Vec<RouteConfig>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            listener: ListenerConfig::default(),
            cache: CacheConfig::default(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
            routes: vec![
                RouteConfig::new("GET", "/", "home"),
                RouteConfig::new("GET", "/routes", "routes"),
            ],
        }
    }
}

/// Deployment mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "development" => Ok(Environment::Development),
            other => Err(format!("unknown environment `{other}`")),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Route cache location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding the cache file; created on first write.
    pub dir: PathBuf,

    /// Cache file name inside `dir`.
    pub file_name: String,
}

impl CacheConfig {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./tmp"),
            file_name: "routes.cache.json".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum form body read by the front controller, in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Log format; defaults to pretty in development, JSON in production.
    pub log_format: Option<LogFormat>,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: None,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// A declared route.
///
/// ```toml
/// [[routes]]
/// methods = ["GET", "POST"]
/// pattern = "/table/structure/unique"
/// handler = "table.structure.unique"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// One method or a list of methods; `*` matches any.
    #[serde(alias = "method")]
    pub methods: RouteMethods,

    /// URL pattern with `{name}` / `{name:regex}` placeholders.
    pub pattern: String,

    /// Handler identifier the route resolves to.
    pub handler: String,
}

impl RouteConfig {
    pub fn new(method: &str, pattern: &str, handler: &str) -> Self {
        Self {
            methods: RouteMethods::One(method.to_string()),
            pattern: pattern.to_string(),
            handler: handler.to_string(),
        }
    }
}

/// `"GET"` or `["GET", "POST"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RouteMethods {
    One(String),
    Many(Vec<String>),
}

impl RouteMethods {
    pub fn as_slice(&self) -> &[String] {
        match self {
            RouteMethods::One(method) => std::slice::from_ref(method),
            RouteMethods::Many(methods) => methods,
        }
    }
}
