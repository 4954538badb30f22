//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, route definitions included)
//!     → ResolverConfig (validated, immutable)
//!     → CLI flags override the environment mode
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; route changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::CacheConfig;
pub use schema::Environment;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::ResolverConfig;
pub use schema::RouteConfig;
