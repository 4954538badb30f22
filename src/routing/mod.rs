//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (first resolution per process):
//!     RouteDefinition[] (config or RouteCollector)
//!     → matcher.rs (parse patterns, expand optional parts)
//!     → router.rs (static map + ordered variable routes)
//!     → cache.rs (persist / reload the compiled table)
//!     → Dispatcher (immutable, shared)
//!
//! Incoming Request (method, server vars)
//!     → path.rs (canonical path, current route)
//!     → resolver.rs → Dispatcher::dispatch
//!     → Return: Found / NotFound / MethodNotAllowed
//! ```
//!
//! # Design Decisions
//! - Definitions are validated when they are declared, not when they are hit
//! - First declared variable route wins on overlap
//! - The persisted cache never changes matching results; any doubt about it
//!   means recompiling

pub mod cache;
pub mod definition;
pub mod matcher;
pub mod params;
pub mod path;
pub mod resolver;
pub mod router;

pub use cache::{CacheError, FileRouteCache, MemoryRouteCache, RouteCacheRepository};
pub use definition::{RouteCollector, RouteDefinition, RouteDefinitions};
pub use params::RouteParams;
pub use path::{clean_path_info, current_route, ServerVars};
pub use resolver::RouteResolver;
pub use router::{CompiledRouteTable, DispatchResult, Dispatcher};

use thiserror::Error;

/// Errors raised while declaring or compiling routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid route `{method} {pattern}`: {reason}")]
    InvalidRoute {
        method: String,
        pattern: String,
        reason: String,
    },

    #[error("cannot register two routes matching `{route}` for method `{method}`")]
    DuplicateRoute { method: String, route: String },

    #[error("static route `{path}` is shadowed by previously defined variable route `{regex}` for method `{method}`")]
    ShadowedRoute {
        method: String,
        path: String,
        regex: String,
    },

    #[error("invalid compiled route table: {0}")]
    InvalidTable(String),
}
