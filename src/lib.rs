//! HTTP route resolver with a persisted compiled-route cache.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ResolverConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{DispatchResult, RouteResolver};
