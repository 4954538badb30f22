//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated config into route definitions
//! - Wire the file cache and environment mode into a resolver

use std::sync::Arc;

use crate::config::ResolverConfig;
use crate::routing::{FileRouteCache, RouteDefinitions, RouteResolver, RoutingError};

/// Build the resolver described by `config`.
pub fn build_resolver(config: &ResolverConfig) -> Result<RouteResolver, RoutingError> {
    let definitions = RouteDefinitions::from_config(&config.routes)?;
    let cache = FileRouteCache::from_config(&config.cache);

    tracing::info!(
        environment = %config.environment,
        routes = definitions.len(),
        cache_file = %cache.path().display(),
        "Route resolver configured"
    );

    Ok(RouteResolver::new(
        definitions,
        config.environment,
        Arc::new(cache),
    ))
}
