//! Route resolution with a persisted compiled table.
//!
//! # Responsibilities
//! - Build a dispatcher, from the cache when possible
//! - Regenerate and store the table when the cache is absent, invalid or
//!   compiled from different definitions
//! - Memoize the dispatcher for the life of the resolver
//!
//! # Design Decisions
//! - Development mode compiles in memory and never touches the cache
//! - Cache problems are logged and counted, never returned to the caller
//! - A failed store still yields a working dispatcher

use std::sync::{Arc, OnceLock};

use crate::config::Environment;
use crate::observability::metrics;
use crate::routing::cache::RouteCacheRepository;
use crate::routing::definition::RouteDefinitions;
use crate::routing::router::{CompiledRouteTable, DispatchResult, Dispatcher};
use crate::routing::RoutingError;

/// Resolves `(method, path)` pairs against a fixed set of definitions.
#[derive(Debug)]
pub struct RouteResolver {
    definitions: RouteDefinitions,
    environment: Environment,
    cache: Arc<dyn RouteCacheRepository>,
    dispatcher: OnceLock<Arc<Dispatcher>>,
}

impl RouteResolver {
    pub fn new(
        definitions: RouteDefinitions,
        environment: Environment,
        cache: Arc<dyn RouteCacheRepository>,
    ) -> Self {
        Self {
            definitions,
            environment,
            cache,
            dispatcher: OnceLock::new(),
        }
    }

    /// Build a fresh dispatcher, consulting the cache outside development.
    pub fn dispatcher(&self) -> Result<Dispatcher, RoutingError> {
        if self.environment.is_development() {
            tracing::debug!(
                routes = self.definitions.len(),
                "Development mode, compiling routes without cache"
            );
            return Dispatcher::from_definitions(&self.definitions);
        }

        if let Some(dispatcher) = self.cached_dispatcher() {
            return Ok(dispatcher);
        }

        let table = CompiledRouteTable::compile(&self.definitions)?;
        let dispatcher = Dispatcher::new(&table)?;

        match self.cache.store(&table) {
            Ok(()) => {
                metrics::record_cache_event("stored");
                tracing::info!(
                    routes = dispatcher.route_count(),
                    "Compiled routes and refreshed route cache"
                );
            }
            Err(e) => {
                metrics::record_cache_event("store_failed");
                tracing::warn!(error = %e, "Failed to write route cache, continuing without it");
            }
        }

        Ok(dispatcher)
    }

    fn cached_dispatcher(&self) -> Option<Dispatcher> {
        let Some(table) = self.cache.load() else {
            metrics::record_cache_event("miss");
            return None;
        };

        if table.fingerprint != self.definitions.fingerprint() {
            metrics::record_cache_event("stale");
            tracing::info!("Route cache was compiled from other definitions, rebuilding");
            return None;
        }

        match Dispatcher::new(&table) {
            Ok(dispatcher) => {
                metrics::record_cache_event("hit");
                tracing::debug!(routes = dispatcher.route_count(), "Loaded routes from cache");
                Some(dispatcher)
            }
            Err(e) => {
                metrics::record_cache_event("invalid");
                tracing::warn!(error = %e, "Route cache failed validation, rebuilding");
                None
            }
        }
    }

    /// Dispatch using the memoized dispatcher, building it on first use.
    pub fn resolve(&self, method: &str, path: &str) -> Result<DispatchResult, RoutingError> {
        Ok(self.shared_dispatcher()?.dispatch(method, path))
    }

    /// The memoized dispatcher.
    pub fn shared_dispatcher(&self) -> Result<Arc<Dispatcher>, RoutingError> {
        if let Some(dispatcher) = self.dispatcher.get() {
            return Ok(Arc::clone(dispatcher));
        }
        let built = Arc::new(self.dispatcher()?);
        Ok(Arc::clone(self.dispatcher.get_or_init(|| built)))
    }

    pub fn definitions(&self) -> &RouteDefinitions {
        &self.definitions
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn cache(&self) -> &Arc<dyn RouteCacheRepository> {
        &self.cache
    }
}
