//! Route definitions and the collector used to declare them.
//!
//! # Responsibilities
//! - Hold the ordered `(method, pattern, handler)` declarations
//! - Expand groups and multi-method declarations
//! - Validate every declaration before the process starts serving
//! - Fingerprint the declarations so a persisted table can be matched to them

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::RouteConfig;
use crate::routing::router::CompiledRouteTable;
use crate::routing::RoutingError;

/// Method name that matches any request method.
pub const ANY_METHOD: &str = "*";

/// A declared mapping from method and pattern to a handler identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub method: String,
    pub pattern: String,
    pub handler: String,
}

impl RouteDefinition {
    /// The method is upper-cased.
    pub fn new(
        method: impl AsRef<str>,
        pattern: impl Into<String>,
        handler: impl Into<String>,
    ) -> Self {
        Self {
            method: method.as_ref().trim().to_ascii_uppercase(),
            pattern: pattern.into(),
            handler: handler.into(),
        }
    }
}

/// Validated route declarations, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinitions {
    routes: Vec<RouteDefinition>,
    fingerprint: String,
}

impl RouteDefinitions {
    /// Validate the declarations by compiling them once.
    pub fn new(routes: Vec<RouteDefinition>) -> Result<Self, RoutingError> {
        CompiledRouteTable::from_routes(&routes)?;
        let fingerprint = fingerprint(&routes);
        Ok(Self {
            routes,
            fingerprint,
        })
    }

    /// Build from `[[routes]]` config entries.
    pub fn from_config(routes: &[RouteConfig]) -> Result<Self, RoutingError> {
        let mut collector = RouteCollector::new();
        for route in routes {
            collector.add_route(route.methods.as_slice(), &route.pattern, &route.handler);
        }
        collector.build()
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    /// SHA-256 over the declarations, hex encoded.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn fingerprint(routes: &[RouteDefinition]) -> String {
    let mut hasher = Sha256::new();
    for route in routes {
        hasher.update(route.method.as_bytes());
        hasher.update([0]);
        hasher.update(route.pattern.as_bytes());
        hasher.update([0]);
        hasher.update(route.handler.as_bytes());
        hasher.update([b'\n']);
    }
    format!("{:x}", hasher.finalize())
}

/// Collects route declarations.
///
/// ```
/// use route_resolver::routing::RouteCollector;
///
/// let mut routes = RouteCollector::new();
/// routes.get("/", "home");
/// routes.add_group("/table", |table| {
///     table.add_route(&["GET", "POST"], "/structure/unique", "table.structure.unique");
/// });
///
/// let definitions = routes.build().unwrap();
/// assert_eq!(definitions.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteCollector {
    prefix: String,
    routes: Vec<RouteDefinition>,
}

impl RouteCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `pattern` for each of `methods`.
    pub fn add_route<M: AsRef<str>>(
        &mut self,
        methods: &[M],
        pattern: &str,
        handler: &str,
    ) -> &mut Self {
        let pattern = format!("{}{}", self.prefix, pattern);
        for method in methods {
            self.routes
                .push(RouteDefinition::new(method, pattern.clone(), handler));
        }
        self
    }

    pub fn get(&mut self, pattern: &str, handler: &str) -> &mut Self {
        self.add_route(&["GET"], pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: &str) -> &mut Self {
        self.add_route(&["POST"], pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: &str) -> &mut Self {
        self.add_route(&["PUT"], pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: &str) -> &mut Self {
        self.add_route(&["PATCH"], pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: &str) -> &mut Self {
        self.add_route(&["DELETE"], pattern, handler)
    }

    pub fn head(&mut self, pattern: &str, handler: &str) -> &mut Self {
        self.add_route(&["HEAD"], pattern, handler)
    }

    /// Matches any method not claimed by a more specific route.
    pub fn any(&mut self, pattern: &str, handler: &str) -> &mut Self {
        self.add_route(&[ANY_METHOD], pattern, handler)
    }

    /// Declare routes under a common prefix.
    pub fn add_group<F>(&mut self, prefix: &str, group: F) -> &mut Self
    where
        F: FnOnce(&mut RouteCollector),
    {
        let nested = format!("{}{}", self.prefix, prefix);
        let previous = std::mem::replace(&mut self.prefix, nested);
        group(self);
        self.prefix = previous;
        self
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    pub fn build(self) -> Result<RouteDefinitions, RoutingError> {
        RouteDefinitions::new(self.routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteMethods;

    #[test]
    fn test_group_prefix_is_scoped() {
        let mut routes = RouteCollector::new();
        routes.add_group("/server", |server| {
            server.get("/status", "server.status");
            server.add_group("/engines", |engines| {
                engines.get("/{engine}", "server.engines.show");
            });
        });
        routes.get("/sql", "sql");

        let patterns: Vec<_> = routes.routes().iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(
            patterns,
            vec!["/server/status", "/server/engines/{engine}", "/sql"]
        );
    }

    #[test]
    fn test_methods_are_uppercased() {
        let mut routes = RouteCollector::new();
        routes.add_route(&["get", " post "], "/", "home");
        let methods: Vec<_> = routes.routes().iter().map(|r| r.method.as_str()).collect();
        assert_eq!(methods, vec!["GET", "POST"]);
    }

    #[test]
    fn test_fingerprint_tracks_declarations() {
        let mut a = RouteCollector::new();
        a.get("/", "home").get("/sql", "sql");
        let mut b = RouteCollector::new();
        b.get("/", "home").get("/sql", "sql");
        let mut c = RouteCollector::new();
        c.get("/sql", "sql").get("/", "home");

        let a = a.build().unwrap();
        let b = b.build().unwrap();
        let c = c.build().unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_build_rejects_invalid_pattern() {
        let mut routes = RouteCollector::new();
        routes.get("no-slash", "home");
        assert!(matches!(
            routes.build(),
            Err(RoutingError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_from_config_expands_methods() {
        let config = vec![
            RouteConfig {
                methods: RouteMethods::One("GET".into()),
                pattern: "/".into(),
                handler: "home".into(),
            },
            RouteConfig {
                methods: RouteMethods::Many(vec!["GET".into(), "POST".into()]),
                pattern: "/table/structure/unique".into(),
                handler: "table.structure.unique".into(),
            },
        ];

        let definitions = RouteDefinitions::from_config(&config).unwrap();
        assert_eq!(definitions.len(), 3);
        assert_eq!(definitions.routes()[2].method, "POST");
    }
}
