//! Compiled route table and dispatch.
//!
//! # Responsibilities
//! - Compile definitions into a static map plus ordered variable routes
//! - Rebuild a dispatcher from a (possibly persisted) table, rejecting
//!   tables that are structurally invalid
//! - Match `(method, path)` and report Found, NotFound or MethodNotAllowed
//!
//! # Design Decisions
//! - Immutable after construction (shared without locks)
//! - Static lookup before variable routes, O(1) via HashMap
//! - Variable routes per method are matched through one `RegexSet`; the
//!   lowest matching index is the first declared route
//! - HEAD falls back to GET, then `*` routes are tried
//! - Explicit NotFound/MethodNotAllowed rather than a silent default

use std::collections::{BTreeMap, BTreeSet, HashMap};

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

use crate::routing::definition::{RouteDefinition, RouteDefinitions, ANY_METHOD};
use crate::routing::matcher::parse_pattern;
use crate::routing::params::RouteParams;
use crate::routing::RoutingError;

/// Serializable, precomputed form of all route definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledRouteTable {
    /// Fingerprint of the definitions this table was compiled from.
    pub fingerprint: String,

    /// method → path → handler.
    pub static_routes: BTreeMap<String, BTreeMap<String, String>>,

    /// method → variable routes in declaration order.
    pub variable_routes: BTreeMap<String, Vec<VariableRoute>>,
}

/// A route with placeholders, stored as its anchored regex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRoute {
    pub regex: String,
    pub params: Vec<String>,
    pub handler: String,
}

impl CompiledRouteTable {
    /// Compile validated definitions.
    pub fn compile(definitions: &RouteDefinitions) -> Result<Self, RoutingError> {
        let mut table = Self::from_routes(definitions.routes())?;
        table.fingerprint = definitions.fingerprint().to_string();
        Ok(table)
    }

    pub(crate) fn from_routes(routes: &[RouteDefinition]) -> Result<Self, RoutingError> {
        let mut table = Self::default();
        let mut seen_regexes: HashMap<String, Vec<Regex>> = HashMap::new();

        for route in routes {
            check_route(route)?;

            for variant in parse_pattern(&route.pattern)? {
                match variant.static_path() {
                    Some(path) => {
                        if let Some(earlier) = seen_regexes
                            .get(&route.method)
                            .and_then(|regexes| regexes.iter().find(|r| r.is_match(&path)))
                        {
                            return Err(RoutingError::ShadowedRoute {
                                method: route.method.clone(),
                                path,
                                regex: earlier.as_str().to_string(),
                            });
                        }

                        let by_path = table.static_routes.entry(route.method.clone()).or_default();
                        if by_path.contains_key(&path) {
                            return Err(RoutingError::DuplicateRoute {
                                method: route.method.clone(),
                                route: path,
                            });
                        }
                        by_path.insert(path, route.handler.clone());
                    }
                    None => {
                        let regex = variant.regex();
                        let variables = table.variable_routes.entry(route.method.clone()).or_default();
                        if variables.iter().any(|v| v.regex == regex) {
                            return Err(RoutingError::DuplicateRoute {
                                method: route.method.clone(),
                                route: regex,
                            });
                        }

                        let compiled = Regex::new(&regex).map_err(|e| RoutingError::InvalidRoute {
                            method: route.method.clone(),
                            pattern: route.pattern.clone(),
                            reason: e.to_string(),
                        })?;
                        seen_regexes
                            .entry(route.method.clone())
                            .or_default()
                            .push(compiled);

                        variables.push(VariableRoute {
                            regex,
                            params: variant.param_names(),
                            handler: route.handler.clone(),
                        });
                    }
                }
            }
        }

        Ok(table)
    }

    /// Number of compiled entries (one per pattern variant and method).
    pub fn route_count(&self) -> usize {
        self.static_routes.values().map(BTreeMap::len).sum::<usize>()
            + self.variable_routes.values().map(Vec::len).sum::<usize>()
    }
}

fn check_route(route: &RouteDefinition) -> Result<(), RoutingError> {
    let invalid = |reason: &str| RoutingError::InvalidRoute {
        method: route.method.clone(),
        pattern: route.pattern.clone(),
        reason: reason.to_string(),
    };

    if route.method.is_empty() {
        return Err(invalid("method is empty"));
    }
    if route.method != ANY_METHOD && !route.method.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid("method must be alphabetic or `*`"));
    }
    if route.handler.trim().is_empty() {
        return Err(invalid("handler is empty"));
    }
    Ok(())
}

/// Outcome of matching a request against the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchResult {
    Found { handler: String, params: RouteParams },
    NotFound,
    MethodNotAllowed { allowed: Vec<String> },
}

impl DispatchResult {
    pub fn is_found(&self) -> bool {
        matches!(self, DispatchResult::Found { .. })
    }

    /// Label used in logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            DispatchResult::Found { .. } => "found",
            DispatchResult::NotFound => "not_found",
            DispatchResult::MethodNotAllowed { .. } => "method_not_allowed",
        }
    }
}

#[derive(Debug)]
struct CompiledVariableRoute {
    regex: Regex,
    params: Vec<String>,
    handler: String,
}

#[derive(Debug)]
struct VariableRouteSet {
    set: RegexSet,
    routes: Vec<CompiledVariableRoute>,
}

impl VariableRouteSet {
    fn find(&self, uri: &str) -> Option<DispatchResult> {
        let index = self.set.matches(uri).iter().next()?;
        let route = &self.routes[index];
        let captures = route.regex.captures(uri)?;

        let params = route
            .params
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = captures.get(i + 1).map(|m| m.as_str()).unwrap_or_default();
                (name.clone(), value.to_string())
            });

        Some(DispatchResult::Found {
            handler: route.handler.clone(),
            params: RouteParams::from_pairs(params),
        })
    }
}

/// Matches requests against a compiled route table.
#[derive(Debug)]
pub struct Dispatcher {
    static_routes: HashMap<String, HashMap<String, String>>,
    variable_routes: HashMap<String, VariableRouteSet>,
    route_count: usize,
}

impl Dispatcher {
    /// Build a dispatcher, validating the table's structure.
    pub fn new(table: &CompiledRouteTable) -> Result<Self, RoutingError> {
        let invalid = RoutingError::InvalidTable;

        let mut static_routes = HashMap::with_capacity(table.static_routes.len());
        for (method, by_path) in &table.static_routes {
            if method.is_empty() {
                return Err(invalid("empty method in static routes".into()));
            }
            for (path, handler) in by_path {
                if !path.starts_with('/') || handler.is_empty() {
                    return Err(invalid(format!("malformed static route `{method} {path}`")));
                }
            }
            let by_path: HashMap<String, String> = by_path
                .iter()
                .map(|(path, handler)| (path.clone(), handler.clone()))
                .collect();
            static_routes.insert(method.clone(), by_path);
        }

        let mut variable_routes = HashMap::with_capacity(table.variable_routes.len());
        for (method, routes) in &table.variable_routes {
            if method.is_empty() {
                return Err(invalid("empty method in variable routes".into()));
            }

            let mut compiled = Vec::with_capacity(routes.len());
            for route in routes {
                let regex = Regex::new(&route.regex)
                    .map_err(|e| invalid(format!("bad regex `{}`: {e}", route.regex)))?;
                if regex.captures_len() != route.params.len() + 1 || route.handler.is_empty() {
                    return Err(invalid(format!(
                        "variable route `{method} {}` does not match its parameters",
                        route.regex
                    )));
                }
                compiled.push(CompiledVariableRoute {
                    regex,
                    params: route.params.clone(),
                    handler: route.handler.clone(),
                });
            }

            let set = RegexSet::new(routes.iter().map(|r| r.regex.as_str()))
                .map_err(|e| invalid(format!("bad regex set for `{method}`: {e}")))?;
            variable_routes.insert(method.clone(), VariableRouteSet {
                set,
                routes: compiled,
            });
        }

        Ok(Self {
            static_routes,
            variable_routes,
            route_count: table.route_count(),
        })
    }

    /// Compile definitions straight into a dispatcher.
    pub fn from_definitions(definitions: &RouteDefinitions) -> Result<Self, RoutingError> {
        Self::new(&CompiledRouteTable::compile(definitions)?)
    }

    /// Match a request method and path.
    pub fn dispatch(&self, method: &str, uri: &str) -> DispatchResult {
        if let Some(found) = self.dispatch_method(method, uri) {
            return found;
        }

        if method == "HEAD" {
            if let Some(found) = self.dispatch_method("GET", uri) {
                return found;
            }
        }

        if let Some(found) = self.dispatch_method(ANY_METHOD, uri) {
            return found;
        }

        let mut allowed = BTreeSet::new();
        for (other, by_path) in &self.static_routes {
            if other != method && by_path.contains_key(uri) {
                allowed.insert(other.clone());
            }
        }
        for (other, routes) in &self.variable_routes {
            if other != method && routes.set.is_match(uri) {
                allowed.insert(other.clone());
            }
        }

        if allowed.is_empty() {
            DispatchResult::NotFound
        } else {
            DispatchResult::MethodNotAllowed {
                allowed: allowed.into_iter().collect(),
            }
        }
    }

    fn dispatch_method(&self, method: &str, uri: &str) -> Option<DispatchResult> {
        if let Some(handler) = self.static_routes.get(method).and_then(|m| m.get(uri)) {
            return Some(DispatchResult::Found {
                handler: handler.clone(),
                params: RouteParams::new(),
            });
        }
        self.variable_routes.get(method)?.find(uri)
    }

    pub fn route_count(&self) -> usize {
        self.route_count
    }
}
