//! Named route handlers.
//!
//! # Responsibilities
//! - Map handler identifiers from the route table to code
//! - Provide the built-in handlers the default configuration routes to
//!
//! # Design Decisions
//! - Handlers are synchronous and receive everything the front controller
//!   resolved; they never see the raw request
//! - Identifiers are checked against the registry before the server starts

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::{
    http::{HeaderMap, Method},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::routing::{RouteDefinition, RouteDefinitions, RouteParams};

/// Everything a handler gets to see about a dispatched request.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    /// Handler identifier the route resolved to.
    pub handler: String,
    /// Route that was dispatched (the `route` parameter or `self_path`).
    pub route: String,
    /// Canonical script path of the request.
    pub self_path: String,
    pub params: RouteParams,
    /// Raw query string, without the `?`.
    pub query: String,
    /// Raw urlencoded form body, empty for other content types.
    pub form: String,
    pub headers: HeaderMap,
    pub request_id: String,
}

/// Code behind a handler identifier.
pub trait RouteHandler: Send + Sync {
    fn handle(&self, request: RouteRequest) -> Response;
}

impl<F> RouteHandler for F
where
    F: Fn(RouteRequest) -> Response + Send + Sync,
{
    fn handle(&self, request: RouteRequest) -> Response {
        self(request)
    }
}

/// Handlers keyed by identifier.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn RouteHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `home`, `echo` and `routes` registered.
    pub fn with_builtins(definitions: &RouteDefinitions) -> Self {
        let routes: Arc<[RouteDefinition]> = definitions.routes().into();

        let mut registry = Self::new();
        registry
            .register("home", home)
            .register("echo", echo)
            .register("routes", move |_request: RouteRequest| {
                Json(json!({ "routes": &*routes })).into_response()
            });
        registry
    }

    /// Register `handler` under `id`, replacing any previous one.
    pub fn register<H>(&mut self, id: impl Into<String>, handler: H) -> &mut Self
    where
        H: RouteHandler + 'static,
    {
        self.handlers.insert(id.into(), Arc::new(handler));
        self
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn RouteHandler>> {
        self.handlers.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    /// First handler identifier in `definitions` with nothing registered.
    pub fn find_missing<'a>(&self, definitions: &'a RouteDefinitions) -> Option<&'a str> {
        definitions
            .routes()
            .iter()
            .map(|route| route.handler.as_str())
            .find(|handler| !self.contains(handler))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.handlers.keys().collect();
        ids.sort();
        f.debug_struct("HandlerRegistry").field("handlers", &ids).finish()
    }
}

fn home(_request: RouteRequest) -> Response {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok",
    }))
    .into_response()
}

fn echo(request: RouteRequest) -> Response {
    Json(json!({
        "handler": request.handler,
        "method": request.method.as_str(),
        "route": request.route,
        "self_path": request.self_path,
        "params": request.params,
        "request_id": request.request_id,
    }))
    .into_response()
}
