//! HTTP server setup and the front controller.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (timeout, request ID, tracing)
//! - Normalize the request path and pick the route to dispatch
//! - Resolve it and invoke the named handler, or answer 404 / 405
//! - Record request metrics
//! - Shut down gracefully on the lifecycle signal

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, request::Parts, Request},
    response::Response,
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ResolverConfig;
use crate::http::handlers::{HandlerRegistry, RouteRequest};
use crate::http::request::{self, MakeRequestUuid};
use crate::http::response;
use crate::lifecycle::{self, startup, Shutdown};
use crate::observability::metrics;
use crate::routing::{clean_path_info, current_route, DispatchResult, RouteResolver, RoutingError};

/// Errors raised while setting up or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("route configuration error: {0}")]
    Routing(#[from] RoutingError),

    #[error("no handler registered for `{handler}`")]
    UnknownHandler { handler: String },

    #[error("server IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<RouteResolver>,
    pub handlers: Arc<HandlerRegistry>,
    pub max_body_size: usize,
}

/// Front controller server.
pub struct HttpServer {
    router: Router,
    resolver: Arc<RouteResolver>,
}

impl HttpServer {
    /// Create a server for the routes and cache named in `config`.
    pub fn new(config: &ResolverConfig, handlers: HandlerRegistry) -> Result<Self, ServerError> {
        let resolver = startup::build_resolver(config)?;
        Self::with_resolver(config, resolver, handlers)
    }

    /// Create a server around an already built resolver.
    ///
    /// Fails if a route names a handler the registry does not have.
    pub fn with_resolver(
        config: &ResolverConfig,
        resolver: RouteResolver,
        handlers: HandlerRegistry,
    ) -> Result<Self, ServerError> {
        if let Some(handler) = handlers.find_missing(resolver.definitions()) {
            return Err(ServerError::UnknownHandler {
                handler: handler.to_string(),
            });
        }

        let resolver = Arc::new(resolver);
        let state = AppState {
            resolver: Arc::clone(&resolver),
            handlers: Arc::new(handlers),
            max_body_size: config.limits.max_body_size,
        };

        let router = Self::build_router(config, state);
        Ok(Self { router, resolver })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ResolverConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(front_controller))
            .route("/{*path}", any(front_controller))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(request::X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request::X_REQUEST_ID, MakeRequestUuid))
    }

    /// The router, for serving it elsewhere or calling it in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn resolver(&self) -> &Arc<RouteResolver> {
        &self.resolver
    }

    /// Serve on `listener` until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.resolver.definitions().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(lifecycle::shutdown::wait(shutdown.subscribe()))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: canonical path → current route → dispatch.
async fn front_controller(State(state): State<AppState>, req: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let request_id = request::request_id(&parts.headers);

    let self_path = clean_path_info(&request::server_vars(&parts));
    let query = parts.uri.query().unwrap_or_default().to_string();

    let form = if is_form(&parts) {
        match axum::body::to_bytes(body, state.max_body_size).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Failed to read form body");
                let response = response::bad_request("Request body could not be read.");
                metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
                return response;
            }
        }
    } else {
        String::new()
    };

    let route = current_route(&query, &form, &self_path);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        self_path = %self_path,
        route = %route,
        "Dispatching request"
    );

    let response = match state.resolver.resolve(method.as_str(), &route) {
        Ok(result) => {
            metrics::record_dispatch(result.outcome());
            match result {
                DispatchResult::Found { handler, params } => match state.handlers.get(&handler) {
                    Some(code) => code.handle(RouteRequest {
                        method: method.clone(),
                        handler,
                        route,
                        self_path,
                        params,
                        query,
                        form,
                        headers: parts.headers,
                        request_id,
                    }),
                    None => {
                        tracing::error!(request_id = %request_id, handler = %handler, "Handler not registered");
                        response::internal_error()
                    }
                },
                DispatchResult::NotFound => {
                    tracing::debug!(request_id = %request_id, route = %route, "No route matched");
                    response::not_found(&route)
                }
                DispatchResult::MethodNotAllowed { allowed } => {
                    tracing::debug!(request_id = %request_id, route = %route, allowed = ?allowed, "Method not allowed");
                    response::method_not_allowed(&allowed)
                }
            }
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build route dispatcher");
            response::internal_error()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}

fn is_form(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}
