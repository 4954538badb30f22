//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use route_resolver::config::{Environment, ResolverConfig, RouteConfig};
use route_resolver::http::{HandlerRegistry, HttpServer};
use route_resolver::lifecycle::{startup, Shutdown};
use route_resolver::routing::{RouteCollector, RouteDefinitions};

/// A front controller listening on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub cache_dir: TempDir,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn cache_file(&self) -> PathBuf {
        self.cache_dir.path().join("routes.cache.json")
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Routes used across the integration tests.
pub fn test_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("GET", "/", "home"),
        RouteConfig::new("GET", "/routes", "routes"),
        RouteConfig::new("GET", "/app/index.php", "echo"),
        RouteConfig::new("POST", "/sql", "echo"),
        RouteConfig::new("GET", "/server/engines/{engine}[/{page}]", "echo"),
        RouteConfig::new("GET", "/users/{id:\\d+}", "echo"),
    ]
}

/// Start a server for `routes` with its cache in a fresh temp directory.
pub async fn spawn_server(routes: Vec<RouteConfig>, environment: Environment) -> TestServer {
    let cache_dir = tempfile::tempdir().unwrap();
    let mut config = ResolverConfig {
        environment,
        routes,
        ..ResolverConfig::default()
    };
    config.cache.dir = cache_dir.path().to_path_buf();

    let resolver = startup::build_resolver(&config).unwrap();
    let handlers = HandlerRegistry::with_builtins(resolver.definitions());
    let server = HttpServer::with_resolver(&config, resolver, handlers).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let handle = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            server.run(listener, shutdown).await.unwrap();
        }
    });

    TestServer {
        addr,
        shutdown,
        cache_dir,
        handle,
    }
}

/// Definitions for the cache tests, declared with the collector API.
pub fn collector_definitions() -> RouteDefinitions {
    let mut routes = RouteCollector::new();
    routes
        .get("/", "home")
        .add_route(&["GET", "POST"], "/table/structure/unique", "table.structure.unique")
        .add_group("/server", |server| {
            server
                .get("/engines", "server.engines")
                .get("/engines/{engine}[/{page}]", "server.engines.show");
        })
        .any("/export", "export");
    routes.build().unwrap()
}
