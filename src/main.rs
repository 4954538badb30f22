//! Route Resolver
//!
//! Front controller and management CLI for the route resolver.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                  ROUTE RESOLVER                   │
//!                       │                                                   │
//!   Client Request      │  ┌─────────┐    ┌──────────┐    ┌─────────────┐  │
//!   ────────────────────┼─▶│  http   │───▶│  path    │───▶│  resolver   │  │
//!                       │  │ server  │    │ cleanup  │    │ (dispatch)  │  │
//!                       │  └─────────┘    └──────────┘    └──────┬──────┘  │
//!                       │                                        │         │
//!                       │                  ┌─────────────┐       ▼         │
//!                       │                  │ route cache │◀─ compiled table │
//!                       │                  │   (file)    │                  │
//!                       │                  └─────────────┘                  │
//!   Client Response     │  ┌──────────┐                                     │
//!   ◀───────────────────┼──│ handler  │◀── Found / 404 / 405                │
//!                       │  └──────────┘                                     │
//!                       │                                                   │
//!                       │  config · observability · lifecycle               │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! # Commands
//! - `serve`: run the front controller
//! - `dispatch <METHOD> <PATH>`: resolve one request and print the result
//! - `clean-path`: print the canonical path for the given server values
//! - `warm-cache` / `clear-cache`: manage the compiled route cache
//! - `routes`: list the configured routes

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::net::TcpListener;

use route_resolver::config::{load_or_default, Environment, ResolverConfig};
use route_resolver::http::{HandlerRegistry, HttpServer};
use route_resolver::lifecycle::{signals, startup, Shutdown};
use route_resolver::observability::{logging, metrics};
use route_resolver::routing::{
    clean_path_info, CompiledRouteTable, FileRouteCache, RouteCacheRepository, RouteDefinitions,
    ServerVars,
};

#[derive(Parser)]
#[command(name = "route-resolver")]
#[command(about = "HTTP route resolver with a persisted compiled-route cache", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured environment (production, development).
    #[arg(short, long, global = true)]
    environment: Option<Environment>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the front controller
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },
    /// Resolve a method and path against the configured routes
    Dispatch { method: String, path: String },
    /// Print the canonical path for CGI-style server values
    CleanPath {
        #[arg(long, default_value = "")]
        script_self: String,
        #[arg(long, default_value = "")]
        request_uri: String,
        #[arg(long, default_value = "")]
        path_info: String,
    },
    /// Compile the routes and write the cache file
    WarmCache,
    /// Delete the cache file
    ClearCache,
    /// List the configured routes
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(environment) = cli.environment {
        config.environment = environment;
    }

    logging::init_logging(&config.observability, config.environment)?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.listener.bind_address = bind;
            }
            serve(config).await?;
        }
        Commands::Dispatch { method, path } => {
            let resolver = startup::build_resolver(&config)?;
            let result = resolver.resolve(&method.to_ascii_uppercase(), &path)?;
            print_json(&json!({ "method": method, "path": path, "result": result }))?;
        }
        Commands::CleanPath {
            script_self,
            request_uri,
            path_info,
        } => {
            let vars = ServerVars::new(script_self, request_uri, path_info);
            print_json(&json!({ "path": clean_path_info(&vars) }))?;
        }
        Commands::WarmCache => {
            let definitions = RouteDefinitions::from_config(&config.routes)?;
            let table = CompiledRouteTable::compile(&definitions)?;
            let cache = FileRouteCache::from_config(&config.cache);
            cache.store(&table)?;
            print_json(&json!({
                "cache_file": cache.path(),
                "routes": table.route_count(),
                "fingerprint": table.fingerprint,
            }))?;
        }
        Commands::ClearCache => {
            let cache = FileRouteCache::from_config(&config.cache);
            cache.clear()?;
            print_json(&json!({ "cache_file": cache.path(), "cleared": true }))?;
        }
        Commands::Routes => {
            let definitions = RouteDefinitions::from_config(&config.routes)?;
            print_json(&json!({
                "fingerprint": definitions.fingerprint(),
                "routes": definitions.routes(),
            }))?;
        }
    }

    Ok(())
}

async fn serve(config: ResolverConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = %config.environment,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let resolver = startup::build_resolver(&config)?;
    let handlers = HandlerRegistry::with_builtins(resolver.definitions());
    let server = HttpServer::with_resolver(&config, resolver, handlers)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
