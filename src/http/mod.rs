//! HTTP front controller subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, catch-all handler)
//!     → request.rs (request ID, server vars from headers)
//!     → routing::path (canonical path, current route)
//!     → routing::RouteResolver (Found / NotFound / MethodNotAllowed)
//!     → handlers.rs (named handler) or response.rs (404 / 405)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::{HandlerRegistry, RouteHandler, RouteRequest};
pub use request::{MakeRequestUuid, X_PATH_INFO, X_REQUEST_ID, X_SCRIPT_NAME};
pub use server::{HttpServer, ServerError};
