//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Route definitions → Resolver (cache wired in)
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Routes are compiled lazily on the first request, not at startup

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
