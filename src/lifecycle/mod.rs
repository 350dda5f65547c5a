//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() or Ctrl+C → HTTP server stops accepting → in-flight requests drain → exit
//! ```
//!
//! # Design Decisions
//! - One watch channel fans the signal out to every long-running task
//! - The config watcher and the server share the same coordinator

pub mod shutdown;

pub use shutdown::Shutdown;
