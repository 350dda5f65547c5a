//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (ordered rule scan)
//!     → route.rs (segment matching, defaults)
//!     → matcher.rs (requirements, method conditions)
//!     → naming.rs (controller class / action method names)
//!     → Return: RouteMatch or None
//!
//! Route Compilation (at startup or reload):
//!     RouteConfig[]
//!     → segment.rs (parse patterns)
//!     → Compile requirements
//!     → Freeze as immutable RouteSet
//! ```
//!
//! # Design Decisions
//! - Routes compiled up front, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

use thiserror::Error;

pub mod matcher;
pub mod naming;
pub mod route;
pub mod router;
pub mod segment;

pub use route::Route;
pub use router::{RouteMatch, RouteSet, ROUTING_KEYS};
pub use segment::Segment;

/// Errors raised while building or consulting the route table.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// No rule matches the path/method combination.
    #[error("no route matches {method} {path}")]
    NoRoute { method: String, path: String },

    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid requirement for `{key}`: {reason}")]
    InvalidRequirement { key: String, reason: String },

    #[error("unknown request method `{0}`")]
    InvalidMethod(String),
}
