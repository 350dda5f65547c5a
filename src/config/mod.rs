//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, routes compile)
//!     → AppConfig (validated, immutable)
//!     → RouteSet / View / HttpServer built from it
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads and validates the file
//!     → RouteSet compiled from [[routes]], dropped if unchanged
//!     → Dispatcher::reload_routes swaps the route table
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AppConfig;
pub use schema::ObservabilityConfig;
pub use schema::RouteConfig;
pub use schema::ServerConfig;
pub use schema::SessionConfig;
pub use schema::ViewConfig;
pub use validation::ValidationError;
pub use watcher::{reload_routes, ConfigWatcher, ReloadError};
