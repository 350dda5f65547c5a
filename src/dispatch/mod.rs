//! Request dispatch.
//!
//! # Data Flow
//! ```text
//! Request
//!     → RouteSet::recognize (current table, loaded from the ArcSwap)
//!     → Request::set_path_params
//!     → ControllerRegistry::resolve (fresh controller)
//!     → AnyController::process (full controller lifecycle)
//!     → Response + one wrapped log line + metrics
//! ```
//!
//! # Design Decisions
//! - Dispatch is synchronous; async transports call it on a blocking thread
//! - The route table is swapped wholesale on reload and never mutated
//! - Failures propagate to the caller; the log line is written on success only

pub mod dispatcher;

pub use dispatcher::{DispatchError, Dispatcher};
