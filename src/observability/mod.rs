//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher / HTTP transport produce:
//!     → logging.rs (structured tracing events, one wrapped line per request)
//!     → metrics.rs (request counters, latency histogram, error counters)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Logging is initialised once per process from `ObservabilityConfig`
//! - `RUST_LOG` overrides the configured level
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
