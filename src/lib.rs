//! Mad: request dispatch and controller lifecycle for an MVC web framework.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                      MAD                         │
//!                         │                                                  │
//!     Client Request      │  ┌─────────┐    ┌────────────┐    ┌──────────┐   │
//!     ────────────────────┼─▶│  http   │───▶│  dispatch  │───▶│ routing  │   │
//!                         │  │ server  │    │ dispatcher │    │ RouteSet │   │
//!                         │  └─────────┘    └─────┬──────┘    └──────────┘   │
//!                         │                       │                          │
//!                         │                       ▼                          │
//!                         │               ┌───────────────┐                  │
//!                         │               │  controller   │                  │
//!                         │               │ registry,     │                  │
//!                         │               │ filters,      │───▶ view         │
//!                         │               │ render        │    templates     │
//!                         │               └───────┬───────┘                  │
//!     Client Response     │  ┌─────────┐          │                          │
//!     ◀───────────────────┼──│response │◀─────────┘                          │
//!                         │  └─────────┘                                     │
//!                         │                                                  │
//!                         │  Cross-cutting: config, observability, lifecycle │
//!                         └──────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod controller;
pub mod dispatch;
pub mod http;
pub mod routing;
pub mod view;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use controller::{
    ActionResult, Context, Controller, ControllerError, ControllerRegistry, Definition,
    FilterOptions, RedirectTarget, RenderOptions,
};
pub use dispatch::{DispatchError, Dispatcher};
pub use http::{HttpServer, Request, Response};
pub use lifecycle::Shutdown;
pub use routing::{RouteSet, RoutingError};
pub use view::{Format, View};
