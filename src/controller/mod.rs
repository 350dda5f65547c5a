//! Controller subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher (route match bound into the Request)
//!     → resolver.rs (class name → fresh controller + its Definition)
//!     → base.rs process():
//!         context.rs (merge params, bind session/flash/cookie proxies)
//!         → initialize_application
//!         → definition.rs (resolve the action once)
//!         → filters.rs (before filters, scoped by only/except)
//!         → action
//!         → filters.rs (after filters)
//!         → default render if nothing performed
//!     → Response (session and flash flushed)
//! ```
//!
//! # Design Decisions
//! - Actions, helper methods and filters are typed function pointers,
//!   registered by name in `Controller::define`
//! - A request performs at most once; a second render or redirect is an error
//! - Controllers are created per request and never shared between threads

use std::error::Error as StdError;

use thiserror::Error;

use crate::view::ViewError;

pub mod base;
pub mod context;
pub mod definition;
pub mod filters;
pub mod options;
pub mod proxies;
pub mod render;
pub mod resolver;

pub use base::{AnyController, Instance};
pub use context::Context;
pub use definition::{Definition, ResolvedAction};
pub use filters::{FilterChain, FilterOptions, Scope};
pub use proxies::{CookieOptions, CookieProxy, FlashProxy, SessionProxy};
pub use render::{Performed, RedirectTarget, RenderOptions};
pub use resolver::{ControllerRegistry, ResolveError};

/// Outcome of an action, filter or hook.
pub type ActionResult = Result<(), ControllerError>;

/// An action, helper method or filter of controller `C`.
pub type ActionFn<C> = fn(&mut C, &mut Context) -> ActionResult;

/// Catch-all receiving the requested action name.
pub type MissingFn<C> = fn(&mut C, &mut Context, &str) -> ActionResult;

/// Boxed application error raised from an action.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A controller type.
///
/// ```ignore
/// #[derive(Default)]
/// struct PostsController;
///
/// impl Controller for PostsController {
///     const NAME: &'static str = "PostsController";
///
///     fn define(def: &mut Definition<Self>) -> Result<(), ControllerError> {
///         def.action("index", Self::index);
///         Ok(())
///     }
/// }
/// ```
pub trait Controller: Default + 'static {
    /// Class name the router produces, e.g. `PostsController`.
    const NAME: &'static str;

    /// Register actions, helper methods, filters and layout.
    fn define(definition: &mut Definition<Self>) -> Result<(), ControllerError>;

    /// Runs before any filter. Rendering or redirecting here ends the request.
    fn initialize_application(&mut self, _ctx: &mut Context) -> ActionResult {
        Ok(())
    }
}

/// Errors raised while defining or running a controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("action `{action}` not found in {controller}")]
    MissingAction { controller: String, action: String },

    #[error("filter method `{method}` is not defined in {controller}")]
    UnknownFilterMethod { controller: String, method: String },

    #[error("filter `{filter}` cannot be scoped with both only and except")]
    ConflictingFilterScope { filter: String },

    #[error(
        "Render and/or redirect were called multiple times in this action. \
         Please note that you may only call render OR redirect, and at most once per action."
    )]
    DoubleRender,

    #[error("Unknown key(s): {}", .0.join(", "))]
    UnknownOptions(Vec<String>),

    #[error("invalid value for option `{key}`: {reason}")]
    InvalidOption { key: String, reason: String },

    #[error(
        "No HTTP_REFERER was set in the request to this action, so redirect_to(back) \
         could not be called successfully. If this is a test, make sure to specify HTTP_REFERER."
    )]
    RedirectBackWithoutReferer,

    #[error("no route generates a URL for {params}")]
    NoRouteForUrl { params: String },

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("action failed: {0}")]
    Application(#[source] BoxError),
}

impl ControllerError {
    /// Wrap an application error raised from an action.
    pub fn application(err: impl Into<BoxError>) -> Self {
        ControllerError::Application(err.into())
    }
}
