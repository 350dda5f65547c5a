//! The per-request controller lifecycle.
//!
//! # States
//! ```text
//! Initialized → ParamsBound → ProxiesBound → AppInitialized
//!     → BeforeFiltersRun → ActionExecuted → AfterFiltersRun
//!     → Rendered | Redirected
//! ```
//!
//! # Design Decisions
//! - `initialize_application` performing jumps straight to the end
//! - A before filter that performs stops the chain and skips the action
//! - After filters run even when the action rendered; an after filter that
//!   performs stops the rest
//! - The implicit default render comes last

use std::sync::Arc;

use crate::controller::{Controller, ControllerError, Context, Definition};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::routing::RouteSet;
use crate::view::View;

/// A controller behind a trait object, as handed out by the registry.
pub trait AnyController {
    fn class_name(&self) -> &'static str;

    /// Run the full lifecycle for `request`.
    fn process(
        &mut self,
        request: Request,
        view: Arc<View>,
        routes: Arc<RouteSet>,
    ) -> Result<Response, ControllerError>;
}

/// A controller together with its definition.
pub struct Instance<C: Controller> {
    controller: C,
    definition: Definition<C>,
}

impl<C: Controller> Instance<C> {
    /// Build a fresh controller, running its `define`.
    pub fn new() -> Result<Self, ControllerError> {
        let mut definition = Definition::new(C::NAME);
        C::define(&mut definition)?;
        Ok(Self {
            controller: C::default(),
            definition,
        })
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn definition(&self) -> &Definition<C> {
        &self.definition
    }

    /// Drive `ctx` through filters, action and default render.
    pub fn run(&mut self, ctx: &mut Context) -> Result<(), ControllerError> {
        ctx.set_layout(self.definition.current_layout().clone());

        self.controller.initialize_application(ctx)?;
        if ctx.is_performed() {
            tracing::debug!(controller = C::NAME, "initialize_application performed");
            return Ok(());
        }

        let action = ctx.action_name().to_string();
        let resolved = self.definition.resolve_action(&action)?;
        ctx.set_default_template(resolved.template());
        let pair = format!("{}::{}", C::NAME, action);

        for filter in self.definition.before_filters().applicable(&pair) {
            (filter.method())(&mut self.controller, ctx)?;
            if ctx.is_performed() {
                tracing::debug!(
                    controller = C::NAME,
                    action = %action,
                    filter = filter.name(),
                    "Before filter halted the chain"
                );
                return Ok(());
            }
        }

        tracing::trace!(
            controller = C::NAME,
            method = resolved.method_name(),
            "Invoking action"
        );
        resolved.invoke(&mut self.controller, ctx)?;

        let rendered_by_action = ctx.is_performed();
        for filter in self.definition.after_filters().applicable(&pair) {
            (filter.method())(&mut self.controller, ctx)?;
            if !rendered_by_action && ctx.is_performed() {
                break;
            }
        }

        ctx.render_default()
    }
}

impl<C: Controller> AnyController for Instance<C> {
    fn class_name(&self) -> &'static str {
        C::NAME
    }

    fn process(
        &mut self,
        request: Request,
        view: Arc<View>,
        routes: Arc<RouteSet>,
    ) -> Result<Response, ControllerError> {
        let mut ctx = Context::new(request, C::NAME, view, routes);
        self.run(&mut ctx)?;
        Ok(ctx.finish())
    }
}
