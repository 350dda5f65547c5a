//! The dispatcher: route, resolve, process, log.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::http::StatusCode;
use thiserror::Error;

use crate::config::AppConfig;
use crate::controller::context::merge_params;
use crate::controller::{ControllerError, ControllerRegistry, ResolveError};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::observability::{logging, metrics};
use crate::routing::{RouteMatch, RouteSet, RoutingError, ROUTING_KEYS};
use crate::view::View;

const DEFAULT_LOG_WIDTH: usize = 80;

/// Errors surfaced by [`Dispatcher::dispatch`].
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Controller(#[from] ControllerError),
}

impl DispatchError {
    /// Status a transport should answer with.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Routing(RoutingError::NoRoute { .. }) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            DispatchError::Routing(_) => "routing",
            DispatchError::Resolve(ResolveError::NotFound { .. }) => "controller_not_found",
            DispatchError::Resolve(_) => "definition",
            DispatchError::Controller(_) => "controller",
        }
    }
}

/// Routes requests to controllers.
pub struct Dispatcher {
    routes: ArcSwap<RouteSet>,
    registry: ControllerRegistry,
    view: Arc<View>,
    log_width: usize,
}

impl Dispatcher {
    pub fn new(routes: RouteSet, registry: ControllerRegistry, view: View) -> Self {
        Self {
            routes: ArcSwap::from_pointee(routes),
            registry,
            view: Arc::new(view),
            log_width: DEFAULT_LOG_WIDTH,
        }
    }

    /// Build routes and views from configuration.
    pub fn from_config(
        config: &AppConfig,
        registry: ControllerRegistry,
    ) -> Result<Self, RoutingError> {
        let routes = RouteSet::from_config(&config.routes)?;
        Ok(Self::new(routes, registry, View::from_config(&config.views))
            .with_log_width(config.observability.log_width))
    }

    /// Wrap the request log line at `width` columns.
    pub fn with_log_width(mut self, width: usize) -> Self {
        self.log_width = width;
        self
    }

    /// The current route table.
    pub fn routes(&self) -> Arc<RouteSet> {
        self.routes.load_full()
    }

    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Replace the route table. In-flight requests finish on the old one.
    pub fn reload_routes(&self, routes: RouteSet) {
        let count = routes.len();
        self.routes.store(Arc::new(routes));
        metrics::record_reload();
        tracing::info!(routes = count, "Route table reloaded");
    }

    /// Match `request` against the current table without dispatching.
    pub fn recognize(&self, request: &Request) -> Result<RouteMatch, RoutingError> {
        let method = request.method().as_str();
        self.routes
            .load()
            .recognize(request.route_path(), method)
            .ok_or_else(|| RoutingError::NoRoute {
                method: method.to_string(),
                path: request.path().to_string(),
            })
    }

    /// Route `request` to its controller and run it.
    pub fn dispatch(&self, request: Request) -> Result<Response, DispatchError> {
        let start = Instant::now();
        let method = request.method().to_string();
        let uri = request.uri().to_string();

        match self.process(request) {
            Ok((class, summary, response)) => {
                let elapsed = start.elapsed();
                let line = logging::request_line(
                    &method,
                    &uri,
                    elapsed,
                    response.db_runtime(),
                    &summary,
                    self.log_width,
                );
                tracing::info!(
                    method = %method,
                    status = response.status().as_u16(),
                    controller = %class,
                    "{}",
                    line
                );
                metrics::record_request(&method, response.status().as_u16(), &class, start);
                Ok(response)
            }
            Err(e) => {
                tracing::debug!(method = %method, uri = %uri, error = %e, "Dispatch failed");
                metrics::record_error(e.kind());
                Err(e)
            }
        }
    }

    fn process(&self, mut request: Request) -> Result<(String, String, Response), DispatchError> {
        let routes = self.routes.load_full();
        let method = request.method().as_str().to_string();
        let found = routes
            .recognize(request.route_path(), &method)
            .ok_or_else(|| RoutingError::NoRoute {
                method,
                path: request.path().to_string(),
            })?;

        let class = found.controller_class().to_string();
        tracing::debug!(
            controller = %class,
            action = found.action_method(),
            route = found.route_name.as_deref().unwrap_or("-"),
            "Route recognized"
        );
        request.set_path_params(found.params);
        let summary = merge_params(&request).summary(&ROUTING_KEYS);

        let mut controller = self.registry.resolve(&class)?;
        let response = controller.process(request, Arc::clone(&self.view), routes)?;
        Ok((class, summary, response))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.load().len())
            .field("registry", &self.registry)
            .field("view", &self.view)
            .field("log_width", &self.log_width)
            .finish()
    }
}
