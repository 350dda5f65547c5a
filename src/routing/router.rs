//! Route lookup and generation.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Look up the first matching route for a path and method
//! - Normalize the bindings of a match
//! - Generate paths from parameters (`url_for`)
//!
//! # Design Decisions
//! - Immutable after construction; reload replaces the whole set
//! - O(n) scan in registration order, first match wins
//! - Explicit `None` rather than a silent default route

use indexmap::IndexMap;

use crate::config::RouteConfig;
use crate::routing::naming::{action_method, controller_class, normalize_action};
use crate::routing::route::{default_route, Route};
use crate::routing::RoutingError;

/// Parameter keys produced by the router itself.
pub const ROUTING_KEYS: [&str; 4] = ["controller", ":controller", "action", ":action"];

/// The outcome of a successful recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Index of the matched rule in the set.
    pub index: usize,
    /// Name of the matched rule, if it has one.
    pub route_name: Option<String>,
    /// Bindings, always including the four routing keys.
    pub params: IndexMap<String, String>,
}

impl RouteMatch {
    /// Controller class name, e.g. `UnitTestController`.
    pub fn controller_class(&self) -> &str {
        self.params.get(":controller").map(String::as_str).unwrap_or_default()
    }

    /// Action method name, e.g. `testAction`.
    pub fn action_method(&self) -> &str {
        self.params.get(":action").map(String::as_str).unwrap_or_default()
    }
}

/// An ordered, immutable set of route rules.
#[derive(Debug, Clone, Default)]
pub struct RouteSet {
    routes: Vec<Route>,
}

impl RouteSet {
    /// An empty set. Nothing is recognized until rules are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// The conventional fallback `:controller/:action/:id`.
    pub fn with_default_route() -> Self {
        let mut set = Self::new();
        set.push(default_route());
        set
    }

    /// Compile route configuration. An empty list yields the default route.
    pub fn from_config(configs: &[RouteConfig]) -> Result<Self, RoutingError> {
        if configs.is_empty() {
            return Ok(Self::with_default_route());
        }
        let routes = configs
            .iter()
            .map(Route::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { routes })
    }

    /// Append a rule; it is tried after every rule already present.
    pub fn push(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the first rule matching `path` (query string ignored) and `method`.
    pub fn recognize(&self, path: &str, method: &str) -> Option<RouteMatch> {
        let path = path.split('?').next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        self.routes.iter().enumerate().find_map(|(index, route)| {
            let params = route.match_segments(&segments, method)?;
            Some(RouteMatch {
                index,
                route_name: route.name().map(str::to_string),
                params: normalize(params),
            })
        })
    }

    /// Generate a path from the first rule able to produce one.
    pub fn generate(&self, params: &IndexMap<String, String>) -> Option<String> {
        let params = denormalize(params);
        self.routes
            .iter()
            .find_map(|route| route.generate(&params, true))
    }

    /// Generate a path from the rule called `name`.
    pub fn generate_named(&self, name: &str, params: &IndexMap<String, String>) -> Option<String> {
        let params = denormalize(params);
        self.routes
            .iter()
            .find(|route| route.name() == Some(name))
            .and_then(|route| route.generate(&params, false))
    }
}

/// Add the class/method forms of the routing keys.
fn normalize(mut params: IndexMap<String, String>) -> IndexMap<String, String> {
    let controller = params.get("controller").cloned().unwrap_or_default();
    let action = params
        .get("action")
        .map(|a| normalize_action(a).to_string())
        .unwrap_or_else(|| "index".to_string());

    let mut out = IndexMap::with_capacity(params.len() + 2);
    out.insert("controller".to_string(), controller.clone());
    out.insert(":controller".to_string(), controller_class(&controller));
    out.insert("action".to_string(), action.clone());
    out.insert(":action".to_string(), action_method(&action));
    params.shift_remove("controller");
    params.shift_remove("action");
    out.extend(params);
    out
}

/// Drop the derived `:controller`/`:action` keys before generation.
fn denormalize(params: &IndexMap<String, String>) -> IndexMap<String, String> {
    params
        .iter()
        .filter(|(key, _)| !key.starts_with(':'))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
