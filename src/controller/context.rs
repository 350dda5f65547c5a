//! Per-request controller context.
//!
//! # Responsibilities
//! - Own the request, the response being built and the merged params
//! - Expose session, flash and cookie proxies
//! - Implement render, redirect and URL generation
//! - Track whether the request has performed
//!
//! # Design Decisions
//! - Render and redirect check [`Performed`] before touching the response,
//!   so a rejected second attempt leaves the first result intact
//! - The format is negotiated once, when the context is built
//! - Path params are merged last and win over query and body params

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use indexmap::IndexMap;
use serde_json::Value;

use crate::controller::proxies::{CookieProxy, FlashProxy, SessionProxy};
use crate::controller::render::{Performed, RedirectTarget, RenderOptions};
use crate::controller::{ActionResult, ControllerError};
use crate::http::params::Params;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::routing::naming::{controller_path, short_name};
use crate::routing::RouteSet;
use crate::view::{Assigns, Format, Layout, View};

/// Everything an action or filter works with during one request.
pub struct Context {
    request: Request,
    response: Response,
    params: Params,
    session: SessionProxy,
    flash: FlashProxy,
    cookies: IndexMap<String, String>,
    assigns: Assigns,
    performed: Performed,
    format: Format,
    controller: &'static str,
    action: String,
    template: String,
    layout: Layout,
    view: Arc<View>,
    routes: Arc<RouteSet>,
}

impl Context {
    /// Bind params and proxies for `request`, handled by controller `class`.
    pub fn new(
        request: Request,
        class: &'static str,
        view: Arc<View>,
        routes: Arc<RouteSet>,
    ) -> Self {
        let params = merge_params(&request);
        let mut session = SessionProxy::new(request.session().clone());
        let flash = FlashProxy::load(&mut session);
        let cookies = request.cookies().clone();
        let format = negotiate_format(&request);
        let action = request
            .path_params()
            .get(":action")
            .cloned()
            .unwrap_or_else(|| "index".to_string());

        Self {
            template: action.clone(),
            request,
            response: Response::new(),
            params,
            session,
            flash,
            cookies,
            assigns: Assigns::new(),
            performed: Performed::NotYet,
            format,
            controller: class,
            action,
            layout: Layout::Default,
            view,
            routes,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Direct access for headers and status outside of render.
    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// A string param, e.g. `ctx.param("id")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get_str(key)
    }

    pub fn session(&mut self) -> &mut SessionProxy {
        &mut self.session
    }

    pub fn flash(&mut self) -> &mut FlashProxy {
        &mut self.flash
    }

    pub fn cookies(&mut self) -> CookieProxy<'_> {
        CookieProxy::new(&mut self.cookies, &mut self.response)
    }

    /// Make `value` available to templates as `{{ key }}`.
    pub fn assign(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.assigns.insert(key.into(), value.into());
    }

    pub fn assigns(&self) -> &Assigns {
        &self.assigns
    }

    /// Controller class handling the request.
    pub fn controller_name(&self) -> &str {
        self.controller
    }

    /// Action method name, e.g. `testAction`.
    pub fn action_name(&self) -> &str {
        &self.action
    }

    /// Template rendered when the action does not render explicitly.
    pub fn default_template(&self) -> &str {
        &self.template
    }

    pub(crate) fn set_default_template(&mut self, template: impl Into<String>) {
        self.template = template.into();
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Override the controller's layout for this request.
    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    /// The negotiated response format.
    pub fn respond_to(&self) -> Format {
        self.format
    }

    pub fn performed(&self) -> &Performed {
        &self.performed
    }

    pub fn is_performed(&self) -> bool {
        self.performed.is_performed()
    }

    /// Add time spent in the database to the request log line.
    pub fn record_db_runtime(&mut self, elapsed: Duration) {
        self.response.add_db_runtime(elapsed);
    }

    /// Render a response body. See [`RenderOptions`] for precedence.
    pub fn render(&mut self, options: RenderOptions) -> ActionResult {
        self.ensure_not_performed()?;

        let body = if let Some(text) = options.text {
            Some(text)
        } else if let Some(action) = options.action.as_deref() {
            Some(self.render_template(action)?)
        } else if options.nothing {
            None
        } else {
            let template = self.template.clone();
            Some(self.render_template(&template)?)
        };

        if let Some(status) = options.status {
            self.response.set_status(status);
        }
        match body {
            Some(body) => {
                self.response
                    .set_header("Content-Type", self.format.content_type());
                self.response.set_body(body);
            }
            None => self.response.set_body(Vec::new()),
        }
        self.performed = Performed::Rendered;
        Ok(())
    }

    /// Shorthand for `render(RenderOptions::text(text))`.
    pub fn render_text(&mut self, text: impl Into<String>) -> ActionResult {
        self.render(RenderOptions::text(text))
    }

    /// Send a 302 to `target`.
    pub fn redirect_to(&mut self, target: impl Into<RedirectTarget>) -> ActionResult {
        self.ensure_not_performed()?;

        let url = match target.into() {
            RedirectTarget::Url(url) => url,
            RedirectTarget::Back => self
                .request
                .referer()
                .map(str::to_string)
                .ok_or(ControllerError::RedirectBackWithoutReferer)?,
            RedirectTarget::Route(params) => self.url_for(params)?,
        };

        self.response.set_status(StatusCode::FOUND);
        self.response.set_header("Location", &url);
        self.response
            .set_header("Content-Type", Format::Html.content_type());
        self.response.set_body(format!(
            "<html><body>You are being <a href=\"{}\">redirected</a>.</body></html>",
            url
        ));
        tracing::debug!(location = %url, "Redirected");
        self.performed = Performed::Redirected(url);
        Ok(())
    }

    /// Generate a URL from routing params.
    ///
    /// A missing `controller` means the current one. A missing `action` means
    /// the current action when the controller is implied, `index` otherwise.
    pub fn url_for(&self, mut params: IndexMap<String, String>) -> Result<String, ControllerError> {
        if !params.contains_key("controller") {
            let controller = self
                .request
                .path_params()
                .get("controller")
                .cloned()
                .unwrap_or_else(|| controller_path(self.controller));
            params.insert("controller".to_string(), controller);
            if !params.contains_key("action") {
                let action = self
                    .request
                    .path_params()
                    .get("action")
                    .cloned()
                    .unwrap_or_else(|| "index".to_string());
                params.insert("action".to_string(), action);
            }
        } else if !params.contains_key("action") {
            params.insert("action".to_string(), "index".to_string());
        }

        self.routes
            .generate(&params)
            .ok_or_else(|| ControllerError::NoRouteForUrl {
                params: format!("{:?}", params),
            })
    }

    /// Render the default template unless something already performed.
    pub(crate) fn render_default(&mut self) -> ActionResult {
        if self.is_performed() {
            return Ok(());
        }
        self.render(RenderOptions::new())
    }

    /// Flush session and flash into the response.
    pub(crate) fn finish(self) -> Response {
        let Context {
            mut response,
            mut session,
            flash,
            ..
        } = self;
        flash.sweep(&mut session);
        response.set_session(session.into_inner());
        response
    }

    fn render_template(&self, name: &str) -> Result<String, ControllerError> {
        let body = self.view.render(
            name,
            short_name(self.controller),
            self.format,
            &self.layout,
            &self.assigns,
        )?;
        Ok(body)
    }

    fn ensure_not_performed(&self) -> ActionResult {
        if self.is_performed() {
            Err(ControllerError::DoubleRender)
        } else {
            Ok(())
        }
    }
}

/// Query, then body, then path params; later sources win.
pub(crate) fn merge_params(request: &Request) -> Params {
    let mut params = Params::new();
    for (key, value) in request.query_params().iter() {
        params.insert(key.clone(), value.clone());
    }
    for (key, value) in request.body_params().iter() {
        params.insert(key.clone(), value.clone());
    }
    for (key, value) in request.path_params() {
        params.insert(key.clone(), Value::String(value.clone()));
    }
    params
}

/// `Accept` first, then the path suffix, then html.
pub fn negotiate_format(request: &Request) -> Format {
    if let Some(accept) = request.header("accept") {
        if accept.contains("javascript") {
            return Format::Js;
        }
        if accept.contains("text/html") {
            return Format::Html;
        }
    }
    if request.path().ends_with(".js") {
        Format::Js
    } else {
        Format::Html
    }
}
