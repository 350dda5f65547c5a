//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use mad::controller::{
    ActionResult, Context, Controller, ControllerError, Definition, FilterOptions,
    RedirectTarget, RenderOptions,
};
use mad::http::StatusCode;
use mad::{AppConfig, ControllerRegistry, Dispatcher, HttpServer, RouteSet, Shutdown, View};
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// The controller most suites exercise.
#[derive(Default)]
pub struct UnitTestController {
    authenticated: bool,
}

impl UnitTestController {
    fn index(&mut self, _: &mut Context) -> ActionResult {
        Ok(())
    }

    fn test_action(&mut self, ctx: &mut Context) -> ActionResult {
        let body = format!("authenticated={}", self.authenticated);
        ctx.render_text(body)
    }

    fn login(&mut self, ctx: &mut Context) -> ActionResult {
        let body = format!("authenticated={}", self.authenticated);
        ctx.render_text(body)
    }

    /// Served for `/unit_test/type`.
    fn type_action(&mut self, ctx: &mut Context) -> ActionResult {
        ctx.assign("kind", "reserved");
        Ok(())
    }

    fn forbidden(&mut self, ctx: &mut Context) -> ActionResult {
        ctx.render(RenderOptions::parse(&json!({"status": 403, "text": "go away"}))?)
    }

    fn back(&mut self, ctx: &mut Context) -> ActionResult {
        ctx.redirect_to("back")
    }

    fn double(&mut self, ctx: &mut Context) -> ActionResult {
        ctx.render_text("first")?;
        ctx.render(RenderOptions::text("second").with_status(StatusCode::INTERNAL_SERVER_ERROR))
    }

    fn typo(&mut self, ctx: &mut Context) -> ActionResult {
        ctx.render(RenderOptions::parse(&json!({"txt": "oops", "stauts": 200}))?)
    }

    fn show(&mut self, ctx: &mut Context) -> ActionResult {
        let id = ctx.param("id").unwrap_or_default().to_string();
        ctx.assign("id", id);
        Ok(())
    }

    fn missing(&mut self, _: &mut Context) -> ActionResult {
        Ok(())
    }

    fn remember(&mut self, ctx: &mut Context) -> ActionResult {
        let name = ctx.param("name").unwrap_or("anonymous").to_string();
        ctx.session().set("name", json!(name));
        ctx.flash().set("notice", format!("Remembered {}", name));
        ctx.redirect_to(RedirectTarget::route([("action", "recall")]))
    }

    fn recall(&mut self, ctx: &mut Context) -> ActionResult {
        let name = ctx.session().get_str("name").unwrap_or("nobody").to_string();
        let notice = ctx.flash().get_str("notice").unwrap_or("none").to_string();
        ctx.render_text(format!("{} / {}", name, notice))
    }

    fn upload(&mut self, ctx: &mut Context) -> ActionResult {
        let summary = match ctx.request().file("attachment") {
            Some(file) => format!("{} {} bytes", file.file_name, file.size()),
            None => "no file".to_string(),
        };
        let title = ctx.param("title").unwrap_or_default().to_string();
        ctx.render_text(format!("{}: {}", title, summary))
    }

    fn authenticate(&mut self, _: &mut Context) -> ActionResult {
        self.authenticated = true;
        Ok(())
    }
}

impl Controller for UnitTestController {
    const NAME: &'static str = "UnitTestController";

    fn define(def: &mut Definition<Self>) -> Result<(), ControllerError> {
        def.action("index", Self::index)
            .action("test_action", Self::test_action)
            .action("login", Self::login)
            .action("typeAction", Self::type_action)
            .action("forbidden", Self::forbidden)
            .action("back", Self::back)
            .action("double", Self::double)
            .action("typo", Self::typo)
            .action("show", Self::show)
            .action("missing", Self::missing)
            .action("remember", Self::remember)
            .action("recall", Self::recall)
            .action("upload", Self::upload)
            .method("authenticate", Self::authenticate);
        def.before_filter("authenticate", FilterOptions::except(["login"]))?;
        Ok(())
    }
}

/// A views tree for [`UnitTestController`].
pub fn views() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "layouts/application.html", "<main>{{ content_for_layout }}</main>");
    write(dir.path(), "UnitTest/index.html", "index page");
    write(dir.path(), "UnitTest/type.html", "type template: {{ kind }}");
    write(dir.path(), "UnitTest/show.html", "showing {{ id }}");
    write(dir.path(), "UnitTest/show.js", "show({{ id }});");
    dir
}

pub fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

pub fn registry() -> ControllerRegistry {
    let mut registry = ControllerRegistry::new();
    registry.register::<UnitTestController>();
    registry
}

/// A dispatcher over the default route and `views`.
pub fn dispatcher(views: &TempDir) -> Dispatcher {
    Dispatcher::new(
        RouteSet::with_default_route(),
        registry(),
        View::new(views.path(), "application"),
    )
}

/// Serve `dispatcher` on an ephemeral port.
pub async fn start_server(dispatcher: Dispatcher) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(AppConfig::default(), Arc::new(dispatcher));
    let shutdown = Shutdown::new();
    let handle = shutdown.clone();
    tokio::spawn(async move {
        server.run(listener, &handle).await.unwrap();
    });
    (addr, shutdown)
}
