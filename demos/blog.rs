//! A small blog served by Mad.
//!
//! Run from the repository root:
//!
//! ```text
//! cargo run --example blog -- demos/mad.toml
//! ```
//!
//! Editing the config file while the server runs reloads the route table.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use mad::config::{load_config, ConfigWatcher};
use mad::controller::{ActionResult, Context, Controller, ControllerError, Definition};
use mad::http::StatusCode;
use mad::observability::{logging::init_logging, metrics::init_metrics};
use mad::{
    ControllerRegistry, Dispatcher, FilterOptions, HttpServer, RedirectTarget, RenderOptions,
    Shutdown,
};
use serde_json::json;
use tokio::net::TcpListener;

const POSTS: [(&str, &str); 3] = [
    ("Hello", "The first post."),
    ("Routing", "Rules are tried in order."),
    ("Filters", "Before, around the action, after."),
];

#[derive(Default)]
struct PostsController;

impl PostsController {
    fn index(&mut self, ctx: &mut Context) -> ActionResult {
        let started = Instant::now();
        let items: String = POSTS
            .iter()
            .enumerate()
            .map(|(id, (title, _))| format!("<li><a href=\"/posts/{}\">{}</a></li>", id, title))
            .collect();
        ctx.record_db_runtime(started.elapsed());
        ctx.assign("title", "Posts");
        ctx.assign("posts", items);
        Ok(())
    }

    fn show(&mut self, ctx: &mut Context) -> ActionResult {
        let post = ctx
            .param("id")
            .and_then(|id| id.parse::<usize>().ok())
            .and_then(|id| POSTS.get(id));
        match post {
            Some((title, body)) => {
                ctx.assign("title", *title);
                ctx.assign("post_title", *title);
                ctx.assign("post_body", *body);
                Ok(())
            }
            None => ctx.render(
                RenderOptions::text("no such post").with_status(StatusCode::NOT_FOUND),
            ),
        }
    }

    /// `new` reads better in URLs than in Rust, so it takes the suffixed name.
    fn new_action(&mut self, ctx: &mut Context) -> ActionResult {
        ctx.flash().now("notice", "Drafts are not saved in the demo.");
        ctx.redirect_to(RedirectTarget::route([("action", "index")]))
    }

    fn load_flash(&mut self, ctx: &mut Context) -> ActionResult {
        let notice = ctx.flash().get_str("notice").unwrap_or_default().to_string();
        ctx.assign("notice", notice);
        Ok(())
    }

    fn require_login(&mut self, ctx: &mut Context) -> ActionResult {
        if ctx.session().get_str("user").is_none() {
            ctx.flash().set("notice", "Please log in first.");
            ctx.redirect_to("/sessions/new")?;
        }
        Ok(())
    }
}

impl Controller for PostsController {
    const NAME: &'static str = "PostsController";

    fn define(def: &mut Definition<Self>) -> Result<(), ControllerError> {
        def.action("index", Self::index)
            .action("show", Self::show)
            .action("newAction", Self::new_action)
            .method("load_flash", Self::load_flash)
            .method("require_login", Self::require_login);
        def.before_filter("load_flash", FilterOptions::all())?
            .before_filter("require_login", FilterOptions::only(["new"]))?;
        Ok(())
    }
}

#[derive(Default)]
struct SessionsController;

impl SessionsController {
    fn new_action(&mut self, ctx: &mut Context) -> ActionResult {
        ctx.assign("title", "Log in");
        ctx.render(RenderOptions::action("login"))
    }

    fn create(&mut self, ctx: &mut Context) -> ActionResult {
        let name = ctx.param("name").unwrap_or("guest").to_string();
        ctx.session().set("user", json!(name));
        ctx.flash().set("notice", format!("Welcome, {}.", name));
        ctx.redirect_to("/")
    }

    fn destroy(&mut self, ctx: &mut Context) -> ActionResult {
        ctx.session().clear();
        ctx.cookies().delete("remember_me");
        ctx.redirect_to(RedirectTarget::Back)
    }
}

impl Controller for SessionsController {
    const NAME: &'static str = "SessionsController";

    fn define(def: &mut Definition<Self>) -> Result<(), ControllerError> {
        def.action("newAction", Self::new_action)
            .action("create", Self::create)
            .action("destroy", Self::destroy);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/mad.toml"));
    let config = load_config(&path)?;
    init_logging(&config.observability);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut registry = ControllerRegistry::new();
    registry
        .register::<PostsController>()
        .register::<SessionsController>();
    for problem in registry.check() {
        tracing::error!(error = %problem, "Controller definition failed");
    }

    let dispatcher = Arc::new(Dispatcher::from_config(&config, registry)?);
    let shutdown = Shutdown::new();

    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let _watch_handle = watcher.run()?;
    let reload_target = Arc::clone(&dispatcher);
    let stop = shutdown.wait();
    tokio::spawn(async move {
        tokio::pin!(stop);
        loop {
            tokio::select! {
                Some(routes) = updates.recv() => reload_target.reload_routes(routes),
                _ = &mut stop => break,
            }
        }
    });

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let server = HttpServer::new(config, dispatcher);
    server.run(listener, &shutdown).await?;
    shutdown.trigger();
    Ok(())
}
