//! Dispatcher and controller lifecycle, end to end without a transport.

use mad::controller::{
    ActionResult, Context, Controller, ControllerError, Definition, FilterOptions, ResolveError,
};
use mad::http::{Request, StatusCode};
use mad::routing::{Route, RoutingError};
use mad::view::ViewError;
use mad::{DispatchError, Dispatcher, RouteSet, View};

mod common;

#[test]
fn test_recognize_binds_normalized_params() {
    let views = common::views();
    let dispatcher = common::dispatcher(&views);

    let found = dispatcher
        .recognize(&Request::get("/unit_test/test_action/7").build())
        .unwrap();
    let params: Vec<(&str, &str)> = found
        .params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(
        params,
        [
            ("controller", "unit_test"),
            (":controller", "UnitTestController"),
            ("action", "test_action"),
            (":action", "testAction"),
            ("id", "7"),
        ]
    );
}

#[test]
fn test_reserved_action_name_uses_suffixed_method_and_plain_template() {
    let views = common::views();
    let response = common::dispatcher(&views)
        .dispatch(Request::get("/unit_test/type").build())
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body_str(), "<main>type template: reserved</main>");
}

#[test]
fn test_render_status_and_text() {
    let views = common::views();
    let response = common::dispatcher(&views)
        .dispatch(Request::get("/unit_test/forbidden").build())
        .unwrap();
    assert_eq!(response.status_line(), "HTTP/1.1 403 Forbidden");
    assert_eq!(response.body_str(), "go away");
}

#[test]
fn test_redirect_back_without_referer() {
    let views = common::views();
    let dispatcher = common::dispatcher(&views);

    let err = dispatcher
        .dispatch(Request::get("/unit_test/back").build())
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Controller(ControllerError::RedirectBackWithoutReferer)
    ));
    assert!(err.to_string().contains("make sure to specify HTTP_REFERER"));

    let response = dispatcher
        .dispatch(
            Request::get("/unit_test/back")
                .header("Referer", "/unit_test/index")
                .build(),
        )
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.header("Location"), Some("/unit_test/index"));
}

#[test]
fn test_double_render_is_an_error() {
    let views = common::views();
    let err = common::dispatcher(&views)
        .dispatch(Request::get("/unit_test/double").build())
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Controller(ControllerError::DoubleRender)
    ));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_unknown_render_options_are_listed() {
    let views = common::views();
    let err = common::dispatcher(&views)
        .dispatch(Request::get("/unit_test/typo").build())
        .unwrap_err();
    assert_eq!(err.to_string(), "Unknown key(s): txt, stauts");
}

#[test]
fn test_default_render_uses_layout_and_assigns() {
    let views = common::views();
    let response = common::dispatcher(&views)
        .dispatch(Request::get("/unit_test/show/12").build())
        .unwrap();
    assert_eq!(response.body_str(), "<main>showing 12</main>");
    assert_eq!(response.header("Content-Type"), Some("text/html; charset=utf-8"));
}

#[test]
fn test_js_format_skips_layout() {
    let views = common::views();
    let dispatcher = common::dispatcher(&views);

    let response = dispatcher
        .dispatch(
            Request::get("/unit_test/show/12")
                .header("Accept", "text/javascript")
                .build(),
        )
        .unwrap();
    assert_eq!(response.body_str(), "show(12);");
    assert_eq!(
        response.header("Content-Type"),
        Some("text/javascript; charset=utf-8")
    );

    // No index.js exists: the js template is required.
    let err = dispatcher
        .dispatch(
            Request::get("/unit_test/index")
                .header("Accept", "application/javascript")
                .build(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Controller(ControllerError::View(ViewError::MissingTemplate { .. }))
    ));
}

#[test]
fn test_missing_template() {
    let views = common::views();
    let err = common::dispatcher(&views)
        .dispatch(Request::get("/unit_test/missing").build())
        .unwrap_err();
    match err {
        DispatchError::Controller(ControllerError::View(ViewError::MissingTemplate {
            name,
            searched,
        })) => {
            assert_eq!(name, "missing");
            assert_eq!(searched.len(), 3);
            assert!(searched[0].ends_with("layouts/missing.html"));
            assert!(searched[1].ends_with("shared/missing.html"));
            assert!(searched[2].ends_with("UnitTest/missing.html"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_missing_action() {
    let views = common::views();
    let err = common::dispatcher(&views)
        .dispatch(Request::get("/unit_test/nonexistent").build())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "action `nonexistent` not found in UnitTestController"
    );

    // Helper methods are not reachable as actions.
    let err = common::dispatcher(&views)
        .dispatch(Request::get("/unit_test/authenticate").build())
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Controller(ControllerError::MissingAction { .. })
    ));
}

#[test]
fn test_controller_not_found() {
    let views = common::views();
    let err = common::dispatcher(&views)
        .dispatch(Request::get("/blog_posts/index").build())
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Resolve(ResolveError::NotFound { .. })
    ));
    assert!(err.to_string().contains("app/controllers/blog_posts.rs"));
}

#[test]
fn test_no_route() {
    let views = common::views();
    let mut routes = RouteSet::new();
    routes.push(
        Route::new("articles/:id")
            .unwrap()
            .default_value("controller", "unit_test")
            .default_value("action", "show")
            .requirement("id", "[0-9]+")
            .unwrap(),
    );
    let dispatcher = common::dispatcher(&views);
    dispatcher.reload_routes(routes);

    let response = dispatcher
        .dispatch(Request::get("/articles/5").build())
        .unwrap();
    assert_eq!(response.body_str(), "<main>showing 5</main>");

    let err = dispatcher
        .dispatch(Request::get("/articles/five").build())
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Routing(RoutingError::NoRoute { .. })
    ));
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_session_and_flash_across_requests() {
    let views = common::views();
    let dispatcher = common::dispatcher(&views);

    let first = dispatcher
        .dispatch(Request::get("/unit_test/remember?name=ann").build())
        .unwrap();
    assert_eq!(first.header("Location"), Some("/unit_test/recall"));
    let session = first.session().cloned().unwrap();

    let second = dispatcher
        .dispatch(Request::get("/unit_test/recall").session(session).build())
        .unwrap();
    assert_eq!(second.body_str(), "ann / Remembered ann");

    // The flash is gone on the request after that.
    let session = second.session().cloned().unwrap();
    let third = dispatcher
        .dispatch(Request::get("/unit_test/recall").session(session).build())
        .unwrap();
    assert_eq!(third.body_str(), "ann / none");
}

#[test]
fn test_body_params_do_not_override_routing() {
    let views = common::views();
    let response = common::dispatcher(&views)
        .dispatch(
            Request::post("/unit_test/show/3")
                .form("id", "999")
                .form("controller", "other")
                .build(),
        )
        .unwrap();
    assert_eq!(response.body_str(), "<main>showing 3</main>");
}

#[test]
fn test_js_suffix_negotiates_format() {
    let views = common::views();
    let dispatcher = common::dispatcher(&views);

    let response = dispatcher
        .dispatch(Request::get("/unit_test/show/12.js").build())
        .unwrap();
    assert_eq!(response.body_str(), "show(12);");
    assert_eq!(
        response.header("Content-Type"),
        Some("text/javascript; charset=utf-8")
    );

    let response = dispatcher
        .dispatch(Request::get("/unit_test/show/12.html").build())
        .unwrap();
    assert_eq!(response.body_str(), "<main>showing 12</main>");
}

/// Serves every action through `method_missing`.
#[derive(Default)]
struct PagesController;

impl Controller for PagesController {
    const NAME: &'static str = "PagesController";

    fn define(def: &mut Definition<Self>) -> Result<(), ControllerError> {
        def.action("index", |_, ctx| ctx.render_text("pages"))
            .method_missing(|_, ctx, name| {
                ctx.assign("page", name);
                Ok(())
            });
        Ok(())
    }
}

/// Closes the whole controller while `closed` is set.
#[derive(Default)]
struct MaintenanceController;

impl Controller for MaintenanceController {
    const NAME: &'static str = "MaintenanceController";

    fn define(def: &mut Definition<Self>) -> Result<(), ControllerError> {
        def.action("index", |_, ctx| ctx.render_text("open"))
            .method("stamp", |_, ctx| {
                ctx.response_mut().add_header("X-Stamped", "1");
                Ok(())
            });
        def.before_filter("stamp", FilterOptions::all())?;
        Ok(())
    }

    fn initialize_application(&mut self, ctx: &mut Context) -> ActionResult {
        if ctx.param("closed").is_some() {
            ctx.redirect_to("/maintenance.html")?;
        }
        Ok(())
    }
}

fn dispatcher_with_extras(views: &tempfile::TempDir) -> Dispatcher {
    let mut registry = common::registry();
    registry
        .register::<PagesController>()
        .register::<MaintenanceController>();
    Dispatcher::new(
        RouteSet::with_default_route(),
        registry,
        View::new(views.path(), "application"),
    )
}

#[test]
fn test_method_missing_end_to_end() {
    let views = common::views();
    common::write(views.path(), "Pages/about.html", "about page: {{ page }}");
    let dispatcher = dispatcher_with_extras(&views);

    let response = dispatcher.dispatch(Request::get("/pages/index").build()).unwrap();
    assert_eq!(response.body_str(), "pages");

    let response = dispatcher.dispatch(Request::get("/pages/about").build()).unwrap();
    assert_eq!(response.body_str(), "<main>about page: about</main>");

    // The default template is named after the requested action.
    let err = dispatcher
        .dispatch(Request::get("/pages/contact_us").build())
        .unwrap_err();
    match err {
        DispatchError::Controller(ControllerError::View(ViewError::MissingTemplate {
            name, ..
        })) => assert_eq!(name, "contactUs"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_initialize_application_can_short_circuit() {
    let views = common::views();
    let dispatcher = dispatcher_with_extras(&views);

    let response = dispatcher
        .dispatch(Request::get("/maintenance/index").build())
        .unwrap();
    assert_eq!(response.body_str(), "open");
    assert_eq!(response.header("X-Stamped"), Some("1"));

    let response = dispatcher
        .dispatch(Request::get("/maintenance/index?closed=1").build())
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.header("Location"), Some("/maintenance.html"));
    assert_eq!(response.header("X-Stamped"), None);
    assert!(!response.body_str().contains("open"));
}
