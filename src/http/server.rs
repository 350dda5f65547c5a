//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single fallback handler
//! - Wire up middleware (request id, tracing, timeout, body limit)
//! - Convert Axum requests into dispatcher requests and back
//! - Load and persist sessions around each request
//! - Shut down gracefully
//!
//! # Design Decisions
//! - The dispatcher is synchronous; it runs on the blocking pool
//! - A missing route answers 404, every other dispatch failure 500
//! - Session ids are only issued once a session holds data; a session that
//!   empties out is dropped from the store and its cookie expired

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequest, Multipart, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response as AxumResponse},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, SessionConfig};
use crate::controller::proxies::{set_cookie_line, CookieOptions};
use crate::dispatch::Dispatcher;
use crate::http::request::{parse_cookies, Request, RequestBuilder, SessionData, UploadedFile};
use crate::http::response::Response;
use crate::http::session_store::{Saved, SessionStore};
use crate::lifecycle::Shutdown;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub sessions: SessionStore,
    pub session_config: SessionConfig,
    pub max_body_bytes: usize,
}

/// HTTP transport for a [`Dispatcher`].
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    sessions: SessionStore,
}

impl HttpServer {
    pub fn new(config: AppConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let sessions = SessionStore::new();
        let state = AppState {
            dispatcher,
            sessions: sessions.clone(),
            session_config: config.session.clone(),
            max_body_bytes: config.server.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            sessions,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )));

        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(middleware)
    }

    /// Serve on `listener` until `shutdown` triggers or Ctrl+C arrives.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let signal = shutdown.wait();
        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = signal => {}
                    result = tokio::signal::ctrl_c() => {
                        if let Err(e) = result {
                            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                            std::future::pending::<()>().await;
                        }
                    }
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

/// Fallback handler: every request goes to the dispatcher.
async fn dispatch_handler(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> AxumResponse {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let session_id = parse_cookies(request.headers())
        .get(&state.session_config.cookie_name)
        .cloned();

    let request = match convert_request(request, &state, session_id.as_deref()).await {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };

    let dispatcher = Arc::clone(&state.dispatcher);
    match tokio::task::spawn_blocking(move || dispatcher.dispatch(request)).await {
        Ok(Ok(response)) => convert_response(response, &state, session_id.as_deref()),
        Ok(Err(e)) => {
            let status = e.status();
            if status.is_server_error() {
                tracing::error!(request_id = %request_id, error = %e, "Dispatch failed");
            } else {
                tracing::warn!(request_id = %request_id, error = %e, "No route matched");
            }
            (status, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Dispatch task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

async fn convert_request(
    request: axum::extract::Request,
    state: &AppState,
    session_id: Option<&str>,
) -> Result<Request, AxumResponse> {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let uri = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let mut builder = Request::builder(request.method().clone(), uri)
        .headers(request.headers().clone())
        .session(state.sessions.load(session_id));
    if let Some(addr) = remote_addr {
        builder = builder.remote_addr(addr);
    }

    if content_type.starts_with("multipart/form-data") {
        builder = read_multipart(builder, request).await?;
    } else {
        let bytes = axum::body::to_bytes(request.into_body(), state.max_body_bytes)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Failed to read request body");
                (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
            })?;
        if content_type.starts_with("application/x-www-form-urlencoded") {
            builder = builder.urlencoded(&String::from_utf8_lossy(&bytes));
        }
    }

    Ok(builder.build())
}

async fn read_multipart(
    mut builder: RequestBuilder,
    request: axum::extract::Request,
) -> Result<RequestBuilder, AxumResponse> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(IntoResponse::into_response)?;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(e.into_response()),
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(IntoResponse::into_response)?;

        builder = match file_name {
            Some(file_name) => builder.file(UploadedFile {
                field: name,
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            }),
            None => builder.form(&name, String::from_utf8_lossy(&bytes).into_owned()),
        };
    }
    Ok(builder)
}

fn convert_response(response: Response, state: &AppState, session_id: Option<&str>) -> AxumResponse {
    let session_cookie = response
        .session()
        .and_then(|session| session_cookie(state, session_id, session.clone()));

    let (status, headers, body) = response.into_parts();
    let mut out = AxumResponse::new(Body::from(body));
    *out.status_mut() = status;
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                out.headers_mut().append(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping invalid response header"),
        }
    }
    if let Some(cookie) = session_cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
        out.headers_mut().append(header::SET_COOKIE, cookie);
    }
    out
}

/// Persist the outgoing session; the `Set-Cookie` line when the id changed.
fn session_cookie(state: &AppState, session_id: Option<&str>, session: SessionData) -> Option<String> {
    let (value, max_age) = match state.sessions.save(session_id, session) {
        Saved::Created(id) => (id, None),
        Saved::Removed => (String::new(), Some(0)),
        Saved::Updated(_) | Saved::Skipped => return None,
    };
    let options = CookieOptions {
        path: state.session_config.cookie_path.clone(),
        max_age,
        ..CookieOptions::default()
    };
    Some(set_cookie_line(
        &state.session_config.cookie_name,
        &value,
        &options,
    ))
}
