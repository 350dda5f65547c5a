//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, timeout, body limit)
//!     → request.rs (query, form or multipart body, cookies, session)
//!     → [dispatcher on the blocking pool]
//!     → response.rs (status, header lines, body, session snapshot)
//!     → session_store.rs (persist session, issue cookie)
//!     → Send to client
//! ```

pub mod params;
pub mod request;
pub mod response;
pub mod server;
pub mod session_store;

pub use params::Params;
pub use request::{Request, RequestBuilder, SessionData, UploadedFile};
pub use response::Response;
pub use server::HttpServer;
pub use session_store::{Saved, SessionStore};

pub use axum::http::{Method, StatusCode};
