//! Response accumulator.
//!
//! # Responsibilities
//! - Accumulate status, header lines and body while a controller runs
//! - Carry the outgoing session snapshot back to the transport
//! - Render the HTTP status line
//!
//! # Design Decisions
//! - Headers are kept as `"Name: value"` lines; duplicates are permitted
//! - The body is raw bytes; the transport decides how to send it
//! - Status defaults to 200 OK

use std::borrow::Cow;
use std::time::Duration;

use axum::http::StatusCode;

use crate::http::request::SessionData;

/// The response being built for one request.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: Vec<String>,
    body: Vec<u8>,
    session: Option<SessionData>,
    db_runtime: Duration,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: Vec::new(),
            session: None,
            db_runtime: Duration::ZERO,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// `HTTP/1.1 403 Forbidden`.
    pub fn status_line(&self) -> String {
        match self.status.canonical_reason() {
            Some(reason) => format!("HTTP/1.1 {} {}", self.status.as_u16(), reason),
            None => format!("HTTP/1.1 {}", self.status.as_u16()),
        }
    }

    /// Append a header line, keeping any existing line with the same name.
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push(format!("{}: {}", name, value));
    }

    /// Replace every line for `name` with a single one.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|line| !line_has_name(line, name));
        self.add_header(name, value);
    }

    /// Value of the first line for `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|line| line_has_name(line, name))
            .and_then(|line| line.split_once(':'))
            .map(|(_, value)| value.trim_start())
    }

    /// All header lines in insertion order.
    pub fn header_lines(&self) -> &[String] {
        &self.headers
    }

    /// Header lines split into name/value pairs.
    pub fn header_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim(), value.trim_start()))
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as text, replacing invalid UTF-8.
    pub fn body_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// Session state to persist once the request completes.
    pub fn session(&self) -> Option<&SessionData> {
        self.session.as_ref()
    }

    pub(crate) fn set_session(&mut self, session: SessionData) {
        self.session = Some(session);
    }

    /// Time spent in the database layer, reported by application code.
    pub fn db_runtime(&self) -> Duration {
        self.db_runtime
    }

    pub fn add_db_runtime(&mut self, elapsed: Duration) {
        self.db_runtime += elapsed;
    }

    /// Consume into status, header pairs and body for a transport.
    pub fn into_parts(self) -> (StatusCode, Vec<(String, String)>, Vec<u8>) {
        let headers = self
            .headers
            .iter()
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim_start().to_string()))
            .collect();
        (self.status, headers, self.body)
    }
}

fn line_has_name(line: &str, name: &str) -> bool {
    line.split_once(':')
        .map(|(n, _)| n.trim().eq_ignore_ascii_case(name))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        let mut response = Response::new();
        assert_eq!(response.status_line(), "HTTP/1.1 200 OK");
        response.set_status(StatusCode::FORBIDDEN);
        assert_eq!(response.status_line(), "HTTP/1.1 403 Forbidden");
        response.set_status(StatusCode::from_u16(599).unwrap());
        assert_eq!(response.status_line(), "HTTP/1.1 599");
    }

    #[test]
    fn test_duplicate_headers_are_kept() {
        let mut response = Response::new();
        response.add_header("Set-Cookie", "a=1");
        response.add_header("Set-Cookie", "b=2");
        assert_eq!(response.header_lines(), ["Set-Cookie: a=1", "Set-Cookie: b=2"]);
        assert_eq!(response.header("set-cookie"), Some("a=1"));
    }

    #[test]
    fn test_set_header_replaces() {
        let mut response = Response::new();
        response.add_header("Content-Type", "text/plain");
        response.add_header("X-Other", "1");
        response.set_header("content-type", "text/html");
        assert_eq!(response.header("Content-Type"), Some("text/html"));
        assert_eq!(response.header_lines().len(), 2);
    }

    #[test]
    fn test_into_parts() {
        let mut response = Response::new();
        response.add_header("Location", "http://example.com:8080/x");
        response.set_body("moved");
        let (status, headers, body) = response.into_parts();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers,
            vec![("Location".to_string(), "http://example.com:8080/x".to_string())]
        );
        assert_eq!(body, b"moved");
    }
}
