//! Request value object.
//!
//! # Responsibilities
//! - Carry method, path, headers, parsed query/body params, uploads, cookies
//!   and the session map for one request
//! - Receive the path params bound by the router
//! - Offer a builder so requests can be assembled without a transport
//!
//! # Design Decisions
//! - Read-mostly: only the dispatcher (path params) mutates it
//! - Session writes go through the controller's proxies and out via the Response
//! - Invalid header names/values given to the builder are skipped with a warning

use std::net::SocketAddr;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde_json::Value;

use crate::http::params::Params;

/// Session contents as seen by one request.
pub type SessionData = IndexMap<String, Value>;

/// A file received in a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field the file was sent under.
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// An incoming request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: String,
    path: String,
    query_string: String,
    headers: HeaderMap,
    query: Params,
    body: Params,
    files: Vec<UploadedFile>,
    cookies: IndexMap<String, String>,
    session: SessionData,
    path_params: IndexMap<String, String>,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    /// Start building a request.
    pub fn builder(method: Method, uri: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, uri.into())
    }

    pub fn get(uri: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::GET, uri)
    }

    pub fn post(uri: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::POST, uri)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path and query as received.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path routes are matched against: a trailing `.js` or `.html`
    /// format suffix is dropped, so `/posts/show/7.js` routes like
    /// `/posts/show/7`.
    pub fn route_path(&self) -> &str {
        [".js", ".html"]
            .iter()
            .find_map(|suffix| self.path.strip_suffix(suffix))
            .filter(|path| !path.is_empty() && !path.ends_with('/'))
            .unwrap_or(&self.path)
    }

    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `Referer` header (`HTTP_REFERER`).
    pub fn referer(&self) -> Option<&str> {
        self.header(header::REFERER.as_str()).filter(|r| !r.is_empty())
    }

    pub fn query_params(&self) -> &Params {
        &self.query
    }

    pub fn body_params(&self) -> &Params {
        &self.body
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// The first upload sent under `field`.
    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == field)
    }

    pub fn cookies(&self) -> &IndexMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn session(&self) -> &SessionData {
        &self.session
    }

    pub fn path_params(&self) -> &IndexMap<String, String> {
        &self.path_params
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub(crate) fn set_path_params(&mut self, params: IndexMap<String, String>) {
        self.path_params = params;
    }
}

/// Builder for [`Request`].
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    uri: String,
    header_map: HeaderMap,
    headers: Vec<(String, String)>,
    body: Params,
    files: Vec<UploadedFile>,
    cookies: IndexMap<String, String>,
    session: SessionData,
    remote_addr: Option<SocketAddr>,
}

impl RequestBuilder {
    fn new(method: Method, uri: String) -> Self {
        Self {
            method,
            uri,
            header_map: HeaderMap::new(),
            headers: Vec::new(),
            body: Params::new(),
            files: Vec::new(),
            cookies: IndexMap::new(),
            session: SessionData::new(),
            remote_addr: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add already parsed headers, e.g. from a transport.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.header_map.extend(headers);
        self
    }

    /// Add one form field to the body.
    pub fn form(mut self, key: &str, value: impl Into<String>) -> Self {
        self.body.insert_form(key, value.into());
        self
    }

    /// Replace the body params with an urlencoded body.
    pub fn urlencoded(mut self, body: &str) -> Self {
        self.body = Params::from_urlencoded(body);
        self
    }

    /// Replace the body params.
    pub fn body_params(mut self, params: Params) -> Self {
        self.body = params;
        self
    }

    pub fn file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn session(mut self, session: SessionData) -> Self {
        self.session = session;
        self
    }

    pub fn session_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.session.insert(key.into(), value.into());
        self
    }

    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn build(self) -> Request {
        let (path, query_string) = match self.uri.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (self.uri.clone(), String::new()),
        };

        let mut headers = self.header_map;
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::warn!(header = %name, "Skipping invalid request header"),
            }
        }

        // Explicit cookies win over the Cookie header.
        let mut cookies = parse_cookies(&headers);
        cookies.extend(self.cookies);

        Request {
            method: self.method,
            query: Params::from_urlencoded(&query_string),
            uri: self.uri,
            path: if path.is_empty() { "/".to_string() } else { path },
            query_string,
            headers,
            body: self.body,
            files: self.files,
            cookies,
            session: self.session,
            path_params: IndexMap::new(),
            remote_addr: self.remote_addr,
        }
    }
}

/// Parse every `Cookie` header into name/value pairs.
pub fn parse_cookies(headers: &HeaderMap) -> IndexMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let value = percent_decode_str(value.trim().trim_matches('"'))
                .decode_utf8_lossy()
                .into_owned();
            Some((name.trim().to_string(), value))
        })
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_splits_uri() {
        let request = Request::get("/users/show/3?page=2&sort=name").build();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/users/show/3");
        assert_eq!(request.query_string(), "page=2&sort=name");
        assert_eq!(request.query_params().get_str("page"), Some("2"));
        assert_eq!(request.uri(), "/users/show/3?page=2&sort=name");
    }

    #[test]
    fn test_route_path_drops_format_suffix() {
        assert_eq!(Request::get("/posts/show/7.js").build().route_path(), "/posts/show/7");
        assert_eq!(Request::get("/posts/index.html?x=1").build().route_path(), "/posts/index");
        assert_eq!(Request::get("/posts/show/7").build().route_path(), "/posts/show/7");
        assert_eq!(Request::get("/assets/.js").build().route_path(), "/assets/.js");
    }

    #[test]
    fn test_headers_and_referer() {
        let request = Request::get("/")
            .header("Referer", "http://example.com/back")
            .header("bad header", "x")
            .build();
        assert_eq!(request.referer(), Some("http://example.com/back"));
        assert_eq!(request.headers().len(), 1);

        let request = Request::get("/").header("Referer", "").build();
        assert_eq!(request.referer(), None);
    }

    #[test]
    fn test_cookies_from_header_and_builder() {
        let request = Request::get("/")
            .header("Cookie", "a=1; b=hello%20world")
            .cookie("a", "override")
            .build();
        assert_eq!(request.cookie("a"), Some("override"));
        assert_eq!(request.cookie("b"), Some("hello world"));
    }

    #[test]
    fn test_body_params_and_files() {
        let request = Request::post("/upload")
            .form("title", "Hi")
            .form("post[body]", "text")
            .file(UploadedFile {
                field: "avatar".into(),
                file_name: "me.png".into(),
                content_type: "image/png".into(),
                bytes: vec![1, 2, 3],
            })
            .build();
        assert_eq!(request.body_params().get_str("title"), Some("Hi"));
        assert!(request.body_params().get("post").unwrap().is_object());
        assert_eq!(request.file("avatar").map(UploadedFile::size), Some(3));
        assert!(request.file("other").is_none());
    }
}
