//! Session, flash and cookie access for controller code.
//!
//! # Responsibilities
//! - Give actions and filters uniform read/write access to request state
//! - Carry session and flash changes to the response when the request ends
//! - Emit `Set-Cookie` lines as cookies are written
//!
//! # Design Decisions
//! - The flash lives in the session under [`FLASH_KEY`] between requests
//! - Values set with [`FlashProxy::set`] survive exactly one more request
//! - Cookie values are percent-encoded; attributes follow RFC 6265 spelling

use std::collections::HashSet;

use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::{Map, Value};

use crate::http::request::SessionData;
use crate::http::response::Response;

/// Session key holding flash values carried to the next request.
pub const FLASH_KEY: &str = "flash";

const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b',')
    .add(b';')
    .add(b'\\')
    .add(b'%');

/// Read/write view over the session map.
#[derive(Debug, Clone, Default)]
pub struct SessionProxy {
    data: SessionData,
}

impl SessionProxy {
    pub fn new(data: SessionData) -> Self {
        Self { data }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_inner(self) -> SessionData {
        self.data
    }
}

/// Messages passed from one request to the next.
#[derive(Debug, Clone, Default)]
pub struct FlashProxy {
    values: IndexMap<String, Value>,
    persist: HashSet<String>,
}

impl FlashProxy {
    /// Take the previous request's flash out of `session`.
    pub fn load(session: &mut SessionProxy) -> Self {
        let values = match session.remove(FLASH_KEY) {
            Some(Value::Object(map)) => map.into_iter().collect(),
            _ => IndexMap::new(),
        };
        Self {
            values,
            persist: HashSet::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Readable now and during the next request.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        self.persist.insert(key.clone());
        self.values.insert(key, value.into());
    }

    /// Readable during this request only.
    pub fn now(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        self.persist.remove(&key);
        self.values.insert(key, value.into());
    }

    /// Carry `key` over to the next request.
    pub fn keep(&mut self, key: &str) {
        if self.values.contains_key(key) {
            self.persist.insert(key.to_string());
        }
    }

    pub fn keep_all(&mut self) {
        self.persist.extend(self.values.keys().cloned());
    }

    /// Drop `key` at the end of this request.
    pub fn discard(&mut self, key: &str) {
        self.persist.remove(key);
    }

    pub fn discard_all(&mut self) {
        self.persist.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Write the values that survive into `session`.
    pub fn sweep(self, session: &mut SessionProxy) {
        let kept: Map<String, Value> = self
            .values
            .into_iter()
            .filter(|(key, _)| self.persist.contains(key))
            .collect();
        if !kept.is_empty() {
            session.set(FLASH_KEY, Value::Object(kept));
        }
    }
}

/// Attributes of an outgoing cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: String,
    pub domain: Option<String>,
    /// Lifetime in seconds; session cookie when absent.
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            domain: None,
            max_age: None,
            secure: false,
            http_only: true,
        }
    }
}

/// Request cookies plus the response they are written to.
pub struct CookieProxy<'a> {
    values: &'a mut IndexMap<String, String>,
    response: &'a mut Response,
}

impl<'a> CookieProxy<'a> {
    pub(crate) fn new(values: &'a mut IndexMap<String, String>, response: &'a mut Response) -> Self {
        Self { values, response }
    }

    /// The value sent by the client, or written earlier in this request.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.set_with(name, value, &CookieOptions::default());
    }

    pub fn set_with(&mut self, name: &str, value: &str, options: &CookieOptions) {
        self.response
            .add_header("Set-Cookie", &set_cookie_line(name, value, options));
        self.values.insert(name.to_string(), value.to_string());
    }

    /// Expire `name` on the client.
    pub fn delete(&mut self, name: &str) {
        let options = CookieOptions {
            max_age: Some(0),
            ..CookieOptions::default()
        };
        self.response
            .add_header("Set-Cookie", &set_cookie_line(name, "", &options));
        self.values.shift_remove(name);
    }
}

/// `name=value; Path=/; HttpOnly`.
pub fn set_cookie_line(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut line = format!(
        "{}={}; Path={}",
        name,
        utf8_percent_encode(value, COOKIE_VALUE),
        options.path
    );
    if let Some(domain) = &options.domain {
        line.push_str("; Domain=");
        line.push_str(domain);
    }
    if let Some(max_age) = options.max_age {
        line.push_str(&format!("; Max-Age={}", max_age));
    }
    if options.secure {
        line.push_str("; Secure");
    }
    if options.http_only {
        line.push_str("; HttpOnly");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_proxy() {
        let mut session = SessionProxy::default();
        session.set("user_id", 7);
        assert_eq!(session.get("user_id"), Some(&json!(7)));
        assert_eq!(session.remove("user_id"), Some(json!(7)));
        assert!(session.is_empty());
    }

    #[test]
    fn test_flash_survives_one_request() {
        let mut session = SessionProxy::default();
        let mut flash = FlashProxy::load(&mut session);
        flash.set("notice", "saved");
        flash.now("alert", "only now");
        assert_eq!(flash.get_str("alert"), Some("only now"));
        flash.sweep(&mut session);
        assert_eq!(session.get(FLASH_KEY), Some(&json!({"notice": "saved"})));

        // Next request: readable, then gone unless kept.
        let flash = FlashProxy::load(&mut session);
        assert!(!session.contains_key(FLASH_KEY));
        assert_eq!(flash.get_str("notice"), Some("saved"));
        flash.sweep(&mut session);
        assert!(session.get(FLASH_KEY).is_none());
    }

    #[test]
    fn test_flash_keep_and_discard() {
        let mut session = SessionProxy::default();
        session.set(FLASH_KEY, json!({"notice": "a", "alert": "b"}));
        let mut flash = FlashProxy::load(&mut session);
        flash.keep("notice");
        flash.keep("missing");
        flash.sweep(&mut session);
        assert_eq!(session.get(FLASH_KEY), Some(&json!({"notice": "a"})));

        let mut flash = FlashProxy::load(&mut session);
        flash.keep_all();
        flash.discard("notice");
        flash.sweep(&mut session);
        assert!(session.get(FLASH_KEY).is_none());
    }

    #[test]
    fn test_cookie_proxy_writes_headers() {
        let mut values = IndexMap::new();
        values.insert("theme".to_string(), "dark".to_string());
        let mut response = Response::new();

        let mut cookies = CookieProxy::new(&mut values, &mut response);
        assert_eq!(cookies.get("theme"), Some("dark"));
        cookies.set("last_seen", "a b;c");
        cookies.delete("theme");
        assert_eq!(cookies.get("theme"), None);
        assert_eq!(cookies.get("last_seen"), Some("a b;c"));

        assert_eq!(
            response.header_lines(),
            [
                "Set-Cookie: last_seen=a%20b%3Bc; Path=/; HttpOnly",
                "Set-Cookie: theme=; Path=/; Max-Age=0; HttpOnly",
            ]
        );
    }

    #[test]
    fn test_cookie_options() {
        let options = CookieOptions {
            path: "/admin".into(),
            domain: Some("example.com".into()),
            max_age: Some(3600),
            secure: true,
            http_only: false,
        };
        assert_eq!(
            set_cookie_line("id", "1", &options),
            "id=1; Path=/admin; Domain=example.com; Max-Age=3600; Secure"
        );
    }
}
