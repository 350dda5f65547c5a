//! Render and redirect vocabulary.

use axum::http::StatusCode;
use indexmap::IndexMap;
use serde_json::Value;

use crate::controller::options;
use crate::controller::ControllerError;

const RENDER_KEYS: [&str; 4] = ["text", "nothing", "action", "status"];

/// Options accepted by `Context::render`.
///
/// When several body options are set, `text` wins over `action`, which wins
/// over `nothing`. `status` applies alongside any of them.
///
/// Every body carries the negotiated format's content type, `text` included:
/// text rendered for a js request is sent as `text/javascript` so it can be
/// evaluated by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub text: Option<String>,
    pub nothing: bool,
    pub action: Option<String>,
    pub status: Option<StatusCode>,
}

impl RenderOptions {
    /// Render the action's default template.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Self::default()
        }
    }

    pub fn nothing() -> Self {
        Self {
            nothing: true,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Read a JSON option bag such as `{"status": 403, "text": "go away"}`.
    pub fn parse(value: &Value) -> Result<Self, ControllerError> {
        let map = options::valid_keys(value, &RENDER_KEYS)?;
        let mut options = Self::default();

        if let Some(text) = map.get("text") {
            options.text = Some(string_option("text", text)?);
        }
        if let Some(action) = map.get("action") {
            options.action = Some(string_option("action", action)?);
        }
        if let Some(nothing) = map.get("nothing") {
            options.nothing = nothing.as_bool().ok_or_else(|| ControllerError::InvalidOption {
                key: "nothing".to_string(),
                reason: "expected a boolean".to_string(),
            })?;
        }
        if let Some(status) = map.get("status") {
            options.status = Some(parse_status(status)?);
        }
        Ok(options)
    }
}

fn string_option(key: &str, value: &Value) -> Result<String, ControllerError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ControllerError::InvalidOption {
            key: key.to_string(),
            reason: "expected a string".to_string(),
        })
}

fn parse_status(value: &Value) -> Result<StatusCode, ControllerError> {
    let code = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    code.and_then(|code| u16::try_from(code).ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| ControllerError::InvalidOption {
            key: "status".to_string(),
            reason: format!("{} is not an HTTP status code", value),
        })
}

/// Where `Context::redirect_to` sends the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// A literal URL or path.
    Url(String),
    /// The `Referer` of the current request.
    Back,
    /// A URL generated from routing parameters.
    Route(IndexMap<String, String>),
}

impl RedirectTarget {
    pub fn route<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RedirectTarget::Route(
            params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// `"back"` means the referrer; anything else is a URL.
impl From<&str> for RedirectTarget {
    fn from(target: &str) -> Self {
        if target == "back" {
            RedirectTarget::Back
        } else {
            RedirectTarget::Url(target.to_string())
        }
    }
}

/// Whether the current request has produced its response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Performed {
    #[default]
    NotYet,
    Rendered,
    Redirected(String),
}

impl Performed {
    pub fn is_performed(&self) -> bool {
        !matches!(self, Performed::NotYet)
    }
}
