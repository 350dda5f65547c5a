//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for an application.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for a Mad application.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP transport settings.
    pub server: ServerConfig,

    /// Route definitions, tried in order. Empty means `:controller/:action/:id`.
    pub routes: Vec<RouteConfig>,

    /// Template lookup settings.
    pub views: ViewConfig,

    /// Session cookie settings.
    pub session: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,

    /// Total time allowed per request, in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// One route rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct RouteConfig {
    /// Optional name, used for named URL generation.
    #[serde(default)]
    pub name: Option<String>,

    /// Pattern, e.g. `:controller/:action/:id` or `login`.
    pub path: String,

    /// Fixed controller when the pattern has no `:controller`.
    #[serde(default)]
    pub controller: Option<String>,

    /// Fixed (or default) action.
    #[serde(default)]
    pub action: Option<String>,

    /// Defaults for placeholders missing from the path.
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,

    /// Regular expressions a placeholder must match in full.
    #[serde(default)]
    pub requirements: BTreeMap<String, String>,

    /// Accepted request methods; empty accepts any.
    #[serde(default)]
    pub methods: Vec<String>,
}

/// View configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Root of the template tree.
    pub root: PathBuf,

    /// Layout applied when a controller does not choose one and the file exists.
    pub default_layout: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("app/views"),
            default_layout: "application".to_string(),
        }
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session id.
    pub cookie_name: String,

    /// Path attribute of the session cookie.
    pub cookie_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "_mad_session".to_string(),
            cookie_path: "/".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Column at which the per-request log line wraps.
    pub log_width: usize,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_width: 80,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
