//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router
//! server. All types derive Serde traits for deserialization from config files.

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// Root configuration for the router server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Dispatch policy applied when a request has no exact match.
    pub router: RouterConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route table.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Dispatch policy flags. All enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Redirect when only a trailing slash differs from a registered route,
    /// e.g. `/foo/` to `/foo`.
    pub redirect_trailing_slash: bool,

    /// Redirect to the cleaned, case-corrected path when one is registered,
    /// e.g. `/FOO` and `/..//Foo` to `/foo`.
    pub redirect_fixed_path: bool,

    /// Reply 405 with an `Allow` header when the path exists for other
    /// methods only.
    pub handle_method_not_allowed: bool,

    /// Reply to OPTIONS requests automatically. Routes registered for
    /// OPTIONS take precedence.
    pub handle_options: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            redirect_trailing_slash: true,
            redirect_fixed_path: true,
            handle_method_not_allowed: true,
            handle_options: true,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per line for log aggregation.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (e.g. "info", "trie_router=debug").
    /// `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A single route and the canned response it serves.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// HTTP method, case-insensitive (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Path pattern, e.g. "/user/:name" or "/static/*filepath".
    pub path: String,

    /// Response status code (default: 200).
    #[serde(default = "default_status")]
    pub status: u16,

    /// Response body. `{name}` is replaced by the value of parameter `name`.
    #[serde(default)]
    pub body: String,

    /// Response content type.
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl RouteConfig {
    /// The configured method, upper-cased. `None` if it is not a valid token.
    pub fn parse_method(&self) -> Option<Method> {
        Method::from_bytes(self.method.to_ascii_uppercase().as_bytes()).ok()
    }
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_status() -> u16 {
    200
}

fn default_content_type() -> String {
    "text/plain; charset=utf-8".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.router, RouterConfig::default());
        assert!(config.router.redirect_fixed_path);
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_route_table() {
        let config: ServerConfig = toml::from_str(
            r#"
            [router]
            redirect_fixed_path = false

            [observability]
            log_format = "json"

            [[routes]]
            name = "user"
            path = "/user/:name"
            body = "hello {name}"

            [[routes]]
            name = "create"
            method = "post"
            path = "/user"
            status = 201
            content_type = "application/json"
            "#,
        )
        .unwrap();

        assert!(!config.router.redirect_fixed_path);
        assert!(config.router.redirect_trailing_slash);
        assert_eq!(config.observability.log_format, LogFormat::Json);

        let user = &config.routes[0];
        assert_eq!(user.parse_method(), Some(Method::GET));
        assert_eq!(user.status, 200);
        assert_eq!(user.content_type, "text/plain; charset=utf-8");

        let create = &config.routes[1];
        assert_eq!(create.parse_method(), Some(Method::POST));
        assert_eq!(create.status, 201);
        assert_eq!(create.body, "");
    }

    #[test]
    fn test_route_requires_path() {
        let result: Result<ServerConfig, _> = toml::from_str(
            r#"
            [[routes]]
            name = "broken"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_method_token() {
        let route = RouteConfig {
            name: "bad".into(),
            method: "GE T".into(),
            path: "/".into(),
            status: 200,
            body: String::new(),
            content_type: default_content_type(),
        };
        assert_eq!(route.parse_method(), None);
    }
}
