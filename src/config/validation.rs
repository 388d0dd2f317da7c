//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse, status codes)
//! - Check that every route pattern registers cleanly
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::{HeaderValue, StatusCode};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServerConfig;
use crate::routing::{RouteError, RouterBuilder};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid listener bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroRequestTimeout,

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),

    #[error("duplicate route name '{0}'")]
    DuplicateRouteName(String),

    #[error("route '{route}': invalid method '{method}'")]
    InvalidMethod { route: String, method: String },

    #[error("route '{route}': invalid status code {status}")]
    InvalidStatus { route: String, status: u16 },

    #[error("route '{route}': invalid content type '{content_type}'")]
    InvalidContentType { route: String, content_type: String },

    #[error("route '{route}': {source}")]
    Route { route: String, source: RouteError },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let mut names = HashSet::new();
    let mut builder = RouterBuilder::with_config(config.router);

    for route in &config.routes {
        if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }
        if StatusCode::from_u16(route.status).is_err() {
            errors.push(ValidationError::InvalidStatus {
                route: route.name.clone(),
                status: route.status,
            });
        }
        if HeaderValue::from_str(&route.content_type).is_err() {
            errors.push(ValidationError::InvalidContentType {
                route: route.name.clone(),
                content_type: route.content_type.clone(),
            });
        }

        let Some(method) = route.parse_method() else {
            errors.push(ValidationError::InvalidMethod {
                route: route.name.clone(),
                method: route.method.clone(),
            });
            continue;
        };

        // a rejected pattern leaves the table as it was, so later routes
        // are still checked against the accepted ones
        if let Err(source) = builder.handle(method, &route.path, ()) {
            errors.push(ValidationError::Route {
                route: route.name.clone(),
                source,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    fn route(name: &str, method: &str, path: &str) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            method: method.into(),
            path: path.into(),
            status: 200,
            body: String::new(),
            content_type: "text/plain".into(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.routes = vec![
            route("user", "GET", "/user/:id"),
            route("user", "GET", "/user/:name"),
            route("broken", "GET", "no-slash"),
            route("weird", "GE T", "/weird"),
        ];
        config.routes[0].status = 42;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 7, "{errors:?}");
        assert!(errors.contains(&ValidationError::InvalidBindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::ZeroRequestTimeout));
        assert!(errors.contains(&ValidationError::DuplicateRouteName("user".into())));
        assert!(errors.contains(&ValidationError::InvalidStatus {
            route: "user".into(),
            status: 42
        }));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::Route {
                source: RouteError::WildcardConflict { .. },
                ..
            }
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::Route {
                source: RouteError::MissingLeadingSlash { .. },
                ..
            }
        )));
    }

    #[test]
    fn test_method_trees_are_independent() {
        let mut config = ServerConfig::default();
        config.routes = vec![
            route("get-user", "get", "/user/:id"),
            route("put-user", "PUT", "/user/:name"),
        ];
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ServerConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidMetricsAddress("nope".into())])
        );
    }
}
