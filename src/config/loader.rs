//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{RouteConfig, ServerConfig};
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::{Router, RouterBuilder};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the route table described by `config`, creating one handler per
/// route with `make`.
///
/// The config is normally validated already; any route that still fails to
/// register is reported as a validation error.
pub fn build_router<H, F>(config: &ServerConfig, mut make: F) -> Result<Router<H>, ConfigError>
where
    F: FnMut(&RouteConfig) -> H,
{
    let mut builder = RouterBuilder::with_config(config.router);
    let mut errors = Vec::new();

    for route in &config.routes {
        let Some(method) = route.parse_method() else {
            errors.push(ValidationError::InvalidMethod {
                route: route.name.clone(),
                method: route.method.clone(),
            });
            continue;
        };

        if let Err(source) = builder.handle(method, &route.path, make(route)) {
            errors.push(ValidationError::Route {
                route: route.name.clone(),
                source,
            });
        }
    }

    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors));
    }

    let router = builder.build();
    tracing::info!(
        routes = router.len(),
        methods = router.methods().count(),
        "Route table built"
    );
    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use std::io::Write;

    const CONFIG: &str = r#"
        [listener]
        bind_address = "127.0.0.1:0"

        [[routes]]
        name = "index"
        path = "/"
        body = "index"

        [[routes]]
        name = "user"
        path = "/user/:name"
        body = "hello {name}"

        [[routes]]
        name = "delete-user"
        method = "DELETE"
        path = "/user/:name"
    "#;

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:0");
        assert_eq!(config.routes.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_errors() {
        let err = parse_config("[listener\nbind_address = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = parse_config(
            r#"
            [[routes]]
            name = "a"
            path = "/a/:x"

            [[routes]]
            name = "b"
            path = "/a/:y"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().starts_with("Validation failed: route 'b'"));
    }

    #[test]
    fn test_build_router() {
        let config = parse_config(CONFIG).unwrap();
        let router = build_router(&config, |route| route.name.clone()).unwrap();

        assert_eq!(router.len(), 3);
        let found = router.lookup(&Method::GET, "/user/gopher");
        assert_eq!(found.handler.map(String::as_str), Some("user"));
        assert_eq!(found.params.get("name"), Some("gopher"));

        let found = router.lookup(&Method::DELETE, "/user/gopher");
        assert_eq!(found.handler.map(String::as_str), Some("delete-user"));
    }

    #[test]
    fn test_build_router_reports_conflicts() {
        let mut config = parse_config(CONFIG).unwrap();
        config.routes[2].method = "GET".into();

        let err = build_router(&config, |_| ()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
    }
}
