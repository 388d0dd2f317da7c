//! Route registration and dispatch policy.
//!
//! # Responsibilities
//! - Keep one tree per HTTP method
//! - Register routes during startup (`RouterBuilder`)
//! - Resolve a request to a handler, a redirect, an OPTIONS reply,
//!   a method-not-allowed reply or a miss (`Router::dispatch`)
//!
//! # Design Decisions
//! - Immutable after `build()` (thread-safe without locks)
//! - Trees kept in registration order; the Allow list follows it
//! - Redirects use 301 for GET and 307 for everything else

use std::fmt;

use axum::http::{Method, StatusCode};

use crate::config::RouterConfig;
use crate::routing::error::RouteError;
use crate::routing::params::Params;
use crate::routing::path::clean_path;
use crate::routing::tree::{Lookup, Node};

/// Mutable registration phase of a [`Router`].
pub struct RouterBuilder<H> {
    trees: Vec<(Method, Node<H>)>,
    config: RouterConfig,
}

impl<H> Default for RouterBuilder<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouterBuilder<H> {
    /// Create a builder with every dispatch policy enabled.
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            trees: Vec::new(),
            config,
        }
    }

    pub fn config_mut(&mut self) -> &mut RouterConfig {
        &mut self.config
    }

    /// Registers `handler` for `method` and `pattern`.
    pub fn handle(&mut self, method: Method, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        let i = match self.trees.iter().position(|(m, _)| *m == method) {
            Some(i) => i,
            None => {
                self.trees.push((method.clone(), Node::new()));
                self.trees.len() - 1
            }
        };

        if let Err(e) = self.trees[i].1.insert(pattern, handler) {
            if self.trees[i].1.is_empty() {
                self.trees.remove(i);
            }
            return Err(e);
        }

        tracing::debug!(method = %method, pattern, "Route registered");
        Ok(self)
    }

    pub fn get(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::GET, pattern, handler)
    }

    pub fn head(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::HEAD, pattern, handler)
    }

    /// Registers `handler` for both GET and HEAD. If HEAD is rejected the GET
    /// route stays registered.
    pub fn get_and_head(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Clone,
    {
        self.handle(Method::GET, pattern, handler.clone())?;
        self.handle(Method::HEAD, pattern, handler)
    }

    pub fn options(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::OPTIONS, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::PUT, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::PATCH, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.handle(Method::DELETE, pattern, handler)
    }

    /// Freeze the route table.
    pub fn build(self) -> Router<H> {
        Router {
            trees: self.trees,
            config: self.config,
        }
    }
}

/// Immutable route table with dispatch policy.
pub struct Router<H> {
    trees: Vec<(Method, Node<H>)>,
    config: RouterConfig,
}

/// Outcome of [`Router::dispatch`].
#[derive(Debug)]
pub enum Dispatch<'r, 'p, H> {
    /// A handler is registered for the method and path.
    Matched { handler: &'r H, params: Params<'r, 'p> },
    /// The request should be retried at `location`.
    Redirect { location: String, status: StatusCode },
    /// Automatic reply to an OPTIONS request.
    Options { allow: AllowedMethods },
    /// The path exists, but not for this method.
    MethodNotAllowed { allow: AllowedMethods },
    NotFound,
}

impl<H> Dispatch<'_, '_, H> {
    /// Short label used in logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Dispatch::Matched { .. } => "matched",
            Dispatch::Redirect { .. } => "redirect",
            Dispatch::Options { .. } => "options",
            Dispatch::MethodNotAllowed { .. } => "method_not_allowed",
            Dispatch::NotFound => "not_found",
        }
    }
}

/// Methods that would accept a path, rendered as an `Allow` header value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedMethods(Vec<Method>);

impl AllowedMethods {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.0.contains(method)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.0.iter()
    }
}

impl FromIterator<Method> for AllowedMethods {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for AllowedMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, method) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(method.as_str())?;
        }
        Ok(())
    }
}

impl<H> Router<H> {
    pub fn builder() -> RouterBuilder<H> {
        RouterBuilder::new()
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Methods with at least one route, in registration order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.trees.iter().map(|(m, _)| m)
    }

    /// Total number of registered routes.
    pub fn len(&self) -> usize {
        self.trees.iter().map(|(_, tree)| tree.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    fn tree(&self, method: &Method) -> Option<&Node<H>> {
        self.trees.iter().find(|(m, _)| m == method).map(|(_, tree)| tree)
    }

    /// Raw tree lookup for `method`, without any dispatch policy.
    pub fn lookup<'r, 'p>(&'r self, method: &Method, path: &'p str) -> Lookup<'r, 'p, H> {
        match self.tree(method) {
            Some(tree) => tree.lookup(path),
            None => Lookup {
                handler: None,
                params: Params::new(),
                tsr: false,
            },
        }
    }

    /// Case-insensitive lookup in the tree for `method`.
    pub fn find_case_insensitive_path(
        &self,
        method: &Method,
        path: &str,
        fix_trailing_slash: bool,
    ) -> Option<String> {
        self.tree(method)?
            .find_case_insensitive_path(path, fix_trailing_slash)
    }

    /// Methods other than `method` that have a handler for `path`.
    ///
    /// For the server-wide path `*` every registered method is listed.
    /// OPTIONS is never looked up; it is appended when OPTIONS handling is on
    /// and the list is not empty.
    pub fn allowed(&self, path: &str, method: &Method) -> AllowedMethods {
        let mut allow = Vec::new();

        for (m, tree) in &self.trees {
            if *m == Method::OPTIONS {
                continue;
            }
            if path == "*" {
                allow.push(m.clone());
            } else if m != method && tree.lookup(path).handler.is_some() {
                allow.push(m.clone());
            }
        }

        if !allow.is_empty() && self.config.handle_options {
            allow.push(Method::OPTIONS);
        }
        AllowedMethods(allow)
    }

    /// Resolve a request.
    ///
    /// 1. A handler registered for the method and path wins.
    /// 2. Otherwise, unless the method is CONNECT or the path is `/`, try a
    ///    trailing slash redirect and then a redirect to the cleaned,
    ///    case-corrected path.
    /// 3. OPTIONS requests get the allowed methods, other requests a
    ///    method-not-allowed reply if another method would accept the path.
    /// 4. Not found.
    pub fn dispatch<'r, 'p>(&'r self, method: &Method, path: &'p str) -> Dispatch<'r, 'p, H> {
        if let Some(tree) = self.tree(method) {
            let found = tree.lookup(path);
            if let Some(handler) = found.handler {
                return Dispatch::Matched {
                    handler,
                    params: found.params,
                };
            }

            if *method != Method::CONNECT && path != "/" {
                let status = if *method == Method::GET {
                    StatusCode::MOVED_PERMANENTLY
                } else {
                    StatusCode::TEMPORARY_REDIRECT
                };

                if found.tsr && self.config.redirect_trailing_slash {
                    let location = match path.strip_suffix('/') {
                        Some(trimmed) if path.len() > 1 => trimmed.to_owned(),
                        _ => format!("{path}/"),
                    };
                    return Dispatch::Redirect { location, status };
                }

                if self.config.redirect_fixed_path {
                    let fixed = tree.find_case_insensitive_path(
                        &clean_path(path),
                        self.config.redirect_trailing_slash,
                    );
                    if let Some(location) = fixed.filter(|fixed| fixed != path) {
                        return Dispatch::Redirect { location, status };
                    }
                }
            }
        }

        if *method == Method::OPTIONS {
            if self.config.handle_options {
                let allow = self.allowed(path, method);
                if !allow.is_empty() {
                    return Dispatch::Options { allow };
                }
            }
        } else if self.config.handle_method_not_allowed {
            let allow = self.allowed(path, method);
            if !allow.is_empty() {
                return Dispatch::MethodNotAllowed { allow };
            }
        }

        Dispatch::NotFound
    }
}

impl<H> fmt::Debug for Router<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("methods", &self.methods().collect::<Vec<_>>())
            .field("routes", &self.len())
            .field("config", &self.config)
            .finish()
    }
}
