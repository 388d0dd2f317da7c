//! Radix-tree HTTP request router.
//!
//! Routes are `(method, pattern)` pairs. Patterns mix static text with named
//! parameters (`/user/:name`) and a trailing catch-all (`/static/*filepath`).
//! Each method gets its own compressed prefix tree, so a lookup walks the
//! path once, independent of how many routes are registered.
//!
//! The [`routing`] module is the library core and is generic over the
//! handler type. [`http`] serves a route table of async handlers with Axum,
//! and [`config`] builds one from a TOML file of canned responses.

// Core
pub mod routing;

// Serving
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use http::{handler_fn, HttpServer, RouterService};
pub use lifecycle::Shutdown;
pub use routing::{clean_path, Dispatch, Params, PathParams, Router, RouterBuilder};
