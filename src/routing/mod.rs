//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     RouterBuilder::handle(method, pattern, handler)
//!     → tree.rs (per-method radix tree insert, priority update)
//!     → build() freezes into an immutable Router
//!
//! Incoming Request (method, path):
//!     → router.rs (select method tree)
//!     → tree.rs (exact lookup → handler + params, or tsr hint)
//!     → on miss: path.rs (clean) + tree.rs (case-insensitive recovery)
//!     → on miss: other method trees (Allow list)
//!     → Return: Dispatch
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex, no linear scan: lookup cost depends on path length only
//! - Registration errors are returned, never silently overwritten
//! - Static segments win over parameters at the same position

pub mod error;
pub mod params;
pub mod path;
pub mod router;
pub mod tree;

pub use error::RouteError;
pub use params::{Param, Params, PathParams};
pub use path::clean_path;
pub use router::{AllowedMethods, Dispatch, Router, RouterBuilder};
pub use tree::{Lookup, Node};
