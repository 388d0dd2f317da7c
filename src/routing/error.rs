//! Registration-time errors.
//!
//! Lookups never fail; every error here is raised while routes are being
//! registered and points at a mistake in the route table itself.

use thiserror::Error;

/// A route pattern that could not be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The pattern does not start with `/`.
    #[error("path must begin with '/' in path '{pattern}'")]
    MissingLeadingSlash { pattern: String },

    /// A `:` or `*` with no name after it.
    #[error("wildcards must be named with a non-empty name in path '{pattern}'")]
    UnnamedWildcard { pattern: String },

    /// More than one wildcard inside a single path segment, e.g. `/:a:b`.
    #[error("only one wildcard per path segment is allowed in path '{pattern}'")]
    MultipleWildcards { pattern: String },

    /// A catch-all that is not the final segment.
    #[error("catch-all routes are only allowed at the end of the path in path '{pattern}'")]
    CatchAllNotLast { pattern: String },

    /// A catch-all that does not directly follow a `/`.
    #[error("no / before catch-all in path '{pattern}'")]
    CatchAllWithoutSlash { pattern: String },

    /// A wildcard that collides with a different wildcard already registered
    /// at the same position.
    #[error("'{segment}' in new path '{pattern}' conflicts with existing wildcard '{existing}'")]
    WildcardConflict {
        pattern: String,
        segment: String,
        existing: String,
    },

    /// A catch-all that would shadow (or be shadowed by) routes registered
    /// under the same segment root.
    #[error("catch-all conflicts with existing routes for the path segment root in path '{pattern}'")]
    CatchAllConflict { pattern: String },

    /// A handler is already registered for exactly this pattern.
    #[error("a handler is already registered for path '{pattern}'")]
    Duplicate { pattern: String },

    /// A file server pattern that does not end in `/*filepath`.
    #[error("path must end with /*filepath in path '{pattern}'")]
    InvalidFilesPattern { pattern: String },
}

impl RouteError {
    /// The offending pattern.
    pub fn pattern(&self) -> &str {
        match self {
            RouteError::MissingLeadingSlash { pattern }
            | RouteError::UnnamedWildcard { pattern }
            | RouteError::MultipleWildcards { pattern }
            | RouteError::CatchAllNotLast { pattern }
            | RouteError::CatchAllWithoutSlash { pattern }
            | RouteError::WildcardConflict { pattern, .. }
            | RouteError::CatchAllConflict { pattern }
            | RouteError::InvalidFilesPattern { pattern }
            | RouteError::Duplicate { pattern } => pattern,
        }
    }
}
