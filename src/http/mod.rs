//! HTTP binding for the route table.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout, panic recovery)
//!     → service.rs (dispatch through the current route table)
//!     → handler.rs (matched route), files.rs (static files)
//!       or response.rs (redirect, OPTIONS, 405, 404)
//!     → panic.rs (handler panicked)
//!     → Send to client
//! ```

pub mod files;
pub mod handler;
pub mod panic;
pub mod response;
pub mod server;
pub mod service;

pub use files::FilesHandler;
pub use handler::{handler_fn, BoxHandler, Handler, HandlerFn, HandlerFuture};
pub use panic::{panic_message, PanicHandler, PanicPayload};
pub use response::{BodyTemplate, ResponderHandler};
pub use server::{HttpServer, X_REQUEST_ID};
pub use service::RouterService;
