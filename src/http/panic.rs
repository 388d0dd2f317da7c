//! Replies for handlers that panicked.

use std::any::Any;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Payload of a caught panic.
pub type PanicPayload = Box<dyn Any + Send + 'static>;

/// Builds the response for a request whose handler panicked.
pub type PanicHandler = Arc<dyn Fn(PanicPayload) -> Response + Send + Sync>;

/// The message a panic was raised with, if it carried one.
pub fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    if let Some(s) = payload.downcast_ref::<String>() {
        Some(s)
    } else {
        payload.downcast_ref::<&str>().copied()
    }
}

/// Log the panic and answer with `handler`, or a plain 500 without one.
pub(crate) fn respond(handler: Option<&PanicHandler>, payload: PanicPayload) -> Response {
    tracing::error!(
        panic = panic_message(&*payload).unwrap_or("unknown panic"),
        "Handler panicked"
    );
    match handler {
        Some(handler) => handler(payload),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
    }
}
