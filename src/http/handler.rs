//! Request handlers stored in the route table.
//!
//! A handler receives the full request. Parameters captured by the matched
//! route are available as a [`PathParams`] request extension.
//!
//! [`PathParams`]: crate::routing::PathParams

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;

/// Future returned by [`Handler::call`].
pub type HandlerFuture = BoxFuture<'static, Response>;

/// Something that can answer a routed request.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request<Body>) -> HandlerFuture;
}

/// Shared, type-erased handler. This is the value type of the server's
/// route table.
pub type BoxHandler = Arc<dyn Handler>;

/// Handler built from an async function or closure. See [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap an async function as a [`Handler`].
///
/// ```rust
/// use axum::{body::Body, http::Request};
/// use trie_router::http::handler_fn;
/// use trie_router::routing::PathParams;
///
/// let hello = handler_fn(|req: Request<Body>| async move {
///     let params = req.extensions().get::<PathParams>().cloned().unwrap_or_default();
///     format!("hello, {}!", params.by_name("name"))
/// });
/// # let _ = hello;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    HandlerFn { f }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn call(&self, req: Request<Body>) -> HandlerFuture {
        let fut = (self.f)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call(&self, req: Request<Body>) -> HandlerFuture {
        (**self).call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_handler_fn_converts_output() {
        let handler: BoxHandler = Arc::new(handler_fn(|_req| async { (StatusCode::CREATED, "made") }));

        let res = handler.call(Request::new(Body::empty())).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"made");
    }
}
