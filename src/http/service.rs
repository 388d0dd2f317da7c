//! Tower service that dispatches requests through the route table.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::{body::Body, http::Request, response::Response};
use futures_util::future::BoxFuture;
use percent_encoding::percent_decode_str;
use tower::Service;

use crate::http::handler::{BoxHandler, Handler};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::{Dispatch, Router};

/// Serves requests from a [`Router`] of boxed handlers.
///
/// The route table sits behind an [`ArcSwap`], so [`swap`](Self::swap)
/// replaces it for new requests while in-flight requests finish against the
/// table they started with. Clones share the table.
#[derive(Clone)]
pub struct RouterService {
    router: Arc<ArcSwap<Router<BoxHandler>>>,
    not_found: Option<BoxHandler>,
    method_not_allowed: Option<BoxHandler>,
}

impl RouterService {
    pub fn new(router: Router<BoxHandler>) -> Self {
        Self {
            router: Arc::new(ArcSwap::from_pointee(router)),
            not_found: None,
            method_not_allowed: None,
        }
    }

    /// Handler for requests no route accepts. Defaults to a plain 404.
    pub fn with_not_found(mut self, handler: impl Handler) -> Self {
        self.not_found = Some(Arc::new(handler));
        self
    }

    /// Handler for 405 replies. The `Allow` header is set on whatever it
    /// returns, and its status is left alone.
    pub fn with_method_not_allowed(mut self, handler: impl Handler) -> Self {
        self.method_not_allowed = Some(Arc::new(handler));
        self
    }

    /// Current route table.
    pub fn router(&self) -> Arc<Router<BoxHandler>> {
        self.router.load_full()
    }

    /// Replace the route table.
    pub fn swap(&self, router: Router<BoxHandler>) {
        self.router.store(Arc::new(router));
    }

    /// Dispatch one request.
    ///
    /// Routes are matched against the percent-decoded path, so parameter
    /// values reach handlers decoded.
    pub async fn handle(&self, mut req: Request<Body>) -> Response {
        let start = Instant::now();
        let router = self.router.load_full();
        let method = req.method().clone();
        let path = match percent_decode_str(req.uri().path()).decode_utf8() {
            Ok(path) => path.into_owned(),
            Err(_) => {
                metrics::record_dispatch(&method, "bad_request", start);
                tracing::debug!(%method, uri = %req.uri(), "Path is not valid UTF-8");
                return response::bad_request();
            }
        };

        let dispatch = router.dispatch(&method, &path);
        metrics::record_dispatch(&method, dispatch.outcome(), start);

        match dispatch {
            Dispatch::Matched { handler, params } => {
                tracing::debug!(%method, %path, ?params, "Route matched");
                let handler = Arc::clone(handler);
                req.extensions_mut().insert(params.to_owned_params());
                handler.call(req).await
            }
            Dispatch::Redirect { location, status } => {
                let encoded = response::encode_path(&location);
                let location = match req.uri().query() {
                    Some(query) => format!("{encoded}?{query}"),
                    None => encoded.into_owned(),
                };
                tracing::debug!(%method, %path, %location, status = status.as_u16(), "Redirecting");
                response::redirect(status, &location)
            }
            Dispatch::Options { allow } => response::options(&allow),
            Dispatch::MethodNotAllowed { allow } => {
                tracing::debug!(%method, %path, %allow, "Method not allowed");
                match &self.method_not_allowed {
                    Some(handler) => {
                        let mut res = handler.call(req).await;
                        response::set_allow(&mut res, &allow);
                        res
                    }
                    None => response::method_not_allowed(&allow),
                }
            }
            Dispatch::NotFound => {
                tracing::debug!(%method, %path, "No route");
                match &self.not_found {
                    Some(handler) => handler.call(req).await,
                    None => response::not_found(),
                }
            }
        }
    }
}

impl Service<Request<Body>> for RouterService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { Ok(this.handle(req).await) })
    }
}
