//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the route table from config and serve it through [`RouterService`]
//! - Wire up middleware (tracing, timeout, request ID, panic recovery)
//! - Swap in a new route table when the config changes
//! - Stop accepting and drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, Request},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{build_router, ConfigError, RouteConfig, ServerConfig};
use crate::http::handler::BoxHandler;
use crate::http::panic::{self, PanicHandler, PanicPayload};
use crate::http::response::ResponderHandler;
use crate::http::service::RouterService;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// HTTP server for a configured route table.
pub struct HttpServer {
    config: ServerConfig,
    service: RouterService,
    panic_handler: Option<PanicHandler>,
    // only tables built from config routes are rebuilt on reload
    reload_routes: bool,
}

impl HttpServer {
    /// Create a server answering the config's routes with their canned
    /// responses.
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        let router = build_router(&config, responder)?;
        Ok(Self {
            config,
            service: RouterService::new(router),
            panic_handler: None,
            reload_routes: true,
        })
    }

    /// Create a server around an existing service, e.g. one with custom
    /// handlers. Its route table is never rebuilt from config updates.
    pub fn with_service(config: ServerConfig, service: RouterService) -> Self {
        Self {
            config,
            service,
            panic_handler: None,
            reload_routes: false,
        }
    }

    /// Answer requests whose handler panicked with `handler`, which gets the
    /// panic payload (see [`panic::panic_message`]). Defaults to a plain 500.
    pub fn with_panic_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(PanicPayload) -> Response + Send + Sync + 'static,
    {
        self.panic_handler = Some(Arc::new(handler));
        self
    }

    /// Build the Axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(&self) -> Router {
        let panic_handler = self.panic_handler.clone();

        Router::new()
            .fallback_service(self.service.clone())
            .layer(CatchPanicLayer::custom(move |payload: PanicPayload| {
                panic::respond(panic_handler.as_ref(), payload)
            }))
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let request_id = req
                    .headers()
                    .get(&X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Every config received on `config_updates` rebuilds the route table. A
    /// config whose routes fail to build is logged and ignored, and so is
    /// every update for a server built with [`with_service`](Self::with_service).
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServerConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.service.router().len(),
            "HTTP server starting"
        );

        let service = self.service.clone();
        let reload_routes = self.reload_routes;
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if !reload_routes {
                    tracing::warn!(
                        routes = config.routes.len(),
                        "Ignoring config update, server uses custom handlers"
                    );
                    continue;
                }
                match build_router(&config, responder) {
                    Ok(router) => {
                        let routes = router.len();
                        service.swap(router);
                        tracing::info!(routes, "Route table reloaded");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to rebuild route table, keeping current one");
                    }
                }
            }
        });

        let app = self.build_app();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The service answering requests. Clones share its route table.
    pub fn service(&self) -> &RouterService {
        &self.service
    }
}

fn responder(route: &RouteConfig) -> BoxHandler {
    Arc::new(ResponderHandler::from_config(route))
}
