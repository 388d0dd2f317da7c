//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by method and dispatch outcome
//! - `router_dispatch_duration_seconds` (histogram): time spent resolving a
//!   request, handler excluded
//!
//! # Design Decisions
//! - Outcome labels are a fixed set, never the raw path
//! - Without an installed recorder every update is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

/// Record one dispatch decision.
pub fn record_dispatch(method: &Method, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "router_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("router_dispatch_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_dispatch() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_dispatch(&Method::GET, "matched", Instant::now());
            record_dispatch(&Method::GET, "matched", Instant::now());
            record_dispatch(&Method::POST, "not_found", Instant::now());
        });

        let rendered = handle.render();
        let counter = |method: &str, outcome: &str| {
            rendered
                .lines()
                .find(|l| {
                    l.starts_with("router_requests_total{")
                        && l.contains(&format!(r#"method="{method}""#))
                        && l.contains(&format!(r#"outcome="{outcome}""#))
                })
                .and_then(|l| l.rsplit(' ').next())
                .map(str::to_owned)
        };

        assert_eq!(counter("GET", "matched").as_deref(), Some("2"));
        assert_eq!(counter("POST", "not_found").as_deref(), Some("1"));
        assert!(rendered.contains("router_dispatch_duration_seconds"));
    }
}
