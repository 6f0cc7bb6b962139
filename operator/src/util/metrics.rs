#![cfg(feature = "metrics")]

use const_format::concatcp;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

const METRICS_PREFIX: &str = "ferrite";

/// Per-kind reconciler metrics. Each provider kind gets its own instance,
/// tagged by `tag` in the metric name, so e.g. the `d1` and `worker`
/// controllers don't share a counter.
pub struct ControllerMetrics {
    pub reconcile_counter: CounterVec,
    pub action_counter: CounterVec,
    pub read_histogram: HistogramVec,
    pub write_histogram: HistogramVec,
}

impl ControllerMetrics {
    pub fn new(tag: &str) -> Self {
        let pre = format!("{}{}", concatcp!(METRICS_PREFIX, "_"), tag);
        let reconcile_counter = register_counter_vec!(
            format!("{pre}_reconcile_counter"),
            "Number of reconciliations by the controller.",
            &["name", "namespace"]
        )
        .unwrap();
        let action_counter = register_counter_vec!(
            format!("{pre}_action_counter"),
            "Number of actions taken by the controller.",
            &["name", "namespace", "action"]
        )
        .unwrap();
        let read_histogram = register_histogram_vec!(
            format!("{pre}_read_duration_seconds"),
            "Read phase latency of the controller.",
            &["name", "namespace", "action"]
        )
        .unwrap();
        let write_histogram = register_histogram_vec!(
            format!("{pre}_write_duration_seconds"),
            "Write phase latency of the controller.",
            &["name", "namespace", "action"]
        )
        .unwrap();
        ControllerMetrics {
            reconcile_counter,
            action_counter,
            read_histogram,
            write_histogram,
        }
    }
}

/// Serves the default Prometheus registry at `/metrics`, spawned on its
/// own task when `--metrics-port` is set. Reuses axum rather than
/// pulling a second HTTP stack into the dependency tree just for this.
pub async fn run_server(port: u16) {
    use axum::routing::get;
    use prometheus::{Encoder, TextEncoder};
    use std::net::SocketAddr;

    async fn scrape() -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        buffer
    }

    let app = axum::Router::new().route("/metrics", get(scrape));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "starting metrics server");
    if let Err(e) = axum::Server::bind(&addr).serve(app.into_make_service()).await {
        tracing::error!(error = %e, "metrics server exited");
    }
}
