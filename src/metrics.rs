//! Prometheus metrics for HTTP traffic and catalog refreshes.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global recorder once and return its render handle.
///
/// Safe to call repeatedly (tests build many routers); later calls reuse the
/// first recorder.
pub fn init() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            // Another recorder may already be installed; rendering still works.
            let _ = metrics::set_global_recorder(recorder);
            handle
        })
        .clone()
}

pub fn record_request(endpoint: &'static str, status: u16) {
    counter!(
        "sku_videos_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_duration(endpoint: &'static str, start: Instant) {
    histogram!("sku_videos_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

/// `trigger` is "query" or "background"; `outcome` is "ok" or "error".
pub fn record_refresh(trigger: &'static str, outcome: &'static str, start: Instant) {
    counter!("sku_videos_refresh_total", "trigger" => trigger, "outcome" => outcome).increment(1);
    histogram!("sku_videos_refresh_duration_seconds", "trigger" => trigger)
        .record(start.elapsed().as_secs_f64());
}

pub fn set_snapshot_size(videos: usize) {
    gauge!("sku_videos_snapshot_videos").set(videos as f64);
}
