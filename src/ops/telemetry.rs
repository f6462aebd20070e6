// * Telemetry - JSON Logging and Prometheus Metrics
// * Structured logs to stdout (plus an optional per-service file) and process-local counters

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec, Encoder, TextEncoder};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

lazy_static! {
    // * Poll loop iterations by agent and outcome
    pub static ref POLL_ITERATIONS_TOTAL: CounterVec = register_counter_vec!(
        "labpi_poll_iterations_total",
        "Poll loop iterations by agent and outcome",
        &["agent", "outcome"]
    ).unwrap();

    // * Frames removed by the retention sweeper
    pub static ref FRAMES_SWEPT_TOTAL: CounterVec = register_counter_vec!(
        "labpi_frames_swept_total",
        "Frames deleted by the retention sweeper",
        &["dir"]
    ).unwrap();

    // * Threshold alerts raised and their delivery result
    pub static ref ALERTS_TOTAL: CounterVec = register_counter_vec!(
        "labpi_alerts_total",
        "Threshold alerts by delivery result",
        &["delivery"]
    ).unwrap();

    // * Bridge requests by route and status code
    pub static ref BRIDGE_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "labpi_bridge_requests_total",
        "Bridge HTTP requests by route and status",
        &["route", "status"]
    ).unwrap();
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initializes JSON tracing to stdout at `info` (overridable via `RUST_LOG`)
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().json())
        .init();
}

/// Initializes JSON tracing to stdout and to an append-only log file
///
/// If the file cannot be opened the service still logs to stdout and the
/// problem is reported once the subscriber is live.
///
/// # Example
/// ```ignore
/// use lab_pi::ops::telemetry;
///
/// telemetry::init_tracing_with_file(Path::new("/home/pi/lab-data/logs/camera.log"));
/// tracing::info!(device = "/dev/video0", "Camera monitor starting");
/// ```
pub fn init_tracing_with_file(path: &Path) {
    let opened = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(path));

    let (file_layer, open_error) = match opened {
        Ok(file) => (
            Some(fmt::layer().json().with_ansi(false).with_writer(Arc::new(file))),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().json())
        .with(file_layer)
        .init();

    if let Some(e) = open_error {
        tracing::warn!(path = %path.display(), error = %e, "Log file unavailable, logging to stdout only");
    }
}

/// Returns the current metrics in Prometheus text format
pub fn get_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Content type for [`get_metrics_string`]
pub fn metrics_content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

/// Records a poll iteration outcome ("ok" / "error")
pub fn record_poll_iteration(agent: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    POLL_ITERATIONS_TOTAL
        .with_label_values(&[agent, outcome])
        .inc();
}

/// Records frames removed by a sweep
pub fn record_frames_swept(count: u64) {
    if count > 0 {
        FRAMES_SWEPT_TOTAL
            .with_label_values(&["camera"])
            .inc_by(count as f64);
    }
}

/// Records raised alerts with their delivery result
pub fn record_alerts(count: usize, delivered: bool) {
    let delivery = if delivered { "delivered" } else { "undelivered" };
    ALERTS_TOTAL
        .with_label_values(&[delivery])
        .inc_by(count as f64);
}

/// Records one bridge request
pub fn record_bridge_request(route: &str, status: u16) {
    let status = status.to_string();
    BRIDGE_REQUESTS_TOTAL
        .with_label_values(&[route, status.as_str()])
        .inc();
}
