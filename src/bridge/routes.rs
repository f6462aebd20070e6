// * Bridge routes - read-only views of on-disk state plus the inbound alert endpoint

use crate::bridge::health;
use crate::config::constants::{
    BRIDGE_SERVICE, CSV_HEADER, DEFAULT_HISTORY_HOURS, ISO_TIME_FORMAT, PEER_SERVICES,
};
use crate::config::LabPaths;
use crate::ops::telemetry;
use crate::persistence::{AlertLog, FrameStore, Reading, ReadingLog, StorageError};
use chrono::Local;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};

/// Files the bridge reads and the alert log it appends to.
#[derive(Debug, Clone)]
pub struct BridgeState {
    pub frames: FrameStore,
    pub readings: ReadingLog,
    pub alerts: AlertLog,
    pub disk_mount: PathBuf,
}

impl BridgeState {
    pub fn from_paths(paths: &LabPaths) -> Self {
        Self {
            frames: FrameStore::new(&paths.camera_dir),
            readings: ReadingLog::new(&paths.sensor_csv),
            alerts: AlertLog::new(paths.alert_log()),
            disk_mount: PathBuf::from("/"),
        }
    }
}

/// Body of GET /status
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub lab_pi: bool,
    pub timestamp: String,
    pub uptime: String,
    pub disk_free_gb: f64,
    pub services: BTreeMap<String, bool>,
    pub latest_image: bool,
    pub latest_sensor: Option<Reading>,
}

/// Dispatches one request. Never fails; errors become JSON responses.
pub async fn route(req: Request<Body>, state: Arc<BridgeState>) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = match (&method, path.as_str()) {
        (&Method::GET, "/status") => status(&state).await,
        (&Method::GET, "/camera/latest") => camera_latest(&state).await,
        (&Method::GET, "/sensors/latest") => sensors_latest(&state).await,
        (&Method::GET, "/sensors/history") => {
            let hours = history_hours(req.uri().query());
            sensors_history(&state, hours).await
        }
        (&Method::POST, "/alert") => receive_alert(&state, req).await,
        (&Method::GET, "/metrics") => text_response(
            StatusCode::OK,
            &telemetry::metrics_content_type(),
            telemetry::get_metrics_string(),
        ),
        (_, "/status" | "/camera/latest" | "/sensors/latest" | "/sensors/history" | "/alert" | "/metrics") => {
            error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
        }
        _ => error_response(StatusCode::NOT_FOUND, "Not Found"),
    };

    telemetry::record_bridge_request(route_label(&path), response.status().as_u16());
    response
}

// * Keeps metric cardinality bounded for unknown paths
fn route_label(path: &str) -> &str {
    match path {
        "/status" | "/camera/latest" | "/sensors/latest" | "/sensors/history" | "/alert"
        | "/metrics" => path,
        _ => "other",
    }
}

/// `?hours=N`, defaulting to 24 when absent or not an integer.
pub fn history_hours(query: Option<&str>) -> i64 {
    query
        .into_iter()
        .flat_map(|q| url::form_urlencoded::parse(q.as_bytes()))
        .find(|(key, _)| key == "hours")
        .and_then(|(_, value)| value.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_HISTORY_HOURS)
}

async fn status(state: &BridgeState) -> Response<Body> {
    let probes = PEER_SERVICES.into_iter().map(|unit| async move {
        (unit.to_string(), health::is_service_active(unit).await)
    });
    let mut services: BTreeMap<String, bool> = futures::future::join_all(probes)
        .await
        .into_iter()
        .collect();
    services.insert(BRIDGE_SERVICE.to_string(), true);

    let frames = state.frames.clone();
    let readings = state.readings.clone();
    let mount = state.disk_mount.clone();
    let snapshot = tokio::task::spawn_blocking(move || {
        let latest_sensor = readings.latest().unwrap_or_else(|e| {
            warn!(error = %e, "Cannot read sensor log for status");
            None
        });
        (frames.has_frames(), latest_sensor, health::disk_free_gb(&mount))
    })
    .await;

    let (latest_image, latest_sensor, disk_free_gb) = match snapshot {
        Ok(values) => values,
        Err(e) => {
            error!(error = %e, "Status snapshot task failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Status unavailable");
        }
    };

    let report = StatusReport {
        lab_pi: true,
        timestamp: Local::now().naive_local().format(ISO_TIME_FORMAT).to_string(),
        uptime: health::uptime(),
        disk_free_gb,
        services,
        latest_image,
        latest_sensor,
    };
    json_response(StatusCode::OK, &report)
}

async fn camera_latest(state: &BridgeState) -> Response<Body> {
    let frames = state.frames.clone();
    match blocking(move || frames.read_latest()).await {
        Ok(Some(bytes)) => bytes_response(StatusCode::OK, "image/jpeg", bytes),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No camera images found"),
        Err(e) => storage_failure("camera/latest", e),
    }
}

async fn sensors_latest(state: &BridgeState) -> Response<Body> {
    let readings = state.readings.clone();
    match blocking(move || readings.latest()).await {
        Ok(Some(reading)) => json_response(StatusCode::OK, &reading),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No sensor readings found"),
        Err(e) => storage_failure("sensors/latest", e),
    }
}

async fn sensors_history(state: &BridgeState, hours: i64) -> Response<Body> {
    let readings = state.readings.clone();
    let body = match blocking(move || readings.history_hours(hours)).await {
        Ok(csv) => csv,
        // * History is always answered; an unreadable log reads as empty
        Err(e) => {
            warn!(error = %e, "Cannot read sensor history");
            format!("{}\n", CSV_HEADER.join(","))
        }
    };
    text_response(StatusCode::OK, "text/csv", body)
}

async fn receive_alert(state: &BridgeState, req: Request<Body>) -> Response<Body> {
    let message = match hyper::body::to_bytes(req.into_body()).await {
        Ok(bytes) => alert_message(&bytes),
        Err(e) => {
            warn!(error = %e, "Cannot read alert body");
            alert_message(&[])
        }
    };
    let line = alert_text(&message);
    warn!(message = %line, "Alert received from server");

    let log = state.alerts.clone();
    match blocking(move || log.append(&line)).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &json!({ "status": "received", "message": message }),
        ),
        Err(e) => storage_failure("alert", e),
    }
}

/// Extracts `message` from a JSON body as sent; anything unusable becomes "Unknown alert".
pub fn alert_message(body: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut map)) => match map.remove("message") {
            Some(Value::Null) | None => Value::from("Unknown alert"),
            Some(message) => message,
        },
        _ => Value::from("Unknown alert"),
    }
}

// * Text written to the alert log; non-string messages are logged as JSON
fn alert_text(message: &Value) -> String {
    match message {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn blocking<T, F>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

fn storage_failure(route: &str, e: StorageError) -> Response<Body> {
    error!(route, error = %e, "Storage error while serving request");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Storage error")
}

fn error_response(status: StatusCode, message: &str) -> Response<Body> {
    json_response(status, &json!({ "error": message }))
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(body) => bytes_response(status, "application/json", body),
        Err(e) => {
            error!(error = %e, "Cannot serialize response");
            bytes_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "application/json",
                br#"{"error":"Serialization failed"}"#.to_vec(),
            )
        }
    }
}

fn text_response(status: StatusCode, content_type: &str, body: String) -> Response<Body> {
    bytes_response(status, content_type, body.into_bytes())
}

fn bytes_response(status: StatusCode, content_type: &str, body: Vec<u8>) -> Response<Body> {
    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = status;
    if let Ok(value) = HeaderValue::from_str(content_type) {
        resp.headers_mut().insert(CONTENT_TYPE, value);
    }
    resp
}
