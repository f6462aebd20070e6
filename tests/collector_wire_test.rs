use hyper::header::CONTENT_TYPE;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};
use lab_pi::config::{LabConfig, Range, SensorConfig};
use lab_pi::engine::{CameraAgent, PollTask, RetentionSweeper, SensorAgent};
use lab_pi::network::CollectorClient;
use lab_pi::persistence::{FrameStore, ReadingLog};
use lab_pi::sources::sensor::HardwareBus;
use lab_pi::sources::{CaptureError, FrameSource, SensorSource};
use serde_json::Value;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
struct Received {
    path: String,
    content_type: String,
    body: Vec<u8>,
}

type Inbox = Arc<Mutex<Vec<Received>>>;

// * Stand-in collector: records every request and answers 200
fn start_collector() -> (String, Inbox) {
    let inbox: Inbox = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&inbox);

    let make_svc = make_service_fn(move |_conn| {
        let sink = Arc::clone(&sink);
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let sink = Arc::clone(&sink);
                async move {
                    let path = req.uri().path().to_string();
                    let content_type = req
                        .headers()
                        .get(CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    let body = hyper::body::to_bytes(req.into_body()).await?.to_vec();
                    sink.lock().unwrap().push(Received {
                        path,
                        content_type,
                        body,
                    });
                    Ok::<_, hyper::Error>(Response::new(Body::from("{}")))
                }
            }))
        }
    });

    let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
    let addr = server.local_addr();
    tokio::spawn(server);
    (addr.to_string(), inbox)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

struct StillFrame(Vec<u8>);

impl FrameSource for StillFrame {
    fn capture(&mut self) -> Result<Vec<u8>, CaptureError> {
        Ok(self.0.clone())
    }
}

fn camera_agent(dir: &std::path::Path, config: &LabConfig) -> CameraAgent<StillFrame> {
    CameraAgent::new(
        StillFrame(b"\xFF\xD8fake-jpeg\xFF\xD9".to_vec()),
        FrameStore::new(dir),
        RetentionSweeper::new(dir, Duration::from_secs(3600)),
        CollectorClient::for_uploads(config),
    )
}

#[tokio::test]
async fn test_out_of_range_reading_posts_alert_batch() {
    let (server, inbox) = start_collector();
    let dir = tempfile::tempdir().unwrap();
    let config = SensorConfig {
        simulate: true,
        ph_range: Range::new(0.0, 1.0),
        ..SensorConfig::default()
    };

    let mut agent = SensorAgent::new(
        SensorSource::<HardwareBus>::Simulated,
        config,
        ReadingLog::new(dir.path().join("readings.csv")),
        Some(CollectorClient::new(&server).unwrap()),
    );
    agent.poll_once().await.unwrap();

    let received = inbox.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].path, "/api/alerts");
    assert!(received[0].content_type.starts_with("application/json"));

    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["source"], "lab-pi-sensors");
    let alerts = body["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    let message = alerts[0].as_str().unwrap();
    assert!(message.starts_with("pH OUT OF RANGE: "));
    assert!(message.ends_with("(expected 0.0-1.0)"));
}

#[tokio::test]
async fn test_in_range_reading_posts_nothing() {
    let (server, inbox) = start_collector();
    let dir = tempfile::tempdir().unwrap();
    let config = SensorConfig {
        simulate: true,
        ..SensorConfig::default()
    };

    let mut agent = SensorAgent::new(
        SensorSource::<HardwareBus>::Simulated,
        config,
        ReadingLog::new(dir.path().join("readings.csv")),
        Some(CollectorClient::new(&server).unwrap()),
    );
    agent.poll_once().await.unwrap();

    assert!(inbox.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_saved_frame_is_uploaded_as_multipart_image() {
    let (server, inbox) = start_collector();
    let dir = tempfile::tempdir().unwrap();
    let mut config = LabConfig::default();
    config.camera.upload_to_server = true;
    config.neverot_server = server;

    let mut agent = camera_agent(dir.path(), &config);
    agent.poll_once().await.unwrap();

    let frame = agent.store().latest().unwrap().unwrap();
    let frame_name = frame.file_name().unwrap().to_string_lossy().into_owned();

    let received = inbox.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].path, "/api/camera/upload");
    assert!(received[0].content_type.starts_with("multipart/form-data"));

    let body = &received[0].body;
    assert!(contains(body, b"name=\"image\""));
    assert!(contains(body, format!("filename=\"{}\"", frame_name).as_bytes()));
    assert!(contains(body, b"image/jpeg"));
    assert!(contains(body, b"fake-jpeg"));
}

#[tokio::test]
async fn test_upload_disabled_sends_nothing() {
    let (server, inbox) = start_collector();
    let dir = tempfile::tempdir().unwrap();
    let mut config = LabConfig::default();
    config.neverot_server = server;

    let mut agent = camera_agent(dir.path(), &config);
    agent.poll_once().await.unwrap();

    assert!(agent.store().has_frames());
    assert!(inbox.lock().unwrap().is_empty());
}
