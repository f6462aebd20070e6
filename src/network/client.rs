use crate::config::constants::{ALERT_TIMEOUT, UPLOAD_TIMEOUT};
use crate::config::LabConfig;
use crate::network::errors::NetworkError;
use crate::ops::alerting::Alert;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

// * Body of POST /api/alerts
#[derive(Debug, Serialize)]
struct AlertBatch<'a> {
    source: &'a str,
    alerts: Vec<&'a str>,
}

// * Best-effort pushes to the remote collector. Nothing here retries.
#[derive(Debug, Clone)]
pub struct CollectorClient {
    inner: Client,
    base_url: String,
}

impl CollectorClient {
    // * @param server - collector address as "host:port"
    pub fn new(server: &str) -> Result<Self, NetworkError> {
        let inner = Client::builder().build()?;
        Ok(Self {
            inner,
            base_url: format!("http://{}", server.trim_end_matches('/')),
        })
    }

    // * Upload client for the camera loop; None unless camera.upload_to_server is set
    pub fn for_uploads(config: &LabConfig) -> Option<Self> {
        if !config.camera.upload_to_server {
            return None;
        }
        match Self::new(&config.neverot_server) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(server = %config.neverot_server, error = %e, "Uploads disabled");
                None
            }
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // * Uploads one stored frame as multipart field "image".
    pub async fn upload_frame(&self, image_path: &Path) -> Result<u16, NetworkError> {
        let bytes = tokio::fs::read(image_path).await?;
        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame.jpg".to_string());

        let part = Part::bytes(bytes).file_name(file_name).mime_str("image/jpeg")?;
        let form = Form::new().part("image", part);

        let resp = self
            .inner
            .post(format!("{}/api/camera/upload", self.base_url))
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }
        Ok(status.as_u16())
    }

    // * Posts a batch of alert messages under a source tag.
    pub async fn post_alerts(&self, source: &str, alerts: &[Alert]) -> Result<(), NetworkError> {
        let body = AlertBatch {
            source,
            alerts: alerts.iter().map(|a| a.message.as_str()).collect(),
        };

        let resp = self
            .inner
            .post(format!("{}/api/alerts", self.base_url))
            .json(&body)
            .timeout(ALERT_TIMEOUT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }
        Ok(())
    }

    // * Upload wrapper for the poll loop: logs the outcome, never fails.
    pub async fn upload_frame_best_effort(&self, image_path: &Path) -> bool {
        match self.upload_frame(image_path).await {
            Ok(code) => {
                info!(status = code, "Uploaded to server");
                true
            }
            Err(NetworkError::Status(code)) => {
                warn!(status = code, "Server rejected upload");
                false
            }
            Err(e) => {
                warn!(error = %e, "Upload failed");
                false
            }
        }
    }

    // * Alert wrapper for the poll loop: delivery failure is swallowed.
    pub async fn post_alerts_best_effort(&self, source: &str, alerts: &[Alert]) -> bool {
        if alerts.is_empty() {
            return true;
        }
        match self.post_alerts(source, alerts).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, count = alerts.len(), "Alert delivery failed");
                false
            }
        }
    }
}
