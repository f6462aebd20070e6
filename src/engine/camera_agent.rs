// * Camera Agent - capture, store, optionally upload, then sweep old frames

use crate::engine::poller::PollTask;
use crate::engine::retention::RetentionSweeper;
use crate::engine::PollError;
use crate::network::CollectorClient;
use crate::persistence::FrameStore;
use crate::sources::FrameSource;
use chrono::Local;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub struct CameraAgent<S> {
    // * Shared with the blocking pool for the duration of one capture
    source: Arc<Mutex<S>>,
    store: FrameStore,
    sweeper: RetentionSweeper,
    uploader: Option<CollectorClient>,
}

impl<S: FrameSource> CameraAgent<S> {
    pub fn new(
        source: S,
        store: FrameStore,
        sweeper: RetentionSweeper,
        uploader: Option<CollectorClient>,
    ) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            store,
            sweeper,
            uploader,
        }
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    async fn capture(&self) -> Result<Vec<u8>, PollError> {
        let source = Arc::clone(&self.source);
        tokio::task::spawn_blocking(move || {
            let mut source = source.lock().map_err(|_| PollError::SourcePoisoned)?;
            source.capture().map_err(PollError::from)
        })
        .await
        .map_err(|e| PollError::Join(e.to_string()))?
    }

    /// Grabs one frame and stores it; uploads when configured.
    pub async fn capture_and_store(&self) -> Result<PathBuf, PollError> {
        let bytes = self.capture().await?;
        let path = self.store.save(Local::now().naive_local(), &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Saved frame");

        if let Some(client) = &self.uploader {
            client.upload_frame_best_effort(&path).await;
        }
        Ok(path)
    }
}

impl<S: FrameSource> PollTask for CameraAgent<S> {
    const NAME: &'static str = "camera";
    type Error = PollError;

    async fn poll_once(&mut self) -> Result<(), PollError> {
        let captured = self.capture_and_store().await;

        // * Sweep runs whether or not the capture worked
        if let Err(e) = self.sweeper.sweep() {
            warn!(dir = %self.sweeper.dir().display(), error = %e, "Retention sweep failed");
        }

        captured.map(|_| ())
    }
}
