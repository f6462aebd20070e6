// * Camera Monitor - capture on an interval, keep a rolling window of frames

use lab_pi::config::{LabConfig, LabPaths};
use lab_pi::engine::{CameraAgent, Poller, RetentionSweeper};
use lab_pi::network::CollectorClient;
use lab_pi::ops::telemetry;
use lab_pi::persistence::FrameStore;
use lab_pi::sources::UsbCamera;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let paths = LabPaths::from_home();
    telemetry::init_tracing_with_file(&paths.service_log("camera"));

    let config = LabConfig::load_or_default(&paths.config_file);
    let camera = &config.camera;
    info!(
        device = %camera.device,
        interval_secs = camera.interval_seconds,
        keep_hours = camera.keep_hours,
        upload = camera.upload_to_server,
        "Camera monitor starting"
    );

    if let Err(e) = std::fs::create_dir_all(&paths.camera_dir) {
        error!(dir = %paths.camera_dir.display(), error = %e, "Cannot create camera directory");
    }

    let uploader = CollectorClient::for_uploads(&config);

    let agent = CameraAgent::new(
        UsbCamera::new(camera.device.clone()),
        FrameStore::new(&paths.camera_dir),
        RetentionSweeper::new(&paths.camera_dir, camera.max_age()),
        uploader,
    );
    let mut poller = Poller::new(agent, camera.interval());

    tokio::select! {
        _ = poller.run_forever() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    info!(
        iterations = poller.iterations(),
        failures = poller.failures(),
        "Camera monitor stopping"
    );
}
