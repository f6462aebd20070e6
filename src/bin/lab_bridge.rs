// * Lab Bridge - local HTTP view over camera frames, sensor readings and alerts

use lab_pi::bridge::{self, BridgeState};
use lab_pi::config::constants::BRIDGE_PORT;
use lab_pi::config::LabPaths;
use lab_pi::ops::telemetry;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();

    let paths = LabPaths::from_home();
    let state = Arc::new(BridgeState::from_paths(&paths));
    let addr = SocketAddr::from(([0, 0, 0, 0], BRIDGE_PORT));
    info!(port = BRIDGE_PORT, camera_dir = %paths.camera_dir.display(), "Lab bridge starting");

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown requested");
    };

    match bridge::serve(addr, state, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Lab bridge failed");
            ExitCode::FAILURE
        }
    }
}
