// * Sensor Monitor - pH and water temperature over I2C, simulated when no bus is present

use lab_pi::config::{LabConfig, LabPaths};
use lab_pi::engine::{Poller, SensorAgent};
use lab_pi::network::CollectorClient;
use lab_pi::ops::telemetry;
use lab_pi::persistence::ReadingLog;
use lab_pi::sources::sensor;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let paths = LabPaths::from_home();
    telemetry::init_tracing_with_file(&paths.service_log("sensors"));

    let config = LabConfig::load_or_default(&paths.config_file);
    let sensors = config.sensors.clone();
    info!(
        interval_secs = sensors.read_interval_seconds,
        ph_enabled = sensors.ph_enabled,
        temp_enabled = sensors.temp_enabled,
        "Sensor monitor starting"
    );

    let source = sensor::probe(&sensors);
    if source.is_simulated() {
        warn!("No hardware bus in use, readings are SIMULATED");
    }

    let collector = match CollectorClient::new(&config.neverot_server) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(server = %config.neverot_server, error = %e, "Alert forwarding disabled");
            None
        }
    };

    let interval = sensors.interval();
    let agent = SensorAgent::new(source, sensors, ReadingLog::new(&paths.sensor_csv), collector);
    let mut poller = Poller::new(agent, interval);

    tokio::select! {
        _ = poller.run_forever() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    info!(
        iterations = poller.iterations(),
        failures = poller.failures(),
        "Sensor monitor stopping"
    );
}
