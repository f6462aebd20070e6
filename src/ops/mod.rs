// * Operations: structured logging, process metrics and threshold alerting

pub mod alerting;
pub mod telemetry;

// * Re-exports for convenient access
pub use alerting::{check_thresholds, Alert, AlertType};
pub use telemetry::{
    get_metrics_string, init_tracing, init_tracing_with_file, record_alerts,
    record_bridge_request, record_frames_swept, record_poll_iteration,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorConfig;
    use crate::persistence::Reading;

    #[test]
    fn test_alert_feeds_metrics() {
        let cfg = SensorConfig::default();
        let reading = Reading::now(Some(12.5), Some(20.0));

        let alerts = check_thresholds(&reading, &cfg);
        assert_eq!(alerts.len(), 1);

        record_alerts(alerts.len(), false);
        assert!(get_metrics_string().contains("labpi_alerts_total"));
    }
}
