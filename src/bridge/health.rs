// * Host health probes for /status

use crate::config::constants::SERVICE_PROBE_TIMEOUT;
use std::path::Path;
use sysinfo::{Disks, System};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Host uptime as `"{hours}h {minutes}m"`.
pub fn uptime() -> String {
    format_uptime(System::uptime())
}

pub fn format_uptime(secs: u64) -> String {
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}

/// Free space on the filesystem mounted at `mount`, in GB to one decimal; -1 when unknown.
pub fn disk_free_gb(mount: &Path) -> f64 {
    let disks = Disks::new_with_refreshed_list();
    disks
        .iter()
        .find(|disk| disk.mount_point() == mount)
        .map(|disk| round_tenth(disk.available_space() as f64 / BYTES_PER_GB))
        .unwrap_or(-1.0)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Asks the service manager whether `unit` is active. Any failure reads as inactive.
pub async fn is_service_active(unit: &str) -> bool {
    let probe = Command::new("systemctl")
        .arg("is-active")
        .arg(unit)
        .kill_on_drop(true)
        .output();

    match timeout(SERVICE_PROBE_TIMEOUT, probe).await {
        Ok(Ok(output)) => String::from_utf8_lossy(&output.stdout).trim() == "active",
        Ok(Err(e)) => {
            debug!(unit, error = %e, "systemctl unavailable");
            false
        }
        Err(_) => {
            debug!(unit, "systemctl timed out");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0h 0m");
        assert_eq!(format_uptime(59), "0h 0m");
        assert_eq!(format_uptime(3 * 3600 + 25 * 60 + 10), "3h 25m");
        assert_eq!(format_uptime(50 * 3600), "50h 0m");
    }

    #[test]
    fn test_round_tenth() {
        assert_eq!(round_tenth(12.345), 12.3);
        assert_eq!(round_tenth(0.06), 0.1);
    }

    #[test]
    fn test_unknown_mount_is_negative() {
        assert_eq!(disk_free_gb(Path::new("/definitely/not/a/mount")), -1.0);
    }

    #[tokio::test]
    async fn test_missing_unit_is_inactive() {
        assert!(!is_service_active("lab-pi-no-such-unit").await);
    }
}
