// * On-disk layout shared by the pollers and the bridge

use std::path::{Path, PathBuf};

/// Filesystem locations for configuration, artifacts and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabPaths {
    pub config_file: PathBuf,
    pub camera_dir: PathBuf,
    pub sensor_csv: PathBuf,
    pub log_dir: PathBuf,
}

impl LabPaths {
    /// Lays the standard tree out under `root` (normally the user's home).
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let data = root.join("lab-data");

        Self {
            config_file: root.join("lab-config.yaml"),
            camera_dir: data.join("camera"),
            sensor_csv: data.join("sensors").join("readings.csv"),
            log_dir: data.join("logs"),
        }
    }

    /// Resolves the tree from `$HOME`, falling back to the working directory.
    pub fn from_home() -> Self {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::under(home)
    }

    pub fn alert_log(&self) -> PathBuf {
        self.log_dir.join("alerts.log")
    }

    pub fn service_log(&self, service: &str) -> PathBuf {
        self.log_dir.join(format!("{}.log", service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_root() {
        let paths = LabPaths::under("/home/pi");
        assert_eq!(paths.config_file, PathBuf::from("/home/pi/lab-config.yaml"));
        assert_eq!(paths.camera_dir, PathBuf::from("/home/pi/lab-data/camera"));
        assert_eq!(
            paths.sensor_csv,
            PathBuf::from("/home/pi/lab-data/sensors/readings.csv")
        );
        assert_eq!(paths.alert_log(), PathBuf::from("/home/pi/lab-data/logs/alerts.log"));
        assert_eq!(
            paths.service_log("camera"),
            PathBuf::from("/home/pi/lab-data/logs/camera.log")
        );
    }
}
