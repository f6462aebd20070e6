// * Configuration Constants
// * Central location for fixed ports, addresses, timeouts and simulated ranges

use std::time::Duration;

// * Local Query Service port
pub const BRIDGE_PORT: u16 = 5555;

// * Default collector address (host:port)
pub const DEFAULT_SERVER: &str = "192.168.1.100:8000";

// * Source tag sent with alert batches
pub const SENSOR_ALERT_SOURCE: &str = "lab-pi-sensors";

// * Outbound timeouts
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(10);
pub const ALERT_TIMEOUT: Duration = Duration::from_secs(5);

// * Service manager probe timeout
pub const SERVICE_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// * I2C bus index on the Pi header (/dev/i2c-1)
pub const I2C_BUS: u8 = 1;

// * Atlas Scientific EZO default addresses
pub const PH_I2C_ADDR: u8 = 0x63;
pub const TEMP_I2C_ADDR: u8 = 0x66;

// * EZO boards need about a second between command and response
pub const EZO_RESPONSE_DELAY: Duration = Duration::from_secs(1);

// * Simulated value ranges
pub const SIM_PH_RANGE: (f64, f64) = (6.5, 7.5);
pub const SIM_TEMP_RANGE: (f64, f64) = (22.0, 26.0);

// * Reading log header
pub const CSV_HEADER: [&str; 3] = ["timestamp", "ph", "temp_c"];

// * Frame filename timestamp format (whole seconds)
pub const FRAME_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const FRAME_EXTENSION: &str = "jpg";

// * ISO-8601 local timestamp with microseconds
pub const ISO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

// * Peer units reported by /status (the bridge itself is always live)
pub const BRIDGE_SERVICE: &str = "lab-bridge";
pub const PEER_SERVICES: [&str; 3] = ["lab-camera", "lab-sensors", "lab-zeroclaw"];

// * Default lookback for /sensors/history
pub const DEFAULT_HISTORY_HOURS: i64 = 24;
