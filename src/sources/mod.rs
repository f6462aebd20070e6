// * Data sources for the pollers: USB camera frames and EZO sensor values

pub mod camera;
pub mod sensor;

pub use camera::{CaptureError, FrameSource, UsbCamera};
pub use sensor::{Channel, EzoBus, SensorError, SensorSource};
