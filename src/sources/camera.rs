// * Camera Source - one JPEG frame per call from a USB camera
// * The device is opened and released on every capture

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

// * JPEG quality for stored frames
const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Camera support not built in (enable the `camera` feature)")]
    Unsupported,

    #[error("Cannot open camera at {device}: {reason}")]
    Open { device: String, reason: String },

    #[error("Failed to capture frame: {0}")]
    Grab(String),

    #[error("Failed to encode frame as JPEG: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Frame buffer size {got} does not match {width}x{height} RGB")]
    BadBuffer { width: u32, height: u32, got: usize },
}

/// Anything that can hand back one encoded frame.
pub trait FrameSource: Send + 'static {
    fn capture(&mut self) -> Result<Vec<u8>, CaptureError>;
}

/// Maps `/dev/videoN` (or a bare `N`) to a device index; anything else is 0.
pub fn device_index(device: &str) -> u32 {
    device
        .trim()
        .strip_prefix("/dev/video")
        .unwrap_or(device.trim())
        .parse()
        .unwrap_or(0)
}

/// JPEG-encodes a packed RGB8 buffer.
pub fn encode_jpeg(width: u32, height: u32, rgb: &[u8]) -> Result<Vec<u8>, CaptureError> {
    let expected = width as usize * height as usize * 3;
    if rgb.len() != expected || expected == 0 {
        return Err(CaptureError::BadBuffer {
            width,
            height,
            got: rgb.len(),
        });
    }

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).write_image(
        rgb,
        width,
        height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

/// USB camera addressed by a device path such as `/dev/video0`.
#[derive(Debug, Clone)]
pub struct UsbCamera {
    device: String,
    index: u32,
}

impl UsbCamera {
    pub fn new(device: impl Into<String>) -> Self {
        let device = device.into();
        let index = device_index(&device);
        Self { device, index }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

#[cfg(feature = "camera")]
impl FrameSource for UsbCamera {
    fn capture(&mut self) -> Result<Vec<u8>, CaptureError> {
        use nokhwa::pixel_format::RgbFormat;
        use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
        use nokhwa::Camera;

        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
        let mut camera = Camera::new(CameraIndex::Index(self.index), requested).map_err(|e| {
            CaptureError::Open {
                device: self.device.clone(),
                reason: e.to_string(),
            }
        })?;
        camera.open_stream().map_err(|e| CaptureError::Open {
            device: self.device.clone(),
            reason: e.to_string(),
        })?;

        let grabbed = camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>());
        // * Release the device before encoding, success or not
        let _ = camera.stop_stream();
        drop(camera);

        let decoded = grabbed.map_err(|e| CaptureError::Grab(e.to_string()))?;
        let (width, height) = decoded.dimensions();
        encode_jpeg(width, height, decoded.as_raw())
    }
}

#[cfg(not(feature = "camera"))]
impl FrameSource for UsbCamera {
    fn capture(&mut self) -> Result<Vec<u8>, CaptureError> {
        Err(CaptureError::Unsupported)
    }
}
