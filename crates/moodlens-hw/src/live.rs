//! `CameraSource` implementation over a V4L2 device.

use crate::camera::{Camera, CameraError};
use moodlens_core::{CameraSource, CapturedImage, ImageOrigin};

/// Reads per capture before giving up on a dark scene.
const MAX_CAPTURE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// V4L2 device path.
    pub device_path: String,
    /// Frames discarded right after opening (auto-exposure stabilisation).
    pub warmup_frames: usize,
    /// JPEG quality for captured frames, 1–100.
    pub jpeg_quality: u8,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device_path: "/dev/video0".to_string(),
            warmup_frames: 4,
            jpeg_quality: 90,
        }
    }
}

/// Live camera that holds the device only while enabled.
///
/// Enabling never fails: if the device cannot be opened the camera is
/// "on but unavailable" and every capture yields `None`.
pub struct LiveCamera {
    settings: CameraSettings,
    enabled: bool,
    device: Option<Camera>,
}

impl LiveCamera {
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            settings,
            enabled: false,
            device: None,
        }
    }

    /// Whether the device is actually open.
    pub fn is_available(&self) -> bool {
        self.device.is_some()
    }

    fn open(&self) -> Result<Camera, CameraError> {
        let camera = Camera::open(&self.settings.device_path)?;
        camera.discard_frames(self.settings.warmup_frames)?;
        Ok(camera)
    }

    fn grab(camera: &Camera, quality: u8) -> Result<Vec<u8>, CameraError> {
        let frame = camera.capture_lit_frame(MAX_CAPTURE_ATTEMPTS)?;
        tracing::debug!(
            seq = frame.sequence,
            brightness = frame.avg_brightness(),
            "frame captured"
        );
        Ok(frame.encode_jpeg(quality)?)
    }
}

impl CameraSource for LiveCamera {
    fn enable(&mut self) {
        self.enabled = true;
        if self.device.is_some() {
            return;
        }
        match self.open() {
            Ok(camera) => self.device = Some(camera),
            Err(err) => tracing::warn!(
                device = %self.settings.device_path,
                error = %err,
                "camera unavailable; captures will be empty"
            ),
        }
    }

    fn disable(&mut self) {
        self.enabled = false;
        if self.device.take().is_some() {
            tracing::info!(device = %self.settings.device_path, "camera released");
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn frame(&mut self) -> Option<CapturedImage> {
        if !self.enabled {
            return None;
        }
        let camera = self.device.as_ref()?;
        match Self::grab(camera, self.settings.jpeg_quality) {
            Ok(jpeg) => Some(CapturedImage::from_bytes(&jpeg, "image/jpeg", ImageOrigin::Camera)),
            Err(err) => {
                tracing::warn!(device = %camera.device_path, error = %err, "capture failed");
                None
            }
        }
    }
}
