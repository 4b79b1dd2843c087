use moodlens_core::{ClientConfig, DistributionOrder, DEFAULT_BASE_URL};
use moodlens_hw::CameraSettings;
use std::str::FromStr;
use std::time::Duration;

/// CLI configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Inference service base URL (default: http://localhost:8000).
    pub api_url: String,
    /// Transport timeout in seconds for one analysis request.
    pub timeout_secs: u64,
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Frames to discard after opening the camera (AGC/AE stabilisation).
    pub warmup_frames: usize,
    /// JPEG quality for camera captures.
    pub jpeg_quality: u8,
    /// Presentation order of the confidence distribution.
    pub distribution_order: DistributionOrder,
}

impl Config {
    /// Load configuration from `MOODLENS_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_url: lookup("MOODLENS_API_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs: parse_or(&lookup, "MOODLENS_TIMEOUT_SECS", 30),
            camera_device: lookup("MOODLENS_CAMERA_DEVICE")
                .unwrap_or_else(|| "/dev/video0".to_string()),
            warmup_frames: parse_or(&lookup, "MOODLENS_WARMUP_FRAMES", 4),
            jpeg_quality: parse_or(&lookup, "MOODLENS_JPEG_QUALITY", 90u8).clamp(1, 100),
            distribution_order: parse_or(
                &lookup,
                "MOODLENS_DISTRIBUTION_ORDER",
                DistributionOrder::Label,
            ),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            device_path: self.camera_device.clone(),
            warmup_frames: self.warmup_frames,
            jpeg_quality: self.jpeg_quality,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
