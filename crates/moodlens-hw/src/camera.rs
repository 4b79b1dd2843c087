//! V4L2 webcam capture via the `v4l` crate.
//!
//! Only YUYV is negotiated; the luma plane is all the service needs.

use crate::frame::{self, Frame};
use std::path::Path;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::capability::Flags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

/// Requested capture size; the driver may negotiate something else.
const REQUESTED_WIDTH: u32 = 640;
const REQUESTED_HEIGHT: u32 = 480;
const DARK_THRESHOLD: f32 = 0.95;
const STREAM_BUFFERS: u32 = 4;
const MAX_VIDEO_NODES: usize = 16;
/// errno for a device already opened exclusively by another process.
const EBUSY: i32 = 16;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("{0} is not a video capture device")]
    NotCaptureDevice(String),
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("only dark frames after {0} attempts")]
    OnlyDarkFrames(usize),
    #[error("frame error: {0}")]
    Frame(#[from] frame::FrameError),
}

/// A V4L2 node that can capture video.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// Open webcam streaming YUYV. The device is closed when this is dropped.
pub struct Camera {
    device: Device,
    pub width: u32,
    pub height: u32,
    pub device_path: String,
}

impl Camera {
    /// Open a webcam by path (e.g. "/dev/video0") and negotiate YUYV.
    pub fn open(device_path: &str) -> Result<Self, CameraError> {
        if !Path::new(device_path).exists() {
            return Err(CameraError::DeviceNotFound(device_path.to_string()));
        }

        let device = Device::with_path(device_path).map_err(|e| match e.raw_os_error() {
            Some(EBUSY) => CameraError::DeviceBusy,
            _ => CameraError::DeviceNotFound(format!("{device_path}: {e}")),
        })?;

        let caps = device
            .query_caps()
            .map_err(|e| CameraError::CaptureFailed(format!("query capabilities: {e}")))?;
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            return Err(CameraError::NotCaptureDevice(device_path.to_string()));
        }

        let mut requested = device
            .format()
            .map_err(|e| CameraError::FormatNegotiationFailed(format!("read format: {e}")))?;
        requested.fourcc = FourCC::new(b"YUYV");
        requested.width = REQUESTED_WIDTH;
        requested.height = REQUESTED_HEIGHT;

        let negotiated = device
            .set_format(&requested)
            .map_err(|e| CameraError::FormatNegotiationFailed(format!("set format: {e}")))?;
        if negotiated.fourcc != FourCC::new(b"YUYV") {
            return Err(CameraError::FormatNegotiationFailed(format!(
                "driver offered {:?}, need YUYV",
                negotiated.fourcc
            )));
        }

        tracing::info!(
            device = device_path,
            card = %caps.card,
            width = negotiated.width,
            height = negotiated.height,
            "camera opened"
        );

        Ok(Self {
            device,
            width: negotiated.width,
            height: negotiated.height,
            device_path: device_path.to_string(),
        })
    }

    /// Read and drop `count` frames so auto-exposure can settle.
    pub fn discard_frames(&self, count: usize) -> Result<(), CameraError> {
        if count == 0 {
            return Ok(());
        }
        let mut stream = self.stream()?;
        for _ in 0..count {
            stream
                .next()
                .map_err(|e| CameraError::CaptureFailed(format!("dequeue buffer: {e}")))?;
        }
        tracing::debug!(count, "discarded warmup frames");
        Ok(())
    }

    /// Capture the first non-dark frame within `max_attempts` reads.
    pub fn capture_lit_frame(&self, max_attempts: usize) -> Result<Frame, CameraError> {
        let attempts = max_attempts.max(1);
        let mut stream = self.stream()?;

        for _ in 0..attempts {
            let (buf, meta) = stream
                .next()
                .map_err(|e| CameraError::CaptureFailed(format!("dequeue buffer: {e}")))?;

            let gray = frame::yuyv_to_grayscale(buf, self.width, self.height)?;
            if frame::is_dark_frame(&gray, DARK_THRESHOLD) {
                tracing::debug!(seq = meta.sequence, "skipping dark frame");
                continue;
            }
            return Ok(Frame {
                data: gray,
                width: self.width,
                height: self.height,
                sequence: meta.sequence,
            });
        }

        Err(CameraError::OnlyDarkFrames(attempts))
    }

    fn stream(&self) -> Result<MmapStream<'_>, CameraError> {
        MmapStream::with_buffers(&self.device, BufType::VideoCapture, STREAM_BUFFERS)
            .map_err(|e| CameraError::CaptureFailed(format!("create mmap stream: {e}")))
    }

    /// Video capture nodes among `/dev/video0` .. `/dev/video15`.
    pub fn list_devices() -> Vec<DeviceInfo> {
        (0..MAX_VIDEO_NODES)
            .map(|i| format!("/dev/video{i}"))
            .filter(|path| Path::new(path).exists())
            .filter_map(|path| {
                let caps = Device::with_path(&path).ok()?.query_caps().ok()?;
                caps.capabilities
                    .contains(Flags::VIDEO_CAPTURE)
                    .then(|| DeviceInfo {
                        path,
                        name: caps.card,
                        driver: caps.driver,
                        bus: caps.bus,
                    })
            })
            .collect()
    }
}
