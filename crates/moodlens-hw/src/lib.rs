//! moodlens-hw — Camera collaborator backed by V4L2.
//!
//! Opens the capture device while the camera is enabled, releases it when
//! disabled, and hands out frames as JPEG-encoded captured images.

pub mod camera;
pub mod frame;
pub mod live;

pub use camera::{Camera, CameraError, DeviceInfo};
pub use frame::{Frame, FrameError};
pub use live::{CameraSettings, LiveCamera};
