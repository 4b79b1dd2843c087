//! moodlens-core — Capture, submit and render workflow for a remote
//! emotion-inference service.
//!
//! The workflow state machine owns the session; encoding and result
//! parsing are pure adapters, and the network call sits behind the
//! injectable [`Analyzer`] capability.

pub mod client;
pub mod error;
pub mod image;
pub mod payload;
pub mod result;
pub mod workflow;

pub use client::{Analyzer, ClientConfig, HttpAnalysisClient, DEFAULT_BASE_URL};
pub use error::{AnalysisError, EncodingError, ErrorInfo};
pub use image::{CameraSource, CapturedImage, FileSource, ImageOrigin, SelectedFile};
pub use payload::{to_upload_payload, UploadPayload};
pub use result::{AnalysisResult, ChartPoint, ChartSeries, DistributionOrder};
pub use workflow::{Dispatch, Ignored, Transition, Workflow, WorkflowState};
