//! Workflow state machine — the one owner of mutable session state.
//!
//! Sequences capture, encoding, submission and result parsing under a
//! single set of UI states. Every failure from the analysis path is caught
//! here and turned into `Failed` with an [`ErrorInfo`]; nothing propagates
//! to the host.

use crate::client::Analyzer;
use crate::error::{AnalysisError, ErrorInfo};
use crate::image::{capture_from_file, CameraSource, CapturedImage, FileSource, SelectedFile};
use crate::payload::{to_upload_payload, UploadPayload};
use crate::result::{AnalysisResult, DistributionOrder};
use serde::Serialize;

/// State exposed to the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkflowState {
    CameraLive,
    CameraOff,
    ImageReady,
    Analyzing,
    ResultReady,
    Failed,
}

/// Why an action left the workflow untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    CameraOff,
    NoFrame,
    NoImage,
    NothingSelected,
    AnalysisInFlight,
    NotAnalyzing,
    NoError,
}

/// Outcome of a workflow action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The action was applied; carries the resulting state.
    Applied(WorkflowState),
    Ignored(Ignored),
}

/// Result of [`Workflow::begin_analysis`].
#[derive(Debug)]
pub enum Dispatch {
    /// Now `Analyzing`; the payload must be submitted and the outcome fed
    /// back through [`Workflow::finish_analysis`].
    Submit(UploadPayload),
    /// Nothing to submit: the action was ignored, or encoding failed.
    Settled(Transition),
}

/// Image-related phase. `Idle` maps to `CameraLive`/`CameraOff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    ImageReady,
    Analyzing,
    ResultReady,
    Failed,
}

pub struct Workflow<C, A> {
    camera: C,
    analyzer: A,
    order: DistributionOrder,
    phase: Phase,
    image: Option<CapturedImage>,
    result: Option<AnalysisResult>,
    error: Option<ErrorInfo>,
}

impl<C: CameraSource, A: Analyzer> Workflow<C, A> {
    /// Start a session. The camera defaults to on.
    pub fn new(mut camera: C, analyzer: A) -> Self {
        if !camera.is_enabled() {
            camera.enable();
        }
        Self {
            camera,
            analyzer,
            order: DistributionOrder::default(),
            phase: Phase::Idle,
            image: None,
            result: None,
            error: None,
        }
    }

    pub fn with_order(mut self, order: DistributionOrder) -> Self {
        self.order = order;
        self
    }

    pub fn state(&self) -> WorkflowState {
        match self.phase {
            Phase::Idle if self.camera.is_enabled() => WorkflowState::CameraLive,
            Phase::Idle => WorkflowState::CameraOff,
            Phase::ImageReady => WorkflowState::ImageReady,
            Phase::Analyzing => WorkflowState::Analyzing,
            Phase::ResultReady => WorkflowState::ResultReady,
            Phase::Failed => WorkflowState::Failed,
        }
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    pub fn enable_camera(&mut self) -> Transition {
        if !self.camera.is_enabled() {
            self.camera.enable();
            tracing::debug!(state = ?self.state(), "camera enabled");
        }
        Transition::Applied(self.state())
    }

    /// Turn the camera off. A held image is kept.
    pub fn disable_camera(&mut self) -> Transition {
        if self.camera.is_enabled() {
            self.camera.disable();
            tracing::debug!(state = ?self.state(), "camera disabled");
        }
        Transition::Applied(self.state())
    }

    /// Freeze the current camera frame. No-op when the camera is off.
    pub fn capture(&mut self) -> Transition {
        if self.phase == Phase::Analyzing {
            return self.ignore("capture", Ignored::AnalysisInFlight);
        }
        if !self.camera.is_enabled() {
            return self.ignore("capture", Ignored::CameraOff);
        }
        match crate::image::capture_from_camera(&mut self.camera) {
            Some(image) => self.hold(image),
            None => self.ignore("capture", Ignored::NoFrame),
        }
    }

    /// Replace whatever is held with the contents of a file.
    pub fn upload(&mut self, file: SelectedFile) -> Transition {
        if self.phase == Phase::Analyzing {
            return self.ignore("upload", Ignored::AnalysisInFlight);
        }
        let image = capture_from_file(&file.bytes, &file.media_type);
        self.hold(image)
    }

    pub fn upload_from<F: FileSource + ?Sized>(&mut self, files: &mut F) -> Transition {
        match files.read_selected() {
            Some(file) => self.upload(file),
            None => self.ignore("upload", Ignored::NothingSelected),
        }
    }

    /// Enter `Analyzing` and hand back the payload to submit.
    ///
    /// Allowed from `ImageReady`, `Failed` (retry with the same image) and
    /// `ResultReady`. Any previous result is dropped first. An image that
    /// cannot be encoded moves straight to `Failed` without a request.
    pub fn begin_analysis(&mut self) -> Dispatch {
        if self.phase == Phase::Analyzing {
            return Dispatch::Settled(self.ignore("analyze", Ignored::AnalysisInFlight));
        }
        let Some(image) = self.image.as_ref() else {
            return Dispatch::Settled(self.ignore("analyze", Ignored::NoImage));
        };
        let encoded = to_upload_payload(image);

        self.result = None;
        self.error = None;
        match encoded {
            Ok(payload) => {
                self.set_phase(Phase::Analyzing);
                Dispatch::Submit(payload)
            }
            Err(err) => Dispatch::Settled(self.fail(err.into())),
        }
    }

    /// Apply the outcome of a submission started by [`begin_analysis`](Self::begin_analysis).
    pub fn finish_analysis(&mut self, outcome: Result<String, AnalysisError>) -> Transition {
        if self.phase != Phase::Analyzing {
            tracing::warn!(state = ?self.state(), "analysis outcome arrived outside Analyzing; dropped");
            return Transition::Ignored(Ignored::NotAnalyzing);
        }

        match outcome.and_then(|raw| AnalysisResult::parse(&raw, self.order)) {
            Ok(result) => {
                tracing::info!(headline = %result.headline(), "analysis complete");
                self.result = Some(result);
                self.error = None;
                self.set_phase(Phase::ResultReady);
                Transition::Applied(self.state())
            }
            Err(err) => self.fail(err),
        }
    }

    /// Encode, submit and apply the outcome in one step.
    pub async fn analyze(&mut self) -> Transition {
        let payload = match self.begin_analysis() {
            Dispatch::Submit(payload) => payload,
            Dispatch::Settled(transition) => return transition,
        };
        let outcome = self.analyzer.submit(payload).await;
        self.finish_analysis(outcome)
    }

    /// Dismiss the error banner. The image stays, ready for another try.
    pub fn dismiss_error(&mut self) -> Transition {
        if self.phase != Phase::Failed {
            return self.ignore("dismiss_error", Ignored::NoError);
        }
        self.error = None;
        self.set_phase(Phase::ImageReady);
        Transition::Applied(self.state())
    }

    /// Drop the image, result and error.
    pub fn reset(&mut self) -> Transition {
        if self.phase == Phase::Analyzing {
            return self.ignore("reset", Ignored::AnalysisInFlight);
        }
        self.image = None;
        self.result = None;
        self.error = None;
        self.set_phase(Phase::Idle);
        Transition::Applied(self.state())
    }

    fn hold(&mut self, image: CapturedImage) -> Transition {
        tracing::debug!(origin = ?image.origin, media_type = image.media_type(), "image held");
        self.image = Some(image);
        self.result = None;
        self.error = None;
        self.set_phase(Phase::ImageReady);
        Transition::Applied(self.state())
    }

    fn fail(&mut self, err: AnalysisError) -> Transition {
        match &err {
            AnalysisError::ConcurrentRequest => {
                tracing::error!(error = %err, "overlapping analysis request reached the workflow");
            }
            AnalysisError::MalformedResponse(_) => {
                tracing::warn!(error = %err, "service response does not match the expected shape");
            }
            _ => tracing::warn!(error = %err, "analysis failed"),
        }
        self.result = None;
        self.error = Some(ErrorInfo::from(err));
        self.set_phase(Phase::Failed);
        Transition::Applied(self.state())
    }

    fn ignore(&self, action: &str, reason: Ignored) -> Transition {
        tracing::debug!(action, ?reason, state = ?self.state(), "action ignored");
        Transition::Ignored(reason)
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            tracing::debug!(from = ?self.phase, to = ?phase, "workflow transition");
        }
        self.phase = phase;
    }
}
