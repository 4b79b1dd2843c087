//! Error taxonomy for the analysis workflow.

use thiserror::Error;

/// A captured image whose representation cannot be turned into raw bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("not a data URI: {0}")]
    NotDataUri(String),
    #[error("data URI has no payload separator")]
    MissingSeparator,
    #[error("data URI is not base64-encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
    #[error("image contains no bytes")]
    Empty,
    #[error("unusable media type: {0}")]
    InvalidMediaType(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
    #[error("an analysis request is already in flight")]
    ConcurrentRequest,
    #[error("service error{}: {message}", http_status(.status_code))]
    Service {
        status_code: Option<u16>,
        message: String,
    },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

fn http_status(code: &Option<u16>) -> String {
    code.map(|c| format!(" (HTTP {c})")).unwrap_or_default()
}

impl AnalysisError {
    /// Whether retrying with the same captured image can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::Service { .. } | AnalysisError::MalformedResponse(_)
        )
    }

    /// Message suitable for the error banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::Encoding(_) => {
                "The selected image could not be read. Please capture or upload another image."
            }
            AnalysisError::ConcurrentRequest => "An analysis is already running.",
            AnalysisError::Service { .. } => "Error analyzing image. Please try again.",
            AnalysisError::MalformedResponse(_) => {
                "The analysis service returned an unexpected response. Please try again."
            }
        }
    }
}

/// Error shown to the user while the workflow is in `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorInfo {
    pub message: String,
    pub cause: AnalysisError,
}

impl From<AnalysisError> for ErrorInfo {
    fn from(cause: AnalysisError) -> Self {
        Self {
            message: cause.user_message().to_string(),
            cause,
        }
    }
}
