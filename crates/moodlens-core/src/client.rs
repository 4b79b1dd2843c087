//! Analysis client — the request lifecycle against the inference service.
//!
//! At most one submission may be outstanding per client; a second call
//! while one is in flight is rejected rather than queued. No retries are
//! performed here.

use crate::error::{AnalysisError, EncodingError};
use crate::payload::UploadPayload;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
/// Transport timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_ERROR_BODY: usize = 200;

/// Submits an upload payload and returns the raw response body.
///
/// Parsing the body is the result adapter's job.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn submit(&self, payload: UploadPayload) -> Result<String, AnalysisError>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    message: String,
}

/// HTTP client for `POST {base_url}/predict`.
pub struct HttpAnalysisClient {
    http: reqwest::Client,
    base_url: String,
    in_flight: AtomicBool,
}

impl HttpAnalysisClient {
    pub fn new(config: ClientConfig) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a submission is currently outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Query the service root (`GET {base_url}/`) and return its banner message.
    pub async fn status(&self) -> Result<String, AnalysisError> {
        let url = self.endpoint("");
        let response = self.http.get(&url).send().await.map_err(transport_error)?;
        let response = check_status(response).await?;
        let body = response.text().await.map_err(transport_error)?;
        let status: StatusResponse = serde_json::from_str(&body)
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;
        Ok(status.message)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[async_trait]
impl Analyzer for HttpAnalysisClient {
    async fn submit(&self, payload: UploadPayload) -> Result<String, AnalysisError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(AnalysisError::ConcurrentRequest)?;

        let url = self.endpoint("predict");
        tracing::info!(
            url = %url,
            bytes = payload.bytes.len(),
            mime = %payload.mime_type,
            "dispatching analysis request"
        );

        // Nothing has been sent yet; a rejected type is a local fault.
        let part = Part::bytes(payload.bytes)
            .file_name(payload.filename)
            .mime_str(&payload.mime_type)
            .map_err(|_| EncodingError::InvalidMediaType(payload.mime_type.clone()))?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;

        response.text().await.map_err(transport_error)
    }
}

/// Turns a non-2xx response into `AnalysisError::Service`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AnalysisError> {
    let status = response.status();
    tracing::info!(status = status.as_u16(), url = %response.url(), "response received");
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body.chars().take(MAX_ERROR_BODY).collect()
    };
    Err(AnalysisError::Service {
        status_code: Some(status.as_u16()),
        message,
    })
}

fn transport_error(err: reqwest::Error) -> AnalysisError {
    let message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("service unreachable: {err}")
    } else {
        err.to_string()
    };
    AnalysisError::Service {
        status_code: err.status().map(|s| s.as_u16()),
        message,
    }
}

/// Holds the in-flight flag; released on drop, including when the
/// request future is dropped mid-flight.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
