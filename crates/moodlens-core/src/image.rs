//! Image sources — camera frames and user-selected files normalised into
//! one in-memory representation (a base64 data URI).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Media type assumed when a file arrives without a declared type.
pub const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// Where a captured image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrigin {
    Camera,
    File,
}

/// A normalised image held by the workflow.
///
/// The data URI doubles as the display representation handed to a
/// preview widget; the encoder parses it back into bytes on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedImage {
    data_uri: String,
    media_type: String,
    pub origin: ImageOrigin,
    pub captured_at: DateTime<Utc>,
}

impl CapturedImage {
    /// Wrap raw encoded image bytes. The bytes are not decoded.
    pub fn from_bytes(bytes: &[u8], media_type: &str, origin: ImageOrigin) -> Self {
        let media_type = normalize_media_type(media_type);
        Self {
            data_uri: format!("data:{media_type};base64,{}", STANDARD.encode(bytes)),
            media_type,
            origin,
            captured_at: Utc::now(),
        }
    }

    /// Adopt a data URI produced elsewhere (e.g. a browser screenshot).
    ///
    /// No validation happens here; a malformed URI is caught by the
    /// payload encoder.
    pub fn from_data_uri(data_uri: impl Into<String>, origin: ImageOrigin) -> Self {
        let data_uri = data_uri.into();
        let media_type = normalize_media_type(
            data_uri
                .strip_prefix("data:")
                .and_then(|rest| rest.split([';', ',']).next())
                .unwrap_or_default(),
        );
        Self {
            data_uri,
            media_type,
            origin,
            captured_at: Utc::now(),
        }
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }
}

/// Lowercased `type/subtype`, or [`DEFAULT_MEDIA_TYPE`] when the declared
/// value is not a plain media type token (parameters, separators, bare
/// subtypes like `jpeg`).
pub fn normalize_media_type(declared: &str) -> String {
    let declared = declared.trim();
    let is_token = |part: &str| {
        !part.is_empty()
            && part
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+".contains(&b))
    };
    match declared.split_once('/') {
        Some((kind, subtype)) if is_token(kind) && is_token(subtype) => declared.to_ascii_lowercase(),
        _ => DEFAULT_MEDIA_TYPE.to_string(),
    }
}

/// Camera collaborator: on/off control plus "current frame as an encoded
/// image".
///
/// Implementations own the device exclusively while enabled and must
/// release it on `disable`.
pub trait CameraSource {
    fn enable(&mut self);
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;
    /// Sample the current frame. `None` when the camera is off or unavailable.
    fn frame(&mut self) -> Option<CapturedImage>;
}

/// A file the user picked, before normalisation.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub bytes: Vec<u8>,
    /// Declared media type; empty when unknown.
    pub media_type: String,
}

/// File collaborator: "read the selected file". `None` when nothing was
/// selected.
pub trait FileSource {
    fn read_selected(&mut self) -> Option<SelectedFile>;
}

/// Sample the camera. Returns `None` (no state change) when the camera
/// is off or has no frame.
pub fn capture_from_camera<C: CameraSource + ?Sized>(camera: &mut C) -> Option<CapturedImage> {
    if !camera.is_enabled() {
        return None;
    }
    let image = camera.frame();
    if image.is_none() {
        tracing::debug!("camera produced no frame");
    }
    image
}

/// Wrap file contents as a captured image. Never fails; undecodable or
/// empty contents surface later.
pub fn capture_from_file(bytes: &[u8], declared_type: &str) -> CapturedImage {
    CapturedImage::from_bytes(bytes, declared_type, ImageOrigin::File)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCamera {
        on: bool,
        frame: Option<Vec<u8>>,
    }

    impl CameraSource for FixedCamera {
        fn enable(&mut self) {
            self.on = true;
        }
        fn disable(&mut self) {
            self.on = false;
        }
        fn is_enabled(&self) -> bool {
            self.on
        }
        fn frame(&mut self) -> Option<CapturedImage> {
            self.frame
                .as_deref()
                .map(|b| CapturedImage::from_bytes(b, "image/jpeg", ImageOrigin::Camera))
        }
    }

    #[test]
    fn test_from_bytes_builds_data_uri() {
        let img = CapturedImage::from_bytes(b"abc", "image/png", ImageOrigin::File);
        assert_eq!(img.data_uri(), "data:image/png;base64,YWJj");
        assert_eq!(img.media_type(), "image/png");
    }

    #[test]
    fn test_from_bytes_defaults_media_type() {
        let img = capture_from_file(b"\xff\xd8", "");
        assert_eq!(img.media_type(), DEFAULT_MEDIA_TYPE);
        assert!(img.data_uri().starts_with("data:image/jpeg;base64,"));
        assert_eq!(img.origin, ImageOrigin::File);
    }

    #[test]
    fn test_from_data_uri_extracts_media_type() {
        let img = CapturedImage::from_data_uri("data:image/webp;base64,AAAA", ImageOrigin::Camera);
        assert_eq!(img.media_type(), "image/webp");
    }

    #[test]
    fn test_from_data_uri_malformed_keeps_text() {
        let img = CapturedImage::from_data_uri("not a uri", ImageOrigin::File);
        assert_eq!(img.data_uri(), "not a uri");
        assert_eq!(img.media_type(), DEFAULT_MEDIA_TYPE);
    }

    #[test]
    fn test_declared_type_with_separators_falls_back() {
        let img = capture_from_file(b"\xff\xd8abc", "image/jpeg,x");
        assert_eq!(img.media_type(), DEFAULT_MEDIA_TYPE);
        assert!(img.data_uri().starts_with("data:image/jpeg;base64,"));

        let img = capture_from_file(b"\xff\xd8abc", "image/png; charset=x");
        assert_eq!(img.media_type(), DEFAULT_MEDIA_TYPE);
    }

    #[test]
    fn test_bare_subtype_falls_back() {
        assert_eq!(capture_from_file(b"\xff\xd8abc", "jpeg").media_type(), DEFAULT_MEDIA_TYPE);
        assert_eq!(normalize_media_type("image/"), DEFAULT_MEDIA_TYPE);
        assert_eq!(normalize_media_type(" Image/SVG+XML "), "image/svg+xml");
    }

    #[test]
    fn test_capture_from_camera_off_is_empty() {
        let mut cam = FixedCamera { on: false, frame: Some(vec![1, 2, 3]) };
        assert!(capture_from_camera(&mut cam).is_none());
    }

    #[test]
    fn test_capture_from_camera_unavailable_is_empty() {
        let mut cam = FixedCamera { on: true, frame: None };
        assert!(capture_from_camera(&mut cam).is_none());
    }

    #[test]
    fn test_capture_from_camera_live() {
        let mut cam = FixedCamera { on: true, frame: Some(vec![1, 2, 3]) };
        let img = capture_from_camera(&mut cam).unwrap();
        assert_eq!(img.origin, ImageOrigin::Camera);
    }
}
