//! Payload encoder — turns a captured image into the multipart file part.

use crate::error::EncodingError;
use crate::image::{normalize_media_type, CapturedImage};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// File name sent with every upload; the service ignores it.
pub const UPLOAD_FILENAME: &str = "image.jpg";

/// Upload-ready encoding of a captured image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
}

/// Decode the image's data URI into raw bytes.
///
/// Pure and deterministic. This is the only place a structurally invalid
/// image is caught; zero-length images are rejected so no request is
/// ever sent for them.
pub fn to_upload_payload(image: &CapturedImage) -> Result<UploadPayload, EncodingError> {
    let uri = image.data_uri();
    let rest = uri.strip_prefix("data:").ok_or_else(|| {
        EncodingError::NotDataUri(uri.chars().take(16).collect())
    })?;
    let (header, data) = rest.split_once(',').ok_or(EncodingError::MissingSeparator)?;

    let mut params = header.split(';');
    let media_type = normalize_media_type(params.next().unwrap_or_default());
    if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(EncodingError::NotBase64);
    }

    let bytes = STANDARD
        .decode(data)
        .map_err(|e| EncodingError::InvalidBase64(e.to_string()))?;
    if bytes.is_empty() {
        return Err(EncodingError::Empty);
    }

    Ok(UploadPayload {
        bytes,
        mime_type: media_type,
        filename: UPLOAD_FILENAME.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{capture_from_file, ImageOrigin, DEFAULT_MEDIA_TYPE};

    #[test]
    fn test_payload_recovers_original_bytes() {
        let original: Vec<u8> = (0..=255).collect();
        let img = capture_from_file(&original, "image/png");
        let payload = to_upload_payload(&img).unwrap();
        assert_eq!(payload.bytes, original);
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.filename, UPLOAD_FILENAME);
    }

    #[test]
    fn test_payload_is_deterministic() {
        let img = capture_from_file(b"\xff\xd8\xff\xe0jpeg", "image/jpeg");
        assert_eq!(to_upload_payload(&img).unwrap(), to_upload_payload(&img).unwrap());
    }

    #[test]
    fn test_empty_file_is_encoding_error() {
        let img = capture_from_file(&[], "image/jpeg");
        assert_eq!(to_upload_payload(&img), Err(EncodingError::Empty));
    }

    #[test]
    fn test_not_a_data_uri() {
        let img = CapturedImage::from_data_uri("http://example.com/a.jpg", ImageOrigin::File);
        assert!(matches!(to_upload_payload(&img), Err(EncodingError::NotDataUri(_))));
    }

    #[test]
    fn test_missing_separator() {
        let img = CapturedImage::from_data_uri("data:image/jpeg;base64", ImageOrigin::File);
        assert_eq!(to_upload_payload(&img), Err(EncodingError::MissingSeparator));
    }

    #[test]
    fn test_non_base64_uri() {
        let img = CapturedImage::from_data_uri("data:text/plain,hello", ImageOrigin::File);
        assert_eq!(to_upload_payload(&img), Err(EncodingError::NotBase64));
    }

    #[test]
    fn test_invalid_base64() {
        let img = CapturedImage::from_data_uri("data:image/jpeg;base64,@@@@", ImageOrigin::Camera);
        assert!(matches!(to_upload_payload(&img), Err(EncodingError::InvalidBase64(_))));
    }

    #[test]
    fn test_missing_media_type_defaults_to_jpeg() {
        let img = CapturedImage::from_data_uri("data:;base64,YWJj", ImageOrigin::Camera);
        let payload = to_upload_payload(&img).unwrap();
        assert_eq!(payload.mime_type, DEFAULT_MEDIA_TYPE);
        assert_eq!(payload.bytes, b"abc");
    }

    #[test]
    fn test_odd_declared_types_still_recover_bytes() {
        for declared in ["jpeg", "image/jpeg,x", "image/png;q=1"] {
            let img = capture_from_file(b"\xff\xd8abc", declared);
            let payload = to_upload_payload(&img).unwrap();
            assert_eq!(payload.bytes, b"\xff\xd8abc");
            assert_eq!(payload.mime_type, DEFAULT_MEDIA_TYPE);
        }
    }

    #[test]
    fn test_foreign_uri_with_bare_subtype_gets_default_type() {
        let img = CapturedImage::from_data_uri("data:jpeg;base64,YWJj", ImageOrigin::Camera);
        assert_eq!(to_upload_payload(&img).unwrap().mime_type, DEFAULT_MEDIA_TYPE);
    }
}
