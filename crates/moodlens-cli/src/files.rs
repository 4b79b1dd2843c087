//! File collaborator backed by a path given on the command line.

use moodlens_core::image::DEFAULT_MEDIA_TYPE;
use moodlens_core::{FileSource, SelectedFile};
use std::path::Path;

/// A file read once from disk and handed to the workflow on request.
pub struct PathFile {
    selected: Option<SelectedFile>,
}

impl PathFile {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "file read");
        Ok(Self {
            selected: Some(SelectedFile {
                bytes,
                media_type: media_type_for(path).to_string(),
            }),
        })
    }
}

impl FileSource for PathFile {
    fn read_selected(&mut self) -> Option<SelectedFile> {
        self.selected.take()
    }
}

/// Media type declared for a file, from its extension.
pub fn media_type_for(path: &Path) -> &'static str {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or(DEFAULT_MEDIA_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_for_extension() {
        assert_eq!(media_type_for(Path::new("face.png")), "image/png");
        assert_eq!(media_type_for(Path::new("face.JPG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("face")), DEFAULT_MEDIA_TYPE);
    }

    #[test]
    fn test_path_file_yields_once() {
        let path = std::env::temp_dir().join(format!("moodlens-test-{}.png", std::process::id()));
        std::fs::write(&path, b"\x89PNG").unwrap();

        let mut file = PathFile::open(&path).unwrap();
        let selected = file.read_selected().unwrap();
        assert_eq!(selected.bytes, b"\x89PNG");
        assert_eq!(selected.media_type, "image/png");
        assert!(file.read_selected().is_none());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(PathFile::open(Path::new("/nonexistent/moodlens/face.jpg")).is_err());
    }
}
