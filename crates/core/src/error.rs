use std::path::PathBuf;

use thiserror::Error;

/// Top-level failure taxonomy for one processing job.
///
/// Per-detection failures never surface here: a frame or face that fails
/// inference is logged at `warn` level and skipped, and the job continues.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Unreadable or undecodable input media. Fatal.
    #[error("cannot open or decode media {path}: {reason}")]
    Media { path: PathBuf, reason: String },

    /// Invalid or incomplete configuration, rejected before any frame work.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An inference model could not be loaded.
    #[error("failed to load model {name}: {reason}")]
    ModelLoad { name: String, reason: String },

    /// A pipeline worker thread panicked.
    #[error("pipeline worker thread panicked")]
    Worker,

    /// Avatar encoding or persistence failed.
    #[error("failed to render avatar: {0}")]
    Avatar(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    pub fn media(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::Media {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn model_load(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::ModelLoad {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_media_error_message() {
        let err = ProcessError::media(Path::new("/tmp/clip.mp4"), "no video stream");
        assert_eq!(
            err.to_string(),
            "cannot open or decode media /tmp/clip.mp4: no video stream"
        );
    }

    #[test]
    fn test_config_error_message() {
        let err = ProcessError::Config("iou_threshold must be in (0, 1]".into());
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ProcessError = io.into();
        assert!(matches!(err, ProcessError::Io(_)));
    }
}
