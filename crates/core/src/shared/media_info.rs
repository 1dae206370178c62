use std::path::PathBuf;

/// Stream-level metadata for an opened video or image.
///
/// Images are represented as single-frame streams with `fps = 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: u64,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl MediaInfo {
    /// File name of the source, used as the face name in image mode.
    pub fn file_name(&self) -> Option<String> {
        self.source_path
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }
}
