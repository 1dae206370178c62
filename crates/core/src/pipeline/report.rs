use serde::Serialize;

use crate::avatar::renderer::Avatar;
use crate::grouping::face_group::GroupMetrics;
use crate::shared::media_info::MediaInfo;

/// One face entry in the job result: a filtered group's representative in
/// video mode, or a single detection in image mode.
#[derive(Clone, Debug, Serialize)]
pub struct FaceRecord {
    /// `"<frame>_<group>"` in video mode, the source file name in image
    /// mode.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_size: Option<usize>,
    pub index: usize,
    pub bounding_box: [f32; 4],
    pub detector: f32,
    pub landmarker: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<GroupMetrics>,
    /// Handed to the storage collaborator, never serialized inline.
    #[serde(skip)]
    pub avatar: Option<Avatar>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MediaSummary {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: u64,
    pub codec: String,
}

impl From<&MediaInfo> for MediaSummary {
    fn from(info: &MediaInfo) -> Self {
        Self {
            width: info.width,
            height: info.height,
            fps: info.fps,
            total_frames: info.total_frames,
            codec: info.codec.clone(),
        }
    }
}

/// The job result handed back to the orchestration layer.
#[derive(Clone, Debug, Serialize)]
pub struct ProcessReport {
    /// True when the quality filter removed at least one group, so
    /// downstream consumers must re-sync any cached indices.
    pub is_change_index: bool,
    pub faces: Vec<FaceRecord>,
    pub processed_frames: u64,
    pub media: MediaSummary,
}
