use crate::detection::domain::face::AttributeReading;
use crate::detection::domain::observation::FaceObservation;
use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Thresholds the per-frame stage needs, snapshotted from the job config.
#[derive(Clone, Copy, Debug)]
pub struct AnalysisParams {
    pub detector_score_threshold: f32,
    pub landmarker_score_threshold: f32,
    pub iou_threshold: f32,
    /// Avatar padding fraction, used to size the retained face patch.
    pub avatar_padding: f32,
}

/// Per-frame inference seam: detect faces, refine landmarks, embed.
///
/// Implementations must be shareable across worker threads; sessions are
/// loaded once and used read-only.
pub trait FrameAnalyzer: Sync {
    /// All surviving observations for one frame, ordered left to right.
    ///
    /// A per-face inference failure inside the implementation degrades
    /// that face (or drops it) rather than failing the frame; an `Err`
    /// here means the whole frame produced nothing usable.
    fn analyze(
        &self,
        frame: &Frame,
        params: &AnalysisParams,
    ) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error>>;
}

/// Gender/age estimation seam, run on representatives only in video mode.
pub trait AttributeEstimator: Sync {
    /// `frame` may be a retained patch; `bbox` is in that frame's
    /// coordinates.
    fn estimate(
        &self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<AttributeReading, Box<dyn std::error::Error>>;
}
