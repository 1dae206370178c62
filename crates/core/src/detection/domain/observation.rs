use crate::detection::domain::face::Face;
use crate::shared::bbox::{clamped_square, BoundingBox};
use crate::shared::frame::Frame;

/// Minimum crop side relative to the longer box side, so the retained
/// patch always covers the attribute model's 1.5x sampling window.
const MIN_PATCH_SCALE: f32 = 1.5;

/// Cropped frame region retained per observation.
///
/// Once the per-frame stage finishes, the decoded source frame is dropped;
/// the patch keeps just enough pixels for avatar rendering and attribute
/// estimation, which keeps memory bounded on long videos.
#[derive(Clone, Debug)]
pub struct FacePatch {
    pub pixels: Frame,
    /// Top-left corner of the patch in source-frame coordinates.
    pub origin: (u32, u32),
    pub frame_width: u32,
    pub frame_height: u32,
}

impl FacePatch {
    /// Extracts the square patch around `bbox` that later stages need.
    ///
    /// The side covers both the avatar square (`1 + 2 * avatar_padding`
    /// times the longer box side) and the attribute window, recentered at
    /// frame edges the same way the avatar crop is, so every later crop is
    /// a sub-rectangle of the patch.
    pub fn extract(frame: &Frame, bbox: &BoundingBox, avatar_padding: f32) -> FacePatch {
        let long_side = bbox.width().max(bbox.height()).max(1.0);
        let scale = (1.0 + 2.0 * avatar_padding).max(MIN_PATCH_SCALE);
        let (cx, cy) = bbox.center();
        let (x, y, side) =
            clamped_square(cx, cy, long_side * scale, frame.width(), frame.height());

        FacePatch {
            pixels: frame.crop(x, y, side, side),
            origin: (x, y),
            frame_width: frame.width(),
            frame_height: frame.height(),
        }
    }

    /// Translates a frame-space box into patch-local coordinates.
    pub fn local_bbox(&self, bbox: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            bbox.x1 - self.origin.0 as f32,
            bbox.y1 - self.origin.1 as f32,
            bbox.x2 - self.origin.0 as f32,
            bbox.y2 - self.origin.1 as f32,
        )
    }
}

/// A detected face tied to the frame it came from.
#[derive(Clone, Debug)]
pub struct FaceObservation {
    pub face: Face,
    pub frame_number: u64,
    /// Stable left-to-right position within the frame, by ascending box x1.
    pub index: usize,
    /// Blended capture-quality heuristic in [0, 1].
    pub quality: f32,
    pub patch: FacePatch,
}

impl FaceObservation {
    /// The representative-selection score: detector and landmarker
    /// confidence blended with the capture-quality heuristic.
    pub fn representative_score(&self) -> f32 {
        0.4 * self.face.detector_score + 0.3 * self.face.landmarker_score + 0.3 * self.quality
    }
}

/// Capture-quality heuristic for a detection, in [0, 1].
///
/// Blends brightness-centeredness (well-exposed faces score high), local
/// contrast, and the box-area-to-frame ratio.
pub fn heuristic_quality(frame: &Frame, bbox: &BoundingBox) -> f32 {
    let (mean, std) = frame.luma_stats(
        bbox.x1.max(0.0) as u32,
        bbox.y1.max(0.0) as u32,
        bbox.x2.max(0.0) as u32,
        bbox.y2.max(0.0) as u32,
    );

    let brightness = 1.0 - ((mean - 128.0).abs() / 128.0).min(1.0);
    let contrast = (std / 64.0).min(1.0);

    let frame_area = (frame.width() * frame.height()) as f32;
    let area_ratio = if frame_area > 0.0 {
        bbox.area() / frame_area
    } else {
        0.0
    };
    let size = (area_ratio * 20.0).min(1.0);

    (brightness + contrast + size) / 3.0
}
