use crate::detection::domain::alignment::Point;
use crate::shared::bbox::BoundingBox;

/// Canonical 68-point indices used when summarizing to 5 points.
pub const NOSE_TIP_68: usize = 30;
pub const MOUTH_LEFT_68: usize = 48;
pub const MOUTH_RIGHT_68: usize = 54;
const LEFT_EYE_68: std::ops::Range<usize> = 36..42;
const RIGHT_EYE_68: std::ops::Range<usize> = 42..48;

/// The landmark coordinate sets carried per detection, keyed the way the
/// result contract names them.
#[derive(Clone, Debug)]
pub struct LandmarkSet {
    /// `"5"` — the detector's native 5-point landmark.
    pub five: [Point; 5],
    /// `"5/68"` — 5-point summary re-derived from the refined 68-point
    /// result; present only when the landmarker was confident enough.
    pub five_from_68: Option<[Point; 5]>,
    /// `"68"` — the landmarker's 68-point output (may be low-confidence).
    pub sixty_eight: Option<[Point; 68]>,
    /// `"68/5"` — 68-point placeholder expanded from the 5-point
    /// detection; always present so downstream pose math has a fallback.
    pub sixty_eight_from_5: [Point; 68],
}

impl LandmarkSet {
    /// Builds the set straight from a detection, before refinement.
    pub fn from_detection(five: [Point; 5]) -> Self {
        Self {
            five,
            five_from_68: None,
            sixty_eight: None,
            sixty_eight_from_5: expand_five_to_68(&five),
        }
    }

    /// The 5-point landmark alignment should use: the refined summary when
    /// available, otherwise the original detection.
    pub fn alignment_five(&self) -> &[Point; 5] {
        self.five_from_68.as_ref().unwrap_or(&self.five)
    }

    /// The best 68-point set available for pose estimation.
    pub fn pose_sixty_eight(&self) -> &[Point; 68] {
        self.sixty_eight.as_ref().unwrap_or(&self.sixty_eight_from_5)
    }
}

/// Summarizes a 68-point landmark to the 5-point convention: eye centers
/// from the eye rings, nose tip, and the two mouth corners.
pub fn five_point_summary(points: &[Point; 68]) -> [Point; 5] {
    let ring_mean = |range: std::ops::Range<usize>| -> Point {
        let n = range.len() as f32;
        let (sx, sy) = range.fold((0.0, 0.0), |(ax, ay), i| {
            (ax + points[i].0, ay + points[i].1)
        });
        (sx / n, sy / n)
    };

    [
        ring_mean(LEFT_EYE_68),
        ring_mean(RIGHT_EYE_68),
        points[NOSE_TIP_68],
        points[MOUTH_LEFT_68],
        points[MOUTH_RIGHT_68],
    ]
}

/// Expands a 5-point landmark into a sparse 68-point placeholder: the eye
/// rings take the eye centers, nose tip and mouth corners their points,
/// every other slot stays at the origin (treated as invisible).
pub fn expand_five_to_68(five: &[Point; 5]) -> [Point; 68] {
    let mut out = [(0.0f32, 0.0f32); 68];
    for i in LEFT_EYE_68 {
        out[i] = five[0];
    }
    for i in RIGHT_EYE_68 {
        out[i] = five[1];
    }
    out[NOSE_TIP_68] = five[2];
    out[MOUTH_LEFT_68] = five[3];
    out[MOUTH_RIGHT_68] = five[4];
    out
}

/// One detected face, immutable after the per-frame stage except for the
/// attribute back-fill performed on group representatives.
#[derive(Clone, Debug)]
pub struct Face {
    /// Corners in frame pixel space, clamped to the frame bounds.
    pub bounding_box: BoundingBox,
    pub landmarks: LandmarkSet,
    pub detector_score: f32,
    pub landmarker_score: f32,
    /// Raw 512-dim identity embedding; `None` marks an embedding failure
    /// and excludes the face from clustering.
    pub embedding: Option<Vec<f32>>,
    /// L2-normalized copy of `embedding` for cosine similarity.
    pub normed_embedding: Option<Vec<f32>>,
    /// 0 or 1; estimated on group representatives only in video mode.
    pub gender: Option<u8>,
    /// Age in years.
    pub age: Option<u32>,
}

impl Face {
    pub fn has_embedding(&self) -> bool {
        self.normed_embedding.is_some()
    }
}

/// Output of the gender/age model for one face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttributeReading {
    pub gender: u8,
    pub age: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A frontal 68-point set whose eye rings are centered on the given
    /// five points.
    fn synthetic_68(five: &[Point; 5]) -> [Point; 68] {
        let mut pts = expand_five_to_68(five);
        // Spread each eye ring symmetrically so the mean stays on center
        for (k, i) in LEFT_EYE_68.enumerate() {
            let offset = [(3.0, 0.0), (1.0, -1.0), (-1.0, -1.0), (-3.0, 0.0), (-1.0, 1.0), (1.0, 1.0)][k];
            pts[i] = (five[0].0 + offset.0, five[0].1 + offset.1);
        }
        for (k, i) in RIGHT_EYE_68.enumerate() {
            let offset = [(3.0, 0.0), (1.0, -1.0), (-1.0, -1.0), (-3.0, 0.0), (-1.0, 1.0), (1.0, 1.0)][k];
            pts[i] = (five[1].0 + offset.0, five[1].1 + offset.1);
        }
        pts
    }

    #[test]
    fn test_five_point_summary_round_trips_detection() {
        let five: [Point; 5] = [
            (80.0, 60.0),
            (120.0, 60.0),
            (100.0, 85.0),
            (85.0, 110.0),
            (115.0, 110.0),
        ];
        let summary = five_point_summary(&synthetic_68(&five));
        for (got, want) in summary.iter().zip(five.iter()) {
            assert_relative_eq!(got.0, want.0, epsilon = 1e-4);
            assert_relative_eq!(got.1, want.1, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_rederived_summary_preserves_alignment_transform() {
        // Re-deriving 5 points from a frontal 68-point set and re-running
        // the alignment fit must recover the same transform, so the
        // embedding crop is unchanged.
        use crate::detection::domain::alignment::{Similarity, FACE_TEMPLATE_112};

        let five: [Point; 5] = [
            (380.0, 290.0),
            (470.0, 290.0),
            (425.0, 350.0),
            (392.0, 405.0),
            (458.0, 405.0),
        ];
        let original = Similarity::estimate(&five, &FACE_TEMPLATE_112);
        let rederived = Similarity::estimate(
            &five_point_summary(&synthetic_68(&five)),
            &FACE_TEMPLATE_112,
        );

        assert_relative_eq!(original.a, rederived.a, epsilon = original.a.abs() * 0.01);
        assert_relative_eq!(original.b, rederived.b, epsilon = 1e-3);
        assert_relative_eq!(original.tx, rederived.tx, epsilon = original.tx.abs() * 0.01);
        assert_relative_eq!(original.ty, rederived.ty, epsilon = original.ty.abs() * 0.01);
    }

    #[test]
    fn test_expand_places_anchors() {
        let five: [Point; 5] = [
            (10.0, 10.0),
            (20.0, 10.0),
            (15.0, 15.0),
            (12.0, 20.0),
            (18.0, 20.0),
        ];
        let pts = expand_five_to_68(&five);
        assert_eq!(pts[NOSE_TIP_68], five[2]);
        assert_eq!(pts[MOUTH_LEFT_68], five[3]);
        assert_eq!(pts[MOUTH_RIGHT_68], five[4]);
        assert_eq!(pts[36], five[0]);
        assert_eq!(pts[47], five[1]);
        // Jaw line stays at the origin
        assert_eq!(pts[0], (0.0, 0.0));
    }

    #[test]
    fn test_alignment_five_prefers_refined() {
        let five = [(1.0, 1.0); 5];
        let refined = [(2.0, 2.0); 5];
        let mut set = LandmarkSet::from_detection(five);
        assert_eq!(set.alignment_five(), &five);
        set.five_from_68 = Some(refined);
        assert_eq!(set.alignment_five(), &refined);
    }

    #[test]
    fn test_pose_sixty_eight_falls_back_to_expansion() {
        let set = LandmarkSet::from_detection([(5.0, 5.0); 5]);
        assert_eq!(set.pose_sixty_eight(), &set.sixty_eight_from_5);
    }
}
