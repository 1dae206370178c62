use serde::Serialize;

use crate::detection::domain::observation::FaceObservation;
use crate::grouping::dbscan::cosine_distance;
use crate::grouping::pose::{estimate_pose, frontality};

/// Embedding, temporal, and pose statistics computed once per group.
#[derive(Clone, Debug, Serialize)]
pub struct GroupMetrics {
    pub size: usize,
    /// Cosine distances of members to the normalized group centroid.
    pub distance_mean: f32,
    pub distance_std: f32,
    pub distance_max: f32,
    pub age_variance: f32,
    /// Stream distance between the first and last frame with a member.
    pub frame_spread: u64,
    /// `size / processed_frames`.
    pub appearance_ratio: f32,
    pub yaw_mean: f32,
    pub yaw_variance: f32,
    pub pitch_mean: f32,
    pub pitch_variance: f32,
    pub frontality_min: f32,
    pub frontality_avg: f32,
    pub frontality_max: f32,
    /// `0.6 * frontality_avg + 0.4 * frontality_min`.
    pub pose_quality: f32,
}

/// One identity: every observation that clustered under a common label.
#[derive(Clone, Debug)]
pub struct FaceGroup {
    pub members: Vec<FaceObservation>,
    /// Index into `members` of the representative observation.
    pub representative: usize,
    pub metrics: GroupMetrics,
}

impl FaceGroup {
    /// Builds a group from its clustered members, selecting the
    /// representative and computing metrics.
    ///
    /// `members` must be non-empty. Age variance stays 0.0 because
    /// attributes are estimated for the representative only.
    pub fn new(members: Vec<FaceObservation>, processed_frames: u64) -> FaceGroup {
        debug_assert!(!members.is_empty());

        let representative = members
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.representative_score()
                    .partial_cmp(&b.representative_score())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);

        let metrics = compute_metrics(&members, processed_frames);
        FaceGroup {
            members,
            representative,
            metrics,
        }
    }

    pub fn representative(&self) -> &FaceObservation {
        &self.members[self.representative]
    }

    /// Quality gate: enough of the stream and frontal enough throughout.
    pub fn passes_filter(&self, min_appearance_ratio: f32, min_frontality: f32) -> bool {
        self.metrics.appearance_ratio >= min_appearance_ratio
            && self.metrics.frontality_min >= min_frontality
    }
}

fn compute_metrics(members: &[FaceObservation], processed_frames: u64) -> GroupMetrics {
    let size = members.len();

    // Normalized centroid of member embeddings
    let embeddings: Vec<&Vec<f32>> = members
        .iter()
        .filter_map(|m| m.face.normed_embedding.as_ref())
        .collect();
    let (distance_mean, distance_std, distance_max) = if embeddings.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let dim = embeddings[0].len();
        let mut centroid = vec![0.0f32; dim];
        for e in &embeddings {
            for (c, v) in centroid.iter_mut().zip(e.iter()) {
                *c += v;
            }
        }
        let norm: f32 = centroid.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for c in &mut centroid {
                *c /= norm;
            }
        }
        let distances: Vec<f32> = embeddings
            .iter()
            .map(|e| cosine_distance(e, &centroid))
            .collect();
        mean_std_max(&distances)
    };

    let first_frame = members.iter().map(|m| m.frame_number).min().unwrap_or(0);
    let last_frame = members.iter().map(|m| m.frame_number).max().unwrap_or(0);
    let appearance_ratio = if processed_frames > 0 {
        size as f32 / processed_frames as f32
    } else {
        0.0
    };

    let poses: Vec<_> = members
        .iter()
        .map(|m| estimate_pose(m.face.landmarks.pose_sixty_eight()))
        .collect();
    let yaws: Vec<f32> = poses.iter().map(|p| p.yaw).collect();
    let pitches: Vec<f32> = poses.iter().map(|p| p.pitch).collect();
    let frontalities: Vec<f32> = poses.iter().map(frontality).collect();

    let (yaw_mean, yaw_variance) = mean_variance(&yaws);
    let (pitch_mean, pitch_variance) = mean_variance(&pitches);
    let (frontality_avg, _) = mean_variance(&frontalities);
    let frontality_min = fold_min(&frontalities);
    let frontality_max = frontalities.iter().cloned().fold(0.0f32, f32::max);

    GroupMetrics {
        size,
        distance_mean,
        distance_std,
        distance_max,
        age_variance: 0.0,
        frame_spread: last_frame - first_frame,
        appearance_ratio,
        yaw_mean,
        yaw_variance,
        pitch_mean,
        pitch_variance,
        frontality_min,
        frontality_avg,
        frontality_max,
        pose_quality: 0.6 * frontality_avg + 0.4 * frontality_min,
    }
}

fn mean_variance(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
    (mean, variance)
}

fn mean_std_max(values: &[f32]) -> (f32, f32, f32) {
    let (mean, variance) = mean_variance(values);
    let max = values.iter().cloned().fold(0.0f32, f32::max);
    (mean, variance.sqrt(), max)
}

fn fold_min(values: &[f32]) -> f32 {
    values.iter().cloned().fold(1.0f32, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face::{expand_five_to_68, Face, LandmarkSet};
    use crate::detection::domain::observation::FacePatch;
    use crate::shared::bbox::BoundingBox;
    use crate::shared::frame::Frame;
    use approx::assert_relative_eq;

    fn frontal_five() -> [(f32, f32); 5] {
        [
            (80.0, 60.0),
            (120.0, 60.0),
            (100.0, 84.0),
            (85.0, 100.0),
            (115.0, 100.0),
        ]
    }

    fn observation(
        frame_number: u64,
        detector_score: f32,
        quality: f32,
        embedding: Vec<f32>,
    ) -> FaceObservation {
        let frame = Frame::new(vec![128u8; 16 * 16 * 3], 16, 16, frame_number);
        let bbox = BoundingBox::new(2.0, 2.0, 14.0, 14.0);
        let patch = FacePatch::extract(&frame, &bbox, 0.2);
        FaceObservation {
            face: Face {
                bounding_box: bbox,
                landmarks: LandmarkSet::from_detection(frontal_five()),
                detector_score,
                landmarker_score: 0.9,
                embedding: Some(embedding.clone()),
                normed_embedding: Some(embedding),
                gender: None,
                age: None,
            },
            frame_number,
            index: 0,
            quality,
            patch,
        }
    }

    #[test]
    fn test_representative_maximizes_blended_score() {
        let members = vec![
            observation(0, 0.5, 0.5, vec![1.0, 0.0]),
            observation(1, 0.99, 0.99, vec![1.0, 0.0]),
            observation(2, 0.7, 0.7, vec![1.0, 0.0]),
        ];
        let group = FaceGroup::new(members, 10);
        assert_eq!(group.representative, 1);
        assert_eq!(group.representative().frame_number, 1);
    }

    #[test]
    fn test_metrics_identical_embeddings_have_zero_distance() {
        let members = vec![
            observation(0, 0.9, 0.9, vec![1.0, 0.0]),
            observation(5, 0.9, 0.9, vec![1.0, 0.0]),
        ];
        let group = FaceGroup::new(members, 10);
        assert_relative_eq!(group.metrics.distance_mean, 0.0, epsilon = 1e-5);
        assert_relative_eq!(group.metrics.distance_max, 0.0, epsilon = 1e-5);
        assert_eq!(group.metrics.frame_spread, 5);
        assert_eq!(group.metrics.size, 2);
    }

    #[test]
    fn test_appearance_ratio_boundary() {
        // 20 observations over 100 processed frames: excluded at 0.25,
        // included at 0.15
        let members: Vec<_> = (0..20)
            .map(|i| observation(i, 0.9, 0.9, vec![1.0, 0.0]))
            .collect();
        let group = FaceGroup::new(members, 100);
        assert_relative_eq!(group.metrics.appearance_ratio, 0.2, epsilon = 1e-6);
        assert!(!group.passes_filter(0.25, 0.0));
        assert!(group.passes_filter(0.15, 0.0));
    }

    #[test]
    fn test_frontality_filter_uses_group_minimum() {
        let mut turned = observation(1, 0.9, 0.9, vec![1.0, 0.0]);
        // Nose pushed almost onto the right eye: strong yaw
        let five = [
            (80.0, 60.0),
            (120.0, 60.0),
            (118.0, 84.0),
            (85.0, 100.0),
            (115.0, 100.0),
        ];
        turned.face.landmarks = LandmarkSet::from_detection(five);
        turned.face.landmarks.sixty_eight = Some(expand_five_to_68(&five));

        let members = vec![observation(0, 0.9, 0.9, vec![1.0, 0.0]), turned];
        let group = FaceGroup::new(members, 2);
        assert!(group.metrics.frontality_min < group.metrics.frontality_avg);
        assert!(group.passes_filter(0.0, group.metrics.frontality_min));
        assert!(!group.passes_filter(0.0, group.metrics.frontality_min + 0.05));
    }

    #[test]
    fn test_pose_quality_blend() {
        let members = vec![observation(0, 0.9, 0.9, vec![0.0, 1.0])];
        let group = FaceGroup::new(members, 1);
        let m = &group.metrics;
        assert_relative_eq!(
            m.pose_quality,
            0.6 * m.frontality_avg + 0.4 * m.frontality_min,
            epsilon = 1e-6
        );
    }
}
