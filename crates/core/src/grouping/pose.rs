//! Head-pose estimation from 68-point landmarks.
//!
//! Geometric, not model-based: yaw from the asymmetry of the eye-to-nose
//! spans, pitch from where the nose tip sits between the eye line and the
//! mouth line.

use crate::detection::domain::alignment::Point;
use crate::detection::domain::face::{
    five_point_summary, MOUTH_LEFT_68, MOUTH_RIGHT_68, NOSE_TIP_68,
};

/// Yaw angle a fully profile face maps to.
const YAW_RANGE_DEG: f32 = 45.0;

/// Pitch angle bound for frontality normalization.
const PITCH_RANGE_DEG: f32 = 30.0;

/// Where the nose tip sits between eye line (0) and mouth line (1) on a
/// frontal face.
const NOMINAL_NOSE_DROP: f32 = 0.6;

/// Degrees per unit of nose-drop deflection from nominal.
const PITCH_DEG_PER_UNIT: f32 = 90.0;

#[derive(Clone, Copy, Debug)]
pub struct PoseAngles {
    /// Degrees, positive when the face turns toward its left (nose moves
    /// right in the image).
    pub yaw: f32,
    /// Degrees, positive when looking down (nose drops toward the mouth).
    pub pitch: f32,
}

/// Estimates yaw and pitch from a 68-point landmark set.
pub fn estimate_pose(points: &[Point; 68]) -> PoseAngles {
    let [left_eye, right_eye, nose, _, _] = five_point_summary(points);
    let mouth_mid = midpoint(points[MOUTH_LEFT_68], points[MOUTH_RIGHT_68]);
    let eye_mid = midpoint(left_eye, right_eye);
    debug_assert_eq!(nose, points[NOSE_TIP_68]);

    // Yaw: a turned head foreshortens one eye-to-nose span
    let left_span = (nose.0 - left_eye.0).max(0.0);
    let right_span = (right_eye.0 - nose.0).max(0.0);
    let span_sum = left_span + right_span;
    let yaw = if span_sum > f32::EPSILON {
        ((left_span - right_span) / span_sum).clamp(-1.0, 1.0) * YAW_RANGE_DEG
    } else {
        0.0
    };

    // Pitch: nose-tip position between the eye line and mouth line
    let face_height = mouth_mid.1 - eye_mid.1;
    let pitch = if face_height.abs() > f32::EPSILON {
        let drop = (nose.1 - eye_mid.1) / face_height;
        (drop - NOMINAL_NOSE_DROP) * PITCH_DEG_PER_UNIT
    } else {
        0.0
    };

    PoseAngles { yaw, pitch }
}

/// Frontality score in [0, 1]: 1 for a dead-frontal face, 0 for a full
/// profile or extreme tilt.
pub fn frontality(pose: &PoseAngles) -> f32 {
    let yaw_n = (pose.yaw.abs() / YAW_RANGE_DEG).min(1.0);
    let pitch_n = (pose.pitch.abs() / PITCH_RANGE_DEG).min(1.0);
    (1.0 - (0.6 * yaw_n + 0.4 * pitch_n)).clamp(0.0, 1.0)
}

fn midpoint(a: Point, b: Point) -> Point {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}
