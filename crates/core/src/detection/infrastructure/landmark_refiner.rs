/// 68-point landmark refiner using ONNX Runtime.
///
/// The face is pose-normalized into a 192x192 patch via a similarity fit
/// against the alignment template, the model emits one heatmap per
/// landmark, and peak positions are mapped back to frame space through
/// the inverse transform.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::alignment::{scaled_template, Point, Similarity};
use crate::detection::domain::face::expand_five_to_68;
use crate::shared::constants::LANDMARK_PATCH_SIZE;
use crate::shared::frame::Frame;

use super::session::build_session;

/// A 68-point refinement with its aggregate confidence in [0, 1].
#[derive(Clone, Debug)]
pub struct RefinedLandmarks {
    pub points: [Point; 68],
    pub confidence: f32,
}

impl RefinedLandmarks {
    /// Whether the refinement is trusted enough to replace the
    /// detector's alignment points. Strictly above the threshold; an
    /// exact match keeps the detection.
    pub fn replaces_alignment(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }
}

pub struct LandmarkRefiner {
    session: Mutex<ort::session::Session>,
}

impl LandmarkRefiner {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: Mutex::new(build_session(model_path)?),
        })
    }

    /// Refines a 5-point detection to 68 frame-space points.
    ///
    /// Model failure degrades to a zero-confidence placeholder expanded
    /// from the detection instead of dropping the face.
    pub fn refine(&self, frame: &Frame, five: &[Point; 5]) -> RefinedLandmarks {
        match self.run(frame, five) {
            Ok(refined) => refined,
            Err(e) => {
                log::warn!("Landmark refinement failed, keeping detector points: {e}");
                RefinedLandmarks {
                    points: expand_five_to_68(five),
                    confidence: 0.0,
                }
            }
        }
    }

    fn run(
        &self,
        frame: &Frame,
        five: &[Point; 5],
    ) -> Result<RefinedLandmarks, Box<dyn std::error::Error>> {
        let patch_size = LANDMARK_PATCH_SIZE;
        let template = scaled_template(patch_size);
        let to_patch = Similarity::estimate(five, &template);
        let patch = to_patch.warp_rgb(frame, patch_size, patch_size);

        let input = preprocess(&patch, patch_size as usize);
        let input_value = ort::value::Tensor::from_array(input)?;

        let (heatmaps, shape) = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| format!("Lock poisoned: {e}"))?;
            let outputs = session.run(ort::inputs![input_value])?;
            if outputs.len() == 0 {
                return Err("landmark model produced no outputs".into());
            }
            let tensor = outputs[0].try_extract_array::<f32>()?;
            let data = tensor
                .as_slice()
                .ok_or("Cannot get heatmap slice")?
                .to_vec();
            (data, tensor.shape().to_vec())
        };

        if shape.len() != 4 || shape[1] != 68 {
            return Err(format!("Unexpected landmark output shape: {shape:?}").into());
        }
        let hm_h = shape[2];
        let hm_w = shape[3];
        let plane = hm_h * hm_w;

        let to_frame = to_patch.invert();
        let sx = patch_size as f32 / hm_w as f32;
        let sy = patch_size as f32 / hm_h as f32;

        let mut points = [(0.0f32, 0.0f32); 68];
        let mut peak_sum = 0.0f32;
        for (k, point) in points.iter_mut().enumerate() {
            let map = &heatmaps[k * plane..(k + 1) * plane];
            let (mut best, mut best_idx) = (f32::NEG_INFINITY, 0);
            for (idx, &v) in map.iter().enumerate() {
                if v > best {
                    best = v;
                    best_idx = idx;
                }
            }
            let px = ((best_idx % hm_w) as f32 + 0.5) * sx;
            let py = ((best_idx / hm_w) as f32 + 0.5) * sy;
            *point = to_frame.apply((px, py));
            peak_sum += best.clamp(0.0, 1.0);
        }

        Ok(RefinedLandmarks {
            points,
            confidence: peak_sum / 68.0,
        })
    }
}

fn preprocess(rgb: &[u8], size: usize) -> ndarray::Array4<f32> {
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, size, size));
    for y in 0..size {
        for x in 0..size {
            let o = (y * size + x) * 3;
            for c in 0..3 {
                tensor[[0, c, y, x]] = rgb[o + c] as f32 / 255.0;
            }
        }
    }
    tensor
}
