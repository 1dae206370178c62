/// Gender and age estimator using ONNX Runtime.
///
/// The face box is scaled so its longer side fills two thirds of the
/// 96x96 input and centered, matching how the model was trained. Output
/// is `[female_logit, male_logit, age_fraction]`.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::alignment::Similarity;
use crate::detection::domain::face::AttributeReading;
use crate::detection::domain::frame_analyzer::AttributeEstimator;
use crate::shared::bbox::BoundingBox;
use crate::shared::constants::ATTRIBUTE_INPUT_SIZE;
use crate::shared::frame::Frame;

use super::session::build_session;

const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 128.0;

/// Context margin around the face box inside the model input.
const BOX_SCALE: f32 = 1.5;

pub struct GenderAgeEstimator {
    session: Mutex<ort::session::Session>,
}

impl GenderAgeEstimator {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: Mutex::new(build_session(model_path)?),
        })
    }
}

impl AttributeEstimator for GenderAgeEstimator {
    fn estimate(
        &self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<AttributeReading, Box<dyn std::error::Error>> {
        let size = ATTRIBUTE_INPUT_SIZE;
        let half = size as f32 / 2.0;

        let long_side = bbox.width().max(bbox.height()).max(1.0);
        let scale = size as f32 / (BOX_SCALE * long_side);
        let (cx, cy) = bbox.center();
        let warp = Similarity::scale_translate(scale, half - cx * scale, half - cy * scale);
        let crop = warp.warp_rgb(frame, size, size);

        let input = preprocess(&crop, size as usize);
        let input_value = ort::value::Tensor::from_array(input)?;

        let output = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| format!("Lock poisoned: {e}"))?;
            let outputs = session.run(ort::inputs![input_value])?;
            let array = outputs[0].try_extract_array::<f32>()?;
            array
                .as_slice()
                .ok_or("Cannot get attribute slice")?
                .to_vec()
        };

        if output.len() < 3 {
            return Err(format!("Attribute output has {} values, need 3", output.len()).into());
        }

        let gender = if output[1] > output[0] { 1 } else { 0 };
        let age = (output[2] * 100.0).round().max(0.0) as u32;
        Ok(AttributeReading { gender, age })
    }
}

fn preprocess(rgb: &[u8], size: usize) -> ndarray::Array4<f32> {
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, size, size));
    for y in 0..size {
        for x in 0..size {
            let o = (y * size + x) * 3;
            for c in 0..3 {
                tensor[[0, c, y, x]] = (rgb[o + c] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }
    tensor
}
