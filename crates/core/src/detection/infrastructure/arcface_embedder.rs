/// ArcFace identity embedder using ONNX Runtime.
///
/// Faces are aligned to the 112x112 template by a similarity warp before
/// inference; the model emits a 512-dimensional embedding.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::alignment::{Point, Similarity, FACE_TEMPLATE_112};
use crate::shared::constants::{EMBEDDING_DIM, EMBEDDING_INPUT_SIZE};
use crate::shared::frame::Frame;

use super::session::build_session;

const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct ArcFaceEmbedder {
    session: Mutex<ort::session::Session>,
}

impl ArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: Mutex::new(build_session(model_path)?),
        })
    }

    /// Aligns the face and returns `(embedding, normed_embedding)`.
    pub fn embed(
        &self,
        frame: &Frame,
        five: &[Point; 5],
    ) -> Result<(Vec<f32>, Vec<f32>), Box<dyn std::error::Error>> {
        let size = EMBEDDING_INPUT_SIZE;
        let warp = Similarity::estimate(five, &FACE_TEMPLATE_112);
        let crop = warp.warp_rgb(frame, size, size);

        let input = preprocess(&crop, size as usize);
        let input_value = ort::value::Tensor::from_array(input)?;

        let embedding = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| format!("Lock poisoned: {e}"))?;
            let outputs = session.run(ort::inputs![input_value])?;
            let array = outputs[0].try_extract_array::<f32>()?;
            array
                .as_slice()
                .ok_or("Cannot get embedding slice")?
                .to_vec()
        };

        if embedding.len() != EMBEDDING_DIM {
            return Err(format!(
                "Embedding has {} dimensions, expected {EMBEDDING_DIM}",
                embedding.len()
            )
            .into());
        }

        let normed = l2_normalized(&embedding);
        Ok((embedding, normed))
    }
}

pub fn l2_normalized(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_l2_normalized_unit_vector() {
        let v = l2_normalized(&[3.0, 4.0]);
        assert_relative_eq!(v[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(v[1], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_l2_normalized_zero_vector_unchanged() {
        assert_eq!(l2_normalized(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_preprocess_normalization_range() {
        let rgb = vec![255u8; 112 * 112 * 3];
        let tensor = preprocess(&rgb, 112);
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 1.0, epsilon = 1e-4);

        let rgb = vec![0u8; 112 * 112 * 3];
        let tensor = preprocess(&rgb, 112);
        assert_relative_eq!(tensor[[0, 1, 5, 5]], -1.0, epsilon = 1e-4);
    }
}
