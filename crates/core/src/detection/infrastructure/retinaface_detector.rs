/// RetinaFace-style anchor detector using ONNX Runtime via `ort`.
///
/// The model consumes a fixed 640x640 input and emits decoded detections
/// with five facial keypoints each; post-processing filters by score,
/// rescales to frame space, and runs greedy NMS.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::alignment::Point;
use crate::detection::domain::suppression::{non_max_suppression, Candidate};
use crate::shared::bbox::BoundingBox;
use crate::shared::constants::DETECTOR_INPUT_SIZE;
use crate::shared::frame::Frame;

use super::session::build_session;

const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 128.0;

/// Row layout: [cx, cy, w, h, score, kp0_x, kp0_y, ..., kp4_x, kp4_y].
const ROW_FEATURES: usize = 15;

pub struct RetinaFaceDetector {
    session: Mutex<ort::session::Session>,
}

impl RetinaFaceDetector {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: Mutex::new(build_session(model_path)?),
        })
    }

    /// Detects faces in a frame, returning candidates in frame coordinates
    /// after score filtering and NMS.
    pub fn detect(
        &self,
        frame: &Frame,
        score_threshold: f32,
        iou_threshold: f32,
    ) -> Result<Vec<Candidate>, Box<dyn std::error::Error>> {
        let input = preprocess(frame, DETECTOR_INPUT_SIZE);
        let input_value = ort::value::Tensor::from_array(input)?;

        let (data, shape) = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| format!("Lock poisoned: {e}"))?;
            let outputs = session.run(ort::inputs![input_value])?;
            if outputs.len() == 0 {
                return Err("detector produced no outputs".into());
            }
            let tensor = outputs[0].try_extract_array::<f32>()?;
            let data = tensor
                .as_slice()
                .ok_or("Cannot get detector output slice")?
                .to_vec();
            (data, tensor.shape().to_vec())
        };

        // Detections arrive as [1, features, detections] (transposed) or
        // [1, detections, features]. Handle both.
        let (num_dets, num_feats, transposed) = if shape.len() == 3 {
            if shape[1] < shape[2] {
                (shape[2], shape[1], true)
            } else {
                (shape[1], shape[2], false)
            }
        } else if shape.len() == 2 {
            (shape[0], shape[1], false)
        } else {
            return Err(format!("Unexpected detector output shape: {shape:?}").into());
        };
        if num_feats < ROW_FEATURES {
            return Err(format!(
                "Detector rows carry {num_feats} values, need {ROW_FEATURES}"
            )
            .into());
        }

        // Per-axis rescale ratios back to frame space
        let rx = frame.width() as f32 / DETECTOR_INPUT_SIZE as f32;
        let ry = frame.height() as f32 / DETECTOR_INPUT_SIZE as f32;

        let mut candidates = Vec::new();
        for i in 0..num_dets {
            let at = |f: usize| -> f32 {
                if transposed {
                    data[f * num_dets + i]
                } else {
                    data[i * num_feats + f]
                }
            };

            let score = at(4);
            if score < score_threshold {
                continue;
            }

            let cx = at(0);
            let cy = at(1);
            let w = at(2);
            let h = at(3);
            let bbox = BoundingBox::new(
                (cx - w / 2.0) * rx,
                (cy - h / 2.0) * ry,
                (cx + w / 2.0) * rx,
                (cy + h / 2.0) * ry,
            )
            .clamp_to(frame.width(), frame.height());

            let mut landmarks: [Point; 5] = [(0.0, 0.0); 5];
            for (k, p) in landmarks.iter_mut().enumerate() {
                *p = (at(5 + k * 2) * rx, at(5 + k * 2 + 1) * ry);
            }

            candidates.push(Candidate {
                bbox,
                landmarks,
                score,
            });
        }

        Ok(non_max_suppression(candidates, iou_threshold))
    }
}

/// Resize to `size` x `size` with per-axis ratios, normalize, NCHW layout.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_w = frame.width() as usize;
    let src_h = frame.height() as usize;
    let target = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, target, target));
    for y in 0..target {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / target as f64) as usize).min(src_h - 1);
        for x in 0..target {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / target as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[src_y, src_x, c]] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }
    tensor
}
