/// Explicit bundle of the four inference sessions a job needs.
///
/// Loaded once per job and passed by reference into the pipeline; there
/// is no process-global model state.
use std::path::{Path, PathBuf};

use crate::detection::domain::face::{five_point_summary, Face, LandmarkSet};
use crate::detection::domain::frame_analyzer::{AnalysisParams, FrameAnalyzer};
use crate::detection::domain::observation::{heuristic_quality, FaceObservation, FacePatch};
use crate::error::ProcessError;
use crate::shared::constants::{
    ATTRIBUTE_MODEL_NAME, DETECTOR_MODEL_NAME, EMBEDDING_MODEL_NAME, LANDMARK_MODEL_NAME,
};
use crate::shared::frame::Frame;

use super::arcface_embedder::ArcFaceEmbedder;
use super::gender_age_estimator::GenderAgeEstimator;
use super::landmark_refiner::LandmarkRefiner;
use super::retinaface_detector::RetinaFaceDetector;

/// Filesystem locations of the four ONNX models.
#[derive(Clone, Debug)]
pub struct ModelPaths {
    pub detector: PathBuf,
    pub landmarker: PathBuf,
    pub embedder: PathBuf,
    pub attributes: PathBuf,
}

impl ModelPaths {
    /// Standard model names resolved against one directory.
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            detector: dir.join(DETECTOR_MODEL_NAME),
            landmarker: dir.join(LANDMARK_MODEL_NAME),
            embedder: dir.join(EMBEDDING_MODEL_NAME),
            attributes: dir.join(ATTRIBUTE_MODEL_NAME),
        }
    }
}

pub struct ModelBundle {
    detector: RetinaFaceDetector,
    landmarker: LandmarkRefiner,
    embedder: ArcFaceEmbedder,
    pub attributes: GenderAgeEstimator,
}

impl ModelBundle {
    pub fn load(paths: &ModelPaths) -> Result<Self, ProcessError> {
        let detector = RetinaFaceDetector::new(&paths.detector)
            .map_err(|e| ProcessError::model_load(DETECTOR_MODEL_NAME, e))?;
        let landmarker = LandmarkRefiner::new(&paths.landmarker)
            .map_err(|e| ProcessError::model_load(LANDMARK_MODEL_NAME, e))?;
        let embedder = ArcFaceEmbedder::new(&paths.embedder)
            .map_err(|e| ProcessError::model_load(EMBEDDING_MODEL_NAME, e))?;
        let attributes = GenderAgeEstimator::new(&paths.attributes)
            .map_err(|e| ProcessError::model_load(ATTRIBUTE_MODEL_NAME, e))?;
        log::info!("Loaded 4 inference sessions");
        Ok(Self {
            detector,
            landmarker,
            embedder,
            attributes,
        })
    }
}

impl FrameAnalyzer for ModelBundle {
    fn analyze(
        &self,
        frame: &Frame,
        params: &AnalysisParams,
    ) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error>> {
        let mut candidates = self.detector.detect(
            frame,
            params.detector_score_threshold,
            params.iou_threshold,
        )?;
        // Stable left-to-right order gives faces a frame-local index
        candidates.sort_by(|a, b| {
            a.bbox
                .x1
                .partial_cmp(&b.bbox.x1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut observations = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.into_iter().enumerate() {
            let refined = self.landmarker.refine(frame, &candidate.landmarks);

            let mut landmarks = LandmarkSet::from_detection(candidate.landmarks);
            landmarks.sixty_eight = Some(refined.points);
            // Only a confident refinement replaces the alignment points
            if refined.replaces_alignment(params.landmarker_score_threshold) {
                landmarks.five_from_68 = Some(five_point_summary(&refined.points));
            }

            let (embedding, normed_embedding) =
                match self.embedder.embed(frame, landmarks.alignment_five()) {
                    Ok((raw, normed)) => (Some(raw), Some(normed)),
                    Err(e) => {
                        log::warn!(
                            "Embedding failed for face {index} in frame {}: {e}",
                            frame.number()
                        );
                        (None, None)
                    }
                };

            let quality = heuristic_quality(frame, &candidate.bbox);
            let patch = FacePatch::extract(frame, &candidate.bbox, params.avatar_padding);

            observations.push(FaceObservation {
                face: Face {
                    bounding_box: candidate.bbox,
                    landmarks,
                    detector_score: candidate.score,
                    landmarker_score: refined.confidence,
                    embedding,
                    normed_embedding,
                    gender: None,
                    age: None,
                },
                frame_number: frame.number(),
                index,
                quality,
                patch,
            });
        }

        Ok(observations)
    }
}
