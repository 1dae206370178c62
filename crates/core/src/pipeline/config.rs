//! Job configuration: a strongly typed snapshot built once at entry from
//! defaults overlaid by an optional partial user config, then validated.

use serde::Deserialize;

use crate::detection::domain::frame_analyzer::AnalysisParams;
use crate::error::ProcessError;

/// Immutable configuration for one processing job.
#[derive(Clone, Debug)]
pub struct ProcessorConfig {
    /// DBSCAN cosine-distance epsilon for identity clustering.
    pub similarity_threshold: f32,
    /// DBSCAN `min_samples`; clusters below this never form.
    pub min_faces_in_group: usize,
    /// Process every n-th frame.
    pub sample_interval: u64,
    pub ignore_frames: Vec<u64>,
    /// Closed `[lo, hi]` frame ranges to skip.
    pub ignore_ranges: Vec<(u64, u64)>,
    pub start_frame: u64,
    pub end_frame: Option<u64>,
    pub face_detector_score_threshold: f32,
    pub face_landmarker_score_threshold: f32,
    pub iou_threshold: f32,
    pub min_appearance_ratio: f32,
    pub min_frontality: f32,
    pub avatar_size: u32,
    /// Fraction of the box side added as context on each side of the
    /// avatar crop.
    pub avatar_padding: f32,
    /// JPEG quality, 1 to 100.
    pub avatar_quality: u8,
    pub max_workers: usize,
}

/// User-supplied overrides, deserialized from JSON. Absent fields keep
/// their defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialProcessorConfig {
    pub similarity_threshold: Option<f32>,
    pub min_faces_in_group: Option<usize>,
    pub sample_interval: Option<u64>,
    pub ignore_frames: Option<Vec<u64>>,
    pub ignore_ranges: Option<Vec<(u64, u64)>>,
    pub start_frame: Option<u64>,
    pub end_frame: Option<u64>,
    pub face_detector_score_threshold: Option<f32>,
    pub face_landmarker_score_threshold: Option<f32>,
    pub iou_threshold: Option<f32>,
    pub min_appearance_ratio: Option<f32>,
    pub min_frontality: Option<f32>,
    pub avatar_size: Option<u32>,
    pub avatar_padding: Option<f32>,
    pub avatar_quality: Option<u8>,
    pub max_workers: Option<usize>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            similarity_threshold: 0.6,
            min_faces_in_group: 3,
            sample_interval: 1,
            ignore_frames: Vec::new(),
            ignore_ranges: Vec::new(),
            start_frame: 0,
            end_frame: None,
            face_detector_score_threshold: 0.5,
            face_landmarker_score_threshold: 0.85,
            iou_threshold: 0.4,
            min_appearance_ratio: 0.05,
            min_frontality: 0.3,
            avatar_size: 256,
            avatar_padding: 0.2,
            avatar_quality: 85,
            max_workers: cores.min(8),
        }
    }
}

impl ProcessorConfig {
    /// Defaults overlaid by whatever the partial config sets.
    pub fn with_defaults(partial: PartialProcessorConfig) -> Self {
        let d = Self::default();
        Self {
            similarity_threshold: partial.similarity_threshold.unwrap_or(d.similarity_threshold),
            min_faces_in_group: partial.min_faces_in_group.unwrap_or(d.min_faces_in_group),
            sample_interval: partial.sample_interval.unwrap_or(d.sample_interval),
            ignore_frames: partial.ignore_frames.unwrap_or(d.ignore_frames),
            ignore_ranges: partial.ignore_ranges.unwrap_or(d.ignore_ranges),
            start_frame: partial.start_frame.unwrap_or(d.start_frame),
            end_frame: partial.end_frame.or(d.end_frame),
            face_detector_score_threshold: partial
                .face_detector_score_threshold
                .unwrap_or(d.face_detector_score_threshold),
            face_landmarker_score_threshold: partial
                .face_landmarker_score_threshold
                .unwrap_or(d.face_landmarker_score_threshold),
            iou_threshold: partial.iou_threshold.unwrap_or(d.iou_threshold),
            min_appearance_ratio: partial.min_appearance_ratio.unwrap_or(d.min_appearance_ratio),
            min_frontality: partial.min_frontality.unwrap_or(d.min_frontality),
            avatar_size: partial.avatar_size.unwrap_or(d.avatar_size),
            avatar_padding: partial.avatar_padding.unwrap_or(d.avatar_padding),
            avatar_quality: partial.avatar_quality.unwrap_or(d.avatar_quality),
            max_workers: partial.max_workers.unwrap_or(d.max_workers),
        }
    }

    /// Rejects impossible values before any frame work begins.
    pub fn validate(&self) -> Result<(), ProcessError> {
        let fail = |msg: &str| Err(ProcessError::Config(msg.to_string()));

        if !(0.0..=2.0).contains(&self.similarity_threshold) || self.similarity_threshold <= 0.0 {
            return fail("similarity_threshold must be in (0, 2]");
        }
        if self.min_faces_in_group == 0 {
            return fail("min_faces_in_group must be at least 1");
        }
        if self.sample_interval == 0 {
            return fail("sample_interval must be at least 1");
        }
        if let Some(end) = self.end_frame {
            if end < self.start_frame {
                return fail("end_frame must not precede start_frame");
            }
        }
        for &(lo, hi) in &self.ignore_ranges {
            if hi < lo {
                return fail("ignore_ranges entries must satisfy lo <= hi");
            }
        }
        if !(0.0..=1.0).contains(&self.face_detector_score_threshold) {
            return fail("face_detector_score_threshold must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.face_landmarker_score_threshold) {
            return fail("face_landmarker_score_threshold must be in [0, 1]");
        }
        if self.iou_threshold <= 0.0 || self.iou_threshold > 1.0 {
            return fail("iou_threshold must be in (0, 1]");
        }
        if !(0.0..=1.0).contains(&self.min_appearance_ratio) {
            return fail("min_appearance_ratio must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.min_frontality) {
            return fail("min_frontality must be in [0, 1]");
        }
        if self.avatar_size == 0 {
            return fail("avatar_size must be positive");
        }
        if self.avatar_padding < 0.0 {
            return fail("avatar_padding must not be negative");
        }
        if self.avatar_quality == 0 || self.avatar_quality > 100 {
            return fail("avatar_quality must be in [1, 100]");
        }
        if self.max_workers == 0 {
            return fail("max_workers must be at least 1");
        }
        Ok(())
    }

    /// The per-frame thresholds snapshot handed to workers.
    pub fn analysis_params(&self) -> AnalysisParams {
        AnalysisParams {
            detector_score_threshold: self.face_detector_score_threshold,
            landmarker_score_threshold: self.face_landmarker_score_threshold,
            iou_threshold: self.iou_threshold,
            avatar_padding: self.avatar_padding,
        }
    }
}
