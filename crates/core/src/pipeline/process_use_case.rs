//! Job entry point: wires the sampler, the parallel frame stage,
//! clustering, filtering, attributes, and avatar rendering into a single
//! report.

use std::collections::BTreeMap;
use std::path::Path;

use crate::avatar::renderer::AvatarRenderer;
use crate::detection::domain::frame_analyzer::{AttributeEstimator, FrameAnalyzer};
use crate::detection::domain::observation::FaceObservation;
use crate::error::ProcessError;
use crate::grouping::dbscan;
use crate::grouping::face_group::FaceGroup;
use crate::media::domain::frame_source::FrameSource;
use crate::media::infrastructure::ffmpeg_source::FfmpegVideoSource;
use crate::media::infrastructure::image_source::ImageFileSource;
use crate::pipeline::config::ProcessorConfig;
use crate::pipeline::frame_stage::run_frame_stage;
use crate::pipeline::report::{FaceRecord, MediaSummary, ProcessReport};
use crate::pipeline::sampler::FrameSampler;
use crate::pipeline::workspace::JobWorkspace;
use crate::shared::constants::IMAGE_EXTENSIONS;

/// Runs one media file through the full pipeline.
///
/// The inference seams are borrowed, so a caller constructs a
/// `ModelBundle` once and shares it across jobs. The returned workspace
/// owns the rendered avatar files; dropping it removes them, so a caller
/// uploads first (or calls `persist`).
pub struct MediaProcessor<'a> {
    analyzer: &'a dyn FrameAnalyzer,
    attributes: &'a dyn AttributeEstimator,
    config: ProcessorConfig,
}

impl<'a> MediaProcessor<'a> {
    pub fn new(
        analyzer: &'a dyn FrameAnalyzer,
        attributes: &'a dyn AttributeEstimator,
        config: ProcessorConfig,
    ) -> Result<Self, ProcessError> {
        config.validate()?;
        Ok(Self {
            analyzer,
            attributes,
            config,
        })
    }

    /// Dispatches on the file extension: known image extensions run in
    /// single-image mode, everything else is decoded as video.
    pub fn process(&self, path: &Path) -> Result<(ProcessReport, JobWorkspace), ProcessError> {
        if is_image_path(path) {
            self.process_image(path)
        } else {
            self.process_video(path)
        }
    }

    pub fn process_video(&self, path: &Path) -> Result<(ProcessReport, JobWorkspace), ProcessError> {
        let mut source = FfmpegVideoSource::open(path).map_err(|e| ProcessError::media(path, e))?;
        log::info!("Processing video {}", path.display());
        self.run_video(&mut source)
    }

    pub fn process_image(&self, path: &Path) -> Result<(ProcessReport, JobWorkspace), ProcessError> {
        let mut source = ImageFileSource::open(path).map_err(|e| ProcessError::media(path, e))?;
        log::info!("Processing image {}", path.display());
        self.run_image(&mut source)
    }

    fn run_video(
        &self,
        source: &mut dyn FrameSource,
    ) -> Result<(ProcessReport, JobWorkspace), ProcessError> {
        let media = MediaSummary::from(source.info());
        let sampler = FrameSampler::new(&self.config);
        let params = self.config.analysis_params();
        let stage = run_frame_stage(
            source,
            &sampler,
            self.analyzer,
            &params,
            self.config.max_workers,
        )?;
        log::info!(
            "Frame stage yielded {} observations over {} frames",
            stage.observations.len(),
            stage.processed_frames
        );

        // Observations without embeddings cannot cluster
        let mut embedded = Vec::with_capacity(stage.observations.len());
        let mut unembedded = 0usize;
        for observation in stage.observations {
            if observation.face.has_embedding() {
                embedded.push(observation);
            } else {
                unembedded += 1;
            }
        }
        if unembedded > 0 {
            log::warn!("{unembedded} observations lack embeddings, excluded from clustering");
        }

        let embeddings: Vec<Vec<f32>> = embedded
            .iter()
            .filter_map(|o| o.face.normed_embedding.clone())
            .collect();
        let labels = dbscan::cluster(
            &embeddings,
            self.config.similarity_threshold,
            self.config.min_faces_in_group,
        );

        let mut clusters: BTreeMap<usize, Vec<FaceObservation>> = BTreeMap::new();
        for (observation, label) in embedded.into_iter().zip(labels) {
            if let Some(id) = label {
                clusters.entry(id).or_default().push(observation);
            }
        }

        let groups: Vec<(usize, FaceGroup)> = clusters
            .into_iter()
            .map(|(id, members)| (id, FaceGroup::new(members, stage.processed_frames)))
            .collect();
        let formed = groups.len();
        let retained: Vec<(usize, FaceGroup)> = groups
            .into_iter()
            .filter(|(_, g)| {
                g.passes_filter(self.config.min_appearance_ratio, self.config.min_frontality)
            })
            .collect();
        let is_change_index = retained.len() != formed;
        if is_change_index {
            log::info!(
                "Quality filter removed {} of {formed} groups",
                formed - retained.len()
            );
        }

        let workspace = JobWorkspace::create()?;
        let renderer = self.renderer();

        let mut faces = Vec::with_capacity(retained.len());
        for (label, group) in &retained {
            let representative = group.representative();
            let (gender, age) = self.estimate_attributes(representative);
            let name = format!("{}_{label}", representative.frame_number);
            let avatar = renderer.render(representative, &workspace.avatar_path(&name))?;
            faces.push(FaceRecord {
                name,
                group_size: Some(group.members.len()),
                index: representative.index,
                bounding_box: representative.face.bounding_box.to_array(),
                detector: representative.face.detector_score,
                landmarker: representative.face.landmarker_score,
                gender,
                age,
                metrics: Some(group.metrics.clone()),
                avatar: Some(avatar),
            });
        }

        Ok((
            ProcessReport {
                is_change_index,
                faces,
                processed_frames: stage.processed_frames,
                media,
            },
            workspace,
        ))
    }

    /// Single-image mode: no clustering, one record per detection.
    fn run_image(
        &self,
        source: &mut dyn FrameSource,
    ) -> Result<(ProcessReport, JobWorkspace), ProcessError> {
        let media = MediaSummary::from(source.info());
        let file_name = source
            .info()
            .file_name()
            .unwrap_or_else(|| "image".to_string());
        let sampler = FrameSampler::new(&self.config);
        let params = self.config.analysis_params();
        let stage = run_frame_stage(source, &sampler, self.analyzer, &params, 1)?;

        let workspace = JobWorkspace::create()?;
        let renderer = self.renderer();

        let mut faces = Vec::with_capacity(stage.observations.len());
        for observation in &stage.observations {
            let (gender, age) = self.estimate_attributes(observation);
            let avatar_name = format!("{file_name}_{}", observation.index);
            let avatar = renderer.render(observation, &workspace.avatar_path(&avatar_name))?;
            faces.push(FaceRecord {
                name: file_name.clone(),
                group_size: None,
                index: observation.index,
                bounding_box: observation.face.bounding_box.to_array(),
                detector: observation.face.detector_score,
                landmarker: observation.face.landmarker_score,
                gender,
                age,
                metrics: None,
                avatar: Some(avatar),
            });
        }

        Ok((
            ProcessReport {
                is_change_index: false,
                faces,
                processed_frames: stage.processed_frames,
                media,
            },
            workspace,
        ))
    }

    fn renderer(&self) -> AvatarRenderer {
        AvatarRenderer::new(
            self.config.avatar_size,
            self.config.avatar_padding,
            self.config.avatar_quality,
        )
    }

    /// Gender/age from the retained patch; failure leaves both unset.
    fn estimate_attributes(&self, observation: &FaceObservation) -> (Option<u8>, Option<u32>) {
        let local = observation.patch.local_bbox(&observation.face.bounding_box);
        match self.attributes.estimate(&observation.patch.pixels, &local) {
            Ok(reading) => (Some(reading.gender), Some(reading.age)),
            Err(e) => {
                log::warn!(
                    "Attribute estimation failed for frame {}: {e}",
                    observation.frame_number
                );
                (None, None)
            }
        }
    }
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}
