//! Parallel per-frame stage: one sequential decoder feeding a bounded
//! worker pool, gathered back into frame order at a single barrier.

use std::collections::BTreeMap;

use crate::detection::domain::frame_analyzer::{AnalysisParams, FrameAnalyzer};
use crate::detection::domain::observation::FaceObservation;
use crate::error::ProcessError;
use crate::media::domain::frame_source::FrameSource;
use crate::pipeline::sampler::FrameSampler;
use crate::shared::frame::Frame;

const PROGRESS_LOG_INTERVAL: u64 = 100;

pub struct FrameStageOutput {
    /// Observations in ascending frame order, left to right within a
    /// frame. Deterministic, so clustering input order is reproducible.
    pub observations: Vec<FaceObservation>,
    /// Eligible frames handed to workers, the appearance-ratio
    /// denominator.
    pub processed_frames: u64,
}

/// Decodes sequentially, analyzes eligible frames on `max_workers`
/// threads, and gathers results in frame order.
///
/// Decode and per-frame analysis failures are logged and skipped; only a
/// worker panic fails the stage.
pub fn run_frame_stage(
    source: &mut dyn FrameSource,
    sampler: &FrameSampler,
    analyzer: &dyn FrameAnalyzer,
    params: &AnalysisParams,
    max_workers: usize,
) -> Result<FrameStageOutput, ProcessError> {
    let workers = max_workers.max(1);
    // Bounded so the decoder cannot run far ahead of the pool
    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Frame>(workers * 2);
    let (result_tx, result_rx) =
        crossbeam_channel::unbounded::<(u64, Vec<FaceObservation>)>();

    let mut processed_frames: u64 = 0;

    std::thread::scope(|scope| -> Result<(), ProcessError> {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let frame_rx = frame_rx.clone();
            let result_tx = result_tx.clone();
            handles.push(scope.spawn(move || {
                for frame in frame_rx.iter() {
                    let number = frame.number();
                    let observations = match analyzer.analyze(&frame, params) {
                        Ok(observations) => observations,
                        Err(e) => {
                            log::warn!("Frame {number} analysis failed, skipping: {e}");
                            Vec::new()
                        }
                    };
                    if result_tx.send((number, observations)).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(frame_rx);
        drop(result_tx);

        for item in source.frames() {
            let frame = match item {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Frame decode failed, skipping: {e}");
                    continue;
                }
            };
            if !sampler.is_eligible(frame.number()) {
                continue;
            }
            processed_frames += 1;
            if processed_frames % PROGRESS_LOG_INTERVAL == 0 {
                log::info!("Processed {processed_frames} frames");
            }
            if frame_tx.send(frame).is_err() {
                break;
            }
        }
        drop(frame_tx);

        let mut panicked = false;
        for handle in handles {
            if handle.join().is_err() {
                panicked = true;
            }
        }
        if panicked {
            return Err(ProcessError::Worker);
        }
        Ok(())
    })?;

    let by_frame: BTreeMap<u64, Vec<FaceObservation>> = result_rx.iter().collect();
    let observations = by_frame.into_values().flatten().collect();

    Ok(FrameStageOutput {
        observations,
        processed_frames,
    })
}
