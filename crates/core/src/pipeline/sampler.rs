use std::collections::HashSet;

use crate::pipeline::config::ProcessorConfig;

/// Pure frame-eligibility predicate, snapshotted from the job config.
///
/// Decoding stays sequential; ineligible frames are decoded and dropped
/// without further work.
pub struct FrameSampler {
    start_frame: u64,
    end_frame: Option<u64>,
    sample_interval: u64,
    ignore_frames: HashSet<u64>,
    ignore_ranges: Vec<(u64, u64)>,
}

impl FrameSampler {
    pub fn new(config: &ProcessorConfig) -> Self {
        Self {
            start_frame: config.start_frame,
            end_frame: config.end_frame,
            sample_interval: config.sample_interval.max(1),
            ignore_frames: config.ignore_frames.iter().copied().collect(),
            ignore_ranges: config.ignore_ranges.clone(),
        }
    }

    pub fn is_eligible(&self, frame: u64) -> bool {
        if frame < self.start_frame {
            return false;
        }
        if let Some(end) = self.end_frame {
            if frame > end {
                return false;
            }
        }
        if self.ignore_frames.contains(&frame) {
            return false;
        }
        if self.ignore_ranges.iter().any(|&(lo, hi)| lo <= frame && frame <= hi) {
            return false;
        }
        frame % self.sample_interval == 0
    }

    /// All eligible indices below `total_frames`, in order.
    pub fn eligible_frames(&self, total_frames: u64) -> Vec<u64> {
        (0..total_frames).filter(|&f| self.is_eligible(f)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(f: impl FnOnce(&mut ProcessorConfig)) -> ProcessorConfig {
        let mut config = ProcessorConfig::default();
        f(&mut config);
        config
    }

    #[test]
    fn test_interval_sampling_with_ignored_zero() {
        let config = config_with(|c| {
            c.sample_interval = 10;
            c.ignore_frames = vec![0];
        });
        let sampler = FrameSampler::new(&config);
        let expected: Vec<u64> = (1..10).map(|i| i * 10).collect();
        assert_eq!(sampler.eligible_frames(100), expected);
    }

    #[test]
    fn test_start_and_end_bounds() {
        let config = config_with(|c| {
            c.start_frame = 5;
            c.end_frame = Some(8);
        });
        let sampler = FrameSampler::new(&config);
        assert_eq!(sampler.eligible_frames(20), vec![5, 6, 7, 8]);
    }

    #[test]
    fn test_ignore_ranges_are_closed() {
        let config = config_with(|c| c.ignore_ranges = vec![(3, 6)]);
        let sampler = FrameSampler::new(&config);
        assert!(sampler.is_eligible(2));
        assert!(!sampler.is_eligible(3));
        assert!(!sampler.is_eligible(6));
        assert!(sampler.is_eligible(7));
    }

    #[test]
    fn test_every_frame_by_default() {
        let sampler = FrameSampler::new(&ProcessorConfig::default());
        assert_eq!(sampler.eligible_frames(5), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let config = config_with(|c| {
            c.sample_interval = 3;
            c.ignore_frames = vec![6, 9];
            c.ignore_ranges = vec![(20, 40)];
        });
        let sampler = FrameSampler::new(&config);
        assert_eq!(sampler.eligible_frames(60), sampler.eligible_frames(60));
    }
}
