pub mod peaks;

pub use peaks::{detect_r_peaks, local_maxima};

use crate::config::PeakConfig;
use crate::error::BeatResult;
use crate::signal::Events;

/// Finds beat locations in a filtered trace.
pub trait PeakDetector: Send + Sync {
    fn name(&self) -> &'static str;
    fn detect(&self, data: &[f64], fs: f64) -> BeatResult<Events>;
}

/// Local maxima above a height threshold with refractory non-maximum suppression.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdPeakDetector {
    pub config: PeakConfig,
}

impl ThresholdPeakDetector {
    pub fn new(config: PeakConfig) -> Self {
        Self { config }
    }
}

impl PeakDetector for ThresholdPeakDetector {
    fn name(&self) -> &'static str {
        "threshold-nms"
    }

    fn detect(&self, data: &[f64], fs: f64) -> BeatResult<Events> {
        detect_r_peaks(data, fs, &self.config)
    }
}
