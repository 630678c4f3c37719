pub mod rate;

pub use rate::{calculate_bpm, RateEstimate};

use crate::error::BeatResult;
use crate::signal::Events;

/// Turns beat locations into a rate.
pub trait RateEstimator: Send + Sync {
    fn name(&self) -> &'static str;
    fn estimate(&self, events: &Events, fs: f64) -> BeatResult<RateEstimate>;
}

/// Reciprocal of the arithmetic mean RR interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanIntervalEstimator;

impl RateEstimator for MeanIntervalEstimator {
    fn name(&self) -> &'static str {
        "mean-rr"
    }

    fn estimate(&self, events: &Events, fs: f64) -> BeatResult<RateEstimate> {
        calculate_bpm(events, fs)
    }
}
