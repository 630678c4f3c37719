use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failures raised by the signal stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BeatError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("filter design failed: {0}")]
    FilterDesign(String),
    #[error("insufficient data: {peaks} peak(s) found, at least 2 are needed to form an RR interval")]
    InsufficientData { peaks: usize },
    #[error("RR interval {index} is non-positive ({samples} samples)")]
    InvalidInterval { index: usize, samples: i64 },
    #[error("empty input: no samples supplied")]
    EmptyInput,
}

pub type BeatResult<T> = Result<T, BeatError>;

/// Pipeline stage that produced a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Filter,
    PeakDetection,
    RateEstimation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Filter => "band-pass filter",
            Stage::PeakDetection => "peak detection",
            Stage::RateEstimation => "rate estimation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: BeatError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: BeatError) -> Self {
        Self { stage, source }
    }
}

pub(crate) fn check_fs(fs: f64) -> BeatResult<()> {
    if fs.is_finite() && fs > 0.0 {
        Ok(())
    } else {
        Err(BeatError::InvalidParameter(format!(
            "sampling rate must be positive and finite, got {fs}"
        )))
    }
}
