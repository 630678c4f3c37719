use serde::{Deserialize, Serialize};

use crate::error::{check_fs, BeatError, BeatResult};
use crate::signal::{Events, RRSeries};

/// Mean heart rate over a run of detected beats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEstimate {
    /// Number of beats the estimate is based on.
    pub beats: usize,
    /// Mean RR interval (seconds), unrounded.
    pub mean_rr_s: f64,
    /// Beats per minute, rounded to two decimals for reporting.
    pub bpm: f64,
    pub rr: RRSeries,
}

/// `60 / mean(RR)` over consecutive peak pairs.
pub fn calculate_bpm(events: &Events, fs: f64) -> BeatResult<RateEstimate> {
    check_fs(fs)?;
    if events.len() < 2 {
        return Err(BeatError::InsufficientData {
            peaks: events.len(),
        });
    }
    if let Some((index, w)) = events
        .indices
        .windows(2)
        .enumerate()
        .find(|(_, w)| w[1] <= w[0])
    {
        return Err(BeatError::InvalidInterval {
            index,
            samples: w[1] as i64 - w[0] as i64,
        });
    }

    let rr = RRSeries::from_events(events, fs);
    let mean_rr_s = rr.mean().ok_or(BeatError::InsufficientData {
        peaks: events.len(),
    })?;
    Ok(RateEstimate {
        beats: events.len(),
        mean_rr_s,
        bpm: round_to(60.0 / mean_rr_s, 2),
        rr,
    })
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
