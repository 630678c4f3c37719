pub mod butterworth;
pub mod zero_phase;

pub use butterworth::{Section, SosFilter};

use crate::config::FilterSpec;
use crate::error::BeatResult;

/// Conditions a raw trace. Implementations must return exactly `data.len()` samples and
/// must not shift events in time.
pub trait SignalFilter: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, data: &[f64], fs: f64) -> BeatResult<Vec<f64>>;
}

/// Zero-phase Butterworth band-pass, designed for whatever `fs` it is applied at.
#[derive(Debug, Clone, Copy, Default)]
pub struct ButterworthBandpass {
    pub spec: FilterSpec,
}

impl ButterworthBandpass {
    pub fn new(spec: FilterSpec) -> Self {
        Self { spec }
    }
}

impl SignalFilter for ButterworthBandpass {
    fn name(&self) -> &'static str {
        "butterworth-bandpass"
    }

    fn apply(&self, data: &[f64], fs: f64) -> BeatResult<Vec<f64>> {
        bandpass_filter(data, fs, &self.spec)
    }
}

/// Design a band-pass for `fs` and run it forward and backward over `data`.
pub fn bandpass_filter(data: &[f64], fs: f64, spec: &FilterSpec) -> BeatResult<Vec<f64>> {
    SosFilter::bandpass(spec, fs)?.filtfilt(data, fs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BeatError;

    #[test]
    fn output_length_matches_input() {
        let data: Vec<f64> = (0..777).map(|i| ((i * 7919) % 13) as f64 - 6.0).collect();
        let out = bandpass_filter(&data, 250.0, &FilterSpec::default()).expect("filter");
        assert_eq!(out.len(), data.len());
    }

    #[test]
    fn highcut_at_or_above_nyquist_is_invalid() {
        for highcut in [125.0, 200.0] {
            let spec = FilterSpec {
                highcut_hz: highcut,
                ..FilterSpec::default()
            };
            assert!(matches!(
                bandpass_filter(&[0.0; 100], 250.0, &spec),
                Err(BeatError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn removes_baseline_offset_and_drift() {
        let fs = 250.0;
        let data: Vec<f64> = (0..5000)
            .map(|i| {
                let t = i as f64 / fs;
                5.0 + 2.0 * (2.0 * std::f64::consts::PI * 0.05 * t).sin()
                    + (2.0 * std::f64::consts::PI * 10.0 * t).sin()
            })
            .collect();
        let out = ButterworthBandpass::default().apply(&data, fs).expect("filter");
        let interior = &out[500..4500];
        let mean = interior.iter().sum::<f64>() / interior.len() as f64;
        assert!(mean.abs() < 0.05, "residual offset {mean}");
        let peak = interior.iter().cloned().fold(f64::MIN, f64::max);
        assert!((peak - 1.0).abs() < 0.05, "passband amplitude {peak}");
    }
}
