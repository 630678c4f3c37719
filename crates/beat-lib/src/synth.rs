//! Synthetic ECG-like traces for demos and tests.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::signal::TimeSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticEcg {
    pub fs: f64,
    pub duration_s: f64,
    pub heart_rate_bpm: f64,
    /// Gaussian R-wave amplitude.
    pub r_amplitude: f64,
    /// Gaussian R-wave width (standard deviation, seconds).
    pub r_width_s: f64,
    /// Amplitude of a sinusoid at the beat frequency, peaking with each R-wave.
    pub carrier_amplitude: f64,
    /// Slow baseline wander (amplitude, Hz).
    pub wander_amplitude: f64,
    pub wander_hz: f64,
    /// Peak amplitude of uniform white noise.
    pub noise_amplitude: f64,
    pub seed: u64,
}

impl Default for SyntheticEcg {
    fn default() -> Self {
        Self {
            fs: 250.0,
            duration_s: 10.0,
            heart_rate_bpm: 72.0,
            r_amplitude: 1.0,
            r_width_s: 0.01,
            carrier_amplitude: 0.2,
            wander_amplitude: 0.0,
            wander_hz: 0.15,
            noise_amplitude: 0.0,
            seed: 7,
        }
    }
}

impl SyntheticEcg {
    /// Seconds between beats, `None` unless the rate is positive and finite.
    pub fn beat_interval_s(&self) -> Option<f64> {
        let interval = 60.0 / self.heart_rate_bpm;
        (interval.is_finite() && interval > 0.0).then_some(interval)
    }

    /// Sample indices where R-waves are centred. Empty without a usable rate.
    pub fn beat_indices(&self) -> Vec<usize> {
        let Some(interval) = self.beat_interval_s() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut t = interval / 4.0;
        while t < self.duration_s {
            out.push((t * self.fs).round() as usize);
            t += interval;
        }
        out
    }

    pub fn generate(&self) -> TimeSeries {
        let n = (self.duration_s * self.fs).round() as usize;
        // Without a rhythm the trace is wander and noise only.
        let (beat_hz, first, carrier) = match self.beat_interval_s() {
            Some(interval) => (1.0 / interval, interval / 4.0, self.carrier_amplitude),
            None => (0.0, 0.0, 0.0),
        };
        let beats: Vec<f64> = self
            .beat_indices()
            .iter()
            .map(|&i| i as f64 / self.fs)
            .collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let data = (0..n)
            .map(|i| {
                let t = i as f64 / self.fs;
                let mut v = carrier * (2.0 * PI * beat_hz * (t - first)).cos();
                v += self.wander_amplitude * (2.0 * PI * self.wander_hz * t).sin();
                for &bt in &beats {
                    let z = (t - bt) / self.r_width_s;
                    if z.abs() < 8.0 {
                        v += self.r_amplitude * (-0.5 * z * z).exp();
                    }
                }
                if self.noise_amplitude > 0.0 {
                    v += rng.gen_range(-self.noise_amplitude..=self.noise_amplitude);
                }
                v
            })
            .collect();
        TimeSeries::new(self.fs, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_and_beats() {
        let synth = SyntheticEcg::default();
        let ts = synth.generate();
        assert_eq!(ts.len(), 2500);
        assert_eq!(synth.beat_indices().len(), 12);
        let beat = synth.beat_indices()[3];
        assert!(ts.data[beat] > ts.data[beat - 10]);
        assert!(ts.data[beat] > ts.data[beat + 10]);
    }

    #[test]
    fn seeded_noise_is_reproducible() {
        let synth = SyntheticEcg {
            noise_amplitude: 0.05,
            ..SyntheticEcg::default()
        };
        assert_eq!(synth.generate().data, synth.generate().data);
        let other = SyntheticEcg { seed: 8, ..synth };
        assert_ne!(synth.generate().data, other.generate().data);
    }

    #[test]
    fn non_positive_rate_has_no_beats() {
        for bpm in [0.0, -60.0, f64::NAN, f64::INFINITY] {
            let synth = SyntheticEcg {
                heart_rate_bpm: bpm,
                noise_amplitude: 0.01,
                ..SyntheticEcg::default()
            };
            assert_eq!(synth.beat_interval_s(), None);
            assert!(synth.beat_indices().is_empty());
            let ts = synth.generate();
            assert_eq!(ts.len(), 2500);
            assert!(ts.data.iter().all(|v| v.abs() <= 0.01), "bpm {bpm}");
        }
    }
}
