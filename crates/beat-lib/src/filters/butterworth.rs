//! Butterworth band-pass design as cascaded second-order sections.
//!
//! The analog low-pass prototype has its `order` poles evenly spaced on the left half of
//! the unit circle. Band edges are normalized by Nyquist and pre-warped with
//! `tan(pi * w / 2)`, the prototype is shifted to a band-pass around
//! `w0 = sqrt(w_lo * w_hi)` with bandwidth `w_hi - w_lo`, and each analog pole is mapped to
//! the z-plane through the bilinear transform `s = (z - 1) / (z + 1)`. Every section keeps
//! one zero at DC and one at Nyquist, so the numerators are all `[1, 0, -1]` up to gain.

use log::debug;
use realfft::num_complex::Complex64;
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::zero_phase;
use crate::config::FilterSpec;
use crate::error::{check_fs, BeatError, BeatResult};

const IMAG_EPS: f64 = 1e-12;

/// One biquad: `b0 + b1 z^-1 + b2 z^-2` over `1 + a1 z^-1 + a2 z^-2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Numerator coefficients [b0, b1, b2]
    pub b: [f64; 3],
    /// Denominator coefficients [a0 = 1, a1, a2]
    pub a: [f64; 3],
}

impl Section {
    fn from_poles(p1: Complex64, p2: Complex64) -> Self {
        Self {
            b: [1.0, 0.0, -1.0],
            a: [1.0, -(p1 + p2).re, (p1 * p2).re],
        }
    }

    /// Jury criterion for a monic second-order denominator.
    fn is_stable(&self) -> bool {
        let [_, a1, a2] = self.a;
        a2.abs() < 1.0 && a1.abs() < 1.0 + a2
    }

    fn is_finite(&self) -> bool {
        self.b.iter().chain(self.a.iter()).all(|c| c.is_finite())
    }

    fn response(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        let num = z_inv * self.b[1] + z_inv2 * self.b[2] + self.b[0];
        let den = z_inv * self.a[1] + z_inv2 * self.a[2] + self.a[0];
        num / den
    }
}

/// Coefficients for one `(fs, FilterSpec)` pair. Applying them at any other sampling
/// rate is refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SosFilter {
    fs: f64,
    spec: FilterSpec,
    sections: Vec<Section>,
}

impl SosFilter {
    /// Design a band-pass of `spec.order` sections for sampling rate `fs`.
    pub fn bandpass(spec: &FilterSpec, fs: f64) -> BeatResult<Self> {
        spec.validate(fs)?;
        let nyquist = 0.5 * fs;
        let w_lo = (PI * (spec.lowcut_hz / nyquist) / 2.0).tan();
        let w_hi = (PI * (spec.highcut_hz / nyquist) / 2.0).tan();
        let bw = w_hi - w_lo;
        let w0 = (w_lo * w_hi).sqrt();

        let n = spec.order;
        let mut poles = Vec::with_capacity(2 * n);
        let mut sections = Vec::with_capacity(n);
        for k in 0..n {
            let theta = PI * (2 * k + n + 1) as f64 / (2 * n) as f64;
            let proto = Complex64::from_polar(1.0, theta);
            if proto.im < -IMAG_EPS {
                // covered by the conjugate pole in the upper half-plane
                continue;
            }
            let half = proto * (bw / 2.0);
            let root = (half * half - w0 * w0).sqrt();
            let z1 = bilinear(half + root);
            let z2 = bilinear(half - root);
            poles.push(z1);
            poles.push(z2);
            if proto.im.abs() <= IMAG_EPS {
                // real prototype pole (odd order): its two band-pass poles share a section
                sections.push(Section::from_poles(z1, z2));
            } else {
                sections.push(Section::from_poles(z1, z1.conj()));
                sections.push(Section::from_poles(z2, z2.conj()));
            }
        }

        if let Some(p) = poles.iter().find(|p| !(p.norm() < 1.0)) {
            return Err(BeatError::FilterDesign(format!(
                "pole {:.6}{:+.6}i lies on or outside the unit circle",
                p.re, p.im
            )));
        }
        if let Some(idx) = sections.iter().position(|s| !s.is_finite() || !s.is_stable()) {
            return Err(BeatError::FilterDesign(format!(
                "section {idx} has unstable or non-finite coefficients"
            )));
        }

        let mut filter = Self {
            fs,
            spec: *spec,
            sections,
        };
        let centre = 2.0 * w0.atan();
        let gain = filter.response_at_normalized(centre).norm();
        if !(gain.is_finite() && gain > 0.0) {
            return Err(BeatError::FilterDesign(format!(
                "passband gain is degenerate ({gain})"
            )));
        }
        if let Some(first) = filter.sections.first_mut() {
            for b in first.b.iter_mut() {
                *b /= gain;
            }
        }
        debug!(
            "designed order-{} band-pass {}-{} Hz at {} Hz: {:?}",
            spec.order, spec.lowcut_hz, spec.highcut_hz, fs, filter.sections
        );
        Ok(filter)
    }

    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Zero-phase forward-backward application. `fs` must be the rate the filter was
    /// designed for.
    pub fn filtfilt(&self, data: &[f64], fs: f64) -> BeatResult<Vec<f64>> {
        check_fs(fs)?;
        if (self.fs - fs).abs() > 1e-9 * self.fs {
            return Err(BeatError::InvalidParameter(format!(
                "coefficients designed for {} Hz cannot filter a {} Hz signal",
                self.fs, fs
            )));
        }
        if data.is_empty() {
            return Err(BeatError::EmptyInput);
        }
        // Every section has a zero at DC, so the exact response to a constant is zero.
        if data.iter().all(|&x| x == data[0]) {
            debug!("constant input of {} samples filters to zero", data.len());
            return Ok(vec![0.0; data.len()]);
        }
        Ok(zero_phase::filtfilt(&self.sections, data))
    }

    /// Single forward pass from rest. Output is delayed by the filter's group delay.
    pub fn filter_causal(&self, data: &[f64]) -> Vec<f64> {
        let mut state = vec![[0.0; 2]; self.sections.len()];
        zero_phase::sosfilt(&self.sections, data, &mut state)
    }

    /// Magnitude of the single-pass response at `freq_hz`.
    pub fn magnitude_at(&self, freq_hz: f64) -> f64 {
        self.response_at_normalized(PI * freq_hz / (0.5 * self.fs)).norm()
    }

    fn response_at_normalized(&self, omega: f64) -> Complex64 {
        let z_inv = Complex64::from_polar(1.0, -omega);
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(z_inv))
    }

    /// Magnitude response `[freq_hz, |H|]` from the FFT of an `n_fft`-sample impulse
    /// response.
    pub fn frequency_response(&self, n_fft: usize) -> BeatResult<Vec<[f64; 2]>> {
        if n_fft < 2 {
            return Err(BeatError::InvalidParameter(
                "frequency response needs at least 2 points".into(),
            ));
        }
        let mut impulse = vec![0.0; n_fft];
        impulse[0] = 1.0;
        let mut buffer = self.filter_causal(&impulse);
        let mut planner = RealFftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n_fft);
        let mut spectrum = fft.make_output_vec();
        fft.process(&mut buffer, &mut spectrum)
            .map_err(|e| BeatError::FilterDesign(format!("impulse response FFT failed: {e}")))?;
        let df = self.fs / n_fft as f64;
        Ok(spectrum
            .iter()
            .enumerate()
            .map(|(i, c)| [i as f64 * df, c.norm()])
            .collect())
    }
}

fn bilinear(s: Complex64) -> Complex64 {
    let one = Complex64::new(1.0, 0.0);
    (one + s) / (one - s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_filter() -> SosFilter {
        SosFilter::bandpass(&FilterSpec::default(), 250.0).expect("design")
    }

    #[test]
    fn one_section_per_order() {
        for order in 1..=8 {
            let spec = FilterSpec {
                order,
                ..FilterSpec::default()
            };
            let filter = SosFilter::bandpass(&spec, 250.0).expect("design");
            assert_eq!(filter.sections().len(), order);
            assert!(filter.sections().iter().all(|s| s.is_stable()));
        }
    }

    #[test]
    fn unity_gain_in_passband_and_attenuation_outside() {
        let filter = default_filter();
        assert!((filter.magnitude_at(10.0) - 1.0).abs() < 0.01);
        assert!((filter.magnitude_at(0.5) - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.01);
        assert!((filter.magnitude_at(40.0) - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.01);
        assert!(filter.magnitude_at(0.05) < 0.01);
        assert!(filter.magnitude_at(100.0) < 0.01);
    }

    #[test]
    fn zeros_at_dc_and_nyquist() {
        let filter = default_filter();
        assert!(filter.magnitude_at(0.0) < 1e-9);
        assert!(filter.magnitude_at(125.0) < 1e-9);
    }

    #[test]
    fn odd_order_designs_are_stable() {
        let spec = FilterSpec {
            lowcut_hz: 5.0,
            highcut_hz: 15.0,
            order: 3,
        };
        let filter = SosFilter::bandpass(&spec, 360.0).expect("design");
        assert_eq!(filter.sections().len(), 3);
        assert!((filter.magnitude_at((5.0f64 * 15.0).sqrt()) - 1.0).abs() < 0.02);
    }

    #[test]
    fn fft_response_agrees_with_analytic_response() {
        let filter = default_filter();
        let response = filter.frequency_response(4096).expect("response");
        assert_eq!(response.len(), 4096 / 2 + 1);
        let bin = response
            .iter()
            .min_by(|a, b| (a[0] - 10.0).abs().total_cmp(&(b[0] - 10.0).abs()))
            .expect("bins");
        assert!((bin[1] - filter.magnitude_at(bin[0])).abs() < 1e-3);
    }

    #[test]
    fn rejects_highcut_above_nyquist() {
        let spec = FilterSpec {
            highcut_hz: 130.0,
            ..FilterSpec::default()
        };
        assert!(matches!(
            SosFilter::bandpass(&spec, 250.0),
            Err(BeatError::InvalidParameter(_))
        ));
    }

    #[test]
    fn refuses_foreign_sampling_rate() {
        let filter = default_filter();
        let err = filter.filtfilt(&[0.0; 64], 500.0).unwrap_err();
        assert!(matches!(err, BeatError::InvalidParameter(_)));
    }

    #[test]
    fn rejects_empty_input() {
        let filter = default_filter();
        assert_eq!(filter.filtfilt(&[], 250.0), Err(BeatError::EmptyInput));
    }

    #[test]
    fn rejects_design_with_unstable_sections() {
        let spec = FilterSpec {
            lowcut_hz: 1e-9,
            highcut_hz: 2e-9,
            order: 8,
        };
        assert!(matches!(
            SosFilter::bandpass(&spec, 250.0),
            Err(BeatError::FilterDesign(_))
        ));
    }

    #[test]
    fn jury_test_flags_poles_outside_unit_circle() {
        let unstable = Section {
            b: [1.0, 0.0, -1.0],
            a: [1.0, -2.1, 1.2],
        };
        assert!(!unstable.is_stable());
        assert!(default_filter().sections().iter().all(Section::is_stable));
    }

    #[test]
    fn constant_input_filters_to_exact_zero_at_any_level() {
        let filter = default_filter();
        for level in [0.3, 1e7, -1e12] {
            let out = filter.filtfilt(&[level; 1000], 250.0).expect("filter");
            assert!(out.iter().all(|&x| x == 0.0), "level {level}");
        }
        let single = filter.filtfilt(&[5.0], 250.0).expect("filter");
        assert_eq!(single, vec![0.0]);
    }
}
