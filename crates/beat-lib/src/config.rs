use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{check_fs, BeatError, BeatResult};

/// Band edges and order of the Butterworth band-pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Lower cutoff (Hz); removes baseline wander.
    pub lowcut_hz: f64,
    /// Upper cutoff (Hz); must stay below Nyquist.
    pub highcut_hz: f64,
    /// Prototype order. The band-pass has `order` second-order sections.
    pub order: usize,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            lowcut_hz: 0.5,
            highcut_hz: 40.0,
            order: 4,
        }
    }
}

impl FilterSpec {
    pub fn validate(&self, fs: f64) -> BeatResult<()> {
        check_fs(fs)?;
        let nyquist = 0.5 * fs;
        if self.order < 1 {
            return Err(BeatError::InvalidParameter(
                "filter order must be at least 1".into(),
            ));
        }
        if !(self.lowcut_hz.is_finite() && self.lowcut_hz > 0.0) {
            return Err(BeatError::InvalidParameter(format!(
                "lowcut must be positive, got {} Hz",
                self.lowcut_hz
            )));
        }
        if !(self.highcut_hz.is_finite() && self.lowcut_hz < self.highcut_hz) {
            return Err(BeatError::InvalidParameter(format!(
                "lowcut ({} Hz) must be below highcut ({} Hz)",
                self.lowcut_hz, self.highcut_hz
            )));
        }
        if self.highcut_hz >= nyquist {
            return Err(BeatError::InvalidParameter(format!(
                "highcut ({} Hz) must be below the Nyquist frequency ({} Hz)",
                self.highcut_hz, nyquist
            )));
        }
        Ok(())
    }
}

/// How the minimum peak height is derived from the filtered signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ThresholdStrategy {
    /// Arithmetic mean of the whole filtered sequence.
    #[default]
    Mean,
    /// Mean plus `k` population standard deviations.
    MeanPlusStd { k: f64 },
    /// Absolute amplitude in signal units.
    Fixed { value: f64 },
}

impl ThresholdStrategy {
    pub fn threshold(&self, data: &[f64]) -> f64 {
        match *self {
            ThresholdStrategy::Mean => mean(data),
            ThresholdStrategy::MeanPlusStd { k } => {
                let m = mean(data);
                let var =
                    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len().max(1) as f64;
                m + k * var.sqrt()
            }
            ThresholdStrategy::Fixed { value } => value,
        }
    }
}

fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        0.0
    } else {
        data.iter().sum::<f64>() / data.len() as f64
    }
}

/// R-peak picking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    /// Refractory distance between accepted peaks (seconds). 0.6 s caps the
    /// detectable rate at 100 BPM; lower it for tachycardic recordings.
    pub min_distance_s: f64,
    pub threshold: ThresholdStrategy,
    /// A trace whose peak-to-peak span is at or below this is treated as flat. The value is
    /// absolute, in units of the trace the detector sees. The band-pass maps an exactly
    /// constant recording to zeros, but a near-constant one at level `L` leaves rounding
    /// residue of roughly `1e-16 * L`; raise this for recordings with a large offset.
    pub flat_tolerance: f64,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            min_distance_s: 0.6,
            threshold: ThresholdStrategy::Mean,
            flat_tolerance: 1e-9,
        }
    }
}

impl PeakConfig {
    /// Refractory distance in whole samples, never below one.
    pub fn min_distance_samples(&self, fs: f64) -> usize {
        ((self.min_distance_s * fs).ceil() as usize).max(1)
    }

    pub fn validate(&self, fs: f64) -> BeatResult<()> {
        check_fs(fs)?;
        if !(self.min_distance_s.is_finite() && self.min_distance_s > 0.0) {
            return Err(BeatError::InvalidParameter(format!(
                "minimum peak distance must be positive, got {} s",
                self.min_distance_s
            )));
        }
        if !(self.flat_tolerance.is_finite() && self.flat_tolerance >= 0.0) {
            return Err(BeatError::InvalidParameter(format!(
                "flat tolerance must be non-negative, got {}",
                self.flat_tolerance
            )));
        }
        match self.threshold {
            ThresholdStrategy::MeanPlusStd { k } if !k.is_finite() => Err(
                BeatError::InvalidParameter("threshold k must be finite".into()),
            ),
            ThresholdStrategy::Fixed { value } if !value.is_finite() => Err(
                BeatError::InvalidParameter("fixed threshold must be finite".into()),
            ),
            _ => Ok(()),
        }
    }
}

/// Everything one pipeline run needs. Independent configs can run side by side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sampling rate (Hz) shared by every stage.
    pub fs: f64,
    pub filter: FilterSpec,
    pub peaks: PeakConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fs: 250.0,
            filter: FilterSpec::default(),
            peaks: PeakConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> BeatResult<()> {
        self.filter.validate(self.fs)?;
        self.peaks.validate(self.fs)
    }

    /// Parse a TOML document; missing keys fall back to the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: PipelineConfig = toml::from_str(text).context("parsing pipeline config")?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_conventional_ecg_band() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.fs, 250.0);
        assert_eq!(cfg.filter.lowcut_hz, 0.5);
        assert_eq!(cfg.filter.highcut_hz, 40.0);
        assert_eq!(cfg.filter.order, 4);
        assert_eq!(cfg.peaks.min_distance_s, 0.6);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn highcut_at_nyquist_is_rejected() {
        let spec = FilterSpec {
            highcut_hz: 125.0,
            ..FilterSpec::default()
        };
        assert!(matches!(
            spec.validate(250.0),
            Err(BeatError::InvalidParameter(_))
        ));
    }

    #[test]
    fn inverted_band_and_zero_order_are_rejected() {
        let inverted = FilterSpec {
            lowcut_hz: 40.0,
            highcut_hz: 0.5,
            order: 4,
        };
        assert!(inverted.validate(250.0).is_err());
        let zero = FilterSpec {
            order: 0,
            ..FilterSpec::default()
        };
        assert!(zero.validate(250.0).is_err());
    }

    #[test]
    fn distance_rounds_up_to_whole_samples() {
        let peaks = PeakConfig::default();
        assert_eq!(peaks.min_distance_samples(250.0), 150);
        assert_eq!(peaks.min_distance_samples(360.0), 216);
        assert_eq!(peaks.min_distance_samples(1.0), 1);
    }

    #[test]
    fn threshold_strategies() {
        let data = [0.0, 2.0, 4.0];
        assert_eq!(ThresholdStrategy::Mean.threshold(&data), 2.0);
        assert_eq!(ThresholdStrategy::Fixed { value: 3.5 }.threshold(&data), 3.5);
        let std = (8.0f64 / 3.0).sqrt();
        let t = ThresholdStrategy::MeanPlusStd { k: 1.0 }.threshold(&data);
        assert!((t - (2.0 + std)).abs() < 1e-12);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = PipelineConfig::from_toml_str(
            r#"
            fs = 360.0

            [filter]
            highcut_hz = 30.0

            [peaks.threshold]
            kind = "fixed"
            value = 0.4
            "#,
        )
        .expect("parse config");
        assert_eq!(cfg.fs, 360.0);
        assert_eq!(cfg.filter.highcut_hz, 30.0);
        assert_eq!(cfg.filter.lowcut_hz, 0.5);
        assert_eq!(cfg.peaks.min_distance_s, 0.6);
        assert_eq!(cfg.peaks.threshold, ThresholdStrategy::Fixed { value: 0.4 });
    }
}
