use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    config::PipelineConfig,
    detectors::{PeakDetector, ThresholdPeakDetector},
    error::{BeatError, PipelineError, Stage},
    filters::{ButterworthBandpass, SignalFilter},
    metrics::{MeanIntervalEstimator, RateEstimate, RateEstimator},
    signal::{Events, TimeSeries},
};

/// Heart-rate outcome handed to presenters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum HeartRate {
    Estimated(RateEstimate),
    /// Exactly one beat: no interval can be formed.
    Undetermined { peaks: usize },
    /// No beat at all.
    NoHeartbeat,
}

impl HeartRate {
    pub fn bpm(&self) -> Option<f64> {
        match self {
            HeartRate::Estimated(est) => Some(est.bpm),
            _ => None,
        }
    }
}

/// Everything a run produces: the raw and filtered traces, the beats, and the rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub fs: f64,
    pub raw: Vec<f64>,
    pub filtered: Vec<f64>,
    pub events: Events,
    pub heart_rate: HeartRate,
}

impl PipelineOutput {
    /// Compact form without the sample vectors.
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            fs: self.fs,
            sample_count: self.raw.len(),
            events: self.events.clone(),
            heart_rate: self.heart_rate.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub fs: f64,
    pub sample_count: usize,
    pub events: Events,
    pub heart_rate: HeartRate,
}

/// Filter, detect, estimate. Each stage is a strategy object and may be swapped without
/// touching the sequencing.
pub struct Pipeline {
    fs: f64,
    filter: Box<dyn SignalFilter>,
    detector: Box<dyn PeakDetector>,
    estimator: Box<dyn RateEstimator>,
}

impl Pipeline {
    pub fn new(
        fs: f64,
        filter: Box<dyn SignalFilter>,
        detector: Box<dyn PeakDetector>,
        estimator: Box<dyn RateEstimator>,
    ) -> Self {
        Self {
            fs,
            filter,
            detector,
            estimator,
        }
    }

    /// Butterworth band-pass, threshold peak picking, mean-RR rate.
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self::new(
            cfg.fs,
            Box::new(ButterworthBandpass::new(cfg.filter)),
            Box::new(ThresholdPeakDetector::new(cfg.peaks)),
            Box::new(MeanIntervalEstimator),
        )
    }

    pub fn run(&self, raw: &[f64]) -> Result<PipelineOutput, PipelineError> {
        info!(
            "running {} -> {} -> {} over {} samples at {} Hz",
            self.filter.name(),
            self.detector.name(),
            self.estimator.name(),
            raw.len(),
            self.fs
        );
        let filtered = self
            .filter
            .apply(raw, self.fs)
            .map_err(|e| PipelineError::new(Stage::Filter, e))?;
        if filtered.len() != raw.len() {
            return Err(PipelineError::new(
                Stage::Filter,
                BeatError::InvalidParameter(format!(
                    "filter returned {} samples for {} inputs",
                    filtered.len(),
                    raw.len()
                )),
            ));
        }

        let events = self
            .detector
            .detect(&filtered, self.fs)
            .map_err(|e| PipelineError::new(Stage::PeakDetection, e))?;

        let heart_rate = match self.estimator.estimate(&events, self.fs) {
            Ok(est) => {
                info!("{} beats, {:.2} BPM", est.beats, est.bpm);
                HeartRate::Estimated(est)
            }
            Err(BeatError::InsufficientData { peaks: 0 }) => {
                warn!("no heartbeat detected");
                HeartRate::NoHeartbeat
            }
            Err(BeatError::InsufficientData { peaks }) => {
                warn!("only {peaks} beat detected; rate undetermined");
                HeartRate::Undetermined { peaks }
            }
            Err(e) => return Err(PipelineError::new(Stage::RateEstimation, e)),
        };

        Ok(PipelineOutput {
            fs: self.fs,
            raw: raw.to_vec(),
            filtered,
            events,
            heart_rate,
        })
    }

    /// Run over a recording, which must carry the pipeline's sampling rate.
    pub fn run_series(&self, ts: &TimeSeries) -> Result<PipelineOutput, PipelineError> {
        if (ts.fs - self.fs).abs() > 1e-9 * self.fs {
            return Err(PipelineError::new(
                Stage::Filter,
                BeatError::InvalidParameter(format!(
                    "recording sampled at {} Hz but pipeline configured for {} Hz",
                    ts.fs, self.fs
                )),
            ));
        }
        self.run(&ts.data)
    }
}

/// Convenience wrapper: build the default strategies from `cfg` and run once.
pub fn run_pipeline(raw: &[f64], cfg: &PipelineConfig) -> Result<PipelineOutput, PipelineError> {
    Pipeline::from_config(cfg).run(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterSpec;
    use crate::error::BeatResult;
    use crate::synth::SyntheticEcg;

    #[test]
    fn sinusoid_with_beats_reads_72_bpm() {
        let synth = SyntheticEcg {
            carrier_amplitude: 1.0,
            r_amplitude: 1.0,
            ..SyntheticEcg::default()
        };
        let ts = synth.generate();
        let out = run_pipeline(&ts.data, &PipelineConfig::default()).expect("pipeline");
        assert_eq!(out.raw.len(), out.filtered.len());
        let bpm = out.heart_rate.bpm().expect("rate");
        assert!((bpm - 72.0).abs() <= 2.0, "bpm {bpm}");
    }

    #[test]
    fn noisy_wandering_trace_still_reads_its_rate() {
        let synth = SyntheticEcg {
            duration_s: 30.0,
            heart_rate_bpm: 66.0,
            wander_amplitude: 0.8,
            noise_amplitude: 0.05,
            ..SyntheticEcg::default()
        };
        let ts = synth.generate();
        let out = run_pipeline(&ts.data, &PipelineConfig::default()).expect("pipeline");
        let bpm = out.heart_rate.bpm().expect("rate");
        assert!((bpm - 66.0).abs() <= 2.0, "bpm {bpm}");
        for w in out.events.indices.windows(2) {
            assert!(w[1] - w[0] >= 150);
        }
    }

    #[test]
    fn flat_trace_reports_no_heartbeat() {
        let out = run_pipeline(&[0.3; 2500], &PipelineConfig::default()).expect("pipeline");
        assert!(out.events.is_empty());
        assert_eq!(out.heart_rate, HeartRate::NoHeartbeat);
        assert_eq!(out.heart_rate.bpm(), None);
    }

    #[test]
    fn large_constant_offset_reports_no_heartbeat() {
        for level in [1e7, 1e12] {
            let out = run_pipeline(&[level; 2500], &PipelineConfig::default()).expect("pipeline");
            assert!(out.filtered.iter().all(|&x| x == 0.0));
            assert_eq!(out.heart_rate, HeartRate::NoHeartbeat, "level {level}");
        }
    }

    #[test]
    fn invalid_filter_is_reported_as_filter_stage() {
        let cfg = PipelineConfig {
            filter: FilterSpec {
                highcut_hz: 130.0,
                ..FilterSpec::default()
            },
            ..PipelineConfig::default()
        };
        let err = run_pipeline(&[0.0; 100], &cfg).unwrap_err();
        assert_eq!(err.stage, Stage::Filter);
        assert!(matches!(err.source, BeatError::InvalidParameter(_)));
    }

    #[test]
    fn empty_recording_fails_at_the_first_stage() {
        let err = run_pipeline(&[], &PipelineConfig::default()).unwrap_err();
        assert_eq!(err.stage, Stage::Filter);
        assert_eq!(err.source, BeatError::EmptyInput);
    }

    struct Passthrough;

    impl SignalFilter for Passthrough {
        fn name(&self) -> &'static str {
            "passthrough"
        }
        fn apply(&self, data: &[f64], _fs: f64) -> BeatResult<Vec<f64>> {
            Ok(data.to_vec())
        }
    }

    struct FixedPeaks(Vec<usize>);

    impl PeakDetector for FixedPeaks {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn detect(&self, _data: &[f64], _fs: f64) -> BeatResult<Events> {
            Ok(Events::from_indices(self.0.clone()))
        }
    }

    #[test]
    fn strategies_are_pluggable() {
        let pipeline = Pipeline::new(
            250.0,
            Box::new(Passthrough),
            Box::new(FixedPeaks(vec![100, 350, 600])),
            Box::new(MeanIntervalEstimator),
        );
        let out = pipeline.run(&[1.0; 700]).expect("pipeline");
        assert_eq!(out.filtered, vec![1.0; 700]);
        assert_eq!(out.heart_rate.bpm(), Some(60.0));
    }

    #[test]
    fn single_beat_is_undetermined_and_bad_order_is_an_error() {
        let one = Pipeline::new(
            250.0,
            Box::new(Passthrough),
            Box::new(FixedPeaks(vec![42])),
            Box::new(MeanIntervalEstimator),
        );
        let out = one.run(&[0.0; 100]).expect("pipeline");
        assert_eq!(out.heart_rate, HeartRate::Undetermined { peaks: 1 });

        let unordered = Pipeline::new(
            250.0,
            Box::new(Passthrough),
            Box::new(FixedPeaks(vec![50, 40])),
            Box::new(MeanIntervalEstimator),
        );
        let err = unordered.run(&[0.0; 100]).unwrap_err();
        assert_eq!(err.stage, Stage::RateEstimation);
        assert!(matches!(err.source, BeatError::InvalidInterval { .. }));
    }

    #[test]
    fn mismatched_series_rate_is_rejected() {
        let pipeline = Pipeline::from_config(&PipelineConfig::default());
        let ts = TimeSeries::new(360.0, vec![0.0; 720]);
        let err = pipeline.run_series(&ts).unwrap_err();
        assert!(matches!(err.source, BeatError::InvalidParameter(_)));
    }
}
