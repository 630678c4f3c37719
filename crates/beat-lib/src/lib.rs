//! ECG heart-rate extraction: zero-phase Butterworth band-pass, threshold R-peak
//! detection, mean-RR beats per minute.
//!
//! ```
//! use beat_lib::{pipeline::run_pipeline, synth::SyntheticEcg, PipelineConfig};
//!
//! let ts = SyntheticEcg::default().generate();
//! let out = run_pipeline(&ts.data, &PipelineConfig::default()).unwrap();
//! let bpm = out.heart_rate.bpm().unwrap();
//! assert!((bpm - 72.0).abs() < 2.0);
//! ```

pub mod config;
pub mod detectors;
pub mod error;
pub mod filters;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod plot;
pub mod report;
pub mod signal;
pub mod synth;

pub use config::{FilterSpec, PeakConfig, PipelineConfig, ThresholdStrategy};
pub use detectors::{detect_r_peaks, PeakDetector, ThresholdPeakDetector};
pub use error::{BeatError, BeatResult, PipelineError, Stage};
pub use filters::{bandpass_filter, ButterworthBandpass, SignalFilter, SosFilter};
pub use metrics::{calculate_bpm, MeanIntervalEstimator, RateEstimate, RateEstimator};
pub use pipeline::{HeartRate, Pipeline, PipelineOutput};
pub use signal::{Events, RRSeries, TimeSeries};
