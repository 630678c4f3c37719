use serde::{Deserialize, Serialize};

/// Basic typed time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(fs: f64, data: Vec<f64>) -> Self {
        Self { fs, data }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
}

/// Point events on a timeline (R-peak sample indices).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }
    pub fn len(&self) -> usize {
        self.indices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// RR intervals (seconds)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    /// Differences between consecutive events, in seconds. Unordered input yields
    /// non-positive entries; callers that need positive intervals check for them.
    pub fn from_events(events: &Events, fs: f64) -> Self {
        let rr = events
            .indices
            .windows(2)
            .map(|w| (w[1] as f64 - w[0] as f64) / fs)
            .collect();
        Self { rr }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.rr.is_empty() {
            None
        } else {
            Some(self.rr.iter().sum::<f64>() / self.rr.len() as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rr_from_events_in_seconds() {
        let events = Events::from_indices(vec![100, 350, 600]);
        let rr = RRSeries::from_events(&events, 250.0);
        assert_eq!(rr.rr, vec![1.0, 1.0]);
        assert_eq!(rr.mean(), Some(1.0));
    }

    #[test]
    fn single_event_has_no_intervals() {
        let rr = RRSeries::from_events(&Events::from_indices(vec![42]), 250.0);
        assert!(rr.rr.is_empty());
        assert_eq!(rr.mean(), None);
    }

    #[test]
    fn duration_uses_fs() {
        let ts = TimeSeries::new(250.0, vec![0.0; 500]);
        assert!((ts.duration() - 2.0).abs() < 1e-12);
    }
}
