use anyhow::Result;
use std::io::Write;

use crate::pipeline::{HeartRate, PipelineOutput};

/// Consumes a finished run. Presenters never feed anything back into the pipeline.
pub trait Presenter {
    fn present(&mut self, output: &PipelineOutput) -> Result<()>;
}

/// One JSON object per run. `full` includes the raw and filtered sample vectors.
pub struct JsonPresenter<W: Write> {
    out: W,
    full: bool,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(out: W, full: bool) -> Self {
        Self { out, full }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn present(&mut self, output: &PipelineOutput) -> Result<()> {
        if self.full {
            serde_json::to_writer(&mut self.out, output)?;
        } else {
            serde_json::to_writer(&mut self.out, &output.summary())?;
        }
        writeln!(self.out)?;
        Ok(())
    }
}

/// Human-readable one-liner.
pub struct TextPresenter<W: Write> {
    out: W,
}

impl<W: Write> TextPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn present(&mut self, output: &PipelineOutput) -> Result<()> {
        match &output.heart_rate {
            HeartRate::Estimated(est) => writeln!(
                self.out,
                "Detected Heart Rate: {:.2} BPM ({} beats, mean RR {:.3} s)",
                est.bpm, est.beats, est.mean_rr_s
            )?,
            HeartRate::Undetermined { peaks } => writeln!(
                self.out,
                "Heart rate undetermined: {peaks} beat detected, need at least 2"
            )?,
            HeartRate::NoHeartbeat => writeln!(self.out, "No heartbeat detected")?,
        }
        Ok(())
    }
}
