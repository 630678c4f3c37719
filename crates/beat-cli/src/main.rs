use anyhow::{bail, Context, Result};
use beat_lib::{
    config::{PipelineConfig, ThresholdStrategy},
    detectors::detect_r_peaks,
    filters::SosFilter,
    io::{self as beat_io, csv::DEFAULT_ECG_COLUMN, text as text_io},
    pipeline::{Pipeline, PipelineOutput},
    report::{JsonPresenter, Presenter, TextPresenter},
    synth::SyntheticEcg,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use rayon::prelude::*;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

mod render;

use render::PngPresenter;

#[derive(Parser)]
#[command(
    name = "beat",
    version,
    about = "BEAT: heart rate from single-lead ECG recordings"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    #[value(name = "json-full")]
    JsonFull,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ThresholdKind {
    Mean,
    #[value(name = "mean-std")]
    MeanStd,
    Fixed,
}

/// Where samples come from. Without `--input`, newline-delimited samples are read from stdin.
#[derive(Args, Clone)]
struct InputArgs {
    #[arg(long)]
    input: Option<PathBuf>,
    /// CSV column holding the ECG samples
    #[arg(long, default_value = DEFAULT_ECG_COLUMN)]
    column: String,
}

/// Pipeline settings. Flags override values from `--config`, which override defaults.
#[derive(Args, Clone)]
struct PipelineArgs {
    /// TOML file with `fs`, `[filter]` and `[peaks]` tables
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    fs: Option<f64>,
    #[arg(long)]
    lowcut_hz: Option<f64>,
    #[arg(long)]
    highcut_hz: Option<f64>,
    #[arg(long)]
    order: Option<usize>,
    #[arg(long)]
    min_distance_s: Option<f64>,
    #[arg(long)]
    threshold: Option<ThresholdKind>,
    /// Amplitude for `fixed`, or the std multiplier for `mean-std`
    #[arg(long)]
    threshold_value: Option<f64>,
}

impl PipelineArgs {
    fn resolve(&self) -> Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::from_path(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(fs) = self.fs {
            cfg.fs = fs;
        }
        if let Some(lowcut) = self.lowcut_hz {
            cfg.filter.lowcut_hz = lowcut;
        }
        if let Some(highcut) = self.highcut_hz {
            cfg.filter.highcut_hz = highcut;
        }
        if let Some(order) = self.order {
            cfg.filter.order = order;
        }
        if let Some(distance) = self.min_distance_s {
            cfg.peaks.min_distance_s = distance;
        }
        if let Some(kind) = self.threshold {
            cfg.peaks.threshold = match (kind, self.threshold_value) {
                (ThresholdKind::Mean, _) => ThresholdStrategy::Mean,
                (ThresholdKind::MeanStd, value) => ThresholdStrategy::MeanPlusStd {
                    k: value.unwrap_or(1.0),
                },
                (ThresholdKind::Fixed, Some(value)) => ThresholdStrategy::Fixed { value },
                (ThresholdKind::Fixed, None) => {
                    bail!("--threshold fixed requires --threshold-value")
                }
            };
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Filter, detect R-peaks and report the heart rate
    Bpm {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Also render raw and filtered traces with peaks to a PNG
        #[arg(long)]
        plot: Option<PathBuf>,
    },
    /// Band-pass filter samples and print them one per line
    Filter {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Print detected R-peak indices as JSON
    FindPeaks {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Input is already filtered; detect on it directly
        #[arg(long)]
        prefiltered: bool,
    },
    /// Print the designed sections and magnitude response as JSON
    FilterResponse {
        #[command(flatten)]
        pipeline: PipelineArgs,
        #[arg(long, default_value_t = 4096)]
        n_fft: usize,
    },
    /// Write a synthetic ECG recording as CSV
    Simulate {
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        #[arg(long, default_value_t = 10.0)]
        duration_s: f64,
        #[arg(long, default_value_t = 72.0)]
        bpm: f64,
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        #[arg(long, default_value_t = 0.0)]
        wander: f64,
        #[arg(long, default_value_t = 7)]
        seed: u64,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run the pipeline over several recordings in parallel, one JSON line each
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long, default_value = DEFAULT_ECG_COLUMN)]
        column: String,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Bpm {
            input,
            pipeline,
            format,
            plot,
        } => cmd_bpm(&input, &pipeline, format, plot.as_deref())?,
        Commands::Filter { input, pipeline } => cmd_filter(&input, &pipeline)?,
        Commands::FindPeaks {
            input,
            pipeline,
            prefiltered,
        } => cmd_find_peaks(&input, &pipeline, prefiltered)?,
        Commands::FilterResponse { pipeline, n_fft } => cmd_filter_response(&pipeline, n_fft)?,
        Commands::Simulate {
            fs,
            duration_s,
            bpm,
            noise,
            wander,
            seed,
            out,
        } => {
            let synth = SyntheticEcg {
                fs,
                duration_s,
                heart_rate_bpm: bpm,
                noise_amplitude: noise,
                wander_amplitude: wander,
                seed,
                ..SyntheticEcg::default()
            };
            cmd_simulate(&synth, out.as_deref())?
        }
        Commands::Batch {
            inputs,
            column,
            pipeline,
        } => cmd_batch(&inputs, &column, &pipeline)?,
    }
    Ok(())
}

fn read_samples(input: &InputArgs) -> Result<Vec<f64>> {
    match &input.input {
        Some(path) => beat_io::load_samples(path, &input.column),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_f64_series(&buf)
        }
    }
}

fn run(samples: &[f64], cfg: &PipelineConfig) -> Result<PipelineOutput> {
    let output = Pipeline::from_config(cfg).run(samples)?;
    Ok(output)
}

fn cmd_bpm(
    input: &InputArgs,
    pipeline: &PipelineArgs,
    format: OutputFormat,
    plot: Option<&Path>,
) -> Result<()> {
    let cfg = pipeline.resolve()?;
    let samples = read_samples(input)?;
    let output = run(&samples, &cfg)?;
    let stdout = io::stdout().lock();
    match format {
        OutputFormat::Text => TextPresenter::new(stdout).present(&output)?,
        OutputFormat::Json => JsonPresenter::new(stdout, false).present(&output)?,
        OutputFormat::JsonFull => JsonPresenter::new(stdout, true).present(&output)?,
    }
    if let Some(path) = plot {
        PngPresenter::new(path).present(&output)?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_filter(input: &InputArgs, pipeline: &PipelineArgs) -> Result<()> {
    let cfg = pipeline.resolve()?;
    let samples = read_samples(input)?;
    let filtered = beat_lib::bandpass_filter(&samples, cfg.fs, &cfg.filter)
        .context("band-pass filter stage failed")?;
    for value in filtered {
        println!("{}", value);
    }
    Ok(())
}

fn cmd_find_peaks(input: &InputArgs, pipeline: &PipelineArgs, prefiltered: bool) -> Result<()> {
    let cfg = pipeline.resolve()?;
    let samples = read_samples(input)?;
    let events = if prefiltered {
        detect_r_peaks(&samples, cfg.fs, &cfg.peaks).context("peak detection stage failed")?
    } else {
        run(&samples, &cfg)?.events
    };
    println!("{}", serde_json::to_string(&events)?);
    Ok(())
}

#[derive(serde::Serialize)]
struct FilterResponse<'a> {
    fs: f64,
    sections: &'a [beat_lib::filters::Section],
    response: Vec<[f64; 2]>,
}

fn cmd_filter_response(pipeline: &PipelineArgs, n_fft: usize) -> Result<()> {
    let cfg = pipeline.resolve()?;
    let filter = SosFilter::bandpass(&cfg.filter, cfg.fs)?;
    let response = filter.frequency_response(n_fft)?;
    let js = serde_json::to_string(&FilterResponse {
        fs: filter.fs(),
        sections: filter.sections(),
        response,
    })?;
    println!("{}", js);
    Ok(())
}

fn cmd_simulate(synth: &SyntheticEcg, out: Option<&Path>) -> Result<()> {
    if !(synth.fs > 0.0 && synth.duration_s > 0.0 && synth.heart_rate_bpm > 0.0) {
        bail!("fs, duration and bpm must be positive");
    }
    let ts = synth.generate();
    match out {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            beat_io::csv::write_csv_column(file, DEFAULT_ECG_COLUMN, ts.fs, &ts.data)?;
            info!("wrote {} samples to {}", ts.len(), path.display());
        }
        None => {
            let stdout = io::stdout().lock();
            beat_io::csv::write_csv_column(stdout, DEFAULT_ECG_COLUMN, ts.fs, &ts.data)?
        }
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct BatchLine {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<beat_lib::pipeline::PipelineSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn cmd_batch(inputs: &[PathBuf], column: &str, pipeline: &PipelineArgs) -> Result<()> {
    let cfg = pipeline.resolve()?;
    let pipeline = Pipeline::from_config(&cfg);
    let lines: Vec<BatchLine> = inputs
        .par_iter()
        .map(|path| {
            let outcome = beat_io::load_samples(path, column)
                .and_then(|samples| Ok(pipeline.run(&samples)?));
            match outcome {
                Ok(output) => BatchLine {
                    input: path.display().to_string(),
                    result: Some(output.summary()),
                    error: None,
                },
                Err(err) => BatchLine {
                    input: path.display().to_string(),
                    result: None,
                    error: Some(format!("{err:#}")),
                },
            }
        })
        .collect();
    let failed = lines.iter().filter(|l| l.error.is_some()).count();
    for line in &lines {
        println!("{}", serde_json::to_string(line)?);
    }
    if failed == lines.len() {
        bail!("all {} recordings failed", failed);
    }
    Ok(())
}
