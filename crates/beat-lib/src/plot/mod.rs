//! Backend-neutral figure model. Rendering lives with the caller.

use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineOutput;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub radius: u32,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Markers(MarkerSeries),
}

impl Series {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(line) => &line.points,
            Series::Markers(markers) => &markers.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over every series, `None` when there are no points.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self.series.iter().flat_map(|s| s.points().iter());
        let first = points.next()?;
        let init = (first[0], first[0], first[1], first[1]);
        Some(points.fold(init, |(x0, x1, y0, y1), p| {
            (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1]))
        }))
    }
}

pub const RAW_COLOR: Color = Color(0x1F77B4);
pub const FILTERED_COLOR: Color = Color(0x2CA02C);
pub const PEAK_COLOR: Color = Color(0xFF0000);

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

fn trace_points(data: &[f64], fs: f64) -> Vec<[f64; 2]> {
    let dt = 1.0 / fs;
    data.iter()
        .enumerate()
        .map(|(i, value)| [i as f64 * dt, *value])
        .collect()
}

fn trace_figure(title: &str, data: &[f64], fs: f64, max_points: usize, color: Color) -> Figure {
    let mut fig = Figure::new(Some(title.into()));
    fig.x.label = Some("time (s)".into());
    fig.add_series(Series::Line(LineSeries {
        name: title.into(),
        points: decimate_points(&trace_points(data, fs), max_points),
        style: Style { width: 1.4, color },
    }));
    fig
}

/// Two panels: the raw trace, and the filtered trace with detected R-peaks marked.
/// Lines are decimated to `max_points`; peak markers never are.
pub fn figures_from_output(output: &PipelineOutput, max_points: usize) -> Vec<Figure> {
    let raw = trace_figure("Raw ECG Signal", &output.raw, output.fs, max_points, RAW_COLOR);
    let mut filtered = trace_figure(
        "Filtered ECG with R Peaks",
        &output.filtered,
        output.fs,
        max_points,
        FILTERED_COLOR,
    );
    let peaks: Vec<[f64; 2]> = output
        .events
        .indices
        .iter()
        .filter_map(|&i| output.filtered.get(i).map(|&v| [i as f64 / output.fs, v]))
        .collect();
    filtered.add_series(Series::Markers(MarkerSeries {
        name: "R peaks".into(),
        points: peaks,
        radius: 3,
        color: PEAK_COLOR,
    }));
    vec![raw, filtered]
}
