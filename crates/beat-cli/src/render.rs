use anyhow::{anyhow, Result};
use beat_lib::{
    pipeline::PipelineOutput,
    plot::{figures_from_output, Figure, Series},
    report::Presenter,
};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

/// Renders the raw and the filtered-with-peaks panels stacked in one PNG.
pub struct PngPresenter {
    path: PathBuf,
    size: (u32, u32),
    max_points: usize,
}

impl PngPresenter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            size: (1200, 600),
            max_points: 4000,
        }
    }
}

impl Presenter for PngPresenter {
    fn present(&mut self, output: &PipelineOutput) -> Result<()> {
        let figures = figures_from_output(output, self.max_points);
        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        let panels = root.split_evenly((figures.len().max(1), 1));
        for (fig, area) in figures.iter().zip(panels.iter()) {
            draw_figure(area, fig)?;
        }
        root.present()
            .map_err(|e| anyhow!("writing {}: {}", self.path.display(), e))?;
        Ok(())
    }
}

fn draw_figure<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, fig: &Figure) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (x_min, mut x_max, mut y_min, mut y_max) = fig.bounds().unwrap_or((0.0, 1.0, 0.0, 1.0));
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    if y_max <= y_min {
        y_min -= 0.5;
        y_max += 0.5;
    }
    let pad = 0.05 * (y_max - y_min);
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 20),
        )
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, (y_min - pad)..(y_max + pad))?;
    let mut mesh = chart.configure_mesh();
    if let Some(label) = &fig.x.label {
        mesh.x_desc(label.as_str());
    }
    mesh.draw()?;
    for series in &fig.series {
        match series {
            Series::Line(line) => {
                let (r, g, b) = line.style.color.rgb();
                chart.draw_series(LineSeries::new(
                    line.points.iter().map(|p| (p[0], p[1])),
                    &RGBColor(r, g, b),
                ))?;
            }
            Series::Markers(markers) => {
                let (r, g, b) = markers.color.rgb();
                let color = RGBColor(r, g, b);
                chart.draw_series(
                    markers
                        .points
                        .iter()
                        .map(|p| Circle::new((p[0], p[1]), markers.radius, color.filled())),
                )?;
            }
        }
    }
    Ok(())
}
