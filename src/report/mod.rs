//! Rendering a [`PipelineReport`](crate::pipeline::PipelineReport) to disk.

mod output;
mod plots;

pub use output::{render_text, write_forecast_csv, Summary};
pub use plots::{plot_decomposition, plot_forecast, plot_residuals};

use crate::error::Result;
use crate::pipeline::PipelineReport;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths of everything [`write_report`] produced.
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub summary: PathBuf,
    pub forecast_csv: PathBuf,
    pub decomposition_plot: PathBuf,
    pub residuals_plot: PathBuf,
    pub forecast_plot: PathBuf,
}

/// Write the summary, forecast CSV and plots into `dir`, creating it if needed.
pub fn write_report(report: &PipelineReport, dir: &Path) -> Result<ReportFiles> {
    fs::create_dir_all(dir)?;
    let files = ReportFiles {
        summary: dir.join("report.txt"),
        forecast_csv: dir.join("forecast.csv"),
        decomposition_plot: dir.join("decomposition.svg"),
        residuals_plot: dir.join("residuals.svg"),
        forecast_plot: dir.join("forecast.svg"),
    };

    fs::write(&files.summary, render_text(report))?;
    write_forecast_csv(
        &report.final_forecast.combined,
        BufWriter::new(File::create(&files.forecast_csv)?),
    )?;

    plot_decomposition(report.full.values(), &report.decomposition, &files.decomposition_plot)?;
    let max_lag = (2 * report.decomposition.period).min(report.residuals.len().saturating_sub(1));
    plot_residuals(&report.residuals, max_lag, &files.residuals_plot)?;
    plot_forecast(
        &report.final_forecast.combined,
        &format!("{} forecast", report.final_forecast.model),
        &files.forecast_plot,
    )?;

    info!(dir = %dir.display(), "wrote report");
    Ok(files)
}
