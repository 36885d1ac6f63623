//! SVG charts for the decomposition, residuals and final forecast.

use crate::error::Result;
use crate::pipeline::{CombinedPoint, CombinedSeries, PointKind};
use crate::seasonality::STLResult;
use crate::utils::stats::acf;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

const WIDTH: u32 = 1200;
const PANEL_HEIGHT: u32 = 240;
const FORECAST_COLOR: RGBColor = RGBColor(214, 39, 40);
const HISTORY_COLOR: RGBColor = RGBColor(31, 119, 180);

/// Padded value range, never empty.
fn value_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return -1.0..1.0;
    }
    let pad = ((hi - lo) * 0.05).max(1e-6);
    (lo - pad)..(hi + pad)
}

fn line_panel(
    area: &DrawingArea<SVGBackend, Shift>,
    title: &str,
    values: &[f64],
    color: RGBColor,
) -> Result<()> {
    let x_max = values.len().max(2) as f64 - 1.0;
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(8)
        .x_label_area_size(24)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..x_max, value_range(values))?;
    chart.configure_mesh().light_line_style(WHITE).draw()?;
    chart.draw_series(LineSeries::new(
        values.iter().enumerate().map(|(i, &v)| (i as f64, v)),
        color,
    ))?;
    Ok(())
}

/// Observed series above its trend, seasonal and remainder components.
pub fn plot_decomposition(observed: &[f64], stl: &STLResult, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, (WIDTH, 4 * PANEL_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((4, 1));
    let components: [(&str, &[f64]); 4] = [
        ("observed", observed),
        ("trend", &stl.trend),
        ("seasonal", &stl.seasonal),
        ("remainder", &stl.remainder),
    ];
    for (area, (title, values)) in panels.iter().zip(components) {
        line_panel(area, title, values, HISTORY_COLOR)?;
    }

    root.present()?;
    Ok(())
}

/// Residuals over time above their autocorrelation function.
pub fn plot_residuals(residuals: &[f64], max_lag: usize, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, (WIDTH, 2 * PANEL_HEIGHT + 80)).into_drawing_area();
    root.fill(&WHITE)?;
    let (top, bottom) = root.split_vertically((PANEL_HEIGHT + 40) as i32);

    line_panel(&top, "residuals", residuals, HISTORY_COLOR)?;

    let correlations = acf(residuals, max_lag);
    let bound = 1.96 / (residuals.len().max(1) as f64).sqrt();
    let lags = correlations.len().max(1) as f64 + 1.0;
    let mut chart = ChartBuilder::on(&bottom)
        .caption("residual ACF", ("sans-serif", 18))
        .margin(8)
        .x_label_area_size(24)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..lags, -1.0..1.0)?;
    chart.configure_mesh().light_line_style(WHITE).draw()?;

    chart.draw_series(correlations.iter().enumerate().map(|(i, &r)| {
        let lag = i as f64 + 1.0;
        Rectangle::new([(lag - 0.3, 0.0), (lag + 0.3, r)], HISTORY_COLOR.filled())
    }))?;
    for level in [bound, -bound] {
        chart.draw_series(LineSeries::new(
            [(0.0, level), (lags, level)],
            FORECAST_COLOR.stroke_width(1),
        ))?;
    }

    root.present()?;
    Ok(())
}

/// Weekday and time of the point nearest to `x`; blank off the ends.
fn tick_label(points: &[CombinedPoint], x: f64) -> String {
    let i = x.round();
    if i < 0.0 || i as usize >= points.len() {
        return String::new();
    }
    points[i as usize].timestamp.format("%a %H:%M").to_string()
}

/// Historical values with the forecast appended in a second colour, on a
/// time axis.
pub fn plot_forecast(combined: &CombinedSeries, title: &str, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, (WIDTH, 2 * PANEL_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let points = combined.points();
    let x_max = points.len().max(2) as f64 - 1.0;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..x_max, value_range(points.iter().map(|p| &p.value)))?;
    let time_of = |x: &f64| tick_label(points, *x);
    chart
        .configure_mesh()
        .x_labels(12)
        .x_label_formatter(&time_of)
        .x_desc("time")
        .y_desc("demand")
        .light_line_style(WHITE)
        .draw()?;

    let indexed = |kind: PointKind| {
        points
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.kind == kind)
            .map(|(i, p)| (i as f64, p.value))
    };

    chart
        .draw_series(LineSeries::new(indexed(PointKind::Historical), HISTORY_COLOR))?
        .label("historical")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], HISTORY_COLOR));
    chart
        .draw_series(LineSeries::new(indexed(PointKind::Forecast), FORECAST_COLOR))?
        .label("forecast")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], FORECAST_COLOR));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn value_range_pads_and_handles_degenerate_input() {
        let r = value_range(&[0.0, 10.0]);
        assert!(r.start < 0.0 && r.end > 10.0);

        let flat = value_range(&[3.0, 3.0]);
        assert!(flat.start < flat.end);

        assert_eq!(value_range(&[f64::NAN]), -1.0..1.0);
    }

    #[test]
    fn forecast_ticks_read_as_weekday_and_time() {
        // Friday 2005-03-25, 21:30 and 21:45.
        let start = Utc.with_ymd_and_hms(2005, 3, 25, 21, 30, 0).unwrap();
        let points: Vec<CombinedPoint> = (0..3)
            .map(|i| CombinedPoint {
                timestamp: start + Duration::minutes(15 * i),
                value: 1.0,
                kind: if i < 2 { PointKind::Historical } else { PointKind::Forecast },
            })
            .collect();

        assert_eq!(tick_label(&points, 0.0), "Fri 21:30");
        assert_eq!(tick_label(&points, 0.6), "Fri 21:45");
        assert_eq!(tick_label(&points, 2.0), "Fri 22:00");
        assert_eq!(tick_label(&points, -1.0), "");
        assert_eq!(tick_label(&points, 3.0), "");
    }
}
