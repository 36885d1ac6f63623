//! Forecast CSV and plain-text run summary.

use crate::error::Result;
use crate::pipeline::{CombinedSeries, PipelineReport};
use std::fmt;
use std::io::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write `timestamp,value,kind` rows for the combined series.
pub fn write_forecast_csv<W: Write>(combined: &CombinedSeries, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["timestamp", "value", "kind"])?;
    for point in combined.points() {
        csv.write_record([
            point.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            point.value.to_string(),
            point.kind.as_str().to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Human-readable summary of a run.
pub fn render_text(report: &PipelineReport) -> String {
    Summary(report).to_string()
}

/// Plain-text rendering of a [`PipelineReport`].
pub struct Summary<'a>(pub &'a PipelineReport);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let stl = &report.decomposition;

        writeln!(f, "ridership forecast report")?;
        writeln!(f, "=========================")?;
        writeln!(
            f,
            "series: all days {} obs ({} periods), weekdays {} obs ({} periods)",
            report.full.len(),
            report.full.complete_periods(),
            report.weekdays.len(),
            report.weekdays.complete_periods()
        )?;
        writeln!(
            f,
            "decomposition: period {}, seasonal strength {:.3}, trend strength {:.3}",
            stl.period,
            stl.seasonal_strength(),
            stl.trend_strength()
        )?;

        writeln!(f, "\nmodel comparison\n")?;
        write!(f, "{}", report.comparison)?;

        if !report.failures.is_empty() {
            writeln!(f, "\nfailed candidates")?;
            for failure in &report.failures {
                writeln!(f, "  {} on {}: {}", failure.model, failure.series, failure.error)?;
            }
        }

        let fc = &report.final_forecast;
        writeln!(f, "\nfinal model: {}", fc.model)?;
        writeln!(f, "  {}", fc.description)?;
        if let (Some(first), Some(last)) = (fc.timestamps.first(), fc.timestamps.last()) {
            writeln!(
                f,
                "  {} steps from {} to {}, {} clamped to zero",
                fc.values.len(),
                first.format(TIMESTAMP_FORMAT),
                last.format(TIMESTAMP_FORMAT),
                fc.clamped
            )?;
        }

        let d = &report.diagnostics;
        writeln!(f, "\nresidual diagnostics")?;
        writeln!(f, "  mean {:.4}, std dev {:.4}", d.mean, d.std_dev)?;
        writeln!(
            f,
            "  Ljung-Box Q={:.3} lags={} df={} p={:.4}",
            d.ljung_box.statistic, d.ljung_box.lags, d.ljung_box.df, d.ljung_box.p_value
        )?;
        writeln!(
            f,
            "  Durbin-Watson {:.3} ({:?})",
            d.durbin_watson.statistic, d.durbin_watson.interpretation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TimeSeries;
    use crate::data::SyntheticRidership;
    use crate::models::SARIMASpec;
    use crate::pipeline::{run, PipelineConfig};
    use chrono::{Duration, TimeZone, Utc};
    use std::fmt::Write as _;

    fn small_report() -> PipelineReport {
        let rows = SyntheticRidership::new(28).with_period(8).with_seed(11).generate();
        let config = PipelineConfig::default()
            .with_period(8)
            .with_auto_arima(false)
            .with_manual_orders(vec![SARIMASpec::new((2, 1, 2), (12, 1, 12), 8)]);
        run(&rows, &config).unwrap()
    }

    /// Accepts `limit` bytes, then refuses.
    struct Limited {
        limit: usize,
        written: usize,
    }

    impl fmt::Write for Limited {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.written += s.len();
            if self.written > self.limit {
                Err(fmt::Error)
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn csv_has_header_and_kinds() {
        let base = Utc.with_ymd_and_hms(2005, 3, 21, 6, 0, 0).unwrap();
        let history =
            TimeSeries::univariate(vec![base, base + Duration::minutes(15)], vec![4.0, 5.5]).unwrap();
        let combined =
            CombinedSeries::new(&history, &[base + Duration::minutes(30)], &[6.0]).unwrap();

        let mut buf = Vec::new();
        write_forecast_csv(&combined, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "timestamp,value,kind");
        assert_eq!(lines[1], "2005-03-21 06:00:00,4,historical");
        assert_eq!(lines[3], "2005-03-21 06:30:00,6,forecast");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn summary_lists_every_section() {
        let report = small_report();
        let text = render_text(&report);

        assert!(text.starts_with("ridership forecast report\n"));
        for section in ["model comparison", "failed candidates", "final model: ", "residual diagnostics"] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("SARIMA(2,1,2)(12,1,12)[8] on weekdays"));
        assert!(text.trim_end().lines().last().unwrap().contains("Durbin-Watson"));
    }

    #[test]
    fn summary_stops_at_the_first_write_error() {
        let report = small_report();
        let mut sink = Limited { limit: 40, written: 0 };
        assert!(write!(sink, "{}", Summary(&report)).is_err());

        let full = render_text(&report).len();
        let mut roomy = Limited { limit: full, written: 0 };
        assert!(write!(roomy, "{}", Summary(&report)).is_ok());
    }
}
