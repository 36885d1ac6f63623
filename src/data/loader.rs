//! Loading ridership observations from delimited files.
//!
//! The expected layout is one row per 15-minute interval with at least the
//! columns `DATE` (e.g. `22-Mar-05`), `TIME` (e.g. `6:00`) and `DEMAND`.
//! Header names are matched case-insensitively and extra columns are ignored.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

const DATE_FORMATS: &[&str] = &["%d-%b-%y", "%d-%b-%Y", "%Y-%m-%d", "%d/%m/%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S"];

/// One row of the ridership table.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Date label as it appeared in the source.
    pub date: String,
    /// Time-of-day label as it appeared in the source.
    pub time: String,
    /// Passenger count. NaN marks a missing value.
    pub demand: f64,
    /// Parsed date and time.
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    /// Build an observation from its labels, parsing the timestamp.
    pub fn new(date: impl Into<String>, time: impl Into<String>, demand: f64) -> Option<Self> {
        let date = date.into();
        let time = time.into();
        let timestamp = parse_timestamp(&date, &time)?;
        Some(Self {
            date,
            time,
            demand,
            timestamp,
        })
    }
}

/// Parse a date label and a time-of-day label into a UTC timestamp.
pub fn parse_timestamp(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date.trim(), fmt).ok())?;
    let time = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(time.trim(), fmt).ok())?;
    Some(NaiveDateTime::new(date, time).and_utc())
}

/// Read observations from a file on disk.
pub fn read_observations<P: AsRef<Path>>(path: P) -> Result<Vec<Observation>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let observations = read_observations_from(BufReader::new(file))?;
    info!(
        path = %path.display(),
        rows = observations.len(),
        "loaded ridership observations"
    );
    Ok(observations)
}

/// Read observations from any reader producing comma-separated text.
pub fn read_observations_from<R: Read>(reader: R) -> Result<Vec<Observation>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| ForecastError::Csv(format!("missing column '{}'", name)))
    };
    let date_idx = column("DATE")?;
    let time_idx = column("TIME")?;
    let demand_idx = column("DEMAND")?;

    let mut observations = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let date = field(date_idx);
        let time = field(time_idx);
        let timestamp = parse_timestamp(date, time).ok_or_else(|| ForecastError::Parse {
            line,
            message: format!("unrecognised date/time '{} {}'", date, time),
        })?;
        let demand = parse_demand(field(demand_idx)).map_err(|message| ForecastError::Parse {
            line,
            message,
        })?;

        observations.push(Observation {
            date: date.to_string(),
            time: time.to_string(),
            demand,
            timestamp,
        });
    }

    if observations.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    let missing = observations.iter().filter(|o| o.demand.is_nan()).count();
    if missing > 0 {
        debug!(missing, "observations with missing demand");
    }

    Ok(observations)
}

/// Blank and `NA`-style fields become NaN; negative counts are rejected.
fn parse_demand(raw: &str) -> std::result::Result<f64, String> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("invalid demand '{}'", raw))?;
    if value < 0.0 {
        return Err(format!("negative demand {}", value));
    }
    Ok(value)
}
