//! Synthetic ridership tables with a known structure.

use crate::data::builder::INTERVALS_PER_DAY;
use crate::data::Observation;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generator for service-day ridership observations.
///
/// Each day starts at 06:00 and holds `period` 15-minute intervals. Demand is
/// `base + profile(interval) + trend * day + noise`, where the profile has a
/// morning and an evening peak, multiplied by `weekend_factor` on Saturdays
/// and Sundays. Noise is i.i.d. uniform in `[-noise, noise]`.
#[derive(Debug, Clone)]
pub struct SyntheticRidership {
    days: usize,
    period: usize,
    start: NaiveDate,
    base: f64,
    peak: f64,
    trend_per_day: f64,
    weekend_factor: f64,
    noise: f64,
    seed: u64,
}

impl SyntheticRidership {
    /// Generator for `days` service days starting Monday 21 March 2005.
    pub fn new(days: usize) -> Self {
        Self {
            days,
            period: INTERVALS_PER_DAY,
            start: NaiveDate::from_ymd_opt(2005, 3, 21).unwrap_or_default(),
            base: 40.0,
            peak: 120.0,
            trend_per_day: 0.2,
            weekend_factor: 0.5,
            noise: 8.0,
            seed: 42,
        }
    }

    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period.max(1);
        self
    }

    pub fn starting_on(mut self, date: NaiveDate) -> Self {
        self.start = date;
        self
    }

    pub fn with_level(mut self, base: f64, peak: f64) -> Self {
        self.base = base;
        self.peak = peak;
        self
    }

    pub fn with_trend(mut self, per_day: f64) -> Self {
        self.trend_per_day = per_day;
        self
    }

    pub fn with_weekend_factor(mut self, factor: f64) -> Self {
        self.weekend_factor = factor;
        self
    }

    pub fn with_noise(mut self, amplitude: f64) -> Self {
        self.noise = amplitude.abs();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Deterministic daily demand shape for interval `i` of a day.
    pub fn profile(&self, i: usize) -> f64 {
        let x = i as f64 / self.period as f64;
        let morning = (-((x - 0.15) / 0.06).powi(2)).exp();
        let evening = 0.8 * (-((x - 0.7) / 0.08).powi(2)).exp();
        self.peak * (morning + evening)
    }

    /// Produce the observation table.
    pub fn generate(&self) -> Vec<Observation> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let service_start = NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default();
        let mut rows = Vec::with_capacity(self.days * self.period);

        for day in 0..self.days {
            let date = self.start + Duration::days(day as i64);
            let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
            let scale = if weekend { self.weekend_factor } else { 1.0 };

            for i in 0..self.period {
                let time = service_start + Duration::minutes(15 * i as i64);
                let noise = if self.noise > 0.0 {
                    rng.gen_range(-self.noise..=self.noise)
                } else {
                    0.0
                };
                let demand = (scale * (self.base + self.profile(i))
                    + self.trend_per_day * day as f64
                    + noise)
                    .max(0.0);

                rows.push(Observation {
                    date: date.format("%d-%b-%y").to_string(),
                    time: time.format("%-H:%M").to_string(),
                    demand,
                    timestamp: date.and_time(time).and_utc(),
                });
            }
        }

        rows
    }
}
