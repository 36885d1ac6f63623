//! Automatic SARIMA order selection.
//!
//! Differencing orders come from variance-reduction heuristics; the
//! remaining orders are chosen by information criterion, either with a
//! stepwise neighbourhood walk (Hyndman-Khandakar) or exhaustively.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{seasonal_difference, suggest_differencing, suggest_seasonal_differencing};
use crate::models::arima::model::{FittedSARIMA, SARIMASpec, SARIMA};
use crate::models::traits::{check_trainable, FittedModel, Forecaster};
use std::collections::HashSet;
use tracing::debug;

/// Criterion minimised during the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InformationCriterion {
    #[default]
    AIC,
    BIC,
}

/// Search limits for [`AutoARIMA`].
#[derive(Debug, Clone)]
pub struct AutoARIMAConfig {
    pub max_p: usize,
    pub max_d: usize,
    pub max_q: usize,
    pub max_cap_p: usize,
    pub max_cap_d: usize,
    pub max_cap_q: usize,
    /// Seasonal period (0 or 1 for non-seasonal).
    pub seasonal_period: usize,
    pub stepwise: bool,
    /// Upper bound on models fitted by the stepwise walk.
    pub max_models: usize,
    pub criterion: InformationCriterion,
}

impl Default for AutoARIMAConfig {
    fn default() -> Self {
        Self {
            max_p: 3,
            max_d: 2,
            max_q: 3,
            max_cap_p: 1,
            max_cap_d: 1,
            max_cap_q: 1,
            seasonal_period: 0,
            stepwise: true,
            max_models: 40,
            criterion: InformationCriterion::AIC,
        }
    }
}

impl AutoARIMAConfig {
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    pub fn with_seasonal_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_cap_p = max_p;
        self.max_cap_d = max_d;
        self.max_cap_q = max_q;
        self
    }

    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    pub fn with_criterion(mut self, criterion: InformationCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_max_models(mut self, max_models: usize) -> Self {
        self.max_models = max_models.max(1);
        self
    }

    /// Try every order combination instead of walking from a start set.
    pub fn exhaustive(mut self) -> Self {
        self.stepwise = false;
        self
    }

    fn is_seasonal(&self) -> bool {
        self.seasonal_period > 1
    }
}

/// (p, q, P, Q) for fixed differencing orders.
type Orders = (usize, usize, usize, usize);

/// Automatic SARIMA estimator.
///
/// # Example
/// ```
/// use ridership_forecast::models::{AutoARIMA, Forecaster};
///
/// let model = AutoARIMA::seasonal(63);
/// assert_eq!(model.name(), "AutoARIMA");
/// assert_eq!(model.config().seasonal_period, 63);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutoARIMA {
    config: AutoARIMAConfig,
}

impl AutoARIMA {
    pub fn new(config: AutoARIMAConfig) -> Self {
        Self { config }
    }

    /// Default search for the given seasonal period.
    pub fn seasonal(period: usize) -> Self {
        Self::new(AutoARIMAConfig::default().with_seasonal_period(period))
    }

    pub fn config(&self) -> &AutoARIMAConfig {
        &self.config
    }

    /// Run the search and return the selected model with every score.
    pub fn search(&self, series: &TimeSeries) -> Result<FittedAutoARIMA> {
        let values = series.values();
        let s = self.config.seasonal_period;
        let min_required = if self.config.is_seasonal() { 3 * s } else { 10 };
        check_trainable(values, min_required)?;

        let cap_d = if self.config.is_seasonal() {
            suggest_seasonal_differencing(values, s).min(self.config.max_cap_d)
        } else {
            0
        };
        let d = suggest_differencing(&seasonal_difference(values, cap_d, s))
            .min(self.config.max_d);
        debug!(d, cap_d, period = s, "selected differencing orders");

        // Every candidate is scored on the observations left after the
        // largest AR lag in the search space.
        let seasonal_lag = if self.config.is_seasonal() {
            self.config.max_cap_p * s
        } else {
            0
        };
        let mut search = Search {
            auto: self,
            series,
            d,
            cap_d,
            condition_start: self.config.max_p + seasonal_lag,
            visited: HashSet::new(),
            scores: Vec::new(),
            best: None,
        };

        if self.config.stepwise {
            search.stepwise();
        } else {
            search.exhaustive();
        }

        let Search { best, mut scores, .. } = search;
        let (selected, _) = best.ok_or_else(|| {
            ForecastError::ComputationError("no candidate SARIMA order could be fitted".to_string())
        })?;
        scores.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(FittedAutoARIMA { selected, scores })
    }

    fn spec(&self, (p, q, cap_p, cap_q): Orders, d: usize, cap_d: usize) -> SARIMASpec {
        if self.config.is_seasonal() {
            SARIMASpec::new((p, d, q), (cap_p, cap_d, cap_q), self.config.seasonal_period)
        } else {
            SARIMASpec::nonseasonal(p, d, q)
        }
    }

    fn within_limits(&self, (p, q, cap_p, cap_q): Orders) -> bool {
        let seasonal_ok = if self.config.is_seasonal() {
            cap_p <= self.config.max_cap_p && cap_q <= self.config.max_cap_q
        } else {
            cap_p == 0 && cap_q == 0
        };
        p <= self.config.max_p && q <= self.config.max_q && seasonal_ok
    }
}

struct Search<'a> {
    auto: &'a AutoARIMA,
    series: &'a TimeSeries,
    d: usize,
    cap_d: usize,
    condition_start: usize,
    visited: HashSet<Orders>,
    scores: Vec<(SARIMASpec, f64)>,
    best: Option<(FittedSARIMA, f64)>,
}

impl Search<'_> {
    /// Fit one candidate; returns true when it became the new best.
    fn try_orders(&mut self, orders: Orders) -> bool {
        if !self.auto.within_limits(orders) || !self.visited.insert(orders) {
            return false;
        }
        let spec = self.auto.spec(orders, self.d, self.cap_d);

        let model = SARIMA::new(spec).with_condition_start(self.condition_start);
        let fitted = match model.estimate(self.series) {
            Ok(f) => f,
            Err(e) => {
                debug!(%spec, error = %e, "candidate failed");
                return false;
            }
        };
        let score = match self.auto.config.criterion {
            InformationCriterion::AIC => fitted.aic(),
            InformationCriterion::BIC => fitted.bic(),
        };
        if !score.is_finite() {
            return false;
        }
        debug!(%spec, score, "candidate scored");
        self.scores.push((spec, score));

        let improves = self.best.as_ref().map_or(true, |(_, best)| score < *best);
        if improves {
            self.best = Some((fitted, score));
        }
        improves
    }

    fn current_orders(&self) -> Option<Orders> {
        self.best.as_ref().map(|(f, _)| {
            let s = f.spec();
            (s.p, s.q, s.cap_p, s.cap_q)
        })
    }

    fn stepwise(&mut self) {
        let seasonal = usize::from(self.auto.config.is_seasonal());
        for start in [
            (2, 2, seasonal, seasonal),
            (0, 0, 0, 0),
            (1, 0, seasonal, 0),
            (0, 1, 0, seasonal),
        ] {
            self.try_orders(start);
        }

        'walk: while self.visited.len() < self.auto.config.max_models {
            let Some((p, q, cp, cq)) = self.current_orders() else {
                break;
            };
            let neighbours = [
                (p.wrapping_sub(1), q, cp, cq),
                (p + 1, q, cp, cq),
                (p, q.wrapping_sub(1), cp, cq),
                (p, q + 1, cp, cq),
                (p.wrapping_sub(1), q.wrapping_sub(1), cp, cq),
                (p + 1, q + 1, cp, cq),
                (p, q, cp.wrapping_sub(1), cq),
                (p, q, cp + 1, cq),
                (p, q, cp, cq.wrapping_sub(1)),
                (p, q, cp, cq + 1),
                (p, q, cp + 1, cq + 1),
                (p, q, cp.wrapping_sub(1), cq.wrapping_sub(1)),
            ];
            for orders in neighbours {
                if self.visited.len() >= self.auto.config.max_models {
                    break 'walk;
                }
                if self.try_orders(orders) {
                    continue 'walk;
                }
            }
            break;
        }
    }

    fn exhaustive(&mut self) {
        let c = &self.auto.config;
        let (max_cp, max_cq) = if c.is_seasonal() {
            (c.max_cap_p, c.max_cap_q)
        } else {
            (0, 0)
        };
        for p in 0..=c.max_p {
            for q in 0..=c.max_q {
                for cp in 0..=max_cp {
                    for cq in 0..=max_cq {
                        self.try_orders((p, q, cp, cq));
                    }
                }
            }
        }
    }
}

impl Forecaster for AutoARIMA {
    fn fit(&self, series: &TimeSeries) -> Result<Box<dyn FittedModel>> {
        Ok(Box::new(self.search(series)?))
    }

    fn name(&self) -> &str {
        "AutoARIMA"
    }
}

/// Outcome of an AutoARIMA search.
#[derive(Debug, Clone)]
pub struct FittedAutoARIMA {
    selected: FittedSARIMA,
    scores: Vec<(SARIMASpec, f64)>,
}

impl FittedAutoARIMA {
    pub fn selected(&self) -> &FittedSARIMA {
        &self.selected
    }

    pub fn selected_spec(&self) -> SARIMASpec {
        self.selected.spec()
    }

    /// Every successfully fitted candidate with its score, best first.
    pub fn model_scores(&self) -> &[(SARIMASpec, f64)] {
        &self.scores
    }
}

impl FittedModel for FittedAutoARIMA {
    fn fitted_values(&self) -> &[f64] {
        self.selected.fitted_values()
    }

    fn residuals(&self) -> &[f64] {
        self.selected.residuals()
    }

    fn forecast(&self, horizon: usize) -> Result<Forecast> {
        self.selected.forecast(horizon)
    }

    fn warmup(&self) -> usize {
        self.selected.warmup()
    }

    fn num_params(&self) -> usize {
        self.selected.num_params()
    }

    fn description(&self) -> String {
        let runners_up = self
            .scores
            .iter()
            .skip(1)
            .take(3)
            .map(|(spec, score)| format!("{spec}={score:.1}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} [{} candidates; next: {}]",
            self.selected.description(),
            self.scores.len(),
            if runners_up.is_empty() { "none" } else { &runners_up }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn make_series(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base + Duration::hours(i as i64))
            .collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut y = vec![0.0; n];
        for t in 1..n {
            y[t] = phi * y[t - 1] + rng.gen_range(-1.0..1.0);
        }
        y.into_iter().map(|v| v + 20.0).collect()
    }

    #[test]
    fn selects_a_model_and_records_scores() {
        let fitted = AutoARIMA::default().search(&make_series(ar1(300, 0.6, 1))).unwrap();

        let scores = fitted.model_scores();
        assert!(scores.len() >= 2);
        assert!(scores.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(scores[0].0, fitted.selected_spec());
        assert!(!fitted.selected_spec().is_seasonal());
        assert!(fitted.selected_spec().p + fitted.selected_spec().q > 0);
    }

    fn white_noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| 100.0 + rng.gen_range(-35.0..35.0)).collect()
    }

    fn selected_orders(config: AutoARIMAConfig, seeds: std::ops::Range<u64>) -> Vec<(usize, usize)> {
        seeds
            .map(|seed| {
                let fitted = AutoARIMA::new(config.clone())
                    .search(&make_series(white_noise(400, seed)))
                    .unwrap();
                let spec = fitted.selected_spec();
                assert_eq!(spec.d, 0, "seed {seed}");
                (spec.p, spec.q)
            })
            .collect()
    }

    #[test]
    fn white_noise_selects_a_small_model_by_aic() {
        let orders = selected_orders(AutoARIMAConfig::default(), 0..20);
        let small = orders.iter().filter(|(p, q)| p + q <= 1).count();
        let largest_ar = orders.iter().filter(|(p, _)| *p == 3).count();
        assert!(small >= 10, "{orders:?}");
        assert!(largest_ar <= 3, "{orders:?}");
    }

    #[test]
    fn white_noise_selects_a_small_model_by_bic() {
        let config = AutoARIMAConfig::default().with_criterion(InformationCriterion::BIC);
        let orders = selected_orders(config, 0..10);
        let small = orders.iter().filter(|(p, q)| p + q <= 1).count();
        assert!(small >= 8, "{orders:?}");
    }

    #[test]
    fn candidates_share_one_estimation_sample() {
        let series = make_series(white_noise(400, 0));
        let fit = |p: usize| {
            SARIMA::new(SARIMASpec::nonseasonal(p, 0, 0))
                .with_condition_start(3)
                .estimate(&series)
                .unwrap()
        };
        let (ar0, ar3) = (fit(0), fit(3));
        assert_eq!(ar0.warmup(), 3);
        assert_eq!(ar3.warmup(), 3);

        // Same 397 observations: the AIC gap is the variance ratio plus
        // the penalty for three extra coefficients.
        let expected = 397.0 * (ar3.sigma2() / ar0.sigma2()).ln() + 6.0;
        assert!((ar3.aic() - ar0.aic() - expected).abs() < 1e-6);
    }

    #[test]
    fn trending_series_is_differenced() {
        let mut rng = StdRng::seed_from_u64(4);
        let y: Vec<f64> = (0..200)
            .map(|i| 5.0 + 1.5 * i as f64 + rng.gen_range(-1.0..1.0))
            .collect();
        let fitted = AutoARIMA::default().search(&make_series(y)).unwrap();
        assert_eq!(fitted.selected_spec().d, 1);
    }

    #[test]
    fn seasonal_search_uses_seasonal_differencing() {
        let pattern = [5.0, 20.0, 35.0, 25.0, 10.0, 0.0];
        let mut rng = StdRng::seed_from_u64(8);
        let y: Vec<f64> = (0..180)
            .map(|i| 40.0 + pattern[i % 6] + rng.gen_range(-1.0..1.0))
            .collect();

        let fitted = AutoARIMA::seasonal(6).search(&make_series(y)).unwrap();
        let spec = fitted.selected_spec();
        assert_eq!(spec.cap_d, 1);
        assert_eq!(spec.s, 6);

        let forecast = fitted.forecast(6).unwrap();
        for (h, v) in forecast.values().iter().enumerate() {
            assert!((v - 40.0 - pattern[h % 6]).abs() < 3.0, "h={h}: {v}");
        }
        assert!(fitted.description().contains("candidates"));
    }

    #[test]
    fn stepwise_respects_model_budget() {
        let config = AutoARIMAConfig::default().with_max_models(5);
        let fitted = AutoARIMA::new(config).search(&make_series(ar1(200, 0.5, 2))).unwrap();
        assert!(fitted.model_scores().len() <= 5);
    }

    #[test]
    fn exhaustive_covers_the_grid() {
        let config = AutoARIMAConfig::default()
            .with_max_orders(1, 1, 1)
            .exhaustive();
        let fitted = AutoARIMA::new(config).search(&make_series(ar1(150, 0.4, 3))).unwrap();
        assert_eq!(fitted.model_scores().len(), 4);
    }

    #[test]
    fn insufficient_data() {
        let err = AutoARIMA::seasonal(12).fit(&make_series(ar1(20, 0.5, 5))).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { needed: 36, got: 20 });
    }
}
