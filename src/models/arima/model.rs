//! Seasonal ARIMA estimated by conditional sum of squares.
//!
//! With `w = (1 - B)^d (1 - B^s)^D y`, the model is
//! `phi(B) Phi(B^s) (w_t - mu) = theta(B) Theta(B^s) e_t`, where the
//! intercept `mu` is only estimated for undifferenced series.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::DifferencingPolynomial;
use crate::models::traits::{check_trainable, residuals_of, FittedModel, Forecaster};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::mean;
use std::collections::BTreeMap;
use std::fmt;

/// Orders of a SARIMA(p, d, q)(P, D, Q)\[s\] model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SARIMASpec {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub cap_p: usize,
    pub cap_d: usize,
    pub cap_q: usize,
    /// Seasonal period; ignored when all seasonal orders are zero.
    pub s: usize,
}

impl SARIMASpec {
    pub fn new(
        (p, d, q): (usize, usize, usize),
        (cap_p, cap_d, cap_q): (usize, usize, usize),
        s: usize,
    ) -> Self {
        Self {
            p,
            d,
            q,
            cap_p,
            cap_d,
            cap_q,
            s,
        }
    }

    /// ARIMA(p, d, q) without seasonal terms.
    pub fn nonseasonal(p: usize, d: usize, q: usize) -> Self {
        Self::new((p, d, q), (0, 0, 0), 0)
    }

    pub fn is_seasonal(&self) -> bool {
        self.s > 1 && (self.cap_p > 0 || self.cap_d > 0 || self.cap_q > 0)
    }

    /// The intercept is estimated only when the series is not differenced.
    pub fn has_intercept(&self) -> bool {
        self.d + self.cap_d == 0
    }

    /// Estimated coefficients, intercept included.
    pub fn num_params(&self) -> usize {
        self.p + self.q + self.cap_p + self.cap_q + usize::from(self.has_intercept())
    }

    fn seasonal_step(&self) -> usize {
        if self.is_seasonal() {
            self.s
        } else {
            0
        }
    }

    /// Largest autoregressive lag after expanding the seasonal product.
    pub fn ar_order(&self) -> usize {
        self.p + self.cap_p * self.seasonal_step()
    }

    /// Largest moving-average lag after expanding the seasonal product.
    pub fn ma_order(&self) -> usize {
        self.q + self.cap_q * self.seasonal_step()
    }

    pub fn differencing(&self) -> DifferencingPolynomial {
        DifferencingPolynomial::new(self.d, self.cap_d, self.seasonal_step())
    }

    /// Shortest series this specification can be estimated on.
    pub fn min_observations(&self) -> usize {
        self.differencing().order() + self.ar_order().max(self.ma_order()) + self.num_params() + 2
    }

    fn validate(&self) -> Result<()> {
        let seasonal_terms = self.cap_p + self.cap_d + self.cap_q;
        if seasonal_terms > 0 && self.s < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "{self} has seasonal terms but no seasonal period"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for SARIMASpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_seasonal() {
            write!(
                f,
                "SARIMA({},{},{})({},{},{})[{}]",
                self.p, self.d, self.q, self.cap_p, self.cap_d, self.cap_q, self.s
            )
        } else {
            write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
        }
    }
}

/// SARIMA estimator for a fixed specification.
///
/// # Example
/// ```
/// use ridership_forecast::core::TimeSeries;
/// use ridership_forecast::models::{Forecaster, SARIMA, SARIMASpec};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let n = 96;
/// let timestamps: Vec<_> = (0..n).map(|i| base + Duration::hours(i)).collect();
/// let values: Vec<f64> = (0..n)
///     .map(|i| 20.0 + [0.0, 6.0, 9.0, 4.0][i as usize % 4] + 0.3 * ((i * 7) % 5) as f64)
///     .collect();
/// let ts = TimeSeries::univariate(timestamps, values).unwrap();
///
/// let model = SARIMA::new(SARIMASpec::new((1, 0, 0), (0, 1, 1), 4));
/// assert_eq!(model.name(), "SARIMA(1,0,0)(0,1,1)[4]");
///
/// let fitted = model.fit(&ts).unwrap();
/// assert_eq!(fitted.forecast(8).unwrap().horizon(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct SARIMA {
    spec: SARIMASpec,
    label: String,
    optimizer: NelderMeadConfig,
    condition_start: usize,
}

impl SARIMA {
    pub fn new(spec: SARIMASpec) -> Self {
        Self {
            label: spec.to_string(),
            spec,
            optimizer: NelderMeadConfig::default()
                .with_max_iter(2000)
                .with_tolerance(1e-7),
            condition_start: 0,
        }
    }

    /// Override the displayed model name.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_optimizer(mut self, config: NelderMeadConfig) -> Self {
        self.optimizer = config;
        self
    }

    /// Condition the sum of squares on the differenced series from index
    /// `start` onwards, or from the AR order if that is larger.
    ///
    /// Models of different AR orders only have comparable likelihoods when
    /// they are scored on the same observations, so order searches pass
    /// the largest AR order they will try.
    pub fn with_condition_start(mut self, start: usize) -> Self {
        self.condition_start = start;
        self
    }

    pub fn spec(&self) -> SARIMASpec {
        self.spec
    }

    /// Fit and return the concrete fitted type.
    pub fn estimate(&self, series: &TimeSeries) -> Result<FittedSARIMA> {
        let spec = self.spec;
        spec.validate()?;

        let y = series.values();
        check_trainable(y, spec.min_observations())?;

        let diff = spec.differencing();
        let w = diff.apply(y);
        let start = spec.ar_order().max(self.condition_start);
        if w.len() <= start + spec.num_params() {
            return Err(ForecastError::InsufficientData {
                needed: diff.order() + start + spec.num_params() + 1,
                got: y.len(),
            });
        }
        let n_eff = w.len() - start;

        let layout = Layout::of(&spec);
        let initial = layout.initial_point(&w);
        let (params, converged) = if layout.len() == 0 {
            (initial, true)
        } else if layout.coefficient_count() == 0 {
            // Intercept only: the CSS optimum is the mean.
            (vec![mean(&w)], true)
        } else {
            let bounds = layout.bounds();
            let result = nelder_mead(
                |x| {
                    let coefs = layout.unpack(x);
                    if !coefs.is_admissible() {
                        return f64::NAN;
                    }
                    let errors = css_errors(&w, &coefs.expand(&spec), start);
                    errors[start..].iter().map(|e| e * e).sum::<f64>() / n_eff as f64
                },
                &initial,
                Some(&bounds),
                self.optimizer.clone(),
            );
            (result.optimal_point, result.converged)
        };

        let coefs = layout.unpack(&params);
        if !coefs.is_admissible() {
            return Err(ForecastError::ComputationError(format!(
                "{spec}: no stationary and invertible solution found"
            )));
        }
        let lags = coefs.expand(&spec);
        let errors = css_errors(&w, &lags, start);
        let css: f64 = errors[start..].iter().map(|e| e * e).sum();
        if !css.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "{spec}: conditional sum of squares diverged"
            )));
        }
        let sigma2 = (css / n_eff as f64).max(1e-12);

        let offset = diff.order();
        let warmup = offset + start;
        let fitted: Vec<f64> = y
            .iter()
            .enumerate()
            .map(|(t, &v)| if t < warmup { v } else { v - errors[t - offset] })
            .collect();
        let residuals = residuals_of(y, &fitted);

        let k = spec.num_params() as f64;
        let n = n_eff as f64;
        let log_likelihood = -0.5 * n * (1.0 + sigma2.ln() + (2.0 * std::f64::consts::PI).ln());

        Ok(FittedSARIMA {
            spec,
            coefs,
            lags,
            diff,
            history: y.to_vec(),
            differenced: w,
            errors,
            fitted,
            residuals,
            sigma2,
            aic: -2.0 * log_likelihood + 2.0 * k,
            bic: -2.0 * log_likelihood + k * n.ln(),
            warmup,
            converged,
        })
    }
}

impl Forecaster for SARIMA {
    fn fit(&self, series: &TimeSeries) -> Result<Box<dyn FittedModel>> {
        Ok(Box::new(self.estimate(series)?))
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Estimated coefficients in the conventional sign convention:
/// `phi(B) = 1 - sum phi_i B^i`, `theta(B) = 1 + sum theta_i B^i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    pub intercept: f64,
    pub ar: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

/// Expanded lag terms used by the recursions.
#[derive(Debug, Clone)]
struct LagTerms {
    intercept: f64,
    /// `(k, a_k)` in `w_t - mu = sum a_k (w_{t-k} - mu) + ...`
    ar: Vec<(usize, f64)>,
    /// `(k, m_k)` in `... + sum m_k e_{t-k} + e_t`
    ma: Vec<(usize, f64)>,
}

impl Coefficients {
    fn is_admissible(&self) -> bool {
        let negated = |c: &[f64]| c.iter().map(|x| -x).collect::<Vec<_>>();
        is_stationary(&self.ar)
            && is_stationary(&self.seasonal_ar)
            && is_stationary(&negated(&self.ma))
            && is_stationary(&negated(&self.seasonal_ma))
    }

    fn expand(&self, spec: &SARIMASpec) -> LagTerms {
        let s = spec.seasonal_step();
        let ar = multiply(&factor(&self.ar, 1, -1.0), &factor(&self.seasonal_ar, s, -1.0));
        let ma = multiply(&factor(&self.ma, 1, 1.0), &factor(&self.seasonal_ma, s, 1.0));

        LagTerms {
            intercept: self.intercept,
            ar: ar.into_iter().filter(|(k, _)| *k > 0).map(|(k, c)| (k, -c)).collect(),
            ma: ma.into_iter().filter(|(k, _)| *k > 0).collect(),
        }
    }
}

/// `1 + sign * sum c_i B^{i * step}` as sparse terms.
fn factor(coefs: &[f64], step: usize, sign: f64) -> Vec<(usize, f64)> {
    std::iter::once((0, 1.0))
        .chain(coefs.iter().enumerate().map(|(i, &c)| ((i + 1) * step, sign * c)))
        .collect()
}

fn multiply(a: &[(usize, f64)], b: &[(usize, f64)]) -> Vec<(usize, f64)> {
    let mut product = BTreeMap::new();
    for &(i, x) in a {
        for &(j, y) in b {
            *product.entry(i + j).or_insert(0.0) += x * y;
        }
    }
    product.into_iter().collect()
}

/// Whether `1 - sum phi_i z^i` has all roots outside the unit circle,
/// via the step-down (reverse Levinson) recursion.
pub fn is_stationary(phi: &[f64]) -> bool {
    let mut a = phi.to_vec();
    while let Some(&k) = a.last() {
        if !k.is_finite() || k.abs() >= 1.0 {
            return false;
        }
        let m = a.len();
        let denom = 1.0 - k * k;
        a = (0..m - 1).map(|j| (a[j] + k * a[m - 2 - j]) / denom).collect();
    }
    true
}

/// One-step innovations on the differenced scale; zero before `start`.
fn css_errors(w: &[f64], lags: &LagTerms, start: usize) -> Vec<f64> {
    let mu = lags.intercept;
    let mut errors = vec![0.0; w.len()];
    for t in start..w.len() {
        let mut pred = mu;
        for &(k, a) in &lags.ar {
            pred += a * (w[t - k] - mu);
        }
        for &(k, m) in &lags.ma {
            if k <= t {
                pred += m * errors[t - k];
            }
        }
        errors[t] = w[t] - pred;
    }
    errors
}

/// Position of each coefficient group inside the optimiser's vector.
struct Layout {
    intercept: bool,
    p: usize,
    cap_p: usize,
    q: usize,
    cap_q: usize,
}

impl Layout {
    fn of(spec: &SARIMASpec) -> Self {
        let seasonal = spec.is_seasonal();
        Self {
            intercept: spec.has_intercept(),
            p: spec.p,
            cap_p: if seasonal { spec.cap_p } else { 0 },
            q: spec.q,
            cap_q: if seasonal { spec.cap_q } else { 0 },
        }
    }

    fn coefficient_count(&self) -> usize {
        self.p + self.cap_p + self.q + self.cap_q
    }

    fn len(&self) -> usize {
        self.coefficient_count() + usize::from(self.intercept)
    }

    fn initial_point(&self, w: &[f64]) -> Vec<f64> {
        let mut x = Vec::with_capacity(self.len());
        if self.intercept {
            x.push(mean(w));
        }
        for group in [self.p, self.cap_p, self.q, self.cap_q] {
            x.extend((0..group).map(|i| 0.1 / (i + 1) as f64));
        }
        x
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        let mut b = Vec::with_capacity(self.len());
        if self.intercept {
            b.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        b.extend(std::iter::repeat((-0.99, 0.99)).take(self.coefficient_count()));
        b
    }

    fn unpack(&self, x: &[f64]) -> Coefficients {
        let (intercept, mut rest) = if self.intercept {
            (x[0], &x[1..])
        } else {
            (0.0, x)
        };
        let mut take = |n: usize| {
            let (head, tail) = rest.split_at(n);
            rest = tail;
            head.to_vec()
        };
        Coefficients {
            intercept,
            ar: take(self.p),
            seasonal_ar: take(self.cap_p),
            ma: take(self.q),
            seasonal_ma: take(self.cap_q),
        }
    }
}

/// SARIMA fitted to a series.
#[derive(Debug, Clone)]
pub struct FittedSARIMA {
    spec: SARIMASpec,
    coefs: Coefficients,
    lags: LagTerms,
    diff: DifferencingPolynomial,
    history: Vec<f64>,
    differenced: Vec<f64>,
    errors: Vec<f64>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    sigma2: f64,
    aic: f64,
    bic: f64,
    warmup: usize,
    converged: bool,
}

impl FittedSARIMA {
    pub fn spec(&self) -> SARIMASpec {
        self.spec
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefs
    }

    /// Innovation variance estimate (CSS / effective sample size).
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl FittedModel for FittedSARIMA {
    fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn forecast(&self, horizon: usize) -> Result<Forecast> {
        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let mu = self.lags.intercept;
        let mut w = self.differenced.clone();
        let mut e = self.errors.clone();
        let n = w.len();

        for _ in 0..horizon {
            let t = w.len();
            let mut pred = mu;
            for &(k, a) in &self.lags.ar {
                pred += a * (w[t - k] - mu);
            }
            for &(k, m) in &self.lags.ma {
                pred += m * e[t - k];
            }
            w.push(pred);
            e.push(0.0);
        }

        let values = self.diff.integrate(&self.history, &w[n..]);
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(format!(
                "{}: forecast diverged",
                self.spec
            )));
        }
        Ok(Forecast::from_values(values))
    }

    fn warmup(&self) -> usize {
        self.warmup
    }

    fn num_params(&self) -> usize {
        self.spec.num_params()
    }

    fn description(&self) -> String {
        let fmt_coefs = |c: &[f64]| {
            c.iter()
                .map(|x| format!("{x:.3}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut parts = vec![self.spec.to_string()];
        if self.spec.has_intercept() {
            parts.push(format!("mu={:.3}", self.coefs.intercept));
        }
        for (label, c) in [
            ("ar", &self.coefs.ar),
            ("sar", &self.coefs.seasonal_ar),
            ("ma", &self.coefs.ma),
            ("sma", &self.coefs.seasonal_ma),
        ] {
            if !c.is_empty() {
                parts.push(format!("{label}=[{}]", fmt_coefs(c)));
            }
        }
        parts.push(format!("sigma2={:.3} aic={:.2}", self.sigma2, self.aic));
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn make_series(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base + Duration::minutes(15 * i as i64))
            .collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    #[test]
    fn spec_display_and_counts() {
        let spec = SARIMASpec::new((1, 1, 1), (1, 1, 1), 63);
        assert_eq!(spec.to_string(), "SARIMA(1,1,1)(1,1,1)[63]");
        assert_eq!(spec.num_params(), 4);
        assert!(!spec.has_intercept());
        assert_eq!(spec.ar_order(), 64);
        assert_eq!(spec.differencing().order(), 64);

        let plain = SARIMASpec::nonseasonal(2, 0, 1);
        assert_eq!(plain.to_string(), "ARIMA(2,0,1)");
        assert_eq!(plain.num_params(), 4);
        assert!(plain.has_intercept());
    }

    #[test]
    fn seasonal_terms_need_a_period() {
        let spec = SARIMASpec::new((0, 0, 0), (1, 0, 0), 0);
        let err = SARIMA::new(spec).fit(&make_series(noise(50, 1))).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }

    #[test]
    fn stationarity_check() {
        assert!(is_stationary(&[]));
        assert!(is_stationary(&[0.5]));
        assert!(!is_stationary(&[1.0]));
        assert!(is_stationary(&[0.5, 0.3]));
        assert!(!is_stationary(&[0.8, 0.3]));
        assert!(!is_stationary(&[0.2, -1.1]));
    }

    #[test]
    fn seasonal_product_expansion() {
        let coefs = Coefficients {
            intercept: 0.0,
            ar: vec![0.5],
            seasonal_ar: vec![0.4],
            ma: vec![],
            seasonal_ma: vec![],
        };
        let spec = SARIMASpec::new((1, 0, 0), (1, 0, 0), 4);
        // (1 - 0.5B)(1 - 0.4B^4) = 1 - 0.5B - 0.4B^4 + 0.2B^5
        let lags = coefs.expand(&spec);
        assert_eq!(lags.ar.len(), 3);
        assert_relative_eq!(lags.ar[0].1, 0.5);
        assert_eq!(lags.ar[1].0, 4);
        assert_relative_eq!(lags.ar[1].1, 0.4);
        assert_eq!(lags.ar[2].0, 5);
        assert_relative_eq!(lags.ar[2].1, -0.2);
    }

    #[test]
    fn recovers_ar1_coefficient() {
        let e = noise(600, 7);
        let mut y = vec![0.0; 600];
        for t in 1..600 {
            y[t] = 0.7 * y[t - 1] + e[t];
        }
        let y: Vec<f64> = y.iter().map(|v| v + 10.0).collect();

        let model = SARIMA::new(SARIMASpec::nonseasonal(1, 0, 0))
            .estimate(&make_series(y))
            .unwrap();
        assert_relative_eq!(model.coefficients().ar[0], 0.7, epsilon = 0.1);
        assert_relative_eq!(model.coefficients().intercept, 10.0, epsilon = 0.5);
        assert!(model.aic().is_finite());
    }

    #[test]
    fn fitted_values_are_on_the_original_scale() {
        let e = noise(200, 3);
        let y: Vec<f64> = (0..200).map(|i| 50.0 + 0.5 * i as f64 + e[i]).collect();
        let model = SARIMA::new(SARIMASpec::nonseasonal(0, 1, 1))
            .estimate(&make_series(y.clone()))
            .unwrap();

        assert_eq!(model.warmup(), 1);
        assert_eq!(model.fitted_values()[0], y[0]);
        let mae: f64 = model.residuals()[1..].iter().map(|r| r.abs()).sum::<f64>() / 199.0;
        assert!(mae < 2.0, "mae = {mae}");
    }

    #[test]
    fn seasonal_difference_forecast_continues_pattern() {
        let pattern = [10.0, 30.0, 50.0, 20.0];
        let e = noise(160, 11);
        let y: Vec<f64> = (0..160).map(|i| pattern[i % 4] + 0.3 * e[i]).collect();

        let model = SARIMA::new(SARIMASpec::new((0, 0, 0), (0, 1, 1), 4))
            .estimate(&make_series(y))
            .unwrap();
        let forecast = model.forecast(8).unwrap();
        for (h, v) in forecast.values().iter().enumerate() {
            assert_relative_eq!(*v, pattern[h % 4], epsilon = 1.0);
        }
        assert_eq!(model.warmup(), 4);
    }

    #[test]
    fn zero_horizon_and_short_series() {
        let y = noise(100, 5);
        let model = SARIMA::new(SARIMASpec::nonseasonal(1, 0, 0))
            .estimate(&make_series(y))
            .unwrap();
        assert!(model.forecast(0).unwrap().is_empty());

        let err = SARIMA::new(SARIMASpec::new((1, 1, 1), (1, 1, 1), 12))
            .fit(&make_series(noise(30, 2)))
            .unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { .. }));
    }

    #[test]
    fn condition_start_extends_the_warmup() {
        let y = noise(60, 12);
        let model = SARIMA::new(SARIMASpec::nonseasonal(1, 1, 0))
            .with_condition_start(10)
            .estimate(&make_series(y.clone()))
            .unwrap();
        assert_eq!(model.warmup(), 11);
        assert_eq!(&model.fitted_values()[..11], &y[..11]);

        let err = SARIMA::new(SARIMASpec::nonseasonal(1, 0, 0))
            .with_condition_start(58)
            .estimate(&make_series(y))
            .unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { needed: 61, got: 60 });
    }

    #[test]
    fn description_lists_coefficients() {
        let e = noise(80, 9);
        let y = (0..80).map(|i| i as f64 + e[i]).collect();
        let model = SARIMA::new(SARIMASpec::nonseasonal(1, 1, 0))
            .estimate(&make_series(y))
            .unwrap();
        let text = model.description();
        assert!(text.starts_with("ARIMA(1,1,0) ar=["));
        assert!(text.contains("aic="));
        assert!(!text.contains("mu="));
    }
}
