//! Differencing operators for (seasonal) ARIMA models.

use crate::utils::stats::variance;
use std::collections::BTreeMap;

/// Apply `(1 - B)^d`.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply `(1 - B^period)^d`.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    if period == 0 {
        return result;
    }
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result[period..]
            .iter()
            .zip(&result)
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// The combined operator `(1 - B)^d (1 - B^s)^D` as sparse lag terms.
///
/// `w_t = sum_k c_k y_{t-k}` with `c_0 = 1`; inverting it gives
/// `y_t = w_t - sum_{k>0} c_k y_{t-k}`.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferencingPolynomial {
    terms: Vec<(usize, f64)>,
}

impl DifferencingPolynomial {
    pub fn new(d: usize, seasonal_d: usize, period: usize) -> Self {
        let mut poly: BTreeMap<usize, f64> = BTreeMap::from([(0, 1.0)]);
        let factors = std::iter::repeat(1)
            .take(d)
            .chain(std::iter::repeat(period).take(if period > 0 { seasonal_d } else { 0 }));

        for lag in factors {
            let mut next = BTreeMap::new();
            for (&k, &c) in &poly {
                *next.entry(k).or_insert(0.0) += c;
                *next.entry(k + lag).or_insert(0.0) -= c;
            }
            poly = next;
        }

        Self {
            terms: poly.into_iter().filter(|(_, c)| *c != 0.0).collect(),
        }
    }

    /// Number of leading observations consumed by differencing.
    pub fn order(&self) -> usize {
        self.terms.last().map_or(0, |(k, _)| *k)
    }

    pub fn terms(&self) -> &[(usize, f64)] {
        &self.terms
    }

    pub fn is_identity(&self) -> bool {
        self.order() == 0
    }

    /// Differenced series, of length `y.len() - order()`.
    pub fn apply(&self, y: &[f64]) -> Vec<f64> {
        let order = self.order();
        if y.len() <= order {
            return Vec::new();
        }
        (order..y.len())
            .map(|t| self.terms.iter().map(|&(k, c)| c * y[t - k]).sum())
            .collect()
    }

    /// Extend `history` with values whose differences are `increments`.
    ///
    /// `history` must hold at least `order()` observations.
    pub fn integrate(&self, history: &[f64], increments: &[f64]) -> Vec<f64> {
        let mut extended = history.to_vec();
        extended.reserve(increments.len());
        for &w in increments {
            let t = extended.len();
            let carried: f64 = self
                .terms
                .iter()
                .skip(1)
                .map(|&(k, c)| c * extended[t - k])
                .sum();
            extended.push(w - carried);
        }
        extended.split_off(history.len())
    }
}

/// Non-seasonal differencing order (0, 1 or 2) from variance reduction.
pub fn suggest_differencing(series: &[f64]) -> usize {
    if series.len() < 3 {
        return 0;
    }
    let var_0 = variance(series);
    let diff_1 = difference(series, 1);
    let var_1 = variance(&diff_1);

    if var_0 > 0.0 && var_1 / var_0 < 0.9 {
        let diff_2 = difference(&diff_1, 1);
        if diff_2.len() >= 2 {
            let var_2 = variance(&diff_2);
            if var_2 / var_1 < 0.9 && var_2 < var_0 {
                return 2;
            }
        }
        return 1;
    }
    0
}

/// Seasonal differencing order (0 or 1): 1 when lag-`period` differencing
/// removes at least 30% of the variance.
pub fn suggest_seasonal_differencing(series: &[f64], period: usize) -> usize {
    if period < 2 || series.len() < 2 * period {
        return 0;
    }
    let diffs = seasonal_difference(series, 1, period);
    let (var_0, var_s) = (variance(series), variance(&diffs));
    if var_0 > 0.0 && var_s < 0.7 * var_0 {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn plain_differences() {
        let series = [1.0, 4.0, 9.0, 16.0, 25.0];
        assert_eq!(difference(&series, 0), series.to_vec());
        assert_eq!(difference(&series, 1), vec![3.0, 5.0, 7.0, 9.0]);
        assert_eq!(difference(&series, 2), vec![2.0, 2.0, 2.0]);
        assert!(difference(&[1.0], 1).is_empty());
    }

    #[test]
    fn seasonal_differences() {
        let series = [1.0, 2.0, 3.0, 11.0, 12.0, 13.0, 21.0];
        assert_eq!(seasonal_difference(&series, 1, 3), vec![10.0, 10.0, 10.0, 10.0]);
        assert_eq!(seasonal_difference(&series, 0, 3), series.to_vec());
        assert!(seasonal_difference(&series[..3], 1, 3).is_empty());
    }

    #[test]
    fn polynomial_expansion() {
        // (1 - B)(1 - B^4) = 1 - B - B^4 + B^5
        let poly = DifferencingPolynomial::new(1, 1, 4);
        assert_eq!(poly.terms(), &[(0, 1.0), (1, -1.0), (4, -1.0), (5, 1.0)]);
        assert_eq!(poly.order(), 5);

        // (1 - B)^2 = 1 - 2B + B^2
        let poly = DifferencingPolynomial::new(2, 0, 12);
        assert_eq!(poly.terms(), &[(0, 1.0), (1, -2.0), (2, 1.0)]);

        assert!(DifferencingPolynomial::new(0, 0, 7).is_identity());
    }

    #[test]
    fn polynomial_matches_successive_differencing() {
        let y: Vec<f64> = (0..40).map(|i| (i as f64 * 0.7).sin() * 10.0 + i as f64).collect();
        let poly = DifferencingPolynomial::new(1, 1, 6);
        let expected = seasonal_difference(&difference(&y, 1), 1, 6);

        let w = poly.apply(&y);
        assert_eq!(w.len(), expected.len());
        for (a, b) in w.iter().zip(&expected) {
            assert_relative_eq!(a, b, epsilon = 1e-10);
        }
    }

    #[test]
    fn integrate_inverts_apply() {
        let y: Vec<f64> = (0..30).map(|i| (i % 5) as f64 * 3.0 + 0.5 * i as f64).collect();
        let poly = DifferencingPolynomial::new(1, 1, 5);
        let w = poly.apply(&y);

        // Rebuild the last ten observations from their differences.
        let split = y.len() - 10;
        let rebuilt = poly.integrate(&y[..split], &w[w.len() - 10..]);
        for (a, b) in rebuilt.iter().zip(&y[split..]) {
            assert_relative_eq!(a, b, epsilon = 1e-10);
        }
    }

    #[test]
    fn differencing_suggestions() {
        let noise: Vec<f64> = (0..100).map(|i| ((i * 37) % 11) as f64).collect();
        assert_eq!(suggest_differencing(&noise), 0);

        let trend: Vec<f64> = (0..100).map(|i| 2.0 * i as f64 + ((i * 37) % 11) as f64 * 0.1).collect();
        assert_eq!(suggest_differencing(&trend), 1);

        let seasonal: Vec<f64> = (0..120).map(|i| [0.0, 10.0, 30.0, 10.0][i % 4] + (i % 3) as f64).collect();
        assert_eq!(suggest_seasonal_differencing(&seasonal, 4), 1);
        assert_eq!(suggest_seasonal_differencing(&seasonal[..6], 4), 0);
    }
}
