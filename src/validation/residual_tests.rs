//! Residual diagnostics for fitted models.
//!
//! A well-specified model leaves residuals that look like white noise. The
//! portmanteau tests here quantify leftover autocorrelation, for instance at
//! the daily lag a seasonal model was supposed to absorb.

use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Portmanteau test result (Ljung-Box or Box-Pierce).
#[derive(Debug, Clone)]
pub struct LjungBoxResult {
    /// Test statistic Q
    pub statistic: f64,
    /// P-value from the chi-squared distribution
    pub p_value: f64,
    /// Number of lags tested
    pub lags: usize,
    /// Degrees of freedom
    pub df: usize,
}

impl LjungBoxResult {
    /// True when the null of independent residuals is not rejected at `alpha`.
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }

    fn undefined() -> Self {
        Self {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            df: 0,
        }
    }
}

/// Lag count used when none is given: `min(2 * period, n / 5)` for seasonal
/// data, `min(10, n / 5)` otherwise, and at least 1.
pub fn default_lags(n: usize, period: usize) -> usize {
    let cap = if period > 1 { 2 * period } else { 10 };
    cap.min(n / 5).max(1)
}

/// Ljung-Box test for autocorrelation in residuals.
///
/// `fitted_params` reduces the degrees of freedom (never below 1).
pub fn ljung_box(residuals: &[f64], lags: Option<usize>, fitted_params: usize) -> LjungBoxResult {
    portmanteau(residuals, lags, fitted_params, |acf, n, k| {
        acf * acf / (n - k) as f64 * (n * (n + 2)) as f64
    })
}

/// Box-Pierce test, the unweighted variant of Ljung-Box.
pub fn box_pierce(residuals: &[f64], lags: Option<usize>) -> LjungBoxResult {
    portmanteau(residuals, lags, 0, |acf, n, _| n as f64 * acf * acf)
}

fn portmanteau<F>(residuals: &[f64], lags: Option<usize>, fitted_params: usize, term: F) -> LjungBoxResult
where
    F: Fn(f64, usize, usize) -> f64,
{
    let n = residuals.len();
    if n < 3 {
        return LjungBoxResult::undefined();
    }

    let lags = lags.unwrap_or_else(|| default_lags(n, 1)).clamp(1, n - 1);
    let df = lags.saturating_sub(fitted_params).max(1);

    let mean = residuals.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = residuals.iter().map(|&x| x - mean).collect();
    let var: f64 = centered.iter().map(|&x| x * x).sum();
    if var == 0.0 {
        return LjungBoxResult {
            statistic: 0.0,
            p_value: 1.0,
            lags,
            df,
        };
    }

    let statistic: f64 = (1..=lags)
        .map(|k| {
            let acf = centered
                .iter()
                .skip(k)
                .zip(centered.iter())
                .map(|(&a, &b)| a * b)
                .sum::<f64>()
                / var;
            term(acf, n, k)
        })
        .sum();

    let p_value = ChiSquared::new(df as f64)
        .map(|dist| dist.sf(statistic))
        .unwrap_or(f64::NAN);

    LjungBoxResult {
        statistic,
        p_value,
        lags,
        df,
    }
}

/// Durbin-Watson test result.
#[derive(Debug, Clone)]
pub struct DurbinWatsonResult {
    /// Test statistic (0 to 4)
    pub statistic: f64,
    pub interpretation: AutocorrelationType,
}

/// Type of first-order autocorrelation detected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutocorrelationType {
    PositiveStrong,
    PositiveWeak,
    None,
    NegativeWeak,
    NegativeStrong,
}

/// Durbin-Watson statistic for first-order autocorrelation.
///
/// Near 0: positive autocorrelation, near 2: none, near 4: negative.
pub fn durbin_watson(residuals: &[f64]) -> DurbinWatsonResult {
    if residuals.len() < 2 {
        return DurbinWatsonResult {
            statistic: f64::NAN,
            interpretation: AutocorrelationType::None,
        };
    }

    let sum_diff_sq: f64 = residuals.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    let sum_sq: f64 = residuals.iter().map(|&r| r * r).sum();

    if sum_sq == 0.0 {
        return DurbinWatsonResult {
            statistic: 2.0,
            interpretation: AutocorrelationType::None,
        };
    }

    let dw = sum_diff_sq / sum_sq;
    let interpretation = match dw {
        d if d < 0.5 => AutocorrelationType::PositiveStrong,
        d if d < 1.5 => AutocorrelationType::PositiveWeak,
        d if d <= 2.5 => AutocorrelationType::None,
        d if d < 3.5 => AutocorrelationType::NegativeWeak,
        _ => AutocorrelationType::NegativeStrong,
    };

    DurbinWatsonResult {
        statistic: dw,
        interpretation,
    }
}

/// Summary of residual behaviour for one fitted model.
#[derive(Debug, Clone)]
pub struct ResidualDiagnostics {
    pub mean: f64,
    pub std_dev: f64,
    pub ljung_box: LjungBoxResult,
    pub durbin_watson: DurbinWatsonResult,
}

impl ResidualDiagnostics {
    /// Run the standard checks with seasonal-aware lag selection.
    pub fn compute(residuals: &[f64], period: usize, fitted_params: usize) -> Self {
        let n = residuals.len();
        let lags = default_lags(n, period);
        let mean = crate::utils::stats::mean(residuals);

        Self {
            mean,
            std_dev: crate::utils::stats::std_dev(residuals),
            ljung_box: ljung_box(residuals, Some(lags), fitted_params),
            durbin_watson: durbin_watson(residuals),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo_noise(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| ((i * 17 + 13) % 97) as f64 / 50.0 - 1.0)
            .collect()
    }

    #[test]
    fn ljung_box_bounds() {
        let result = ljung_box(&pseudo_noise(100), Some(10), 0);
        assert!(result.statistic >= 0.0);
        assert!((0.0..=1.0).contains(&result.p_value));
        assert_eq!(result.lags, 10);
        assert_eq!(result.df, 10);
    }

    #[test]
    fn ljung_box_rejects_autoregressive_residuals() {
        let mut residuals = vec![0.0; 200];
        residuals[0] = 1.0;
        for i in 1..200 {
            residuals[i] = 0.9 * residuals[i - 1] + 0.1 * ((i * 17) % 23) as f64 / 23.0;
        }

        let result = ljung_box(&residuals, Some(10), 0);
        assert!(!result.is_white_noise(0.05));
    }

    #[test]
    fn ljung_box_degenerate_inputs() {
        let constant = ljung_box(&[1.0; 50], Some(5), 0);
        assert_eq!(constant.statistic, 0.0);
        assert_eq!(constant.p_value, 1.0);

        assert!(ljung_box(&[1.0, 2.0], Some(5), 0).statistic.is_nan());
    }

    #[test]
    fn fitted_params_reduce_degrees_of_freedom() {
        let residuals = pseudo_noise(100);
        assert_eq!(ljung_box(&residuals, Some(10), 2).df, 8);
        assert_eq!(ljung_box(&residuals, Some(3), 9).df, 1);
    }

    #[test]
    fn box_pierce_never_exceeds_ljung_box() {
        let residuals = pseudo_noise(120);
        let lb = ljung_box(&residuals, Some(12), 0);
        let bp = box_pierce(&residuals, Some(12));
        assert!(bp.statistic <= lb.statistic);
    }

    #[test]
    fn seasonal_default_lags() {
        assert_eq!(default_lags(630, 63), 126);
        assert_eq!(default_lags(100, 63), 20);
        assert_eq!(default_lags(100, 1), 10);
        assert_eq!(default_lags(3, 1), 1);
    }

    #[test]
    fn durbin_watson_interpretation() {
        let mut smooth = vec![0.0; 100];
        smooth[0] = 1.0;
        for i in 1..100 {
            smooth[i] = 0.95 * smooth[i - 1];
        }
        assert_eq!(
            durbin_watson(&smooth).interpretation,
            AutocorrelationType::PositiveStrong
        );

        let alternating: Vec<f64> = (0..100)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let dw = durbin_watson(&alternating);
        assert!(dw.statistic > 3.5);
        assert_eq!(dw.interpretation, AutocorrelationType::NegativeStrong);
    }

    #[test]
    fn diagnostics_summary() {
        let residuals = pseudo_noise(300);
        let diag = ResidualDiagnostics::compute(&residuals, 7, 1);
        assert_eq!(diag.ljung_box.lags, 14);
        assert_eq!(diag.ljung_box.df, 13);
        assert!(diag.std_dev > 0.0);
    }
}
