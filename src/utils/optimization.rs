//! Derivative-free minimisation used by the model estimators.

use std::cmp::Ordering;

/// Outcome of a Nelder-Mead run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    pub optimal_point: Vec<f64>,
    pub optimal_value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Nelder-Mead settings.
///
/// Reflection, expansion, contraction and shrink coefficients use the
/// standard values (1, 2, 0.5, 0.5).
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    /// Largest spread of objective values across a converged simplex.
    pub tolerance: f64,
    /// Largest distance from the centroid to a vertex of a converged simplex.
    pub x_tolerance: f64,
    /// Edge length of the initial simplex, relative to each coordinate (absolute near zero).
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            x_tolerance: 1e-6,
            initial_step: 0.05,
        }
    }
}

impl NelderMeadConfig {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_x_tolerance(mut self, x_tolerance: f64) -> Self {
        self.x_tolerance = x_tolerance;
        self
    }

    pub fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = step;
        self
    }
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

struct Vertex {
    point: Vec<f64>,
    value: f64,
}

/// Minimise `objective` starting from `initial`.
///
/// Points are clamped into `bounds` when given. Non-finite objective values
/// are treated as `+inf`, so estimators may return NaN for infeasible
/// parameters.
///
/// # Example
/// ```
/// use ridership_forecast::utils::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 1e-3);
/// assert!((result.optimal_point[1] + 1.0).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: Vec::new(),
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let eval = |point: Vec<f64>| -> Vertex {
        let point = clamp(point, bounds);
        let value = objective(&point);
        Vertex {
            value: if value.is_finite() { value } else { f64::INFINITY },
            point,
        }
    };

    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(eval(initial.to_vec()));
    for i in 0..n {
        let mut point = initial.to_vec();
        point[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        simplex.push(eval(point));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));

        let best = simplex[0].value;
        let worst = simplex[n].value;
        let spread = if worst.is_finite() { worst - best } else { f64::INFINITY };
        let centroid = centroid(&simplex[..n]);
        let diameter = simplex
            .iter()
            .map(|v| distance(&v.point, &centroid))
            .fold(0.0, f64::max);
        // Equal values alone do not mean convergence: the simplex can
        // straddle a minimum with both ends at the same height.
        if spread < config.tolerance && diameter < config.x_tolerance {
            converged = true;
            break;
        }

        let reflected = eval(towards(&centroid, &simplex[n].point, -REFLECT));

        if reflected.value < best {
            let expanded = eval(towards(&centroid, &reflected.point, EXPAND));
            simplex[n] = if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            };
            continue;
        }

        if reflected.value < simplex[n - 1].value {
            simplex[n] = reflected;
            continue;
        }

        let contracted = if reflected.value < worst {
            eval(towards(&centroid, &reflected.point, CONTRACT))
        } else {
            eval(towards(&centroid, &simplex[n].point, CONTRACT))
        };
        if contracted.value < reflected.value.min(worst) {
            simplex[n] = contracted;
            continue;
        }

        let anchor = simplex[0].point.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk: Vec<f64> = anchor
                .iter()
                .zip(&vertex.point)
                .map(|(a, p)| a + SHRINK * (p - a))
                .collect();
            *vertex = eval(shrunk);
        }
    }

    let best = simplex
        .into_iter()
        .min_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal))
        .unwrap_or(Vertex {
            point: initial.to_vec(),
            value: f64::NAN,
        });

    NelderMeadResult {
        optimal_point: best.point,
        optimal_value: best.value,
        iterations,
        converged,
    }
}

fn centroid(vertices: &[Vertex]) -> Vec<f64> {
    let dim = vertices[0].point.len();
    let mut c = vec![0.0; dim];
    for v in vertices {
        for (ci, pi) in c.iter_mut().zip(&v.point) {
            *ci += pi;
        }
    }
    c.iter_mut().for_each(|ci| *ci /= vertices.len() as f64);
    c
}

/// `centroid + t * (point - centroid)`; negative `t` reflects through the centroid.
fn towards(centroid: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point)
        .map(|(c, p)| c + t * (p - c))
        .collect()
}

fn clamp(point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point,
        Some(b) => point
            .into_iter()
            .enumerate()
            .map(|(i, x)| b.get(i).map_or(x, |&(lo, hi)| x.clamp(lo, hi)))
            .collect(),
    }
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
