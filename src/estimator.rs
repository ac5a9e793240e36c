// estimator.rs - Latent-feature logistic estimator for edge formation

use crate::error::EstimatorError;
use crate::graph::Graph;
use nalgebra::{DMatrix, DVector};

/// Iteration budget for the IRLS path (smooth objective).
const IRLS_MAX_ITER: usize = 100;

/// Iteration budget for the proximal-gradient path (L1 objective).
const PROX_MAX_ITER: usize = 20_000;

/// Convergence tolerance on the largest coefficient change.
const TOL: f64 = 1e-8;

/// Coefficient magnitude past which the fit is declared divergent
/// (perfectly separable labels push the MLE to infinity).
const COEF_LIMIT: f64 = 1e6;

/// Immutable summary of a fitted edge-formation model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedParameters {
    pub n: usize,
    pub d: usize,
    /// Scale of the first structural feature; the edge-formation strength.
    pub sigma: f64,
    /// Wald-test p-value for `sigma`.
    pub p_value: f64,
}

/// Full output of a regularized logistic fit.
#[derive(Debug, Clone)]
pub struct LogitFit {
    /// Coefficients: structural features first, intercept last.
    pub params: Vec<f64>,
    /// Wald-test p-value for the first structural coefficient.
    pub p_value: f64,
    pub iterations: usize,
    pub neg_log_likelihood: f64,
}

/// Strategy producing the per-pair feature matrix consumed by the
/// logistic fit. One row per unordered pair (i, j), i < j, in
/// lexicographic order.
pub trait PairFeatures {
    /// Number of feature columns (excluding the intercept the fit appends).
    fn dim(&self) -> usize;
    fn features(&self, graph: &Graph) -> DMatrix<f64>;
}

/// Default feature construction: column k holds the number of walks of
/// length k+2 between the pair, scaled by the maximum count over all
/// pairs. Walks of length 2 are common-neighbor counts, so `d` selects
/// how many neighborhood orders enter the model; `d = 0` keeps the single
/// common-neighbor column.
#[derive(Debug, Clone, Copy)]
pub struct WalkCountFeatures {
    pub d: usize,
}

impl PairFeatures for WalkCountFeatures {
    fn dim(&self) -> usize {
        self.d.max(1)
    }

    fn features(&self, graph: &Graph) -> DMatrix<f64> {
        let n = graph.n();
        let pairs = n * (n - 1) / 2;
        let cols = self.dim();
        let mut out = DMatrix::zeros(pairs, cols);

        let adj = graph.adjacency();
        let mut power = adj * adj; // walk counts of length 2
        for col in 0..cols {
            if col > 0 {
                power = &power * adj;
            }
            let mut max_count = 0.0_f64;
            for (i, j) in graph.pairs() {
                max_count = max_count.max(power[(i, j)]);
            }
            let scale = if max_count > 0.0 { 1.0 / max_count } else { 0.0 };
            for (row, (i, j)) in graph.pairs().enumerate() {
                out[(row, col)] = power[(i, j)] * scale;
            }
        }
        out
    }
}

/// Fits a regularized logistic model relating a latent feature space of
/// dimension `d` to edge presence in the observed graph.
pub struct LogitRegEstimator<'a> {
    graph: &'a Graph,
    d: usize,
}

impl<'a> LogitRegEstimator<'a> {
    pub fn new(graph: &'a Graph, d: usize) -> Self {
        Self { graph, d }
    }

    /// Feature/label table: one row per unordered pair, label 1.0 iff the
    /// pair is an edge. Deterministic given (graph, d).
    pub fn get_features_labels(&self) -> Result<(DMatrix<f64>, Vec<f64>), EstimatorError> {
        let n = self.graph.n();
        if n < 2 {
            return Err(EstimatorError::DegenerateInput(format!(
                "graph with {} nodes has no node pairs",
                n
            )));
        }
        let features = WalkCountFeatures { d: self.d }.features(self.graph);
        let labels: Vec<f64> = self
            .graph
            .pairs()
            .map(|(i, j)| if self.graph.has_edge(i, j) { 1.0 } else { 0.0 })
            .collect();
        Ok((features, labels))
    }

    /// Fit an elastic-net logistic regression of label on features.
    ///
    /// `alpha` is the overall regularization strength (0 = plain MLE) and
    /// `l1_wt` mixes L1 against L2 (1.0 = lasso). An intercept column is
    /// appended internally (last position, never penalized) so that
    /// `params[0]` stays the first structural coefficient — callers take
    /// it as `sigma`.
    pub fn estimate_parameters(
        &self,
        l1_wt: f64,
        alpha: f64,
        features: &DMatrix<f64>,
        labels: &[f64],
    ) -> Result<LogitFit, EstimatorError> {
        let edges = labels.iter().filter(|&&y| y == 1.0).count();
        if edges == 0 || edges == labels.len() {
            return Err(EstimatorError::DegenerateInput(format!(
                "labels are constant ({} of {} pairs are edges)",
                edges,
                labels.len()
            )));
        }

        let x = with_intercept(features);
        let y = DVector::from_column_slice(labels);
        let l1 = alpha * l1_wt;
        let ridge = alpha * (1.0 - l1_wt);

        let (w, iterations) = if l1 == 0.0 {
            irls(&x, &y, ridge)?
        } else {
            proximal_gradient(&x, &y, l1, ridge)?
        };

        let p_value = wald_p_value(&x, &w, 0);
        let nll = neg_log_likelihood(&x, &y, &w);
        Ok(LogitFit {
            params: w.iter().copied().collect(),
            p_value,
            iterations,
            neg_log_likelihood: nll,
        })
    }

    /// Full estimation pass: build the table, fit, and summarize.
    pub fn fit(&self, l1_wt: f64, alpha: f64) -> Result<FittedParameters, EstimatorError> {
        let (features, labels) = self.get_features_labels()?;
        let fit = self.estimate_parameters(l1_wt, alpha, &features, &labels)?;
        Ok(FittedParameters {
            n: self.graph.n(),
            d: self.d,
            sigma: fit.params[0],
            p_value: fit.p_value,
        })
    }
}

/// Append a column of ones (intercept last).
fn with_intercept(features: &DMatrix<f64>) -> DMatrix<f64> {
    let (rows, cols) = features.shape();
    let mut x = DMatrix::zeros(rows, cols + 1);
    x.view_mut((0, 0), (rows, cols)).copy_from(features);
    for r in 0..rows {
        x[(r, cols)] = 1.0;
    }
    x
}

#[inline(always)]
fn sigmoid(t: f64) -> f64 {
    1.0 / (1.0 + (-t).exp())
}

fn neg_log_likelihood(x: &DMatrix<f64>, y: &DVector<f64>, w: &DVector<f64>) -> f64 {
    let eta = x * w;
    let mut nll = 0.0;
    for (i, &e) in eta.iter().enumerate() {
        // log(1 + exp(e)) - y*e, computed stably
        let log1p_exp = if e > 0.0 { e + (-e).exp().ln_1p() } else { e.exp().ln_1p() };
        nll += log1p_exp - y[i] * e;
    }
    nll / y.len() as f64
}

/// Iteratively reweighted least squares for the smooth (ridge) objective.
fn irls(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    ridge: f64,
) -> Result<(DVector<f64>, usize), EstimatorError> {
    let (rows, cols) = x.shape();
    let mut w = DVector::zeros(cols);

    for iter in 0..IRLS_MAX_ITER {
        let eta = x * &w;
        let mu: DVector<f64> = eta.map(sigmoid);

        // X^T S X + ridge (intercept unpenalized)
        let mut hessian = DMatrix::zeros(cols, cols);
        for r in 0..rows {
            let s = (mu[r] * (1.0 - mu[r])).max(1e-10);
            for a in 0..cols {
                for b in a..cols {
                    let v = s * x[(r, a)] * x[(r, b)];
                    hessian[(a, b)] += v;
                    if a != b {
                        hessian[(b, a)] += v;
                    }
                }
            }
        }
        for a in 0..cols - 1 {
            hessian[(a, a)] += rows as f64 * ridge;
        }
        for a in 0..cols {
            hessian[(a, a)] += 1e-10;
        }

        let mut grad = x.transpose() * (y - &mu);
        for a in 0..cols - 1 {
            grad[a] -= rows as f64 * ridge * w[a];
        }

        let step = hessian
            .lu()
            .solve(&grad)
            .ok_or(EstimatorError::Convergence { iterations: iter })?;
        w += &step;

        if w.iter().any(|c| c.abs() > COEF_LIMIT) {
            return Err(EstimatorError::Convergence { iterations: iter });
        }
        if step.amax() < TOL {
            return Ok((w, iter + 1));
        }
    }
    Err(EstimatorError::Convergence { iterations: IRLS_MAX_ITER })
}

/// Proximal gradient descent (ISTA) for the elastic-net objective.
fn proximal_gradient(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    l1: f64,
    ridge: f64,
) -> Result<(DVector<f64>, usize), EstimatorError> {
    let (rows, cols) = x.shape();
    let mut w = DVector::zeros(cols);

    // Lipschitz bound for the logistic gradient plus the ridge term.
    let lipschitz = x.iter().map(|v| v * v).sum::<f64>() / (4.0 * rows as f64) + ridge + 1e-12;
    let step = 1.0 / lipschitz;

    for iter in 0..PROX_MAX_ITER {
        let eta = x * &w;
        let mu: DVector<f64> = eta.map(sigmoid);
        let mut grad = x.transpose() * (&mu - y) / rows as f64;
        for a in 0..cols - 1 {
            grad[a] += ridge * w[a];
        }

        let mut next = &w - step * &grad;
        for a in 0..cols - 1 {
            next[a] = soft_threshold(next[a], step * l1);
        }

        let delta = (&next - &w).amax();
        w = next;

        if w.iter().any(|c| c.abs() > COEF_LIMIT) {
            return Err(EstimatorError::Convergence { iterations: iter });
        }
        if delta < TOL {
            return Ok((w, iter + 1));
        }
    }
    Err(EstimatorError::Convergence { iterations: PROX_MAX_ITER })
}

#[inline(always)]
fn soft_threshold(v: f64, t: f64) -> f64 {
    if v > t {
        v - t
    } else if v < -t {
        v + t
    } else {
        0.0
    }
}

/// Two-sided Wald test for coefficient `index` using the observed Fisher
/// information at the fitted coefficients.
fn wald_p_value(x: &DMatrix<f64>, w: &DVector<f64>, index: usize) -> f64 {
    let (rows, cols) = x.shape();
    let eta = x * w;
    let mut info: DMatrix<f64> = DMatrix::zeros(cols, cols);
    for r in 0..rows {
        let mu = sigmoid(eta[r]);
        let s = (mu * (1.0 - mu)).max(1e-10);
        for a in 0..cols {
            for b in a..cols {
                let v = s * x[(r, a)] * x[(r, b)];
                info[(a, b)] += v;
                if a != b {
                    info[(b, a)] += v;
                }
            }
        }
    }
    for a in 0..cols {
        info[(a, a)] += 1e-10;
    }

    match info.try_inverse() {
        Some(cov) => {
            let se = cov[(index, index)].max(0.0).sqrt();
            if se == 0.0 {
                return f64::NAN;
            }
            let z = w[index] / se;
            2.0 * normal_sf(z.abs())
        }
        None => f64::NAN,
    }
}

/// Upper tail of the standard normal, 1 - Phi(x).
fn normal_sf(x: f64) -> f64 {
    0.5 * (1.0 - erf(x / std::f64::consts::SQRT_2))
}

/// Error function approximation (Abramowitz and Stegun 7.1.26).
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}
