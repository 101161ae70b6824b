//! L2-regularized logistic regression, solved with damped Newton steps.
//!
//! Minimizes `½‖w‖² + C·Σ logloss(yᵢ, σ(w·xᵢ + b))`. The intercept is not
//! penalized. The objective is strictly convex in `w` and convex in `b`, so the
//! Newton iterate converges to the unique optimum any other solver would reach.

use ndarray::{Array1, Array2, ArrayView2, Axis, s};
use tracing::{debug, warn};

use super::math::{sigmoid, softplus};
use crate::{Classification, error::FitError};

/// Sufficient decrease constant for the backtracking line search.
const ARMIJO: f64 = 1e-4;
/// Line search gives up below this step length.
const MIN_STEP: f64 = 1e-10;
/// Diagonal jitter tried once when the Hessian is numerically singular.
const JITTER: f64 = 1e-8;

/// Solver settings. Defaults match a plain `LogisticRegression(max_iter=200)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitParams {
    /// Inverse regularization strength.
    c: f64,
    max_iter: usize,
    /// Convergence tolerance on the max-norm of the gradient, per example.
    tol: f64,
}

impl FitParams {
    #[must_use]
    pub fn new(c: f64, max_iter: usize, tol: f64) -> Self {
        Self { c, max_iter, tol }
    }

    #[must_use]
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    #[must_use]
    pub fn c(&self) -> f64 {
        self.c
    }

    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    #[must_use]
    pub fn tol(&self) -> f64 {
        self.tol
    }
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 200,
            tol: 1e-8,
        }
    }
}

fn validate_inputs(
    x: &ArrayView2<'_, f64>,
    y: &[Classification],
    params: &FitParams,
    expected_columns: usize,
) -> Result<(), FitError> {
    if !(params.c > 0.0 && params.c.is_finite()) {
        return Err(FitError::InvalidRegularization(params.c));
    }
    if x.nrows() == 0 || y.is_empty() {
        return Err(FitError::EmptyDataset);
    }
    if x.nrows() != y.len() {
        return Err(FitError::LabelCountMismatch {
            rows: x.nrows(),
            labels: y.len(),
        });
    }
    if x.ncols() != expected_columns {
        return Err(FitError::DimensionMismatch {
            expected: expected_columns,
            got: x.ncols(),
        });
    }
    if let Some(((row, column), _)) = x.indexed_iter().find(|(_, value)| !value.is_finite()) {
        return Err(FitError::NonFiniteFeature { row, column });
    }
    match (
        y.iter().any(Classification::is_ai),
        y.iter().any(Classification::is_human),
    ) {
        (true, true) => Ok(()),
        (true, false) => Err(FitError::InsufficientClassDiversity(Classification::AI)),
        _ => Err(FitError::InsufficientClassDiversity(Classification::Human)),
    }
}

/// Features plus a trailing column of ones for the intercept.
fn with_intercept(x: &ArrayView2<'_, f64>) -> Array2<f64> {
    let (rows, columns) = x.dim();
    let mut design = Array2::zeros((rows, columns + 1));
    design.slice_mut(s![.., ..columns]).assign(x);
    design.column_mut(columns).fill(1.0);
    design
}

/// Penalty applies to every coefficient except the trailing intercept.
fn penalty_mask(theta: &Array1<f64>) -> Array1<f64> {
    let mut masked = theta.clone();
    if let Some(intercept) = masked.last_mut() {
        *intercept = 0.0;
    }
    masked
}

fn objective(design: &Array2<f64>, targets: &Array1<f64>, theta: &Array1<f64>, c: f64) -> f64 {
    let logits = design.dot(theta);
    let data_loss: f64 = logits
        .iter()
        .zip(targets)
        .map(|(&z, &y)| softplus(z) - y * z)
        .sum();
    let penalty = penalty_mask(theta);
    0.5 * penalty.dot(&penalty) + c * data_loss
}

fn gradient(
    design: &Array2<f64>,
    targets: &Array1<f64>,
    probabilities: &Array1<f64>,
    theta: &Array1<f64>,
    c: f64,
) -> Array1<f64> {
    let residuals = probabilities - targets;
    design.t().dot(&residuals) * c + penalty_mask(theta)
}

fn hessian(design: &Array2<f64>, probabilities: &Array1<f64>, c: f64) -> Array2<f64> {
    let curvature = probabilities.mapv(|p| p * (1.0 - p));
    let weighted = design * &curvature.view().insert_axis(Axis(1));
    let mut hessian = design.t().dot(&weighted) * c;
    let penalized = hessian.nrows() - 1;
    for j in 0..penalized {
        hessian[[j, j]] += 1.0;
    }
    hessian
}

/// Solve `a·x = b` for symmetric positive definite `a` via Cholesky.
fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum = a[[i, j]] - (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum::<f64>();
            if i == j {
                if !(sum > 0.0 && sum.is_finite()) {
                    return None;
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    let mut forward = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum = (0..i).map(|k| l[[i, k]] * forward[k]).sum::<f64>();
        forward[i] = (b[i] - sum) / l[[i, i]];
    }
    let mut solution = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum = (i + 1..n).map(|k| l[[k, i]] * solution[k]).sum::<f64>();
        solution[i] = (forward[i] - sum) / l[[i, i]];
    }
    Some(solution)
}

fn newton_step(hessian: &Array2<f64>, gradient: &Array1<f64>) -> Option<Array1<f64>> {
    solve_spd(hessian, gradient).or_else(|| {
        debug!("Hessian not positive definite, retrying with jitter");
        let scale = hessian.diag().iter().fold(1.0f64, |m, &d| m.max(d.abs()));
        let mut jittered = hessian.clone();
        jittered.diag_mut().mapv_inplace(|d| d + JITTER * scale);
        solve_spd(&jittered, gradient)
    })
}

fn max_abs(values: &Array1<f64>) -> f64 {
    values.iter().fold(0.0, |m, v| m.max(v.abs()))
}

/// Fit weights and bias. Returns `(weights, bias)`.
pub(super) fn fit(
    x: ArrayView2<'_, f64>,
    y: &[Classification],
    params: &FitParams,
    expected_columns: usize,
) -> Result<(Vec<f64>, f64), FitError> {
    validate_inputs(&x, y, params, expected_columns)?;
    debug!(
        num_examples = x.nrows(),
        num_features = x.ncols(),
        c = params.c,
        "Fitting logistic regression"
    );

    let design = with_intercept(&x);
    let targets = y.iter().map(Classification::target).collect::<Array1<f64>>();
    let tolerance = params.tol * x.nrows() as f64;

    let mut theta = Array1::<f64>::zeros(design.ncols());
    let mut current = objective(&design, &targets, &theta, params.c);

    for iteration in 0..params.max_iter {
        let probabilities = design.dot(&theta).mapv(sigmoid);
        let grad = gradient(&design, &targets, &probabilities, &theta, params.c);
        let grad_norm = max_abs(&grad);
        if grad_norm <= tolerance {
            debug!(iteration, grad_norm, objective = current, "Logistic regression converged");
            return Ok(split_parameters(theta));
        }

        let step = newton_step(&hessian(&design, &probabilities, params.c), &grad)
            .ok_or(FitError::SingularSystem { iteration })?;
        let slope = grad.dot(&step);

        let mut step_length = 1.0;
        loop {
            let candidate = &theta - &(&step * step_length);
            let candidate_objective = objective(&design, &targets, &candidate, params.c);
            if candidate_objective <= current - ARMIJO * step_length * slope {
                theta = candidate;
                current = candidate_objective;
                break;
            }
            step_length *= 0.5;
            if step_length < MIN_STEP {
                debug!(
                    iteration,
                    grad_norm, "Line search stalled, objective at machine precision"
                );
                return Ok(split_parameters(theta));
            }
        }
    }

    warn!(
        max_iter = params.max_iter,
        objective = current,
        "Logistic regression did not converge, returning last iterate"
    );
    Ok(split_parameters(theta))
}

fn split_parameters(theta: Array1<f64>) -> (Vec<f64>, f64) {
    let mut parameters = theta.to_vec();
    let bias = parameters.pop().unwrap_or(0.0);
    (parameters, bias)
}
