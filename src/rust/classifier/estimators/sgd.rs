use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{sigmoid, sparse_dot, SparseRow, TrainingSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SgdConfig {
    /// L2 regularisation strength
    pub alpha: f64,
    pub max_epochs: usize,
    /// Minimum per-sample improvement of the epoch loss
    pub tol: f64,
    /// Epochs without improvement before stopping
    pub n_iter_no_change: usize,
    pub seed: u64,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            alpha: 1e-4,
            max_epochs: 3000,
            tol: 1e-3,
            n_iter_no_change: 5,
            seed: 42,
        }
    }
}

/// Linear one-vs-rest classifier fitted by SGD under log-loss.
///
/// Uses the `1 / (alpha * (t0 + t))` step schedule with `t0 = 1 / alpha`.
/// Probabilities are the per-class sigmoids rescaled to sum to one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgdClassifier {
    coef: Array2<f64>,
    intercept: Array1<f64>,
}

impl SgdClassifier {
    pub fn fit(data: &TrainingSet<'_>, config: &SgdConfig) -> Self {
        let mut coef = Array2::zeros((data.n_classes, data.n_features));
        let mut intercept = Array1::zeros(data.n_classes);

        for class in 0..data.n_classes {
            let (weights, bias, epochs) = fit_binary(data, class, config);
            coef.row_mut(class).assign(&weights);
            intercept[class] = bias;
            log::debug!("SGD class {} converged after {} epochs", class, epochs);
        }

        Self { coef, intercept }
    }

    pub fn n_classes(&self) -> usize {
        self.intercept.len()
    }

    pub fn n_features(&self) -> usize {
        self.coef.ncols()
    }

    pub fn decision_function(&self, row: &SparseRow) -> Vec<f64> {
        (0..self.n_classes())
            .map(|c| sparse_dot(self.coef.row(c), row) + self.intercept[c])
            .collect()
    }

    pub fn predict_proba(&self, row: &SparseRow) -> Vec<f64> {
        let mut proba: Vec<f64> = self.decision_function(row).into_iter().map(sigmoid).collect();
        let sum: f64 = proba.iter().sum();
        if sum > 0.0 {
            proba.iter_mut().for_each(|p| *p /= sum);
        } else {
            let uniform = 1.0 / proba.len() as f64;
            proba.iter_mut().for_each(|p| *p = uniform);
        }
        proba
    }
}

/// Fits `class` against the rest; returns weights, bias and epochs run.
fn fit_binary(data: &TrainingSet<'_>, class: usize, config: &SgdConfig) -> (Array1<f64>, f64, usize) {
    let n = data.len();
    let mut weights = Array1::<f64>::zeros(data.n_features);
    // Weights are stored as `scale * weights` so the L2 shrink is O(1) per step.
    let mut scale = 1.0;
    let mut bias = 0.0;

    let t0 = 1.0 / config.alpha;
    let mut t = 0.0;
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(class as u64));

    let mut best_loss = f64::INFINITY;
    let mut no_improvement = 0;
    let mut epochs = 0;

    for _ in 0..config.max_epochs {
        epochs += 1;
        order.shuffle(&mut rng);
        let mut epoch_loss = 0.0;

        for &i in &order {
            let row = &data.rows[i];
            let y = if data.targets[i] == class { 1.0 } else { -1.0 };
            let sample_weight = data.sample_weights[i];

            let p = scale * sparse_dot(weights.view(), row) + bias;
            let z = p * y;
            epoch_loss += log_loss(z);

            let eta = 1.0 / (config.alpha * (t0 + t));
            let update = -eta * dlog_loss(z, y) * sample_weight;

            scale *= 1.0 - eta * config.alpha;
            if update != 0.0 {
                for &(j, v) in row {
                    weights[j] += update * v / scale;
                }
                bias += update;
            }
            if scale < 1e-9 {
                weights *= scale;
                scale = 1.0;
            }
            t += 1.0;
        }

        if epoch_loss > best_loss - config.tol * n as f64 {
            no_improvement += 1;
        } else {
            no_improvement = 0;
        }
        best_loss = best_loss.min(epoch_loss);
        if no_improvement >= config.n_iter_no_change {
            break;
        }
    }

    weights *= scale;
    (weights, bias, epochs)
}

fn log_loss(z: f64) -> f64 {
    if z > 18.0 {
        (-z).exp()
    } else if z < -18.0 {
        -z
    } else {
        (-z).exp().ln_1p()
    }
}

/// Derivative of the log-loss with respect to the raw prediction.
fn dlog_loss(z: f64, y: f64) -> f64 {
    if z > 18.0 {
        -y * (-z).exp()
    } else if z < -18.0 {
        -y
    } else {
        -y / (1.0 + z.exp())
    }
}
