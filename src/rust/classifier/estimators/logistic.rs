use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::{softmax, sparse_dot, SparseRow, TrainingSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// Inverse L2 regularisation strength
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the largest gradient component falls below this
    pub tol: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: 2.0,
            max_iter: 500,
            tol: 1e-4,
        }
    }
}

/// Multinomial logistic regression.
///
/// Minimises `sum_i w_i * CE_i + ||W||^2 / (2C)` with Nesterov-accelerated
/// gradient descent. Rows are unit length, so with the intercept column the
/// Lipschitz constant is at most `sum_i w_i + 1 / C`, which fixes the step size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    coef: Array2<f64>,
    intercept: Array1<f64>,
}

impl LogisticRegression {
    pub fn fit(data: &TrainingSet<'_>, config: &LogisticConfig) -> Self {
        let shape = (data.n_classes, data.n_features);
        let weight_sum: f64 = data.sample_weights.iter().sum();
        let step = 1.0 / (weight_sum + 1.0 / config.c);

        let mut coef = Array2::<f64>::zeros(shape);
        let mut intercept = Array1::<f64>::zeros(data.n_classes);
        let mut look_coef = coef.clone();
        let mut look_intercept = intercept.clone();
        let mut momentum = 1.0_f64;

        let mut iterations = 0;
        for _ in 0..config.max_iter {
            iterations += 1;
            let (grad_coef, grad_intercept) = gradient(data, &look_coef, &look_intercept, config.c);

            let next_coef = &look_coef - &(&grad_coef * step);
            let next_intercept = &look_intercept - &(&grad_intercept * step);

            let next_momentum = (1.0 + (1.0 + 4.0 * momentum * momentum).sqrt()) / 2.0;
            let blend = (momentum - 1.0) / next_momentum;
            look_coef = &next_coef + &((&next_coef - &coef) * blend);
            look_intercept = &next_intercept + &((&next_intercept - &intercept) * blend);

            coef = next_coef;
            intercept = next_intercept;
            momentum = next_momentum;

            let max_grad = grad_coef
                .iter()
                .chain(grad_intercept.iter())
                .fold(0.0_f64, |acc, g| acc.max(g.abs()));
            if max_grad < config.tol {
                break;
            }
        }
        log::debug!("Logistic regression stopped after {} iterations", iterations);

        Self { coef, intercept }
    }

    pub fn n_classes(&self) -> usize {
        self.intercept.len()
    }

    pub fn n_features(&self) -> usize {
        self.coef.ncols()
    }

    pub fn predict_proba(&self, row: &SparseRow) -> Vec<f64> {
        let mut scores = self.scores(row);
        softmax(&mut scores);
        scores
    }

    fn scores(&self, row: &SparseRow) -> Vec<f64> {
        (0..self.n_classes())
            .map(|c| sparse_dot(self.coef.row(c), row) + self.intercept[c])
            .collect()
    }
}

fn gradient(
    data: &TrainingSet<'_>,
    coef: &Array2<f64>,
    intercept: &Array1<f64>,
    c: f64,
) -> (Array2<f64>, Array1<f64>) {
    let mut grad_coef = coef / c;
    let mut grad_intercept = Array1::<f64>::zeros(intercept.len());

    for ((row, &target), &weight) in data.rows.iter().zip(data.targets).zip(&data.sample_weights) {
        let mut proba: Vec<f64> = (0..intercept.len())
            .map(|k| sparse_dot(coef.row(k), row) + intercept[k])
            .collect();
        softmax(&mut proba);
        proba[target] -= 1.0;

        for (k, residual) in proba.into_iter().enumerate() {
            let scaled = weight * residual;
            grad_intercept[k] += scaled;
            for &(j, v) in row {
                grad_coef[[k, j]] += scaled * v;
            }
        }
    }

    (grad_coef, grad_intercept)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::separable;
    use super::*;

    #[test]
    fn test_separates_classes() {
        let (rows, targets) = separable();
        let data = TrainingSet::new(&rows, &targets, 4, 2).unwrap();
        let model = LogisticRegression::fit(&data, &LogisticConfig::default());

        let p = model.predict_proba(&vec![(1, 1.0)]);
        assert!(p[0] > 0.5);
        let p = model.predict_proba(&vec![(2, 1.0)]);
        assert!(p[1] > 0.5);
    }

    #[test]
    fn test_stronger_regularization_flattens_probabilities() {
        let (rows, targets) = separable();
        let data = TrainingSet::new(&rows, &targets, 4, 2).unwrap();
        let loose = LogisticRegression::fit(&data, &LogisticConfig::default());
        let tight = LogisticRegression::fit(
            &data,
            &LogisticConfig {
                c: 0.01,
                ..LogisticConfig::default()
            },
        );

        let row = vec![(0, 1.0)];
        assert!(loose.predict_proba(&row)[0] > tight.predict_proba(&row)[0]);
    }
}
