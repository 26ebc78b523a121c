use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::{softmax, sparse_dot, SparseRow, TrainingSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayesConfig {
    /// Additive smoothing
    pub alpha: f64,
}

impl Default for NaiveBayesConfig {
    fn default() -> Self {
        Self { alpha: 0.5 }
    }
}

/// Complement Naive Bayes.
///
/// Each class is scored against the feature mass of every *other* class,
/// which holds up better than multinomial NB on skewed label distributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplementNaiveBayes {
    feature_log_prob: Array2<f64>,
}

impl ComplementNaiveBayes {
    pub fn fit(data: &TrainingSet<'_>, config: &NaiveBayesConfig) -> Self {
        let mut feature_count = Array2::<f64>::zeros((data.n_classes, data.n_features));
        for ((row, &target), &weight) in data.rows.iter().zip(data.targets).zip(&data.sample_weights) {
            for &(j, v) in row {
                feature_count[[target, j]] += v * weight;
            }
        }

        let feature_all: Array1<f64> = feature_count.sum_axis(Axis(0));
        let mut complement = Array2::<f64>::zeros((data.n_classes, data.n_features));
        for c in 0..data.n_classes {
            let mut row = complement.row_mut(c);
            row.assign(&(&feature_all - &feature_count.row(c) + config.alpha));
            let total = row.sum();
            row.mapv_inplace(|count| -(count / total).ln());
        }

        Self {
            feature_log_prob: complement,
        }
    }

    pub fn n_classes(&self) -> usize {
        self.feature_log_prob.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.feature_log_prob.ncols()
    }

    pub fn predict_proba(&self, row: &SparseRow) -> Vec<f64> {
        let mut jll: Vec<f64> = (0..self.n_classes())
            .map(|c| sparse_dot(self.feature_log_prob.row(c), row))
            .collect();
        softmax(&mut jll);
        jll
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::separable;
    use super::*;

    #[test]
    fn test_separates_classes() {
        let (rows, targets) = separable();
        let data = TrainingSet::new(&rows, &targets, 4, 2).unwrap();
        let model = ComplementNaiveBayes::fit(&data, &NaiveBayesConfig::default());

        let p = model.predict_proba(&vec![(0, 0.6), (1, 0.8)]);
        assert!(p[0] > p[1]);
        let p = model.predict_proba(&vec![(2, 1.0)]);
        assert!(p[1] > p[0]);
    }

    #[test]
    fn test_empty_row_is_uniform() {
        let (rows, targets) = separable();
        let data = TrainingSet::new(&rows, &targets, 4, 2).unwrap();
        let model = ComplementNaiveBayes::fit(&data, &NaiveBayesConfig::default());
        assert_eq!(model.predict_proba(&Vec::new()), vec![0.5, 0.5]);
    }
}
