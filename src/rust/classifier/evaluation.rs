//! Stratified hold-out evaluation run alongside training.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::ensemble::{PipelineConfig, TextPipeline};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Share of each category held out; `0.0` disables evaluation
    pub fraction: f64,
    pub seed: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fraction: 0.2,
            seed: 42,
        }
    }
}

/// Scores of a pipeline fitted on the training split, measured on the held-out split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub accuracy: f64,
    /// Per-class F1 averaged with weights proportional to class support
    pub weighted_f1: f64,
    pub train_documents: usize,
    pub validation_documents: usize,
}

/// Splits document indices into `(train, validation)`, class by class.
///
/// Each class holds out `round(count * fraction)` shuffled members but always
/// keeps at least one in training. Both index lists come back sorted.
pub fn stratified_split(
    targets: &[usize],
    n_classes: usize,
    fraction: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &target) in targets.iter().enumerate() {
        if let Some(members) = by_class.get_mut(target) {
            members.push(i);
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(targets.len());
    let mut validation = Vec::new();
    for mut members in by_class {
        members.shuffle(&mut rng);
        let held = ((members.len() as f64 * fraction).round() as usize)
            .min(members.len().saturating_sub(1));
        validation.extend_from_slice(&members[..held]);
        train.extend_from_slice(&members[held..]);
    }

    train.sort_unstable();
    validation.sort_unstable();
    (train, validation)
}

pub fn accuracy(truth: &[usize], predicted: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

/// F1 per class, weighted by how often each class occurs in `truth`.
pub fn weighted_f1(truth: &[usize], predicted: &[usize], n_classes: usize) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }

    let mut true_pos = vec![0usize; n_classes];
    let mut false_pos = vec![0usize; n_classes];
    let mut support = vec![0usize; n_classes];
    for (&t, &p) in truth.iter().zip(predicted) {
        support[t] += 1;
        if t == p {
            true_pos[t] += 1;
        } else if p < n_classes {
            false_pos[p] += 1;
        }
    }

    let total = truth.len() as f64;
    (0..n_classes)
        .filter(|&c| support[c] > 0)
        .map(|c| {
            let tp = true_pos[c] as f64;
            let predicted_pos = tp + false_pos[c] as f64;
            let precision = if predicted_pos > 0.0 { tp / predicted_pos } else { 0.0 };
            let recall = tp / support[c] as f64;
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            f1 * support[c] as f64 / total
        })
        .sum()
}

/// Index of the largest non-NaN value; the first one wins ties.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |b| *v > values[b]) {
            best = Some(i);
        }
    }
    best
}

/// Fits a throwaway pipeline on the training split and scores the held-out split.
///
/// Returns `None` when nothing can be held out or the reduced training set
/// cannot be fitted.
pub fn holdout_evaluation(
    documents: &[String],
    targets: &[usize],
    n_classes: usize,
    config: &PipelineConfig,
) -> Option<Evaluation> {
    let (train, validation) = stratified_split(
        targets,
        n_classes,
        config.validation.fraction,
        config.validation.seed,
    );
    if validation.is_empty() {
        log::info!("Skipping hold-out evaluation: no documents to hold out");
        return None;
    }

    let (train_docs, train_targets): (Vec<String>, Vec<usize>) = train
        .iter()
        .map(|&i| (documents[i].clone(), targets[i]))
        .unzip();
    let pipeline = match TextPipeline::fit(&train_docs, &train_targets, n_classes, config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            log::warn!("Skipping hold-out evaluation: {}", e);
            return None;
        }
    };

    let truth: Vec<usize> = validation.iter().map(|&i| targets[i]).collect();
    let predicted: Vec<usize> = validation
        .iter()
        .map(|&i| argmax(&pipeline.predict_proba(&documents[i])).unwrap_or(0))
        .collect();

    let evaluation = Evaluation {
        accuracy: accuracy(&truth, &predicted),
        weighted_f1: weighted_f1(&truth, &predicted, n_classes),
        train_documents: train.len(),
        validation_documents: validation.len(),
    };
    log::info!(
        "Hold-out accuracy {:.3}, weighted F1 {:.3} ({} train / {} validation)",
        evaluation.accuracy,
        evaluation.weighted_f1,
        evaluation.train_documents,
        evaluation.validation_documents
    );
    Some(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_is_stratified_and_seeded() {
        // 5 of class 0, 10 of class 1, 1 of class 2
        let targets: Vec<usize> = [vec![0; 5], vec![1; 10], vec![2]].concat();
        let (train, validation) = stratified_split(&targets, 3, 0.2, 42);

        assert_eq!(train.len() + validation.len(), targets.len());
        let held = |class| validation.iter().filter(|&&i| targets[i] == class).count();
        assert_eq!((held(0), held(1), held(2)), (1, 2, 0));
        assert!(train.iter().all(|i| !validation.contains(i)));

        assert_eq!(stratified_split(&targets, 3, 0.2, 42), (train, validation));
    }

    #[test]
    fn test_split_keeps_one_per_class_in_training() {
        let targets = vec![0, 0, 1, 1];
        let (train, validation) = stratified_split(&targets, 2, 0.9, 7);
        assert_eq!(train.len(), 2);
        assert_eq!(validation.len(), 2);

        let (train, validation) = stratified_split(&targets, 2, 0.0, 7);
        assert_eq!(train, vec![0, 1, 2, 3]);
        assert!(validation.is_empty());
    }

    #[test]
    fn test_metrics() {
        let truth = [0, 0, 0, 1];
        let predicted = [0, 0, 1, 1];
        assert!((accuracy(&truth, &predicted) - 0.75).abs() < 1e-12);

        // class 0: p=1, r=2/3, f1=0.8 (support 3); class 1: p=1/2, r=1, f1=2/3 (support 1)
        let expected = 0.8 * 0.75 + (2.0 / 3.0) * 0.25;
        assert!((weighted_f1(&truth, &predicted, 2) - expected).abs() < 1e-12);

        assert_eq!(weighted_f1(&[1, 1], &[1, 1], 3), 1.0);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_argmax_skips_nan_and_prefers_first() {
        assert_eq!(argmax(&[0.2, f64::NAN, 0.5, 0.5]), Some(2));
        assert_eq!(argmax(&[f64::NAN]), None);
        assert_eq!(argmax(&[]), None);
    }
}
