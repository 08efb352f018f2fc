//! Binary classification metrics for the test pass.

use crate::{TrainError, TrainResult};

/// Probabilities strictly above this are predicted positive.
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsResult {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1score: f64,
    pub auc: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(predictions: &[i64], labels: &[i64]) -> Self {
        let mut m = Self::default();
        for (&pred, &label) in predictions.iter().zip(labels) {
            match (pred == 1, label == 1) {
                (true, true) => m.tp += 1,
                (false, false) => m.tn += 1,
                (true, false) => m.fp += 1,
                (false, true) => m.fn_ += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1score(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

/// Area under the ROC curve from raw scores, with tied scores sharing their average rank.
/// Returns 0.5 when only one class is present.
pub fn roc_auc(scores: &[f64], labels: &[i64]) -> f64 {
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; ties get the mean of ranks i+1..=j+1.
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            if labels[k] == 1 {
                positive_rank_sum += rank;
            }
        }
        i = j + 1;
    }

    let (p, n) = (positives as f64, negatives as f64);
    (positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n)
}

pub fn threshold(probabilities: &[f64]) -> Vec<i64> {
    probabilities
        .iter()
        .map(|&p| i64::from(p > DECISION_THRESHOLD))
        .collect()
}

/// Threshold `probabilities` at 0.5 and score them against binary `labels`.
pub fn evaluate(probabilities: &[f64], labels: &[i64]) -> TrainResult<MetricsResult> {
    if probabilities.is_empty() {
        return Err(TrainError::MetricComputation(
            "cannot evaluate an empty prediction set".into(),
        ));
    }
    if probabilities.len() != labels.len() {
        return Err(TrainError::MetricComputation(format!(
            "{} probabilities but {} labels",
            probabilities.len(),
            labels.len()
        )));
    }
    let predictions = threshold(probabilities);
    let cm = ConfusionMatrix::from_predictions(&predictions, labels);
    Ok(MetricsResult {
        accuracy: cm.accuracy(),
        precision: cm.precision(),
        recall: cm.recall(),
        f1score: cm.f1score(),
        auc: roc_auc(probabilities, labels),
    })
}
