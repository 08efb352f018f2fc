//! Held-out test pass: scores the test split once and appends the result line to the log.

use crate::metrics::{evaluate, MetricsResult};
use crate::result_log::ResultLog;
use crate::trainer::{correctness, forward_batch, mean, predicted_classes, scalar};
use crate::{TrainError, TrainResult};
use burn::nn::loss::CrossEntropyLossConfig;
use burn::tensor::activation::softmax;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use models::SequenceClassifier;
use signal_dataset::{PatientData, Split};

/// Outcome of one test pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TestReport {
    pub samples: usize,
    pub loss_avg: f64,
    /// Fraction of arg-max predictions matching the label.
    pub sample_accuracy: f64,
    pub metrics: MetricsResult,
    pub summary: String,
    /// Exact line appended to the result log, timestamp included.
    pub log_line: String,
}

pub fn format_result(
    model_name: &str,
    patient: &str,
    samples: usize,
    loss_avg: f64,
    metrics: &MetricsResult,
) -> String {
    format!(
        "Baselines: {model_name}|Patient {patient}|Data size:{samples}| test loss:{:.6}| Accuracy:{:.5} | Precision:{:.5}| Recall:{:.5}| F1score:{:.5}| AUC:{:.5}",
        loss_avg, metrics.accuracy, metrics.precision, metrics.recall, metrics.f1score, metrics.auc
    )
}

/// Run `model` over every test batch exactly once and log the metrics.
///
/// `model` should already be on a non-autodiff backend (e.g. `model.valid()`), so no
/// gradients are tracked.
pub fn run_test<B, M>(
    model: &M,
    data: &mut PatientData,
    model_name: &str,
    patient: &str,
    log: &ResultLog,
    device: &B::Device,
) -> TrainResult<TestReport>
where
    B: Backend,
    M: SequenceClassifier<B>,
{
    let loss_fn = CrossEntropyLossConfig::new().init::<B>(device);
    let mut losses = Vec::new();
    let mut labels = Vec::new();
    let mut probabilities = Vec::new();
    let mut hits = Vec::new();

    for batch in data.data_loader(Split::Test)? {
        let host_labels = batch.labels.clone();
        let (output, targets) = forward_batch(model, batch.to_device::<B>(device));
        losses.push(scalar(loss_fn.forward(output.clone(), targets))?);
        probabilities.extend(positive_probabilities(output.clone())?);
        hits.extend(correctness(&predicted_classes(output)?, &host_labels));
        labels.extend(host_labels);
    }

    let loss_avg = mean(&losses, "test loss")?;
    let sample_accuracy = mean(&hits, "test accuracy")?;
    let metrics = evaluate(&probabilities, &labels)?;
    let summary = format_result(model_name, patient, labels.len(), loss_avg, &metrics);
    let log_line = log.append(&summary)?;
    Ok(TestReport {
        samples: labels.len(),
        loss_avg,
        sample_accuracy,
        metrics,
        summary,
        log_line,
    })
}

/// `softmax(logits)[:, 1]` as host floats.
fn positive_probabilities<B: Backend>(logits: Tensor<B, 2>) -> TrainResult<Vec<f64>> {
    let [batch, classes] = logits.dims();
    if classes < 2 {
        return Err(TrainError::MetricComputation(format!(
            "need at least two classes for a positive probability, got {classes}"
        )));
    }
    let probs = softmax(logits, 1).slice([0..batch, 1..2]).reshape([batch]);
    let values = probs
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| TrainError::Tensor(format!("{e:?}")))?;
    Ok(values.into_iter().map(f64::from).collect())
}
