//! Epoch/batch training loop with periodic inline validation and best-model checkpointing.

use crate::checkpoint::CheckpointStore;
use crate::config::RunConfig;
use crate::{TrainError, TrainResult};
use burn::module::AutodiffModule;
use burn::nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{Int, Tensor};
use indicatif::{ProgressBar, ProgressStyle};
use models::{SequenceClassifier, SideChannel};
use signal_dataset::{PatientData, SampleBatch, SignalBatch, Split};

/// Best validation accuracy seen so far in a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestAccuracy {
    best: f64,
    reset_on_perfect: bool,
}

impl BestAccuracy {
    pub fn new(reset_on_perfect: bool) -> Self {
        Self {
            best: 0.0,
            reset_on_perfect,
        }
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    /// Record a validation accuracy; returns true when it should be checkpointed.
    ///
    /// Ties with the best count as improvements. With `reset_on_perfect`, a best of exactly
    /// 1.0 drops back to 0 before the comparison, so the next validation always saves.
    pub fn observe(&mut self, accuracy: f64) -> bool {
        if self.reset_on_perfect && self.best == 1.0 {
            self.best = 0.0;
        }
        if accuracy >= self.best {
            self.best = accuracy;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRecord {
    pub epoch: usize,
    pub step: usize,
    pub train_loss: f64,
    pub val_loss: f64,
    pub train_accuracy: f64,
    pub val_accuracy: f64,
    pub saved: bool,
}

impl ValidationRecord {
    pub fn progress_line(&self) -> String {
        format!(
            "Epoch:{} | Step:{} | train loss:{:.6} | val loss:{:.6} | train accuracy:{:.5} | val accuracy:{:.5}",
            self.epoch,
            self.step,
            self.train_loss,
            self.val_loss,
            self.train_accuracy,
            self.val_accuracy
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainSummary {
    pub steps: usize,
    pub validations: Vec<ValidationRecord>,
}

impl TrainSummary {
    pub fn checkpoints_saved(&self) -> usize {
        self.validations.iter().filter(|v| v.saved).count()
    }
}

/// Train `model` for `cfg.epoch` passes over the train split.
///
/// Every `cfg.validate_every`-th batch of an epoch (starting with the first) runs one
/// validation batch without gradients, logs the running averages, and checkpoints the model
/// when validation accuracy matches or beats the best so far.
pub fn train_loop<B, M>(
    mut model: M,
    data: &mut PatientData,
    cfg: &RunConfig,
    store: &CheckpointStore,
    device: &B::Device,
) -> TrainResult<(M, TrainSummary)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + SequenceClassifier<B>,
    M::InnerModule: SequenceClassifier<B::InnerBackend>,
{
    let mut optim = AdamConfig::new().init::<B, M>();
    let loss_fn = CrossEntropyLossConfig::new().init::<B>(device);
    let val_loss_fn = CrossEntropyLossConfig::new().init::<B::InnerBackend>(device);
    let mut val_batches = data.next_batch_val_data()?;
    let mut best = BestAccuracy::new(cfg.reset_best_on_perfect);

    let mut acc_train: Vec<f64> = Vec::new();
    let mut loss_train: Vec<f64> = Vec::new();
    let mut summary = TrainSummary::default();

    let batches_per_epoch = data.data_loader(Split::Train)?.len();
    let progress = progress_bar(cfg.progress, (cfg.epoch * batches_per_epoch) as u64);

    for epoch in 0..cfg.epoch {
        for (step, batch) in data.data_loader(Split::Train)?.enumerate() {
            let labels = batch.labels.clone();
            let (output, targets) = forward_batch(&model, batch.to_device::<B>(device));
            let loss = loss_fn.forward(output.clone(), targets);
            let loss_value = scalar(loss.clone().detach())?;
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.lr, model, grads);

            acc_train.extend(correctness(&predicted_classes(output)?, &labels));
            loss_train.push(loss_value);
            summary.steps += 1;

            if step % cfg.validate_every == 0 {
                let (val_loss, val_accuracy) =
                    validate(&model.valid(), &val_loss_fn, &val_batches.next_batch(), device)?;
                let mut record = ValidationRecord {
                    epoch,
                    step,
                    train_loss: mean(&loss_train, "train loss")?,
                    val_loss,
                    train_accuracy: mean(&acc_train, "train accuracy")?,
                    val_accuracy,
                    saved: false,
                };
                progress.suspend(|| tracing::info!("{}", record.progress_line()));
                acc_train.clear();
                loss_train.clear();

                if best.observe(val_accuracy) {
                    store.save::<B, M>(&model, &cfg.model, &cfg.patient)?;
                    tracing::info!("Saving model...");
                    record.saved = true;
                }
                summary.validations.push(record);
            }
            progress.inc(1);
        }
    }
    progress.finish_and_clear();
    Ok((model, summary))
}

/// Loss and accuracy of one validation batch; runs on the inner backend, so no graph is built.
fn validate<B, M>(
    model: &M,
    loss_fn: &CrossEntropyLoss<B>,
    batch: &SampleBatch,
    device: &B::Device,
) -> TrainResult<(f64, f64)>
where
    B: Backend,
    M: SequenceClassifier<B>,
{
    let (output, targets) = forward_batch(model, batch.to_device::<B>(device));
    let loss = scalar(loss_fn.forward(output.clone(), targets))?;
    let hits = correctness(&predicted_classes(output)?, &batch.labels);
    Ok((loss, mean(&hits, "validation accuracy")?))
}

/// Logits and labels for a device batch.
///
/// Training, validation and test all go through here with the side channel attached, so a
/// padded sample is read at its own last step whatever else shares its batch.
pub fn forward_batch<B, M>(model: &M, batch: SignalBatch<B>) -> (Tensor<B, 2>, Tensor<B, 1, Int>)
where
    B: Backend,
    M: SequenceClassifier<B>,
{
    let side = SideChannel {
        labels: batch.labels.clone(),
        domains: batch.domains,
        lengths: batch.lengths,
    };
    (model.forward(batch.signals, Some(side)), batch.labels)
}

fn progress_bar(enabled: bool, total: u64) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    let template = "{bar:40} {pos}/{len} [{elapsed_precise}<{eta}]";
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(style);
    }
    bar
}

/// Average of `values`; empty input is a metric error rather than a NaN.
pub fn mean(values: &[f64], what: &str) -> TrainResult<f64> {
    if values.is_empty() {
        return Err(TrainError::MetricComputation(format!(
            "no values to average for {what}"
        )));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// 1.0 where the prediction matches the label, else 0.0.
pub fn correctness(predictions: &[i64], labels: &[i64]) -> Vec<f64> {
    predictions
        .iter()
        .zip(labels)
        .map(|(p, l)| if p == l { 1.0 } else { 0.0 })
        .collect()
}

/// Arg-max class per row of `logits` [batch, classes].
pub fn predicted_classes<B: Backend>(logits: Tensor<B, 2>) -> TrainResult<Vec<i64>> {
    let batch = logits.dims()[0];
    logits
        .argmax(1)
        .reshape([batch])
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| TrainError::Tensor(format!("{e:?}")))
}

/// First element of a loss tensor.
pub fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> TrainResult<f64> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| TrainError::Tensor(format!("{e:?}")))?
        .first()
        .map(|v| f64::from(*v))
        .ok_or_else(|| TrainError::Tensor("empty loss tensor".into()))
}
