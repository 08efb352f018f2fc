//! Core types, error definitions, and batch containers for signal_dataset.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json parse error at {path}:{line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}:{line}: expected {expected} features per step, found {actual}")]
    DimensionMismatch {
        path: PathBuf,
        line: usize,
        expected: usize,
        actual: usize,
    },
    #[error("{path}:{line}: signal has no time steps")]
    EmptySequence { path: PathBuf, line: usize },
    #[error("{path}:{line}: label {label} is not a binary class (0 or 1)")]
    InvalidLabel { path: PathBuf, line: usize, label: i64 },
    #[error("no path configured for the {0} split")]
    MissingSplit(Split),
    #[error("the {0} split contains no samples")]
    EmptySplit(Split),
    #[error("batch size must be at least 1")]
    InvalidBatchSize,
    #[error("few-shot ratio {0} must be in (0, 1]")]
    InvalidRatio(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "validation",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One patient recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSample {
    pub id: String,
    pub label: i64,
    #[serde(default)]
    pub domain: i64,
    /// Time-major signal: `signal[t][f]`.
    pub signal: Vec<Vec<f32>>,
}

impl SignalSample {
    pub fn steps(&self) -> usize {
        self.signal.len()
    }
}

/// A batch assembled on the host, zero-padded to the longest sequence it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBatch {
    /// Flattened [len, steps, dim] signal buffer.
    pub signals: Vec<f32>,
    pub labels: Vec<i64>,
    pub domains: Vec<i64>,
    pub lengths: Vec<i64>,
    pub ids: Vec<String>,
    pub steps: usize,
    pub dim: usize,
}

impl SampleBatch {
    /// Stack `samples` into one zero-padded batch of `dim` features per step.
    ///
    /// # Panics
    ///
    /// Every step must hold exactly `dim` features, which [`crate::load_split`] guarantees for
    /// loaded samples. A step of any other width panics.
    pub fn from_samples<'a, I>(samples: I, dim: usize) -> Self
    where
        I: IntoIterator<Item = &'a SignalSample>,
    {
        let samples: Vec<&SignalSample> = samples.into_iter().collect();
        let steps = samples.iter().map(|s| s.steps()).max().unwrap_or(0);
        let mut signals = vec![0.0f32; samples.len() * steps * dim];
        let mut labels = Vec::with_capacity(samples.len());
        let mut domains = Vec::with_capacity(samples.len());
        let mut lengths = Vec::with_capacity(samples.len());
        let mut ids = Vec::with_capacity(samples.len());
        for (b, sample) in samples.iter().enumerate() {
            for (t, step) in sample.signal.iter().enumerate() {
                assert_eq!(
                    step.len(),
                    dim,
                    "sample {} step {t}: expected {dim} features, found {}",
                    sample.id,
                    step.len()
                );
                let base = (b * steps + t) * dim;
                signals[base..base + dim].copy_from_slice(step);
            }
            labels.push(sample.label);
            domains.push(sample.domain);
            lengths.push(sample.steps() as i64);
            ids.push(sample.id.clone());
        }
        Self {
            signals,
            labels,
            domains,
            lengths,
            ids,
            steps,
            dim,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Copy the batch into tensors on `device`.
    pub fn to_device<B: Backend>(&self, device: &B::Device) -> SignalBatch<B> {
        let n = self.len();
        let signals = Tensor::<B, 3>::from_data(
            TensorData::new(self.signals.clone(), [n, self.steps, self.dim]),
            device,
        );
        SignalBatch {
            signals,
            labels: int_tensor(&self.labels, device),
            domains: int_tensor(&self.domains, device),
            lengths: int_tensor(&self.lengths, device),
            ids: self.ids.clone(),
        }
    }
}

fn int_tensor<B: Backend>(values: &[i64], device: &B::Device) -> Tensor<B, 1, Int> {
    Tensor::<B, 1, Int>::from_data(TensorData::new(values.to_vec(), [values.len()]), device)
}

/// A batch resident on a Burn device.
#[derive(Debug, Clone)]
pub struct SignalBatch<B: Backend> {
    /// Shape [batch, steps, dim].
    pub signals: Tensor<B, 3>,
    pub labels: Tensor<B, 1, Int>,
    pub domains: Tensor<B, 1, Int>,
    pub lengths: Tensor<B, 1, Int>,
    pub ids: Vec<String>,
}
