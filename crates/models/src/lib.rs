//! Burn sequence classifiers for the patient-signal baselines.
//!
//! This crate defines the models a baseline run can select:
//! - `Clstm`: convolutional front end feeding an LSTM, classifying a whole sequence.
//!
//! Every model implements [`SequenceClassifier`], a single forward contract that takes an
//! optional [`SideChannel`] (labels/domain/lengths). Padded batches should always carry one
//! so each sample is read at its own length; `None` treats every row as unpadded.
//!
//! Model names are a closed set ([`ModelKind`]); [`select`] fails with
//! [`ModelError::UnsupportedModelKind`] for anything else.

mod clstm;

pub use clstm::{Clstm, ClstmConfig};

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error(
        "unsupported model kind '{0}' (supported: {supported})",
        supported = ModelKind::supported()
    )]
    UnsupportedModelKind(String),
}

/// Baseline model variants that can be constructed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Clstm,
}

impl ModelKind {
    pub const ALL: [ModelKind; 1] = [ModelKind::Clstm];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Clstm => "clstm",
        }
    }

    fn supported() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ModelError::UnsupportedModelKind(s.to_string()))
    }
}

/// Per-sample metadata that travels alongside a batch of sequences.
#[derive(Debug, Clone)]
pub struct SideChannel<B: Backend> {
    /// Class labels, shape [batch].
    pub labels: Tensor<B, 1, Int>,
    /// Domain ids, shape [batch].
    pub domains: Tensor<B, 1, Int>,
    /// Unpadded sequence lengths, shape [batch].
    pub lengths: Tensor<B, 1, Int>,
}

/// Forward contract shared by every baseline model.
pub trait SequenceClassifier<B: Backend> {
    /// Class logits of shape [batch, classes] for input of shape [batch, time, features].
    fn forward(&self, input: Tensor<B, 3>, side: Option<SideChannel<B>>) -> Tensor<B, 2>;
}

/// Build the named model on `device`.
///
/// `input_size` is the feature dimensionality of each time step and `resampling` the number of
/// time steps the model consumes.
pub fn select<B: Backend>(
    device: &B::Device,
    model_name: &str,
    input_size: usize,
    resampling: usize,
) -> ModelResult<Clstm<B>> {
    match model_name.parse::<ModelKind>()? {
        ModelKind::Clstm => Ok(Clstm::new(
            ClstmConfig {
                input_size,
                resampling,
                ..Default::default()
            },
            device,
        )),
    }
}
