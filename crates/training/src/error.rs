use models::ModelError;
use signal_dataset::DatasetError;
use std::path::PathBuf;
use thiserror::Error;

pub type TrainResult<T> = Result<T, TrainError>;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("unsupported model kind '{0}'")]
    UnsupportedModelKind(String),
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("metric computation failed: {0}")]
    MetricComputation(String),
    #[error("device unavailable: {0}")]
    Device(String),
    #[error("checkpoint {path}: {msg}")]
    Checkpoint { path: PathBuf, msg: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("tensor readback failed: {0}")]
    Tensor(String),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<ModelError> for TrainError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnsupportedModelKind(name) => TrainError::UnsupportedModelKind(name),
        }
    }
}
