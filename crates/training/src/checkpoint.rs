//! Model parameter checkpoints keyed by model name and patient.

use crate::{TrainError, TrainResult};
use burn::module::Module;
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder};
use burn::tensor::backend::Backend;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of [`CheckpointStore::load`]: the model, restored or untouched.
pub struct CheckpointLoad<M> {
    pub model: M,
    pub restored: bool,
}

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/Baselines_<model>_<patient>.pkl`
    pub fn path_for(&self, model_name: &str, patient: &str) -> PathBuf {
        self.dir.join(format!("Baselines_{model_name}_{patient}.pkl"))
    }

    /// Serialize every parameter of `model`, overwriting any previous checkpoint for the pair.
    pub fn save<B: Backend, M: Module<B>>(
        &self,
        model: &M,
        model_name: &str,
        patient: &str,
    ) -> TrainResult<PathBuf> {
        ensure_dir(&self.dir)?;
        let path = self.path_for(model_name, patient);
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let bytes = Recorder::<B>::record(&recorder, model.clone().into_record(), ()).map_err(
            |e| TrainError::Checkpoint {
                path: path.clone(),
                msg: format!("failed to encode parameters: {e}"),
            },
        )?;
        fs::write(&path, bytes).map_err(|source| TrainError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!("Saving Model in {}......", path.display());
        Ok(path)
    }

    /// Restore `model` from its checkpoint. A missing file is not an error: the model comes
    /// back unchanged with `restored == false`.
    pub fn load<B: Backend, M: Module<B>>(
        &self,
        model: M,
        model_name: &str,
        patient: &str,
        device: &B::Device,
    ) -> TrainResult<CheckpointLoad<M>> {
        let path = self.path_for(model_name, patient);
        if !path.exists() {
            tracing::warn!("Model is not exist in {}", path.display());
            return Ok(CheckpointLoad {
                model,
                restored: false,
            });
        }
        let bytes = fs::read(&path).map_err(|source| TrainError::Io {
            path: path.clone(),
            source,
        })?;
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let record: M::Record = Recorder::<B>::load(&recorder, bytes, device).map_err(|e| {
            TrainError::Checkpoint {
                path: path.clone(),
                msg: format!("failed to decode parameters: {e}"),
            }
        })?;
        tracing::info!("Loading Baseline Mode from {}", path.display());
        Ok(CheckpointLoad {
            model: model.load_record(record),
            restored: true,
        })
    }
}

/// Create `dir` if it is missing. Only the last component is created; a missing parent fails.
pub fn ensure_dir(dir: &Path) -> TrainResult<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    fs::create_dir(dir).map_err(|source| TrainError::DirectoryCreate {
        path: dir.to_path_buf(),
        source,
    })
}
