//! Batch iteration for training, validation and testing.

use crate::loader::load_split;
use crate::splits::few_shot_subset;
use crate::types::{DatasetError, DatasetResult, SampleBatch, SignalSample, Split};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DataConfig {
    pub train_path: Option<PathBuf>,
    pub test_path: Option<PathBuf>,
    pub val_path: Option<PathBuf>,
    pub batch_size: usize,
    /// Features per time step; every sample is validated against it.
    pub dim: usize,
    pub few_shot: bool,
    pub few_shot_ratio: f64,
    /// Seed for shuffling and few-shot sampling; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            train_path: None,
            test_path: None,
            val_path: None,
            batch_size: 16,
            dim: 32,
            few_shot: true,
            few_shot_ratio: 0.2,
            seed: None,
        }
    }
}

impl DataConfig {
    fn path(&self, split: Split) -> Option<&PathBuf> {
        match split {
            Split::Train => self.train_path.as_ref(),
            Split::Validation => self.val_path.as_ref(),
            Split::Test => self.test_path.as_ref(),
        }
    }
}

/// Loads splits on first use and hands out batch iterators over them.
pub struct PatientData {
    cfg: DataConfig,
    splits: HashMap<Split, Arc<[SignalSample]>>,
    rng: StdRng,
}

impl PatientData {
    pub fn new(cfg: DataConfig) -> DatasetResult<Self> {
        if cfg.batch_size == 0 {
            return Err(DatasetError::InvalidBatchSize);
        }
        if cfg.few_shot && !(cfg.few_shot_ratio > 0.0 && cfg.few_shot_ratio <= 1.0) {
            return Err(DatasetError::InvalidRatio(cfg.few_shot_ratio));
        }
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Ok(Self {
            cfg,
            splits: HashMap::new(),
            rng,
        })
    }

    pub fn config(&self) -> &DataConfig {
        &self.cfg
    }

    /// Samples of `split`, after few-shot subsampling for the training split.
    pub fn samples(&mut self, split: Split) -> DatasetResult<Arc<[SignalSample]>> {
        if let Some(samples) = self.splits.get(&split) {
            return Ok(samples.clone());
        }
        let path = self
            .cfg
            .path(split)
            .ok_or(DatasetError::MissingSplit(split))?;
        let mut samples = load_split(path, self.cfg.dim)?;
        if split == Split::Train && self.cfg.few_shot {
            let total = samples.len();
            samples = few_shot_subset(&samples, self.cfg.few_shot_ratio, &mut self.rng)?;
            tracing::info!(
                kept = samples.len(),
                total,
                ratio = self.cfg.few_shot_ratio,
                "few-shot sampling of train split"
            );
        }
        let samples: Arc<[SignalSample]> = samples.into();
        self.splits.insert(split, samples.clone());
        Ok(samples)
    }

    /// Finite single pass over `split`. The train split is reshuffled on every call; the
    /// others keep file order.
    pub fn data_loader(&mut self, split: Split) -> DatasetResult<BatchIter> {
        let samples = self.samples(split)?;
        let mut order: Vec<usize> = (0..samples.len()).collect();
        if split == Split::Train {
            order.shuffle(&mut self.rng);
        }
        Ok(BatchIter {
            samples,
            order,
            cursor: 0,
            batch_size: self.cfg.batch_size,
            dim: self.cfg.dim,
        })
    }

    /// Endless cycle over the validation split in file order.
    pub fn next_batch_val_data(&mut self) -> DatasetResult<ValBatches> {
        let samples = self.samples(Split::Validation)?;
        if samples.is_empty() {
            return Err(DatasetError::EmptySplit(Split::Validation));
        }
        Ok(ValBatches {
            samples,
            cursor: 0,
            batch_size: self.cfg.batch_size,
            dim: self.cfg.dim,
        })
    }
}

pub struct BatchIter {
    samples: Arc<[SignalSample]>,
    order: Vec<usize>,
    cursor: usize,
    batch_size: usize,
    dim: usize,
}

impl BatchIter {
    pub fn num_samples(&self) -> usize {
        self.order.len()
    }
}

impl Iterator for BatchIter {
    type Item = SampleBatch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let batch = SampleBatch::from_samples(
            self.order[self.cursor..end].iter().map(|&i| &self.samples[i]),
            self.dim,
        );
        self.cursor = end;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.order.len() - self.cursor;
        let batches = remaining.div_ceil(self.batch_size);
        (batches, Some(batches))
    }
}

impl ExactSizeIterator for BatchIter {}

/// Cyclic validation batches; never exhausted.
pub struct ValBatches {
    samples: Arc<[SignalSample]>,
    cursor: usize,
    batch_size: usize,
    dim: usize,
}

impl ValBatches {
    pub fn next_batch(&mut self) -> SampleBatch {
        if self.cursor >= self.samples.len() {
            self.restart();
        }
        let end = (self.cursor + self.batch_size).min(self.samples.len());
        let batch = SampleBatch::from_samples(&self.samples[self.cursor..end], self.dim);
        self.cursor = end;
        batch
    }

    pub fn restart(&mut self) {
        self.cursor = 0;
    }
}

impl Iterator for ValBatches {
    type Item = SampleBatch;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_batch())
    }
}
