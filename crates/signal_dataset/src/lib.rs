//! Patient time-series loading, splitting, and Burn-compatible batching.
//!
//! This crate provides:
//! - JSON-lines split loading with per-line validation
//! - Few-shot subsampling of the training split
//! - Finite one-pass batch iteration and a cyclic validation iterator
//! - Host-to-device batch transfer into Burn tensors

pub mod batch;
pub mod loader;
pub mod splits;
pub mod types;

pub use batch::{BatchIter, DataConfig, PatientData, ValBatches};
pub use loader::{load_split, parse_samples};
pub use splits::{few_shot_count, few_shot_subset};
pub use types::*;
