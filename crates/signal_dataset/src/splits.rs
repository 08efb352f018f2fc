//! Few-shot subsampling of the training split.

use crate::types::{DatasetError, DatasetResult};
use rand::seq::index::sample;
use rand::Rng;

/// Number of samples kept from `len` at `ratio`: `ceil(len * ratio)`, at least one when
/// `len > 0`.
pub fn few_shot_count(len: usize, ratio: f64) -> DatasetResult<usize> {
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(DatasetError::InvalidRatio(ratio));
    }
    if len == 0 {
        return Ok(0);
    }
    let kept = (len as f64 * ratio).ceil() as usize;
    Ok(kept.clamp(1, len))
}

/// Randomly pick `few_shot_count(items.len(), ratio)` items, preserving their original order.
pub fn few_shot_subset<T: Clone, R: Rng + ?Sized>(
    items: &[T],
    ratio: f64,
    rng: &mut R,
) -> DatasetResult<Vec<T>> {
    let kept = few_shot_count(items.len(), ratio)?;
    let mut picked = sample(rng, items.len(), kept).into_vec();
    picked.sort_unstable();
    Ok(picked.into_iter().map(|i| items[i].clone()).collect())
}
