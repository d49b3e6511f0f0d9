//! Block-parallel mean and variance
//!
//! This module provides the whole-array statistics computed block by block:
//! every block reduces to [`BlockMoments`] and the partial moments are merged
//! in block order.
//!
//! # Organization
//!
//! - [`moments`]: the mergeable moment triple and its combination rule

pub mod moments;

pub use moments::BlockMoments;

use crate::errors::Result;
use crate::parallel::BlockOptions;
use ndarray::ArrayViewD;
use tracing::info;

/// Merged moments of all (unmasked) elements of `data`
///
/// # Errors
///
/// Returns an error if the block shape or mask shape is invalid, or if the
/// worker pool cannot be built.
pub fn moments<T>(data: &ArrayViewD<'_, T>, options: &BlockOptions<'_>) -> Result<BlockMoments>
where
    T: Copy + Into<f64> + Send + Sync,
{
    let grid = options.grid(data.shape())?;
    let executor = options.executor()?;
    let mask = options.mask_for(data.shape())?;
    info!(
        shape = ?data.shape(),
        blocks = grid.len(),
        workers = executor.workers(),
        "computing moments"
    );

    let partials = executor.run(grid.blocks(), |block| {
        let values = block.view(data);
        let moments = match &mask {
            Some(mask) => BlockMoments::from_values(
                values
                    .iter()
                    .zip(block.view(mask).iter())
                    .filter(|(_, &keep)| keep)
                    .map(|(&v, _)| v.into()),
            ),
            None => BlockMoments::from_values(values.iter().map(|&v| v.into())),
        };
        Ok(moments)
    })?;

    let merged = partials
        .iter()
        .fold(BlockMoments::default(), |acc, partial| acc.combine(partial));
    info!(count = merged.count, mean = merged.mean(), "moments merged");
    Ok(merged)
}

/// Mean of `data`
pub fn mean<T>(data: &ArrayViewD<'_, T>, options: &BlockOptions<'_>) -> Result<f64>
where
    T: Copy + Into<f64> + Send + Sync,
{
    Ok(moments(data, options)?.mean())
}

/// Population variance of `data`
pub fn variance<T>(data: &ArrayViewD<'_, T>, options: &BlockOptions<'_>) -> Result<f64>
where
    T: Copy + Into<f64> + Send + Sync,
{
    Ok(moments(data, options)?.variance())
}

/// Population standard deviation of `data`
pub fn std<T>(data: &ArrayViewD<'_, T>, options: &BlockOptions<'_>) -> Result<f64>
where
    T: Copy + Into<f64> + Send + Sync,
{
    Ok(moments(data, options)?.std())
}

/// Mean and standard deviation from a single pass
pub fn mean_and_std<T>(data: &ArrayViewD<'_, T>, options: &BlockOptions<'_>) -> Result<(f64, f64)>
where
    T: Copy + Into<f64> + Send + Sync,
{
    let merged = moments(data, options)?;
    Ok((merged.mean(), merged.std()))
}
