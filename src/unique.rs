//! Block-parallel distinct values
//!
//! Each block produces its own sorted `(value, count)` list; the lists are then
//! k-way merged so the result is identical to a whole-array computation for any
//! block shape.

use crate::errors::Result;
use crate::grid::BlockGrid;
use crate::parallel::{BlockExecutor, BlockOptions};
use ndarray::ArrayViewD;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::info;

/// Sorted distinct values of one block together with their occurrence counts
pub type BlockUnique<T> = Vec<(T, u64)>;

/// Computes the distinct values of a single block.
pub trait LocalUniqueComputer<T>: Sync {
    /// Sorted distinct values of `block` with counts, skipping elements where
    /// `mask` is `false`.
    fn unique(
        &self,
        block: ArrayViewD<'_, T>,
        mask: Option<ArrayViewD<'_, bool>>,
    ) -> Result<BlockUnique<T>>;
}

/// Default collaborator: sort the block's values and run-length encode them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortedUnique;

impl<T: Copy + Ord + Send + Sync> LocalUniqueComputer<T> for SortedUnique {
    fn unique(
        &self,
        block: ArrayViewD<'_, T>,
        mask: Option<ArrayViewD<'_, bool>>,
    ) -> Result<BlockUnique<T>> {
        let mut values: Vec<T> = match mask {
            Some(mask) => block
                .iter()
                .zip(mask.iter())
                .filter(|(_, &keep)| keep)
                .map(|(&v, _)| v)
                .collect(),
            None => block.iter().copied().collect(),
        };
        values.sort_unstable();

        let mut counted: BlockUnique<T> = Vec::new();
        for v in values {
            match counted.last_mut() {
                Some((last, count)) if *last == v => *count += 1,
                _ => counted.push((v, 1)),
            }
        }
        Ok(counted)
    }
}

/// Global distinct values with their total counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueCounts<T> {
    pub values: Vec<T>,
    pub counts: Vec<u64>,
}

impl<T> UniqueCounts<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// K-way merge of per-block sorted lists, summing counts of shared values.
#[must_use]
pub fn merge_unique<T: Copy + Ord>(partials: &[BlockUnique<T>]) -> UniqueCounts<T> {
    let mut heap: BinaryHeap<Reverse<(T, usize, usize)>> = partials
        .iter()
        .enumerate()
        .filter_map(|(block, list)| list.first().map(|&(v, _)| Reverse((v, block, 0))))
        .collect();

    let mut values: Vec<T> = Vec::new();
    let mut counts: Vec<u64> = Vec::new();
    while let Some(Reverse((value, block, pos))) = heap.pop() {
        let count = partials[block][pos].1;
        if values.last() == Some(&value) {
            if let Some(total) = counts.last_mut() {
                *total += count;
            }
        } else {
            values.push(value);
            counts.push(count);
        }
        if let Some(&(next, _)) = partials[block].get(pos + 1) {
            heap.push(Reverse((next, block, pos + 1)));
        }
    }
    UniqueCounts { values, counts }
}

/// Sorted distinct values of `data`
pub fn unique<T>(data: &ArrayViewD<'_, T>, options: &BlockOptions<'_>) -> Result<Vec<T>>
where
    T: Copy + Ord + Send + Sync,
{
    Ok(unique_with(data, options, &SortedUnique)?.values)
}

/// Sorted distinct values of `data` with their counts
pub fn unique_with_counts<T>(
    data: &ArrayViewD<'_, T>,
    options: &BlockOptions<'_>,
) -> Result<UniqueCounts<T>>
where
    T: Copy + Ord + Send + Sync,
{
    unique_with(data, options, &SortedUnique)
}

/// Distinct values computed with a caller-supplied per-block collaborator
pub fn unique_with<T, C>(
    data: &ArrayViewD<'_, T>,
    options: &BlockOptions<'_>,
    computer: &C,
) -> Result<UniqueCounts<T>>
where
    T: Copy + Ord + Send + Sync,
    C: LocalUniqueComputer<T>,
{
    let grid = options.grid(data.shape())?;
    let executor = options.executor()?;
    info!(
        shape = ?data.shape(),
        blocks = grid.len(),
        workers = executor.workers(),
        "computing unique values"
    );

    let partials = block_uniques(data, options, computer, &grid, &executor)?;
    let merged = merge_unique(&partials);
    info!(distinct = merged.len(), "unique values merged");
    Ok(merged)
}

/// Per-block unique lists in block order
pub(crate) fn block_uniques<T, C>(
    data: &ArrayViewD<'_, T>,
    options: &BlockOptions<'_>,
    computer: &C,
    grid: &BlockGrid,
    executor: &BlockExecutor,
) -> Result<Vec<BlockUnique<T>>>
where
    T: Copy + Ord + Send + Sync,
    C: LocalUniqueComputer<T>,
{
    let mask = options.mask_for(data.shape())?;
    executor.run(grid.blocks(), |block| {
        let local_mask = mask.as_ref().map(|m| block.view(m));
        computer.unique(block.view(data), local_mask)
    })
}
