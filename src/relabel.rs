//! Consecutive relabeling of label arrays
//!
//! Runs the unique pass, numbers the distinct values in ascending order and
//! rewrites every block through a lookup restricted to the values that block
//! actually holds.

use crate::errors::{BlockwiseError, Result};
use crate::grid::check_same_shape;
use crate::labels::{LabelValue, Mapping};
use crate::parallel::BlockOptions;
use crate::unique::{block_uniques, merge_unique, LocalUniqueComputer, SortedUnique};
use ndarray::{ArrayViewD, ArrayViewMutD, Zip};
use tracing::info;

/// How values are numbered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelabelOptions {
    /// Pin value `0` to `0` and leave it out of the consecutive numbering
    pub keep_background: bool,
    /// First id handed out to a non-background value
    pub start_label: u64,
}

impl Default for RelabelOptions {
    fn default() -> Self {
        Self {
            keep_background: true,
            start_label: 1,
        }
    }
}

impl RelabelOptions {
    #[must_use]
    pub fn without_background(start_label: u64) -> Self {
        Self {
            keep_background: false,
            start_label,
        }
    }

    fn first_id(&self) -> u64 {
        if self.keep_background {
            self.start_label.max(1)
        } else {
            self.start_label
        }
    }
}

/// Outcome of [`relabel_consecutive`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relabeled<T> {
    /// Largest new value written
    pub max_id: T,
    /// Old value to new value, ascending by old value
    pub mapping: Mapping<T, T>,
}

/// Relabel `data` to consecutive values, writing the result into `output`.
///
/// Elements excluded by the mask are neither numbered nor written.
///
/// # Errors
///
/// - [`BlockwiseError::InvalidShape`] for a mismatching output, mask or block shape
/// - [`BlockwiseError::InvalidLabel`] if `data` holds negative values
/// - [`BlockwiseError::LabelOverflow`] if the new ids do not fit into `T`
pub fn relabel_consecutive<T: LabelValue>(
    data: &ArrayViewD<'_, T>,
    output: ArrayViewMutD<'_, T>,
    relabel: &RelabelOptions,
    options: &BlockOptions<'_>,
) -> Result<Relabeled<T>> {
    relabel_consecutive_with(data, output, relabel, options, &SortedUnique)
}

/// [`relabel_consecutive`] with a caller-supplied per-block unique collaborator
pub fn relabel_consecutive_with<T, C>(
    data: &ArrayViewD<'_, T>,
    output: ArrayViewMutD<'_, T>,
    relabel: &RelabelOptions,
    options: &BlockOptions<'_>,
    computer: &C,
) -> Result<Relabeled<T>>
where
    T: LabelValue,
    C: LocalUniqueComputer<T>,
{
    check_same_shape("output", output.shape(), data.shape())?;
    let grid = options.grid(data.shape())?;
    let executor = options.executor()?;
    let mask = options.mask_for(data.shape())?;
    info!(
        shape = ?data.shape(),
        blocks = grid.len(),
        workers = executor.workers(),
        keep_background = relabel.keep_background,
        "relabeling to consecutive ids"
    );

    let partials = block_uniques(data, options, computer, &grid, &executor)?;
    let merged = merge_unique(&partials);
    let (mapping, max_id) = consecutive_mapping(&merged.values, relabel)?;

    executor.run_mut(&grid, output, |block, mut out| {
        let keys: Vec<T> = partials[block.index].iter().map(|&(v, _)| v).collect();
        let local = mapping.restrict(&keys);
        let values = block.view(data);
        match &mask {
            Some(mask) => Zip::from(&mut out)
                .and(&values)
                .and(&block.view(mask))
                .for_each(|o, &v, &keep| {
                    if keep {
                        if let Some(new) = local.get(v) {
                            *o = new;
                        }
                    }
                }),
            None => Zip::from(&mut out).and(&values).for_each(|o, &v| {
                if let Some(new) = local.get(v) {
                    *o = new;
                }
            }),
        }
        Ok(())
    })?;

    info!(max_id = ?max_id, distinct = mapping.len(), "relabeling done");
    Ok(Relabeled { max_id, mapping })
}

/// Number sorted distinct `values` consecutively.
fn consecutive_mapping<T: LabelValue>(
    values: &[T],
    relabel: &RelabelOptions,
) -> Result<(Mapping<T, T>, T)> {
    if let Some(&lowest) = values.first() {
        if lowest.to_label().is_none() {
            return Err(BlockwiseError::InvalidLabel {
                block: None,
                message: format!("cannot relabel negative value {:?}", lowest),
            });
        }
    }

    // `None` once the id range is exhausted
    let mut next = Some(relabel.first_id());
    let mut max_id = 0;
    let mut entries = Vec::with_capacity(values.len());
    for &value in values {
        let new = if relabel.keep_background && value.is_background() {
            0
        } else {
            let id = next.ok_or(BlockwiseError::LabelOverflow { max_id: u64::MAX })?;
            next = id.checked_add(1);
            id
        };
        max_id = max_id.max(new);
        let converted =
            T::from_label(new).ok_or(BlockwiseError::LabelOverflow { max_id: new })?;
        entries.push((value, converted));
    }

    let max_id = T::from_label(max_id).ok_or(BlockwiseError::LabelOverflow { max_id })?;
    Ok((Mapping::from_sorted(entries), max_id))
}
