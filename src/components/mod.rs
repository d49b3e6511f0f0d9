//! Block-parallel connected-component labeling
//!
//! Components are maximal sets of face-adjacent elements holding the same
//! value. Each block is labeled on its own, touching components are found by
//! scanning block faces, and the resulting equivalences are resolved with a
//! union-find over all local components before the output is written.
//!
//! # Organization
//!
//! - [`local`]: the per-block labeling collaborator
//! - [`merge`]: face scanning, union and global rewrite
//! - [`union_find`]: the disjoint-set arena

pub mod local;
pub mod merge;
pub mod union_find;

pub use local::{FaceConnectivityLabeler, LocalComponentLabeler, LocalLabels};
pub use merge::{FaceScanned, LocalLabeled, Unioned};
pub use union_find::UnionFind;

use crate::errors::{BlockwiseError, Result};
use crate::grid::check_same_shape;
use crate::labels::LabelValue;
use crate::parallel::BlockOptions;
use ndarray::{ArrayViewD, ArrayViewMutD};
use tracing::info;

/// Outcome of [`label`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentLabeling {
    /// Number of components; global ids are exactly `1..=max_id`
    pub max_id: u64,
    /// For every block, the global id of each local id `1..=count`
    pub block_maps: Vec<Vec<u64>>,
}

impl ComponentLabeling {
    /// Global id of local id `local` in block `block`; `0` stays `0`.
    #[must_use]
    pub fn global_id(&self, block: usize, local: u64) -> Option<u64> {
        if local == 0 {
            return Some(0);
        }
        self.block_maps
            .get(block)
            .and_then(|map| map.get((local - 1) as usize))
            .copied()
    }
}

/// Label the connected components of `data` into `output`.
///
/// With `with_background`, value `0` is background and written as `0`; all
/// other components get ids `1..=max_id`. Elements masked out by
/// `options.mask` are always background.
///
/// On error `output` must be treated as unusable; local labeling failures are
/// detected before anything is written.
///
/// # Errors
///
/// - [`BlockwiseError::InvalidShape`] for a mismatching output, mask or block shape
/// - [`BlockwiseError::InvalidLabel`] if local labeling of any block fails
/// - [`BlockwiseError::LabelOverflow`] if the component count does not fit into `O`
pub fn label<T, O>(
    data: &ArrayViewD<'_, T>,
    output: ArrayViewMutD<'_, O>,
    with_background: bool,
    options: &BlockOptions<'_>,
) -> Result<ComponentLabeling>
where
    T: LabelValue,
    O: LabelValue,
{
    label_with(data, output, with_background, options, &FaceConnectivityLabeler)
}

/// [`label`] with a caller-supplied per-block labeling collaborator
pub fn label_with<T, O, L>(
    data: &ArrayViewD<'_, T>,
    output: ArrayViewMutD<'_, O>,
    with_background: bool,
    options: &BlockOptions<'_>,
    labeler: &L,
) -> Result<ComponentLabeling>
where
    T: PartialEq + Sync,
    O: LabelValue,
    L: LocalComponentLabeler<T>,
{
    check_same_shape("output", output.shape(), data.shape())?;
    let grid = options.grid(data.shape())?;
    let executor = options.executor()?;
    let mask = options.mask_for(data.shape())?;
    info!(
        shape = ?data.shape(),
        blocks = grid.len(),
        workers = executor.workers(),
        with_background,
        "labeling connected components"
    );

    let locals = executor
        .run(grid.blocks(), |block| {
            let local_mask = mask.as_ref().map(|m| block.view(m));
            let local = labeler.label(block.view(data), local_mask, with_background)?;
            if local.labels.iter().any(|&l| l > local.count) {
                return Err(BlockwiseError::InvalidLabel {
                    block: None,
                    message: format!("local label exceeds reported count {}", local.count),
                });
            }
            Ok(local)
        })
        .map_err(BlockwiseError::into_label_error)?;

    let labeled = LocalLabeled::new(&grid, locals).map_err(|e| BlockwiseError::InvalidLabel {
        block: None,
        message: e.to_string(),
    })?;
    let unioned = labeled.scan_faces(data, &executor)?.union();
    unioned.write(output, &executor)?;

    info!(components = unioned.max_id(), "labeling done");
    Ok(ComponentLabeling {
        max_id: unioned.max_id(),
        block_maps: unioned.block_maps(),
    })
}
