//! Cross-block reconciliation of local component labels
//!
//! The merge runs as a typestate chain:
//!
//! 1. [`LocalLabeled`]: every block holds ids `1..=count` with no meaning outside the block.
//! 2. [`FaceScanned`]: each block compared its lower faces against its lower
//!    neighbors through a two-plane halo and recorded which local ids touch.
//! 3. [`Unioned`]: the touching pairs were unioned and flattened into canonical
//!    global ids, numbered by the smallest `(block, local id)` of each class.
//!
//! [`Unioned::write`] performs the final per-block rewrite.
//!
//! Every `(block, local id)` pair is a node in one flat arena; node indices
//! follow block order, then local id order.

use super::local::LocalLabels;
use super::union_find::UnionFind;
use crate::errors::{BlockwiseError, Result};
use crate::grid::BlockGrid;
use crate::labels::LabelValue;
use crate::parallel::BlockExecutor;
use ndarray::{ArrayViewD, ArrayViewMutD, Axis, Zip};
use tracing::debug;

/// Blocks labeled independently
#[derive(Debug)]
pub struct LocalLabeled<'g> {
    grid: &'g BlockGrid,
    blocks: Vec<LocalLabels>,
    offsets: Vec<usize>,
    nodes: usize,
}

impl<'g> LocalLabeled<'g> {
    /// # Errors
    ///
    /// Returns [`BlockwiseError::InvalidShape`] if `blocks` does not hold one
    /// labeling of the right shape per grid block.
    pub fn new(grid: &'g BlockGrid, blocks: Vec<LocalLabels>) -> Result<Self> {
        if blocks.len() != grid.len() {
            return Err(BlockwiseError::invalid_shape(format!(
                "expected {} block labelings, got {}",
                grid.len(),
                blocks.len()
            )));
        }
        let mut offsets = Vec::with_capacity(blocks.len());
        let mut nodes = 0;
        for (block, local) in grid.blocks().iter().zip(&blocks) {
            if local.labels.shape() != block.shape().as_slice() {
                return Err(BlockwiseError::invalid_shape(format!(
                    "labeling of block {:?} has shape {:?}, expected {:?}",
                    block.coords,
                    local.labels.shape(),
                    block.shape()
                )));
            }
            offsets.push(nodes);
            nodes += local.count as usize;
        }
        Ok(Self {
            grid,
            blocks,
            offsets,
            nodes,
        })
    }

    /// Total number of local components across all blocks
    pub fn node_count(&self) -> usize {
        self.nodes
    }

    fn node(&self, block: usize, local: u64) -> usize {
        self.offsets[block] + (local - 1) as usize
    }

    /// Record every pair of local components that touch across a block face.
    ///
    /// Two elements on opposite sides of a face connect when they hold equal
    /// values in `data` and neither is background.
    pub fn scan_faces<T>(
        self,
        data: &ArrayViewD<'_, T>,
        executor: &BlockExecutor,
    ) -> Result<FaceScanned<'g>>
    where
        T: PartialEq + Sync,
    {
        let grid = self.grid;
        let per_block = executor.run(grid.blocks(), |block| {
            let mut pairs = Vec::new();
            let upper = &self.blocks[block.index].labels;
            for axis in 0..grid.ndim() {
                let (Some(neighbor), Some(halo)) =
                    (grid.neighbor(block, axis), block.lower_halo(axis))
                else {
                    continue;
                };
                let lower = &self.blocks[neighbor.index].labels;
                let slab = halo.view(data);
                let last = lower.shape()[axis] - 1;

                Zip::from(slab.index_axis(Axis(axis), 0))
                    .and(slab.index_axis(Axis(axis), 1))
                    .and(lower.index_axis(Axis(axis), last))
                    .and(upper.index_axis(Axis(axis), 0))
                    .for_each(|a, b, &la, &lb| {
                        if la != 0 && lb != 0 && a == b {
                            pairs.push((self.node(neighbor.index, la), self.node(block.index, lb)));
                        }
                    });
            }
            pairs.sort_unstable();
            pairs.dedup();
            Ok(pairs)
        })?;

        let pairs: Vec<(usize, usize)> = per_block.into_iter().flatten().collect();
        debug!(nodes = self.nodes, pairs = pairs.len(), "block faces scanned");
        Ok(FaceScanned {
            labeled: self,
            pairs,
        })
    }
}

/// Local labels plus the cross-face equivalences
#[derive(Debug)]
pub struct FaceScanned<'g> {
    labeled: LocalLabeled<'g>,
    pairs: Vec<(usize, usize)>,
}

impl<'g> FaceScanned<'g> {
    /// Touching node pairs, lower block first
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Union all touching pairs and number the resulting classes.
    pub fn union(self) -> Unioned<'g> {
        let mut sets = UnionFind::new(self.labeled.nodes);
        for &(a, b) in &self.pairs {
            sets.union(a, b);
        }

        // the smallest node of every class is its root, so it is seen first
        let mut global = vec![0u64; self.labeled.nodes];
        let mut max_id = 0;
        for node in 0..self.labeled.nodes {
            let root = sets.find(node);
            global[node] = if root == node {
                max_id += 1;
                max_id
            } else {
                global[root]
            };
        }
        debug!(components = max_id, "equivalence classes flattened");

        Unioned {
            labeled: self.labeled,
            global,
            max_id,
        }
    }
}

/// Canonical global id for every local component
#[derive(Debug)]
pub struct Unioned<'g> {
    labeled: LocalLabeled<'g>,
    global: Vec<u64>,
    max_id: u64,
}

impl<'g> Unioned<'g> {
    /// Number of global components, equal to the largest global id
    pub fn max_id(&self) -> u64 {
        self.max_id
    }

    /// Global ids of block `block`'s local ids `1..=count`
    pub fn block_map(&self, block: usize) -> &[u64] {
        let start = self.labeled.offsets[block];
        let count = self.labeled.blocks[block].count as usize;
        &self.global[start..start + count]
    }

    /// Rewrite every block's local labels to global ids in `output`.
    ///
    /// # Errors
    ///
    /// Returns [`BlockwiseError::LabelOverflow`] before writing anything if the
    /// largest id does not fit into `O`.
    pub fn write<O: LabelValue>(
        &self,
        output: ArrayViewMutD<'_, O>,
        executor: &BlockExecutor,
    ) -> Result<()> {
        let background = O::from_label(0).ok_or(BlockwiseError::LabelOverflow { max_id: 0 })?;
        if O::from_label(self.max_id).is_none() {
            return Err(BlockwiseError::LabelOverflow {
                max_id: self.max_id,
            });
        }

        executor.run_mut(self.labeled.grid, output, |block, mut out| {
            let table = self
                .block_map(block.index)
                .iter()
                .map(|&id| O::from_label(id).ok_or(BlockwiseError::LabelOverflow { max_id: id }))
                .collect::<Result<Vec<O>>>()?;
            Zip::from(&mut out)
                .and(&self.labeled.blocks[block.index].labels)
                .for_each(|o, &local| {
                    *o = if local == 0 {
                        background
                    } else {
                        table[(local - 1) as usize]
                    };
                });
            Ok(())
        })?;
        Ok(())
    }

    /// Per-block local-to-global tables, in block order
    pub fn block_maps(&self) -> Vec<Vec<u64>> {
        (0..self.labeled.blocks.len())
            .map(|block| self.block_map(block).to_vec())
            .collect()
    }
}
