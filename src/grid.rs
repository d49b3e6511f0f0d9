//! Regular partition of an array's index space into rectangular blocks
//!
//! A [`BlockGrid`] is built once per operation from the array shape and the
//! requested block shape. Blocks are enumerated row-major over their grid
//! coordinates; the last block along an axis absorbs the remainder and is
//! never empty.

use crate::errors::{BlockwiseError, Result};
use ndarray::{ArrayViewD, ArrayViewMutD, Axis, Slice};

/// Half-open index range `[start, stop)` per axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub start: Vec<usize>,
    pub stop: Vec<usize>,
}

impl Region {
    /// Extent of the region along every axis
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        self.start
            .iter()
            .zip(&self.stop)
            .map(|(start, stop)| stop - start)
            .collect()
    }

    /// Read-only view of `array` restricted to this region
    #[must_use]
    pub fn view<'a, T>(&self, array: &ArrayViewD<'a, T>) -> ArrayViewD<'a, T> {
        let mut view = array.clone();
        view.slice_each_axis_inplace(|ax| {
            let axis = ax.axis.index();
            Slice::from(self.start[axis]..self.stop[axis])
        });
        view
    }
}

/// One rectangular sub-region of the array, processed by exactly one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Position in row-major block order
    pub index: usize,
    /// Coordinate in the block grid
    pub coords: Vec<usize>,
    /// Covered index range
    pub region: Region,
}

impl Block {
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.coords.len()
    }

    #[must_use]
    pub fn start(&self) -> &[usize] {
        &self.region.start
    }

    #[must_use]
    pub fn stop(&self) -> &[usize] {
        &self.region.stop
    }

    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        self.region.shape()
    }

    /// Number of elements in the block
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    /// Blocks of a valid grid always hold at least one element.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn view<'a, T>(&self, array: &ArrayViewD<'a, T>) -> ArrayViewD<'a, T> {
        self.region.view(array)
    }

    /// The two-plane slab straddling this block's lower face along `axis`.
    ///
    /// Plane 0 belongs to the lower neighbor, plane 1 to this block. Returns
    /// `None` for blocks on the array's lower edge.
    #[must_use]
    pub fn lower_halo(&self, axis: usize) -> Option<Region> {
        let start = self.region.start[axis];
        if start == 0 {
            return None;
        }
        let mut halo = self.region.clone();
        halo.start[axis] = start - 1;
        halo.stop[axis] = start + 1;
        Some(halo)
    }
}

/// Ordered, disjoint and covering partition of an array shape
#[derive(Debug, Clone)]
pub struct BlockGrid {
    shape: Vec<usize>,
    block_shape: Vec<usize>,
    grid_shape: Vec<usize>,
    blocks: Vec<Block>,
}

impl BlockGrid {
    /// Partition `shape` into blocks of at most `block_shape`.
    ///
    /// Block extents larger than the array are clamped to the array extent.
    ///
    /// # Errors
    ///
    /// Returns [`BlockwiseError::InvalidShape`] if the ranks differ, the rank is
    /// zero, or any extent of either shape is zero.
    pub fn new(shape: &[usize], block_shape: &[usize]) -> Result<Self> {
        if shape.len() != block_shape.len() {
            return Err(BlockwiseError::invalid_shape(format!(
                "array rank {} does not match block rank {}",
                shape.len(),
                block_shape.len()
            )));
        }
        if shape.is_empty() {
            return Err(BlockwiseError::invalid_shape(
                "array must have at least one axis",
            ));
        }
        if let Some(axis) = block_shape.iter().position(|&b| b == 0) {
            return Err(BlockwiseError::invalid_shape(format!(
                "block extent along axis {} must be positive, got {:?}",
                axis, block_shape
            )));
        }
        if let Some(axis) = shape.iter().position(|&s| s == 0) {
            return Err(BlockwiseError::invalid_shape(format!(
                "array extent along axis {} must be positive, got {:?}",
                axis, shape
            )));
        }

        let block_shape: Vec<usize> = shape
            .iter()
            .zip(block_shape)
            .map(|(&s, &b)| b.min(s))
            .collect();
        let grid_shape: Vec<usize> = shape
            .iter()
            .zip(&block_shape)
            .map(|(&s, &b)| s.div_ceil(b))
            .collect();

        let total: usize = grid_shape.iter().product();
        let mut blocks = Vec::with_capacity(total);
        let mut coords = vec![0; shape.len()];
        for index in 0..total {
            let start: Vec<usize> = coords
                .iter()
                .zip(&block_shape)
                .map(|(&c, &b)| c * b)
                .collect();
            let stop: Vec<usize> = start
                .iter()
                .zip(&block_shape)
                .zip(shape)
                .map(|((&st, &b), &s)| (st + b).min(s))
                .collect();
            blocks.push(Block {
                index,
                coords: coords.clone(),
                region: Region { start, stop },
            });
            advance(&mut coords, &grid_shape);
        }

        Ok(Self {
            shape: shape.to_vec(),
            block_shape,
            grid_shape,
            blocks,
        })
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Effective block shape after clamping to the array extent
    #[must_use]
    pub fn block_shape(&self) -> &[usize] {
        &self.block_shape
    }

    /// Number of blocks along every axis
    #[must_use]
    pub fn grid_shape(&self) -> &[usize] {
        &self.grid_shape
    }

    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[must_use]
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Row-major block index of a grid coordinate
    #[must_use]
    pub fn index_of(&self, coords: &[usize]) -> Option<usize> {
        if coords.len() != self.grid_shape.len() {
            return None;
        }
        let mut index = 0;
        for (&c, &n) in coords.iter().zip(&self.grid_shape) {
            if c >= n {
                return None;
            }
            index = index * n + c;
        }
        Some(index)
    }

    /// The face-adjacent block below `block` along `axis`
    #[must_use]
    pub fn neighbor(&self, block: &Block, axis: usize) -> Option<&Block> {
        if block.coords[axis] == 0 {
            return None;
        }
        let mut coords = block.coords.clone();
        coords[axis] -= 1;
        self.index_of(&coords).map(|index| &self.blocks[index])
    }

    /// Split a mutable view of the whole array into one disjoint view per block,
    /// in block order.
    ///
    /// # Errors
    ///
    /// Returns [`BlockwiseError::InvalidShape`] if the view shape differs from
    /// the grid's array shape.
    pub fn split_mut<'a, T>(
        &self,
        view: ArrayViewMutD<'a, T>,
    ) -> Result<Vec<ArrayViewMutD<'a, T>>> {
        check_same_shape("output", view.shape(), &self.shape)?;
        let mut parts = Vec::with_capacity(self.blocks.len());
        self.split_axis(view, 0, &mut parts);
        Ok(parts)
    }

    fn split_axis<'a, T>(
        &self,
        view: ArrayViewMutD<'a, T>,
        axis: usize,
        parts: &mut Vec<ArrayViewMutD<'a, T>>,
    ) {
        if axis == self.ndim() {
            parts.push(view);
            return;
        }
        let step = self.block_shape[axis];
        let mut rest = view;
        for _ in 1..self.grid_shape[axis] {
            let (head, tail) = rest.split_at(Axis(axis), step);
            self.split_axis(head, axis + 1, parts);
            rest = tail;
        }
        self.split_axis(rest, axis + 1, parts);
    }
}

/// Row-major increment of `coords` within `shape`. Returns `false` on wrap-around.
pub(crate) fn advance(coords: &mut [usize], shape: &[usize]) -> bool {
    for axis in (0..coords.len()).rev() {
        coords[axis] += 1;
        if coords[axis] < shape[axis] {
            return true;
        }
        coords[axis] = 0;
    }
    false
}

/// Validate that an auxiliary array (mask, operand, output) matches the array shape.
pub(crate) fn check_same_shape(what: &str, found: &[usize], expected: &[usize]) -> Result<()> {
    if found != expected {
        return Err(BlockwiseError::invalid_shape(format!(
            "{} shape {:?} does not match array shape {:?}",
            what, found, expected
        )));
    }
    Ok(())
}
