//! blockwise: block-parallel analytics for large N-dimensional label arrays
//!
//! Arrays that are too large for comfortable whole-array algorithms are split
//! into a regular grid of blocks. Every block is processed independently on a
//! worker pool and the per-block results are reconciled into one globally
//! consistent answer, identical to what the whole-array algorithm would give.
//!
//! ## Key Features
//!
//! - **Distinct values**: sorted unique values, optionally with counts
//! - **Consecutive relabeling**: rewrite arbitrary labels to a gap-free range
//! - **Connected components**: global labels for components spanning many blocks
//! - **Statistics**: single-pass mean and variance from mergeable block moments
//! - **Element-wise operations**: arithmetic and comparisons, block by block
//!
//! ## Module Organization
//!
//! - [`grid`]: block partitioning of an array shape
//! - [`parallel`]: worker pool configuration and the block executor
//! - [`unique`]: per-block distinct values and their k-way merge
//! - [`relabel`]: consecutive relabeling
//! - [`components`]: connected-component labeling and cross-block merging
//! - [`statistics`]: mean / variance aggregation
//! - [`operations`]: element-wise operations
//! - [`labels`]: label element types and value mappings
//! - [`netcdf_io`]: NetCDF loading and writing for the command-line tool
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//! ```rust,no_run
//! use blockwise::prelude::*;
//! use ndarray::ArrayD;
//!
//! let data = ArrayD::<u32>::zeros(vec![64, 64, 64]);
//! let options = BlockOptions::new(vec![32, 32, 32]).with_threads(4);
//!
//! let values = unique(&data.view(), &options).unwrap();
//!
//! let mut components = ArrayD::<u64>::zeros(data.shape());
//! let result = label(&data.view(), components.view_mut(), true, &options).unwrap();
//! println!("{} distinct values, {} components", values.len(), result.max_id);
//! ```

pub mod components;
pub mod errors;
pub mod grid;
pub mod labels;
pub mod netcdf_io;
pub mod operations;
pub mod parallel;
pub mod relabel;
pub mod statistics;
pub mod unique;

pub use components::{label, label_with, ComponentLabeling};
pub use errors::{BlockwiseError, Result};
pub use grid::{Block, BlockGrid, Region};
pub use labels::{LabelValue, Mapping};
pub use parallel::{get_parallel_info, BlockExecutor, BlockOptions, ParallelConfig, ParallelInfo};
pub use relabel::{relabel_consecutive, relabel_consecutive_with, RelabelOptions, Relabeled};
pub use statistics::{mean, mean_and_std, moments, std, variance, BlockMoments};
pub use unique::{merge_unique, unique, unique_with, unique_with_counts, UniqueCounts};

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::components::{
        label, label_with, ComponentLabeling, FaceConnectivityLabeler, LocalComponentLabeler,
        LocalLabels,
    };
    pub use crate::errors::{BlockwiseError, Result};
    pub use crate::grid::{Block, BlockGrid};
    pub use crate::labels::{LabelValue, Mapping};
    pub use crate::operations::{apply_comparison, apply_operation, Comparison, Operand, Operation};
    pub use crate::parallel::{BlockExecutor, BlockOptions, ParallelConfig};
    pub use crate::relabel::{relabel_consecutive, RelabelOptions, Relabeled};
    pub use crate::statistics::{mean, mean_and_std, moments, BlockMoments};
    pub use crate::unique::{
        unique, unique_with, unique_with_counts, LocalUniqueComputer, SortedUnique, UniqueCounts,
    };
}
