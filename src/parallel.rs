//! Parallel processing configuration and the block executor
//!
//! Every operation builds its own Rayon thread pool from a [`ParallelConfig`],
//! runs its blocks on it and drops it when the call returns. No global pool is
//! configured, so unrelated calls never share worker state.

use crate::errors::{BlockwiseError, Result};
use crate::grid::{check_same_shape, Block, BlockGrid};
use ndarray::{ArrayViewD, ArrayViewMutD};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

/// Configuration for parallel processing
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Create a configuration that uses all available CPU cores
    pub fn all_cores() -> Self {
        Self {
            num_threads: Some(num_cpus::get()),
        }
    }

    /// Create a configuration that uses a specific number of threads
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }

    /// Number of workers a pool built from this configuration will have
    pub fn worker_count(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Build a thread pool scoped to one operation
    pub fn build_pool(&self) -> Result<ThreadPool> {
        let workers = self.worker_count();
        ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("blockwise-worker-{}", i))
            .build()
            .map_err(|e| {
                BlockwiseError::ThreadPoolError(format!(
                    "Failed to initialize thread pool with {} threads: {}",
                    workers, e
                ))
            })
    }
}

/// Options shared by every block-parallel operation
#[derive(Debug, Clone)]
pub struct BlockOptions<'m> {
    /// Requested per-axis block extent
    pub block_shape: Vec<usize>,
    pub parallel: ParallelConfig,
    /// Elements where the mask is `false` do not participate
    pub mask: Option<ArrayViewD<'m, bool>>,
}

impl<'m> BlockOptions<'m> {
    pub fn new(block_shape: impl Into<Vec<usize>>) -> Self {
        Self {
            block_shape: block_shape.into(),
            parallel: ParallelConfig::default(),
            mask: None,
        }
    }

    #[must_use]
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.parallel = ParallelConfig::with_threads(num_threads);
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub fn with_mask(mut self, mask: ArrayViewD<'m, bool>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub(crate) fn grid(&self, shape: &[usize]) -> Result<BlockGrid> {
        BlockGrid::new(shape, &self.block_shape)
    }

    pub(crate) fn executor(&self) -> Result<BlockExecutor> {
        BlockExecutor::new(&self.parallel)
    }

    /// The mask, after checking it covers `shape`
    pub(crate) fn mask_for(&self, shape: &[usize]) -> Result<Option<ArrayViewD<'m, bool>>> {
        match &self.mask {
            Some(mask) => {
                check_same_shape("mask", mask.shape(), shape)?;
                Ok(Some(mask.clone()))
            }
            None => Ok(None),
        }
    }
}

/// Runs one function per block on a call-scoped worker pool.
///
/// Results come back in block order regardless of completion order. The first
/// failure aborts the run; blocks already in flight finish but their results
/// are dropped.
pub struct BlockExecutor {
    pool: ThreadPool,
}

impl BlockExecutor {
    pub fn new(config: &ParallelConfig) -> Result<Self> {
        let pool = config.build_pool()?;
        debug!(workers = pool.current_num_threads(), "worker pool acquired");
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `per_block` to every block, collecting one result per block.
    ///
    /// # Errors
    ///
    /// Returns [`BlockwiseError::WorkerFailure`] wrapping the first error raised by `per_block`.
    pub fn run<R, F>(&self, blocks: &[Block], per_block: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(&Block) -> Result<R> + Sync,
    {
        self.pool
            .install(|| {
                blocks
                    .par_iter()
                    .map(|block| per_block(block).map_err(|e| worker_failure(block, e)))
                    .collect::<Result<Vec<R>>>()
            })
            .map_err(log_failure)
    }

    /// Like [`BlockExecutor::run`], additionally handing each worker the
    /// disjoint part of `output` covered by its block.
    ///
    /// # Errors
    ///
    /// Returns [`BlockwiseError::InvalidShape`] if `output` does not match the
    /// grid, or [`BlockwiseError::WorkerFailure`] as for `run`.
    pub fn run_mut<T, R, F>(
        &self,
        grid: &BlockGrid,
        output: ArrayViewMutD<'_, T>,
        per_block: F,
    ) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(&Block, ArrayViewMutD<'_, T>) -> Result<R> + Sync,
    {
        let parts = grid.split_mut(output)?;
        self.pool
            .install(|| {
                grid.blocks()
                    .par_iter()
                    .zip(parts.into_par_iter())
                    .map(|(block, part)| {
                        per_block(block, part).map_err(|e| worker_failure(block, e))
                    })
                    .collect::<Result<Vec<R>>>()
            })
            .map_err(log_failure)
    }
}

fn worker_failure(block: &Block, source: BlockwiseError) -> BlockwiseError {
    BlockwiseError::WorkerFailure {
        block: block.index,
        coords: block.coords.clone(),
        source: Box::new(source),
    }
}

fn log_failure(error: BlockwiseError) -> BlockwiseError {
    warn!(%error, "block run aborted");
    error
}

/// Get information about the parallel processing environment
pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        current_threads: rayon::current_num_threads(),
        available_cores: num_cpus::get(),
        available_parallelism: std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1),
    }
}

/// Information about the parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub current_threads: usize,
    pub available_cores: usize,
    pub available_parallelism: usize,
}

impl ParallelInfo {
    /// Print parallel processing information
    pub fn print_info(&self) {
        println!("📊 Parallel Processing Information:");
        println!("   Current threads: {}", self.current_threads);
        println!("   Available CPU cores: {}", self.available_cores);
        println!("   Available parallelism: {}", self.available_parallelism);
    }
}
