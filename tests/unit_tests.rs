//! Unit tests for the building blocks: grid, executor, mappings, union-find,
//! moments and the local collaborators.

use blockwise::components::{FaceConnectivityLabeler, LocalComponentLabeler, UnionFind};
use blockwise::errors::{BlockwiseError, Result};
use blockwise::grid::BlockGrid;
use blockwise::parallel::{get_parallel_info, BlockExecutor, ParallelConfig};
use blockwise::statistics::BlockMoments;
use blockwise::unique::{merge_unique, LocalUniqueComputer, SortedUnique};
use blockwise::LabelValue;
use ndarray::{arr2, ArrayD, IxDyn};

#[test]
fn test_error_types() {
    let shape_err = BlockwiseError::InvalidShape {
        message: "bad".to_string(),
    };
    assert_eq!(format!("{}", shape_err), "Invalid shape: bad");

    let generic_err = BlockwiseError::Generic("Test error".to_string());
    assert_eq!(format!("{}", generic_err), "Test error");

    let worker_err = BlockwiseError::WorkerFailure {
        block: 5,
        coords: vec![1, 2],
        source: Box::new(BlockwiseError::Generic("boom".to_string())),
    };
    let text = format!("{}", worker_err);
    assert!(text.contains("block 5"));
    assert!(text.contains("[1, 2]"));
    assert!(text.contains("boom"));
    assert_eq!(worker_err.block_coords(), Some(&[1usize, 2][..]));
    assert!(matches!(worker_err.root_cause(), BlockwiseError::Generic(msg) if msg == "boom"));

    let label_err = BlockwiseError::InvalidLabel {
        block: Some(vec![0, 1]),
        message: "negative label -3".to_string(),
    };
    assert!(format!("{}", label_err).contains("Invalid label in block [0, 1]"));

    let var_err = BlockwiseError::VariableNotFound {
        var: "seg".to_string(),
    };
    assert!(format!("{}", var_err).contains("Variable 'seg' not found"));
}

#[test]
fn test_parallel_config() -> Result<()> {
    let default_config = ParallelConfig::default();
    assert!(default_config.num_threads.is_none());
    assert!(default_config.worker_count() > 0);

    let config_4 = ParallelConfig::with_threads(4);
    assert_eq!(config_4.num_threads, Some(4));
    assert_eq!(config_4.worker_count(), 4);

    let all_cores_config = ParallelConfig::all_cores();
    assert!(all_cores_config.num_threads.unwrap() > 0);

    let executor = BlockExecutor::new(&ParallelConfig::with_threads(3))?;
    assert_eq!(executor.workers(), 3);
    Ok(())
}

#[test]
fn test_parallel_info() {
    let info = get_parallel_info();
    assert!(info.current_threads > 0);
    assert!(info.available_cores > 0);
    assert!(info.available_parallelism > 0);

    info.print_info();
}

#[test]
fn test_grid_covers_shape_exactly_once() -> Result<()> {
    let shape = [5, 7, 3];
    let grid = BlockGrid::new(&shape, &[2, 3, 3])?;
    assert_eq!(grid.grid_shape(), &[3, 3, 1]);
    assert_eq!(grid.len(), 9);

    let mut hits = ArrayD::<u32>::zeros(IxDyn(&shape));
    for (i, block) in grid.blocks().iter().enumerate() {
        assert_eq!(block.index, i);
        assert!(!block.is_empty());
        let extents = block.start().iter().zip(block.stop()).zip(grid.block_shape());
        for ((&start, &stop), &b) in extents {
            assert!(stop - start <= b);
        }
        let mut view = hits.view_mut();
        view.slice_each_axis_inplace(|ax| {
            let axis = ax.axis.index();
            ndarray::Slice::from(block.start()[axis]..block.stop()[axis])
        });
        view.mapv_inplace(|h| h + 1);
    }
    assert!(hits.iter().all(|&h| h == 1));

    let last = grid.blocks().last().unwrap();
    assert_eq!(last.coords, vec![2, 2, 0]);
    assert_eq!(last.shape(), vec![1, 1, 3]);
    Ok(())
}

#[test]
fn test_grid_remainders_and_clamping() -> Result<()> {
    let grid = BlockGrid::new(&[10], &[4])?;
    let extents: Vec<usize> = grid.blocks().iter().map(|b| b.len()).collect();
    assert_eq!(extents, vec![4, 4, 2]);

    let exact = BlockGrid::new(&[10], &[5])?;
    assert_eq!(exact.len(), 2);

    let clamped = BlockGrid::new(&[6, 4], &[100, 100])?;
    assert_eq!(clamped.len(), 1);
    assert_eq!(clamped.block_shape(), &[6, 4]);

    let unit = BlockGrid::new(&[3, 3], &[1, 1])?;
    assert_eq!(unit.len(), 9);
    assert!(unit.blocks().iter().all(|b| b.len() == 1));
    Ok(())
}

#[test]
fn test_grid_rejects_invalid_shapes() {
    let cases: [(&[usize], &[usize]); 4] = [
        (&[4, 4], &[2]),
        (&[4, 4], &[2, 0]),
        (&[4, 0], &[2, 2]),
        (&[], &[]),
    ];
    for (shape, block_shape) in cases {
        match BlockGrid::new(shape, block_shape) {
            Err(BlockwiseError::InvalidShape { .. }) => {}
            other => panic!(
                "expected InvalidShape for {:?}/{:?}, got {:?}",
                shape, block_shape, other
            ),
        }
    }
}

#[test]
fn test_grid_neighbors_and_halo() -> Result<()> {
    let grid = BlockGrid::new(&[8, 6], &[3, 4])?;
    assert_eq!(grid.grid_shape(), &[3, 2]);
    assert_eq!(grid.index_of(&[1, 1]), Some(3));
    assert_eq!(grid.index_of(&[3, 0]), None);

    let block = grid.block(3).unwrap();
    assert_eq!(block.coords, vec![1, 1]);
    assert_eq!(grid.neighbor(block, 0).map(|b| b.index), Some(1));
    assert_eq!(grid.neighbor(block, 1).map(|b| b.index), Some(2));
    assert!(grid.neighbor(grid.block(0).unwrap(), 0).is_none());

    let halo = block.lower_halo(0).unwrap();
    assert_eq!(halo.start, vec![2, 4]);
    assert_eq!(halo.stop, vec![4, 6]);
    assert!(grid.block(1).unwrap().lower_halo(0).is_none());
    Ok(())
}

#[test]
fn test_split_mut_hands_out_disjoint_blocks() -> Result<()> {
    let grid = BlockGrid::new(&[5, 4], &[2, 3])?;
    let mut out = ArrayD::<usize>::zeros(IxDyn(&[5, 4]));
    let parts = grid.split_mut(out.view_mut())?;
    assert_eq!(parts.len(), grid.len());
    for (block, mut part) in grid.blocks().iter().zip(parts) {
        assert_eq!(part.shape(), block.shape().as_slice());
        part.fill(block.index + 1);
    }
    for (idx, &v) in out.indexed_iter() {
        let coords = [idx[0] / 2, idx[1] / 3];
        assert_eq!(v, grid.index_of(&coords).unwrap() + 1);
    }

    let mut wrong = ArrayD::<usize>::zeros(IxDyn(&[4, 4]));
    assert!(grid.split_mut(wrong.view_mut()).is_err());
    Ok(())
}

#[test]
fn test_executor_keeps_block_order() -> Result<()> {
    let grid = BlockGrid::new(&[64, 64], &[4, 4])?;
    let executor = BlockExecutor::new(&ParallelConfig::with_threads(8))?;
    let results = executor.run(grid.blocks(), |block| {
        // later blocks finish first
        let delay = ((grid.len() - block.index) % 7) as u64 * 50;
        std::thread::sleep(std::time::Duration::from_micros(delay));
        Ok(block.index)
    })?;
    assert_eq!(results, (0..grid.len()).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_executor_surfaces_worker_failure() -> Result<()> {
    let grid = BlockGrid::new(&[4, 4], &[2, 2])?;
    let executor = BlockExecutor::new(&ParallelConfig::with_threads(2))?;
    let result = executor.run(grid.blocks(), |block| {
        if block.index == 3 {
            Err(BlockwiseError::Generic("block exploded".to_string()))
        } else {
            Ok(block.index)
        }
    });
    match result {
        Err(BlockwiseError::WorkerFailure { block, coords, source }) => {
            assert_eq!(block, 3);
            assert_eq!(coords, vec![1, 1]);
            assert!(matches!(*source, BlockwiseError::Generic(_)));
        }
        other => panic!("expected WorkerFailure, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_merge_unique_sums_shared_values() {
    let partials = vec![
        vec![(1u32, 2), (4, 1), (9, 3)],
        vec![],
        vec![(0, 5), (4, 2)],
        vec![(9, 1), (12, 1)],
    ];
    let merged = merge_unique(&partials);
    assert_eq!(merged.values, vec![0, 1, 4, 9, 12]);
    assert_eq!(merged.counts, vec![5, 2, 3, 4, 1]);

    let empty: Vec<Vec<(u32, u64)>> = vec![vec![], vec![]];
    assert!(merge_unique(&empty).is_empty());
}

#[test]
fn test_sorted_unique_respects_mask() -> Result<()> {
    let block = arr2(&[[3u32, 1, 3], [7, 1, 3]]).into_dyn();
    let counted = SortedUnique.unique(block.view(), None)?;
    assert_eq!(counted, vec![(1, 2), (3, 3), (7, 1)]);

    let mask = arr2(&[[true, false, false], [true, true, true]]).into_dyn();
    let masked = SortedUnique.unique(block.view(), Some(mask.view()))?;
    assert_eq!(masked, vec![(1, 1), (3, 2), (7, 1)]);
    Ok(())
}

#[test]
fn test_union_find_keeps_smallest_representative() {
    let mut sets = UnionFind::new(6);
    assert!(sets.union(4, 2));
    assert!(sets.union(5, 4));
    assert!(!sets.union(2, 5));
    assert_eq!(sets.find(5), 2);
    assert_eq!(sets.find(0), 0);
    assert_eq!(sets.push(), 6);
    assert_eq!(sets.len(), 7);
}

#[test]
fn test_block_moments_combine_matches_single_pass() {
    let values: Vec<f64> = (0..100).map(|i| (i as f64 * 0.37).sin() * 10.0).collect();
    let whole = BlockMoments::from_values(values.iter().copied());
    let left = BlockMoments::from_values(values[..33].iter().copied());
    let right = BlockMoments::from_values(values[33..].iter().copied());
    let merged = left.combine(&right);

    assert_eq!(merged.count, 100);
    assert!((merged.mean() - whole.mean()).abs() < 1e-12);
    assert!((merged.variance() - whole.variance()).abs() < 1e-10);
    assert!((merged.sum - whole.sum).abs() < 1e-9);
    assert!((merged.sum_sq - whole.sum_sq).abs() < 1e-9);

    let empty = BlockMoments::default();
    assert_eq!(empty.combine(&whole), whole);
    assert!(empty.mean().is_nan());
}

#[test]
fn test_face_connectivity_labeler() -> Result<()> {
    let block = arr2(&[
        [1u32, 1, 0, 2],
        [0, 1, 0, 2],
        [3, 0, 1, 1],
    ])
    .into_dyn();

    let local = FaceConnectivityLabeler.label(block.view(), None, true)?;
    assert_eq!(local.count, 4);
    let expected = arr2(&[[1u64, 1, 0, 2], [0, 1, 0, 2], [3, 0, 4, 4]]).into_dyn();
    assert_eq!(local.labels, expected);

    // zeros form components of their own without background
    let all = FaceConnectivityLabeler.label(block.view(), None, false)?;
    assert!(all.labels.iter().all(|&l| l > 0));
    assert_eq!(all.count, 7);

    let mask = arr2(&[
        [true, false, true, true],
        [true, true, true, true],
        [true, true, true, true],
    ])
    .into_dyn();
    let masked = FaceConnectivityLabeler.label(block.view(), Some(mask.view()), true)?;
    assert_eq!(masked.labels[&[0, 1][..]], 0);
    assert_eq!(masked.count, 5);
    Ok(())
}

#[test]
fn test_face_connectivity_labeler_merges_u_shape() -> Result<()> {
    // both arms of the U get provisional ids before the bottom joins them
    let block = arr2(&[[5i32, 0, 5], [5, 0, 5], [5, 5, 5]]).into_dyn();
    let local = FaceConnectivityLabeler.label(block.view(), None, true)?;
    assert_eq!(local.count, 1);
    assert!(local.labels.iter().all(|&l| l <= 1));
    Ok(())
}

#[test]
fn test_face_connectivity_labeler_rejects_negative_labels() {
    let block = arr2(&[[1i64, -2], [0, 4]]).into_dyn();
    match FaceConnectivityLabeler.label(block.view(), None, true) {
        Err(BlockwiseError::InvalidLabel { message, .. }) => assert!(message.contains("-2")),
        other => panic!("expected InvalidLabel, got {:?}", other),
    }
}

#[test]
fn test_label_value_conversions() {
    assert_eq!(7u8.to_label(), Some(7));
    assert_eq!((-1i32).to_label(), None);
    assert_eq!(u8::from_label(256), None);
    assert_eq!(i16::from_label(300), Some(300));
    assert!(0u64.is_background());
    assert!(!3i64.is_background());
}
