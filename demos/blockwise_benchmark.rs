//! Benchmark showing how block shape and worker count affect connected-component labeling.
//!
//! Generates a seeded random label volume, labels it with several block shapes
//! and checks that every run finds the same number of components.

use blockwise::prelude::*;
use ndarray::ArrayD;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

fn random_volume(shape: &[usize], max_value: u32, seed: u64) -> ArrayD<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    ArrayD::from_shape_fn(shape, |_| rng.gen_range(0..max_value))
}

fn time_label(data: &ArrayD<u32>, block_shape: &[usize], threads: usize) -> Result<(u64, f64)> {
    let options = BlockOptions::new(block_shape.to_vec()).with_threads(threads);
    let mut out = ArrayD::<u64>::zeros(data.shape());

    let start = Instant::now();
    let result = label(&data.view(), out.view_mut(), true, &options)?;
    Ok((result.max_id, start.elapsed().as_secs_f64()))
}

fn main() -> Result<()> {
    println!("🔬 blockwise Connected-Component Benchmark");
    println!("==========================================\n");

    let available_threads = num_cpus::get();
    println!("System has {} logical CPU cores available\n", available_threads);

    let shape = [128, 128, 128];
    let data = random_volume(&shape, 3, 7);
    let block_shapes: [[usize; 3]; 4] = [[128, 128, 128], [64, 64, 64], [32, 32, 32], [16, 16, 16]];

    let mut reference = None;
    for block_shape in &block_shapes {
        println!("📊 Block shape {:?}:", block_shape);
        println!("-------------------------------------------");

        let (components_seq, seq_time) = time_label(&data, block_shape, 1)?;
        println!("🐌 1 worker:   {:.3} seconds", seq_time);

        let (components_par, par_time) = time_label(&data, block_shape, available_threads)?;
        println!("⚡ {} workers: {:.3} seconds", available_threads, par_time);
        println!("   🚀 Speedup: {:.2}x", seq_time / par_time);

        assert_eq!(components_seq, components_par);
        match reference {
            None => reference = Some(components_seq),
            Some(expected) => assert_eq!(
                expected, components_seq,
                "component count changed with block shape"
            ),
        }
        println!("   ✅ {} components\n", components_seq);
    }

    println!("💡 Key Takeaways:");
    println!("   - Results are identical for every block shape");
    println!("   - Smaller blocks give more parallelism but more faces to merge");
    Ok(())
}
