//! Whole-array reference implementations used as oracles by the block tests.

#![allow(dead_code)]

use ndarray::{ArrayD, Dimension};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap, VecDeque};

pub fn random_labels(shape: &[usize], low: u32, high: u32, seed: u64) -> ArrayD<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    ArrayD::from_shape_fn(shape, |_| rng.gen_range(low..high))
}

pub fn random_values(shape: &[usize], seed: u64) -> ArrayD<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    ArrayD::from_shape_fn(shape, |_| rng.gen_range(-50.0..150.0))
}

pub fn random_mask(shape: &[usize], seed: u64) -> ArrayD<bool> {
    let mut rng = StdRng::seed_from_u64(seed);
    ArrayD::from_shape_fn(shape, |_| rng.gen_bool(0.6))
}

/// Distinct values with counts in one sequential pass
pub fn naive_unique<T: Ord + Copy>(values: impl Iterator<Item = T>) -> (Vec<T>, Vec<u64>) {
    let mut counts: BTreeMap<T, u64> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts.into_iter().unzip()
}

/// Flood-fill labeling of face-connected equal values over the whole array.
///
/// Components are numbered in raster order of their first element.
pub fn reference_label<T: PartialEq + Copy>(
    data: &ArrayD<T>,
    is_background: impl Fn(T) -> bool,
) -> (ArrayD<u64>, u64) {
    let shape = data.shape().to_vec();
    let mut labels = ArrayD::<u64>::zeros(shape.clone());
    let mut next = 0;

    for (start, &value) in data.indexed_iter() {
        let start: Vec<usize> = start.slice().to_vec();
        if is_background(value) || labels[start.as_slice()] != 0 {
            continue;
        }
        next += 1;
        labels[start.as_slice()] = next;
        let mut queue = VecDeque::from([start]);
        while let Some(idx) = queue.pop_front() {
            for axis in 0..shape.len() {
                for forward in [false, true] {
                    let mut neighbor = idx.clone();
                    if forward {
                        if neighbor[axis] + 1 >= shape[axis] {
                            continue;
                        }
                        neighbor[axis] += 1;
                    } else {
                        if neighbor[axis] == 0 {
                            continue;
                        }
                        neighbor[axis] -= 1;
                    }
                    if labels[neighbor.as_slice()] == 0 && data[neighbor.as_slice()] == value {
                        labels[neighbor.as_slice()] = next;
                        queue.push_back(neighbor);
                    }
                }
            }
        }
    }
    (labels, next)
}

/// True if both labelings partition the elements identically, with `0` only
/// matching `0`.
pub fn same_partition(a: &ArrayD<u64>, b: &ArrayD<u64>) -> bool {
    if a.shape() != b.shape() {
        return false;
    }
    let mut forward: HashMap<u64, u64> = HashMap::new();
    let mut backward: HashMap<u64, u64> = HashMap::new();
    for (&x, &y) in a.iter().zip(b.iter()) {
        if (x == 0) != (y == 0) {
            return false;
        }
        if *forward.entry(x).or_insert(y) != y || *backward.entry(y).or_insert(x) != x {
            return false;
        }
    }
    true
}

/// Two-pass population mean and variance
pub fn naive_mean_var(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var)
}
