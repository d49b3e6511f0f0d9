//! Per-block connected-component labeling
//!
//! The default collaborator is a two-pass scan with union-find over
//! face-adjacent neighbors (4-connectivity in 2D, 6 in 3D, 2N in general).

use super::union_find::UnionFind;
use crate::errors::{BlockwiseError, Result};
use crate::grid::advance;
use crate::labels::LabelValue;
use ndarray::{ArrayD, ArrayViewD};

/// Local component ids of one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalLabels {
    /// `0` for background, `1..=count` for components; same shape as the block
    pub labels: ArrayD<u64>,
    pub count: u64,
}

/// Labels the connected components of a single block.
pub trait LocalComponentLabeler<T>: Sync {
    /// Face-connected components of equal value.
    ///
    /// Elements where `mask` is `false` are background. With `with_background`
    /// value `0` is background too; otherwise it forms components like any
    /// other value.
    fn label(
        &self,
        block: ArrayViewD<'_, T>,
        mask: Option<ArrayViewD<'_, bool>>,
        with_background: bool,
    ) -> Result<LocalLabels>;
}

/// Default collaborator: two-pass face-connectivity labeling.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaceConnectivityLabeler;

impl<T: LabelValue> LocalComponentLabeler<T> for FaceConnectivityLabeler {
    fn label(
        &self,
        block: ArrayViewD<'_, T>,
        mask: Option<ArrayViewD<'_, bool>>,
        with_background: bool,
    ) -> Result<LocalLabels> {
        let shape = block.shape().to_vec();
        let values: Vec<T> = block.iter().copied().collect();
        if let Some(bad) = values.iter().find(|v| v.to_label().is_none()) {
            return Err(BlockwiseError::InvalidLabel {
                block: None,
                message: format!("negative label {:?}", bad),
            });
        }
        let active: Vec<bool> = match &mask {
            Some(mask) => values
                .iter()
                .zip(mask.iter())
                .map(|(v, &keep)| keep && !(with_background && v.is_background()))
                .collect(),
            None => values
                .iter()
                .map(|v| !(with_background && v.is_background()))
                .collect(),
        };

        let strides = row_major_strides(&shape);
        // slot 0 stands for background
        let mut sets = UnionFind::new(1);
        let mut provisional = vec![0usize; values.len()];
        let mut coords = vec![0; shape.len()];

        for i in 0..values.len() {
            if active[i] {
                let mut label = 0;
                for (axis, &stride) in strides.iter().enumerate() {
                    if coords[axis] == 0 {
                        continue;
                    }
                    let j = i - stride;
                    if provisional[j] == 0 || values[j] != values[i] {
                        continue;
                    }
                    if label == 0 {
                        label = provisional[j];
                    } else {
                        sets.union(label, provisional[j]);
                    }
                }
                provisional[i] = if label == 0 { sets.push() } else { label };
            }
            advance(&mut coords, &shape);
        }

        let mut resolved = vec![0u64; sets.len()];
        let mut count = 0;
        let labels: Vec<u64> = provisional
            .into_iter()
            .map(|label| {
                if label == 0 {
                    return 0;
                }
                let root = sets.find(label);
                if resolved[root] == 0 {
                    count += 1;
                    resolved[root] = count;
                }
                resolved[root]
            })
            .collect();

        Ok(LocalLabels {
            labels: ArrayD::from_shape_vec(shape, labels)?,
            count,
        })
    }
}

fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}
