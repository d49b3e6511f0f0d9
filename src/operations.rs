//! Block-parallel element-wise operations
//!
//! Arithmetic rewrites the target array in place; comparisons write a boolean
//! array. The second operand is either a scalar or an array of the same shape.
//! Elements excluded by the mask are left untouched.

use crate::errors::Result;
use crate::grid::{check_same_shape, Block};
use crate::parallel::BlockOptions;
use ndarray::{ArrayViewD, ArrayViewMutD, Zip};
use std::ops::{Add, Div, Mul, Sub};
use tracing::info;

/// Supported arithmetic operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }

    #[inline]
    fn apply<T: Arithmetic>(self, a: T, b: T) -> T {
        match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
            Self::Divide => a / b,
        }
    }
}

/// Supported comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl Comparison {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Greater => "greater",
            Self::GreaterEqual => "greater_equal",
            Self::Less => "less",
            Self::LessEqual => "less_equal",
        }
    }

    #[inline]
    fn apply<T: PartialOrd>(self, a: &T, b: &T) -> bool {
        match self {
            Self::Greater => a > b,
            Self::GreaterEqual => a >= b,
            Self::Less => a < b,
            Self::LessEqual => a <= b,
        }
    }
}

/// Element types the arithmetic operations accept
pub trait Arithmetic:
    Copy
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
}

impl<T> Arithmetic for T where
    T: Copy + Send + Sync + Add<Output = T> + Sub<Output = T> + Mul<Output = T> + Div<Output = T>
{
}

/// Right-hand side of an element-wise operation
#[derive(Debug, Clone)]
pub enum Operand<'a, T> {
    Scalar(T),
    Array(ArrayViewD<'a, T>),
}

impl<'a, T> Operand<'a, T> {
    fn check_shape(&self, shape: &[usize]) -> Result<()> {
        match self {
            Operand::Scalar(_) => Ok(()),
            Operand::Array(array) => check_same_shape("operand", array.shape(), shape),
        }
    }
}

/// Apply `operation` element-wise to `data` in place: `data = data <op> operand`.
///
/// # Panics
///
/// Integer division by zero panics, as it does for the scalar operator.
pub fn apply_operation<T: Arithmetic>(
    data: ArrayViewMutD<'_, T>,
    operand: &Operand<'_, T>,
    operation: Operation,
    options: &BlockOptions<'_>,
) -> Result<()> {
    let shape = data.shape().to_vec();
    operand.check_shape(&shape)?;
    let grid = options.grid(&shape)?;
    let executor = options.executor()?;
    let mask = options.mask_for(&shape)?;
    info!(
        operation = operation.as_str(),
        shape = ?shape,
        blocks = grid.len(),
        "applying element-wise operation"
    );

    executor.run_mut(&grid, data, |block, mut out| {
        let f = |o: &mut T, b: T| *o = operation.apply(*o, b);
        match (operand, &mask) {
            (Operand::Scalar(s), None) => Zip::from(&mut out).for_each(|o| f(o, *s)),
            (Operand::Scalar(s), Some(m)) => {
                Zip::from(&mut out).and(&block.view(m)).for_each(|o, &keep| {
                    if keep {
                        f(o, *s)
                    }
                })
            }
            (Operand::Array(a), None) => {
                Zip::from(&mut out).and(&block.view(a)).for_each(|o, &b| f(o, b))
            }
            (Operand::Array(a), Some(m)) => Zip::from(&mut out)
                .and(&block.view(a))
                .and(&block.view(m))
                .for_each(|o, &b, &keep| {
                    if keep {
                        f(o, b)
                    }
                }),
        }
        Ok(())
    })?;
    Ok(())
}

pub fn add<T: Arithmetic>(
    data: ArrayViewMutD<'_, T>,
    operand: &Operand<'_, T>,
    options: &BlockOptions<'_>,
) -> Result<()> {
    apply_operation(data, operand, Operation::Add, options)
}

pub fn subtract<T: Arithmetic>(
    data: ArrayViewMutD<'_, T>,
    operand: &Operand<'_, T>,
    options: &BlockOptions<'_>,
) -> Result<()> {
    apply_operation(data, operand, Operation::Subtract, options)
}

pub fn multiply<T: Arithmetic>(
    data: ArrayViewMutD<'_, T>,
    operand: &Operand<'_, T>,
    options: &BlockOptions<'_>,
) -> Result<()> {
    apply_operation(data, operand, Operation::Multiply, options)
}

pub fn divide<T: Arithmetic>(
    data: ArrayViewMutD<'_, T>,
    operand: &Operand<'_, T>,
    options: &BlockOptions<'_>,
) -> Result<()> {
    apply_operation(data, operand, Operation::Divide, options)
}

/// Write `input <cmp> operand` element-wise into `output`.
pub fn apply_comparison<T>(
    input: &ArrayViewD<'_, T>,
    operand: &Operand<'_, T>,
    comparison: Comparison,
    output: ArrayViewMutD<'_, bool>,
    options: &BlockOptions<'_>,
) -> Result<()>
where
    T: PartialOrd + Sync,
{
    let shape = input.shape();
    operand.check_shape(shape)?;
    check_same_shape("output", output.shape(), shape)?;
    let grid = options.grid(shape)?;
    let executor = options.executor()?;
    let mask = options.mask_for(shape)?;
    info!(
        comparison = comparison.as_str(),
        shape = ?shape,
        blocks = grid.len(),
        "applying element-wise comparison"
    );

    executor.run_mut(&grid, output, |block, mut out| {
        compare_block(block, input, operand, comparison, mask.as_ref(), &mut out);
        Ok(())
    })?;
    Ok(())
}

fn compare_block<T: PartialOrd>(
    block: &Block,
    input: &ArrayViewD<'_, T>,
    operand: &Operand<'_, T>,
    comparison: Comparison,
    mask: Option<&ArrayViewD<'_, bool>>,
    out: &mut ArrayViewMutD<'_, bool>,
) {
    let left = block.view(input);
    match (operand, mask) {
        (Operand::Scalar(s), None) => Zip::from(out)
            .and(&left)
            .for_each(|o, a| *o = comparison.apply(a, s)),
        (Operand::Scalar(s), Some(m)) => Zip::from(out)
            .and(&left)
            .and(&block.view(m))
            .for_each(|o, a, &keep| {
                if keep {
                    *o = comparison.apply(a, s);
                }
            }),
        (Operand::Array(b), None) => Zip::from(out)
            .and(&left)
            .and(&block.view(b))
            .for_each(|o, a, b| *o = comparison.apply(a, b)),
        (Operand::Array(b), Some(m)) => Zip::from(out)
            .and(&left)
            .and(&block.view(b))
            .and(&block.view(m))
            .for_each(|o, a, b, &keep| {
                if keep {
                    *o = comparison.apply(a, b);
                }
            }),
    }
}

pub fn greater<T: PartialOrd + Sync>(
    input: &ArrayViewD<'_, T>,
    operand: &Operand<'_, T>,
    output: ArrayViewMutD<'_, bool>,
    options: &BlockOptions<'_>,
) -> Result<()> {
    apply_comparison(input, operand, Comparison::Greater, output, options)
}

pub fn greater_equal<T: PartialOrd + Sync>(
    input: &ArrayViewD<'_, T>,
    operand: &Operand<'_, T>,
    output: ArrayViewMutD<'_, bool>,
    options: &BlockOptions<'_>,
) -> Result<()> {
    apply_comparison(input, operand, Comparison::GreaterEqual, output, options)
}

pub fn less<T: PartialOrd + Sync>(
    input: &ArrayViewD<'_, T>,
    operand: &Operand<'_, T>,
    output: ArrayViewMutD<'_, bool>,
    options: &BlockOptions<'_>,
) -> Result<()> {
    apply_comparison(input, operand, Comparison::Less, output, options)
}

pub fn less_equal<T: PartialOrd + Sync>(
    input: &ArrayViewD<'_, T>,
    operand: &Operand<'_, T>,
    output: ArrayViewMutD<'_, bool>,
    options: &BlockOptions<'_>,
) -> Result<()> {
    apply_comparison(input, operand, Comparison::LessEqual, output, options)
}
