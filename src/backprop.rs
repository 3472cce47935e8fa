//! Differentiable sequence pooling.
//!
//! # Autograd Pattern
//!
//! [`sequence_pool`] follows the crate's manual backprop convention:
//! 1. **Inputs** are a packed [`LodTensor`] and the pooling attribute name.
//! 2. **Forward Pass** computes the pooled output tensor.
//! 3. **Backward Pass** is a closure borrowing the input (`MAX` needs it to
//!    recompute the arg-max rows) that maps `dL/d(out)` to `dL/d(input)`.
//!
//! The attribute name is resolved to a [`PoolType`] once, before any work,
//! so an unknown name fails without touching a buffer.
//!
//! For callers that own their buffers, [`sequence_pool_forward`] and
//! [`sequence_pool_backward`] write into tensors handed to them.
//!
//! # Example
//! ```rust
//! use seqpool::backprop::sequence_pool;
//! use seqpool::tensors::{LodTensor, Tensor};
//!
//! let x = LodTensor::with_offsets(Tensor::new(vec![3, 1], vec![1.0, 5.0, 2.0]), vec![0, 3]);
//! let (out, back) = sequence_pool(&x, "MAX").unwrap();
//! assert_eq!(out.data, vec![5.0]);
//!
//! let grad = back(&Tensor::new(vec![1, 1], vec![1.0])).unwrap();
//! assert_eq!(grad.data, vec![0.0, 1.0, 0.0]);
//! ```

use crate::error::PoolResult;
use crate::ops::dispatch;
use crate::policy::PoolType;
use crate::tensors::{Element, LodTensor, Tensor};

/// Backward closure returned by [`sequence_pool`].
pub type PoolBackward<'a, T> = dyn Fn(&Tensor<T>) -> PoolResult<Tensor<T>> + 'a;

/// Pools each sequence of `input` with the policy named `pooltype`.
///
/// # Returns
/// - `out`: Tensor of shape `[batch_size, ...]`.
/// - `back`: Closure mapping `dL/d(out)` to `dL/d(input)`.
///
/// # Errors
/// - [`PoolError::UnsupportedPoolType`](crate::error::PoolError::UnsupportedPoolType)
///   for an unknown `pooltype`
/// - [`PoolError::Shape`](crate::error::PoolError::Shape) for an invalid layout
pub fn sequence_pool<'a, T: Element>(
    input: &'a LodTensor<T>,
    pooltype: &str,
) -> PoolResult<(Tensor<T>, Box<PoolBackward<'a, T>>)> {
    let pool: PoolType = pooltype.parse()?;
    let mut out = Tensor::zeros(Vec::<usize>::new());
    dispatch::sequence_pool_forward(input, pool, &mut out)?;

    let back: Box<PoolBackward<'a, T>> = Box::new(move |out_grad: &Tensor<T>| -> PoolResult<Tensor<T>> {
        let mut in_grad = Tensor::zeros(Vec::<usize>::new());
        dispatch::sequence_pool_backward(input, out_grad, pool, &mut in_grad)?;
        Ok(in_grad)
    });

    Ok((out, back))
}

/// Forward pooling into a caller-owned `out`, keyed by attribute name.
///
/// # Errors
/// See [`sequence_pool`].
pub fn sequence_pool_forward<T: Element>(
    input: &LodTensor<T>,
    pooltype: &str,
    out: &mut Tensor<T>,
) -> PoolResult<()> {
    dispatch::sequence_pool_forward(input, pooltype.parse()?, out)
}

/// Backward pooling into a caller-owned `in_grad`, keyed by attribute name.
///
/// # Errors
/// See [`sequence_pool`]; additionally fails if `out_grad` is not shaped like
/// the forward output.
pub fn sequence_pool_backward<T: Element>(
    input: &LodTensor<T>,
    out_grad: &Tensor<T>,
    pooltype: &str,
    in_grad: &mut Tensor<T>,
) -> PoolResult<()> {
    dispatch::sequence_pool_backward(input, out_grad, pooltype.parse()?, in_grad)
}
