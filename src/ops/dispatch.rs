//! Operation Dispatch Layer
//!
//! Validates a pooling call once, then routes it to the engine selected by
//! the global [`Backend`].
//!
//! Every check (layout, gradient shape, buffer length) runs before any buffer is written,
//! so a failing call leaves `out` and `in_grad` exactly as they were.
//!
//! # Example
//! ```rust
//! use seqpool::ops::dispatch::sequence_pool_forward;
//! use seqpool::policy::PoolType;
//! use seqpool::tensors::{LodTensor, Tensor};
//!
//! let x = LodTensor::with_offsets(Tensor::new(vec![3, 1], vec![1.0, 5.0, 2.0]), vec![0, 3]);
//! let mut out = Tensor::zeros(vec![0, 1]);
//! sequence_pool_forward(&x, PoolType::Max, &mut out).unwrap();
//! assert_eq!(out.data, vec![5.0]);
//! ```

use crate::backend::{get_backend, Backend};
use crate::error::{PoolResult, ShapeError};
use crate::layout::{check_buffer, SequenceLayout};
use crate::policy::PoolType;
use crate::tensors::{Element, LodTensor, Tensor};

/// Runs the forward pooling on the active backend.
///
/// `out` is reshaped to `[batch_size, ...]` (the input shape with its leading
/// dimension replaced) and every element is overwritten.
///
/// # Errors
/// Returns a [`ShapeError`] if the input layout is invalid.
pub fn sequence_pool_forward<T: Element>(
    input: &LodTensor<T>,
    pool: PoolType,
    out: &mut Tensor<T>,
) -> PoolResult<()> {
    forward_on(get_backend(), input, pool, out)
}

/// Runs the backward pooling on the active backend.
///
/// `in_grad` is reshaped to the input shape. For `MAX`, `LAST` and `FIRST`,
/// and whenever the offsets leave rows uncovered, it is zero-filled before
/// any sequence is written.
///
/// # Errors
/// Returns a [`ShapeError`] if the input layout is invalid, or if `out_grad`
/// is not shaped like the forward output or its data does not fill that shape.
pub fn sequence_pool_backward<T: Element>(
    input: &LodTensor<T>,
    out_grad: &Tensor<T>,
    pool: PoolType,
    in_grad: &mut Tensor<T>,
) -> PoolResult<()> {
    backward_on(get_backend(), input, out_grad, pool, in_grad)
}

/// [`sequence_pool_forward`] on an explicit backend.
///
/// # Errors
/// See [`sequence_pool_forward`].
pub fn forward_on<T: Element>(
    backend: Backend,
    input: &LodTensor<T>,
    pool: PoolType,
    out: &mut Tensor<T>,
) -> PoolResult<()> {
    let layout = SequenceLayout::new(input)?;
    tracing::debug!(
        target: "seqpool",
        %pool,
        rows = layout.total_rows(),
        batch = layout.batch_size(),
        width = layout.feature_width(),
        ?backend,
        "sequence pool forward"
    );

    out.resize(layout.output_shape(&input.value.shape));
    if layout.feature_width() == 0 {
        return Ok(());
    }

    match backend {
        Backend::Sequential => super::cpu::forward(&layout, pool, &input.value.data, &mut out.data),
        Backend::Parallel => super::par::forward(&layout, pool, &input.value.data, &mut out.data),
    }
    Ok(())
}

/// [`sequence_pool_backward`] on an explicit backend.
///
/// # Errors
/// See [`sequence_pool_backward`].
pub fn backward_on<T: Element>(
    backend: Backend,
    input: &LodTensor<T>,
    out_grad: &Tensor<T>,
    pool: PoolType,
    in_grad: &mut Tensor<T>,
) -> PoolResult<()> {
    let layout = SequenceLayout::new(input)?;
    let expected = layout.output_shape(&input.value.shape);
    if out_grad.shape != expected {
        tracing::debug!(target: "seqpool", got = ?out_grad.shape, ?expected, "rejected output gradient");
        return Err(ShapeError::GradientShape {
            expected,
            got: out_grad.shape.clone(),
        }
        .into());
    }
    check_buffer(&out_grad.shape, out_grad.numel()).inspect_err(|err| {
        tracing::debug!(target: "seqpool", %err, "rejected output gradient");
    })?;
    tracing::debug!(
        target: "seqpool",
        %pool,
        rows = layout.total_rows(),
        batch = layout.batch_size(),
        width = layout.feature_width(),
        ?backend,
        "sequence pool backward"
    );

    in_grad.resize(input.value.shape.clone());
    if pool.writes_subset() || !layout.covers_all_rows() {
        tracing::trace!(target: "seqpool", len = in_grad.numel(), "zero-filling input gradient");
        match backend {
            Backend::Sequential => super::cpu::set_constant(&mut in_grad.data, T::ZERO),
            Backend::Parallel => super::par::set_constant(&mut in_grad.data, T::ZERO),
        }
    }
    if layout.feature_width() == 0 {
        return Ok(());
    }

    let (x, dy) = (&input.value.data, &out_grad.data);
    match backend {
        Backend::Sequential => super::cpu::backward(&layout, pool, x, dy, &mut in_grad.data),
        Backend::Parallel => super::par::backward(&layout, pool, x, dy, &mut in_grad.data),
    }
    Ok(())
}
