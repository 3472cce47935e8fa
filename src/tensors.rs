//! Core tensor data structures.
//!
//! # Packed Sequence Tensors
//!
//! A [`Tensor`] is a dense, row-major buffer with an explicit shape. A
//! [`LodTensor`] pairs such a buffer with a level-of-detail (LoD) table: a
//! list of offset vectors where each vector partitions the leading dimension
//! into variable-length sequences. Sequence `i` of a level covers the rows
//! `[offsets[i], offsets[i + 1])`.
//!
//! ## Design Highlights
//! - Tensors are generic over an [`Element`] float (`f32` or `f64`)
//! - Shape is stored as a `Vec<usize>` and enforced at construction
//! - Everything after the leading dimension is treated as one flat feature row
//! - The `tensor!` macro builds tensors from nested array literals
//!
//! ## Example
//!
//! ```rust
//! use seqpool::tensors::{LodTensor, Tensor};
//! let t = Tensor::new(vec![5, 1], vec![1.0, 3.0, 2.0, 4.0, 6.0]);
//! let x = LodTensor::with_offsets(t, vec![0, 2, 5]);
//! assert_eq!(x.lod, vec![vec![0, 2, 5]]);
//! ```

use core::fmt::Debug;
use core::ops::{Add, AddAssign, Div};

use crate::error::ShapeError;
use crate::layout::check_buffer;

/// Floating point element stored in a pooled tensor.
///
/// Implemented for `f32` and `f64`.
pub trait Element:
    Copy
    + Debug
    + Default
    + PartialOrd
    + Send
    + Sync
    + Add<Output = Self>
    + AddAssign
    + Div<Output = Self>
    + 'static
{
    /// Additive identity.
    const ZERO: Self;

    /// Converts a row count into the element type.
    fn from_usize(n: usize) -> Self;

    /// Square root.
    fn sqrt(self) -> Self;
}

impl Element for f32 {
    const ZERO: Self = 0.0;

    #[allow(clippy::cast_precision_loss)]
    fn from_usize(n: usize) -> Self {
        n as Self
    }

    fn sqrt(self) -> Self {
        Self::sqrt(self)
    }
}

impl Element for f64 {
    const ZERO: Self = 0.0;

    #[allow(clippy::cast_precision_loss)]
    fn from_usize(n: usize) -> Self {
        n as Self
    }

    fn sqrt(self) -> Self {
        Self::sqrt(self)
    }
}

/// Represents an N-dimensional tensor with a shape and flat row-major data.
///
/// - `shape` defines the structure, e.g. `[5, 3]` for five rows of width three.
/// - `data` holds the flattened content in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    pub shape: Vec<usize>,
    pub data: Vec<T>,
}

impl<T> Tensor<T> {
    /// Creates a new tensor with the given shape and flat data.
    ///
    /// # Panics
    /// Panics if the number of elements in `data` does not match the shape product.
    pub fn new(shape: impl Into<Vec<usize>>, data: Vec<T>) -> Self {
        let shape = shape.into();
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape {:?} is incompatible with {} data elements",
            shape,
            data.len()
        );
        Self { shape, data }
    }

    /// Fallible form of [`Tensor::new`].
    ///
    /// # Errors
    /// Returns [`ShapeError::BufferShape`] if `data` does not fill `shape` exactly.
    pub fn try_new(shape: impl Into<Vec<usize>>, data: Vec<T>) -> Result<Self, ShapeError> {
        let shape = shape.into();
        check_buffer(&shape, data.len())?;
        Ok(Self { shape, data })
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Size of the leading dimension, or `None` for a scalar.
    pub fn rows(&self) -> Option<usize> {
        self.shape.first().copied()
    }
}

impl<T: Element> Tensor<T> {
    /// Creates a zero-filled tensor.
    pub fn zeros(shape: impl Into<Vec<usize>>) -> Self {
        let shape = shape.into();
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![T::ZERO; len],
        }
    }

    /// Reshapes in place to `shape`, reusing the allocation where possible.
    ///
    /// Existing values are kept up to the new length; new slots are zero.
    pub fn resize(&mut self, shape: impl Into<Vec<usize>>) {
        self.shape = shape.into();
        let len = self.shape.iter().product();
        self.data.resize(len, T::ZERO);
    }
}

/// A tensor whose leading dimension is partitioned into sequences.
///
/// `lod` holds one offset table per nesting level. The pooling operators
/// accept exactly one level.
#[derive(Debug, Clone, PartialEq)]
pub struct LodTensor<T> {
    pub value: Tensor<T>,
    pub lod: Vec<Vec<usize>>,
}

impl<T> LodTensor<T> {
    /// Wraps `value` with an explicit (possibly multi-level) LoD table.
    pub fn new(value: Tensor<T>, lod: Vec<Vec<usize>>) -> Self {
        Self { value, lod }
    }

    /// Wraps `value` with a single level of sequence offsets.
    pub fn with_offsets(value: Tensor<T>, offsets: impl Into<Vec<usize>>) -> Self {
        Self {
            value,
            lod: vec![offsets.into()],
        }
    }
}

/// Defines a tensor from nested literal arrays.
///
/// Supports arbitrary dimensionality as long as sublists are uniform in shape.
///
/// # Example
/// ```
/// use seqpool::tensor;
/// let t = tensor!([[1.0, 2.0], [3.0, 4.0]]);
/// assert_eq!(t.shape, vec![2, 2]);
/// ```
#[macro_export]
macro_rules! tensor {
    ($lit:literal) => {
        $crate::tensors::Tensor::new(Vec::<usize>::new(), vec![$lit])
    };

    ([ $( $inner:tt ),+ $(,)? ]) => {{
        let children = vec![ $( $crate::tensor!($inner) ),+ ];
        let first_shape = children[0].shape.clone();
        assert!(children.iter().all(|c| c.shape == first_shape),
            "ragged tensor literal (rows have mismatched shapes)");
        let mut shape = vec![children.len()];
        shape.extend_from_slice(&first_shape);
        let mut data = Vec::with_capacity(children.len() * children[0].data.len());
        for c in children { data.extend(c.data); }
        $crate::tensors::Tensor::new(shape, data)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_rejects_short_data() {
        let err = Tensor::try_new(vec![2, 2], vec![1.0f32, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            ShapeError::BufferShape {
                expected: vec![2, 2],
                got: vec![3]
            }
        );
    }

    #[test]
    fn resize_changes_leading_dimension_only() {
        let mut t = Tensor::<f64>::zeros(vec![0, 2, 3]);
        t.resize(vec![4, 2, 3]);
        assert_eq!(t.shape, vec![4, 2, 3]);
        assert_eq!(t.numel(), 24);
        assert!(t.data.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn macro_builds_nested_shape() {
        let t = tensor!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(t.shape, vec![2, 3]);
        assert_eq!(t.rows(), Some(2));
    }
}
