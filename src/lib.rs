//! seqpool: sequence pooling over ragged batches, with manual backprop.
//!
//! A batch of variable-length sequences is packed row by row into one dense
//! tensor, and an offsets table marks where each sequence starts and ends.
//! Pooling collapses every sequence into a single row; the backward pass
//! spreads the output gradient back over the rows it came from.
//!
//! # Features
//!
//! - Six pooling policies: `AVERAGE`, `SUM`, `SQRT`, `MAX`, `LAST`, `FIRST`.
//! - Layout validation that fails before any buffer is written.
//! - `MAX` backward recomputes the arg-max rows instead of storing them.
//! - Sequential and `rayon`-parallel engines with identical results.
//!
//! # Modules
//!
//! - [`tensors`] — Dense and LoD tensor types.
//! - [`layout`] — Offsets table validation.
//! - [`policy`] — The reduce/distribute rule of each pooling policy.
//! - [`ops`] — Engines and the dispatch layer.
//! - [`backprop`] — Autograd-style entry points.
//! - [`backend`] — Engine selection.
//!
//! # Example
//!
//! ```rust
//! use seqpool::backprop::sequence_pool;
//! use seqpool::tensors::{LodTensor, Tensor};
//!
//! let x = LodTensor::with_offsets(
//!     Tensor::new(vec![5, 1], vec![1.0, 3.0, 2.0, 4.0, 6.0]),
//!     vec![0, 2, 5],
//! );
//! let (out, _back) = sequence_pool(&x, "SUM").unwrap();
//! assert_eq!(out.data, vec![4.0, 12.0]);
//! ```

pub mod approx;
pub mod backend;
pub mod backprop;
pub mod error;
pub mod layout;
pub mod ops;
pub mod policy;
pub mod tensors;

pub use error::{PoolError, PoolResult, ShapeError};
pub use policy::PoolType;
