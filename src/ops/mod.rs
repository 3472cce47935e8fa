//! # Operation Dispatch Layer
//!
//! Sequence pooling kernels and the layer that routes calls to them.
//!
//! ## Submodules
//!
//! - [`cpu`] — sequential engine, one sequence after another
//! - [`par`] — `rayon` engine, one task per sequence
//! - [`dispatch`] — validation, gradient zero fill and backend switching
//!
//! ## Extending the Backend
//!
//! To add an engine:
//!
//! 1. Implement `forward`, `backward` and `set_constant` over a validated
//!    [`SequenceLayout`](crate::layout::SequenceLayout)
//! 2. Add a [`Backend`](crate::backend::Backend) variant and route it in `dispatch`
//! 3. Keep shape checks in `dispatch`, never in the engines
//!
//! ## Notes
//!
//! - Engines assume a non-zero feature width; `dispatch` short-circuits the
//!   zero-width case
//! - Both engines call the same per-sequence code in [`policy`](crate::policy),
//!   so their results are bit-identical

pub mod dispatch;

pub mod cpu;
pub mod par;
