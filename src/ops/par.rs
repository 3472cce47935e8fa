//! Parallel CPU engine.
//!
//! Sequences are independent: each one reads only its own input rows and
//! writes only its own output row or gradient rows. This engine hands those
//! disjoint pieces to [`rayon`](https://docs.rs/rayon) workers.
//!
//! The gradient zero fill happens in [`set_constant`] before [`backward`]
//! starts, so no worker ever races the fill.

use rayon::prelude::*;

use crate::layout::SequenceLayout;
use crate::policy::{PoolType, Rows};
use crate::tensors::Element;

/// Fills `buf` with `value` in parallel.
pub fn set_constant<T: Element>(buf: &mut [T], value: T) {
    buf.par_iter_mut().for_each(|x| *x = value);
}

/// Pools every sequence of `input` into one row of `out`, one task per
/// output row.
///
/// `layout.feature_width()` must be non-zero.
pub fn forward<T: Element>(layout: &SequenceLayout<'_>, pool: PoolType, input: &[T], out: &mut [T]) {
    let w = layout.feature_width();
    out.par_chunks_mut(w).enumerate().for_each(|(i, y)| {
        let x = Rows::new(&input[layout.elems(i)], layout.rows(i).len(), w);
        pool.reduce(x, y);
    });
}

/// Distributes `out_grad` back over the rows of every sequence, one task per
/// sequence.
///
/// `layout.feature_width()` must be non-zero, and for subset-writing
/// policies `in_grad` must already be zero.
pub fn backward<T: Element>(
    layout: &SequenceLayout<'_>,
    pool: PoolType,
    input: &[T],
    out_grad: &[T],
    in_grad: &mut [T],
) {
    let w = layout.feature_width();
    split_sequences(layout, in_grad)
        .into_par_iter()
        .zip(out_grad.par_chunks(w))
        .enumerate()
        .for_each(|(i, (grad, dy))| {
            let x = Rows::new(&input[layout.elems(i)], layout.rows(i).len(), w);
            pool.distribute(dy, x, grad);
        });
}

/// Cuts `buf` into one mutable slice per sequence. Rows before, between or
/// after the sequences are skipped.
fn split_sequences<'g, T>(layout: &SequenceLayout<'_>, mut buf: &'g mut [T]) -> Vec<&'g mut [T]> {
    let mut pieces = Vec::with_capacity(layout.batch_size());
    let mut consumed = 0;
    for i in 0..layout.batch_size() {
        let elems = layout.elems(i);
        let rest = core::mem::take(&mut buf);
        let (_, rest) = rest.split_at_mut(elems.start - consumed);
        let (piece, rest) = rest.split_at_mut(elems.len());
        pieces.push(piece);
        buf = rest;
        consumed = elems.end;
    }
    pieces
}
