//! Sequential CPU engine.
//!
//! Processes sequences one after another on the calling thread. Used when
//! [`Backend::Sequential`](crate::backend::Backend::Sequential) is selected,
//! and as the reference the parallel engine is tested against.
//!
//! Callers (the dispatch layer) validate the layout and buffer sizes first;
//! the kernels here index without further checks.

use crate::layout::SequenceLayout;
use crate::policy::{PoolType, Rows};
use crate::tensors::Element;

/// Fills `buf` with `value`.
pub fn set_constant<T: Element>(buf: &mut [T], value: T) {
    buf.fill(value);
}

/// Pools every sequence of `input` into one row of `out`.
///
/// `out` holds `batch_size * feature_width` elements.
pub fn forward<T: Element>(layout: &SequenceLayout<'_>, pool: PoolType, input: &[T], out: &mut [T]) {
    let w = layout.feature_width();
    for (i, rows) in layout.sequences().enumerate() {
        let x = Rows::new(&input[layout.elems(i)], rows.len(), w);
        pool.reduce(x, &mut out[i * w..(i + 1) * w]);
    }
}

/// Distributes `out_grad` back over the rows of every sequence.
///
/// For subset-writing policies `in_grad` must already be zero.
pub fn backward<T: Element>(
    layout: &SequenceLayout<'_>,
    pool: PoolType,
    input: &[T],
    out_grad: &[T],
    in_grad: &mut [T],
) {
    let w = layout.feature_width();
    for (i, rows) in layout.sequences().enumerate() {
        let elems = layout.elems(i);
        let x = Rows::new(&input[elems.clone()], rows.len(), w);
        pool.distribute(&out_grad[i * w..(i + 1) * w], x, &mut in_grad[elems]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensors::{LodTensor, Tensor};

    #[test]
    fn forward_pools_each_sequence() {
        let x = LodTensor::with_offsets(
            Tensor::new(vec![5, 1], vec![1.0f32, 3.0, 2.0, 4.0, 6.0]),
            vec![0, 2, 5],
        );
        let layout = SequenceLayout::new(&x).unwrap();
        let mut out = [0.0f32; 2];

        forward(&layout, PoolType::Sum, &x.value.data, &mut out);
        assert_eq!(out, [4.0, 12.0]);
        forward(&layout, PoolType::Average, &x.value.data, &mut out);
        assert_eq!(out, [2.0, 4.0]);
        forward(&layout, PoolType::Max, &x.value.data, &mut out);
        assert_eq!(out, [3.0, 6.0]);
    }

    #[test]
    fn backward_skips_rows_outside_sequences() {
        let x = LodTensor::with_offsets(
            Tensor::new(vec![4, 1], vec![9.0f64, 1.0, 2.0, 9.0]),
            vec![1, 3],
        );
        let layout = SequenceLayout::new(&x).unwrap();
        let mut grad = [0.0; 4];

        backward(&layout, PoolType::Sum, &x.value.data, &[2.0], &mut grad);
        assert_eq!(grad, [0.0, 2.0, 2.0, 0.0]);
    }
}
