//! Sequence layout validation.
//!
//! Interprets the single-level offsets table of a [`LodTensor`] as a set of
//! row ranges over the packed input and checks that the ranges are usable
//! before any operator touches a buffer.

use core::ops::Range;

use crate::error::ShapeError;
use crate::tensors::LodTensor;

/// Validated view of how a packed input splits into sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceLayout<'a> {
    offsets: &'a [usize],
    batch_size: usize,
    feature_width: usize,
    total_rows: usize,
}

impl<'a> SequenceLayout<'a> {
    /// Builds the layout for `input`, rejecting anything the pooling kernels
    /// cannot handle.
    ///
    /// # Errors
    /// - [`ShapeError::LodLevels`] unless exactly one offsets table is present
    /// - [`ShapeError::ScalarInput`] for a rank-0 input
    /// - [`ShapeError::TooFewRows`] if the input has fewer rows than sequences
    /// - [`ShapeError::OffsetOutOfRange`] / [`ShapeError::DecreasingOffsets`]
    ///   for a malformed table
    /// - [`ShapeError::EmptySequence`] for any zero-length sequence
    /// - [`ShapeError::BufferShape`] if the input data does not fill its shape
    pub fn new<T>(input: &'a LodTensor<T>) -> Result<Self, ShapeError> {
        let value = &input.value;
        check_buffer(&value.shape, value.data.len())
            .and_then(|()| Self::from_parts(&value.shape, &input.lod))
            .inspect_err(|err| {
                tracing::debug!(target: "seqpool", %err, "rejected sequence layout");
            })
    }

    fn from_parts(shape: &[usize], lod: &'a [Vec<usize>]) -> Result<Self, ShapeError> {
        let [offsets] = lod else {
            return Err(ShapeError::LodLevels { levels: lod.len() });
        };
        let (&total_rows, feature_dims) = shape.split_first().ok_or(ShapeError::ScalarInput)?;

        // an empty table describes no sequences at all
        let batch_size = offsets.len().saturating_sub(1);
        if total_rows < batch_size {
            return Err(ShapeError::TooFewRows {
                rows: total_rows,
                batch: batch_size,
            });
        }

        for (index, &offset) in offsets.iter().enumerate() {
            if offset > total_rows {
                return Err(ShapeError::OffsetOutOfRange {
                    index,
                    offset,
                    rows: total_rows,
                });
            }
        }
        for (index, pair) in offsets.windows(2).enumerate() {
            if pair[0] > pair[1] {
                return Err(ShapeError::DecreasingOffsets {
                    index: index + 1,
                    prev: pair[0],
                    next: pair[1],
                });
            }
            if pair[0] == pair[1] {
                return Err(ShapeError::EmptySequence { index });
            }
        }

        // equals numel / rows for any well-formed tensor, and stays defined at rows == 0
        let feature_width = feature_dims.iter().product();

        Ok(Self {
            offsets,
            batch_size,
            feature_width,
            total_rows,
        })
    }

    /// Number of sequences in the batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Elements per row.
    pub fn feature_width(&self) -> usize {
        self.feature_width
    }

    /// Rows in the packed input.
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Rows of sequence `i`.
    pub fn rows(&self, i: usize) -> Range<usize> {
        self.offsets[i]..self.offsets[i + 1]
    }

    /// Flat element range of sequence `i` in the packed buffer.
    pub fn elems(&self, i: usize) -> Range<usize> {
        let rows = self.rows(i);
        rows.start * self.feature_width..rows.end * self.feature_width
    }

    /// Iterates sequence row ranges in order.
    pub fn sequences(&self) -> impl ExactSizeIterator<Item = Range<usize>> + 'a {
        self.offsets.windows(2).map(|pair| pair[0]..pair[1])
    }

    /// True when every input row belongs to some sequence.
    pub fn covers_all_rows(&self) -> bool {
        match (self.offsets.first(), self.offsets.last()) {
            (Some(&first), Some(&last)) => first == 0 && last == self.total_rows,
            _ => self.total_rows == 0,
        }
    }

    /// Shape of the pooled output: `input_shape` with the leading dimension
    /// replaced by the batch size.
    pub fn output_shape(&self, input_shape: &[usize]) -> Vec<usize> {
        let mut dims = input_shape.to_vec();
        dims[0] = self.batch_size;
        dims
    }
}

/// Checks that a flat buffer of `len` elements exactly fills `shape`.
///
/// # Errors
/// Returns [`ShapeError::BufferShape`] on a mismatch.
pub fn check_buffer(shape: &[usize], len: usize) -> Result<(), ShapeError> {
    if shape.iter().product::<usize>() == len {
        Ok(())
    } else {
        Err(ShapeError::BufferShape {
            expected: shape.to_vec(),
            got: vec![len],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensors::Tensor;

    fn packed(shape: Vec<usize>, lod: Vec<Vec<usize>>) -> LodTensor<f32> {
        let len = shape.iter().product();
        LodTensor::new(Tensor::new(shape, vec![0.0; len]), lod)
    }

    #[test]
    fn computes_batch_and_width() {
        let x = packed(vec![5, 2, 3], vec![vec![0, 2, 5]]);
        let layout = SequenceLayout::new(&x).unwrap();
        assert_eq!(layout.batch_size(), 2);
        assert_eq!(layout.feature_width(), 6);
        assert_eq!(layout.rows(1), 2..5);
        assert_eq!(layout.elems(1), 12..30);
        assert_eq!(layout.output_shape(&x.value.shape), vec![2, 2, 3]);
        assert!(layout.covers_all_rows());
    }

    #[test]
    fn rejects_nested_lod() {
        let x = packed(vec![4, 1], vec![vec![0, 2], vec![0, 1, 2, 4]]);
        assert_eq!(
            SequenceLayout::new(&x),
            Err(ShapeError::LodLevels { levels: 2 })
        );
        let x = packed(vec![4, 1], vec![]);
        assert_eq!(
            SequenceLayout::new(&x),
            Err(ShapeError::LodLevels { levels: 0 })
        );
    }

    #[test]
    fn rejects_fewer_rows_than_sequences() {
        let x = packed(vec![2, 1], vec![vec![0, 1, 2, 2]]);
        assert_eq!(
            SequenceLayout::new(&x),
            Err(ShapeError::TooFewRows { rows: 2, batch: 3 })
        );
    }

    #[test]
    fn rejects_malformed_offsets() {
        let x = packed(vec![4, 1], vec![vec![0, 5]]);
        assert_eq!(
            SequenceLayout::new(&x),
            Err(ShapeError::OffsetOutOfRange {
                index: 1,
                offset: 5,
                rows: 4
            })
        );

        let x = packed(vec![4, 1], vec![vec![0, 3, 2, 4]]);
        assert_eq!(
            SequenceLayout::new(&x),
            Err(ShapeError::DecreasingOffsets {
                index: 2,
                prev: 3,
                next: 2
            })
        );
    }

    #[test]
    fn rejects_empty_sequence() {
        let x = packed(vec![4, 1], vec![vec![0, 2, 2, 4]]);
        assert_eq!(
            SequenceLayout::new(&x),
            Err(ShapeError::EmptySequence { index: 1 })
        );
    }

    #[test]
    fn rejects_scalar_input() {
        let x = LodTensor::with_offsets(Tensor::new(Vec::<usize>::new(), vec![1.0f32]), vec![0]);
        assert_eq!(SequenceLayout::new(&x), Err(ShapeError::ScalarInput));
    }

    #[test]
    fn rejects_data_shorter_than_shape() {
        let x = LodTensor::with_offsets(Tensor { shape: vec![5, 1], data: vec![1.0f32, 3.0] }, vec![0, 2, 5]);
        assert_eq!(
            SequenceLayout::new(&x),
            Err(ShapeError::BufferShape {
                expected: vec![5, 1],
                got: vec![2]
            })
        );
    }

    #[test]
    fn empty_offsets_table_holds_no_sequences() {
        let x = LodTensor::with_offsets(Tensor::new(vec![3, 2], vec![0.0f32; 6]), Vec::<usize>::new());
        let layout = SequenceLayout::new(&x).unwrap();
        assert_eq!(layout.batch_size(), 0);
        assert_eq!(layout.total_rows(), 3);
        assert!(!layout.covers_all_rows());
        assert_eq!(layout.output_shape(&x.value.shape), vec![0, 2]);
    }

    #[test]
    fn offsets_need_not_span_the_whole_buffer() {
        let x = packed(vec![6, 1], vec![vec![1, 3, 4]]);
        let layout = SequenceLayout::new(&x).unwrap();
        assert_eq!(layout.batch_size(), 2);
        assert!(!layout.covers_all_rows());
        assert_eq!(layout.sequences().collect::<Vec<_>>(), vec![1..3, 3..4]);
    }
}
