//! Pooling policies.
//!
//! Each [`PoolType`] pairs a forward row reduction with the gradient
//! distribution that undoes it:
//!
//! | Policy    | reduce                 | distribute                                  |
//! |-----------|------------------------|---------------------------------------------|
//! | `AVERAGE` | mean of rows           | `dy / h` broadcast to every row             |
//! | `SUM`     | sum of rows            | `dy` broadcast to every row                 |
//! | `SQRT`    | `sum / sqrt(h)`        | `dy / sqrt(h)` broadcast to every row       |
//! | `MAX`     | column-wise maximum    | `dy[c]` at the arg-max row of column `c`    |
//! | `LAST`    | row `h - 1`            | `dy` at row `h - 1`                         |
//! | `FIRST`   | row `0`                | `dy` at row `0`                             |
//!
//! `MAX`, `LAST` and `FIRST` only write a subset of the gradient rows; the
//! engines zero the gradient buffer before calling [`PoolType::distribute`]
//! for those policies.

use core::fmt;
use core::str::FromStr;

use crate::error::PoolError;
use crate::tensors::Element;

/// How a sequence of rows collapses into one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolType {
    /// Arithmetic mean of the rows.
    Average,
    /// Sum of the rows.
    Sum,
    /// Sum of the rows scaled by `1 / sqrt(h)`.
    Sqrt,
    /// Column-wise maximum; the first maximal row wins ties.
    Max,
    /// The last row.
    Last,
    /// The first row.
    First,
}

impl PoolType {
    /// Every policy, in attribute order.
    pub const ALL: [Self; 6] = [
        Self::Average,
        Self::Sum,
        Self::Sqrt,
        Self::Max,
        Self::Last,
        Self::First,
    ];

    /// The attribute name of this policy.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Average => "AVERAGE",
            Self::Sum => "SUM",
            Self::Sqrt => "SQRT",
            Self::Max => "MAX",
            Self::Last => "LAST",
            Self::First => "FIRST",
        }
    }

    /// Whether backward leaves some rows of each sequence untouched, so the
    /// gradient buffer has to be zeroed first.
    pub const fn writes_subset(self) -> bool {
        matches!(self, Self::Max | Self::Last | Self::First)
    }

    /// Reduces `rows` into `out` (length `rows.width()`).
    pub fn reduce<T: Element>(self, rows: Rows<'_, T>, out: &mut [T]) {
        debug_assert_eq!(out.len(), rows.width());
        match self {
            Self::Sum => sum_rows(rows, out),
            Self::Average => {
                sum_rows(rows, out);
                let h = T::from_usize(rows.height());
                out.iter_mut().for_each(|y| *y = *y / h);
            }
            Self::Sqrt => {
                sum_rows(rows, out);
                let h = T::from_usize(rows.height()).sqrt();
                out.iter_mut().for_each(|y| *y = *y / h);
            }
            Self::Max => {
                for (col, y) in out.iter_mut().enumerate() {
                    *y = column_max(rows, col).1;
                }
            }
            Self::Last => out.copy_from_slice(rows.row(rows.height() - 1)),
            Self::First => out.copy_from_slice(rows.row(0)),
        }
    }

    /// Writes the gradient of one sequence into `grad`.
    ///
    /// `input` is the sequence's forward input and fixes `h` and `w`; only
    /// `MAX` reads its values. `grad` must hold `h * w` elements and, for the
    /// subset-writing policies, already be zero.
    pub fn distribute<T: Element>(self, out_grad: &[T], input: Rows<'_, T>, grad: &mut [T]) {
        let (h, w) = (input.height(), input.width());
        debug_assert_eq!(out_grad.len(), w);
        debug_assert_eq!(grad.len(), h * w);
        match self {
            Self::Sum => broadcast(out_grad, h, grad, |dy| dy),
            Self::Average => {
                let n = T::from_usize(h);
                broadcast(out_grad, h, grad, |dy| dy / n);
            }
            Self::Sqrt => {
                let n = T::from_usize(h).sqrt();
                broadcast(out_grad, h, grad, |dy| dy / n);
            }
            Self::Max => {
                for (col, &dy) in out_grad.iter().enumerate() {
                    let (row, _) = column_max(input, col);
                    grad[row * w + col] = dy;
                }
            }
            Self::Last => grad[(h - 1) * w..h * w].copy_from_slice(out_grad),
            Self::First => grad[..w].copy_from_slice(out_grad),
        }
    }
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoolType {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|pool| pool.as_str() == s)
            .ok_or_else(|| PoolError::UnsupportedPoolType(s.to_owned()))
    }
}

/// Read-only `h x w` view over the rows of one sequence.
#[derive(Debug, Clone, Copy)]
pub struct Rows<'a, T> {
    data: &'a [T],
    height: usize,
    width: usize,
}

impl<'a, T> Rows<'a, T> {
    /// Views `data` as `height` rows of `width` elements.
    pub fn new(data: &'a [T], height: usize, width: usize) -> Self {
        debug_assert_eq!(data.len(), height * width);
        Self {
            data,
            height,
            width,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Row `r` as a contiguous slice.
    pub fn row(&self, r: usize) -> &'a [T] {
        &self.data[r * self.width..(r + 1) * self.width]
    }

    /// Column `c`, top to bottom.
    pub fn column(&self, c: usize) -> impl Iterator<Item = &'a T> + 'a {
        self.data[c..].iter().step_by(self.width).take(self.height)
    }
}

/// Maximum of column `col` and the first row holding it.
///
/// Shared by forward `MAX` and the backward arg-max recomputation so both
/// directions agree on ties.
pub fn column_max<T: Element>(rows: Rows<'_, T>, col: usize) -> (usize, T) {
    let mut column = rows.column(col).copied().enumerate();
    let Some(first) = column.next() else {
        return (0, T::ZERO);
    };
    column.fold(first, |best, (row, x)| if x > best.1 { (row, x) } else { best })
}

fn sum_rows<T: Element>(rows: Rows<'_, T>, out: &mut [T]) {
    out.fill(T::ZERO);
    for r in 0..rows.height() {
        for (acc, &x) in out.iter_mut().zip(rows.row(r)) {
            *acc += x;
        }
    }
}

fn broadcast<T: Element>(out_grad: &[T], h: usize, grad: &mut [T], f: impl Fn(T) -> T) {
    let w = out_grad.len();
    for r in 0..h {
        for (g, &dy) in grad[r * w..(r + 1) * w].iter_mut().zip(out_grad) {
            *g = f(dy);
        }
    }
}
