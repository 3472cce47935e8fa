//! Approximate equality of pooled values.
//!
//! Pooling divides by `h` or `sqrt(h)`, so results are compared against
//! hand-computed expectations within a tolerance grade rather than exactly.

/// The max epsilon accepted on `f32`s.
pub const F32_MAX_ERROR: f32 = 1e-3;

/// The expected epsilon on `f32`s.
pub const F32_AVG_ERROR: f32 = 1e-5;

/// The best expected epsilon on `f32`s.
pub const F32_MIN_ERROR: f32 = 1e-6;

/// The max epsilon accepted on `f64`s.
pub const F64_MAX_ERROR: f64 = 1e-3;

/// The expected epsilon on `f64`s.
pub const F64_AVG_ERROR: f64 = 1e-6;

/// The best expected epsilon on `f64`s.
pub const F64_MIN_ERROR: f64 = 1e-13;

/// The approximated equality enumerated, best first.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ApproxEquality {
    /// Very strong epsilon.
    Precise = 0,
    /// Good epsilon.
    Partial = 1,
    /// Acceptable epsilon.
    Relative = 2,
    /// No relative equality.
    Scarce = 3,
}

/// Grades the distance between two values.
pub trait RelativeEq<Rhs: ?Sized> {
    /// Enumerates the equality of `self` and `rhs`.
    fn approx_eq(&self, rhs: &Rhs) -> ApproxEquality;
}

macro_rules! impl_relative_eq {
    ($t:ty, $min:expr, $avg:expr, $max:expr) => {
        impl RelativeEq<Self> for $t {
            fn approx_eq(&self, rhs: &Self) -> ApproxEquality {
                let dif = (self - rhs).abs();
                if dif < $min {
                    ApproxEquality::Precise
                } else if dif < $avg {
                    ApproxEquality::Partial
                } else if dif < $max {
                    ApproxEquality::Relative
                } else {
                    ApproxEquality::Scarce
                }
            }
        }
    };
}

impl_relative_eq!(f32, F32_MIN_ERROR, F32_AVG_ERROR, F32_MAX_ERROR);
impl_relative_eq!(f64, F64_MIN_ERROR, F64_AVG_ERROR, F64_MAX_ERROR);

/// Slices grade as their worst element; a length mismatch is `Scarce`.
impl<T: RelativeEq<U>, U> RelativeEq<[U]> for [T] {
    fn approx_eq(&self, rhs: &[U]) -> ApproxEquality {
        if self.len() != rhs.len() {
            return ApproxEquality::Scarce;
        }
        let mut eq = ApproxEquality::Precise;
        for (t_val, u_val) in self.iter().zip(rhs) {
            eq = eq.max(t_val.approx_eq(u_val));
            if eq == ApproxEquality::Scarce {
                break;
            }
        }
        eq
    }
}

/// True when `a` and `b` agree at least to the `Relative` grade.
pub fn approx_eq<A: RelativeEq<B> + ?Sized, B: ?Sized>(a: &A, b: &B) -> bool {
    a.approx_eq(b) <= ApproxEquality::Relative
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grades_by_worst_element() {
        let a = [1.0f64, 2.0, 3.0];
        assert_eq!(a[..].approx_eq(&[1.0, 2.0, 3.0][..]), ApproxEquality::Precise);
        assert_eq!(a[..].approx_eq(&[1.0, 2.0000001, 3.0][..]), ApproxEquality::Partial);
        assert_eq!(a[..].approx_eq(&[1.5, 2.0, 3.0][..]), ApproxEquality::Scarce);
        assert!(!approx_eq(&a[..], &[1.0, 2.0][..]));
        assert!(approx_eq(&0.3333f32, &(1.0 / 3.0)));
    }
}
