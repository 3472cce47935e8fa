//! Backend selection module.
//!
//! Chooses which engine runs the pooling kernels and provides functions to
//! set and get the current choice.
//!
//! # Supported Backends
//!
//! - `Parallel` — sequences are spread over the `rayon` thread pool (default).
//! - `Sequential` — sequences are processed in order on the calling thread.
//!
//! Both engines produce bit-identical results; every sequence is reduced by
//! the same code path regardless of which thread runs it.
//!
//! The backend is stored globally in an `AtomicU8` and read once per call.

use core::sync::atomic::{AtomicU8, Ordering};

/// Enumeration of the pooling engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Backend {
    /// Work-stealing parallelism across sequences via `rayon` (default).
    #[default]
    Parallel = 0,
    /// Single-threaded, in-order processing.
    Sequential,
}

impl TryFrom<u8> for Backend {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Parallel),
            1 => Ok(Self::Sequential),
            _ => Err(()),
        }
    }
}

/// Global state for the active backend.
///
/// The backend is expected to change rarely, never mid-call.
static GLOBAL_DEFAULT_BACKEND: AtomicU8 = AtomicU8::new(Backend::Parallel as u8);

/// Sets the engine used by subsequent pooling calls.
///
/// # Example
///
/// ```
/// use seqpool::backend::{set_backend, Backend};
/// set_backend(Backend::Sequential);
/// ```
pub fn set_backend(b: Backend) {
    GLOBAL_DEFAULT_BACKEND.store(b as u8, Ordering::Release);
}

/// Returns the currently active engine.
///
/// If the stored value is invalid, defaults to [`Backend::Parallel`].
pub fn get_backend() -> Backend {
    Backend::try_from(GLOBAL_DEFAULT_BACKEND.load(Ordering::Acquire)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_round_trip() {
        for b in [Backend::Parallel, Backend::Sequential] {
            assert_eq!(Backend::try_from(b as u8), Ok(b));
        }
        assert_eq!(Backend::try_from(7), Err(()));
    }
}
