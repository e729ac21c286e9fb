//! Parallel utilities with feature-gated implementations
//!
//! Frequency sweeps are embarrassingly parallel: every sample reads the same
//! immutable matrices and writes its own solution. The helper dispatches to
//! rayon when the `rayon` feature is enabled, with a sequential fallback.

/// Map over `0..count` in parallel, preserving order
#[cfg(feature = "rayon")]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    use rayon::prelude::*;
    (0..count).into_par_iter().map(f).collect()
}

/// Sequential map over `0..count` (fallback)
#[cfg(not(feature = "rayon"))]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    (0..count).map(f).collect()
}
