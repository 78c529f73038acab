//! Uniform amplitude shuffling of multichannel time-series.
//!
//! The simplest surrogate family: sample order is randomly permuted, so each
//! channel keeps its amplitude distribution exactly (the output is a
//! reordering of the original values, never a resampling) while temporal
//! ordering and autocorrelation are destroyed. With `fixed_order` the same
//! permutation is applied to every channel, preserving any exact
//! relationship between channels at the same shuffled time index; without
//! it, each channel is permuted independently and cross-channel synchrony
//! is destroyed as well.

use crate::errors::{validate_input_matrix, SurrogateError, SurrogateResult};
use crate::secure_rng::{with_thread_local_rng, SecureRng};
use nalgebra::DMatrix;

#[cfg(feature = "parallel")]
use crate::secure_rng::{mix_seed, ThreadLocalRng};
#[cfg(feature = "parallel")]
use nalgebra::DVector;

/// Reorder the rows of a matrix by an explicit permutation.
///
/// `out[i, j] = x[permutation[i], j]` for every channel `j`. The
/// permutation must have exactly one entry per row, each a distinct
/// in-range index.
///
/// # Example
/// ```rust
/// use nalgebra::DMatrix;
/// use surrogate_series::permute_rows;
///
/// let x = DMatrix::from_column_slice(6, 1, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
/// let z = permute_rows(&x, &[3, 0, 4, 1, 5, 2]).unwrap();
/// assert_eq!(z.as_slice(), &[4.0, 1.0, 5.0, 2.0, 6.0, 3.0]);
/// ```
pub fn permute_rows(x: &DMatrix<f64>, permutation: &[usize]) -> SurrogateResult<DMatrix<f64>> {
    let t = x.nrows();
    if permutation.len() != t {
        return Err(SurrogateError::InvalidParameter {
            parameter: "permutation".to_string(),
            value: permutation.len() as f64,
            constraint: format!("exactly {} indices (one per row)", t),
        });
    }

    let mut seen = vec![false; t];
    for &p in permutation {
        if p >= t || seen[p] {
            return Err(SurrogateError::InvalidParameter {
                parameter: "permutation".to_string(),
                value: p as f64,
                constraint: format!("distinct indices in 0..{}", t),
            });
        }
        seen[p] = true;
    }

    let mut out = DMatrix::<f64>::zeros(t, x.ncols());
    for j in 0..x.ncols() {
        for (i, &p) in permutation.iter().enumerate() {
            out[(i, j)] = x[(p, j)];
        }
    }
    Ok(out)
}

/// Uniform shuffle surrogate using the thread-local random source.
///
/// See [`uniform_shuffle_with_rng`] for semantics. For reproducible output
/// either seed the process with [`crate::global_seed`] or use the
/// `_with_rng` variant with a seeded [`SecureRng`].
pub fn uniform_shuffle(x: &DMatrix<f64>, fixed_order: bool) -> SurrogateResult<DMatrix<f64>> {
    with_thread_local_rng(|rng| uniform_shuffle_with_rng(x, fixed_order, rng))
}

/// Uniform shuffle surrogate drawing from a caller-provided random source.
///
/// With `fixed_order` a single permutation of the sample indices is drawn
/// and applied to every channel; otherwise each channel is reordered by an
/// independently drawn permutation. A single-sample input succeeds
/// trivially (the only permutation is the identity).
///
/// # Errors
/// [`SurrogateError::InvalidInputShape`] for an empty matrix,
/// [`SurrogateError::NumericalError`] for non-finite input values.
pub fn uniform_shuffle_with_rng(
    x: &DMatrix<f64>,
    fixed_order: bool,
    rng: &mut SecureRng,
) -> SurrogateResult<DMatrix<f64>> {
    validate_input_matrix(x)?;
    let t = x.nrows();

    if fixed_order {
        let permutation = rng.permutation(t);
        return permute_rows(x, &permutation);
    }

    let mut out = DMatrix::<f64>::zeros(t, x.ncols());
    for j in 0..x.ncols() {
        let permutation = rng.permutation(t);
        for (i, &p) in permutation.iter().enumerate() {
            out[(i, j)] = x[(p, j)];
        }
    }
    Ok(out)
}

/// Channel-parallel uniform shuffle with deterministic per-channel seeding.
///
/// In free-order mode each channel's permutation is drawn from its own
/// generator seeded by `mix_seed(base, channel)`, so results are
/// bit-reproducible for a given `seed` regardless of worker scheduling. In
/// fixed-order mode the shared permutation is drawn once from the base
/// generator before fan-out and applied read-only by every worker. With
/// `seed: None` a base seed is taken from the thread-local source.
#[cfg(feature = "parallel")]
pub fn uniform_shuffle_seeded(
    x: &DMatrix<f64>,
    fixed_order: bool,
    seed: Option<u64>,
) -> SurrogateResult<DMatrix<f64>> {
    use rayon::prelude::*;

    validate_input_matrix(x)?;
    let t = x.nrows();
    let base = seed.unwrap_or_else(|| ThreadLocalRng::u64(0..u64::MAX));

    if fixed_order {
        let permutation = SecureRng::with_seed(base).permutation(t);
        let columns: Vec<DVector<f64>> = (0..x.ncols())
            .into_par_iter()
            .map(|j| DVector::from_iterator(t, permutation.iter().map(|&p| x[(p, j)])))
            .collect();
        return Ok(DMatrix::from_columns(&columns));
    }

    let columns: Vec<DVector<f64>> = (0..x.ncols())
        .into_par_iter()
        .map(|j| {
            let mut rng = SecureRng::with_seed(mix_seed(base, j));
            let permutation = rng.permutation(t);
            DVector::from_iterator(t, permutation.iter().map(|&p| x[(p, j)]))
        })
        .collect();
    Ok(DMatrix::from_columns(&columns))
}
