//! FFT plan caching and Hermitian spectrum construction.
//!
//! Phase randomization runs one forward and one inverse transform per
//! channel, typically at the same handful of sizes across thousands of
//! surrogate draws. Plans are therefore cached process-wide with LRU
//! eviction instead of being re-planned per call.
//!
//! The other half of this module is [`hermitian_spectrum`]: the index
//! algebra that mirrors a one-sided magnitude spectrum and anti-symmetrizes
//! a free-phase vector lives in exactly one place, with explicit endpoint
//! handling, so the surrogate pipeline never touches raw bin arithmetic.

use crate::errors::{SurrogateError, SurrogateResult};
use lru::LruCache;
use num_complex::Complex64;
use rustfft::FftPlanner;
use std::num::NonZeroUsize;
use std::sync::LazyLock;
use std::sync::{Arc, Mutex};

/// Cache key for FFT plans, distinguishing forward and inverse transforms
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct FftCacheKey {
    size: usize,
    is_forward: bool,
}

type FftPlanCache = LruCache<FftCacheKey, Arc<dyn rustfft::Fft<f64>>>;

/// Maximum number of cached plans
const MAX_CACHE_ENTRIES: usize = 1000;
/// Maximum FFT size accepted (2^20 points); larger requests are rejected
/// rather than allowed to allocate without bound.
const MAX_FFT_SIZE: usize = 1 << 20;

static FFT_CACHE: LazyLock<Mutex<FftPlanCache>> =
    LazyLock::new(|| Mutex::new(LruCache::new(NonZeroUsize::new(MAX_CACHE_ENTRIES).unwrap())));

fn get_cached_fft_plan(
    size: usize,
    is_forward: bool,
) -> SurrogateResult<Arc<dyn rustfft::Fft<f64>>> {
    if size == 0 || size > MAX_FFT_SIZE {
        return Err(SurrogateError::FftError { size });
    }

    let cache_key = FftCacheKey { size, is_forward };

    let mut cache = match FFT_CACHE.lock() {
        Ok(guard) => guard,
        // A poisoned cache still holds valid plans.
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(cached_fft) = cache.get(&cache_key) {
        return Ok(cached_fft.clone());
    }

    let mut planner = FftPlanner::new();
    let new_fft = if is_forward {
        planner.plan_fft_forward(size)
    } else {
        planner.plan_fft_inverse(size)
    };

    cache.put(cache_key, new_fft.clone());
    Ok(new_fft)
}

/// Get a cached forward FFT plan for the given size.
pub fn get_cached_fft_forward(
    size: usize,
) -> SurrogateResult<Arc<dyn rustfft::Fft<f64>>> {
    get_cached_fft_plan(size, true)
}

/// Get a cached inverse FFT plan for the given size.
///
/// rustfft inverse transforms are unnormalized; callers scale by `1/size`.
pub fn get_cached_fft_inverse(
    size: usize,
) -> SurrogateResult<Arc<dyn rustfft::Fft<f64>>> {
    get_cached_fft_plan(size, false)
}

/// Clear the FFT plan cache to free memory.
pub fn clear_fft_cache() {
    match FFT_CACHE.lock() {
        Ok(mut cache) => cache.clear(),
        Err(poisoned) => poisoned.into_inner().clear(),
    }
}

/// Current plan cache occupancy as `(forward_plans, inverse_plans)`.
pub fn get_fft_cache_stats() -> (usize, usize) {
    let cache = match FFT_CACHE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    let mut forward_count = 0;
    let mut inverse_count = 0;
    for (key, _) in cache.iter() {
        if key.is_forward {
            forward_count += 1;
        } else {
            inverse_count += 1;
        }
    }

    (forward_count, inverse_count)
}

/// Build a full even-length complex spectrum from a one-sided magnitude
/// spectrum and a free-phase vector, with conjugate (Hermitian) symmetry.
///
/// `one_sided_magnitudes` holds bins `0..=n2` of an even-length transform
/// (`n2` = Nyquist index), `free_phases` holds one angle per bin in
/// `1..n2`, and `nyquist_phase` is placed at bin `n2` unchanged. The result
/// has length `2*n2` with:
///
/// - bin 0: magnitude at phase 0 (real DC),
/// - bins `1..n2`: magnitudes at the free phases,
/// - bin `n2`: Nyquist magnitude at `nyquist_phase`,
/// - bins `n2+1..2*n2`: mirrored magnitudes at the negated, reversed free
///   phases (the conjugates of bins `n2-1..0`).
///
/// The symmetry makes the inverse transform of the result real-valued (up
/// to floating-point error) at length `2*n2`.
pub fn hermitian_spectrum(
    one_sided_magnitudes: &[f64],
    free_phases: &[f64],
    nyquist_phase: f64,
) -> SurrogateResult<Vec<Complex64>> {
    if one_sided_magnitudes.len() < 3 {
        return Err(SurrogateError::InvalidParameter {
            parameter: "one_sided_magnitudes".to_string(),
            value: one_sided_magnitudes.len() as f64,
            constraint: "at least 3 bins (DC, one free bin, Nyquist)".to_string(),
        });
    }
    let n2 = one_sided_magnitudes.len() - 1;
    if free_phases.len() != n2 - 1 {
        return Err(SurrogateError::InvalidParameter {
            parameter: "free_phases".to_string(),
            value: free_phases.len() as f64,
            constraint: format!("exactly {} angles for {} one-sided bins", n2 - 1, n2 + 1),
        });
    }

    let m = 2 * n2;
    let mut spectrum = Vec::with_capacity(m);

    spectrum.push(Complex64::from_polar(one_sided_magnitudes[0], 0.0));
    for k in 1..n2 {
        spectrum.push(Complex64::from_polar(
            one_sided_magnitudes[k],
            free_phases[k - 1],
        ));
    }
    spectrum.push(Complex64::from_polar(
        one_sided_magnitudes[n2],
        nyquist_phase,
    ));
    for k in (1..n2).rev() {
        spectrum.push(Complex64::from_polar(
            one_sided_magnitudes[k],
            -free_phases[k - 1],
        ));
    }

    debug_assert_eq!(spectrum.len(), m);
    Ok(spectrum)
}
