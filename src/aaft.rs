//! Amplitude-Adjusted Fourier Transform (AAFT) surrogates.
//!
//! AAFT surrogates preserve a channel's amplitude distribution exactly and
//! its power spectrum approximately, while randomizing phase relationships.
//! Per channel the pipeline is: rank-match a Gaussian white-noise series to
//! the channel's value ranks, randomize its phases in the frequency domain
//! under Hermitian symmetry, then re-impose the channel's exact original
//! values according to the phase-randomized series' ranks. The output is a
//! spectrum-aware permutation of each channel: a reordering, never a
//! resampling.
//!
//! The exactness tradeoff is inherent to the method: the final
//! rank re-imposition restores the amplitude distribution exactly at the
//! cost of making spectrum preservation approximate.

use crate::errors::{validate_channel_length, validate_input_matrix, SurrogateResult};
use crate::fft_ops::{get_cached_fft_forward, get_cached_fft_inverse, hermitian_spectrum};
use crate::math_utils::{argsort, inverse_permutation, ranks, sample_std, sort_f64_slice};
use crate::secure_rng::{with_thread_local_rng, SecureRng};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

#[cfg(feature = "parallel")]
use crate::secure_rng::{mix_seed, ThreadLocalRng};

/// Minimum channel length for AAFT generation.
///
/// Below 4 samples the even-length transform has no free phase bin and the
/// Nyquist indexing degenerates.
pub const MIN_AAFT_SAMPLES: usize = 4;

/// AAFT surrogate using the thread-local random source.
///
/// See [`fourier_constrained_shuffle_with_rng`] for semantics. For
/// reproducible output either seed the process with [`crate::global_seed`]
/// or use the `_with_rng` variant with a seeded [`SecureRng`].
pub fn fourier_constrained_shuffle(
    x: &DMatrix<f64>,
    fixed_phase: bool,
) -> SurrogateResult<DMatrix<f64>> {
    with_thread_local_rng(|rng| fourier_constrained_shuffle_with_rng(x, fixed_phase, rng))
}

/// AAFT surrogate drawing from a caller-provided random source.
///
/// Channels are processed independently. With `fixed_phase` the free-phase
/// vector is drawn once, before any channel is processed, and reused for
/// every channel, so randomized phase relationships line up across
/// channels within the call. Otherwise each channel draws a fresh phase
/// vector immediately before its noise series.
///
/// Each output channel is a permutation of that channel's original values.
///
/// # Errors
/// [`crate::SurrogateError::InvalidInputShape`] for an empty matrix,
/// [`crate::SurrogateError::InsufficientSamples`] for fewer than
/// [`MIN_AAFT_SAMPLES`] rows, [`crate::SurrogateError::NumericalError`]
/// for non-finite input values.
pub fn fourier_constrained_shuffle_with_rng(
    x: &DMatrix<f64>,
    fixed_phase: bool,
    rng: &mut SecureRng,
) -> SurrogateResult<DMatrix<f64>> {
    validate_input_matrix(x)?;
    let t = x.nrows();
    validate_channel_length(t, MIN_AAFT_SAMPLES, "AAFT surrogate")?;
    let n2 = t / 2;

    let shared_phases = if fixed_phase {
        Some(draw_free_phases(rng, n2 - 1))
    } else {
        None
    };

    let mut out = DMatrix::<f64>::zeros(t, x.ncols());
    for j in 0..x.ncols() {
        let channel: Vec<f64> = x.column(j).iter().copied().collect();
        let local_phases;
        let phases: &[f64] = match &shared_phases {
            Some(p) => p,
            None => {
                local_phases = draw_free_phases(rng, n2 - 1);
                &local_phases
            }
        };
        let surrogate = aaft_channel_surrogate(&channel, phases, rng)?;
        out.set_column(j, &DVector::from_vec(surrogate));
    }
    Ok(out)
}

/// Channel-parallel AAFT surrogate with deterministic per-channel seeding.
///
/// Each channel runs on its own generator seeded by `mix_seed(base,
/// channel)`, so results are bit-reproducible for a given `seed` regardless
/// of worker scheduling. In fixed-phase mode the shared phase vector is
/// drawn once from the base generator before fan-out and handed to every
/// worker read-only. With `seed: None` a base seed is taken from the
/// thread-local source.
#[cfg(feature = "parallel")]
pub fn fourier_constrained_shuffle_seeded(
    x: &DMatrix<f64>,
    fixed_phase: bool,
    seed: Option<u64>,
) -> SurrogateResult<DMatrix<f64>> {
    use rayon::prelude::*;

    validate_input_matrix(x)?;
    let t = x.nrows();
    validate_channel_length(t, MIN_AAFT_SAMPLES, "AAFT surrogate")?;
    let n2 = t / 2;
    let base = seed.unwrap_or_else(|| ThreadLocalRng::u64(0..u64::MAX));

    let shared_phases = if fixed_phase {
        Some(draw_free_phases(&mut SecureRng::with_seed(base), n2 - 1))
    } else {
        None
    };

    let columns: SurrogateResult<Vec<DVector<f64>>> = (0..x.ncols())
        .into_par_iter()
        .map(|j| {
            let mut rng = SecureRng::with_seed(mix_seed(base, j));
            let channel: Vec<f64> = x.column(j).iter().copied().collect();
            let local_phases;
            let phases: &[f64] = match &shared_phases {
                Some(p) => p,
                None => {
                    local_phases = draw_free_phases(&mut rng, n2 - 1);
                    &local_phases
                }
            };
            aaft_channel_surrogate(&channel, phases, &mut rng).map(DVector::from_vec)
        })
        .collect();

    Ok(DMatrix::from_columns(&columns?))
}

/// Draw the free-phase vector: independent angles in [0, 2π), one per
/// positive frequency bin excluding DC and Nyquist.
pub(crate) fn draw_free_phases(rng: &mut SecureRng, count: usize) -> Vec<f64> {
    (0..count).map(|_| rng.angle()).collect()
}

/// Full AAFT pipeline for one channel: phase-randomize, then re-impose the
/// original amplitudes at the randomized series' ranks.
pub(crate) fn aaft_channel_surrogate(
    channel: &[f64],
    free_phases: &[f64],
    rng: &mut SecureRng,
) -> SurrogateResult<Vec<f64>> {
    let order = argsort(channel);
    let sorted_values: Vec<f64> = order.iter().map(|&i| channel[i]).collect();

    let randomized = phase_randomized_series(channel, free_phases, rng)?;
    let randomized_ranks = inverse_permutation(&argsort(&randomized));

    Ok(randomized_ranks.iter().map(|&r| sorted_values[r]).collect())
}

/// The spectral stage of the per-channel pipeline: rank-matched Gaussian
/// noise,
/// forward transform at the largest even length ≤ n, Hermitian phase
/// randomization, inverse transform at length n, real part.
pub(crate) fn phase_randomized_series(
    channel: &[f64],
    free_phases: &[f64],
    rng: &mut SecureRng,
) -> SurrogateResult<Vec<f64>> {
    let n = channel.len();
    let n2 = n / 2;

    // Gaussian series at the channel's sample spread. Only its rank order
    // survives; the scale keeps the transform numerically comparable to
    // the data.
    let std = sample_std(channel);
    if std == 0.0 {
        log::warn!("zero-variance channel: AAFT surrogate reduces to a rank-stable reordering");
    }
    let mut noise = vec![0.0; n];
    rng.fill_standard_normal(&mut noise);
    for w in noise.iter_mut() {
        *w *= std;
    }

    // Rank-match: the noise values, reordered so their ranks mirror the
    // channel's ranks exactly.
    let channel_ranks = ranks(channel);
    sort_f64_slice(&mut noise);
    let rank_matched: Vec<f64> = channel_ranks.iter().map(|&r| noise[r]).collect();

    // Forward transform truncated to the largest even length <= n; an odd
    // trailing sample is excluded from the spectral stage only.
    let m = 2 * n2;
    let mut spectrum: Vec<Complex64> = rank_matched[..m]
        .iter()
        .map(|&v| Complex64::new(v, 0.0))
        .collect();
    let fft = get_cached_fft_forward(m)?;
    fft.process(&mut spectrum);

    let magnitudes: Vec<f64> = spectrum[..=n2].iter().map(|c| c.norm()).collect();
    let nyquist_phase = spectrum[n2].arg();

    // New spectrum: original magnitudes (mirrored), free phases
    // anti-symmetrized, DC phase zeroed, Nyquist phase preserved.
    let mut randomized = hermitian_spectrum(&magnitudes, free_phases, nyquist_phase)?;

    // Inverse transform at length n (one zero-padded bin when n is odd);
    // rustfft leaves the 1/n normalization to the caller. The odd-length
    // padding breaks exact conjugate symmetry at length n, so the residual
    // imaginary part is discarded.
    randomized.resize(n, Complex64::new(0.0, 0.0));
    let ifft = get_cached_fft_inverse(n)?;
    ifft.process(&mut randomized);

    let scale = 1.0 / n as f64;
    Ok(randomized.iter().map(|c| c.re * scale).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SurrogateError;

    fn sorted_column(x: &DMatrix<f64>, j: usize) -> Vec<f64> {
        let mut col: Vec<f64> = x.column(j).iter().copied().collect();
        sort_f64_slice(&mut col);
        col
    }

    fn sinusoid(n: usize, cycles: f64) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * cycles * i as f64 / n as f64).sin())
            .collect()
    }

    #[test]
    fn test_shape_and_value_set_preserved_even_length() {
        let mut rng = SecureRng::with_seed(21);
        let mut data = sinusoid(16, 2.0);
        data.extend(sinusoid(16, 5.0));
        let x = DMatrix::from_column_slice(16, 2, &data);

        let z = fourier_constrained_shuffle_with_rng(&x, false, &mut rng).unwrap();
        assert_eq!(z.shape(), x.shape());
        for j in 0..2 {
            assert_eq!(sorted_column(&z, j), sorted_column(&x, j));
        }
    }

    #[test]
    fn test_shape_and_value_set_preserved_odd_length() {
        let mut rng = SecureRng::with_seed(22);
        let data = sinusoid(17, 3.0);
        let x = DMatrix::from_column_slice(17, 1, &data);

        let z = fourier_constrained_shuffle_with_rng(&x, true, &mut rng).unwrap();
        assert_eq!(z.shape(), (17, 1));
        assert_eq!(sorted_column(&z, 0), sorted_column(&x, 0));
    }

    #[test]
    fn test_minimum_length_boundary() {
        let mut rng = SecureRng::with_seed(2);

        // Exactly 4 samples works: one free phase bin.
        let x = DMatrix::from_column_slice(4, 1, &[0.4, -1.0, 2.5, 0.1]);
        assert!(fourier_constrained_shuffle_with_rng(&x, true, &mut rng).is_ok());

        // Below 4 fails with InsufficientSamples, including the T = 1 case
        // where the Nyquist bin does not exist.
        for t in [1usize, 2, 3] {
            let x = DMatrix::from_column_slice(t, 1, &vec![1.0; t]);
            match fourier_constrained_shuffle_with_rng(&x, true, &mut rng) {
                Err(SurrogateError::InsufficientSamples { required, actual }) => {
                    assert_eq!(required, MIN_AAFT_SAMPLES);
                    assert_eq!(actual, t);
                }
                other => panic!("expected InsufficientSamples for T = {}, got {:?}", t, other),
            }
        }
    }

    #[test]
    fn test_deterministic_under_fixed_seed() {
        let data = sinusoid(32, 4.0);
        let x = DMatrix::from_column_slice(32, 1, &data);

        let z1 =
            fourier_constrained_shuffle_with_rng(&x, true, &mut SecureRng::with_seed(777)).unwrap();
        let z2 =
            fourier_constrained_shuffle_with_rng(&x, true, &mut SecureRng::with_seed(777)).unwrap();
        assert_eq!(z1, z2);
    }

    #[test]
    fn test_output_ranks_follow_phase_randomized_series() {
        // Replicate the internal pipeline draw-for-draw and check the
        // self-consistency contract: the surrogate's rank order equals the
        // phase-randomized series' rank order, and its values are the
        // sorted originals at those ranks. Distinct values keep the rank
        // comparison free of tie-breaking artifacts.
        let channel: Vec<f64> = (0..24)
            .map(|i| (i as f64 * 0.7).sin() + i as f64 * 1e-3)
            .collect();
        let x = DMatrix::from_column_slice(24, 1, &channel);
        let n2 = 12;

        let z = fourier_constrained_shuffle_with_rng(&x, true, &mut SecureRng::with_seed(31))
            .unwrap();

        let mut replay = SecureRng::with_seed(31);
        let phases = draw_free_phases(&mut replay, n2 - 1);
        let randomized = phase_randomized_series(&channel, &phases, &mut replay).unwrap();

        let surrogate: Vec<f64> = z.column(0).iter().copied().collect();
        assert_eq!(ranks(&surrogate), ranks(&randomized));

        let mut sorted_values = channel.clone();
        sort_f64_slice(&mut sorted_values);
        let expected: Vec<f64> = ranks(&randomized)
            .iter()
            .map(|&r| sorted_values[r])
            .collect();
        assert_eq!(surrogate, expected);
    }

    #[test]
    fn test_fixed_phase_shares_one_phase_vector_across_channels() {
        // Replicate the documented draw order: in fixed-phase mode the
        // free phases are drawn once up front, then each channel draws its
        // own noise. Matching the full two-channel output proves the call
        // reused a single phase vector.
        let mut data = sinusoid(20, 2.0);
        data.extend(sinusoid(20, 7.0));
        let x = DMatrix::from_column_slice(20, 2, &data);
        let n2 = 10;

        let z = fourier_constrained_shuffle_with_rng(&x, true, &mut SecureRng::with_seed(63))
            .unwrap();

        let mut replay = SecureRng::with_seed(63);
        let shared = draw_free_phases(&mut replay, n2 - 1);
        for j in 0..2 {
            let channel: Vec<f64> = x.column(j).iter().copied().collect();
            let expected = aaft_channel_surrogate(&channel, &shared, &mut replay).unwrap();
            let actual: Vec<f64> = z.column(j).iter().copied().collect();
            assert_eq!(actual, expected, "channel {} did not use the shared phases", j);
        }
    }

    #[test]
    fn test_free_phase_draws_fresh_per_channel() {
        let mut data = sinusoid(20, 2.0);
        data.extend(sinusoid(20, 7.0));
        let x = DMatrix::from_column_slice(20, 2, &data);
        let n2 = 10;

        let z = fourier_constrained_shuffle_with_rng(&x, false, &mut SecureRng::with_seed(64))
            .unwrap();

        let mut replay = SecureRng::with_seed(64);
        for j in 0..2 {
            let channel: Vec<f64> = x.column(j).iter().copied().collect();
            let phases = draw_free_phases(&mut replay, n2 - 1);
            let expected = aaft_channel_surrogate(&channel, &phases, &mut replay).unwrap();
            let actual: Vec<f64> = z.column(j).iter().copied().collect();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_sinusoid_surrogate_reorders_samples() {
        let data = sinusoid(64, 4.0);
        let x = DMatrix::from_column_slice(64, 1, &data);

        let mut reordered = 0;
        for seed in 0..20u64 {
            let z = fourier_constrained_shuffle_with_rng(&x, true, &mut SecureRng::with_seed(seed))
                .unwrap();
            assert_eq!(sorted_column(&z, 0), sorted_column(&x, 0));
            if z != x {
                reordered += 1;
            }
        }
        // Reproducing the exact input ordering requires the dominant bin's
        // randomized phase to land back on the original within one sample
        // of resolution, so the occasional coincidence is tolerated.
        assert!(reordered >= 17, "only {}/20 draws reordered the input", reordered);
    }

    #[test]
    fn test_constant_channel_is_returned_unchanged() {
        let mut rng = SecureRng::with_seed(8);
        let x = DMatrix::from_column_slice(8, 1, &[3.0; 8]);
        let z = fourier_constrained_shuffle_with_rng(&x, true, &mut rng).unwrap();
        assert_eq!(z, x);
    }

    #[test]
    fn test_non_finite_input_rejected_before_drawing() {
        let x = DMatrix::from_column_slice(4, 1, &[1.0, f64::INFINITY, 2.0, 3.0]);
        let mut rng1 = SecureRng::with_seed(5);
        let mut rng2 = SecureRng::with_seed(5);

        assert!(matches!(
            fourier_constrained_shuffle_with_rng(&x, true, &mut rng1),
            Err(SurrogateError::NumericalError { .. })
        ));
        // Failed validation consumed no randomness.
        assert_eq!(rng1.f64(), rng2.f64());
    }

    #[test]
    fn test_phase_randomized_series_is_real_and_finite() {
        let mut rng = SecureRng::with_seed(12);
        for n in [4usize, 5, 16, 17, 64] {
            let channel = sinusoid(n, 2.0);
            let phases = draw_free_phases(&mut rng, n / 2 - 1);
            let series = phase_randomized_series(&channel, &phases, &mut rng).unwrap();
            assert_eq!(series.len(), n);
            assert!(series.iter().all(|v| v.is_finite()));
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_seeded_parallel_aaft_reproducible() {
        let mut data = sinusoid(32, 2.0);
        data.extend(sinusoid(32, 5.0));
        data.extend(sinusoid(32, 9.0));
        let x = DMatrix::from_column_slice(32, 3, &data);

        let z1 = fourier_constrained_shuffle_seeded(&x, true, Some(1234)).unwrap();
        let z2 = fourier_constrained_shuffle_seeded(&x, true, Some(1234)).unwrap();
        assert_eq!(z1, z2);

        for j in 0..3 {
            assert_eq!(sorted_column(&z1, j), sorted_column(&x, j));
        }
    }
}
