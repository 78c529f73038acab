//! Seedable random-number generation for surrogate construction.
//!
//! Surrogate hypothesis tests live or die by reproducibility: a reported
//! p-value must be recomputable from a seed. This module provides a
//! ChaCha20-backed generator with the draw primitives the surrogate
//! algorithms need (uniform reals, ranged integers, standard-normal fills,
//! uniform permutations), a thread-local default instance, and process-wide
//! seeding for callers that use the parameterless entry points.

use crate::errors::{SurrogateError, SurrogateResult};
use once_cell::sync::Lazy;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

/// Global seed for deterministic mode (None means use OS entropy)
static GLOBAL_SEED: Lazy<RwLock<Option<u64>>> = Lazy::new(|| RwLock::new(None));

/// Global seed generation counter to detect when the seed changes
static SEED_GENERATION: AtomicU64 = AtomicU64::new(0);

/// Global thread ID counter for deterministic thread identification
static THREAD_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Golden ratio constant for seed mixing
const GOLDEN_RATIO_SEED_MIX: u64 = 0x9E3779B97F4A7C15;

/// Mix a base seed with a worker index into a decorrelated per-worker seed.
///
/// Golden ratio multiplication plus bit rotation keeps adjacent indices from
/// producing correlated ChaCha streams, so channel-parallel surrogate draws
/// stay statistically independent while remaining reproducible.
pub fn mix_seed(base_seed: u64, index: usize) -> u64 {
    base_seed
        .wrapping_mul(GOLDEN_RATIO_SEED_MIX)
        .wrapping_add(index as u64)
        .rotate_left(17)
}

/// Seedable random source for surrogate generation.
///
/// Wraps ChaCha20, which gives a long period and streams that do not
/// collide across nearby seeds. Construct with [`SecureRng::new`] for OS
/// entropy or [`SecureRng::with_seed`] for reproducible draws.
#[derive(Clone)]
pub struct SecureRng {
    rng: ChaCha20Rng,
}

impl SecureRng {
    /// Create a new generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Create a generator with a specific seed for reproducibility.
    ///
    /// `seed_from_u64` cryptographically expands the u64 into the full
    /// 256-bit ChaCha key.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Generate a random f64 in [0, 1).
    pub fn f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Generate a random usize in the given range.
    pub fn usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.rng.gen_range(range)
    }

    /// Generate a random u64 in the given range (no modulo bias).
    pub fn u64(&mut self, range: std::ops::Range<u64>) -> u64 {
        self.rng.gen_range(range)
    }

    /// Fill a buffer with uniform f64 values in [0, 1).
    pub fn fill_f64(&mut self, buffer: &mut [f64]) {
        for value in buffer.iter_mut() {
            *value = self.rng.gen::<f64>();
        }
    }

    /// Generate a random phase angle in [0, 2π).
    pub fn angle(&mut self) -> f64 {
        2.0 * PI * self.f64()
    }

    /// Fill a buffer with independent standard-normal draws.
    ///
    /// Box-Muller transform; the spare value from each pair is carried
    /// within the call so an odd-length fill costs one extra uniform pair.
    pub fn fill_standard_normal(&mut self, buffer: &mut [f64]) {
        let mut spare: Option<f64> = None;
        for value in buffer.iter_mut() {
            *value = if let Some(s) = spare.take() {
                s
            } else {
                // Reject u == 0 so the log stays finite.
                let u = loop {
                    let u = self.f64();
                    if u > 0.0 {
                        break u;
                    }
                };
                let v = self.f64();
                let mag = (-2.0 * u.ln()).sqrt();
                let angle = 2.0 * PI * v;
                spare = Some(mag * angle.sin());
                mag * angle.cos()
            };
        }
    }

    /// Draw a uniform random permutation of `{0, .., n-1}` (Fisher-Yates).
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = self.usize(0..i + 1);
            indices.swap(i, j);
        }
        indices
    }
}

impl Default for SecureRng {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SecureRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureRng").finish_non_exhaustive()
    }
}

/// Global generator behind the convenience entry points that take no RNG.
static GLOBAL_RNG: Lazy<Mutex<SecureRng>> = Lazy::new(|| Mutex::new(SecureRng::new()));

/// Set a process-wide seed for deterministic behavior.
///
/// Resets the global generator and forces every thread-local instance to
/// reinitialize from the new seed on its next use. Callers wanting
/// reproducible draws from the parameterless operations must call this
/// before the first draw; prefer the `_with_rng` operation variants when
/// determinism matters in multi-threaded code.
pub fn global_seed(seed: u64) {
    if let Ok(mut global_seed) = GLOBAL_SEED.write() {
        *global_seed = Some(seed);
        SEED_GENERATION.fetch_add(1, Ordering::SeqCst);
    }

    let _ = GLOBAL_RNG.lock().map(|mut rng| {
        *rng = SecureRng::with_seed(seed);
    });

    // Consistent thread IDs across reseedings keep per-thread streams stable.
    THREAD_ID_COUNTER.store(0, Ordering::SeqCst);
}

/// Clear the process-wide seed, returning to OS entropy mode.
pub fn clear_global_seed() {
    if let Ok(mut global_seed) = GLOBAL_SEED.write() {
        *global_seed = None;
        SEED_GENERATION.fetch_add(1, Ordering::SeqCst);
    }
}

/// Get a random f64 in [0, 1) from the global generator.
pub fn secure_random_f64() -> SurrogateResult<f64> {
    GLOBAL_RNG
        .lock()
        .map(|mut rng| rng.f64())
        .map_err(|_| SurrogateError::ConcurrencyError {
            resource: "global_rng".to_string(),
        })
}

/// Execute a function with the thread-local generator.
///
/// The generator lives in thread-local storage and is reused across calls.
/// When the process-wide seed changes, each thread reinitializes its
/// instance with a seed derived from the global seed and a deterministic
/// thread ID.
pub fn with_thread_local_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SecureRng) -> R,
{
    thread_local! {
        static RNG: std::cell::RefCell<Option<SecureRng>> = const { std::cell::RefCell::new(None) };
        static THREAD_ID: std::cell::Cell<u64> = const { std::cell::Cell::new(0) };
        static LAST_GENERATION: std::cell::Cell<u64> = const { std::cell::Cell::new(0) };
    }

    RNG.with(|rng_cell| {
        let mut rng_opt = rng_cell.borrow_mut();

        let current_generation = SEED_GENERATION.load(Ordering::SeqCst);
        let needs_reinit = LAST_GENERATION.with(|gen_cell| {
            let last = gen_cell.get();
            if last != current_generation {
                gen_cell.set(current_generation);
                // Thread IDs restart with each generation so reseeding with
                // the same value reproduces the same per-thread streams.
                THREAD_ID.with(|id| id.set(0));
                true
            } else {
                false
            }
        });

        if rng_opt.is_none() || needs_reinit {
            let rng = if let Ok(global_seed) = GLOBAL_SEED.read() {
                if let Some(seed) = *global_seed {
                    THREAD_ID.with(|id| {
                        let tid = id.get();
                        if tid == 0 {
                            let new_id = THREAD_ID_COUNTER.fetch_add(1, Ordering::SeqCst);
                            id.set(new_id);
                            SecureRng::with_seed(seed.wrapping_add(new_id))
                        } else {
                            SecureRng::with_seed(seed.wrapping_add(tid))
                        }
                    })
                } else {
                    SecureRng::new()
                }
            } else {
                SecureRng::new()
            };
            *rng_opt = Some(rng);
        }

        f(rng_opt.as_mut().unwrap())
    })
}

/// Thread-local generator facade for the parameterless operation variants.
///
/// Avoids global lock contention; each thread gets an independent instance.
pub struct ThreadLocalRng;

impl ThreadLocalRng {
    /// Run a closure against the thread-local generator.
    pub fn with<F, R>(f: F) -> R
    where
        F: FnOnce(&mut SecureRng) -> R,
    {
        with_thread_local_rng(f)
    }

    /// Generate a random f64 in [0, 1).
    pub fn f64() -> f64 {
        with_thread_local_rng(|rng| rng.f64())
    }

    /// Generate a random usize in range.
    pub fn usize(range: std::ops::Range<usize>) -> usize {
        with_thread_local_rng(|rng| rng.usize(range))
    }

    /// Generate a random u64 in range.
    pub fn u64(range: std::ops::Range<u64>) -> u64 {
        with_thread_local_rng(|rng| rng.u64(range))
    }
}
