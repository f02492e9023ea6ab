//! xorshift64* random number generator
//!
//! This is a fast, high-quality PRNG that is deterministic and suitable
//! for simulation purposes.
//!
//! # Algorithm
//!
//! xorshift64* is a variant of xorshift that passes TestU01's BigCrush
//! statistical tests. It uses 64-bit state and produces 64-bit output.
//!
//! Continuous draws (uniform, normal) are derived from the 64-bit stream
//! only, so the full generator state is a single `u64` that can be written
//! into a checkpoint and restored with [`RngManager::from_state`].
//!
//! # Determinism
//!
//! Same seed → same sequence of random numbers. This is CRITICAL for:
//! - Replaying a what-if scenario month by month
//! - Resuming a simulation from a checkpoint
//! - Comparing two intervention plans under identical noise

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use org_simulator_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let value = rng.next();
/// let size = rng.range(3, 10); // [3, 10)
/// let noise = rng.normal(0.0, 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngManager {
    /// Internal state (64-bit)
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// # Example
    /// ```
    /// use org_simulator_core_rs::RngManager;
    ///
    /// let rng = RngManager::new(42);
    /// ```
    pub fn new(seed: u64) -> Self {
        // Ensure seed is never zero (xorshift requirement)
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Restore a generator from a state captured by [`RngManager::get_state`]
    pub fn from_state(state: u64) -> Self {
        Self::new(state)
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        // xorshift64* algorithm
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate random value in range [min, max)
    ///
    /// # Panics
    /// Panics if min >= max
    ///
    /// # Example
    /// ```
    /// use org_simulator_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(12345);
    /// let hours = rng.range(10, 40);
    /// assert!((10..40).contains(&hours));
    /// ```
    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        assert!(min < max, "min must be less than max");

        let value = self.next();
        let range_size = (max - min) as u64;
        min + (value % range_size) as i64
    }

    /// Get current RNG state (for checkpointing/replay)
    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Generate random f64 in range [0.0, 1.0)
    ///
    /// # Example
    /// ```
    /// use org_simulator_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(12345);
    /// let probability = rng.next_f64();
    /// assert!(probability >= 0.0 && probability < 1.0);
    /// ```
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        // Convert to [0.0, 1.0) by dividing by 2^53
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Uniform f64 in the half-open interval (low, high]
    ///
    /// Used for edge weights, which must never be exactly `low`.
    pub fn uniform_exclusive_low(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * (1.0 - self.next_f64())
    }

    /// Bernoulli trial: true with the given probability
    pub fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }

    /// Sample from N(mean, std_dev) using the Box-Muller transform
    ///
    /// Consumes exactly two draws per call and caches nothing, so the
    /// generator state alone determines every future sample.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        // u1 in (0, 1] keeps ln() finite
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Pick one element of a non-empty slice uniformly
    ///
    /// # Panics
    /// Panics if `items` is empty
    pub fn choose<T: Copy>(&mut self, items: &[T]) -> T {
        assert!(!items.is_empty(), "cannot choose from an empty slice");
        let idx = self.range(0, items.len() as i64) as usize;
        items[idx]
    }
}
