//! Seeded RNG wrapper for the simulated sensors.
//!
//! Repeated reads under identical state must differ slightly, as real
//! sensors do, while remaining centered on a physically motivated value.
//! The jitter stream is seedable so tests can pin it.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Mutex;

/// Thread-safe, optionally seeded random source for sensor jitter.
pub struct SimRng {
    inner: Mutex<ChaCha8Rng>,
}

impl SimRng {
    /// Create a new RNG. With `None` the seed comes from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            inner: Mutex::new(rng),
        }
    }

    /// Sample uniformly from `[0, bound)`. A non-positive bound yields 0.
    pub fn jitter(&self, bound: f64) -> f64 {
        if bound <= 0.0 {
            return 0.0;
        }
        match self.inner.lock() {
            Ok(mut rng) => rng.gen_range(0.0..bound),
            // poisoned lock: a panic elsewhere mid-sample
            Err(_) => bound / 2.0,
        }
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for SimRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimRng")
            .field("inner", &"<Mutex<ChaCha8Rng>>")
            .finish()
    }
}
