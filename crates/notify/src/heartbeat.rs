//! Throttle for the "all clear" notice.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Decides whether a quiet run sends a healthy-status notice.
///
/// Each call draws uniformly from `1..=odds` and passes on 1, so on average
/// one quiet run in `odds` produces a notice. `odds = 0` never passes.
pub struct HeartbeatGate {
    odds: u32,
    rng: Mutex<StdRng>,
}

impl HeartbeatGate {
    pub fn new(odds: u32) -> Self {
        Self::with_rng(odds, StdRng::from_entropy())
    }

    pub fn seeded(odds: u32, seed: u64) -> Self {
        Self::with_rng(odds, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(odds: u32, rng: StdRng) -> Self {
        Self {
            odds,
            rng: Mutex::new(rng),
        }
    }

    pub fn should_send(&self) -> bool {
        if self.odds == 0 {
            return false;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(1..=self.odds) == 1
    }
}
