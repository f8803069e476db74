//! Capped exponential reconnect backoff with uniform jitter

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Reconnect delay policy
///
/// `delay = min(base * 2^retry + jitter, max)` with `jitter` uniform in `[0, jitter_ms)`.
/// The RNG is seeded so schedules are reproducible.
#[derive(Debug, Clone)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
    jitter_ms: u64,
    rng: Pcg32,
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64, jitter_ms: u64, seed: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            jitter_ms,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Delay before the attempt that follows `retry_count` consecutive failures
    pub fn next_delay(&mut self, retry_count: u32) -> u64 {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            self.rng.random_range(0..self.jitter_ms)
        };
        self.delay_with_jitter(retry_count, jitter)
    }

    /// Deterministic part of the policy, with the jitter supplied by the caller
    pub fn delay_with_jitter(&self, retry_count: u32, jitter: u64) -> u64 {
        let factor = 2u64.checked_pow(retry_count).unwrap_or(u64::MAX);
        self.base_ms
            .saturating_mul(factor)
            .saturating_add(jitter)
            .min(self.max_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_doubles_per_retry() {
        let backoff = Backoff::new(1000, 30_000, 1000, 1);
        assert_eq!(backoff.delay_with_jitter(0, 0), 1000);
        assert_eq!(backoff.delay_with_jitter(1, 0), 2000);
        assert_eq!(backoff.delay_with_jitter(2, 250), 4250);
        assert_eq!(backoff.delay_with_jitter(4, 999), 16_999);
    }

    #[test]
    fn test_clamped_at_max() {
        let backoff = Backoff::new(1000, 30_000, 1000, 1);
        assert_eq!(backoff.delay_with_jitter(5, 0), 30_000);
        assert_eq!(backoff.delay_with_jitter(64, 0), 30_000);
        assert_eq!(backoff.delay_with_jitter(u32::MAX, 999), 30_000);
    }

    #[test]
    fn test_jitter_clamp_applies_after_addition() {
        // 16000 + 999 fits, 16000 + jitter for max 16500 does not
        let backoff = Backoff::new(1000, 16_500, 1000, 1);
        assert_eq!(backoff.delay_with_jitter(4, 400), 16_400);
        assert_eq!(backoff.delay_with_jitter(4, 999), 16_500);
    }

    #[test]
    fn test_zero_jitter_is_exact() {
        let mut backoff = Backoff::new(500, 10_000, 0, 7);
        assert_eq!(backoff.next_delay(0), 500);
        assert_eq!(backoff.next_delay(3), 4000);
    }

    #[test]
    fn test_same_seed_same_schedule() {
        let mut a = Backoff::new(1000, 30_000, 1000, 42);
        let mut b = Backoff::new(1000, 30_000, 1000, 42);
        for retry in 0..8 {
            assert_eq!(a.next_delay(retry), b.next_delay(retry));
        }
    }

    proptest! {
        #[test]
        fn prop_delay_within_bounds(retry in 0u32..80, seed in any::<u64>()) {
            let mut backoff = Backoff::new(1000, 30_000, 1000, seed);
            let delay = backoff.next_delay(retry);
            let floor = backoff.delay_with_jitter(retry, 0);
            prop_assert!(delay >= floor);
            prop_assert!(delay < floor + 1000 || delay == 30_000);
            prop_assert!(delay <= 30_000);
        }
    }
}
