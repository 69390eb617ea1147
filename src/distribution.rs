//! Key-access distribution and the general-purpose PRNG.
//!
//! This PRNG is deliberately a different stream than [`crate::keystream::Keystream`]:
//! it drives key/op selection and non-integrity payload lengths, so that
//! integrity-mode payloads (keyed off `Keystream`) stay reproducible even
//! when these other draws change from run to run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The benchmark's general-purpose uniform PRNG.
pub struct Prng(StdRng);

impl Prng {
    pub fn seeded(seed: u64) -> Self {
        Prng(StdRng::seed_from_u64(seed))
    }

    /// A uniform integer in `[0, k)`.
    pub fn below(&mut self, k: u64) -> u64 {
        self.0.gen_range(0..k)
    }

    /// A uniform integer in `[lo, hi]`.
    pub fn between(&mut self, lo: u64, hi: u64) -> u64 {
        self.0.gen_range(lo..=hi)
    }

    /// A uniform double in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Draw the next key identity from `[0, k)`.
///
/// Uniform when `longtail` is false. Otherwise a power-law distribution of
/// shaping order `n` (required `2 <= n <= 100`) concentrated near zero, so
/// low key ids are the hottest.
pub fn next_key(rng: &mut Prng, k: u64, longtail: bool, n: u32) -> u64 {
    if !longtail {
        return rng.below(k);
    }
    debug_assert!((2..=100).contains(&n), "longtail order out of range");

    let r = rng.unit();
    // p = ((K^(n+1) - 0^(n+1)) * r + 0^(n+1))^(1/(n+1)) reduces algebraically
    // to K * r^(1/(n+1)); the reduced form avoids the f64 overflow that
    // K^(n+1) hits outright for realistic K and n.
    let exponent = 1.0 / (n as f64 + 1.0);
    let p = (k as f64) * r.powf(exponent);
    let floor_p = p.floor() as i64;
    let candidate = (k as i64 - 1) - floor_p;
    candidate.clamp(0, k as i64 - 1) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_stays_in_range() {
        let mut rng = Prng::seeded(1);
        for _ in 0..1000 {
            let k = next_key(&mut rng, 100, false, 2);
            assert!(k < 100);
        }
    }

    #[test]
    fn longtail_stays_in_range() {
        let mut rng = Prng::seeded(1);
        for _ in 0..1000 {
            let k = next_key(&mut rng, 100_000, true, 3);
            assert!(k < 100_000);
        }
    }

    #[test]
    fn longtail_skews_toward_zero() {
        let mut rng = Prng::seeded(2);
        let mut low = 0u32;
        let mut high = 0u32;
        for _ in 0..20_000 {
            let k = next_key(&mut rng, 1000, true, 5);
            if k < 100 {
                low += 1;
            } else if k >= 900 {
                high += 1;
            }
        }
        assert!(low > high * 10, "low={low} high={high}");
    }

    #[test]
    fn higher_order_skews_more() {
        // P5: P(key=i) is non-increasing in i, strictly more so for larger n.
        let mut low_n = Prng::seeded(3);
        let mut high_n = Prng::seeded(3);
        let mut low_n_hot = 0u32;
        let mut high_n_hot = 0u32;
        for _ in 0..20_000 {
            if next_key(&mut low_n, 1000, true, 2) < 10 {
                low_n_hot += 1;
            }
            if next_key(&mut high_n, 1000, true, 50) < 10 {
                high_n_hot += 1;
            }
        }
        assert!(high_n_hot >= low_n_hot);
    }

    #[test]
    fn between_is_inclusive() {
        let mut rng = Prng::seeded(4);
        let mut saw_lo = false;
        let mut saw_hi = false;
        for _ in 0..2000 {
            let v = rng.between(1, 2);
            assert!(v == 1 || v == 2);
            saw_lo |= v == 1;
            saw_hi |= v == 2;
        }
        assert!(saw_lo && saw_hi);
    }
}
