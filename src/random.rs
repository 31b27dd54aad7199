//! Deterministic, stateless randomness.
//!
//! Every participant must be able to recompute the randomness of any other
//! participant without communication. All functions in this module are pure:
//! the same `(seed, ...)` tuple yields the same result on every call, on every
//! participant. There is no thread-local or global generator state anywhere.
//!
//! The primitive is [`hash`], a 64-bit finalizer-style mixer. Generators key
//! it with an injective encoding of the entity they need a decision for (a
//! candidate edge, a chunk, a split node) combined with the global seed. The
//! variate functions ([`binomial`], [`hypergeometric`]) construct a
//! short-lived seeded generator per call, so repeated calls with the same seed
//! return the same sample.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Binomial, Distribution, Hypergeometric};

const GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Mixes `x` into a statistically uniform 64-bit value.
///
/// This is the splitmix64 finalizer. It is a bijection on `u64`, so distinct
/// edge keys can never collide, and its avalanche behavior is good enough
/// that Bernoulli trials keyed on consecutive integers are unbiased at the
/// scales we generate (on the order of `2^40` trials per run).
#[inline]
pub fn hash(x: u64) -> u64 {
    let mut z = x.wrapping_add(GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Maps a hash value to the unit interval `[0, 1)` using the top 53 bits.
#[inline]
pub fn unit_fraction(h: u64) -> f64 {
    const SCALE: f64 = 1.0 / (1u64 << 53) as f64;
    (h >> 11) as f64 * SCALE
}

/// A Bernoulli trial with success probability `p`, decided by `h`.
///
/// `p = 0.0` never succeeds and `p = 1.0` always succeeds, since
/// [`unit_fraction`] is strictly below `1.0`.
#[inline]
pub fn bernoulli(h: u64, p: f64) -> bool {
    unit_fraction(h) < p
}

/// Samples `X ~ Binom(trials, p)`, deterministic in `seed`.
///
/// Degenerate inputs return the analytic answer without touching the
/// generator: zero trials or `p <= 0` yield `0`, `p >= 1` yields `trials`.
/// A single trial reduces to [`bernoulli`] on the seed itself.
pub fn binomial(seed: u64, trials: u64, p: f64) -> u64 {
    if trials == 0 || p <= 0.0 {
        return 0;
    }
    if p >= 1.0 {
        return trials;
    }
    if trials == 1 {
        return bernoulli(seed, p) as u64;
    }

    let dist = Binomial::new(trials, p).expect("p lies in (0, 1)");
    dist.sample(&mut StdRng::seed_from_u64(seed))
}

/// Samples the number of successes in `draws` draws without replacement from
/// a population of `population` elements of which `successes` are successes.
/// Deterministic in `seed`.
///
/// The result always lies in `[max(0, draws + successes - population),
/// min(draws, successes)]`. Degenerate inputs short-circuit analytically, so
/// splitting zero edges over a subtree or draining a population exactly never
/// drifts.
pub fn hypergeometric(seed: u64, successes: u64, population: u64, draws: u64) -> u64 {
    debug_assert!(successes <= population);
    debug_assert!(draws <= population);

    if draws == 0 || successes == 0 {
        return 0;
    }
    if successes == population {
        return draws;
    }
    if draws == population {
        return successes;
    }

    let dist = Hypergeometric::new(population, successes, draws)
        .expect("parameters are bounded by the population");
    dist.sample(&mut StdRng::seed_from_u64(seed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_and_spreads() {
        assert_eq!(hash(42), hash(42));
        assert_ne!(hash(42), hash(43));

        // Consecutive inputs should differ in roughly half their bits.
        let ones = (hash(7) ^ hash(8)).count_ones();
        assert!((8..=56).contains(&ones));
    }

    #[test]
    fn unit_fraction_stays_in_unit_interval() {
        assert_eq!(unit_fraction(0), 0.0);
        assert!(unit_fraction(u64::MAX) < 1.0);
    }

    #[test]
    fn bernoulli_extremes() {
        for h in [0, 1, u64::MAX / 2, u64::MAX] {
            assert!(!bernoulli(h, 0.0));
            assert!(bernoulli(h, 1.0));
        }
    }

    #[test]
    fn binomial_degenerate_inputs() {
        assert_eq!(binomial(1, 0, 0.5), 0);
        assert_eq!(binomial(1, 100, 0.0), 0);
        assert_eq!(binomial(1, 100, 1.0), 100);
    }

    #[test]
    fn binomial_is_deterministic_and_bounded() {
        for seed in 0..100 {
            let a = binomial(seed, 1000, 0.3);
            let b = binomial(seed, 1000, 0.3);
            assert_eq!(a, b);
            assert!(a <= 1000);
        }
    }

    #[test]
    fn binomial_mean_is_calibrated() {
        let samples = 200;
        let total: u64 = (0..samples).map(|seed| binomial(seed, 1000, 0.5)).sum();
        let mean = total as f64 / samples as f64;
        assert!((mean - 500.0).abs() < 20.0, "mean was {mean}");
    }

    #[test]
    fn hypergeometric_degenerate_inputs() {
        assert_eq!(hypergeometric(1, 0, 100, 10), 0);
        assert_eq!(hypergeometric(1, 100, 100, 10), 10);
        assert_eq!(hypergeometric(1, 30, 100, 0), 0);
        assert_eq!(hypergeometric(1, 30, 100, 100), 30);
    }

    #[test]
    fn hypergeometric_is_deterministic_and_bounded() {
        for seed in 0..100 {
            let x = hypergeometric(seed, 40, 100, 25);
            assert_eq!(x, hypergeometric(seed, 40, 100, 25));
            assert!(x <= 25);
        }
    }

    #[test]
    fn hypergeometric_respects_lower_bound() {
        // 90 successes in 100, 50 draws: at least 40 draws must be successes.
        for seed in 0..50 {
            let x = hypergeometric(seed, 90, 100, 50);
            assert!((40..=50).contains(&x));
        }
    }
}
