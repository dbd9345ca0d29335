//! Entropy sources and bounded sampling.

use crate::bignum::Bignum;
use crate::error::Error;

mod os;
mod xorshift32;

pub use os::OsEntropy;
pub use xorshift32::XorShift32;

/// A source of uniformly random bytes.
///
/// [`OsEntropy`] is the production implementation; [`XorShift32`] stands in
/// for it in tests and reproducible experiments. A failing source is fatal
/// to the caller: a cryptographic generator must never paper over a broken
/// entropy path by retrying it.
pub trait EntropySource {
    /// Fill `buf` completely, blocking until satisfied.
    fn try_fill(&mut self, buf: &mut [u8]) -> Result<(), Error>;
}

impl<T: EntropySource> EntropySource for &mut T {
    fn try_fill(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        (*self).try_fill(buf)
    }
}

/// Draw a uniform value in [0, max) by rejection sampling.
///
/// Each draw is masked down to the minimal number of bits covering the
/// range, which keeps the acceptance probability at 1/2 or better for every
/// bound; a modulo reduction would bias small ranges and is never used.
/// The loop is unbounded by default (termination is probabilistic, not
/// guaranteed), so `limit` lets callers that drive it from a deterministic
/// source turn a never-accepting loop into a diagnosable error.
pub fn sample_below<const LIMBS: usize, E: EntropySource>(
    entropy: &mut E,
    max: &Bignum<LIMBS>,
    limit: Option<u32>,
) -> Result<Bignum<LIMBS>, Error> {
    debug_assert!(!max.is_zero(), "empty sampling range");

    let bits = (max - Bignum::ONE).bit_length();
    let mask = if bits == 0 {
        Bignum::ZERO
    } else if bits == Bignum::<LIMBS>::BITS {
        Bignum::MAX
    } else {
        (Bignum::ONE << bits) - Bignum::ONE
    };

    let mut draws = 0u32;
    loop {
        let candidate = Bignum::random(entropy)? & mask;
        if &candidate < max {
            return Ok(candidate);
        }
        draws += 1;
        if limit.is_some_and(|cap| draws >= cap) {
            return Err(Error::RetriesExhausted("rejection sampling"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A source that always returns the same byte; useful for forcing the
    /// rejection path.
    struct Constant(u8);

    impl EntropySource for Constant {
        fn try_fill(&mut self, buf: &mut [u8]) -> Result<(), Error> {
            buf.fill(self.0);
            Ok(())
        }
    }

    #[test]
    fn samples_stay_in_range() {
        let mut rng = XorShift32::new(0x5a17_ed01);
        for max_str in ["0x5", "0x100", "0x100000001", "0xffffffffffffffffffffffff"] {
            let max: Bignum<4> = max_str.parse().unwrap();
            for _ in 0..100 {
                let v = sample_below(&mut rng, &max, None).unwrap();
                assert!(v < max);
            }
        }
    }

    #[test]
    fn small_ranges_are_fully_reachable() {
        let mut rng = XorShift32::new(0x0123_4567);
        let max = Bignum::<2>::from(5u8);
        let mut seen = [false; 5];
        for _ in 0..200 {
            let v = sample_below(&mut rng, &max, None).unwrap();
            seen[v.low_u64() as usize] = true;
        }
        assert!(seen.iter().all(|s| *s), "rejection sampling skipped a value");
    }

    #[test]
    fn power_of_two_bounds_accept_on_the_first_draw() {
        // the mask covers exactly [0, 2^k), so an all-ones source is fine
        let mut stuck = Constant(0xff);
        let max = Bignum::<2>::ONE << 40;
        let v = sample_below(&mut stuck, &max, Some(1)).unwrap();
        assert_eq!(v, (Bignum::ONE << 40) - Bignum::ONE);
    }

    #[test]
    fn the_cap_turns_a_stuck_loop_into_an_error() {
        // 0xff.. masked to 3 bits is 7, which is never below 5
        let mut stuck = Constant(0xff);
        let max = Bignum::<2>::from(5u8);
        let err = sample_below(&mut stuck, &max, Some(8)).unwrap_err();
        assert!(matches!(err, Error::RetriesExhausted(_)));
    }
}
