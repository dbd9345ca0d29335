use crate::error::Error;
use crate::rand::{sample_below, EntropySource};

use super::{BarrettContext, Bignum};

/// Small primes with precomputed width-W reciprocals for trial division.
///
/// Built once at startup and passed by reference wherever candidates need
/// screening; there is no process-wide table. For each prime p the table
/// holds c = floor((2^W - 1)/p) + 1, so divisibility of n by p is the
/// multiply-and-compare n * c (wrapping) < c, no division at test time.
#[derive(Debug, Clone)]
pub struct PrimeTable<const LIMBS: usize> {
    entries: Vec<(u64, Bignum<LIMBS>)>,
}

impl<const LIMBS: usize> PrimeTable<LIMBS> {
    /// Table size used by the stock generator configuration.
    pub const DEFAULT_LEN: usize = 99;

    pub fn new(count: usize) -> Self {
        let entries = first_primes(count)
            .into_iter()
            .map(|p| {
                let (c, _) = Bignum::MAX.divmod(&Bignum::from(p));
                (p, c + Bignum::ONE)
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<const LIMBS: usize> Default for PrimeTable<LIMBS> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LEN)
    }
}

/// The first `count` primes, sieved over a range sized by the
/// prime-counting estimate p_k ~ k(ln k + ln ln k).
fn first_primes(count: usize) -> Vec<u64> {
    let mut bound = if count < 6 {
        16
    } else {
        let k = count as f64;
        (k * (k.ln() + k.ln().ln())).ceil() as usize + 16
    };

    loop {
        let mut composite = vec![false; bound + 1];
        let mut primes = Vec::with_capacity(count);
        for n in 2..=bound {
            if composite[n] {
                continue;
            }
            primes.push(n as u64);
            if primes.len() == count {
                return primes;
            }
            let mut multiple = n * n;
            while multiple <= bound {
                composite[multiple] = true;
                multiple += n;
            }
        }
        // estimate fell short (tiny counts); widen and resieve
        bound *= 2;
    }
}

impl<const LIMBS: usize> Bignum<LIMBS> {
    /// Two-stage probabilistic primality test.
    ///
    /// Stage one rejects most composites by reciprocal trial division
    /// against the table; stage two is Miller-Rabin with `rounds`
    /// independently sampled bases. A composite survives with probability
    /// at most 4^-rounds; at the search default of 64 rounds that is
    /// 2^-128, and this function never reduces the rounds it is given.
    /// The verdict is a committed boolean; there is no "unsure".
    pub fn is_probable_prime<E: EntropySource>(
        &self,
        rounds: u32,
        table: &PrimeTable<LIMBS>,
        entropy: &mut E,
    ) -> Result<bool, Error> {
        let three = Bignum::from(3u8);
        if *self <= three {
            return Ok(*self == Bignum::from(2u8) || *self == three);
        }
        if self.is_even() {
            return Ok(false);
        }

        for (p, magic) in &table.entries {
            if self.wrapping_mul(magic) < *magic {
                return Ok(self == &Bignum::from(*p));
            }
        }

        self.miller_rabin(rounds, entropy)
    }

    /// Miller-Rabin witness loop for odd self > 3.
    fn miller_rabin<E: EntropySource>(&self, rounds: u32, entropy: &mut E) -> Result<bool, Error> {
        let n_minus_1 = self - Bignum::ONE;
        let s = n_minus_1.trailing_zeros();
        let d = n_minus_1 >> s;
        debug_assert!(d.is_odd());

        let ctx = BarrettContext::new(*self);
        let base_bound = self - Bignum::from(3u8);
        let two = Bignum::from(2u8);

        'witness: for _ in 0..rounds {
            // a uniform in [2, n-2]
            let a = sample_below(entropy, &base_bound, None)? + two;
            let mut x = ctx.mod_pow(&a, &d);
            if x.is_one() || x == n_minus_1 {
                continue;
            }
            for _ in 1..s {
                x = ctx.mod_sqr(&x);
                if x == n_minus_1 {
                    continue 'witness;
                }
            }
            // no square root of -1 surfaced: composite, and certainly so
            return Ok(false);
        }

        Ok(true)
    }
}
