//! The Blum Blum Shub generator: squaring state machine, bit extraction and
//! logarithmic-time jump-ahead.

use std::num::NonZeroUsize;

use log::info;

use crate::bignum::{lcm, BarrettContext, Bignum, PrimeTable};
use crate::error::Error;
use crate::primes::{self, SearchParams};
use crate::rand::{sample_below, EntropySource};

/// Generator configuration. The modulus width is the `LIMBS` type parameter
/// (W = 64·LIMBS bits); everything the width does not fix lives here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Miller-Rabin rounds per prime certification. The default 64 bounds
    /// the false-positive probability by 2^-128; lowering it is the
    /// caller's explicit, visible decision.
    pub rounds: u32,
    /// Low bits taken from the state per squaring step. More than one bit
    /// trades security margin for throughput and is only sound while
    /// extract ≤ log2(log2(W)).
    pub extract: u32,
    /// Certify (r-1)/2 prime as well during the search.
    pub strict: bool,
    /// Cap on candidate and seed retries; `None` retries indefinitely.
    pub max_attempts: Option<u64>,
    /// Cap on rejection-sampling draws; `None` retries indefinitely.
    pub sample_limit: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rounds: 64,
            extract: 1,
            strict: false,
            max_attempts: None,
            sample_limit: None,
        }
    }
}

impl Config {
    /// Reject invalid settings outright. Nothing is ever clamped: a bad
    /// extraction window is an error, not a request for the nearest safe
    /// value.
    pub fn validate<const LIMBS: usize>(&self) -> Result<(), Error> {
        if self.rounds == 0 {
            return Err(Error::InvalidConfig("miller-rabin rounds must be at least 1"));
        }
        if self.extract == 0 {
            return Err(Error::InvalidConfig("extraction window must be at least 1"));
        }
        if self.extract > max_extract(Bignum::<LIMBS>::BITS) {
            return Err(Error::InvalidConfig(
                "extraction window exceeds log2(log2(W))",
            ));
        }
        Ok(())
    }

    fn search_params(&self) -> SearchParams {
        SearchParams {
            rounds: self.rounds,
            strict: self.strict,
            max_attempts: self.max_attempts,
            sample_limit: self.sample_limit,
        }
    }
}

/// The widest extraction window the security argument permits:
/// EXTRACT ≤ log2(log2(W)).
fn max_extract(bits: u32) -> u32 {
    bits.ilog2().ilog2()
}

/// x_{i+1} = x_i² mod pq, with the low bits of each state as output.
///
/// pq is the product of two safe primes congruent to 3 mod 4 and the seed is
/// coprime to it, which is what keeps the squaring map from collapsing into
/// a short cycle. Alongside the current state the generator keeps the
/// initial state and the group exponent c = lcm(p-1, q-1), so any absolute
/// position is reachable directly: x_i = x0^(2^i mod c) mod pq.
#[derive(Debug, Clone)]
pub struct BbsGenerator<const LIMBS: usize> {
    pq: Bignum<LIMBS>,
    x: Bignum<LIMBS>,
    x0: Bignum<LIMBS>,
    c: Bignum<LIMBS>,
    barrett_pq: BarrettContext<LIMBS>,
    barrett_c: BarrettContext<LIMBS>,
    pos: u64,
    extract: u32,
}

impl<const LIMBS: usize> BbsGenerator<LIMBS> {
    /// Generate a fresh generator: safe-prime pair, then a seed coprime to
    /// the modulus.
    pub fn generate<E: EntropySource>(
        config: &Config,
        table: &PrimeTable<LIMBS>,
        entropy: &mut E,
    ) -> Result<Self, Error> {
        config.validate::<LIMBS>()?;
        let (p, q) = primes::generate_pair(entropy, table, &config.search_params())?;
        let generator = Self::assemble(p, q, config, entropy)?;
        info!(
            "generator ready: {} bit modulus, {} bit cycle exponent",
            generator.pq.bit_length(),
            generator.c.bit_length()
        );
        Ok(generator)
    }

    /// Like [`generate`](Self::generate), with the safe-prime search raced
    /// across `workers` threads. `make_entropy` builds one source per
    /// worker; the seed is still drawn from `entropy`.
    pub fn generate_racing<E, S, F>(
        config: &Config,
        table: &PrimeTable<LIMBS>,
        entropy: &mut S,
        make_entropy: F,
        workers: NonZeroUsize,
    ) -> Result<Self, Error>
    where
        E: EntropySource,
        S: EntropySource,
        F: Fn(usize) -> Result<E, Error> + Sync,
    {
        config.validate::<LIMBS>()?;
        let (p, q) =
            primes::generate_pair_racing(make_entropy, table, &config.search_params(), workers)?;
        let generator = Self::assemble(p, q, config, entropy)?;
        info!(
            "generator ready: {} bit modulus, {} bit cycle exponent",
            generator.pq.bit_length(),
            generator.c.bit_length()
        );
        Ok(generator)
    }

    /// Rebuild a generator from caller-held values, the hook for resuming a
    /// checkpointed stream: reconstruct with the original (p, q, x0), then
    /// `set` the saved position.
    ///
    /// Structural invariants are enforced here; primality of p and q is the
    /// caller's burden; these are values the caller previously obtained
    /// from a real generation run, not new material.
    pub fn from_parts(
        p: Bignum<LIMBS>,
        q: Bignum<LIMBS>,
        x0: Bignum<LIMBS>,
        config: &Config,
    ) -> Result<Self, Error> {
        config.validate::<LIMBS>()?;
        let three = Bignum::from(3u8);
        if p == q {
            return Err(Error::InvalidConfig("p and q must be distinct"));
        }
        if p <= three || q <= three || p.low_u64() % 4 != 3 || q.low_u64() % 4 != 3 {
            return Err(Error::InvalidConfig("p and q must be 3 mod 4 and above 3"));
        }
        if p.bit_length() + q.bit_length() > Bignum::<LIMBS>::BITS {
            return Err(Error::InvalidConfig("p * q does not fit the configured width"));
        }
        let pq = p * q;
        if x0 <= Bignum::ONE || x0 >= pq {
            return Err(Error::InvalidConfig("seed outside (1, pq)"));
        }
        if (x0 % p).is_zero() || (x0 % q).is_zero() {
            return Err(Error::InvalidConfig("seed shares a factor with the modulus"));
        }
        Ok(Self::with_state(p, q, x0, config.extract))
    }

    /// Draw the seed and assemble the state for a fresh pair.
    fn assemble<E: EntropySource>(
        p: Bignum<LIMBS>,
        q: Bignum<LIMBS>,
        config: &Config,
        entropy: &mut E,
    ) -> Result<Self, Error> {
        let pq = p * q;
        let mut attempts = 0u64;
        let x0 = loop {
            attempts += 1;
            if config.max_attempts.is_some_and(|cap| attempts > cap) {
                return Err(Error::RetriesExhausted("seed sampling"));
            }
            let x = sample_below(entropy, &pq, config.sample_limit)?;
            // 0 and 1 are fixed points, and a seed sharing a factor with pq
            // degenerates into a short cycle
            if x <= Bignum::ONE || (x % p).is_zero() || (x % q).is_zero() {
                continue;
            }
            break x;
        };
        Ok(Self::with_state(p, q, x0, config.extract))
    }

    fn with_state(p: Bignum<LIMBS>, q: Bignum<LIMBS>, x0: Bignum<LIMBS>, extract: u32) -> Self {
        let pq = p * q;
        let c = lcm(p - Bignum::ONE, q - Bignum::ONE);
        let barrett_pq = BarrettContext::new(pq);
        let barrett_c = BarrettContext::new(c);
        Self {
            pq,
            x: x0,
            x0,
            c,
            barrett_pq,
            barrett_c,
            pos: 0,
            extract,
        }
    }

    /// One squaring step: x ← x² mod pq.
    pub fn step(&mut self) {
        self.x = self.barrett_pq.mod_sqr(&self.x);
        self.pos += 1;
    }

    /// Jump straight to absolute position `pos` in O(log pos) modular
    /// multiplications: x_i = x0^(2^i mod c) mod pq, where reducing the
    /// exponent by the group exponent c is what keeps the tower finite.
    pub fn set(&mut self, pos: u64) {
        let e = self
            .barrett_c
            .mod_pow(&Bignum::from(2u8), &Bignum::from(pos));
        self.x = self.barrett_pq.mod_pow(&self.x0, &e);
        self.pos = pos;
    }

    /// Steps taken since the initial state.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn modulus(&self) -> &Bignum<LIMBS> {
        &self.pq
    }

    /// The current state x; exposed for checkpoint-style callers and tests.
    pub fn state(&self) -> &Bignum<LIMBS> {
        &self.x
    }

    pub fn seed(&self) -> &Bignum<LIMBS> {
        &self.x0
    }

    /// Produce `bits` output bits (1..=64), chronologically first bit in the
    /// most significant position. Takes `extract` low state bits per step
    /// while a full window remains, single bits after that.
    pub fn next_bits(&mut self, bits: u32) -> u64 {
        debug_assert!((1..=64).contains(&bits));
        let window = u64::from(self.extract);
        let mask = (1u64 << self.extract) - 1;

        let mut out = 0u64;
        let mut remaining = u64::from(bits);
        while remaining >= window {
            self.step();
            out = (out << self.extract) | (self.x.low_u64() & mask);
            remaining -= window;
        }
        while remaining > 0 {
            self.step();
            out = (out << 1) | (self.x.low_u64() & 1);
            remaining -= 1;
        }
        out
    }

    /// One 64-bit output; what the stream driver writes.
    pub fn next_u64(&mut self) -> u64 {
        self.next_bits(64)
    }

    /// Fill `buf` with output bytes, one 8-bit extraction per byte.
    pub fn next_bytes(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte = self.next_bits(8) as u8;
        }
    }
}
