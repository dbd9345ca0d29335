//! Fixed-width unsigned big integers and the modular machinery on top of
//! them: widening multiplication, Barrett reduction, Stein's GCD and
//! probabilistic primality testing.
//!
//! THE BIBLE: https://cacr.uwaterloo.ca/hac/about/chap14.pdf

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use crate::error::Error;
use crate::rand::EntropySource;

mod arith;
mod barrett;
mod gcd;
mod primality;
mod wide;

pub use barrett::BarrettContext;
pub use gcd::{gcd, lcm};
pub use primality::PrimeTable;

/// An unsigned integer of exactly `64 * LIMBS` bits.
///
/// Limbs are stored least significant first. There is no implicit
/// truncation anywhere: the in-place arithmetic in `arith` reports carries
/// and borrows explicitly, and multiplication that can exceed the width goes
/// through [`wide::WideBignum`] instead of wrapping.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Bignum<const LIMBS: usize> {
    limbs: [u64; LIMBS],
}

impl<const LIMBS: usize> Bignum<LIMBS> {
    /// Width of the type in bits.
    pub const BITS: u32 = 64 * LIMBS as u32;

    pub const MAX: Self = Self {
        limbs: [u64::MAX; LIMBS],
    };

    pub const ZERO: Self = Self {
        limbs: [0; LIMBS],
    };

    pub const ONE: Self = {
        let mut limbs = [0u64; LIMBS];
        limbs[0] = 1;
        Bignum { limbs }
    };

    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|x| *x == 0)
    }

    pub fn is_one(&self) -> bool {
        self.limbs[0] == 1 && self.limbs.iter().skip(1).all(|x| *x == 0)
    }

    pub fn is_even(&self) -> bool {
        self.limbs[0] & 1 == 0
    }

    pub fn is_odd(&self) -> bool {
        !self.is_even()
    }

    /// The least significant 64 bits; where the generator's output comes
    /// from.
    pub fn low_u64(&self) -> u64 {
        self.limbs[0]
    }

    pub fn leading_zeros(&self) -> u32 {
        let zero_limbs = self
            .limbs
            .iter()
            .rev()
            .take_while(|&&limb| limb == 0)
            .count();
        let partial = self
            .limbs
            .get((LIMBS - zero_limbs).wrapping_sub(1))
            .map_or(0, |limb| limb.leading_zeros());
        zero_limbs as u32 * 64 + partial
    }

    pub fn trailing_zeros(&self) -> u32 {
        let zero_limbs = self.limbs.iter().take_while(|&&limb| limb == 0).count();
        let partial = self
            .limbs
            .get(zero_limbs)
            .map_or(0, |limb| limb.trailing_zeros());
        zero_limbs as u32 * 64 + partial
    }

    /// The number of bits required to represent this number.
    pub fn bit_length(&self) -> u32 {
        Self::BITS - self.leading_zeros()
    }

    /// Draw a uniformly random value across the full width of the type,
    /// filling limbs least significant first, each from eight little-endian
    /// bytes of the source.
    pub fn random<E: EntropySource>(entropy: &mut E) -> Result<Self, Error> {
        let mut out = Self::ZERO;
        let mut bytes = [0u8; 8];
        for limb in out.limbs.iter_mut() {
            entropy.try_fill(&mut bytes)?;
            *limb = u64::from_le_bytes(bytes);
        }
        Ok(out)
    }

    /// Restoring division: returns (self / rhs, self % rhs).
    pub fn divmod(&self, rhs: &Self) -> (Self, Self) {
        debug_assert!(!rhs.is_zero(), "attempt to divide by zero");

        if rhs.is_one() {
            return (*self, Self::ZERO);
        }
        if rhs > self {
            return (Self::ZERO, *self);
        }

        let mut remainder = *self;
        let mut divisor = *rhs;
        let mut quotient = Self::ZERO;

        // line the divisor up with the dividend, then produce one quotient
        // bit per step back down
        let steps = divisor.leading_zeros() - remainder.leading_zeros();
        divisor <<= steps;
        for _ in 0..=steps {
            quotient <<= 1;
            if remainder >= divisor {
                remainder -= &divisor;
                quotient.limbs[0] |= 1;
            }
            divisor >>= 1;
        }

        (quotient, remainder)
    }

    /// The div part of the divmod.
    pub fn quotient(&mut self, rhs: &Self) {
        *self = self.divmod(rhs).0;
    }

    /// The mod part of the divmod.
    pub fn remainder(&mut self, rhs: &Self) {
        *self = self.divmod(rhs).1;
    }
}

impl<const LIMBS: usize> Default for Bignum<LIMBS> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<const LIMBS: usize> fmt::Display for Bignum<LIMBS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0x0");
        }

        let mut first = true;
        for limb in self.limbs.iter().rev() {
            if first {
                if *limb != 0 {
                    write!(f, "0x{limb:x}")?;
                    first = false;
                }
            } else {
                write!(f, "{limb:016x}")?;
            }
        }

        Ok(())
    }
}

impl<const LIMBS: usize> FromStr for Bignum<LIMBS> {
    type Err = ParseIntError;

    fn from_str(mut s: &str) -> Result<Self, Self::Err> {
        s = s.strip_prefix("0x").unwrap_or(s);
        let digits = s.as_bytes();
        if digits.is_empty() || digits.len() > LIMBS * 16 {
            return Err(u64::from_str("").unwrap_err());
        }

        let mut out = Self::ZERO;
        for (limb, chunk) in out.limbs.iter_mut().zip(digits.rchunks(16)) {
            *limb = u64::from_str_radix(
                std::str::from_utf8(chunk).expect("hex digits are single bytes"),
                16,
            )?;
        }

        Ok(out)
    }
}
