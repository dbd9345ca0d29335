use std::cmp::Ordering;
use std::ops::{
    Add, AddAssign, BitAnd, BitAndAssign, BitOr, BitOrAssign, Div, DivAssign, Mul, MulAssign, Rem,
    RemAssign, Shl, ShlAssign, Shr, ShrAssign, Sub, SubAssign,
};

use super::Bignum;

// carrying_add and friends are still nightly-only on the primitives, so we
// carry our own
#[inline]
pub(super) const fn carrying_add(x: u64, y: u64, carry: bool) -> (u64, bool) {
    let (a, b) = x.overflowing_add(y);
    let (c, d) = a.overflowing_add(carry as u64);
    (c, b != d)
}

#[inline]
pub(super) const fn borrowing_sub(x: u64, y: u64, borrow: bool) -> (u64, bool) {
    let (a, b) = x.overflowing_sub(y);
    let (c, d) = a.overflowing_sub(borrow as u64);
    (c, b != d)
}

/// x * y + acc + carry never overflows: the fused form is at most
/// (2^64 - 1)^2 + 2 * (2^64 - 1) = 2^128 - 1.
#[inline]
pub(super) const fn carrying_mul_add(x: u64, y: u64, acc: u64, carry: u64) -> (u64, u64) {
    let wide = x as u128 * y as u128 + acc as u128 + carry as u128;
    (wide as u64, (wide >> 64) as u64)
}

impl<const LIMBS: usize> Bignum<LIMBS> {
    pub(super) fn add_with_overflow(&mut self, rhs: &Self) -> bool {
        self.carrying_add_with_overflow(rhs, false)
    }

    pub(super) fn sub_with_overflow(&mut self, rhs: &Self) -> bool {
        self.borrowing_sub_with_overflow(rhs, false)
    }

    /// Add with an incoming carry; lets two narrow additions chain into a
    /// double-width one.
    pub(super) fn carrying_add_with_overflow(&mut self, rhs: &Self, mut carry: bool) -> bool {
        for (l, r) in self.limbs.iter_mut().zip(rhs.limbs.iter()) {
            let (sum, overflow) = carrying_add(*l, *r, carry);
            *l = sum;
            carry = overflow;
        }
        carry
    }

    /// Subtract with an incoming borrow; the subtraction counterpart of
    /// `carrying_add_with_overflow`.
    pub(super) fn borrowing_sub_with_overflow(&mut self, rhs: &Self, mut borrow: bool) -> bool {
        for (l, r) in self.limbs.iter_mut().zip(rhs.limbs.iter()) {
            let (diff, underflow) = borrowing_sub(*l, *r, borrow);
            *l = diff;
            borrow = underflow;
        }
        borrow
    }

    /// Two's-complement negation in place. On an unsigned type this maps x
    /// to 2^W - x; the GCD uses it to take |a - b| after a wrapped subtract.
    pub(super) fn negate(&mut self) {
        let mut carry = true;
        for l in self.limbs.iter_mut() {
            let (sum, overflow) = carrying_add(!*l, 0, carry);
            *l = sum;
            carry = overflow;
        }
    }

    pub(super) fn mul_with_overflow(&mut self, rhs: &Self) -> bool {
        let mut out = Self::ZERO;
        let mut overflow = false;

        for (i, r) in rhs.limbs.iter().enumerate() {
            if *r == 0 {
                continue;
            }
            // limbs at i + j >= LIMBS have nowhere to go; any nonzero
            // product there is an overflow
            let mut carry = 0;
            for (l, o) in self.limbs[..LIMBS - i].iter().zip(out.limbs[i..].iter_mut()) {
                let (low, high) = carrying_mul_add(*r, *l, *o, carry);
                *o = low;
                carry = high;
            }
            overflow |= carry != 0;
            overflow |= self.limbs[LIMBS - i..].iter().any(|l| *l != 0);
        }

        *self = out;
        overflow
    }

    /// Multiply discarding everything past the width; the trial-division
    /// reciprocal test wants exactly the wrapped product.
    pub(super) fn wrapping_mul(&self, rhs: &Self) -> Self {
        let mut out = *self;
        out.mul_with_overflow(rhs);
        out
    }

    pub(super) fn shr_with_overflow(&mut self, rhs: u32) -> bool {
        if rhs as usize >= LIMBS * 64 {
            *self = Self::ZERO;
            return true;
        }
        if rhs == 0 {
            return false;
        }

        let limb_shift = rhs as usize / 64;
        let bit_shift = rhs % 64;

        if bit_shift == 0 {
            self.limbs.copy_within(limb_shift..LIMBS, 0);
        } else {
            for i in 0..(LIMBS - limb_shift - 1) {
                let upper = self.limbs[limb_shift + i + 1] << (64 - bit_shift);
                let lower = self.limbs[limb_shift + i] >> bit_shift;
                self.limbs[i] = upper | lower;
            }
            self.limbs[LIMBS - limb_shift - 1] = self.limbs[LIMBS - 1] >> bit_shift;
        }

        for i in 0..limb_shift {
            self.limbs[LIMBS - i - 1] = 0;
        }

        false
    }

    pub(super) fn shl_with_overflow(&mut self, rhs: u32) -> bool {
        if rhs as usize >= LIMBS * 64 {
            *self = Self::ZERO;
            return true;
        }
        if rhs == 0 {
            return false;
        }

        let limb_shift = rhs as usize / 64;
        let bit_shift = rhs % 64;

        if bit_shift == 0 {
            self.limbs.copy_within(0..LIMBS - limb_shift, limb_shift);
        } else {
            for i in (limb_shift + 1..LIMBS).rev() {
                let upper = self.limbs[i - limb_shift] << bit_shift;
                let lower = self.limbs[i - limb_shift - 1] >> (64 - bit_shift);
                self.limbs[i] = upper | lower;
            }
            self.limbs[limb_shift] = self.limbs[0] << bit_shift;
        }

        for i in 0..limb_shift {
            self.limbs[i] = 0;
        }

        false
    }

    pub(super) fn bitwise_and(&mut self, rhs: &Self) {
        for (l, r) in self.limbs.iter_mut().zip(rhs.limbs.iter()) {
            *l &= *r;
        }
    }

    pub(super) fn bitwise_or(&mut self, rhs: &Self) {
        for (l, r) in self.limbs.iter_mut().zip(rhs.limbs.iter()) {
            *l |= *r;
        }
    }
}

impl<const LIMBS: usize> PartialOrd for Bignum<LIMBS> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const LIMBS: usize> Ord for Bignum<LIMBS> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.limbs
            .iter()
            .zip(other.limbs.iter())
            .rev()
            .map(|(a, b)| a.cmp(b))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

macro_rules! impl_from_for_bignum {
    ($uX:ty) => {
        impl<const LIMBS: usize> From<$uX> for Bignum<LIMBS> {
            fn from(value: $uX) -> Self {
                let mut limbs = [0; LIMBS];
                limbs[0] = value.into();
                Self { limbs }
            }
        }
    };
}

impl_from_for_bignum!(u64);
impl_from_for_bignum!(u32);
impl_from_for_bignum!(u16);
impl_from_for_bignum!(u8);

macro_rules! bignum_arith_impls {
    ($rhs:ty, allow_rhs_ref, $trait:ident, $op:ident, $trait_assign:ident, $op_assign:ident, $method:ident, $overflow_message:literal) => {
        impl<const LIMBS: usize> $trait<$rhs> for Bignum<LIMBS> {
            type Output = Self;

            fn $op(mut self, rhs: $rhs) -> Self::Output {
                let overflow = self.$method(&rhs);
                debug_assert!(!overflow, $overflow_message);
                self
            }
        }

        impl<const LIMBS: usize> $trait<&$rhs> for Bignum<LIMBS> {
            type Output = Self;

            fn $op(mut self, rhs: &$rhs) -> Self::Output {
                let overflow = self.$method(rhs);
                debug_assert!(!overflow, $overflow_message);
                self
            }
        }

        impl<const LIMBS: usize> $trait<$rhs> for &Bignum<LIMBS> {
            type Output = Bignum<LIMBS>;

            fn $op(self, rhs: $rhs) -> Self::Output {
                let mut out = *self;
                let overflow = out.$method(&rhs);
                debug_assert!(!overflow, $overflow_message);
                out
            }
        }

        impl<const LIMBS: usize> $trait<&$rhs> for &Bignum<LIMBS> {
            type Output = Bignum<LIMBS>;

            fn $op(self, rhs: &$rhs) -> Self::Output {
                let mut out = *self;
                let overflow = out.$method(rhs);
                debug_assert!(!overflow, $overflow_message);
                out
            }
        }

        impl<const LIMBS: usize> $trait_assign<$rhs> for Bignum<LIMBS> {
            fn $op_assign(&mut self, rhs: $rhs) {
                let overflow = self.$method(&rhs);
                debug_assert!(!overflow, $overflow_message);
            }
        }

        impl<const LIMBS: usize> $trait_assign<&$rhs> for Bignum<LIMBS> {
            fn $op_assign(&mut self, rhs: &$rhs) {
                let overflow = self.$method(rhs);
                debug_assert!(!overflow, $overflow_message);
            }
        }
    };

    ($rhs:ty, allow_rhs_ref, $trait:ident, $op:ident, $trait_assign:ident, $op_assign:ident, $method:ident, no_overflow) => {
        impl<const LIMBS: usize> $trait<$rhs> for Bignum<LIMBS> {
            type Output = Self;

            fn $op(mut self, rhs: $rhs) -> Self::Output {
                self.$method(&rhs);
                self
            }
        }

        impl<const LIMBS: usize> $trait<&$rhs> for Bignum<LIMBS> {
            type Output = Self;

            fn $op(mut self, rhs: &$rhs) -> Self::Output {
                self.$method(rhs);
                self
            }
        }

        impl<const LIMBS: usize> $trait<$rhs> for &Bignum<LIMBS> {
            type Output = Bignum<LIMBS>;

            fn $op(self, rhs: $rhs) -> Self::Output {
                let mut out = *self;
                out.$method(&rhs);
                out
            }
        }

        impl<const LIMBS: usize> $trait<&$rhs> for &Bignum<LIMBS> {
            type Output = Bignum<LIMBS>;

            fn $op(self, rhs: &$rhs) -> Self::Output {
                let mut out = *self;
                out.$method(rhs);
                out
            }
        }

        impl<const LIMBS: usize> $trait_assign<$rhs> for Bignum<LIMBS> {
            fn $op_assign(&mut self, rhs: $rhs) {
                self.$method(&rhs)
            }
        }

        impl<const LIMBS: usize> $trait_assign<&$rhs> for Bignum<LIMBS> {
            fn $op_assign(&mut self, rhs: &$rhs) {
                self.$method(rhs)
            }
        }
    };

    ($rhs:ty, no_rhs_ref, $trait:ident, $op:ident, $trait_assign:ident, $op_assign:ident, $method:ident, $overflow_message:literal) => {
        impl<const LIMBS: usize> $trait<$rhs> for Bignum<LIMBS> {
            type Output = Self;

            fn $op(mut self, rhs: $rhs) -> Self::Output {
                let overflow = self.$method(rhs);
                debug_assert!(!overflow, $overflow_message);
                self
            }
        }

        impl<const LIMBS: usize> $trait<$rhs> for &Bignum<LIMBS> {
            type Output = Bignum<LIMBS>;

            fn $op(self, rhs: $rhs) -> Self::Output {
                let mut out = *self;
                let overflow = out.$method(rhs);
                debug_assert!(!overflow, $overflow_message);
                out
            }
        }

        impl<const LIMBS: usize> $trait_assign<$rhs> for Bignum<LIMBS> {
            fn $op_assign(&mut self, rhs: $rhs) {
                let overflow = self.$method(rhs);
                debug_assert!(!overflow, $overflow_message);
            }
        }
    };
}

bignum_arith_impls!(
    Bignum<LIMBS>,
    allow_rhs_ref,
    Add,
    add,
    AddAssign,
    add_assign,
    add_with_overflow,
    "attempt to add with overflow"
);

bignum_arith_impls!(
    Bignum<LIMBS>,
    allow_rhs_ref,
    Sub,
    sub,
    SubAssign,
    sub_assign,
    sub_with_overflow,
    "attempt to subtract with overflow"
);

bignum_arith_impls!(
    Bignum<LIMBS>,
    allow_rhs_ref,
    Mul,
    mul,
    MulAssign,
    mul_assign,
    mul_with_overflow,
    "attempt to multiply with overflow"
);

bignum_arith_impls!(
    u32,
    no_rhs_ref,
    Shr,
    shr,
    ShrAssign,
    shr_assign,
    shr_with_overflow,
    "attempt to shift-right with overflow"
);

bignum_arith_impls!(
    u32,
    no_rhs_ref,
    Shl,
    shl,
    ShlAssign,
    shl_assign,
    shl_with_overflow,
    "attempt to shift-left with overflow"
);

bignum_arith_impls!(
    Bignum<LIMBS>,
    allow_rhs_ref,
    BitAnd,
    bitand,
    BitAndAssign,
    bitand_assign,
    bitwise_and,
    no_overflow
);

bignum_arith_impls!(
    Bignum<LIMBS>,
    allow_rhs_ref,
    BitOr,
    bitor,
    BitOrAssign,
    bitor_assign,
    bitwise_or,
    no_overflow
);

bignum_arith_impls!(
    Bignum<LIMBS>,
    allow_rhs_ref,
    Div,
    div,
    DivAssign,
    div_assign,
    quotient,
    no_overflow
);

bignum_arith_impls!(
    Bignum<LIMBS>,
    allow_rhs_ref,
    Rem,
    rem,
    RemAssign,
    rem_assign,
    remainder,
    no_overflow
);
