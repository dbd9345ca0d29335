use super::Bignum;

/// Greatest common divisor by Stein's binary algorithm: only shifts and
/// subtraction, no division.
///
/// The subtraction runs on the unsigned fixed-width type and is allowed to
/// wrap; a wrapped difference is put right by two's-complement negation.
/// Which operand ends up subtracted from which only affects the sign of the
/// difference, never its magnitude.
pub fn gcd<const LIMBS: usize>(a: Bignum<LIMBS>, b: Bignum<LIMBS>) -> Bignum<LIMBS> {
    if a.is_zero() {
        return b;
    }
    if b.is_zero() {
        return a;
    }

    let shift = a.trailing_zeros().min(b.trailing_zeros());
    let mut a = a >> a.trailing_zeros();
    let mut b = b >> b.trailing_zeros();

    loop {
        debug_assert!(a.is_odd() && b.is_odd());

        let mut diff = b;
        let wrapped = diff.sub_with_overflow(&a);
        if diff.is_zero() {
            break;
        }
        if a < b {
            b = a;
        }
        if wrapped {
            diff.negate();
        }
        a = diff >> diff.trailing_zeros();
    }

    b << shift
}

/// Least common multiple; the caller guarantees the result fits the width.
/// The generator uses it once per construction, for the cycle length
/// lcm(p-1, q-1) of two half-width primes.
pub fn lcm<const LIMBS: usize>(a: Bignum<LIMBS>, b: Bignum<LIMBS>) -> Bignum<LIMBS> {
    if a.is_zero() || b.is_zero() {
        return Bignum::ZERO;
    }
    (a / gcd(a, b)) * b
}
