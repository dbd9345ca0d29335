use super::wide::WideBignum;
use super::Bignum;

/// Precomputed Barrett reciprocal for one modulus.
///
/// Stores mu = floor(2^(2W) / n) + 1 so that reducing a double-width value
/// modulo n costs two wide multiplies and at most one correction instead of
/// a division. One context exists per modulus in active use: the generator
/// keeps one for pq and one for the cycle length, the primality tester
/// builds one per candidate.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BarrettContext<const LIMBS: usize> {
    modulus: Bignum<LIMBS>,
    mu: WideBignum<LIMBS>,
}

impl<const LIMBS: usize> BarrettContext<LIMBS> {
    pub fn new(modulus: Bignum<LIMBS>) -> Self {
        debug_assert!(modulus > Bignum::ONE, "modulus must exceed one");
        let (mut mu, _) = WideBignum::MAX.divmod(&modulus);
        let carried = mu.add_with_overflow(&WideBignum::new_low(Bignum::ONE));
        debug_assert!(!carried);
        Self { modulus, mu }
    }

    pub fn modulus(&self) -> &Bignum<LIMBS> {
        &self.modulus
    }

    /// value mod n for value < n².
    ///
    /// The quotient estimate q = floor(value * mu / 2^(2W)) is exact or one
    /// too high, never too low, so the only correction ever needed is adding
    /// n back when the subtraction underflows.
    fn reduce(&self, value: WideBignum<LIMBS>) -> Bignum<LIMBS> {
        let (q_hi, q_lo) = value.mul_high(&self.mu).split();
        debug_assert!(q_hi.is_zero(), "operand not within n^2");

        let mut r = value;
        let overshoot = r.sub_with_overflow(&q_lo.mul_wide(&self.modulus));
        if overshoot {
            r.add_with_overflow(&WideBignum::new_low(self.modulus));
        }

        let (hi, lo) = r.split();
        debug_assert!(hi.is_zero() && lo < self.modulus);
        lo
    }

    /// a * b mod n for already-reduced operands.
    pub fn mod_mul(&self, a: &Bignum<LIMBS>, b: &Bignum<LIMBS>) -> Bignum<LIMBS> {
        self.reduce(a.mul_wide(b))
    }

    /// a² mod n for an already-reduced operand; the generator's step.
    pub fn mod_sqr(&self, a: &Bignum<LIMBS>) -> Bignum<LIMBS> {
        self.reduce(a.mul_wide(a))
    }

    /// base^exponent mod n by binary exponentiation, scanning the exponent
    /// from the least significant bit: one modular squaring per bit and one
    /// multiply per set bit, everything routed through `reduce`.
    pub fn mod_pow(&self, base: &Bignum<LIMBS>, exponent: &Bignum<LIMBS>) -> Bignum<LIMBS> {
        let mut result = Bignum::ONE;
        let mut base = self.reduce(WideBignum::new_low(*base));
        let mut exponent = *exponent;
        while !exponent.is_zero() {
            if exponent.is_odd() {
                result = self.mod_mul(&result, &base);
            }
            base = self.mod_sqr(&base);
            exponent >>= 1;
        }
        result
    }
}
