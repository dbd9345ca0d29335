//! Safe-prime search for the generator modulus.
//!
//! Candidates are built as r = 2k + 1 from an odd half-width k with
//! k ≡ 3 (mod 4), so every accepted r satisfies r ≡ 3 (mod 4) by
//! construction. The search loop has no iteration bound: by Bertrand's
//! postulate the sampled range always contains a suitable prime, so it
//! terminates with probability 1, and an optional cap exists purely to make
//! pathological runs diagnosable.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use log::{debug, info};

use crate::bignum::{BarrettContext, Bignum, PrimeTable};
use crate::error::Error;
use crate::rand::{sample_below, EntropySource};

/// Knobs for the safe-prime search.
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Miller-Rabin rounds per certification; 64 keeps the per-prime
    /// false-positive probability at or below 2^-128.
    pub rounds: u32,
    /// Additionally certify k = (r-1)/2 prime, making r a verified
    /// Sophie-Germain safe prime rather than one that merely passes the
    /// weaker checks.
    pub strict: bool,
    /// Candidate cap for the otherwise unbounded search loop.
    pub max_attempts: Option<u64>,
    /// Draw cap handed to each bounded sample.
    pub sample_limit: Option<u32>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            rounds: 64,
            strict: false,
            max_attempts: None,
            sample_limit: None,
        }
    }
}

/// One attempt: sample k, force its two low bits, test r = 2k + 1.
///
/// `None` is a rejected candidate: ordinary control flow, the caller just
/// resamples.
fn safe_prime_candidate<const LIMBS: usize, E: EntropySource>(
    entropy: &mut E,
    table: &PrimeTable<LIMBS>,
    params: &SearchParams,
) -> Result<Option<Bignum<LIMBS>>, Error> {
    let bound = Bignum::ONE << (Bignum::<LIMBS>::BITS / 2 - 2);
    let k = sample_below(entropy, &bound, params.sample_limit)? | Bignum::from(3u8);
    let r = (k << 1) | Bignum::ONE;

    if !r.is_probable_prime(params.rounds, table, entropy)? {
        return Ok(None);
    }

    // Fermat witness on r itself. With k = (r-1)/2 prime, 2^(r-1) ≡ 1
    // (mod r) reinforces the Miller-Rabin verdict at the cost of a single
    // exponentiation.
    let ctx = BarrettContext::new(r);
    if ctx.mod_pow(&Bignum::from(2u8), &(r - Bignum::ONE)) != Bignum::ONE {
        return Ok(None);
    }

    if params.strict && !k.is_probable_prime(params.rounds, table, entropy)? {
        return Ok(None);
    }

    Ok(Some(r))
}

/// Find one safe prime, skipping any candidate equal to `avoid`.
pub fn find_safe_prime<const LIMBS: usize, E: EntropySource>(
    entropy: &mut E,
    table: &PrimeTable<LIMBS>,
    params: &SearchParams,
    avoid: Option<&Bignum<LIMBS>>,
) -> Result<Bignum<LIMBS>, Error> {
    let mut attempts = 0u64;
    loop {
        attempts += 1;
        if params.max_attempts.is_some_and(|cap| attempts > cap) {
            return Err(Error::RetriesExhausted("safe-prime search"));
        }
        if let Some(r) = safe_prime_candidate(entropy, table, params)? {
            if avoid == Some(&r) {
                continue;
            }
            debug!("safe prime found after {attempts} candidates");
            return Ok(r);
        }
    }
}

/// Generate the modulus pair (p, q), p ≠ q, sequentially from one source.
/// Both primes sample from the same range; there is no reason to skew q's
/// distribution relative to p's.
pub fn generate_pair<const LIMBS: usize, E: EntropySource>(
    entropy: &mut E,
    table: &PrimeTable<LIMBS>,
    params: &SearchParams,
) -> Result<(Bignum<LIMBS>, Bignum<LIMBS>), Error> {
    let p = find_safe_prime(entropy, table, params, None)?;
    let q = find_safe_prime(entropy, table, params, Some(&p))?;
    info!(
        "safe prime pair generated: {} and {} bits",
        p.bit_length(),
        q.bit_length()
    );
    Ok((p, q))
}

/// Race independent searches across `workers` threads; the first accepted
/// candidate wins.
///
/// Workers poll the shared flag before every attempt; certification is the
/// expensive part of an attempt, so that is the cooperative cancellation
/// point. The winner claims the flag with a swap and is the only publisher
/// on the single-assignment channel; losing workers observe the flag and
/// fall off their loops. `thread::scope` joins every worker before the
/// result leaves this function, so no search outlives the race. A worker
/// whose entropy source fails also claims the flag and publishes the error:
/// entropy failure is fatal, not something to ride out on other threads.
pub fn find_safe_prime_racing<const LIMBS: usize, E, F>(
    make_entropy: F,
    table: &PrimeTable<LIMBS>,
    params: &SearchParams,
    workers: NonZeroUsize,
    avoid: Option<&Bignum<LIMBS>>,
) -> Result<Bignum<LIMBS>, Error>
where
    E: EntropySource,
    F: Fn(usize) -> Result<E, Error> + Sync,
{
    let found = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<Result<Bignum<LIMBS>, Error>>();

    thread::scope(|scope| {
        for worker in 0..workers.get() {
            let tx = tx.clone();
            let found = &found;
            let make_entropy = &make_entropy;
            scope.spawn(move || {
                let mut entropy = match make_entropy(worker) {
                    Ok(entropy) => entropy,
                    Err(e) => {
                        if !found.swap(true, Ordering::AcqRel) {
                            let _ = tx.send(Err(e));
                        }
                        return;
                    }
                };
                let mut attempts = 0u64;
                loop {
                    if found.load(Ordering::Acquire) {
                        return;
                    }
                    attempts += 1;
                    if params.max_attempts.is_some_and(|cap| attempts > cap) {
                        if !found.swap(true, Ordering::AcqRel) {
                            let _ = tx.send(Err(Error::RetriesExhausted("safe-prime search")));
                        }
                        return;
                    }
                    match safe_prime_candidate(&mut entropy, table, params) {
                        Ok(Some(r)) if avoid != Some(&r) => {
                            if !found.swap(true, Ordering::AcqRel) {
                                debug!("worker {worker} won the safe-prime race");
                                let _ = tx.send(Ok(r));
                            }
                            return;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            if !found.swap(true, Ordering::AcqRel) {
                                let _ = tx.send(Err(e));
                            }
                            return;
                        }
                    }
                }
            });
        }
    });
    drop(tx);

    // every worker has exited; exactly one message is in flight
    match rx.recv() {
        Ok(result) => result,
        Err(_) => Err(Error::RetriesExhausted("safe-prime race")),
    }
}

/// Racing counterpart of [`generate_pair`]: one race for p, then one for q.
pub fn generate_pair_racing<const LIMBS: usize, E, F>(
    make_entropy: F,
    table: &PrimeTable<LIMBS>,
    params: &SearchParams,
    workers: NonZeroUsize,
) -> Result<(Bignum<LIMBS>, Bignum<LIMBS>), Error>
where
    E: EntropySource,
    F: Fn(usize) -> Result<E, Error> + Sync,
{
    let p = find_safe_prime_racing(&make_entropy, table, params, workers, None)?;
    let q = find_safe_prime_racing(&make_entropy, table, params, workers, Some(&p))?;
    info!(
        "safe prime pair generated across {} workers: {} and {} bits",
        workers,
        p.bit_length(),
        q.bit_length()
    );
    Ok((p, q))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rand::XorShift32;

    fn check_pair<const LIMBS: usize>(
        p: &Bignum<LIMBS>,
        q: &Bignum<LIMBS>,
        table: &PrimeTable<LIMBS>,
    ) {
        let mut rng = XorShift32::new(0x0ff1_ce);
        assert_ne!(p, q);
        for r in [p, q] {
            assert!(r.is_probable_prime(32, table, &mut rng).unwrap());
            assert_eq!(r.low_u64() % 4, 3, "candidate must be 3 mod 4");
            let ctx = BarrettContext::new(*r);
            let fermat = ctx.mod_pow(&Bignum::from(2u8), &(r - Bignum::ONE));
            assert!(fermat.is_one());
            // the modulus needs both primes at roughly half width
            assert!(r.bit_length() <= Bignum::<LIMBS>::BITS / 2);
        }
    }

    #[test]
    fn sequential_pair_upholds_the_safe_prime_invariants() {
        let table = PrimeTable::<2>::default();
        let mut rng = XorShift32::new(0xdead_10cc);
        let (p, q) = generate_pair(&mut rng, &table, &SearchParams::default()).unwrap();
        check_pair(&p, &q, &table);
    }

    #[test]
    fn strict_mode_certifies_the_sophie_germain_half() {
        let table = PrimeTable::<1>::default();
        let mut rng = XorShift32::new(0x5af3_0001);
        let params = SearchParams {
            strict: true,
            ..Default::default()
        };
        let p = find_safe_prime(&mut rng, &table, &params, None).unwrap();
        let k = (p - Bignum::ONE) >> 1;
        let mut check_rng = XorShift32::new(0x7357_7357);
        assert!(k.is_probable_prime(32, &table, &mut check_rng).unwrap());
    }

    #[test]
    fn attempt_cap_surfaces_instead_of_hanging() {
        let table = PrimeTable::<2>::default();
        let mut rng = XorShift32::new(3);
        let params = SearchParams {
            max_attempts: Some(1),
            rounds: 1,
            ..Default::default()
        };
        // one candidate is almost surely rejected; the cap must fire as an
        // error rather than spin
        let mut caps_hit = 0;
        for _ in 0..4 {
            if matches!(
                find_safe_prime(&mut rng, &table, &params, None),
                Err(Error::RetriesExhausted(_))
            ) {
                caps_hit += 1;
            }
        }
        assert!(caps_hit > 0);
    }

    #[test]
    fn racing_search_publishes_exactly_one_valid_prime() {
        let table = PrimeTable::<2>::default();
        let params = SearchParams::default();
        let workers = NonZeroUsize::new(3).unwrap();
        let (p, q) = generate_pair_racing(
            |worker| Ok(XorShift32::new(0x9e37_79b9 + worker as u32)),
            &table,
            &params,
            workers,
        )
        .unwrap();
        check_pair(&p, &q, &table);
    }

    #[test]
    fn racing_search_propagates_entropy_failure() {
        let table = PrimeTable::<2>::default();
        let params = SearchParams::default();
        let workers = NonZeroUsize::new(2).unwrap();
        let result: Result<Bignum<2>, _> = find_safe_prime_racing(
            |_| -> Result<XorShift32, Error> {
                Err(Error::RetriesExhausted("simulated entropy failure"))
            },
            &table,
            &params,
            workers,
            None,
        );
        assert!(result.is_err());
    }
}
