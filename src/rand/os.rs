use rand_core::{OsRng, RngCore};

use super::EntropySource;
use crate::error::Error;

/// The platform's cryptographically secure randomness, via `rand_core`'s
/// `OsRng` (getrandom underneath: /dev/urandom, BCryptGenRandom, and
/// friends).
///
/// Construction probes the source once so that an unusable device surfaces
/// as [`Error::Entropy`] before any generator work begins, not halfway
/// through a prime search.
#[derive(Debug, Clone, Copy)]
pub struct OsEntropy(());

impl OsEntropy {
    pub fn new() -> Result<Self, Error> {
        let mut probe = [0u8; 8];
        OsRng.try_fill_bytes(&mut probe).map_err(Error::Entropy)?;
        Ok(Self(()))
    }
}

impl EntropySource for OsEntropy {
    fn try_fill(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        OsRng.try_fill_bytes(buf).map_err(Error::Entropy)
    }
}
