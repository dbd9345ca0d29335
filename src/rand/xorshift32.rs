use super::EntropySource;
use crate::error::Error;

/// Marsaglia's xorshift32, serialised a little-endian word at a time.
///
/// A deterministic stand-in for the real entropy source: tests pin seeds to
/// make prime searches and output streams reproducible. Not remotely
/// cryptographically secure; never wire it into a production generator.
#[derive(Debug, Copy, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub fn new(seed: u32) -> Self {
        assert!(seed != 0, "xorshift32 cannot be seeded with zero");
        Self { state: seed }
    }

    fn next_word(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

impl EntropySource for XorShift32 {
    fn try_fill(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        for chunk in buf.chunks_mut(4) {
            let word = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
        Ok(())
    }
}
