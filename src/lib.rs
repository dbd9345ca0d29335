//! A Blum Blum Shub cryptographically hard pseudorandom generator.
//!
//! The state evolves by x ← x² mod pq for two freshly generated safe primes
//! p ≡ q ≡ 3 (mod 4); low-order bits of each state become output, and any
//! absolute stream position is reachable in logarithmic time by reducing the
//! exponent tower modulo lcm(p-1, q-1). Predicting the stream is as hard as
//! factoring pq.
//!
//! Everything rests on fixed-width limb arithmetic with Barrett reduction
//! (see [`bignum`]), so the modulus width is a compile-time choice
//! (`BbsGenerator<8>` is a 512-bit generator, `<16>` 1024 bits, and so on).

pub mod bbs;
pub mod bignum;
pub mod error;
pub mod primes;
pub mod rand;

pub use bbs::{BbsGenerator, Config};
pub use error::Error;
