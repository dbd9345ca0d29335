//! End-to-end scenarios over the 512-bit generator.
//!
//! The pinned constants were produced by an independent arbitrary-precision
//! model of the same algorithms driven by the same xorshift32 stream, so
//! these tests nail the full pipeline, from sampling and prime search to
//! seeding, stepping and jump-ahead, bit for bit.

use bbsgen::bignum::{Bignum, PrimeTable};
use bbsgen::rand::XorShift32;
use bbsgen::{BbsGenerator, Config, Error};

type U512 = Bignum<8>;

const GOLDEN_SEED: u32 = 0xc0ffee11;

const GOLDEN_P: &str = "0x7ac7ca1840204dd433352c0f1dc2b02d57efd36d2ad1c7fa10467f6e0034a0bf";
const GOLDEN_Q: &str = "0x7f836c5265c184b9466b22a76871c63c4a209d7b44092a96c2bd9881ec4e5b17";
const GOLDEN_X0: &str = "0xa8a45ce195e4c67c02b2e75623e8d1b4d479d08d11926ea1af12c13ea06dadd691710f9bd04faf43d804e517a4eb6351e282910ba83241054ea0cafa4a4bcd0";
const GOLDEN_PQ: &str = "0x3d282572404770f9121cafad32b5f8211757425dcde527a29ee85fbc0735dc424083e2c02aa1aeca825bc357ee129979f6b6fe64839ae357864f896cc8105629";
const GOLDEN_C: &str = "0x25a28d329db5cf5e3287ce91f7d2714f70d33c887eb46728ff53ec24f0beaeed1785565c02ec38c31910e54fa26150a7968de0e9e5626cc90bdfa84cd5e0d52";

const GOLDEN_OUTPUTS: [u64; 10] = [
    0xf4d1888d0d759408,
    0xedc0b77c9584c427,
    0x84045df88783028b,
    0x181a90ad00c59064,
    0xf65f2c79138fdfd8,
    0x8fab0e3d58f79bba,
    0x2aa9a8ab484278ef,
    0xff86521985efbe5b,
    0xec95d7d3bf57d28d,
    0x915ff54554c3ff64,
];

fn golden_parts() -> (U512, U512, U512) {
    (
        GOLDEN_P.parse().unwrap(),
        GOLDEN_Q.parse().unwrap(),
        GOLDEN_X0.parse().unwrap(),
    )
}

fn golden_generator() -> BbsGenerator<8> {
    let (p, q, x0) = golden_parts();
    BbsGenerator::from_parts(p, q, x0, &Config::default()).unwrap()
}

#[test]
fn full_construction_reproduces_the_golden_stream() {
    let table = PrimeTable::default();
    let mut entropy = XorShift32::new(GOLDEN_SEED);
    let mut generator =
        BbsGenerator::<8>::generate(&Config::default(), &table, &mut entropy).unwrap();

    assert_eq!(*generator.modulus(), GOLDEN_PQ.parse().unwrap());
    assert_eq!(*generator.seed(), GOLDEN_X0.parse().unwrap());

    for (i, want) in GOLDEN_OUTPUTS.iter().enumerate() {
        assert_eq!(generator.next_u64(), *want, "output {i}");
    }
    assert_eq!(generator.pos(), 640);

    // rewind to the position right after the first output and the rest of
    // the stream must fall out identically
    generator.set(64);
    for (i, want) in GOLDEN_OUTPUTS.iter().enumerate().skip(1) {
        assert_eq!(generator.next_u64(), *want, "replayed output {i}");
    }
}

#[test]
fn golden_parts_satisfy_the_safe_prime_invariants() {
    let (p, q, x0) = golden_parts();
    let table = PrimeTable::default();
    let mut rng = XorShift32::new(0x5125_1251);

    assert_ne!(p, q);
    for r in [p, q] {
        assert_eq!(r.low_u64() % 4, 3);
        assert!(r.is_probable_prime(16, &table, &mut rng).unwrap());
    }
    assert_eq!(p * q, GOLDEN_PQ.parse().unwrap());
    assert!(x0 > Bignum::ONE);
    assert!(x0 < p * q);
}

#[test]
fn jump_ahead_equals_sequential_stepping() {
    let reference = golden_generator();
    assert_eq!(*reference.state(), GOLDEN_X0.parse().unwrap());

    for target in [0u64, 1, 2, 17, 64, 129, 640] {
        let mut walker = reference.clone();
        for _ in 0..target {
            walker.step();
        }
        let mut jumper = reference.clone();
        jumper.set(target);
        assert_eq!(jumper.state(), walker.state(), "position {target}");
    }
}

#[test]
fn identical_parts_produce_identical_streams() {
    let mut a = golden_generator();
    let mut b = golden_generator();

    let mut bytes_a = [0u8; 128];
    let mut bytes_b = [0u8; 128];
    a.next_bytes(&mut bytes_a);
    b.next_bytes(&mut bytes_b);
    assert_eq!(bytes_a, bytes_b);
    assert_eq!(a.pos(), 8 * 128);
}

#[test]
fn checkpoint_resumption_through_from_parts_and_set() {
    let mut original = golden_generator();
    let mut skipped = [0u8; 40];
    original.next_bytes(&mut skipped);
    let checkpoint = original.pos();

    // a caller that stashed (p, q, x0, pos) rebuilds and fast-forwards
    let (p, q, x0) = golden_parts();
    let mut resumed = BbsGenerator::from_parts(p, q, x0, &Config::default()).unwrap();
    resumed.set(checkpoint);
    assert_eq!(resumed.state(), original.state());

    let mut rest_a = [0u8; 24];
    let mut rest_b = [0u8; 24];
    original.next_bytes(&mut rest_a);
    resumed.next_bytes(&mut rest_b);
    assert_eq!(rest_a, rest_b);
}

#[test]
fn cycle_length_matches_the_model() {
    // c = lcm(p-1, q-1) drives the jump-ahead exponent reduction; pin it so
    // a silent change to the gcd path cannot hide
    let generator = golden_generator();
    let expected: U512 = GOLDEN_C.parse().unwrap();

    let mut jumper = generator.clone();
    let mut stepper = generator;
    // stepping by 1 and jumping to 1 agree only if the stored cycle is right
    jumper.set(1);
    stepper.step();
    assert_eq!(jumper.state(), stepper.state());

    let (p, q, _) = golden_parts();
    let c = bbsgen::bignum::lcm(p - Bignum::ONE, q - Bignum::ONE);
    assert_eq!(c, expected);
}

#[test]
fn miller_rabin_knowns_at_full_width() {
    let table = PrimeTable::default();
    let mut rng = XorShift32::new(0x5125_1251);

    // 2^512 - 569 is the largest 512-bit prime
    let p512: U512 = Bignum::MAX - Bignum::from(568u32);
    assert!(p512.is_probable_prime(16, &table, &mut rng).unwrap());
    assert!(!(p512 - Bignum::from(2u8))
        .is_probable_prime(16, &table, &mut rng)
        .unwrap());
}

#[test]
fn misconfigured_generators_are_rejected_not_clamped() {
    let (p, q, x0) = golden_parts();

    let config = Config {
        extract: 4, // log2(log2(512)) = 3 is the ceiling
        ..Config::default()
    };
    assert!(matches!(
        BbsGenerator::from_parts(p, q, x0, &config),
        Err(Error::InvalidConfig(_))
    ));

    let config = Config {
        rounds: 0,
        ..Config::default()
    };
    assert!(matches!(
        BbsGenerator::from_parts(p, q, x0, &config),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn capped_search_under_dead_entropy_errors_out() {
    // an entropy stream that can never satisfy the sampler must surface as
    // an error instead of hanging the construction
    struct AllOnes;
    impl bbsgen::rand::EntropySource for AllOnes {
        fn try_fill(&mut self, buf: &mut [u8]) -> Result<(), Error> {
            buf.fill(0xff);
            Ok(())
        }
    }

    let table = PrimeTable::default();
    let config = Config {
        max_attempts: Some(4),
        sample_limit: Some(4),
        ..Config::default()
    };
    let result = BbsGenerator::<2>::generate(&config, &table, &mut AllOnes);
    assert!(matches!(result, Err(Error::RetriesExhausted(_))));
}
