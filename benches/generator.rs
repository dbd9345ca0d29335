use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bbsgen::bignum::Bignum;
use bbsgen::{BbsGenerator, Config};

// A fixed 512-bit generator so the benches measure arithmetic, not the
// entropy-driven prime search.
const P: &str = "0x7ac7ca1840204dd433352c0f1dc2b02d57efd36d2ad1c7fa10467f6e0034a0bf";
const Q: &str = "0x7f836c5265c184b9466b22a76871c63c4a209d7b44092a96c2bd9881ec4e5b17";
const X0: &str = "0xa8a45ce195e4c67c02b2e75623e8d1b4d479d08d11926ea1af12c13ea06dadd691710f9bd04faf43d804e517a4eb6351e282910ba83241054ea0cafa4a4bcd0";

fn pinned_generator() -> BbsGenerator<8> {
    let p: Bignum<8> = P.parse().unwrap();
    let q: Bignum<8> = Q.parse().unwrap();
    let x0: Bignum<8> = X0.parse().unwrap();
    BbsGenerator::from_parts(p, q, x0, &Config::default()).unwrap()
}

fn bench_step(c: &mut Criterion) {
    let mut generator = pinned_generator();
    c.bench_function("step/512", |b| b.iter(|| generator.step()));
}

fn bench_next_u64(c: &mut Criterion) {
    let mut generator = pinned_generator();
    c.bench_function("next_u64/512", |b| b.iter(|| black_box(generator.next_u64())));
}

fn bench_jump(c: &mut Criterion) {
    let generator = pinned_generator();
    c.bench_function("set/512/1e6", |b| {
        b.iter(|| {
            let mut g = generator.clone();
            g.set(1_000_000);
            black_box(g.pos())
        })
    });
}

criterion_group!(benches, bench_step, bench_next_u64, bench_jump);
criterion_main!(benches);
