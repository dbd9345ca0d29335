use std::io::{self, Write};
use std::num::NonZeroUsize;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use bbsgen::bignum::PrimeTable;
use bbsgen::rand::OsEntropy;
use bbsgen::{BbsGenerator, Config};

/// Stream cryptographically hard pseudorandom bytes from a Blum Blum Shub
/// generator seeded with freshly generated safe primes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// modulus width in bits: 512, 1024, 2048, 4096 or 8192
    #[arg(short, long, default_value_t = 1024)]
    bits: u32,

    /// miller-rabin rounds per prime certification
    #[arg(long, default_value_t = 64)]
    rounds: u32,

    /// low bits extracted per squaring step, at most log2(log2(bits))
    #[arg(long, default_value_t = 1)]
    extract: u32,

    /// number of small primes in the trial-division table
    #[arg(long, default_value_t = PrimeTable::<1>::DEFAULT_LEN)]
    table_size: usize,

    /// also certify (r-1)/2 prime for every safe prime found
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// race the safe-prime search across this many worker threads
    #[arg(short, long)]
    workers: Option<NonZeroUsize>,

    /// stop after this many 64-bit outputs instead of streaming forever
    #[arg(short, long)]
    limit: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.bits {
        512 => run::<8>(&args),
        1024 => run::<16>(&args),
        2048 => run::<32>(&args),
        4096 => run::<64>(&args),
        8192 => run::<128>(&args),
        other => bail!("unsupported modulus width {other}; choose 512, 1024, 2048, 4096 or 8192"),
    }
}

fn run<const LIMBS: usize>(args: &Args) -> Result<()> {
    // a dead entropy device must abort here, before any generator work
    let mut entropy = OsEntropy::new().context("opening the system entropy source")?;
    let table = PrimeTable::<LIMBS>::new(args.table_size);
    let config = Config {
        rounds: args.rounds,
        extract: args.extract,
        strict: args.strict,
        ..Config::default()
    };

    let mut generator = match args.workers {
        Some(workers) => BbsGenerator::generate_racing(
            &config,
            &table,
            &mut entropy,
            |_| OsEntropy::new(),
            workers,
        ),
        None => BbsGenerator::generate(&config, &table, &mut entropy),
    }
    .context("constructing the generator")?;
    info!(
        "streaming from a {} bit modulus",
        generator.modulus().bit_length()
    );

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut produced = 0u64;
    loop {
        if args.limit.is_some_and(|cap| produced >= cap) {
            break;
        }
        let word = generator.next_u64();
        if let Err(e) = out.write_all(&word.to_ne_bytes()) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                // the reader went away; for a stream tool that is a clean exit
                break;
            }
            return Err(e).context("writing the output stream");
        }
        produced += 1;
    }
    out.flush().ok();
    Ok(())
}
