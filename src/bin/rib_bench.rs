use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use rib_bench::backends::BackendKind;
use rib_bench::bench::alloc::CountingAlloc;
use rib_bench::bench::{BenchConfig, BenchContext};
use rib_bench::errors::BenchError;
use rib_bench::input::{load_prefixes, FamilyFilter, InputFormat, LoadOptions};

#[global_allocator]
static ALLOC: CountingAlloc = CountingAlloc;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// RIB dump to read the prefixes from
    #[arg(short, long)]
    file: PathBuf,

    /// Number of times every phase is run
    #[arg(short, long, default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..))]
    count: u64,

    /// Write a memory snapshot, taken after the insert phase, to this file
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Format of the dump [default: csv for *.csv files, mrt otherwise]
    #[arg(long)]
    format: Option<InputFormat>,

    /// Address families to keep (ipv4, ipv6 or all)
    #[arg(long, default_value = "ipv4")]
    family: FamilyFilter,

    /// Comma separated list of backends to run [default: all]
    #[arg(long, value_delimiter = ',')]
    backends: Vec<BackendKind>,

    /// Shuffle the prefixes before running
    #[arg(short, long, default_value_t = false)]
    shuffle: bool,

    /// Seed for the shuffle, random if not given
    #[arg(long, requires = "shuffle")]
    seed: Option<u64>,

    /// Print the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn run(args: Cli) -> Result<(), BenchError> {
    let options = LoadOptions {
        format: args.format,
        family: args.family,
    };
    let mut records = load_prefixes(&args.file, &options)?;

    if args.shuffle {
        let t_s = Instant::now();
        let mut rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        records.shuffle(&mut rng);
        info!("shuffled prefixes in {}ms", t_s.elapsed().as_millis());
    }

    let mut config = BenchConfig {
        repetitions: args.count as usize,
        snapshot: args.profile,
        ..Default::default()
    };
    if !args.backends.is_empty() {
        config.backends = args.backends;
    }

    let report = BenchContext::new(&records, config).run()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("{}", err);
        process::exit(1);
    }
}
