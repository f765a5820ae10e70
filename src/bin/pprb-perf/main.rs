//! Random-workload harness: insert a shuffled range of keys, probe
//! successors and dumps against random historical versions, remove
//! everything, then validate the full version history.

use rand::{prelude::random, rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};
use serde::Deserialize;
use structopt::StructOpt;

use std::{io, time};

use pprb::{rbt, util, Result};

#[derive(Clone, StructOpt)]
struct Opt {
    #[structopt(long = "seed", default_value = "0")]
    seed: u64,

    #[structopt(long = "profile", default_value = "")]
    profile: String,
}

/// Workload profile, loadable from a toml file.
#[derive(Clone, Deserialize)]
struct Profile {
    loads: usize,  // number of distinct keys inserted, then removed
    probes: usize, // number of successor probes at random versions
    imps: usize,   // number of full dumps at random versions
    validate: bool,
}

impl Default for Profile {
    fn default() -> Profile {
        Profile {
            loads: 2_000,
            probes: 10_000,
            imps: 10,
            validate: true,
        }
    }
}

fn main() {
    let opts = Opt::from_iter(std::env::args_os());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(err) = perf(opts) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn perf(mut opts: Opt) -> Result<()> {
    if opts.seed == 0 {
        opts.seed = random();
    }
    let p: Profile = if opts.profile.is_empty() {
        Profile::default()
    } else {
        util::files::load_toml(&opts.profile)?
    };

    println!("pprb-perf: seed = {}", opts.seed);
    let mut rng = SmallRng::seed_from_u64(opts.seed);

    let mut keys: Vec<i32> = (0..(p.loads as i32)).collect();
    keys.shuffle(&mut rng);

    let mut index = rbt::Index::new("pprb-perf");

    let start = time::Instant::now();
    for key in keys.iter() {
        index.insert(*key)?;
    }
    println!(
        "pprb-perf: inserted {} keys in {:?}",
        p.loads,
        start.elapsed()
    );

    if p.loads > 0 {
        let start = time::Instant::now();
        let mut infinite = 0;
        for _i in 0..p.probes {
            let key = rng.gen_range(0..(p.loads as i32));
            let ver = rng.gen_range(0..=index.current_version());
            if index.successor(key, ver) == i32::MAX {
                infinite += 1;
            }
        }
        println!(
            "pprb-perf: {} successor probes ({} at infinity) in {:?}",
            p.probes,
            infinite,
            start.elapsed()
        );
    }

    let start = time::Instant::now();
    let mut bytes = 0_usize;
    for _i in 0..p.imps {
        let ver = rng.gen_range(0..=index.current_version());
        let mut buf: Vec<u8> = vec![];
        index.dump(ver, &mut buf)?;
        bytes += buf.len();
    }
    println!(
        "pprb-perf: {} dumps ({} bytes) in {:?}",
        p.imps,
        bytes,
        start.elapsed()
    );

    keys.shuffle(&mut rng);
    let start = time::Instant::now();
    for key in keys.iter() {
        index.remove(*key)?;
    }
    println!(
        "pprb-perf: removed {} keys in {:?}",
        p.loads,
        start.elapsed()
    );

    if p.validate {
        let start = time::Instant::now();
        print!(
            "pprb-perf: validating {} versions ... ",
            index.current_version() + 1
        );
        let stats = index.validate()?;
        println!("ok, took {:?}", start.elapsed());
        println!("{}", stats);
    }

    Ok(())
}
