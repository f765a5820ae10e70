use structopt::StructOpt;

use std::{ffi, fs, io, io::Write, process};

use pprb::{err_at, rbt, Result};

/// Execute a command file against a fresh index.
///
/// The input file holds one command per line, `INC k`, `REM k`,
/// `SUC k v`, `IMP v`; results of `SUC` and `IMP` land in the output
/// file, one line each.
#[derive(Clone, StructOpt)]
struct Opt {
    /// input file, one command per line.
    input: ffi::OsString,

    /// output file for SUC and IMP results.
    output: ffi::OsString,
}

fn main() {
    let opts = Opt::from_iter(std::env::args_os());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(err) = exec(opts) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn exec(opts: Opt) -> Result<()> {
    let input = err_at!(IOError, fs::File::open(&opts.input), "input {:?}", opts.input)?;
    let output = err_at!(
        IOError,
        fs::File::create(&opts.output),
        "output {:?}",
        opts.output
    )?;
    let mut writer = io::BufWriter::new(output);

    let mut index = rbt::Index::new("pprb");
    rbt::run(&mut index, io::BufReader::new(input), &mut writer)?;
    err_at!(IOError, writer.flush())
}
