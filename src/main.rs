use clap::Parser;
use log::LevelFilter;
use snafu::ErrorCompat;

mod args;
mod poll;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let filter = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(filter)
        .init();

    if let Err(e) = poll::run_poll(&args) {
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
