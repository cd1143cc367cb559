use std::{io, process::ExitCode};

use clap::Parser;
use msgkit::cli::{Arguments, ExitStatus};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MSGKIT_LOG";

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "msgkit=debug" } else { "msgkit=error" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let args = Arguments::parse();
    init_tracing(args.verbose());

    match msgkit::cli::run_cli(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitStatus::Error.into()
        }
    }
}
