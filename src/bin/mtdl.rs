//! mtdl - mirror vendor multitrack catalogues from the command line.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::process::ExitCode;

use clap::Parser;
use multitrack_dl::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    cli::run(Cli::parse()).await
}
