#![warn(clippy::pedantic)]
#![allow(
    clippy::style,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

mod action;
mod candidate;
pub mod cli;
mod cmd;
pub(crate) mod connection;
mod controller;
mod error;
mod generator;
mod pattern;
mod query;
mod range;
mod request;
mod scraper;
mod util;

use crate::cli::{Cli, Command};
use anyhow::Result;
use clap::Parser;

/// A configuration error (bad host, inverted `--min`/`--max`, ...) is
/// reported on stderr but never turns into a non-zero exit: spec.md §6
/// reserves that for clap's own parse failures, mirroring
/// `original_source/main.cpp`'s `catch (OptionsException&)` falling through
/// to `return EXIT_SUCCESS`.
fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Some(Command::GenCompletions { shell, out_dir }) => {
            cmd::gen_completions::generate_completions(shell, out_dir)?;
        }
        None => {
            if let Err(err) = cmd::run::run(&cli.run) {
                eprintln!("{err:#}");
            }
        }
    }

    Ok(())
}
