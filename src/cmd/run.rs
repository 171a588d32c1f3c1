//! Wires a parsed [`RunArgs`] into a [`UriGenerator`], a connection strategy,
//! a query/action pair, a controller, and a [`Scraper`], then drives the
//! scrape to completion on a single-threaded `LocalSet` — exactly the
//! per-worker runtime shape the teacher builds in `start_worker`, minus the
//! OS-thread fan-out (one generator cannot be safely sharded across threads;
//! see DESIGN.md).

use crate::action::{GetAction, HeadAction};
use crate::cli::RunArgs;
use crate::connection::{Connection, PlaintextConnection, Socks5Connection, Socks5TlsConnection, TlsConnection};
use crate::controller::{AdaptiveController, ConcurrencyController, FixedController};
use crate::generator::UriGenerator;
use crate::query::{GetQuery, HeadQuery, QueryStrategy};
use crate::request::RequestWriter;
use crate::scraper::Scraper;
use crate::util::format_duration;
use anyhow::{bail, Context, Result};
use log::info;
use std::time::Instant;

pub fn run(args: &RunArgs) -> Result<()> {
    validate(args)?;
    info!("{}", args.pretty_print());

    let generator = UriGenerator::new(args.effective_pattern(), args.leadzero, args.telescoping)
        .with_context(|| format!("parsing pattern {:?}", args.effective_pattern()))?;

    match generator.size() {
        Ok(size) => info!("Candidate set size: {size}"),
        Err(_) => info!(
            "Candidate set size overflows a 64-bit count; log(size) = {:.2}",
            generator.log_size()
        ),
    }

    if args.test {
        return run_test(generator);
    }

    let connection = build_connection(args)?;
    let writer = RequestWriter::new(args.effective_host(), &args.agent, args.verbose);
    let query = build_query(args)?;
    let controller = build_controller(args);
    let scraper = Scraper::new(
        query,
        connection,
        writer,
        controller,
        args.verbose,
        args.sensitive,
        args.effective_err(),
    );

    let start = Instant::now();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, scraper.run(generator));
    info!("Scrape complete in {}", format_duration(start.elapsed()));

    Ok(())
}

/// Cross-field checks the CLI's own value parsers can't express (spec.md §7
/// "Configuration error" — reported, but never turns into a non-zero exit;
/// see `main.rs`).
fn validate(args: &RunArgs) -> Result<()> {
    if args.effective_host().is_empty() {
        bail!("host must not be empty");
    }
    if args.min == 0 || args.max == 0 || args.init == 0 || args.ssize == 0 || args.sint == 0 {
        bail!("--min, --max, --init, --ssize and --sint must all be at least 1");
    }
    if args.min > args.max {
        bail!("--min ({}) cannot be greater than --max ({})", args.min, args.max);
    }
    Ok(())
}

/// `--test`: print the expansion without issuing any requests.
fn run_test(mut generator: UriGenerator) -> Result<()> {
    while let Some(uri) = generator.next() {
        println!("{uri}");
    }
    Ok(())
}

fn build_connection(args: &RunArgs) -> Result<Connection> {
    let tls = args.effective_tls();
    let host = args.effective_host();
    let connection = match (args.effective_proxy(), tls) {
        (None, false) => Connection::Plaintext(PlaintextConnection::new(host)),
        (None, true) => Connection::Tls(TlsConnection::new(host, args.verify)?),
        (Some(proxy), false) => Connection::Socks5(Socks5Connection::new(proxy, host)?),
        (Some(proxy), true) => {
            Connection::Socks5Tls(Socks5TlsConnection::new(proxy, host, args.verify)?)
        }
    };
    Ok(connection)
}

fn build_query(args: &RunArgs) -> Result<QueryStrategy> {
    let found = args.effective_found();
    let out = args.effective_out();
    let query = if args.contents {
        let action = GetAction::new(&out, "", args.verbose)?;
        QueryStrategy::Get(GetQuery::new(action, found, args.verbose))
    } else {
        let action = HeadAction::new(&out, args.verbose)?;
        QueryStrategy::Head(HeadQuery::new(action, found, args.verbose))
    };
    Ok(query)
}

fn build_controller(args: &RunArgs) -> ConcurrencyController {
    if args.optimize {
        ConcurrencyController::Adaptive(AdaptiveController::new(
            args.init,
            args.ssize,
            args.sint,
            args.min,
            args.max,
        ))
    } else {
        ConcurrencyController::Fixed(FixedController::new(args.init, args.sint))
    }
}
