use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

const DEFAULT_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:47.0) Gecko/20100101 Firefox/47.0";
const DEFAULT_TOR_PROXY: &str = "127.0.0.1:9050";

/// `host`/`pattern` are the program's own positionals — no `run` token, per
/// spec.md §6's CLI table and §8 scenario 6's literal invocation
/// (`host.example "?x={1:2}" --contents ...`). `gen-completions` is the one
/// remaining administrative subcommand, matched in preference to the
/// positionals when the first argument is exactly that name (so a host
/// named `gen-completions` is the one invocation this can't express —
/// `original_source/Options.cpp` has no subcommand concept to collide with
/// in the first place).
#[derive(Parser, Debug)]
#[command(
author,
version,
about = r#"
░█▀█░█▀▄░█▀▄░█▀█░█▀▄░█▀▀░█▀▄
░█▀█░█▀▄░█▀▄░█▀█░█░█░█▀▀░█▀▄
░▀░▀░▀▀░░▀░▀░▀░▀░▀▀░░▀▀▀░▀░▀

A high-throughput HTTP resource-discovery tool: expand a URI pattern into a
candidate set and hammer the matches 'til the server tells you which ones
are real."#,
long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate shell completions
    GenCompletions {
        /// Set the shell for generating completions
        #[arg(long, short)]
        shell: Shell,

        /// Set the output directory
        #[arg(long, short)]
        out_dir: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Target host name
    pub host: Option<String>,

    /// URI template, e.g. `/files/{0:99}.txt` or `/p/{hhhh}`
    pub pattern: Option<String>,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_AGENT)]
    pub agent: String,

    /// HEAD mode: log file for confirmed URIs. GET mode: directory for
    /// response bodies.
    ///
    /// Defaults to `<host>`, or `<host>-contents` in GET mode.
    #[arg(long)]
    pub out: Option<String>,

    /// Error log file
    ///
    /// Defaults to `<host>-err.log`.
    #[arg(long)]
    pub err: Option<String>,

    /// SOCKS5 proxy address (`host:port`)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Use TLS
    #[arg(short, long)]
    pub tls: bool,

    /// Surface a non-EOF teardown error as a per-request failure instead of
    /// swallowing it
    #[arg(short, long)]
    pub sensitive: bool,

    /// Shortcut for `--proxy 127.0.0.1:9050`
    #[arg(short = 'o', long)]
    pub tor: bool,

    /// Verify the TLS peer certificate (implies `--tls`)
    #[arg(short = 'r', long)]
    pub verify: bool,

    /// Keep leading zeros in implicit ranges
    #[arg(short = 'l', long)]
    pub leadzero: bool,

    /// Enumerate all prefix lengths of an implicit pattern, not just the
    /// full width
    #[arg(short = 'e', long)]
    pub telescoping: bool,

    /// Print 2xx candidates as they're confirmed
    #[arg(short = 'f', long)]
    pub found: bool,

    /// Verbose: log every response, mirror actions to stdout/stderr (implies
    /// `--found`)
    #[arg(short, long)]
    pub verbose: bool,

    /// GET mode: fetch and persist response bodies (else HEAD-only)
    #[arg(short, long)]
    pub contents: bool,

    /// Print the expanded URIs only; issue no requests
    #[arg(long)]
    pub test: bool,

    /// Use the adaptive controller instead of a fixed concurrency target
    #[arg(short = 'p', long)]
    pub optimize: bool,

    /// Initial (or, without `--optimize`, fixed) concurrency target
    #[arg(short, long, default_value_t = 1000)]
    pub init: usize,

    /// Adaptive controller's lower concurrency bound
    #[arg(long, default_value_t = 1)]
    pub min: usize,

    /// Adaptive controller's upper concurrency bound
    #[arg(long, default_value_t = 25000)]
    pub max: usize,

    /// Adaptive controller's trailing sample window size
    #[arg(long, default_value_t = 50)]
    pub ssize: usize,

    /// Completions per throughput sample
    #[arg(long, default_value_t = 1000)]
    pub sint: usize,
}

impl RunArgs {
    /// `host` is a required positional in spirit, but it's declared
    /// `Option<String>` so the `gen-completions` subcommand can be parsed
    /// without one; absence is reported as a configuration error by
    /// `cmd::run::validate` before anything else runs.
    pub fn effective_host(&self) -> &str {
        self.host.as_deref().unwrap_or_default()
    }

    /// Bare positional, defaulting to the root path.
    pub fn effective_pattern(&self) -> &str {
        self.pattern.as_deref().unwrap_or("/")
    }

    /// `--tor` is sugar for `--proxy 127.0.0.1:9050`.
    pub fn effective_proxy(&self) -> Option<&str> {
        if self.tor {
            Some(DEFAULT_TOR_PROXY)
        } else {
            self.proxy.as_deref()
        }
    }

    /// `--verify` implies `--tls`.
    pub fn effective_tls(&self) -> bool {
        self.tls || self.verify
    }

    /// `--verbose` implies `--found`.
    pub fn effective_found(&self) -> bool {
        self.found || self.verbose
    }

    pub fn effective_out(&self) -> String {
        self.out.clone().unwrap_or_else(|| {
            if self.contents {
                format!("{}-contents", self.effective_host())
            } else {
                self.effective_host().to_string()
            }
        })
    }

    pub fn effective_err(&self) -> String {
        self.err
            .clone()
            .unwrap_or_else(|| format!("{}-err.log", self.effective_host()))
    }

    /// Human-readable echo of the resolved configuration, printed once at
    /// startup. Purely a presentation concern: the scraper itself reads the
    /// fields directly, never this string.
    pub fn pretty_print(&self) -> String {
        let mode = if self.contents { "GET" } else { "HEAD" };
        let strategy = match (self.effective_proxy(), self.effective_tls()) {
            (None, false) => "plaintext".to_string(),
            (None, true) => "tls".to_string(),
            (Some(proxy), false) => format!("socks5 via {proxy}"),
            (Some(proxy), true) => format!("socks5+tls via {proxy}"),
        };
        let controller = if self.optimize {
            format!(
                "adaptive (init={}, min={}, max={}, window={})",
                self.init, self.min, self.max, self.ssize
            )
        } else {
            format!("fixed ({})", self.init)
        };
        format!(
            "host={} pattern={:?} mode={mode} connection={strategy} controller={controller} \
             out={:?} err={:?} leadzero={} telescoping={}",
            self.effective_host(),
            self.effective_pattern(),
            self.effective_out(),
            self.effective_err(),
            self.leadzero,
            self.telescoping,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> RunArgs {
        Cli::parse_from(std::iter::once("abrader").chain(args.iter().copied())).run
    }

    #[test]
    fn no_run_token_needed() {
        let run = parse(&["example.com"]);
        assert_eq!(run.effective_host(), "example.com");
    }

    #[test]
    fn defaults_pattern_to_root() {
        let run = parse(&["example.com"]);
        assert_eq!(run.effective_pattern(), "/");
    }

    #[test]
    fn out_defaults_to_host_or_host_contents() {
        let head = parse(&["example.com"]);
        assert_eq!(head.effective_out(), "example.com");

        let get = parse(&["example.com", "-c"]);
        assert_eq!(get.effective_out(), "example.com-contents");
    }

    #[test]
    fn err_defaults_to_host_err_log() {
        let run = parse(&["example.com"]);
        assert_eq!(run.effective_err(), "example.com-err.log");
    }

    #[test]
    fn tor_shortcut_implies_proxy() {
        let run = parse(&["example.com", "--tor"]);
        assert_eq!(run.effective_proxy(), Some("127.0.0.1:9050"));
    }

    #[test]
    fn verify_implies_tls_and_verbose_implies_found() {
        let run = parse(&["example.com", "-r", "-v"]);
        assert!(run.effective_tls());
        assert!(run.effective_found());
    }

    #[test]
    fn gen_completions_subcommand_is_still_recognized() {
        let cli = Cli::parse_from(["abrader", "gen-completions", "--shell", "bash"]);
        assert!(matches!(cli.command, Some(Command::GenCompletions { .. })));
    }

    #[test]
    fn spec_scenario_six_parses_without_a_run_token() {
        let run = parse(&[
            "host.example",
            "?x={1:2}",
            "--contents",
            "--tls",
            "--proxy=127.0.0.1:9050",
        ]);
        assert_eq!(run.effective_host(), "host.example");
        assert_eq!(run.effective_pattern(), "?x={1:2}");
        assert!(run.contents);
        assert!(run.effective_tls());
        assert_eq!(run.proxy.as_deref(), Some("127.0.0.1:9050"));
    }
}
