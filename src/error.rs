//! Errors raised while turning a pattern string into a [`crate::generator::UriGenerator`].
//!
//! These are all fatal at construction time: a malformed pattern never makes it
//! as far as the scraper, unlike per-request failures which are caught and
//! logged by the scraper loop (see [`crate::scraper`]).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("unmatched closing brace (}}) with no preceding {{")]
    UnmatchedCloseBrace,

    #[error("unmatched opening brace ({{) at position {0}")]
    UnmatchedOpenBrace(usize),

    #[error("cannot start a pattern with a continuation {{}}")]
    LeadingContinuation,

    #[error("unknown implicit range selector '{0}'")]
    UnknownDomainSelector(char),

    #[error("unable to parse explicit range bound '{0}'")]
    InvalidExplicitBound(String),

    #[error("explicit range end ({end}) is less than start ({start})")]
    ReversedExplicitRange { start: u64, end: u64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("range size overflows the native word; use log_size() instead")]
pub struct SizeOverflow;
