//! The odometer over a parsed pattern: yields one candidate URI per call to
//! [`UriGenerator::next`], in a fixed and non-repeating order, until the
//! leftmost range carries and the sequence latches complete.

use crate::error::{PatternError, SizeOverflow};
use crate::pattern::{self, RangeSpec};
use crate::range::{ContinuationRange, ExplicitRange, ImplicitRange, Range, TelescopingRange};

#[derive(Debug, Clone)]
pub struct UriGenerator {
    literals: Vec<String>,
    ranges: Vec<Range>,
    complete: bool,
}

impl UriGenerator {
    pub fn new(input: &str, leading_zeros: bool, telescoping: bool) -> Result<Self, PatternError> {
        let parsed = pattern::parse(input)?;
        let mut ranges = Vec::with_capacity(parsed.specs.len());

        for spec in parsed.specs {
            let range = match spec {
                RangeSpec::Explicit { start, end } => Range::Explicit(ExplicitRange::new(start, end)),
                RangeSpec::Implicit(body) => {
                    if telescoping {
                        Range::Telescoping(TelescopingRange::new(&body, leading_zeros))
                    } else {
                        Range::Implicit(ImplicitRange::new(&body, leading_zeros))
                    }
                }
                RangeSpec::Continuation => {
                    if ranges.is_empty() {
                        return Err(PatternError::LeadingContinuation);
                    }
                    Range::Continuation(ContinuationRange::new(ranges.len() - 1))
                }
            };
            ranges.push(range);
        }

        Ok(UriGenerator {
            literals: parsed.literals,
            ranges,
            complete: false,
        })
    }

    /// Yields the next candidate, or `None` once the sequence is exhausted.
    /// Non-restartable: every call after the first `None` also returns `None`.
    pub fn next(&mut self) -> Option<String> {
        if self.complete {
            return None;
        }

        let mut result = String::new();
        for i in 0..self.ranges.len() {
            result.push_str(&self.literals[i]);
            result.push_str(&self.ranges[i].current(&self.ranges));
        }
        result.push_str(self.literals.last().expect("literals always has a trailing chunk"));

        self.increment_ranges();
        Some(result)
    }

    fn increment_ranges(&mut self) {
        if self.ranges.is_empty() {
            self.complete = true;
            return;
        }
        let mut pivot = self.ranges.len() - 1;
        loop {
            if !self.ranges[pivot].increment_return_carry() {
                break;
            }
            self.ranges[pivot].reset();
            if pivot == 0 {
                self.complete = true;
                return;
            }
            pivot -= 1;
        }
    }

    /// Exact cardinality of the candidate set, or an overflow signal if it
    /// doesn't fit in a `u64` — fall back to [`UriGenerator::log_size`].
    pub fn size(&self) -> Result<u64, SizeOverflow> {
        self.ranges
            .iter()
            .try_fold(1u64, |acc, r| acc.checked_mul(r.size()?).ok_or(SizeOverflow))
    }

    /// Natural log of the cardinality. Always finite.
    ///
    /// This preserves a quirk of the tool this was ported from: it computes
    /// `ln(Σ exp(log_size_i))` rather than `ln(Π size_i)` (i.e. `Σ log_size_i`).
    /// Those are only equal when there's a single range; see the design notes
    /// on why this is kept rather than corrected.
    pub fn log_size(&self) -> f64 {
        self.ranges.iter().map(|r| r.log_size().exp()).sum::<f64>().ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(mut g: UriGenerator) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(uri) = g.next() {
            out.push(uri);
        }
        out
    }

    #[test]
    fn scenario_1_single_explicit_range() {
        let g = UriGenerator::new("/my/desired/{0:1}/route", false, false).unwrap();
        assert_eq!(g.size().unwrap(), 2);
        assert_eq!(
            collect(g),
            vec![
                "/my/desired/0/route".to_string(),
                "/my/desired/1/route".to_string(),
            ]
        );
    }

    #[test]
    fn scenario_2_two_explicit_ranges_are_an_odometer() {
        let g = UriGenerator::new("/my/{0:1}/desired/{14:16}/route", false, false).unwrap();
        assert_eq!(g.size().unwrap(), 6);
        assert_eq!(
            collect(g),
            vec![
                "/my/0/desired/14/route".to_string(),
                "/my/0/desired/15/route".to_string(),
                "/my/0/desired/16/route".to_string(),
                "/my/1/desired/14/route".to_string(),
                "/my/1/desired/15/route".to_string(),
                "/my/1/desired/16/route".to_string(),
            ]
        );
    }

    #[test]
    fn scenario_3_three_binary_explicit_ranges() {
        let g = UriGenerator::new("{0:1}{0:1}{0:1}", false, false).unwrap();
        assert_eq!(g.size().unwrap(), 8);
        assert_eq!(
            collect(g),
            vec!["000", "001", "010", "011", "100", "101", "110", "111"]
        );
    }

    #[test]
    fn scenario_4_implicit_octal_without_leading_zeros() {
        let mut g = UriGenerator::new("/p/{oo}/q", false, false).unwrap();
        assert_eq!(g.next().unwrap(), "/p/0/q");
        assert_eq!(g.next().unwrap(), "/p/1/q");
        assert_eq!(g.next().unwrap(), "/p/2/q");
        for _ in 0..4 {
            g.next();
        }
        assert_eq!(g.next().unwrap(), "/p/7/q");
        assert_eq!(g.next().unwrap(), "/p/10/q");
        let rest = collect(g);
        assert_eq!(rest.last().unwrap(), "/p/77/q");
        assert_eq!(rest.len(), 64 - 9);
    }

    #[test]
    fn scenario_5_telescoping_single_hex_digit_matches_base() {
        let g = UriGenerator::new("/p/{h}/q", false, true).unwrap();
        let out = collect(g);
        assert_eq!(out.len(), 16);
        assert_eq!(out[0], "/p/0/q");
        assert_eq!(out[15], "/p/f/q");
    }

    #[test]
    fn scenario_5_telescoping_two_hex_digits_is_272() {
        let g = UriGenerator::new("{hh}", false, true).unwrap();
        assert_eq!(g.size().unwrap(), 272);
        let out = collect(g);
        assert_eq!(out.len(), 272);
        assert_eq!(out[0], "0");
        assert_eq!(out[15], "f");
        assert_eq!(out[16], "00");
        assert_eq!(out[271], "ff");
    }

    #[test]
    fn continuation_mirrors_preceding_range() {
        let g = UriGenerator::new("/a/{0:2}/b/{}/c", false, false).unwrap();
        assert_eq!(
            collect(g),
            vec!["/a/0/b/0/c", "/a/1/b/1/c", "/a/2/b/2/c"]
        );
    }

    #[test]
    fn leading_continuation_is_a_parse_error() {
        assert_eq!(
            UriGenerator::new("{}", false, false).unwrap_err(),
            PatternError::LeadingContinuation
        );
    }

    #[test]
    fn exhausted_generator_stays_exhausted() {
        let mut g = UriGenerator::new("{0:0}", false, false).unwrap();
        assert_eq!(g.next(), Some("0".to_string()));
        assert_eq!(g.next(), None);
        assert_eq!(g.next(), None);
    }

    #[test]
    fn no_ranges_yields_literal_once() {
        let mut g = UriGenerator::new("/static/path", false, false).unwrap();
        assert_eq!(g.next(), Some("/static/path".to_string()));
        assert_eq!(g.next(), None);
    }
}
