//! Tokenizes a URI template into literal chunks and range specifications.
//!
//! Lexical rules (see the pattern grammar in the crate docs):
//! - `{` opens a pattern, the next `}` closes it; braces do not nest.
//! - `{}` is a continuation.
//! - A body containing `:` is explicit; anything after the first `:` is taken
//!   verbatim as the second token, so `{1:2:3}` fails to parse the second
//!   token as an integer rather than being rejected up front. This is
//!   preserved rather than "fixed" for behavioral fidelity with the tool this
//!   pattern language was lifted from.
//! - Any other body must consist solely of implicit-range domain selectors.

use crate::error::PatternError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    Explicit { start: u64, end: u64 },
    Implicit(String),
    Continuation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPattern {
    /// `literals.len() == specs.len() + 1`: one literal chunk before each
    /// range plus a trailing chunk after the last one.
    pub literals: Vec<String>,
    pub specs: Vec<RangeSpec>,
}

const DOMAIN_SELECTORS: &[char] = &['o', 'd', 'h', 'H', 'a', 'A', 'n', 'N', 'b'];

pub fn parse(input: &str) -> Result<ParsedPattern, PatternError> {
    let mut literals = Vec::new();
    let mut specs = Vec::new();
    let mut index = 0usize;

    loop {
        match input[index..].find('{') {
            None => {
                if input[index..].find('}').is_some() {
                    return Err(PatternError::UnmatchedCloseBrace);
                }
                literals.push(input[index..].to_string());
                break;
            }
            Some(rel_open) => {
                let open = index + rel_open;
                let body_start = open + 1;
                let close = match input[body_start..].find('}') {
                    Some(rel_close) => body_start + rel_close,
                    None => return Err(PatternError::UnmatchedOpenBrace(open)),
                };
                literals.push(input[index..open].to_string());
                specs.push(parse_body(&input[body_start..close])?);
                index = close + 1;
            }
        }
    }

    Ok(ParsedPattern { literals, specs })
}

fn parse_body(body: &str) -> Result<RangeSpec, PatternError> {
    if body.is_empty() {
        return Ok(RangeSpec::Continuation);
    }

    if let Some(colon) = body.find(':') {
        let first = &body[..colon];
        let second = &body[colon + 1..];
        let start = first
            .parse::<u64>()
            .map_err(|_| PatternError::InvalidExplicitBound(first.to_string()))?;
        let end = second
            .parse::<u64>()
            .map_err(|_| PatternError::InvalidExplicitBound(second.to_string()))?;
        if end < start {
            return Err(PatternError::ReversedExplicitRange { start, end });
        }
        return Ok(RangeSpec::Explicit { start, end });
    }

    for c in body.chars() {
        if !DOMAIN_SELECTORS.contains(&c) {
            return Err(PatternError::UnknownDomainSelector(c));
        }
    }
    Ok(RangeSpec::Implicit(body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_only() {
        let p = parse("/my/desired/route").unwrap();
        assert_eq!(p.literals, vec!["/my/desired/route".to_string()]);
        assert!(p.specs.is_empty());
    }

    #[test]
    fn explicit_range() {
        let p = parse("/my/desired/{0:1}/route").unwrap();
        assert_eq!(
            p.literals,
            vec!["/my/desired/".to_string(), "/route".to_string()]
        );
        assert_eq!(p.specs, vec![RangeSpec::Explicit { start: 0, end: 1 }]);
    }

    #[test]
    fn implicit_range() {
        let p = parse("/p/{oo}/q").unwrap();
        assert_eq!(p.specs, vec![RangeSpec::Implicit("oo".to_string())]);
    }

    #[test]
    fn continuation() {
        let p = parse("{0:1}{}").unwrap();
        assert_eq!(
            p.specs,
            vec![
                RangeSpec::Explicit { start: 0, end: 1 },
                RangeSpec::Continuation
            ]
        );
    }

    #[test]
    fn unmatched_open_brace() {
        assert_eq!(
            parse("/foo/{0:1"),
            Err(PatternError::UnmatchedOpenBrace(5))
        );
    }

    #[test]
    fn unmatched_close_brace() {
        assert_eq!(parse("/foo/0:1}"), Err(PatternError::UnmatchedCloseBrace));
    }

    #[test]
    fn unknown_domain_selector() {
        assert_eq!(
            parse("{z}"),
            Err(PatternError::UnknownDomainSelector('z'))
        );
    }

    #[test]
    fn reversed_explicit_range() {
        assert_eq!(
            parse("{5:1}"),
            Err(PatternError::ReversedExplicitRange { start: 5, end: 1 })
        );
    }

    #[test]
    fn non_numeric_explicit_bound() {
        assert_eq!(
            parse("{a:1}"),
            Err(PatternError::InvalidExplicitBound("a".to_string()))
        );
    }

    #[test]
    fn extra_colon_is_folded_into_second_token() {
        // Faithful to the original: "1:2:3" is split on the FIRST colon only,
        // leaving "2:3" as the second token, which then fails to parse as an
        // integer.
        assert_eq!(
            parse("{1:2:3}"),
            Err(PatternError::InvalidExplicitBound("2:3".to_string()))
        );
    }
}
