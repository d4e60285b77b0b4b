//! Splitters for query text.
//!
//! Queries split on `.` into segments and combinator bodies split on `,` into
//! items. Parenthesised and bracketed groups are opaque to both, so operator
//! arguments may contain dots and commas.

use winnow::combinator::{alt, delimited, repeat, separated};
use winnow::prelude::*;
use winnow::token::take_while;

// winnow 0.7 no longer exports PResult
type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

fn is_bracket(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']')
}

/// Contents of a group: free text and nested groups.
fn group_body(input: &mut &str) -> PResult<()> {
    repeat(0.., alt((take_while(1.., |c: char| !is_bracket(c)), group))).parse_next(input)
}

/// A balanced `( ... )` or `[ ... ]` group, brackets included.
fn group<'i>(input: &mut &'i str) -> PResult<&'i str> {
    alt((
        delimited('(', group_body, ')'),
        delimited('[', group_body, ']'),
    ))
    .take()
    .parse_next(input)
}

/// Everything up to the next top-level `separator`.
fn token<'i>(input: &mut &'i str, separator: char) -> PResult<&'i str> {
    repeat(
        0..,
        alt((
            take_while(1.., move |c: char| c != separator && !is_bracket(c)),
            group,
        )),
    )
    .map(|()| ())
    .take()
    .parse_next(input)
}

fn segment<'i>(input: &mut &'i str) -> PResult<&'i str> {
    token(input, '.')
}

fn list_item<'i>(input: &mut &'i str) -> PResult<&'i str> {
    token(input, ',')
}

fn ensure_consumed(remaining: &str) -> Result<(), String> {
    if remaining.is_empty() {
        Ok(())
    } else {
        Err(format!("unbalanced brackets at '{remaining}'"))
    }
}

/// Split a query into its dot-delimited segments.
pub fn split_segments(input: &str) -> Result<Vec<&str>, String> {
    let mut remaining = input;
    let segments: Vec<&str> = separated(0.., segment, '.')
        .parse_next(&mut remaining)
        .map_err(|e| format!("Lexer error at '{}': {:?}", remaining, e))?;
    ensure_consumed(remaining)?;
    Ok(segments)
}

/// Split a combinator body into its comma-delimited items (untrimmed).
pub fn split_items(input: &str) -> Result<Vec<&str>, String> {
    let mut remaining = input;
    let items: Vec<&str> = separated(0.., list_item, ',')
        .parse_next(&mut remaining)
        .map_err(|e| format!("Lexer error at '{}': {:?}", remaining, e))?;
    ensure_consumed(remaining)?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        assert_eq!(
            split_segments("proposer.dob").unwrap(),
            vec!["proposer", "dob"]
        );
    }

    #[test]
    fn test_operator_segments() {
        assert_eq!(
            split_segments("a.b.filter(x>=1.5).map(x).max()").unwrap(),
            vec!["a", "b", "filter(x>=1.5)", "map(x)", "max()"]
        );
    }

    #[test]
    fn test_dotted_argument_is_opaque() {
        assert_eq!(
            split_segments("proposer.dob.age(YY, policy.start_date)").unwrap(),
            vec!["proposer", "dob", "age(YY, policy.start_date)"]
        );
        assert_eq!(
            split_segments("postcode.regex(^[A-Z].(a|b))").unwrap(),
            vec!["postcode", "regex(^[A-Z].(a|b))"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(split_segments("").unwrap(), vec![""]);
    }

    #[test]
    fn test_unbalanced_brackets() {
        assert!(split_segments("a.count(").is_err());
        assert!(split_segments("a.count())").is_err());
        assert!(split_segments("a.map(x]").is_err());
    }

    #[test]
    fn test_list_items() {
        assert_eq!(
            split_items("drivers.map(ncd).max(), proposer.dob.age(YY, created_at), 10").unwrap(),
            vec![
                "drivers.map(ncd).max()",
                " proposer.dob.age(YY, created_at)",
                " 10"
            ]
        );
    }
}
