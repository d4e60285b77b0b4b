//! Classification of query text into forms, segments and equators.

use super::ast::{Aggregate, Comparator, Equator, Operator, OperatorCall, QueryForm, Segment};
use super::lexer::{split_items, split_segments};
use crate::error::{QueryError, Result};
use crate::utils::{parse_number, strip_quotes};

const BROADCAST_PREFIX: &str = "each.";

/// Decide how a query is evaluated from its literal prefix.
pub fn parse_form(query: &str) -> Result<QueryForm<'_>> {
    for aggregate in Aggregate::ALL {
        if let Some(rest) = query.strip_prefix(aggregate.prefix()) {
            let body = rest.strip_suffix("])").ok_or_else(|| {
                QueryError::operator(
                    format!("{} list must be closed with ])", aggregate.prefix()),
                    query,
                )
            })?;
            return Ok(QueryForm::Combinator { aggregate, body });
        }
    }

    if let Some(rest) = query.strip_prefix(BROADCAST_PREFIX) {
        return Ok(QueryForm::Broadcast(rest));
    }

    Ok(QueryForm::Path(query))
}

/// Check a query's syntax without a document: form, segments, operator
/// names and arguments, and filter equators.
pub fn validate(query: &str) -> Result<()> {
    let paths = match parse_form(query)? {
        QueryForm::Combinator { body, .. } => parse_items(body, query)?
            .into_iter()
            .filter(|item| parse_number(item).is_none())
            .collect(),
        QueryForm::Broadcast(body) | QueryForm::Path(body) => vec![body],
    };

    for path in paths {
        for segment in parse_segments(path, query)? {
            if let Segment::Call(call) = segment {
                if call.operator == Operator::Filter {
                    parse_equator(call.argument, query)?;
                }
            }
        }
    }
    Ok(())
}

/// Split `text` into segments and classify each one. `query` is the full
/// query text used in error messages.
pub fn parse_segments<'q>(text: &'q str, query: &str) -> Result<Vec<Segment<'q>>> {
    split_segments(text)
        .map_err(|e| QueryError::operator(e, query))?
        .into_iter()
        .map(|raw| parse_segment(raw, query))
        .collect()
}

/// Split a combinator body into trimmed, non-empty items.
pub fn parse_items<'q>(body: &'q str, query: &str) -> Result<Vec<&'q str>> {
    let items = split_items(body).map_err(|e| QueryError::operator(e, query))?;
    Ok(items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect())
}

/// Classify one segment as a key or an operator call.
pub fn parse_segment<'q>(raw: &'q str, query: &str) -> Result<Segment<'q>> {
    let Some(open) = raw.find('(') else {
        return Ok(Segment::Key(raw));
    };

    let operator = Operator::from_name(&raw[..open])
        .ok_or_else(|| QueryError::operator(format!("no operator exists for {raw}"), query))?;

    let argument = raw[open + 1..].strip_suffix(')').ok_or_else(|| {
        QueryError::operator(format!("malformed argument list in {raw}"), query)
    })?;

    if argument.trim().is_empty() && !operator.argument_optional() {
        return Err(QueryError::operator(format!("no value in {raw}"), query));
    }

    Ok(Segment::Call(OperatorCall {
        operator,
        argument,
        raw,
    }))
}

/// Parse a `filter(...)` argument into key, comparator and quote-stripped
/// operand.
pub fn parse_equator<'q>(expression: &'q str, query: &str) -> Result<Equator<'q>> {
    let comparator = Comparator::PRECEDENCE
        .into_iter()
        .find(|c| expression.contains(c.symbol()))
        .ok_or_else(|| QueryError::equator(expression, query))?;

    let mut parts = expression.split(comparator.symbol());
    let key = parts.next().unwrap_or_default();
    let operand = strip_quotes(parts.next().unwrap_or_default());

    Ok(Equator {
        key,
        comparator,
        operand,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_form_dispatch() {
        assert_eq!(
            parse_form("max([a.b, 10])").unwrap(),
            QueryForm::Combinator {
                aggregate: Aggregate::Max,
                body: "a.b, 10"
            }
        );
        assert_eq!(
            parse_form("range([a])").unwrap(),
            QueryForm::Combinator {
                aggregate: Aggregate::Range,
                body: "a"
            }
        );
        assert_eq!(
            parse_form("each.drivers.count()").unwrap(),
            QueryForm::Broadcast("drivers.count()")
        );
        assert_eq!(parse_form("a.max()").unwrap(), QueryForm::Path("a.max()"));
    }

    #[test]
    fn test_items_skip_blanks() {
        assert_eq!(parse_items("", "max([])").unwrap(), Vec::<&str>::new());
        assert_eq!(parse_items(" a.b , 10 ", "q").unwrap(), vec!["a.b", "10"]);
        assert!(validate("range([])").is_ok());
    }

    #[test]
    fn test_unterminated_combinator() {
        let err = parse_form("min([a, b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operator);
    }

    #[test]
    fn test_key_and_call() {
        let segments = parse_segments("claims.filter(code='A')", "q").unwrap();
        assert_eq!(segments[0], Segment::Key("claims"));
        assert_eq!(
            segments[1],
            Segment::Call(OperatorCall {
                operator: Operator::Filter,
                argument: "code='A'",
                raw: "filter(code='A')",
            })
        );
    }

    #[test]
    fn test_unknown_operator() {
        let err = parse_segments("proposer.claims.incorrect()", "q").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operator);
        assert!(err.to_string().contains("incorrect()"));
    }

    #[test]
    fn test_missing_mandatory_argument() {
        let err = parse_segment("map()", "proposer.claims.map()").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Operator error: no value in map() (in proposer.claims.map())"
        );
        assert!(parse_segment("count()", "q").is_ok());
        assert!(parse_segment("max()", "q").is_ok());
    }

    #[test]
    fn test_trailing_text_after_call() {
        assert!(parse_segment("count()x", "q").is_err());
    }

    #[test]
    fn test_equator_precedence() {
        let cases = [
            ("x=1", Comparator::Eq),
            ("x!=1", Comparator::Ne),
            ("x>1", Comparator::Gt),
            ("x>=1", Comparator::Ge),
            ("x<1", Comparator::Lt),
            ("x<=1", Comparator::Le),
        ];
        for (expression, expected) in cases {
            let equator = parse_equator(expression, "q").unwrap();
            assert_eq!(equator.comparator, expected, "{expression}");
            assert_eq!(equator.key, "x");
            assert_eq!(equator.operand, "1");
        }
    }

    #[test]
    fn test_equator_strips_quotes() {
        let equator = parse_equator("title=\"MRS\"", "q").unwrap();
        assert_eq!(equator.operand, "MRS");
        let equator = parse_equator("title='MRS'", "q").unwrap();
        assert_eq!(equator.operand, "MRS");
    }

    #[test]
    fn test_validate() {
        assert!(validate("max([drivers.map(ncd).max(), 10])").is_ok());
        assert!(validate("each.drivers.filter(code=W).count()").is_ok());
        assert_eq!(
            validate("a.filter(code).count()").unwrap_err().kind(),
            ErrorKind::Equator
        );
        assert_eq!(
            validate("min([a.bogus(), 1])").unwrap_err().kind(),
            ErrorKind::Operator
        );
    }

    #[test]
    fn test_equator_missing() {
        let err = parse_equator("code", "proposer.claims.filter(code)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Equator);
    }
}
