//! Query AST types.

use std::fmt;
use std::str::FromStr;

/// How a raw query string is evaluated, decided by its prefix.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryForm<'q> {
    /// `max([...])`, `min([...])`, `range([...])` with the raw list body
    Combinator { aggregate: Aggregate, body: &'q str },

    /// `each.<path>.<rest>` with everything after `each.`
    Broadcast(&'q str),

    /// Plain dotted path, possibly with operator calls
    Path(&'q str),
}

/// Aggregation applied by a combinator query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Max,
    Min,
    Range,
}

impl Aggregate {
    pub const ALL: [Aggregate; 3] = [Aggregate::Max, Aggregate::Min, Aggregate::Range];

    /// Literal prefix that opens the combinator, e.g. `max([`.
    pub fn prefix(self) -> &'static str {
        match self {
            Aggregate::Max => "max([",
            Aggregate::Min => "min([",
            Aggregate::Range => "range([",
        }
    }
}

/// One dot-delimited token of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'q> {
    /// Plain property name
    Key(&'q str),

    /// `name(argument)`
    Call(OperatorCall<'q>),
}

impl Segment<'_> {
    pub fn is_call(&self) -> bool {
        matches!(self, Segment::Call(_))
    }
}

/// A classified operator segment.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorCall<'q> {
    pub operator: Operator,
    /// Text between the outer parentheses, untrimmed
    pub argument: &'q str,
    /// The segment as written
    pub raw: &'q str,
}

/// The closed set of operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Count,
    Map,
    Filter,
    Sum,
    Mean,
    Min,
    Max,
    Range,
    Unique,
    Exists,
    Default,
    Age,
    Date,
    Regex,
}

impl Operator {
    pub const ALL: [Operator; 14] = [
        Operator::Count,
        Operator::Map,
        Operator::Filter,
        Operator::Sum,
        Operator::Mean,
        Operator::Min,
        Operator::Max,
        Operator::Range,
        Operator::Unique,
        Operator::Exists,
        Operator::Default,
        Operator::Age,
        Operator::Date,
        Operator::Regex,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operator::Count => "count",
            Operator::Map => "map",
            Operator::Filter => "filter",
            Operator::Sum => "sum",
            Operator::Mean => "mean",
            Operator::Min => "min",
            Operator::Max => "max",
            Operator::Range => "range",
            Operator::Unique => "unique",
            Operator::Exists => "exists",
            Operator::Default => "default",
            Operator::Age => "age",
            Operator::Date => "date",
            Operator::Regex => "regex",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// An empty argument means "use the default behaviour".
    pub fn argument_optional(self) -> bool {
        matches!(
            self,
            Operator::Count
                | Operator::Min
                | Operator::Max
                | Operator::Mean
                | Operator::Range
                | Operator::Exists
        )
    }

    /// Operators that accept a missing or non-sequence input.
    pub fn tolerates_absent(self) -> bool {
        matches!(
            self,
            Operator::Exists | Operator::Default | Operator::Age | Operator::Date | Operator::Regex
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Comparison symbol inside `filter(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq, // =
    Ne, // !=
    Gt, // >
    Ge, // >=
    Lt, // <
    Le, // <=
}

impl Comparator {
    /// Scan order: two-character symbols are tested before their
    /// one-character prefixes.
    pub const PRECEDENCE: [Comparator; 6] = [
        Comparator::Ne,
        Comparator::Ge,
        Comparator::Le,
        Comparator::Gt,
        Comparator::Lt,
        Comparator::Eq,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "!=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// `key<comparator>operand`, operand already quote-stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct Equator<'q> {
    pub key: &'q str,
    pub comparator: Comparator,
    pub operand: String,
}

/// Output selector for `date(...)` and `age(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    Years,
    Months,
    Days,
    Hours,
}

impl FromStr for DateFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "YY" => Ok(DateFormat::Years),
            "MM" => Ok(DateFormat::Months),
            "DD" => Ok(DateFormat::Days),
            "HH" => Ok(DateFormat::Hours),
            _ => Err(format!("invalid date format: {value}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_names_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_name(op.name()), Some(op));
        }
        assert_eq!(Operator::from_name("incorrect"), None);
    }

    #[test]
    fn test_optional_arguments() {
        assert!(Operator::Count.argument_optional());
        assert!(Operator::Range.argument_optional());
        assert!(!Operator::Map.argument_optional());
        assert!(!Operator::Default.argument_optional());
    }

    #[test]
    fn test_date_format_tokens() {
        assert_eq!("MM".parse::<DateFormat>(), Ok(DateFormat::Months));
        assert!("XX".parse::<DateFormat>().is_err());
    }
}
