//! Date parsing, calendar components and elapsed-time "age".
//!
//! Ages are derived from the millisecond difference between two instants:
//!
//! - `YY`: the difference rebased onto the Unix epoch, minus 1970, absolute
//! - `MM`: `YY * 12` plus the month index of `now - anniversary`, where the
//!   anniversary is the date's month/day in `now`'s year
//! - `DD`: whole days of the difference, floored
//! - `HH`: `DD * 24`
//!
//! These are approximations, not calendar arithmetic.

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use super::ast::DateFormat;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Interpret a value as a UTC instant. Strings may be RFC 3339, a bare
/// `YYYY-MM-DD`, or a date-time without offset (taken as UTC); numbers are
/// epoch milliseconds.
pub fn parse_date(value: &Value) -> Option<OffsetDateTime> {
    let parsed = match value {
        Value::String(s) => parse_date_str(s.trim())?,
        Value::Number(n) => from_millis(n.as_f64()?.trunc() as i64)?,
        _ => return None,
    };
    Some(parsed.to_offset(UtcOffset::UTC))
}

fn parse_date_str(s: &str) -> Option<OffsetDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt);
    }
    if let Ok(date) = Date::parse(s, format_description!("[year]-[month]-[day]")) {
        return Some(date.midnight().assume_utc());
    }

    let layouts = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ];
    layouts
        .into_iter()
        .find_map(|layout| PrimitiveDateTime::parse(s, layout).ok())
        .map(PrimitiveDateTime::assume_utc)
}

fn from_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

fn unix_millis(dt: OffsetDateTime) -> i64 {
    dt.unix_timestamp_nanos().div_euclid(1_000_000) as i64
}

/// UTC calendar component: year, 1-based month, day of month or hour.
pub fn component(date: OffsetDateTime, format: DateFormat) -> i64 {
    match format {
        DateFormat::Years => i64::from(date.year()),
        DateFormat::Months => i64::from(u8::from(date.month())),
        DateFormat::Days => i64::from(date.day()),
        DateFormat::Hours => i64::from(date.hour()),
    }
}

/// Elapsed time from `date` to `now` in the requested unit. `None` only when
/// an intermediate instant falls outside the representable range.
pub fn age(date: OffsetDateTime, now: OffsetDateTime, format: DateFormat) -> Option<i64> {
    let now_ms = unix_millis(now);
    let diff = now_ms - unix_millis(date);

    let value = match format {
        DateFormat::Years => elapsed_years(diff)?,
        DateFormat::Months => {
            let anniversary = anniversary(now.year(), date)?;
            let residual = from_millis(now_ms - unix_millis(anniversary))?.month();
            elapsed_years(diff)? * 12 + i64::from(u8::from(residual)) - 1
        }
        DateFormat::Days => diff.div_euclid(MILLIS_PER_DAY),
        DateFormat::Hours => diff.div_euclid(MILLIS_PER_DAY) * 24,
    };
    Some(value)
}

fn elapsed_years(diff_ms: i64) -> Option<i64> {
    let rebased = from_millis(diff_ms)?;
    Some((i64::from(rebased.year()) - 1970).abs())
}

/// Midnight UTC on `date`'s month and day in `year`; a day past the end of
/// the month rolls over into the next one.
fn anniversary(year: i32, date: OffsetDateTime) -> Option<OffsetDateTime> {
    let first = Date::from_calendar_date(year, date.month(), 1).ok()?;
    let day = first.checked_add(Duration::days(i64::from(date.day()) - 1))?;
    Some(day.midnight().assume_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> OffsetDateTime {
        parse_date(&json!(s)).unwrap()
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!(date("2000-07-29").year(), 2000);
        assert_eq!(date("2000-07-29T10:30:00Z").hour(), 10);
        assert_eq!(date("2000-07-29T23:30:00-02:00").day(), 30);
        assert_eq!(date("2000-07-29T10:30:00").hour(), 10);
        assert_eq!(date("2000-07-29 10:30:00").minute(), 30);
        assert_eq!(parse_date(&json!(0)).unwrap().year(), 1970);
        assert!(parse_date(&json!("not-a-date")).is_none());
        assert!(parse_date(&Value::Null).is_none());
    }

    #[test]
    fn test_components() {
        let dob = date("2000-07-29");
        assert_eq!(component(dob, DateFormat::Years), 2000);
        assert_eq!(component(dob, DateFormat::Months), 7);
        assert_eq!(component(dob, DateFormat::Days), 29);
        assert_eq!(component(dob, DateFormat::Hours), 0);
    }

    #[test]
    fn test_age_units() {
        let dob = date("2000-07-29");
        let now = date("2020-01-01");
        assert_eq!(age(dob, now, DateFormat::Years), Some(19));
        assert_eq!(age(dob, now, DateFormat::Months), Some(233));
        assert_eq!(age(dob, now, DateFormat::Days), Some(7095));
        assert_eq!(age(dob, now, DateFormat::Hours), Some(170280));
    }

    #[test]
    fn test_month_residual_approximation() {
        let now = date("2020-01-01");
        assert_eq!(age(date("2015-07-01"), now, DateFormat::Months), Some(54));
        assert_eq!(age(date("2017-12-15"), now, DateFormat::Months), Some(24));
        assert_eq!(age(date("2018-07-20"), now, DateFormat::Months), Some(17));
    }

    #[test]
    fn test_future_date_counts_backwards() {
        let now = date("2020-01-01");
        assert_eq!(age(date("2020-01-03"), now, DateFormat::Days), Some(-2));
        assert_eq!(age(date("2020-01-03"), now, DateFormat::Years), Some(1));
    }

    #[test]
    fn test_anniversary_rolls_over() {
        let leap = date("2000-02-29");
        let rolled = anniversary(2021, leap).unwrap();
        assert_eq!((rolled.month(), rolled.day()), (time::Month::March, 1));
    }
}
