//! Time option parsing.
//!
//! A query selects messages either by a time range (`starttime`/`endtime`)
//! or by an observation time (`time`, default current time). Times are kept
//! in UTC and handed to the message store as `timestamptz` literals.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Serialize, Serializer};

use crate::error::{QueryError, QueryResult};
use crate::options::Validity;
use crate::params::RawParameters;

/// Literal used for the current time.
pub const CURRENT_TIME_LITERAL: &str = "current_timestamp";

/// Output time format of the result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormat {
    #[default]
    Iso,
    Timestamp,
    Sql,
    Xml,
    Epoch,
}

impl TimeFormat {
    pub fn parse(value: &str) -> QueryResult<Self> {
        match value {
            "iso" => Ok(TimeFormat::Iso),
            "timestamp" => Ok(TimeFormat::Timestamp),
            "sql" => Ok(TimeFormat::Sql),
            "xml" => Ok(TimeFormat::Xml),
            "epoch" => Ok(TimeFormat::Epoch),
            _ => Err(QueryError::UnknownValue(
                "Unknown 'timeformat', use 'iso', 'timestamp', 'sql', 'xml' or 'epoch'".to_string(),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFormat::Iso => "iso",
            TimeFormat::Timestamp => "timestamp",
            TimeFormat::Sql => "sql",
            TimeFormat::Xml => "xml",
            TimeFormat::Epoch => "epoch",
        }
    }
}

/// A UTC instant, displayed as a `timestamptz` literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UtcTime(DateTime<Utc>);

impl UtcTime {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self(time)
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Canonical literal, e.g. `timestamptz '20101010T101020Z'`.
    pub fn literal(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for UtcTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timestamptz '{}'", self.0.format("%Y%m%dT%H%M%SZ"))
    }
}

impl Serialize for UtcTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Observation time of a query without a time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationTime {
    Current,
    At(UtcTime),
}

impl ObservationTime {
    pub fn literal(&self) -> String {
        match self {
            ObservationTime::Current => CURRENT_TIME_LITERAL.to_string(),
            ObservationTime::At(time) => time.literal(),
        }
    }
}

/// Time selection of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSelection {
    Range { start: UtcTime, end: UtcTime },
    Observation(ObservationTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeOptions {
    pub selection: TimeSelection,

    /// For time range queries of accepted messages, select messages valid
    /// within the range instead of messages created within it.
    pub valid_range_messages: bool,

    pub time_format: TimeFormat,
}

impl TimeOptions {
    pub fn time_range(&self) -> Option<(UtcTime, UtcTime)> {
        match self.selection {
            TimeSelection::Range { start, end } => Some((start, end)),
            TimeSelection::Observation(_) => None,
        }
    }

    pub fn observation_time(&self) -> Option<ObservationTime> {
        match self.selection {
            TimeSelection::Observation(time) => Some(time),
            TimeSelection::Range { .. } => None,
        }
    }
}

/// Parse a time value in any of the accepted syntaxes.
///
/// Accepted are RFC 3339, ISO 8601 basic format (`20101010T101020Z`),
/// compact `YYYYMMDDHHMMSS`/`YYYYMMDDHHMM`, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD` and epoch seconds. Times without a
/// zone are UTC.
pub fn parse_time(option: &str, raw: &str) -> QueryResult<UtcTime> {
    let value = raw.trim();

    parse_rfc3339(value)
        .or_else(|| parse_extended(value))
        .or_else(|| parse_basic(value))
        .or_else(|| parse_epoch(value))
        .map(UtcTime::new)
        .ok_or_else(|| QueryError::invalid_option(option, format!("Unknown time string '{}'", raw)))
}

fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_extended(value: &str) -> Option<DateTime<Utc>> {
    let value = value.strip_suffix('Z').unwrap_or(value);

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

fn parse_basic(value: &str) -> Option<DateTime<Utc>> {
    let value = value.strip_suffix('Z').unwrap_or(value);

    let digits = match value.split_once('T') {
        Some((date, time)) if date.len() == 8 => format!("{}{}", date, time),
        Some(_) => return None,
        None => value.to_string(),
    };

    if !digits.bytes().all(|b| b.is_ascii_digit()) || !matches!(digits.len(), 12 | 14) {
        return None;
    }

    let field = |range: std::ops::Range<usize>| digits[range].parse::<u32>().ok();

    let year = digits[0..4].parse::<i32>().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?)?;
    let second = if digits.len() == 14 { field(12..14)? } else { 0 };
    let ndt = date.and_hms_opt(field(8..10)?, field(10..12)?, second)?;

    Some(Utc.from_utc_datetime(&ndt))
}

fn parse_epoch(value: &str) -> Option<DateTime<Utc>> {
    let digits = value.strip_prefix('-').unwrap_or(value);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let seconds = value.parse::<i64>().ok()?;
    Utc.timestamp_opt(seconds, 0).single()
}

/// Parse time options.
///
/// `max_range_days` limits the length of a time range; 0 means unlimited.
pub fn parse_time_options(
    params: &RawParameters,
    validity: Validity,
    max_range_days: i32,
) -> QueryResult<TimeOptions> {
    // An empty value is the same as an absent one
    let given = |name: &str| params.get(name).filter(|v| !v.trim().is_empty());

    let start = given("starttime");
    let end = given("endtime");
    let time = given("time");

    let selection = match (start, end) {
        (Some(_), None) | (None, Some(_)) => {
            return Err(QueryError::MissingParameter(
                "'starttime' and 'endtime' options must be given simultaneously".to_string(),
            ));
        }
        (Some(start), Some(end)) => {
            if time.is_some() {
                return Err(QueryError::Conflict(
                    "Can't specify both time range ('starttime' and 'endtime') and observation \
                     time ('time')"
                        .to_string(),
                ));
            }

            let start = parse_time("starttime", start)?;
            let end = parse_time("endtime", end)?;

            if start > end {
                return Err(QueryError::Conflict(
                    "'starttime' must be earlier than 'endtime'".to_string(),
                ));
            }

            let hours = (end.datetime() - start.datetime()).num_hours();

            if max_range_days > 0 && hours > i64::from(max_range_days) * 24 {
                return Err(QueryError::Conflict(format!(
                    "Time range too long, maximum is {} days",
                    max_range_days
                )));
            }

            TimeSelection::Range { start, end }
        }
        (None, None) => {
            if validity == Validity::Rejected {
                return Err(QueryError::Conflict(
                    "Time range must be used to query rejected messages".to_string(),
                ));
            }

            match time {
                Some(time) => TimeSelection::Observation(ObservationTime::At(parse_time("time", time)?)),
                None => TimeSelection::Observation(ObservationTime::Current),
            }
        }
    };

    let time_format = match params.get("timeformat") {
        Some(format) => TimeFormat::parse(format)?,
        None => TimeFormat::default(),
    };

    let valid_range_messages = params.optional_unsigned("validrangemessages", 1)? != 0;

    Ok(TimeOptions {
        selection,
        valid_range_messages,
        time_format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LITERAL: &str = "timestamptz '20101010T101020Z'";

    fn params(pairs: &[(&str, &str)]) -> RawParameters {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_time_syntaxes() {
        for value in [
            "2010-10-10T10:10:20Z",
            "2010-10-10T12:10:20+02:00",
            "2010-10-10T10:10:20",
            "2010-10-10 10:10:20",
            "20101010T101020Z",
            "20101010T101020",
            "20101010101020",
            " 1286705420 ",
        ] {
            assert_eq!(parse_time("time", value).unwrap().literal(), LITERAL, "{}", value);
        }

        assert_eq!(
            parse_time("time", "201010101010").unwrap().literal(),
            "timestamptz '20101010T101000Z'"
        );
        assert_eq!(
            parse_time("time", "2010-10-10").unwrap().literal(),
            "timestamptz '20101010T000000Z'"
        );
    }

    #[test]
    fn test_invalid_time() {
        for value in ["", "yesterday", "20101310T101020", "2010-10-10T25:00:00", "1T2"] {
            assert!(parse_time("time", value).is_err(), "{}", value);
        }
    }

    #[test]
    fn test_time_format() {
        assert_eq!(TimeFormat::parse("epoch").unwrap(), TimeFormat::Epoch);
        assert_eq!(
            TimeFormat::parse("ISO").unwrap_err().to_string(),
            "Unknown 'timeformat', use 'iso', 'timestamp', 'sql', 'xml' or 'epoch'"
        );
        assert!(TimeFormat::parse("").is_err());
        assert_eq!(TimeFormat::Xml.as_str(), "xml");
    }

    #[test]
    fn test_default_is_current_time() {
        let options = parse_time_options(&params(&[]), Validity::Accepted, 31).unwrap();
        assert_eq!(
            options.observation_time(),
            Some(ObservationTime::Current)
        );
        assert_eq!(options.observation_time().unwrap().literal(), CURRENT_TIME_LITERAL);
        assert_eq!(options.time_format, TimeFormat::Iso);
        assert!(options.valid_range_messages);
    }

    #[test]
    fn test_empty_time_values_are_absent() {
        let options =
            parse_time_options(&params(&[("time", "")]), Validity::Accepted, 31).unwrap();
        assert_eq!(options.observation_time(), Some(ObservationTime::Current));

        let options = parse_time_options(
            &params(&[("starttime", ""), ("endtime", " ")]),
            Validity::Accepted,
            31,
        )
        .unwrap();
        assert_eq!(options.observation_time(), Some(ObservationTime::Current));

        let err = parse_time_options(
            &params(&[("starttime", "2010-10-10"), ("endtime", "")]),
            Validity::Accepted,
            31,
        )
        .unwrap_err();
        assert!(matches!(err, QueryError::MissingParameter(_)));
    }

    #[test]
    fn test_observation_time() {
        let options = parse_time_options(
            &params(&[("time", "20101010T101020"), ("timeformat", "sql")]),
            Validity::Accepted,
            31,
        )
        .unwrap();
        assert_eq!(options.observation_time().unwrap().literal(), LITERAL);
        assert_eq!(options.time_format, TimeFormat::Sql);
    }

    #[test]
    fn test_range_requires_both_ends() {
        let err = parse_time_options(
            &params(&[("starttime", "2010-10-10")]),
            Validity::Accepted,
            31,
        )
        .unwrap_err();
        assert!(matches!(err, QueryError::MissingParameter(_)));

        let err =
            parse_time_options(&params(&[("endtime", "2010-10-10")]), Validity::Accepted, 31)
                .unwrap_err();
        assert!(matches!(err, QueryError::MissingParameter(_)));
    }

    #[test]
    fn test_range_and_time_conflict() {
        let err = parse_time_options(
            &params(&[
                ("starttime", "2010-10-10"),
                ("endtime", "2010-10-11"),
                ("time", "2010-10-10"),
            ]),
            Validity::Accepted,
            31,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can't specify both time range ('starttime' and 'endtime') and observation time ('time')"
        );
    }

    #[test]
    fn test_range_order_and_length() {
        let err = parse_time_options(
            &params(&[("starttime", "2010-10-11"), ("endtime", "2010-10-10")]),
            Validity::Accepted,
            31,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "'starttime' must be earlier than 'endtime'");

        let err = parse_time_options(
            &params(&[("starttime", "2010-10-10"), ("endtime", "2010-12-10")]),
            Validity::Accepted,
            31,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Time range too long, maximum is 31 days");

        // Exactly the maximum is allowed, 0 is unlimited
        assert!(parse_time_options(
            &params(&[("starttime", "2010-10-10"), ("endtime", "2010-10-11")]),
            Validity::Accepted,
            1,
        )
        .is_ok());
        assert!(parse_time_options(
            &params(&[("starttime", "2000-10-10"), ("endtime", "2010-12-10")]),
            Validity::Accepted,
            0,
        )
        .is_ok());
    }

    #[test]
    fn test_equal_range_ends() {
        let options = parse_time_options(
            &params(&[("starttime", "1286705420"), ("endtime", "2010-10-10T10:10:20Z")]),
            Validity::Accepted,
            31,
        )
        .unwrap();
        let (start, end) = options.time_range().unwrap();
        assert_eq!(start.literal(), LITERAL);
        assert_eq!(end.literal(), LITERAL);
    }

    #[test]
    fn test_rejected_requires_range() {
        let err = parse_time_options(&params(&[]), Validity::Rejected, 31).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Time range must be used to query rejected messages"
        );

        assert!(parse_time_options(
            &params(&[("starttime", "2010-10-10"), ("endtime", "2010-10-11")]),
            Validity::Rejected,
            31,
        )
        .is_ok());
    }

    #[test]
    fn test_valid_range_messages() {
        let options = parse_time_options(
            &params(&[("validrangemessages", "0")]),
            Validity::Accepted,
            31,
        )
        .unwrap();
        assert!(!options.valid_range_messages);
    }

    #[test]
    fn test_serialized_as_literal() {
        let time = parse_time("time", "20101010T101020Z").unwrap();
        let options = TimeOptions {
            selection: TimeSelection::Observation(ObservationTime::At(time)),
            valid_range_messages: true,
            time_format: TimeFormat::Epoch,
        };
        let json = serde_json::to_value(options).unwrap();
        assert_eq!(json["selection"]["observation"]["at"], LITERAL);
        assert_eq!(json["time_format"], "epoch");
    }
}
