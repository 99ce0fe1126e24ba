//! Timestamp parsing and epoch conversion.
//!
//! Every successful parse yields a `DateTime<Utc>`. Inputs with an explicit
//! offset are converted to UTC; inputs without one are read as wall-clock
//! time in [`CoerceOptions::timezone`].

use crate::error::CoercionError;
use crate::options::{CoerceOptions, EpochUnit, TimestampFormat};
use crate::timezone::TimeZone;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// strftime patterns tried by [`TimestampFormat::Auto`] after RFC 3339 and
/// RFC 2822, in order. Offset-bearing patterns come first, then wall-clock
/// date-times, then bare dates (read as midnight).
pub const AUTO_FORMATS: &[&str] = &[
    // with offset
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%d/%b/%Y:%H:%M:%S %z",
    "%a %b %e %H:%M:%S %z %Y",
    // wall clock
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%d/%b/%Y:%H:%M:%S",
    "%a %b %e %H:%M:%S %Y",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    // dates
    "%Y-%m-%d",
    "%Y/%m/%d",
];

const NO_MATCH: &str = "no known format matched";
const GAP: &str = "local time does not exist in the configured time zone";
const OUT_OF_RANGE: &str = "epoch value out of range";

/// Convert an epoch count in `unit` to a UTC instant.
///
/// Returns `None` when the instant is outside the representable range.
pub fn from_epoch(value: i64, unit: EpochUnit) -> Option<DateTime<Utc>> {
    match unit {
        EpochUnit::Seconds => DateTime::from_timestamp(value, 0),
        EpochUnit::Milliseconds => DateTime::from_timestamp_millis(value),
        EpochUnit::Microseconds => DateTime::from_timestamp_micros(value),
        EpochUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
    }
}

/// Parse `input` as a timestamp using `format`.
///
/// `format` is passed separately from `options` so a per-field hint can
/// override the configured format while keeping its zone and epoch unit.
pub fn parse_timestamp(
    input: &str,
    format: &TimestampFormat,
    options: &CoerceOptions,
) -> Result<DateTime<Utc>, CoercionError> {
    let text = input.trim();
    let parsed = match format {
        TimestampFormat::Rfc3339 => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| CoercionError::unparseable(input, "not an RFC 3339 timestamp"))?,
        TimestampFormat::Rfc2822 => DateTime::parse_from_rfc2822(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| CoercionError::unparseable(input, "not an RFC 2822 timestamp"))?,
        TimestampFormat::Unix => match parse_epoch_digits(text) {
            Some(value) => epoch(input, value, options.epoch_unit)?,
            None => return Err(CoercionError::unparseable(input, "not a decimal epoch value")),
        },
        TimestampFormat::Custom(pattern) => {
            first_match(text, std::iter::once(pattern.as_str()), &options.timezone)
                .ok_or_else(|| CoercionError::unparseable(input, "does not match the format"))?
                .map_err(|reason| CoercionError::unparseable(input, reason))?
        }
        TimestampFormat::Candidates(patterns) => {
            first_match(text, patterns.iter().map(String::as_str), &options.timezone)
                .ok_or_else(|| CoercionError::unparseable(input, "matches none of the formats"))?
                .map_err(|reason| CoercionError::unparseable(input, reason))?
        }
        TimestampFormat::Auto => auto(input, text, options)?,
    };
    Ok(parsed)
}

fn auto(
    input: &str,
    text: &str,
    options: &CoerceOptions,
) -> Result<DateTime<Utc>, CoercionError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Some(parsed) = first_match(text, AUTO_FORMATS.iter().copied(), &options.timezone) {
        return parsed.map_err(|reason| CoercionError::unparseable(input, reason));
    }
    match parse_epoch_digits(text) {
        Some(value) => epoch(input, value, options.epoch_unit),
        None => Err(CoercionError::unparseable(input, NO_MATCH)),
    }
}

fn epoch(input: &str, value: i64, unit: EpochUnit) -> Result<DateTime<Utc>, CoercionError> {
    from_epoch(value, unit).ok_or_else(|| CoercionError::unparseable(input, OUT_OF_RANGE))
}

/// An optional `-` followed by ASCII digits only.
fn parse_epoch_digits(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Try `patterns` in order. `None` when nothing matched; `Some(Err)` when a
/// wall-clock match falls into a daylight-saving gap.
fn first_match<'a>(
    text: &str,
    patterns: impl IntoIterator<Item = &'a str>,
    timezone: &TimeZone,
) -> Option<Result<DateTime<Utc>, &'static str>> {
    patterns
        .into_iter()
        .find_map(|pattern| parse_with_pattern(text, pattern, timezone))
}

fn parse_with_pattern(
    text: &str,
    pattern: &str,
    timezone: &TimeZone,
) -> Option<Result<DateTime<Utc>, &'static str>> {
    if let Ok(dt) = DateTime::parse_from_str(text, pattern) {
        return Some(Ok(dt.with_timezone(&Utc)));
    }
    let naive = NaiveDateTime::parse_from_str(text, pattern)
        .or_else(|_| {
            NaiveDate::parse_from_str(text, pattern).map(|date| date.and_time(NaiveTime::MIN))
        })
        .ok()?;
    Some(timezone.to_utc(&naive).ok_or(GAP))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoercionErrorKind;
    use chrono::{TimeZone as _, Timelike};

    fn utc_opts() -> CoerceOptions {
        CoerceOptions::default().with_timezone(TimeZone::utc())
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn auto_utc(input: &str) -> Result<DateTime<Utc>, CoercionError> {
        parse_timestamp(input, &TimestampFormat::Auto, &utc_opts())
    }

    #[test]
    fn auto_reads_offset_formats() {
        let want = at(2020, 11, 1, 21, 15, 47);
        assert_eq!(auto_utc("2020-11-01T21:15:47Z").unwrap(), want);
        assert_eq!(auto_utc("2020-11-01T23:15:47+02:00").unwrap(), want);
        assert_eq!(auto_utc("Sun, 01 Nov 2020 21:15:47 +0000").unwrap(), want);
        assert_eq!(auto_utc("2020-11-01 22:15:47 +0100").unwrap(), want);
        assert_eq!(auto_utc("01/Nov/2020:16:15:47 -0500").unwrap(), want);
    }

    #[test]
    fn auto_reads_wall_clock_formats() {
        let want = at(2020, 11, 1, 21, 15, 47);
        assert_eq!(auto_utc("2020-11-01T21:15:47").unwrap(), want);
        assert_eq!(auto_utc("2020-11-01 21:15:47").unwrap(), want);
        assert_eq!(auto_utc("2020/11/01 21:15:47").unwrap(), want);
        assert_eq!(auto_utc("Sun Nov  1 21:15:47 2020").unwrap(), want);
        assert_eq!(auto_utc("2020-11-01").unwrap(), at(2020, 11, 1, 0, 0, 0));
    }

    #[test]
    fn auto_keeps_fractional_seconds() {
        let ts = auto_utc("2020-11-01T21:15:47.123456").unwrap();
        assert_eq!(ts.nanosecond(), 123_456_000);
    }

    #[test]
    fn auto_falls_back_to_epoch_digits() {
        assert_eq!(auto_utc("1604265347").unwrap(), at(2020, 11, 1, 21, 15, 47));
        let ms = utc_opts().with_epoch_unit(EpochUnit::Milliseconds);
        assert_eq!(
            parse_timestamp("1604265347000", &TimestampFormat::Auto, &ms).unwrap(),
            at(2020, 11, 1, 21, 15, 47)
        );
    }

    #[test]
    fn wall_clock_uses_configured_zone() {
        let plus_two = utc_opts().with_timezone("+02:00".parse().unwrap());
        assert_eq!(
            parse_timestamp("2020-11-01T21:15:47", &TimestampFormat::Auto, &plus_two).unwrap(),
            at(2020, 11, 1, 19, 15, 47)
        );
    }

    #[test]
    fn daylight_saving_gap_is_unparseable() {
        let ny = utc_opts().with_timezone(TimeZone::Named(chrono_tz::America::New_York));
        let err =
            parse_timestamp("2020-03-08 02:30:00", &TimestampFormat::Auto, &ny).unwrap_err();
        assert_eq!(err.kind(), CoercionErrorKind::UnparseableTimestamp);
        assert_eq!(
            parse_timestamp("2020-11-01 01:30:00", &TimestampFormat::Auto, &ny).unwrap(),
            at(2020, 11, 1, 5, 30, 0)
        );
    }

    #[test]
    fn strict_formats_reject_others() {
        let opts = utc_opts();
        assert!(parse_timestamp("2020-11-01 21:15:47", &TimestampFormat::Rfc3339, &opts).is_err());
        assert!(
            parse_timestamp("2020-11-01T21:15:47Z", &TimestampFormat::Rfc2822, &opts).is_err()
        );
        assert!(parse_timestamp("12.5", &TimestampFormat::Unix, &opts).is_err());
        assert_eq!(
            parse_timestamp(" 0 ", &TimestampFormat::Unix, &opts).unwrap(),
            at(1970, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn custom_and_candidate_patterns() {
        let opts = utc_opts();
        let custom = TimestampFormat::Custom("%d.%m.%Y %H:%M".into());
        assert_eq!(
            parse_timestamp("01.11.2020 21:15", &custom, &opts).unwrap(),
            at(2020, 11, 1, 21, 15, 0)
        );
        assert!(parse_timestamp("2020-11-01", &custom, &opts).is_err());

        let candidates = TimestampFormat::Candidates(vec!["%d.%m.%Y".into(), "%Y%m%d".into()]);
        assert_eq!(
            parse_timestamp("20201101", &candidates, &opts).unwrap(),
            at(2020, 11, 1, 0, 0, 0)
        );
    }

    #[test]
    fn garbage_is_unparseable() {
        for bad in ["not-a-date", "", "2020-13-45", "--1"] {
            let err = auto_utc(bad).unwrap_err();
            assert_eq!(err.kind(), CoercionErrorKind::UnparseableTimestamp, "{bad:?}");
        }
    }

    #[test]
    fn epoch_units_and_range() {
        assert_eq!(from_epoch(1, EpochUnit::Seconds), Some(at(1970, 1, 1, 0, 0, 1)));
        assert_eq!(from_epoch(1_000, EpochUnit::Milliseconds), Some(at(1970, 1, 1, 0, 0, 1)));
        assert_eq!(
            from_epoch(1_000_000, EpochUnit::Microseconds),
            Some(at(1970, 1, 1, 0, 0, 1))
        );
        assert_eq!(
            from_epoch(1_000_000_000, EpochUnit::Nanoseconds),
            Some(at(1970, 1, 1, 0, 0, 1))
        );
        assert_eq!(from_epoch(-1, EpochUnit::Seconds), Some(at(1969, 12, 31, 23, 59, 59)));
        assert_eq!(from_epoch(i64::MAX, EpochUnit::Seconds), None);
    }
}
