//! Time zones used to interpret timestamps that carry no offset.

use crate::error::ParseError;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone as _, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Zone assumed for wall-clock timestamps.
///
/// Textual forms: `local`, an IANA name such as `Europe/Berlin` or `UTC`,
/// or a fixed offset such as `+02:00`, `-0530`, `+05` or `Z`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeZone {
    /// The process's local zone, as configured by the host (`TZ`, `/etc/localtime`).
    #[default]
    Local,
    Named(chrono_tz::Tz),
    Fixed(FixedOffset),
}

impl TimeZone {
    pub fn utc() -> Self {
        TimeZone::Named(chrono_tz::UTC)
    }

    /// Convert a wall-clock time in this zone to a UTC instant.
    ///
    /// Times repeated by a daylight-saving fall-back resolve to the earlier
    /// instant. Times skipped by a spring-forward gap do not exist and
    /// return `None`.
    pub fn to_utc(&self, local: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            TimeZone::Local => chrono::Local
                .from_local_datetime(local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            TimeZone::Named(tz) => tz
                .from_local_datetime(local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            TimeZone::Fixed(offset) => offset
                .from_local_datetime(local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Parses `Z`, `+HH`, `+HHMM` and `+HH:MM` (either sign).
fn parse_offset(s: &str) -> Option<FixedOffset> {
    if s.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) || rest.matches(':').count() > 1 {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl FromStr for TimeZone {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("local") {
            return Ok(TimeZone::Local);
        }
        if let Some(offset) = parse_offset(s) {
            return Ok(TimeZone::Fixed(offset));
        }
        if s.eq_ignore_ascii_case("utc") {
            return Ok(TimeZone::utc());
        }
        s.parse::<chrono_tz::Tz>()
            .map(TimeZone::Named)
            .map_err(|_| ParseError::UnknownTimeZone(s.to_owned()))
    }
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeZone::Local => f.write_str("local"),
            TimeZone::Named(tz) => f.write_str(tz.name()),
            TimeZone::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl Serialize for TimeZone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeZone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
