//! Coercion targets and per-call options.

use crate::error::ParseError;
use crate::timezone::TimeZone;
use evkit_value::Kind;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The scalar type a caller asks a value to become.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::String => "string",
            TargetType::Integer => "integer",
            TargetType::Float => "float",
            TargetType::Boolean => "boolean",
            TargetType::Timestamp => "timestamp",
        }
    }

    /// The value kind a successful coercion produces.
    pub fn kind(&self) -> Kind {
        match self {
            TargetType::String => Kind::String,
            TargetType::Integer => Kind::Integer,
            TargetType::Float => Kind::Float,
            TargetType::Boolean => Kind::Boolean,
            TargetType::Timestamp => Kind::Timestamp,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How string timestamps are parsed.
///
/// In configuration this is a single string (`"auto"`, `"rfc3339"`,
/// `"rfc2822"`, `"unix"`, or any strftime pattern) or a list of patterns
/// tried in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// Try [`AUTO_FORMATS`](crate::AUTO_FORMATS) in order, then epoch digits.
    #[default]
    Auto,
    Rfc3339,
    Rfc2822,
    /// Decimal epoch value in the configured [`EpochUnit`].
    Unix,
    /// A single strftime pattern.
    Custom(String),
    /// strftime patterns tried in order; the first match wins.
    Candidates(Vec<String>),
}

impl FromStr for TimestampFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseError::EmptyFormat);
        }
        Ok(match s.to_ascii_lowercase().as_str() {
            "auto" => TimestampFormat::Auto,
            "rfc3339" => TimestampFormat::Rfc3339,
            "rfc2822" => TimestampFormat::Rfc2822,
            "unix" => TimestampFormat::Unix,
            _ => TimestampFormat::Custom(s.to_owned()),
        })
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampFormat::Auto => f.write_str("auto"),
            TimestampFormat::Rfc3339 => f.write_str("rfc3339"),
            TimestampFormat::Rfc2822 => f.write_str("rfc2822"),
            TimestampFormat::Unix => f.write_str("unix"),
            TimestampFormat::Custom(pattern) => f.write_str(pattern),
            TimestampFormat::Candidates(patterns) => f.write_str(&patterns.join(", ")),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampFormatRepr {
    One(String),
    Many(Vec<String>),
}

impl Serialize for TimestampFormat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TimestampFormat::Candidates(patterns) => patterns.serialize(serializer),
            other => serializer.collect_str(other),
        }
    }
}

impl<'de> Deserialize<'de> for TimestampFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match TimestampFormatRepr::deserialize(deserializer)? {
            TimestampFormatRepr::One(s) => s.parse().map_err(serde::de::Error::custom),
            TimestampFormatRepr::Many(patterns) if patterns.is_empty() => {
                Err(serde::de::Error::custom(ParseError::EmptyFormat))
            }
            TimestampFormatRepr::Many(patterns) => Ok(TimestampFormat::Candidates(patterns)),
        }
    }
}

/// Unit of integer epoch values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochUnit {
    #[default]
    #[serde(alias = "s")]
    Seconds,
    #[serde(alias = "ms")]
    Milliseconds,
    #[serde(alias = "us")]
    Microseconds,
    #[serde(alias = "ns")]
    Nanoseconds,
}

impl FromStr for EpochUnit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "seconds" => Ok(EpochUnit::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(EpochUnit::Milliseconds),
            "us" | "micros" | "microseconds" => Ok(EpochUnit::Microseconds),
            "ns" | "nanos" | "nanoseconds" => Ok(EpochUnit::Nanoseconds),
            _ => Err(ParseError::UnknownEpochUnit(s.to_owned())),
        }
    }
}

/// Everything a coercion needs besides the value and target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoerceOptions {
    pub format: TimestampFormat,
    /// Zone assumed for timestamps that carry no offset.
    pub timezone: TimeZone,
    /// Unit of integer (and `unix`-format string) epoch values.
    pub epoch_unit: EpochUnit,
}

impl CoerceOptions {
    pub fn with_format(mut self, format: TimestampFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_timezone(mut self, timezone: TimeZone) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_epoch_unit(mut self, epoch_unit: EpochUnit) -> Self {
        self.epoch_unit = epoch_unit;
        self
    }
}
