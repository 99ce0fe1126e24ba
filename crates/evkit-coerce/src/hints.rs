//! Per-field type hints.
//!
//! A producer that knows what a loosely typed field really holds declares it
//! as a hint (`status=int`, `ts=timestamp|%d/%m/%Y %H:%M`). [`TypeHints`]
//! applies a whole table of them to an event in place.

use crate::coerce::coerce_with_format;
use crate::error::{CoercionError, FieldCoercionError, ParseError};
use crate::options::{CoerceOptions, TargetType, TimestampFormat};
use evkit_value::{Event, IndexMap, Path, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// A target type, plus a timestamp format that overrides the one in
/// [`CoerceOptions`] for this field only.
///
/// Textual grammar: `string` (or `str`, `bytes`), `int` (or `integer`),
/// `float`, `bool` (or `boolean`), `timestamp`, or `timestamp|FORMAT` where
/// FORMAT is `rfc3339`, `rfc2822`, `unix`, `auto` or a strftime pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub target: TargetType,
    pub format: Option<TimestampFormat>,
}

impl Conversion {
    pub fn new(target: TargetType) -> Self {
        Self {
            target,
            format: None,
        }
    }

    pub fn timestamp(format: TimestampFormat) -> Self {
        Self {
            target: TargetType::Timestamp,
            format: Some(format),
        }
    }

    pub fn parse(hint: &str) -> Result<Self, ParseError> {
        let (name, format) = match hint.split_once('|') {
            Some((name, format)) => (name.trim(), Some(format)),
            None => (hint.trim(), None),
        };
        let target = match name.to_ascii_lowercase().as_str() {
            "string" | "str" | "bytes" => TargetType::String,
            "int" | "integer" => TargetType::Integer,
            "float" => TargetType::Float,
            "bool" | "boolean" => TargetType::Boolean,
            "timestamp" => TargetType::Timestamp,
            _ => return Err(ParseError::UnknownType(hint.to_owned())),
        };
        match format {
            None => Ok(Self::new(target)),
            Some(format) if target == TargetType::Timestamp => {
                Ok(Self::timestamp(format.parse()?))
            }
            Some(_) => Err(ParseError::UnexpectedFormat(hint.to_owned())),
        }
    }

    /// Coerce `value` to this conversion's target.
    pub fn apply(&self, value: &Value, options: &CoerceOptions) -> Result<Value, CoercionError> {
        let format = self.format.as_ref().unwrap_or(&options.format);
        coerce_with_format(value, self.target, format, options)
    }
}

impl From<TargetType> for Conversion {
    fn from(target: TargetType) -> Self {
        Self::new(target)
    }
}

impl FromStr for Conversion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.format {
            Some(format) => write!(f, "{}|{format}", self.target),
            None => write!(f, "{}", self.target),
        }
    }
}

/// Config form: either the textual grammar or, to give a list of candidate
/// patterns, `{"type": "timestamp", "format": [..]}`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ConversionRepr {
    Text(String),
    Detailed {
        #[serde(rename = "type")]
        target: TargetType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<TimestampFormat>,
    },
}

impl Serialize for Conversion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self.format {
            Some(TimestampFormat::Candidates(_)) => ConversionRepr::Detailed {
                target: self.target,
                format: self.format.clone(),
            }
            .serialize(serializer),
            _ => serializer.collect_str(self),
        }
    }
}

impl<'de> Deserialize<'de> for Conversion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match ConversionRepr::deserialize(deserializer)? {
            ConversionRepr::Text(hint) => hint.parse().map_err(serde::de::Error::custom),
            ConversionRepr::Detailed {
                target: TargetType::Timestamp,
                format,
            } => Ok(Self {
                target: TargetType::Timestamp,
                format,
            }),
            ConversionRepr::Detailed {
                target,
                format: None,
            } => Ok(Self::new(target)),
            ConversionRepr::Detailed { target, .. } => Err(serde::de::Error::custom(
                ParseError::UnexpectedFormat(target.to_string()),
            )),
        }
    }
}

/// Field path to conversion, applied in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeHints {
    hints: IndexMap<Path, Conversion>,
}

impl TypeHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    /// Add or replace the hint for `path`.
    pub fn insert(&mut self, path: Path, conversion: Conversion) -> Option<Conversion> {
        self.hints.insert(path, conversion)
    }

    pub fn get(&self, path: &Path) -> Option<&Conversion> {
        self.hints.get(path)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Path, Conversion> {
        self.hints.iter()
    }

    /// Parse one `PATH=TYPE` assignment, as given on a command line.
    ///
    /// The split happens at the first `=`.
    pub fn parse_assignment(assignment: &str) -> Result<(Path, Conversion), ParseError> {
        let (path, hint) = assignment
            .split_once('=')
            .ok_or_else(|| ParseError::MalformedHint(assignment.to_owned()))?;
        Ok((hint_path(path.trim())?, Conversion::parse(hint)?))
    }

    /// Build from `(path, hint)` string pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        pairs
            .into_iter()
            .map(|(path, hint)| {
                Ok((hint_path(path.as_ref())?, Conversion::parse(hint.as_ref())?))
            })
            .collect::<Result<Self, ParseError>>()
    }

    /// Add every hint from `other`, replacing hints for the same path.
    pub fn merge(&mut self, other: TypeHints) {
        self.hints.extend(other.hints);
    }

    /// Coerce each hinted field of `event` in place and return how many were
    /// coerced.
    ///
    /// Fields that are absent, null, or unreachable through the event's
    /// actual structure are skipped. On the first failure the error is
    /// returned; fields coerced before it keep their new values.
    pub fn apply(
        &self,
        event: &mut Event,
        options: &CoerceOptions,
    ) -> Result<usize, FieldCoercionError> {
        let mut coerced = 0;
        for (path, conversion) in &self.hints {
            if apply_one(event, path, conversion, options)? {
                coerced += 1;
            }
        }
        Ok(coerced)
    }

    /// Like [`apply`](Self::apply), but keeps going after a failure and
    /// returns every error. Failed fields keep their original values.
    pub fn apply_all(&self, event: &mut Event, options: &CoerceOptions) -> Vec<FieldCoercionError> {
        self.hints
            .iter()
            .filter_map(|(path, conversion)| apply_one(event, path, conversion, options).err())
            .collect()
    }
}

/// Returns whether the field was present and coerced.
fn apply_one(
    event: &mut Event,
    path: &Path,
    conversion: &Conversion,
    options: &CoerceOptions,
) -> Result<bool, FieldCoercionError> {
    let Ok(slot) = event.get_mut(path) else {
        return Ok(false);
    };
    if slot.is_null() {
        return Ok(false);
    }
    let value = conversion
        .apply(slot, options)
        .map_err(|source| FieldCoercionError {
            path: path.to_string(),
            source,
        })?;
    *slot = value;
    trace!(field = %path, to = %conversion.target, "coerced field");
    Ok(true)
}

fn hint_path(raw: &str) -> Result<Path, ParseError> {
    let path = Path::parse(raw)?;
    if path.is_root() {
        return Err(ParseError::MalformedHint(raw.to_owned()));
    }
    Ok(path)
}

impl FromIterator<(Path, Conversion)> for TypeHints {
    fn from_iter<I: IntoIterator<Item = (Path, Conversion)>>(iter: I) -> Self {
        Self {
            hints: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TypeHints {
    type Item = (&'a Path, &'a Conversion);
    type IntoIter = indexmap::map::Iter<'a, Path, Conversion>;

    fn into_iter(self) -> Self::IntoIter {
        self.hints.iter()
    }
}

impl Serialize for TypeHints {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.hints.iter().map(|(path, c)| (path.to_string(), c)))
    }
}

impl<'de> Deserialize<'de> for TypeHints {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, Conversion>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(path, conversion)| Ok((hint_path(&path)?, conversion)))
            .collect::<Result<Self, ParseError>>()
            .map_err(serde::de::Error::custom)
    }
}
