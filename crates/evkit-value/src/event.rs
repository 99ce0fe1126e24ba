//! The event: a root field map owned by one pipeline stage at a time.
//!
//! An event has no required fields and no schema. Stages read and mutate it
//! in place through paths, then hand it on by value.

use crate::error::{DecodeError, PathError};
use crate::path::{Path, PathLike, PathSegment, insert_at, remove_at, walk, walk_mut};
use crate::value::{Kind, ObjectMap, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A structured log event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    fields: ObjectMap,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn as_map(&self) -> &ObjectMap {
        &self.fields
    }

    pub fn as_map_mut(&mut self) -> &mut ObjectMap {
        &mut self.fields
    }

    /// Top-level fields in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Map(self.fields)
    }

    pub fn get<P: PathLike + ?Sized>(&self, path: &P) -> Result<&Value, PathError> {
        let path = path.to_path()?;
        let field = field_name(&path)?;
        let root = self
            .fields
            .get(field)
            .ok_or_else(|| missing_field(field))?;
        walk(root, &path, 1)
    }

    pub fn get_mut<P: PathLike + ?Sized>(&mut self, path: &P) -> Result<&mut Value, PathError> {
        let path = path.to_path()?;
        let field = field_name(&path)?;
        let root = self
            .fields
            .get_mut(field)
            .ok_or_else(|| missing_field(field))?;
        walk_mut(root, &path, 1)
    }

    pub fn contains<P: PathLike + ?Sized>(&self, path: &P) -> bool {
        self.get(path).is_ok()
    }

    /// Set the value at `path`, creating intermediate containers as needed,
    /// and return whatever was there before.
    pub fn insert<P: PathLike + ?Sized>(
        &mut self,
        path: &P,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, PathError> {
        let path = path.to_path()?;
        let field = field_name(&path)?;
        let Some(next) = path.segments().get(1) else {
            return Ok(self.fields.insert(field.to_owned(), value.into()));
        };
        let root = self
            .fields
            .entry(field.to_owned())
            .or_insert_with(|| match next {
                PathSegment::Key(_) => Value::Map(ObjectMap::new()),
                PathSegment::Index(_) => Value::Array(Vec::new()),
            });
        insert_at(root, &path, 1, value.into())
    }

    /// Remove and return the value at `path`. Remaining fields keep their
    /// order.
    pub fn remove<P: PathLike + ?Sized>(&mut self, path: &P) -> Result<Value, PathError> {
        let path = path.to_path()?;
        let field = field_name(&path)?;
        if path.segments().len() == 1 {
            return self
                .fields
                .shift_remove(field)
                .ok_or_else(|| missing_field(field));
        }
        let root = self
            .fields
            .get_mut(field)
            .ok_or_else(|| missing_field(field))?;
        remove_at(root, &path, 1)
    }

    /// Decode a JSON object into an event.
    pub fn from_json(input: &str) -> Result<Self, DecodeError> {
        match Value::from_json(input)? {
            Value::Map(fields) => Ok(Self { fields }),
            other => Err(DecodeError::NotAnObject(other.kind())),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

/// Event paths always start with a field name.
fn field_name(path: &Path) -> Result<&str, PathError> {
    match path.segments().first() {
        Some(PathSegment::Key(field)) => Ok(field),
        Some(PathSegment::Index(_)) => Err(PathError::TypeMismatch {
            path: Path::root().to_string(),
            expected: "array",
            found: Kind::Map,
        }),
        None => Err(PathError::Invalid {
            path: path.to_string(),
            reason: "event paths must name a field",
        }),
    }
}

fn missing_field(field: &str) -> PathError {
    PathError::NotFound {
        path: Path::root().with(field).to_string(),
    }
}

impl From<ObjectMap> for Event {
    fn from(fields: ObjectMap) -> Self {
        Self { fields }
    }
}

impl TryFrom<Value> for Event {
    type Error = PathError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Map(fields) => Ok(Self { fields }),
            other => Err(PathError::TypeMismatch {
                path: Path::root().to_string(),
                expected: "map",
                found: other.kind(),
            }),
        }
    }
}

impl From<Event> for Value {
    fn from(event: Event) -> Self {
        event.into_value()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Event {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Event {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl Serialize for Event {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Map(fields) => Ok(Self { fields }),
            other => Err(serde::de::Error::custom(format!(
                "expected a JSON object at the event root, found {}",
                other.kind()
            ))),
        }
    }
}
