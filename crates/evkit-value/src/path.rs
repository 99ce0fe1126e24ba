//! Paths into nested values.
//!
//! A path is a sequence of map keys and array indices, written as
//! `a.b[0].c`. Keys containing `.`, `[`, `]`, `"`, `\` or whitespace are
//! quoted: `a."dotted.key"[2]`. An empty path (`""` or `"."`) addresses the
//! root value itself.

use crate::error::PathError;
use crate::value::{ObjectMap, Value};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// One step into a composite value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    fn expected(&self) -> &'static str {
        match self {
            PathSegment::Key(_) => "map",
            PathSegment::Index(_) => "array",
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A parsed path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// The empty path, addressing the root value.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self, PathError> {
        Parser::new(input).parse()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.segments.push(segment.into());
    }

    /// Builder form of [`Path::push`].
    pub fn with(mut self, segment: impl Into<PathSegment>) -> Self {
        self.push(segment);
        self
    }

    fn render_prefix(&self, len: usize) -> String {
        Path {
            segments: self.segments[..len].to_vec(),
        }
        .to_string()
    }

    fn not_found(&self, depth: usize) -> PathError {
        PathError::NotFound {
            path: self.render_prefix(depth + 1),
        }
    }

    fn mismatch(&self, depth: usize, found: &Value) -> PathError {
        PathError::TypeMismatch {
            path: self.render_prefix(depth),
            expected: self.segments[depth].expected(),
            found: found.kind(),
        }
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

fn needs_quoting(key: &str) -> bool {
    key.is_empty()
        || key
            .chars()
            .any(|c| matches!(c, '.' | '[' | ']' | '"' | '\\') || c.is_whitespace())
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(".");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    if needs_quoting(key) {
                        f.write_str("\"")?;
                        for c in key.chars() {
                            if matches!(c, '"' | '\\') {
                                f.write_str("\\")?;
                            }
                            write!(f, "{c}")?;
                        }
                        f.write_str("\"")?;
                    } else {
                        f.write_str(key)?;
                    }
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
        }
    }

    fn err(&self, reason: &'static str) -> PathError {
        PathError::invalid(self.input, reason)
    }

    fn parse(mut self) -> Result<Path, PathError> {
        let mut segments = Vec::new();
        if self.input.is_empty() || self.input == "." {
            return Ok(Path { segments });
        }
        if matches!(self.chars.peek(), Some('.')) {
            self.chars.next();
        }

        let mut expect_key = !matches!(self.chars.peek(), Some('['));
        loop {
            if expect_key {
                segments.push(PathSegment::Key(self.key()?));
            }
            match self.chars.next() {
                None => break,
                Some('.') => expect_key = true,
                Some('[') => {
                    segments.push(PathSegment::Index(self.index()?));
                    expect_key = false;
                }
                Some(_) => return Err(self.err("unexpected character after segment")),
            }
        }
        Ok(Path { segments })
    }

    fn key(&mut self) -> Result<String, PathError> {
        if matches!(self.chars.peek(), Some('"')) {
            self.chars.next();
            return self.quoted_key();
        }
        let mut key = String::new();
        while let Some(&c) = self.chars.peek() {
            match c {
                '.' | '[' => break,
                ']' | '"' | '\\' => return Err(self.err("unquoted key contains reserved character")),
                _ => {
                    key.push(c);
                    self.chars.next();
                }
            }
        }
        if key.is_empty() {
            return Err(self.err("empty key segment"));
        }
        Ok(key)
    }

    fn quoted_key(&mut self) -> Result<String, PathError> {
        let mut key = String::new();
        loop {
            match self.chars.next() {
                None => return Err(self.err("unterminated quoted key")),
                Some('"') => return Ok(key),
                Some('\\') => match self.chars.next() {
                    Some(c @ ('"' | '\\')) => key.push(c),
                    _ => return Err(self.err("invalid escape in quoted key")),
                },
                Some(c) => key.push(c),
            }
        }
    }

    fn index(&mut self) -> Result<usize, PathError> {
        let mut digits = String::new();
        loop {
            match self.chars.next() {
                Some(']') => break,
                Some(c) if c.is_ascii_digit() => digits.push(c),
                Some(_) => return Err(self.err("array index must be a non-negative integer")),
                None => return Err(self.err("unterminated array index")),
            }
        }
        digits
            .parse::<usize>()
            .map_err(|_| self.err("array index must be a non-negative integer"))
    }
}

/// Anything that can name a path: parsed [`Path`]s or path strings.
pub trait PathLike {
    fn to_path(&self) -> Result<Cow<'_, Path>, PathError>;
}

impl PathLike for Path {
    fn to_path(&self) -> Result<Cow<'_, Path>, PathError> {
        Ok(Cow::Borrowed(self))
    }
}

impl PathLike for str {
    fn to_path(&self) -> Result<Cow<'_, Path>, PathError> {
        Path::parse(self).map(Cow::Owned)
    }
}

impl PathLike for String {
    fn to_path(&self) -> Result<Cow<'_, Path>, PathError> {
        Path::parse(self).map(Cow::Owned)
    }
}

fn empty_container_for(next: &PathSegment) -> Value {
    match next {
        PathSegment::Key(_) => Value::Map(ObjectMap::new()),
        PathSegment::Index(_) => Value::Array(Vec::new()),
    }
}

impl Value {
    /// Look up a nested value.
    ///
    /// Fails with `NotFound` for a missing key or out-of-bounds index and
    /// with `TypeMismatch` when a segment meets a value that is not the
    /// matching container.
    pub fn get_path(&self, path: &Path) -> Result<&Value, PathError> {
        walk(self, path, 0)
    }

    pub fn get_path_mut(&mut self, path: &Path) -> Result<&mut Value, PathError> {
        walk_mut(self, path, 0)
    }

    /// Insert `value` at `path`, returning the value it replaced.
    ///
    /// Missing intermediate keys are created as empty maps (or arrays when
    /// the next segment is an index). Indices past the end of an array pad
    /// it with `Null`, at most [`MAX_INDEX_GAP`] of them; a larger gap is
    /// `Invalid`. Existing scalars in the way are a `TypeMismatch`.
    pub fn insert_path(&mut self, path: &Path, value: Value) -> Result<Option<Value>, PathError> {
        if path.is_root() {
            return Ok(Some(std::mem::replace(self, value)));
        }
        insert_at(self, path, 0, value)
    }

    /// Remove and return the value at `path`. Remaining map keys keep their
    /// order; later array elements shift down. The root cannot be removed.
    pub fn remove_path(&mut self, path: &Path) -> Result<Value, PathError> {
        if path.is_root() {
            return Err(PathError::invalid(".", "cannot remove the root value"));
        }
        remove_at(self, path, 0)
    }
}

// The walkers below start at segment `from` of `path` with `current` being
// the value already reached by the segments before it, so error paths are
// always rendered against the full path.

pub(crate) fn walk<'v>(
    mut current: &'v Value,
    path: &Path,
    from: usize,
) -> Result<&'v Value, PathError> {
    for (depth, segment) in path.segments.iter().enumerate().skip(from) {
        current = match (current, segment) {
            (Value::Map(map), PathSegment::Key(key)) => {
                map.get(key).ok_or_else(|| path.not_found(depth))?
            }
            (Value::Array(items), PathSegment::Index(index)) => {
                items.get(*index).ok_or_else(|| path.not_found(depth))?
            }
            (other, _) => return Err(path.mismatch(depth, other)),
        };
    }
    Ok(current)
}

pub(crate) fn walk_mut<'v>(
    mut current: &'v mut Value,
    path: &Path,
    from: usize,
) -> Result<&'v mut Value, PathError> {
    for (depth, segment) in path.segments.iter().enumerate().skip(from) {
        current = match (current, segment) {
            (Value::Map(map), PathSegment::Key(key)) => {
                map.get_mut(key).ok_or_else(|| path.not_found(depth))?
            }
            (Value::Array(items), PathSegment::Index(index)) => {
                items.get_mut(*index).ok_or_else(|| path.not_found(depth))?
            }
            (other, _) => return Err(path.mismatch(depth, other)),
        };
    }
    Ok(current)
}

/// Most `Null`s an insert may append to reach an index past the end.
pub const MAX_INDEX_GAP: usize = 1 << 16;

/// Grow `items` with `Null` up to `index`, which must be `>= items.len()`.
fn pad_to(
    items: &mut Vec<Value>,
    index: usize,
    path: &Path,
    depth: usize,
) -> Result<(), PathError> {
    if index - items.len() > MAX_INDEX_GAP {
        return Err(PathError::invalid(
            &path.render_prefix(depth + 1),
            "array index too far past the end",
        ));
    }
    items.resize(index, Value::Null);
    Ok(())
}

/// `path` must have at least `from + 1` segments.
pub(crate) fn insert_at(
    mut current: &mut Value,
    path: &Path,
    from: usize,
    value: Value,
) -> Result<Option<Value>, PathError> {
    let last_depth = path.segments.len() - 1;
    for depth in from..last_depth {
        let next = &path.segments[depth + 1];
        current = match (current, &path.segments[depth]) {
            (Value::Map(map), PathSegment::Key(key)) => map
                .entry(key.clone())
                .or_insert_with(|| empty_container_for(next)),
            (Value::Array(items), PathSegment::Index(index)) => {
                if *index >= items.len() {
                    pad_to(items, *index, path, depth)?;
                    items.push(empty_container_for(next));
                }
                &mut items[*index]
            }
            (other, _) => return Err(path.mismatch(depth, other)),
        };
    }

    match (current, &path.segments[last_depth]) {
        (Value::Map(map), PathSegment::Key(key)) => Ok(map.insert(key.clone(), value)),
        (Value::Array(items), PathSegment::Index(index)) => {
            if let Some(slot) = items.get_mut(*index) {
                Ok(Some(std::mem::replace(slot, value)))
            } else {
                pad_to(items, *index, path, last_depth)?;
                items.push(value);
                Ok(None)
            }
        }
        (other, _) => Err(path.mismatch(last_depth, other)),
    }
}

/// `path` must have at least `from + 1` segments.
pub(crate) fn remove_at(current: &mut Value, path: &Path, from: usize) -> Result<Value, PathError> {
    let last_depth = path.segments.len() - 1;
    let parent = if last_depth > from {
        let parent_path = Path {
            segments: path.segments[..last_depth].to_vec(),
        };
        // Walk with the truncated path so errors render the same prefixes.
        walk_mut(current, &parent_path, from)?
    } else {
        current
    };
    match (parent, &path.segments[last_depth]) {
        (Value::Map(map), PathSegment::Key(key)) => map
            .shift_remove(key)
            .ok_or_else(|| path.not_found(last_depth)),
        (Value::Array(items), PathSegment::Index(index)) if *index < items.len() => {
            Ok(items.remove(*index))
        }
        (Value::Array(_), PathSegment::Index(_)) => Err(path.not_found(last_depth)),
        (other, _) => Err(path.mismatch(last_depth, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Kind;
    use serde_json::json;

    fn doc() -> Value {
        Value::from_json_value(json!({
            "http": {"status": 200, "headers": {"content-type": "text/plain"}},
            "tags": ["a", {"b": true}],
            "dotted.key": 1
        }))
    }

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn parse_keys_indices_and_quotes() {
        assert_eq!(
            p("a.b[0][12].\"c.d\"").segments(),
            &[
                PathSegment::Key("a".into()),
                PathSegment::Key("b".into()),
                PathSegment::Index(0),
                PathSegment::Index(12),
                PathSegment::Key("c.d".into()),
            ]
        );
        assert_eq!(p(".a").segments(), &[PathSegment::Key("a".into())]);
        assert_eq!(p("[3]").segments(), &[PathSegment::Index(3)]);
        assert!(p("").is_root());
        assert!(p(".").is_root());
        assert_eq!(
            p(r#""say \"hi\"""#).segments(),
            &[PathSegment::Key("say \"hi\"".into())]
        );
    }

    #[test]
    fn parse_rejects_malformed_paths() {
        for bad in ["a..b", "a.", "a[", "a[x]", "a[-1]", "\"open", "a]b", "a[1]b"] {
            assert!(
                matches!(Path::parse(bad), Err(PathError::Invalid { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn display_roundtrips_through_parse() {
        for text in ["a.b[0].c", "\"dotted.key\"[1]", "[0].x", "a.\"\"", "."] {
            let path = p(text);
            assert_eq!(p(&path.to_string()), path);
        }
        assert_eq!(Path::root().with("a").with(2usize).to_string(), "a[2]");
    }

    #[test]
    fn get_path_traverses_maps_and_arrays() {
        let v = doc();
        assert_eq!(v.get_path(&p("http.status")).unwrap(), &Value::Integer(200));
        assert_eq!(v.get_path(&p("tags[1].b")).unwrap(), &Value::Boolean(true));
        assert_eq!(v.get_path(&p("\"dotted.key\"")).unwrap(), &Value::Integer(1));
        assert_eq!(v.get_path(&Path::root()).unwrap(), &v);
    }

    #[test]
    fn get_path_reports_missing_segments() {
        let v = doc();
        assert_eq!(
            v.get_path(&p("http.method")).unwrap_err(),
            PathError::NotFound {
                path: "http.method".into()
            }
        );
        assert_eq!(
            v.get_path(&p("tags[5]")).unwrap_err(),
            PathError::NotFound {
                path: "tags[5]".into()
            }
        );
    }

    #[test]
    fn get_path_reports_type_mismatch() {
        let v = doc();
        assert_eq!(
            v.get_path(&p("http.status.code")).unwrap_err(),
            PathError::TypeMismatch {
                path: "http.status".into(),
                expected: "map",
                found: Kind::Integer,
            }
        );
        assert!(matches!(
            v.get_path(&p("http[0]")),
            Err(PathError::TypeMismatch { expected: "array", found: Kind::Map, .. })
        ));
        assert!(matches!(
            v.get_path(&p("tags.first")),
            Err(PathError::TypeMismatch { expected: "map", found: Kind::Array, .. })
        ));
    }

    #[test]
    fn insert_path_creates_intermediate_containers() {
        let mut v = Value::Map(ObjectMap::new());
        assert_eq!(v.insert_path(&p("a.b[2].c"), 1.into()).unwrap(), None);
        assert_eq!(
            v.to_json(),
            json!({"a": {"b": [null, null, {"c": 1}]}})
        );

        let old = v.insert_path(&p("a.b[0]"), "x".into()).unwrap();
        assert_eq!(old, Some(Value::Null));
        assert_eq!(v.get_path(&p("a.b[0]")).unwrap(), &Value::from("x"));
    }

    #[test]
    fn insert_path_replaces_in_place_and_keeps_order() {
        let mut v = Value::from_json(r#"{"first":1,"second":2}"#).unwrap();
        let old = v.insert_path(&p("first"), 10.into()).unwrap();
        assert_eq!(old, Some(Value::Integer(1)));
        assert_eq!(v.to_json_string(), r#"{"first":10,"second":2}"#);
    }

    #[test]
    fn insert_path_refuses_to_overwrite_scalars_in_the_way() {
        let mut v = doc();
        let err = v.insert_path(&p("http.status.code"), 1.into()).unwrap_err();
        assert!(matches!(err, PathError::TypeMismatch { found: Kind::Integer, .. }));
    }

    #[test]
    fn insert_path_bounds_array_padding() {
        let mut v = Value::from_json("{}").unwrap();
        let err = v
            .insert_path(&p("a[18446744073709551615]"), 1.into())
            .unwrap_err();
        assert_eq!(
            err,
            PathError::Invalid {
                path: "a[18446744073709551615]".into(),
                reason: "array index too far past the end",
            }
        );
        assert!(matches!(
            v.insert_path(&p("b[1000000000000].c"), 1.into()),
            Err(PathError::Invalid { .. })
        ));

        let edge = format!("c[{MAX_INDEX_GAP}]");
        assert_eq!(v.insert_path(&p(&edge), true.into()).unwrap(), None);
        let padded = v.get_path(&p("c")).unwrap().as_array().unwrap();
        assert_eq!(padded.len(), MAX_INDEX_GAP + 1);
        assert_eq!(padded[MAX_INDEX_GAP], Value::Boolean(true));
    }

    #[test]
    fn insert_at_root_replaces_whole_value() {
        let mut v = Value::from(1);
        assert_eq!(
            v.insert_path(&Path::root(), "x".into()).unwrap(),
            Some(Value::Integer(1))
        );
        assert_eq!(v, Value::from("x"));
    }

    #[test]
    fn remove_path_returns_value_and_preserves_order() {
        let mut v = Value::from_json(r#"{"a":1,"b":2,"c":3}"#).unwrap();
        assert_eq!(v.remove_path(&p("b")).unwrap(), Value::Integer(2));
        assert_eq!(v.to_json_string(), r#"{"a":1,"c":3}"#);

        let mut v = doc();
        assert_eq!(v.remove_path(&p("tags[0]")).unwrap(), Value::from("a"));
        assert_eq!(v.get_path(&p("tags[0].b")).unwrap(), &Value::Boolean(true));
        assert!(matches!(v.remove_path(&p("tags[4]")), Err(PathError::NotFound { .. })));
        assert!(matches!(v.remove_path(&Path::root()), Err(PathError::Invalid { .. })));
    }
}
