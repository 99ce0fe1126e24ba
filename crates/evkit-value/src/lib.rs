//! # evkit-value — typed, schema-neutral event values
//!
//! This crate defines the in-memory representation every pipeline stage works
//! on: a recursive [`Value`] union and the [`Event`] that roots a tree of them.
//!
//! It carries no async runtime dependency; sources, transforms and sinks all
//! link it.
//!
//! ## Module Overview
//!
//! - [`value`] — Value (eight variants) and its Kind tag
//! - [`json`] — JSON encode/decode, serde impls
//! - [`path`] — Path / PathSegment parsing and nested traversal
//! - [`event`] — Event, the root field map flowing through the pipeline
//! - [`error`] — DecodeError, PathError

pub mod error;
pub mod event;
pub mod json;
pub mod path;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use error::{DecodeError, PathError};
pub use event::Event;
pub use indexmap::IndexMap;
pub use path::{MAX_INDEX_GAP, Path, PathLike, PathSegment};
pub use value::{Kind, ObjectMap, Value};
