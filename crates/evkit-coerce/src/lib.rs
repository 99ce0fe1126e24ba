//! # evkit-coerce — explicit type coercion for event values
//!
//! Line-oriented and loosely typed wire formats hand over fields as strings
//! or bare integers. This crate turns them into precisely typed
//! [`Value`](evkit_value::Value)s on request, most importantly timestamps,
//! normalizing every instant to UTC.
//!
//! Everything here is a pure function of its arguments: formats, the default
//! time zone and the epoch unit travel in a [`CoerceOptions`] passed to each
//! call, so one options value can be shared by any number of worker threads.
//!
//! ## Module Overview
//!
//! - [`coerce`] — `coerce(value, target, options)`
//! - [`options`] — TargetType, TimestampFormat, EpochUnit, CoerceOptions
//! - [`timezone`] — TimeZone (process local, IANA name, fixed offset)
//! - [`timestamp`] — timestamp parsing and epoch conversion
//! - [`hints`] — Conversion and TypeHints, the per-field hint table
//! - [`error`] — CoercionError, FieldCoercionError, ParseError

pub mod coerce;
pub mod error;
pub mod hints;
pub mod options;
pub mod timestamp;
pub mod timezone;

pub use coerce::coerce;
pub use error::{CoercionError, CoercionErrorKind, FieldCoercionError, ParseError};
pub use hints::{Conversion, TypeHints};
pub use options::{CoerceOptions, EpochUnit, TargetType, TimestampFormat};
pub use timestamp::{AUTO_FORMATS, from_epoch, parse_timestamp};
pub use timezone::TimeZone;
