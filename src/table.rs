//! In-memory table snapshot
//!
//! A [`TableSnapshot`] is the whole source table held in memory: ordered
//! column descriptors plus rows of positionally aligned [`Value`]s.

use base64::Engine;
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Serialize, Serializer};

/// Text layout used for every timestamp sent to the destination.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Coarse classification of a source column's runtime representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceType {
    Integer,
    Unsigned,
    Boolean,
    Float,
    Text,
    Binary,
    Datetime,
    Duration,
    /// A source type with no destination mapping, carrying its source name
    Unsupported(String),
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Unsigned => write!(f, "unsigned"),
            Self::Boolean => write!(f, "boolean"),
            Self::Float => write!(f, "float"),
            Self::Text => write!(f, "text"),
            Self::Binary => write!(f, "binary"),
            Self::Datetime => write!(f, "datetime"),
            Self::Duration => write!(f, "duration"),
            Self::Unsupported(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub source_type: SourceType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            name: name.into(),
            source_type,
        }
    }
}

/// A single scalar cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Duration(TimeDelta),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Values are serialized the way the destination accepts them as
/// bind parameters: timestamps and durations as text, bytes as base64.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Boolean(b) => serializer.serialize_i64(i64::from(*b)),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Bytes(bytes) => serializer
                .serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes)),
            Self::Timestamp(ts) => {
                serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
            }
            Self::Duration(delta) => serializer.serialize_str(&format_duration(*delta)),
        }
    }
}

/// Render a duration as `[-]H:MM:SS`, dropping sub-second precision
fn format_duration(delta: TimeDelta) -> String {
    let total = delta.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

pub type Row = Vec<Value>;

/// Ordered columns plus ordered rows, owned by the run for its lifetime
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSnapshot {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Row>,
}

impl TableSnapshot {
    pub fn new(columns: Vec<ColumnDescriptor>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Position of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
