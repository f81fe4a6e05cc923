//! Value normalizer
//!
//! Rewrites the columns the destination cannot take as-is:
//! - `attachment_exists` becomes an integer flag, NULL becoming 0
//! - the endpoint timestamp columns become `YYYY-MM-DD HH:MM:SS` text

use crate::etl::Transformer;
use crate::table::{SourceType, TIMESTAMP_FORMAT, TableSnapshot, Value};
use crate::type_map::ATTACHMENT_EXISTS;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use eyre::Result;
use thiserror::Error;

/// Timestamp columns reformatted to second precision
pub const TIMESTAMP_COLUMNS: [&str; 3] = [
    "creation_timestamp",
    "timestamp_from_endpoint",
    "local_timestamp_from_endpoint",
];

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("Cannot coerce {value:?} in column '{column}' (row {row}) to an integer")]
    NotAnInteger {
        column: String,
        row: usize,
        value: Value,
    },
    #[error("Cannot read {value:?} in column '{column}' (row {row}) as a timestamp")]
    NotATimestamp {
        column: String,
        row: usize,
        value: Value,
    },
}

/// Transformer applying the fixed per-column rewrites to a snapshot
///
/// Columns it is configured for but that the snapshot lacks are skipped.
pub struct Normalizer {
    flag_columns: Vec<String>,
    timestamp_columns: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            flag_columns: vec![ATTACHMENT_EXISTS.to_string()],
            timestamp_columns: TIMESTAMP_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize_flags(&self, snapshot: &mut TableSnapshot) -> Result<(), NormalizeError> {
        for column in &self.flag_columns {
            let Some(idx) = snapshot.column_index(column) else {
                log::warn!("Column '{}' not present, skipping flag coercion", column);
                continue;
            };

            for (row_idx, row) in snapshot.rows.iter_mut().enumerate() {
                let cell = &mut row[idx];
                let coerced = coerce_flag(cell).ok_or_else(|| NormalizeError::NotAnInteger {
                    column: column.clone(),
                    row: row_idx,
                    value: cell.clone(),
                })?;
                *cell = Value::Integer(coerced);
            }
            snapshot.columns[idx].source_type = SourceType::Integer;
            log::debug!("Coerced column '{}' to integer", column);
        }
        Ok(())
    }

    fn normalize_timestamps(&self, snapshot: &mut TableSnapshot) -> Result<(), NormalizeError> {
        for column in &self.timestamp_columns {
            let Some(idx) = snapshot.column_index(column) else {
                log::warn!("Column '{}' not present, skipping timestamp format", column);
                continue;
            };

            for (row_idx, row) in snapshot.rows.iter_mut().enumerate() {
                let cell = &mut row[idx];
                if cell.is_null() {
                    continue;
                }
                let ts = as_timestamp(cell).ok_or_else(|| NormalizeError::NotATimestamp {
                    column: column.clone(),
                    row: row_idx,
                    value: cell.clone(),
                })?;
                *cell = Value::Text(ts.format(TIMESTAMP_FORMAT).to_string());
            }
            // The values are text now, but the column is still declared as a timestamp
            snapshot.columns[idx].source_type = SourceType::Datetime;
            log::debug!("Formatted column '{}' as {}", column, TIMESTAMP_FORMAT);
        }
        Ok(())
    }
}

impl Transformer for Normalizer {
    type Input = TableSnapshot;
    type Output = TableSnapshot;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        log::info!("Step 5: Preprocessing {} row(s)...", input.row_count());
        self.normalize_flags(&mut input)?;
        self.normalize_timestamps(&mut input)?;
        Ok(input)
    }
}

fn coerce_flag(value: &Value) -> Option<i64> {
    match value {
        Value::Null => Some(0),
        Value::Integer(i) => Some(*i),
        Value::Boolean(b) => Some(i64::from(*b)),
        Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        Value::Text(s) => {
            let s = s.trim();
            match s.to_lowercase().as_str() {
                "true" => Some(1),
                "false" => Some(0),
                _ => s.parse().ok(),
            }
        }
        _ => None,
    }
}

fn as_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Timestamp(ts) => Some(*ts),
        Value::Text(s) => parse_timestamp(s.trim()),
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
