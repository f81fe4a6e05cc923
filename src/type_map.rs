//! Source-to-Teradata column type mapping
//!
//! The single source of truth for schema translation. Mapping is a pure
//! function of the column's [`SourceType`] and its name.

use crate::table::{ColumnDescriptor, SourceType};
use thiserror::Error;

/// Column that arrives as a generic object but is logically a flag
pub const ATTACHMENT_EXISTS: &str = "attachment_exists";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeMapError {
    #[error("Unrecognized type: {type_name} for column: {column}")]
    UnrecognizedType { type_name: String, column: String },
}

/// Map a source column type to its Teradata column type
///
/// # Errors
/// Returns [`TypeMapError::UnrecognizedType`] for classifications with no
/// destination counterpart.
pub fn map_type(source_type: &SourceType, column: &str) -> Result<&'static str, TypeMapError> {
    let mapped = match source_type {
        SourceType::Integer | SourceType::Unsigned | SourceType::Boolean => "INTEGER",
        SourceType::Float => "DECIMAL(38,2)",
        SourceType::Text | SourceType::Binary if column == ATTACHMENT_EXISTS => {
            log::debug!("Column '{}' needs special handling", column);
            "INTEGER"
        }
        SourceType::Text | SourceType::Binary => "VARCHAR(500)",
        SourceType::Datetime | SourceType::Duration => "TIMESTAMP(0)",
        SourceType::Unsupported(name) => {
            return Err(TypeMapError::UnrecognizedType {
                type_name: name.clone(),
                column: column.to_string(),
            });
        }
    };

    log::debug!(
        "Column '{}' of {} type maps to {}",
        column,
        source_type,
        mapped
    );
    Ok(mapped)
}

/// Build the shared `name TYPE, ...` column definition list
///
/// Fails on the first unmapped column, before anything is emitted.
pub fn column_definitions(columns: &[ColumnDescriptor]) -> Result<String, TypeMapError> {
    let defs = columns
        .iter()
        .map(|c| map_type(&c.source_type, &c.name).map(|t| format!("{} {}", c.name, t)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(defs.join(", "))
}
