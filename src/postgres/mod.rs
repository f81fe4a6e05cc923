//! PostgreSQL source
//!
//! Reads a whole table into a [`TableSnapshot`](crate::table::TableSnapshot)
//! and classifies each column for the type mapper.

mod extractor;
mod interval;
mod numeric;
mod value;

pub use extractor::{PostgresExtractor, classify};
pub use interval::PgInterval;
pub use numeric::PgNumeric;
pub use value::SourceValue;
