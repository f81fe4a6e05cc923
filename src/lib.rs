//! pg2teradata
//!
//! One-shot snapshot replication of a PostgreSQL table into two identically
//! shaped Teradata tables.

pub mod config;
pub mod etl;
pub mod normalize;
pub mod postgres;
pub mod report;
pub mod table;
pub mod teradata;
pub mod type_map;

// Re-exports for convenience
pub use config::Config;
pub use etl::{Extractor, Loader, Pipeline, Transformer};
pub use normalize::Normalizer;
pub use postgres::PostgresExtractor;
pub use report::{LoadReport, Outcome};
pub use table::{ColumnDescriptor, SourceType, TableSnapshot, Value};
pub use teradata::{TeradataClient, TeradataLoader, Warehouse};
