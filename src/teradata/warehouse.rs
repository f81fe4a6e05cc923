//! Destination warehouse seam

use crate::table::Row;
use async_trait::async_trait;
use thiserror::Error;

/// Failure talking to the destination
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// The warehouse ran the request and rejected it
    #[error("[Error {}] {message}", .code.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string()))]
    Database { code: Option<i64>, message: String },
    /// The request never got a database answer
    #[error("Request to warehouse failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// A non-success HTTP status without a database error in the body
    #[error("Warehouse endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The warehouse answered with something we could not read
    #[error("Unexpected warehouse response: {0}")]
    Decode(String),
}

impl WarehouseError {
    pub fn is_database(&self) -> bool {
        matches!(self, Self::Database { .. })
    }
}

/// The handful of operations a snapshot load needs from a warehouse
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Whether `database.table` is listed in the metadata catalog
    async fn table_exists(&self, database: &str, table: &str) -> Result<bool, WarehouseError>;

    /// Run a single statement that returns no rows
    async fn execute(&self, sql: &str) -> Result<(), WarehouseError>;

    /// Run one parameterized statement for every row in a single batch
    ///
    /// Returns the number of rows the warehouse confirmed, or `None` when it
    /// accepted the batch without reporting a count.
    async fn execute_batch(
        &self,
        sql: &str,
        rows: &[Row],
    ) -> Result<Option<u64>, WarehouseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_display() {
        let err = WarehouseError::Database {
            code: Some(3807),
            message: "Object 'andy.t' does not exist.".to_string(),
        };
        assert_eq!(err.to_string(), "[Error 3807] Object 'andy.t' does not exist.");
        assert!(err.is_database());

        let err = WarehouseError::Database {
            code: None,
            message: "denied".to_string(),
        };
        assert_eq!(err.to_string(), "[Error ?] denied");
    }

    #[test]
    fn test_decode_is_not_database() {
        assert!(!WarehouseError::Decode("garbage".into()).is_database());
        assert!(
            !WarehouseError::Http {
                status: 502,
                body: "<html>502 Bad Gateway</html>".into()
            }
            .is_database()
        );
    }
}
