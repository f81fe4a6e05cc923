//! Snapshot loader for Teradata
//!
//! Recreates the destination tables from the snapshot's schema and inserts
//! the full row set into each of them.

use super::{Warehouse, WarehouseError};
use crate::etl::Loader;
use crate::report::{InsertFailure, InsertFailureKind, LoadReport, TableLoad};
use crate::table::TableSnapshot;
use crate::type_map::column_definitions;
use async_trait::async_trait;
use eyre::{Context, Result};

/// Loader that drops, recreates and fills a fixed set of destination tables
///
/// Every table gets the same column definitions and the same rows. DDL
/// failures abort the load; insert failures are recorded per table in the
/// [`LoadReport`] and the remaining tables are still attempted.
pub struct TeradataLoader<W> {
    warehouse: W,
    database: String,
    tables: Vec<String>,
}

impl<W: Warehouse> TeradataLoader<W> {
    /// Create a loader for `tables` inside `database`
    pub fn new<I, S>(warehouse: W, database: impl Into<String>, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            warehouse,
            database: database.into(),
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    fn qualified(&self, table: &str) -> String {
        format!("{}.{}", self.database, table)
    }

    async fn drop_existing(&self) -> Result<()> {
        for table in &self.tables {
            let exists = self
                .warehouse
                .table_exists(&self.database, table)
                .await
                .with_context(|| format!("Failed to look up {} in the catalog", table))?;
            if exists {
                log::info!("Table {} exists. Attempting to drop.", table);
                self.warehouse
                    .execute(&format!("DROP TABLE {}", self.qualified(table)))
                    .await
                    .with_context(|| format!("Failed to drop {}", self.qualified(table)))?;
                log::info!("Table {} dropped.", table);
            }
        }
        Ok(())
    }

    async fn create_all(&self, columns: &str) -> Result<()> {
        for table in &self.tables {
            let sql = create_table_sql(&self.qualified(table), columns);
            log::info!("Creating table {}", self.qualified(table));
            log::debug!("{}", sql);
            self.warehouse
                .execute(&sql)
                .await
                .with_context(|| format!("Failed to create {}", self.qualified(table)))?;
        }
        Ok(())
    }

    async fn insert_into(&self, table: &str, snapshot: &TableSnapshot) -> TableLoad {
        let qualified = self.qualified(table);
        let attempted = snapshot.row_count();

        if snapshot.is_empty() {
            log::info!("No rows to insert into {}", qualified);
            return TableLoad {
                table: qualified,
                attempted,
                result: Ok(Some(0)),
            };
        }

        let sql = insert_sql(&qualified, snapshot.columns.len());
        log::debug!("{}", sql);

        let result = match self.warehouse.execute_batch(&sql, &snapshot.rows).await {
            Ok(Some(confirmed)) => {
                log::info!("Inserted {} row(s) into {}", confirmed, qualified);
                if confirmed != attempted as u64 {
                    log::warn!(
                        "{} confirmed {} of {} submitted row(s)",
                        qualified,
                        confirmed,
                        attempted
                    );
                }
                Ok(Some(confirmed))
            }
            Ok(None) => {
                log::warn!(
                    "{} accepted {} row(s) without reporting a row count",
                    qualified,
                    attempted
                );
                Ok(None)
            }
            Err(e) => Err(classify_failure(&qualified, e)),
        };

        TableLoad {
            table: qualified,
            attempted,
            result,
        }
    }
}

#[async_trait]
impl<W: Warehouse> Loader for TeradataLoader<W> {
    type Input = TableSnapshot;
    type Report = LoadReport;

    async fn load(&self, input: Self::Input) -> Result<Self::Report> {
        if input.columns.is_empty() {
            eyre::bail!("Source table has no columns to replicate");
        }

        // Resolved before any statement so an unmapped type leaves the destination untouched
        log::info!("Step 6: Deriving the Teradata table structure...");
        let columns = column_definitions(&input.columns)?;

        log::info!("Step 7: Removing any tables with the same name...");
        self.drop_existing().await?;

        log::info!("Step 8: Creating the tables in Teradata...");
        self.create_all(&columns).await?;

        log::info!("Step 9: Inserting data into the tables...");
        let mut report = LoadReport::default();
        for table in &self.tables {
            report.tables.push(self.insert_into(table, &input).await);
        }

        Ok(report)
    }
}

fn classify_failure(table: &str, error: WarehouseError) -> InsertFailure {
    let kind = if error.is_database() {
        log::error!("Failure while inserting into {}: {}", table, error);
        InsertFailureKind::Database
    } else {
        log::error!("Unexpected error while inserting into {}: {}", table, error);
        InsertFailureKind::Unexpected
    };
    InsertFailure {
        kind,
        detail: error.to_string(),
    }
}

pub fn create_table_sql(qualified: &str, columns: &str) -> String {
    format!("CREATE TABLE {} ({}) NO PRIMARY INDEX", qualified, columns)
}

pub fn insert_sql(qualified: &str, column_count: usize) -> String {
    let placeholders = vec!["?"; column_count].join(", ");
    format!("INSERT INTO {} VALUES ({})", qualified, placeholders)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            create_table_sql("andy.ft_t", "id INTEGER, label VARCHAR(500)"),
            "CREATE TABLE andy.ft_t (id INTEGER, label VARCHAR(500)) NO PRIMARY INDEX"
        );
    }

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            insert_sql("andy.ft_t", 3),
            "INSERT INTO andy.ft_t VALUES (?, ?, ?)"
        );
    }

    #[test]
    fn test_classify_failure() {
        let failure = classify_failure(
            "andy.ft_t",
            WarehouseError::Database {
                code: Some(2801),
                message: "Duplicate".into(),
            },
        );
        assert_eq!(failure.kind, InsertFailureKind::Database);
        assert_eq!(failure.detail, "[Error 2801] Duplicate");

        let failure = classify_failure("andy.ft_t", WarehouseError::Decode("<html>".into()));
        assert_eq!(failure.kind, InsertFailureKind::Unexpected);

        let failure = classify_failure(
            "andy.ft_t",
            WarehouseError::Http {
                status: 502,
                body: "<html>502 Bad Gateway</html>".into(),
            },
        );
        assert_eq!(failure.kind, InsertFailureKind::Unexpected);
    }
}
