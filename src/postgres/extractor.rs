//! Full-table extractor for PostgreSQL

use super::SourceValue;
use crate::config::PostgresConfig;
use crate::etl::Extractor;
use crate::table::{ColumnDescriptor, Row, SourceType, TableSnapshot, Value};
use eyre::{Context, Result};
use tokio_postgres::types::Type;
use tokio_postgres::{Client, NoTls};

/// Extractor that copies an entire PostgreSQL table into memory
///
/// The connection lives only for the duration of [`Extractor::extract`] and
/// is fully closed before it returns.
pub struct PostgresExtractor {
    config: PostgresConfig,
}

impl PostgresExtractor {
    pub fn new(config: PostgresConfig) -> Self {
        Self { config }
    }

    fn connect_config(&self) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.config.host)
            .port(self.config.port)
            .user(&self.config.user)
            .password(self.config.password.expose())
            .dbname(&self.config.database)
            .application_name("pg2td");
        pg
    }

    /// Run `SELECT *` and collect every row
    async fn fetch(&self, client: &Client) -> Result<TableSnapshot> {
        let query = format!("SELECT * FROM {}", self.config.table);
        log::debug!("Source query: {}", query);

        let statement = client
            .prepare(&query)
            .await
            .with_context(|| format!("Failed to prepare query on {}", self.config.table))?;

        let columns: Vec<ColumnDescriptor> = statement
            .columns()
            .iter()
            .map(|c| ColumnDescriptor::new(c.name(), classify(c.type_())))
            .collect();
        for column in &columns {
            log::debug!("Source column '{}' is {}", column.name, column.source_type);
        }

        let rows = client
            .query(&statement, &[])
            .await
            .with_context(|| format!("Failed to read rows from {}", self.config.table))?;

        let rows = rows
            .iter()
            .map(|row| convert_row(row, &columns))
            .collect::<Result<Vec<_>>>()?;

        Ok(TableSnapshot::new(columns, rows))
    }
}

impl Extractor for PostgresExtractor {
    type Output = TableSnapshot;

    async fn extract(&self) -> Result<Self::Output> {
        log::info!(
            "Step 2: Initiating connection with PostgreSQL for table: {}...",
            self.config.table
        );
        let (client, connection) = self
            .connect_config()
            .connect(NoTls)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to PostgreSQL at {}:{}",
                    self.config.host, self.config.port
                )
            })?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("PostgreSQL connection error: {}", e);
            }
        });

        log::info!("Step 3: Fetching data from PostgreSQL table...");
        let snapshot = self.fetch(&client).await;

        log::info!("Step 4: Closing the PostgreSQL connection...");
        drop(client);
        driver
            .await
            .context("PostgreSQL connection task did not shut down cleanly")?;

        let snapshot = snapshot?;
        log::info!(
            "Fetched {} row(s) across {} column(s) from PostgreSQL",
            snapshot.row_count(),
            snapshot.columns.len()
        );
        Ok(snapshot)
    }
}

/// Classify a PostgreSQL column type for destination mapping
pub fn classify(ty: &Type) -> SourceType {
    match *ty {
        Type::INT2 | Type::INT4 | Type::INT8 => SourceType::Integer,
        Type::OID => SourceType::Unsigned,
        Type::BOOL => SourceType::Boolean,
        Type::FLOAT4 | Type::FLOAT8 | Type::NUMERIC => SourceType::Float,
        Type::TEXT
        | Type::VARCHAR
        | Type::BPCHAR
        | Type::NAME
        | Type::UUID
        | Type::JSON
        | Type::JSONB
        | Type::TIME => SourceType::Text,
        Type::BYTEA => SourceType::Binary,
        Type::TIMESTAMP | Type::TIMESTAMPTZ | Type::DATE => SourceType::Datetime,
        Type::INTERVAL => SourceType::Duration,
        _ => SourceType::Unsupported(ty.name().to_string()),
    }
}

fn convert_row(row: &tokio_postgres::Row, columns: &[ColumnDescriptor]) -> Result<Row> {
    (0..columns.len())
        .map(|idx| {
            convert_value(row, idx).with_context(|| {
                format!("Failed to read column '{}'", columns[idx].name)
            })
        })
        .collect()
}

fn convert_value(row: &tokio_postgres::Row, idx: usize) -> Result<Value> {
    Ok(row.try_get::<_, SourceValue>(idx)?.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_numeric_types() {
        assert_eq!(classify(&Type::INT2), SourceType::Integer);
        assert_eq!(classify(&Type::INT8), SourceType::Integer);
        assert_eq!(classify(&Type::OID), SourceType::Unsigned);
        assert_eq!(classify(&Type::BOOL), SourceType::Boolean);
        assert_eq!(classify(&Type::NUMERIC), SourceType::Float);
        assert_eq!(classify(&Type::FLOAT4), SourceType::Float);
    }

    #[test]
    fn test_classify_text_and_temporal_types() {
        assert_eq!(classify(&Type::VARCHAR), SourceType::Text);
        assert_eq!(classify(&Type::JSONB), SourceType::Text);
        assert_eq!(classify(&Type::UUID), SourceType::Text);
        assert_eq!(classify(&Type::BYTEA), SourceType::Binary);
        assert_eq!(classify(&Type::TIMESTAMPTZ), SourceType::Datetime);
        assert_eq!(classify(&Type::DATE), SourceType::Datetime);
        assert_eq!(classify(&Type::INTERVAL), SourceType::Duration);
    }

    #[test]
    fn test_classify_unsupported_keeps_name() {
        assert_eq!(
            classify(&Type::INT4_ARRAY),
            SourceType::Unsupported("_int4".to_string())
        );
        assert_eq!(
            classify(&Type::POINT),
            SourceType::Unsupported("point".to_string())
        );
    }

    #[test]
    fn test_connect_config() {
        let extractor = PostgresExtractor::new(PostgresConfig {
            host: "pg.example.com".into(),
            port: 6432,
            user: "reader".into(),
            password: crate::config::Secret::new("pw"),
            database: "ingress".into(),
            table: "logs".into(),
        });
        let pg = extractor.connect_config();
        assert_eq!(pg.get_ports(), &[6432]);
        assert_eq!(pg.get_user(), Some("reader"));
        assert_eq!(pg.get_dbname(), Some("ingress"));
    }
}
