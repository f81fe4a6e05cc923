//! Teradata Query Service client
//!
//! Submits SQL to `POST {base}/systems/{system}/queries` over HTTPS with
//! Basic credentials. The configured logon mechanism travels with every
//! request.

use super::{Warehouse, WarehouseError};
use crate::config::TeradataConfig;
use crate::table::Row;
use async_trait::async_trait;
use base64::Engine;
use eyre::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

/// Query Service listens here unless the host says otherwise
pub const DEFAULT_QUERY_SERVICE_PORT: u16 = 1443;

/// Teradata client for the Query Service REST API
///
/// # Example
/// ```no_run
/// use pg2teradata::config::Config;
/// use pg2teradata::teradata::{TeradataClient, Warehouse};
///
/// # async fn example() -> eyre::Result<()> {
/// let config = Config::from_env()?;
/// let client = TeradataClient::try_new(&config.teradata)?;
/// let exists = client.table_exists("andy", "ft_events").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct TeradataClient {
    client: Client,
    queries_url: Url,
    logmech: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    format: &'static str,
    log_mech: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<&'a [Row]>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    batch: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResult {
    #[serde(default)]
    data: Vec<serde_json::Value>,
    #[serde(default)]
    row_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl TeradataClient {
    /// Build a client from the destination configuration
    ///
    /// A bare host name becomes `https://{host}:1443/`. A value with a scheme
    /// is used as the Query Service base URL as-is.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built
    pub fn try_new(config: &TeradataConfig) -> Result<Self> {
        let queries_url = queries_url(&config.host, &config.system)?;

        let mut headers = reqwest::header::HeaderMap::new();
        let credentials = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            config.user,
            config.password.expose()
        ));
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Basic {}", credentials).parse()?,
        );
        headers.insert(reqwest::header::ACCEPT, "application/json".parse()?);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build Teradata HTTP client")?;

        log::debug!("Teradata queries endpoint: {}", queries_url);
        Ok(Self {
            client,
            queries_url,
            logmech: config.logmech.clone(),
        })
    }

    pub fn queries_url(&self) -> &Url {
        &self.queries_url
    }

    async fn submit(
        &self,
        query: &str,
        params: Option<&[Row]>,
    ) -> Result<QueryResponse, WarehouseError> {
        let request = QueryRequest {
            query,
            format: "array",
            log_mech: &self.logmech,
            params,
            batch: params.is_some(),
        };
        log::debug!("Submitting: {}", query);

        let response = self
            .client
            .post(self.queries_url.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(response_error(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(QueryResponse::default());
        }
        serde_json::from_str(&body).map_err(|e| WarehouseError::Decode(format!("{}: {}", e, body)))
    }
}

#[async_trait]
impl Warehouse for TeradataClient {
    async fn table_exists(&self, database: &str, table: &str) -> Result<bool, WarehouseError> {
        let response = self.submit(&catalog_query(database, table), None).await?;
        Ok(response.results.iter().any(|r| !r.data.is_empty()))
    }

    async fn execute(&self, sql: &str) -> Result<(), WarehouseError> {
        self.submit(sql, None).await.map(|_| ())
    }

    async fn execute_batch(
        &self,
        sql: &str,
        rows: &[Row],
    ) -> Result<Option<u64>, WarehouseError> {
        let response = self.submit(sql, Some(rows)).await?;
        Ok(confirmed_rows(&response))
    }
}

/// Sum of the reported row counts, if any result reported one
fn confirmed_rows(response: &QueryResponse) -> Option<u64> {
    response
        .results
        .iter()
        .filter_map(|r| r.row_count)
        .reduce(|a, b| a + b)
}

fn queries_url(host: &str, system: &str) -> Result<Url> {
    let base = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}:{}", host, DEFAULT_QUERY_SERVICE_PORT)
    };
    let mut base = Url::parse(&base).with_context(|| format!("Invalid TERADATA_HOST: {}", host))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&format!("systems/{}/queries", system))
        .with_context(|| format!("Invalid TERADATA_SYSTEM: {}", system))
}

/// Catalog lookup for one table in one database
pub fn catalog_query(database: &str, table: &str) -> String {
    format!(
        "SELECT TableName FROM DBC.TablesV WHERE DatabaseName = '{}' AND TableName = '{}'",
        database.replace('\'', "''"),
        table.replace('\'', "''")
    )
}

/// Classify a non-success response
///
/// Only a body carrying a Teradata error code or message counts as a
/// database rejection. Gateway pages and bare statuses are HTTP failures.
fn response_error(status: reqwest::StatusCode, body: &str) -> WarehouseError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let code = parsed.as_ref().and_then(|p| match p.error.as_ref()? {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });
    let message = parsed.and_then(|p| p.message).filter(|m| !m.trim().is_empty());

    match (code, message) {
        (None, None) => WarehouseError::Http {
            status: status.as_u16(),
            body: body.trim().to_string(),
        },
        (code, message) => WarehouseError::Database {
            code,
            message: message.unwrap_or_else(|| format!("HTTP {}", status)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use crate::table::Value;
    use serde_json::json;

    fn config(host: &str) -> TeradataConfig {
        TeradataConfig {
            host: host.to_string(),
            user: "loader".to_string(),
            password: Secret::new("pw"),
            logmech: "LDAP".to_string(),
            system: "prod".to_string(),
            database: "andy".to_string(),
            ft_table: "ft_t".to_string(),
            ofs_table: "ofs_t".to_string(),
        }
    }

    #[test]
    fn test_bare_host_url() {
        let client = TeradataClient::try_new(&config("td.example.com")).unwrap();
        assert_eq!(
            client.queries_url().as_str(),
            "https://td.example.com:1443/systems/prod/queries"
        );
    }

    #[test]
    fn test_full_base_url() {
        let client = TeradataClient::try_new(&config("http://localhost:8080/qs")).unwrap();
        assert_eq!(
            client.queries_url().as_str(),
            "http://localhost:8080/qs/systems/prod/queries"
        );
    }

    #[test]
    fn test_request_body() {
        let rows = vec![vec![Value::Integer(1), Value::Text("a".into())]];
        let request = QueryRequest {
            query: "INSERT INTO andy.t VALUES (?, ?)",
            format: "array",
            log_mech: "TD2",
            params: Some(&rows),
            batch: true,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "query": "INSERT INTO andy.t VALUES (?, ?)",
                "format": "array",
                "logMech": "TD2",
                "params": [[1, "a"]],
                "batch": true
            })
        );

        let request = QueryRequest {
            query: "DROP TABLE andy.t",
            format: "array",
            log_mech: "TD2",
            params: None,
            batch: false,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("params").is_none());
        assert!(body.get("batch").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let response: QueryResponse = serde_json::from_str(
            r#"{"queryDuration": 12, "results": [{"resultSet": true, "data": [["ft_t"]], "rowCount": 1}]}"#,
        )
        .unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].row_count, Some(1));
        assert_eq!(response.results[0].data.len(), 1);
    }

    #[test]
    fn test_confirmed_rows() {
        let response: QueryResponse =
            serde_json::from_str(r#"{"results": [{"rowCount": 2}, {"rowCount": 1}]}"#).unwrap();
        assert_eq!(confirmed_rows(&response), Some(3));

        let response: QueryResponse =
            serde_json::from_str(r#"{"results": [{"resultSet": false}]}"#).unwrap();
        assert_eq!(confirmed_rows(&response), None);
        assert_eq!(confirmed_rows(&QueryResponse::default()), None);
    }

    #[test]
    fn test_database_error_parsing() {
        let err = response_error(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error": "3807", "message": "Object does not exist."}"#,
        );
        match err {
            WarehouseError::Database { code, message } => {
                assert_eq!(code, Some(3807));
                assert_eq!(message, "Object does not exist.");
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = response_error(reqwest::StatusCode::BAD_REQUEST, r#"{"error": 2801}"#);
        assert!(err.is_database());
        assert_eq!(err.to_string(), "[Error 2801] HTTP 400 Bad Request");
    }

    #[test]
    fn test_gateway_failures_are_not_database_errors() {
        let err = response_error(
            reqwest::StatusCode::BAD_GATEWAY,
            "<html>502 Bad Gateway</html>",
        );
        assert!(!err.is_database());
        match err {
            WarehouseError::Http { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "<html>502 Bad Gateway</html>");
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = response_error(reqwest::StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, WarehouseError::Http { status: 401, .. }));

        // JSON without any Teradata error fields
        let err = response_error(reqwest::StatusCode::SERVICE_UNAVAILABLE, r#"{"status": "down"}"#);
        assert!(!err.is_database());
    }

    #[test]
    fn test_catalog_query() {
        assert_eq!(
            catalog_query("andy", "ft_t"),
            "SELECT TableName FROM DBC.TablesV WHERE DatabaseName = 'andy' AND TableName = 'ft_t'"
        );
        assert!(catalog_query("andy", "o'hara").contains("'o''hara'"));
    }
}
