//! Run configuration
//!
//! Every setting is read once at startup into a [`Config`]. All missing and
//! malformed keys are collected and reported together.
//!
//! Expected environment variables:
//! - POSTGRES_HOST, POSTGRES_USER, POSTGRES_PASSWORD, POSTGRES_DATABASE,
//!   POSTGRES_TABLE (required)
//! - POSTGRES_PORT (optional, defaults to 5432)
//! - TERADATA_HOST, TERADATA_USER, TERADATA_PASSWORD (required)
//! - TERADATA_LOGMECH (optional, defaults to TD2)
//! - TERADATA_SYSTEM (optional, defaults to "local")
//! - TERADATA_DATABASE, TERADATA_FT_TABLE, TERADATA_OFS_TABLE (optional)

use std::fmt;
use thiserror::Error;

pub const DEFAULT_POSTGRES_PORT: u16 = 5432;
pub const DEFAULT_LOGMECH: &str = "TD2";
pub const DEFAULT_SYSTEM: &str = "local";
pub const DEFAULT_DATABASE: &str = "andy";
pub const DEFAULT_FT_TABLE: &str = "ft_azure_postgres_bot_invoke_log_table";
pub const DEFAULT_OFS_TABLE: &str = "ofs_azure_postgres_bot_invoke_log_table";

/// One problem with one key
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigIssue {
    #[error("{0} is not set")]
    Missing(String),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigIssue {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Missing(key) | Self::Invalid { key, .. } => key,
        }
    }
}

/// Every problem found while reading the configuration
#[derive(Debug, Error, PartialEq, Eq)]
#[error(
    "{} configuration problem(s): {}",
    .0.len(),
    .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
)]
pub struct ConfigError(pub Vec<ConfigIssue>);

impl ConfigError {
    /// Keys that were not set at all
    pub fn missing(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|i| matches!(i, ConfigIssue::Missing(_)))
            .map(ConfigIssue::key)
            .collect()
    }

    /// Keys that were set to something unusable
    pub fn invalid(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|i| matches!(i, ConfigIssue::Invalid { .. }))
            .map(ConfigIssue::key)
            .collect()
    }
}

/// A credential that is never printed
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret,
    pub database: String,
    /// Source table, optionally schema-qualified
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeradataConfig {
    pub host: String,
    pub user: String,
    pub password: Secret,
    pub logmech: String,
    /// Query Service system alias
    pub system: String,
    /// Namespace both destination tables live in
    pub database: String,
    pub ft_table: String,
    pub ofs_table: String,
}

impl TeradataConfig {
    /// The two destination tables, in load order
    pub fn tables(&self) -> [&str; 2] {
        [&self.ft_table, &self.ofs_table]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub postgres: PostgresConfig,
    pub teradata: TeradataConfig,
}

impl Config {
    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    ///
    /// Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut issues = Vec::new();
        let mut required = |key: &str| {
            get(key).unwrap_or_else(|| {
                issues.push(ConfigIssue::Missing(key.to_string()));
                String::new()
            })
        };

        let pg_host = required("POSTGRES_HOST");
        let pg_user = required("POSTGRES_USER");
        let pg_password = required("POSTGRES_PASSWORD");
        let pg_database = required("POSTGRES_DATABASE");
        let pg_table = required("POSTGRES_TABLE");
        let td_host = required("TERADATA_HOST");
        let td_user = required("TERADATA_USER");
        let td_password = required("TERADATA_PASSWORD");

        let port = match get("POSTGRES_PORT") {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|e| {
                issues.push(ConfigIssue::invalid(
                    "POSTGRES_PORT",
                    format!("{} ({})", e, raw),
                ));
                DEFAULT_POSTGRES_PORT
            }),
            None => DEFAULT_POSTGRES_PORT,
        };

        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            postgres: PostgresConfig {
                host: pg_host,
                port,
                user: pg_user,
                password: Secret::new(pg_password),
                database: pg_database,
                table: pg_table,
            },
            teradata: TeradataConfig {
                host: td_host,
                user: td_user,
                password: Secret::new(td_password),
                logmech: or_default("TERADATA_LOGMECH", DEFAULT_LOGMECH),
                system: or_default("TERADATA_SYSTEM", DEFAULT_SYSTEM),
                database: or_default("TERADATA_DATABASE", DEFAULT_DATABASE),
                ft_table: or_default("TERADATA_FT_TABLE", DEFAULT_FT_TABLE),
                ofs_table: or_default("TERADATA_OFS_TABLE", DEFAULT_OFS_TABLE),
            },
        };

        issues.extend(config.validate());
        if issues.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError(issues))
        }
    }

    /// Problems with the names spliced into SQL
    fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        // An unset source table is already reported as missing
        if !self.postgres.table.is_empty() {
            issues.extend(check_qualified("POSTGRES_TABLE", &self.postgres.table));
        }
        issues.extend(check_identifier("TERADATA_DATABASE", &self.teradata.database));
        issues.extend(check_identifier("TERADATA_FT_TABLE", &self.teradata.ft_table));
        issues.extend(check_identifier("TERADATA_OFS_TABLE", &self.teradata.ofs_table));
        if self.teradata.ft_table.eq_ignore_ascii_case(&self.teradata.ofs_table) {
            issues.push(ConfigIssue::invalid(
                "TERADATA_OFS_TABLE",
                "must differ from TERADATA_FT_TABLE",
            ));
        }
        issues
    }
}

/// Whether `name` is a bare SQL identifier safe to splice into a statement
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn check_identifier(key: &str, value: &str) -> Option<ConfigIssue> {
    (!is_identifier(value)).then(|| {
        ConfigIssue::invalid(key, format!("'{}' is not a plain SQL identifier", value))
    })
}

fn check_qualified(key: &str, value: &str) -> Option<ConfigIssue> {
    let parts: Vec<&str> = value.split('.').collect();
    let valid = parts.len() <= 2 && parts.iter().all(|p| is_identifier(p));
    (!valid).then(|| ConfigIssue::invalid(key, format!("'{}' is not a table name", value)))
}
