//! Decoding of single PostgreSQL cells into [`Value`]

use super::{PgInterval, PgNumeric};
use crate::table::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::error::Error;
use tokio_postgres::types::{FromSql, Type};

/// A cell of any column type, converted by the column's PostgreSQL type
///
/// Accepts every type so a whole row can be read without knowing the
/// schema up front. Types the destination cannot hold are kept as text
/// when they happen to be readable; the type mapper rejects those columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceValue(pub Value);

impl<'a> FromSql<'a> for SourceValue {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let value = match *ty {
            Type::BOOL => Value::Boolean(bool::from_sql(ty, raw)?),
            Type::INT2 => Value::Integer(i64::from(i16::from_sql(ty, raw)?)),
            Type::INT4 => Value::Integer(i64::from(i32::from_sql(ty, raw)?)),
            Type::INT8 => Value::Integer(i64::from_sql(ty, raw)?),
            Type::OID => Value::Integer(i64::from(u32::from_sql(ty, raw)?)),
            Type::FLOAT4 => Value::Float(f64::from(f32::from_sql(ty, raw)?)),
            Type::FLOAT8 => Value::Float(f64::from_sql(ty, raw)?),
            Type::NUMERIC => match PgNumeric::from_sql(ty, raw)?.to_f64() {
                Some(f) => Value::Float(f),
                None => {
                    log::warn!("NUMERIC NaN or infinity has no destination value, storing NULL");
                    Value::Null
                }
            },
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                Value::Text(String::from_sql(ty, raw)?)
            }
            Type::UUID => Value::Text(uuid::Uuid::from_sql(ty, raw)?.to_string()),
            Type::JSON | Type::JSONB => Value::Text(serde_json::Value::from_sql(ty, raw)?.to_string()),
            Type::TIME => Value::Text(NaiveTime::from_sql(ty, raw)?.to_string()),
            Type::BYTEA => Value::Bytes(raw.to_vec()),
            Type::TIMESTAMP => Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?),
            Type::TIMESTAMPTZ => Value::Timestamp(DateTime::<Utc>::from_sql(ty, raw)?.naive_utc()),
            Type::DATE => Value::Timestamp(NaiveDate::from_sql(ty, raw)?.and_time(NaiveTime::MIN)),
            Type::INTERVAL => Value::Duration(PgInterval::from_sql(ty, raw)?.to_time_delta()),
            _ => std::str::from_utf8(raw)
                .map(|s| Value::Text(s.to_string()))
                .unwrap_or(Value::Null),
        };
        Ok(Self(value))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Self(Value::Null))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}
