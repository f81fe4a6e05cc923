//! Binary decoding of PostgreSQL `INTERVAL`

use chrono::TimeDelta;
use std::error::Error;
use tokio_postgres::types::{FromSql, Type};

/// Days assumed per month when flattening an interval to a fixed duration
const DAYS_PER_MONTH: i64 = 30;

/// PostgreSQL INTERVAL as stored on the wire: microseconds, days, months
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgInterval {
    pub micros: i64,
    pub days: i32,
    pub months: i32,
}

impl PgInterval {
    /// Flatten to a fixed duration, counting a month as 30 days
    pub fn to_time_delta(self) -> TimeDelta {
        let days = i64::from(self.days) + i64::from(self.months) * DAYS_PER_MONTH;
        TimeDelta::microseconds(self.micros) + TimeDelta::days(days)
    }
}

impl<'a> FromSql<'a> for PgInterval {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        if raw.len() != 16 {
            return Err(format!("invalid interval length: {}", raw.len()).into());
        }
        Ok(Self {
            micros: i64::from_be_bytes(raw[0..8].try_into()?),
            days: i32::from_be_bytes(raw[8..12].try_into()?),
            months: i32::from_be_bytes(raw[12..16].try_into()?),
        })
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::INTERVAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(micros: i64, days: i32, months: i32) -> Vec<u8> {
        let mut raw = Vec::with_capacity(16);
        raw.extend_from_slice(&micros.to_be_bytes());
        raw.extend_from_slice(&days.to_be_bytes());
        raw.extend_from_slice(&months.to_be_bytes());
        raw
    }

    #[test]
    fn test_decode_interval() {
        let raw = encode(3_600_000_000, 2, 1);
        let interval = PgInterval::from_sql(&Type::INTERVAL, &raw).unwrap();
        assert_eq!(
            interval,
            PgInterval {
                micros: 3_600_000_000,
                days: 2,
                months: 1
            }
        );
        assert_eq!(
            interval.to_time_delta(),
            TimeDelta::days(32) + TimeDelta::hours(1)
        );
    }

    #[test]
    fn test_rejects_short_payload() {
        assert!(PgInterval::from_sql(&Type::INTERVAL, &[0u8; 8]).is_err());
    }

    #[test]
    fn test_accepts_only_interval() {
        assert!(<PgInterval as FromSql>::accepts(&Type::INTERVAL));
        assert!(!<PgInterval as FromSql>::accepts(&Type::TIME));
    }
}
