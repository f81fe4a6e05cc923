//! Binary decoding of PostgreSQL `NUMERIC`
//!
//! The wire form is a header of four 16-bit words (digit count, weight,
//! sign, display scale) followed by base-10000 digits. Any finite value is
//! read, however many digits it carries, at the cost of rounding to `f64`.

use std::error::Error;
use tokio_postgres::types::{FromSql, Type};

const SIGN_POSITIVE: u16 = 0x0000;
const SIGN_NEGATIVE: u16 = 0x4000;
const SIGN_NAN: u16 = 0xC000;
const SIGN_POS_INFINITY: u16 = 0xD000;
const SIGN_NEG_INFINITY: u16 = 0xF000;

const NBASE: u16 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PgNumeric {
    Finite(f64),
    NaN,
    Infinity,
    NegativeInfinity,
}

impl PgNumeric {
    /// The value as a float, or `None` for the special values
    pub fn to_f64(self) -> Option<f64> {
        match self {
            Self::Finite(f) => Some(f),
            _ => None,
        }
    }
}

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        if raw.len() < 8 {
            return Err(format!("invalid numeric length: {}", raw.len()).into());
        }
        let word = |i: usize| u16::from_be_bytes([raw[i], raw[i + 1]]);

        let ndigits = usize::from(word(0));
        let weight = i64::from(word(2) as i16);
        let sign = word(4);

        let negative = match sign {
            SIGN_POSITIVE => false,
            SIGN_NEGATIVE => true,
            SIGN_NAN => return Ok(Self::NaN),
            SIGN_POS_INFINITY => return Ok(Self::Infinity),
            SIGN_NEG_INFINITY => return Ok(Self::NegativeInfinity),
            other => return Err(format!("invalid numeric sign: {:#06x}", other).into()),
        };

        if raw.len() != 8 + ndigits * 2 {
            return Err(format!(
                "numeric with {} digit(s) cannot be {} bytes long",
                ndigits,
                raw.len()
            )
            .into());
        }
        if ndigits == 0 {
            return Ok(Self::Finite(0.0));
        }

        // Spell the digits out and let the float parser do the rounding
        let mut text = String::with_capacity(ndigits * 4 + 8);
        if negative {
            text.push('-');
        }
        for i in 0..ndigits {
            let digit = word(8 + i * 2);
            if digit >= NBASE {
                return Err(format!("invalid numeric digit: {}", digit).into());
            }
            text.push_str(&format!("{:04}", digit));
        }
        let exponent = 4 * (weight + 1 - ndigits as i64);
        text.push_str(&format!("e{}", exponent));

        Ok(Self::Finite(text.parse()?))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}
