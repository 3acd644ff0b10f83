//! Boolean type operations
//!
//! The trivial singleton type: three-valued string conversion (TRUE/FALSE/
//! UNKNOWN) and comparison with FALSE < TRUE.

use crate::value::SqlValue;
use quartzdb_diagnostics::{Result, SqlError};
use std::cmp::Ordering;

/// Compare two non-null boolean values
pub fn compare(a: bool, b: bool) -> Ordering {
    a.cmp(&b)
}

/// Parse a boolean literal; UNKNOWN maps to SQL NULL
pub fn parse(s: &str) -> Result<SqlValue> {
    match s.trim().to_ascii_uppercase().as_str() {
        "TRUE" => Ok(SqlValue::Boolean(true)),
        "FALSE" => Ok(SqlValue::Boolean(false)),
        "UNKNOWN" => Ok(SqlValue::Null),
        _ => Err(SqlError::invalid_conversion("CHARACTER", "BOOLEAN")),
    }
}

/// Render a boolean value; NULL renders as UNKNOWN in boolean context
pub fn to_string(value: &SqlValue) -> Result<String> {
    match value {
        SqlValue::Null => Ok("UNKNOWN".to_string()),
        SqlValue::Boolean(true) => Ok("TRUE".to_string()),
        SqlValue::Boolean(false) => Ok("FALSE".to_string()),
        _ => Err(SqlError::internal("non-boolean value in boolean render")),
    }
}

/// Convert a single-bit value to boolean
pub fn from_bit(bytes: &[u8], bit_length: usize) -> Result<SqlValue> {
    if bit_length != 1 {
        return Err(SqlError::invalid_conversion("BIT", "BOOLEAN"));
    }
    Ok(SqlValue::Boolean(bytes.first().is_some_and(|b| b & 0x80 != 0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_valued() {
        assert_eq!(parse(" true ").unwrap(), SqlValue::Boolean(true));
        assert_eq!(parse("FALSE").unwrap(), SqlValue::Boolean(false));
        assert_eq!(parse("Unknown").unwrap(), SqlValue::Null);
        assert!(parse("yes").is_err());
    }

    #[test]
    fn test_render() {
        assert_eq!(to_string(&SqlValue::Boolean(true)).unwrap(), "TRUE");
        assert_eq!(to_string(&SqlValue::Null).unwrap(), "UNKNOWN");
    }

    #[test]
    fn test_false_sorts_before_true() {
        assert_eq!(compare(false, true), Ordering::Less);
    }

    #[test]
    fn test_from_bit() {
        assert_eq!(from_bit(&[0x80], 1).unwrap(), SqlValue::Boolean(true));
        assert_eq!(from_bit(&[0x00], 1).unwrap(), SqlValue::Boolean(false));
        assert!(from_bit(&[0x80], 2).is_err());
    }
}
