//! Typed SQL values - runtime representation of every value the engine
//! operates on
//!
//! Values are immutable once constructed; operations that "modify" a value
//! return a new one. A value is opaque until paired with the [`SqlType`]
//! describing it - the same `Integer` payload backs TINYINT, SMALLINT and
//! INTEGER columns.
//!
//! [`SqlType`]: crate::SqlType

use crate::lob::LobHandle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nanoseconds per second, the carry base for sub-second arithmetic
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Seconds in a civil day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// The primary runtime value representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum SqlValue {
    /// SQL NULL; sorts before any non-null value
    Null,
    /// BOOLEAN
    Boolean(bool),
    /// TINYINT, SMALLINT and INTEGER share this payload
    Integer(i32),
    /// BIGINT
    Bigint(i64),
    /// DOUBLE/FLOAT/REAL
    Double(f64),
    /// NUMERIC/DECIMAL
    Numeric(Decimal),
    /// CHARACTER/VARCHAR
    String(String),
    /// BINARY/VARBINARY
    Binary(Vec<u8>),
    /// BIT/BIT VARYING; length measured in bits
    Bit(BitValue),
    /// DATE/TIME/TIMESTAMP with or without zone
    DateTime(SqlDateTime),
    /// Year-month interval as a signed month count
    IntervalYearMonth(i64),
    /// Day-second interval as seconds plus sub-second nanos
    IntervalDaySecond(SqlInterval),
    /// CLOB handle; characters owned by the external store
    Clob(LobHandle),
    /// BLOB handle; bytes owned by the external store
    Blob(LobHandle),
}

impl SqlValue {
    /// Check if this value is SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as a host boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64, widening the narrow integer payload
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i as i64),
            Self::Bigint(l) => Some(*l),
            _ => None,
        }
    }

    /// Try to get as a Decimal, widening any exact numeric payload
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Numeric(d) => Some(*d),
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Bigint(l) => Some(Decimal::from(*l)),
            _ => None,
        }
    }

    /// Try to get as f64, widening any numeric payload
    pub fn as_f64(&self) -> Option<f64> {
        use rust_decimal::prelude::ToPrimitive;
        match self {
            Self::Double(d) => Some(*d),
            Self::Integer(i) => Some(*i as f64),
            Self::Bigint(l) => Some(*l as f64),
            Self::Numeric(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Try to get as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a byte slice (BINARY/VARBINARY payloads only)
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) => Some(b),
            Self::Bit(b) => Some(&b.bytes),
            _ => None,
        }
    }

    /// Try to get as a datetime payload
    pub fn as_datetime(&self) -> Option<&SqlDateTime> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Bigint(l) => write!(f, "{}", l),
            Self::Double(d) => write!(f, "{}", d),
            Self::Numeric(d) => write!(f, "{}", d),
            Self::String(s) => write!(f, "{}", s),
            Self::Binary(b) => {
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Self::Bit(b) => write!(f, "{}", b),
            Self::DateTime(dt) => write!(f, "{}", dt),
            Self::IntervalYearMonth(months) => write!(f, "{} months", months),
            Self::IntervalDaySecond(iv) => write!(f, "{}", iv),
            Self::Clob(h) | Self::Blob(h) => write!(f, "{}", h),
        }
    }
}

/// A bit sequence with an exact length in bits.
///
/// Unused trailing bits in the last byte are always zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitValue {
    /// Packed bits, most significant bit first
    pub bytes: Vec<u8>,
    /// Number of significant bits
    pub bit_length: usize,
}

impl BitValue {
    /// Create a bit value, zeroing any unused trailing bits
    pub fn new(mut bytes: Vec<u8>, bit_length: usize) -> Self {
        let needed = bit_length.div_ceil(8);
        bytes.truncate(needed);
        bytes.resize(needed, 0);
        let spare = needed * 8 - bit_length;
        if spare > 0
            && let Some(last) = bytes.last_mut()
        {
            *last &= 0xffu8 << spare;
        }
        Self { bytes, bit_length }
    }

    /// Get the bit at a zero-based index
    pub fn bit(&self, index: usize) -> bool {
        if index >= self.bit_length {
            return false;
        }
        let byte = self.bytes[index / 8];
        (byte >> (7 - index % 8)) & 1 == 1
    }

    /// Length of the value with trailing zero bits removed.
    ///
    /// Finds the last byte holding a set bit, then the lowest set bit within
    /// it; measured in bits, not bytes.
    pub fn trim_size(&self) -> usize {
        for (i, byte) in self.bytes.iter().enumerate().rev() {
            if *byte != 0 {
                return i * 8 + (8 - byte.trailing_zeros() as usize);
            }
        }
        0
    }
}

impl fmt::Display for BitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.bit_length {
            write!(f, "{}", if self.bit(i) { '1' } else { '0' })?;
        }
        Ok(())
    }
}

/// Canonical datetime payload.
///
/// `seconds` is UTC epoch seconds for DATE/TIMESTAMP and UTC
/// seconds-since-midnight for TIME. `nanos` is always in `0..1_000_000_000`
/// and already truncated to the owning type's scale. `zone_offset_seconds` is
/// meaningful only for WITH TIME ZONE kinds and zero otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SqlDateTime {
    pub seconds: i64,
    pub nanos: u32,
    pub zone_offset_seconds: i32,
}

impl SqlDateTime {
    /// Create a datetime payload
    pub fn new(seconds: i64, nanos: u32, zone_offset_seconds: i32) -> Self {
        Self {
            seconds,
            nanos,
            zone_offset_seconds,
        }
    }

    /// A zoneless payload
    pub fn zoneless(seconds: i64, nanos: u32) -> Self {
        Self::new(seconds, nanos, 0)
    }

    /// Total order over the instant; the zone offset does not participate
    pub fn instant_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.seconds
            .cmp(&other.seconds)
            .then(self.nanos.cmp(&other.nanos))
    }
}

impl fmt::Display for SqlDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s+{}ns", self.seconds, self.nanos)?;
        if self.zone_offset_seconds != 0 {
            write!(f, " zone {}", self.zone_offset_seconds)?;
        }
        Ok(())
    }
}

/// Day-second interval payload: elapsed seconds plus sub-second nanos.
///
/// Invariant: `nanos` carries the same sign as `seconds` and
/// `|nanos| < 1_000_000_000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SqlInterval {
    pub seconds: i64,
    pub nanos: i32,
}

impl SqlInterval {
    /// Create a normalized interval, carrying nanos into seconds and aligning
    /// signs
    pub fn new(seconds: i64, nanos: i64) -> Self {
        let mut total_seconds = seconds + nanos / NANOS_PER_SECOND;
        let mut rem = nanos % NANOS_PER_SECOND;
        if total_seconds > 0 && rem < 0 {
            total_seconds -= 1;
            rem += NANOS_PER_SECOND;
        } else if total_seconds < 0 && rem > 0 {
            total_seconds += 1;
            rem -= NANOS_PER_SECOND;
        }
        Self {
            seconds: total_seconds,
            nanos: rem as i32,
        }
    }

    /// The zero-length interval
    pub fn zero() -> Self {
        Self { seconds: 0, nanos: 0 }
    }

    /// Total value in nanoseconds, for arithmetic that needs one scalar
    pub fn total_nanos(&self) -> i128 {
        self.seconds as i128 * NANOS_PER_SECOND as i128 + self.nanos as i128
    }
}

impl fmt::Display for SqlInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.seconds)?;
        if self.nanos != 0 {
            write!(f, "+{}ns", self.nanos)?;
        }
        Ok(())
    }
}

impl std::cmp::Ord for SqlInterval {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.total_nanos().cmp(&other.total_nanos())
    }
}

impl std::cmp::PartialOrd for SqlInterval {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_value_masks_spare_bits() {
        let bit = BitValue::new(vec![0xff], 5);
        assert_eq!(bit.bytes, vec![0xf8]);
        assert_eq!(bit.to_string(), "11111");
    }

    #[test]
    fn test_bit_trim_size_counts_bits() {
        // 0b10100000 -> last set bit is index 2, trim size 3
        let bit = BitValue::new(vec![0xa0], 8);
        assert_eq!(bit.trim_size(), 3);

        let bit = BitValue::new(vec![0x00, 0x01], 16);
        assert_eq!(bit.trim_size(), 16);

        let bit = BitValue::new(vec![0x00, 0x00], 16);
        assert_eq!(bit.trim_size(), 0);
    }

    #[test]
    fn test_interval_normalization() {
        let iv = SqlInterval::new(1, 1_500_000_000);
        assert_eq!(iv.seconds, 2);
        assert_eq!(iv.nanos, 500_000_000);

        let iv = SqlInterval::new(1, -500_000_000);
        assert_eq!(iv.seconds, 0);
        assert_eq!(iv.nanos, 500_000_000);

        let iv = SqlInterval::new(-2, 500_000_000);
        assert_eq!(iv.seconds, -1);
        assert_eq!(iv.nanos, -500_000_000);
    }

    #[test]
    fn test_datetime_instant_order_ignores_zone() {
        let a = SqlDateTime::new(100, 0, 3600);
        let b = SqlDateTime::new(100, 0, -3600);
        assert_eq!(a.instant_cmp(&b), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_numeric_accessors_widen() {
        assert_eq!(SqlValue::Integer(7).as_i64(), Some(7));
        assert_eq!(SqlValue::Integer(7).as_decimal(), Some(Decimal::from(7)));
        assert_eq!(SqlValue::Bigint(7).as_f64(), Some(7.0));
        assert_eq!(SqlValue::String("x".into()).as_i64(), None);
    }
}
