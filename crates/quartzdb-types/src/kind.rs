//! SQL type codes and coarse compatibility groups
//!
//! This module defines the closed set of SQL type kinds handled by the
//! engine, the comparison groups that gate which kinds may be aggregated or
//! combined, and the operator codes used by combined-type resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of SQL type kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    // === Boolean ===
    Boolean,

    // === Exact and approximate numerics ===
    /// 8-bit signed integer
    Tinyint,
    /// 16-bit signed integer
    Smallint,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    Bigint,
    /// IEEE double precision (FLOAT, REAL, DOUBLE)
    Double,
    /// Arbitrary precision exact numeric
    Numeric,
    /// NUMERIC with DECIMAL declaration syntax; same algebra
    Decimal,

    // === Character ===
    /// Fixed width, space padded to precision
    Char,
    /// Variable width, 0 precision means unbounded
    Varchar,
    /// Character large object, id+length handle
    Clob,

    // === Binary and bit ===
    /// Fixed width, zero padded to precision
    Binary,
    /// Variable width byte sequence
    Varbinary,
    /// Binary large object, id+length handle
    Blob,
    /// Fixed width bit sequence, precision in bits
    Bit,
    /// Variable width bit sequence
    BitVarying,

    // === Datetime ===
    Date,
    Time,
    TimeWithZone,
    Timestamp,
    TimestampWithZone,

    // === Intervals: the thirteen SQL qualifiers ===
    IntervalYear,
    IntervalMonth,
    IntervalYearToMonth,
    IntervalDay,
    IntervalHour,
    IntervalMinute,
    IntervalSecond,
    IntervalDayToHour,
    IntervalDayToMinute,
    IntervalDayToSecond,
    IntervalHourToMinute,
    IntervalHourToSecond,
    IntervalMinuteToSecond,
}

/// Coarse compatibility class gating which kinds may be aggregated/combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonGroup {
    Numeric,
    Character,
    Binary,
    Boolean,
    DateTime,
    Interval,
    Other,
}

/// Arithmetic/concatenation operator codes for combined-type resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpCode {
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat,
}

impl TypeKind {
    /// Get the comparison group for this kind
    pub fn comparison_group(self) -> ComparisonGroup {
        match self {
            Self::Boolean => ComparisonGroup::Boolean,
            Self::Tinyint
            | Self::Smallint
            | Self::Integer
            | Self::Bigint
            | Self::Double
            | Self::Numeric
            | Self::Decimal => ComparisonGroup::Numeric,
            Self::Char | Self::Varchar | Self::Clob => ComparisonGroup::Character,
            Self::Binary | Self::Varbinary | Self::Blob | Self::Bit | Self::BitVarying => {
                ComparisonGroup::Binary
            }
            Self::Date
            | Self::Time
            | Self::TimeWithZone
            | Self::Timestamp
            | Self::TimestampWithZone => ComparisonGroup::DateTime,
            _ => ComparisonGroup::Interval,
        }
    }

    /// Check if this is an exact numeric kind
    pub fn is_exact_numeric(self) -> bool {
        matches!(
            self,
            Self::Tinyint
                | Self::Smallint
                | Self::Integer
                | Self::Bigint
                | Self::Numeric
                | Self::Decimal
        )
    }

    /// Check if this is an integer kind
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Tinyint | Self::Smallint | Self::Integer | Self::Bigint
        )
    }

    /// Check if this is any numeric kind
    pub fn is_numeric(self) -> bool {
        self.comparison_group() == ComparisonGroup::Numeric
    }

    /// Check if this is a character kind
    pub fn is_character(self) -> bool {
        self.comparison_group() == ComparisonGroup::Character
    }

    /// Check if this is a binary or bit kind
    pub fn is_binary(self) -> bool {
        self.comparison_group() == ComparisonGroup::Binary
    }

    /// Check if this is a bit kind
    pub fn is_bit(self) -> bool {
        matches!(self, Self::Bit | Self::BitVarying)
    }

    /// Check if this is a datetime kind
    pub fn is_datetime(self) -> bool {
        self.comparison_group() == ComparisonGroup::DateTime
    }

    /// Check if this is a WITH TIME ZONE datetime kind
    pub fn is_datetime_with_zone(self) -> bool {
        matches!(self, Self::TimeWithZone | Self::TimestampWithZone)
    }

    /// Check if this is an interval kind
    pub fn is_interval(self) -> bool {
        self.comparison_group() == ComparisonGroup::Interval
    }

    /// Check if this is a year-month interval kind
    pub fn is_year_month_interval(self) -> bool {
        matches!(
            self,
            Self::IntervalYear | Self::IntervalMonth | Self::IntervalYearToMonth
        )
    }

    /// Check if this is a day-second interval kind
    pub fn is_day_second_interval(self) -> bool {
        self.is_interval() && !self.is_year_month_interval()
    }

    /// Check if values of this kind live in the external LOB store
    pub fn is_lob(self) -> bool {
        matches!(self, Self::Clob | Self::Blob)
    }

    /// Nominal bit-width used by numeric promotion; wider wins
    pub fn numeric_width(self) -> u32 {
        match self {
            Self::Tinyint => 8,
            Self::Smallint => 16,
            Self::Integer => 32,
            Self::Bigint => 64,
            Self::Double => 128,
            Self::Numeric | Self::Decimal => 256,
            _ => 0,
        }
    }

    /// The SQL name of this kind
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Tinyint => "TINYINT",
            Self::Smallint => "SMALLINT",
            Self::Integer => "INTEGER",
            Self::Bigint => "BIGINT",
            Self::Double => "DOUBLE",
            Self::Numeric => "NUMERIC",
            Self::Decimal => "DECIMAL",
            Self::Char => "CHARACTER",
            Self::Varchar => "VARCHAR",
            Self::Clob => "CLOB",
            Self::Binary => "BINARY",
            Self::Varbinary => "VARBINARY",
            Self::Blob => "BLOB",
            Self::Bit => "BIT",
            Self::BitVarying => "BIT VARYING",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::TimeWithZone => "TIME WITH TIME ZONE",
            Self::Timestamp => "TIMESTAMP",
            Self::TimestampWithZone => "TIMESTAMP WITH TIME ZONE",
            Self::IntervalYear => "INTERVAL YEAR",
            Self::IntervalMonth => "INTERVAL MONTH",
            Self::IntervalYearToMonth => "INTERVAL YEAR TO MONTH",
            Self::IntervalDay => "INTERVAL DAY",
            Self::IntervalHour => "INTERVAL HOUR",
            Self::IntervalMinute => "INTERVAL MINUTE",
            Self::IntervalSecond => "INTERVAL SECOND",
            Self::IntervalDayToHour => "INTERVAL DAY TO HOUR",
            Self::IntervalDayToMinute => "INTERVAL DAY TO MINUTE",
            Self::IntervalDayToSecond => "INTERVAL DAY TO SECOND",
            Self::IntervalHourToMinute => "INTERVAL HOUR TO MINUTE",
            Self::IntervalHourToSecond => "INTERVAL HOUR TO SECOND",
            Self::IntervalMinuteToSecond => "INTERVAL MINUTE TO SECOND",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Datetime fields used by part extraction, truncation and rounding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateTimeField {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    DayOfWeek,
    DayOfYear,
    WeekOfYear,
    SecondsMidnight,
    TimezoneHour,
    TimezoneMinute,
    Epoch,
}

impl fmt::Display for DateTimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Year => "YEAR",
            Self::Quarter => "QUARTER",
            Self::Month => "MONTH",
            Self::Week => "WEEK",
            Self::Day => "DAY",
            Self::Hour => "HOUR",
            Self::Minute => "MINUTE",
            Self::Second => "SECOND",
            Self::Millisecond => "MILLISECOND",
            Self::DayOfWeek => "DAY_OF_WEEK",
            Self::DayOfYear => "DAY_OF_YEAR",
            Self::WeekOfYear => "WEEK_OF_YEAR",
            Self::SecondsMidnight => "SECONDS_MIDNIGHT",
            Self::TimezoneHour => "TIMEZONE_HOUR",
            Self::TimezoneMinute => "TIMEZONE_MINUTE",
            Self::Epoch => "EPOCH",
        };
        write!(f, "{}", s)
    }
}

/// Interval fields ordered from coarsest to finest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IntervalField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl IntervalField {
    /// Check if this field belongs to the year-month family
    pub fn is_year_month(self) -> bool {
        matches!(self, Self::Year | Self::Month)
    }

    /// Seconds per unit of this field; zero for year-month fields
    pub fn unit_seconds(self) -> i64 {
        match self {
            Self::Day => 86_400,
            Self::Hour => 3_600,
            Self::Minute => 60,
            Self::Second => 1,
            _ => 0,
        }
    }

    /// Upper limit (exclusive) for this field when it is not the leading field
    pub fn trailing_limit(self) -> i64 {
        match self {
            Self::Month => 12,
            Self::Hour => 24,
            Self::Minute | Self::Second => 60,
            // Year and Day are only ever leading fields
            _ => 0,
        }
    }

    /// The SQL name of this field
    pub fn name(self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Day => "DAY",
            Self::Hour => "HOUR",
            Self::Minute => "MINUTE",
            Self::Second => "SECOND",
        }
    }
}

impl fmt::Display for IntervalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_groups() {
        assert_eq!(TypeKind::Tinyint.comparison_group(), ComparisonGroup::Numeric);
        assert_eq!(TypeKind::Clob.comparison_group(), ComparisonGroup::Character);
        assert_eq!(TypeKind::Bit.comparison_group(), ComparisonGroup::Binary);
        assert_eq!(
            TypeKind::TimestampWithZone.comparison_group(),
            ComparisonGroup::DateTime
        );
        assert_eq!(
            TypeKind::IntervalDayToSecond.comparison_group(),
            ComparisonGroup::Interval
        );
    }

    #[test]
    fn test_numeric_width_ordering() {
        assert!(TypeKind::Tinyint.numeric_width() < TypeKind::Smallint.numeric_width());
        assert!(TypeKind::Bigint.numeric_width() < TypeKind::Double.numeric_width());
        assert!(TypeKind::Double.numeric_width() < TypeKind::Numeric.numeric_width());
    }

    #[test]
    fn test_interval_families() {
        assert!(TypeKind::IntervalYearToMonth.is_year_month_interval());
        assert!(TypeKind::IntervalMinuteToSecond.is_day_second_interval());
        assert!(!TypeKind::IntervalMonth.is_day_second_interval());
    }

    #[test]
    fn test_interval_field_order() {
        assert!(IntervalField::Year < IntervalField::Month);
        assert!(IntervalField::Day < IntervalField::Second);
        assert_eq!(IntervalField::Hour.unit_seconds(), 3600);
    }
}
