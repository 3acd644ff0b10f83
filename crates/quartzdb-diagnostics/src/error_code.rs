//! SQL error codes following a structured numbering system
//!
//! Error code ranges:
//! - SQL1000-SQL1099: Conversion and cast errors
//! - SQL1100-SQL1199: Numeric errors (overflow, division)
//! - SQL1200-SQL1299: String and binary errors
//! - SQL1300-SQL1399: Datetime and interval errors
//! - SQL1400-SQL1499: Large-object errors
//! - SQL1900-SQL1999: Internal errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Kind-incompatible convert/cast/aggregate/combine request
    pub const INVALID_CONVERSION: ErrorCode = ErrorCode::new(1000);
    /// Overflow on narrowing, negate-of-minimum, decimal precision exceeded
    pub const NUMERIC_VALUE_OUT_OF_RANGE: ErrorCode = ErrorCode::new(1100);
    /// Exact-numeric division by zero
    pub const DIVISION_BY_ZERO: ErrorCode = ErrorCode::new(1101);
    /// Character/binary value exceeds target precision with non-trimmable content
    pub const STRING_DATA_TRUNCATION: ErrorCode = ErrorCode::new(1200);
    /// Invalid offset/length combination in explicit-length substring
    pub const SUBSTRING_ERROR: ErrorCode = ErrorCode::new(1201);
    /// Literal string does not match the required pattern or field is out of range
    pub const DATETIME_FORMAT_ERROR: ErrorCode = ErrorCode::new(1300);
    /// Parsed interval field exceeds its positional limit
    pub const INTERVAL_FIELD_OUT_OF_RANGE: ErrorCode = ErrorCode::new(1301);
    /// LOB handle invalidated or object freed
    pub const INVALID_LOB: ErrorCode = ErrorCode::new(1400);
    /// Failure reported by the external LOB accessor
    pub const IO_FAILURE: ErrorCode = ErrorCode::new(1401);
    /// Internal invariant violation, not a user error
    pub const UNSUPPORTED_INTERNAL_OPERATION: ErrorCode = ErrorCode::new(1900);

    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get the five-character SQLSTATE for this code
    pub const fn sqlstate(&self) -> &'static str {
        match self.0 {
            1000 => "42561",
            1100 => "22003",
            1101 => "22012",
            1200 => "22001",
            1201 => "22011",
            1300 => "22007",
            1301 => "22015",
            1400 => "0F502",
            1401 => "58030",
            1900 => "XX000",
            _ => "S1000",
        }
    }

    /// Check if this is a conversion error (1000-1099)
    pub const fn is_conversion_error(&self) -> bool {
        self.0 >= 1000 && self.0 < 1100
    }

    /// Check if this is a numeric error (1100-1199)
    pub const fn is_numeric_error(&self) -> bool {
        self.0 >= 1100 && self.0 < 1200
    }

    /// Check if this is a string or binary error (1200-1299)
    pub const fn is_string_error(&self) -> bool {
        self.0 >= 1200 && self.0 < 1300
    }

    /// Check if this is a datetime or interval error (1300-1399)
    pub const fn is_datetime_error(&self) -> bool {
        self.0 >= 1300 && self.0 < 1400
    }

    /// Check if this is a large-object error (1400-1499)
    pub const fn is_lob_error(&self) -> bool {
        self.0 >= 1400 && self.0 < 1500
    }

    /// Check if this is an internal error (1900-1999)
    pub const fn is_internal_error(&self) -> bool {
        self.0 >= 1900
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SQL{:04}", self.0)
    }
}
