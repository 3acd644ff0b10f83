//! SQL error types

use crate::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - the statement cannot proceed
    Error,
    /// Warning - the operation completed with a caveat
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A recoverable warning attached to an otherwise successful operation.
///
/// Casts are permitted to downgrade a truncation failure into a completed
/// operation plus one of these; implicit conversions never are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Error code describing the condition that was downgraded
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl Warning {
    /// Create a new warning
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Warning for data truncated by an explicit cast
    pub fn truncation(type_name: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::STRING_DATA_TRUNCATION,
            format!("data truncated on cast to {}", type_name.into()),
        )
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning: {} - {}", self.code, self.message)
    }
}

/// Main SQL error type for the value-type engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SqlError {
    /// Kind-incompatible convert, cast, aggregate or combine request
    #[error("cannot convert from {from} to {to}")]
    InvalidConversion { from: String, to: String },

    /// Overflow on narrowing, negate-of-minimum, or decimal precision exceeded
    #[error("numeric value out of range for {type_name}")]
    NumericValueOutOfRange { type_name: String },

    /// Exact-numeric division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Character/binary value exceeds target precision with content that
    /// cannot be pad-trimmed
    #[error("string data right truncation for {type_name}")]
    StringDataTruncation { type_name: String },

    /// Invalid offset/length combination in explicit-length substring
    #[error("substring error: invalid offset {offset} or length {length}")]
    SubstringError { offset: i64, length: i64 },

    /// Literal string does not match the required pattern, or a parsed field
    /// value is out of range
    #[error("invalid datetime format: {message}")]
    DateTimeFormatError { message: String },

    /// Parsed interval field exceeds its positional limit
    #[error("interval field {field} out of range: {value}")]
    IntervalFieldOutOfRange { field: String, value: String },

    /// LOB handle invalidated or object freed
    #[error("invalid large-object handle: {id}")]
    InvalidLob { id: i64 },

    /// Failure reported by the external LOB accessor
    #[error("large-object I/O failure: {message}")]
    IoFailure { message: String },

    /// Internal invariant violation, not a user error
    #[error("unsupported internal operation: {context}")]
    UnsupportedInternalOperation { context: String },
}

impl SqlError {
    /// Construct an `InvalidConversion` from type names
    pub fn invalid_conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidConversion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Construct a `NumericValueOutOfRange` for a target type name
    pub fn out_of_range(type_name: impl Into<String>) -> Self {
        Self::NumericValueOutOfRange {
            type_name: type_name.into(),
        }
    }

    /// Construct a `StringDataTruncation` for a target type name
    pub fn truncation(type_name: impl Into<String>) -> Self {
        Self::StringDataTruncation {
            type_name: type_name.into(),
        }
    }

    /// Construct a `DateTimeFormatError`
    pub fn datetime_format(message: impl Into<String>) -> Self {
        Self::DateTimeFormatError {
            message: message.into(),
        }
    }

    /// Construct an `IntervalFieldOutOfRange`
    pub fn interval_field(field: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::IntervalFieldOutOfRange {
            field: field.into(),
            value: value.to_string(),
        }
    }

    /// Construct an `UnsupportedInternalOperation`
    pub fn internal(context: impl Into<String>) -> Self {
        Self::UnsupportedInternalOperation {
            context: context.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConversion { .. } => ErrorCode::INVALID_CONVERSION,
            Self::NumericValueOutOfRange { .. } => ErrorCode::NUMERIC_VALUE_OUT_OF_RANGE,
            Self::DivisionByZero => ErrorCode::DIVISION_BY_ZERO,
            Self::StringDataTruncation { .. } => ErrorCode::STRING_DATA_TRUNCATION,
            Self::SubstringError { .. } => ErrorCode::SUBSTRING_ERROR,
            Self::DateTimeFormatError { .. } => ErrorCode::DATETIME_FORMAT_ERROR,
            Self::IntervalFieldOutOfRange { .. } => ErrorCode::INTERVAL_FIELD_OUT_OF_RANGE,
            Self::InvalidLob { .. } => ErrorCode::INVALID_LOB,
            Self::IoFailure { .. } => ErrorCode::IO_FAILURE,
            Self::UnsupportedInternalOperation { .. } => {
                ErrorCode::UNSUPPORTED_INTERNAL_OPERATION
            }
        }
    }

    /// Get the SQLSTATE for this error
    pub fn sqlstate(&self) -> &'static str {
        self.code().sqlstate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = SqlError::invalid_conversion("BOOLEAN", "DATE");
        assert_eq!(err.code(), ErrorCode::INVALID_CONVERSION);
        assert_eq!(err.sqlstate(), "42561");

        let err = SqlError::DivisionByZero;
        assert_eq!(err.sqlstate(), "22012");
    }

    #[test]
    fn test_error_display() {
        let err = SqlError::out_of_range("TINYINT");
        assert_eq!(err.to_string(), "numeric value out of range for TINYINT");

        let err = SqlError::SubstringError {
            offset: 5,
            length: -1,
        };
        assert!(err.to_string().contains("offset 5"));
    }

    #[test]
    fn test_truncation_warning() {
        let w = Warning::truncation("CHAR(3)");
        assert_eq!(w.code, ErrorCode::STRING_DATA_TRUNCATION);
        assert!(w.message.contains("CHAR(3)"));
    }
}
