//! SQL diagnostics and error handling
//!
//! This crate provides the error handling infrastructure for the quartzdb
//! value-type engine, including stable error codes, SQLSTATE mapping, and the
//! recoverable-warning type used by explicit casts.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for SQL value operations
pub type Result<T> = std::result::Result<T, SqlError>;
