//! SQL value-type engine
//!
//! This crate implements the type system of an embedded SQL database:
//! - Type descriptors for every SQL kind, resolved through an explicit
//!   [`TypeRegistry`] flyweight cache
//! - The coercion lattice: aggregate (widening) and combined (operator
//!   result) type resolution
//! - Implicit conversion and explicit CAST with precision, scale and
//!   truncation semantics
//! - Value algebra per family: numeric arithmetic with precision growth,
//!   character and binary operators with SQL clamping rules, calendar
//!   arithmetic, interval parsing and arithmetic, period predicates
//!
//! Datetime operations take a caller-owned [`SessionContext`] for the zone
//! offset, the clock, and large-object access; nothing in the crate holds
//! global mutable state.

pub mod binary;
pub mod boolean;
pub mod character;
pub mod datetime;
pub mod distinct;
pub mod format;
pub mod interval;
pub mod kind;
pub mod lob;
pub mod numeric;
pub mod registry;
pub mod session;
pub mod types;
pub mod value;

// Convenience re-exports
pub use binary::BinaryType;
pub use character::{CharacterType, Collation, CompareMode};
pub use datetime::{DateTimeType, Period};
pub use distinct::{DistinctType, QualifiedName};
pub use interval::IntervalType;
pub use kind::{ComparisonGroup, DateTimeField, IntervalField, OpCode, TypeKind};
pub use lob::{LobHandle, LobStore, MemoryLobStore};
pub use numeric::NumericType;
pub use quartzdb_diagnostics::{Result, SqlError, Warning};
pub use registry::TypeRegistry;
pub use session::{FixedOffsetSession, SessionContext};
pub use types::{Converted, SqlType};
pub use value::{BitValue, SqlDateTime, SqlInterval, SqlValue};
