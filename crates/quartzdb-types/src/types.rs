//! The type descriptor and its shared contract
//!
//! `SqlType` is the closed sum over the kind families; each variant holds
//! its family descriptor. The shared operations (aggregate, combine,
//! compare, convert, cast, render) pattern-match on the variant and forward
//! to the family modules. Distinct types peel to their base everywhere
//! except identity.

use crate::binary::{self, BinaryType};
use crate::boolean;
use crate::character::{self, CharacterType, CompareMode};
use crate::datetime::{self, DateTimeType};
use crate::distinct::DistinctType;
use crate::interval::{self, IntervalType};
use crate::kind::{ComparisonGroup, OpCode, TypeKind};
use crate::numeric::{self, NumericType};
use crate::session::SessionContext;
use crate::value::{BitValue, SqlValue};
use quartzdb_diagnostics::{Result, SqlError, Warning};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// A conversion outcome carrying an optional recoverable warning.
///
/// Only casts produce warnings; implicit conversion either succeeds cleanly
/// or fails.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub value: SqlValue,
    pub warning: Option<Warning>,
}

impl Converted {
    fn clean(value: SqlValue) -> Self {
        Self {
            value,
            warning: None,
        }
    }
}

/// A full SQL type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlType {
    Boolean,
    Numeric(NumericType),
    Character(CharacterType),
    Binary(BinaryType),
    DateTime(DateTimeType),
    Interval(IntervalType),
    Distinct(DistinctType),
}

impl SqlType {
    /// Peel distinct wrappers down to the algebraic base type
    pub fn resolved(&self) -> &SqlType {
        match self {
            Self::Distinct(d) => d.base(),
            other => other,
        }
    }

    /// The kind code of this type
    pub fn kind(&self) -> TypeKind {
        match self.resolved() {
            Self::Boolean => TypeKind::Boolean,
            Self::Numeric(t) => t.kind,
            Self::Character(t) => t.kind,
            Self::Binary(t) => t.kind,
            Self::DateTime(t) => t.kind,
            Self::Interval(t) => t.kind(),
            Self::Distinct(_) => unreachable!("resolved type is never distinct"),
        }
    }

    /// The SQL name of this type's kind
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Coarse compatibility group
    pub fn comparison_group(&self) -> ComparisonGroup {
        self.kind().comparison_group()
    }

    /// The full SQL definition text, including precision and scale
    pub fn definition(&self) -> String {
        match self {
            Self::Boolean => "BOOLEAN".to_string(),
            Self::Numeric(t) => match t.kind {
                TypeKind::Numeric | TypeKind::Decimal => {
                    format!("{}({},{})", t.kind.name(), t.precision, t.scale)
                }
                _ => t.kind.name().to_string(),
            },
            Self::Character(t) => character::definition(t),
            Self::Binary(t) => t.definition(),
            Self::DateTime(t) => t.definition(),
            Self::Interval(t) => t.definition(),
            Self::Distinct(d) => d.name.to_string(),
        }
    }

    /// Declared precision: digits, characters, bytes or bits depending on
    /// the kind
    pub fn precision(&self) -> u64 {
        match self.resolved() {
            Self::Boolean => 0,
            Self::Numeric(t) => t.precision as u64,
            Self::Character(t) => t.precision,
            Self::Binary(t) => t.precision,
            Self::DateTime(_) => 0,
            Self::Interval(t) => t.leading_precision as u64,
            Self::Distinct(_) => unreachable!("resolved type is never distinct"),
        }
    }

    /// Declared scale: fractional or sub-second digits
    pub fn scale(&self) -> u32 {
        match self.resolved() {
            Self::Numeric(t) => t.scale,
            Self::DateTime(t) => t.scale,
            Self::Interval(t) => t.fraction_precision,
            _ => 0,
        }
    }

    /// Maximum rendered width of a value of this type
    pub fn display_size(&self) -> u64 {
        match self.resolved() {
            Self::Boolean => 5,
            Self::Numeric(t) => match t.kind {
                TypeKind::Tinyint => 4,
                TypeKind::Smallint => 6,
                TypeKind::Integer => 11,
                TypeKind::Bigint => 20,
                TypeKind::Double => 23,
                // Sign and decimal point
                _ => t.precision as u64 + 2,
            },
            Self::Character(t) => t.capacity(),
            Self::Binary(t) => {
                if t.kind.is_bit() {
                    t.capacity()
                } else {
                    t.capacity() * 2
                }
            }
            Self::DateTime(t) => {
                let fraction = if t.scale > 0 { t.scale as u64 + 1 } else { 0 };
                let zone = if t.kind.is_datetime_with_zone() { 6 } else { 0 };
                match t.kind {
                    TypeKind::Date => 10,
                    TypeKind::Time | TypeKind::TimeWithZone => 8 + fraction + zone,
                    _ => 19 + fraction + zone,
                }
            }
            Self::Interval(t) => {
                let fraction = if t.fraction_precision > 0 {
                    t.fraction_precision as u64 + 1
                } else {
                    0
                };
                // Sign, leading field, three characters per trailing field
                let trailing = (t.fields().len() as u64 - 1) * 3;
                1 + t.leading_precision as u64 + trailing + fraction
            }
            Self::Distinct(_) => unreachable!("resolved type is never distinct"),
        }
    }

    // =====================================================================
    // Aggregation and combination
    // =====================================================================

    /// The common type both operands widen to for comparison or set
    /// operations
    pub fn aggregate_type(&self, other: &SqlType) -> Result<SqlType> {
        let a = self.resolved();
        let b = other.resolved();
        if a == b {
            return Ok(a.clone());
        }
        match (a, b) {
            (Self::Boolean, Self::Boolean) => Ok(Self::Boolean),
            (Self::Numeric(x), Self::Numeric(y)) => Ok(Self::Numeric(numeric::aggregate(x, y))),
            (Self::Character(x), Self::Character(y)) => {
                Ok(Self::Character(character::aggregate(x, y)))
            }
            (Self::Binary(x), Self::Binary(y)) => Ok(Self::Binary(binary::aggregate(x, y))),
            (Self::DateTime(x), Self::DateTime(y)) => {
                Ok(Self::DateTime(datetime::aggregate(x, y)?))
            }
            (Self::Interval(x), Self::Interval(y)) => {
                Ok(Self::Interval(interval::aggregate(x, y)?))
            }
            _ => Err(SqlError::invalid_conversion(a.definition(), b.definition())),
        }
    }

    /// The result type of an arithmetic or concatenation operator
    pub fn combined_type(&self, other: &SqlType, op: OpCode) -> Result<SqlType> {
        let a = self.resolved();
        let b = other.resolved();
        match (a, b, op) {
            (Self::Character(x), Self::Character(y), OpCode::Concat) => {
                Ok(Self::Character(character::combine(x, y, op)?))
            }
            (Self::Binary(x), Self::Binary(y), OpCode::Concat) => {
                Ok(Self::Binary(binary::combine(x, y, op)?))
            }
            (Self::Numeric(x), Self::Numeric(y), _) => {
                Ok(Self::Numeric(numeric::combine(x, y, op)?))
            }
            (Self::DateTime(x), Self::Interval(_), OpCode::Add | OpCode::Subtract) => {
                Ok(Self::DateTime(*x))
            }
            (Self::Interval(_), Self::DateTime(y), OpCode::Add) => Ok(Self::DateTime(*y)),
            (Self::Interval(x), Self::Interval(y), OpCode::Add | OpCode::Subtract) => {
                Ok(Self::Interval(interval::combine(x, y, op)?))
            }
            (Self::Interval(x), Self::Numeric(_), OpCode::Multiply | OpCode::Divide) => {
                Ok(Self::Interval(*x))
            }
            (Self::Numeric(_), Self::Interval(y), OpCode::Multiply) => Ok(Self::Interval(*y)),
            _ => Err(SqlError::invalid_conversion(a.definition(), b.definition())),
        }
    }

    // =====================================================================
    // Comparison
    // =====================================================================

    /// Total order over values of this type; null sorts before any non-null
    /// value
    pub fn compare(
        &self,
        ctx: &dyn SessionContext,
        a: &SqlValue,
        b: &SqlValue,
    ) -> Result<Ordering> {
        self.compare_with_mode(ctx, a, b, CompareMode::Normal)
    }

    /// Comparison with an explicit pad mode; only character types honor the
    /// mode
    pub fn compare_with_mode(
        &self,
        ctx: &dyn SessionContext,
        a: &SqlValue,
        b: &SqlValue,
        mode: CompareMode,
    ) -> Result<Ordering> {
        match (a.is_null(), b.is_null()) {
            (true, true) => return Ok(Ordering::Equal),
            (true, false) => return Ok(Ordering::Less),
            (false, true) => return Ok(Ordering::Greater),
            (false, false) => {}
        }
        match self.resolved() {
            Self::Boolean => {
                let (x, y) = (expect_boolean(a)?, expect_boolean(b)?);
                Ok(boolean::compare(x, y))
            }
            Self::Numeric(_) => numeric::compare(a, b),
            Self::Character(t) => {
                let x = char_payload(ctx, a)?;
                let y = char_payload(ctx, b)?;
                Ok(character::compare(&t.collation, &x, &y, mode))
            }
            Self::Binary(_) => {
                let x = bytes_payload(ctx, a)?;
                let y = bytes_payload(ctx, b)?;
                Ok(binary::compare(&x, &y))
            }
            Self::DateTime(_) => {
                let (x, y) = (expect_datetime(a)?, expect_datetime(b)?);
                Ok(datetime::compare(x, y))
            }
            Self::Interval(_) => interval::compare(a, b),
            Self::Distinct(_) => unreachable!("resolved type is never distinct"),
        }
    }

    // =====================================================================
    // Conversion and casting
    // =====================================================================

    /// Implicit (assignment) conversion; never truncates silently
    pub fn convert_to_type(
        &self,
        ctx: &dyn SessionContext,
        value: &SqlValue,
        from: &SqlType,
    ) -> Result<SqlValue> {
        Ok(self.convert_value(ctx, value, from, false)?.value)
    }

    /// Explicit CAST; permits more source kinds and downgrades character
    /// truncation to a recoverable warning
    pub fn cast_to_type(
        &self,
        ctx: &dyn SessionContext,
        value: &SqlValue,
        from: &SqlType,
    ) -> Result<Converted> {
        self.convert_value(ctx, value, from, true)
    }

    /// Conversion with no limit enforcement, for values crossing the host
    /// boundary with an already known kind
    pub fn convert_to_default_type(
        &self,
        ctx: &dyn SessionContext,
        value: &SqlValue,
    ) -> Result<SqlValue> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }
        match self.resolved() {
            Self::Numeric(t) => numeric::convert_to_default(t.kind, value),
            Self::Character(_) => match value {
                SqlValue::String(_) | SqlValue::Clob(_) => Ok(value.clone()),
                other => Ok(SqlValue::String(other.to_string())),
            },
            Self::Interval(t) => {
                if let SqlValue::String(s) = value {
                    interval::parse(t, s)
                } else {
                    Ok(value.clone())
                }
            }
            Self::DateTime(t) => {
                if let SqlValue::String(s) = value {
                    datetime::parse(t, s, ctx)
                } else {
                    Ok(value.clone())
                }
            }
            _ => Ok(value.clone()),
        }
    }

    fn convert_value(
        &self,
        ctx: &dyn SessionContext,
        value: &SqlValue,
        from: &SqlType,
        cast: bool,
    ) -> Result<Converted> {
        if let Self::Distinct(d) = self {
            return d.base().convert_value(ctx, value, from, cast);
        }
        let from = from.resolved();
        if value.is_null() {
            return Ok(Converted::clean(SqlValue::Null));
        }
        let incompatible =
            || SqlError::invalid_conversion(from.definition(), self.definition());

        match self {
            Self::Boolean => match from {
                Self::Boolean => Ok(Converted::clean(value.clone())),
                Self::Character(_) => {
                    let s = char_payload(ctx, value)?;
                    Ok(Converted::clean(boolean::parse(&s)?))
                }
                Self::Binary(t) if t.kind.is_bit() && cast => match value {
                    SqlValue::Bit(bits) => Ok(Converted::clean(boolean::from_bit(
                        &bits.bytes,
                        bits.bit_length,
                    )?)),
                    _ => Err(incompatible()),
                },
                _ => Err(incompatible()),
            },
            Self::Numeric(t) => match from {
                Self::Numeric(_) | Self::Character(_) => {
                    let source = match value {
                        SqlValue::Clob(_) => SqlValue::String(char_payload(ctx, value)?),
                        other => other.clone(),
                    };
                    Ok(Converted::clean(numeric::convert(t, &source)?))
                }
                Self::Interval(ft) if cast => {
                    let units = interval::to_leading_units(ft, value)?;
                    Ok(Converted::clean(numeric::convert(
                        t,
                        &SqlValue::Bigint(units),
                    )?))
                }
                Self::Boolean if cast => match value {
                    SqlValue::Boolean(b) => Ok(Converted::clean(numeric::convert(
                        t,
                        &SqlValue::Integer(*b as i32),
                    )?)),
                    _ => Err(incompatible()),
                },
                _ => Err(incompatible()),
            },
            Self::Character(t) => {
                // Implicit conversion accepts character sources only; a cast
                // renders any value through its type's string form
                let s = match from {
                    Self::Character(_) => char_payload(ctx, value)?,
                    _ if cast => from.convert_to_string(ctx, value)?,
                    _ => return Err(incompatible()),
                };
                let enforced = character::enforce(t, &s, cast)?;
                let out = if t.kind == TypeKind::Clob {
                    SqlValue::Clob(ctx.create_clob(&enforced.value)?)
                } else {
                    SqlValue::String(enforced.value)
                };
                Ok(Converted {
                    value: out,
                    warning: enforced.warning,
                })
            }
            Self::Binary(t) => {
                if t.kind.is_bit() {
                    let bits = match value {
                        SqlValue::Bit(bits) => bits.clone(),
                        SqlValue::Binary(bytes) if cast => {
                            BitValue::new(bytes.clone(), bytes.len() * 8)
                        }
                        _ => return Err(incompatible()),
                    };
                    return Ok(Converted::clean(SqlValue::Bit(binary::enforce_bits(
                        t, &bits, cast,
                    )?)));
                }
                let bytes = match (from, value) {
                    (Self::Binary(_), SqlValue::Bit(bits)) => bits.bytes.clone(),
                    (Self::Binary(_), _) => bytes_payload(ctx, value)?,
                    (Self::Character(_), _) if cast => {
                        binary::parse_hex(&char_payload(ctx, value)?)?
                    }
                    _ => return Err(incompatible()),
                };
                let enforced = binary::enforce(t, &bytes, cast)?;
                let out = if t.kind == TypeKind::Blob {
                    SqlValue::Blob(ctx.create_blob(&enforced.value)?)
                } else {
                    SqlValue::Binary(enforced.value)
                };
                Ok(Converted {
                    value: out,
                    warning: enforced.warning,
                })
            }
            Self::DateTime(t) => match from {
                Self::DateTime(_) => {
                    let dt = expect_datetime(value)?;
                    Ok(Converted::clean(datetime::convert(
                        t,
                        from.kind(),
                        dt,
                        ctx,
                    )?))
                }
                Self::Character(_) => {
                    let s = char_payload(ctx, value)?;
                    Ok(Converted::clean(datetime::parse(t, s.trim(), ctx)?))
                }
                _ => Err(incompatible()),
            },
            Self::Interval(t) => match from {
                Self::Interval(ft) => {
                    if ft.is_year_month() != t.is_year_month() {
                        return Err(incompatible());
                    }
                    interval::check_limits(t, value)?;
                    Ok(Converted::clean(value.clone()))
                }
                Self::Character(_) => {
                    let s = char_payload(ctx, value)?;
                    Ok(Converted::clean(interval::parse(t, &s)?))
                }
                Self::Numeric(_) if cast => {
                    let units = value
                        .as_decimal()
                        .and_then(|d| d.trunc().to_i64())
                        .or_else(|| value.as_i64())
                        .ok_or_else(incompatible)?;
                    Ok(Converted::clean(interval::from_leading_units(t, units)?))
                }
                _ => Err(incompatible()),
            },
            Self::Distinct(_) => unreachable!("handled above"),
        }
    }

    // =====================================================================
    // Value operators
    // =====================================================================

    /// Apply an arithmetic or concatenation operator; `self` is the combined
    /// result type resolved by [`Self::combined_type`]
    pub fn binary_op(
        &self,
        ctx: &dyn SessionContext,
        a: &SqlValue,
        b: &SqlValue,
        op: OpCode,
    ) -> Result<SqlValue> {
        if a.is_null() || b.is_null() {
            return Ok(SqlValue::Null);
        }
        match self.resolved() {
            Self::Numeric(t) => numeric::binary_op(a, b, op, t),
            Self::Character(t) if op == OpCode::Concat => {
                let joined = character::concat(&char_payload(ctx, a)?, &char_payload(ctx, b)?);
                if t.kind == TypeKind::Clob {
                    Ok(SqlValue::Clob(ctx.create_clob(&joined)?))
                } else {
                    Ok(SqlValue::String(joined))
                }
            }
            Self::Binary(t) if op == OpCode::Concat => {
                let joined = binary::concat(&bytes_payload(ctx, a)?, &bytes_payload(ctx, b)?);
                if t.kind == TypeKind::Blob {
                    Ok(SqlValue::Blob(ctx.create_blob(&joined)?))
                } else {
                    Ok(SqlValue::Binary(joined))
                }
            }
            Self::DateTime(t) => {
                let (dt, iv, subtract) = match (a, b, op) {
                    (SqlValue::DateTime(dt), iv, OpCode::Add) => (dt, iv, false),
                    (SqlValue::DateTime(dt), iv, OpCode::Subtract) => (dt, iv, true),
                    (iv, SqlValue::DateTime(dt), OpCode::Add) => (dt, iv, false),
                    _ => {
                        return Err(SqlError::invalid_conversion(
                            self.definition(),
                            "datetime operand",
                        ));
                    }
                };
                datetime::add_interval(t, dt, iv, subtract)
            }
            Self::Interval(t) => match (a, b) {
                (SqlValue::IntervalYearMonth(_) | SqlValue::IntervalDaySecond(_), other)
                    if matches!(op, OpCode::Multiply | OpCode::Divide) =>
                {
                    interval::scalar_op(a, scalar_factor(self, other)?, op, t)
                }
                (other, interval_value @ (SqlValue::IntervalYearMonth(_)
                    | SqlValue::IntervalDaySecond(_)))
                    if op == OpCode::Multiply =>
                {
                    interval::scalar_op(interval_value, scalar_factor(self, other)?, op, t)
                }
                _ => interval::binary_op(a, b, op, t),
            },
            _ => Err(SqlError::internal(format!(
                "operator {:?} undefined for {}",
                op,
                self.definition()
            ))),
        }
    }

    // =====================================================================
    // Rendering
    // =====================================================================

    /// Render a non-null value in its canonical external form
    pub fn convert_to_string(&self, ctx: &dyn SessionContext, value: &SqlValue) -> Result<String> {
        if value.is_null() {
            return Err(SqlError::internal("NULL has no string form"));
        }
        match self.resolved() {
            Self::Boolean => boolean::to_string(value),
            Self::Numeric(_) => numeric::to_string(value),
            Self::Character(_) => char_payload(ctx, value),
            Self::Binary(_) => match value {
                SqlValue::Bit(bits) => Ok(bits.to_string()),
                _ => Ok(binary::to_hex(&bytes_payload(ctx, value)?)),
            },
            Self::DateTime(t) => datetime::format(t, expect_datetime(value)?),
            Self::Interval(t) => interval::format(t, value),
            Self::Distinct(_) => unreachable!("resolved type is never distinct"),
        }
    }

    /// Render a value as SQL literal syntax that round-trips through the
    /// parser
    pub fn convert_to_sql_string(
        &self,
        ctx: &dyn SessionContext,
        value: &SqlValue,
    ) -> Result<String> {
        if value.is_null() {
            return Ok("NULL".to_string());
        }
        match self.resolved() {
            Self::Boolean => boolean::to_string(value),
            Self::Numeric(_) => numeric::to_string(value),
            Self::Character(_) => Ok(character::to_sql_literal(&char_payload(ctx, value)?)),
            Self::Binary(_) => match value {
                SqlValue::Bit(bits) => Ok(format!("B'{}'", bits)),
                _ => Ok(binary::to_sql_literal(&bytes_payload(ctx, value)?)),
            },
            Self::DateTime(t) => datetime::to_sql_literal(t, expect_datetime(value)?),
            Self::Interval(t) => interval::to_sql_literal(t, value),
            Self::Distinct(_) => unreachable!("resolved type is never distinct"),
        }
    }
}

// =========================================================================
// Payload accessors
// =========================================================================

/// The character content of a value, materializing CLOB handles through the
/// session's store
pub fn char_payload(ctx: &dyn SessionContext, value: &SqlValue) -> Result<String> {
    match value {
        SqlValue::String(s) => Ok(s.clone()),
        SqlValue::Clob(h) => ctx.lob_store().get_chars(h.id, 0, h.length),
        other => Err(SqlError::invalid_conversion(
            format!("{:?}", other),
            "CHARACTER",
        )),
    }
}

/// The byte content of a value, materializing BLOB handles through the
/// session's store
pub fn bytes_payload(ctx: &dyn SessionContext, value: &SqlValue) -> Result<Vec<u8>> {
    match value {
        SqlValue::Binary(b) => Ok(b.clone()),
        SqlValue::Bit(bits) => Ok(bits.bytes.clone()),
        SqlValue::Blob(h) => ctx.lob_store().get_bytes(h.id, 0, h.length),
        other => Err(SqlError::invalid_conversion(
            format!("{:?}", other),
            "BINARY",
        )),
    }
}

/// Scalar factor for interval multiply/divide; DOUBLE operands go through a
/// decimal conversion, which rejects NaN and infinities
fn scalar_factor(t: &SqlType, value: &SqlValue) -> Result<Decimal> {
    let factor = match value {
        SqlValue::Double(d) => Decimal::from_f64(*d),
        other => other.as_decimal(),
    };
    factor.ok_or_else(|| SqlError::invalid_conversion(t.definition(), "numeric operand"))
}

fn expect_boolean(value: &SqlValue) -> Result<bool> {
    value
        .as_boolean()
        .ok_or_else(|| SqlError::internal("boolean payload expected"))
}

fn expect_datetime(value: &SqlValue) -> Result<&crate::value::SqlDateTime> {
    value
        .as_datetime()
        .ok_or_else(|| SqlError::internal("datetime payload expected"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distinct::QualifiedName;
    use crate::kind::IntervalField;
    use crate::session::FixedOffsetSession;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn ctx() -> FixedOffsetSession {
        FixedOffsetSession::utc()
    }

    fn tinyint() -> SqlType {
        SqlType::Numeric(NumericType::default_for(TypeKind::Tinyint))
    }

    fn varchar(n: u64) -> SqlType {
        SqlType::Character(CharacterType::new(TypeKind::Varchar, n))
    }

    #[test]
    fn test_boundary_cast_string_to_tinyint() {
        let ctx = ctx();
        let from = varchar(10);
        let ok = tinyint()
            .cast_to_type(&ctx, &SqlValue::String("127".into()), &from)
            .unwrap();
        assert_eq!(ok.value, SqlValue::Integer(127));
        assert!(matches!(
            tinyint().cast_to_type(&ctx, &SqlValue::String("128".into()), &from),
            Err(SqlError::NumericValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_cast_truncation_warns_convert_fails() {
        let ctx = ctx();
        let target = varchar(3);
        let from = varchar(10);
        let long = SqlValue::String("abcdef".into());
        assert!(matches!(
            target.convert_to_type(&ctx, &long, &from),
            Err(SqlError::StringDataTruncation { .. })
        ));
        let cast = target.cast_to_type(&ctx, &long, &from).unwrap();
        assert_eq!(cast.value, SqlValue::String("abc".into()));
        assert!(cast.warning.is_some());
        // All-space tail converts cleanly
        let padded = SqlValue::String("ab  ".into());
        assert_eq!(
            target.convert_to_type(&ctx, &padded, &from).unwrap(),
            SqlValue::String("ab".into())
        );
    }

    #[test]
    fn test_cast_any_to_character() {
        let ctx = ctx();
        let target = varchar(20);
        let from = SqlType::Boolean;
        let cast = target
            .cast_to_type(&ctx, &SqlValue::Boolean(true), &from)
            .unwrap();
        assert_eq!(cast.value, SqlValue::String("TRUE".into()));
        // Implicit conversion from boolean is refused
        assert!(target
            .convert_to_type(&ctx, &SqlValue::Boolean(true), &from)
            .is_err());
    }

    #[test]
    fn test_aggregate_symmetry_and_cross_group_failure() {
        let a = SqlType::Numeric(NumericType::new(TypeKind::Numeric, 5, 2));
        let b = SqlType::Numeric(NumericType::default_for(TypeKind::Bigint));
        assert_eq!(
            a.aggregate_type(&b).unwrap(),
            b.aggregate_type(&a).unwrap()
        );
        assert!(a.aggregate_type(&varchar(5)).is_err());
    }

    #[test]
    fn test_combined_datetime_plus_interval() {
        let ts = SqlType::DateTime(DateTimeType::default_for(TypeKind::Timestamp));
        let iv = SqlType::Interval(
            IntervalType::new(IntervalField::Month, IntervalField::Month, 2, 0).unwrap(),
        );
        assert_eq!(ts.combined_type(&iv, OpCode::Add).unwrap(), ts);
        assert_eq!(iv.combined_type(&ts, OpCode::Add).unwrap(), ts);
        assert!(iv.combined_type(&ts, OpCode::Subtract).is_err());
    }

    #[test]
    fn test_null_sorts_first() {
        let ctx = ctx();
        let t = tinyint();
        assert_eq!(
            t.compare(&ctx, &SqlValue::Null, &SqlValue::Integer(1)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            t.compare(&ctx, &SqlValue::Integer(1), &SqlValue::Null).unwrap(),
            Ordering::Greater
        );
        assert_eq!(
            t.compare(&ctx, &SqlValue::Null, &SqlValue::Null).unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn test_cast_idempotence() {
        let ctx = ctx();
        let t = SqlType::Character(CharacterType::new(TypeKind::Char, 5));
        let from = varchar(10);
        let once = t
            .cast_to_type(&ctx, &SqlValue::String("ab".into()), &from)
            .unwrap();
        assert_eq!(once.value, SqlValue::String("ab   ".into()));
        let twice = t.cast_to_type(&ctx, &once.value, &t).unwrap();
        assert_eq!(twice.value, once.value);
    }

    #[test]
    fn test_distinct_delegates() {
        let ctx = ctx();
        let base = Arc::new(SqlType::Numeric(NumericType::new(TypeKind::Decimal, 10, 2)));
        let money = SqlType::Distinct(
            DistinctType::new(QualifiedName::new("PUBLIC", "MONEY"), base).unwrap(),
        );
        let from = varchar(10);
        let converted = money
            .convert_to_type(&ctx, &SqlValue::String("12.345".into()), &from)
            .unwrap();
        assert_eq!(converted, SqlValue::Numeric(Decimal::new(1234, 2)));
        assert_eq!(money.definition(), "PUBLIC.MONEY");
        assert_eq!(money.kind(), TypeKind::Decimal);
    }

    #[test]
    fn test_clob_round_trip_through_store() {
        let ctx = ctx();
        let clob = SqlType::Character(CharacterType::new(TypeKind::Clob, 0));
        let from = varchar(0);
        let stored = clob
            .convert_to_type(&ctx, &SqlValue::String("large text".into()), &from)
            .unwrap();
        assert!(matches!(stored, SqlValue::Clob(_)));
        assert_eq!(clob.convert_to_string(&ctx, &stored).unwrap(), "large text");
        assert_eq!(
            clob.convert_to_sql_string(&ctx, &stored).unwrap(),
            "'large text'"
        );
    }

    #[test]
    fn test_binary_op_datetime_interval() {
        let ctx = ctx();
        let ts = SqlType::DateTime(DateTimeType::new(TypeKind::Timestamp, 0).unwrap());
        let base = datetime::parse(
            &DateTimeType::new(TypeKind::Timestamp, 0).unwrap(),
            "2024-01-31 00:00:00",
            &ctx,
        )
        .unwrap();
        let out = ts
            .binary_op(&ctx, &base, &SqlValue::IntervalYearMonth(1), OpCode::Add)
            .unwrap();
        assert_eq!(ts.convert_to_string(&ctx, &out).unwrap(), "2024-02-29 00:00:00");
    }

    #[test]
    fn test_interval_scalar_multiply_through_dispatch() {
        let ctx = ctx();
        let t = SqlType::Interval(
            IntervalType::new(IntervalField::Day, IntervalField::Day, 3, 0).unwrap(),
        );
        let SqlType::Interval(it) = &t else { unreachable!() };
        let v = interval::from_leading_units(it, 10).unwrap();
        let out = t
            .binary_op(&ctx, &v, &SqlValue::Integer(3), OpCode::Multiply)
            .unwrap();
        assert_eq!(interval::to_leading_units(it, &out).unwrap(), 30);
    }

    #[test]
    fn test_sql_string_forms() {
        let ctx = ctx();
        assert_eq!(
            varchar(10)
                .convert_to_sql_string(&ctx, &SqlValue::String("it's".into()))
                .unwrap(),
            "'it''s'"
        );
        assert_eq!(
            SqlType::Boolean
                .convert_to_sql_string(&ctx, &SqlValue::Null)
                .unwrap(),
            "NULL"
        );
        let bin = SqlType::Binary(BinaryType::new(TypeKind::Varbinary, 10));
        assert_eq!(
            bin.convert_to_sql_string(&ctx, &SqlValue::Binary(vec![0xAB, 0x01]))
                .unwrap(),
            "X'AB01'"
        );
    }
}
