//! Numeric type algebra
//!
//! Exact and approximate numeric kinds, width-based promotion, decimal
//! precision/scale arithmetic, and the checked arithmetic operators. The
//! exact ladder is TINYINT < SMALLINT < INTEGER < BIGINT < DOUBLE < NUMERIC
//! by nominal width; DOUBLE absorbs any combination it appears in.

use crate::kind::{OpCode, TypeKind};
use crate::value::SqlValue;
use quartzdb_diagnostics::{Result, SqlError};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Maximum digit count representable by the Decimal backing store
pub const MAX_NUMERIC_PRECISION: u32 = 28;

/// Maximum fractional digit count
pub const MAX_NUMERIC_SCALE: u32 = 28;

/// Default precision for NUMERIC/DECIMAL declared without parameters
pub const DEFAULT_NUMERIC_PRECISION: u32 = 18;

/// Descriptor fields for a numeric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct NumericType {
    pub kind: TypeKind,
    /// Digit count; fixed for the integer kinds, declared for NUMERIC/DECIMAL
    pub precision: u32,
    /// Fractional digit count; zero for every kind except NUMERIC/DECIMAL
    pub scale: u32,
}

impl NumericType {
    /// Create a descriptor; integer and double kinds get their fixed precision
    pub fn new(kind: TypeKind, precision: u32, scale: u32) -> Self {
        match kind {
            TypeKind::Tinyint => Self { kind, precision: 3, scale: 0 },
            TypeKind::Smallint => Self { kind, precision: 5, scale: 0 },
            TypeKind::Integer => Self { kind, precision: 10, scale: 0 },
            TypeKind::Bigint => Self { kind, precision: 19, scale: 0 },
            TypeKind::Double => Self { kind, precision: 17, scale: 0 },
            _ => Self { kind, precision, scale },
        }
    }

    /// The default descriptor for a numeric kind
    pub fn default_for(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Numeric | TypeKind::Decimal => {
                Self::new(kind, DEFAULT_NUMERIC_PRECISION, 0)
            }
            _ => Self::new(kind, 0, 0),
        }
    }

    /// Integer digit capacity (digits left of the decimal point)
    pub fn int_digits(&self) -> u32 {
        self.precision.saturating_sub(self.scale)
    }

    /// Check whether this descriptor is the arbitrary-precision kind
    pub fn is_decimal(&self) -> bool {
        matches!(self.kind, TypeKind::Numeric | TypeKind::Decimal)
    }
}

/// Range limits for the integer kinds
fn integer_limits(kind: TypeKind) -> (i64, i64) {
    match kind {
        TypeKind::Tinyint => (i8::MIN as i64, i8::MAX as i64),
        TypeKind::Smallint => (i16::MIN as i64, i16::MAX as i64),
        TypeKind::Integer => (i32::MIN as i64, i32::MAX as i64),
        _ => (i64::MIN, i64::MAX),
    }
}

/// Narrowest type that can hold values of both operands for comparison.
///
/// DOUBLE dominates; among integer kinds the wider wins; when either operand
/// is NUMERIC/DECIMAL the result is NUMERIC sized to the larger integer-digit
/// count and the larger scale.
pub fn aggregate(a: &NumericType, b: &NumericType) -> NumericType {
    if a.kind == b.kind && !a.is_decimal() {
        return *a;
    }
    if a.kind == TypeKind::Double || b.kind == TypeKind::Double {
        return NumericType::new(TypeKind::Double, 0, 0);
    }
    if a.is_decimal() || b.is_decimal() {
        let scale = a.scale.max(b.scale);
        let digits = a.int_digits().max(b.int_digits());
        return NumericType::new(
            TypeKind::Numeric,
            (digits + scale).min(MAX_NUMERIC_PRECISION),
            scale,
        );
    }
    // Both integer kinds; the wider wins
    if a.kind.numeric_width() >= b.kind.numeric_width() {
        *a
    } else {
        *b
    }
}

/// Result type of an arithmetic operator over two numeric operands
pub fn combine(a: &NumericType, b: &NumericType, op: OpCode) -> Result<NumericType> {
    if a.kind == TypeKind::Double || b.kind == TypeKind::Double {
        return Ok(NumericType::new(TypeKind::Double, 0, 0));
    }

    match op {
        OpCode::Add | OpCode::Subtract => {
            if a.kind.is_integer() && b.kind.is_integer() {
                let combined = a.kind.numeric_width() + b.kind.numeric_width();
                if combined <= 32 {
                    Ok(NumericType::new(TypeKind::Integer, 0, 0))
                } else if combined <= 64 {
                    Ok(NumericType::new(TypeKind::Bigint, 0, 0))
                } else {
                    Ok(decimal_sized(a.int_digits().max(b.int_digits()) + 1, 0))
                }
            } else {
                // One carry digit over the wider integer part
                let scale = a.scale.max(b.scale);
                let digits = a.int_digits().max(b.int_digits()) + 1;
                Ok(decimal_sized(digits, scale))
            }
        }
        OpCode::Multiply => {
            if a.kind.is_integer() && b.kind.is_integer() {
                let combined = a.kind.numeric_width() + b.kind.numeric_width();
                if combined <= 32 {
                    Ok(NumericType::new(TypeKind::Integer, 0, 0))
                } else if combined <= 64 {
                    Ok(NumericType::new(TypeKind::Bigint, 0, 0))
                } else {
                    Ok(decimal_sized(a.int_digits() + b.int_digits(), 0))
                }
            } else {
                // The digit count sums both operand precisions, which leaves
                // carry headroom over the exact product width
                Ok(decimal_sized(a.precision + b.precision, a.scale + b.scale))
            }
        }
        OpCode::Divide => {
            if a.kind.is_integer() && b.kind.is_integer() {
                // Integer division keeps the wider operand kind
                Ok(aggregate(a, b))
            } else {
                // Dividend integer digits can grow by the divisor's scale
                let scale = a.scale.max(b.scale);
                let digits = a.int_digits() + b.scale;
                Ok(decimal_sized(digits, scale))
            }
        }
        OpCode::Concat => Err(SqlError::invalid_conversion(
            a.kind.name(),
            b.kind.name(),
        )),
    }
}

fn decimal_sized(int_digits: u32, scale: u32) -> NumericType {
    let scale = scale.min(MAX_NUMERIC_SCALE);
    let precision = (int_digits + scale).min(MAX_NUMERIC_PRECISION).max(1);
    NumericType::new(TypeKind::Numeric, precision, scale)
}

/// Total order over two non-null numeric values
pub fn compare(a: &SqlValue, b: &SqlValue) -> Result<std::cmp::Ordering> {
    if matches!(a, SqlValue::Double(_)) || matches!(b, SqlValue::Double(_)) {
        let x = a.as_f64().ok_or_else(|| cmp_error(a))?;
        let y = b.as_f64().ok_or_else(|| cmp_error(b))?;
        return Ok(x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal));
    }
    let x = a.as_decimal().ok_or_else(|| cmp_error(a))?;
    let y = b.as_decimal().ok_or_else(|| cmp_error(b))?;
    Ok(x.cmp(&y))
}

fn cmp_error(v: &SqlValue) -> SqlError {
    SqlError::internal(format!("non-numeric value in numeric comparison: {:?}", v))
}

/// Convert a value into the domain of `target`, enforcing range and
/// precision limits.
///
/// Narrowing from DOUBLE or DECIMAL truncates toward zero and range-checks
/// against the target kind; character sources are parsed and parse failures
/// are `InvalidConversion`.
pub fn convert(target: &NumericType, value: &SqlValue) -> Result<SqlValue> {
    match value {
        SqlValue::Null => Ok(SqlValue::Null),
        SqlValue::Integer(i) => integer_into(target, *i as i64),
        SqlValue::Bigint(l) => integer_into(target, *l),
        SqlValue::Double(d) => double_into(target, *d),
        SqlValue::Numeric(d) => decimal_into(target, *d),
        SqlValue::String(s) => parse_into(target, s),
        _ => Err(SqlError::invalid_conversion(
            format!("{:?}", value),
            target.kind.name(),
        )),
    }
}

/// Convert with no limit enforcement, for values crossing the host boundary
/// with an already-known kind
pub fn convert_to_default(kind: TypeKind, value: &SqlValue) -> Result<SqlValue> {
    let target = NumericType::default_for(kind);
    match value {
        SqlValue::Null => Ok(SqlValue::Null),
        SqlValue::Numeric(d) if target.is_decimal() => Ok(SqlValue::Numeric(*d)),
        _ => convert(&target, value),
    }
}

fn integer_into(target: &NumericType, v: i64) -> Result<SqlValue> {
    match target.kind {
        TypeKind::Tinyint | TypeKind::Smallint | TypeKind::Integer => {
            let (min, max) = integer_limits(target.kind);
            if v < min || v > max {
                return Err(SqlError::out_of_range(target.kind.name()));
            }
            Ok(SqlValue::Integer(v as i32))
        }
        TypeKind::Bigint => Ok(SqlValue::Bigint(v)),
        TypeKind::Double => Ok(SqlValue::Double(v as f64)),
        TypeKind::Numeric | TypeKind::Decimal => {
            enforce_decimal_limits(target, Decimal::from(v))
        }
        _ => Err(SqlError::internal("non-numeric target in numeric convert")),
    }
}

fn double_into(target: &NumericType, d: f64) -> Result<SqlValue> {
    match target.kind {
        TypeKind::Double => Ok(SqlValue::Double(d)),
        TypeKind::Tinyint | TypeKind::Smallint | TypeKind::Integer | TypeKind::Bigint => {
            if !d.is_finite() {
                return Err(SqlError::out_of_range(target.kind.name()));
            }
            let truncated = d.trunc();
            let (min, max) = integer_limits(target.kind);
            if truncated < min as f64 || truncated > max as f64 {
                return Err(SqlError::out_of_range(target.kind.name()));
            }
            integer_into(target, truncated as i64)
        }
        TypeKind::Numeric | TypeKind::Decimal => {
            let dec = Decimal::from_f64(d)
                .ok_or_else(|| SqlError::out_of_range(target.kind.name()))?;
            enforce_decimal_limits(target, dec)
        }
        _ => Err(SqlError::internal("non-numeric target in numeric convert")),
    }
}

fn decimal_into(target: &NumericType, d: Decimal) -> Result<SqlValue> {
    match target.kind {
        TypeKind::Numeric | TypeKind::Decimal => enforce_decimal_limits(target, d),
        TypeKind::Double => d
            .to_f64()
            .map(SqlValue::Double)
            .ok_or_else(|| SqlError::out_of_range("DOUBLE")),
        TypeKind::Tinyint | TypeKind::Smallint | TypeKind::Integer | TypeKind::Bigint => {
            let truncated = d.trunc();
            let v = truncated
                .to_i64()
                .ok_or_else(|| SqlError::out_of_range(target.kind.name()))?;
            integer_into(target, v)
        }
        _ => Err(SqlError::internal("non-numeric target in numeric convert")),
    }
}

fn parse_into(target: &NumericType, s: &str) -> Result<SqlValue> {
    let trimmed = s.trim();
    match target.kind {
        TypeKind::Double => {
            let d: f64 = trimmed
                .parse()
                .map_err(|_| SqlError::invalid_conversion("CHARACTER", "DOUBLE"))?;
            // Overflowing literals parse to infinity; NaN also has no place
            // in the DOUBLE domain
            if !d.is_finite() {
                return Err(SqlError::out_of_range("DOUBLE"));
            }
            Ok(SqlValue::Double(d))
        }
        _ => {
            let d: Decimal = trimmed
                .parse()
                .map_err(|_| SqlError::invalid_conversion("CHARACTER", target.kind.name()))?;
            if target.kind.is_integer() && d.fract() != Decimal::ZERO {
                // Integer literals must be whole; values are not rounded here
                return decimal_into(target, d.trunc());
            }
            decimal_into(target, d)
        }
    }
}

/// Rescale to the target scale (truncating the fraction toward zero) and
/// check the integer digit capacity
fn enforce_decimal_limits(target: &NumericType, d: Decimal) -> Result<SqlValue> {
    let rescaled = d.trunc_with_scale(target.scale);
    let int_part = rescaled.trunc().abs();
    let digits = decimal_int_digits(int_part);
    if digits > target.int_digits() {
        return Err(SqlError::out_of_range(format!(
            "{}({},{})",
            target.kind.name(),
            target.precision,
            target.scale
        )));
    }
    Ok(SqlValue::Numeric(rescaled))
}

fn decimal_int_digits(abs_int: Decimal) -> u32 {
    if abs_int.is_zero() {
        return 0;
    }
    let mut digits = 0u32;
    let mut v = abs_int;
    let ten = Decimal::from(10);
    while !v.is_zero() {
        v = (v / ten).trunc();
        digits += 1;
    }
    digits
}

// =========================================================================
// Arithmetic
// =========================================================================

/// Apply a binary arithmetic operator, producing a value in the domain of
/// `result_type` (which callers obtain from [`combine`])
pub fn binary_op(
    a: &SqlValue,
    b: &SqlValue,
    op: OpCode,
    result_type: &NumericType,
) -> Result<SqlValue> {
    if a.is_null() || b.is_null() {
        return Ok(SqlValue::Null);
    }

    match result_type.kind {
        TypeKind::Double => {
            let x = a.as_f64().ok_or_else(|| cmp_error(a))?;
            let y = b.as_f64().ok_or_else(|| cmp_error(b))?;
            let r = match op {
                OpCode::Add => x + y,
                OpCode::Subtract => x - y,
                OpCode::Multiply => x * y,
                OpCode::Divide => {
                    if y == 0.0 {
                        return Err(SqlError::DivisionByZero);
                    }
                    x / y
                }
                OpCode::Concat => return Err(SqlError::internal("CONCAT on numeric")),
            };
            Ok(SqlValue::Double(r))
        }
        TypeKind::Numeric | TypeKind::Decimal => {
            let x = a.as_decimal().ok_or_else(|| cmp_error(a))?;
            let y = b.as_decimal().ok_or_else(|| cmp_error(b))?;
            let r = match op {
                OpCode::Add => x.checked_add(y),
                OpCode::Subtract => x.checked_sub(y),
                OpCode::Multiply => x.checked_mul(y),
                OpCode::Divide => {
                    if y.is_zero() {
                        // SQL NULL propagation for exact-decimal division by zero
                        return Ok(SqlValue::Null);
                    }
                    x.checked_div(y)
                }
                OpCode::Concat => return Err(SqlError::internal("CONCAT on numeric")),
            };
            let r = r.ok_or_else(|| SqlError::out_of_range(result_type.kind.name()))?;
            enforce_decimal_limits(result_type, r)
        }
        _ => {
            let x = a.as_i64().ok_or_else(|| cmp_error(a))?;
            let y = b.as_i64().ok_or_else(|| cmp_error(b))?;
            let r = match op {
                OpCode::Add => x.checked_add(y),
                OpCode::Subtract => x.checked_sub(y),
                OpCode::Multiply => x.checked_mul(y),
                OpCode::Divide => {
                    if y == 0 {
                        return Err(SqlError::DivisionByZero);
                    }
                    x.checked_div(y)
                }
                OpCode::Concat => return Err(SqlError::internal("CONCAT on numeric")),
            };
            let r = r.ok_or_else(|| SqlError::out_of_range(result_type.kind.name()))?;
            integer_into(result_type, r)
        }
    }
}

/// Negate, detecting the single overflowing case (the type's minimum)
pub fn negate(value: &SqlValue, t: &NumericType) -> Result<SqlValue> {
    match value {
        SqlValue::Null => Ok(SqlValue::Null),
        SqlValue::Integer(i) => {
            let v = (*i as i64)
                .checked_neg()
                .ok_or_else(|| SqlError::out_of_range(t.kind.name()))?;
            integer_into(t, v)
        }
        SqlValue::Bigint(l) => l
            .checked_neg()
            .map(SqlValue::Bigint)
            .ok_or_else(|| SqlError::out_of_range("BIGINT")),
        SqlValue::Double(d) => Ok(SqlValue::Double(-d)),
        SqlValue::Numeric(d) => Ok(SqlValue::Numeric(-d)),
        _ => Err(SqlError::internal("negate on non-numeric value")),
    }
}

/// Absolute value, with the same minimum-value overflow detection as negate
pub fn absolute(value: &SqlValue, t: &NumericType) -> Result<SqlValue> {
    match value {
        SqlValue::Integer(i) if *i < 0 => negate(value, t),
        SqlValue::Bigint(l) if *l < 0 => negate(value, t),
        SqlValue::Double(d) => Ok(SqlValue::Double(d.abs())),
        SqlValue::Numeric(d) => Ok(SqlValue::Numeric(d.abs())),
        _ => Ok(value.clone()),
    }
}

/// Smallest integer >= value, staying in the value's own kind
pub fn ceiling(value: &SqlValue, t: &NumericType) -> Result<SqlValue> {
    match value {
        SqlValue::Null | SqlValue::Integer(_) | SqlValue::Bigint(_) => Ok(value.clone()),
        SqlValue::Double(d) => Ok(SqlValue::Double(d.ceil())),
        SqlValue::Numeric(d) => {
            let r = d.ceil();
            enforce_decimal_limits(&NumericType::new(t.kind, t.precision, 0), r)
        }
        _ => Err(SqlError::internal("ceiling on non-numeric value")),
    }
}

/// Largest integer <= value, staying in the value's own kind
pub fn floor(value: &SqlValue, t: &NumericType) -> Result<SqlValue> {
    match value {
        SqlValue::Null | SqlValue::Integer(_) | SqlValue::Bigint(_) => Ok(value.clone()),
        SqlValue::Double(d) => Ok(SqlValue::Double(d.floor())),
        SqlValue::Numeric(d) => {
            let r = d.floor();
            enforce_decimal_limits(&NumericType::new(t.kind, t.precision, 0), r)
        }
        _ => Err(SqlError::internal("floor on non-numeric value")),
    }
}

/// Truncate toward zero at the given scale; negative scale zeroes integer
/// digits
pub fn truncate(value: &SqlValue, scale: i32) -> Result<SqlValue> {
    match value {
        SqlValue::Null => Ok(SqlValue::Null),
        SqlValue::Numeric(d) => {
            if scale >= 0 {
                Ok(SqlValue::Numeric(d.trunc_with_scale(scale as u32)))
            } else {
                let factor = Decimal::from(10i64.pow((-scale) as u32));
                Ok(SqlValue::Numeric((d / factor).trunc() * factor))
            }
        }
        SqlValue::Double(d) => {
            let factor = 10f64.powi(scale);
            Ok(SqlValue::Double((d * factor).trunc() / factor))
        }
        SqlValue::Integer(_) | SqlValue::Bigint(_) if scale >= 0 => Ok(value.clone()),
        SqlValue::Integer(i) => {
            let factor = 10i64.pow((-scale) as u32);
            Ok(SqlValue::Integer(((*i as i64 / factor) * factor) as i32))
        }
        SqlValue::Bigint(l) => {
            let factor = 10i64.pow((-scale) as u32);
            Ok(SqlValue::Bigint((l / factor) * factor))
        }
        _ => Err(SqlError::internal("truncate on non-numeric value")),
    }
}

/// Round half away from zero at the given scale
pub fn round(value: &SqlValue, scale: i32) -> Result<SqlValue> {
    match value {
        SqlValue::Null => Ok(SqlValue::Null),
        SqlValue::Numeric(d) => {
            if scale >= 0 {
                Ok(SqlValue::Numeric(d.round_dp_with_strategy(
                    scale as u32,
                    RoundingStrategy::MidpointAwayFromZero,
                )))
            } else {
                let factor = Decimal::from(10i64.pow((-scale) as u32));
                let r = (d / factor)
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    * factor;
                Ok(SqlValue::Numeric(r))
            }
        }
        SqlValue::Double(d) => {
            let factor = 10f64.powi(scale);
            Ok(SqlValue::Double((d * factor).round() / factor))
        }
        SqlValue::Integer(_) | SqlValue::Bigint(_) if scale >= 0 => Ok(value.clone()),
        _ => truncate(value, scale),
    }
}

/// Render a numeric value as its canonical string form
pub fn to_string(value: &SqlValue) -> Result<String> {
    match value {
        SqlValue::Integer(i) => Ok(i.to_string()),
        SqlValue::Bigint(l) => Ok(l.to_string()),
        SqlValue::Double(d) => {
            if d.fract() == 0.0 && d.is_finite() && d.abs() < 1e15 {
                Ok(format!("{:.1}E0", d))
            } else {
                Ok(format!("{:E}", d))
            }
        }
        SqlValue::Numeric(d) => Ok(d.to_string()),
        _ => Err(SqlError::internal("non-numeric value in numeric render")),
    }
}
