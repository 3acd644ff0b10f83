//! Interval type algebra
//!
//! Year-month and day-second interval families, described by a
//! `(startField, endField, leadingPrecision, fractionPrecision)` quadruple.
//! String parsing and formatting are fixed-width per field with a
//! field-specific separator table; arithmetic works on month counts or
//! seconds+nanos and re-validates the leading field limit afterward.

use crate::kind::{IntervalField, OpCode, TypeKind};
use crate::value::{SqlInterval, SqlValue, NANOS_PER_SECOND};
use quartzdb_diagnostics::{Result, SqlError};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Default leading field width
pub const DEFAULT_LEADING_PRECISION: u32 = 2;

/// Largest declarable leading field width
pub const MAX_LEADING_PRECISION: u32 = 9;

/// Default fractional-second digits
pub const DEFAULT_FRACTION_PRECISION: u32 = 6;

/// Largest fractional-second digits
pub const MAX_FRACTION_PRECISION: u32 = 9;

/// Descriptor fields for an interval type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntervalType {
    pub start_field: IntervalField,
    pub end_field: IntervalField,
    /// Digit width of the leading field
    pub leading_precision: u32,
    /// Fractional digits of a trailing SECOND field
    pub fraction_precision: u32,
}

impl IntervalType {
    /// Create a descriptor; fields must belong to one family and be ordered
    pub fn new(
        start_field: IntervalField,
        end_field: IntervalField,
        leading_precision: u32,
        fraction_precision: u32,
    ) -> Result<Self> {
        if start_field > end_field
            || start_field.is_year_month() != end_field.is_year_month()
        {
            return Err(SqlError::internal(format!(
                "invalid interval qualifier {} TO {}",
                start_field, end_field
            )));
        }
        if leading_precision > MAX_LEADING_PRECISION
            || fraction_precision > MAX_FRACTION_PRECISION
        {
            return Err(SqlError::out_of_range("INTERVAL precision"));
        }
        Ok(Self {
            start_field,
            end_field,
            leading_precision,
            fraction_precision,
        })
    }

    /// The descriptor for a kind code with default precisions
    pub fn default_for(kind: TypeKind) -> Self {
        let (start, end) = Self::fields_of(kind);
        Self {
            start_field: start,
            end_field: end,
            leading_precision: DEFAULT_LEADING_PRECISION,
            fraction_precision: if end == IntervalField::Second {
                DEFAULT_FRACTION_PRECISION
            } else {
                0
            },
        }
    }

    /// Map a kind code to its field span
    pub fn fields_of(kind: TypeKind) -> (IntervalField, IntervalField) {
        use IntervalField::*;
        match kind {
            TypeKind::IntervalYear => (Year, Year),
            TypeKind::IntervalMonth => (Month, Month),
            TypeKind::IntervalYearToMonth => (Year, Month),
            TypeKind::IntervalDay => (Day, Day),
            TypeKind::IntervalHour => (Hour, Hour),
            TypeKind::IntervalMinute => (Minute, Minute),
            TypeKind::IntervalSecond => (Second, Second),
            TypeKind::IntervalDayToHour => (Day, Hour),
            TypeKind::IntervalDayToMinute => (Day, Minute),
            TypeKind::IntervalDayToSecond => (Day, Second),
            TypeKind::IntervalHourToMinute => (Hour, Minute),
            TypeKind::IntervalHourToSecond => (Hour, Second),
            TypeKind::IntervalMinuteToSecond => (Minute, Second),
            _ => (Second, Second),
        }
    }

    /// The kind code for this field span
    pub fn kind(&self) -> TypeKind {
        use IntervalField::*;
        match (self.start_field, self.end_field) {
            (Year, Year) => TypeKind::IntervalYear,
            (Month, Month) => TypeKind::IntervalMonth,
            (Year, Month) => TypeKind::IntervalYearToMonth,
            (Day, Day) => TypeKind::IntervalDay,
            (Hour, Hour) => TypeKind::IntervalHour,
            (Minute, Minute) => TypeKind::IntervalMinute,
            (Second, Second) => TypeKind::IntervalSecond,
            (Day, Hour) => TypeKind::IntervalDayToHour,
            (Day, Minute) => TypeKind::IntervalDayToMinute,
            (Day, Second) => TypeKind::IntervalDayToSecond,
            (Hour, Minute) => TypeKind::IntervalHourToMinute,
            (Hour, Second) => TypeKind::IntervalHourToSecond,
            (Minute, Second) => TypeKind::IntervalMinuteToSecond,
            _ => TypeKind::IntervalSecond,
        }
    }

    /// Check if this is a year-month interval type
    pub fn is_year_month(&self) -> bool {
        self.start_field.is_year_month()
    }

    /// The SQL definition text, e.g. `INTERVAL DAY(3) TO SECOND(6)`
    pub fn definition(&self) -> String {
        if self.start_field == self.end_field {
            if self.end_field == IntervalField::Second {
                format!(
                    "INTERVAL SECOND({},{})",
                    self.leading_precision, self.fraction_precision
                )
            } else {
                format!(
                    "INTERVAL {}({})",
                    self.start_field, self.leading_precision
                )
            }
        } else if self.end_field == IntervalField::Second {
            format!(
                "INTERVAL {}({}) TO SECOND({})",
                self.start_field, self.leading_precision, self.fraction_precision
            )
        } else {
            format!(
                "INTERVAL {}({}) TO {}",
                self.start_field, self.leading_precision, self.end_field
            )
        }
    }

    /// Iterate the fields of this type's span, coarsest first
    pub fn fields(&self) -> SmallVec<[IntervalField; 6]> {
        use IntervalField::*;
        [Year, Month, Day, Hour, Minute, Second]
            .into_iter()
            .filter(|f| *f >= self.start_field && *f <= self.end_field)
            .collect()
    }

    /// Exclusive magnitude limit of the leading field
    pub fn leading_limit(&self) -> i64 {
        10i64.pow(self.leading_precision.min(18))
    }
}

/// Narrowest interval type spanning both operands' field ranges; fails
/// across families
pub fn aggregate(a: &IntervalType, b: &IntervalType) -> Result<IntervalType> {
    if a.is_year_month() != b.is_year_month() {
        return Err(SqlError::invalid_conversion(
            a.definition(),
            b.definition(),
        ));
    }
    IntervalType::new(
        a.start_field.min(b.start_field),
        a.end_field.max(b.end_field),
        a.leading_precision.max(b.leading_precision),
        a.fraction_precision.max(b.fraction_precision),
    )
}

/// Result type of add/subtract between two intervals; the widened span
pub fn combine(a: &IntervalType, b: &IntervalType, op: OpCode) -> Result<IntervalType> {
    match op {
        OpCode::Add | OpCode::Subtract => aggregate(a, b),
        _ => Err(SqlError::invalid_conversion(a.definition(), b.definition())),
    }
}

/// Total order over two non-null interval values of one family
pub fn compare(a: &SqlValue, b: &SqlValue) -> Result<Ordering> {
    match (a, b) {
        (SqlValue::IntervalYearMonth(x), SqlValue::IntervalYearMonth(y)) => Ok(x.cmp(y)),
        (SqlValue::IntervalDaySecond(x), SqlValue::IntervalDaySecond(y)) => Ok(x.cmp(y)),
        _ => Err(SqlError::internal("mismatched interval values in compare")),
    }
}

// =========================================================================
// Parsing and formatting
// =========================================================================

struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn digits(&mut self) -> &'a str {
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        let (d, rest) = self.rest.split_at(end);
        self.rest = rest;
        d
    }

    fn expect(&mut self, sep: char) -> bool {
        if let Some(stripped) = self.rest.strip_prefix(sep) {
            self.rest = stripped;
            true
        } else {
            false
        }
    }
}

/// Separator preceding a field when it is not the leading field
fn separator_before(field: IntervalField) -> char {
    match field {
        IntervalField::Month => '-',
        IntervalField::Hour => ' ',
        _ => ':',
    }
}

/// Parse an interval literal body against a type.
///
/// Enforces the leading field's digit width, each trailing field's range,
/// the separator table, and truncates the fraction to the type's fractional
/// precision.
pub fn parse(t: &IntervalType, s: &str) -> Result<SqlValue> {
    let trimmed = s.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let mut scanner = Scanner { rest: body };
    let mut months: i64 = 0;
    let mut seconds: i64 = 0;
    let mut nanos: i64 = 0;

    for (i, field) in t.fields().iter().enumerate() {
        if i > 0 {
            // Day-to-hour crosses families of separators; minute/second use ':'
            let sep = separator_before(*field);
            if !scanner.expect(sep) {
                return Err(SqlError::interval_field(field.name(), scanner.rest));
            }
        }
        let digits = scanner.digits();
        if digits.is_empty() {
            return Err(SqlError::interval_field(field.name(), s));
        }
        let value: i64 = digits
            .parse()
            .map_err(|_| SqlError::interval_field(field.name(), digits))?;
        if i == 0 {
            if digits.len() as u32 > t.leading_precision {
                return Err(SqlError::interval_field(field.name(), digits));
            }
        } else {
            let limit = field.trailing_limit();
            if digits.len() > 2 || value >= limit {
                return Err(SqlError::interval_field(field.name(), digits));
            }
        }
        match field {
            IntervalField::Year => months += value * 12,
            IntervalField::Month => months += value,
            _ => seconds += value * field.unit_seconds(),
        }
    }

    if t.end_field == IntervalField::Second && scanner.expect('.') {
        let digits = scanner.digits();
        if digits.is_empty() || digits.len() as u32 > MAX_FRACTION_PRECISION {
            return Err(SqlError::interval_field("SECOND fraction", s));
        }
        let mut padded = digits.to_string();
        while padded.len() < 9 {
            padded.push('0');
        }
        nanos = padded.parse().expect("digit run");
        nanos = truncate_nanos(nanos, t.fraction_precision);
    }

    if !scanner.rest.is_empty() {
        return Err(SqlError::interval_field(t.end_field.name(), scanner.rest));
    }

    let value = if t.is_year_month() {
        if negative {
            months = -months;
        }
        SqlValue::IntervalYearMonth(months)
    } else {
        if negative {
            seconds = -seconds;
            nanos = -nanos;
        }
        SqlValue::IntervalDaySecond(SqlInterval::new(seconds, nanos))
    };
    check_limits(t, &value)?;
    Ok(value)
}

fn truncate_nanos(nanos: i64, fraction_precision: u32) -> i64 {
    let drop = 10i64.pow(9 - fraction_precision.min(9));
    nanos / drop * drop
}

/// Field values of a day-second payload, coarsest first, plus the sign
fn decompose(t: &IntervalType, value: &SqlValue) -> Result<(bool, Vec<i64>, i64)> {
    match value {
        SqlValue::IntervalYearMonth(months) => {
            let negative = *months < 0;
            let m = months.abs();
            let mut parts = Vec::new();
            for field in t.fields() {
                let v = match field {
                    IntervalField::Year => m / 12,
                    IntervalField::Month if t.start_field == IntervalField::Month => m,
                    IntervalField::Month => m % 12,
                    _ => return Err(SqlError::internal("field outside year-month family")),
                };
                parts.push(v);
            }
            Ok((negative, parts, 0))
        }
        SqlValue::IntervalDaySecond(iv) => {
            let negative = iv.seconds < 0 || iv.nanos < 0;
            let mut rem = iv.seconds.abs();
            let mut parts = Vec::new();
            for field in t.fields() {
                let unit = field.unit_seconds();
                let v = rem / unit;
                rem -= v * unit;
                parts.push(v);
            }
            Ok((negative, parts, iv.nanos.abs() as i64))
        }
        _ => Err(SqlError::internal("non-interval value in interval render")),
    }
}

/// Render an interval value in the fixed-width field format
pub fn format(t: &IntervalType, value: &SqlValue) -> Result<String> {
    if value.is_null() {
        return Ok("NULL".to_string());
    }
    let (negative, parts, nanos) = decompose(t, value)?;
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    for (i, (field, part)) in t.fields().iter().zip(parts.iter()).enumerate() {
        if i == 0 {
            out.push_str(&part.to_string());
        } else {
            out.push(separator_before(*field));
            out.push_str(&format!("{:02}", part));
        }
    }
    if t.end_field == IntervalField::Second && t.fraction_precision > 0 {
        let frac = format!("{:09}", nanos);
        out.push('.');
        out.push_str(&frac[..t.fraction_precision as usize]);
    }
    Ok(out)
}

/// Render an interval value as a SQL literal, e.g.
/// `INTERVAL '1-6' YEAR TO MONTH`
pub fn to_sql_literal(t: &IntervalType, value: &SqlValue) -> Result<String> {
    let body = format(t, value)?;
    let qualifier = t
        .definition()
        .strip_prefix("INTERVAL ")
        .unwrap_or("")
        .to_string();
    Ok(format!("INTERVAL '{}' {}", body, qualifier))
}

// =========================================================================
// Arithmetic
// =========================================================================

/// Validate the leading field magnitude against the declared width
pub fn check_limits(t: &IntervalType, value: &SqlValue) -> Result<()> {
    let leading = leading_value(t, value)?;
    if leading.abs() >= t.leading_limit() {
        return Err(SqlError::out_of_range(t.definition()));
    }
    Ok(())
}

fn leading_value(t: &IntervalType, value: &SqlValue) -> Result<i64> {
    match value {
        SqlValue::IntervalYearMonth(months) => Ok(match t.start_field {
            IntervalField::Year => months / 12,
            _ => *months,
        }),
        SqlValue::IntervalDaySecond(iv) => {
            Ok(iv.seconds / t.start_field.unit_seconds())
        }
        _ => Err(SqlError::internal("non-interval value in limit check")),
    }
}

/// Add or subtract two interval values of one family
pub fn binary_op(a: &SqlValue, b: &SqlValue, op: OpCode, t: &IntervalType) -> Result<SqlValue> {
    if a.is_null() || b.is_null() {
        return Ok(SqlValue::Null);
    }
    let result = match (a, b, op) {
        (SqlValue::IntervalYearMonth(x), SqlValue::IntervalYearMonth(y), OpCode::Add) => {
            SqlValue::IntervalYearMonth(
                x.checked_add(*y)
                    .ok_or_else(|| SqlError::out_of_range(t.definition()))?,
            )
        }
        (SqlValue::IntervalYearMonth(x), SqlValue::IntervalYearMonth(y), OpCode::Subtract) => {
            SqlValue::IntervalYearMonth(
                x.checked_sub(*y)
                    .ok_or_else(|| SqlError::out_of_range(t.definition()))?,
            )
        }
        (SqlValue::IntervalDaySecond(x), SqlValue::IntervalDaySecond(y), OpCode::Add) => {
            SqlValue::IntervalDaySecond(SqlInterval::new(
                x.seconds + y.seconds,
                x.nanos as i64 + y.nanos as i64,
            ))
        }
        (SqlValue::IntervalDaySecond(x), SqlValue::IntervalDaySecond(y), OpCode::Subtract) => {
            SqlValue::IntervalDaySecond(SqlInterval::new(
                x.seconds - y.seconds,
                x.nanos as i64 - y.nanos as i64,
            ))
        }
        _ => {
            return Err(SqlError::invalid_conversion(
                t.definition(),
                "interval operand",
            ));
        }
    };
    check_limits(t, &result)?;
    Ok(result)
}

/// Negate an interval value
pub fn negate(value: &SqlValue, t: &IntervalType) -> Result<SqlValue> {
    let result = match value {
        SqlValue::Null => return Ok(SqlValue::Null),
        SqlValue::IntervalYearMonth(m) => SqlValue::IntervalYearMonth(
            m.checked_neg()
                .ok_or_else(|| SqlError::out_of_range(t.definition()))?,
        ),
        SqlValue::IntervalDaySecond(iv) => SqlValue::IntervalDaySecond(SqlInterval::new(
            -iv.seconds,
            -(iv.nanos as i64),
        )),
        _ => return Err(SqlError::internal("non-interval value in negate")),
    };
    check_limits(t, &result)?;
    Ok(result)
}

/// Multiply or divide an interval by a scalar number.
///
/// Defined over the extractable-seconds (or months) representation; the
/// leading field limit is re-validated on the result.
pub fn scalar_op(value: &SqlValue, factor: Decimal, op: OpCode, t: &IntervalType) -> Result<SqlValue> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    if op == OpCode::Divide && factor.is_zero() {
        return Err(SqlError::DivisionByZero);
    }

    let result = match value {
        SqlValue::IntervalYearMonth(months) => {
            let base = Decimal::from(*months);
            let r = match op {
                OpCode::Multiply => base.checked_mul(factor),
                OpCode::Divide => base.checked_div(factor),
                _ => return Err(SqlError::internal("scalar op must be multiply or divide")),
            }
            .ok_or_else(|| SqlError::out_of_range(t.definition()))?;
            let m = r
                .trunc()
                .to_i64()
                .ok_or_else(|| SqlError::out_of_range(t.definition()))?;
            SqlValue::IntervalYearMonth(m)
        }
        SqlValue::IntervalDaySecond(iv) => {
            let base = Decimal::from(iv.seconds)
                + Decimal::from(iv.nanos) / Decimal::from(NANOS_PER_SECOND);
            let r = match op {
                OpCode::Multiply => base.checked_mul(factor),
                OpCode::Divide => base.checked_div(factor),
                _ => return Err(SqlError::internal("scalar op must be multiply or divide")),
            }
            .ok_or_else(|| SqlError::out_of_range(t.definition()))?;
            let secs = r
                .trunc()
                .to_i64()
                .ok_or_else(|| SqlError::out_of_range(t.definition()))?;
            let frac = r - r.trunc();
            let nanos = (frac * Decimal::from(NANOS_PER_SECOND))
                .trunc()
                .to_i64()
                .unwrap_or(0);
            SqlValue::IntervalDaySecond(SqlInterval::new(secs, nanos))
        }
        _ => return Err(SqlError::internal("non-interval value in scalar op")),
    };
    check_limits(t, &result)?;
    Ok(result)
}

/// Convert a numeric count of the leading field's units into an interval
/// value of a single-field type
pub fn from_leading_units(t: &IntervalType, units: i64) -> Result<SqlValue> {
    if t.start_field != t.end_field {
        return Err(SqlError::invalid_conversion("NUMERIC", t.definition()));
    }
    let value = match t.start_field {
        IntervalField::Year => SqlValue::IntervalYearMonth(
            units
                .checked_mul(12)
                .ok_or_else(|| SqlError::out_of_range(t.definition()))?,
        ),
        IntervalField::Month => SqlValue::IntervalYearMonth(units),
        field => SqlValue::IntervalDaySecond(SqlInterval::new(
            units
                .checked_mul(field.unit_seconds())
                .ok_or_else(|| SqlError::out_of_range(t.definition()))?,
            0,
        )),
    };
    check_limits(t, &value)?;
    Ok(value)
}

/// Extract the whole count of the leading field's units from an interval
/// value of a single-field type
pub fn to_leading_units(t: &IntervalType, value: &SqlValue) -> Result<i64> {
    if t.start_field != t.end_field {
        return Err(SqlError::invalid_conversion(t.definition(), "NUMERIC"));
    }
    leading_value(t, value)
}
