//! DateTime calendar engine
//!
//! The five datetime kinds over the canonical `(seconds, nanos,
//! zone_offset_seconds)` payload. Without-zone values hold wall-clock
//! seconds encoded as if UTC; with-zone values hold true UTC seconds plus
//! the offset. Conversions between kinds follow a fixed state machine,
//! interval arithmetic dispatches on family with a last-day-of-month clamp
//! for calendar months, and the period predicates reduce to ordered
//! comparisons over normalized boundary pairs.

use crate::kind::{DateTimeField, TypeKind};
use crate::session::{SessionContext, MAX_ZONE_OFFSET_SECONDS};
use crate::value::{SqlDateTime, SqlInterval, SqlValue, NANOS_PER_SECOND, SECONDS_PER_DAY};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use quartzdb_diagnostics::{Result, SqlError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Largest fractional-second digits
pub const MAX_DATETIME_SCALE: u32 = 9;

/// Default TIMESTAMP fractional digits
pub const DEFAULT_TIMESTAMP_SCALE: u32 = 6;

/// Default TIME fractional digits
pub const DEFAULT_TIME_SCALE: u32 = 0;

/// Descriptor fields for a datetime type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateTimeType {
    pub kind: TypeKind,
    /// Fractional-second digits; always 0 for DATE
    pub scale: u32,
}

impl DateTimeType {
    pub fn new(kind: TypeKind, scale: u32) -> Result<Self> {
        if !kind.is_datetime() {
            return Err(SqlError::internal(format!(
                "{} is not a datetime kind",
                kind
            )));
        }
        if scale > MAX_DATETIME_SCALE || (kind == TypeKind::Date && scale != 0) {
            return Err(SqlError::out_of_range(kind.name()));
        }
        Ok(Self { kind, scale })
    }

    /// The descriptor for a kind code with its default scale
    pub fn default_for(kind: TypeKind) -> Self {
        let scale = match kind {
            TypeKind::Timestamp | TypeKind::TimestampWithZone => DEFAULT_TIMESTAMP_SCALE,
            TypeKind::Time | TypeKind::TimeWithZone => DEFAULT_TIME_SCALE,
            _ => 0,
        };
        Self { kind, scale }
    }

    /// The SQL definition text, e.g. `TIMESTAMP(6) WITH TIME ZONE`
    pub fn definition(&self) -> String {
        match self.kind {
            TypeKind::Date => "DATE".to_string(),
            TypeKind::Time => format!("TIME({})", self.scale),
            TypeKind::TimeWithZone => format!("TIME({}) WITH TIME ZONE", self.scale),
            TypeKind::Timestamp => format!("TIMESTAMP({})", self.scale),
            _ => format!("TIMESTAMP({}) WITH TIME ZONE", self.scale),
        }
    }

    fn has_date(&self) -> bool {
        !matches!(self.kind, TypeKind::Time | TypeKind::TimeWithZone)
    }

    fn has_time(&self) -> bool {
        self.kind != TypeKind::Date
    }

    fn with_zone(&self) -> bool {
        self.kind.is_datetime_with_zone()
    }
}

/// Widest datetime type covering both operands.
///
/// DATE and TIME do not aggregate with each other directly; either widens
/// to the timestamp family. WITH TIME ZONE propagates from either side.
pub fn aggregate(a: &DateTimeType, b: &DateTimeType) -> Result<DateTimeType> {
    let scale = a.scale.max(b.scale);
    if a.kind == b.kind {
        return DateTimeType::new(a.kind, scale);
    }
    let zoned = a.with_zone() || b.with_zone();
    let time_only = !a.has_date() && !b.has_date();
    if time_only {
        let kind = if zoned {
            TypeKind::TimeWithZone
        } else {
            TypeKind::Time
        };
        return DateTimeType::new(kind, scale);
    }
    let date_only = !a.has_time() && !b.has_time();
    if date_only {
        return DateTimeType::new(TypeKind::Date, 0);
    }
    if (a.kind == TypeKind::Date && !b.has_date()) || (b.kind == TypeKind::Date && !a.has_date())
    {
        return Err(SqlError::invalid_conversion(a.definition(), b.definition()));
    }
    let kind = if zoned {
        TypeKind::TimestampWithZone
    } else {
        TypeKind::Timestamp
    };
    DateTimeType::new(kind, scale)
}

/// Total order over datetime values; with-zone values compare by instant
pub fn compare(a: &SqlDateTime, b: &SqlDateTime) -> Ordering {
    a.instant_cmp(b)
}

fn truncate_nanos(nanos: u32, scale: u32) -> u32 {
    let drop = 10u32.pow(9 - scale.min(9));
    nanos / drop * drop
}

fn to_naive(seconds: i64, nanos: u32) -> Result<NaiveDateTime> {
    chrono::DateTime::from_timestamp(seconds, nanos)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| SqlError::datetime_format("instant outside the representable range"))
}

fn from_naive(dt: NaiveDateTime) -> (i64, u32) {
    let utc = dt.and_utc();
    (utc.timestamp(), utc.timestamp_subsec_nanos())
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

// =========================================================================
// Kind state machine
// =========================================================================

/// Convert a datetime payload from one datetime kind to another.
///
/// Zone removal folds the offset into the wall clock; zone attachment asks
/// the session for the offset at the value's instant. DATE to TIMESTAMP sets
/// midnight; TIMESTAMP to DATE truncates to midnight of the wall-clock day.
pub fn convert(
    target: &DateTimeType,
    source_kind: TypeKind,
    value: &SqlDateTime,
    ctx: &dyn SessionContext,
) -> Result<SqlValue> {
    if !source_kind.is_datetime() {
        return Err(SqlError::invalid_conversion(
            source_kind.name(),
            target.definition(),
        ));
    }
    let source_time_only = matches!(source_kind, TypeKind::Time | TypeKind::TimeWithZone);
    if (target.kind == TypeKind::Date && source_time_only)
        || (!target.has_date() && source_kind == TypeKind::Date)
    {
        return Err(SqlError::invalid_conversion(
            source_kind.name(),
            target.definition(),
        ));
    }

    // Fold any zone into a wall clock first
    let wall_seconds = value.seconds + value.zone_offset_seconds as i64;
    let nanos = truncate_nanos(value.nanos, target.scale);

    let (mut seconds, nanos) = match (source_time_only, target.has_date()) {
        // Time-of-day to timestamp: today's date from the session clock
        (true, true) => {
            let now = ctx.current_timestamp();
            let today = (now.seconds + now.zone_offset_seconds as i64)
                .div_euclid(SECONDS_PER_DAY)
                * SECONDS_PER_DAY;
            (today + wall_seconds.rem_euclid(SECONDS_PER_DAY), nanos)
        }
        // Timestamp or date to time-of-day
        (false, false) => (wall_seconds.rem_euclid(SECONDS_PER_DAY), nanos),
        _ => (wall_seconds, nanos),
    };

    if target.kind == TypeKind::Date {
        seconds = seconds.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY;
        return Ok(SqlValue::DateTime(SqlDateTime {
            seconds,
            nanos: 0,
            zone_offset_seconds: 0,
        }));
    }

    if target.with_zone() {
        let offset = ctx.zone_offset_seconds(seconds);
        let utc = seconds - offset as i64;
        let utc = if target.has_date() {
            utc
        } else {
            utc.rem_euclid(SECONDS_PER_DAY)
        };
        Ok(SqlValue::DateTime(SqlDateTime {
            seconds: utc,
            nanos,
            zone_offset_seconds: offset,
        }))
    } else {
        let seconds = if target.has_date() {
            seconds
        } else {
            seconds.rem_euclid(SECONDS_PER_DAY)
        };
        Ok(SqlValue::DateTime(SqlDateTime {
            seconds,
            nanos,
            zone_offset_seconds: 0,
        }))
    }
}

// =========================================================================
// Interval arithmetic
// =========================================================================

/// Add calendar months to a datetime value.
///
/// If the source day-of-month does not exist in the result month, the day is
/// clamped to the result month's last day.
pub fn add_months(t: &DateTimeType, value: &SqlDateTime, months: i64) -> Result<SqlValue> {
    if !t.has_date() {
        return Err(SqlError::invalid_conversion("INTERVAL MONTH", t.definition()));
    }
    let wall = value.seconds + value.zone_offset_seconds as i64;
    let naive = to_naive(wall, value.nanos)?;
    let total = naive.year() as i64 * 12 + naive.month0() as i64 + months;
    let year = total.div_euclid(12);
    let month0 = total.rem_euclid(12) as u32;
    let year = i32::try_from(year)
        .map_err(|_| SqlError::out_of_range(t.definition()))?;
    let day = naive.day().min(days_in_month(year, month0 + 1));
    let date = NaiveDate::from_ymd_opt(year, month0 + 1, day)
        .ok_or_else(|| SqlError::out_of_range(t.definition()))?;
    let (seconds, nanos) = from_naive(date.and_time(naive.time()));
    Ok(SqlValue::DateTime(SqlDateTime {
        seconds: seconds - value.zone_offset_seconds as i64,
        nanos,
        zone_offset_seconds: value.zone_offset_seconds,
    }))
}

/// Add a day-second interval; nanos carry into seconds
pub fn add_seconds(t: &DateTimeType, value: &SqlDateTime, interval: &SqlInterval) -> Result<SqlValue> {
    let total = value.nanos as i64 + interval.nanos as i64;
    let (carry, nanos) = (total.div_euclid(NANOS_PER_SECOND), total.rem_euclid(NANOS_PER_SECOND));
    let seconds = value
        .seconds
        .checked_add(interval.seconds)
        .and_then(|s| s.checked_add(carry))
        .ok_or_else(|| SqlError::out_of_range(t.definition()))?;
    let seconds = if t.has_date() {
        seconds
    } else {
        seconds.rem_euclid(SECONDS_PER_DAY)
    };
    Ok(SqlValue::DateTime(SqlDateTime {
        seconds,
        nanos: truncate_nanos(nanos as u32, t.scale),
        zone_offset_seconds: value.zone_offset_seconds,
    }))
}

/// Add or subtract an interval value, dispatching on its family
pub fn add_interval(
    t: &DateTimeType,
    value: &SqlDateTime,
    interval: &SqlValue,
    subtract: bool,
) -> Result<SqlValue> {
    match interval {
        SqlValue::Null => Ok(SqlValue::Null),
        SqlValue::IntervalYearMonth(months) => {
            add_months(t, value, if subtract { -months } else { *months })
        }
        SqlValue::IntervalDaySecond(iv) => {
            let iv = if subtract {
                SqlInterval::new(-iv.seconds, -(iv.nanos as i64))
            } else {
                *iv
            };
            add_seconds(t, value, &iv)
        }
        _ => Err(SqlError::internal("non-interval operand in datetime add")),
    }
}

// =========================================================================
// Truncation, rounding, extraction
// =========================================================================

fn truncated_wall(field: DateTimeField, wall: NaiveDateTime) -> Result<NaiveDateTime> {
    let date = wall.date();
    let midnight = |d: NaiveDate| d.and_hms_opt(0, 0, 0).expect("midnight");
    let out = match field {
        DateTimeField::Year => midnight(
            NaiveDate::from_ymd_opt(date.year(), 1, 1).expect("jan 1"),
        ),
        DateTimeField::Quarter => {
            let month = (date.month0() / 3) * 3 + 1;
            midnight(NaiveDate::from_ymd_opt(date.year(), month, 1).expect("quarter start"))
        }
        DateTimeField::Month => midnight(
            NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("month start"),
        ),
        DateTimeField::Week => {
            // ISO week starts Monday
            let back = date.weekday().num_days_from_monday() as i64;
            midnight(date - chrono::Duration::days(back))
        }
        DateTimeField::Day => midnight(date),
        DateTimeField::Hour => wall
            .with_minute(0)
            .and_then(|w| w.with_second(0))
            .and_then(|w| w.with_nanosecond(0))
            .expect("hour trunc"),
        DateTimeField::Minute => wall
            .with_second(0)
            .and_then(|w| w.with_nanosecond(0))
            .expect("minute trunc"),
        DateTimeField::Second => wall.with_nanosecond(0).expect("second trunc"),
        DateTimeField::Millisecond => wall
            .with_nanosecond(wall.nanosecond() / 1_000_000 * 1_000_000)
            .expect("millisecond trunc"),
        _ => {
            return Err(SqlError::internal(format!(
                "cannot truncate to field {}",
                field
            )));
        }
    };
    Ok(out)
}

fn field_step(field: DateTimeField, wall: NaiveDateTime) -> Result<NaiveDateTime> {
    let next = match field {
        DateTimeField::Year => wall.with_year(wall.year() + 1),
        DateTimeField::Quarter | DateTimeField::Month => {
            let months = if field == DateTimeField::Quarter { 3 } else { 1 };
            let total = wall.year() as i64 * 12 + wall.month0() as i64 + months;
            NaiveDate::from_ymd_opt(
                total.div_euclid(12) as i32,
                total.rem_euclid(12) as u32 + 1,
                1,
            )
            .map(|d| d.and_time(wall.time()))
        }
        DateTimeField::Week => wall.checked_add_signed(chrono::Duration::days(7)),
        DateTimeField::Day => wall.checked_add_signed(chrono::Duration::days(1)),
        DateTimeField::Hour => wall.checked_add_signed(chrono::Duration::hours(1)),
        DateTimeField::Minute => wall.checked_add_signed(chrono::Duration::minutes(1)),
        DateTimeField::Second => wall.checked_add_signed(chrono::Duration::seconds(1)),
        DateTimeField::Millisecond => wall.checked_add_signed(chrono::Duration::milliseconds(1)),
        _ => None,
    };
    next.ok_or_else(|| SqlError::datetime_format("instant outside the representable range"))
}

/// Zero out every calendar field finer than `field`
pub fn truncate_to(t: &DateTimeType, value: &SqlDateTime, field: DateTimeField) -> Result<SqlValue> {
    let wall = to_naive(value.seconds + value.zone_offset_seconds as i64, value.nanos)?;
    let out = truncated_wall(field, wall)?;
    let (seconds, nanos) = from_naive(out);
    let seconds = if t.has_date() {
        seconds - value.zone_offset_seconds as i64
    } else {
        (seconds - value.zone_offset_seconds as i64).rem_euclid(SECONDS_PER_DAY)
    };
    Ok(SqlValue::DateTime(SqlDateTime {
        seconds,
        nanos,
        zone_offset_seconds: value.zone_offset_seconds,
    }))
}

/// Round to a calendar field; half-way or later rolls to the next boundary
pub fn round_to(t: &DateTimeType, value: &SqlDateTime, field: DateTimeField) -> Result<SqlValue> {
    let wall = to_naive(value.seconds + value.zone_offset_seconds as i64, value.nanos)?;
    let lower = truncated_wall(field, wall)?;
    let upper = field_step(field, lower)?;
    let lower_nanos = lower.and_utc().timestamp() as i128 * NANOS_PER_SECOND as i128;
    let upper_nanos = upper.and_utc().timestamp() as i128 * NANOS_PER_SECOND as i128;
    let value_nanos = wall.and_utc().timestamp() as i128 * NANOS_PER_SECOND as i128
        + wall.nanosecond() as i128;
    let pick = if value_nanos * 2 >= lower_nanos + upper_nanos {
        upper
    } else {
        lower
    };
    let (seconds, nanos) = from_naive(pick);
    let seconds = if t.has_date() {
        seconds - value.zone_offset_seconds as i64
    } else {
        (seconds - value.zone_offset_seconds as i64).rem_euclid(SECONDS_PER_DAY)
    };
    Ok(SqlValue::DateTime(SqlDateTime {
        seconds,
        nanos,
        zone_offset_seconds: value.zone_offset_seconds,
    }))
}

/// Extract a calendar or zone field from a datetime value
pub fn extract(t: &DateTimeType, value: &SqlDateTime, field: DateTimeField) -> Result<SqlValue> {
    let wall_seconds = value.seconds + value.zone_offset_seconds as i64;
    let wall = to_naive(wall_seconds, value.nanos)?;
    let out = match field {
        DateTimeField::Year => SqlValue::Integer(wall.year()),
        DateTimeField::Quarter => SqlValue::Integer(wall.month0() as i32 / 3 + 1),
        DateTimeField::Month => SqlValue::Integer(wall.month() as i32),
        DateTimeField::Week | DateTimeField::WeekOfYear => {
            SqlValue::Integer(wall.iso_week().week() as i32)
        }
        DateTimeField::Day => SqlValue::Integer(wall.day() as i32),
        DateTimeField::Hour => SqlValue::Integer(wall.hour() as i32),
        DateTimeField::Minute => SqlValue::Integer(wall.minute() as i32),
        DateTimeField::Second => {
            let whole = Decimal::from(wall.second());
            let frac = Decimal::new(value.nanos as i64, 9);
            SqlValue::Numeric(whole + frac)
        }
        DateTimeField::Millisecond => SqlValue::Integer((value.nanos / 1_000_000) as i32),
        // 1 = Sunday, matching the SQL convention
        DateTimeField::DayOfWeek => {
            SqlValue::Integer(wall.weekday().num_days_from_sunday() as i32 + 1)
        }
        DateTimeField::DayOfYear => SqlValue::Integer(wall.ordinal() as i32),
        DateTimeField::SecondsMidnight => {
            SqlValue::Integer(wall_seconds.rem_euclid(SECONDS_PER_DAY) as i32)
        }
        DateTimeField::TimezoneHour => {
            if !t.with_zone() {
                return Err(SqlError::invalid_conversion(t.definition(), field.to_string()));
            }
            SqlValue::Integer(value.zone_offset_seconds / 3_600)
        }
        DateTimeField::TimezoneMinute => {
            if !t.with_zone() {
                return Err(SqlError::invalid_conversion(t.definition(), field.to_string()));
            }
            SqlValue::Integer(value.zone_offset_seconds % 3_600 / 60)
        }
        DateTimeField::Epoch => SqlValue::Bigint(value.seconds),
    };
    Ok(out)
}

// =========================================================================
// Period predicates
// =========================================================================

/// An ordered pair of datetime boundaries; construction swaps out-of-order
/// boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: SqlDateTime,
    pub end: SqlDateTime,
}

impl Period {
    pub fn new(a: SqlDateTime, b: SqlDateTime) -> Self {
        if a.instant_cmp(&b) == Ordering::Greater {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    fn is_instant(&self) -> bool {
        self.start.instant_cmp(&self.end) == Ordering::Equal
    }
}

/// True when the periods share more than a single touching point
pub fn overlaps(a: &Period, b: &Period) -> bool {
    a.end.instant_cmp(&b.start) == Ordering::Greater
        && b.end.instant_cmp(&a.start) == Ordering::Greater
}

/// True when `a` ends at or before `b` starts
pub fn precedes(a: &Period, b: &Period) -> bool {
    a.end.instant_cmp(&b.start) != Ordering::Greater
}

/// True when `a` ends exactly where `b` starts
pub fn immediately_precedes(a: &Period, b: &Period) -> bool {
    a.end.instant_cmp(&b.start) == Ordering::Equal
}

/// True when `a` starts at or after `b` ends
pub fn succeeds(a: &Period, b: &Period) -> bool {
    a.start.instant_cmp(&b.end) != Ordering::Less
}

/// True when both boundary pairs coincide
pub fn equals(a: &Period, b: &Period) -> bool {
    a.start.instant_cmp(&b.start) == Ordering::Equal
        && a.end.instant_cmp(&b.end) == Ordering::Equal
}

/// True when `b` lies within `a`.
///
/// A single instant exactly at `a`'s end boundary is not contained.
pub fn contains(a: &Period, b: &Period) -> bool {
    if b.is_instant() && b.start.instant_cmp(&a.end) == Ordering::Equal {
        return false;
    }
    a.start.instant_cmp(&b.start) != Ordering::Greater
        && b.end.instant_cmp(&a.end) != Ordering::Greater
}

// =========================================================================
// Parsing and formatting
// =========================================================================

fn parse_date_part(s: &str) -> Result<NaiveDate> {
    let mut parts = s.splitn(3, '-');
    let bad = || SqlError::datetime_format(s);
    let year: i32 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let month: u32 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let day: u32 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(bad)
}

fn parse_time_part(s: &str, scale: u32) -> Result<(i64, u32)> {
    let bad = || SqlError::datetime_format(s);
    let (clock, fraction) = match s.split_once('.') {
        Some((c, f)) => (c, Some(f)),
        None => (s, None),
    };
    let mut parts = clock.splitn(3, ':');
    let hour: i64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let minute: i64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let second: i64 = parts.next().unwrap_or("0").parse().map_err(|_| bad())?;
    if !(0..24).contains(&hour) || !(0..60).contains(&minute) || !(0..60).contains(&second) {
        return Err(bad());
    }
    let nanos = match fraction {
        Some(f) if f.is_empty() || f.len() > 9 || !f.bytes().all(|b| b.is_ascii_digit()) => {
            return Err(bad());
        }
        Some(f) => {
            let mut padded = f.to_string();
            while padded.len() < 9 {
                padded.push('0');
            }
            truncate_nanos(padded.parse().expect("digit run"), scale)
        }
        None => 0,
    };
    Ok((hour * 3_600 + minute * 60 + second, nanos))
}

/// Split an optional trailing zone designator off a literal body
fn split_zone(s: &str) -> Result<(&str, Option<i32>)> {
    if let Some(body) = s.strip_suffix('Z') {
        return Ok((body.trim_end(), Some(0)));
    }
    let first_colon = match s.find(':') {
        Some(i) => i,
        None => return Ok((s, None)),
    };
    let sign_pos = s.rfind(['+', '-']).filter(|&i| i > first_colon);
    let Some(pos) = sign_pos else {
        return Ok((s, None));
    };
    let (body, zone) = s.split_at(pos);
    let negative = zone.starts_with('-');
    let digits = &zone[1..];
    let bad = || SqlError::datetime_format(s);
    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (
            h.parse::<i32>().map_err(|_| bad())?,
            m.parse::<i32>().map_err(|_| bad())?,
        ),
        None => (digits.parse::<i32>().map_err(|_| bad())?, 0),
    };
    let mut offset = hours * 3_600 + minutes * 60;
    if negative {
        offset = -offset;
    }
    if offset.abs() > MAX_ZONE_OFFSET_SECONDS {
        return Err(bad());
    }
    Ok((body.trim_end(), Some(offset)))
}

/// Parse an ISO-style datetime literal body for a target type.
///
/// An explicit zone designator is honored for WITH TIME ZONE targets and
/// folded away for zoneless ones; absent a designator the session's offset
/// applies to zoned targets.
pub fn parse(t: &DateTimeType, s: &str, ctx: &dyn SessionContext) -> Result<SqlValue> {
    let trimmed = s.trim();
    let (body, explicit_zone) = split_zone(trimmed)?;

    let (wall_seconds, nanos) = match t.kind {
        TypeKind::Date => {
            let date = parse_date_part(body)?;
            let (seconds, _) = from_naive(date.and_hms_opt(0, 0, 0).expect("midnight"));
            (seconds, 0)
        }
        TypeKind::Time | TypeKind::TimeWithZone => parse_time_part(body, t.scale)?,
        _ => {
            let split_at = body
                .find([' ', 'T'])
                .ok_or_else(|| SqlError::datetime_format(s))?;
            let date = parse_date_part(&body[..split_at])?;
            let (tod, nanos) = parse_time_part(body[split_at + 1..].trim_start(), t.scale)?;
            let (midnight, _) = from_naive(date.and_hms_opt(0, 0, 0).expect("midnight"));
            (midnight + tod, nanos)
        }
    };

    if t.with_zone() {
        let offset = match explicit_zone {
            Some(z) => z,
            None => ctx.zone_offset_seconds(wall_seconds),
        };
        let utc = wall_seconds - offset as i64;
        let utc = if t.has_date() {
            utc
        } else {
            utc.rem_euclid(SECONDS_PER_DAY)
        };
        Ok(SqlValue::DateTime(SqlDateTime {
            seconds: utc,
            nanos,
            zone_offset_seconds: offset,
        }))
    } else {
        Ok(SqlValue::DateTime(SqlDateTime {
            seconds: wall_seconds,
            nanos,
            zone_offset_seconds: 0,
        }))
    }
}

fn format_zone(offset: i32) -> String {
    let sign = if offset < 0 { '-' } else { '+' };
    let abs = offset.abs();
    format!("{}{:02}:{:02}", sign, abs / 3_600, abs % 3_600 / 60)
}

/// Render a datetime value in ISO style with the type's fractional digits
pub fn format(t: &DateTimeType, value: &SqlDateTime) -> Result<String> {
    let wall_seconds = value.seconds + value.zone_offset_seconds as i64;
    let mut out = String::new();
    match t.kind {
        TypeKind::Date => {
            let naive = to_naive(wall_seconds, 0)?;
            out.push_str(&naive.format("%Y-%m-%d").to_string());
        }
        TypeKind::Time | TypeKind::TimeWithZone => {
            let tod = wall_seconds.rem_euclid(SECONDS_PER_DAY);
            out.push_str(&format!(
                "{:02}:{:02}:{:02}",
                tod / 3_600,
                tod % 3_600 / 60,
                tod % 60
            ));
        }
        _ => {
            let naive = to_naive(wall_seconds, 0)?;
            out.push_str(&naive.format("%Y-%m-%d %H:%M:%S").to_string());
        }
    }
    if t.scale > 0 && t.kind != TypeKind::Date {
        let frac = format!("{:09}", truncate_nanos(value.nanos, t.scale));
        out.push('.');
        out.push_str(&frac[..t.scale as usize]);
    }
    if t.with_zone() {
        out.push_str(&format_zone(value.zone_offset_seconds));
    }
    Ok(out)
}

/// Render a datetime value as a SQL literal, e.g. `DATE '2024-01-31'`
pub fn to_sql_literal(t: &DateTimeType, value: &SqlDateTime) -> Result<String> {
    let keyword = match t.kind {
        TypeKind::Date => "DATE",
        TypeKind::Time | TypeKind::TimeWithZone => "TIME",
        _ => "TIMESTAMP",
    };
    Ok(format!("{} '{}'", keyword, format(t, value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FixedOffsetSession;
    use pretty_assertions::assert_eq;

    fn ts(scale: u32) -> DateTimeType {
        DateTimeType::new(TypeKind::Timestamp, scale).unwrap()
    }

    fn parse_ts(s: &str) -> SqlDateTime {
        let ctx = FixedOffsetSession::utc();
        match parse(&ts(6), s, &ctx).unwrap() {
            SqlValue::DateTime(dt) => dt,
            other => panic!("expected datetime, got {:?}", other),
        }
    }

    #[test]
    fn test_last_day_of_month_clamp() {
        let jan31 = parse_ts("2024-01-31 00:00:00");
        let result = add_months(&ts(6), &jan31, 1).unwrap();
        assert_eq!(
            format(&ts(0), &match result {
                SqlValue::DateTime(dt) => dt,
                _ => unreachable!(),
            })
            .unwrap(),
            "2024-02-29 00:00:00"
        );
    }

    #[test]
    fn test_month_add_keeps_literal_day_when_valid() {
        let jan15 = parse_ts("2024-01-15 10:30:00");
        let result = add_months(&ts(0), &jan15, 13).unwrap();
        let SqlValue::DateTime(dt) = result else { unreachable!() };
        assert_eq!(format(&ts(0), &dt).unwrap(), "2025-02-15 10:30:00");
    }

    #[test]
    fn test_day_second_add_carries_nanos() {
        let base = parse_ts("2024-06-01 23:59:59.600000");
        let iv = SqlInterval::new(0, 500_000_000);
        let SqlValue::DateTime(dt) = add_seconds(&ts(6), &base, &iv).unwrap() else {
            unreachable!()
        };
        assert_eq!(format(&ts(1), &dt).unwrap(), "2024-06-02 00:00:00.1");
    }

    #[test]
    fn test_date_timestamp_round_trip() {
        let ctx = FixedOffsetSession::utc();
        let date_type = DateTimeType::new(TypeKind::Date, 0).unwrap();
        let noon = parse_ts("2024-03-10 12:34:56");
        let SqlValue::DateTime(d) = convert(&date_type, TypeKind::Timestamp, &noon, &ctx).unwrap()
        else {
            unreachable!()
        };
        assert_eq!(format(&date_type, &d).unwrap(), "2024-03-10");
        // Back to timestamp: midnight
        let SqlValue::DateTime(t2) = convert(&ts(0), TypeKind::Date, &d, &ctx).unwrap() else {
            unreachable!()
        };
        assert_eq!(format(&ts(0), &t2).unwrap(), "2024-03-10 00:00:00");
    }

    #[test]
    fn test_zone_attach_and_fold() {
        let ctx = FixedOffsetSession::new(5 * 3_600 + 30 * 60);
        let zoned_type = DateTimeType::new(TypeKind::TimestampWithZone, 0).unwrap();
        let local = parse_ts("2024-03-10 12:00:00");
        let SqlValue::DateTime(z) =
            convert(&zoned_type, TypeKind::Timestamp, &local, &ctx).unwrap()
        else {
            unreachable!()
        };
        assert_eq!(z.zone_offset_seconds, 5 * 3_600 + 30 * 60);
        assert_eq!(format(&zoned_type, &z).unwrap(), "2024-03-10 12:00:00+05:30");
        // Folding the zone away restores the wall clock
        let SqlValue::DateTime(back) =
            convert(&ts(0), TypeKind::TimestampWithZone, &z, &ctx).unwrap()
        else {
            unreachable!()
        };
        assert_eq!(format(&ts(0), &back).unwrap(), "2024-03-10 12:00:00");
    }

    #[test]
    fn test_parse_explicit_zone() {
        let ctx = FixedOffsetSession::utc();
        let zoned = DateTimeType::new(TypeKind::TimestampWithZone, 3).unwrap();
        let SqlValue::DateTime(v) = parse(&zoned, "2024-03-10 12:00:00.125-08:00", &ctx).unwrap()
        else {
            unreachable!()
        };
        assert_eq!(v.zone_offset_seconds, -8 * 3_600);
        assert_eq!(format(&zoned, &v).unwrap(), "2024-03-10 12:00:00.125-08:00");
    }

    #[test]
    fn test_parse_rejects_bad_literals() {
        let ctx = FixedOffsetSession::utc();
        assert!(parse(&ts(0), "2024-02-30 00:00:00", &ctx).is_err());
        assert!(parse(&ts(0), "2024-01-01", &ctx).is_err());
        assert!(parse(&ts(0), "2024-01-01 25:00:00", &ctx).is_err());
        let time = DateTimeType::new(TypeKind::Time, 0).unwrap();
        assert!(parse(&time, "10:61:00", &ctx).is_err());
    }

    #[test]
    fn test_fraction_truncated_not_rounded() {
        let ctx = FixedOffsetSession::utc();
        let SqlValue::DateTime(v) = parse(&ts(2), "2024-01-01 00:00:00.999999", &ctx).unwrap()
        else {
            unreachable!()
        };
        assert_eq!(v.nanos, 990_000_000);
    }

    #[test]
    fn test_truncate_cascade() {
        let v = parse_ts("2024-08-20 13:45:30.123456");
        let cases = [
            (DateTimeField::Year, "2024-01-01 00:00:00"),
            (DateTimeField::Quarter, "2024-07-01 00:00:00"),
            (DateTimeField::Month, "2024-08-01 00:00:00"),
            // 2024-08-20 is a Tuesday; the ISO week starts Monday the 19th
            (DateTimeField::Week, "2024-08-19 00:00:00"),
            (DateTimeField::Day, "2024-08-20 00:00:00"),
            (DateTimeField::Hour, "2024-08-20 13:00:00"),
            (DateTimeField::Minute, "2024-08-20 13:45:00"),
        ];
        for (field, expected) in cases {
            let SqlValue::DateTime(out) = truncate_to(&ts(6), &v, field).unwrap() else {
                unreachable!()
            };
            assert_eq!(format(&ts(0), &out).unwrap(), expected, "{}", field);
        }
    }

    #[test]
    fn test_round_to_field() {
        let late = parse_ts("2024-08-20 13:45:31");
        let SqlValue::DateTime(out) = round_to(&ts(0), &late, DateTimeField::Minute).unwrap()
        else {
            unreachable!()
        };
        assert_eq!(format(&ts(0), &out).unwrap(), "2024-08-20 13:46:00");

        let july = parse_ts("2024-07-02 00:00:00");
        let SqlValue::DateTime(out) = round_to(&ts(0), &july, DateTimeField::Year).unwrap() else {
            unreachable!()
        };
        assert_eq!(format(&ts(0), &out).unwrap(), "2025-01-01 00:00:00");
    }

    #[test]
    fn test_extract_fields() {
        let v = parse_ts("2024-08-20 13:45:30.250000");
        let t = ts(6);
        assert_eq!(extract(&t, &v, DateTimeField::Year).unwrap(), SqlValue::Integer(2024));
        assert_eq!(extract(&t, &v, DateTimeField::Quarter).unwrap(), SqlValue::Integer(3));
        assert_eq!(extract(&t, &v, DateTimeField::Day).unwrap(), SqlValue::Integer(20));
        // Tuesday; Sunday is 1
        assert_eq!(extract(&t, &v, DateTimeField::DayOfWeek).unwrap(), SqlValue::Integer(3));
        assert_eq!(extract(&t, &v, DateTimeField::DayOfYear).unwrap(), SqlValue::Integer(233));
        assert_eq!(
            extract(&t, &v, DateTimeField::Second).unwrap(),
            SqlValue::Numeric(Decimal::new(3025, 2))
        );
        assert!(extract(&t, &v, DateTimeField::TimezoneHour).is_err());
    }

    #[test]
    fn test_aggregate_widening() {
        let date = DateTimeType::new(TypeKind::Date, 0).unwrap();
        let tsz = DateTimeType::new(TypeKind::TimestampWithZone, 3).unwrap();
        let agg = aggregate(&date, &tsz).unwrap();
        assert_eq!(agg.kind, TypeKind::TimestampWithZone);
        assert_eq!(agg.scale, 3);
    }

    #[test]
    fn test_overlaps_strict_boundary() {
        let p = |a: &str, b: &str| Period::new(parse_ts(a), parse_ts(b));
        let a = p("2024-01-01 00:00:00", "2024-01-10 00:00:00");
        let b = p("2024-01-05 00:00:00", "2024-01-20 00:00:00");
        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));

        let c = p("2024-01-01 00:00:00", "2024-01-05 00:00:00");
        let d = p("2024-01-05 00:00:00", "2024-01-10 00:00:00");
        assert!(!overlaps(&c, &d));
        assert!(immediately_precedes(&c, &d));
        assert!(precedes(&c, &d));
        assert!(succeeds(&d, &c));
    }

    #[test]
    fn test_contains_excludes_instant_at_end() {
        let p = |a: &str, b: &str| Period::new(parse_ts(a), parse_ts(b));
        let outer = p("2024-01-01 00:00:00", "2024-01-10 00:00:00");
        let inner = p("2024-01-03 00:00:00", "2024-01-07 00:00:00");
        assert!(contains(&outer, &inner));
        let at_end = p("2024-01-10 00:00:00", "2024-01-10 00:00:00");
        assert!(!contains(&outer, &at_end));
        let at_start = p("2024-01-01 00:00:00", "2024-01-01 00:00:00");
        assert!(contains(&outer, &at_start));
    }

    #[test]
    fn test_period_swaps_out_of_order_boundaries() {
        let period = Period::new(parse_ts("2024-01-10 00:00:00"), parse_ts("2024-01-01 00:00:00"));
        assert!(period.start.instant_cmp(&period.end) != Ordering::Greater);
    }
}
