//! Format-pattern engine for TO_CHAR and TO_DATE
//!
//! A fixed token table compiled from the pattern with longest-match-wins
//! semantics. Unrecognized pattern letters and input that does not match a
//! compiled token fail with a format error.

use crate::datetime::DateTimeType;
use crate::kind::TypeKind;
use crate::session::SessionContext;
use crate::value::{SqlDateTime, SqlValue, SECONDS_PER_DAY};
use chrono::{Datelike, NaiveDate, Timelike};
use quartzdb_diagnostics::{Result, SqlError};

const MONTH_NAMES: [&str; 12] = [
    "JANUARY",
    "FEBRUARY",
    "MARCH",
    "APRIL",
    "MAY",
    "JUNE",
    "JULY",
    "AUGUST",
    "SEPTEMBER",
    "OCTOBER",
    "NOVEMBER",
    "DECEMBER",
];

const DAY_NAMES: [&str; 7] = [
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
    "SUNDAY",
];

/// One element of a compiled format pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatToken {
    /// `YYYY`, four-digit year
    Year4,
    /// `IYYY`, four-digit ISO week-numbering year
    IsoYear4,
    /// `YY`, two-digit year pivoting at 2000
    Year2,
    /// `MONTH`, full month name
    MonthName,
    /// `MON`, three-letter month abbreviation
    MonthAbbrev,
    /// `MM`, two-digit month
    MonthNumber,
    /// `DDD`, day of year
    DayOfYear,
    /// `DD`, two-digit day of month
    DayOfMonth,
    /// `DAY`, full day name
    DayName,
    /// `DY`, three-letter day abbreviation
    DayAbbrev,
    /// `HH24`
    Hour24,
    /// `HH12` or `HH`
    Hour12,
    /// `MI`
    Minute,
    /// `SS`
    Second,
    /// `FF1` through `FF9`, fractional seconds of the given width
    Fraction(u32),
    /// `TZ`, signed zone offset
    TimeZone,
    /// `AM` or `PM` marker
    Meridiem,
    /// `Q`, quarter number
    Quarter,
    /// `IW`, ISO week of year
    IsoWeek,
    /// A literal character copied or matched verbatim
    Literal(char),
}

// Ordered longest-first so a prefix never shadows a longer token
const TOKEN_TABLE: [(&str, FormatToken); 24] = [
    ("MONTH", FormatToken::MonthName),
    ("YYYY", FormatToken::Year4),
    ("IYYY", FormatToken::IsoYear4),
    ("HH24", FormatToken::Hour24),
    ("HH12", FormatToken::Hour12),
    ("MON", FormatToken::MonthAbbrev),
    ("DAY", FormatToken::DayName),
    ("DDD", FormatToken::DayOfYear),
    ("FF1", FormatToken::Fraction(1)),
    ("FF2", FormatToken::Fraction(2)),
    ("FF3", FormatToken::Fraction(3)),
    ("FF4", FormatToken::Fraction(4)),
    ("FF5", FormatToken::Fraction(5)),
    ("FF6", FormatToken::Fraction(6)),
    ("FF7", FormatToken::Fraction(7)),
    ("FF8", FormatToken::Fraction(8)),
    ("FF9", FormatToken::Fraction(9)),
    ("YY", FormatToken::Year2),
    ("MM", FormatToken::MonthNumber),
    ("DD", FormatToken::DayOfMonth),
    ("DY", FormatToken::DayAbbrev),
    ("HH", FormatToken::Hour12),
    ("MI", FormatToken::Minute),
    ("SS", FormatToken::Second),
];

/// Compile a pattern string into tokens; unknown pattern letters fail
pub fn compile(pattern: &str) -> Result<Vec<FormatToken>> {
    let mut tokens = Vec::new();
    let upper = pattern.to_ascii_uppercase();
    let mut rest = upper.as_str();
    'outer: while !rest.is_empty() {
        for (text, token) in TOKEN_TABLE {
            if rest.starts_with(text) {
                tokens.push(token);
                rest = &rest[text.len()..];
                continue 'outer;
            }
        }
        if rest.starts_with("TZ") {
            tokens.push(FormatToken::TimeZone);
            rest = &rest[2..];
            continue;
        }
        if rest.starts_with("AM") || rest.starts_with("PM") {
            tokens.push(FormatToken::Meridiem);
            rest = &rest[2..];
            continue;
        }
        if rest.starts_with('Q') {
            tokens.push(FormatToken::Quarter);
            rest = &rest[1..];
            continue;
        }
        if rest.starts_with("IW") {
            tokens.push(FormatToken::IsoWeek);
            rest = &rest[2..];
            continue;
        }
        let c = rest.chars().next().expect("non-empty");
        if c.is_ascii_alphabetic() {
            return Err(SqlError::datetime_format(format!(
                "unrecognized pattern element at '{}'",
                rest
            )));
        }
        tokens.push(FormatToken::Literal(c));
        rest = &rest[c.len_utf8()..];
    }
    Ok(tokens)
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_string() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Render a datetime value through a pattern (TO_CHAR)
pub fn format_with_pattern(
    _t: &DateTimeType,
    value: &SqlDateTime,
    pattern: &str,
) -> Result<String> {
    let tokens = compile(pattern)?;
    let wall_seconds = value.seconds + value.zone_offset_seconds as i64;
    let wall = chrono::DateTime::from_timestamp(wall_seconds, value.nanos)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| SqlError::datetime_format("instant outside the representable range"))?;

    let mut out = String::new();
    for token in tokens {
        match token {
            FormatToken::Year4 => out.push_str(&format!("{:04}", wall.year())),
            FormatToken::IsoYear4 => out.push_str(&format!("{:04}", wall.iso_week().year())),
            FormatToken::Year2 => out.push_str(&format!("{:02}", wall.year().rem_euclid(100))),
            FormatToken::MonthName => {
                out.push_str(&title_case(MONTH_NAMES[wall.month0() as usize]))
            }
            FormatToken::MonthAbbrev => {
                out.push_str(&title_case(&MONTH_NAMES[wall.month0() as usize][..3]))
            }
            FormatToken::MonthNumber => out.push_str(&format!("{:02}", wall.month())),
            FormatToken::DayOfYear => out.push_str(&format!("{:03}", wall.ordinal())),
            FormatToken::DayOfMonth => out.push_str(&format!("{:02}", wall.day())),
            FormatToken::DayName => out.push_str(&title_case(
                DAY_NAMES[wall.weekday().num_days_from_monday() as usize],
            )),
            FormatToken::DayAbbrev => out.push_str(&title_case(
                &DAY_NAMES[wall.weekday().num_days_from_monday() as usize][..3],
            )),
            FormatToken::Hour24 => out.push_str(&format!("{:02}", wall.hour())),
            FormatToken::Hour12 => out.push_str(&format!("{:02}", wall.hour12().1)),
            FormatToken::Minute => out.push_str(&format!("{:02}", wall.minute())),
            FormatToken::Second => out.push_str(&format!("{:02}", wall.second())),
            FormatToken::Fraction(width) => {
                let frac = format!("{:09}", value.nanos);
                out.push_str(&frac[..width as usize]);
            }
            FormatToken::TimeZone => {
                let offset = value.zone_offset_seconds;
                let sign = if offset < 0 { '-' } else { '+' };
                let abs = offset.abs();
                out.push_str(&format!("{}{:02}:{:02}", sign, abs / 3_600, abs % 3_600 / 60));
            }
            FormatToken::Meridiem => out.push_str(if wall.hour12().0 { "PM" } else { "AM" }),
            FormatToken::Quarter => out.push_str(&(wall.month0() / 3 + 1).to_string()),
            FormatToken::IsoWeek => out.push_str(&format!("{:02}", wall.iso_week().week())),
            FormatToken::Literal(c) => out.push(c),
        }
    }
    Ok(out)
}

#[derive(Default)]
struct ParsedFields {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    day_of_year: Option<u32>,
    hour: Option<u32>,
    hour12: Option<u32>,
    pm: Option<bool>,
    minute: Option<u32>,
    second: Option<u32>,
    nanos: u32,
    zone_offset: Option<i32>,
}

struct InputScanner<'a> {
    rest: &'a str,
    original: &'a str,
}

impl<'a> InputScanner<'a> {
    fn digits(&mut self, max: usize) -> Result<i64> {
        let end = self
            .rest
            .char_indices()
            .take(max)
            .take_while(|(_, c)| c.is_ascii_digit())
            .count();
        if end == 0 {
            return Err(SqlError::datetime_format(self.original));
        }
        let (d, rest) = self.rest.split_at(end);
        self.rest = rest;
        d.parse().map_err(|_| SqlError::datetime_format(self.original))
    }

    fn name(&mut self, table: &[&str], abbrev: bool) -> Result<usize> {
        let upper = self.rest.to_ascii_uppercase();
        for (i, full) in table.iter().enumerate() {
            let candidate = if abbrev { &full[..3] } else { full };
            if upper.starts_with(candidate) {
                self.rest = &self.rest[candidate.len()..];
                return Ok(i);
            }
        }
        Err(SqlError::datetime_format(self.original))
    }

    fn literal(&mut self, c: char) -> Result<()> {
        if let Some(stripped) = self.rest.strip_prefix(c) {
            self.rest = stripped;
            Ok(())
        } else {
            Err(SqlError::datetime_format(self.original))
        }
    }
}

/// Parse a string through a pattern into a datetime value (TO_DATE,
/// TO_TIMESTAMP)
pub fn parse_with_pattern(
    t: &DateTimeType,
    input: &str,
    pattern: &str,
    ctx: &dyn SessionContext,
) -> Result<SqlValue> {
    let tokens = compile(pattern)?;
    let mut scanner = InputScanner {
        rest: input.trim(),
        original: input,
    };
    let mut fields = ParsedFields::default();

    for token in tokens {
        match token {
            FormatToken::Year4 | FormatToken::IsoYear4 => {
                fields.year = Some(scanner.digits(4)? as i32);
            }
            FormatToken::Year2 => {
                fields.year = Some(2000 + scanner.digits(2)? as i32);
            }
            FormatToken::MonthName => {
                fields.month = Some(scanner.name(&MONTH_NAMES, false)? as u32 + 1);
            }
            FormatToken::MonthAbbrev => {
                fields.month = Some(scanner.name(&MONTH_NAMES, true)? as u32 + 1);
            }
            FormatToken::MonthNumber => fields.month = Some(scanner.digits(2)? as u32),
            FormatToken::DayOfYear => fields.day_of_year = Some(scanner.digits(3)? as u32),
            FormatToken::DayOfMonth => fields.day = Some(scanner.digits(2)? as u32),
            // Day names carry no independent information for field assembly
            FormatToken::DayName => {
                scanner.name(&DAY_NAMES, false)?;
            }
            FormatToken::DayAbbrev => {
                scanner.name(&DAY_NAMES, true)?;
            }
            FormatToken::Hour24 => fields.hour = Some(scanner.digits(2)? as u32),
            FormatToken::Hour12 => fields.hour12 = Some(scanner.digits(2)? as u32),
            FormatToken::Minute => fields.minute = Some(scanner.digits(2)? as u32),
            FormatToken::Second => fields.second = Some(scanner.digits(2)? as u32),
            FormatToken::Fraction(width) => {
                let start_len = scanner.rest.len();
                let raw = scanner.digits(width as usize)?;
                let consumed = start_len - scanner.rest.len();
                fields.nanos = raw as u32 * 10u32.pow(9 - consumed as u32);
            }
            FormatToken::TimeZone => {
                let sign = match scanner.rest.chars().next() {
                    Some('+') => 1,
                    Some('-') => -1,
                    _ => return Err(SqlError::datetime_format(input)),
                };
                scanner.rest = &scanner.rest[1..];
                let hours = scanner.digits(2)? as i32;
                let minutes = if scanner.literal(':').is_ok() {
                    scanner.digits(2)? as i32
                } else {
                    0
                };
                fields.zone_offset = Some(sign * (hours * 3_600 + minutes * 60));
            }
            FormatToken::Meridiem => {
                let upper = scanner.rest.to_ascii_uppercase();
                if upper.starts_with("PM") {
                    fields.pm = Some(true);
                } else if upper.starts_with("AM") {
                    fields.pm = Some(false);
                } else {
                    return Err(SqlError::datetime_format(input));
                }
                scanner.rest = &scanner.rest[2..];
            }
            FormatToken::Quarter => {
                scanner.digits(1)?;
            }
            FormatToken::IsoWeek => {
                scanner.digits(2)?;
            }
            FormatToken::Literal(c) => scanner.literal(c)?,
        }
    }
    if !scanner.rest.trim().is_empty() {
        return Err(SqlError::datetime_format(input));
    }

    assemble(t, fields, input, ctx)
}

fn assemble(
    t: &DateTimeType,
    fields: ParsedFields,
    input: &str,
    ctx: &dyn SessionContext,
) -> Result<SqlValue> {
    let bad = || SqlError::datetime_format(input);

    let hour = match (fields.hour, fields.hour12, fields.pm) {
        (Some(h), _, _) => h,
        (None, Some(h12), pm) => {
            if !(1..=12).contains(&h12) {
                return Err(bad());
            }
            let h = h12 % 12;
            if pm == Some(true) { h + 12 } else { h }
        }
        (None, None, _) => 0,
    };
    let minute = fields.minute.unwrap_or(0);
    let second = fields.second.unwrap_or(0);
    if hour >= 24 || minute >= 60 || second >= 60 {
        return Err(bad());
    }
    let time_of_day = hour as i64 * 3_600 + minute as i64 * 60 + second as i64;

    let wall_seconds = if t.kind == TypeKind::Time || t.kind == TypeKind::TimeWithZone {
        time_of_day
    } else {
        let year = fields.year.ok_or_else(bad)?;
        let date = if let Some(doy) = fields.day_of_year {
            NaiveDate::from_yo_opt(year, doy).ok_or_else(bad)?
        } else {
            let month = fields.month.ok_or_else(bad)?;
            let day = fields.day.unwrap_or(1);
            NaiveDate::from_ymd_opt(year, month, day).ok_or_else(bad)?
        };
        let midnight = date.and_hms_opt(0, 0, 0).expect("midnight").and_utc();
        midnight.timestamp() + time_of_day
    };

    if t.kind.is_datetime_with_zone() {
        let offset = match fields.zone_offset {
            Some(z) => z,
            None => ctx.zone_offset_seconds(wall_seconds),
        };
        let utc = wall_seconds - offset as i64;
        let utc = if t.kind == TypeKind::TimeWithZone {
            utc.rem_euclid(SECONDS_PER_DAY)
        } else {
            utc
        };
        Ok(SqlValue::DateTime(SqlDateTime {
            seconds: utc,
            nanos: fields.nanos,
            zone_offset_seconds: offset,
        }))
    } else {
        Ok(SqlValue::DateTime(SqlDateTime {
            seconds: wall_seconds,
            nanos: fields.nanos,
            zone_offset_seconds: 0,
        }))
    }
}
