//! Character and CLOB type algebra
//!
//! Fixed/variable character widening, collation-aware comparison with
//! pad-space semantics, precision enforcement on conversion and cast, and the
//! string operators (substring, trim, overlay, position, case mapping, LIKE).
//! Every compound operator is built from `substring` + `concat` so the
//! clamping rules stay identical everywhere.

use crate::kind::{OpCode, TypeKind};
use once_cell::sync::Lazy;
use quartzdb_diagnostics::{Result, SqlError, Warning};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

static SQL_TEXT: Lazy<Collation> = Lazy::new(|| Collation {
    name: "SQL_TEXT".to_string(),
    pad_space: true,
});

/// Largest declarable character precision
pub const MAX_CHAR_PRECISION: u64 = u32::MAX as u64;

/// Default precision for VARCHAR declared without a length; 0 means unbounded
pub const DEFAULT_VARCHAR_PRECISION: u64 = 0;

/// Collation reference carried by character types.
///
/// Only the pieces the engine consumes are modeled: a name for identity and
/// the pad-space flag that drives comparison semantics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Collation {
    pub name: String,
    pub pad_space: bool,
}

impl Collation {
    /// The default SQL_TEXT collation with pad-space comparison
    pub fn default_collation() -> Self {
        SQL_TEXT.clone()
    }

    /// A no-pad collation
    pub fn no_pad(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pad_space: false,
        }
    }
}

impl Default for Collation {
    fn default() -> Self {
        Self::default_collation()
    }
}

/// Descriptor fields for a character type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterType {
    pub kind: TypeKind,
    /// Character length; 0 on VARCHAR means unbounded
    pub precision: u64,
    pub collation: Collation,
}

impl CharacterType {
    /// Create a descriptor with the default collation
    pub fn new(kind: TypeKind, precision: u64) -> Self {
        Self {
            kind,
            precision,
            collation: Collation::default_collation(),
        }
    }

    /// Effective capacity; unbounded VARCHAR and CLOB report the maximum
    pub fn capacity(&self) -> u64 {
        if self.precision == 0 {
            MAX_CHAR_PRECISION
        } else {
            self.precision
        }
    }
}

/// Comparison entry points; `GreaterEqualPre` is the range-probe variant that
/// must compare without pad-space extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareMode {
    Normal,
    GreaterEqualPre,
}

/// Rank used for widening: CHAR < VARCHAR < CLOB
fn rank(kind: TypeKind) -> u8 {
    match kind {
        TypeKind::Char => 0,
        TypeKind::Varchar => 1,
        _ => 2,
    }
}

fn kind_for_rank(rank: u8) -> TypeKind {
    match rank {
        0 => TypeKind::Char,
        1 => TypeKind::Varchar,
        _ => TypeKind::Clob,
    }
}

/// Narrowest character type holding values of both operands
pub fn aggregate(a: &CharacterType, b: &CharacterType) -> CharacterType {
    let kind = kind_for_rank(rank(a.kind).max(rank(b.kind)));
    let precision = if a.precision == 0 || b.precision == 0 {
        0
    } else {
        a.precision.max(b.precision)
    };
    CharacterType {
        kind,
        precision,
        collation: a.collation.clone(),
    }
}

/// Result type of an operator over two character operands; only CONCAT is
/// defined
pub fn combine(a: &CharacterType, b: &CharacterType, op: OpCode) -> Result<CharacterType> {
    if op != OpCode::Concat {
        return Err(SqlError::invalid_conversion(a.kind.name(), b.kind.name()));
    }
    let kind = if rank(a.kind).max(rank(b.kind)) >= 2 {
        TypeKind::Clob
    } else {
        // CHAR loses its fixed width under concatenation
        TypeKind::Varchar
    };
    let precision = if a.precision == 0 || b.precision == 0 {
        0
    } else {
        (a.precision + b.precision).min(MAX_CHAR_PRECISION)
    };
    Ok(CharacterType {
        kind,
        precision,
        collation: a.collation.clone(),
    })
}

/// Compare two strings under a collation.
///
/// With pad-space semantics the shorter operand is treated as extended with
/// spaces to the longer length; `GreaterEqualPre` compares without padding.
pub fn compare(collation: &Collation, a: &str, b: &str, mode: CompareMode) -> Ordering {
    let pad = collation.pad_space && mode == CompareMode::Normal;
    if !pad {
        return a.chars().cmp(b.chars());
    }
    let mut xs = a.chars();
    let mut ys = b.chars();
    loop {
        match (xs.next(), ys.next()) {
            (Some(x), Some(y)) => match x.cmp(&y) {
                Ordering::Equal => continue,
                other => return other,
            },
            (Some(x), None) => match x.cmp(&' ') {
                Ordering::Equal => continue,
                other => return other,
            },
            (None, Some(y)) => match ' '.cmp(&y) {
                Ordering::Equal => continue,
                other => return other,
            },
            (None, None) => return Ordering::Equal,
        }
    }
}

/// Outcome of an enforcement pass: the stored string, plus a warning when a
/// cast had to discard non-space content
pub struct Enforced {
    pub value: String,
    pub warning: Option<Warning>,
}

/// Enforce the target precision on conversion or cast.
///
/// Over-length content may be truncated on implicit conversion only when
/// every discarded character is the pad character; casts always truncate and
/// report a recoverable warning instead. CHAR targets are padded to exactly
/// `precision` characters.
pub fn enforce(target: &CharacterType, s: &str, cast: bool) -> Result<Enforced> {
    let len = s.chars().count() as u64;
    let capacity = target.capacity();

    let (mut value, warning) = if len > capacity {
        let kept: String = s.chars().take(capacity as usize).collect();
        let tail_is_pad = s.chars().skip(capacity as usize).all(|c| c == ' ');
        if tail_is_pad {
            (kept, None)
        } else if cast {
            (kept, Some(Warning::truncation(definition(target))))
        } else {
            return Err(SqlError::truncation(definition(target)));
        }
    } else {
        (s.to_string(), None)
    };

    if target.kind == TypeKind::Char {
        let current = value.chars().count() as u64;
        for _ in current..target.precision {
            value.push(' ');
        }
    }

    Ok(Enforced { value, warning })
}

/// The SQL definition text of a character type
pub fn definition(t: &CharacterType) -> String {
    if t.precision == 0 {
        t.kind.name().to_string()
    } else {
        format!("{}({})", t.kind.name(), t.precision)
    }
}

// =========================================================================
// String operators
// =========================================================================

/// SQL SUBSTRING with zero-based `offset`.
///
/// Out-of-range combinations clamp to an empty result rather than failing;
/// the single error case is an explicit length making `end < offset`.
pub fn substring(s: &str, offset: i64, length: i64, has_length: bool) -> Result<String> {
    let data_len = s.chars().count() as i64;
    let end = if has_length {
        offset
            .checked_add(length)
            .ok_or(SqlError::SubstringError { offset, length })?
    } else {
        data_len.max(offset)
    };

    if end < offset {
        return Err(SqlError::SubstringError { offset, length });
    }

    if offset > data_len || end < 0 {
        return Ok(String::new());
    }

    let start = offset.max(0) as usize;
    let stop = end.min(data_len) as usize;
    if stop <= start {
        return Ok(String::new());
    }
    Ok(s.chars().skip(start).take(stop - start).collect())
}

/// Concatenate two strings
pub fn concat(a: &str, b: &str) -> String {
    let mut out = String::with_capacity(a.len() + b.len());
    out.push_str(a);
    out.push_str(b);
    out
}

/// SQL OVERLAY, built from substring + concat so clamping matches
pub fn overlay(s: &str, replacement: &str, offset: i64, length: i64, has_length: bool) -> Result<String> {
    // Offset is 1-based in SQL; normalize to the 0-based substring convention
    let start = offset - 1;
    let replace_len = if has_length {
        length
    } else {
        replacement.chars().count() as i64
    };
    let head = substring(s, 0, start, true)?;
    let tail = substring(s, start + replace_len, 0, false)?;
    Ok(concat(&concat(&head, replacement), &tail))
}

/// Which ends TRIM strips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimSpec {
    Leading,
    Trailing,
    Both,
}

/// SQL TRIM with an arbitrary single trim character
pub fn trim(s: &str, spec: TrimSpec, trim_char: char) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut start = 0usize;
    let mut end = chars.len();
    if matches!(spec, TrimSpec::Leading | TrimSpec::Both) {
        while start < end && chars[start] == trim_char {
            start += 1;
        }
    }
    if matches!(spec, TrimSpec::Trailing | TrimSpec::Both) {
        while end > start && chars[end - 1] == trim_char {
            end -= 1;
        }
    }
    chars[start..end].iter().collect()
}

/// Uppercase mapping
pub fn upper(s: &str) -> String {
    s.to_uppercase()
}

/// Lowercase mapping
pub fn lower(s: &str) -> String {
    s.to_lowercase()
}

/// SQL POSITION: 1-based index of the first occurrence, 0 when absent, 1 for
/// an empty needle
pub fn position(needle: &str, haystack: &str) -> i64 {
    if needle.is_empty() {
        return 1;
    }
    let hay: Vec<char> = haystack.chars().collect();
    let pat: Vec<char> = needle.chars().collect();
    if pat.len() > hay.len() {
        return 0;
    }
    for i in 0..=(hay.len() - pat.len()) {
        if hay[i..i + pat.len()] == pat[..] {
            return (i + 1) as i64;
        }
    }
    0
}

/// SQL LIKE with `%`, `_` and an optional escape character
pub fn like(s: &str, pattern: &str, escape: Option<char>) -> Result<bool> {
    let text: Vec<char> = s.chars().collect();
    let pat: Vec<PatternToken> = compile_like(pattern, escape)?;
    Ok(match_like(&text, &pat))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternToken {
    Any,
    One,
    Literal(char),
}

fn compile_like(pattern: &str, escape: Option<char>) -> Result<Vec<PatternToken>> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if Some(c) == escape {
            match chars.next() {
                Some(next) if next == '%' || next == '_' || Some(next) == escape => {
                    tokens.push(PatternToken::Literal(next));
                }
                _ => {
                    return Err(SqlError::invalid_conversion(
                        "LIKE pattern",
                        "escaped sequence",
                    ));
                }
            }
        } else if c == '%' {
            tokens.push(PatternToken::Any);
        } else if c == '_' {
            tokens.push(PatternToken::One);
        } else {
            tokens.push(PatternToken::Literal(c));
        }
    }
    Ok(tokens)
}

/// Iterative matcher: on a mismatch after a `%`, resume at the token after
/// that `%` with the wildcard consuming one more character. O(text * pattern).
fn match_like(text: &[char], pattern: &[PatternToken]) -> bool {
    let mut t = 0usize;
    let mut p = 0usize;
    // Token index after the most recent %, and the text index it resumes at
    let mut resume: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some(PatternToken::Any) => {
                resume = Some((p + 1, t));
                p += 1;
            }
            Some(PatternToken::One) => {
                t += 1;
                p += 1;
            }
            Some(PatternToken::Literal(c)) if text[t] == *c => {
                t += 1;
                p += 1;
            }
            _ => match resume {
                Some((rp, rt)) => {
                    resume = Some((rp, rt + 1));
                    p = rp;
                    t = rt + 1;
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|tok| *tok == PatternToken::Any)
}

/// Render a string as a SQL literal: single quotes, embedded quotes doubled
pub fn to_sql_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varchar(p: u64) -> CharacterType {
        CharacterType::new(TypeKind::Varchar, p)
    }

    fn char_t(p: u64) -> CharacterType {
        CharacterType::new(TypeKind::Char, p)
    }

    #[test]
    fn test_aggregate_widens_kind() {
        let t = aggregate(&char_t(5), &varchar(10));
        assert_eq!(t.kind, TypeKind::Varchar);
        assert_eq!(t.precision, 10);

        let t = aggregate(&varchar(10), &CharacterType::new(TypeKind::Clob, 100));
        assert_eq!(t.kind, TypeKind::Clob);
    }

    #[test]
    fn test_concat_precision_sums() {
        let t = combine(&varchar(10), &varchar(30), OpCode::Concat).unwrap();
        assert_eq!(t.kind, TypeKind::Varchar);
        assert_eq!(t.precision, 40);
    }

    #[test]
    fn test_pad_space_comparison() {
        let coll = Collation::default_collation();
        assert_eq!(
            compare(&coll, "abc", "abc  ", CompareMode::Normal),
            Ordering::Equal
        );
        assert_eq!(
            compare(&coll, "abc", "abd", CompareMode::Normal),
            Ordering::Less
        );
        // The range-probe variant must see the shorter string as smaller
        assert_eq!(
            compare(&coll, "abc", "abc  ", CompareMode::GreaterEqualPre),
            Ordering::Less
        );
    }

    #[test]
    fn test_enforce_trailing_space_truncation_ok() {
        let t = varchar(3);
        let r = enforce(&t, "abc  ", false).unwrap();
        assert_eq!(r.value, "abc");
        assert!(r.warning.is_none());
    }

    #[test]
    fn test_enforce_convert_fails_on_content() {
        let t = varchar(3);
        assert!(matches!(
            enforce(&t, "abcd", false),
            Err(SqlError::StringDataTruncation { .. })
        ));
    }

    #[test]
    fn test_enforce_cast_truncates_with_warning() {
        let t = varchar(3);
        let r = enforce(&t, "abcd", true).unwrap();
        assert_eq!(r.value, "abc");
        assert!(r.warning.is_some());
    }

    #[test]
    fn test_enforce_char_pads() {
        let t = char_t(5);
        let r = enforce(&t, "ab", false).unwrap();
        assert_eq!(r.value, "ab   ");
    }

    #[test]
    fn test_substring_clamping() {
        assert_eq!(substring("hello", 10, 2, true).unwrap(), "");
        assert_eq!(substring("hello", 1, 3, true).unwrap(), "ell");
        assert_eq!(substring("hello", -2, 4, true).unwrap(), "he");
        assert_eq!(substring("hello", 2, 0, false).unwrap(), "llo");
        assert!(matches!(
            substring("hello", 2, -1, true),
            Err(SqlError::SubstringError { .. })
        ));
    }

    #[test]
    fn test_overlay() {
        assert_eq!(overlay("abcdef", "XY", 3, 2, true).unwrap(), "abXYef");
        assert_eq!(overlay("abcdef", "XY", 3, 0, true).unwrap(), "abXYcdef");
    }

    #[test]
    fn test_trim() {
        assert_eq!(trim("  ab  ", TrimSpec::Both, ' '), "ab");
        assert_eq!(trim("xxabxx", TrimSpec::Leading, 'x'), "abxx");
        assert_eq!(trim("xxabxx", TrimSpec::Trailing, 'x'), "xxab");
    }

    #[test]
    fn test_position() {
        assert_eq!(position("ll", "hello"), 3);
        assert_eq!(position("", "hello"), 1);
        assert_eq!(position("zz", "hello"), 0);
    }

    #[test]
    fn test_like() {
        assert!(like("hello", "h%o", None).unwrap());
        assert!(like("hello", "h_llo", None).unwrap());
        assert!(!like("hello", "h_o", None).unwrap());
        assert!(like("50%", "50!%", Some('!')).unwrap());
        assert!(!like("500", "50!%", Some('!')).unwrap());
    }

    #[test]
    fn test_like_many_wildcards_terminates() {
        // A non-matching pattern with stacked % must not backtrack
        // combinatorially
        let text = "a".repeat(60);
        let pattern = format!("{}b", "%a".repeat(15));
        assert!(!like(&text, &pattern, None).unwrap());
        let matching = format!("{}a", "%a".repeat(15));
        assert!(like(&text, &matching, None).unwrap());
    }

    #[test]
    fn test_sql_literal_escaping() {
        assert_eq!(to_sql_literal("it's"), "'it''s'");
    }
}
