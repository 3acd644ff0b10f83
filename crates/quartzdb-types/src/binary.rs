//! Binary and bit type algebra
//!
//! Structurally mirrors the character algebra over byte and bit sequences,
//! with no collation: zero bytes play the role of the pad character. BIT
//! precision is measured in bits and its trim size in trailing zero bits.

use crate::kind::{OpCode, TypeKind};
use crate::value::BitValue;
use quartzdb_diagnostics::{Result, SqlError, Warning};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Largest declarable binary precision, in bytes (bits for BIT kinds)
pub const MAX_BINARY_PRECISION: u64 = u32::MAX as u64;

/// Descriptor fields for a binary or bit type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinaryType {
    pub kind: TypeKind,
    /// Byte length, or bit length for BIT/BIT VARYING; 0 means unbounded
    pub precision: u64,
}

impl BinaryType {
    /// Create a descriptor
    pub fn new(kind: TypeKind, precision: u64) -> Self {
        Self { kind, precision }
    }

    /// Effective capacity; unbounded kinds report the maximum
    pub fn capacity(&self) -> u64 {
        if self.precision == 0 {
            MAX_BINARY_PRECISION
        } else {
            self.precision
        }
    }

    /// The SQL definition text
    pub fn definition(&self) -> String {
        if self.precision == 0 {
            self.kind.name().to_string()
        } else if self.kind == TypeKind::BitVarying {
            format!("BIT VARYING({})", self.precision)
        } else {
            format!("{}({})", self.kind.name(), self.precision)
        }
    }
}

/// Rank used for widening: BIT < BIT VARYING < BINARY < VARBINARY < BLOB
fn rank(kind: TypeKind) -> u8 {
    match kind {
        TypeKind::Bit => 0,
        TypeKind::BitVarying => 1,
        TypeKind::Binary => 2,
        TypeKind::Varbinary => 3,
        _ => 4,
    }
}

fn kind_for_rank(rank: u8) -> TypeKind {
    match rank {
        0 => TypeKind::Bit,
        1 => TypeKind::BitVarying,
        2 => TypeKind::Binary,
        3 => TypeKind::Varbinary,
        _ => TypeKind::Blob,
    }
}

/// Narrowest binary type holding values of both operands.
///
/// Mixing a bit kind with a byte kind widens to the byte kind; bit precision
/// converts to bytes by rounding up.
pub fn aggregate(a: &BinaryType, b: &BinaryType) -> BinaryType {
    let target = kind_for_rank(rank(a.kind).max(rank(b.kind)));
    let precision = if a.precision == 0 || b.precision == 0 {
        0
    } else {
        precision_in(target, a).max(precision_in(target, b))
    };
    BinaryType::new(target, precision)
}

fn precision_in(target: TypeKind, t: &BinaryType) -> u64 {
    if t.kind.is_bit() && !target.is_bit() {
        t.precision.div_ceil(8)
    } else {
        t.precision
    }
}

/// Result type of an operator over two binary operands; only CONCAT is
/// defined
pub fn combine(a: &BinaryType, b: &BinaryType, op: OpCode) -> Result<BinaryType> {
    if op != OpCode::Concat {
        return Err(SqlError::invalid_conversion(a.kind.name(), b.kind.name()));
    }
    let top = rank(a.kind).max(rank(b.kind));
    let kind = match top {
        0 | 1 => TypeKind::BitVarying,
        2 | 3 => TypeKind::Varbinary,
        _ => TypeKind::Blob,
    };
    let precision = if a.precision == 0 || b.precision == 0 {
        0
    } else {
        (precision_in(kind, a) + precision_in(kind, b)).min(MAX_BINARY_PRECISION)
    };
    Ok(BinaryType::new(kind, precision))
}

/// Unsigned lexicographic byte comparison; on an equal prefix the shorter
/// sequence sorts first
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Outcome of an enforcement pass over bytes
pub struct Enforced {
    pub value: Vec<u8>,
    pub warning: Option<Warning>,
}

/// Enforce the target precision on conversion or cast.
///
/// Over-length content may be truncated implicitly only when every discarded
/// trailing byte is zero; casts truncate and report a warning. Fixed BINARY
/// targets are zero-padded to exactly `precision` bytes.
pub fn enforce(target: &BinaryType, data: &[u8], cast: bool) -> Result<Enforced> {
    let capacity = target.capacity();
    let len = data.len() as u64;

    let (mut value, warning) = if len > capacity {
        let kept = data[..capacity as usize].to_vec();
        let tail_is_zero = data[capacity as usize..].iter().all(|b| *b == 0);
        if tail_is_zero {
            (kept, None)
        } else if cast {
            (kept, Some(Warning::truncation(target.definition())))
        } else {
            return Err(SqlError::truncation(target.definition()));
        }
    } else {
        (data.to_vec(), None)
    };

    if target.kind == TypeKind::Binary {
        value.resize(target.precision as usize, 0);
    }

    Ok(Enforced { value, warning })
}

/// Enforce a bit precision, measuring the trim size in trailing zero bits
pub fn enforce_bits(target: &BinaryType, bits: &BitValue, cast: bool) -> Result<BitValue> {
    let capacity = target.capacity() as usize;
    if bits.bit_length <= capacity {
        if target.kind == TypeKind::Bit && bits.bit_length < capacity {
            // Fixed BIT extends with zero bits
            return Ok(BitValue::new(bits.bytes.clone(), capacity));
        }
        return Ok(bits.clone());
    }
    if bits.trim_size() <= capacity || cast {
        Ok(BitValue::new(bits.bytes.clone(), capacity))
    } else {
        Err(SqlError::truncation(target.definition()))
    }
}

// =========================================================================
// Byte-sequence operators
// =========================================================================

/// SUBSTRING over bytes with zero-based offset; identical clamping to the
/// character variant
pub fn substring(data: &[u8], offset: i64, length: i64, has_length: bool) -> Result<Vec<u8>> {
    let data_len = data.len() as i64;
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
        return Ok(Vec::new());
    }
    let start = offset.max(0) as usize;
    let stop = end.min(data_len) as usize;
    if stop <= start {
        return Ok(Vec::new());
    }
    Ok(data[start..stop].to_vec())
}

/// Concatenate two byte sequences
pub fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

/// OVERLAY over bytes, built from substring + concat
pub fn overlay(
    data: &[u8],
    replacement: &[u8],
    offset: i64,
    length: i64,
    has_length: bool,
) -> Result<Vec<u8>> {
    let start = offset - 1;
    let replace_len = if has_length {
        length
    } else {
        replacement.len() as i64
    };
    let head = substring(data, 0, start, true)?;
    let tail = substring(data, start + replace_len, 0, false)?;
    Ok(concat(&concat(&head, replacement), &tail))
}

/// POSITION over bytes: 1-based, 0 when absent, 1 for an empty needle
pub fn position(needle: &[u8], haystack: &[u8]) -> i64 {
    if needle.is_empty() {
        return 1;
    }
    if needle.len() > haystack.len() {
        return 0;
    }
    for i in 0..=(haystack.len() - needle.len()) {
        if &haystack[i..i + needle.len()] == needle {
            return (i + 1) as i64;
        }
    }
    0
}

/// Parse a hexadecimal literal body (the content between X' and ')
pub fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.len() % 2 != 0 {
        return Err(SqlError::invalid_conversion("CHARACTER", "VARBINARY"));
    }
    let mut out = Vec::with_capacity(cleaned.len() / 2);
    let bytes = cleaned.as_bytes();
    for pair in bytes.chunks(2) {
        let hi = hex_digit(pair[0])?;
        let lo = hex_digit(pair[1])?;
        out.push(hi << 4 | lo);
    }
    Ok(out)
}

fn hex_digit(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(SqlError::invalid_conversion("CHARACTER", "VARBINARY")),
    }
}

/// Render bytes as uppercase hex
pub fn to_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for b in data {
        out.push_str(&format!("{:02X}", b));
    }
    out
}

/// Render bytes as a SQL hex literal: X'...'
pub fn to_sql_literal(data: &[u8]) -> String {
    format!("X'{}'", to_hex(data))
}
