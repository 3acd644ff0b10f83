//! Type resolution and the flyweight cache
//!
//! `TypeRegistry` turns a `(kind, precision, scale)` triple into a canonical
//! shared descriptor. The cache is an explicit object rather than ambient
//! global state, so independent type universes (one per engine instance or
//! test) never interfere. Returned `Arc`s make pointer equality a valid
//! fast path for descriptor equality within one registry.

use crate::binary::{BinaryType, MAX_BINARY_PRECISION};
use crate::character::{CharacterType, MAX_CHAR_PRECISION};
use crate::datetime::{DateTimeType, MAX_DATETIME_SCALE};
use crate::distinct::{DistinctType, QualifiedName};
use crate::interval::{IntervalType, MAX_FRACTION_PRECISION, MAX_LEADING_PRECISION};
use crate::kind::TypeKind;
use crate::numeric::{NumericType, DEFAULT_NUMERIC_PRECISION, MAX_NUMERIC_PRECISION};
use crate::types::SqlType;
use parking_lot::Mutex;
use quartzdb_diagnostics::{Result, SqlError};
use std::collections::HashMap;
use std::sync::Arc;

/// One universe of canonical type descriptors
pub struct TypeRegistry {
    cache: Mutex<HashMap<(TypeKind, u64, u32), Arc<SqlType>>>,
    distinct: Mutex<HashMap<QualifiedName, Arc<SqlType>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            distinct: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a type-code triple to a canonical descriptor.
    ///
    /// Precision and scale are normalized and validated against the kind's
    /// maxima; a zero precision selects the kind's default where one exists
    /// (CHAR(1), NUMERIC(18), unbounded VARCHAR).
    pub fn get_type(&self, kind: TypeKind, precision: u64, scale: u32) -> Result<Arc<SqlType>> {
        let (precision, scale) = normalize(kind, precision, scale)?;
        let key = (kind, precision, scale);
        let mut cache = self.cache.lock();
        if let Some(cached) = cache.get(&key) {
            return Ok(Arc::clone(cached));
        }
        let built = Arc::new(build(kind, precision, scale)?);
        cache.insert(key, Arc::clone(&built));
        Ok(built)
    }

    /// The kind's default descriptor
    pub fn default_type(&self, kind: TypeKind) -> Result<Arc<SqlType>> {
        self.get_type(kind, 0, default_scale(kind))
    }

    /// Register a distinct type under its qualified name
    pub fn register_distinct(&self, distinct: DistinctType) -> Result<Arc<SqlType>> {
        let mut map = self.distinct.lock();
        if map.contains_key(&distinct.name) {
            return Err(SqlError::internal(format!(
                "type {} already exists",
                distinct.name
            )));
        }
        let name = distinct.name.clone();
        let shared = Arc::new(SqlType::Distinct(distinct));
        map.insert(name, Arc::clone(&shared));
        Ok(shared)
    }

    /// Look up a registered distinct type
    pub fn distinct_type(&self, name: &QualifiedName) -> Option<Arc<SqlType>> {
        self.distinct.lock().get(name).map(Arc::clone)
    }

    /// Remove a registered distinct type
    pub fn drop_distinct(&self, name: &QualifiedName) -> Result<()> {
        self.distinct
            .lock()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| SqlError::internal(format!("type {} does not exist", name)))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn default_scale(kind: TypeKind) -> u32 {
    match kind {
        TypeKind::Timestamp | TypeKind::TimestampWithZone => 6,
        k if k.is_interval() && IntervalType::fields_of(k).1 == crate::kind::IntervalField::Second =>
        {
            6
        }
        _ => 0,
    }
}

fn normalize(kind: TypeKind, precision: u64, scale: u32) -> Result<(u64, u32)> {
    let out_of_range = || SqlError::out_of_range(kind.name());
    match kind {
        TypeKind::Boolean => {
            if precision != 0 || scale != 0 {
                return Err(out_of_range());
            }
            Ok((0, 0))
        }
        // Integer and floating kinds carry fixed precisions
        TypeKind::Tinyint
        | TypeKind::Smallint
        | TypeKind::Integer
        | TypeKind::Bigint
        | TypeKind::Double => {
            if scale != 0 {
                return Err(out_of_range());
            }
            Ok((0, 0))
        }
        TypeKind::Numeric | TypeKind::Decimal => {
            let precision = if precision == 0 {
                DEFAULT_NUMERIC_PRECISION as u64
            } else {
                precision
            };
            if precision > MAX_NUMERIC_PRECISION as u64 || scale as u64 > precision {
                return Err(out_of_range());
            }
            Ok((precision, scale))
        }
        TypeKind::Char => {
            let precision = if precision == 0 { 1 } else { precision };
            if precision > MAX_CHAR_PRECISION || scale != 0 {
                return Err(out_of_range());
            }
            Ok((precision, 0))
        }
        TypeKind::Varchar | TypeKind::Clob => {
            if precision > MAX_CHAR_PRECISION || scale != 0 {
                return Err(out_of_range());
            }
            Ok((precision, 0))
        }
        TypeKind::Binary | TypeKind::Bit => {
            let precision = if precision == 0 { 1 } else { precision };
            if precision > MAX_BINARY_PRECISION || scale != 0 {
                return Err(out_of_range());
            }
            Ok((precision, 0))
        }
        TypeKind::Varbinary | TypeKind::Blob | TypeKind::BitVarying => {
            if precision > MAX_BINARY_PRECISION || scale != 0 {
                return Err(out_of_range());
            }
            Ok((precision, 0))
        }
        TypeKind::Date => {
            if precision != 0 || scale != 0 {
                return Err(out_of_range());
            }
            Ok((0, 0))
        }
        TypeKind::Time | TypeKind::TimeWithZone | TypeKind::Timestamp
        | TypeKind::TimestampWithZone => {
            if precision != 0 || scale > MAX_DATETIME_SCALE {
                return Err(out_of_range());
            }
            Ok((0, scale))
        }
        k if k.is_interval() => {
            let precision = if precision == 0 { 2 } else { precision };
            let (_, end) = IntervalType::fields_of(k);
            if precision > MAX_LEADING_PRECISION as u64
                || scale > MAX_FRACTION_PRECISION
                || (scale != 0 && end != crate::kind::IntervalField::Second)
            {
                return Err(out_of_range());
            }
            Ok((precision, scale))
        }
        _ => Err(SqlError::internal(format!("unresolvable kind {}", kind))),
    }
}

fn build(kind: TypeKind, precision: u64, scale: u32) -> Result<SqlType> {
    let t = match kind {
        TypeKind::Boolean => SqlType::Boolean,
        k if k.is_numeric() => {
            SqlType::Numeric(NumericType::new(k, precision as u32, scale))
        }
        k if k.is_character() => SqlType::Character(CharacterType::new(k, precision)),
        k if k.is_binary() => SqlType::Binary(BinaryType::new(k, precision)),
        k if k.is_datetime() => SqlType::DateTime(DateTimeType::new(k, scale)?),
        k if k.is_interval() => {
            let (start, end) = IntervalType::fields_of(k);
            SqlType::Interval(IntervalType::new(start, end, precision as u32, scale)?)
        }
        k => return Err(SqlError::internal(format!("unresolvable kind {}", k))),
    };
    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_canonical_instances_are_shared() {
        let registry = TypeRegistry::new();
        let a = registry.get_type(TypeKind::Char, 10, 0).unwrap();
        let b = registry.get_type(TypeKind::Char, 10, 0).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let c = registry.get_type(TypeKind::Char, 11, 0).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_registries_are_independent() {
        let first = TypeRegistry::new();
        let second = TypeRegistry::new();
        let a = first.get_type(TypeKind::Varchar, 32, 0).unwrap();
        let b = second.get_type(TypeKind::Varchar, 32, 0).unwrap();
        assert_eq!(a.as_ref(), b.as_ref());
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_normalization_defaults() {
        let registry = TypeRegistry::new();
        let char_default = registry.get_type(TypeKind::Char, 0, 0).unwrap();
        assert_eq!(char_default.precision(), 1);
        let numeric_default = registry.get_type(TypeKind::Numeric, 0, 0).unwrap();
        assert_eq!(numeric_default.precision(), DEFAULT_NUMERIC_PRECISION as u64);
        let ts = registry.default_type(TypeKind::Timestamp).unwrap();
        assert_eq!(ts.scale(), 6);
    }

    #[test]
    fn test_validation_failures() {
        let registry = TypeRegistry::new();
        // Scale beyond precision
        assert!(registry.get_type(TypeKind::Numeric, 5, 6).is_err());
        assert!(registry.get_type(TypeKind::Boolean, 1, 0).is_err());
        assert!(registry.get_type(TypeKind::Timestamp, 0, 10).is_err());
        // Fraction digits on an interval without a SECOND field
        assert!(registry.get_type(TypeKind::IntervalYear, 2, 3).is_err());
    }

    #[test]
    fn test_interval_resolution() {
        let registry = TypeRegistry::new();
        let t = registry.get_type(TypeKind::IntervalDayToSecond, 3, 6).unwrap();
        assert_eq!(t.definition(), "INTERVAL DAY(3) TO SECOND(6)");
    }

    #[test]
    fn test_distinct_registration() {
        use crate::numeric::NumericType;

        let registry = TypeRegistry::new();
        let base = registry.get_type(TypeKind::Decimal, 10, 2).unwrap();
        let money =
            DistinctType::new(QualifiedName::new("PUBLIC", "MONEY"), Arc::clone(&base)).unwrap();
        registry.register_distinct(money.clone()).unwrap();
        let found = registry
            .distinct_type(&QualifiedName::new("PUBLIC", "MONEY"))
            .unwrap();
        assert_eq!(
            found.resolved(),
            &SqlType::Numeric(NumericType::new(TypeKind::Decimal, 10, 2))
        );
        // Duplicate names are rejected, dropped names resolve no more
        assert!(registry.register_distinct(money).is_err());
        registry
            .drop_distinct(&QualifiedName::new("PUBLIC", "MONEY"))
            .unwrap();
        assert!(registry
            .distinct_type(&QualifiedName::new("PUBLIC", "MONEY"))
            .is_none());
    }
}
