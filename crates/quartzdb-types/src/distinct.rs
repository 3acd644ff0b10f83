//! Distinct (domain) types
//!
//! A named wrapper around a base type. Everything algebraic delegates to the
//! base; the wrapper only contributes identity and rejects redeclared
//! precision or scale.

use crate::types::SqlType;
use quartzdb_diagnostics::{Result, SqlError};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Schema-qualified name of a distinct type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub schema: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A named type wrapping a base type
#[derive(Debug, Clone)]
pub struct DistinctType {
    pub name: QualifiedName,
    pub base: Arc<SqlType>,
}

impl DistinctType {
    /// Create a distinct type; the base may not itself be distinct
    pub fn new(name: QualifiedName, base: Arc<SqlType>) -> Result<Self> {
        if matches!(base.as_ref(), SqlType::Distinct(_)) {
            return Err(SqlError::internal(format!(
                "distinct type {} cannot wrap another distinct type",
                name
            )));
        }
        Ok(Self { name, base })
    }

    /// The wrapped base type
    pub fn base(&self) -> &SqlType {
        &self.base
    }

    /// Distinct declarations carry their precision in the base; a redeclared
    /// precision or scale on the name itself is rejected
    pub fn validate_declaration(&self, precision: u64, scale: u32) -> Result<()> {
        if precision != 0 || scale != 0 {
            return Err(SqlError::internal(format!(
                "type {} does not accept precision or scale",
                self.name
            )));
        }
        Ok(())
    }
}

// Identity is the qualified name plus the base; two distinct types with the
// same base but different names are different types
impl PartialEq for DistinctType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.base == other.base
    }
}

impl Eq for DistinctType {}

impl Hash for DistinctType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.base.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::NumericType;
    use crate::kind::TypeKind;

    fn money_base() -> Arc<SqlType> {
        Arc::new(SqlType::Numeric(NumericType::new(TypeKind::Decimal, 10, 2)))
    }

    #[test]
    fn test_identity_by_name_and_base() {
        let a = DistinctType::new(QualifiedName::new("PUBLIC", "MONEY"), money_base()).unwrap();
        let b = DistinctType::new(QualifiedName::new("PUBLIC", "MONEY"), money_base()).unwrap();
        let c = DistinctType::new(QualifiedName::new("PUBLIC", "PRICE"), money_base()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_rejects_nested_distinct() {
        let inner =
            DistinctType::new(QualifiedName::new("PUBLIC", "MONEY"), money_base()).unwrap();
        let wrapped = Arc::new(SqlType::Distinct(inner));
        assert!(DistinctType::new(QualifiedName::new("PUBLIC", "CASH"), wrapped).is_err());
    }

    #[test]
    fn test_rejects_redeclared_precision() {
        let d = DistinctType::new(QualifiedName::new("PUBLIC", "MONEY"), money_base()).unwrap();
        assert!(d.validate_declaration(12, 0).is_err());
        assert!(d.validate_declaration(0, 0).is_ok());
    }
}
