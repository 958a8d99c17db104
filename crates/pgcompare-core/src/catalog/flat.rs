//! Flat keys: cycle-free comparable representations of catalog objects.
//!
//! A reference to another object always contributes that object's identity
//! key, never its fields, so computing a key is bounded by the depth of the
//! key itself rather than the size of the object graph.

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

/// A finite, order-stable tuple of primitives and nested keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlatKey {
    /// Absent reference or SQL NULL.
    Null,
    /// Boolean attribute.
    Bool(bool),
    /// Integer attribute.
    Int(i64),
    /// Text attribute or name.
    Text(String),
    /// Fixed-arity tuple (identity keys, whole objects).
    Tuple(Vec<FlatKey>),
    /// Ordered list of keys (reference lists, owned collections).
    List(Vec<FlatKey>),
}

impl FlatKey {
    /// Key for a single name.
    pub fn name(name: &str) -> Self {
        FlatKey::Tuple(vec![FlatKey::Text(name.to_string())])
    }

    /// Key for an optional text attribute.
    pub fn text_or_null(value: Option<&str>) -> Self {
        value.map_or(FlatKey::Null, |v| FlatKey::Text(v.to_string()))
    }

    /// Check if this key is the null sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, FlatKey::Null)
    }
}

impl fmt::Display for FlatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlatKey::Null => f.write_str("null"),
            FlatKey::Bool(b) => write!(f, "{}", b),
            FlatKey::Int(i) => write!(f, "{}", i),
            FlatKey::Text(s) => f.write_str(s),
            FlatKey::Tuple(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 && !matches!(part, FlatKey::List(_)) {
                        f.write_str(".")?;
                    }
                    write!(f, "{}", part)?;
                }
                Ok(())
            }
            FlatKey::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl Serialize for FlatKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Lazily computed keys of one entity.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyCache {
    pub(crate) identity: OnceLock<FlatKey>,
    pub(crate) structural: OnceLock<FlatKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_qualified_name() {
        let key = FlatKey::Tuple(vec![FlatKey::name("public"), FlatKey::Text("users".into())]);
        assert_eq!(key.to_string(), "public.users");
    }

    #[test]
    fn test_display_signature() {
        let int4 = FlatKey::Tuple(vec![FlatKey::name("pg_catalog"), FlatKey::Text("int4".into())]);
        let key = FlatKey::Tuple(vec![
            FlatKey::name("public"),
            FlatKey::Text("add".into()),
            FlatKey::List(vec![int4.clone(), int4]),
        ]);
        assert_eq!(key.to_string(), "public.add(pg_catalog.int4, pg_catalog.int4)");
    }

    #[test]
    fn test_null_sentinel() {
        assert!(FlatKey::text_or_null(None).is_null());
        assert_eq!(FlatKey::text_or_null(Some("x")), FlatKey::Text("x".into()));
    }
}
