//! Field type lattice for Quill models

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("a nullable type cannot wrap another nullable type")]
    InvalidNesting,
}

/// The type of a single model field.
///
/// `Nullable` wraps exactly one non-nullable base type; double wrapping is
/// rejected by [`FieldType::validate`] at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// Opaque fixed-layout unique key.
    Identifier,
    /// Character data with an optional length bound.
    Text(Option<u32>),
    /// Stored encrypted; values only ever surface as opaque ciphertext.
    Sensitive,
    Timestamp,
    Nullable(Box<FieldType>),
}

impl FieldType {
    /// Strips at most one `Nullable` wrapper, returning the base type and
    /// whether the field admits null.
    pub fn unwrap_nullable(&self) -> (&FieldType, bool) {
        match self {
            FieldType::Nullable(inner) => (inner, true),
            other => (other, false),
        }
    }

    /// The base type ignoring nullability.
    pub fn base(&self) -> &FieldType {
        self.unwrap_nullable().0
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, FieldType::Nullable(_))
    }

    /// True for `Sensitive` under any wrapping.
    pub fn is_sensitive(&self) -> bool {
        matches!(self.base(), FieldType::Sensitive)
    }

    /// Checks well-formedness. The only malformed shape expressible is a
    /// doubly-nullable type.
    pub fn validate(&self) -> Result<(), TypeError> {
        match self {
            FieldType::Nullable(inner) if inner.is_nullable() => Err(TypeError::InvalidNesting),
            _ => Ok(()),
        }
    }

    /// Equality comparability: same base kind ignoring nullability and text
    /// length bounds. If either side is `Sensitive`, both must be, so a
    /// sensitive field can never be compared against a plaintext type.
    pub fn comparable(a: &FieldType, b: &FieldType) -> bool {
        match (a.base(), b.base()) {
            (FieldType::Identifier, FieldType::Identifier) => true,
            (FieldType::Text(_), FieldType::Text(_)) => true,
            (FieldType::Sensitive, FieldType::Sensitive) => true,
            (FieldType::Timestamp, FieldType::Timestamp) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Identifier => write!(f, "Identifier"),
            FieldType::Text(None) => write!(f, "Text"),
            FieldType::Text(Some(max)) => write!(f, "Text({max})"),
            FieldType::Sensitive => write!(f, "Sensitive"),
            FieldType::Timestamp => write!(f, "Timestamp"),
            FieldType::Nullable(inner) => write!(f, "{inner}?"),
        }
    }
}
