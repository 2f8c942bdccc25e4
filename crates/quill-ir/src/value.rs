//! Runtime value model for plan arguments and rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::FieldType;

/// Opaque handle to an encrypted value.
///
/// Equality is ciphertext-byte equality (meaningful only when both sides are
/// encrypted under the same scheme). There is no accessor that yields
/// plaintext; decryption lives behind a separate collaborator. `Debug` is
/// redacted so the payload cannot leak through logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext(Vec<u8>);

impl Ciphertext {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ciphertext(<{} bytes>)", self.0.len())
    }
}

/// A runtime value, as supplied for a parameter or returned in a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Uuid(Uuid),
    Text(String),
    Ciphertext(Ciphertext),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Checks this value against a field type. `Null` is admitted only by
    /// nullable types; bounded text enforces its length bound; `Sensitive`
    /// is matched only by ciphertext handles.
    pub fn matches(&self, ty: &FieldType) -> bool {
        let (base, nullable) = ty.unwrap_nullable();
        match self {
            Value::Null => nullable,
            Value::Uuid(_) => matches!(base, FieldType::Identifier),
            Value::Text(s) => match base {
                FieldType::Text(max) => max.map_or(true, |m| s.chars().count() <= m as usize),
                _ => false,
            },
            Value::Ciphertext(_) => matches!(base, FieldType::Sensitive),
            Value::Timestamp(_) => matches!(base, FieldType::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}
