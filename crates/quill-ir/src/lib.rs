//! Quill Intermediate Representation (IR)
//!
//! Resolved, validated forms produced by the compiler: predicate trees whose
//! field slots carry `(name, type)` pairs validated against the registry and
//! whose parameter slots carry `(name, expected type)` pairs. All types are
//! deterministically serializable so callers can cache plans by fingerprint.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

mod types;
mod value;

pub use types::{FieldType, TypeError};
pub use value::{Ciphertext, Value};

/// Comparison operator in a WHERE-clause leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn is_equality(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    pub fn is_ordering(self) -> bool {
        !self.is_equality()
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        write!(f, "{s}")
    }
}

/// Contract on how many rows a query may legitimately return.
///
/// `One` is not a compile-time uniqueness check: the executor must return at
/// most one row and signal an error if more than one matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    One,
    All,
}

/// A field reference validated against the bound model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    pub name: String,
    pub field_type: FieldType,
    /// Set for `Sensitive` fields so executors treat the value as opaque.
    pub sensitive: bool,
}

/// A named parameter slot. The caller-supplied argument is validated against
/// `expected` (the filtered field's unwrapped base type) before execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSlot {
    pub name: String,
    pub expected: FieldType,
}

/// Resolved WHERE-clause tree. Every leaf is a validated field slot compared
/// against a named parameter slot; values are never inlined, so nothing
/// unvalidated can reach the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Predicate {
    /// Selects unconditionally (a query with no WHERE clause).
    True,
    Compare {
        field: FieldRef,
        op: CompareOp,
        param: ParamSlot,
    },
    And {
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
    Or {
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
}

impl Predicate {
    /// Visits every parameter slot, left to right.
    pub fn for_each_param<'a>(&'a self, f: &mut impl FnMut(&'a ParamSlot)) {
        match self {
            Predicate::True => {}
            Predicate::Compare { param, .. } => f(param),
            Predicate::And { left, right } | Predicate::Or { left, right } => {
                left.for_each_param(f);
                right.for_each_param(f);
            }
        }
    }
}

/// A projected output field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedField {
    pub name: String,
    pub field_type: FieldType,
    /// Sensitive values arrive as opaque ciphertext handles and must not be
    /// logged or cached in cleartext by the executor.
    pub sensitive: bool,
}

/// The validated, executable form of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledPlan {
    /// Name of the query this plan was compiled from.
    pub query: String,
    /// Name of the bound model in the registry.
    pub model: String,
    pub cardinality: Cardinality,
    pub projection: Vec<ProjectedField>,
    pub predicate: Predicate,
    /// Deduplicated parameter slots in first-use order over the predicate.
    pub params: Vec<ParamSlot>,
}

impl CompiledPlan {
    /// Calculate fingerprint (SHA-256) for deterministic caching.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("plan should always serialize");
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.projection.iter().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> CompiledPlan {
        CompiledPlan {
            query: "Login".to_string(),
            model: "User".to_string(),
            cardinality: Cardinality::One,
            projection: vec![ProjectedField {
                name: "user_id".to_string(),
                field_type: FieldType::Identifier,
                sensitive: false,
            }],
            predicate: Predicate::Compare {
                field: FieldRef {
                    name: "username".to_string(),
                    field_type: FieldType::Text(Some(32)),
                    sensitive: false,
                },
                op: CompareOp::Eq,
                param: ParamSlot {
                    name: "username".to_string(),
                    expected: FieldType::Text(Some(32)),
                },
            },
            params: vec![ParamSlot {
                name: "username".to_string(),
                expected: FieldType::Text(Some(32)),
            }],
        }
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let plan = sample_plan();
        assert_eq!(plan.fingerprint(), plan.clone().fingerprint());
    }

    #[test]
    fn test_json_round_trip() {
        let plan = sample_plan();
        let json = serde_json::to_string(&plan).unwrap();
        let parsed: CompiledPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, parsed);
        assert_eq!(plan.fingerprint(), parsed.fingerprint());
    }

    #[test]
    fn test_for_each_param_order() {
        let leaf = |field: &str, param: &str| Predicate::Compare {
            field: FieldRef {
                name: field.to_string(),
                field_type: FieldType::Text(None),
                sensitive: false,
            },
            op: CompareOp::Eq,
            param: ParamSlot {
                name: param.to_string(),
                expected: FieldType::Text(None),
            },
        };

        let pred = Predicate::And {
            left: Box::new(leaf("a", "first")),
            right: Box::new(Predicate::Or {
                left: Box::new(leaf("b", "second")),
                right: Box::new(leaf("c", "third")),
            }),
        };

        let mut seen = Vec::new();
        pred.for_each_param(&mut |slot| seen.push(slot.name.clone()));
        assert_eq!(seen, vec!["first", "second", "third"]);
    }
}
