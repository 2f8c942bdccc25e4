//! Plan executor boundary.
//!
//! A [`CompiledPlan`] reaches storage through the [`PlanExecutor`] trait.
//! Before execution, [`bind_arguments`] enforces the pre-execution contract:
//! every parameter slot in the plan has a caller-supplied argument of a
//! compatible type, and no stray arguments are silently ignored.
//!
//! [`MemoryExecutor`] is a reference implementation over in-memory tables;
//! real storage engines implement the same trait externally.

use quill_ir::{CompiledPlan, FieldType, Value};
use std::collections::HashMap;
use thiserror::Error;

mod memory;

pub use memory::{MemoryExecutor, Row};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("query {query} expected at most one row, matched {matched}")]
    CardinalityViolation { query: String, matched: usize },

    #[error("query {query} is missing argument {parameter:?}")]
    MissingArgument { query: String, parameter: String },

    #[error("query {query} argument {parameter:?} does not match expected type {expected}")]
    ArgumentType {
        query: String,
        parameter: String,
        expected: FieldType,
    },

    #[error("query {query} received unknown argument {argument:?}")]
    UnknownArgument { query: String, argument: String },

    #[error("no stored model {model:?}")]
    UnknownModel { model: String },

    #[error("storage error: {0}")]
    Storage(String),
}

/// Arguments supplied at invocation time, keyed by parameter name.
pub type Arguments = HashMap<String, Value>;

/// The contract a compiled plan uses to reach storage.
pub trait PlanExecutor {
    fn execute(&self, plan: &CompiledPlan, args: &Arguments) -> Result<QueryResult, ExecutionError>;
}

/// Rows in projection order. `Sensitive` columns carry opaque ciphertext
/// handles, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
}

/// Validates caller-supplied arguments against a plan's parameter slots.
///
/// Required before every execution, whether enforced by the executor itself
/// or by a thin adapter in front of it.
pub fn bind_arguments(plan: &CompiledPlan, args: &Arguments) -> Result<(), ExecutionError> {
    for slot in &plan.params {
        match args.get(&slot.name) {
            None => {
                return Err(ExecutionError::MissingArgument {
                    query: plan.query.clone(),
                    parameter: slot.name.clone(),
                })
            }
            Some(value) if !value.matches(&slot.expected) => {
                return Err(ExecutionError::ArgumentType {
                    query: plan.query.clone(),
                    parameter: slot.name.clone(),
                    expected: slot.expected.clone(),
                })
            }
            Some(_) => {}
        }
    }

    for name in args.keys() {
        if !plan.params.iter().any(|slot| &slot.name == name) {
            return Err(ExecutionError::UnknownArgument {
                query: plan.query.clone(),
                argument: name.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_ir::{Cardinality, Ciphertext, CompareOp, FieldRef, ParamSlot, Predicate, ProjectedField};

    fn plan() -> CompiledPlan {
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
                    name: "password".to_string(),
                    field_type: FieldType::Sensitive,
                    sensitive: true,
                },
                op: CompareOp::Eq,
                param: ParamSlot {
                    name: "password".to_string(),
                    expected: FieldType::Sensitive,
                },
            },
            params: vec![ParamSlot {
                name: "password".to_string(),
                expected: FieldType::Sensitive,
            }],
        }
    }

    #[test]
    fn test_missing_argument() {
        let err = bind_arguments(&plan(), &Arguments::new()).unwrap_err();
        assert!(matches!(err, ExecutionError::MissingArgument { parameter, .. } if parameter == "password"));
    }

    #[test]
    fn test_plaintext_for_sensitive_slot_rejected() {
        let args = Arguments::from([("password".to_string(), Value::Text("hunter2".to_string()))]);
        let err = bind_arguments(&plan(), &args).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::ArgumentType { expected: FieldType::Sensitive, .. }
        ));
    }

    #[test]
    fn test_stray_argument_rejected() {
        let args = Arguments::from([
            ("password".to_string(), Value::Ciphertext(Ciphertext::new(vec![1]))),
            ("passwrod".to_string(), Value::Ciphertext(Ciphertext::new(vec![1]))),
        ]);
        let err = bind_arguments(&plan(), &args).unwrap_err();
        assert!(matches!(err, ExecutionError::UnknownArgument { argument, .. } if argument == "passwrod"));
    }

    #[test]
    fn test_well_typed_arguments_bind() {
        let args = Arguments::from([(
            "password".to_string(),
            Value::Ciphertext(Ciphertext::new(vec![0xde, 0xad])),
        )]);
        assert!(bind_arguments(&plan(), &args).is_ok());
    }
}
