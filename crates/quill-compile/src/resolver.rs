//! Expression resolver: raw filter trees to typed predicates.
//!
//! Every leaf is checked against the bound model (field existence, operator
//! legality, parameter declaration) so that nothing reaching the executor is
//! an unvalidated string. Parameter slots record the field's unwrapped base
//! type; the caller-supplied argument is validated against it at invocation
//! time.

use quill_ast::Expr;
use quill_ir::{CompareOp, FieldRef, FieldType, ParamSlot, Predicate};
use quill_registry::ModelDefinition;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("query {query} filters on {model}.{field}, however {model} has no field {field:?}")]
    UnknownField {
        query: String,
        model: String,
        field: String,
    },

    #[error("query {query} applies {op} to {model}.{field} of type {field_type}")]
    InvalidOperator {
        query: String,
        model: String,
        field: String,
        field_type: FieldType,
        op: CompareOp,
    },

    #[error("query {query} uses undeclared parameter {parameter:?}")]
    UndeclaredParameter { query: String, parameter: String },

    #[error("query {query} binds parameter {parameter:?} to both {first} and {second}")]
    ParameterTypeConflict {
        query: String,
        parameter: String,
        first: FieldType,
        second: FieldType,
    },
}

/// Which comparison operators are legal per base type.
///
/// Equality is legal everywhere, except that `Sensitive` admits only `==`
/// (inequality against ciphertext leaks membership the same way ordering
/// would). Ordering defaults to `Timestamp`, `Text`, and `Identifier`; the
/// knobs let a deployment tighten that without touching the resolver.
#[derive(Debug, Clone)]
pub struct OperatorPolicy {
    pub ordering_on_text: bool,
    pub ordering_on_identifier: bool,
}

impl Default for OperatorPolicy {
    fn default() -> Self {
        Self {
            ordering_on_text: true,
            ordering_on_identifier: true,
        }
    }
}

impl OperatorPolicy {
    /// `base` must already be unwrapped of any `Nullable`.
    pub fn allows(&self, base: &FieldType, op: CompareOp) -> bool {
        match base {
            FieldType::Sensitive => op == CompareOp::Eq,
            _ if op.is_equality() => true,
            FieldType::Timestamp => true,
            FieldType::Text(_) => self.ordering_on_text,
            FieldType::Identifier => self.ordering_on_identifier,
            _ => false,
        }
    }
}

/// Resolves one query's filter expression against its bound model.
pub(crate) struct ExprResolver<'a> {
    query: &'a str,
    model: &'a ModelDefinition,
    declared: &'a [String],
    policy: &'a OperatorPolicy,
    slots: Vec<ParamSlot>,
}

impl<'a> ExprResolver<'a> {
    pub(crate) fn new(
        query: &'a str,
        model: &'a ModelDefinition,
        declared: &'a [String],
        policy: &'a OperatorPolicy,
    ) -> Self {
        Self {
            query,
            model,
            declared,
            policy,
            slots: Vec::new(),
        }
    }

    /// Deduplicated parameter slots in first-use order.
    pub(crate) fn into_slots(self) -> Vec<ParamSlot> {
        self.slots
    }

    pub(crate) fn resolve(&mut self, expr: &Expr) -> Result<Predicate, ResolveError> {
        match expr {
            Expr::And(left, right) => Ok(Predicate::And {
                left: Box::new(self.resolve(left)?),
                right: Box::new(self.resolve(right)?),
            }),
            Expr::Or(left, right) => Ok(Predicate::Or {
                left: Box::new(self.resolve(left)?),
                right: Box::new(self.resolve(right)?),
            }),
            Expr::Compare { field, op, param } => self.resolve_compare(field, *op, param),
        }
    }

    fn resolve_compare(
        &mut self,
        field: &str,
        op: CompareOp,
        param: &str,
    ) -> Result<Predicate, ResolveError> {
        let def = self.model.field(field).ok_or_else(|| ResolveError::UnknownField {
            query: self.query.to_string(),
            model: self.model.name.clone(),
            field: field.to_string(),
        })?;

        let (base, _nullable) = def.field_type.unwrap_nullable();
        if !self.policy.allows(base, op) {
            return Err(ResolveError::InvalidOperator {
                query: self.query.to_string(),
                model: self.model.name.clone(),
                field: field.to_string(),
                field_type: def.field_type.clone(),
                op,
            });
        }

        if !self.declared.iter().any(|p| p == param) {
            return Err(ResolveError::UndeclaredParameter {
                query: self.query.to_string(),
                parameter: param.to_string(),
            });
        }

        let expected = base.clone();
        self.record_slot(param, &expected)?;

        Ok(Predicate::Compare {
            field: FieldRef {
                name: def.name.clone(),
                field_type: def.field_type.clone(),
                sensitive: def.field_type.is_sensitive(),
            },
            op,
            param: ParamSlot {
                name: param.to_string(),
                expected,
            },
        })
    }

    fn record_slot(&mut self, param: &str, expected: &FieldType) -> Result<(), ResolveError> {
        match self.slots.iter().find(|s| s.name == param) {
            Some(existing) => {
                // One argument value must satisfy every site the parameter
                // is bound at.
                if !FieldType::comparable(&existing.expected, expected) {
                    return Err(ResolveError::ParameterTypeConflict {
                        query: self.query.to_string(),
                        parameter: param.to_string(),
                        first: existing.expected.clone(),
                        second: expected.clone(),
                    });
                }
            }
            None => self.slots.push(ParamSlot {
                name: param.to_string(),
                expected: expected.clone(),
            }),
        }
        Ok(())
    }
}
