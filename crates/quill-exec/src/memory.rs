//! In-memory reference executor.

use quill_ir::{Cardinality, CompareOp, CompiledPlan, Predicate, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use crate::{bind_arguments, Arguments, ExecutionError, PlanExecutor, QueryResult};

/// One stored record, keyed by field name. Absent fields read as `Null`.
pub type Row = HashMap<String, Value>;

/// Table store for tests and embedding without a storage engine.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    tables: HashMap<String, Vec<Row>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: impl Into<String>, row: Row) {
        self.tables.entry(model.into()).or_default().push(row);
    }
}

impl PlanExecutor for MemoryExecutor {
    fn execute(&self, plan: &CompiledPlan, args: &Arguments) -> Result<QueryResult, ExecutionError> {
        bind_arguments(plan, args)?;

        let rows = self
            .tables
            .get(&plan.model)
            .ok_or_else(|| ExecutionError::UnknownModel {
                model: plan.model.clone(),
            })?;

        let mut out = Vec::new();
        for row in rows {
            if eval(&plan.predicate, row, args) {
                let projected = plan
                    .projection
                    .iter()
                    .map(|f| row.get(&f.name).cloned().unwrap_or(Value::Null))
                    .collect();
                out.push(projected);
            }
        }

        if plan.cardinality == Cardinality::One && out.len() > 1 {
            return Err(ExecutionError::CardinalityViolation {
                query: plan.query.clone(),
                matched: out.len(),
            });
        }

        // Only names and counts are logged; projected values may be sensitive.
        debug!(query = %plan.query, model = %plan.model, rows = out.len(), "plan executed");

        Ok(QueryResult {
            columns: plan.columns().map(str::to_string).collect(),
            row_count: out.len(),
            rows: out,
        })
    }
}

/// Left-to-right, short-circuit evaluation. The compiler only guarantees the
/// truth table; the evaluation order here is this executor's choice.
fn eval(predicate: &Predicate, row: &Row, args: &Arguments) -> bool {
    match predicate {
        Predicate::True => true,
        Predicate::And { left, right } => eval(left, row, args) && eval(right, row, args),
        Predicate::Or { left, right } => eval(left, row, args) || eval(right, row, args),
        Predicate::Compare { field, op, param } => {
            let stored = row.get(&field.name).unwrap_or(&Value::Null);
            let Some(arg) = args.get(&param.name) else {
                // bind_arguments already guaranteed presence.
                return false;
            };
            compare(stored, arg, *op)
        }
    }
}

/// A comparison touching `Null` on either side is false (three-valued logic
/// collapsed at the leaf).
fn compare(stored: &Value, arg: &Value, op: CompareOp) -> bool {
    if stored.is_null() || arg.is_null() {
        return false;
    }

    match op {
        CompareOp::Eq => stored == arg,
        CompareOp::Ne => stored != arg,
        _ => match ordering(stored, arg) {
            Some(Ordering::Less) => matches!(op, CompareOp::Lt | CompareOp::Le),
            Some(Ordering::Equal) => matches!(op, CompareOp::Le | CompareOp::Ge),
            Some(Ordering::Greater) => matches!(op, CompareOp::Gt | CompareOp::Ge),
            None => false,
        },
    }
}

fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        // Ciphertext and mismatched kinds have no order.
        _ => None,
    }
}
