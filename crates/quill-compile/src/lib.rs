//! Query compiler: validated, executable plans from query drafts.
//!
//! Validates the draft's model binding, declared parameters, projection, and
//! filter against an immutable [`Registry`], then emits a [`CompiledPlan`]
//! for the plan executor. Compilation is pure: the same draft against the
//! same registry always yields a structurally identical plan, so callers may
//! cache plans by fingerprint.

use quill_ast::QueryDraft;
use quill_ir::{CompiledPlan, Predicate, ProjectedField};
use quill_registry::Registry;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

mod resolver;

pub use resolver::{OperatorPolicy, ResolveError};

use resolver::ExprResolver;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("query {query} selects from unknown model {model:?}")]
    UnknownModel { query: String, model: String },

    #[error("query {query} projects {model}.{field}, however {model} has no field {field:?}")]
    UnknownField {
        query: String,
        model: String,
        field: String,
    },

    #[error("query {query} projects field {field:?} more than once")]
    DuplicateProjection { query: String, field: String },

    #[error("query {query} must select at least one field")]
    EmptyProjection { query: String },

    #[error("query {query} declares a duplicate parameter {parameter:?}")]
    DuplicateParameter { query: String, parameter: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Compiles query drafts against one registry snapshot.
///
/// Holds the registry by reference; any number of compilers (and compile
/// calls) may share a registry concurrently once it is built.
pub struct Compiler<'a> {
    registry: &'a Registry,
    policy: OperatorPolicy,
}

impl<'a> Compiler<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            policy: OperatorPolicy::default(),
        }
    }

    pub fn with_policy(registry: &'a Registry, policy: OperatorPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn compile(&self, draft: &QueryDraft) -> Result<CompiledPlan, CompileError> {
        let model = self
            .registry
            .lookup(&draft.model)
            .ok_or_else(|| CompileError::UnknownModel {
                query: draft.name.clone(),
                model: draft.model.clone(),
            })?;

        let mut declared = HashSet::new();
        for param in &draft.params {
            if !declared.insert(param.as_str()) {
                return Err(CompileError::DuplicateParameter {
                    query: draft.name.clone(),
                    parameter: param.clone(),
                });
            }
        }

        if draft.projection.is_empty() {
            return Err(CompileError::EmptyProjection {
                query: draft.name.clone(),
            });
        }

        let mut projection = Vec::with_capacity(draft.projection.len());
        let mut projected = HashSet::new();
        for name in &draft.projection {
            let def = model.field(name).ok_or_else(|| CompileError::UnknownField {
                query: draft.name.clone(),
                model: model.name.clone(),
                field: name.clone(),
            })?;

            if !projected.insert(name.as_str()) {
                return Err(CompileError::DuplicateProjection {
                    query: draft.name.clone(),
                    field: name.clone(),
                });
            }

            projection.push(ProjectedField {
                name: def.name.clone(),
                field_type: def.field_type.clone(),
                sensitive: def.field_type.is_sensitive(),
            });
        }

        let (predicate, params) = match &draft.filter {
            Some(expr) => {
                let mut resolver =
                    ExprResolver::new(&draft.name, model, &draft.params, &self.policy);
                let predicate = resolver.resolve(expr)?;
                (predicate, resolver.into_slots())
            }
            None => (Predicate::True, Vec::new()),
        };

        debug!(query = %draft.name, model = %draft.model, params = params.len(), "query compiled");

        Ok(CompiledPlan {
            query: draft.name.clone(),
            model: model.name.clone(),
            cardinality: draft.cardinality,
            projection,
            predicate,
            params,
        })
    }
}
