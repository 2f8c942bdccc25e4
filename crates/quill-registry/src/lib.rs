//! Model registry: validated model definitions behind an immutable table.
//!
//! Built once from the full set of parsed model drafts, then shared read-only
//! with any number of concurrent compiler invocations. Registration is
//! all-or-nothing: the first invalid draft, in declaration order, fails the
//! whole batch.

use quill_ast::ModelDraft;
use quill_ir::FieldType;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("duplicate model {model:?}")]
    DuplicateModel { model: String },

    #[error("model {model} has a duplicated field {field:?}")]
    DuplicateField { model: String, field: String },

    #[error("{model}.{field} nests a nullable type inside a nullable type")]
    InvalidNesting { model: String, field: String },
}

/// A validated field. Order within a model is declaration order and matters
/// only for default projection ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
}

/// A validated model definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

impl ModelDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Index into the registry's model arena. Plans and query definitions hold
/// one of these (or the model name) rather than a back-pointer, so a registry
/// can be rebuilt wholesale without dangling references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId(usize);

/// Immutable model table: arena of definitions plus a name index.
#[derive(Debug, Clone)]
pub struct Registry {
    models: Vec<ModelDefinition>,
    index: HashMap<String, ModelId>,
}

impl Registry {
    /// Validates and registers a batch of model drafts. Any single invalid
    /// draft fails the entire batch with the first error in declaration
    /// order.
    pub fn build(drafts: Vec<ModelDraft>) -> Result<Self, RegistrationError> {
        let mut models = Vec::with_capacity(drafts.len());
        let mut index = HashMap::with_capacity(drafts.len());

        for draft in drafts {
            if index.contains_key(&draft.name) {
                return Err(RegistrationError::DuplicateModel { model: draft.name });
            }

            let mut fields = Vec::with_capacity(draft.fields.len());
            let mut seen = HashSet::new();
            for field in draft.fields {
                if !seen.insert(field.name.clone()) {
                    return Err(RegistrationError::DuplicateField {
                        model: draft.name,
                        field: field.name,
                    });
                }

                if field.field_type.validate().is_err() {
                    return Err(RegistrationError::InvalidNesting {
                        model: draft.name,
                        field: field.name,
                    });
                }

                fields.push(FieldDefinition {
                    name: field.name,
                    field_type: field.field_type,
                });
            }

            index.insert(draft.name.clone(), ModelId(models.len()));
            models.push(ModelDefinition {
                name: draft.name,
                fields,
            });
        }

        debug!(models = models.len(), "model registry built");

        Ok(Self { models, index })
    }

    pub fn lookup(&self, name: &str) -> Option<&ModelDefinition> {
        self.index.get(name).map(|id| &self.models[id.0])
    }

    pub fn model_id(&self, name: &str) -> Option<ModelId> {
        self.index.get(name).copied()
    }

    pub fn model(&self, id: ModelId) -> &ModelDefinition {
        &self.models[id.0]
    }

    pub fn field_type(&self, model: &str, field: &str) -> Option<&FieldType> {
        self.lookup(model)?.field(field).map(|f| &f.field_type)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Models in registration order.
    pub fn models(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.models.iter()
    }
}
