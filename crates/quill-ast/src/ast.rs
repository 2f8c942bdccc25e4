//! Draft types closely following the surface grammar.
//!
//! Builder-style constructors keep draft assembly readable for parsers and
//! tests; fields stay public because drafts are plain data.

use quill_ir::{Cardinality, CompareOp, FieldType};
use serde::{Deserialize, Serialize};

/// An unvalidated model declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDraft {
    pub name: String,
    pub fields: Vec<FieldDraft>,
}

impl ModelDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDraft {
            name: name.into(),
            field_type,
        });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDraft {
    pub name: String,
    pub field_type: FieldType,
}

/// An unvalidated query declaration: a named read operation bound to one
/// model, with declared formal parameters, a result cardinality, a field
/// projection, and an optional filter expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDraft {
    pub name: String,
    pub model: String,
    pub params: Vec<String>,
    pub cardinality: Cardinality,
    pub projection: Vec<String>,
    pub filter: Option<Expr>,
}

impl QueryDraft {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            params: Vec::new(),
            cardinality: Cardinality::All,
            projection: Vec::new(),
            filter: None,
        }
    }

    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(name.into());
        self
    }

    pub fn one(mut self) -> Self {
        self.cardinality = Cardinality::One;
        self
    }

    pub fn all(mut self) -> Self {
        self.cardinality = Cardinality::All;
        self
    }

    pub fn select(mut self, field: impl Into<String>) -> Self {
        self.projection.push(field.into());
        self
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(expr);
        self
    }
}

/// Raw WHERE-clause expression: leaf comparisons of the form
/// `field OP #param`, combined with AND/OR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Compare {
        field: String,
        op: CompareOp,
        param: String,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn compare(field: impl Into<String>, op: CompareOp, param: impl Into<String>) -> Self {
        Expr::Compare {
            field: field.into(),
            op,
            param: param.into(),
        }
    }

    pub fn eq(field: impl Into<String>, param: impl Into<String>) -> Self {
        Self::compare(field, CompareOp::Eq, param)
    }

    pub fn ne(field: impl Into<String>, param: impl Into<String>) -> Self {
        Self::compare(field, CompareOp::Ne, param)
    }

    pub fn lt(field: impl Into<String>, param: impl Into<String>) -> Self {
        Self::compare(field, CompareOp::Lt, param)
    }

    pub fn le(field: impl Into<String>, param: impl Into<String>) -> Self {
        Self::compare(field, CompareOp::Le, param)
    }

    pub fn gt(field: impl Into<String>, param: impl Into<String>) -> Self {
        Self::compare(field, CompareOp::Gt, param)
    }

    pub fn ge(field: impl Into<String>, param: impl Into<String>) -> Self {
        Self::compare(field, CompareOp::Ge, param)
    }

    pub fn and(self, rhs: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(rhs))
    }

    pub fn or(self, rhs: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(rhs))
    }
}
