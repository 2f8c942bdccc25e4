//! Quill AST - draft model and query types
//!
//! The parsed-but-unvalidated input boundary. A surface-syntax parser (an
//! external collaborator) produces these drafts; nothing here is checked
//! against a registry yet.

pub mod ast;

pub use ast::*;
