//! End-to-end draft -> registry -> plan pipeline tests.

use quill_ast::{Expr, ModelDraft, QueryDraft};
use quill_compile::{CompileError, Compiler, ResolveError};
use quill_ir::{Cardinality, FieldType, Predicate};
use quill_registry::Registry;

fn schema() -> Vec<ModelDraft> {
    vec![
        ModelDraft::new("User")
            .field("user_id", FieldType::Identifier)
            .field("username", FieldType::Text(Some(32)))
            .field("email", FieldType::Text(None))
            .field("password", FieldType::Sensitive)
            .field("updated_at", FieldType::Nullable(Box::new(FieldType::Timestamp))),
        ModelDraft::new("Session")
            .field("session_id", FieldType::Identifier)
            .field("user_id", FieldType::Identifier)
            .field("expires_at", FieldType::Timestamp),
    ]
}

#[test]
fn login_compiles_with_typed_parameter_slots() {
    let registry = Registry::build(schema()).unwrap();
    let compiler = Compiler::new(&registry);

    let plan = compiler
        .compile(
            &QueryDraft::new("Login", "User")
                .param("username")
                .param("password")
                .one()
                .select("user_id")
                .select("username")
                .select("email")
                .filter(Expr::eq("username", "username").and(Expr::eq("password", "password"))),
        )
        .unwrap();

    assert_eq!(plan.query, "Login");
    assert_eq!(plan.cardinality, Cardinality::One);
    assert_eq!(plan.columns().collect::<Vec<_>>(), vec!["user_id", "username", "email"]);

    // The projection excludes password and updated_at; the parameter slots
    // carry the unwrapped base types for argument validation.
    assert!(plan.columns().all(|c| c != "password" && c != "updated_at"));
    assert_eq!(plan.params[0].name, "username");
    assert_eq!(plan.params[0].expected, FieldType::Text(Some(32)));
    assert_eq!(plan.params[1].name, "password");
    assert_eq!(plan.params[1].expected, FieldType::Sensitive);
}

#[test]
fn one_bad_query_does_not_poison_others() {
    let registry = Registry::build(schema()).unwrap();
    let compiler = Compiler::new(&registry);

    let bad = QueryDraft::new("Broken", "Widget").select("id");
    let good = QueryDraft::new("Sessions", "Session")
        .select("session_id")
        .select("expires_at");

    assert!(matches!(
        compiler.compile(&bad),
        Err(CompileError::UnknownModel { model, .. }) if model == "Widget"
    ));

    let plan = compiler.compile(&good).unwrap();
    assert_eq!(plan.model, "Session");
    assert_eq!(plan.predicate, Predicate::True);
}

#[test]
fn plans_are_cacheable_by_fingerprint() {
    let registry = Registry::build(schema()).unwrap();
    let compiler = Compiler::new(&registry);

    let draft = QueryDraft::new("Expiring", "Session")
        .param("cutoff")
        .select("session_id")
        .filter(Expr::le("expires_at", "cutoff"));

    let a = compiler.compile(&draft).unwrap();
    let b = compiler.compile(&draft).unwrap();
    assert_eq!(a.fingerprint(), b.fingerprint());

    let other = compiler
        .compile(&QueryDraft::new("Expiring2", "Session")
            .param("cutoff")
            .select("session_id")
            .filter(Expr::le("expires_at", "cutoff")))
        .unwrap();
    assert_ne!(a.fingerprint(), other.fingerprint());
}

#[test]
fn resolver_errors_surface_through_compile_error() {
    let registry = Registry::build(schema()).unwrap();
    let compiler = Compiler::new(&registry);

    let draft = QueryDraft::new("Bad", "Session")
        .param("id")
        .select("session_id")
        .filter(Expr::eq("owner", "id"));

    match compiler.compile(&draft) {
        Err(CompileError::Resolve(ResolveError::UnknownField { model, field, .. })) => {
            assert_eq!(model, "Session");
            assert_eq!(field, "owner");
        }
        other => panic!("expected unknown field, got {other:?}"),
    }
}

#[test]
fn shared_registry_compiles_from_multiple_threads() {
    let registry = Registry::build(schema()).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let compiler = Compiler::new(&registry);
                let plan = compiler
                    .compile(
                        &QueryDraft::new("ByName", "User")
                            .param("username")
                            .select("user_id")
                            .filter(Expr::eq("username", "username")),
                    )
                    .unwrap();
                assert_eq!(plan.model, "User");
            });
        }
    });
}
