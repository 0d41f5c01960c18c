// Whole-program type checking through the public API

use miette::Diagnostic;
use pretty_assertions::assert_eq;
use reflang_parser::parse_program;
use reflang_typechecker::{typecheck_program, PrimitiveType, TypeError, TypedStatementKind};

const FIBONACCI: &str = r#"
extern fn print(value: int) -> int;

limit: int = 10;

fn fib(n: int) -> int {
    a := 0;
    b := 1;
    i := 0;
    while (i < n) {
        next := a + b;
        a = b;
        b = next;
        i = i + 1;
    }
    return a;
}

if (limit > 0) {
    print(fib(limit));
} else {
    print(0);
}
"#;

#[test]
fn test_fibonacci_program_typechecks() {
    let program = parse_program(FIBONACCI).unwrap();
    let typed = typecheck_program(&program).expect("program should type-check");

    let names: Vec<&str> = typed.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["print", "fib"]);

    let limit = typed
        .symbols
        .iter()
        .find(|symbol| symbol.name == "limit")
        .unwrap();
    assert_eq!(limit.ty, PrimitiveType::Int);
    assert_eq!(limit.scope.0, 0);

    match &typed.statements[3].kind {
        TypedStatementKind::If(if_stmt) => {
            assert_eq!(if_stmt.condition.resolved_type, PrimitiveType::Bool);
            assert!(if_stmt.else_block.is_some());
        }
        other => panic!("Expected if statement, got {:?}", other),
    }
}

#[test]
fn test_typed_rendering_spells_out_inferred_types() {
    let program = parse_program("fn f(n: int) -> int {\n    m := n * 2;\n    return m;\n}").unwrap();
    let typed = typecheck_program(&program).unwrap();

    assert_eq!(
        typed.to_string(),
        "fn f(n: int) -> int {\n    m: int = n * 2;\n    return m;\n}"
    );
}

#[test]
fn test_errors_are_diagnostics() {
    let program = parse_program("x: int = true;\nwhile (5) {}").unwrap();
    let errors = typecheck_program(&program).unwrap_err();

    assert_eq!(errors.len(), 2);
    assert!(matches!(errors.errors[0], TypeError::TypeMismatch { .. }));
    assert!(matches!(errors.errors[1], TypeError::ExpectedBool { .. }));

    let related: Vec<String> = errors
        .related()
        .unwrap()
        .map(|diagnostic| diagnostic.to_string())
        .collect();
    assert_eq!(related.len(), 2);

    let code = errors.errors[1].code().unwrap().to_string();
    assert_eq!(code, "reflang::typecheck::expected_bool");
    assert_eq!(errors.errors[1].span().unwrap().offset(), 22);
}
