use crate::*;
use reflang_parser::parse_program;

fn check(source: &str) -> CheckResult<TypedProgram> {
    let program = parse_program(source).expect("source should parse");
    typecheck_program(&program)
}

fn check_errors(source: &str) -> Vec<TypeError> {
    match check(source) {
        Ok(typed) => panic!("Expected type errors, got:\n{}", typed),
        Err(errors) => errors.errors,
    }
}

fn first_expression_type(typed: &TypedProgram) -> PrimitiveType {
    match &typed.statements.last().unwrap().kind {
        TypedStatementKind::Expression(expr) => expr.resolved_type,
        TypedStatementKind::VarDecl(decl) => decl.resolved_type,
        other => panic!("Expected expression or declaration, got {:?}", other),
    }
}

#[test]
fn test_literal_types() {
    assert_eq!(first_expression_type(&check("1;").unwrap()), PrimitiveType::Int);
    assert_eq!(first_expression_type(&check("\"s\";").unwrap()), PrimitiveType::String);
    assert_eq!(first_expression_type(&check("false;").unwrap()), PrimitiveType::Bool);
}

#[test]
fn test_inferred_declaration_type() {
    let typed = check("name := \"reflang\";").unwrap();
    assert_eq!(first_expression_type(&typed), PrimitiveType::String);
    assert_eq!(typed.symbols[0].ty, PrimitiveType::String);
}

#[test]
fn test_declared_type_mismatch() {
    let errors = check_errors("x: int = true;");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        TypeError::TypeMismatch {
            expected, found, ..
        } => {
            assert_eq!(*expected, PrimitiveType::Int);
            assert_eq!(*found, PrimitiveType::Bool);
        }
        other => panic!("Expected TypeMismatch, got {:?}", other),
    }

    let message = errors[0].to_string();
    assert!(message.contains("int"));
    assert!(message.contains("bool"));
}

#[test]
fn test_untyped_declaration() {
    // Only reachable through the builder; the grammar requires a type or an initializer
    let program = reflang_parser::Program {
        statements: vec![reflang_parser::Statement {
            kind: reflang_parser::StatementKind::VarDecl(reflang_parser::VarDecl {
                name: reflang_parser::Identifier {
                    name: "x".to_string(),
                    span: reflang_parser::Span::new(0, 1),
                },
                declared_type: None,
                initializer: None,
                span: reflang_parser::Span::new(0, 2),
            }),
            span: reflang_parser::Span::new(0, 2),
        }],
        span: reflang_parser::Span::new(0, 2),
    };

    let errors = typecheck_program(&program).unwrap_err();
    assert!(matches!(
        errors.errors[0],
        TypeError::UntypedDeclaration { ref name, .. } if name == "x"
    ));
}

#[test]
fn test_binary_operation_types() {
    assert_eq!(first_expression_type(&check("1 + 2 * 3;").unwrap()), PrimitiveType::Int);
    assert_eq!(first_expression_type(&check("1 < 2;").unwrap()), PrimitiveType::Bool);
    assert_eq!(first_expression_type(&check("1 == 2;").unwrap()), PrimitiveType::Bool);
    assert_eq!(
        first_expression_type(&check("true && false;").unwrap()),
        PrimitiveType::Bool
    );
    assert_eq!(
        first_expression_type(&check("\"a\" + \"b\";").unwrap()),
        PrimitiveType::String
    );
}

#[test]
fn test_binary_operation_mismatch() {
    let errors = check_errors("1 + true;");
    assert!(matches!(
        errors[0],
        TypeError::TypeMismatch {
            expected: PrimitiveType::Int,
            found: PrimitiveType::Bool,
            ..
        }
    ));
}

#[test]
fn test_left_error_short_circuits_right() {
    let errors = check_errors("missing + other;");
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], TypeError::UnresolvedName { ref name, .. } if name == "missing"));
}

#[test]
fn test_unresolved_name_has_label() {
    let errors = check_errors("x := 1;\ny = 2;");
    match &errors[0] {
        TypeError::UnresolvedName { name, span } => {
            assert_eq!(name, "y");
            assert_eq!(span.unwrap().offset(), 8);
        }
        other => panic!("Expected UnresolvedName, got {:?}", other),
    }
}

#[test]
fn test_assignment_type_mismatch() {
    let errors = check_errors("x: int = 1;\nx = \"one\";");
    assert!(matches!(
        errors[0],
        TypeError::TypeMismatch {
            expected: PrimitiveType::Int,
            found: PrimitiveType::String,
            ..
        }
    ));
}

#[test]
fn test_duplicate_top_level_declaration() {
    let errors = check_errors("x: int = 1;\nx: int = 2;");
    match &errors[0] {
        TypeError::DuplicateDeclaration {
            name,
            span,
            previous,
        } => {
            assert_eq!(name, "x");
            assert_eq!(span.unwrap().offset(), 12);
            assert_eq!(previous.unwrap().offset(), 0);
        }
        other => panic!("Expected DuplicateDeclaration, got {:?}", other),
    }
}

#[test]
fn test_block_shadowing_is_allowed() {
    let typed = check("x: int = 1;\n{ x: bool = true; x = false; }\nx = 2;").unwrap();
    assert_eq!(typed.symbols.len(), 2);
}

#[test]
fn test_self_reference_in_initializer_uses_outer_binding() {
    let typed = check("x: int = 1;\n{ x := x + 1; }").unwrap();
    match &typed.statements[1].kind {
        TypedStatementKind::Block(block) => match &block.statements[0].kind {
            TypedStatementKind::VarDecl(decl) => match &decl.initializer.as_ref().unwrap().kind {
                TypedExpressionKind::BinaryOp { left, .. } => match &left.kind {
                    TypedExpressionKind::Identifier(id) => assert_eq!(id.symbol, SymbolId(0)),
                    other => panic!("Expected identifier, got {:?}", other),
                },
                other => panic!("Expected binary operation, got {:?}", other),
            },
            other => panic!("Expected declaration, got {:?}", other),
        },
        other => panic!("Expected block, got {:?}", other),
    }
}

#[test]
fn test_top_level_errors_are_collected() {
    let errors = check_errors("a: int = true;\nb := missing;\nc: bool = 1;");
    assert_eq!(errors.len(), 3);
}

#[test]
fn test_block_reports_every_statement_error() {
    let errors = check_errors("{ a: int = true; b := missing; }");
    assert_eq!(errors.len(), 2);
}

#[test]
fn test_error_messages_are_newline_joined() {
    let errors = check("a: int = true;\nb := missing;").unwrap_err();
    let rendered = errors.to_string();
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Type mismatch: expected int, found bool");
    assert_eq!(lines[1], "Unresolved name `missing`");
}

#[test]
fn test_typecheck_is_idempotent() {
    let source = "fn inc(n: int) -> int { return n + 1; }\ntotal: int = 0;\ntotal = inc(total);";
    let program = parse_program(source).unwrap();

    let first = typecheck_program(&program).unwrap();
    let second = typecheck_program(&program).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_typed_program_rendering() {
    let typed = check("n := 3;\nflag := n > 2;").unwrap();
    assert_eq!(typed.to_string(), "n: int = 3;\nflag: bool = n > 2;");
}
