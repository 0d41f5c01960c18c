use crate::*;

fn binary(expr: &Expression) -> &BinaryOperation {
    match &expr.kind {
        ExpressionKind::BinaryOp(op) => op,
        other => panic!("Expected binary operation, got: {:?}", other),
    }
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let expr = parse_expression("1 + 2 * 3").unwrap();
    let add = binary(&expr);

    assert_eq!(add.operator, BinaryOperator::Add);
    match &add.left.kind {
        ExpressionKind::Integer(lit) => assert_eq!(lit.value, 1),
        _ => panic!("Expected integer on the left"),
    }
    assert_eq!(binary(&add.right).operator, BinaryOperator::Multiply);
}

#[test]
fn test_operators_are_left_associative() {
    let expr = parse_expression("a - b - c").unwrap();
    let outer = binary(&expr);

    assert_eq!(outer.operator, BinaryOperator::Subtract);
    assert_eq!(binary(&outer.left).operator, BinaryOperator::Subtract);
    match &outer.right.kind {
        ExpressionKind::Identifier(id) => assert_eq!(id.name, "c"),
        _ => panic!("Expected identifier on the right"),
    }
}

#[test]
fn test_logical_and_comparison_precedence() {
    let expr = parse_expression("a < 1 || b == c && d").unwrap();
    let or = binary(&expr);

    assert_eq!(or.operator, BinaryOperator::LogicalOr);
    assert_eq!(binary(&or.left).operator, BinaryOperator::Less);

    let and = binary(&or.right);
    assert_eq!(and.operator, BinaryOperator::LogicalAnd);
    assert_eq!(binary(&and.left).operator, BinaryOperator::Equal);
}

#[test]
fn test_parentheses_override_precedence() {
    let expr = parse_expression("(1 + 2) * 3").unwrap();
    let mul = binary(&expr);

    assert_eq!(mul.operator, BinaryOperator::Multiply);
    assert_eq!(binary(&mul.left).operator, BinaryOperator::Add);
}

#[test]
fn test_function_call_arguments() {
    let expr = parse_expression("max(a, 2 + 3, f())").unwrap();

    match &expr.kind {
        ExpressionKind::FunctionCall(call) => {
            assert_eq!(call.callee.name, "max");
            assert_eq!(call.arguments.len(), 3);
            match &call.arguments[2].kind {
                ExpressionKind::FunctionCall(inner) => {
                    assert_eq!(inner.callee.name, "f");
                    assert!(inner.arguments.is_empty());
                }
                _ => panic!("Expected nested call"),
            }
        }
        _ => panic!("Expected function call"),
    }
}

#[test]
fn test_negative_integer_literal() {
    let expr = parse_expression("-42").unwrap();
    match &expr.kind {
        ExpressionKind::Integer(lit) => assert_eq!(lit.value, -42),
        _ => panic!("Expected integer literal"),
    }

    // Subtraction still wins when an operand precedes the minus sign
    let expr = parse_expression("x -1").unwrap();
    assert_eq!(binary(&expr).operator, BinaryOperator::Subtract);
}

#[test]
fn test_integer_bounds() {
    let expr = parse_expression("-2147483648").unwrap();
    match &expr.kind {
        ExpressionKind::Integer(lit) => assert_eq!(lit.value, i32::MIN),
        _ => panic!("Expected integer literal"),
    }
}

#[test]
fn test_string_escapes() {
    let expr = parse_expression(r#""line\n\t\"quoted\" \\""#).unwrap();
    match &expr.kind {
        ExpressionKind::String(lit) => assert_eq!(lit.value, "line\n\t\"quoted\" \\"),
        _ => panic!("Expected string literal"),
    }
}

#[test]
fn test_keyword_prefixed_identifiers() {
    for name in ["iffy", "truthy", "integer", "fnord", "return_value"] {
        let expr = parse_expression(name).unwrap();
        match &expr.kind {
            ExpressionKind::Identifier(id) => assert_eq!(id.name, name),
            other => panic!("Expected identifier for '{}', got {:?}", name, other),
        }
    }
}

#[test]
fn test_boolean_literals() {
    let expr = parse_expression("true == false").unwrap();
    let eq = binary(&expr);

    match (&eq.left.kind, &eq.right.kind) {
        (ExpressionKind::Boolean(l), ExpressionKind::Boolean(r)) => {
            assert!(l.value);
            assert!(!r.value);
        }
        _ => panic!("Expected boolean literals"),
    }
}

#[test]
fn test_binary_span_covers_both_operands() {
    let expr = parse_expression("a + bc").unwrap();
    assert_eq!(expr.span, Span::new(0, 6));
}
