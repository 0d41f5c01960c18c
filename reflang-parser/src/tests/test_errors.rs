use crate::*;

#[test]
fn test_missing_semicolon_is_syntax_error() {
    let error = parse_program("x := 1").unwrap_err();

    match &error {
        ParseError::Syntax { src, .. } => assert_eq!(src, "x := 1"),
        other => panic!("Expected syntax error, got {:?}", other),
    }
    assert_eq!(error.offset(), 6);
}

#[test]
fn test_keyword_cannot_be_identifier() {
    assert!(parse_program("while := 1;").is_err());
    assert!(parse_program("fn int() -> int { return 1; }").is_err());
}

#[test]
fn test_integer_overflow() {
    let error = parse_program("x := 2147483648;").unwrap_err();

    match error {
        ParseError::InvalidInteger { src, span, found } => {
            assert_eq!(found, "2147483648");
            assert_eq!(span.offset(), 5);
            assert_eq!(src, "x := 2147483648;");
        }
        other => panic!("Expected invalid integer, got {:?}", other),
    }
}

#[test]
fn test_invalid_string_escape() {
    let error = parse_program(r#"s := "bad \q";"#).unwrap_err();

    match error {
        ParseError::InvalidStringEscape { span, found, .. } => {
            assert_eq!(found, "\\q");
            assert_eq!(span.offset(), 10);
            assert_eq!(span.len(), 2);
        }
        other => panic!("Expected invalid escape, got {:?}", other),
    }
}

#[test]
fn test_function_requires_return_type() {
    assert!(parse_program("fn f() { return 1; }").is_err());
}

#[test]
fn test_parameter_requires_type() {
    let error = parse_program("fn f(a) -> int {}").unwrap_err();

    assert!(matches!(error, ParseError::Syntax { .. }));
    assert!(error.to_string().starts_with("Syntax error"));
}
