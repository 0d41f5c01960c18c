use crate::*;
use pretty_assertions::assert_eq;
use reflang_parser::{parse_program, PrimitiveType};
use reflang_typechecker::typecheck_program;

fn emit(source: &str, options: &CompileOptions) -> Result<WasmBuilder, EmitError> {
    let program = parse_program(source).unwrap();
    let typed = typecheck_program(&program).unwrap();
    emit_program(&typed, options)
}

fn emit_default(source: &str) -> WasmBuilder {
    emit(source, &CompileOptions::default()).unwrap()
}

#[test]
fn test_while_lowering() {
    let builder =
        emit_default("fn count(n: int) -> int { i := 0; while (i < n) { i = i + 1; } return i; }");

    let body = builder.body(0).unwrap();
    assert_eq!(body.locals, vec![ValType::I32]);
    assert_eq!(
        body.code,
        vec![
            0x41, 0x00, 0x21, 0x01, // i := 0
            0x02, 0x40, 0x03, 0x40, // block loop
            0x20, 0x01, 0x20, 0x00, 0x48, // i < n
            0x45, 0x0d, 0x01, // i32.eqz br_if 1
            0x20, 0x01, 0x41, 0x01, 0x6a, 0x21, 0x01, // i = i + 1
            0x0c, 0x00, 0x0b, 0x0b, // br 0 end end
            0x20, 0x01, 0x0b, // return i
        ]
    );
    assert_eq!(builder.exports()[0].name, "count");
    assert_eq!(builder.start(), None);
}

#[test]
fn test_globals_and_start_function() {
    let builder = emit_default("x: int = 5; y := x + 1; flag: bool; on := true;");

    let inits: Vec<ConstValue> = builder.globals().iter().map(|g| g.init).collect();
    assert_eq!(
        inits,
        vec![
            ConstValue::I32(5),
            ConstValue::I32(0),
            ConstValue::I32(0),
            ConstValue::I32(1)
        ]
    );
    assert!(builder.globals().iter().all(|g| g.global_type.mutable));

    let start = builder.start().unwrap();
    assert_eq!(
        builder.body(start).unwrap().code,
        vec![0x23, 0x00, 0x41, 0x01, 0x6a, 0x24, 0x01, 0x0b]
    );
}

#[test]
fn test_constant_globals_need_no_start_function() {
    let builder = emit_default("x: int = 5;");
    assert_eq!(builder.start(), None);
    assert_eq!(builder.function_count(), 0);
}

#[test]
fn test_externs_are_imported_before_defined_functions() {
    let source = "extern fn log(v: int) -> int;\n\
                  fn main() -> int { return log(1); }\n\
                  extern fn trace(v: int) -> int;";
    let builder = emit_default(source);

    let names: Vec<(&str, &str)> = builder
        .imports()
        .iter()
        .map(|import| (import.module.as_str(), import.name.as_str()))
        .collect();
    assert_eq!(names, vec![("env", "log"), ("env", "trace")]);
    assert_eq!(builder.imported_function_count(), 2);

    assert_eq!(builder.exports()[0].function, 2);
    assert_eq!(builder.body(2).unwrap().code, vec![0x41, 0x01, 0x10, 0x00, 0x0b]);
}

#[test]
fn test_custom_import_module() {
    let options = CompileOptions {
        import_module: "host".to_string(),
        ..CompileOptions::default()
    };
    let builder = emit("extern fn now() -> int;", &options).unwrap();
    assert_eq!(builder.imports()[0].module, "host");
}

#[test]
fn test_body_without_trailing_return_ends_unreachable() {
    let builder = emit_default(
        "fn f(a: int) -> int { a + 1; if (a > 0) { return 1; } else { return 2; } }",
    );

    assert_eq!(
        builder.body(0).unwrap().code,
        vec![
            0x20, 0x00, 0x41, 0x01, 0x6a, 0x1a, // a + 1; drop
            0x20, 0x00, 0x41, 0x00, 0x4a, 0x04, 0x40, // if (a > 0)
            0x41, 0x01, 0x0f, // return 1
            0x05, 0x41, 0x02, 0x0f, // else return 2
            0x0b, 0x00, 0x0b,
        ]
    );
    assert!(builder.validate().is_ok());
}

#[test]
fn test_uninitialized_local_is_zeroed() {
    let builder = emit_default("fn g() -> int { n: int; return n; }");
    assert_eq!(
        builder.body(0).unwrap().code,
        vec![0x41, 0x00, 0x21, 0x00, 0x20, 0x00, 0x0b]
    );
}

#[test]
fn test_shadowed_locals_get_distinct_slots() {
    let builder = emit_default("fn h(a: int) -> int { b := a; { b := 2; b = 3; } return b; }");

    let body = builder.body(0).unwrap();
    assert_eq!(body.locals.len(), 2);
    assert_eq!(
        body.code,
        vec![
            0x20, 0x00, 0x21, 0x01, // b := a
            0x41, 0x02, 0x21, 0x02, // inner b := 2
            0x41, 0x03, 0x21, 0x02, // inner b = 3
            0x20, 0x01, 0x0b, // return outer b
        ]
    );
}

#[test]
fn test_exports_can_be_disabled() {
    let options = CompileOptions {
        export_functions: false,
        ..CompileOptions::default()
    };
    let builder = emit("fn one() -> int { return 1; }", &options).unwrap();
    assert!(builder.exports().is_empty());
}

#[test]
fn test_string_values_are_unsupported() {
    let error = emit("s := \"hi\";", &CompileOptions::default()).unwrap_err();
    match error {
        EmitError::UnsupportedType { ty, span, .. } => {
            assert_eq!(ty, PrimitiveType::String);
            assert!(span.is_some());
        }
        other => panic!("Expected unsupported type, got {:?}", other),
    }

    let error = emit("extern fn puts(s: string) -> int;", &CompileOptions::default()).unwrap_err();
    assert!(matches!(error, EmitError::UnsupportedType { .. }));
}

#[test]
fn test_module_name_is_kept_on_builder() {
    let options = CompileOptions {
        module_name: Some("demo".to_string()),
        ..CompileOptions::default()
    };
    let builder = emit("x := 1;", &options).unwrap();
    assert_eq!(builder.name(), Some("demo"));
}

#[test]
fn test_compile_source_produces_valid_header() {
    let module = compile_source("fn add(a: int, b: int) -> int { return a + b; }", &CompileOptions::default())
        .unwrap();
    assert!(module.hex().starts_with("0061736d01000000"));
    assert_eq!(module.program.functions.len(), 1);
}

#[test]
fn test_compile_errors_keep_their_stage() {
    let options = CompileOptions::default();

    assert!(matches!(
        compile_source("x: int = ;", &options),
        Err(CompileError::Parse(_))
    ));
    assert!(matches!(
        compile_source("x: int = true;", &options),
        Err(CompileError::Typecheck(_))
    ));
    assert!(matches!(
        compile_source("s := \"text\";", &options),
        Err(CompileError::Emit(_))
    ));
}
