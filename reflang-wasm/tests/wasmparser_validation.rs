// Compiled modules checked by an independent WebAssembly validator

use pretty_assertions::assert_eq;
use reflang_wasm::{compile_source, CompileError, CompileOptions, EmitError};
use wasmparser::{ExternalKind, Parser, Payload, Validator};

const FIBONACCI: &str = r#"
extern fn print(value: int) -> int;

limit: int = 10;
doubled := limit * 2;

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

fn sign(n: int) -> int {
    if (n < 0) {
        return -1;
    }
    if (n == 0 || n % 2 == 0 && false) {
        return 0;
    }
    return 1;
}

if (limit > 0) {
    print(fib(limit));
} else {
    print(sign(doubled));
}
"#;

fn compile(source: &str) -> Vec<u8> {
    compile_source(source, &CompileOptions::default())
        .unwrap_or_else(|error| panic!("compilation failed: {:?}", error))
        .bytes
}

#[test]
fn test_fibonacci_module_is_valid() {
    let bytes = compile(FIBONACCI);
    Validator::new().validate_all(&bytes).unwrap();
}

#[test]
fn test_fibonacci_module_layout() {
    let bytes = compile(FIBONACCI);

    let mut sections = Vec::new();
    let mut exports = Vec::new();
    let mut start = None;
    for payload in Parser::new(0).parse_all(&bytes) {
        match payload.unwrap() {
            Payload::TypeSection(_) => sections.push("type"),
            Payload::ImportSection(_) => sections.push("import"),
            Payload::FunctionSection(_) => sections.push("function"),
            Payload::MemorySection(_) => sections.push("memory"),
            Payload::GlobalSection(_) => sections.push("global"),
            Payload::ExportSection(reader) => {
                sections.push("export");
                for export in reader {
                    let export = export.unwrap();
                    assert_eq!(export.kind, ExternalKind::Func);
                    exports.push((export.name.to_string(), export.index));
                }
            }
            Payload::StartSection { func, .. } => {
                sections.push("start");
                start = Some(func);
            }
            Payload::CodeSectionStart { .. } => sections.push("code"),
            _ => {}
        }
    }

    assert_eq!(
        sections,
        vec!["type", "import", "function", "memory", "global", "export", "start", "code"]
    );
    assert_eq!(
        exports,
        vec![("fib".to_string(), 1), ("sign".to_string(), 2)]
    );
    assert_eq!(start, Some(3));
}

#[test]
fn test_small_programs_are_valid() {
    let programs = [
        "",
        "x: int = 1;",
        "flag := 1 < 2;",
        "fn id(a: int) -> int { return a; }",
        "fn loop_forever() -> int { while (true) { } }",
        "fn pick(c: bool, a: int, b: int) -> int { r := b; if (c) { r = a; } return r; }",
        "extern fn tick() -> int; tick(); tick();",
        "counter := 0; while (counter < 3) { counter = counter + 1; }",
    ];

    for source in programs {
        let bytes = compile(source);
        if let Err(error) = Validator::new().validate_all(&bytes) {
            panic!("invalid module for {:?}: {}", source, error);
        }
    }
}

#[test]
fn test_unvalidated_output_matches_validated_output() {
    let validated = compile(FIBONACCI);
    let options = CompileOptions {
        validate: false,
        ..CompileOptions::default()
    };
    let unvalidated = compile_source(FIBONACCI, &options).unwrap().bytes;
    assert_eq!(validated, unvalidated);
}

#[test]
fn test_type_errors_stop_compilation() {
    match compile_source("x: int = true;", &CompileOptions::default()) {
        Err(CompileError::Typecheck(errors)) => {
            assert_eq!(errors.len(), 1);
            let message = errors.to_string();
            assert!(message.contains("int"));
            assert!(message.contains("bool"));
        }
        other => panic!("Expected type errors, got {:?}", other.map(|m| m.bytes)),
    }
}

#[test]
fn test_strings_cannot_be_lowered() {
    let result = compile_source(
        "extern fn greet(name: string) -> int;",
        &CompileOptions::default(),
    );
    assert!(matches!(
        result,
        Err(CompileError::Emit(EmitError::UnsupportedType { .. }))
    ));
}
