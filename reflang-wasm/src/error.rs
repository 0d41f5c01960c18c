//! Error types for module encoding, validation and code generation.
//!
//! Uses the same miette conventions as the parser and typechecker so the
//! CLI can render every stage uniformly.

use crate::types::{FuncType, ValType};
use miette::{Diagnostic, SourceSpan};
use reflang_parser::PrimitiveType;
use thiserror::Error;

/// Malformed bytes while reading LEB128 integers or immediates
#[derive(Error, Diagnostic, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unexpected end of input at byte {offset}")]
    #[diagnostic(code(reflang::wasm::unexpected_eof))]
    UnexpectedEof { offset: usize },

    #[error("LEB128 integer at byte {offset} does not fit its type")]
    #[diagnostic(
        code(reflang::wasm::leb_overflow),
        help("The encoding is longer than the integer width allows")
    )]
    LebOverflow { offset: usize },
}

/// Operand-stack discipline violations found in a function body
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Operand stack underflow")]
    #[diagnostic(
        code(reflang::wasm::stack_underflow),
        help("An instruction consumed more values than the current block provides")
    )]
    StackUnderflow,

    #[error("Operand type mismatch: expected {expected}, found {found}")]
    #[diagnostic(code(reflang::wasm::stack_type_mismatch))]
    StackTypeMismatch { expected: ValType, found: ValType },

    #[error("Unknown opcode 0x{opcode:02x}")]
    #[diagnostic(
        code(reflang::wasm::unknown_opcode),
        help("Only the integer instruction subset is supported")
    )]
    UnknownOpcode { opcode: u8 },

    #[error("Unknown local {index}")]
    #[diagnostic(code(reflang::wasm::unknown_local))]
    UnknownLocal { index: u32 },

    #[error("Unknown global {index}")]
    #[diagnostic(code(reflang::wasm::unknown_global))]
    UnknownGlobal { index: u32 },

    #[error("Global {index} is immutable")]
    #[diagnostic(
        code(reflang::wasm::immutable_global),
        help("Declare the global as mutable to assign to it")
    )]
    ImmutableGlobal { index: u32 },

    #[error("Unknown function {index}")]
    #[diagnostic(code(reflang::wasm::unknown_function))]
    UnknownFunction { index: u32 },

    #[error("Branch to unknown label {depth}")]
    #[diagnostic(code(reflang::wasm::unknown_label))]
    UnknownLabel { depth: u32 },

    #[error("Invalid block type 0x{byte:02x}")]
    #[diagnostic(code(reflang::wasm::invalid_block_type))]
    InvalidBlockType { byte: u8 },

    #[error("`else` without a matching `if`")]
    #[diagnostic(code(reflang::wasm::else_without_if))]
    ElseWithoutIf,

    #[error("`if` producing {expected} value(s) has no `else` branch")]
    #[diagnostic(
        code(reflang::wasm::if_without_else),
        help("An `if` with a result type needs an `else` that produces the same values")
    )]
    IfWithoutElse { expected: usize },

    #[error("Unbalanced control frames: {open} frame(s) still open")]
    #[diagnostic(
        code(reflang::wasm::unbalanced_frames),
        help("Every block, loop and if needs a matching `end`, and nothing may follow the final `end`")
    )]
    UnbalancedFrames { open: usize },

    #[error("Stack height mismatch at `end`: expected {expected}, found {found}")]
    #[diagnostic(
        code(reflang::wasm::stack_height_mismatch),
        help("A block left extra values on the operand stack")
    )]
    StackHeightMismatch { expected: usize, found: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors raised while building or encoding a module
#[derive(Error, Diagnostic, Debug)]
pub enum WasmError {
    #[error("Global initializer has type {found}, but the global is declared {declared}")]
    #[diagnostic(
        code(reflang::wasm::global_type_mismatch),
        help("Use a constant of the declared type")
    )]
    GlobalTypeMismatch { declared: ValType, found: ValType },

    #[error("Function import `{module}.{name}` added after a defined function")]
    #[diagnostic(
        code(reflang::wasm::import_after_function),
        help("Imported functions occupy the first function indices; add imports first")
    )]
    ImportAfterFunction { module: String, name: String },

    #[error("Global import `{module}.{name}` added after a defined global")]
    #[diagnostic(
        code(reflang::wasm::import_after_global),
        help("Imported globals occupy the first global indices; add imports first")
    )]
    ImportAfterGlobal { module: String, name: String },

    #[error("Start function {index} has type {found}, expected ()->()")]
    #[diagnostic(
        code(reflang::wasm::invalid_start_function),
        help("The start function takes no parameters and returns nothing")
    )]
    InvalidStartFunction { index: u32, found: FuncType },

    #[error("Function index {index} is out of range")]
    #[diagnostic(code(reflang::wasm::invalid_function_index))]
    InvalidFunctionIndex { index: u32 },

    #[error("Validation failed in function {function} at byte {offset}: {source}")]
    #[diagnostic(code(reflang::wasm::validation))]
    Validation {
        function: u32,
        offset: usize,
        #[source]
        #[diagnostic_source]
        source: ValidationError,
    },

    #[error("I/O error while writing module: {0}")]
    #[diagnostic(code(reflang::wasm::io))]
    Io(#[from] std::io::Error),
}

/// Failures lowering a typed program to a module
#[derive(Error, Diagnostic, Debug)]
pub enum EmitError {
    #[error("Type {ty} has no WebAssembly representation ({context})")]
    #[diagnostic(
        code(reflang::emit::unsupported_type),
        help("Only int and bool values can be compiled")
    )]
    UnsupportedType {
        ty: PrimitiveType,
        context: String,
        #[label("{ty} used here")]
        span: Option<SourceSpan>,
    },

    #[error("No index was assigned to `{name}`")]
    #[diagnostic(
        code(reflang::emit::unknown_symbol),
        help("This is an internal error: the program was not fully type-checked")
    )]
    UnknownSymbol {
        name: String,
        #[label("referenced here")]
        span: Option<SourceSpan>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Wasm(#[from] WasmError),
}
