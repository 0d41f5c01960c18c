//! Reflang WebAssembly backend
//!
//! Turns a type-checked Reflang program into a binary WebAssembly module.
//!
//! - `leb128`, `types`, `opcodes`, `function`: binary building blocks
//! - `module`: `WasmBuilder`, section layout and encoding
//! - `validator`: operand-stack validation of function bodies
//! - `emit`: lowering of the typed AST
//! - `compile`: the source-to-bytes driver

#![allow(clippy::result_large_err)]

pub mod compile;
pub mod emit;
pub mod error;
pub mod function;
pub mod leb128;
pub mod module;
pub mod opcodes;
pub mod types;
pub mod validator;

pub use compile::{compile_program, compile_source, CompileError, CompileOptions, CompiledModule};
pub use emit::{emit_program, Emitter, START_FUNCTION};
pub use error::{DecodeError, EmitError, ValidationError, WasmError};
pub use function::{group_locals, FunctionBody};
pub use module::{to_hex, WasmBuilder};
pub use opcodes::Opcode;
pub use types::{
    BlockType, ConstValue, Export, FuncType, Global, GlobalType, Import, ImportDesc, Limits,
    ValType,
};
pub use validator::{validate_function, ModuleInfo, OperandType, Validator};

#[cfg(test)]
mod tests;
