//! Source-to-module driver

use crate::emit::emit_program;
use crate::error::{EmitError, WasmError};
use crate::module::to_hex;
use miette::Diagnostic;
use reflang_parser::ParseError;
use reflang_typechecker::{typecheck_program, TypeErrors, TypedProgram};
use thiserror::Error;

/// Settings for a single compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Run the operand-stack validator before encoding
    pub validate: bool,
    /// Export every defined function under its own name
    pub export_functions: bool,
    /// Module name used for `extern fn` imports
    pub import_module: String,
    pub module_name: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            validate: true,
            export_functions: true,
            import_module: "env".to_string(),
            module_name: None,
        }
    }
}

/// Any failure between source text and module bytes
#[derive(Error, Diagnostic, Debug)]
pub enum CompileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Typecheck(#[from] TypeErrors),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Wasm(#[from] WasmError),
}

/// An encoded module together with the program it was compiled from
#[derive(Debug, Clone)]
pub struct CompiledModule {
    pub bytes: Vec<u8>,
    pub program: TypedProgram,
}

impl CompiledModule {
    pub fn hex(&self) -> String {
        to_hex(&self.bytes)
    }
}

/// Parse, type-check, lower and encode one compilation unit
pub fn compile_source(source: &str, options: &CompileOptions) -> Result<CompiledModule, CompileError> {
    let program = reflang_parser::parse_program(source)?;
    let typed = typecheck_program(&program)?;
    compile_program(typed, options)
}

/// Lower and encode an already type-checked program
pub fn compile_program(
    program: TypedProgram,
    options: &CompileOptions,
) -> Result<CompiledModule, CompileError> {
    let builder = emit_program(&program, options)?;

    let bytes = if options.validate {
        builder.finish()?
    } else {
        builder.encode()
    };
    log::debug!("encoded module: {} byte(s)", bytes.len());

    Ok(CompiledModule { bytes, program })
}
