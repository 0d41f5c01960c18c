//! Reflang Typechecker
//!
//! Scope-aware name resolution and type checking over the parser AST.
//!
//! ## Architecture
//!
//! - **Environment**: arena of scopes with parent handles and an arena of symbols
//! - **Signature table**: declared and `extern` functions in declaration order
//! - **TypedAstBuilder**: single top-down pass producing a `TypedProgram`
//!   or every error it found
//!
//! ```text
//! let program = reflang_parser::parse_program("x: int = 1;")?;
//! let typed = reflang_typechecker::typecheck_program(&program)?;
//! ```

pub mod environment;
pub mod error;
pub mod signatures;
pub mod typed_ast;
pub mod typed_ast_builder;

pub use environment::{Environment, ScopeId, Symbol, SymbolId};
pub use error::{CheckResult, SpanExt, TypeError, TypeErrors};
pub use signatures::{FunctionSignature, FunctionTable};
pub use typed_ast::*;
pub use typed_ast_builder::{typecheck_program, TypedAstBuilder};

// Re-export the parser's primitive type so users only need one import
pub use reflang_parser::PrimitiveType;

#[cfg(test)]
mod tests;
