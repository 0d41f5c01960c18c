// Reflang Parser Library
// Pest-based parser for the Reflang programming language

pub mod ast;
pub mod error;
pub mod parser;

pub use ast::*;
pub use error::*;
pub use parser::{ReflangParser, Rule};

/// Parse program text into a syntax tree
pub fn parse_program(input: &str) -> Result<Program, ParseError> {
    ReflangParser::parse_program(input)
}

pub fn parse_expression(input: &str) -> Result<Expression, ParseError> {
    ReflangParser::parse_expression(input)
}

// Version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests;
