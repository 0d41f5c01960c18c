// Reflang Parser Error Handling
// Error reporting with miette integration

use crate::parser::Rule;
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Main parse error type with miette integration
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Syntax error: {message}")]
    #[diagnostic(
        code(reflang::parse::syntax),
        help("Check the syntax near the highlighted location")
    )]
    Syntax {
        #[source_code]
        src: String,
        #[label("error occurred here")]
        span: SourceSpan,
        message: String,
    },

    #[error("Invalid integer literal `{found}`")]
    #[diagnostic(
        code(reflang::parse::invalid_integer),
        help("Integer literals must fit in a signed 32-bit integer")
    )]
    InvalidInteger {
        #[source_code]
        src: String,
        #[label("invalid integer")]
        span: SourceSpan,
        found: String,
    },

    #[error("Invalid string escape sequence `{found}`")]
    #[diagnostic(
        code(reflang::parse::invalid_string_escape),
        help("Valid escape sequences: \\n, \\t, \\r, \\\\, \\\"")
    )]
    InvalidStringEscape {
        #[source_code]
        src: String,
        #[label("invalid escape sequence")]
        span: SourceSpan,
        found: String,
    },

    #[error("Unexpected grammar rule: expected {expected}, found {found}")]
    #[diagnostic(
        code(reflang::parse::unexpected_rule),
        help("The parse tree did not have the expected shape")
    )]
    UnexpectedRule {
        #[source_code]
        src: String,
        #[label("here")]
        span: SourceSpan,
        expected: String,
        found: String,
    },
}

impl ParseError {
    /// Create a parse error from a Pest parsing error
    pub fn from_pest_error(error: pest::error::Error<Rule>, src: String) -> Self {
        let span = match error.location {
            pest::error::InputLocation::Pos(pos) => SourceSpan::new(pos.into(), 1),
            pest::error::InputLocation::Span((start, end)) => {
                SourceSpan::new(start.into(), end - start)
            }
        };

        let message = match &error.variant {
            pest::error::ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
                let mut expected: Vec<&str> = Vec::new();
                for description in positives.iter().map(rule_description) {
                    if !expected.contains(&description) {
                        expected.push(description);
                    }
                }
                format!("expected {}", expected.join(", "))
            }
            pest::error::ErrorVariant::ParsingError { .. } => "unexpected input".to_string(),
            pest::error::ErrorVariant::CustomError { message } => message.clone(),
        };

        ParseError::Syntax { src, span, message }
    }

    pub fn unexpected_rule(span: SourceSpan, expected: &str, found: Option<Rule>) -> Self {
        ParseError::UnexpectedRule {
            src: String::new(),
            span,
            expected: expected.to_string(),
            found: found.map_or_else(|| "end of input".to_string(), |rule| format!("{:?}", rule)),
        }
    }

    /// Attach the full source text so the diagnostic can render a snippet
    pub fn with_source(mut self, source: &str) -> Self {
        match &mut self {
            ParseError::Syntax { src, .. }
            | ParseError::InvalidInteger { src, .. }
            | ParseError::InvalidStringEscape { src, .. }
            | ParseError::UnexpectedRule { src, .. } => {
                *src = source.to_string();
            }
        }
        self
    }

    /// Byte offset where the error was detected
    pub fn offset(&self) -> usize {
        match self {
            ParseError::Syntax { span, .. }
            | ParseError::InvalidInteger { span, .. }
            | ParseError::InvalidStringEscape { span, .. }
            | ParseError::UnexpectedRule { span, .. } => span.offset(),
        }
    }
}

/// Convert grammar rules to user-friendly descriptions
fn rule_description(rule: &Rule) -> &'static str {
    match rule {
        Rule::expression => "an expression",
        Rule::identifier => "an identifier",
        Rule::primitive_type => "a type (int, string or bool)",
        Rule::block => "a block",
        Rule::param | Rule::param_list => "a parameter",
        Rule::int_literal => "an integer",
        Rule::string_literal => "a string",
        Rule::bool_literal => "true or false",
        Rule::call => "a function call",
        Rule::EOI => "end of input",
        Rule::op_or
        | Rule::op_and
        | Rule::op_equal
        | Rule::op_not_equal
        | Rule::op_less
        | Rule::op_less_equal
        | Rule::op_greater
        | Rule::op_greater_equal
        | Rule::op_add
        | Rule::op_subtract
        | Rule::op_multiply
        | Rule::op_divide
        | Rule::op_modulo => "an operator",
        Rule::function_decl
        | Rule::extern_decl
        | Rule::var_decl
        | Rule::assign
        | Rule::expr_stmt
        | Rule::while_stmt
        | Rule::if_stmt
        | Rule::return_stmt => "a statement",
        _ => "valid syntax",
    }
}
