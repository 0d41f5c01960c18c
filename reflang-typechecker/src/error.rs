//! Error types for the Reflang typechecker
//!
//! Follows the parser's miette patterns: every error carries a diagnostic
//! code, a help text and, where the source location is known, a label.

use miette::{Diagnostic, SourceSpan};
use reflang_parser::{PrimitiveType, Span};
use thiserror::Error;

pub type CheckResult<T> = std::result::Result<T, TypeErrors>;

/// Turn a parser span into an error label
pub trait SpanExt {
    fn to_label(&self) -> Option<SourceSpan>;
}

impl SpanExt for Span {
    fn to_label(&self) -> Option<SourceSpan> {
        Some((*self).into())
    }
}

/// A single type-checking failure
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("Unresolved name `{name}`")]
    #[diagnostic(
        code(reflang::typecheck::unresolved_name),
        help("Declare `{name}` before using it")
    )]
    UnresolvedName {
        name: String,
        #[label("not found in this scope")]
        span: Option<SourceSpan>,
    },

    #[error("Unresolved function `{name}`")]
    #[diagnostic(
        code(reflang::typecheck::unresolved_function),
        help("Functions must be declared (or declared `extern`) before they are called")
    )]
    UnresolvedFunction {
        name: String,
        #[label("no function with this name")]
        span: Option<SourceSpan>,
    },

    #[error("`{name}` is already declared in this scope")]
    #[diagnostic(
        code(reflang::typecheck::duplicate_declaration),
        help("Rename the variable or declare it inside a nested block to shadow it")
    )]
    DuplicateDeclaration {
        name: String,
        #[label("redeclared here")]
        span: Option<SourceSpan>,
        #[label("first declared here")]
        previous: Option<SourceSpan>,
    },

    #[error("Function `{name}` is already declared")]
    #[diagnostic(
        code(reflang::typecheck::duplicate_function),
        help("Each function name may only be declared once per program")
    )]
    DuplicateFunction {
        name: String,
        #[label("declared again here")]
        span: Option<SourceSpan>,
    },

    #[error("Type mismatch: expected {expected}, found {found}")]
    #[diagnostic(
        code(reflang::typecheck::type_mismatch),
        help("The types {expected} and {found} are not compatible")
    )]
    TypeMismatch {
        expected: PrimitiveType,
        found: PrimitiveType,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
    },

    #[error("Expected bool condition, found {found}")]
    #[diagnostic(
        code(reflang::typecheck::expected_bool),
        help("Conditions of `while` and `if` must have type bool; try a comparison such as `x != 0`")
    )]
    ExpectedBool {
        found: PrimitiveType,
        #[label("this has type {found}")]
        span: Option<SourceSpan>,
    },

    #[error("`return` outside of a function")]
    #[diagnostic(
        code(reflang::typecheck::return_outside_function),
        help("`return` may only appear inside a function body")
    )]
    ReturnOutsideFunction {
        #[label("not inside a function")]
        span: Option<SourceSpan>,
    },

    #[error("Function `{function}` returns {expected}, but this returns {found}")]
    #[diagnostic(
        code(reflang::typecheck::return_type_mismatch),
        help("Change the returned expression or the declared return type of `{function}`")
    )]
    ReturnTypeMismatch {
        function: String,
        expected: PrimitiveType,
        found: PrimitiveType,
        #[label("returns {found}")]
        span: Option<SourceSpan>,
    },

    #[error("Attempted to leave the global scope")]
    #[diagnostic(
        code(reflang::typecheck::scope_underflow),
        help("This is an internal error: scope enter/leave calls are unbalanced")
    )]
    ScopeUnderflow,

    #[error("Function `{function}` expects {expected} argument(s), found {found}")]
    #[diagnostic(
        code(reflang::typecheck::argument_count_mismatch),
        help("Check the declaration of `{function}`")
    )]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        found: usize,
        #[label("called with {found} argument(s)")]
        span: Option<SourceSpan>,
    },

    #[error("Argument {position} of `{function}` expects {expected}, found {found}")]
    #[diagnostic(
        code(reflang::typecheck::argument_type_mismatch),
        help("Pass a value of type {expected}")
    )]
    ArgumentTypeMismatch {
        function: String,
        position: usize,
        expected: PrimitiveType,
        found: PrimitiveType,
        #[label("this has type {found}")]
        span: Option<SourceSpan>,
    },

    #[error("Declaration of `{name}` has neither a type nor an initializer")]
    #[diagnostic(
        code(reflang::typecheck::untyped_declaration),
        help("Write `{name}: int;` or `{name} := value;`")
    )]
    UntypedDeclaration {
        name: String,
        #[label("type cannot be determined")]
        span: Option<SourceSpan>,
    },

    #[error("Nested function `{name}` is not supported")]
    #[diagnostic(
        code(reflang::typecheck::nested_function),
        help("Move `{name}` to the top level of the program")
    )]
    NestedFunction {
        name: String,
        #[label("declared inside another function")]
        span: Option<SourceSpan>,
    },
}

impl TypeError {
    /// Primary source location of this error, if any
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            TypeError::UnresolvedName { span, .. }
            | TypeError::UnresolvedFunction { span, .. }
            | TypeError::DuplicateDeclaration { span, .. }
            | TypeError::DuplicateFunction { span, .. }
            | TypeError::TypeMismatch { span, .. }
            | TypeError::ExpectedBool { span, .. }
            | TypeError::ReturnOutsideFunction { span }
            | TypeError::ReturnTypeMismatch { span, .. }
            | TypeError::ArgumentCountMismatch { span, .. }
            | TypeError::ArgumentTypeMismatch { span, .. }
            | TypeError::UntypedDeclaration { span, .. }
            | TypeError::NestedFunction { span, .. } => *span,
            TypeError::ScopeUnderflow => None,
        }
    }
}

/// All errors collected while checking a program or block
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Default)]
#[error("{}", join_messages(.errors))]
#[diagnostic(code(reflang::typecheck::failed))]
pub struct TypeErrors {
    #[related]
    pub errors: Vec<TypeError>,
}

fn join_messages(errors: &[TypeError]) -> String {
    errors
        .iter()
        .map(|error| error.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl TypeErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: TypeError) {
        self.errors.push(error);
    }

    /// Move all errors of `other` into this collector
    pub fn extend(&mut self, other: TypeErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeError> {
        self.errors.iter()
    }

    /// `Ok(value)` when nothing was collected, otherwise the collected errors
    pub fn into_result<T>(self, value: T) -> CheckResult<T> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<TypeError> for TypeErrors {
    fn from(error: TypeError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl IntoIterator for TypeErrors {
    type Item = TypeError;
    type IntoIter = std::vec::IntoIter<TypeError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
