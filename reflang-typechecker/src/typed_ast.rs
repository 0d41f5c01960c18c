//! Typed AST structures
//!
//! Mirrors the parser AST. Every expression carries its resolved type and
//! every identifier carries the `SymbolId` it resolved to.

use crate::environment::{Symbol, SymbolId};
use crate::signatures::FunctionTable;
use reflang_parser::{escape_string, write_indented, BinaryOperator, PrimitiveType, Span};
use std::fmt;

/// A fully checked compilation unit
#[derive(Debug, Clone, PartialEq)]
pub struct TypedProgram {
    pub statements: Vec<TypedStatement>,
    /// Symbol arena; indexed by `SymbolId`
    pub symbols: Vec<Symbol>,
    pub functions: FunctionTable,
    pub span: Span,
}

impl TypedProgram {
    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedStatement {
    pub kind: TypedStatementKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedStatementKind {
    Expression(TypedExpression),
    VarDecl(TypedVarDecl),
    Assign(TypedAssign),
    Block(TypedBlock),
    FunctionDecl(TypedFunctionDecl),
    ExternFunctionDecl(TypedExternFunctionDecl),
    Return(TypedReturn),
    While(TypedWhile),
    If(TypedIf),
}

/// Typed expression with its resolved type
#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpression {
    pub kind: TypedExpressionKind,
    pub resolved_type: PrimitiveType,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExpressionKind {
    Identifier(TypedIdentifier),
    Integer(i32),
    String(String),
    Boolean(bool),
    BinaryOp {
        left: Box<TypedExpression>,
        operator: BinaryOperator,
        right: Box<TypedExpression>,
    },
    FunctionCall {
        callee: String,
        arguments: Vec<TypedExpression>,
    },
}

/// Identifier resolved against a symbol
#[derive(Debug, Clone, PartialEq)]
pub struct TypedIdentifier {
    pub name: String,
    pub symbol: SymbolId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedVarDecl {
    pub name: TypedIdentifier,
    pub resolved_type: PrimitiveType,
    pub initializer: Option<TypedExpression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedAssign {
    pub target: TypedIdentifier,
    pub value: TypedExpression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedBlock {
    pub statements: Vec<TypedStatement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedParam {
    pub name: TypedIdentifier,
    pub resolved_type: PrimitiveType,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedFunctionDecl {
    pub name: String,
    pub params: Vec<TypedParam>,
    pub return_type: PrimitiveType,
    pub body: TypedBlock,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedExternFunctionDecl {
    pub name: String,
    pub params: Vec<TypedParam>,
    pub return_type: PrimitiveType,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedReturn {
    pub value: TypedExpression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedWhile {
    pub condition: TypedExpression,
    pub body: TypedBlock,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedIf {
    pub condition: TypedExpression,
    pub then_block: TypedBlock,
    pub else_block: Option<TypedBlock>,
    pub span: Span,
}

impl TypedExpression {
    /// Whether the expression is a literal usable as a constant initializer
    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            TypedExpressionKind::Integer(_)
                | TypedExpressionKind::String(_)
                | TypedExpressionKind::Boolean(_)
        )
    }
}

impl TypedBlock {
    /// The trailing statement, if it is a `return`
    pub fn trailing_return(&self) -> Option<&TypedReturn> {
        match self.statements.last().map(|statement| &statement.kind) {
            Some(TypedStatementKind::Return(ret)) => Some(ret),
            _ => None,
        }
    }
}

// Rendering matches the parser's canonical text, except that declarations
// always spell out their resolved type.

impl fmt::Display for TypedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

impl fmt::Display for TypedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypedStatementKind::Expression(expr) => write!(f, "{};", expr),
            TypedStatementKind::VarDecl(decl) => match &decl.initializer {
                Some(init) => write!(f, "{}: {} = {};", decl.name.name, decl.resolved_type, init),
                None => write!(f, "{}: {};", decl.name.name, decl.resolved_type),
            },
            TypedStatementKind::Assign(assign) => {
                write!(f, "{} = {};", assign.target.name, assign.value)
            }
            TypedStatementKind::Block(block) => write!(f, "{}", block),
            TypedStatementKind::FunctionDecl(func) => {
                write!(f, "fn {}(", func.name)?;
                write_params(f, &func.params)?;
                write!(f, ") -> {} {}", func.return_type, func.body)
            }
            TypedStatementKind::ExternFunctionDecl(func) => {
                write!(f, "extern fn {}(", func.name)?;
                write_params(f, &func.params)?;
                write!(f, ") -> {};", func.return_type)
            }
            TypedStatementKind::Return(ret) => write!(f, "return {};", ret.value),
            TypedStatementKind::While(while_stmt) => {
                write!(f, "while ({}) {}", while_stmt.condition, while_stmt.body)
            }
            TypedStatementKind::If(if_stmt) => {
                write!(f, "if ({}) {}", if_stmt.condition, if_stmt.then_block)?;
                if let Some(else_block) = &if_stmt.else_block {
                    write!(f, " else {}", else_block)?;
                }
                Ok(())
            }
        }
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[TypedParam]) -> fmt::Result {
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}: {}", param.name.name, param.resolved_type)?;
    }
    Ok(())
}

impl fmt::Display for TypedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.statements.is_empty() {
            return write!(f, "{{}}");
        }
        writeln!(f, "{{")?;
        for statement in &self.statements {
            write_indented(f, &statement.to_string())?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for TypedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypedExpressionKind::Identifier(id) => write!(f, "{}", id.name),
            TypedExpressionKind::Integer(value) => write!(f, "{}", value),
            TypedExpressionKind::String(value) => write!(f, "\"{}\"", escape_string(value)),
            TypedExpressionKind::Boolean(value) => write!(f, "{}", value),
            TypedExpressionKind::BinaryOp {
                left,
                operator,
                right,
            } => {
                write_operand(f, left)?;
                write!(f, " {} ", operator)?;
                write_operand(f, right)
            }
            TypedExpressionKind::FunctionCall { callee, arguments } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &TypedExpression) -> fmt::Result {
    match operand.kind {
        TypedExpressionKind::BinaryOp { .. } => write!(f, "({})", operand),
        _ => write!(f, "{}", operand),
    }
}
