//! TypedAstBuilder: name resolution and type checking in one pass
//!
//! Walks the parser AST top-down, resolving identifiers against the scope
//! environment and checking every node against the rules of the language.
//! Top-level statements and block statements are checked independently and
//! their errors are aggregated; within a single statement the first failing
//! sub-expression stops the rest of that statement.
//!
//! Functions must be declared before they are called; there is no separate
//! pass collecting signatures ahead of time.

use crate::environment::Environment;
use crate::error::{CheckResult, SpanExt, TypeError, TypeErrors};
use crate::signatures::{FunctionSignature, FunctionTable};
use crate::typed_ast::*;
use reflang_parser::{
    Assign, BinaryOperation, Block, Expression, ExpressionKind, ExternFunctionDecl, FunctionCall,
    FunctionDecl, Identifier, If, Param, PrimitiveType, Program, Return, Statement,
    StatementKind, VarDecl, While,
};

/// Builds a typed AST for a single compilation unit
#[derive(Debug, Default)]
pub struct TypedAstBuilder {
    environment: Environment,
    functions: FunctionTable,
    /// Signature of the function whose body is being checked
    current_function: Option<FunctionSignature>,
}

impl TypedAstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Check every top-level statement in the global scope
    pub fn build_program(mut self, program: &Program) -> CheckResult<TypedProgram> {
        let mut statements = Vec::with_capacity(program.statements.len());
        let mut errors = TypeErrors::new();

        for statement in &program.statements {
            match self.build_statement(statement) {
                Ok(typed) => statements.push(typed),
                Err(statement_errors) => errors.extend(statement_errors),
            }
        }

        log::debug!(
            "checked {} top-level statement(s), {} error(s)",
            program.statements.len(),
            errors.len()
        );

        errors.into_result(())?;
        Ok(TypedProgram {
            statements,
            symbols: self.environment.into_symbols(),
            functions: self.functions,
            span: program.span,
        })
    }

    pub fn build_statement(&mut self, statement: &Statement) -> CheckResult<TypedStatement> {
        let kind = match &statement.kind {
            StatementKind::Expression(expr) => {
                TypedStatementKind::Expression(self.build_expression(expr)?)
            }
            StatementKind::VarDecl(decl) => TypedStatementKind::VarDecl(self.build_var_decl(decl)?),
            StatementKind::Assign(assign) => TypedStatementKind::Assign(self.build_assign(assign)?),
            StatementKind::Block(block) => TypedStatementKind::Block(self.build_block(block)?),
            StatementKind::FunctionDecl(func) => {
                TypedStatementKind::FunctionDecl(self.build_function_decl(func)?)
            }
            StatementKind::ExternFunctionDecl(func) => {
                TypedStatementKind::ExternFunctionDecl(self.build_extern_decl(func)?)
            }
            StatementKind::Return(ret) => TypedStatementKind::Return(self.build_return(ret)?),
            StatementKind::While(while_stmt) => {
                TypedStatementKind::While(self.build_while(while_stmt)?)
            }
            StatementKind::If(if_stmt) => TypedStatementKind::If(self.build_if(if_stmt)?),
        };

        Ok(TypedStatement {
            kind,
            span: statement.span,
        })
    }

    pub fn build_expression(&mut self, expression: &Expression) -> CheckResult<TypedExpression> {
        let span = expression.span;
        let typed = match &expression.kind {
            ExpressionKind::Identifier(identifier) => {
                let resolved = self.resolve_identifier(identifier)?;
                let symbol_type = self.symbol_type(&resolved);
                TypedExpression {
                    kind: TypedExpressionKind::Identifier(resolved),
                    resolved_type: symbol_type,
                    span,
                }
            }
            ExpressionKind::Integer(literal) => TypedExpression {
                kind: TypedExpressionKind::Integer(literal.value),
                resolved_type: PrimitiveType::Int,
                span,
            },
            ExpressionKind::String(literal) => TypedExpression {
                kind: TypedExpressionKind::String(literal.value.clone()),
                resolved_type: PrimitiveType::String,
                span,
            },
            ExpressionKind::Boolean(literal) => TypedExpression {
                kind: TypedExpressionKind::Boolean(literal.value),
                resolved_type: PrimitiveType::Bool,
                span,
            },
            ExpressionKind::BinaryOp(operation) => self.build_binary_operation(operation)?,
            ExpressionKind::FunctionCall(call) => self.build_call(call)?,
        };

        Ok(typed)
    }

    /// Enter a scope, check every statement and always leave the scope again
    pub fn build_block(&mut self, block: &Block) -> CheckResult<TypedBlock> {
        self.environment.enter_scope();
        let result = self.build_statements(&block.statements);
        let left = self.environment.leave_scope();

        let mut errors = TypeErrors::new();
        let statements = match result {
            Ok(statements) => statements,
            Err(statement_errors) => {
                errors.extend(statement_errors);
                Vec::new()
            }
        };
        if let Err(error) = left {
            errors.push(error);
        }

        errors.into_result(TypedBlock {
            statements,
            span: block.span,
        })
    }

    fn build_statements(&mut self, statements: &[Statement]) -> CheckResult<Vec<TypedStatement>> {
        let mut typed = Vec::with_capacity(statements.len());
        let mut errors = TypeErrors::new();

        for statement in statements {
            match self.build_statement(statement) {
                Ok(statement) => typed.push(statement),
                Err(statement_errors) => errors.extend(statement_errors),
            }
        }

        errors.into_result(typed)
    }

    fn resolve_identifier(&self, identifier: &Identifier) -> Result<TypedIdentifier, TypeError> {
        let symbol = self
            .environment
            .lookup(&identifier.name)
            .ok_or_else(|| TypeError::UnresolvedName {
                name: identifier.name.clone(),
                span: identifier.span.to_label(),
            })?;

        Ok(TypedIdentifier {
            name: identifier.name.clone(),
            symbol: symbol.id,
            span: identifier.span,
        })
    }

    fn symbol_type(&self, identifier: &TypedIdentifier) -> PrimitiveType {
        self.environment
            .symbol(identifier.symbol)
            .map(|symbol| symbol.ty)
            .unwrap_or(PrimitiveType::Int)
    }

    fn build_binary_operation(
        &mut self,
        operation: &BinaryOperation,
    ) -> CheckResult<TypedExpression> {
        let left = self.build_expression(&operation.left)?;
        let right = self.build_expression(&operation.right)?;

        if left.resolved_type != right.resolved_type {
            return Err(TypeError::TypeMismatch {
                expected: left.resolved_type,
                found: right.resolved_type,
                span: right.span.to_label(),
            }
            .into());
        }

        // Comparisons and logical operators produce a truth value whatever
        // their operand type is
        let resolved_type = if operation.operator.is_comparison() || operation.operator.is_logical()
        {
            PrimitiveType::Bool
        } else {
            left.resolved_type
        };

        Ok(TypedExpression {
            kind: TypedExpressionKind::BinaryOp {
                left: Box::new(left),
                operator: operation.operator,
                right: Box::new(right),
            },
            resolved_type,
            span: operation.span,
        })
    }

    fn build_call(&mut self, call: &FunctionCall) -> CheckResult<TypedExpression> {
        let arguments = call
            .arguments
            .iter()
            .map(|argument| self.build_expression(argument))
            .collect::<CheckResult<Vec<_>>>()?;

        let name = &call.callee.name;
        let signature = self
            .functions
            .get(name)
            .ok_or_else(|| TypeError::UnresolvedFunction {
                name: name.clone(),
                span: call.callee.span.to_label(),
            })?;

        if signature.arity() != arguments.len() {
            return Err(TypeError::ArgumentCountMismatch {
                function: name.clone(),
                expected: signature.arity(),
                found: arguments.len(),
                span: call.span.to_label(),
            }
            .into());
        }

        let mut errors = TypeErrors::new();
        for (position, (expected, argument)) in signature
            .param_types()
            .iter()
            .zip(&arguments)
            .enumerate()
        {
            if *expected != argument.resolved_type {
                errors.push(TypeError::ArgumentTypeMismatch {
                    function: name.clone(),
                    position: position + 1,
                    expected: *expected,
                    found: argument.resolved_type,
                    span: argument.span.to_label(),
                });
            }
        }
        let return_type = signature.return_type;
        errors.into_result(())?;

        Ok(TypedExpression {
            kind: TypedExpressionKind::FunctionCall {
                callee: name.clone(),
                arguments,
            },
            resolved_type: return_type,
            span: call.span,
        })
    }

    fn build_var_decl(&mut self, decl: &VarDecl) -> CheckResult<TypedVarDecl> {
        // The initializer is checked before the name exists, so `x := x;`
        // refers to an outer `x`
        let initializer = decl
            .initializer
            .as_ref()
            .map(|init| self.build_expression(init))
            .transpose()?;

        let resolved_type = match (&decl.declared_type, &initializer) {
            (Some(declared), Some(init)) if declared.primitive != init.resolved_type => {
                return Err(TypeError::TypeMismatch {
                    expected: declared.primitive,
                    found: init.resolved_type,
                    span: init.span.to_label(),
                }
                .into());
            }
            (Some(declared), _) => declared.primitive,
            (None, Some(init)) => init.resolved_type,
            (None, None) => {
                return Err(TypeError::UntypedDeclaration {
                    name: decl.name.name.clone(),
                    span: decl.span.to_label(),
                }
                .into());
            }
        };

        let symbol = self.declare(&decl.name, resolved_type)?;

        Ok(TypedVarDecl {
            name: symbol,
            resolved_type,
            initializer,
            span: decl.span,
        })
    }

    fn declare(
        &mut self,
        name: &Identifier,
        ty: PrimitiveType,
    ) -> Result<TypedIdentifier, TypeError> {
        let symbol = self
            .environment
            .declare(&name.name, ty, Some(name.span))
            .map_err(|existing| TypeError::DuplicateDeclaration {
                name: name.name.clone(),
                span: name.span.to_label(),
                previous: existing.span.and_then(|span| span.to_label()),
            })?;

        Ok(TypedIdentifier {
            name: name.name.clone(),
            symbol: symbol.id,
            span: name.span,
        })
    }

    fn build_assign(&mut self, assign: &Assign) -> CheckResult<TypedAssign> {
        let target = self.resolve_identifier(&assign.target)?;
        let value = self.build_expression(&assign.value)?;
        let target_type = self.symbol_type(&target);

        if value.resolved_type != target_type {
            return Err(TypeError::TypeMismatch {
                expected: target_type,
                found: value.resolved_type,
                span: value.span.to_label(),
            }
            .into());
        }

        Ok(TypedAssign {
            target,
            value,
            span: assign.span,
        })
    }

    /// Declare each parameter in the current scope, collecting every failure
    fn build_params(&mut self, params: &[Param]) -> CheckResult<Vec<TypedParam>> {
        let mut typed = Vec::with_capacity(params.len());
        let mut errors = TypeErrors::new();

        for param in params {
            let ty = param.type_annotation.primitive;
            match self.declare(&param.name, ty) {
                Ok(name) => typed.push(TypedParam {
                    name,
                    resolved_type: ty,
                    span: param.span,
                }),
                Err(error) => errors.push(error),
            }
        }

        errors.into_result(typed)
    }

    fn signature_of(
        name: &Identifier,
        params: Option<&[Param]>,
        return_type: PrimitiveType,
        is_extern: bool,
    ) -> FunctionSignature {
        FunctionSignature {
            name: name.name.clone(),
            return_type,
            params: params.map(|params| {
                params
                    .iter()
                    .map(|param| param.type_annotation.primitive)
                    .collect()
            }),
            is_extern,
            span: Some(name.span),
        }
    }

    fn register(&mut self, signature: FunctionSignature) -> Result<(), TypeError> {
        let span = signature.span.and_then(|span| span.to_label());
        self.functions
            .insert(signature)
            .map_err(|existing| TypeError::DuplicateFunction {
                name: existing.name,
                span,
            })
    }

    fn build_function_decl(&mut self, decl: &FunctionDecl) -> CheckResult<TypedFunctionDecl> {
        // Functions may only be declared at the top level of a program
        if self.current_function.is_some() || self.environment.depth() > 0 {
            return Err(TypeError::NestedFunction {
                name: decl.name.name.clone(),
                span: decl.name.span.to_label(),
            }
            .into());
        }

        let signature = Self::signature_of(
            &decl.name,
            decl.params.as_ref().map(|params| params.params.as_slice()),
            decl.return_type.primitive,
            false,
        );
        // Registered before the body so the function may call itself
        self.register(signature.clone())?;

        self.environment.enter_scope();
        self.current_function = Some(signature);

        let result = self
            .build_params(decl.params())
            .and_then(|params| Ok((params, self.build_block(&decl.body)?)));

        self.current_function = None;
        self.environment.leave_scope()?;

        let (params, body) = result?;
        Ok(TypedFunctionDecl {
            name: decl.name.name.clone(),
            params,
            return_type: decl.return_type.primitive,
            body,
            span: decl.span,
        })
    }

    fn build_extern_decl(
        &mut self,
        decl: &ExternFunctionDecl,
    ) -> CheckResult<TypedExternFunctionDecl> {
        let signature = Self::signature_of(
            &decl.name,
            decl.params.as_ref().map(|params| params.params.as_slice()),
            decl.return_type.primitive,
            true,
        );
        self.register(signature)?;

        // Parameter names only need to be distinct; the scope is thrown away
        self.environment.enter_scope();
        let params = self.build_params(decl.params());
        self.environment.leave_scope()?;

        Ok(TypedExternFunctionDecl {
            name: decl.name.name.clone(),
            params: params?,
            return_type: decl.return_type.primitive,
            span: decl.span,
        })
    }

    fn build_return(&mut self, ret: &Return) -> CheckResult<TypedReturn> {
        let value = self.build_expression(&ret.value)?;

        let function = self
            .current_function
            .as_ref()
            .ok_or(TypeError::ReturnOutsideFunction {
                span: ret.span.to_label(),
            })?;

        if function.return_type != value.resolved_type {
            return Err(TypeError::ReturnTypeMismatch {
                function: function.name.clone(),
                expected: function.return_type,
                found: value.resolved_type,
                span: value.span.to_label(),
            }
            .into());
        }

        Ok(TypedReturn {
            value,
            span: ret.span,
        })
    }

    /// Check a condition expression; a non-bool result is collected rather
    /// than returned so the branches are still checked
    fn build_condition(
        &mut self,
        condition: &Expression,
        errors: &mut TypeErrors,
    ) -> CheckResult<TypedExpression> {
        let typed = self.build_expression(condition)?;
        if typed.resolved_type != PrimitiveType::Bool {
            errors.push(TypeError::ExpectedBool {
                found: typed.resolved_type,
                span: typed.span.to_label(),
            });
        }
        Ok(typed)
    }

    fn build_while(&mut self, while_stmt: &While) -> CheckResult<TypedWhile> {
        let mut errors = TypeErrors::new();
        let condition = self.build_condition(&while_stmt.condition, &mut errors)?;

        match self.build_block(&while_stmt.body) {
            Ok(body) => errors.into_result(TypedWhile {
                condition,
                body,
                span: while_stmt.span,
            }),
            Err(body_errors) => {
                errors.extend(body_errors);
                Err(errors)
            }
        }
    }

    fn build_if(&mut self, if_stmt: &If) -> CheckResult<TypedIf> {
        let mut errors = TypeErrors::new();
        let condition = self.build_condition(&if_stmt.condition, &mut errors)?;

        let then_block = self.build_block(&if_stmt.then_block);
        let else_block = if_stmt
            .else_block
            .as_ref()
            .map(|block| self.build_block(block))
            .transpose();

        match (then_block, else_block) {
            (Ok(then_block), Ok(else_block)) => errors.into_result(TypedIf {
                condition,
                then_block,
                else_block,
                span: if_stmt.span,
            }),
            (then_block, else_block) => {
                if let Err(then_errors) = then_block {
                    errors.extend(then_errors);
                }
                if let Err(else_errors) = else_block {
                    errors.extend(else_errors);
                }
                Err(errors)
            }
        }
    }
}

/// Type-check a program with a fresh environment and signature table
pub fn typecheck_program(program: &Program) -> CheckResult<TypedProgram> {
    TypedAstBuilder::new().build_program(program)
}
