//! Lowering of a typed program into a `WasmBuilder`
//!
//! `int` and `bool` become `i32`. Top-level declarations become mutable
//! globals, `extern fn` declarations become function imports, and every
//! other top-level statement runs in a synthesized start function.

use crate::compile::CompileOptions;
use crate::error::EmitError;
use crate::function::FunctionBody;
use crate::module::WasmBuilder;
use crate::opcodes::Opcode;
use crate::types::{BlockType, ConstValue, FuncType, Global, ValType};
use reflang_parser::{BinaryOperator, PrimitiveType, Span};
use reflang_typechecker::{
    FunctionSignature, SpanExt, SymbolId, TypedBlock, TypedExpression, TypedExpressionKind,
    TypedFunctionDecl, TypedParam, TypedProgram, TypedStatement, TypedStatementKind,
    TypedVarDecl,
};
use std::collections::HashMap;

/// Name of the synthesized function holding top-level statements
pub const START_FUNCTION: &str = "__start";

fn lower_type(ty: PrimitiveType, context: &str, span: Span) -> Result<ValType, EmitError> {
    match ty {
        PrimitiveType::Int | PrimitiveType::Bool => Ok(ValType::I32),
        PrimitiveType::String => Err(EmitError::UnsupportedType {
            ty,
            context: context.to_string(),
            span: span.to_label(),
        }),
    }
}

fn lower_signature(signature: &FunctionSignature) -> Result<FuncType, EmitError> {
    let span = signature.span.unwrap_or_default();
    let context = format!("signature of `{}`", signature.name);

    let params = signature
        .param_types()
        .iter()
        .map(|ty| lower_type(*ty, &context, span))
        .collect::<Result<Vec<_>, _>>()?;
    let result = lower_type(signature.return_type, &context, span)?;

    Ok(FuncType::new(params, vec![result]))
}

fn binary_opcode(operator: BinaryOperator) -> Opcode {
    match operator {
        BinaryOperator::Add => Opcode::I32Add,
        BinaryOperator::Subtract => Opcode::I32Sub,
        BinaryOperator::Multiply => Opcode::I32Mul,
        BinaryOperator::Divide => Opcode::I32DivS,
        BinaryOperator::Modulo => Opcode::I32RemS,
        BinaryOperator::Equal => Opcode::I32Eq,
        BinaryOperator::NotEqual => Opcode::I32Ne,
        BinaryOperator::Less => Opcode::I32LtS,
        BinaryOperator::LessEqual => Opcode::I32LeS,
        BinaryOperator::Greater => Opcode::I32GtS,
        BinaryOperator::GreaterEqual => Opcode::I32GeS,
        BinaryOperator::LogicalAnd => Opcode::I32And,
        BinaryOperator::LogicalOr => Opcode::I32Or,
    }
}

/// Function and global indices assigned so far
#[derive(Debug, Default)]
struct Indices {
    functions: HashMap<String, u32>,
    globals: HashMap<SymbolId, u32>,
}

impl Indices {
    fn function(&self, name: &str, span: Span) -> Result<u32, EmitError> {
        self.functions
            .get(name)
            .copied()
            .ok_or_else(|| EmitError::UnknownSymbol {
                name: name.to_string(),
                span: span.to_label(),
            })
    }
}

/// Emits one function body
#[derive(Debug, Default)]
struct FunctionCompiler {
    body: FunctionBody,
    locals: HashMap<SymbolId, u32>,
    param_count: u32,
}

impl FunctionCompiler {
    fn new(params: &[TypedParam]) -> Self {
        let locals = params
            .iter()
            .enumerate()
            .map(|(index, param)| (param.name.symbol, index as u32))
            .collect();

        Self {
            body: FunctionBody::new(),
            locals,
            param_count: params.len() as u32,
        }
    }

    fn declare_local(&mut self, symbol: SymbolId, ty: ValType) -> u32 {
        let index = self.param_count + self.body.add_local(ty);
        self.locals.insert(symbol, index);
        index
    }

    /// Body of a declared function. A trailing `return` leaves its value as
    /// the block result; any other ending is unreachable.
    fn emit_function_body(&mut self, body: &TypedBlock, indices: &Indices) -> Result<(), EmitError> {
        match body.statements.split_last() {
            Some((last, rest)) if matches!(last.kind, TypedStatementKind::Return(_)) => {
                for statement in rest {
                    self.emit_statement(statement, indices)?;
                }
                if let TypedStatementKind::Return(ret) = &last.kind {
                    self.emit_expression(&ret.value, indices)?;
                }
            }
            _ => {
                self.emit_block(body, indices)?;
                self.body.emit_unreachable();
            }
        }
        self.body.emit_end();
        Ok(())
    }

    fn emit_block(&mut self, block: &TypedBlock, indices: &Indices) -> Result<(), EmitError> {
        for statement in &block.statements {
            self.emit_statement(statement, indices)?;
        }
        Ok(())
    }

    fn emit_statement(
        &mut self,
        statement: &TypedStatement,
        indices: &Indices,
    ) -> Result<(), EmitError> {
        match &statement.kind {
            TypedStatementKind::Expression(expr) => {
                self.emit_expression(expr, indices)?;
                self.body.emit_drop();
            }
            TypedStatementKind::VarDecl(decl) => self.emit_local_decl(decl, indices)?,
            TypedStatementKind::Assign(assign) => {
                self.emit_expression(&assign.value, indices)?;
                let target = &assign.target;
                self.emit_store(target.symbol, &target.name, target.span, indices)?;
            }
            TypedStatementKind::Block(block) => self.emit_block(block, indices)?,
            // Declarations are lowered by the module emitter
            TypedStatementKind::FunctionDecl(_) | TypedStatementKind::ExternFunctionDecl(_) => {}
            TypedStatementKind::Return(ret) => {
                self.emit_expression(&ret.value, indices)?;
                self.body.emit_return();
            }
            TypedStatementKind::While(while_stmt) => {
                self.body.emit_block(BlockType::Empty);
                self.body.emit_loop(BlockType::Empty);
                self.emit_expression(&while_stmt.condition, indices)?;
                self.body.emit(Opcode::I32Eqz);
                self.body.emit_br_if(1);
                self.emit_block(&while_stmt.body, indices)?;
                self.body.emit_br(0);
                self.body.emit_end();
                self.body.emit_end();
            }
            TypedStatementKind::If(if_stmt) => {
                self.emit_expression(&if_stmt.condition, indices)?;
                self.body.emit_if(BlockType::Empty);
                self.emit_block(&if_stmt.then_block, indices)?;
                if let Some(else_block) = &if_stmt.else_block {
                    self.body.emit_else();
                    self.emit_block(else_block, indices)?;
                }
                self.body.emit_end();
            }
        }
        Ok(())
    }

    fn emit_local_decl(&mut self, decl: &TypedVarDecl, indices: &Indices) -> Result<(), EmitError> {
        let ty = lower_type(
            decl.resolved_type,
            &format!("variable `{}`", decl.name.name),
            decl.span,
        )?;

        // Evaluate before the local exists; the initializer may read a
        // shadowed binding of the same name
        match &decl.initializer {
            Some(init) => self.emit_expression(init, indices)?,
            None => {
                self.body.emit_i32_const(0);
            }
        }
        let index = self.declare_local(decl.name.symbol, ty);
        self.body.emit_local_set(index);
        Ok(())
    }

    fn emit_store(
        &mut self,
        symbol: SymbolId,
        name: &str,
        span: Span,
        indices: &Indices,
    ) -> Result<(), EmitError> {
        if let Some(local) = self.locals.get(&symbol) {
            self.body.emit_local_set(*local);
        } else if let Some(global) = indices.globals.get(&symbol) {
            self.body.emit_global_set(*global);
        } else {
            return Err(EmitError::UnknownSymbol {
                name: name.to_string(),
                span: span.to_label(),
            });
        }
        Ok(())
    }

    fn emit_expression(&mut self, expr: &TypedExpression, indices: &Indices) -> Result<(), EmitError> {
        match &expr.kind {
            TypedExpressionKind::Identifier(identifier) => {
                if let Some(local) = self.locals.get(&identifier.symbol) {
                    self.body.emit_local_get(*local);
                } else if let Some(global) = indices.globals.get(&identifier.symbol) {
                    self.body.emit_global_get(*global);
                } else {
                    return Err(EmitError::UnknownSymbol {
                        name: identifier.name.clone(),
                        span: identifier.span.to_label(),
                    });
                }
            }
            TypedExpressionKind::Integer(value) => {
                self.body.emit_i32_const(*value);
            }
            TypedExpressionKind::Boolean(value) => {
                self.body.emit_i32_const(i32::from(*value));
            }
            TypedExpressionKind::String(_) => {
                lower_type(PrimitiveType::String, "string literal", expr.span)?;
            }
            TypedExpressionKind::BinaryOp {
                left,
                operator,
                right,
            } => {
                lower_type(left.resolved_type, "operand", left.span)?;
                self.emit_expression(left, indices)?;
                self.emit_expression(right, indices)?;
                self.body.emit(binary_opcode(*operator));
            }
            TypedExpressionKind::FunctionCall { callee, arguments } => {
                for argument in arguments {
                    self.emit_expression(argument, indices)?;
                }
                let index = indices.function(callee, expr.span)?;
                self.body.emit_call(index);
            }
        }
        Ok(())
    }
}

/// Lowers one typed program
pub struct Emitter<'p> {
    program: &'p TypedProgram,
    options: &'p CompileOptions,
    builder: WasmBuilder,
    indices: Indices,
}

impl<'p> Emitter<'p> {
    pub fn new(program: &'p TypedProgram, options: &'p CompileOptions) -> Self {
        let builder = match &options.module_name {
            Some(name) => WasmBuilder::with_name(name.clone()),
            None => WasmBuilder::new(),
        };

        Self {
            program,
            options,
            builder,
            indices: Indices::default(),
        }
    }

    pub fn emit(mut self) -> Result<WasmBuilder, EmitError> {
        self.declare_functions()?;

        let program = self.program;
        let mut start = FunctionCompiler::default();
        for statement in &program.statements {
            match &statement.kind {
                TypedStatementKind::FunctionDecl(func) => self.emit_function(func)?,
                TypedStatementKind::ExternFunctionDecl(_) => {}
                TypedStatementKind::VarDecl(decl) => self.emit_global(decl, &mut start)?,
                _ => start.emit_statement(statement, &self.indices)?,
            }
        }

        if !start.body.code.is_empty() {
            start.body.emit_end();
            let index = self.builder.add_function(FuncType::default(), start.body);
            self.builder.set_start(index);
            log::debug!("synthesized {} as function {}", START_FUNCTION, index);
        }

        Ok(self.builder)
    }

    /// Import every extern and reserve indices for defined functions, so
    /// calls resolve regardless of where the callee's body is emitted
    fn declare_functions(&mut self) -> Result<(), EmitError> {
        for signature in self.program.functions.iter().filter(|f| f.is_extern) {
            let func_type = lower_signature(signature)?;
            let index = self.builder.import_function(
                self.options.import_module.clone(),
                signature.name.clone(),
                func_type,
            )?;
            self.indices.functions.insert(signature.name.clone(), index);
        }

        let mut next = self.builder.function_count();
        for signature in self.program.functions.iter().filter(|f| !f.is_extern) {
            self.indices.functions.insert(signature.name.clone(), next);
            next += 1;
        }
        Ok(())
    }

    fn emit_function(&mut self, func: &TypedFunctionDecl) -> Result<(), EmitError> {
        let signature = self.program.functions.get(&func.name).ok_or_else(|| {
            EmitError::UnknownSymbol {
                name: func.name.clone(),
                span: func.span.to_label(),
            }
        })?;
        let func_type = lower_signature(signature)?;

        let mut compiler = FunctionCompiler::new(&func.params);
        compiler.emit_function_body(&func.body, &self.indices)?;

        let index = self.builder.add_function(func_type, compiler.body);
        log::debug!("emitted function `{}` as {}", func.name, index);

        if self.options.export_functions {
            self.builder.export_function(func.name.clone(), index);
        }
        Ok(())
    }

    fn emit_global(
        &mut self,
        decl: &TypedVarDecl,
        start: &mut FunctionCompiler,
    ) -> Result<(), EmitError> {
        let ty = lower_type(
            decl.resolved_type,
            &format!("global `{}`", decl.name.name),
            decl.span,
        )?;

        let constant = match &decl.initializer {
            Some(TypedExpression {
                kind: TypedExpressionKind::Integer(value),
                ..
            }) => Some(*value),
            Some(TypedExpression {
                kind: TypedExpressionKind::Boolean(value),
                ..
            }) => Some(i32::from(*value)),
            Some(_) => None,
            None => Some(0),
        };

        let global = Global::new(ty, true, ConstValue::I32(constant.unwrap_or(0)))?;
        let index = self.builder.add_global(global);

        // Initializers that are not constants run in the start function
        if constant.is_none() {
            if let Some(init) = &decl.initializer {
                start.emit_expression(init, &self.indices)?;
                self.indices.globals.insert(decl.name.symbol, index);
                start.body.emit_global_set(index);
                return Ok(());
            }
        }

        self.indices.globals.insert(decl.name.symbol, index);
        Ok(())
    }
}

/// Lower a typed program into a module builder
pub fn emit_program(
    program: &TypedProgram,
    options: &CompileOptions,
) -> Result<WasmBuilder, EmitError> {
    Emitter::new(program, options).emit()
}
