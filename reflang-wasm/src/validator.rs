//! Operand-stack validation of function bodies
//!
//! Tracks the operand types pushed and popped by every instruction together
//! with a stack of control frames. After an unconditional branch the rest of
//! the frame is unreachable: pops at the frame boundary then yield `Unknown`
//! instead of failing.

use crate::error::{DecodeError, ValidationError};
use crate::leb128::{decode_i32, decode_i64, decode_u32};
use crate::opcodes::{NumericShape, Opcode};
use crate::types::{BlockType, FuncType, GlobalType, ValType};

/// Module-level facts the validator needs to check calls and globals
pub trait ModuleInfo {
    /// Signature of a function in the combined (imports first) index space
    fn function_type(&self, index: u32) -> Option<&FuncType>;

    fn global_type(&self, index: u32) -> Option<GlobalType>;
}

/// Type of an operand stack entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    Known(ValType),
    /// Produced by popping past the frame boundary in unreachable code
    Unknown,
}

impl From<ValType> for OperandType {
    fn from(ty: ValType) -> Self {
        OperandType::Known(ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlFrame {
    pub opcode: Opcode,
    pub start_types: Vec<ValType>,
    pub end_types: Vec<ValType>,
    /// Operand stack height when the frame was entered
    pub height: usize,
    pub unreachable: bool,
}

impl ControlFrame {
    /// Types a branch to this frame must provide
    fn label_types(&self) -> &[ValType] {
        if self.opcode == Opcode::Loop {
            &self.start_types
        } else {
            &self.end_types
        }
    }
}

pub struct Validator<'m, M: ModuleInfo> {
    module: &'m M,
    /// Parameters followed by declared locals
    locals: Vec<ValType>,
    operands: Vec<OperandType>,
    frames: Vec<ControlFrame>,
    /// Byte offset of the instruction being validated
    position: usize,
}

impl<'m, M: ModuleInfo> Validator<'m, M> {
    /// Start validating a function body; the implicit function frame is
    /// already open
    pub fn new(module: &'m M, func_type: &FuncType, declared_locals: &[ValType]) -> Self {
        let mut locals = func_type.params.clone();
        locals.extend_from_slice(declared_locals);

        Self {
            module,
            locals,
            operands: Vec::new(),
            frames: vec![ControlFrame {
                opcode: Opcode::Block,
                start_types: Vec::new(),
                end_types: func_type.results.clone(),
                height: 0,
                unreachable: false,
            }],
            position: 0,
        }
    }

    pub fn operands(&self) -> &[OperandType] {
        &self.operands
    }

    pub fn frames(&self) -> &[ControlFrame] {
        &self.frames
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn push(&mut self, ty: impl Into<OperandType>) {
        self.operands.push(ty.into());
    }

    pub fn pop(&mut self) -> Result<OperandType, ValidationError> {
        let (height, unreachable) = match self.frames.last() {
            Some(frame) => (frame.height, frame.unreachable),
            None => (0, false),
        };

        if self.operands.len() == height {
            if unreachable {
                return Ok(OperandType::Unknown);
            }
            return Err(ValidationError::StackUnderflow);
        }

        self.operands.pop().ok_or(ValidationError::StackUnderflow)
    }

    pub fn pop_expected(&mut self, expected: ValType) -> Result<OperandType, ValidationError> {
        let actual = self.pop()?;
        match actual {
            OperandType::Known(found) if found != expected => {
                Err(ValidationError::StackTypeMismatch { expected, found })
            }
            _ => Ok(actual),
        }
    }

    fn pop_all(&mut self, types: &[ValType]) -> Result<(), ValidationError> {
        for ty in types.iter().rev() {
            self.pop_expected(*ty)?;
        }
        Ok(())
    }

    fn push_all(&mut self, types: &[ValType]) {
        for ty in types {
            self.push(*ty);
        }
    }

    pub fn push_frame(&mut self, opcode: Opcode, start_types: Vec<ValType>, end_types: Vec<ValType>) {
        let height = self.operands.len();
        self.push_all(&start_types);
        self.frames.push(ControlFrame {
            opcode,
            start_types,
            end_types,
            height,
            unreachable: false,
        });
    }

    /// Check the innermost frame's results and close it
    pub fn pop_frame(&mut self) -> Result<ControlFrame, ValidationError> {
        let end_types = self
            .frames
            .last()
            .map(|frame| frame.end_types.clone())
            .ok_or(ValidationError::UnbalancedFrames { open: 0 })?;

        self.pop_all(&end_types)?;

        let frame = self
            .frames
            .pop()
            .ok_or(ValidationError::UnbalancedFrames { open: 0 })?;
        if self.operands.len() != frame.height {
            return Err(ValidationError::StackHeightMismatch {
                expected: frame.height,
                found: self.operands.len(),
            });
        }
        Ok(frame)
    }

    /// Discard the rest of the current frame's operands
    pub fn set_unreachable(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            self.operands.truncate(frame.height);
            frame.unreachable = true;
        }
    }

    fn label(&self, depth: u32) -> Result<Vec<ValType>, ValidationError> {
        let index = self
            .frames
            .len()
            .checked_sub(1 + depth as usize)
            .ok_or(ValidationError::UnknownLabel { depth })?;
        Ok(self.frames[index].label_types().to_vec())
    }

    fn local(&self, index: u32) -> Result<ValType, ValidationError> {
        self.locals
            .get(index as usize)
            .copied()
            .ok_or(ValidationError::UnknownLocal { index })
    }

    fn apply_numeric(&mut self, shape: NumericShape) -> Result<(), ValidationError> {
        match shape {
            NumericShape::Test(ty) => {
                self.pop_expected(ty)?;
                self.push(ValType::I32);
            }
            NumericShape::Relational(ty) => {
                self.pop_expected(ty)?;
                self.pop_expected(ty)?;
                self.push(ValType::I32);
            }
            NumericShape::Unary(ty) => {
                self.pop_expected(ty)?;
                self.push(ty);
            }
            NumericShape::Binary(ty) => {
                self.pop_expected(ty)?;
                self.pop_expected(ty)?;
                self.push(ty);
            }
            NumericShape::Convert { from, to } => {
                self.pop_expected(from)?;
                self.push(to);
            }
        }
        Ok(())
    }

    /// Validate a complete instruction stream ending with the function's `end`
    pub fn validate_code(&mut self, code: &[u8]) -> Result<(), ValidationError> {
        let mut offset = 0;

        while offset < code.len() {
            if self.frames.is_empty() {
                // Bytes after the function's final `end`
                return Err(ValidationError::UnbalancedFrames { open: 0 });
            }
            self.position = offset;
            offset = self.validate_instruction(code, offset)?;
        }

        if !self.frames.is_empty() {
            return Err(ValidationError::UnbalancedFrames {
                open: self.frames.len(),
            });
        }
        Ok(())
    }

    fn read_u32(code: &[u8], offset: &mut usize) -> Result<u32, ValidationError> {
        let (value, read) = decode_u32(code, *offset)?;
        *offset += read;
        Ok(value)
    }

    fn read_block_type(code: &[u8], offset: &mut usize) -> Result<BlockType, ValidationError> {
        let byte = *code
            .get(*offset)
            .ok_or(DecodeError::UnexpectedEof { offset: *offset })?;
        *offset += 1;

        if byte == 0x40 {
            return Ok(BlockType::Empty);
        }
        ValType::from_code(byte)
            .map(BlockType::Value)
            .ok_or(ValidationError::InvalidBlockType { byte })
    }

    /// Validate the instruction at `offset`; returns the offset of the next one
    fn validate_instruction(&mut self, code: &[u8], offset: usize) -> Result<usize, ValidationError> {
        let byte = code[offset];
        let opcode =
            Opcode::from_byte(byte).ok_or(ValidationError::UnknownOpcode { opcode: byte })?;
        let mut next = offset + 1;

        log::trace!("validate {:#06x}: {}", offset, opcode);

        if let Some(shape) = opcode.numeric_shape() {
            self.apply_numeric(shape)?;
            return Ok(next);
        }

        match opcode {
            Opcode::Unreachable => self.set_unreachable(),
            Opcode::Nop => {}
            Opcode::Block | Opcode::Loop => {
                let block_type = Self::read_block_type(code, &mut next)?;
                self.push_frame(opcode, Vec::new(), block_type.results());
            }
            Opcode::If => {
                let block_type = Self::read_block_type(code, &mut next)?;
                self.pop_expected(ValType::I32)?;
                self.push_frame(opcode, Vec::new(), block_type.results());
            }
            Opcode::Else => {
                if self.frames.last().map(|frame| frame.opcode) != Some(Opcode::If) {
                    return Err(ValidationError::ElseWithoutIf);
                }
                let frame = self.pop_frame()?;
                self.push_frame(Opcode::Else, frame.start_types, frame.end_types);
            }
            Opcode::End => {
                let frame = self.pop_frame()?;
                // The implicit else branch passes its inputs straight through
                if frame.opcode == Opcode::If && frame.start_types != frame.end_types {
                    return Err(ValidationError::IfWithoutElse {
                        expected: frame.end_types.len(),
                    });
                }
                self.push_all(&frame.end_types);
            }
            Opcode::Br => {
                let depth = Self::read_u32(code, &mut next)?;
                let types = self.label(depth)?;
                self.pop_all(&types)?;
                self.set_unreachable();
            }
            Opcode::BrIf => {
                let depth = Self::read_u32(code, &mut next)?;
                self.pop_expected(ValType::I32)?;
                let types = self.label(depth)?;
                self.pop_all(&types)?;
                self.push_all(&types);
            }
            Opcode::Return => {
                let results = self
                    .frames
                    .first()
                    .map(|frame| frame.end_types.clone())
                    .unwrap_or_default();
                self.pop_all(&results)?;
                self.set_unreachable();
            }
            Opcode::Call => {
                let index = Self::read_u32(code, &mut next)?;
                let func_type = self
                    .module
                    .function_type(index)
                    .ok_or(ValidationError::UnknownFunction { index })?
                    .clone();
                self.pop_all(&func_type.params)?;
                self.push_all(&func_type.results);
            }
            Opcode::Drop => {
                self.pop()?;
            }
            Opcode::Select => {
                self.pop_expected(ValType::I32)?;
                let first = self.pop()?;
                let second = self.pop()?;
                let result = match (first, second) {
                    (OperandType::Known(a), OperandType::Known(b)) if a != b => {
                        return Err(ValidationError::StackTypeMismatch {
                            expected: a,
                            found: b,
                        });
                    }
                    (OperandType::Unknown, other) => other,
                    (known, _) => known,
                };
                self.push(result);
            }
            Opcode::LocalGet => {
                let index = Self::read_u32(code, &mut next)?;
                let ty = self.local(index)?;
                self.push(ty);
            }
            Opcode::LocalSet => {
                let index = Self::read_u32(code, &mut next)?;
                let ty = self.local(index)?;
                self.pop_expected(ty)?;
            }
            Opcode::LocalTee => {
                let index = Self::read_u32(code, &mut next)?;
                let ty = self.local(index)?;
                self.pop_expected(ty)?;
                self.push(ty);
            }
            Opcode::GlobalGet => {
                let index = Self::read_u32(code, &mut next)?;
                let global = self
                    .module
                    .global_type(index)
                    .ok_or(ValidationError::UnknownGlobal { index })?;
                self.push(global.ty);
            }
            Opcode::GlobalSet => {
                let index = Self::read_u32(code, &mut next)?;
                let global = self
                    .module
                    .global_type(index)
                    .ok_or(ValidationError::UnknownGlobal { index })?;
                if !global.mutable {
                    return Err(ValidationError::ImmutableGlobal { index });
                }
                self.pop_expected(global.ty)?;
            }
            Opcode::I32Const => {
                let (_, read) = decode_i32(code, next)?;
                next += read;
                self.push(ValType::I32);
            }
            Opcode::I64Const => {
                let (_, read) = decode_i64(code, next)?;
                next += read;
                self.push(ValType::I64);
            }
            other => return Err(ValidationError::UnknownOpcode { opcode: other.byte() }),
        }

        Ok(next)
    }
}

/// Validate one function body against its signature and the module
pub fn validate_function<M: ModuleInfo>(
    module: &M,
    func_type: &FuncType,
    locals: &[ValType],
    code: &[u8],
) -> Result<(), (usize, ValidationError)> {
    let mut validator = Validator::new(module, func_type, locals);
    validator
        .validate_code(code)
        .map_err(|error| (validator.position(), error))
}
