//! Function bodies: declared locals plus the raw instruction stream
//!
//! The `emit_*` methods append one instruction each. Bodies are expected to
//! finish with an explicit `end`.

use crate::leb128::{encode_i32, encode_i64, encode_u32};
use crate::opcodes::Opcode;
use crate::types::{BlockType, ValType};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionBody {
    /// Declared locals, excluding parameters
    pub locals: Vec<ValType>,
    pub code: Vec<u8>,
}

impl FunctionBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locals(locals: Vec<ValType>) -> Self {
        Self {
            locals,
            code: Vec::new(),
        }
    }

    /// Declare a local and return its position among the declared locals.
    /// The local's index in the function is this plus the parameter count.
    pub fn add_local(&mut self, ty: ValType) -> u32 {
        self.locals.push(ty);
        (self.locals.len() - 1) as u32
    }

    /// Instruction without immediates
    pub fn emit(&mut self, opcode: Opcode) -> &mut Self {
        self.code.push(opcode.byte());
        self
    }

    fn emit_index(&mut self, opcode: Opcode, index: u32) -> &mut Self {
        self.code.push(opcode.byte());
        encode_u32(&mut self.code, index);
        self
    }

    fn emit_block_start(&mut self, opcode: Opcode, block_type: BlockType) -> &mut Self {
        self.code.push(opcode.byte());
        self.code.push(block_type.code());
        self
    }

    pub fn emit_unreachable(&mut self) -> &mut Self {
        self.emit(Opcode::Unreachable)
    }

    pub fn emit_nop(&mut self) -> &mut Self {
        self.emit(Opcode::Nop)
    }

    pub fn emit_block(&mut self, block_type: BlockType) -> &mut Self {
        self.emit_block_start(Opcode::Block, block_type)
    }

    pub fn emit_loop(&mut self, block_type: BlockType) -> &mut Self {
        self.emit_block_start(Opcode::Loop, block_type)
    }

    pub fn emit_if(&mut self, block_type: BlockType) -> &mut Self {
        self.emit_block_start(Opcode::If, block_type)
    }

    pub fn emit_else(&mut self) -> &mut Self {
        self.emit(Opcode::Else)
    }

    pub fn emit_end(&mut self) -> &mut Self {
        self.emit(Opcode::End)
    }

    pub fn emit_br(&mut self, depth: u32) -> &mut Self {
        self.emit_index(Opcode::Br, depth)
    }

    pub fn emit_br_if(&mut self, depth: u32) -> &mut Self {
        self.emit_index(Opcode::BrIf, depth)
    }

    pub fn emit_return(&mut self) -> &mut Self {
        self.emit(Opcode::Return)
    }

    pub fn emit_call(&mut self, function: u32) -> &mut Self {
        self.emit_index(Opcode::Call, function)
    }

    pub fn emit_drop(&mut self) -> &mut Self {
        self.emit(Opcode::Drop)
    }

    pub fn emit_select(&mut self) -> &mut Self {
        self.emit(Opcode::Select)
    }

    pub fn emit_local_get(&mut self, index: u32) -> &mut Self {
        self.emit_index(Opcode::LocalGet, index)
    }

    pub fn emit_local_set(&mut self, index: u32) -> &mut Self {
        self.emit_index(Opcode::LocalSet, index)
    }

    pub fn emit_local_tee(&mut self, index: u32) -> &mut Self {
        self.emit_index(Opcode::LocalTee, index)
    }

    pub fn emit_global_get(&mut self, index: u32) -> &mut Self {
        self.emit_index(Opcode::GlobalGet, index)
    }

    pub fn emit_global_set(&mut self, index: u32) -> &mut Self {
        self.emit_index(Opcode::GlobalSet, index)
    }

    pub fn emit_i32_const(&mut self, value: i32) -> &mut Self {
        self.code.push(Opcode::I32Const.byte());
        encode_i32(&mut self.code, value);
        self
    }

    pub fn emit_i64_const(&mut self, value: i64) -> &mut Self {
        self.code.push(Opcode::I64Const.byte());
        encode_i64(&mut self.code, value);
        self
    }

    /// Serialized body without its size prefix
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.code.len() + 8);
        let groups = group_locals(&self.locals);

        encode_u32(&mut buf, groups.len() as u32);
        for (count, ty) in groups {
            encode_u32(&mut buf, count);
            buf.push(ty.code());
        }
        buf.extend_from_slice(&self.code);
        buf
    }
}

/// Collapse runs of equal local types into `(count, type)` groups
pub fn group_locals(locals: &[ValType]) -> Vec<(u32, ValType)> {
    let mut groups: Vec<(u32, ValType)> = Vec::new();
    for ty in locals {
        if let Some(last) = groups.last_mut() {
            if last.1 == *ty {
                last.0 += 1;
                continue;
            }
        }
        groups.push((1, *ty));
    }
    groups
}
