//! Supported instruction set
//!
//! Control flow, variable access, integer constants and the i32/i64
//! numeric instructions. Floating point and memory instructions are not
//! part of the table.

use crate::types::ValType;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Control
    Unreachable,
    Nop,
    Block,
    Loop,
    If,
    Else,
    End,
    Br,
    BrIf,
    Return,
    Call,
    // Parametric
    Drop,
    Select,
    // Variables
    LocalGet,
    LocalSet,
    LocalTee,
    GlobalGet,
    GlobalSet,
    // Constants
    I32Const,
    I64Const,
    // i32 comparison
    I32Eqz,
    I32Eq,
    I32Ne,
    I32LtS,
    I32LtU,
    I32GtS,
    I32GtU,
    I32LeS,
    I32LeU,
    I32GeS,
    I32GeU,
    // i64 comparison
    I64Eqz,
    I64Eq,
    I64Ne,
    I64LtS,
    I64LtU,
    I64GtS,
    I64GtU,
    I64LeS,
    I64LeU,
    I64GeS,
    I64GeU,
    // i32 arithmetic
    I32Clz,
    I32Ctz,
    I32Popcnt,
    I32Add,
    I32Sub,
    I32Mul,
    I32DivS,
    I32DivU,
    I32RemS,
    I32RemU,
    I32And,
    I32Or,
    I32Xor,
    I32Shl,
    I32ShrS,
    I32ShrU,
    I32Rotl,
    I32Rotr,
    // i64 arithmetic
    I64Clz,
    I64Ctz,
    I64Popcnt,
    I64Add,
    I64Sub,
    I64Mul,
    I64DivS,
    I64DivU,
    I64RemS,
    I64RemU,
    I64And,
    I64Or,
    I64Xor,
    I64Shl,
    I64ShrS,
    I64ShrU,
    I64Rotl,
    I64Rotr,
    // Conversions
    I32WrapI64,
    I64ExtendI32S,
    I64ExtendI32U,
}

/// Every supported opcode with its byte and text name
const TABLE: &[(Opcode, u8, &str)] = &[
    (Opcode::Unreachable, 0x00, "unreachable"),
    (Opcode::Nop, 0x01, "nop"),
    (Opcode::Block, 0x02, "block"),
    (Opcode::Loop, 0x03, "loop"),
    (Opcode::If, 0x04, "if"),
    (Opcode::Else, 0x05, "else"),
    (Opcode::End, 0x0B, "end"),
    (Opcode::Br, 0x0C, "br"),
    (Opcode::BrIf, 0x0D, "br_if"),
    (Opcode::Return, 0x0F, "return"),
    (Opcode::Call, 0x10, "call"),
    (Opcode::Drop, 0x1A, "drop"),
    (Opcode::Select, 0x1B, "select"),
    (Opcode::LocalGet, 0x20, "local.get"),
    (Opcode::LocalSet, 0x21, "local.set"),
    (Opcode::LocalTee, 0x22, "local.tee"),
    (Opcode::GlobalGet, 0x23, "global.get"),
    (Opcode::GlobalSet, 0x24, "global.set"),
    (Opcode::I32Const, 0x41, "i32.const"),
    (Opcode::I64Const, 0x42, "i64.const"),
    (Opcode::I32Eqz, 0x45, "i32.eqz"),
    (Opcode::I32Eq, 0x46, "i32.eq"),
    (Opcode::I32Ne, 0x47, "i32.ne"),
    (Opcode::I32LtS, 0x48, "i32.lt_s"),
    (Opcode::I32LtU, 0x49, "i32.lt_u"),
    (Opcode::I32GtS, 0x4A, "i32.gt_s"),
    (Opcode::I32GtU, 0x4B, "i32.gt_u"),
    (Opcode::I32LeS, 0x4C, "i32.le_s"),
    (Opcode::I32LeU, 0x4D, "i32.le_u"),
    (Opcode::I32GeS, 0x4E, "i32.ge_s"),
    (Opcode::I32GeU, 0x4F, "i32.ge_u"),
    (Opcode::I64Eqz, 0x50, "i64.eqz"),
    (Opcode::I64Eq, 0x51, "i64.eq"),
    (Opcode::I64Ne, 0x52, "i64.ne"),
    (Opcode::I64LtS, 0x53, "i64.lt_s"),
    (Opcode::I64LtU, 0x54, "i64.lt_u"),
    (Opcode::I64GtS, 0x55, "i64.gt_s"),
    (Opcode::I64GtU, 0x56, "i64.gt_u"),
    (Opcode::I64LeS, 0x57, "i64.le_s"),
    (Opcode::I64LeU, 0x58, "i64.le_u"),
    (Opcode::I64GeS, 0x59, "i64.ge_s"),
    (Opcode::I64GeU, 0x5A, "i64.ge_u"),
    (Opcode::I32Clz, 0x67, "i32.clz"),
    (Opcode::I32Ctz, 0x68, "i32.ctz"),
    (Opcode::I32Popcnt, 0x69, "i32.popcnt"),
    (Opcode::I32Add, 0x6A, "i32.add"),
    (Opcode::I32Sub, 0x6B, "i32.sub"),
    (Opcode::I32Mul, 0x6C, "i32.mul"),
    (Opcode::I32DivS, 0x6D, "i32.div_s"),
    (Opcode::I32DivU, 0x6E, "i32.div_u"),
    (Opcode::I32RemS, 0x6F, "i32.rem_s"),
    (Opcode::I32RemU, 0x70, "i32.rem_u"),
    (Opcode::I32And, 0x71, "i32.and"),
    (Opcode::I32Or, 0x72, "i32.or"),
    (Opcode::I32Xor, 0x73, "i32.xor"),
    (Opcode::I32Shl, 0x74, "i32.shl"),
    (Opcode::I32ShrS, 0x75, "i32.shr_s"),
    (Opcode::I32ShrU, 0x76, "i32.shr_u"),
    (Opcode::I32Rotl, 0x77, "i32.rotl"),
    (Opcode::I32Rotr, 0x78, "i32.rotr"),
    (Opcode::I64Clz, 0x79, "i64.clz"),
    (Opcode::I64Ctz, 0x7A, "i64.ctz"),
    (Opcode::I64Popcnt, 0x7B, "i64.popcnt"),
    (Opcode::I64Add, 0x7C, "i64.add"),
    (Opcode::I64Sub, 0x7D, "i64.sub"),
    (Opcode::I64Mul, 0x7E, "i64.mul"),
    (Opcode::I64DivS, 0x7F, "i64.div_s"),
    (Opcode::I64DivU, 0x80, "i64.div_u"),
    (Opcode::I64RemS, 0x81, "i64.rem_s"),
    (Opcode::I64RemU, 0x82, "i64.rem_u"),
    (Opcode::I64And, 0x83, "i64.and"),
    (Opcode::I64Or, 0x84, "i64.or"),
    (Opcode::I64Xor, 0x85, "i64.xor"),
    (Opcode::I64Shl, 0x86, "i64.shl"),
    (Opcode::I64ShrS, 0x87, "i64.shr_s"),
    (Opcode::I64ShrU, 0x88, "i64.shr_u"),
    (Opcode::I64Rotl, 0x89, "i64.rotl"),
    (Opcode::I64Rotr, 0x8A, "i64.rotr"),
    (Opcode::I32WrapI64, 0xA7, "i32.wrap_i64"),
    (Opcode::I64ExtendI32S, 0xAC, "i64.extend_i32_s"),
    (Opcode::I64ExtendI32U, 0xAD, "i64.extend_i32_u"),
];

/// Stack effect shared by a group of numeric instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericShape {
    /// `t -> i32`
    Test(ValType),
    /// `t t -> i32`
    Relational(ValType),
    /// `t -> t`
    Unary(ValType),
    /// `t t -> t`
    Binary(ValType),
    /// `from -> to`
    Convert { from: ValType, to: ValType },
}

impl Opcode {
    pub fn byte(self) -> u8 {
        TABLE
            .iter()
            .find(|(opcode, _, _)| *opcode == self)
            .map(|(_, byte, _)| *byte)
            .unwrap_or(0x00)
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        TABLE
            .iter()
            .find(|(_, code, _)| *code == byte)
            .map(|(opcode, _, _)| *opcode)
    }

    pub fn name(self) -> &'static str {
        TABLE
            .iter()
            .find(|(opcode, _, _)| *opcode == self)
            .map(|(_, _, name)| *name)
            .unwrap_or("unknown")
    }

    /// Stack effect of numeric instructions; `None` for everything else
    pub fn numeric_shape(self) -> Option<NumericShape> {
        use NumericShape::*;
        use ValType::{I32, I64};

        let byte = self.byte();
        let shape = match byte {
            0x45 => Test(I32),
            0x46..=0x4F => Relational(I32),
            0x50 => Test(I64),
            0x51..=0x5A => Relational(I64),
            0x67..=0x69 => Unary(I32),
            0x6A..=0x78 => Binary(I32),
            0x79..=0x7B => Unary(I64),
            0x7C..=0x8A => Binary(I64),
            0xA7 => Convert { from: I64, to: I32 },
            0xAC | 0xAD => Convert { from: I32, to: I64 },
            _ => return None,
        };
        Some(shape)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
