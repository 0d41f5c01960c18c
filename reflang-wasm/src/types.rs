//! Module-level type definitions: value types, signatures, globals,
//! imports and exports.

use crate::error::WasmError;
use crate::leb128::{encode_i32, encode_i64, encode_name, encode_u32};
use crate::opcodes::Opcode;
use std::fmt;

/// Value types with their binary codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValType {
    I32,
    I64,
    F32,
    F64,
    V128,
    FuncRef,
    ExternRef,
}

impl ValType {
    pub fn code(self) -> u8 {
        match self {
            ValType::I32 => 0x7F,
            ValType::I64 => 0x7E,
            ValType::F32 => 0x7D,
            ValType::F64 => 0x7C,
            ValType::V128 => 0x7B,
            ValType::FuncRef => 0x70,
            ValType::ExternRef => 0x6F,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x7F => Some(ValType::I32),
            0x7E => Some(ValType::I64),
            0x7D => Some(ValType::F32),
            0x7C => Some(ValType::F64),
            0x7B => Some(ValType::V128),
            0x70 => Some(ValType::FuncRef),
            0x6F => Some(ValType::ExternRef),
            _ => None,
        }
    }
}

impl fmt::Display for ValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValType::I32 => "i32",
            ValType::I64 => "i64",
            ValType::F32 => "f32",
            ValType::F64 => "f64",
            ValType::V128 => "v128",
            ValType::FuncRef => "funcref",
            ValType::ExternRef => "externref",
        };
        write!(f, "{}", name)
    }
}

/// Function signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FuncType {
    pub params: Vec<ValType>,
    pub results: Vec<ValType>,
}

impl FuncType {
    pub fn new(params: Vec<ValType>, results: Vec<ValType>) -> Self {
        Self { params, results }
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(0x60);
        encode_u32(buf, self.params.len() as u32);
        buf.extend(self.params.iter().map(|ty| ty.code()));
        encode_u32(buf, self.results.len() as u32);
        buf.extend(self.results.iter().map(|ty| ty.code()));
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |types: &[ValType]| {
            types
                .iter()
                .map(|ty| ty.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        write!(f, "({})->({})", join(&self.params), join(&self.results))
    }
}

/// Result type of a structured control instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Empty,
    Value(ValType),
}

impl BlockType {
    pub fn code(self) -> u8 {
        match self {
            BlockType::Empty => 0x40,
            BlockType::Value(ty) => ty.code(),
        }
    }

    pub fn results(self) -> Vec<ValType> {
        match self {
            BlockType::Empty => Vec::new(),
            BlockType::Value(ty) => vec![ty],
        }
    }
}

/// Constant global initializer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl ConstValue {
    pub fn ty(self) -> ValType {
        match self {
            ConstValue::I32(_) => ValType::I32,
            ConstValue::I64(_) => ValType::I64,
            ConstValue::F32(_) => ValType::F32,
            ConstValue::F64(_) => ValType::F64,
        }
    }

    /// Constant expression including the terminating `end`
    pub(crate) fn encode(self, buf: &mut Vec<u8>) {
        match self {
            ConstValue::I32(value) => {
                buf.push(Opcode::I32Const.byte());
                encode_i32(buf, value);
            }
            ConstValue::I64(value) => {
                buf.push(Opcode::I64Const.byte());
                encode_i64(buf, value);
            }
            ConstValue::F32(value) => {
                buf.push(0x43);
                buf.extend_from_slice(&value.to_le_bytes());
            }
            ConstValue::F64(value) => {
                buf.push(0x44);
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }
        buf.push(Opcode::End.byte());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalType {
    pub ty: ValType,
    pub mutable: bool,
}

impl GlobalType {
    pub(crate) fn encode(self, buf: &mut Vec<u8>) {
        buf.push(self.ty.code());
        buf.push(u8::from(self.mutable));
    }
}

/// A defined global with its constant initializer
#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub global_type: GlobalType,
    pub init: ConstValue,
}

impl Global {
    /// Fails with `GlobalTypeMismatch` if `init` is not of type `ty`
    pub fn new(ty: ValType, mutable: bool, init: ConstValue) -> Result<Self, WasmError> {
        if init.ty() != ty {
            return Err(WasmError::GlobalTypeMismatch {
                declared: ty,
                found: init.ty(),
            });
        }

        Ok(Self {
            global_type: GlobalType { ty, mutable },
            init,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub min: u32,
    pub max: Option<u32>,
}

impl Limits {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub(crate) fn encode(self, buf: &mut Vec<u8>) {
        match self.max {
            None => {
                buf.push(0x00);
                encode_u32(buf, self.min);
            }
            Some(max) => {
                buf.push(0x01);
                encode_u32(buf, self.min);
                encode_u32(buf, max);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportDesc {
    /// Index into the type section
    Function(u32),
    Table { element: ValType, limits: Limits },
    Memory(Limits),
    Global(GlobalType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub desc: ImportDesc,
}

impl Import {
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        encode_name(buf, &self.module);
        encode_name(buf, &self.name);
        match &self.desc {
            ImportDesc::Function(type_index) => {
                buf.push(0x00);
                encode_u32(buf, *type_index);
            }
            ImportDesc::Table { element, limits } => {
                buf.push(0x01);
                buf.push(element.code());
                limits.encode(buf);
            }
            ImportDesc::Memory(limits) => {
                buf.push(0x02);
                limits.encode(buf);
            }
            ImportDesc::Global(global_type) => {
                buf.push(0x03);
                global_type.encode(buf);
            }
        }
    }
}

/// Exported function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub function: u32,
}

impl Export {
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        encode_name(buf, &self.name);
        buf.push(0x00);
        encode_u32(buf, self.function);
    }
}
