//! Module builder and binary encoder
//!
//! Sections are written in this order: Type, Import, Function, Memory,
//! Global, Export, Start, Code. Each one is an id byte, the LEB128 payload
//! length, then the payload. Empty optional sections are skipped.

use crate::error::WasmError;
use crate::function::FunctionBody;
use crate::leb128::encode_u32;
use crate::types::{
    Export, FuncType, Global, GlobalType, Import, ImportDesc, Limits, ValType,
};
use crate::validator::{validate_function, ModuleInfo};
use std::io::Write;

pub const MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];
pub const VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

pub mod section {
    pub const TYPE: u8 = 1;
    pub const IMPORT: u8 = 2;
    pub const FUNCTION: u8 = 3;
    pub const MEMORY: u8 = 5;
    pub const GLOBAL: u8 = 6;
    pub const EXPORT: u8 = 7;
    pub const START: u8 = 8;
    pub const CODE: u8 = 10;
}

/// A defined function: its type index and body
#[derive(Debug, Clone, PartialEq)]
struct DefinedFunction {
    type_index: u32,
    body: FunctionBody,
}

/// Incrementally built module
#[derive(Debug, Clone, Default)]
pub struct WasmBuilder {
    /// Debug name; kept for diagnostics only and never serialized
    name: Option<String>,
    types: Vec<FuncType>,
    imports: Vec<Import>,
    functions: Vec<DefinedFunction>,
    globals: Vec<Global>,
    exports: Vec<Export>,
    start: Option<u32>,
    /// Type index of every function in the combined index space
    function_types: Vec<u32>,
    /// Type of every global in the combined index space
    global_types: Vec<GlobalType>,
}

impl WasmBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Append a signature to the type section and return its index
    pub fn add_type(&mut self, func_type: FuncType) -> u32 {
        self.types.push(func_type);
        (self.types.len() - 1) as u32
    }

    /// Import a function; returns its function index.
    ///
    /// Imported functions must precede defined ones in the index space, so
    /// this fails once any function body has been added.
    pub fn import_function(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        func_type: FuncType,
    ) -> Result<u32, WasmError> {
        let (module, name) = (module.into(), name.into());
        if !self.functions.is_empty() {
            return Err(WasmError::ImportAfterFunction { module, name });
        }

        let type_index = self.add_type(func_type);
        self.imports.push(Import {
            module,
            name,
            desc: ImportDesc::Function(type_index),
        });
        self.function_types.push(type_index);
        Ok((self.function_types.len() - 1) as u32)
    }

    /// Import a global; returns its global index
    pub fn import_global(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        global_type: GlobalType,
    ) -> Result<u32, WasmError> {
        if !self.globals.is_empty() {
            return Err(WasmError::ImportAfterGlobal {
                module: module.into(),
                name: name.into(),
            });
        }

        self.imports.push(Import {
            module: module.into(),
            name: name.into(),
            desc: ImportDesc::Global(global_type),
        });
        self.global_types.push(global_type);
        Ok((self.global_types.len() - 1) as u32)
    }

    pub fn import_memory(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        limits: Limits,
    ) {
        self.imports.push(Import {
            module: module.into(),
            name: name.into(),
            desc: ImportDesc::Memory(limits),
        });
    }

    pub fn import_table(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        element: ValType,
        limits: Limits,
    ) {
        self.imports.push(Import {
            module: module.into(),
            name: name.into(),
            desc: ImportDesc::Table { element, limits },
        });
    }

    /// Add a function with its own type entry; returns its function index
    pub fn add_function(&mut self, func_type: FuncType, body: FunctionBody) -> u32 {
        let type_index = self.add_type(func_type);
        self.functions.push(DefinedFunction { type_index, body });
        self.function_types.push(type_index);
        (self.function_types.len() - 1) as u32
    }

    /// Add a defined global; returns its global index
    pub fn add_global(&mut self, global: Global) -> u32 {
        self.global_types.push(global.global_type);
        self.globals.push(global);
        (self.global_types.len() - 1) as u32
    }

    pub fn export_function(&mut self, name: impl Into<String>, function: u32) {
        self.exports.push(Export {
            name: name.into(),
            function,
        });
    }

    pub fn set_start(&mut self, function: u32) {
        self.start = Some(function);
    }

    pub fn start(&self) -> Option<u32> {
        self.start
    }

    /// Number of functions, imported and defined
    pub fn function_count(&self) -> u32 {
        self.function_types.len() as u32
    }

    pub fn imported_function_count(&self) -> u32 {
        self.function_types.len() as u32 - self.functions.len() as u32
    }

    pub fn types(&self) -> &[FuncType] {
        &self.types
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    pub fn exports(&self) -> &[Export] {
        &self.exports
    }

    /// Body of a defined function by function index
    pub fn body(&self, function: u32) -> Option<&FunctionBody> {
        let defined = function.checked_sub(self.imported_function_count())?;
        self.functions
            .get(defined as usize)
            .map(|function| &function.body)
    }

    fn check_function_index(&self, index: u32) -> Result<(), WasmError> {
        if index < self.function_count() {
            Ok(())
        } else {
            Err(WasmError::InvalidFunctionIndex { index })
        }
    }

    /// Validate every function body, stopping at the first error
    pub fn validate(&self) -> Result<(), WasmError> {
        let imported = self.imported_function_count();

        for (position, function) in self.functions.iter().enumerate() {
            let index = imported + position as u32;
            let func_type = &self.types[function.type_index as usize];

            validate_function(self, func_type, &function.body.locals, &function.body.code)
                .map_err(|(offset, source)| WasmError::Validation {
                    function: index,
                    offset,
                    source,
                })?;
        }

        for export in &self.exports {
            self.check_function_index(export.function)?;
        }
        if let Some(start) = self.start {
            self.check_function_index(start)?;
            if let Some(func_type) = self.function_type(start) {
                if !func_type.params.is_empty() || !func_type.results.is_empty() {
                    return Err(WasmError::InvalidStartFunction {
                        index: start,
                        found: func_type.clone(),
                    });
                }
            }
        }

        log::debug!(
            "validated {} function(s) in module {}",
            self.functions.len(),
            self.name.as_deref().unwrap_or("<unnamed>")
        );
        Ok(())
    }

    /// Validate, then encode
    pub fn finish(&self) -> Result<Vec<u8>, WasmError> {
        self.validate()?;
        Ok(self.encode())
    }

    /// Serialize without validating
    pub fn encode(&self) -> Vec<u8> {
        let mut module = Vec::new();
        module.extend_from_slice(&MAGIC);
        module.extend_from_slice(&VERSION);

        if !self.types.is_empty() {
            let mut payload = Vec::new();
            encode_u32(&mut payload, self.types.len() as u32);
            for func_type in &self.types {
                func_type.encode(&mut payload);
            }
            push_section(&mut module, section::TYPE, &payload);
        }

        if !self.imports.is_empty() {
            let mut payload = Vec::new();
            encode_u32(&mut payload, self.imports.len() as u32);
            for import in &self.imports {
                import.encode(&mut payload);
            }
            push_section(&mut module, section::IMPORT, &payload);
        }

        if !self.functions.is_empty() {
            let mut payload = Vec::new();
            encode_u32(&mut payload, self.functions.len() as u32);
            for function in &self.functions {
                encode_u32(&mut payload, function.type_index);
            }
            push_section(&mut module, section::FUNCTION, &payload);
        }

        // One memory with no initial pages
        let mut memory = Vec::new();
        encode_u32(&mut memory, 1);
        Limits::new(0, None).encode(&mut memory);
        push_section(&mut module, section::MEMORY, &memory);

        if !self.globals.is_empty() {
            let mut payload = Vec::new();
            encode_u32(&mut payload, self.globals.len() as u32);
            for global in &self.globals {
                global.global_type.encode(&mut payload);
                global.init.encode(&mut payload);
            }
            push_section(&mut module, section::GLOBAL, &payload);
        }

        if !self.exports.is_empty() {
            let mut payload = Vec::new();
            encode_u32(&mut payload, self.exports.len() as u32);
            for export in &self.exports {
                export.encode(&mut payload);
            }
            push_section(&mut module, section::EXPORT, &payload);
        }

        if let Some(start) = self.start {
            let mut payload = Vec::new();
            encode_u32(&mut payload, start);
            push_section(&mut module, section::START, &payload);
        }

        if !self.functions.is_empty() {
            let mut payload = Vec::new();
            encode_u32(&mut payload, self.functions.len() as u32);
            for function in &self.functions {
                let body = function.body.encode();
                encode_u32(&mut payload, body.len() as u32);
                payload.extend_from_slice(&body);
            }
            push_section(&mut module, section::CODE, &payload);
        }

        module
    }

    /// Encode into any writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), WasmError> {
        writer.write_all(&self.encode())?;
        Ok(())
    }
}

impl ModuleInfo for WasmBuilder {
    fn function_type(&self, index: u32) -> Option<&FuncType> {
        let type_index = *self.function_types.get(index as usize)?;
        self.types.get(type_index as usize)
    }

    fn global_type(&self, index: u32) -> Option<GlobalType> {
        self.global_types.get(index as usize).copied()
    }
}

fn push_section(module: &mut Vec<u8>, id: u8, payload: &[u8]) {
    module.push(id);
    encode_u32(module, payload.len() as u32);
    module.extend_from_slice(payload);
}

/// Lowercase hex rendering of a byte buffer
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}
