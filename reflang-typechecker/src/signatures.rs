//! Function signature table
//!
//! Signatures are kept in declaration order; the emitter relies on that
//! order when it assigns function indices.

use indexmap::IndexMap;
use reflang_parser::{PrimitiveType, Span};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub return_type: PrimitiveType,
    /// `None` when the declaration had no parameter list at all
    pub params: Option<Vec<PrimitiveType>>,
    pub is_extern: bool,
    pub span: Option<Span>,
}

impl FunctionSignature {
    pub fn param_types(&self) -> &[PrimitiveType] {
        self.params.as_deref().unwrap_or(&[])
    }

    pub fn arity(&self) -> usize {
        self.param_types().len()
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_extern {
            write!(f, "extern ")?;
        }
        write!(f, "fn {}(", self.name)?;
        for (i, param) in self.param_types().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}

/// Name to signature mapping; entries are immutable once inserted
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionTable {
    signatures: IndexMap<String, FunctionSignature>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a signature. An existing entry with the same name is kept
    /// and returned as the error.
    pub fn insert(&mut self, signature: FunctionSignature) -> Result<(), FunctionSignature> {
        if let Some(existing) = self.signatures.get(&signature.name) {
            return Err(existing.clone());
        }
        log::debug!("registered function {}", signature);
        self.signatures.insert(signature.name.clone(), signature);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.signatures.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.signatures.contains_key(name)
    }

    /// Signatures in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.signatures.values()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}
