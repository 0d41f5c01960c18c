//! Scope and symbol management for the typechecker.
//!
//! Scopes live in an arena and point at their parent by `ScopeId`; symbols
//! live in a second arena and are referenced everywhere by `SymbolId`.
//! Leaving a scope makes its parent current again. The scope itself stays in
//! the arena so symbol handles held by the typed AST remain valid.

use crate::error::TypeError;
use reflang_parser::{PrimitiveType, Span};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

/// A resolved variable or parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub ty: PrimitiveType,
    /// Scope that declared this symbol
    pub scope: ScopeId,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Default)]
struct Scope {
    parent: Option<ScopeId>,
    bindings: HashMap<String, SymbolId>,
}

/// Name resolution environment with a single current scope
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    current: ScopeId,
}

impl Environment {
    /// Create an environment holding only the global scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            symbols: Vec::new(),
            current: ScopeId(0),
        }
    }

    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    /// Push a new scope whose parent is the current scope
    pub fn enter_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(self.current),
            bindings: HashMap::new(),
        });
        self.current = id;
        log::trace!("entered scope {:?} (depth {})", id, self.depth());
        id
    }

    /// Make the parent of the current scope current again.
    /// Returns error if the current scope is the global scope
    pub fn leave_scope(&mut self) -> Result<(), TypeError> {
        match self.scopes[self.current.0].parent {
            Some(parent) => {
                log::trace!("left scope {:?}", self.current);
                self.current = parent;
                Ok(())
            }
            None => Err(TypeError::ScopeUnderflow),
        }
    }

    /// Declare `name` in the current scope.
    ///
    /// A name already bound in the *current* scope is returned as the error
    /// and left untouched; bindings in outer scopes are shadowed.
    pub fn declare(
        &mut self,
        name: &str,
        ty: PrimitiveType,
        span: Option<Span>,
    ) -> Result<Symbol, Symbol> {
        if let Some(existing) = self.scopes[self.current.0].bindings.get(name) {
            return Err(self.symbols[existing.0].clone());
        }

        let id = SymbolId(self.symbols.len());
        let symbol = Symbol {
            id,
            name: name.to_string(),
            ty,
            scope: self.current,
            span,
        };
        self.symbols.push(symbol.clone());
        self.scopes[self.current.0]
            .bindings
            .insert(name.to_string(), id);

        log::debug!("declared `{}`: {} in scope {:?}", name, ty, self.current);
        Ok(symbol)
    }

    /// Find `name` in the current scope or the nearest enclosing one
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            let current = &self.scopes[id.0];
            if let Some(symbol) = current.bindings.get(name) {
                return Some(&self.symbols[symbol.0]);
            }
            scope = current.parent;
        }
        None
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0)
    }

    /// Number of scopes between the current scope and the global scope
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.scopes[self.current.0].parent;
        while let Some(id) = scope {
            depth += 1;
            scope = self.scopes[id.0].parent;
        }
        depth
    }

    /// Whether the symbol was declared in the global scope
    pub fn is_global(&self, id: SymbolId) -> bool {
        self.symbol(id)
            .map(|symbol| symbol.scope == self.global_scope())
            .unwrap_or(false)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
