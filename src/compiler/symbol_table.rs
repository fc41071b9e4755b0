//! Symbol table for the function body being compiled
//!
//! Owns declared variables and hands out compiler temporaries. Scoping
//! (block entry/exit) is the caller's business; this table only tracks
//! what the lowering engine reads and writes.

use crate::ast::Span;
use crate::error::CompileError;
use crate::types::StaticType;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::Deserialize;
use tracing::debug;

/// Where a variable's value lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageClass {
    /// Frame-local; never aliased outside the current frame
    StackOnly,
    /// Heap-allocated box that other holders may share
    #[serde(alias = "heap-boxed-shared")]
    HeapBoxed,
}

/// A declared variable
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub static_type: StaticType,
    pub read_only: bool,
    pub storage: StorageClass,
    pub initialized: bool,
    /// Boxed values must be nulled before their first structured write
    pub must_init_to_null: bool,
    pub mutation_count: u32,
    /// Number of box (re)initializations emitted so far
    pub variant_inits: u32,
    pub temporary: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>, static_type: StaticType, storage: StorageClass) -> Self {
        Self {
            name: name.into(),
            static_type,
            read_only: false,
            storage,
            initialized: false,
            must_init_to_null: false,
            mutation_count: 0,
            variant_inits: 0,
            temporary: false,
        }
    }

    pub fn is_local_only(&self) -> bool {
        self.storage == StorageClass::StackOnly
    }
}

/// Variables of the current function plus its temporaries
#[derive(Debug)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol, FxBuildHasher>,
    temp_prefix: String,
    next_temp: usize,
    must_grow_stack: bool,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_temp_prefix("_")
    }

    pub fn with_temp_prefix(prefix: &str) -> Self {
        Self {
            symbols: IndexMap::default(),
            temp_prefix: prefix.to_string(),
            next_temp: 0,
            must_grow_stack: false,
        }
    }

    /// Declare a variable; returns false if the name is already taken
    pub fn declare(
        &mut self,
        name: &str,
        static_type: StaticType,
        storage: StorageClass,
        read_only: bool,
    ) -> bool {
        if self.symbols.contains_key(name) {
            return false;
        }

        let mut symbol = Symbol::new(name, static_type, storage);
        symbol.read_only = read_only;
        self.symbols.insert(name.to_string(), symbol);
        true
    }

    /// Look up a variable that is about to be written
    pub fn get_for_write(&mut self, name: &str, span: &Span) -> Result<&mut Symbol, CompileError> {
        let symbol = self
            .symbols
            .get_mut(name)
            .ok_or_else(|| CompileError::undeclared_variable(name, "mutate", span))?;
        symbol.mutation_count += 1;
        Ok(symbol)
    }

    /// Look up a variable that is about to be read
    pub fn get_for_read(&self, name: &str, span: &Span) -> Result<&Symbol, CompileError> {
        self.symbols
            .get(name)
            .ok_or_else(|| CompileError::undeclared_variable(name, "read", span))
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols.get_mut(name)
    }

    pub fn mark_initialized(&mut self, name: &str) {
        if let Some(symbol) = self.symbols.get_mut(name) {
            symbol.initialized = true;
        }
    }

    pub fn set_must_init_null(&mut self, name: &str) {
        if let Some(symbol) = self.symbols.get_mut(name) {
            symbol.must_init_to_null = true;
        }
    }

    /// Allocate a fresh temporary; names are never reused
    ///
    /// Candidates already taken by a declared variable are skipped.
    pub fn new_temporary(&mut self, static_type: StaticType) -> Symbol {
        let name = loop {
            let candidate = format!("{}{}", self.temp_prefix, self.next_temp);
            self.next_temp += 1;
            if !self.symbols.contains_key(&candidate) {
                break candidate;
            }
        };

        let storage = if static_type == StaticType::Dynamic {
            StorageClass::HeapBoxed
        } else {
            StorageClass::StackOnly
        };

        let mut symbol = Symbol::new(name.as_str(), static_type, storage);
        symbol.initialized = true;
        symbol.temporary = true;
        symbol.must_init_to_null = static_type == StaticType::Dynamic;
        symbol.mutation_count = 1;

        debug!(temporary = %name, ty = %static_type, "allocated temporary");
        self.symbols.insert(name, symbol.clone());
        symbol
    }

    /// Boxed writes need room in the frame's tracked-values stack
    pub fn mark_stack_growth_required(&mut self) {
        self.must_grow_stack = true;
    }

    pub fn must_grow_stack(&self) -> bool {
        self.must_grow_stack
    }

    /// All symbols in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn temporaries(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values().filter(|s| s.temporary)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
