//! Compilation units: a function body handed over as one JSON document

use super::symbol_table::StorageClass;
use super::{ClassDefinition, CompilationContext, CompilerOptions};
use crate::ast::LetStatement;
use crate::error::CompileError;
use crate::types::StaticType;
use serde::Deserialize;
use tracing::warn;

/// A declared local variable
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SymbolDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub static_type: StaticType,
    /// Defaults to heap-boxed for `dynamic` and stack-only otherwise
    #[serde(default)]
    pub storage: Option<StorageClass>,
    #[serde(default)]
    pub read_only: bool,
}

impl SymbolDeclaration {
    pub fn storage_class(&self) -> StorageClass {
        match self.storage {
            Some(storage) => storage,
            None if self.static_type == StaticType::Dynamic => StorageClass::HeapBoxed,
            None => StorageClass::StackOnly,
        }
    }
}

/// Options, enclosing class, declarations and the statements to lower
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompilationUnit {
    pub options: CompilerOptions,
    pub class: Option<ClassDefinition>,
    pub symbols: Vec<SymbolDeclaration>,
    pub statements: Vec<LetStatement>,
}

/// Output of a compiled unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledUnit {
    /// Runtime headers in first-use order
    pub headers: Vec<String>,
    pub lines: Vec<String>,
}

impl CompilationUnit {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Declare every symbol and lower every statement in order
    pub fn compile(&self) -> Result<CompiledUnit, CompileError> {
        let mut ctx = CompilationContext::with_options(self.options.clone());
        if let Some(class) = &self.class {
            ctx = ctx.with_class(class.clone());
        }

        for decl in &self.symbols {
            let declared = ctx.symbol_table.declare(
                &decl.name,
                decl.static_type,
                decl.storage_class(),
                decl.read_only,
            );
            if !declared {
                warn!(variable = %decl.name, "duplicate declaration ignored");
            }
        }

        for statement in &self.statements {
            ctx.compile_let_statement(statement)?;
        }

        let headers = ctx.headers.iter().map(str::to_string).collect();
        Ok(CompiledUnit {
            headers,
            lines: ctx.code_printer.into_lines(),
        })
    }
}
