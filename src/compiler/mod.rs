//! Assignment lowering for let statements
//!
//! This module lowers `let` assignments to target-runtime instructions that
//! operate on native scalars or on reference-counted, copy-on-write boxed
//! values. The work is split the same way the statement is:
//!
//! - `compile_expr` resolves the right-hand side to a [`ResolvedExpression`]
//! - `assign_variable` holds the decision table for plain variable targets
//! - `assign_structured` lowers array and property targets
//! - `incr_decr` lowers `x++` / `x--`
//! - `let_stmt` is the entry point tying them together

mod assign_structured;
mod assign_variable;
mod compile_expr;
mod headers;
mod incr_decr;
mod let_stmt;
mod printer;
mod read_detector;
mod symbol_table;
mod unit;

pub use assign_variable::{BoxKind, Lowering, NativeCast, SourceShape, lowering_rule};
pub use compile_expr::{ResolvedExpression, concrete_subtype_of};
pub use headers::HeadersManager;
pub use printer::CodePrinter;
pub use read_detector::references;
pub use symbol_table::{StorageClass, Symbol, SymbolTable};
pub use unit::{CompilationUnit, CompiledUnit, SymbolDeclaration};

use serde::Deserialize;
use tracing::debug;

/// Tunables for the emitted code
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompilerOptions {
    /// Prefix of runtime kernel functions and macros
    pub kernel_prefix: String,
    /// Prefix of compiler-generated temporaries
    pub temp_prefix: String,
    /// Indentation emitted per nesting level
    pub indent: String,
    /// Nesting level of the emitted lines, e.g. 1 inside a function body
    pub indent_level: usize,
    /// Name of the implicit receiver in source code
    pub implicit_receiver: String,
    /// Name the implicit receiver has in emitted code
    pub receiver_symbol: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            kernel_prefix: "zephir".to_string(),
            temp_prefix: "_".to_string(),
            indent: "\t".to_string(),
            indent_level: 0,
            implicit_receiver: "this".to_string(),
            receiver_symbol: "this_ptr".to_string(),
        }
    }
}

impl CompilerOptions {
    /// Runtime function name, e.g. `zephir_array_append`
    pub fn kernel(&self, name: &str) -> String {
        format!("{}_{}", self.kernel_prefix, name)
    }

    /// Runtime macro name, e.g. `ZEPHIR_CPY_WRT`
    pub fn kernel_macro(&self, name: &str) -> String {
        format!("{}_{}", self.kernel_prefix.to_uppercase(), name)
    }
}

/// The class whose method is being compiled
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClassDefinition {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<String>,
}

impl ClassDefinition {
    pub fn new(name: impl Into<String>, properties: &[&str]) -> Self {
        Self {
            name: name.into(),
            properties: properties.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p == name)
    }
}

/// Marker for rolling back a failed assignment
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    lines: usize,
    headers: usize,
}

/// Compiler state shared by every assignment of one function body
pub struct CompilationContext {
    pub symbol_table: SymbolTable,
    pub code_printer: CodePrinter,
    pub headers: HeadersManager,
    pub class_definition: Option<ClassDefinition>,
    pub options: CompilerOptions,
}

impl CompilationContext {
    /// Create a context with default options
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            symbol_table: SymbolTable::with_temp_prefix(&options.temp_prefix),
            code_printer: CodePrinter::with_indent(&options.indent, options.indent_level),
            headers: HeadersManager::new(),
            class_definition: None,
            options,
        }
    }

    /// Compile inside a method of `class`; declares the implicit receiver
    pub fn with_class(mut self, class: ClassDefinition) -> Self {
        let receiver = self.options.implicit_receiver.clone();
        self.symbol_table
            .declare(&receiver, crate::types::StaticType::Dynamic, StorageClass::HeapBoxed, false);
        self.symbol_table.mark_initialized(&receiver);
        self.class_definition = Some(class);
        self
    }

    /// Emitted lines so far
    pub fn lines(&self) -> &[String] {
        self.code_printer.lines()
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            lines: self.code_printer.len(),
            headers: self.headers.len(),
        }
    }

    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.code_printer.truncate(checkpoint.lines);
        self.headers.truncate(checkpoint.headers);
    }

    /// Name a variable has in emitted code
    pub(crate) fn render_name(&self, name: &str) -> String {
        if name == self.options.implicit_receiver {
            self.options.receiver_symbol.clone()
        } else {
            name.to_string()
        }
    }

    pub(crate) fn is_implicit_receiver(&self, name: &str) -> bool {
        name == self.options.implicit_receiver
    }

    /// Reinitialize a boxed variable before it is rebuilt
    ///
    /// Heap-boxed variables are initialized the first time and re-initialized
    /// afterwards. Stack-only boxes live in the frame and need neither.
    pub(crate) fn init_variant(&mut self, name: &str) {
        let Some(symbol) = self.symbol_table.get_mut(name) else {
            return;
        };
        if symbol.is_local_only() {
            return;
        }

        symbol.must_init_to_null = true;
        let first = symbol.variant_inits == 0;
        symbol.variant_inits += 1;
        self.symbol_table.mark_stack_growth_required();

        let macro_name = if first { "INIT_VAR" } else { "INIT_NVAR" };
        let line = format!(
            "{}({});",
            self.options.kernel_macro(macro_name),
            self.render_name(name)
        );
        self.code_printer.output(line);
    }

    /// Make a shared box uniquely owned before it is mutated in place
    pub(crate) fn separate(&mut self, name: &str) {
        debug!(variable = name, "separating shared box before in-place mutation");
        let line = format!(
            "{}({});",
            self.options.kernel_macro("SEPARATE"),
            self.render_name(name)
        );
        self.code_printer.output(line);
    }
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self::new()
    }
}
