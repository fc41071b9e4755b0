//! Assignment lowering for a boxed-value native code compiler
//!
//! Lowers `let` assignments (`dest OP expr`, array and property writes,
//! increment/decrement) to target-runtime instructions that manipulate either
//! raw native scalars or reference-counted, copy-on-write boxed values.
//!
//! # Example
//!
//! ```
//! use letlower::ast::{AssignTarget, Assignment, AssignmentOperator, Expression};
//! use letlower::{CompilationContext, StaticType, StorageClass};
//!
//! let mut ctx = CompilationContext::new();
//! ctx.symbol_table.declare("v", StaticType::Dynamic, StorageClass::HeapBoxed, false);
//!
//! let assignment = Assignment::new(
//!     AssignTarget::ArrayIndex { index: Expression::int(3) },
//!     "v",
//!     AssignmentOperator::Assign,
//!     Some(Expression::int(5)),
//! );
//! ctx.lower_assignment(&assignment).unwrap();
//!
//! assert_eq!(
//!     ctx.lines(),
//!     ["ZVAL_LONG(_0, 5);", "zephir_array_update_long(&v, 3, &_0, PH_COPY | PH_SEPARATE);"]
//! );
//! ```

pub mod ast;
pub mod compiler;
pub mod error;
pub mod types;

pub use compiler::ClassDefinition;
pub use compiler::CompilationContext;
pub use compiler::CompilationUnit;
pub use compiler::CompiledUnit;
pub use compiler::CompilerOptions;
pub use compiler::ResolvedExpression;
pub use compiler::StorageClass;
pub use compiler::Symbol;
pub use compiler::SymbolTable;
pub use error::CompileError;
pub use error::SourceLocation;
pub use types::StaticType;
pub use types::TypeFamily;
