//! `x++` and `x--`

use super::CompilationContext;
use super::headers;
use super::symbol_table::Symbol;
use crate::ast::{AssignmentOperator, Span};
use crate::error::CompileError;
use crate::types::TypeFamily;
use tracing::trace;

impl CompilationContext {
    /// Lower an increment or decrement of a plain variable
    pub fn lower_increment(
        &mut self,
        destination: &Symbol,
        operator: AssignmentOperator,
        span: &Span,
    ) -> Result<(), CompileError> {
        if destination.read_only {
            return Err(CompileError::read_only(&destination.name, span));
        }

        let (suffix, function) = match operator {
            AssignmentOperator::Increment => ("++", "increment"),
            AssignmentOperator::Decrement => ("--", "decrement"),
            _ => {
                return Err(CompileError::unsupported_operator(
                    operator,
                    destination.static_type,
                    "none",
                    span,
                ));
            }
        };

        trace!(variable = %destination.name, ty = %destination.static_type, %operator, "increment");
        let target = self.render_name(&destination.name);

        match destination.static_type.family() {
            Some(TypeFamily::Integer | TypeFamily::Double) => {
                self.code_printer.output(format!("{}{};", target, suffix));
            }

            Some(TypeFamily::Dynamic) => {
                self.headers.add(headers::OPERATORS);
                let function = self.options.kernel(function);
                if destination.is_local_only() {
                    self.code_printer.output(format!("{}(&{});", function, target));
                } else {
                    self.separate(&destination.name);
                    self.code_printer.output(format!("{}({});", function, target));
                }
            }

            Some(TypeFamily::Bool | TypeFamily::String) => {
                return Err(CompileError::unsupported_operator(
                    operator,
                    destination.static_type,
                    "none",
                    span,
                ));
            }

            None => {
                return Err(CompileError::unknown_destination(
                    &destination.name,
                    destination.static_type,
                    span,
                ));
            }
        }

        Ok(())
    }
}
