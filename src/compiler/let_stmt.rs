//! Let statement entry point

use super::CompilationContext;
use crate::ast::{AssignTarget, Assignment, LetStatement};
use crate::error::CompileError;
use tracing::trace;

impl CompilationContext {
    /// Compile every assignment of a let statement in order
    ///
    /// Stops at the first failing assignment. Assignments before it stay
    /// emitted; nothing of the failing one does.
    pub fn compile_let_statement(&mut self, statement: &LetStatement) -> Result<(), CompileError> {
        for assignment in &statement.assignments {
            self.lower_assignment(assignment)?;
        }
        Ok(())
    }

    /// Lower one assignment; on error, everything it emitted is discarded
    ///
    /// Temporaries allocated before the failure stay reserved.
    pub fn lower_assignment(&mut self, assignment: &Assignment) -> Result<(), CompileError> {
        let checkpoint = self.checkpoint();
        let result = self.dispatch_assignment(assignment);
        if result.is_err() {
            self.rollback(checkpoint);
        }
        result
    }

    fn dispatch_assignment(&mut self, assignment: &Assignment) -> Result<(), CompileError> {
        let span = &assignment.span;
        let operator = assignment.operator;
        let destination = self
            .symbol_table
            .get_for_write(&assignment.variable, span)?
            .clone();

        if destination.read_only {
            return Err(CompileError::read_only(&destination.name, span));
        }
        // The receiver itself is never rebound; only its properties are written
        if self.is_implicit_receiver(&destination.name) && !assignment.target.is_property() {
            return Err(CompileError::read_only(&destination.name, span));
        }
        if destination.static_type.is_pseudo() {
            return Err(CompileError::unknown_destination(
                &destination.name,
                destination.static_type,
                span,
            ));
        }

        trace!(
            variable = %destination.name,
            target = %assignment.target.kind(),
            %operator,
            "lowering assignment"
        );

        if operator.is_unary() {
            if assignment.target != AssignTarget::Variable {
                return Err(CompileError::unsupported_operator(
                    operator,
                    destination.static_type,
                    assignment.target.kind(),
                    span,
                ));
            }
            self.symbol_table.mark_initialized(&destination.name);
            return self.lower_increment(&destination, operator, span);
        }

        let expr = assignment.expr.as_ref().ok_or_else(|| {
            CompileError::invalid_expression(
                format!("assignment to '{}' has no value", destination.name),
                span,
            )
        })?;
        let resolved = self.compile_expression(expr, span)?;
        self.symbol_table.mark_initialized(&destination.name);

        match &assignment.target {
            AssignTarget::Variable => {
                self.lower_variable_assign(&destination, operator, &resolved, Some(expr), span)
            }
            AssignTarget::VariableAppend => {
                self.lower_variable_append(&destination, operator, &resolved, span)
            }
            AssignTarget::ArrayIndex { index } => {
                self.lower_array_index(&destination, operator, index, &resolved, span)
            }
            AssignTarget::ObjectProperty { property } => {
                self.lower_object_property(&destination, operator, property, &resolved, span)
            }
            AssignTarget::PropertyAppend { property } => {
                self.lower_property_append(&destination, operator, property, &resolved, span)
            }
            AssignTarget::PropertyArrayIndex { property, index } => self
                .lower_property_array_index(
                    &destination,
                    operator,
                    property,
                    index,
                    &resolved,
                    span,
                ),
        }
    }
}
