//! Array and property targets
//!
//! `v[] = x`, `v[i] = x`, `o.p = x`, `o.p[] = x` and `o.p[i] = x` all write
//! into a heap box. Values are materialized into boxed temporaries first;
//! boxed sources are passed through as they are.

use super::CompilationContext;
use super::assign_variable::{SourceShape, box_constructor};
use super::compile_expr::{ResolvedExpression, add_slashes};
use super::headers;
use super::symbol_table::Symbol;
use crate::ast::{AssignTargetKind, AssignmentOperator, Expression, Span};
use crate::error::CompileError;
use crate::types::StaticType;
use tracing::trace;

const UPDATE_FLAGS: &str = "PH_COPY | PH_SEPARATE";

/// Key of an array update or fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ArrayKey {
    /// Integer key
    Long(String),
    /// String literal key
    StringLiteral(String),
    /// Key held in a native string variable
    StringBuffer(String),
    /// Boxed key of any runtime type
    Zval(String),
}

impl ArrayKey {
    /// Key arguments as passed to the runtime
    pub(crate) fn render(&self) -> String {
        match self {
            ArrayKey::Long(code) | ArrayKey::Zval(code) => code.clone(),
            ArrayKey::StringLiteral(code) => format!("SL(\"{}\")", code),
            ArrayKey::StringBuffer(name) => format!("{}->str, {}->len", name, name),
        }
    }

    fn update_function(&self) -> &'static str {
        match self {
            ArrayKey::Long(_) => "array_update_long",
            ArrayKey::StringLiteral(_) | ArrayKey::StringBuffer(_) => "array_update_string",
            ArrayKey::Zval(_) => "array_update_zval",
        }
    }
}

impl CompilationContext {
    /// Classify a resolved index; `None` if it cannot key an array
    pub(crate) fn array_key(
        &self,
        index: &ResolvedExpression,
        span: &Span,
    ) -> Result<Option<ArrayKey>, CompileError> {
        let code = index.code().to_string();
        let key = match SourceShape::of(index, &self.symbol_table, span)? {
            SourceShape::Value(ty) | SourceShape::Binding(ty) if ty.is_integer() => {
                Some(ArrayKey::Long(code))
            }
            SourceShape::Value(StaticType::String) => Some(ArrayKey::StringLiteral(code)),
            SourceShape::Binding(StaticType::String) => Some(ArrayKey::StringBuffer(code)),
            SourceShape::Binding(StaticType::Dynamic) => Some(ArrayKey::Zval(code)),
            _ => None,
        };
        Ok(key)
    }

    /// Make `resolved` available as a box and return the box's name
    ///
    /// Boxed sources are returned as they are. Anything else is constructed
    /// into a fresh boxed temporary.
    pub(crate) fn materialize_boxed(
        &mut self,
        resolved: &ResolvedExpression,
        span: &Span,
    ) -> Result<String, CompileError> {
        let shape = SourceShape::of(resolved, &self.symbol_table, span)?;
        if shape == SourceShape::Binding(StaticType::Dynamic) {
            return Ok(resolved.code().to_string());
        }

        let (constructor, args) = box_constructor(shape, resolved).ok_or_else(|| {
            CompileError::unsupported_source(shape.ty(), "stored in a boxed value", span)
        })?;
        let temp = self.symbol_table.new_temporary(StaticType::Dynamic);
        self.code_printer
            .output(format!("{}({}{});", constructor, temp.name, args));
        Ok(temp.name)
    }

    /// `v[] = x`
    pub fn lower_variable_append(
        &mut self,
        destination: &Symbol,
        operator: AssignmentOperator,
        resolved: &ResolvedExpression,
        span: &Span,
    ) -> Result<(), CompileError> {
        self.check_structured_destination(
            destination,
            AssignTargetKind::VariableAppend,
            operator,
            resolved,
            span,
        )?;

        let value = self.materialize_boxed(resolved, span)?;
        self.headers.add(headers::ARRAY);
        let line = format!(
            "{}(&{}, {}, PH_SEPARATE);",
            self.options.kernel("array_append"),
            self.render_name(&destination.name),
            value
        );
        self.code_printer.output(line);
        Ok(())
    }

    /// `v[i] = x`
    pub fn lower_array_index(
        &mut self,
        destination: &Symbol,
        operator: AssignmentOperator,
        index: &Expression,
        resolved: &ResolvedExpression,
        span: &Span,
    ) -> Result<(), CompileError> {
        self.check_structured_destination(
            destination,
            AssignTargetKind::ArrayIndex,
            operator,
            resolved,
            span,
        )?;

        let index = self.compile_expression(index, span)?;
        let key = self.array_key(&index, span)?.ok_or_else(|| {
            let ty = SourceShape::of(&index, &self.symbol_table, span)
                .map(SourceShape::ty)
                .unwrap_or(index.static_type());
            CompileError::invalid_index(ty, "to update an array", span)
        })?;

        let value = self.materialize_boxed(resolved, span)?;
        self.headers.add(headers::ARRAY);
        let line = format!(
            "{}(&{}, {}, &{}, {});",
            self.options.kernel(key.update_function()),
            self.render_name(&destination.name),
            key.render(),
            value,
            UPDATE_FLAGS
        );
        self.code_printer.output(line);
        Ok(())
    }

    /// `o.p = x`
    pub fn lower_object_property(
        &mut self,
        destination: &Symbol,
        operator: AssignmentOperator,
        property: &str,
        resolved: &ResolvedExpression,
        span: &Span,
    ) -> Result<(), CompileError> {
        self.check_structured_destination(
            destination,
            AssignTargetKind::ObjectProperty,
            operator,
            resolved,
            span,
        )?;
        self.check_declared_property(destination, property, span)?;

        let value = self.materialize_boxed(resolved, span)?;
        self.headers.add(headers::OBJECT);
        let function = if self.is_implicit_receiver(&destination.name) {
            "update_property_this"
        } else {
            "update_property_zval"
        };
        let line = format!(
            "{}({}, SL(\"{}\"), {});",
            self.options.kernel(function),
            self.render_name(&destination.name),
            add_slashes(property),
            value
        );
        self.code_printer.output(line);
        Ok(())
    }

    /// `o.p[] = x`
    pub fn lower_property_append(
        &mut self,
        destination: &Symbol,
        operator: AssignmentOperator,
        property: &str,
        resolved: &ResolvedExpression,
        span: &Span,
    ) -> Result<(), CompileError> {
        self.check_property_receiver(
            destination,
            AssignTargetKind::ObjectPropertyAppend,
            operator,
            resolved,
            span,
        )?;

        let value = self.boxed_source(resolved, "appended to a property", span)?;
        self.headers.add(headers::OBJECT);
        let line = format!(
            "{}({}, SL(\"{}\"), {});",
            self.options.kernel("update_property_array_append"),
            self.render_name(&destination.name),
            add_slashes(property),
            value
        );
        self.code_printer.output(line);
        Ok(())
    }

    /// `o.p[i] = x`
    pub fn lower_property_array_index(
        &mut self,
        destination: &Symbol,
        operator: AssignmentOperator,
        property: &str,
        index: &Expression,
        resolved: &ResolvedExpression,
        span: &Span,
    ) -> Result<(), CompileError> {
        self.check_property_receiver(
            destination,
            AssignTargetKind::ObjectPropertyArrayIndex,
            operator,
            resolved,
            span,
        )?;

        let index = self.compile_expression(index, span)?;
        let key = match SourceShape::of(&index, &self.symbol_table, span)? {
            SourceShape::Binding(StaticType::Dynamic) => index.code().to_string(),
            shape => {
                return Err(CompileError::invalid_index(
                    shape.ty(),
                    "to update a property array",
                    span,
                ));
            }
        };
        let value = self.boxed_source(resolved, "stored in a property array", span)?;

        self.headers.add(headers::OBJECT);
        let line = format!(
            "{}({}, SL(\"{}\"), {}, {});",
            self.options.kernel("update_property_array"),
            self.render_name(&destination.name),
            add_slashes(property),
            key,
            value
        );
        self.code_printer.output(line);
        Ok(())
    }

    /// Only `=` and only heap boxes
    fn check_structured_destination(
        &self,
        destination: &Symbol,
        kind: AssignTargetKind,
        operator: AssignmentOperator,
        resolved: &ResolvedExpression,
        span: &Span,
    ) -> Result<(), CompileError> {
        check_structured_operator(destination, kind, operator, resolved, span)?;
        if destination.static_type != StaticType::Dynamic || destination.is_local_only() {
            return Err(CompileError::local_only(&destination.name, span));
        }
        Ok(())
    }

    /// Only `=` and only boxed receivers; any storage class will do
    fn check_property_receiver(
        &self,
        destination: &Symbol,
        kind: AssignTargetKind,
        operator: AssignmentOperator,
        resolved: &ResolvedExpression,
        span: &Span,
    ) -> Result<(), CompileError> {
        check_structured_operator(destination, kind, operator, resolved, span)?;
        if destination.static_type != StaticType::Dynamic {
            return Err(CompileError::invalid_expression(
                format!(
                    "variable '{}' of type '{}' cannot be used as object",
                    destination.name, destination.static_type
                ),
                span,
            ));
        }
        Ok(())
    }

    /// Properties written through the implicit receiver must be declared
    fn check_declared_property(
        &self,
        destination: &Symbol,
        property: &str,
        span: &Span,
    ) -> Result<(), CompileError> {
        if !self.is_implicit_receiver(&destination.name) {
            return Ok(());
        }
        match &self.class_definition {
            Some(class) if class.has_property(property) => Ok(()),
            Some(class) => Err(CompileError::undeclared_property(property, &class.name, span)),
            None => Err(CompileError::undeclared_property(property, "(none)", span)),
        }
    }

    /// Source that must already be a box of dynamic runtime type
    fn boxed_source(
        &self,
        resolved: &ResolvedExpression,
        context: &str,
        span: &Span,
    ) -> Result<String, CompileError> {
        match SourceShape::of(resolved, &self.symbol_table, span)? {
            SourceShape::Binding(StaticType::Dynamic) => Ok(resolved.code().to_string()),
            shape => Err(CompileError::unsupported_source(shape.ty(), context, span)),
        }
    }
}

fn check_structured_operator(
    destination: &Symbol,
    kind: AssignTargetKind,
    operator: AssignmentOperator,
    resolved: &ResolvedExpression,
    span: &Span,
) -> Result<(), CompileError> {
    trace!(
        variable = %destination.name,
        target = %kind,
        destination = %destination.static_type,
        source = %resolved.static_type(),
        %operator,
        "structured assignment"
    );

    if operator != AssignmentOperator::Assign {
        return Err(CompileError::unsupported_operator(
            operator,
            destination.static_type,
            resolved.static_type(),
            span,
        ));
    }
    Ok(())
}
