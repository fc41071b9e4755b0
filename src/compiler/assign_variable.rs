//! Plain variable targets
//!
//! Lowering a `dest OP expr` assignment is a two-step affair. [`lowering_rule`]
//! looks the (destination family, source shape, operator) triple up in the
//! decision table and picks a [`Lowering`] strategy; emission then renders
//! that strategy. A triple without a rule is an unsupported operator.

use super::CompilationContext;
use super::compile_expr::{ResolvedExpression, concrete_subtype_of};
use super::headers;
use super::read_detector::references;
use super::symbol_table::{Symbol, SymbolTable};
use crate::ast::{AssignmentOperator, Expression, Span};
use crate::error::CompileError;
use crate::types::{StaticType, TypeFamily};
use tracing::{debug, trace};

/// What the source looks like to the decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
    /// A computed or literal value of a non-boxed type
    Value(StaticType),
    /// A boxed value; carries the runtime subtype re-read from the variable
    /// it names, or `dynamic` for boxed results of runtime calls
    Binding(StaticType),
}

impl SourceShape {
    /// Shape of a resolved expression
    pub fn of(
        resolved: &ResolvedExpression,
        symbol_table: &SymbolTable,
        span: &Span,
    ) -> Result<Self, CompileError> {
        if resolved.static_type() != StaticType::Dynamic {
            return Ok(SourceShape::Value(resolved.static_type()));
        }

        let subtype = concrete_subtype_of(resolved, symbol_table, span)?;
        if subtype.is_pseudo() {
            return Err(CompileError::unknown_source(subtype, span));
        }
        Ok(SourceShape::Binding(subtype))
    }

    /// The type the source actually carries
    pub fn ty(self) -> StaticType {
        match self {
            SourceShape::Value(ty) | SourceShape::Binding(ty) => ty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeCast {
    Long,
    Double,
}

impl NativeCast {
    fn as_str(self) -> &'static str {
        match self {
            NativeCast::Long => "(long)",
            NativeCast::Double => "(double)",
        }
    }
}

/// Box constructor family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxKind {
    Long,
    Double,
    Bool,
}

impl BoxKind {
    fn constructor(self) -> &'static str {
        match self {
            BoxKind::Long => "ZVAL_LONG",
            BoxKind::Double => "ZVAL_DOUBLE",
            BoxKind::Bool => "ZVAL_BOOL",
        }
    }
}

/// Emission strategy picked by the decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lowering {
    /// `x OP 0;`
    NativeZero,
    /// `x OP c;`
    NativeDirect,
    /// `x OP (long) (c);`
    NativeCast(NativeCast),
    /// `x OP b;` over the boolean rendering
    NativeBoolean,
    /// `x OP (c) ? 1 : 0;`
    BoolTernary,
    /// Generic numeric coercion of a boxed value
    NumberCoerce,
    /// Generic boolean coercion of a boxed value
    BoolCoerce,
    /// String primitive over literal bytes
    StringLiteral,
    /// String primitive over another string's buffer
    StringBuffer,
    StringChar,
    StringLong,
    /// Boxed value coerced to long, then appended as a string
    StringCoerceLong,
    BoxNull,
    /// Box a computed native value; subject to the hazard check
    BoxValue(BoxKind),
    /// Box a native variable
    BoxBinding(BoxKind),
    BoxString,
    BoxStringBuffer,
    BoxEmptyArray,
    /// Reference-counted copy between two boxes
    BoxCopy,
    /// In-place boxed arithmetic
    BoxArithmetic,
}

/// Decision table for plain variable targets
///
/// Returns `None` for every triple the target runtime has no lowering for.
pub fn lowering_rule(
    family: TypeFamily,
    shape: SourceShape,
    operator: AssignmentOperator,
) -> Option<Lowering> {
    use AssignmentOperator as Op;
    use SourceShape::{Binding, Value};

    let arithmetic = matches!(
        operator,
        Op::Assign | Op::AddAssign | Op::SubAssign | Op::MulAssign
    );
    let assign_or_add = matches!(operator, Op::Assign | Op::AddAssign);

    match family {
        TypeFamily::Integer => {
            if !arithmetic {
                return None;
            }
            match shape {
                Value(StaticType::Null) => Some(Lowering::NativeZero),
                Value(ty) if ty.is_integral() => Some(Lowering::NativeDirect),
                Value(StaticType::Double) => Some(Lowering::NativeCast(NativeCast::Long)),
                Value(StaticType::Bool) if assign_or_add => Some(Lowering::NativeBoolean),
                Binding(ty) if ty.is_integral() || ty == StaticType::Bool => {
                    Some(Lowering::NativeDirect)
                }
                Binding(StaticType::Double) => Some(Lowering::NativeCast(NativeCast::Long)),
                Binding(StaticType::Dynamic) => Some(Lowering::NumberCoerce),
                _ => None,
            }
        }

        TypeFamily::Double => {
            if !arithmetic {
                return None;
            }
            match shape {
                Value(StaticType::Null) => Some(Lowering::NativeZero),
                Value(ty) if ty.is_integral() => Some(Lowering::NativeCast(NativeCast::Double)),
                Value(StaticType::Double) => Some(Lowering::NativeDirect),
                Value(StaticType::Bool) => Some(Lowering::NativeBoolean),
                Binding(ty) if ty.is_integral() || ty == StaticType::Bool => {
                    Some(Lowering::NativeCast(NativeCast::Double))
                }
                Binding(StaticType::Double) => Some(Lowering::NativeDirect),
                Binding(StaticType::Dynamic) => Some(Lowering::NumberCoerce),
                _ => None,
            }
        }

        TypeFamily::Bool => match shape {
            Value(StaticType::Null) if operator == Op::Assign => Some(Lowering::NativeZero),
            Value(ty) | Binding(ty)
                if assign_or_add && (ty.is_integral() || ty == StaticType::Double) =>
            {
                Some(Lowering::BoolTernary)
            }
            Value(StaticType::Bool) if assign_or_add => Some(Lowering::NativeBoolean),
            Binding(StaticType::Bool) if assign_or_add => Some(Lowering::NativeDirect),
            Binding(StaticType::Dynamic) if operator == Op::Assign => Some(Lowering::BoolCoerce),
            _ => None,
        },

        TypeFamily::String => {
            if !matches!(operator, Op::Assign | Op::ConcatAssign) {
                return None;
            }
            match shape {
                Value(StaticType::Null) | Value(StaticType::String) => Some(Lowering::StringLiteral),
                Value(ty) | Binding(ty) if ty.is_char() => Some(Lowering::StringChar),
                Value(ty) | Binding(ty) if ty.is_integer() => Some(Lowering::StringLong),
                Binding(StaticType::String) => Some(Lowering::StringBuffer),
                Binding(StaticType::Dynamic) => Some(Lowering::StringCoerceLong),
                _ => None,
            }
        }

        TypeFamily::Dynamic => match (shape, operator) {
            (Binding(StaticType::Dynamic), Op::Assign) => Some(Lowering::BoxCopy),
            (Binding(StaticType::Dynamic), Op::AddAssign | Op::SubAssign) => {
                Some(Lowering::BoxArithmetic)
            }
            (_, Op::Assign) => match shape {
                Value(StaticType::Null) => Some(Lowering::BoxNull),
                Value(StaticType::String) => Some(Lowering::BoxString),
                Value(StaticType::EmptyArray) => Some(Lowering::BoxEmptyArray),
                Value(ty) => box_kind(ty).map(Lowering::BoxValue),
                Binding(StaticType::String) => Some(Lowering::BoxStringBuffer),
                Binding(ty) => box_kind(ty).map(Lowering::BoxBinding),
            },
            _ => None,
        },
    }
}

fn box_kind(ty: StaticType) -> Option<BoxKind> {
    match ty {
        ty if ty.is_integral() => Some(BoxKind::Long),
        StaticType::Double => Some(BoxKind::Double),
        StaticType::Bool => Some(BoxKind::Bool),
        _ => None,
    }
}

/// Constructor line parts that build a box from a value
///
/// Returns the constructor and the arguments following the box operand, or
/// `None` when the value has no boxed form. Boxed sources have none: they
/// already are one.
pub(crate) fn box_constructor(
    shape: SourceShape,
    resolved: &ResolvedExpression,
) -> Option<(&'static str, String)> {
    let code = resolved.code();
    match shape {
        SourceShape::Value(StaticType::Null) => Some(("ZVAL_NULL", String::new())),
        SourceShape::Value(StaticType::String) => {
            Some(("ZVAL_STRING", format!(", \"{}\", 1", code)))
        }
        SourceShape::Value(StaticType::EmptyArray) => Some(("array_init", String::new())),
        SourceShape::Binding(StaticType::String) => {
            Some(("ZVAL_STRINGL", format!(", {}->str, {}->len, 1", code, code)))
        }
        SourceShape::Value(ty) | SourceShape::Binding(ty) => {
            let kind = box_kind(ty)?;
            let value = if kind == BoxKind::Bool {
                resolved.boolean_code()
            } else {
                code
            };
            Some((kind.constructor(), format!(", {}", value)))
        }
    }
}

impl CompilationContext {
    /// Lower `destination OP source` for a plain variable target
    ///
    /// `source_ast` is the expression `resolved` was compiled from; boxing a
    /// computed value checks it for reads of the destination.
    pub fn lower_variable_assign(
        &mut self,
        destination: &Symbol,
        operator: AssignmentOperator,
        resolved: &ResolvedExpression,
        source_ast: Option<&Expression>,
        span: &Span,
    ) -> Result<(), CompileError> {
        if destination.read_only {
            return Err(CompileError::read_only(&destination.name, span));
        }
        let family = destination.static_type.family().ok_or_else(|| {
            CompileError::unknown_destination(&destination.name, destination.static_type, span)
        })?;

        let shape = SourceShape::of(resolved, &self.symbol_table, span)?;
        let lowering = lowering_rule(family, shape, operator).ok_or_else(|| {
            CompileError::unsupported_operator(operator, destination.static_type, shape.ty(), span)
        })?;

        trace!(
            variable = %destination.name,
            destination = %destination.static_type,
            source = ?shape,
            %operator,
            ?lowering,
            "variable assignment"
        );

        let target = self.render_name(&destination.name);
        let token = operator.native_token();
        let native = |rhs: String| -> Result<String, CompileError> {
            let token = token.ok_or_else(|| {
                CompileError::unsupported_operator(operator, destination.static_type, shape.ty(), span)
            })?;
            Ok(format!("{} {} {};", target, token, rhs))
        };

        match lowering {
            Lowering::NativeZero => {
                let zero = if family == TypeFamily::Double { "0.0" } else { "0" };
                let line = native(zero.to_string())?;
                self.code_printer.output(line);
            }

            Lowering::NativeDirect => {
                let line = native(resolved.code().to_string())?;
                self.code_printer.output(line);
            }

            Lowering::NativeCast(cast) => {
                let rhs = match shape {
                    SourceShape::Value(_) => format!("{} ({})", cast.as_str(), resolved.code()),
                    SourceShape::Binding(_) => format!("{} {}", cast.as_str(), resolved.code()),
                };
                let line = native(rhs)?;
                self.code_printer.output(line);
            }

            Lowering::NativeBoolean => {
                let line = native(resolved.boolean_code().to_string())?;
                self.code_printer.output(line);
            }

            Lowering::BoolTernary => {
                let line = native(format!("({}) ? 1 : 0", resolved.code()))?;
                self.code_printer.output(line);
            }

            Lowering::NumberCoerce | Lowering::BoolCoerce => {
                self.headers.add(headers::OPERATORS);
                let function = if lowering == Lowering::NumberCoerce {
                    "get_numberval"
                } else {
                    "get_boolval"
                };
                let line = native(format!("{}({})", self.options.kernel(function), resolved.code()))?;
                self.code_printer.output(line);
            }

            Lowering::StringLiteral
            | Lowering::StringBuffer
            | Lowering::StringChar
            | Lowering::StringLong
            | Lowering::StringCoerceLong => {
                self.lower_string_assign(destination, &target, operator, lowering, resolved);
            }

            Lowering::BoxValue(kind) => {
                self.lower_box_value(destination, &target, kind, shape, resolved, source_ast)?;
            }

            Lowering::BoxNull
            | Lowering::BoxBinding(_)
            | Lowering::BoxString
            | Lowering::BoxStringBuffer
            | Lowering::BoxEmptyArray => {
                let (constructor, args) = box_constructor(shape, resolved).ok_or_else(|| {
                    CompileError::unsupported_source(shape.ty(), "stored in a boxed variable", span)
                })?;
                self.init_variant(&destination.name);
                let operand = box_operand(destination, &target);
                self.code_printer
                    .output(format!("{}({}{});", constructor, operand, args));
            }

            Lowering::BoxCopy => {
                if resolved.referenced_variable() == Some(destination.name.as_str()) {
                    debug!(variable = %destination.name, "self-assignment elided");
                    return Ok(());
                }
                self.symbol_table.set_must_init_null(&destination.name);
                self.symbol_table.mark_stack_growth_required();
                let line = format!(
                    "{}({}, {});",
                    self.options.kernel_macro("CPY_WRT"),
                    target,
                    resolved.code()
                );
                self.code_printer.output(line);
            }

            Lowering::BoxArithmetic => {
                self.headers.add(headers::OPERATORS);
                self.symbol_table.mark_stack_growth_required();
                let name = if operator == AssignmentOperator::AddAssign {
                    "ADD_ASSIGN"
                } else {
                    "SUB_ASSIGN"
                };
                let line = format!(
                    "{}({}, {});",
                    self.options.kernel_macro(name),
                    target,
                    resolved.code()
                );
                self.code_printer.output(line);
            }
        }

        Ok(())
    }

    fn lower_string_assign(
        &mut self,
        destination: &Symbol,
        target: &str,
        operator: AssignmentOperator,
        lowering: Lowering,
        resolved: &ResolvedExpression,
    ) {
        self.symbol_table.set_must_init_null(&destination.name);
        self.headers.add(headers::STRING);

        let base = if operator == AssignmentOperator::ConcatAssign {
            "str_append"
        } else {
            "str_assign"
        };
        let code = resolved.code();

        let line = match lowering {
            Lowering::StringChar => {
                format!("{}({}, {});", self.options.kernel(&format!("{}_char", base)), target, code)
            }
            Lowering::StringLong => {
                format!("{}({}, {});", self.options.kernel(&format!("{}_long", base)), target, code)
            }
            Lowering::StringCoerceLong => {
                self.headers.add(headers::OPERATORS);
                format!(
                    "{}({}, {}({}));",
                    self.options.kernel(&format!("{}_long", base)),
                    target,
                    self.options.kernel("get_intval"),
                    code
                )
            }
            Lowering::StringBuffer => format!(
                "{}({}, {}->str, {}->len);",
                self.options.kernel(base),
                target,
                code,
                code
            ),
            _ => {
                let literal = if resolved.static_type() == StaticType::Null {
                    ""
                } else {
                    code
                };
                format!(
                    "{}({}, \"{}\", sizeof(\"{}\")-1);",
                    self.options.kernel(base),
                    target,
                    literal,
                    literal
                )
            }
        };
        self.code_printer.output(line);
    }

    /// Box a computed native value into `destination`
    ///
    /// Reinitializing the box discards its old value, so a source that reads
    /// the destination is evaluated into a native temporary first.
    fn lower_box_value(
        &mut self,
        destination: &Symbol,
        target: &str,
        kind: BoxKind,
        shape: SourceShape,
        resolved: &ResolvedExpression,
        source_ast: Option<&Expression>,
    ) -> Result<(), CompileError> {
        let operand = box_operand(destination, target);
        let hazard = resolved.literal_bool().is_none()
            && source_ast.is_some_and(|ast| references(&destination.name, ast));

        if hazard {
            let value = if kind == BoxKind::Bool {
                resolved.boolean_code()
            } else {
                resolved.code()
            };
            let temp = self.symbol_table.new_temporary(shape.ty());
            debug!(
                variable = %destination.name,
                temporary = %temp.name,
                "source reads destination, evaluating into temporary"
            );
            self.code_printer.output(format!("{} = {};", temp.name, value));
            self.init_variant(&destination.name);
            self.code_printer
                .output(format!("{}({}, {});", kind.constructor(), operand, temp.name));
            return Ok(());
        }

        let (constructor, args) = box_constructor(shape, resolved).unwrap_or_else(|| {
            (kind.constructor(), format!(", {}", resolved.code()))
        });
        self.init_variant(&destination.name);
        self.code_printer
            .output(format!("{}({}{});", constructor, operand, args));
        Ok(())
    }
}

/// Box operand of a destination: stack-only boxes are passed by reference
fn box_operand(destination: &Symbol, target: &str) -> String {
    if destination.is_local_only() {
        format!("&{}", target)
    } else {
        target.to_string()
    }
}
