//! Expression compilation
//!
//! Resolves right-hand sides to a [`ResolvedExpression`]. Native operations
//! over native operands stay inline; anything touching a boxed value is
//! evaluated through runtime calls into a fresh boxed temporary.

use super::CompilationContext;
use super::assign_structured::ArrayKey;
use super::headers;
use super::symbol_table::SymbolTable;
use crate::ast::{BinaryOp, Expression, Span};
use crate::error::CompileError;
use crate::types::StaticType;

/// Result of compiling an expression
///
/// A bare variable reference always resolves to `dynamic` and remembers the
/// variable it names; [`concrete_subtype_of`] recovers the variable's own
/// type when the lowering needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedExpression {
    static_type: StaticType,
    code: String,
    boolean_code: String,
    variable: Option<String>,
}

impl ResolvedExpression {
    pub fn new(static_type: StaticType, code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            static_type,
            boolean_code: code.clone(),
            code,
            variable: None,
        }
    }

    /// Reference to a declared variable, rendered as `rendered`
    pub fn variable(name: impl Into<String>, rendered: impl Into<String>) -> Self {
        let rendered = rendered.into();
        Self {
            static_type: StaticType::Dynamic,
            boolean_code: rendered.clone(),
            code: rendered,
            variable: Some(name.into()),
        }
    }

    pub fn with_boolean_code(mut self, boolean_code: impl Into<String>) -> Self {
        self.boolean_code = boolean_code.into();
        self
    }

    pub fn static_type(&self) -> StaticType {
        self.static_type
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn boolean_code(&self) -> &str {
        &self.boolean_code
    }

    /// Name of the referenced variable for bare variable references
    pub fn referenced_variable(&self) -> Option<&str> {
        self.variable.as_deref()
    }

    /// `Some` for the `true` / `false` literals
    pub fn literal_bool(&self) -> Option<bool> {
        if self.static_type != StaticType::Bool || self.variable.is_some() {
            return None;
        }
        match self.code.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

/// Runtime subtype of a resolved expression
///
/// Bare variable references report the referenced variable's declared type.
/// Everything else, including boxed results of runtime calls, reports its
/// own static type.
pub fn concrete_subtype_of(
    resolved: &ResolvedExpression,
    symbol_table: &SymbolTable,
    span: &Span,
) -> Result<StaticType, CompileError> {
    match (resolved.static_type, resolved.variable.as_deref()) {
        (StaticType::Dynamic, Some(name)) => Ok(symbol_table.get_for_read(name, span)?.static_type),
        (ty, _) => Ok(ty),
    }
}

impl CompilationContext {
    /// Compile an expression
    pub fn compile_expression(
        &mut self,
        expr: &Expression,
        span: &Span,
    ) -> Result<ResolvedExpression, CompileError> {
        match expr {
            Expression::Null => {
                Ok(ResolvedExpression::new(StaticType::Null, "null").with_boolean_code("0"))
            }

            Expression::Bool { value } => {
                let (code, boolean) = if *value { ("true", "1") } else { ("false", "0") };
                Ok(ResolvedExpression::new(StaticType::Bool, code).with_boolean_code(boolean))
            }

            Expression::Int { value } => {
                Ok(ResolvedExpression::new(StaticType::Int, value.to_string()))
            }

            Expression::Double { value } => {
                if !value.is_finite() {
                    return Err(CompileError::invalid_expression(
                        format!("double literal {} has no native representation", value),
                        span,
                    ));
                }
                Ok(ResolvedExpression::new(StaticType::Double, format!("{:?}", value)))
            }

            Expression::Char { value } => {
                Ok(ResolvedExpression::new(StaticType::Char, render_char(*value)))
            }

            Expression::String { value } => {
                Ok(ResolvedExpression::new(StaticType::String, add_slashes(value)))
            }

            Expression::EmptyArray => Ok(ResolvedExpression::new(StaticType::EmptyArray, "")),

            Expression::Variable { value } => {
                self.symbol_table.get_for_read(value, span)?;
                Ok(ResolvedExpression::variable(value.as_str(), self.render_name(value)))
            }

            Expression::Binary { op, left, right } => self.compile_binary(*op, left, right, span),

            Expression::Not { expr } => {
                let inner = self.compile_expression(expr, span)?;
                let operand = self.boolean_operand(&inner, span)?;
                Ok(ResolvedExpression::new(StaticType::Bool, format!("!({})", operand)))
            }

            Expression::PropertyAccess { object, property } => {
                self.compile_property_access(object, property, span)
            }

            Expression::ArrayAccess { array, index } => {
                self.compile_array_access(array, index, span)
            }

            Expression::Call { name, args } => self.compile_call(name, args, span),
        }
    }

    fn compile_binary(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        span: &Span,
    ) -> Result<ResolvedExpression, CompileError> {
        let left = self.compile_expression(left, span)?;
        let right = self.compile_expression(right, span)?;

        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let l = self.boolean_operand(&left, span)?;
            let r = self.boolean_operand(&right, span)?;
            return Ok(ResolvedExpression::new(
                StaticType::Bool,
                format!("({} {} {})", l, op.symbol(), r),
            ));
        }

        let native_left = self.native_operand(&left, span)?;
        let native_right = self.native_operand(&right, span)?;
        if let (Some((lt, lc)), Some((rt, rc))) = (native_left, native_right) {
            let code = format!("({} {} {})", lc, op.symbol(), rc);
            if op.is_arithmetic() {
                let ty = if lt == StaticType::Double || rt == StaticType::Double {
                    StaticType::Double
                } else {
                    StaticType::Int
                };
                return Ok(ResolvedExpression::new(ty, code));
            }
            if op.is_comparison() {
                return Ok(ResolvedExpression::new(StaticType::Bool, code));
            }
        }

        self.compile_boxed_binary(op, &left, &right, span)
    }

    /// Binary operation where at least one side is boxed
    fn compile_boxed_binary(
        &mut self,
        op: BinaryOp,
        left: &ResolvedExpression,
        right: &ResolvedExpression,
        span: &Span,
    ) -> Result<ResolvedExpression, CompileError> {
        let l = self.materialize_boxed(left, span)?;
        let r = self.materialize_boxed(right, span)?;

        let (function, header) = match op {
            BinaryOp::Equals
            | BinaryOp::NotEquals
            | BinaryOp::Less
            | BinaryOp::Greater
            | BinaryOp::LessEqual
            | BinaryOp::GreaterEqual => {
                self.headers.add(headers::OPERATORS);
                let (name, negate) = match op {
                    BinaryOp::NotEquals => ("IS_EQUAL", true),
                    BinaryOp::Less => ("LT", false),
                    BinaryOp::Greater => ("GT", false),
                    BinaryOp::LessEqual => ("LE", false),
                    BinaryOp::GreaterEqual => ("GE", false),
                    _ => ("IS_EQUAL", false),
                };
                let test = format!("{}({}, {})", self.options.kernel_macro(name), l, r);
                let code = if negate { format!("!{}", test) } else { test };
                return Ok(ResolvedExpression::new(StaticType::Bool, code));
            }
            BinaryOp::Add => ("add_function", headers::OPERATORS),
            BinaryOp::Sub => ("sub_function", headers::OPERATORS),
            BinaryOp::Mul => ("mul_function", headers::OPERATORS),
            BinaryOp::Div => ("div_function", headers::OPERATORS),
            BinaryOp::Concat => ("concat_function", headers::CONCAT),
            BinaryOp::And | BinaryOp::Or => {
                return Err(CompileError::invalid_expression(
                    format!("operator '{}' has no boxed form", op.symbol()),
                    span,
                ));
            }
        };

        self.headers.add(header);
        let result = self.symbol_table.new_temporary(StaticType::Dynamic);
        let line = format!("{}({}, {}, {});", self.options.kernel(function), result.name, l, r);
        self.code_printer.output(line);
        Ok(ResolvedExpression::new(StaticType::Dynamic, result.name))
    }

    fn compile_call(
        &mut self,
        name: &str,
        args: &[Expression],
        span: &Span,
    ) -> Result<ResolvedExpression, CompileError> {
        let mut params = Vec::with_capacity(args.len());
        for arg in args {
            let resolved = self.compile_expression(arg, span)?;
            params.push(self.materialize_boxed(&resolved, span)?);
        }

        self.headers.add(headers::FCALL);
        let result = self.symbol_table.new_temporary(StaticType::Dynamic);
        let mut line = format!(
            "{}({}, \"{}\"",
            self.options.kernel_macro("CALL_FUNCTION"),
            result.name,
            add_slashes(name)
        );
        for param in &params {
            line.push_str(", ");
            line.push_str(param);
        }
        line.push_str(");");
        self.code_printer.output(line);

        Ok(ResolvedExpression::new(StaticType::Dynamic, result.name))
    }

    fn compile_property_access(
        &mut self,
        object: &Expression,
        property: &str,
        span: &Span,
    ) -> Result<ResolvedExpression, CompileError> {
        let object = self.compile_expression(object, span)?;
        let subtype = concrete_subtype_of(&object, &self.symbol_table, span)?;
        if subtype != StaticType::Dynamic {
            return Err(CompileError::invalid_expression(
                format!("cannot read property '{}' of a value of type '{}'", property, subtype),
                span,
            ));
        }

        self.headers.add(headers::OBJECT);
        let result = self.symbol_table.new_temporary(StaticType::Dynamic);
        let line = format!(
            "{}(&{}, {}, SL(\"{}\"), PH_NOISY_CC);",
            self.options.kernel("read_property"),
            result.name,
            object.code(),
            add_slashes(property)
        );
        self.code_printer.output(line);

        Ok(ResolvedExpression::new(StaticType::Dynamic, result.name))
    }

    fn compile_array_access(
        &mut self,
        array: &Expression,
        index: &Expression,
        span: &Span,
    ) -> Result<ResolvedExpression, CompileError> {
        let array = self.compile_expression(array, span)?;
        let subtype = concrete_subtype_of(&array, &self.symbol_table, span)?;
        if subtype != StaticType::Dynamic {
            return Err(CompileError::invalid_expression(
                format!("a value of type '{}' cannot be indexed", subtype),
                span,
            ));
        }

        let index = self.compile_expression(index, span)?;
        let key = self
            .array_key(&index, span)?
            .ok_or_else(|| CompileError::invalid_index(index.static_type(), "to read an array", span))?;

        self.headers.add(headers::ARRAY);
        let result = self.symbol_table.new_temporary(StaticType::Dynamic);
        let function = match key {
            ArrayKey::Long(_) => "array_fetch_long",
            ArrayKey::StringLiteral(_) | ArrayKey::StringBuffer(_) => "array_fetch_string",
            ArrayKey::Zval(_) => "array_fetch",
        };
        let line = format!(
            "{}(&{}, {}, {}, PH_NOISY);",
            self.options.kernel(function),
            result.name,
            array.code(),
            key.render()
        );
        self.code_printer.output(line);

        Ok(ResolvedExpression::new(StaticType::Dynamic, result.name))
    }

    /// Native type and code of a value usable in native arithmetic
    fn native_operand(
        &self,
        resolved: &ResolvedExpression,
        span: &Span,
    ) -> Result<Option<(StaticType, String)>, CompileError> {
        let subtype = concrete_subtype_of(resolved, &self.symbol_table, span)?;
        if !subtype.is_native_scalar() {
            return Ok(None);
        }
        let code = if resolved.static_type == StaticType::Bool {
            resolved.boolean_code.clone()
        } else {
            resolved.code.clone()
        };
        Ok(Some((subtype, code)))
    }

    /// Render a value in a boolean context
    fn boolean_operand(
        &mut self,
        resolved: &ResolvedExpression,
        span: &Span,
    ) -> Result<String, CompileError> {
        let subtype = concrete_subtype_of(resolved, &self.symbol_table, span)?;
        match (resolved.static_type, subtype) {
            (StaticType::Bool, _) => Ok(resolved.boolean_code.clone()),
            (StaticType::Null, _) => Ok("0".to_string()),
            (_, StaticType::Dynamic) => {
                self.headers.add(headers::OPERATORS);
                Ok(format!("{}({})", self.options.kernel("is_true"), resolved.code))
            }
            (_, ty) if ty.is_native_scalar() => Ok(resolved.code.clone()),
            (ty, _) => Err(CompileError::invalid_expression(
                format!("a value of type '{}' cannot be used as a condition", ty),
                span,
            )),
        }
    }
}

/// Escape a string for a double-quoted native literal
pub(crate) fn add_slashes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

fn render_char(value: char) -> String {
    match value {
        '\'' => "'\\''".to_string(),
        '\\' => "'\\\\'".to_string(),
        '\n' => "'\\n'".to_string(),
        '\r' => "'\\r'".to_string(),
        '\t' => "'\\t'".to_string(),
        '\0' => "'\\0'".to_string(),
        c => format!("'{}'", c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_slashes() {
        assert_eq!(add_slashes("plain"), "plain");
        assert_eq!(add_slashes("say \"hi\"\n"), "say \\\"hi\\\"\\n");
        assert_eq!(add_slashes("C:\\tmp"), "C:\\\\tmp");
    }

    #[test]
    fn test_render_char() {
        assert_eq!(render_char('a'), "'a'");
        assert_eq!(render_char('\''), "'\\''");
        assert_eq!(render_char('\n'), "'\\n'");
    }

    #[test]
    fn test_literal_bool() {
        let t = ResolvedExpression::new(StaticType::Bool, "true").with_boolean_code("1");
        assert_eq!(t.literal_bool(), Some(true));
        let computed = ResolvedExpression::new(StaticType::Bool, "(a < b)");
        assert_eq!(computed.literal_bool(), None);
    }
}
