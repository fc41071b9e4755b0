//! Abstract Syntax Tree types for let statements
//!
//! The parser hands statements over as JSON documents; every node here
//! deserializes from that format. Assignment records use the flat layout
//! of the parser (`assign-type`, `variable`, `operator`, `expr`,
//! `property`, `index-expr`) and are validated into [`Assignment`].

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Position of a node in the source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub line: u32,
    #[serde(default, alias = "char")]
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            file: None,
            line,
            column,
        }
    }
}

// ============ EXPRESSIONS ============

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Expression {
    Null,
    Bool {
        value: bool,
    },
    Int {
        value: i64,
    },
    Double {
        value: f64,
    },
    Char {
        value: char,
    },
    String {
        value: String,
    },
    EmptyArray,
    Variable {
        value: String,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Not {
        expr: Box<Expression>,
    },
    PropertyAccess {
        object: Box<Expression>,
        property: String,
    },
    ArrayAccess {
        array: Box<Expression>,
        index: Box<Expression>,
    },
    Call {
        name: String,
        #[serde(default)]
        args: Vec<Expression>,
    },
}

impl Expression {
    pub fn int(value: i64) -> Self {
        Expression::Int { value }
    }

    pub fn double(value: f64) -> Self {
        Expression::Double { value }
    }

    pub fn bool(value: bool) -> Self {
        Expression::Bool { value }
    }

    pub fn char(value: char) -> Self {
        Expression::Char { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::String {
            value: value.into(),
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable { value: name.into() }
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Call {
            name: name.into(),
            args,
        }
    }

    pub fn property(object: Expression, property: impl Into<String>) -> Self {
        Expression::PropertyAccess {
            object: Box::new(object),
            property: property.into(),
        }
    }

    pub fn index(array: Expression, index: Expression) -> Self {
        Expression::ArrayAccess {
            array: Box::new(array),
            index: Box::new(index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Concat,
    Equals,
    NotEquals,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    /// Native operator token
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Concat => ".",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equals
                | BinaryOp::NotEquals
                | BinaryOp::Less
                | BinaryOp::Greater
                | BinaryOp::LessEqual
                | BinaryOp::GreaterEqual
        )
    }
}

// ============ ASSIGNMENTS ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentOperator {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    ConcatAssign,
    Increment,
    Decrement,
}

impl AssignmentOperator {
    pub const ALL: [AssignmentOperator; 7] = [
        AssignmentOperator::Assign,
        AssignmentOperator::AddAssign,
        AssignmentOperator::SubAssign,
        AssignmentOperator::MulAssign,
        AssignmentOperator::ConcatAssign,
        AssignmentOperator::Increment,
        AssignmentOperator::Decrement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentOperator::Assign => "assign",
            AssignmentOperator::AddAssign => "add-assign",
            AssignmentOperator::SubAssign => "sub-assign",
            AssignmentOperator::MulAssign => "mul-assign",
            AssignmentOperator::ConcatAssign => "concat-assign",
            AssignmentOperator::Increment => "increment",
            AssignmentOperator::Decrement => "decrement",
        }
    }

    /// Native statement operator for arithmetic assignments
    pub fn native_token(self) -> Option<&'static str> {
        match self {
            AssignmentOperator::Assign => Some("="),
            AssignmentOperator::AddAssign => Some("+="),
            AssignmentOperator::SubAssign => Some("-="),
            AssignmentOperator::MulAssign => Some("*="),
            _ => None,
        }
    }

    /// Whether this operator takes no source expression
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            AssignmentOperator::Increment | AssignmentOperator::Decrement
        )
    }
}

impl fmt::Display for AssignmentOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag naming the six assignment target forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignTargetKind {
    Variable,
    VariableAppend,
    ArrayIndex,
    ObjectProperty,
    #[serde(alias = "property-append")]
    ObjectPropertyAppend,
    #[serde(alias = "property-array-index")]
    ObjectPropertyArrayIndex,
}

impl fmt::Display for AssignTargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssignTargetKind::Variable => "variable",
            AssignTargetKind::VariableAppend => "variable-append",
            AssignTargetKind::ArrayIndex => "array-index",
            AssignTargetKind::ObjectProperty => "object-property",
            AssignTargetKind::ObjectPropertyAppend => "object-property-append",
            AssignTargetKind::ObjectPropertyArrayIndex => "object-property-array-index",
        };
        f.write_str(s)
    }
}

/// Assignment target with the data each form needs
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    /// `v = x`
    Variable,
    /// `v[] = x`
    VariableAppend,
    /// `v[i] = x`
    ArrayIndex { index: Expression },
    /// `o.p = x`
    ObjectProperty { property: String },
    /// `o.p[] = x`
    PropertyAppend { property: String },
    /// `o.p[i] = x`
    PropertyArrayIndex { property: String, index: Expression },
}

impl AssignTarget {
    pub fn kind(&self) -> AssignTargetKind {
        match self {
            AssignTarget::Variable => AssignTargetKind::Variable,
            AssignTarget::VariableAppend => AssignTargetKind::VariableAppend,
            AssignTarget::ArrayIndex { .. } => AssignTargetKind::ArrayIndex,
            AssignTarget::ObjectProperty { .. } => AssignTargetKind::ObjectProperty,
            AssignTarget::PropertyAppend { .. } => AssignTargetKind::ObjectPropertyAppend,
            AssignTarget::PropertyArrayIndex { .. } => AssignTargetKind::ObjectPropertyArrayIndex,
        }
    }

    /// Writes into a property of the variable rather than the variable itself
    pub fn is_property(&self) -> bool {
        matches!(
            self,
            AssignTarget::ObjectProperty { .. }
                | AssignTarget::PropertyAppend { .. }
                | AssignTarget::PropertyArrayIndex { .. }
        )
    }
}

/// A single `dest OP expr` inside a let statement
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawAssignment")]
pub struct Assignment {
    pub target: AssignTarget,
    pub variable: String,
    pub operator: AssignmentOperator,
    pub expr: Option<Expression>,
    pub span: Span,
}

impl Assignment {
    pub fn new(
        target: AssignTarget,
        variable: impl Into<String>,
        operator: AssignmentOperator,
        expr: Option<Expression>,
    ) -> Self {
        Self {
            target,
            variable: variable.into(),
            operator,
            expr,
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Flat parser layout of an assignment
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawAssignment {
    assign_type: AssignTargetKind,
    variable: String,
    #[serde(default = "default_operator")]
    operator: AssignmentOperator,
    #[serde(default)]
    expr: Option<Expression>,
    #[serde(default)]
    property: Option<String>,
    #[serde(default)]
    index_expr: Option<Expression>,
    #[serde(default)]
    file: Option<PathBuf>,
    #[serde(default)]
    line: u32,
    #[serde(default, alias = "char")]
    column: u32,
}

fn default_operator() -> AssignmentOperator {
    AssignmentOperator::Assign
}

impl TryFrom<RawAssignment> for Assignment {
    type Error = String;

    fn try_from(raw: RawAssignment) -> Result<Self, Self::Error> {
        let kind = raw.assign_type;
        let missing = |field: &str| format!("assignment of kind '{}' requires '{}'", kind, field);

        let target = match kind {
            AssignTargetKind::Variable => AssignTarget::Variable,
            AssignTargetKind::VariableAppend => AssignTarget::VariableAppend,
            AssignTargetKind::ArrayIndex => AssignTarget::ArrayIndex {
                index: raw.index_expr.ok_or_else(|| missing("index-expr"))?,
            },
            AssignTargetKind::ObjectProperty => AssignTarget::ObjectProperty {
                property: raw.property.ok_or_else(|| missing("property"))?,
            },
            AssignTargetKind::ObjectPropertyAppend => AssignTarget::PropertyAppend {
                property: raw.property.ok_or_else(|| missing("property"))?,
            },
            AssignTargetKind::ObjectPropertyArrayIndex => AssignTarget::PropertyArrayIndex {
                property: raw.property.ok_or_else(|| missing("property"))?,
                index: raw.index_expr.ok_or_else(|| missing("index-expr"))?,
            },
        };

        if raw.expr.is_none() && !raw.operator.is_unary() {
            return Err(missing("expr"));
        }

        Ok(Assignment {
            target,
            variable: raw.variable,
            operator: raw.operator,
            expr: raw.expr,
            span: Span {
                file: raw.file,
                line: raw.line,
                column: raw.column,
            },
        })
    }
}

// ============ STATEMENTS ============

/// `let a = 1, b[] = a, c++`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LetStatement {
    pub assignments: Vec<Assignment>,
}
