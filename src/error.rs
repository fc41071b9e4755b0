//! Error types for assignment lowering

use std::path::PathBuf;
use thiserror::Error;

use crate::ast::Span;

/// Source location information for error messages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceLocation {
    pub file: Option<PathBuf>,
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:{}:{}", file.display(), self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

impl From<Span> for SourceLocation {
    fn from(span: Span) -> Self {
        SourceLocation {
            file: span.file,
            line: span.line,
            column: span.column,
        }
    }
}

impl From<&Span> for SourceLocation {
    fn from(span: &Span) -> Self {
        SourceLocation::from(span.clone())
    }
}

/// Main error type for the lowering engine
///
/// Every variant aborts the assignment being lowered. None of them are
/// recoverable locally; they surface to the caller as compilation errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileError {
    #[error("Cannot write variable '{variable}' because it is read only at {location}")]
    ReadOnlyWrite {
        variable: String,
        location: SourceLocation,
    },

    #[error("Cannot write variable '{variable}' because it is local only at {location}")]
    LocalOnlyWrite {
        variable: String,
        location: SourceLocation,
    },

    #[error(
        "Operator '{operator}' is not supported for variable type '{destination}' with value type '{value_type}' at {location}"
    )]
    UnsupportedOperator {
        operator: String,
        destination: String,
        value_type: String,
        location: SourceLocation,
    },

    #[error("Value type '{value_type}' cannot be {context} at {location}")]
    UnsupportedSourceType {
        value_type: String,
        context: String,
        location: SourceLocation,
    },

    #[error("Unknown destination type '{ty}' for variable '{variable}' at {location}")]
    UnknownDestinationType {
        variable: String,
        ty: String,
        location: SourceLocation,
    },

    #[error("Unknown source type '{ty}' at {location}")]
    UnknownSourceType { ty: String, location: SourceLocation },

    #[error("Index of type '{ty}' cannot be used {context} at {location}")]
    InvalidIndexType {
        ty: String,
        context: String,
        location: SourceLocation,
    },

    #[error("Property '{property}' is not defined on class '{class}' at {location}")]
    UndeclaredProperty {
        property: String,
        class: String,
        location: SourceLocation,
    },

    #[error("Cannot {access} variable '{name}' because it wasn't declared at {location}")]
    UndeclaredVariable {
        name: String,
        access: &'static str,
        location: SourceLocation,
    },

    #[error("Invalid expression: {message} at {location}")]
    InvalidExpression {
        message: String,
        location: SourceLocation,
    },
}

impl CompileError {
    pub fn read_only(variable: impl Into<String>, location: impl Into<SourceLocation>) -> Self {
        CompileError::ReadOnlyWrite {
            variable: variable.into(),
            location: location.into(),
        }
    }

    pub fn local_only(variable: impl Into<String>, location: impl Into<SourceLocation>) -> Self {
        CompileError::LocalOnlyWrite {
            variable: variable.into(),
            location: location.into(),
        }
    }

    pub fn unsupported_operator(
        operator: impl ToString,
        destination: impl ToString,
        source: impl ToString,
        location: impl Into<SourceLocation>,
    ) -> Self {
        CompileError::UnsupportedOperator {
            operator: operator.to_string(),
            destination: destination.to_string(),
            value_type: source.to_string(),
            location: location.into(),
        }
    }

    pub fn unsupported_source(
        source: impl ToString,
        context: impl Into<String>,
        location: impl Into<SourceLocation>,
    ) -> Self {
        CompileError::UnsupportedSourceType {
            value_type: source.to_string(),
            context: context.into(),
            location: location.into(),
        }
    }

    pub fn unknown_destination(
        variable: impl Into<String>,
        ty: impl ToString,
        location: impl Into<SourceLocation>,
    ) -> Self {
        CompileError::UnknownDestinationType {
            variable: variable.into(),
            ty: ty.to_string(),
            location: location.into(),
        }
    }

    pub fn unknown_source(ty: impl ToString, location: impl Into<SourceLocation>) -> Self {
        CompileError::UnknownSourceType {
            ty: ty.to_string(),
            location: location.into(),
        }
    }

    pub fn invalid_index(
        ty: impl ToString,
        context: impl Into<String>,
        location: impl Into<SourceLocation>,
    ) -> Self {
        CompileError::InvalidIndexType {
            ty: ty.to_string(),
            context: context.into(),
            location: location.into(),
        }
    }

    pub fn undeclared_property(
        property: impl Into<String>,
        class: impl Into<String>,
        location: impl Into<SourceLocation>,
    ) -> Self {
        CompileError::UndeclaredProperty {
            property: property.into(),
            class: class.into(),
            location: location.into(),
        }
    }

    pub fn undeclared_variable(
        name: impl Into<String>,
        access: &'static str,
        location: impl Into<SourceLocation>,
    ) -> Self {
        CompileError::UndeclaredVariable {
            name: name.into(),
            access,
            location: location.into(),
        }
    }

    pub fn invalid_expression(
        message: impl Into<String>,
        location: impl Into<SourceLocation>,
    ) -> Self {
        CompileError::InvalidExpression {
            message: message.into(),
            location: location.into(),
        }
    }

    /// Location the error was reported at
    pub fn location(&self) -> &SourceLocation {
        match self {
            CompileError::ReadOnlyWrite { location, .. }
            | CompileError::LocalOnlyWrite { location, .. }
            | CompileError::UnsupportedOperator { location, .. }
            | CompileError::UnsupportedSourceType { location, .. }
            | CompileError::UnknownDestinationType { location, .. }
            | CompileError::UnknownSourceType { location, .. }
            | CompileError::InvalidIndexType { location, .. }
            | CompileError::UndeclaredProperty { location, .. }
            | CompileError::UndeclaredVariable { location, .. }
            | CompileError::InvalidExpression { location, .. } => location,
        }
    }
}
