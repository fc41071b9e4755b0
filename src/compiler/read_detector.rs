//! Read detection for destination/source hazards
//!
//! Rebuilding a boxed destination clears it before the new value is stored.
//! If the value being stored still reads the destination, it has to be
//! evaluated into a temporary first. The check here is purely syntactic:
//! any occurrence of the name counts, including inside call arguments.

use crate::ast::Expression;

/// Whether `name` is read anywhere inside `expr`
pub fn references(name: &str, expr: &Expression) -> bool {
    match expr {
        Expression::Variable { value } => value == name,

        Expression::Binary { left, right, .. } => {
            references(name, left) || references(name, right)
        }

        Expression::Not { expr } => references(name, expr),

        Expression::PropertyAccess { object, .. } => references(name, object),

        Expression::ArrayAccess { array, index } => {
            references(name, array) || references(name, index)
        }

        Expression::Call { args, .. } => args.iter().any(|arg| references(name, arg)),

        Expression::Null
        | Expression::Bool { .. }
        | Expression::Int { .. }
        | Expression::Double { .. }
        | Expression::Char { .. }
        | Expression::String { .. }
        | Expression::EmptyArray => false,
    }
}
