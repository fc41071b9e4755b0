//! Exhaustive walk over the plain-variable decision table
//!
//! The legal triples are listed by hand. Each must have a rule and lower to
//! a non-empty, deterministic sequence of lines; every other triple must
//! fail with `UnsupportedOperator` and emit nothing.

use letlower::ast::AssignmentOperator::{AddAssign, Assign, ConcatAssign, MulAssign, SubAssign};
use letlower::ast::{AssignTarget, Assignment, AssignmentOperator, Expression};
use letlower::compiler::{SourceShape, lowering_rule};
use letlower::{CompilationContext, CompileError, StaticType, StorageClass};

const DESTINATIONS: [StaticType; 6] = [
    StaticType::Int,
    StaticType::Uchar,
    StaticType::Double,
    StaticType::Bool,
    StaticType::String,
    StaticType::Dynamic,
];

const OPERATORS: [AssignmentOperator; 5] = [
    AssignmentOperator::Assign,
    AssignmentOperator::AddAssign,
    AssignmentOperator::SubAssign,
    AssignmentOperator::MulAssign,
    AssignmentOperator::ConcatAssign,
];

/// Source variables, one per declarable type
const SOURCE_VARIABLES: [(&str, StaticType); 7] = [
    ("src_int", StaticType::Int),
    ("src_ulong", StaticType::Ulong),
    ("src_char", StaticType::Char),
    ("src_double", StaticType::Double),
    ("src_bool", StaticType::Bool),
    ("src_string", StaticType::String),
    ("src_dynamic", StaticType::Dynamic),
];

fn sources() -> Vec<(Expression, SourceShape)> {
    let mut sources = vec![
        (Expression::Null, SourceShape::Value(StaticType::Null)),
        (Expression::int(7), SourceShape::Value(StaticType::Int)),
        (Expression::char('q'), SourceShape::Value(StaticType::Char)),
        (Expression::double(2.5), SourceShape::Value(StaticType::Double)),
        (Expression::bool(true), SourceShape::Value(StaticType::Bool)),
        (Expression::string("lit"), SourceShape::Value(StaticType::String)),
        (Expression::EmptyArray, SourceShape::Value(StaticType::EmptyArray)),
    ];
    for (name, ty) in SOURCE_VARIABLES {
        sources.push((Expression::variable(name), SourceShape::Binding(ty)));
    }
    sources
}

const ARITHMETIC: &[AssignmentOperator] = &[Assign, AddAssign, SubAssign, MulAssign];
const ASSIGN_OR_ADD: &[AssignmentOperator] = &[Assign, AddAssign];
const ASSIGN_OR_CONCAT: &[AssignmentOperator] = &[Assign, ConcatAssign];
const ASSIGN_ONLY: &[AssignmentOperator] = &[Assign];
const BOX_ARITHMETIC: &[AssignmentOperator] = &[Assign, AddAssign, SubAssign];
const NONE: &[AssignmentOperator] = &[];

/// Operators the emission table accepts for a destination and source
fn legal_operators(destination: StaticType, source: SourceShape) -> &'static [AssignmentOperator] {
    use SourceShape::{Binding, Value};
    use StaticType::*;

    match destination {
        Int | Uchar => match source {
            Value(Null | Int | Char | Double) => ARITHMETIC,
            Value(Bool) => ASSIGN_OR_ADD,
            Binding(Int | Ulong | Char | Bool | Double | Dynamic) => ARITHMETIC,
            _ => NONE,
        },
        Double => match source {
            Value(Null | Int | Char | Double | Bool) => ARITHMETIC,
            Binding(Int | Ulong | Char | Bool | Double | Dynamic) => ARITHMETIC,
            _ => NONE,
        },
        Bool => match source {
            Value(Null) => ASSIGN_ONLY,
            Value(Int | Char | Double | Bool) => ASSIGN_OR_ADD,
            Binding(Int | Ulong | Char | Double | Bool) => ASSIGN_OR_ADD,
            Binding(Dynamic) => ASSIGN_ONLY,
            _ => NONE,
        },
        String => match source {
            Value(Null | String | Char | Int) => ASSIGN_OR_CONCAT,
            Binding(String | Int | Ulong | Char | Dynamic) => ASSIGN_OR_CONCAT,
            _ => NONE,
        },
        Dynamic => match source {
            Binding(Dynamic) => BOX_ARITHMETIC,
            _ => ASSIGN_ONLY,
        },
        _ => NONE,
    }
}

fn context(destination: StaticType) -> CompilationContext {
    let mut ctx = CompilationContext::new();
    let storage = if destination == StaticType::Dynamic {
        StorageClass::HeapBoxed
    } else {
        StorageClass::StackOnly
    };
    ctx.symbol_table.declare("dst", destination, storage, false);
    for (name, ty) in SOURCE_VARIABLES {
        let storage = if ty == StaticType::Dynamic {
            StorageClass::HeapBoxed
        } else {
            StorageClass::StackOnly
        };
        ctx.symbol_table.declare(name, ty, storage, false);
    }
    ctx
}

fn lower(destination: StaticType, operator: AssignmentOperator, expr: &Expression) -> (Result<(), CompileError>, Vec<String>) {
    let mut ctx = context(destination);
    let assignment = Assignment::new(AssignTarget::Variable, "dst", operator, Some(expr.clone()));
    let result = ctx.lower_assignment(&assignment);
    (result, ctx.lines().to_vec())
}

#[test]
fn test_every_triple_matches_the_table() {
    let mut legal = 0;
    let mut illegal = 0;

    for destination in DESTINATIONS {
        let Some(family) = destination.family() else {
            continue;
        };
        for (expr, shape) in sources() {
            for operator in OPERATORS {
                let expected = legal_operators(destination, shape).contains(&operator);
                let rule = lowering_rule(family, shape, operator);
                assert_eq!(rule.is_some(), expected, "{} {:?} {}: rule {:?}", destination, shape, operator, rule);

                let (result, lines) = lower(destination, operator, &expr);
                if expected {
                    legal += 1;
                    assert_eq!(result, Ok(()), "{} {:?} {}", destination, shape, operator);
                    assert!(!lines.is_empty(), "{} {:?} {}: no lines", destination, shape, operator);

                    let (again, lines_again) = lower(destination, operator, &expr);
                    assert_eq!(again, Ok(()));
                    assert_eq!(lines, lines_again, "{} {:?} {}: not deterministic", destination, shape, operator);
                } else {
                    illegal += 1;
                    assert!(
                        matches!(result, Err(CompileError::UnsupportedOperator { .. })),
                        "{} {:?} {}: {:?}",
                        destination,
                        shape,
                        operator,
                        result
                    );
                    assert!(lines.is_empty(), "{} {:?} {}: {:?}", destination, shape, operator, lines);
                }
            }
        }
    }

    // 6 destinations x 14 sources x 5 operators
    assert_eq!(legal + illegal, 420);
    assert_eq!(legal, 182);
}

#[test]
fn test_native_null_yields_zero_or_identity() {
    for (destination, zero) in [
        (StaticType::Int, "0"),
        (StaticType::Uchar, "0"),
        (StaticType::Double, "0.0"),
    ] {
        for (operator, token) in [
            (AssignmentOperator::Assign, "="),
            (AssignmentOperator::AddAssign, "+="),
            (AssignmentOperator::SubAssign, "-="),
            (AssignmentOperator::MulAssign, "*="),
        ] {
            let (result, lines) = lower(destination, operator, &Expression::Null);
            assert_eq!(result, Ok(()));
            assert_eq!(lines, [format!("dst {} {};", token, zero)]);
        }
    }

    let (result, lines) = lower(StaticType::Bool, AssignmentOperator::Assign, &Expression::Null);
    assert_eq!(result, Ok(()));
    assert_eq!(lines, ["dst = 0;"]);
}

#[test]
fn test_unary_operators_have_no_rules() {
    for destination in DESTINATIONS {
        let Some(family) = destination.family() else {
            continue;
        };
        for (_, shape) in sources() {
            assert_eq!(lowering_rule(family, shape, AssignmentOperator::Increment), None);
            assert_eq!(lowering_rule(family, shape, AssignmentOperator::Decrement), None);
        }
    }
}
