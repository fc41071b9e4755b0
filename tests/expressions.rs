//! Tests for right-hand side compilation

use letlower::ast::{AssignTarget, Assignment, AssignmentOperator, BinaryOp, Expression, Span};
use letlower::compiler::concrete_subtype_of;
use letlower::{CompilationContext, CompileError, StaticType, StorageClass};

fn context() -> CompilationContext {
    let mut ctx = CompilationContext::new();
    let table = &mut ctx.symbol_table;
    table.declare("a", StaticType::Int, StorageClass::StackOnly, false);
    table.declare("d", StaticType::Double, StorageClass::StackOnly, false);
    table.declare("b", StaticType::Bool, StorageClass::StackOnly, false);
    table.declare("flag", StaticType::Bool, StorageClass::StackOnly, false);
    table.declare("v", StaticType::Dynamic, StorageClass::HeapBoxed, false);
    table.declare("w", StaticType::Dynamic, StorageClass::HeapBoxed, false);
    table.declare("o", StaticType::Dynamic, StorageClass::HeapBoxed, false);
    ctx
}

fn headers_of(ctx: &CompilationContext) -> Vec<&str> {
    ctx.headers.iter().collect()
}

fn lower(ctx: &mut CompilationContext, variable: &str, expr: Expression) -> Result<(), CompileError> {
    ctx.lower_assignment(&Assignment::new(
        AssignTarget::Variable,
        variable,
        AssignmentOperator::Assign,
        Some(expr),
    ))
}

#[test]
fn test_literals_resolve_to_their_types() {
    let mut ctx = context();
    let span = Span::default();
    for (expr, ty, code) in [
        (Expression::Null, StaticType::Null, "null"),
        (Expression::bool(false), StaticType::Bool, "false"),
        (Expression::int(-4), StaticType::Int, "-4"),
        (Expression::double(1.0), StaticType::Double, "1.0"),
        (Expression::char('\''), StaticType::Char, "'\\''"),
        (Expression::string("a\tb"), StaticType::String, "a\\tb"),
        (Expression::EmptyArray, StaticType::EmptyArray, ""),
    ] {
        let resolved = ctx.compile_expression(&expr, &span);
        let resolved = resolved.as_ref().map(|r| (r.static_type(), r.code()));
        assert_eq!(resolved, Ok((ty, code)));
    }
    assert!(ctx.lines().is_empty());
}

#[test]
fn test_variable_reference_is_dynamic() {
    let mut ctx = context();
    let span = Span::default();
    let resolved = ctx.compile_expression(&Expression::variable("a"), &span);
    assert_eq!(
        resolved.as_ref().map(|r| (r.static_type(), r.referenced_variable())),
        Ok((StaticType::Dynamic, Some("a")))
    );

    let subtype = resolved.and_then(|r| concrete_subtype_of(&r, &ctx.symbol_table, &span));
    assert_eq!(subtype, Ok(StaticType::Int));
}

#[test]
fn test_native_arithmetic_stays_inline() {
    let mut ctx = context();
    let expr = Expression::binary(BinaryOp::Add, Expression::variable("a"), Expression::int(2));
    assert_eq!(lower(&mut ctx, "a", expr), Ok(()));

    let expr = Expression::binary(BinaryOp::Mul, Expression::double(1.5), Expression::variable("a"));
    assert_eq!(lower(&mut ctx, "d", expr), Ok(()));

    let expr = Expression::binary(BinaryOp::Div, Expression::variable("a"), Expression::int(2));
    assert_eq!(lower(&mut ctx, "d", expr), Ok(()));

    assert_eq!(
        ctx.lines(),
        ["a = (a + 2);", "d = (1.5 * a);", "d = (double) ((a / 2));"]
    );
    assert!(ctx.headers.is_empty());
}

#[test]
fn test_logical_operators() {
    let mut ctx = context();
    let expr = Expression::binary(
        BinaryOp::And,
        Expression::binary(BinaryOp::Less, Expression::variable("a"), Expression::int(3)),
        Expression::variable("flag"),
    );
    assert_eq!(lower(&mut ctx, "b", expr), Ok(()));

    let expr = Expression::Not {
        expr: Box::new(Expression::variable("flag")),
    };
    assert_eq!(lower(&mut ctx, "b", expr), Ok(()));

    let expr = Expression::binary(BinaryOp::Or, Expression::variable("v"), Expression::bool(false));
    assert_eq!(lower(&mut ctx, "b", expr), Ok(()));

    assert_eq!(
        ctx.lines(),
        [
            "b = ((a < 3) && flag);",
            "b = !(flag);",
            "b = (zephir_is_true(v) || 0);"
        ]
    );
    assert_eq!(headers_of(&ctx), ["kernel/operators"]);
}

#[test]
fn test_boxed_arithmetic_goes_through_runtime() {
    let mut ctx = context();
    let expr = Expression::binary(BinaryOp::Add, Expression::variable("v"), Expression::int(1));
    assert_eq!(lower(&mut ctx, "w", expr), Ok(()));
    assert_eq!(
        ctx.lines(),
        [
            "ZVAL_LONG(_0, 1);",
            "zephir_add_function(_1, v, _0);",
            "ZEPHIR_CPY_WRT(w, _1);"
        ]
    );
}

#[test]
fn test_concat_registers_concat_header() {
    let mut ctx = context();
    let expr = Expression::binary(BinaryOp::Concat, Expression::variable("v"), Expression::variable("w"));
    assert_eq!(lower(&mut ctx, "v", expr), Ok(()));
    assert_eq!(ctx.lines(), ["zephir_concat_function(_0, v, w);", "ZEPHIR_CPY_WRT(v, _0);"]);
    assert_eq!(headers_of(&ctx), ["kernel/concat"]);
}

#[test]
fn test_function_call() {
    let mut ctx = context();
    let expr = Expression::call("count", vec![Expression::variable("w"), Expression::int(1)]);
    assert_eq!(lower(&mut ctx, "v", expr), Ok(()));
    assert_eq!(
        ctx.lines(),
        [
            "ZVAL_LONG(_0, 1);",
            "ZEPHIR_CALL_FUNCTION(_1, \"count\", w, _0);",
            "ZEPHIR_CPY_WRT(v, _1);"
        ]
    );
    assert_eq!(headers_of(&ctx), ["kernel/fcall"]);
}

#[test]
fn test_property_read() {
    let mut ctx = context();
    let expr = Expression::property(Expression::variable("o"), "name");
    assert_eq!(lower(&mut ctx, "v", expr), Ok(()));
    assert_eq!(
        ctx.lines(),
        [
            "zephir_read_property(&_0, o, SL(\"name\"), PH_NOISY_CC);",
            "ZEPHIR_CPY_WRT(v, _0);"
        ]
    );
}

#[test]
fn test_array_reads() {
    let mut ctx = context();
    let expr = Expression::index(Expression::variable("w"), Expression::int(2));
    assert_eq!(lower(&mut ctx, "a", expr), Ok(()));

    let expr = Expression::index(Expression::variable("w"), Expression::string("k"));
    assert_eq!(lower(&mut ctx, "v", expr), Ok(()));

    let expr = Expression::index(Expression::variable("w"), Expression::variable("v"));
    assert_eq!(lower(&mut ctx, "v", expr), Ok(()));

    assert_eq!(
        ctx.lines(),
        [
            "zephir_array_fetch_long(&_0, w, 2, PH_NOISY);",
            "a = zephir_get_numberval(_0);",
            "zephir_array_fetch_string(&_1, w, SL(\"k\"), PH_NOISY);",
            "ZEPHIR_CPY_WRT(v, _1);",
            "zephir_array_fetch(&_2, w, v, PH_NOISY);",
            "ZEPHIR_CPY_WRT(v, _2);"
        ]
    );
    assert_eq!(headers_of(&ctx), ["kernel/array", "kernel/operators"]);
}

#[test]
fn test_invalid_reads() {
    let mut ctx = context();

    let expr = Expression::property(Expression::variable("a"), "x");
    let err = lower(&mut ctx, "v", expr);
    assert!(matches!(err, Err(CompileError::InvalidExpression { .. })), "{:?}", err);

    let expr = Expression::index(Expression::variable("w"), Expression::double(1.5));
    let err = lower(&mut ctx, "v", expr);
    assert!(matches!(err, Err(CompileError::InvalidIndexType { .. })), "{:?}", err);

    let expr = Expression::Not {
        expr: Box::new(Expression::string("x")),
    };
    let err = lower(&mut ctx, "b", expr);
    assert!(matches!(err, Err(CompileError::InvalidExpression { .. })), "{:?}", err);

    assert!(ctx.lines().is_empty());
}
