use eidos_core::{
    pool, termination, EidosError, EidosResult, EidosValue, ScopeRef, SymbolTable, ValueRc,
    ValueType,
};
use eidos_interp::{builtin_function_map, Interpreter};
use eidos_parser::Script;
use std::rc::Rc;

/// Run a script against a fresh chain: intrinsic constants under a variables
/// scope, with the built-in function map.
fn eval(code: &str) -> EidosResult<ValueRc> {
    let intrinsic = SymbolTable::new_intrinsic();
    let variables = SymbolTable::new_variables(intrinsic).unwrap();
    eval_in(&variables, code)
}

fn eval_in(variables: &ScopeRef, code: &str) -> EidosResult<ValueRc> {
    let mut script = Script::new(code);
    script.tokenize()?;
    script.parse_interpreter_block()?;

    let mut interpreter = Interpreter::new(&script, variables.clone(), builtin_function_map());
    interpreter.evaluate_interpreter_block(false)
}

#[test]
fn test_subscript_assignment_mutates_in_place() {
    let result = eval("x = 1:5; x[2] = 99; x;").unwrap();
    assert_eq!(*result, EidosValue::integer_vector(vec![1, 2, 99, 4, 5]));
}

#[test]
fn test_copy_on_write_protects_the_older_binding() {
    let result = eval("x = 1:3; y = x; x[0] = 0; c(x[0], y[0]);").unwrap();
    assert_eq!(*result, EidosValue::integer_vector(vec![0, 1]));
}

#[test]
fn test_assigning_to_an_intrinsic_constant_terminates() {
    let err = eval("PI = 4;").unwrap_err();
    assert!(matches!(err, EidosError::RedefinitionOfConstant { .. }));

    // A fresh chain still sees the intrinsic value.
    let pi = eval("PI;").unwrap();
    assert_eq!(pi.float_at(0).unwrap(), std::f64::consts::PI);

    // The same holds within one chain across two scripts.
    let intrinsic = SymbolTable::new_intrinsic();
    let variables = SymbolTable::new_variables(intrinsic).unwrap();
    assert!(eval_in(&variables, "PI = 4;").is_err());
    let pi = eval_in(&variables, "PI;").unwrap();
    assert_eq!(pi.float_at(0).unwrap(), std::f64::consts::PI);
}

#[test]
fn test_broadcast_length_rules() {
    let err = eval("a = c(1.0, 2.0); b = c(10.0, 20.0, 30.0); a + b;").unwrap_err();
    assert!(matches!(err, EidosError::LengthMismatch { .. }));

    let ok = eval("a = c(1.0, 2.0, 3.0); a + 10.0;").unwrap();
    assert_eq!(*ok, EidosValue::float_vector(vec![11.0, 12.0, 13.0]));

    let ok = eval("10 * c(1, 2, 3);").unwrap();
    assert_eq!(*ok, EidosValue::integer_vector(vec![10, 20, 30]));
}

#[test]
fn test_for_loop_accumulation_with_lazy_ternary() {
    let result = eval("for (i in 1:3) s = (exists(\"s\") ? s else 0) + i; s;").unwrap();
    assert_eq!(*result, EidosValue::integer(6));
}

#[test]
fn test_parse_error_caret_alignment() {
    let source = "x = 1 + ;";
    let err = eval(source).unwrap_err();
    assert!(matches!(err, EidosError::Parse { .. }));

    let span = err.span().expect("parse error carries a position");
    let excerpt = termination::format_script_error(source, span).unwrap();
    let lines: Vec<&str> = excerpt.lines().collect();
    assert_eq!(lines[2], "x = 1 + ;");
    assert_eq!(lines[3], "        ^");
}

#[test]
fn test_assignment_result_is_invisible() {
    let result = eval("x = 5;").unwrap();
    assert!(result.is_invisible());
    assert_eq!(result.integer_at(0).unwrap(), 5);

    // A bare identifier as the last statement is visible.
    let result = eval("x = 5; x;").unwrap();
    assert!(!result.is_invisible());
}

#[test]
fn test_top_level_echo_skips_invisible_results() {
    let intrinsic = SymbolTable::new_intrinsic();
    let variables = SymbolTable::new_variables(intrinsic).unwrap();

    let mut script = Script::new("x = 3; x + 1;");
    script.tokenize().unwrap();
    script.parse_interpreter_block().unwrap();

    let mut interpreter = Interpreter::new(&script, variables, builtin_function_map());
    interpreter.evaluate_interpreter_block(true).unwrap();
    assert_eq!(interpreter.execution_output(), "4\n");
}

#[test]
fn test_intrinsic_identity_through_scripts() {
    let t = eval("T;").unwrap();
    assert!(Rc::ptr_eq(&t, &pool::static_logical(true)));

    let null = eval("NULL;").unwrap();
    assert!(Rc::ptr_eq(&null, &pool::static_null()));

    let inf = eval("INF;").unwrap();
    assert_eq!(inf.float_at(0).unwrap(), f64::INFINITY);

    let nan = eval("NAN;").unwrap();
    assert!(nan.float_at(0).unwrap().is_nan());
}

#[test]
fn test_round_trip_of_literal_display() {
    for source in ["T;", "F;", "42;", "-17;", "1.5;", "100.0;", "\"he said \\\"hi\\\"\";"] {
        let original = eval(source).unwrap();
        let reprinted = format!("{};", original);
        let round_tripped = eval(&reprinted).unwrap();
        assert_eq!(*original, *round_tripped, "round-trip failed for {}", source);
    }
}

#[test]
fn test_sequence_operator() {
    assert_eq!(
        *eval("1:5;").unwrap(),
        EidosValue::integer_vector(vec![1, 2, 3, 4, 5])
    );
    assert_eq!(
        *eval("3:-1;").unwrap(),
        EidosValue::integer_vector(vec![3, 2, 1, 0, -1])
    );

    // Non-finite endpoints are a type error.
    assert!(matches!(eval("1:INF;").unwrap_err(), EidosError::Type { .. }));
    assert!(matches!(eval("NAN:3;").unwrap_err(), EidosError::Type { .. }));
}

#[test]
fn test_logical_subscript() {
    let result = eval("x = 10:15; x[x > 12];").unwrap();
    assert_eq!(*result, EidosValue::integer_vector(vec![13, 14, 15]));

    // Logical index length must match.
    let err = eval("x = 1:5; x[c(T, F)];").unwrap_err();
    assert!(matches!(err, EidosError::IndexOutOfRange { .. }));
}

#[test]
fn test_integer_subscript_bounds() {
    let err = eval("x = 1:5; x[5];").unwrap_err();
    assert!(matches!(err, EidosError::IndexOutOfRange { .. }));

    let err = eval("x = 1:5; x[-1];").unwrap_err();
    assert!(matches!(err, EidosError::IndexOutOfRange { .. }));

    let result = eval("x = 1:5; x[c(0, 4)];").unwrap();
    assert_eq!(*result, EidosValue::integer_vector(vec![1, 5]));
}

#[test]
fn test_subscript_assignment_type_rules() {
    // Assigning a float element into an integer vector is incompatible.
    let err = eval("x = 1:5; x[0] = 1.5; x;").unwrap_err();
    assert!(matches!(err, EidosError::Type { .. }));

    // Integer into float promotes per the lattice.
    let ok = eval("x = c(1.0, 2.0); x[0] = 7; x;").unwrap();
    assert_eq!(*ok, EidosValue::float_vector(vec![7.0, 2.0]));
}

#[test]
fn test_invalid_assignment_targets() {
    for source in ["1 = 2;", "x + 1 = 2;", "1:3 = 2;", "\"s\" = 2;"] {
        let err = eval(source).unwrap_err();
        assert!(
            matches!(err, EidosError::InvalidAssignmentTarget { .. }),
            "expected invalid assignment target for {}, got {:?}",
            source,
            err
        );
    }
}

#[test]
fn test_undefined_identifier() {
    let err = eval("q + 1;").unwrap_err();
    assert!(matches!(err, EidosError::UndefinedIdentifier { .. }));
}

#[test]
fn test_while_and_do_while() {
    let result = eval("x = 0; while (x < 10) x = x + 3; x;").unwrap();
    assert_eq!(*result, EidosValue::integer(12));

    // do-while executes the body before the first test.
    let result = eval("x = 100; do x = x + 1; while (x < 10); x;").unwrap();
    assert_eq!(*result, EidosValue::integer(101));
}

#[test]
fn test_break_and_next() {
    let result = eval("s = 0; for (i in 1:10) { if (i == 4) break; s = s + i; } s;").unwrap();
    assert_eq!(*result, EidosValue::integer(6));

    let result = eval("s = 0; for (i in 1:5) { if (i % 2 == 0) next; s = s + i; } s;").unwrap();
    assert_eq!(*result, EidosValue::integer(9));
}

#[test]
fn test_return_unwinds_the_block() {
    // A top-level return ends evaluation of the block and yields its value.
    let result = eval("x = 1; return x + 1; x = 50;").unwrap();
    assert_eq!(*result, EidosValue::integer(2));

    let result = eval("for (i in 1:10) if (i == 3) return i * 100; 0;").unwrap();
    assert_eq!(*result, EidosValue::integer(300));

    // A bare return yields NULL.
    let result = eval("return;").unwrap();
    assert!(result.is_null());
}

#[test]
fn test_ternary_requires_singleton_condition() {
    assert_eq!(*eval("T ? 1 else 2;").unwrap(), EidosValue::integer(1));
    assert_eq!(*eval("F ? 1 else 2;").unwrap(), EidosValue::integer(2));

    let err = eval("c(T, F) ? 1 else 2;").unwrap_err();
    assert!(matches!(err, EidosError::Type { .. }));
}

#[test]
fn test_division_and_power_are_float() {
    let result = eval("7 / 2;").unwrap();
    assert_eq!(result.value_type(), ValueType::Float);
    assert_eq!(result.float_at(0).unwrap(), 3.5);

    let result = eval("2 ^ 10;").unwrap();
    assert_eq!(result.value_type(), ValueType::Float);
    assert_eq!(result.float_at(0).unwrap(), 1024.0);

    // Power is right-associative and binds tighter than unary minus.
    let result = eval("-2 ^ 2;").unwrap();
    assert_eq!(result.float_at(0).unwrap(), -4.0);
}

#[test]
fn test_logical_operators_are_elementwise() {
    let result = eval("c(T, T, F) & c(T, F, F);").unwrap();
    assert_eq!(
        *result,
        EidosValue::logical_vector(vec![true, false, false])
    );

    let result = eval("c(T, F) | F;").unwrap();
    assert_eq!(*result, EidosValue::logical_vector(vec![true, false]));

    // `!` binds looser than comparison.
    let result = eval("!1 == 2;").unwrap();
    assert_eq!(*result, EidosValue::logical(true));
}

#[test]
fn test_string_comparison_is_lexicographic() {
    let result = eval("\"apple\" < \"banana\";").unwrap();
    assert_eq!(*result, EidosValue::logical(true));

    // Mixed comparison promotes to string.
    let result = eval("10 == \"10\";").unwrap();
    assert_eq!(*result, EidosValue::logical(true));
}

#[test]
fn test_comparison_with_null_is_empty_logical() {
    let result = eval("1 == NULL;").unwrap();
    assert_eq!(result.value_type(), ValueType::Logical);
    assert_eq!(result.count(), 0);
}

#[test]
fn test_chained_scripts_share_state() {
    let intrinsic = SymbolTable::new_intrinsic();
    let variables = SymbolTable::new_variables(intrinsic).unwrap();

    eval_in(&variables, "counter = 0;").unwrap();
    eval_in(&variables, "counter = counter + 1;").unwrap();
    eval_in(&variables, "counter = counter + 1;").unwrap();
    let result = eval_in(&variables, "counter;").unwrap();
    assert_eq!(*result, EidosValue::integer(2));
}

#[test]
fn test_keyword_argument_dispatch() {
    let result = eval("seq(1, 9, by=2);").unwrap();
    assert_eq!(*result, EidosValue::integer_vector(vec![1, 3, 5, 7, 9]));

    // Unknown keyword is a type error naming the function.
    let err = eval("seq(1, 9, step=2);").unwrap_err();
    assert!(err.to_string().contains("seq"));
}

#[test]
fn test_type_mask_enforcement_names_the_parameter() {
    let err = eval("sqrt(\"four\");").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("sqrt"));
    assert!(text.contains("'x'"));
    assert!(text.contains("string"));
}

#[test]
fn test_stray_break_is_absorbed_at_top_level() {
    // A break outside any loop does not leak into later statements.
    let result = eval("break; 5;").unwrap();
    assert_eq!(*result, EidosValue::integer(5));
}

#[test]
fn test_empty_statement_and_empty_block() {
    let result = eval(";").unwrap();
    assert!(result.is_null());
    assert!(result.is_invisible());
}
