//! Operator semantics: element-wise arithmetic with broadcasting, comparison
//! with type promotion, logical connectives, and the sequence operator.

use eidos_core::{pool, BinaryOp, EidosError, EidosResult, EidosValue, ValueRc, ValueType};
use std::cmp::Ordering;
use std::rc::Rc;

const SITE_BINARY: &str = "Interpreter::evaluate_binary";
const SITE_UNARY: &str = "Interpreter::evaluate_unary";
const SITE_RANGE: &str = "Interpreter::evaluate_range";

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Pow => "^",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
        BinaryOp::And => "&",
        BinaryOp::Or => "|",
    }
}

/// The broadcast length for a binary operation: equal lengths, or one
/// operand of length 1 reused for every index of the other.
fn broadcast_count(op: BinaryOp, left: &EidosValue, right: &EidosValue) -> EidosResult<usize> {
    let (m, n) = (left.count(), right.count());
    if m == n || m == 1 || n == 1 {
        Ok(m.max(n))
    } else {
        Err(EidosError::length_mismatch(
            SITE_BINARY,
            format!(
                "operator '{}' requires operands of equal length, or one operand of length 1 ({} and {} supplied).",
                op_symbol(op),
                m,
                n
            ),
        ))
    }
}

fn unsupported_operand(op_str: &str, value_type: ValueType) -> EidosError {
    EidosError::type_error(
        SITE_BINARY,
        format!(
            "operand type {} is not supported by the '{}' operator.",
            value_type, op_str
        ),
    )
}

pub fn unary_minus(operand: &EidosValue) -> EidosResult<ValueRc> {
    let count = operand.count();
    match operand.value_type() {
        ValueType::Integer => {
            let mut out = Vec::with_capacity(count);
            for i in 0..count {
                out.push(operand.integer_at(i)?.wrapping_neg());
            }
            Ok(Rc::new(if count == 1 {
                EidosValue::integer(out[0])
            } else {
                EidosValue::integer_vector(out)
            }))
        }
        ValueType::Float => {
            let mut out = Vec::with_capacity(count);
            for i in 0..count {
                out.push(-operand.float_at(i)?);
            }
            Ok(Rc::new(if count == 1 {
                EidosValue::float(out[0])
            } else {
                EidosValue::float_vector(out)
            }))
        }
        other => Err(EidosError::type_error(
            SITE_UNARY,
            format!("operand type {} is not supported by the unary '-' operator.", other),
        )),
    }
}

pub fn unary_plus(operand: &ValueRc) -> EidosResult<ValueRc> {
    match operand.value_type() {
        ValueType::Integer | ValueType::Float => Ok(Rc::clone(operand)),
        other => Err(EidosError::type_error(
            SITE_UNARY,
            format!("operand type {} is not supported by the unary '+' operator.", other),
        )),
    }
}

pub fn unary_not(operand: &EidosValue) -> EidosResult<ValueRc> {
    let count = operand.count();
    if !matches!(
        operand.value_type(),
        ValueType::Logical | ValueType::Integer | ValueType::Float
    ) {
        return Err(EidosError::type_error(
            SITE_UNARY,
            format!(
                "operand type {} is not supported by the '!' operator.",
                operand.value_type()
            ),
        ));
    }

    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        out.push(!operand.logical_coerced_at(i)?);
    }
    Ok(if count == 1 {
        pool::static_logical(out[0])
    } else {
        Rc::new(EidosValue::logical_vector(out))
    })
}

pub fn binary_op(op: BinaryOp, left: &EidosValue, right: &EidosValue) -> EidosResult<ValueRc> {
    match op {
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Mod
        | BinaryOp::Pow => arithmetic(op, left, right),
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt
        | BinaryOp::GtEq => comparison(op, left, right),
        BinaryOp::And | BinaryOp::Or => connective(op, left, right),
    }
}

fn is_numeric_operand(value_type: ValueType) -> bool {
    matches!(
        value_type,
        ValueType::Logical | ValueType::Integer | ValueType::Float
    )
}

fn arithmetic(op: BinaryOp, left: &EidosValue, right: &EidosValue) -> EidosResult<ValueRc> {
    let symbol = op_symbol(op);

    // String concatenation: '+' with a string operand coerces the other side
    // element-wise.
    if op == BinaryOp::Add
        && (left.value_type() == ValueType::String || right.value_type() == ValueType::String)
    {
        if left.value_type() == ValueType::Object || right.value_type() == ValueType::Object {
            return Err(unsupported_operand(symbol, ValueType::Object));
        }
        if left.is_null() || right.is_null() {
            return Err(unsupported_operand(symbol, ValueType::Null));
        }
        let count = broadcast_count(op, left, right)?;
        let (m, n) = (left.count(), right.count());
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let mut s = left.element_display(i % m)?;
            s.push_str(&right.element_display(i % n)?);
            out.push(s);
        }
        return Ok(Rc::new(if count == 1 {
            EidosValue::string(out.into_iter().next().unwrap_or_default())
        } else {
            EidosValue::string_vector(out)
        }));
    }

    for operand in [left, right] {
        if !is_numeric_operand(operand.value_type()) {
            return Err(unsupported_operand(symbol, operand.value_type()));
        }
    }

    let count = broadcast_count(op, left, right)?;
    let (m, n) = (left.count(), right.count());

    // `/`, `%` and `^` always produce float; the others stay integer when
    // both operands are integral.
    let float_result = matches!(op, BinaryOp::Div | BinaryOp::Mod | BinaryOp::Pow)
        || left.value_type() == ValueType::Float
        || right.value_type() == ValueType::Float;

    if float_result {
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let a = left.float_at(i % m)?;
            let b = right.float_at(i % n)?;
            out.push(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Mod => a % b,
                BinaryOp::Pow => a.powf(b),
                _ => unreachable!("arithmetic op"),
            });
        }
        Ok(Rc::new(if count == 1 {
            EidosValue::float(out[0])
        } else {
            EidosValue::float_vector(out)
        }))
    } else {
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let a = left.integer_at(i % m)?;
            let b = right.integer_at(i % n)?;
            out.push(match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                _ => unreachable!("integer arithmetic op"),
            });
        }
        Ok(Rc::new(if count == 1 {
            EidosValue::integer(out[0])
        } else {
            EidosValue::integer_vector(out)
        }))
    }
}

fn comparison(op: BinaryOp, left: &EidosValue, right: &EidosValue) -> EidosResult<ValueRc> {
    // Comparing against NULL yields an empty logical result.
    if left.is_null() || right.is_null() {
        return Ok(pool::static_empty_logical());
    }

    let symbol = op_symbol(op);
    let objects = (left.value_type() == ValueType::Object)
        || (right.value_type() == ValueType::Object);

    if objects {
        // Only identity (in)equality is defined for objects.
        if left.value_type() != ValueType::Object || right.value_type() != ValueType::Object {
            return Err(unsupported_operand(symbol, ValueType::Object));
        }
        if !matches!(op, BinaryOp::Eq | BinaryOp::NotEq) {
            return Err(unsupported_operand(symbol, ValueType::Object));
        }
        let count = broadcast_count(op, left, right)?;
        let (m, n) = (left.count(), right.count());
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let same = Rc::ptr_eq(&left.object_at(i % m)?, &right.object_at(i % n)?);
            out.push(if op == BinaryOp::Eq { same } else { !same });
        }
        return Ok(logical_result(out));
    }

    let count = broadcast_count(op, left, right)?;
    let (m, n) = (left.count(), right.count());

    let string_compare =
        left.value_type() == ValueType::String || right.value_type() == ValueType::String;
    let float_compare = !string_compare
        && (left.value_type() == ValueType::Float || right.value_type() == ValueType::Float);

    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let ordering: Option<Ordering> = if string_compare {
            Some(
                left.element_display(i % m)?
                    .cmp(&right.element_display(i % n)?),
            )
        } else if float_compare {
            // IEEE semantics: comparisons against NaN are all false.
            left.float_at(i % m)?.partial_cmp(&right.float_at(i % n)?)
        } else {
            Some(left.integer_at(i % m)?.cmp(&right.integer_at(i % n)?))
        };

        let result = match (op, ordering) {
            (_, None) => op == BinaryOp::NotEq,
            (BinaryOp::Eq, Some(o)) => o == Ordering::Equal,
            (BinaryOp::NotEq, Some(o)) => o != Ordering::Equal,
            (BinaryOp::Lt, Some(o)) => o == Ordering::Less,
            (BinaryOp::LtEq, Some(o)) => o != Ordering::Greater,
            (BinaryOp::Gt, Some(o)) => o == Ordering::Greater,
            (BinaryOp::GtEq, Some(o)) => o != Ordering::Less,
            _ => unreachable!("comparison op"),
        };
        out.push(result);
    }

    Ok(logical_result(out))
}

fn connective(op: BinaryOp, left: &EidosValue, right: &EidosValue) -> EidosResult<ValueRc> {
    let symbol = op_symbol(op);
    for operand in [left, right] {
        if !is_numeric_operand(operand.value_type()) {
            return Err(unsupported_operand(symbol, operand.value_type()));
        }
    }

    let count = broadcast_count(op, left, right)?;
    let (m, n) = (left.count(), right.count());
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let a = left.logical_coerced_at(i % m)?;
        let b = right.logical_coerced_at(i % n)?;
        out.push(if op == BinaryOp::And { a && b } else { a || b });
    }
    Ok(logical_result(out))
}

fn logical_result(values: Vec<bool>) -> ValueRc {
    if values.len() == 1 {
        pool::static_logical(values[0])
    } else {
        Rc::new(EidosValue::logical_vector(values))
    }
}

/// The sequence operator `a:b`: an integer vector from `a` to `b` inclusive,
/// stepping toward `b`. Endpoints must be finite numeric singletons and are
/// truncated to integers.
pub fn range(start: &EidosValue, end: &EidosValue) -> EidosResult<ValueRc> {
    for operand in [start, end] {
        if !matches!(
            operand.value_type(),
            ValueType::Integer | ValueType::Float
        ) {
            return Err(EidosError::type_error(
                SITE_RANGE,
                format!(
                    "operand type {} is not supported by the ':' operator.",
                    operand.value_type()
                ),
            ));
        }
        if operand.count() != 1 {
            return Err(EidosError::type_error(
                SITE_RANGE,
                "operands of the ':' operator must be singletons.",
            ));
        }
    }

    let a = start.float_at(0)?;
    let b = end.float_at(0)?;
    if !a.is_finite() || !b.is_finite() {
        return Err(EidosError::type_error(
            SITE_RANGE,
            "operands of the ':' operator must be finite.",
        ));
    }

    let a = a.trunc() as i64;
    let b = b.trunc() as i64;

    if a == b {
        return Ok(pool::static_integer(a).unwrap_or_else(|| Rc::new(EidosValue::integer(a))));
    }

    let mut out = Vec::with_capacity(a.abs_diff(b) as usize + 1);
    if a < b {
        let mut v = a;
        loop {
            out.push(v);
            if v == b {
                break;
            }
            v += 1;
        }
    } else {
        let mut v = a;
        loop {
            out.push(v);
            if v == b {
                break;
            }
            v -= 1;
        }
    }

    Ok(Rc::new(EidosValue::integer_vector(out)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_addition() {
        let a = EidosValue::integer_vector(vec![1, 2, 3]);
        let b = EidosValue::integer(10);
        let sum = binary_op(BinaryOp::Add, &a, &b).unwrap();
        assert_eq!(*sum, EidosValue::integer_vector(vec![11, 12, 13]));
    }

    #[test]
    fn test_length_mismatch() {
        let a = EidosValue::float_vector(vec![1.0, 2.0]);
        let b = EidosValue::float_vector(vec![10.0, 20.0, 30.0]);
        let err = binary_op(BinaryOp::Add, &a, &b).unwrap_err();
        assert!(matches!(err, EidosError::LengthMismatch { .. }));
    }

    #[test]
    fn test_division_is_always_float() {
        let a = EidosValue::integer(7);
        let b = EidosValue::integer(2);
        let q = binary_op(BinaryOp::Div, &a, &b).unwrap();
        assert_eq!(q.value_type(), ValueType::Float);
        assert_eq!(q.float_at(0).unwrap(), 3.5);
    }

    #[test]
    fn test_logical_promotes_in_arithmetic() {
        let t = EidosValue::logical(true);
        let one = EidosValue::integer(1);
        let sum = binary_op(BinaryOp::Add, &t, &one).unwrap();
        assert_eq!(*sum, EidosValue::integer(2));
    }

    #[test]
    fn test_string_concatenation() {
        let a = EidosValue::string_vector(vec!["a".into(), "b".into()]);
        let n = EidosValue::integer(1);
        let joined = binary_op(BinaryOp::Add, &a, &n).unwrap();
        assert_eq!(
            *joined,
            EidosValue::string_vector(vec!["a1".into(), "b1".into()])
        );
    }

    #[test]
    fn test_comparison_with_null_is_empty() {
        let a = EidosValue::integer(1);
        let result = binary_op(BinaryOp::Eq, &a, &EidosValue::null()).unwrap();
        assert_eq!(result.value_type(), ValueType::Logical);
        assert_eq!(result.count(), 0);
    }

    #[test]
    fn test_nan_comparisons_are_ieee() {
        let nan = EidosValue::float(f64::NAN);
        let eq = binary_op(BinaryOp::Eq, &nan, &nan).unwrap();
        assert_eq!(eq.logical_at(0).unwrap(), false);
        let ne = binary_op(BinaryOp::NotEq, &nan, &nan).unwrap();
        assert_eq!(ne.logical_at(0).unwrap(), true);
    }

    #[test]
    fn test_range_directions() {
        let up = range(&EidosValue::integer(1), &EidosValue::integer(5)).unwrap();
        assert_eq!(*up, EidosValue::integer_vector(vec![1, 2, 3, 4, 5]));

        let down = range(&EidosValue::integer(3), &EidosValue::integer(1)).unwrap();
        assert_eq!(*down, EidosValue::integer_vector(vec![3, 2, 1]));

        let single = range(&EidosValue::integer(4), &EidosValue::integer(4)).unwrap();
        assert_eq!(*single, EidosValue::integer(4));
    }

    #[test]
    fn test_range_rejects_non_finite() {
        assert!(range(&EidosValue::float(f64::NAN), &EidosValue::integer(1)).is_err());
        assert!(range(&EidosValue::float(f64::INFINITY), &EidosValue::integer(1)).is_err());
        assert!(range(&EidosValue::integer_vector(vec![1, 2]), &EidosValue::integer(3)).is_err());
    }

    #[test]
    fn test_mixed_string_comparison_promotes() {
        let n = EidosValue::integer_vector(vec![9, 10]);
        let s = EidosValue::string("10");
        let eq = binary_op(BinaryOp::Eq, &n, &s).unwrap();
        assert_eq!(*eq, EidosValue::logical_vector(vec![false, true]));
    }
}
