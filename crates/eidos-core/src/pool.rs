//! Shared-ownership plumbing for runtime values.
//!
//! Values are handed around as `Rc<EidosValue>`; the `Rc` strong count is the
//! intrusive reference count, `Rc::strong_count(v) == 1` is the unique-
//! ownership test that gates in-place mutation, and `Rc::make_mut` performs
//! copy-on-write reification. A closed set of canonical values is allocated
//! once per thread and shared for the life of the process; the registry keeps
//! a reference to each, so they are never uniquely owned and can never be
//! mutated in place by any holder.

use crate::value::EidosValue;
use std::rc::Rc;

pub type ValueRc = Rc<EidosValue>;

/// True when `value` has no other holder and may be mutated in place.
pub fn is_unique(value: &ValueRc) -> bool {
    Rc::strong_count(value) == 1
}

struct StaticValues {
    null: ValueRc,
    null_invisible: ValueRc,
    logical_true: ValueRc,
    logical_false: ValueRc,
    integer_0: ValueRc,
    integer_1: ValueRc,
    float_0: ValueRc,
    float_0_5: ValueRc,
    float_1: ValueRc,
    float_inf: ValueRc,
    empty_logical: ValueRc,
    empty_integer: ValueRc,
    empty_float: ValueRc,
    empty_string: ValueRc,
}

impl StaticValues {
    fn new() -> Self {
        Self {
            null: Rc::new(EidosValue::null()),
            null_invisible: Rc::new(EidosValue::null_invisible()),
            logical_true: Rc::new(EidosValue::logical(true)),
            logical_false: Rc::new(EidosValue::logical(false)),
            integer_0: Rc::new(EidosValue::integer(0)),
            integer_1: Rc::new(EidosValue::integer(1)),
            float_0: Rc::new(EidosValue::float(0.0)),
            float_0_5: Rc::new(EidosValue::float(0.5)),
            float_1: Rc::new(EidosValue::float(1.0)),
            float_inf: Rc::new(EidosValue::float(f64::INFINITY)),
            empty_logical: Rc::new(EidosValue::logical_vector(Vec::new())),
            empty_integer: Rc::new(EidosValue::integer_vector(Vec::new())),
            empty_float: Rc::new(EidosValue::float_vector(Vec::new())),
            empty_string: Rc::new(EidosValue::string_vector(Vec::new())),
        }
    }
}

thread_local! {
    static STATIC_VALUES: StaticValues = StaticValues::new();
}

pub fn static_null() -> ValueRc {
    STATIC_VALUES.with(|s| Rc::clone(&s.null))
}

pub fn static_null_invisible() -> ValueRc {
    STATIC_VALUES.with(|s| Rc::clone(&s.null_invisible))
}

pub fn static_logical(value: bool) -> ValueRc {
    STATIC_VALUES.with(|s| {
        if value {
            Rc::clone(&s.logical_true)
        } else {
            Rc::clone(&s.logical_false)
        }
    })
}

/// The canonical instance for integer 0 or 1, if `value` is one of them.
pub fn static_integer(value: i64) -> Option<ValueRc> {
    STATIC_VALUES.with(|s| match value {
        0 => Some(Rc::clone(&s.integer_0)),
        1 => Some(Rc::clone(&s.integer_1)),
        _ => None,
    })
}

/// The canonical instance for float 0.0, 0.5, 1.0, or +INF, if `value` is
/// one of them.
pub fn static_float(value: f64) -> Option<ValueRc> {
    STATIC_VALUES.with(|s| {
        if value == 0.0 && value.is_sign_positive() {
            Some(Rc::clone(&s.float_0))
        } else if value == 0.5 {
            Some(Rc::clone(&s.float_0_5))
        } else if value == 1.0 {
            Some(Rc::clone(&s.float_1))
        } else if value == f64::INFINITY {
            Some(Rc::clone(&s.float_inf))
        } else {
            None
        }
    })
}

pub fn static_empty_logical() -> ValueRc {
    STATIC_VALUES.with(|s| Rc::clone(&s.empty_logical))
}

pub fn static_empty_integer() -> ValueRc {
    STATIC_VALUES.with(|s| Rc::clone(&s.empty_integer))
}

pub fn static_empty_float() -> ValueRc {
    STATIC_VALUES.with(|s| Rc::clone(&s.empty_float))
}

pub fn static_empty_string() -> ValueRc {
    STATIC_VALUES.with(|s| Rc::clone(&s.empty_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statics_are_shared_instances() {
        let a = static_logical(true);
        let b = static_logical(true);
        assert!(Rc::ptr_eq(&a, &b));
        assert!(!is_unique(&a));

        let z = static_integer(0).unwrap();
        let z2 = static_integer(0).unwrap();
        assert!(Rc::ptr_eq(&z, &z2));

        assert!(static_integer(2).is_none());
        assert!(static_float(0.25).is_none());
        assert!(static_float(-0.0).is_none());
    }

    #[test]
    fn test_invisible_null_is_distinct() {
        let plain = static_null();
        let invisible = static_null_invisible();
        assert!(!Rc::ptr_eq(&plain, &invisible));
        assert!(!plain.is_invisible());
        assert!(invisible.is_invisible());
    }

    #[test]
    fn test_fresh_values_are_unique() {
        let v = Rc::new(EidosValue::integer(41));
        assert!(is_unique(&v));
        let _second = Rc::clone(&v);
        assert!(!is_unique(&v));
    }
}
