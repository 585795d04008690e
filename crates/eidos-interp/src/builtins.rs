//! The built-in function library and its registration into the immutable
//! function map computed at warmup.

use eidos_core::{
    compare_elements, define_constant_for_symbol, global_id_for_string, pool, CallContext,
    EidosError, EidosResult, EidosValue, FunctionMap, FunctionSignature, TypeMask, ValueRc,
    ValueType,
};
use std::cmp::Ordering;
use std::rc::Rc;

thread_local! {
    static BUILTIN_MAP: Rc<FunctionMap> = Rc::new(build_builtin_map());
}

/// The shared built-in function map; computed once and reused for every
/// interpreter on this thread.
pub fn builtin_function_map() -> Rc<FunctionMap> {
    BUILTIN_MAP.with(Rc::clone)
}

fn build_builtin_map() -> FunctionMap {
    let num = TypeMask::INTEGER | TypeMask::FLOAT;
    let lnum = TypeMask::LOGICAL | num;
    let lnum_s = lnum | TypeMask::STRING;
    let any = TypeMask::ANY;
    let int1 = TypeMask::INTEGER | TypeMask::SINGLETON;
    let num1 = num | TypeMask::SINGLETON;
    let str1 = TypeMask::STRING | TypeMask::SINGLETON;
    let log1 = TypeMask::LOGICAL | TypeMask::SINGLETON;

    let space = || Rc::new(EidosValue::string(" "));
    let null = pool::static_null;
    let false_v = || pool::static_logical(false);
    let true_v = || pool::static_logical(true);

    let mut map = FunctionMap::new();

    // math
    map.insert(FunctionSignature::builtin("abs", num, fn_abs).param("x", num));
    map.insert(FunctionSignature::builtin("acos", TypeMask::FLOAT, fn_acos).param("x", num));
    map.insert(FunctionSignature::builtin("asin", TypeMask::FLOAT, fn_asin).param("x", num));
    map.insert(FunctionSignature::builtin("atan", TypeMask::FLOAT, fn_atan).param("x", num));
    map.insert(
        FunctionSignature::builtin("atan2", TypeMask::FLOAT, fn_atan2)
            .param("x", num)
            .param("y", num),
    );
    map.insert(FunctionSignature::builtin("ceil", TypeMask::FLOAT, fn_ceil).param("x", num));
    map.insert(FunctionSignature::builtin("cos", TypeMask::FLOAT, fn_cos).param("x", num));
    map.insert(FunctionSignature::builtin("cumProduct", num, fn_cum_product).param("x", num));
    map.insert(FunctionSignature::builtin("cumSum", num, fn_cum_sum).param("x", num));
    map.insert(FunctionSignature::builtin("exp", TypeMask::FLOAT, fn_exp).param("x", num));
    map.insert(FunctionSignature::builtin("floor", TypeMask::FLOAT, fn_floor).param("x", num));
    map.insert(
        FunctionSignature::builtin("integerDiv", TypeMask::INTEGER, fn_integer_div)
            .param("x", TypeMask::INTEGER)
            .param("y", TypeMask::INTEGER),
    );
    map.insert(
        FunctionSignature::builtin("integerMod", TypeMask::INTEGER, fn_integer_mod)
            .param("x", TypeMask::INTEGER)
            .param("y", TypeMask::INTEGER),
    );
    map.insert(
        FunctionSignature::builtin("isFinite", TypeMask::LOGICAL, fn_is_finite).param("x", num),
    );
    map.insert(
        FunctionSignature::builtin("isInfinite", TypeMask::LOGICAL, fn_is_infinite)
            .param("x", num),
    );
    map.insert(FunctionSignature::builtin("isNAN", TypeMask::LOGICAL, fn_is_nan).param("x", num));
    map.insert(FunctionSignature::builtin("log", TypeMask::FLOAT, fn_log).param("x", num));
    map.insert(FunctionSignature::builtin("log10", TypeMask::FLOAT, fn_log10).param("x", num));
    map.insert(FunctionSignature::builtin("log2", TypeMask::FLOAT, fn_log2).param("x", num));
    map.insert(FunctionSignature::builtin("product", num, fn_product).param("x", lnum));
    map.insert(FunctionSignature::builtin("round", TypeMask::FLOAT, fn_round).param("x", num));
    map.insert(FunctionSignature::builtin("sin", TypeMask::FLOAT, fn_sin).param("x", num));
    map.insert(FunctionSignature::builtin("sqrt", TypeMask::FLOAT, fn_sqrt).param("x", num));
    map.insert(FunctionSignature::builtin("sum", num, fn_sum).param("x", lnum));
    map.insert(FunctionSignature::builtin("tan", TypeMask::FLOAT, fn_tan).param("x", num));
    map.insert(FunctionSignature::builtin("trunc", TypeMask::FLOAT, fn_trunc).param("x", num));

    // summary statistics
    map.insert(FunctionSignature::builtin("max", lnum_s, fn_max).param("x", lnum_s));
    map.insert(FunctionSignature::builtin("mean", TypeMask::FLOAT, fn_mean).param("x", lnum));
    map.insert(FunctionSignature::builtin("min", lnum_s, fn_min).param("x", lnum_s));
    map.insert(
        FunctionSignature::builtin("pmax", num, fn_pmax)
            .param("x", num)
            .param("y", num),
    );
    map.insert(
        FunctionSignature::builtin("pmin", num, fn_pmin)
            .param("x", num)
            .param("y", num),
    );
    map.insert(FunctionSignature::builtin("range", num, fn_range).param("x", lnum));
    map.insert(FunctionSignature::builtin("sd", TypeMask::FLOAT, fn_sd).param("x", lnum));

    // vector construction
    map.insert(FunctionSignature::builtin("c", any, fn_c).ellipsis(any));
    map.insert(FunctionSignature::builtin("float", TypeMask::FLOAT, fn_float).param("length", int1));
    map.insert(
        FunctionSignature::builtin("integer", TypeMask::INTEGER, fn_integer).param("length", int1),
    );
    map.insert(
        FunctionSignature::builtin("logical", TypeMask::LOGICAL, fn_logical).param("length", int1),
    );
    map.insert(
        FunctionSignature::builtin("rep", any, fn_rep)
            .param("x", any)
            .param("count", int1),
    );
    map.insert(
        FunctionSignature::builtin("repEach", any, fn_rep_each)
            .param("x", any)
            .param("count", int1),
    );
    map.insert(
        FunctionSignature::builtin("seq", num, fn_seq)
            .param("from", num1)
            .param("to", num1)
            .optional_param("by", num1 | TypeMask::NULL, null()),
    );
    map.insert(
        FunctionSignature::builtin("seqAlong", TypeMask::INTEGER, fn_seq_along).param("x", any),
    );
    map.insert(
        FunctionSignature::builtin("string", TypeMask::STRING, fn_string).param("length", int1),
    );

    // value inspection / manipulation
    map.insert(FunctionSignature::builtin("all", TypeMask::LOGICAL, fn_all).param("x", TypeMask::LOGICAL));
    map.insert(FunctionSignature::builtin("any", TypeMask::LOGICAL, fn_any).param("x", TypeMask::LOGICAL));
    map.insert(
        FunctionSignature::builtin("cat", TypeMask::NULL, fn_cat)
            .param("x", any)
            .optional_param("sep", str1, space()),
    );
    map.insert(
        FunctionSignature::builtin("identical", TypeMask::LOGICAL, fn_identical)
            .param("x", any)
            .param("y", any),
    );
    map.insert(
        FunctionSignature::builtin("ifelse", any, fn_ifelse)
            .param("test", TypeMask::LOGICAL)
            .param("trueValues", any)
            .param("falseValues", any),
    );
    map.insert(
        FunctionSignature::builtin("match", TypeMask::INTEGER, fn_match)
            .param("x", any)
            .param("table", any),
    );
    map.insert(
        FunctionSignature::builtin("nchar", TypeMask::INTEGER, fn_nchar).param("x", TypeMask::STRING),
    );
    map.insert(
        FunctionSignature::builtin("paste", TypeMask::STRING, fn_paste)
            .param("x", any)
            .optional_param("sep", str1, space()),
    );
    map.insert(FunctionSignature::builtin("print", TypeMask::NULL, fn_print).param("x", any));
    map.insert(FunctionSignature::builtin("rev", any, fn_rev).param("x", any));
    map.insert(FunctionSignature::builtin("size", TypeMask::INTEGER, fn_size).param("x", any));
    map.insert(
        FunctionSignature::builtin("sort", lnum_s, fn_sort)
            .param("x", lnum_s)
            .optional_param("ascending", log1, true_v()),
    );
    map.insert(FunctionSignature::builtin("str", TypeMask::NULL, fn_str).param("x", any));
    map.insert(
        FunctionSignature::builtin("strsplit", TypeMask::STRING, fn_strsplit)
            .param("x", str1)
            .optional_param("sep", str1, space()),
    );
    map.insert(
        FunctionSignature::builtin("substr", TypeMask::STRING, fn_substr)
            .param("x", TypeMask::STRING)
            .param("first", int1)
            .optional_param("last", int1 | TypeMask::NULL, null()),
    );
    map.insert(FunctionSignature::builtin("unique", any, fn_unique).param("x", any));
    map.insert(
        FunctionSignature::builtin("which", TypeMask::INTEGER, fn_which).param("x", TypeMask::LOGICAL),
    );
    map.insert(
        FunctionSignature::builtin("whichMax", TypeMask::INTEGER, fn_which_max).param("x", lnum_s),
    );
    map.insert(
        FunctionSignature::builtin("whichMin", TypeMask::INTEGER, fn_which_min).param("x", lnum_s),
    );

    // value type testing / coercion
    map.insert(FunctionSignature::builtin("asFloat", TypeMask::FLOAT, fn_as_float).param("x", lnum_s));
    map.insert(
        FunctionSignature::builtin("asInteger", TypeMask::INTEGER, fn_as_integer).param("x", lnum_s),
    );
    map.insert(
        FunctionSignature::builtin("asLogical", TypeMask::LOGICAL, fn_as_logical).param("x", lnum_s),
    );
    map.insert(
        FunctionSignature::builtin("asString", TypeMask::STRING, fn_as_string)
            .param("x", any),
    );
    map.insert(
        FunctionSignature::builtin("elementType", TypeMask::STRING, fn_element_type).param("x", any),
    );
    map.insert(FunctionSignature::builtin("isFloat", TypeMask::LOGICAL, fn_is_float).param("x", any));
    map.insert(
        FunctionSignature::builtin("isInteger", TypeMask::LOGICAL, fn_is_integer).param("x", any),
    );
    map.insert(
        FunctionSignature::builtin("isLogical", TypeMask::LOGICAL, fn_is_logical).param("x", any),
    );
    map.insert(FunctionSignature::builtin("isNULL", TypeMask::LOGICAL, fn_is_null).param("x", any));
    map.insert(FunctionSignature::builtin("isObject", TypeMask::LOGICAL, fn_is_object).param("x", any));
    map.insert(FunctionSignature::builtin("isString", TypeMask::LOGICAL, fn_is_string).param("x", any));

    // filesystem
    map.insert(
        FunctionSignature::builtin("filesAtPath", TypeMask::STRING, fn_files_at_path)
            .param("path", str1)
            .optional_param("fullPaths", log1, false_v()),
    );
    map.insert(
        FunctionSignature::builtin("readFile", TypeMask::STRING, fn_read_file).param("filePath", str1),
    );
    map.insert(
        FunctionSignature::builtin("writeFile", TypeMask::LOGICAL, fn_write_file)
            .param("filePath", str1)
            .param("contents", TypeMask::STRING)
            .optional_param("append", log1, false_v()),
    );

    // symbol-table utilities
    map.insert(
        FunctionSignature::builtin("defineConstant", TypeMask::NULL, fn_define_constant)
            .param("symbol", str1)
            .param("value", any),
    );
    map.insert(
        FunctionSignature::builtin("exists", TypeMask::LOGICAL, fn_exists).param("symbol", str1),
    );
    map.insert(FunctionSignature::builtin("ls", TypeMask::NULL, fn_ls));
    map.insert(
        FunctionSignature::builtin("rm", TypeMask::NULL, fn_rm)
            .optional_param("variableNames", TypeMask::STRING | TypeMask::NULL, null())
            .optional_param("removeConstants", log1, false_v()),
    );
    map.insert(
        FunctionSignature::builtin("stop", TypeMask::NULL, fn_stop)
            .optional_param("message", str1 | TypeMask::NULL, null()),
    );

    map
}

// result helpers

fn integer_result(values: Vec<i64>) -> ValueRc {
    if values.len() == 1 {
        Rc::new(EidosValue::integer(values[0]))
    } else {
        Rc::new(EidosValue::integer_vector(values))
    }
}

fn float_result(values: Vec<f64>) -> ValueRc {
    if values.len() == 1 {
        Rc::new(EidosValue::float(values[0]))
    } else {
        Rc::new(EidosValue::float_vector(values))
    }
}

fn logical_result(values: Vec<bool>) -> ValueRc {
    if values.len() == 1 {
        pool::static_logical(values[0])
    } else {
        Rc::new(EidosValue::logical_vector(values))
    }
}

fn string_result(values: Vec<String>) -> ValueRc {
    if values.len() == 1 {
        Rc::new(EidosValue::string(values.into_iter().next().unwrap_or_default()))
    } else {
        Rc::new(EidosValue::string_vector(values))
    }
}

fn map_float(x: &EidosValue, f: impl Fn(f64) -> f64) -> EidosResult<ValueRc> {
    let mut out = Vec::with_capacity(x.count());
    for i in 0..x.count() {
        out.push(f(x.float_at(i)?));
    }
    Ok(float_result(out))
}

fn broadcast_pair(
    site: &'static str,
    x: &EidosValue,
    y: &EidosValue,
) -> EidosResult<usize> {
    let (m, n) = (x.count(), y.count());
    if m == n || m == 1 || n == 1 {
        Ok(m.max(n))
    } else {
        Err(EidosError::length_mismatch(
            site,
            format!(
                "operands must be of equal length, or one must have length 1 ({} and {} supplied).",
                m, n
            ),
        ))
    }
}

// math

fn fn_abs(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    if x.value_type() == ValueType::Integer {
        let mut out = Vec::with_capacity(x.count());
        for i in 0..x.count() {
            out.push(x.integer_at(i)?.wrapping_abs());
        }
        Ok(integer_result(out))
    } else {
        map_float(x, f64::abs)
    }
}

fn fn_acos(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::acos)
}

fn fn_asin(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::asin)
}

fn fn_atan(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::atan)
}

fn fn_atan2(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let (x, y) = (&args[0], &args[1]);
    let count = broadcast_pair("Builtins::atan2", x, y)?;
    let (m, n) = (x.count(), y.count());
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        out.push(x.float_at(i % m)?.atan2(y.float_at(i % n)?));
    }
    Ok(float_result(out))
}

fn fn_ceil(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::ceil)
}

fn fn_cos(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::cos)
}

fn fn_cum_product(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    if x.value_type() == ValueType::Integer {
        let mut acc = 1i64;
        let mut out = Vec::with_capacity(x.count());
        for i in 0..x.count() {
            acc = acc.wrapping_mul(x.integer_at(i)?);
            out.push(acc);
        }
        Ok(integer_result(out))
    } else {
        let mut acc = 1.0f64;
        let mut out = Vec::with_capacity(x.count());
        for i in 0..x.count() {
            acc *= x.float_at(i)?;
            out.push(acc);
        }
        Ok(float_result(out))
    }
}

fn fn_cum_sum(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    if x.value_type() == ValueType::Integer {
        let mut acc = 0i64;
        let mut out = Vec::with_capacity(x.count());
        for i in 0..x.count() {
            acc = acc.wrapping_add(x.integer_at(i)?);
            out.push(acc);
        }
        Ok(integer_result(out))
    } else {
        let mut acc = 0.0f64;
        let mut out = Vec::with_capacity(x.count());
        for i in 0..x.count() {
            acc += x.float_at(i)?;
            out.push(acc);
        }
        Ok(float_result(out))
    }
}

fn fn_exp(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::exp)
}

fn fn_floor(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::floor)
}

fn fn_integer_div(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let (x, y) = (&args[0], &args[1]);
    let count = broadcast_pair("Builtins::integerDiv", x, y)?;
    let (m, n) = (x.count(), y.count());
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let divisor = y.integer_at(i % n)?;
        if divisor == 0 {
            return Err(EidosError::runtime(
                "Builtins::integerDiv",
                "integer divide by zero.",
            ));
        }
        out.push(x.integer_at(i % m)?.wrapping_div(divisor));
    }
    Ok(integer_result(out))
}

fn fn_integer_mod(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let (x, y) = (&args[0], &args[1]);
    let count = broadcast_pair("Builtins::integerMod", x, y)?;
    let (m, n) = (x.count(), y.count());
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let divisor = y.integer_at(i % n)?;
        if divisor == 0 {
            return Err(EidosError::runtime(
                "Builtins::integerMod",
                "integer modulo by zero.",
            ));
        }
        out.push(x.integer_at(i % m)?.wrapping_rem(divisor));
    }
    Ok(integer_result(out))
}

fn fn_is_finite(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    let mut out = Vec::with_capacity(x.count());
    for i in 0..x.count() {
        out.push(x.float_at(i)?.is_finite());
    }
    Ok(logical_result(out))
}

fn fn_is_infinite(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    let mut out = Vec::with_capacity(x.count());
    for i in 0..x.count() {
        out.push(x.float_at(i)?.is_infinite());
    }
    Ok(logical_result(out))
}

fn fn_is_nan(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    let mut out = Vec::with_capacity(x.count());
    for i in 0..x.count() {
        out.push(x.float_at(i)?.is_nan());
    }
    Ok(logical_result(out))
}

fn fn_log(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::ln)
}

fn fn_log10(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::log10)
}

fn fn_log2(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::log2)
}

fn fn_product(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    if matches!(x.value_type(), ValueType::Logical | ValueType::Integer) {
        let mut acc = 1i64;
        for i in 0..x.count() {
            acc = acc.wrapping_mul(x.integer_at(i)?);
        }
        Ok(integer_result(vec![acc]))
    } else {
        let mut acc = 1.0f64;
        for i in 0..x.count() {
            acc *= x.float_at(i)?;
        }
        Ok(float_result(vec![acc]))
    }
}

fn fn_round(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::round)
}

fn fn_sin(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::sin)
}

fn fn_sqrt(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::sqrt)
}

fn fn_sum(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    if matches!(x.value_type(), ValueType::Logical | ValueType::Integer) {
        let mut acc = 0i64;
        for i in 0..x.count() {
            acc = acc.wrapping_add(x.integer_at(i)?);
        }
        Ok(integer_result(vec![acc]))
    } else {
        let mut acc = 0.0f64;
        for i in 0..x.count() {
            acc += x.float_at(i)?;
        }
        Ok(float_result(vec![acc]))
    }
}

fn fn_tan(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::tan)
}

fn fn_trunc(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    map_float(&args[0], f64::trunc)
}

// summary statistics

fn extreme_index(x: &EidosValue, want_max: bool) -> EidosResult<Option<usize>> {
    if x.count() == 0 {
        return Ok(None);
    }
    let mut best = 0usize;
    for i in 1..x.count() {
        let ordering = compare_elements(x, i, x, best)?;
        let better = if want_max {
            ordering == Ordering::Greater
        } else {
            ordering == Ordering::Less
        };
        if better {
            best = i;
        }
    }
    Ok(Some(best))
}

fn fn_max(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    match extreme_index(&args[0], true)? {
        Some(index) => args[0].get_value_at_index(index),
        None => Ok(pool::static_null()),
    }
}

fn fn_min(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    match extreme_index(&args[0], false)? {
        Some(index) => args[0].get_value_at_index(index),
        None => Ok(pool::static_null()),
    }
}

fn fn_mean(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    if x.count() == 0 {
        return Ok(pool::static_null());
    }
    let mut acc = 0.0f64;
    for i in 0..x.count() {
        acc += x.float_at(i)?;
    }
    Ok(float_result(vec![acc / x.count() as f64]))
}

fn fn_pmax(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    pairwise_extreme("Builtins::pmax", &args[0], &args[1], true)
}

fn fn_pmin(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    pairwise_extreme("Builtins::pmin", &args[0], &args[1], false)
}

fn pairwise_extreme(
    site: &'static str,
    x: &EidosValue,
    y: &EidosValue,
    want_max: bool,
) -> EidosResult<ValueRc> {
    let count = broadcast_pair(site, x, y)?;
    let (m, n) = (x.count(), y.count());
    let float_result_needed =
        x.value_type() == ValueType::Float || y.value_type() == ValueType::Float;

    if float_result_needed {
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let a = x.float_at(i % m)?;
            let b = y.float_at(i % n)?;
            // NaN wins, matching elementwise float semantics elsewhere.
            let v = if a.is_nan() || b.is_nan() {
                f64::NAN
            } else if (a > b) == want_max {
                a
            } else {
                b
            };
            out.push(v);
        }
        Ok(float_result(out))
    } else {
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let a = x.integer_at(i % m)?;
            let b = y.integer_at(i % n)?;
            out.push(if (a > b) == want_max { a } else { b });
        }
        Ok(integer_result(out))
    }
}

fn fn_range(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    if x.count() == 0 {
        return Ok(pool::static_null());
    }
    let low = extreme_index(x, false)?.unwrap_or(0);
    let high = extreme_index(x, true)?.unwrap_or(0);
    Ok(Rc::new(x.select_indices(&[low, high])?))
}

fn fn_sd(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    let n = x.count();
    if n < 2 {
        return Ok(pool::static_null());
    }
    let mut mean = 0.0f64;
    for i in 0..n {
        mean += x.float_at(i)?;
    }
    mean /= n as f64;
    let mut ss = 0.0f64;
    for i in 0..n {
        let d = x.float_at(i)? - mean;
        ss += d * d;
    }
    Ok(float_result(vec![(ss / (n as f64 - 1.0)).sqrt()]))
}

// vector construction

fn fn_c(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let mut acc = EidosValue::null();
    for arg in &args {
        acc.append_from(arg)?;
    }
    if acc.is_null() {
        return Ok(pool::static_null());
    }
    Ok(Rc::new(acc))
}

fn zero_length(site: &'static str, value: &EidosValue) -> EidosResult<usize> {
    let n = value.integer_at(0)?;
    if n < 0 {
        return Err(EidosError::runtime(
            site,
            format!("requested length {} is negative.", n),
        ));
    }
    Ok(n as usize)
}

fn fn_float(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let n = zero_length("Builtins::float", &args[0])?;
    Ok(Rc::new(EidosValue::float_vector(vec![0.0; n])))
}

fn fn_integer(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let n = zero_length("Builtins::integer", &args[0])?;
    Ok(Rc::new(EidosValue::integer_vector(vec![0; n])))
}

fn fn_logical(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let n = zero_length("Builtins::logical", &args[0])?;
    Ok(Rc::new(EidosValue::logical_vector(vec![false; n])))
}

fn fn_string(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let n = zero_length("Builtins::string", &args[0])?;
    Ok(Rc::new(EidosValue::string_vector(vec![String::new(); n])))
}

fn fn_rep(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    let count = zero_length("Builtins::rep", &args[1])?;
    if x.is_null() {
        return Ok(pool::static_null());
    }
    let n = x.count();
    let mut indices = Vec::with_capacity(n * count);
    for _ in 0..count {
        indices.extend(0..n);
    }
    Ok(Rc::new(x.select_indices(&indices)?))
}

fn fn_rep_each(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    let count = zero_length("Builtins::repEach", &args[1])?;
    if x.is_null() {
        return Ok(pool::static_null());
    }
    let n = x.count();
    let mut indices = Vec::with_capacity(n * count);
    for i in 0..n {
        for _ in 0..count {
            indices.push(i);
        }
    }
    Ok(Rc::new(x.select_indices(&indices)?))
}

fn fn_seq(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    const SITE: &str = "Builtins::seq";
    let (from, to, by) = (&args[0], &args[1], &args[2]);

    let integer_sequence = from.value_type() == ValueType::Integer
        && to.value_type() == ValueType::Integer
        && (by.is_null() || by.value_type() == ValueType::Integer);

    if integer_sequence {
        let from = from.integer_at(0)?;
        let to = to.integer_at(0)?;
        let step = if by.is_null() {
            if to >= from { 1 } else { -1 }
        } else {
            by.integer_at(0)?
        };
        if step == 0 {
            return Err(EidosError::runtime(SITE, "by must not be zero."));
        }
        if (to > from && step < 0) || (to < from && step > 0) {
            return Err(EidosError::runtime(SITE, "by has incorrect sign."));
        }
        let mut out = Vec::new();
        let mut v = from;
        if step > 0 {
            while v <= to {
                out.push(v);
                v = match v.checked_add(step) {
                    Some(next) => next,
                    None => break,
                };
            }
        } else {
            while v >= to {
                out.push(v);
                v = match v.checked_add(step) {
                    Some(next) => next,
                    None => break,
                };
            }
        }
        return Ok(integer_result(out));
    }

    let from = from.float_at(0)?;
    let to = to.float_at(0)?;
    let step = if by.is_null() {
        if to >= from { 1.0 } else { -1.0 }
    } else {
        by.float_at(0)?
    };
    if !from.is_finite() || !to.is_finite() || !step.is_finite() {
        return Err(EidosError::runtime(SITE, "operands must be finite."));
    }
    if step == 0.0 {
        return Err(EidosError::runtime(SITE, "by must not be zero."));
    }
    if (to > from && step < 0.0) || (to < from && step > 0.0) {
        return Err(EidosError::runtime(SITE, "by has incorrect sign."));
    }

    let length = ((to - from) / step).floor() as i64;
    let mut out = Vec::with_capacity(length.max(0) as usize + 1);
    for k in 0..=length.max(0) {
        out.push(from + k as f64 * step);
    }
    Ok(float_result(out))
}

fn fn_seq_along(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let n = args[0].count();
    if n == 0 {
        return Ok(pool::static_empty_integer());
    }
    Ok(integer_result((0..n as i64).collect()))
}

// value inspection / manipulation

fn fn_all(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    for i in 0..x.count() {
        if !x.logical_at(i)? {
            return Ok(pool::static_logical(false));
        }
    }
    Ok(pool::static_logical(true))
}

fn fn_any(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    for i in 0..x.count() {
        if x.logical_at(i)? {
            return Ok(pool::static_logical(true));
        }
    }
    Ok(pool::static_logical(false))
}

fn joined_elements(x: &EidosValue, sep: &str) -> EidosResult<String> {
    let mut out = String::new();
    for i in 0..x.count() {
        if i > 0 {
            out.push_str(sep);
        }
        out.push_str(&x.element_display(i)?);
    }
    Ok(out)
}

fn fn_cat(ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let sep = args[1].string_at(0)?.to_string();
    let text = joined_elements(&args[0], &sep)?;
    ctx.output().push_str(&text);
    Ok(pool::static_null_invisible())
}

fn fn_identical(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let (x, y) = (&args[0], &args[1]);
    Ok(pool::static_logical(values_identical(x, y)?))
}

fn values_identical(x: &EidosValue, y: &EidosValue) -> EidosResult<bool> {
    if x.value_type() != y.value_type() || x.count() != y.count() {
        return Ok(false);
    }
    if x.value_type() == ValueType::Object {
        for i in 0..x.count() {
            if !Rc::ptr_eq(&x.object_at(i)?, &y.object_at(i)?) {
                return Ok(false);
            }
        }
        return Ok(true);
    }
    if x.value_type() == ValueType::Null {
        return Ok(true);
    }
    for i in 0..x.count() {
        if compare_elements(x, i, y, i)? != Ordering::Equal {
            return Ok(false);
        }
    }
    Ok(true)
}

fn fn_ifelse(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    const SITE: &str = "Builtins::ifelse";
    let (test, true_values, false_values) = (&args[0], &args[1], &args[2]);

    if true_values.value_type() != false_values.value_type() {
        return Err(EidosError::type_error(
            SITE,
            format!(
                "trueValues and falseValues must be of the same type ({} and {} supplied).",
                true_values.value_type(),
                false_values.value_type()
            ),
        ));
    }

    let count = test.count();
    for operand in [true_values, false_values] {
        if operand.count() != 1 && operand.count() != count {
            return Err(EidosError::length_mismatch(
                SITE,
                format!(
                    "trueValues and falseValues must have length 1 or the length of test ({}).",
                    count
                ),
            ));
        }
    }

    let mut acc = EidosValue::null();
    for i in 0..count {
        let source = if test.logical_at(i)? {
            true_values
        } else {
            false_values
        };
        let index = if source.count() == 1 { 0 } else { i };
        let element = source.get_value_at_index(index)?;
        acc.append_from(&element)?;
    }
    if acc.is_null() {
        return Ok(pool::static_null());
    }
    Ok(Rc::new(acc))
}

fn fn_match(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let (x, table) = (&args[0], &args[1]);
    let objects = x.value_type() == ValueType::Object && table.value_type() == ValueType::Object;

    let mut out = Vec::with_capacity(x.count());
    for i in 0..x.count() {
        let mut position = -1i64;
        for j in 0..table.count() {
            let hit = if objects {
                Rc::ptr_eq(&x.object_at(i)?, &table.object_at(j)?)
            } else {
                compare_elements(x, i, table, j)? == Ordering::Equal
            };
            if hit {
                position = j as i64;
                break;
            }
        }
        out.push(position);
    }
    Ok(integer_result(out))
}

fn fn_nchar(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    let mut out = Vec::with_capacity(x.count());
    for i in 0..x.count() {
        out.push(x.string_at(i)?.chars().count() as i64);
    }
    Ok(integer_result(out))
}

fn fn_paste(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let sep = args[1].string_at(0)?.to_string();
    let text = joined_elements(&args[0], &sep)?;
    Ok(Rc::new(EidosValue::string(text)))
}

fn fn_print(ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let text = format!("{}\n", args[0]);
    ctx.output().push_str(&text);
    Ok(pool::static_null_invisible())
}

fn fn_rev(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    if x.is_null() {
        return Ok(pool::static_null());
    }
    let indices: Vec<usize> = (0..x.count()).rev().collect();
    Ok(Rc::new(x.select_indices(&indices)?))
}

fn fn_size(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    Ok(integer_result(vec![args[0].count() as i64]))
}

fn fn_sort(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    let ascending = args[1].logical_at(0)?;

    let mut indices: Vec<usize> = (0..x.count()).collect();
    indices.sort_by(|&a, &b| {
        let ordering = compare_elements(x, a, x, b).unwrap_or(Ordering::Equal);
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
    Ok(Rc::new(x.select_indices(&indices)?))
}

fn fn_str(ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    let count = x.count();
    let mut line = format!("({}) ", x.element_type_name());

    if count <= 2 {
        line.push_str(&format!("{}", x));
    } else {
        let first = x.get_value_at_index(0)?;
        let second = x.get_value_at_index(1)?;
        line.push_str(&format!("{} {} ... ({} values)", first, second, count));
    }
    line.push('\n');
    ctx.output().push_str(&line);
    Ok(pool::static_null_invisible())
}

fn fn_strsplit(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = args[0].string_at(0)?;
    let sep = args[1].string_at(0)?;
    if sep.is_empty() {
        return Err(EidosError::runtime(
            "Builtins::strsplit",
            "sep must not be the empty string.",
        ));
    }
    let parts: Vec<String> = x.split(sep).map(str::to_string).collect();
    Ok(Rc::new(EidosValue::string_vector(parts)))
}

fn fn_substr(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    let first = args[1].integer_at(0)?.max(0) as usize;
    let last = if args[2].is_null() {
        usize::MAX
    } else {
        let last = args[2].integer_at(0)?;
        if last < 0 {
            0
        } else {
            last as usize
        }
    };

    let mut out = Vec::with_capacity(x.count());
    for i in 0..x.count() {
        let chars: Vec<char> = x.string_at(i)?.chars().collect();
        if first >= chars.len() || last < first {
            out.push(String::new());
        } else {
            let end = last.min(chars.len() - 1);
            out.push(chars[first..=end].iter().collect());
        }
    }
    Ok(string_result(out))
}

fn fn_unique(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    if x.is_null() {
        return Ok(pool::static_null());
    }

    let objects = x.value_type() == ValueType::Object;
    let mut kept: Vec<usize> = Vec::new();
    for i in 0..x.count() {
        let mut seen = false;
        for &j in &kept {
            let hit = if objects {
                Rc::ptr_eq(&x.object_at(i)?, &x.object_at(j)?)
            } else {
                compare_elements(x, i, x, j)? == Ordering::Equal
            };
            if hit {
                seen = true;
                break;
            }
        }
        if !seen {
            kept.push(i);
        }
    }
    Ok(Rc::new(x.select_indices(&kept)?))
}

fn fn_which(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    let mut out = Vec::new();
    for i in 0..x.count() {
        if x.logical_at(i)? {
            out.push(i as i64);
        }
    }
    if out.is_empty() {
        return Ok(pool::static_empty_integer());
    }
    Ok(integer_result(out))
}

fn fn_which_max(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    match extreme_index(&args[0], true)? {
        Some(index) => Ok(integer_result(vec![index as i64])),
        None => Ok(pool::static_null()),
    }
}

fn fn_which_min(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    match extreme_index(&args[0], false)? {
        Some(index) => Ok(integer_result(vec![index as i64])),
        None => Ok(pool::static_null()),
    }
}

// value type testing / coercion

fn fn_as_float(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    let mut out = Vec::with_capacity(x.count());
    for i in 0..x.count() {
        let v = if x.value_type() == ValueType::String {
            let s = x.string_at(i)?;
            s.parse::<f64>().map_err(|_| {
                EidosError::type_error(
                    "Builtins::asFloat",
                    format!("\"{}\" could not be represented as a float.", s),
                )
            })?
        } else {
            x.float_at(i)?
        };
        out.push(v);
    }
    Ok(float_result(out))
}

fn fn_as_integer(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    const SITE: &str = "Builtins::asInteger";
    let x = &args[0];
    let mut out = Vec::with_capacity(x.count());
    for i in 0..x.count() {
        let v = match x.value_type() {
            ValueType::String => {
                let s = x.string_at(i)?;
                s.parse::<i64>().map_err(|_| {
                    EidosError::type_error(
                        SITE,
                        format!("\"{}\" could not be represented as an integer.", s),
                    )
                })?
            }
            ValueType::Float => {
                let f = x.float_at(i)?;
                if !f.is_finite() {
                    return Err(EidosError::type_error(
                        SITE,
                        "a non-finite float cannot be converted to integer.",
                    ));
                }
                f.trunc() as i64
            }
            _ => x.integer_at(i)?,
        };
        out.push(v);
    }
    Ok(integer_result(out))
}

fn fn_as_logical(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    const SITE: &str = "Builtins::asLogical";
    let x = &args[0];
    let mut out = Vec::with_capacity(x.count());
    for i in 0..x.count() {
        let v = if x.value_type() == ValueType::String {
            match x.string_at(i)? {
                "T" | "TRUE" | "true" => true,
                "F" | "FALSE" | "false" => false,
                s => {
                    return Err(EidosError::type_error(
                        SITE,
                        format!("\"{}\" could not be represented as a logical.", s),
                    ));
                }
            }
        } else {
            x.logical_coerced_at(i)?
        };
        out.push(v);
    }
    Ok(logical_result(out))
}

fn fn_as_string(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let x = &args[0];
    if x.is_null() {
        return Ok(Rc::new(EidosValue::string("NULL")));
    }
    let mut out = Vec::with_capacity(x.count());
    for i in 0..x.count() {
        out.push(x.element_display(i)?);
    }
    Ok(string_result(out))
}

fn fn_element_type(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    Ok(Rc::new(EidosValue::string(args[0].element_type_name())))
}

fn fn_is_float(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    Ok(pool::static_logical(args[0].value_type() == ValueType::Float))
}

fn fn_is_integer(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    Ok(pool::static_logical(args[0].value_type() == ValueType::Integer))
}

fn fn_is_logical(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    Ok(pool::static_logical(args[0].value_type() == ValueType::Logical))
}

fn fn_is_null(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    Ok(pool::static_logical(args[0].is_null()))
}

fn fn_is_object(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    Ok(pool::static_logical(args[0].value_type() == ValueType::Object))
}

fn fn_is_string(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    Ok(pool::static_logical(args[0].value_type() == ValueType::String))
}

// filesystem

fn fn_files_at_path(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let path = args[0].string_at(0)?;
    let full_paths = args[1].logical_at(0)?;

    let mut names = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        if full_paths {
            names.push(entry.path().to_string_lossy().to_string());
        } else {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(Rc::new(EidosValue::string_vector(names)))
}

fn fn_read_file(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let path = args[0].string_at(0)?;
    let contents = std::fs::read_to_string(path)?;
    let lines: Vec<String> = contents.lines().map(str::to_string).collect();
    Ok(Rc::new(EidosValue::string_vector(lines)))
}

fn fn_write_file(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    use std::io::Write;

    let path = args[0].string_at(0)?;
    let contents = &args[1];
    let append = args[2].logical_at(0)?;

    let mut text = String::new();
    for i in 0..contents.count() {
        text.push_str(contents.string_at(i)?);
        text.push('\n');
    }

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    file.write_all(text.as_bytes())?;
    Ok(pool::static_logical(true))
}

// symbol-table utilities

fn fn_define_constant(ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let name = args[0].string_at(0)?.to_string();
    let id = global_id_for_string(&name);
    let symbols = ctx.symbols();
    define_constant_for_symbol(&symbols, id, Rc::clone(&args[1]))?;
    Ok(pool::static_null_invisible())
}

fn fn_exists(ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let name = args[0].string_at(0)?.to_string();
    let id = global_id_for_string(&name);
    let symbols = ctx.symbols();
    let found = symbols.borrow().contains_symbol(id);
    Ok(pool::static_logical(found))
}

fn fn_ls(ctx: &mut dyn CallContext, _args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let symbols = ctx.symbols();
    let mut names: Vec<String> = symbols
        .borrow()
        .symbol_names(false, true)
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    names.sort();

    let mut listing = String::new();
    for name in names {
        let id = global_id_for_string(&name);
        let value = symbols.borrow().get_value(id)?;
        let count = value.count();
        if count <= 2 {
            listing.push_str(&format!(
                "{} -> ({}) {}\n",
                name,
                value.element_type_name(),
                value
            ));
        } else {
            let first = value.get_value_at_index(0)?;
            let second = value.get_value_at_index(1)?;
            listing.push_str(&format!(
                "{} -> ({}) {} {} ... ({} values)\n",
                name,
                value.element_type_name(),
                first,
                second,
                count
            ));
        }
    }
    ctx.output().push_str(&listing);
    Ok(pool::static_null_invisible())
}

fn fn_rm(ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let symbols = ctx.symbols();
    let remove_constants = args[1].logical_at(0)?;

    let names: Vec<String> = if args[0].is_null() {
        symbols
            .borrow()
            .symbol_names(false, true)
            .into_iter()
            .map(|n| n.to_string())
            .collect()
    } else {
        let mut names = Vec::with_capacity(args[0].count());
        for i in 0..args[0].count() {
            names.push(args[0].string_at(i)?.to_string());
        }
        names
    };

    for name in names {
        let id = global_id_for_string(&name);
        symbols.borrow_mut().remove_symbol(id, remove_constants)?;
    }
    Ok(pool::static_null_invisible())
}

fn fn_stop(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
    let message = if args[0].is_null() {
        "stop() called.".to_string()
    } else {
        args[0].string_at(0)?.to_string()
    };
    Err(EidosError::runtime("Builtins::stop", message))
}
