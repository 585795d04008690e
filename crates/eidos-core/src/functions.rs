use crate::error::{EidosError, EidosResult};
use crate::pool::ValueRc;
use crate::symbols::ScopeRef;
use crate::value::TypeMask;
use rustc_hash::FxHashMap;
use std::rc::Rc;
use std::sync::Arc;

const SITE_DISPATCH: &str = "FunctionMap::dispatch";

/// What a function or method implementation can reach at call time: the
/// active variables scope and the interpreter's execution output stream.
/// The interpreter implements this.
pub trait CallContext {
    fn symbols(&self) -> ScopeRef;
    fn output(&mut self) -> &mut String;
}

/// A built-in implementation: a plain function pointer into this crate
/// family.
pub type BuiltinFn = fn(&mut dyn CallContext, Vec<ValueRc>) -> EidosResult<ValueRc>;

/// A Context-supplied implementation, registered by the embedding host.
pub type DelegateFn = Rc<dyn Fn(&mut dyn CallContext, Vec<ValueRc>) -> EidosResult<ValueRc>>;

#[derive(Clone)]
pub enum FunctionImpl {
    Builtin(BuiltinFn),
    Delegate(DelegateFn),
}

impl std::fmt::Debug for FunctionImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionImpl::Builtin(_) => f.write_str("FunctionImpl::Builtin"),
            FunctionImpl::Delegate(_) => f.write_str("FunctionImpl::Delegate"),
        }
    }
}

/// One formal argument: a type mask, a name for keyword matching, and an
/// optional default for arguments the caller may omit.
#[derive(Debug, Clone)]
pub struct ParamSignature {
    pub name: Arc<String>,
    pub mask: TypeMask,
    pub default: Option<ValueRc>,
}

/// A callable's full signature: name, return mask, ordered formals, and the
/// implementation to invoke once arguments have been matched.
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub name: Arc<String>,
    pub return_mask: TypeMask,
    pub params: Vec<ParamSignature>,
    pub implementation: FunctionImpl,
}

impl FunctionSignature {
    pub fn new(name: &str, return_mask: TypeMask, implementation: FunctionImpl) -> Self {
        Self {
            name: Arc::new(name.to_string()),
            return_mask,
            params: Vec::new(),
            implementation,
        }
    }

    pub fn builtin(name: &str, return_mask: TypeMask, body: BuiltinFn) -> Self {
        Self::new(name, return_mask, FunctionImpl::Builtin(body))
    }

    pub fn delegate(name: &str, return_mask: TypeMask, body: DelegateFn) -> Self {
        Self::new(name, return_mask, FunctionImpl::Delegate(body))
    }

    /// Add a required parameter.
    pub fn param(mut self, name: &str, mask: TypeMask) -> Self {
        self.params.push(ParamSignature {
            name: Arc::new(name.to_string()),
            mask,
            default: None,
        });
        self
    }

    /// Add an optional parameter with a default used when the caller omits
    /// it.
    pub fn optional_param(mut self, name: &str, mask: TypeMask, default: ValueRc) -> Self {
        self.params.push(ParamSignature {
            name: Arc::new(name.to_string()),
            mask: mask | TypeMask::OPTIONAL,
            default: Some(default),
        });
        self
    }

    /// A variadic trailing parameter: any number of additional arguments,
    /// each checked against `mask`. Only legal as the final formal.
    pub fn ellipsis(mut self, mask: TypeMask) -> Self {
        self.params.push(ParamSignature {
            name: Arc::new("...".to_string()),
            mask: mask | TypeMask::OPTIONAL,
            default: None,
        });
        self
    }

    fn is_ellipsis(param: &ParamSignature) -> bool {
        param.name.as_str() == "..."
    }

    /// Match positional and keyword arguments against the formals, fill
    /// defaults, and enforce type masks. Returns the final argument vector
    /// handed to the implementation; for an ellipsis signature the extra
    /// arguments follow the named ones in caller order.
    pub fn match_arguments(
        &self,
        supplied: Vec<(Option<Arc<String>>, ValueRc)>,
    ) -> EidosResult<Vec<ValueRc>> {
        let has_ellipsis = self.params.last().map(Self::is_ellipsis).unwrap_or(false);
        let named_count = if has_ellipsis {
            self.params.len() - 1
        } else {
            self.params.len()
        };

        let mut slots: Vec<Option<ValueRc>> = vec![None; named_count];
        let mut extra: Vec<ValueRc> = Vec::new();
        let mut next_positional = 0usize;

        for (keyword, value) in supplied {
            match keyword {
                Some(name) => {
                    let index = self.params[..named_count]
                        .iter()
                        .position(|p| p.name == name)
                        .ok_or_else(|| {
                            EidosError::type_error(
                                SITE_DISPATCH,
                                format!(
                                    "function {}() has no parameter named '{}'.",
                                    self.name, name
                                ),
                            )
                        })?;
                    if slots[index].is_some() {
                        return Err(EidosError::type_error(
                            SITE_DISPATCH,
                            format!(
                                "parameter '{}' of function {}() was supplied more than once.",
                                name, self.name
                            ),
                        ));
                    }
                    slots[index] = Some(value);
                    // Keyword arguments end positional matching.
                    next_positional = named_count;
                }
                None => {
                    while next_positional < named_count && slots[next_positional].is_some() {
                        next_positional += 1;
                    }
                    if next_positional < named_count {
                        slots[next_positional] = Some(value);
                        next_positional += 1;
                    } else if has_ellipsis {
                        extra.push(value);
                    } else {
                        return Err(EidosError::type_error(
                            SITE_DISPATCH,
                            format!(
                                "too many arguments supplied to function {}() ({} expected).",
                                self.name, named_count
                            ),
                        ));
                    }
                }
            }
        }

        let mut finished = Vec::with_capacity(named_count + extra.len());
        for (param, slot) in self.params[..named_count].iter().zip(slots) {
            let value = match slot {
                Some(value) => value,
                None => match &param.default {
                    Some(default) => Rc::clone(default),
                    None => {
                        return Err(EidosError::type_error(
                            SITE_DISPATCH,
                            format!(
                                "missing required argument '{}' to function {}().",
                                param.name, self.name
                            ),
                        ));
                    }
                },
            };

            if !param.mask.accepts(&value) {
                return Err(EidosError::type_error(
                    SITE_DISPATCH,
                    format!(
                        "argument '{}' of function {}() requires {}{}, but a {} value with {} elements was supplied.",
                        param.name,
                        self.name,
                        param.mask.type_list(),
                        if param.mask.requires_singleton() { " (singleton)" } else { "" },
                        value.value_type(),
                        value.count()
                    ),
                ));
            }
            finished.push(value);
        }

        if has_ellipsis {
            let mask = &self.params[named_count].mask;
            for value in &extra {
                if !mask.accepts(value) {
                    return Err(EidosError::type_error(
                        SITE_DISPATCH,
                        format!(
                            "argument to ... of function {}() requires {}, but a {} value was supplied.",
                            self.name,
                            mask.type_list(),
                            value.value_type()
                        ),
                    ));
                }
            }
            finished.extend(extra);
        }

        Ok(finished)
    }
}

/// An immutable mapping from function name to signature. The built-in map is
/// computed once at warmup; the embedding Context layers its own entries on
/// top with `with_delegates`.
#[derive(Debug, Clone, Default)]
pub struct FunctionMap {
    map: FxHashMap<String, Rc<FunctionSignature>>,
}

impl FunctionMap {
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, signature: FunctionSignature) {
        self.map
            .insert(signature.name.to_string(), Rc::new(signature));
    }

    pub fn get(&self, name: &str) -> Option<Rc<FunctionSignature>> {
        self.map.get(name).map(Rc::clone)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// A new map with all of this map's entries plus the supplied Context
    /// extensions layered on top (same-name entries shadow).
    pub fn with_delegates(
        &self,
        extensions: impl IntoIterator<Item = FunctionSignature>,
    ) -> FunctionMap {
        let mut extended = self.clone();
        for signature in extensions {
            extended.insert(signature);
        }
        extended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool;
    use crate::value::EidosValue;

    fn nop(_ctx: &mut dyn CallContext, args: Vec<ValueRc>) -> EidosResult<ValueRc> {
        Ok(args.into_iter().next().unwrap_or_else(pool::static_null))
    }

    fn sig() -> FunctionSignature {
        FunctionSignature::builtin("probe", TypeMask::ANY, nop)
            .param("x", TypeMask::INTEGER | TypeMask::FLOAT)
            .optional_param("digits", TypeMask::INTEGER | TypeMask::SINGLETON, pool::static_integer(0).unwrap())
    }

    #[test]
    fn test_positional_and_default() {
        let matched = sig()
            .match_arguments(vec![(None, Rc::new(EidosValue::float(2.5)))])
            .unwrap();
        assert_eq!(matched.len(), 2);
        assert_eq!(*matched[1], EidosValue::integer(0));
    }

    #[test]
    fn test_keyword_matching() {
        let matched = sig()
            .match_arguments(vec![
                (None, Rc::new(EidosValue::integer(4))),
                (
                    Some(Arc::new("digits".to_string())),
                    Rc::new(EidosValue::integer(2)),
                ),
            ])
            .unwrap();
        assert_eq!(*matched[1], EidosValue::integer(2));
    }

    #[test]
    fn test_type_mask_violation_names_parameter() {
        let err = sig()
            .match_arguments(vec![(None, Rc::new(EidosValue::string("oops")))])
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("probe"));
        assert!(text.contains("'x'"));
        assert!(text.contains("string"));
    }

    #[test]
    fn test_singleton_requirement() {
        let err = sig()
            .match_arguments(vec![
                (None, Rc::new(EidosValue::integer(4))),
                (None, Rc::new(EidosValue::integer_vector(vec![1, 2]))),
            ])
            .unwrap_err();
        assert!(err.to_string().contains("digits"));
    }

    #[test]
    fn test_unknown_keyword() {
        let err = sig()
            .match_arguments(vec![(
                Some(Arc::new("bogus".to_string())),
                Rc::new(EidosValue::integer(4)),
            )])
            .unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }
}
