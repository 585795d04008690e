//! The host-callback surface for object values: element classes describe the
//! property and method surface of the host's object types, and object values
//! dispatch member access through them.

use crate::error::{EidosError, EidosResult};
use crate::functions::{CallContext, FunctionSignature, ParamSignature};
use crate::interner::EidosStringId;
use crate::pool::ValueRc;
use crate::value::{EidosValue, TypeMask};
use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// One element of an object vector. Hosts implement this for their types;
/// interior mutability belongs to the host element, which is why property
/// setters take `&ObjectRc`.
pub trait EidosObjectElement: fmt::Debug {
    fn class(&self) -> Rc<ElementClass>;

    /// Display form used by `print`/`cat`.
    fn display_string(&self) -> String {
        format!("<{}>", self.class().name())
    }

    /// Downcast hook for getters, setters, and method bodies.
    fn as_any(&self) -> &dyn Any;
}

pub type ObjectRc = Rc<dyn EidosObjectElement>;

pub type PropertyGetter = Rc<dyn Fn(&ObjectRc) -> EidosResult<ValueRc>>;
pub type PropertySetter = Rc<dyn Fn(&ObjectRc, &EidosValue) -> EidosResult<()>>;

/// A property: a getter, an optional setter (absent means read-only), and a
/// type mask describing the values the property produces and accepts.
#[derive(Clone)]
pub struct PropertySignature {
    pub name: Arc<String>,
    pub id: EidosStringId,
    pub mask: TypeMask,
    pub getter: PropertyGetter,
    pub setter: Option<PropertySetter>,
}

impl PropertySignature {
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }
}

impl fmt::Debug for PropertySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySignature")
            .field("name", &self.name)
            .field("mask", &self.mask)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

/// A method body: invoked with the receiver object value, the call context,
/// and the matched argument vector.
pub type MethodFn = Rc<dyn Fn(&EidosValue, &mut dyn CallContext, Vec<ValueRc>) -> EidosResult<ValueRc>>;

/// A method: an ordinary signature (name, return mask, formals) plus the
/// host-supplied body.
#[derive(Clone)]
pub struct MethodSignature {
    pub name: Arc<String>,
    pub return_mask: TypeMask,
    pub params: Vec<ParamSignature>,
    pub body: MethodFn,
}

impl MethodSignature {
    pub fn new(name: &str, return_mask: TypeMask, body: MethodFn) -> Self {
        Self {
            name: Arc::new(name.to_string()),
            return_mask,
            params: Vec::new(),
            body,
        }
    }

    pub fn param(mut self, name: &str, mask: TypeMask) -> Self {
        self.params.push(ParamSignature {
            name: Arc::new(name.to_string()),
            mask,
            default: None,
        });
        self
    }

    pub fn optional_param(mut self, name: &str, mask: TypeMask, default: ValueRc) -> Self {
        self.params.push(ParamSignature {
            name: Arc::new(name.to_string()),
            mask: mask | TypeMask::OPTIONAL,
            default: Some(default),
        });
        self
    }

    /// Argument matching for method calls reuses the function matcher by
    /// borrowing its formals handling.
    pub fn match_arguments(
        &self,
        supplied: Vec<(Option<Arc<String>>, ValueRc)>,
    ) -> EidosResult<Vec<ValueRc>> {
        // Delegate to a throwaway FunctionSignature so the matching rules
        // stay in one place.
        let mut proxy = FunctionSignature::builtin(
            &self.name,
            self.return_mask,
            |_ctx, args| Ok(args.into_iter().next().unwrap_or_else(crate::pool::static_null)),
        );
        proxy.params = self.params.clone();
        proxy.match_arguments(supplied)
    }
}

impl fmt::Debug for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSignature")
            .field("name", &self.name)
            .field("return_mask", &self.return_mask)
            .finish()
    }
}

/// The descriptor for a host object class: identity, displayable name, and
/// the enumerable property and method surfaces. Classes are compared by
/// pointer identity (`Rc::ptr_eq`).
#[derive(Debug)]
pub struct ElementClass {
    name: Arc<String>,
    properties: Vec<PropertySignature>,
    methods: Vec<MethodSignature>,
}

const SITE_CLASS: &str = "ElementClass";

impl ElementClass {
    pub fn new(
        name: &str,
        properties: Vec<PropertySignature>,
        methods: Vec<MethodSignature>,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: Arc::new(name.to_string()),
            properties,
            methods,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[PropertySignature] {
        &self.properties
    }

    pub fn methods(&self) -> &[MethodSignature] {
        &self.methods
    }

    pub fn property(&self, id: EidosStringId) -> Option<&PropertySignature> {
        self.properties.iter().find(|p| p.id == id)
    }

    pub fn property_or_raise(&self, id: EidosStringId, name: &str) -> EidosResult<&PropertySignature> {
        self.property(id).ok_or_else(|| {
            EidosError::type_error(
                SITE_CLASS,
                format!("class {} has no property '{}'.", self.name, name),
            )
        })
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| m.name.as_str() == name)
    }

    pub fn method_or_raise(&self, name: &str) -> EidosResult<&MethodSignature> {
        self.method(name).ok_or_else(|| {
            EidosError::type_error(
                SITE_CLASS,
                format!("class {} has no method '{}'.", self.name, name),
            )
        })
    }
}
