use crate::error::{EidosError, EidosResult};
use crate::object::{ElementClass, ObjectRc};
use crate::pool;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// The six semantic value types of the language. Every value is logically a
/// vector of one of these element types; NULL is always length 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Logical,
    Integer,
    Float,
    String,
    Object,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "NULL",
            ValueType::Logical => "logical",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Object => "object",
        }
    }

    /// Rank in the comparison-promotion ordering: string > float > integer
    /// > logical. NULL and object do not participate.
    fn comparison_rank(self) -> Option<u8> {
        match self {
            ValueType::Logical => Some(1),
            ValueType::Integer => Some(2),
            ValueType::Float => Some(3),
            ValueType::String => Some(4),
            ValueType::Null | ValueType::Object => None,
        }
    }

    fn mask_bit(self) -> u32 {
        match self {
            ValueType::Null => 1 << 0,
            ValueType::Logical => 1 << 1,
            ValueType::Integer => 1 << 2,
            ValueType::Float => 1 << 3,
            ValueType::String => 1 << 4,
            ValueType::Object => 1 << 5,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bitmask over value types used by function signatures and property
/// descriptors. The high bits carry the optional/singleton argument flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMask(u32);

impl TypeMask {
    pub const NULL: TypeMask = TypeMask(1 << 0);
    pub const LOGICAL: TypeMask = TypeMask(1 << 1);
    pub const INTEGER: TypeMask = TypeMask(1 << 2);
    pub const FLOAT: TypeMask = TypeMask(1 << 3);
    pub const STRING: TypeMask = TypeMask(1 << 4);
    pub const OBJECT: TypeMask = TypeMask(1 << 5);

    /// The argument may be omitted (a default is supplied).
    pub const OPTIONAL: TypeMask = TypeMask(1 << 6);
    /// The argument must have exactly one element.
    pub const SINGLETON: TypeMask = TypeMask(1 << 7);

    pub const NUMERIC: TypeMask = TypeMask(Self::INTEGER.0 | Self::FLOAT.0);
    pub const ANY: TypeMask = TypeMask(
        Self::NULL.0 | Self::LOGICAL.0 | Self::INTEGER.0 | Self::FLOAT.0 | Self::STRING.0
            | Self::OBJECT.0,
    );

    pub fn contains_type(self, value_type: ValueType) -> bool {
        self.0 & value_type.mask_bit() != 0
    }

    pub fn is_optional(self) -> bool {
        self.0 & Self::OPTIONAL.0 != 0
    }

    pub fn requires_singleton(self) -> bool {
        self.0 & Self::SINGLETON.0 != 0
    }

    /// Type-and-shape check used at call time. The singleton requirement
    /// applies to concrete values; a permitted NULL passes regardless.
    pub fn accepts(self, value: &EidosValue) -> bool {
        if !self.contains_type(value.value_type()) {
            return false;
        }
        if self.requires_singleton() && value.count() != 1 && !value.is_null() {
            return false;
        }
        true
    }

    /// If the mask names exactly one concrete type, return it. Used to give
    /// property reads on empty object vectors a typed empty result.
    pub fn sole_type(self) -> Option<ValueType> {
        let types = [
            ValueType::Null,
            ValueType::Logical,
            ValueType::Integer,
            ValueType::Float,
            ValueType::String,
            ValueType::Object,
        ];
        let mut found = None;
        for t in types {
            if self.contains_type(t) {
                if found.is_some() {
                    return None;
                }
                found = Some(t);
            }
        }
        found
    }

    /// Human-readable list of the permitted types, for diagnostics.
    pub fn type_list(self) -> String {
        let mut names = Vec::new();
        for t in [
            ValueType::Null,
            ValueType::Logical,
            ValueType::Integer,
            ValueType::Float,
            ValueType::String,
            ValueType::Object,
        ] {
            if self.contains_type(t) {
                names.push(t.name());
            }
        }
        names.join("/")
    }
}

impl std::ops::BitOr for TypeMask {
    type Output = TypeMask;

    fn bitor(self, rhs: TypeMask) -> TypeMask {
        TypeMask(self.0 | rhs.0)
    }
}

/// Element storage. Singleton variants keep one element inline so that the
/// common scalar case never allocates a `Vec`.
#[derive(Debug, Clone)]
pub enum ValueData {
    Null,
    LogicalSingleton(bool),
    LogicalVector(Vec<bool>),
    IntegerSingleton(i64),
    IntegerVector(Vec<i64>),
    FloatSingleton(f64),
    FloatVector(Vec<f64>),
    StringSingleton(String),
    StringVector(Vec<String>),
    ObjectSingleton(ObjectRc),
    ObjectVector {
        class: Rc<ElementClass>,
        elements: Vec<ObjectRc>,
    },
}

/// A runtime value: a typed vector plus the invisible flag that suppresses
/// echoing of top-level results. Values are shared through `ValueRc`; any
/// holder that is not the unique owner must copy before mutating.
#[derive(Debug, Clone)]
pub struct EidosValue {
    data: ValueData,
    invisible: bool,
}

const SITE_VALUE: &str = "EidosValue";

impl EidosValue {
    // Constructors. These build fresh, visible values; the canonical shared
    // instances live in `pool`.

    pub fn null() -> Self {
        Self {
            data: ValueData::Null,
            invisible: false,
        }
    }

    pub fn null_invisible() -> Self {
        Self {
            data: ValueData::Null,
            invisible: true,
        }
    }

    pub fn logical(value: bool) -> Self {
        Self {
            data: ValueData::LogicalSingleton(value),
            invisible: false,
        }
    }

    pub fn logical_vector(values: Vec<bool>) -> Self {
        Self {
            data: ValueData::LogicalVector(values),
            invisible: false,
        }
    }

    pub fn integer(value: i64) -> Self {
        Self {
            data: ValueData::IntegerSingleton(value),
            invisible: false,
        }
    }

    pub fn integer_vector(values: Vec<i64>) -> Self {
        Self {
            data: ValueData::IntegerVector(values),
            invisible: false,
        }
    }

    pub fn float(value: f64) -> Self {
        Self {
            data: ValueData::FloatSingleton(value),
            invisible: false,
        }
    }

    pub fn float_vector(values: Vec<f64>) -> Self {
        Self {
            data: ValueData::FloatVector(values),
            invisible: false,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data: ValueData::StringSingleton(value.into()),
            invisible: false,
        }
    }

    pub fn string_vector(values: Vec<String>) -> Self {
        Self {
            data: ValueData::StringVector(values),
            invisible: false,
        }
    }

    pub fn object(element: ObjectRc) -> Self {
        Self {
            data: ValueData::ObjectSingleton(element),
            invisible: false,
        }
    }

    pub fn object_vector(class: Rc<ElementClass>, elements: Vec<ObjectRc>) -> Self {
        Self {
            data: ValueData::ObjectVector { class, elements },
            invisible: false,
        }
    }

    pub fn data(&self) -> &ValueData {
        &self.data
    }

    pub fn value_type(&self) -> ValueType {
        match &self.data {
            ValueData::Null => ValueType::Null,
            ValueData::LogicalSingleton(_) | ValueData::LogicalVector(_) => ValueType::Logical,
            ValueData::IntegerSingleton(_) | ValueData::IntegerVector(_) => ValueType::Integer,
            ValueData::FloatSingleton(_) | ValueData::FloatVector(_) => ValueType::Float,
            ValueData::StringSingleton(_) | ValueData::StringVector(_) => ValueType::String,
            ValueData::ObjectSingleton(_) | ValueData::ObjectVector { .. } => ValueType::Object,
        }
    }

    pub fn count(&self) -> usize {
        match &self.data {
            ValueData::Null => 0,
            ValueData::LogicalSingleton(_)
            | ValueData::IntegerSingleton(_)
            | ValueData::FloatSingleton(_)
            | ValueData::StringSingleton(_)
            | ValueData::ObjectSingleton(_) => 1,
            ValueData::LogicalVector(v) => v.len(),
            ValueData::IntegerVector(v) => v.len(),
            ValueData::FloatVector(v) => v.len(),
            ValueData::StringVector(v) => v.len(),
            ValueData::ObjectVector { elements, .. } => elements.len(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.data, ValueData::Null)
    }

    pub fn is_invisible(&self) -> bool {
        self.invisible
    }

    pub fn set_invisible(&mut self, invisible: bool) {
        self.invisible = invisible;
    }

    /// Marks the value invisible, suppressing top-level echo.
    pub fn invert_visibility(&mut self) {
        self.invisible = true;
    }

    /// The displayable element type: the class name for objects, the type
    /// name otherwise.
    pub fn element_type_name(&self) -> String {
        match &self.data {
            ValueData::ObjectSingleton(element) => element.class().name().to_string(),
            ValueData::ObjectVector { class, .. } => class.name().to_string(),
            _ => self.value_type().name().to_string(),
        }
    }

    /// The element class for object values.
    pub fn object_class(&self) -> Option<Rc<ElementClass>> {
        match &self.data {
            ValueData::ObjectSingleton(element) => Some(element.class()),
            ValueData::ObjectVector { class, .. } => Some(Rc::clone(class)),
            _ => None,
        }
    }

    fn range_check(&self, index: usize) -> EidosResult<()> {
        if index >= self.count() {
            return Err(EidosError::index_out_of_range(
                SITE_VALUE,
                format!(
                    "subscript {} out of range for a {} value with {} elements.",
                    index,
                    self.value_type(),
                    self.count()
                ),
            ));
        }
        Ok(())
    }

    // Element accessors. Numeric accessors follow the promotion lattice:
    // logical reads as integer, logical/integer read as float.

    pub fn logical_at(&self, index: usize) -> EidosResult<bool> {
        self.range_check(index)?;
        match &self.data {
            ValueData::LogicalSingleton(b) => Ok(*b),
            ValueData::LogicalVector(v) => Ok(v[index]),
            _ => Err(EidosError::type_error(
                SITE_VALUE,
                format!("operand of type {} cannot be used as logical.", self.value_type()),
            )),
        }
    }

    pub fn integer_at(&self, index: usize) -> EidosResult<i64> {
        self.range_check(index)?;
        match &self.data {
            ValueData::LogicalSingleton(b) => Ok(i64::from(*b)),
            ValueData::LogicalVector(v) => Ok(i64::from(v[index])),
            ValueData::IntegerSingleton(n) => Ok(*n),
            ValueData::IntegerVector(v) => Ok(v[index]),
            _ => Err(EidosError::type_error(
                SITE_VALUE,
                format!("operand of type {} cannot be used as integer.", self.value_type()),
            )),
        }
    }

    pub fn float_at(&self, index: usize) -> EidosResult<f64> {
        self.range_check(index)?;
        match &self.data {
            ValueData::LogicalSingleton(b) => Ok(if *b { 1.0 } else { 0.0 }),
            ValueData::LogicalVector(v) => Ok(if v[index] { 1.0 } else { 0.0 }),
            ValueData::IntegerSingleton(n) => Ok(*n as f64),
            ValueData::IntegerVector(v) => Ok(v[index] as f64),
            ValueData::FloatSingleton(x) => Ok(*x),
            ValueData::FloatVector(v) => Ok(v[index]),
            _ => Err(EidosError::type_error(
                SITE_VALUE,
                format!("operand of type {} cannot be used as float.", self.value_type()),
            )),
        }
    }

    pub fn string_at(&self, index: usize) -> EidosResult<&str> {
        self.range_check(index)?;
        match &self.data {
            ValueData::StringSingleton(s) => Ok(s.as_str()),
            ValueData::StringVector(v) => Ok(v[index].as_str()),
            _ => Err(EidosError::type_error(
                SITE_VALUE,
                format!("operand of type {} cannot be used as string.", self.value_type()),
            )),
        }
    }

    pub fn object_at(&self, index: usize) -> EidosResult<ObjectRc> {
        self.range_check(index)?;
        match &self.data {
            ValueData::ObjectSingleton(element) => Ok(Rc::clone(element)),
            ValueData::ObjectVector { elements, .. } => Ok(Rc::clone(&elements[index])),
            _ => Err(EidosError::type_error(
                SITE_VALUE,
                format!("operand of type {} cannot be used as object.", self.value_type()),
            )),
        }
    }

    /// Element coerced to logical; nonzero numerics are true. NaN cannot be
    /// coerced.
    pub fn logical_coerced_at(&self, index: usize) -> EidosResult<bool> {
        match &self.data {
            ValueData::LogicalSingleton(_) | ValueData::LogicalVector(_) => self.logical_at(index),
            ValueData::IntegerSingleton(_) | ValueData::IntegerVector(_) => {
                Ok(self.integer_at(index)? != 0)
            }
            ValueData::FloatSingleton(_) | ValueData::FloatVector(_) => {
                let x = self.float_at(index)?;
                if x.is_nan() {
                    return Err(EidosError::type_error(
                        SITE_VALUE,
                        "NAN cannot be converted to logical.",
                    ));
                }
                Ok(x != 0.0)
            }
            _ => Err(EidosError::type_error(
                SITE_VALUE,
                format!("operand of type {} cannot be converted to logical.", self.value_type()),
            )),
        }
    }

    /// A fresh singleton for element `index`, or the canonical static when
    /// the element equals one (T/F, integer 0/1, float 0/0.5/1/INF).
    pub fn get_value_at_index(&self, index: usize) -> EidosResult<pool::ValueRc> {
        self.range_check(index)?;
        let value = match &self.data {
            ValueData::Null => unreachable!("range_check rejects all NULL subscripts"),
            ValueData::LogicalSingleton(_) | ValueData::LogicalVector(_) => {
                return Ok(pool::static_logical(self.logical_at(index)?));
            }
            ValueData::IntegerSingleton(_) | ValueData::IntegerVector(_) => {
                let n = self.integer_at(index)?;
                if let Some(shared) = pool::static_integer(n) {
                    return Ok(shared);
                }
                EidosValue::integer(n)
            }
            ValueData::FloatSingleton(_) | ValueData::FloatVector(_) => {
                let x = self.float_at(index)?;
                if let Some(shared) = pool::static_float(x) {
                    return Ok(shared);
                }
                EidosValue::float(x)
            }
            ValueData::StringSingleton(_) | ValueData::StringVector(_) => {
                EidosValue::string(self.string_at(index)?)
            }
            ValueData::ObjectSingleton(_) | ValueData::ObjectVector { .. } => {
                EidosValue::object(self.object_at(index)?)
            }
        };
        Ok(Rc::new(value))
    }

    /// Write element `index` in place from the first element of `value`.
    /// The caller must hold exclusive ownership; type promotion of the
    /// target is never performed here.
    pub fn set_value_at_index(&mut self, index: usize, value: &EidosValue) -> EidosResult<()> {
        self.range_check(index)?;
        if value.count() != 1 {
            return Err(EidosError::type_error(
                SITE_VALUE,
                format!(
                    "a singleton value is required for element assignment ({} elements supplied).",
                    value.count()
                ),
            ));
        }

        let target_type = self.value_type();
        let type_err = || {
            EidosError::type_error(
                SITE_VALUE,
                format!(
                    "value of type {} cannot be assigned into an element of a {} value.",
                    value.value_type(),
                    target_type
                ),
            )
        };

        match &mut self.data {
            ValueData::Null => Err(type_err()),
            ValueData::LogicalSingleton(b) => {
                if value.value_type() != ValueType::Logical {
                    return Err(type_err());
                }
                *b = value.logical_at(0)?;
                Ok(())
            }
            ValueData::LogicalVector(v) => {
                if value.value_type() != ValueType::Logical {
                    return Err(type_err());
                }
                v[index] = value.logical_at(0)?;
                Ok(())
            }
            ValueData::IntegerSingleton(n) => {
                if !matches!(value.value_type(), ValueType::Logical | ValueType::Integer) {
                    return Err(type_err());
                }
                *n = value.integer_at(0)?;
                Ok(())
            }
            ValueData::IntegerVector(v) => {
                if !matches!(value.value_type(), ValueType::Logical | ValueType::Integer) {
                    return Err(type_err());
                }
                v[index] = value.integer_at(0)?;
                Ok(())
            }
            ValueData::FloatSingleton(x) => {
                if !matches!(
                    value.value_type(),
                    ValueType::Logical | ValueType::Integer | ValueType::Float
                ) {
                    return Err(type_err());
                }
                *x = value.float_at(0)?;
                Ok(())
            }
            ValueData::FloatVector(v) => {
                if !matches!(
                    value.value_type(),
                    ValueType::Logical | ValueType::Integer | ValueType::Float
                ) {
                    return Err(type_err());
                }
                v[index] = value.float_at(0)?;
                Ok(())
            }
            ValueData::StringSingleton(s) => {
                if value.value_type() != ValueType::String {
                    return Err(type_err());
                }
                *s = value.string_at(0)?.to_string();
                Ok(())
            }
            ValueData::StringVector(v) => {
                if value.value_type() != ValueType::String {
                    return Err(type_err());
                }
                v[index] = value.string_at(0)?.to_string();
                Ok(())
            }
            ValueData::ObjectSingleton(element) => {
                let new_element = value.object_at(0)?;
                if !Rc::ptr_eq(&element.class(), &new_element.class()) {
                    return Err(type_err());
                }
                *element = new_element;
                Ok(())
            }
            ValueData::ObjectVector { class, elements } => {
                let new_element = value.object_at(0)?;
                if !Rc::ptr_eq(class, &new_element.class()) {
                    return Err(type_err());
                }
                elements[index] = new_element;
                Ok(())
            }
        }
    }

    /// A deep copy of element storage. The copy is visible and, being fresh,
    /// uniquely owned.
    pub fn copy_values(&self) -> EidosValue {
        EidosValue {
            data: self.data.clone(),
            invisible: false,
        }
    }

    /// Select the elements at `indices` (already bounds-checked by the
    /// caller), preserving type and, for objects, class.
    pub fn select_indices(&self, indices: &[usize]) -> EidosResult<EidosValue> {
        match &self.data {
            ValueData::Null => Ok(EidosValue::null()),
            ValueData::LogicalSingleton(_) | ValueData::LogicalVector(_) => {
                let mut out = Vec::with_capacity(indices.len());
                for &i in indices {
                    out.push(self.logical_at(i)?);
                }
                Ok(if out.len() == 1 {
                    EidosValue::logical(out[0])
                } else {
                    EidosValue::logical_vector(out)
                })
            }
            ValueData::IntegerSingleton(_) | ValueData::IntegerVector(_) => {
                let mut out = Vec::with_capacity(indices.len());
                for &i in indices {
                    out.push(self.integer_at(i)?);
                }
                Ok(if out.len() == 1 {
                    EidosValue::integer(out[0])
                } else {
                    EidosValue::integer_vector(out)
                })
            }
            ValueData::FloatSingleton(_) | ValueData::FloatVector(_) => {
                let mut out = Vec::with_capacity(indices.len());
                for &i in indices {
                    out.push(self.float_at(i)?);
                }
                Ok(if out.len() == 1 {
                    EidosValue::float(out[0])
                } else {
                    EidosValue::float_vector(out)
                })
            }
            ValueData::StringSingleton(_) | ValueData::StringVector(_) => {
                let mut out = Vec::with_capacity(indices.len());
                for &i in indices {
                    out.push(self.string_at(i)?.to_string());
                }
                Ok(if out.len() == 1 {
                    EidosValue::string(out.into_iter().next().unwrap_or_default())
                } else {
                    EidosValue::string_vector(out)
                })
            }
            ValueData::ObjectSingleton(element) => {
                let class = element.class();
                let mut out = Vec::with_capacity(indices.len());
                for &i in indices {
                    out.push(self.object_at(i)?);
                }
                Ok(EidosValue::object_vector(class, out))
            }
            ValueData::ObjectVector { class, .. } => {
                let class = Rc::clone(class);
                let mut out = Vec::with_capacity(indices.len());
                for &i in indices {
                    out.push(self.object_at(i)?);
                }
                Ok(EidosValue::object_vector(class, out))
            }
        }
    }

    /// Append all elements of `other`, promoting this value's storage along
    /// the lattice logical <= integer <= float when needed. String appends
    /// only to string, object only to object of the same class; appending
    /// NULL is a no-op. Out-of-lattice promotion fails.
    pub fn append_from(&mut self, other: &EidosValue) -> EidosResult<()> {
        if other.is_null() {
            return Ok(());
        }

        let self_type = self.value_type();
        let other_type = other.value_type();

        let promotion_err = || {
            EidosError::type_error(
                SITE_VALUE,
                format!(
                    "a value of type {} cannot be appended to a value of type {}.",
                    other_type, self_type
                ),
            )
        };

        // An empty NULL accumulator adopts the other value's type outright.
        if self.is_null() {
            self.data = other.copy_values().data;
            return Ok(());
        }

        match (self_type, other_type) {
            (ValueType::String, ValueType::String) => {
                let mut values = self.take_string_vec();
                for i in 0..other.count() {
                    values.push(other.string_at(i)?.to_string());
                }
                self.data = ValueData::StringVector(values);
                Ok(())
            }
            (ValueType::Object, ValueType::Object) => {
                let class = self.object_class().ok_or_else(promotion_err)?;
                let other_class = other.object_class().ok_or_else(promotion_err)?;
                if !Rc::ptr_eq(&class, &other_class) {
                    return Err(EidosError::type_error(
                        SITE_VALUE,
                        format!(
                            "object elements of class {} cannot be mixed with class {}.",
                            other_class.name(),
                            class.name()
                        ),
                    ));
                }
                let mut elements = self.take_object_vec();
                for i in 0..other.count() {
                    elements.push(other.object_at(i)?);
                }
                self.data = ValueData::ObjectVector { class, elements };
                Ok(())
            }
            (a, b) if numeric_lattice_rank(a).is_some() && numeric_lattice_rank(b).is_some() => {
                let joint = if numeric_lattice_rank(a) >= numeric_lattice_rank(b) { a } else { b };
                match joint {
                    ValueType::Logical => {
                        let mut values = self.take_logical_vec();
                        for i in 0..other.count() {
                            values.push(other.logical_at(i)?);
                        }
                        self.data = ValueData::LogicalVector(values);
                    }
                    ValueType::Integer => {
                        let mut values = self.take_integer_vec()?;
                        for i in 0..other.count() {
                            values.push(other.integer_at(i)?);
                        }
                        self.data = ValueData::IntegerVector(values);
                    }
                    ValueType::Float => {
                        let mut values = self.take_float_vec()?;
                        for i in 0..other.count() {
                            values.push(other.float_at(i)?);
                        }
                        self.data = ValueData::FloatVector(values);
                    }
                    _ => unreachable!("joint lattice type is numeric"),
                }
                Ok(())
            }
            _ => Err(promotion_err()),
        }
    }

    fn take_logical_vec(&mut self) -> Vec<bool> {
        match std::mem::replace(&mut self.data, ValueData::Null) {
            ValueData::LogicalSingleton(b) => vec![b],
            ValueData::LogicalVector(v) => v,
            _ => Vec::new(),
        }
    }

    fn take_integer_vec(&mut self) -> EidosResult<Vec<i64>> {
        let count = self.count();
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            out.push(self.integer_at(i)?);
        }
        self.data = ValueData::Null;
        Ok(out)
    }

    fn take_float_vec(&mut self) -> EidosResult<Vec<f64>> {
        let count = self.count();
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            out.push(self.float_at(i)?);
        }
        self.data = ValueData::Null;
        Ok(out)
    }

    fn take_string_vec(&mut self) -> Vec<String> {
        match std::mem::replace(&mut self.data, ValueData::Null) {
            ValueData::StringSingleton(s) => vec![s],
            ValueData::StringVector(v) => v,
            _ => Vec::new(),
        }
    }

    fn take_object_vec(&mut self) -> Vec<ObjectRc> {
        match std::mem::replace(&mut self.data, ValueData::Null) {
            ValueData::ObjectSingleton(element) => vec![element],
            ValueData::ObjectVector { elements, .. } => elements,
            _ => Vec::new(),
        }
    }

    /// The display form of a single element, as used by `cat`/`paste` and by
    /// string-promoted comparison.
    pub fn element_display(&self, index: usize) -> EidosResult<String> {
        match &self.data {
            ValueData::Null => Err(EidosError::index_out_of_range(
                SITE_VALUE,
                "subscript on NULL.",
            )),
            ValueData::LogicalSingleton(_) | ValueData::LogicalVector(_) => {
                Ok(if self.logical_at(index)? { "T" } else { "F" }.to_string())
            }
            ValueData::IntegerSingleton(_) | ValueData::IntegerVector(_) => {
                Ok(self.integer_at(index)?.to_string())
            }
            ValueData::FloatSingleton(_) | ValueData::FloatVector(_) => {
                Ok(format_float(self.float_at(index)?))
            }
            ValueData::StringSingleton(_) | ValueData::StringVector(_) => {
                Ok(self.string_at(index)?.to_string())
            }
            ValueData::ObjectSingleton(_) | ValueData::ObjectVector { .. } => {
                Ok(self.object_at(index)?.display_string())
            }
        }
    }
}

fn numeric_lattice_rank(value_type: ValueType) -> Option<u8> {
    match value_type {
        ValueType::Logical => Some(0),
        ValueType::Integer => Some(1),
        ValueType::Float => Some(2),
        _ => None,
    }
}

/// Total-order comparison of one element of `a` against one element of `b`,
/// promoting to the wider type (string > float > integer > logical). NaN
/// compares equal to itself and after every other float, which keeps `sort`
/// stable. NULL and object operands are not ordered.
pub fn compare_elements(
    a: &EidosValue,
    a_index: usize,
    b: &EidosValue,
    b_index: usize,
) -> EidosResult<Ordering> {
    let a_rank = a.value_type().comparison_rank();
    let b_rank = b.value_type().comparison_rank();

    let (a_rank, b_rank) = match (a_rank, b_rank) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            return Err(EidosError::type_error(
                SITE_VALUE,
                format!(
                    "operand types {} and {} cannot be compared.",
                    a.value_type(),
                    b.value_type()
                ),
            ));
        }
    };

    let joint = a_rank.max(b_rank);

    match joint {
        1 => Ok(a.logical_at(a_index)?.cmp(&b.logical_at(b_index)?)),
        2 => Ok(a.integer_at(a_index)?.cmp(&b.integer_at(b_index)?)),
        3 => {
            let x = a.float_at(a_index)?;
            let y = b.float_at(b_index)?;
            Ok(total_float_order(x, y))
        }
        _ => Ok(a.element_display(a_index)?.cmp(&b.element_display(b_index)?)),
    }
}

fn total_float_order(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

/// Canonical float formatting: INF/NAN spellings re-lex via the intrinsic
/// constants, and integral finite floats keep a trailing `.0` so they re-lex
/// as floats.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        "NAN".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "INF".to_string() } else { "-INF".to_string() }
    } else if x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

fn write_escaped_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            _ => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for EidosValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("NULL");
        }

        let count = self.count();
        if count == 0 {
            return match &self.data {
                ValueData::ObjectVector { class, .. } => {
                    write!(f, "object<{}>(0)", class.name())
                }
                _ => write!(f, "{}(0)", self.value_type()),
            };
        }

        for i in 0..count {
            if i > 0 {
                f.write_str(" ")?;
            }
            match &self.data {
                ValueData::StringSingleton(_) | ValueData::StringVector(_) => {
                    let s = self.string_at(i).map_err(|_| fmt::Error)?;
                    write_escaped_string(f, s)?;
                }
                _ => {
                    let s = self.element_display(i).map_err(|_| fmt::Error)?;
                    f.write_str(&s)?;
                }
            }
        }
        Ok(())
    }
}

impl PartialEq for EidosValue {
    /// Content equality: same type, same length, equal elements. Floats use
    /// IEEE equality; object elements compare by identity. The invisible
    /// flag does not participate.
    fn eq(&self, other: &Self) -> bool {
        if self.value_type() != other.value_type() || self.count() != other.count() {
            return false;
        }
        let count = self.count();
        match self.value_type() {
            ValueType::Null => true,
            ValueType::Logical => (0..count).all(|i| {
                matches!((self.logical_at(i), other.logical_at(i)), (Ok(a), Ok(b)) if a == b)
            }),
            ValueType::Integer => (0..count).all(|i| {
                matches!((self.integer_at(i), other.integer_at(i)), (Ok(a), Ok(b)) if a == b)
            }),
            ValueType::Float => (0..count).all(|i| {
                matches!((self.float_at(i), other.float_at(i)), (Ok(a), Ok(b)) if a == b)
            }),
            ValueType::String => (0..count).all(|i| {
                matches!((self.string_at(i), other.string_at(i)), (Ok(a), Ok(b)) if a == b)
            }),
            ValueType::Object => (0..count).all(|i| {
                matches!(
                    (self.object_at(i), other.object_at(i)),
                    (Ok(a), Ok(b)) if Rc::ptr_eq(&a, &b)
                )
            }),
        }
    }
}
