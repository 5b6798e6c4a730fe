//! Dynamically typed values flowing through bindings.
//!
//! Every property read through a path produces a [`Value`], and every
//! property declares a [`ValueType`]. [`PropertyValue`] connects the Rust
//! field types used in view-models to both.

use std::{fmt, rc::Rc};

use crate::{
    deferred::DeferredValue,
    object::{downcast_rc, same_object, ObjectRef, TypeInfo, ViewModel},
};

/// A dynamically typed property value.
///
/// Equality is structural for primitives and by reference identity for
/// objects and deferred values.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Object(ObjectRef),
    Deferred(Rc<dyn DeferredValue>),
}

impl Value {
    /// Wrap a concrete object.
    pub fn object<T: crate::Object>(object: Rc<T>) -> Self {
        Value::Object(object)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type of the value, `None` for null and deferred values.
    pub fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            Value::Null | Value::Deferred(_) => return None,
            Value::Bool(_) => ValueType::Bool,
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::Str(_) => ValueType::Str,
            Value::Object(object) => ValueType::Object(object.type_info()),
        })
    }

    /// Name of the runtime type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Deferred(_) => "deferred",
            other => other.value_type().map_or("null", |ty| ty.name()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => same_object(a, b),
            (Value::Deferred(a), Value::Deferred(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::I32(v) => f.debug_tuple("I32").field(v).finish(),
            Value::I64(v) => f.debug_tuple("I64").field(v).finish(),
            Value::F32(v) => f.debug_tuple("F32").field(v).finish(),
            Value::F64(v) => f.debug_tuple("F64").field(v).finish(),
            Value::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Value::Object(o) => write!(f, "Object({} @ {:p})", o.type_info().name(), Rc::as_ptr(o)),
            Value::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

/// Declared type of a property.
///
/// `Any`, `Str` and `Object` are nullable; the other variants are value
/// types whose null substitute is their zero value.
#[derive(Clone, Copy)]
pub enum ValueType {
    Any,
    Bool,
    I32,
    I64,
    F32,
    F64,
    Str,
    Object(&'static TypeInfo),
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Any => "any",
            ValueType::Bool => "bool",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::Str => "string",
            ValueType::Object(info) => info.name(),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, ValueType::Any | ValueType::Str | ValueType::Object(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueType::I32 | ValueType::I64 | ValueType::F32 | ValueType::F64
        )
    }

    pub fn object_type(&self) -> Option<&'static TypeInfo> {
        match self {
            ValueType::Object(info) => Some(info),
            _ => None,
        }
    }

    /// Whether `value` can be stored in a property of this type as is.
    pub fn is_assignable_from(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Any, _) => true,
            (ty, Value::Null) => ty.is_nullable(),
            (ValueType::Object(expected), Value::Object(object)) => {
                object.type_info().is_subtype_of(expected)
            }
            (ty, value) => value.value_type().is_some_and(|actual| actual == *ty),
        }
    }

    /// The zero value: `false`, `0`, or null for nullable types.
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::Bool => Value::Bool(false),
            ValueType::I32 => Value::I32(0),
            ValueType::I64 => Value::I64(0),
            ValueType::F32 => Value::F32(0.0),
            ValueType::F64 => Value::F64(0.0),
            ValueType::Any | ValueType::Str | ValueType::Object(_) => Value::Null,
        }
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ValueType::Object(a), ValueType::Object(b)) => a.type_id() == b.type_id(),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl Eq for ValueType {}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Object(info) => write!(f, "Object({})", info.name()),
            other => f.write_str(other.name()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps a Rust property type to and from [`Value`].
///
/// Implemented for the primitive types, `String`, `Value` itself and
/// optional object references. `#[derive(ViewModel)]` requires every
/// `#[property]` field's inner type to implement it.
pub trait PropertyValue: Clone + 'static {
    fn value_type() -> ValueType;

    fn to_value(&self) -> Value;

    /// `None` when `value` does not hold this type.
    fn from_value(value: Value) -> Option<Self>;

    /// Whether storing `other` over `self` would be a no-op.
    fn same(&self, other: &Self) -> bool;
}

macro_rules! primitive_property_value {
    ($ty:ty, $variant:ident) => {
        impl PropertyValue for $ty {
            fn value_type() -> ValueType {
                ValueType::$variant
            }

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn same(&self, other: &Self) -> bool {
                self == other
            }
        }
    };
}

primitive_property_value!(bool, Bool);
primitive_property_value!(i32, I32);
primitive_property_value!(i64, I64);
primitive_property_value!(f32, F32);
primitive_property_value!(f64, F64);
primitive_property_value!(String, Str);

impl PropertyValue for Value {
    fn value_type() -> ValueType {
        ValueType::Any
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }

    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

/// An untyped object reference, declared as `Any`.
impl PropertyValue for Option<ObjectRef> {
    fn value_type() -> ValueType {
        ValueType::Any
    }

    fn to_value(&self) -> Value {
        self.clone().map_or(Value::Null, Value::Object)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            Value::Object(object) => Some(Some(object)),
            _ => None,
        }
    }

    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => same_object(a, b),
            _ => false,
        }
    }
}

impl<T: ViewModel> PropertyValue for Option<Rc<T>> {
    fn value_type() -> ValueType {
        ValueType::Object(T::static_type_info())
    }

    fn to_value(&self) -> Value {
        match self {
            Some(object) => Value::Object(object.clone()),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            Value::Object(object) => downcast_rc::<T>(object).map(Some),
            _ => None,
        }
    }

    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
