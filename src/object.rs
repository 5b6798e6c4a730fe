//! Runtime reflection tables for bindable objects.
//!
//! A [`TypeInfo`] lists the properties a type declares, each one described
//! by a [`PropertyDescriptor`] holding plain function-pointer accessors.
//! Tables are normally produced by `#[derive(ViewModel)]`, built once and
//! kept in a `static`, so descriptors can be shared by `&'static` reference.

use std::{
    any::{Any, TypeId},
    rc::{Rc, Weak},
};

use educe::Educe;

use crate::{
    reactive::{PropertyChanged, UiEvents},
    value::{Value, ValueType},
};

/// A shared, dynamically typed object.
pub type ObjectRef = Rc<dyn Object>;
pub type WeakObjectRef = Weak<dyn Object>;

/// Reads a property from an object, `None` if the object has the wrong type.
pub type PropertyGetter = fn(&dyn Object) -> Option<Value>;
/// Writes a property, `false` if the object or value has the wrong type.
pub type PropertySetter = fn(&dyn Object, Value) -> bool;

/// An object whose properties can be reached through binding paths.
pub trait Object: 'static {
    fn type_info(&self) -> &'static TypeInfo;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;

    /// View this object as `target`, which is either its own type or one of
    /// the base types it embeds.
    fn upcast(&self, target: TypeId) -> Option<&dyn Any> {
        let any = self.as_any();
        ((*any).type_id() == target).then_some(any)
    }

    /// Change-notification capability.
    fn notifier(&self) -> Option<&PropertyChanged> {
        None
    }

    /// UI-event capability.
    fn ui_events(&self) -> Option<&UiEvents> {
        None
    }
}

/// A statically known object type.
pub trait ViewModel: Object + Sized {
    fn static_type_info() -> &'static TypeInfo;
}

impl dyn Object {
    pub fn is<T: 'static>(&self) -> bool {
        self.upcast(TypeId::of::<T>()).is_some()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        downcast_object(self)
    }
}

/// Borrow `object` as `T`, looking through embedded base types.
pub fn downcast_object<T: 'static>(object: &dyn Object) -> Option<&T> {
    object.upcast(TypeId::of::<T>())?.downcast_ref::<T>()
}

/// Convert a shared object into its concrete type. Only the exact runtime
/// type matches.
pub fn downcast_rc<T: Object>(object: ObjectRef) -> Option<Rc<T>> {
    object.into_any().downcast::<T>().ok()
}

/// Reference identity of two objects.
pub fn same_object(a: &ObjectRef, b: &ObjectRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Identifies a property declaration: the declaring type and its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    declaring_type: TypeId,
    name: &'static str,
}

impl PropertyKey {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A single declared property.
#[derive(Educe)]
#[educe(Debug)]
pub struct PropertyDescriptor {
    name: &'static str,
    declaring_type: TypeId,
    declaring_type_name: &'static str,
    #[educe(Debug(ignore))]
    value_type: fn() -> ValueType,
    #[educe(Debug(ignore))]
    getter: PropertyGetter,
    #[educe(Debug(ignore))]
    setter: Option<PropertySetter>,
}

impl PropertyDescriptor {
    /// A property named `name`. The value type is computed lazily so that
    /// types can declare properties of their own type.
    pub fn new(
        name: &'static str,
        value_type: fn() -> ValueType,
        getter: PropertyGetter,
        setter: Option<PropertySetter>,
    ) -> Self {
        Self {
            name,
            declaring_type: TypeId::of::<()>(),
            declaring_type_name: "",
            value_type,
            getter,
            setter,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declaring_type_name(&self) -> &'static str {
        self.declaring_type_name
    }

    pub fn value_type(&self) -> ValueType {
        (self.value_type)()
    }

    pub fn can_write(&self) -> bool {
        self.setter.is_some()
    }

    pub fn key(&self) -> PropertyKey {
        PropertyKey {
            declaring_type: self.declaring_type,
            name: self.name,
        }
    }

    pub fn get(&self, object: &dyn Object) -> Option<Value> {
        (self.getter)(object)
    }

    pub fn set(&self, object: &dyn Object, value: Value) -> bool {
        match self.setter {
            Some(setter) => setter(object, value),
            None => false,
        }
    }
}

/// Reflection table of one type.
#[derive(Debug)]
pub struct TypeInfo {
    name: &'static str,
    type_id: TypeId,
    base: Option<&'static TypeInfo>,
    properties: Vec<PropertyDescriptor>,
}

impl TypeInfo {
    pub fn builder<T: 'static>(name: &'static str) -> TypeInfoBuilder {
        TypeInfoBuilder {
            info: TypeInfo {
                name,
                type_id: TypeId::of::<T>(),
                base: None,
                properties: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn base(&self) -> Option<&'static TypeInfo> {
        self.base
    }

    /// Properties declared directly on this type, in declaration order.
    pub fn declared_properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// This type followed by its base types, most derived first.
    pub fn ancestors(&'static self) -> impl Iterator<Item = &'static TypeInfo> {
        std::iter::successors(Some(self), |info| info.base)
    }

    pub fn is_subtype_of(&self, other: &TypeInfo) -> bool {
        let mut current = Some(self);
        while let Some(info) = current {
            if info.type_id == other.type_id {
                return true;
            }
            current = info.base;
        }
        false
    }

    /// Find a property by name, ignoring ASCII case.
    ///
    /// The most derived declaration wins. Within one type an exact-case
    /// match beats a case-insensitive one, and otherwise the first declared
    /// property is taken.
    pub fn find_property(&'static self, name: &str) -> Option<&'static PropertyDescriptor> {
        self.ancestors().find_map(|info| {
            info.properties
                .iter()
                .find(|p| p.name == name)
                .or_else(|| {
                    info.properties
                        .iter()
                        .find(|p| p.name.eq_ignore_ascii_case(name))
                })
        })
    }
}

pub struct TypeInfoBuilder {
    info: TypeInfo,
}

impl TypeInfoBuilder {
    pub fn base(mut self, base: &'static TypeInfo) -> Self {
        self.info.base = Some(base);
        self
    }

    pub fn property(mut self, mut descriptor: PropertyDescriptor) -> Self {
        descriptor.declaring_type = self.info.type_id;
        descriptor.declaring_type_name = self.info.name;
        self.info.properties.push(descriptor);
        self
    }

    pub fn build(self) -> TypeInfo {
        self.info
    }
}
