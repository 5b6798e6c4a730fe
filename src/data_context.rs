//! A replaceable, typed holder for the object a group of bindings reads.
//!
//! Bindings whose endpoint names a [`DataContext`] resolve their path
//! against the declared type and follow the context when its data object is
//! swapped.

use std::{any::Any, cell::RefCell, rc::Rc, sync::OnceLock};

use crate::{
    error::DataContextError,
    object::{
        downcast_object, same_object, Object, ObjectRef, PropertyDescriptor, PropertySetter, TypeInfo,
        ViewModel,
    },
    path::{PathResolver, ResolvedPath},
    reactive::PropertyChanged,
    value::{Value, ValueType},
};

pub struct DataContext {
    declared: &'static TypeInfo,
    data: RefCell<Option<ObjectRef>>,
    changed: PropertyChanged,
}

impl DataContext {
    /// Name of the property holding the data object.
    pub const DATA: &'static str = "Data";

    /// An empty context for objects of type `declared` or its subtypes.
    pub fn new(declared: &'static TypeInfo) -> Self {
        Self {
            declared,
            data: RefCell::new(None),
            changed: PropertyChanged::new(),
        }
    }

    pub fn for_type<T: ViewModel>() -> Self {
        Self::new(T::static_type_info())
    }

    pub fn with_data(declared: &'static TypeInfo, data: ObjectRef) -> Result<Self, DataContextError> {
        let context = Self::new(declared);
        context.set_data(Some(data))?;
        Ok(context)
    }

    pub fn declared_type(&self) -> &'static TypeInfo {
        self.declared
    }

    pub fn data(&self) -> Option<ObjectRef> {
        self.data.borrow().clone()
    }

    /// Replace the data object. Returns whether it changed; listeners are
    /// only notified when a different object (or none) is stored.
    pub fn set_data(&self, data: Option<ObjectRef>) -> Result<bool, DataContextError> {
        if let Some(object) = &data {
            let actual = object.type_info();
            if !actual.is_subtype_of(self.declared) {
                return Err(DataContextError::TypeMismatch {
                    expected: self.declared.name(),
                    found: actual.name(),
                });
            }
        }
        let changed = {
            let mut current = self.data.borrow_mut();
            let same = match (&*current, &data) {
                (None, None) => true,
                (Some(a), Some(b)) => same_object(a, b),
                _ => false,
            };
            if !same {
                *current = data;
            }
            !same
        };
        if changed {
            self.changed.raise(Self::DATA);
        }
        Ok(changed)
    }

    /// Resolve `path` against the declared type.
    pub fn resolve(&self, path: &str) -> ResolvedPath {
        PathResolver::resolve(path, self.declared)
    }

    /// Read `path` from the current data object.
    pub fn get_value(&self, path: &str) -> Option<Value> {
        let data = self.data()?;
        self.resolve(path).get_reflect(&data)
    }

    /// Write `path` on the current data object.
    pub fn set_value(&self, path: &str, value: Value) -> bool {
        let Some(data) = self.data() else {
            return false;
        };
        self.resolve(path).set_reflect(&data, value)
    }

    /// Raises [`DataContext::DATA`] when the data object is replaced.
    pub fn data_changed(&self) -> &PropertyChanged {
        &self.changed
    }

    fn get_data(object: &dyn Object) -> Option<Value> {
        let context = downcast_object::<DataContext>(object)?;
        Some(context.data().map_or(Value::Null, Value::Object))
    }

    fn set_data_value(object: &dyn Object, value: Value) -> bool {
        let Some(context) = downcast_object::<DataContext>(object) else {
            return false;
        };
        let data = match value {
            Value::Null => None,
            Value::Object(object) => Some(object),
            _ => return false,
        };
        context.set_data(data).is_ok()
    }
}

impl Object for DataContext {
    fn type_info(&self) -> &'static TypeInfo {
        Self::static_type_info()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn notifier(&self) -> Option<&PropertyChanged> {
        Some(&self.changed)
    }
}

impl ViewModel for DataContext {
    fn static_type_info() -> &'static TypeInfo {
        static INFO: OnceLock<TypeInfo> = OnceLock::new();
        INFO.get_or_init(|| {
            TypeInfo::builder::<DataContext>("DataContext")
                .property(PropertyDescriptor::new(
                    DataContext::DATA,
                    || ValueType::Any,
                    DataContext::get_data,
                    Some(DataContext::set_data_value as PropertySetter),
                ))
                .build()
        })
    }
}
