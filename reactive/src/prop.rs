use std::{cell::RefCell, fmt};

/// Interior-mutable storage for one view-model property.
///
/// A `Prop` only stores the value. Raising the change notification is the
/// job of the owning object, which knows the property's name.
pub struct Prop<T> {
    value: RefCell<T>,
}

impl<T> Prop<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
        }
    }

    /// Get the current value (cloned).
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    /// Access the value by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Replace the value, returning the previous one.
    pub fn replace(&self, value: T) -> T {
        self.value.replace(value)
    }

    /// Store `value` unless `same` reports it equal to the current value.
    ///
    /// Returns whether the stored value changed.
    pub fn set_if(&self, value: T, same: impl FnOnce(&T, &T) -> bool) -> bool {
        let mut current = self.value.borrow_mut();
        if same(&current, &value) {
            return false;
        }
        *current = value;
        true
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: Default> Default for Prop<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Prop<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Prop<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.try_borrow() {
            Ok(value) => f.debug_tuple("Prop").field(&*value).finish(),
            Err(_) => f.write_str("Prop(<borrowed>)"),
        }
    }
}
