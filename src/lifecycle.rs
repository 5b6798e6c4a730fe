//! Activation and teardown of binding components.
//!
//! A [`LifecycleHost`] drives a component through
//! `Uninitialized -> Active -> Disposed`. Whatever a component acquires in
//! [`Lifecycle::on_activate`] is released in [`Lifecycle::on_deactivate`],
//! which also runs when activation fails part-way, so a failed activation
//! never leaves subscriptions behind.

use crate::error::LifecycleError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Active,
    Disposed,
}

pub trait Lifecycle {
    type Error;

    fn on_activate(&mut self) -> Result<(), Self::Error>;

    /// Must tolerate a partially completed activation.
    fn on_deactivate(&mut self);
}

pub struct LifecycleHost<C: Lifecycle> {
    component: C,
    state: LifecycleState,
}

impl<C: Lifecycle> LifecycleHost<C> {
    pub fn new(component: C) -> Self {
        Self {
            component,
            state: LifecycleState::Uninitialized,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut C {
        &mut self.component
    }

    pub fn activate(&mut self) -> Result<(), LifecycleError<C::Error>> {
        match self.state {
            LifecycleState::Active => return Err(LifecycleError::AlreadyActive),
            LifecycleState::Disposed => return Err(LifecycleError::Disposed),
            LifecycleState::Uninitialized => {}
        }
        match self.component.on_activate() {
            Ok(()) => {
                self.state = LifecycleState::Active;
                Ok(())
            }
            Err(err) => {
                self.component.on_deactivate();
                self.state = LifecycleState::Disposed;
                Err(LifecycleError::Activation(err))
            }
        }
    }

    /// Tear the component down. Returns whether it was active.
    pub fn deactivate(&mut self) -> bool {
        let was_active = self.state == LifecycleState::Active;
        if was_active {
            self.component.on_deactivate();
        }
        self.state = LifecycleState::Disposed;
        was_active
    }
}

impl<C: Lifecycle> Drop for LifecycleHost<C> {
    fn drop(&mut self) {
        if self.state == LifecycleState::Active {
            self.component.on_deactivate();
            self.state = LifecycleState::Disposed;
        }
    }
}
