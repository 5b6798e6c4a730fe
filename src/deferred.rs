//! Values that become available later.
//!
//! A converter may return [`Value::Deferred`] instead of a finished value.
//! The binding then polls it once, handing over a continuation; the deferred
//! value either answers immediately or keeps the continuation and calls it
//! exactly once when the result arrives.

use std::{cell::RefCell, fmt, rc::Rc};

use smallvec::SmallVec;

use crate::value::Value;

pub type Continuation = Box<dyn FnOnce(Value)>;

#[derive(Debug, PartialEq)]
pub enum DeferredPoll {
    Ready(Value),
    Pending,
}

pub trait DeferredValue {
    /// Return [`DeferredPoll::Ready`] and drop `continuation`, or return
    /// [`DeferredPoll::Pending`] and call `continuation` exactly once later.
    /// Never both.
    fn poll_or_register(&self, continuation: Continuation) -> DeferredPoll;
}

enum State {
    Waiting(SmallVec<[Continuation; 1]>),
    Ready(Value),
}

/// A single-assignment deferred value completed through a [`Completer`].
#[derive(Clone)]
pub struct Deferred {
    state: Rc<RefCell<State>>,
}

/// Write side of a [`Deferred`].
pub struct Completer {
    state: Rc<RefCell<State>>,
}

impl Deferred {
    pub fn pending() -> (Deferred, Completer) {
        let state = Rc::new(RefCell::new(State::Waiting(SmallVec::new())));
        (
            Deferred {
                state: state.clone(),
            },
            Completer { state },
        )
    }

    pub fn ready(value: Value) -> Deferred {
        Deferred {
            state: Rc::new(RefCell::new(State::Ready(value))),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.state.borrow(), State::Ready(_))
    }

    pub fn into_value(self) -> Value {
        Value::Deferred(Rc::new(self))
    }
}

impl DeferredValue for Deferred {
    fn poll_or_register(&self, continuation: Continuation) -> DeferredPoll {
        match &mut *self.state.borrow_mut() {
            State::Ready(value) => DeferredPoll::Ready(value.clone()),
            State::Waiting(waiting) => {
                waiting.push(continuation);
                DeferredPoll::Pending
            }
        }
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl Completer {
    /// Store `value` and run every registered continuation with it.
    pub fn complete(self, value: Value) {
        let waiting = match std::mem::replace(
            &mut *self.state.borrow_mut(),
            State::Ready(value.clone()),
        ) {
            State::Waiting(waiting) => waiting,
            State::Ready(_) => SmallVec::new(),
        };
        for continuation in waiting {
            continuation(value.clone());
        }
    }
}

impl From<Deferred> for Value {
    fn from(deferred: Deferred) -> Self {
        deferred.into_value()
    }
}
