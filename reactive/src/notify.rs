use std::{borrow::Cow, cell::RefCell, fmt, rc::Rc};

use smallvec::SmallVec;

use crate::id::HandlerId;

/// Payload of a property-changed notification.
///
/// An empty name means "every property of the sender may have changed".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyChangedArgs {
    name: Cow<'static, str>,
}

impl PropertyChangedArgs {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }

    pub fn all() -> Self {
        Self {
            name: Cow::Borrowed(""),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_all(&self) -> bool {
        self.name.is_empty()
    }

    /// Whether a handler watching `property` should react to this event.
    pub fn affects(&self, property: &str) -> bool {
        self.is_all() || self.name == property
    }
}

pub type PropertyChangedHandler = Rc<dyn Fn(&PropertyChangedArgs)>;

/// The change-notification capability.
pub trait NotifyPropertyChanged {
    fn subscribe(&self, handler: PropertyChangedHandler) -> HandlerId;

    /// Remove a handler. Returns `false` when the id was not subscribed here.
    fn unsubscribe(&self, id: HandlerId) -> bool;
}

/// Event source that view-models embed to announce property changes.
///
/// Handlers run synchronously inside [`PropertyChanged::raise`]. The handler
/// list is snapshotted before the first handler runs, so a handler may
/// subscribe or unsubscribe (itself or others) while the event is being
/// delivered; a handler removed during delivery is skipped if it has not run
/// yet.
#[derive(Default)]
pub struct PropertyChanged {
    handlers: RefCell<SmallVec<[(HandlerId, PropertyChangedHandler); 4]>>,
}

impl PropertyChanged {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notify that the property called `name` changed.
    pub fn raise(&self, name: impl Into<Cow<'static, str>>) {
        self.emit(&PropertyChangedArgs::new(name));
    }

    /// Notify that every property may have changed.
    pub fn raise_all(&self) {
        self.emit(&PropertyChangedArgs::all());
    }

    pub fn emit(&self, args: &PropertyChangedArgs) {
        let snapshot: SmallVec<[(HandlerId, PropertyChangedHandler); 4]> =
            self.handlers.borrow().iter().cloned().collect();
        for (id, handler) in snapshot {
            if self.is_subscribed(id) {
                handler(args);
            }
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_subscribed(&self, id: HandlerId) -> bool {
        self.handlers.borrow().iter().any(|(h, _)| *h == id)
    }
}

impl NotifyPropertyChanged for PropertyChanged {
    fn subscribe(&self, handler: PropertyChangedHandler) -> HandlerId {
        let id = HandlerId::next();
        self.handlers.borrow_mut().push((id, handler));
        id
    }

    fn unsubscribe(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        handlers.len() != before
    }
}

impl fmt::Debug for PropertyChanged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChanged")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
