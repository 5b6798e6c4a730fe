use std::{borrow::Cow, cell::RefCell, fmt, rc::Rc};

use smallvec::SmallVec;

use crate::id::HandlerId;

pub type UiEventHandler = Rc<dyn Fn(&str)>;

/// Named UI events raised by a widget (`"value_changed"`, `"end_edit"`, ...).
///
/// This is the capability behind event-driven binding triggers: instead of
/// reacting to every property change, a binding may copy a value only when
/// the widget reports that the user finished interacting with it.
#[derive(Default)]
pub struct UiEvents {
    handlers: RefCell<SmallVec<[(HandlerId, Cow<'static, str>, UiEventHandler); 2]>>,
}

impl UiEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, event: impl Into<Cow<'static, str>>, handler: UiEventHandler) -> HandlerId {
        let id = HandlerId::next();
        self.handlers.borrow_mut().push((id, event.into(), handler));
        id
    }

    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(h, _, _)| *h != id);
        handlers.len() != before
    }

    /// Run every handler registered for `event`.
    pub fn emit(&self, event: &str) {
        let matching: SmallVec<[(HandlerId, UiEventHandler); 2]> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, name, _)| name == event)
            .map(|(id, _, handler)| (*id, handler.clone()))
            .collect();
        for (id, handler) in matching {
            let still_subscribed = self.handlers.borrow().iter().any(|(h, _, _)| *h == id);
            if still_subscribed {
                handler(event);
            }
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl fmt::Debug for UiEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiEvents")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
