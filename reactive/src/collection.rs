use std::{cell::RefCell, fmt, rc::Rc};

use smallvec::SmallVec;

use crate::id::HandlerId;

/// What happened to an observable sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionAction {
    Add,
    Remove,
    Replace,
    Move,
    Reset,
}

/// Payload of a collection-changed notification.
///
/// Indices are positions in the sequence before (`old_index`) and after
/// (`new_index`) the change, `None` when they do not apply.
#[derive(Clone, Debug)]
pub struct CollectionChangedArgs<T> {
    pub action: CollectionAction,
    pub new_items: Vec<T>,
    pub new_index: Option<usize>,
    pub old_items: Vec<T>,
    pub old_index: Option<usize>,
}

impl<T> CollectionChangedArgs<T> {
    pub fn add(items: Vec<T>, index: usize) -> Self {
        Self {
            action: CollectionAction::Add,
            new_items: items,
            new_index: Some(index),
            old_items: Vec::new(),
            old_index: None,
        }
    }

    pub fn remove(items: Vec<T>, index: usize) -> Self {
        Self {
            action: CollectionAction::Remove,
            new_items: Vec::new(),
            new_index: None,
            old_items: items,
            old_index: Some(index),
        }
    }

    pub fn replace(new_item: T, old_item: T, index: usize) -> Self {
        Self {
            action: CollectionAction::Replace,
            new_items: vec![new_item],
            new_index: Some(index),
            old_items: vec![old_item],
            old_index: Some(index),
        }
    }

    pub fn moved(item: T, from: usize, to: usize) -> Self
    where
        T: Clone,
    {
        Self {
            action: CollectionAction::Move,
            new_items: vec![item.clone()],
            new_index: Some(to),
            old_items: vec![item],
            old_index: Some(from),
        }
    }

    pub fn reset() -> Self {
        Self {
            action: CollectionAction::Reset,
            new_items: Vec::new(),
            new_index: None,
            old_items: Vec::new(),
            old_index: None,
        }
    }
}

pub type CollectionChangedHandler<T> = Rc<dyn Fn(&CollectionChangedArgs<T>)>;

/// The observable-sequence capability.
pub trait NotifyCollectionChanged<T> {
    fn subscribe_collection(&self, handler: CollectionChangedHandler<T>) -> HandlerId;

    fn unsubscribe_collection(&self, id: HandlerId) -> bool;
}

struct ListInner<T> {
    items: RefCell<Vec<T>>,
    handlers: RefCell<SmallVec<[(HandlerId, CollectionChangedHandler<T>); 2]>>,
}

/// A shared, observable sequence.
///
/// Cloning the list clones the handle, not the items. Every mutation raises
/// exactly one [`CollectionChangedArgs`] after the items have been updated,
/// so handlers always observe the new contents.
pub struct ObservableList<T> {
    inner: Rc<ListInner<T>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> ObservableList<T> {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(items),
                handlers: RefCell::new(SmallVec::new()),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    /// Index of the first item for which `matches` returns true.
    pub fn position(&self, matches: impl Fn(&T) -> bool) -> Option<usize> {
        self.inner.items.borrow().iter().position(matches)
    }

    pub fn push(&self, item: T) {
        let index = {
            let mut items = self.inner.items.borrow_mut();
            items.push(item.clone());
            items.len() - 1
        };
        self.notify(&CollectionChangedArgs::add(vec![item], index));
    }

    /// Insert `item` at `index`, clamped to the current length.
    pub fn insert(&self, index: usize, item: T) {
        let index = {
            let mut items = self.inner.items.borrow_mut();
            let index = index.min(items.len());
            items.insert(index, item.clone());
            index
        };
        self.notify(&CollectionChangedArgs::add(vec![item], index));
    }

    pub fn remove_at(&self, index: usize) -> Option<T> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            (index < items.len()).then(|| items.remove(index))
        }?;
        self.notify(&CollectionChangedArgs::remove(vec![removed.clone()], index));
        Some(removed)
    }

    /// Remove the first item for which `matches` returns true.
    pub fn remove_first(&self, matches: impl Fn(&T) -> bool) -> Option<T> {
        let index = self.position(matches)?;
        self.remove_at(index)
    }

    /// Replace the item at `index`, returning the previous one.
    pub fn replace(&self, index: usize, item: T) -> Option<T> {
        let old = {
            let mut items = self.inner.items.borrow_mut();
            let slot = items.get_mut(index)?;
            std::mem::replace(slot, item.clone())
        };
        self.notify(&CollectionChangedArgs::replace(item, old.clone(), index));
        Some(old)
    }

    /// Move the item at `from` so that it ends up at `to`.
    pub fn move_item(&self, from: usize, to: usize) -> bool {
        let item = {
            let mut items = self.inner.items.borrow_mut();
            if from >= items.len() || to >= items.len() {
                return false;
            }
            let item = items.remove(from);
            items.insert(to, item.clone());
            item
        };
        self.notify(&CollectionChangedArgs::moved(item, from, to));
        true
    }

    pub fn clear(&self) {
        self.inner.items.borrow_mut().clear();
        self.notify(&CollectionChangedArgs::reset());
    }

    /// Swap in entirely new contents with a single reset notification.
    pub fn reset_with(&self, items: Vec<T>) {
        *self.inner.items.borrow_mut() = items;
        self.notify(&CollectionChangedArgs::reset());
    }

    pub fn handler_count(&self) -> usize {
        self.inner.handlers.borrow().len()
    }

    /// Whether two handles share the same underlying list.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self, args: &CollectionChangedArgs<T>) {
        let snapshot: SmallVec<[(HandlerId, CollectionChangedHandler<T>); 2]> =
            self.inner.handlers.borrow().iter().cloned().collect();
        for (id, handler) in snapshot {
            let still_subscribed = self.inner.handlers.borrow().iter().any(|(h, _)| *h == id);
            if still_subscribed {
                handler(args);
            }
        }
    }
}

impl<T: Clone + 'static> NotifyCollectionChanged<T> for ObservableList<T> {
    fn subscribe_collection(&self, handler: CollectionChangedHandler<T>) -> HandlerId {
        let id = HandlerId::next();
        self.inner.handlers.borrow_mut().push((id, handler));
        id
    }

    fn unsubscribe_collection(&self, id: HandlerId) -> bool {
        let mut handlers = self.inner.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        handlers.len() != before
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.items.borrow().iter()).finish()
    }
}
