//! Change subscriptions along a property path.
//!
//! A [`LiveChainState`] keeps one change handler on every object currently
//! reachable along a path. When hop `i` reports a change, the handlers at
//! hops `i` and beyond are dropped and re-established against the objects
//! now reachable, and only then is the binding told that its value may have
//! changed.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use smallvec::SmallVec;

use crate::{
    object::{ObjectRef, WeakObjectRef},
    path::ResolvedPath,
    reactive::{HandlerId, NotifyPropertyChanged, PropertyChangedArgs, Runtime},
    value::Value,
};

struct HopSubscription {
    target: WeakObjectRef,
    handler: HandlerId,
    /// Distinguishes this subscription from earlier ones on the same hop.
    token: u64,
}

impl HopSubscription {
    fn release(self) {
        if let Some(target) = self.target.upgrade() {
            if let Some(notifier) = target.notifier() {
                notifier.unsubscribe(self.handler);
            }
        }
    }
}

struct ChainInner {
    path: Rc<ResolvedPath>,
    records: SmallVec<[Option<HopSubscription>; 4]>,
    next_token: u64,
    detached: bool,
    on_changed: Rc<dyn Fn()>,
}

impl ChainInner {
    fn clear_from(&mut self, hop: usize) {
        for record in self.records.iter_mut().skip(hop) {
            if let Some(subscription) = record.take() {
                subscription.release();
            }
        }
    }
}

/// The per-binding subscription state of one path.
pub struct LiveChainState {
    inner: Rc<RefCell<ChainInner>>,
}

impl LiveChainState {
    /// Subscribe along `path` starting at `root`, calling `on_changed`
    /// whenever any property along the path changes.
    pub fn attach(
        path: Rc<ResolvedPath>,
        root: Option<&ObjectRef>,
        on_changed: impl Fn() + 'static,
    ) -> Self {
        Runtime::assert_ui_thread();
        let len = if path.is_valid() { path.len() } else { 0 };
        let inner = Rc::new(RefCell::new(ChainInner {
            path,
            records: (0..len).map(|_| None).collect(),
            next_token: 0,
            detached: false,
            on_changed: Rc::new(on_changed),
        }));
        if let Some(root) = root {
            walk(&inner, 0, root.clone());
        }
        Self { inner }
    }

    /// Move the chain to a new root, e.g. after a data context changed.
    pub fn rebind(&self, root: Option<&ObjectRef>) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.clear_from(0);
            inner.detached = false;
        }
        if let Some(root) = root {
            walk(&self.inner, 0, root.clone());
        }
    }

    /// Release every subscription. Calling it again has no effect.
    pub fn detach(&self) {
        let mut inner = self.inner.borrow_mut();
        if !inner.detached {
            inner.detached = true;
            inner.clear_from(0);
        }
    }

    pub fn is_detached(&self) -> bool {
        self.inner.borrow().detached
    }

    pub fn path(&self) -> Rc<ResolvedPath> {
        self.inner.borrow().path.clone()
    }

    /// Number of hops that currently hold a subscription.
    pub fn subscription_count(&self) -> usize {
        self.inner.borrow().records.iter().flatten().count()
    }

    /// The object subscribed at `hop`, if it is still alive.
    pub fn subscribed_object(&self, hop: usize) -> Option<ObjectRef> {
        let inner = self.inner.borrow();
        inner
            .records
            .get(hop)?
            .as_ref()
            .and_then(|record| record.target.upgrade())
    }
}

impl Drop for LiveChainState {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.detached = true;
            inner.clear_from(0);
        }
    }
}

/// Subscribe to every object reachable from `start`, beginning at `from`.
fn walk(chain: &Rc<RefCell<ChainInner>>, from: usize, start: ObjectRef) {
    let path = chain.borrow().path.clone();
    let len = chain.borrow().records.len();
    let mut current = start;
    for hop in from..len {
        let Some(descriptor) = path.descriptor(hop) else {
            break;
        };
        if let Some(notifier) = current.notifier() {
            let token = {
                let mut inner = chain.borrow_mut();
                inner.next_token += 1;
                inner.next_token
            };
            let weak = Rc::downgrade(chain);
            let expected = descriptor.name();
            let handler = notifier.subscribe(Rc::new(move |args: &PropertyChangedArgs| {
                if args.affects(expected) {
                    hop_changed(&weak, hop, token);
                }
            }));
            chain.borrow_mut().records[hop] = Some(HopSubscription {
                target: Rc::downgrade(&current),
                handler,
                token,
            });
        }
        if hop + 1 == len {
            break;
        }
        match descriptor.get(&*current) {
            Some(Value::Object(next)) => current = next,
            _ => break,
        }
    }
}

fn hop_changed(chain: &Weak<RefCell<ChainInner>>, hop: usize, token: u64) {
    let Some(chain) = chain.upgrade() else {
        return;
    };
    let (target, on_changed) = {
        let Ok(mut inner) = chain.try_borrow_mut() else {
            tracing::trace!(hop, "change raised while the chain is updating, ignored");
            return;
        };
        if inner.detached {
            return;
        }
        let current = inner.records.get(hop).and_then(|r| r.as_ref());
        let Some(record) = current.filter(|record| record.token == token) else {
            return;
        };
        let target = record.target.upgrade();
        inner.clear_from(hop);
        (target, inner.on_changed.clone())
    };
    if let Some(target) = target {
        walk(&chain, hop, target);
    }
    tracing::trace!(hop, path = chain.borrow().path.path(), "path value changed");
    on_changed();
}
