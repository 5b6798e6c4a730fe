//! Pre-generated fast accessors for resolved paths.
//!
//! The registry maps a path key (the chain of property declarations a path
//! resolves to) to a getter/setter pair that skips per-hop reflection. It
//! moves through three phases:
//!
//! - `Open`: accepting registrations, lookups report [`Lookup::NotReady`].
//! - `Ready`: registration is complete, the first lookup seals it.
//! - `Sealed`: lookups are answered, registrations are rejected.
//!
//! A path only caches a lookup answer once the registry is ready, so paths
//! resolved early still pick up accessors registered afterwards.

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    error::RegistryError,
    object::{ObjectRef, PropertyKey, TypeInfo},
    path::PathResolver,
    value::Value,
};

pub type AccessorGetter = Arc<dyn Fn(&ObjectRef) -> Value + Send + Sync>;
pub type AccessorSetter = Arc<dyn Fn(&ObjectRef, Value) -> bool + Send + Sync>;

/// A generated getter with an optional setter for one path.
#[derive(Clone)]
pub struct Accessors {
    getter: AccessorGetter,
    setter: Option<AccessorSetter>,
}

impl Accessors {
    pub fn new(getter: impl Fn(&ObjectRef) -> Value + Send + Sync + 'static) -> Self {
        Self {
            getter: Arc::new(getter),
            setter: None,
        }
    }

    pub fn with_setter(
        mut self,
        setter: impl Fn(&ObjectRef, Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.setter = Some(Arc::new(setter));
        self
    }

    pub fn get(&self, root: &ObjectRef) -> Value {
        (self.getter)(root)
    }

    /// `None` when no setter was registered.
    pub fn set(&self, root: &ObjectRef, value: Value) -> Option<bool> {
        self.setter.as_ref().map(|setter| setter(root, value))
    }

    pub fn can_write(&self) -> bool {
        self.setter.is_some()
    }
}

/// Structural identity of a resolved path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathKey(SmallVec<[PropertyKey; 4]>);

impl PathKey {
    pub fn new(hops: impl IntoIterator<Item = PropertyKey>) -> Self {
        Self(hops.into_iter().collect())
    }

    pub fn hops(&self) -> &[PropertyKey] {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryPhase {
    Open,
    Ready,
    Sealed,
}

pub enum Lookup {
    /// Registration is still running; ask again later.
    NotReady,
    Hit(Arc<Accessors>),
    Miss,
}

struct RegistryState {
    phase: RegistryPhase,
    entries: FxHashMap<PathKey, Arc<Accessors>>,
}

pub struct AccessorRegistry {
    state: RwLock<RegistryState>,
}

static GLOBAL: LazyLock<Arc<AccessorRegistry>> =
    LazyLock::new(|| Arc::new(AccessorRegistry::new()));

impl Default for AccessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessorRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState {
                phase: RegistryPhase::Open,
                entries: FxHashMap::default(),
            }),
        }
    }

    /// The process-wide registry used when a binding names no other.
    pub fn global() -> Arc<AccessorRegistry> {
        GLOBAL.clone()
    }

    pub fn phase(&self) -> RegistryPhase {
        self.state.read().phase
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn register(&self, key: PathKey, accessors: Accessors) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        if state.phase == RegistryPhase::Sealed {
            tracing::warn!(?key, "registration after the accessor registry was sealed");
            return Err(RegistryError::Sealed);
        }
        state.entries.insert(key, Arc::new(accessors));
        Ok(())
    }

    /// Resolve `path` against `root` and register accessors for it.
    pub fn register_path(
        &self,
        root: &'static TypeInfo,
        path: &str,
        accessors: Accessors,
    ) -> Result<(), RegistryError> {
        let resolved = PathResolver::try_resolve(path, root)?;
        let key = resolved.key().ok_or(RegistryError::IdentityPath)?;
        self.register(key, accessors)
    }

    /// End the registration phase. Has no effect once sealed.
    pub fn mark_ready(&self) {
        let mut state = self.state.write();
        if state.phase == RegistryPhase::Open {
            state.phase = RegistryPhase::Ready;
            tracing::debug!(entries = state.entries.len(), "accessor registry ready");
        }
    }

    pub fn lookup(&self, key: &PathKey) -> Lookup {
        {
            let state = self.state.read();
            match state.phase {
                RegistryPhase::Open => return Lookup::NotReady,
                RegistryPhase::Sealed => return Self::answer(&state, key),
                RegistryPhase::Ready => {}
            }
        }
        let mut state = self.state.write();
        if state.phase == RegistryPhase::Ready {
            state.phase = RegistryPhase::Sealed;
            tracing::debug!(entries = state.entries.len(), "accessor registry sealed");
        }
        Self::answer(&state, key)
    }

    fn answer(state: &RegistryState, key: &PathKey) -> Lookup {
        match state.entries.get(key) {
            Some(accessors) => Lookup::Hit(accessors.clone()),
            None => Lookup::Miss,
        }
    }
}
