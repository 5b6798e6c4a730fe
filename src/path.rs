//! Property-path resolution and access.
//!
//! A path is a dotted chain of property names such as `"Owner.Address.City"`,
//! resolved once against a root [`TypeInfo`]. The special path `"this"`
//! denotes the root object itself. Resolution never fails loudly: an
//! unresolvable path yields an invalid [`ResolvedPath`] that reads as
//! unavailable and ignores writes.

use std::{cell::OnceCell, fmt, sync::Arc};

use smallvec::SmallVec;

use crate::{
    accessor::{AccessorRegistry, Accessors, Lookup, PathKey},
    error::{PathResolutionError, UnresolvedReason},
    object::{ObjectRef, PropertyDescriptor, TypeInfo},
    value::{Value, ValueType},
};

/// The path naming the root object itself.
pub const IDENTITY_PATH: &str = "this";

pub struct PathResolver;

impl PathResolver {
    /// Resolve `path` against `root`. Failures are logged and produce an
    /// invalid path.
    pub fn resolve(path: &str, root: &'static TypeInfo) -> ResolvedPath {
        Self::resolve_inner(path, root).unwrap_or_else(|(partial, err)| {
            tracing::warn!(path, root = root.name(), error = %err, "binding path does not resolve");
            partial
        })
    }

    /// Resolve `path` against `root`, reporting the first segment that does
    /// not resolve.
    pub fn try_resolve(
        path: &str,
        root: &'static TypeInfo,
    ) -> Result<ResolvedPath, PathResolutionError> {
        Self::resolve_inner(path, root).map_err(|(_, err)| err)
    }

    fn resolve_inner(
        path: &str,
        root: &'static TypeInfo,
    ) -> Result<ResolvedPath, (ResolvedPath, PathResolutionError)> {
        let mut resolved = ResolvedPath {
            text: path.to_string(),
            root,
            hops: SmallVec::new(),
            valid: true,
            error: None,
            accessors: OnceCell::new(),
        };
        if path == IDENTITY_PATH {
            return Ok(resolved);
        }

        let segments: SmallVec<[&str; 4]> = path.split('.').collect();
        resolved.hops = SmallVec::from_elem(None, segments.len());

        let mut current = Some(root);
        for (index, segment) in segments.iter().enumerate() {
            let failure = |type_name: &str, reason| PathResolutionError {
                path: path.to_string(),
                segment: segment.to_string(),
                index,
                type_name: type_name.to_string(),
                reason,
            };
            let Some(owner) = current else {
                let previous = resolved.hops[index - 1]
                    .map_or("?", |d: &PropertyDescriptor| d.value_type().name());
                return Err(resolved.fail(failure(previous, UnresolvedReason::NotAnObject)));
            };
            if segment.is_empty() {
                return Err(resolved.fail(failure(owner.name(), UnresolvedReason::EmptySegment)));
            }
            let Some(descriptor) = owner.find_property(segment) else {
                return Err(resolved.fail(failure(owner.name(), UnresolvedReason::NoSuchProperty)));
            };
            resolved.hops[index] = Some(descriptor);
            current = descriptor.value_type().object_type();
        }
        Ok(resolved)
    }
}

/// A path resolved against a root type.
///
/// Holds one descriptor per segment. In an invalid path the hops from the
/// first unresolvable segment on are empty.
pub struct ResolvedPath {
    text: String,
    root: &'static TypeInfo,
    hops: SmallVec<[Option<&'static PropertyDescriptor>; 4]>,
    valid: bool,
    error: Option<PathResolutionError>,
    accessors: OnceCell<Option<Arc<Accessors>>>,
}

impl ResolvedPath {
    fn fail(mut self, err: PathResolutionError) -> (Self, PathResolutionError) {
        self.valid = false;
        self.error = Some(err.clone());
        (self, err)
    }

    pub fn path(&self) -> &str {
        &self.text
    }

    pub fn root_type(&self) -> &'static TypeInfo {
        self.root
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_identity(&self) -> bool {
        self.valid && self.hops.is_empty()
    }

    pub fn error(&self) -> Option<&PathResolutionError> {
        self.error.as_ref()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Descriptor of segment `hop`, `None` if it did not resolve.
    pub fn descriptor(&self, hop: usize) -> Option<&'static PropertyDescriptor> {
        self.hops.get(hop).copied().flatten()
    }

    /// Declared type of the value the path reads, `None` if invalid.
    pub fn terminal_type(&self) -> Option<ValueType> {
        if !self.valid {
            return None;
        }
        match self.hops.last() {
            Some(last) => last.map(|d| d.value_type()),
            None => Some(ValueType::Object(self.root)),
        }
    }

    pub fn can_write(&self) -> bool {
        self.valid && self.hops.last().copied().flatten().is_some_and(|d| d.can_write())
    }

    /// Structural identity, `None` for invalid and identity paths.
    pub fn key(&self) -> Option<PathKey> {
        if !self.valid || self.hops.is_empty() {
            return None;
        }
        Some(PathKey::new(self.hops.iter().flatten().map(|d| d.key())))
    }

    /// Registered fast accessors. The registry answer is remembered once
    /// the registry is ready.
    pub fn accessors(&self, registry: &AccessorRegistry) -> Option<Arc<Accessors>> {
        if let Some(cached) = self.accessors.get() {
            return cached.clone();
        }
        let key = self.key()?;
        match registry.lookup(&key) {
            Lookup::NotReady => None,
            Lookup::Hit(accessors) => {
                let _ = self.accessors.set(Some(accessors.clone()));
                Some(accessors)
            }
            Lookup::Miss => {
                let _ = self.accessors.set(None);
                None
            }
        }
    }

    /// Whether a registry answer has been remembered.
    pub fn has_cached_lookup(&self) -> bool {
        self.accessors.get().is_some()
    }

    /// Read the value at the end of the path.
    ///
    /// `None` when the path is invalid or an object along the way is not of
    /// the resolved type. A null intermediate reads as [`Value::Null`].
    pub fn get(&self, root: &ObjectRef, registry: &AccessorRegistry) -> Option<Value> {
        if !self.valid {
            return None;
        }
        if let Some(accessors) = self.accessors(registry) {
            return Some(accessors.get(root));
        }
        self.get_reflect(root)
    }

    /// Read through the reflection tables only.
    pub fn get_reflect(&self, root: &ObjectRef) -> Option<Value> {
        if !self.valid {
            return None;
        }
        let Some(last) = self.hops.len().checked_sub(1) else {
            return Some(Value::Object(root.clone()));
        };
        match self.object_at(root, last)? {
            Some(owner) => self.descriptor(last)?.get(&*owner),
            None => Some(Value::Null),
        }
    }

    /// Write the value at the end of the path. Returns `false` if nothing
    /// was written: invalid, identity or read-only paths, a null
    /// intermediate, or a value the property rejects.
    pub fn set(&self, root: &ObjectRef, value: Value, registry: &AccessorRegistry) -> bool {
        if !self.can_write() {
            return false;
        }
        if let Some(written) = self
            .accessors(registry)
            .and_then(|accessors| accessors.set(root, value.clone()))
        {
            return written;
        }
        self.set_reflect(root, value)
    }

    /// Write through the reflection tables only.
    pub fn set_reflect(&self, root: &ObjectRef, value: Value) -> bool {
        if !self.can_write() {
            return false;
        }
        let last = self.hops.len() - 1;
        match (self.object_at(root, last), self.descriptor(last)) {
            (Some(Some(owner)), Some(descriptor)) => descriptor.set(&*owner, value),
            _ => false,
        }
    }

    /// The object on which segment `hop` is read.
    ///
    /// `Some(None)` when an earlier segment reads null, `None` when an
    /// object along the way does not have the resolved type.
    pub fn object_at(&self, root: &ObjectRef, hop: usize) -> Option<Option<ObjectRef>> {
        let mut current = root.clone();
        for index in 0..hop {
            match self.descriptor(index)?.get(&*current)? {
                Value::Object(next) => current = next,
                Value::Null => return Some(None),
                _ => return None,
            }
        }
        Some(Some(current))
    }
}

impl fmt::Debug for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedPath")
            .field("path", &self.text)
            .field("root", &self.root.name())
            .field("valid", &self.valid)
            .field("terminal", &self.terminal_type())
            .finish()
    }
}
