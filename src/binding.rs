//! Property bindings between two object paths.
//!
//! A [`PropertyBinding`] keeps a target path (usually a UI property) and a
//! source path (usually a view-model property) in sync. Each update reads
//! one side, runs the value through the optional converter, resolves
//! deferred results, substitutes nulls, coerces, and writes the other side.

use std::{
    borrow::Cow,
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
    sync::Arc,
};

use crate::{
    accessor::AccessorRegistry,
    config::BindingConfig,
    convert::{coerce, null_substitute, ValueConverter},
    data_context::DataContext,
    deferred::{Continuation, DeferredPoll, DeferredValue},
    error::{BindingError, ConversionError},
    object::{ObjectRef, TypeInfo},
    path::{PathResolver, ResolvedPath},
    reactive::{HandlerId, NotifyPropertyChanged, PropertyChangedArgs},
    tracker::LiveChainState,
    unit::BindingUnit,
    value::{Value, ValueType},
};

/// Which directions a binding propagates in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BindingMode {
    /// Copy source to target once.
    OneTime,
    #[default]
    OneWay,
    OneWayToSource,
    TwoWay,
}

impl BindingMode {
    pub fn updates_target(self) -> bool {
        matches!(
            self,
            BindingMode::OneTime | BindingMode::OneWay | BindingMode::TwoWay
        )
    }

    pub fn updates_source(self) -> bool {
        matches!(self, BindingMode::OneWayToSource | BindingMode::TwoWay)
    }
}

/// What makes an endpoint push its value to the other side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UpdateTrigger {
    /// Only explicit update calls.
    None,
    /// Any change notification along the endpoint's path.
    #[default]
    PropertyChanged,
    /// A named UI event raised by the endpoint object.
    Event(Cow<'static, str>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    ToTarget,
    ToSource,
}

impl Direction {
    fn index(self) -> usize {
        match self {
            Direction::ToTarget => 0,
            Direction::ToSource => 1,
        }
    }
}

/// Outcome of one update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transfer {
    Written,
    /// Nothing to do: the mode forbids this direction, the binding is inert,
    /// a value was unavailable, or the write was refused.
    Skipped,
    /// The converter deferred its result; it is written when it arrives.
    Pending,
    /// The converted value does not fit the destination type.
    Rejected,
}

/// The object a binding path starts from.
#[derive(Clone)]
pub enum EndpointHolder {
    Object(ObjectRef),
    /// Follows whatever object the context currently holds.
    Context(Rc<DataContext>),
}

impl EndpointHolder {
    fn root_type(&self) -> &'static TypeInfo {
        match self {
            EndpointHolder::Object(object) => object.type_info(),
            EndpointHolder::Context(context) => context.declared_type(),
        }
    }

    /// The object the path is currently evaluated on.
    pub fn root(&self) -> Option<ObjectRef> {
        match self {
            EndpointHolder::Object(object) => Some(object.clone()),
            EndpointHolder::Context(context) => context.data(),
        }
    }
}

impl fmt::Debug for EndpointHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointHolder::Object(object) => write!(f, "Object({})", object.type_info().name()),
            EndpointHolder::Context(context) => {
                write!(f, "Context({})", context.declared_type().name())
            }
        }
    }
}

/// One side of a binding: a holder, a path and its trigger.
#[derive(Clone, Debug)]
pub struct Endpoint {
    pub holder: EndpointHolder,
    pub path: String,
    pub trigger: UpdateTrigger,
}

impl Endpoint {
    pub fn new(holder: EndpointHolder, path: impl Into<String>) -> Self {
        Self {
            holder,
            path: path.into(),
            trigger: UpdateTrigger::default(),
        }
    }

    pub fn object(object: ObjectRef, path: impl Into<String>) -> Self {
        Self::new(EndpointHolder::Object(object), path)
    }

    pub fn context(context: Rc<DataContext>, path: impl Into<String>) -> Self {
        Self::new(EndpointHolder::Context(context), path)
    }

    pub fn with_trigger(mut self, trigger: UpdateTrigger) -> Self {
        self.trigger = trigger;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SideKind {
    Target,
    Source,
}

impl SideKind {
    /// The direction a change on this side propagates in.
    fn propagates(self) -> Direction {
        match self {
            SideKind::Target => Direction::ToSource,
            SideKind::Source => Direction::ToTarget,
        }
    }
}

struct Side {
    holder: EndpointHolder,
    path: Rc<ResolvedPath>,
    trigger: UpdateTrigger,
    chain: RefCell<Option<LiveChainState>>,
    context_handler: Cell<Option<HandlerId>>,
    event_handler: Cell<Option<HandlerId>>,
}

impl Side {
    fn resolve(endpoint: &Endpoint) -> Side {
        Side {
            path: Rc::new(PathResolver::resolve(
                &endpoint.path,
                endpoint.holder.root_type(),
            )),
            holder: endpoint.holder.clone(),
            trigger: endpoint.trigger.clone(),
            chain: RefCell::new(None),
            context_handler: Cell::new(None),
            event_handler: Cell::new(None),
        }
    }

    fn read(&self, registry: &AccessorRegistry) -> Option<Value> {
        self.path.get(&self.holder.root()?, registry)
    }

    fn release(&self) {
        if let Some(chain) = self.chain.borrow_mut().take() {
            chain.detach();
        }
        if let Some(id) = self.context_handler.take() {
            if let EndpointHolder::Context(context) = &self.holder {
                context.data_changed().unsubscribe(id);
            }
        }
        if let Some(id) = self.event_handler.take() {
            if let Some(events) = self.holder.root().as_deref().and_then(|o| o.ui_events()) {
                events.unsubscribe(id);
            }
        }
    }

    fn is_watching(&self) -> bool {
        self.chain.borrow().is_some()
            || self.event_handler.get().is_some()
            || self.context_handler.get().is_some()
    }
}

impl Drop for Side {
    fn drop(&mut self) {
        self.release();
    }
}

/// Restores the re-entrancy flag when a write finishes.
struct UpdateGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> UpdateGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

struct BindingInner {
    label: String,
    mode: BindingMode,
    converter: Option<Rc<dyn ValueConverter>>,
    parameter: Option<Value>,
    config: BindingConfig,
    registry: Arc<AccessorRegistry>,
    target: Side,
    source: Side,
    /// A one-time binding has copied its value.
    spent: Cell<bool>,
    /// A write is in progress; updates it triggers are dropped.
    updating: Cell<bool>,
    /// An update dropped by the guard, re-checked once the write is done.
    suppressed: Cell<Option<Direction>>,
    /// A changed value is being sent back; its own echo is not followed.
    settling: Cell<bool>,
    /// Per-direction request counter; only the newest deferred result is
    /// written.
    generations: [Cell<u64>; 2],
}

/// A live binding between a target path and a source path.
///
/// Subscriptions are held for as long as the binding lives and released
/// when it is dropped or [`PropertyBinding::detach`]ed.
pub struct PropertyBinding {
    inner: Rc<BindingInner>,
}

impl PropertyBinding {
    /// Resolve both paths, subscribe according to the mode and triggers, and
    /// perform the initial synchronisation.
    ///
    /// With [`BindingConfig::strict_paths`] an unresolvable path is an error;
    /// otherwise it produces an inert binding that never transfers.
    pub fn new(unit: &BindingUnit) -> Result<Self, BindingError> {
        let target = Side::resolve(&unit.target);
        let source = Side::resolve(&unit.source);
        let label = unit.label.clone().unwrap_or_else(|| {
            format!("{} <- {}", unit.target.path, unit.source.path)
        });

        if unit.config.strict_paths {
            if let Some(err) = target.path.error().or(source.path.error()) {
                return Err(BindingError::Path {
                    binding: label,
                    source: err.clone(),
                });
            }
        }

        let inner = Rc::new(BindingInner {
            label,
            mode: unit.mode,
            converter: unit.converter.clone(),
            parameter: unit.parameter.clone(),
            config: unit.config.clone(),
            registry: unit
                .registry
                .clone()
                .unwrap_or_else(AccessorRegistry::global),
            target,
            source,
            spent: Cell::new(false),
            updating: Cell::new(false),
            suppressed: Cell::new(None),
            settling: Cell::new(false),
            generations: [Cell::new(0), Cell::new(0)],
        });

        if inner.is_inert() {
            tracing::warn!(binding = %inner.label, "binding is inert, a path did not resolve");
            return Ok(Self { inner });
        }

        if inner.mode.updates_target() && inner.mode != BindingMode::OneTime {
            BindingInner::watch(&inner, SideKind::Source);
        }
        if inner.mode.updates_source() {
            BindingInner::watch(&inner, SideKind::Target);
        }
        tracing::debug!(binding = %inner.label, mode = ?inner.mode, "binding attached");

        if inner.config.initial_sync {
            let direction = if inner.mode == BindingMode::OneWayToSource {
                Direction::ToSource
            } else {
                Direction::ToTarget
            };
            inner.update(direction)?;
        }
        Ok(Self { inner })
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn mode(&self) -> BindingMode {
        self.inner.mode
    }

    /// Whether a path failed to resolve, making every update a no-op.
    pub fn is_inert(&self) -> bool {
        self.inner.is_inert()
    }

    pub fn source_path(&self) -> Rc<ResolvedPath> {
        self.inner.source.path.clone()
    }

    pub fn target_path(&self) -> Rc<ResolvedPath> {
        self.inner.target.path.clone()
    }

    /// Copy the source value to the target now.
    pub fn update_target_from_source(&self) -> Result<Transfer, BindingError> {
        self.inner.update(Direction::ToTarget)
    }

    /// Copy the target value to the source now.
    pub fn update_source_from_target(&self) -> Result<Transfer, BindingError> {
        self.inner.update(Direction::ToSource)
    }

    /// Whether any change subscription is still held.
    pub fn is_attached(&self) -> bool {
        self.inner.target.is_watching() || self.inner.source.is_watching()
    }

    /// Release every subscription. Explicit updates keep working.
    pub fn detach(&self) {
        self.inner.target.release();
        self.inner.source.release();
        tracing::debug!(binding = %self.inner.label, "binding detached");
    }
}

impl fmt::Debug for PropertyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("label", &self.inner.label)
            .field("mode", &self.inner.mode)
            .field("target", &self.inner.target.path)
            .field("source", &self.inner.source.path)
            .finish()
    }
}

impl BindingInner {
    fn is_inert(&self) -> bool {
        !self.target.path.is_valid() || !self.source.path.is_valid()
    }

    fn side(&self, kind: SideKind) -> &Side {
        match kind {
            SideKind::Target => &self.target,
            SideKind::Source => &self.source,
        }
    }

    /// `(from, to)` for a direction.
    fn sides(&self, direction: Direction) -> (&Side, &Side) {
        match direction {
            Direction::ToTarget => (&self.source, &self.target),
            Direction::ToSource => (&self.target, &self.source),
        }
    }

    fn watch(this: &Rc<Self>, kind: SideKind) {
        let side = this.side(kind);
        let direction = kind.propagates();
        match &side.trigger {
            UpdateTrigger::None => return,
            UpdateTrigger::PropertyChanged => {
                let weak = Rc::downgrade(this);
                let chain = LiveChainState::attach(
                    side.path.clone(),
                    side.holder.root().as_ref(),
                    move || {
                        if let Some(inner) = weak.upgrade() {
                            inner.react(direction);
                        }
                    },
                );
                *side.chain.borrow_mut() = Some(chain);
            }
            UpdateTrigger::Event(event) => {
                let events = match &side.holder {
                    EndpointHolder::Object(object) => object.ui_events(),
                    EndpointHolder::Context(_) => None,
                };
                let Some(events) = events else {
                    tracing::warn!(
                        binding = %this.label,
                        event = %event,
                        "endpoint raises no UI events, trigger ignored"
                    );
                    return;
                };
                let weak = Rc::downgrade(this);
                let id = events.subscribe(
                    event.clone(),
                    Rc::new(move |_event: &str| {
                        if let Some(inner) = weak.upgrade() {
                            inner.react(direction);
                        }
                    }),
                );
                side.event_handler.set(Some(id));
            }
        }

        if let EndpointHolder::Context(context) = &side.holder {
            let weak = Rc::downgrade(this);
            let id = context
                .data_changed()
                .subscribe(Rc::new(move |args: &PropertyChangedArgs| {
                    if !args.affects(DataContext::DATA) {
                        return;
                    }
                    if let Some(inner) = weak.upgrade() {
                        inner.context_changed(kind);
                    }
                }));
            side.context_handler.set(Some(id));
        }
    }

    fn context_changed(self: &Rc<Self>, kind: SideKind) {
        let side = self.side(kind);
        if let Some(chain) = side.chain.borrow().as_ref() {
            chain.rebind(side.holder.root().as_ref());
        }
        self.react(kind.propagates());
    }

    /// Update in response to a notification; errors have no caller to go to.
    fn react(self: &Rc<Self>, direction: Direction) {
        if let Err(err) = self.update(direction) {
            tracing::error!(binding = %self.label, error = %err, "binding update failed");
        }
    }

    fn update(self: &Rc<Self>, direction: Direction) -> Result<Transfer, BindingError> {
        let allowed = match direction {
            Direction::ToTarget => self.mode.updates_target(),
            Direction::ToSource => self.mode.updates_source(),
        };
        if !allowed || self.is_inert() {
            return Ok(Transfer::Skipped);
        }
        if self.updating.get() {
            tracing::trace!(binding = %self.label, ?direction, "update suppressed while writing");
            self.suppressed.set(Some(direction));
            return Ok(Transfer::Skipped);
        }
        let one_time = self.mode == BindingMode::OneTime;
        if one_time && self.spent.get() {
            return Ok(Transfer::Skipped);
        }

        let (from, to) = self.sides(direction);
        let Some(raw) = from.read(&self.registry) else {
            return Ok(Transfer::Skipped);
        };
        if one_time {
            self.spent.set(true);
        }
        let Some(declared) = to.path.terminal_type() else {
            return Ok(Transfer::Skipped);
        };

        let generation = &self.generations[direction.index()];
        generation.set(generation.get() + 1);
        let request = generation.get();

        let value = match &self.converter {
            Some(converter) => {
                let parameter = self.parameter.as_ref();
                let culture = &self.config.culture;
                let converted = match direction {
                    Direction::ToTarget => converter.convert(raw, declared, parameter, culture),
                    Direction::ToSource => {
                        converter.convert_back(raw, declared, parameter, culture)
                    }
                };
                match converted {
                    Ok(value) => value,
                    Err(ConversionError::Unsupported) => {
                        return Err(BindingError::Conversion {
                            binding: self.label.clone(),
                            source: ConversionError::Unsupported,
                        });
                    }
                    Err(err) => {
                        self.report_rejected(direction, &err);
                        return Ok(Transfer::Rejected);
                    }
                }
            }
            None => raw,
        };

        match value {
            Value::Deferred(deferred) => Ok(self.await_deferred(direction, request, &*deferred)),
            value => Ok(self.write(direction, value)),
        }
    }

    /// Write a deferred result now if it is ready, or once it arrives unless
    /// a newer request in the same direction was made by then.
    fn await_deferred(
        self: &Rc<Self>,
        direction: Direction,
        request: u64,
        deferred: &dyn DeferredValue,
    ) -> Transfer {
        let delivered = Rc::new(Cell::new(false));
        let continuation: Continuation = {
            let delivered = delivered.clone();
            let weak = Rc::downgrade(self);
            Box::new(move |ready: Value| {
                if delivered.replace(true) {
                    return;
                }
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if inner.generations[direction.index()].get() != request {
                    tracing::trace!(binding = %inner.label, ?direction, "stale deferred result dropped");
                    return;
                }
                let outcome = inner.write(direction, ready);
                tracing::trace!(binding = %inner.label, ?direction, ?outcome, "deferred result delivered");
            })
        };
        match deferred.poll_or_register(continuation) {
            DeferredPoll::Ready(_) if delivered.get() => Transfer::Skipped,
            DeferredPoll::Ready(ready) => {
                delivered.set(true);
                self.write(direction, ready)
            }
            DeferredPoll::Pending => Transfer::Pending,
        }
    }

    /// Null substitution, coercion and the final type check, then the write.
    fn write(self: &Rc<Self>, direction: Direction, value: Value) -> Transfer {
        let (_, to) = self.sides(direction);
        let Some(declared) = to.path.terminal_type() else {
            return Transfer::Skipped;
        };
        let value = if value.is_null() {
            null_substitute(declared)
        } else if self.converter.is_none() {
            match coerce(value, declared) {
                Ok(value) => value,
                Err(err) => {
                    self.report_rejected(direction, &err);
                    return Transfer::Rejected;
                }
            }
        } else {
            value
        };
        if !declared.is_assignable_from(&value) {
            let err = ConversionError::mismatch(value.type_name(), declared.name());
            self.report_rejected(direction, &err);
            return Transfer::Rejected;
        }
        let Some(root) = to.holder.root() else {
            return Transfer::Skipped;
        };

        let stored = {
            let _guard = UpdateGuard::enter(&self.updating);
            to.path.set(&root, value.clone(), &self.registry)
        };
        let suppressed = self.suppressed.take();
        if !stored {
            return self.refused(direction, &root, &value, declared);
        }

        // The destination may have replaced the value while it was being
        // written. Only a plain echo of the written value is dropped.
        if let Some(back) = suppressed.filter(|back| *back != direction) {
            let now = to.read(&self.registry);
            if !self.settling.get() && now.as_ref().is_some_and(|now| *now != value) {
                tracing::trace!(binding = %self.label, ?back, "destination changed the written value");
                let _settling = UpdateGuard::enter(&self.settling);
                self.react(back);
            }
        }
        Transfer::Written
    }

    /// A write the destination did not take. A null object on the way is an
    /// expected state; anything else is a value the property cannot hold.
    fn refused(
        &self,
        direction: Direction,
        root: &ObjectRef,
        value: &Value,
        declared: ValueType,
    ) -> Transfer {
        let (_, to) = self.sides(direction);
        let owner = to
            .path
            .len()
            .checked_sub(1)
            .and_then(|last| to.path.object_at(root, last));
        if matches!(owner, Some(None)) || !to.path.can_write() {
            return Transfer::Skipped;
        }
        let err = ConversionError::mismatch(value.type_name(), declared.name());
        self.report_rejected(direction, &err);
        Transfer::Rejected
    }

    fn report_rejected(&self, direction: Direction, err: &ConversionError) {
        match err {
            ConversionError::TypeMismatch { from, to } => tracing::error!(
                binding = %self.label,
                ?direction,
                from = %from,
                to = %to,
                "value type does not match the destination, update abandoned"
            ),
            other => tracing::error!(
                binding = %self.label,
                ?direction,
                error = %other,
                "conversion failed, update abandoned"
            ),
        }
    }
}
