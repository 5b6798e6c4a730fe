//! Keeping a panel of item controls in step with an observable list.
//!
//! The [`CollectionSyncEngine`] owns one `(model, control)` pair per item.
//! Controls come from an [`ItemTemplate`] through a [`ControlStrategy`],
//! either instantiated and destroyed on demand or recycled from a pool.
//! [`ItemsControl`] connects an engine to an [`ObservableList`] source.

use std::{
    any::Any,
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    rc::{Rc, Weak},
    sync::OnceLock,
};

use crate::{
    data_context::DataContext,
    object::{
        downcast_object, downcast_rc, same_object, Object, ObjectRef, PropertyDescriptor,
        PropertySetter, TypeInfo, ViewModel,
    },
    reactive::{
        CollectionAction, CollectionChangedArgs, HandlerId, NotifyCollectionChanged,
        NotifyPropertyChanged, ObservableList, PropertyChanged, PropertyChangedHandler,
    },
    value::{Value, ValueType},
};

/// An observable list of bindable items.
pub type ItemList = ObservableList<ObjectRef>;

/// A UI element presenting one item.
pub trait ItemControl {
    /// Where the item is published so the control's own bindings follow it.
    fn data_context(&self) -> Option<&DataContext> {
        None
    }

    /// Shown and taking part in layout, or parked in a pool.
    fn set_active(&self, active: bool) {
        let _ = active;
    }

    /// Selection visual.
    fn set_selected(&self, selected: bool) {
        let _ = selected;
    }

    /// Release the control for good.
    fn destroy(&self) {}
}

pub type ControlRef = Rc<dyn ItemControl>;

/// The container item controls are attached to.
pub trait ItemsPanel {
    fn add_child(&self, control: &ControlRef);

    fn remove_child(&self, control: &ControlRef);
}

fn same_control(a: &ControlRef, b: &ControlRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Factory of item controls. Clones share identity.
#[derive(Clone)]
pub struct ItemTemplate {
    name: Rc<str>,
    factory: Rc<dyn Fn() -> ControlRef>,
}

impl ItemTemplate {
    pub fn new(name: &str, factory: impl Fn() -> ControlRef + 'static) -> Self {
        Self {
            name: Rc::from(name),
            factory: Rc::new(factory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instantiate(&self) -> ControlRef {
        (self.factory)()
    }

    pub fn same(&self, other: &ItemTemplate) -> bool {
        Rc::ptr_eq(&self.factory, &other.factory)
    }
}

impl fmt::Debug for ItemTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ItemTemplate").field(&self.name).finish()
    }
}

/// Picks a template per item, `None` to fall back to the default template.
pub type TemplateSelector = Rc<dyn Fn(&ObjectRef) -> Option<ItemTemplate>>;

/// How item controls are obtained and given back.
pub trait ControlStrategy {
    /// A control from `template`, attached to `panel` and active.
    fn create(&mut self, template: &ItemTemplate, panel: &dyn ItemsPanel) -> ControlRef;

    fn release(&mut self, control: ControlRef, panel: &dyn ItemsPanel);
}

/// Instantiate on create, remove and destroy on release.
#[derive(Clone, Copy, Debug, Default)]
pub struct Instantiate;

impl ControlStrategy for Instantiate {
    fn create(&mut self, template: &ItemTemplate, panel: &dyn ItemsPanel) -> ControlRef {
        let control = template.instantiate();
        panel.add_child(&control);
        control
    }

    fn release(&mut self, control: ControlRef, panel: &dyn ItemsPanel) {
        panel.remove_child(&control);
        control.destroy();
    }
}

struct PoolEntry {
    control: ControlRef,
    template: ItemTemplate,
    mapped: bool,
}

/// Reuse released controls instead of destroying them.
///
/// The pool grows when every control of the requested template is in use
/// and never shrinks; pooled controls stay attached to the panel and are
/// only deactivated.
#[derive(Default)]
pub struct Pooling {
    entries: Vec<PoolEntry>,
}

impl Pooling {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pool pre-filled with `size` inactive controls from `template`.
    pub fn prefilled(template: &ItemTemplate, size: usize, panel: &dyn ItemsPanel) -> Self {
        let mut pool = Self::new();
        for _ in 0..size {
            let control = template.instantiate();
            panel.add_child(&control);
            control.set_active(false);
            pool.entries.push(PoolEntry {
                control,
                template: template.clone(),
                mapped: false,
            });
        }
        pool
    }

    /// Controls ever instantiated by this pool.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn mapped(&self) -> usize {
        self.entries.iter().filter(|e| e.mapped).count()
    }
}

impl ControlStrategy for Pooling {
    fn create(&mut self, template: &ItemTemplate, panel: &dyn ItemsPanel) -> ControlRef {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| !e.mapped && e.template.same(template))
        {
            entry.mapped = true;
            entry.control.set_active(true);
            return entry.control.clone();
        }
        let control = template.instantiate();
        panel.add_child(&control);
        control.set_active(true);
        self.entries.push(PoolEntry {
            control: control.clone(),
            template: template.clone(),
            mapped: true,
        });
        tracing::trace!(template = template.name(), capacity = self.entries.len(), "control pool grew");
        control
    }

    fn release(&mut self, control: ControlRef, panel: &dyn ItemsPanel) {
        match self
            .entries
            .iter_mut()
            .find(|e| same_control(&e.control, &control))
        {
            Some(entry) => {
                entry.mapped = false;
                control.set_active(false);
            }
            None => {
                panel.remove_child(&control);
                control.destroy();
            }
        }
    }
}

/// A model item and the control presenting it.
#[derive(Clone)]
pub struct CollectionItem {
    pub model: ObjectRef,
    pub control: ControlRef,
}

/// Mirrors collection-changed events onto a panel of item controls.
pub struct CollectionSyncEngine {
    items: Vec<CollectionItem>,
    template: ItemTemplate,
    selector: Option<TemplateSelector>,
    panel: Rc<dyn ItemsPanel>,
    strategy: Box<dyn ControlStrategy>,
}

impl CollectionSyncEngine {
    pub fn new(template: ItemTemplate, panel: Rc<dyn ItemsPanel>) -> Self {
        Self {
            items: Vec::new(),
            template,
            selector: None,
            panel,
            strategy: Box::new(Instantiate),
        }
    }

    pub fn with_strategy(mut self, strategy: impl ControlStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    pub fn with_template_selector(mut self, selector: TemplateSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn items(&self) -> &[CollectionItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index_of(&self, model: &ObjectRef) -> Option<usize> {
        self.items.iter().position(|i| same_object(&i.model, model))
    }

    pub fn control_for(&self, model: &ObjectRef) -> Option<ControlRef> {
        self.index_of(model).map(|i| self.items[i].control.clone())
    }

    /// Apply one change. `snapshot` supplies the full source contents for
    /// a reset.
    pub fn apply(
        &mut self,
        change: &CollectionChangedArgs<ObjectRef>,
        snapshot: impl FnOnce() -> Vec<ObjectRef>,
    ) {
        match change.action {
            CollectionAction::Add => self.add(&change.new_items),
            CollectionAction::Remove => self.remove(&change.old_items),
            CollectionAction::Replace | CollectionAction::Move => {
                self.remove(&change.old_items);
                self.add(&change.new_items);
            }
            CollectionAction::Reset => self.reset(&snapshot()),
        }
    }

    /// Release every control and rebuild from `models`.
    pub fn reset(&mut self, models: &[ObjectRef]) {
        self.clear();
        self.add(models);
    }

    pub fn clear(&mut self) {
        for item in std::mem::take(&mut self.items) {
            self.strategy.release(item.control, &*self.panel);
        }
    }

    fn add(&mut self, models: &[ObjectRef]) {
        for model in models {
            let template = self
                .selector
                .as_ref()
                .and_then(|select| select(model))
                .unwrap_or_else(|| self.template.clone());
            let control = self.strategy.create(&template, &*self.panel);
            if let Some(context) = control.data_context() {
                if let Err(err) = context.set_data(Some(model.clone())) {
                    tracing::warn!(template = template.name(), error = %err, "item does not fit the template's data context");
                }
            }
            self.items.push(CollectionItem {
                model: model.clone(),
                control,
            });
        }
    }

    fn remove(&mut self, models: &[ObjectRef]) {
        for model in models {
            match self.index_of(model) {
                Some(index) => {
                    let item = self.items.remove(index);
                    self.strategy.release(item.control, &*self.panel);
                }
                None => tracing::warn!(
                    item = model.type_info().name(),
                    "removed item has no control"
                ),
            }
        }
    }
}

struct ItemsInner {
    engine: RefCell<CollectionSyncEngine>,
    source: RefCell<Option<(ItemList, HandlerId)>>,
    /// Changes waiting for the current apply to finish. A reset carries
    /// the source contents as they were when it was raised.
    pending: RefCell<VecDeque<(CollectionChangedArgs<ObjectRef>, Option<Vec<ObjectRef>>)>>,
    changed: PropertyChanged,
    applied: Cell<u64>,
}

impl Drop for ItemsInner {
    fn drop(&mut self) {
        if let Some((list, id)) = self.source.get_mut().take() {
            list.unsubscribe_collection(id);
        }
    }
}

/// A control that presents the items of an [`ItemList`].
///
/// Changes raised while an earlier change is still being applied are queued
/// and applied in order. After each batch `"Items"` is raised, and `"Count"`
/// when the number of presented items changed.
#[derive(Clone)]
pub struct ItemsControl {
    inner: Rc<ItemsInner>,
}

impl ItemsControl {
    pub const ITEMS: &'static str = "Items";
    pub const ITEMS_SOURCE: &'static str = "ItemsSource";
    pub const COUNT: &'static str = "Count";

    pub fn new(engine: CollectionSyncEngine) -> Self {
        Self {
            inner: Rc::new(ItemsInner {
                engine: RefCell::new(engine),
                source: RefCell::new(None),
                pending: RefCell::new(VecDeque::new()),
                changed: PropertyChanged::new(),
                applied: Cell::new(0),
            }),
        }
    }

    pub fn items_source(&self) -> Option<ItemList> {
        self.inner.source.borrow().as_ref().map(|(list, _)| list.clone())
    }

    /// Present `source`, replacing the current one. Controls are rebuilt
    /// from its contents.
    pub fn set_items_source(&self, source: Option<ItemList>) {
        let unchanged = match (&*self.inner.source.borrow(), &source) {
            (Some((current, _)), Some(new)) => current.ptr_eq(new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }
        if let Some((old, id)) = self.inner.source.borrow_mut().take() {
            old.unsubscribe_collection(id);
        }
        if let Some(list) = &source {
            let weak = Rc::downgrade(&self.inner);
            let id = list.subscribe_collection(Rc::new(
                move |change: &CollectionChangedArgs<ObjectRef>| {
                    if let Some(inner) = weak.upgrade() {
                        ItemsControl::on_collection_changed(&inner, change.clone());
                    }
                },
            ));
            *self.inner.source.borrow_mut() = Some((list.clone(), id));
        }
        Self::on_collection_changed(&self.inner, CollectionChangedArgs::reset());
        self.inner.changed.raise(Self::ITEMS_SOURCE);
    }

    fn on_collection_changed(inner: &Rc<ItemsInner>, change: CollectionChangedArgs<ObjectRef>) {
        let snapshot = (change.action == CollectionAction::Reset).then(|| {
            inner
                .source
                .borrow()
                .as_ref()
                .map(|(list, _)| list.snapshot())
                .unwrap_or_default()
        });
        {
            let mut pending = inner.pending.borrow_mut();
            if snapshot.is_some() {
                // Everything queued so far is already part of the snapshot.
                pending.clear();
            }
            pending.push_back((change, snapshot));
        }
        let Ok(mut engine) = inner.engine.try_borrow_mut() else {
            tracing::trace!("collection changed during apply, queued");
            return;
        };
        let before = engine.len();
        loop {
            let next = inner.pending.borrow_mut().pop_front();
            let Some((change, snapshot)) = next else {
                break;
            };
            engine.apply(&change, || snapshot.unwrap_or_default());
            inner.applied.set(inner.applied.get() + 1);
        }
        let after = engine.len();
        drop(engine);
        inner.changed.raise(Self::ITEMS);
        if after != before {
            inner.changed.raise(Self::COUNT);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.engine.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, model: &ObjectRef) -> bool {
        self.inner.engine.borrow().index_of(model).is_some()
    }

    pub fn index_of(&self, model: &ObjectRef) -> Option<usize> {
        self.inner.engine.borrow().index_of(model)
    }

    /// Models in presentation order.
    pub fn models(&self) -> Vec<ObjectRef> {
        self.inner
            .engine
            .borrow()
            .items()
            .iter()
            .map(|i| i.model.clone())
            .collect()
    }

    pub fn controls(&self) -> Vec<ControlRef> {
        self.inner
            .engine
            .borrow()
            .items()
            .iter()
            .map(|i| i.control.clone())
            .collect()
    }

    pub fn with_engine<R>(&self, f: impl FnOnce(&CollectionSyncEngine) -> R) -> R {
        f(&self.inner.engine.borrow())
    }

    /// Number of changes applied so far.
    pub fn applied_changes(&self) -> u64 {
        self.inner.applied.get()
    }

    /// Listen for `"Items"`, `"ItemsSource"` and `"Count"`.
    pub fn subscribe(&self, handler: PropertyChangedHandler) -> HandlerId {
        self.inner.changed.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        self.inner.changed.unsubscribe(id)
    }

    pub fn downgrade(&self) -> WeakItemsControl {
        WeakItemsControl {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn get_items_source(object: &dyn Object) -> Option<Value> {
        let control = downcast_object::<ItemsControl>(object)?;
        Some(
            control
                .items_source()
                .map_or(Value::Null, |list| Value::Object(Rc::new(list))),
        )
    }

    fn set_items_source_value(object: &dyn Object, value: Value) -> bool {
        let Some(control) = downcast_object::<ItemsControl>(object) else {
            return false;
        };
        match value {
            Value::Null => control.set_items_source(None),
            Value::Object(list) => match downcast_rc::<ItemList>(list) {
                Some(list) => control.set_items_source(Some((*list).clone())),
                None => return false,
            },
            _ => return false,
        }
        true
    }

    fn get_count(object: &dyn Object) -> Option<Value> {
        let control = downcast_object::<ItemsControl>(object)?;
        Some(Value::I32(i32::try_from(control.len()).unwrap_or(i32::MAX)))
    }
}

#[derive(Clone)]
pub struct WeakItemsControl {
    inner: Weak<ItemsInner>,
}

impl WeakItemsControl {
    pub fn upgrade(&self) -> Option<ItemsControl> {
        self.inner.upgrade().map(|inner| ItemsControl { inner })
    }
}

impl Object for ItemsControl {
    fn type_info(&self) -> &'static TypeInfo {
        Self::static_type_info()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn notifier(&self) -> Option<&PropertyChanged> {
        Some(&self.inner.changed)
    }
}

impl ViewModel for ItemsControl {
    fn static_type_info() -> &'static TypeInfo {
        static INFO: OnceLock<TypeInfo> = OnceLock::new();
        INFO.get_or_init(|| {
            TypeInfo::builder::<ItemsControl>("ItemsControl")
                .property(PropertyDescriptor::new(
                    ItemsControl::ITEMS_SOURCE,
                    || ValueType::Object(ItemList::static_type_info()),
                    ItemsControl::get_items_source,
                    Some(ItemsControl::set_items_source_value as PropertySetter),
                ))
                .property(PropertyDescriptor::new(
                    ItemsControl::COUNT,
                    || ValueType::I32,
                    ItemsControl::get_count,
                    None,
                ))
                .build()
        })
    }
}

/// Lists are bindable so that an items source can come from a view-model.
impl Object for ItemList {
    fn type_info(&self) -> &'static TypeInfo {
        Self::static_type_info()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl ViewModel for ItemList {
    fn static_type_info() -> &'static TypeInfo {
        static INFO: OnceLock<TypeInfo> = OnceLock::new();
        INFO.get_or_init(|| {
            TypeInfo::builder::<ItemList>("ItemList")
                .property(PropertyDescriptor::new(
                    "Count",
                    || ValueType::I32,
                    |object: &dyn Object| {
                        let list = downcast_object::<ItemList>(object)?;
                        Some(Value::I32(i32::try_from(list.len()).unwrap_or(i32::MAX)))
                    },
                    None,
                ))
                .build()
        })
    }
}
