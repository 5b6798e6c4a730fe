//! Single selection over an [`ItemsControl`].
//!
//! The selection always names an item currently presented by the control,
//! or nothing. It is checked again after every change to the items, and
//! listeners hear `"Selected"` only when the selected item actually changed.

use std::{
    any::Any,
    cell::{Cell, RefCell},
    rc::Rc,
    sync::OnceLock,
};

use crate::{
    collection::ItemsControl,
    object::{
        downcast_object, same_object, Object, ObjectRef, PropertyDescriptor, PropertySetter,
        TypeInfo, ViewModel,
    },
    reactive::{HandlerId, PropertyChanged, PropertyChangedArgs},
    value::{Value, ValueType},
};

struct SelectorInner {
    items: ItemsControl,
    selected: RefCell<Option<ObjectRef>>,
    changed: PropertyChanged,
    tabs: bool,
    indicator: Cell<Option<usize>>,
    /// Index last announced through `"SelectedIndex"`.
    index: Cell<Option<usize>>,
    items_handler: Cell<Option<HandlerId>>,
}

impl Drop for SelectorInner {
    fn drop(&mut self) {
        if let Some(id) = self.items_handler.take() {
            self.items.unsubscribe(id);
        }
    }
}

/// A single-selection overlay.
///
/// In tab mode exactly one item control shows the selection visual while
/// there are items: the selected one, or the first when nothing is selected.
#[derive(Clone)]
pub struct Selector {
    inner: Rc<SelectorInner>,
}

impl Selector {
    pub const SELECTED: &'static str = "Selected";
    pub const SELECTED_INDEX: &'static str = "SelectedIndex";
    pub const COUNT: &'static str = "Count";

    pub fn new(items: ItemsControl) -> Self {
        Self::build(items, false)
    }

    /// A selector that keeps one tab indicator visible.
    pub fn tabs(items: ItemsControl) -> Self {
        Self::build(items, true)
    }

    fn build(items: ItemsControl, tabs: bool) -> Self {
        let selector = Selector {
            inner: Rc::new(SelectorInner {
                items,
                selected: RefCell::new(None),
                changed: PropertyChanged::new(),
                tabs,
                indicator: Cell::new(None),
                index: Cell::new(None),
                items_handler: Cell::new(None),
            }),
        };
        let weak = Rc::downgrade(&selector.inner);
        let id = selector.inner.items.subscribe(Rc::new(move |args: &PropertyChangedArgs| {
            if !args.affects(ItemsControl::ITEMS) {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                let selector = Selector { inner };
                selector.revalidate();
                selector.inner.changed.raise(Self::COUNT);
            }
        }));
        selector.inner.items_handler.set(Some(id));
        selector.refresh_visuals();
        selector
    }

    pub fn items(&self) -> &ItemsControl {
        &self.inner.items
    }

    pub fn is_tabs(&self) -> bool {
        self.inner.tabs
    }

    pub fn selected(&self) -> Option<ObjectRef> {
        self.inner.selected.borrow().clone()
    }

    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected()?;
        self.inner.items.index_of(&selected)
    }

    /// Select `item`. An item the control does not present selects nothing.
    /// Returns whether the selection changed.
    pub fn set_selected(&self, item: Option<ObjectRef>) -> bool {
        let item = item.filter(|item| self.inner.items.contains(item));
        let changed = {
            let mut current = self.inner.selected.borrow_mut();
            let same = match (&*current, &item) {
                (None, None) => true,
                (Some(a), Some(b)) => same_object(a, b),
                _ => false,
            };
            if !same {
                *current = item;
            }
            !same
        };
        self.refresh_visuals();
        let index = self.selected_index();
        let moved = self.inner.index.replace(index) != index;
        if changed {
            tracing::debug!(?index, "selection changed");
            self.inner.changed.raise(Self::SELECTED);
        }
        if changed || moved {
            self.inner.changed.raise(Self::SELECTED_INDEX);
        }
        changed
    }

    /// Select by position; out of range selects nothing.
    pub fn select_index(&self, index: Option<usize>) -> bool {
        let item = index.and_then(|i| self.inner.items.models().get(i).cloned());
        self.set_selected(item)
    }

    /// Index of the item control showing the tab indicator.
    pub fn indicator(&self) -> Option<usize> {
        self.inner.indicator.get()
    }

    /// Raises `"Selected"`, `"SelectedIndex"` and `"Count"`.
    pub fn selection_changed(&self) -> &PropertyChanged {
        &self.inner.changed
    }

    fn revalidate(&self) {
        self.set_selected(self.selected());
    }

    fn refresh_visuals(&self) {
        let controls = self.inner.items.controls();
        let selected = self.selected_index();
        let active = match (selected, self.inner.tabs) {
            (Some(index), _) => Some(index),
            (None, true) if !controls.is_empty() => Some(0),
            (None, _) => None,
        };
        for (index, control) in controls.iter().enumerate() {
            control.set_selected(Some(index) == active);
        }
        self.inner.indicator.set(active);
    }

    fn get_selected(object: &dyn Object) -> Option<Value> {
        let selector = downcast_object::<Selector>(object)?;
        Some(selector.selected().map_or(Value::Null, Value::Object))
    }

    fn set_selected_value(object: &dyn Object, value: Value) -> bool {
        let Some(selector) = downcast_object::<Selector>(object) else {
            return false;
        };
        match value {
            Value::Null => selector.set_selected(None),
            Value::Object(item) => selector.set_selected(Some(item)),
            _ => return false,
        };
        true
    }

    fn get_selected_index(object: &dyn Object) -> Option<Value> {
        let selector = downcast_object::<Selector>(object)?;
        let index = selector
            .selected_index()
            .and_then(|i| i32::try_from(i).ok())
            .unwrap_or(-1);
        Some(Value::I32(index))
    }

    fn set_selected_index_value(object: &dyn Object, value: Value) -> bool {
        let (Some(selector), Value::I32(index)) = (downcast_object::<Selector>(object), value) else {
            return false;
        };
        selector.select_index(usize::try_from(index).ok());
        true
    }

    fn get_count(object: &dyn Object) -> Option<Value> {
        let selector = downcast_object::<Selector>(object)?;
        Some(Value::I32(
            i32::try_from(selector.inner.items.len()).unwrap_or(i32::MAX),
        ))
    }
}

impl Object for Selector {
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

impl ViewModel for Selector {
    fn static_type_info() -> &'static TypeInfo {
        static INFO: OnceLock<TypeInfo> = OnceLock::new();
        INFO.get_or_init(|| {
            TypeInfo::builder::<Selector>("Selector")
                .property(PropertyDescriptor::new(
                    Selector::SELECTED,
                    || ValueType::Any,
                    Selector::get_selected,
                    Some(Selector::set_selected_value as PropertySetter),
                ))
                .property(PropertyDescriptor::new(
                    Selector::SELECTED_INDEX,
                    || ValueType::I32,
                    Selector::get_selected_index,
                    Some(Selector::set_selected_index_value as PropertySetter),
                ))
                .property(PropertyDescriptor::new(
                    Selector::COUNT,
                    || ValueType::I32,
                    Selector::get_count,
                    None,
                ))
                .build()
        })
    }
}
