//! Tests for single selection and tab indicators over an items control.

use std::rc::Rc;

use bindery_test::prelude::*;

fn setup(tabs: bool) -> (ItemViewFactory, ItemsControl, ItemList, Selector) {
    let factory = ItemViewFactory::new("tab");
    let panel = RecordingPanel::new();
    let items = ItemsControl::new(factory.engine(&panel));
    let list = ItemList::from_vec(vec![person("a"), person("b"), person("c")]);
    items.set_items_source(Some(list.clone()));
    let selector = if tabs {
        Selector::tabs(items.clone())
    } else {
        Selector::new(items.clone())
    };
    (factory, items, list, selector)
}

fn selected_flags(factory: &ItemViewFactory, items: &ItemsControl) -> Vec<bool> {
    items
        .controls()
        .iter()
        .filter_map(|c| factory.view(c))
        .map(|v| v.is_selected())
        .collect()
}

#[test]
fn removing_the_selected_item_clears_the_selection() {
    let (factory, items, list, selector) = setup(false);
    let log = ChangeLog::attach(selector.selection_changed());
    let b = list.get(1).unwrap();

    assert!(selector.set_selected(Some(b.clone())));
    assert_eq!(selector.selected_index(), Some(1));
    assert_eq!(selected_flags(&factory, &items), [false, true, false]);

    list.remove_first(|item| same_object(item, &b));
    assert!(selector.selected().is_none());
    assert_eq!(selector.selected_index(), None);
    assert_eq!(selected_flags(&factory, &items), [false, false]);
    assert_eq!(log.count(Selector::SELECTED), 2);
}

#[test]
fn replacing_the_selected_item_clears_the_selection() {
    let (_factory, _items, list, selector) = setup(false);
    selector.select_index(Some(0));

    list.replace(0, person("z"));
    assert!(selector.selected().is_none());
}

#[test]
fn moving_the_selected_item_keeps_it_and_reports_the_new_index() {
    let (_factory, _items, list, selector) = setup(false);
    let a = list.get(0).unwrap();
    selector.set_selected(Some(a.clone()));
    let log = ChangeLog::attach(selector.selection_changed());

    list.move_item(0, 2);
    assert!(same_object(&selector.selected().unwrap(), &a));
    assert_eq!(selector.selected_index(), Some(2));
    assert_eq!(log.count(Selector::SELECTED), 0);
    assert_eq!(log.count(Selector::SELECTED_INDEX), 1);
}

#[test]
fn selecting_an_absent_item_selects_nothing() {
    let (_factory, _items, _list, selector) = setup(false);
    selector.select_index(Some(2));

    assert!(selector.set_selected(Some(person("stranger"))));
    assert!(selector.selected().is_none());
    assert!(!selector.set_selected(None));
    assert!(!selector.select_index(Some(10)));
}

#[test]
fn reselecting_the_same_item_raises_nothing() {
    let (_factory, _items, list, selector) = setup(false);
    let log = ChangeLog::attach(selector.selection_changed());
    let c = list.get(2).unwrap();

    assert!(selector.set_selected(Some(c.clone())));
    assert!(!selector.set_selected(Some(c)));
    assert_eq!(log.count(Selector::SELECTED), 1);
}

#[test]
fn tabs_show_the_first_indicator_without_a_selection() {
    let (factory, items, list, selector) = setup(true);
    assert!(selector.selected().is_none());
    assert_eq!(selector.indicator(), Some(0));
    assert_eq!(selected_flags(&factory, &items), [true, false, false]);

    selector.select_index(Some(2));
    assert_eq!(selector.indicator(), Some(2));
    assert_eq!(selected_flags(&factory, &items), [false, false, true]);

    list.remove_at(2);
    assert!(selector.selected().is_none());
    assert_eq!(selector.indicator(), Some(0));

    list.clear();
    assert_eq!(selector.indicator(), None);

    list.push(person("n"));
    assert_eq!(selector.indicator(), Some(0));
}

#[test]
fn selected_index_is_bindable() {
    let (_factory, _items, list, selector) = setup(false);
    let field = Rc::new(TextField::default());
    let _binding = BindingUnit::builder()
        .target(field.clone(), "Value")
        .source(Rc::new(selector.clone()), Selector::SELECTED_INDEX)
        .mode(BindingMode::TwoWay)
        .build()
        .unwrap()
        .bind()
        .unwrap();

    assert_eq!(field.value(), -1);

    selector.select_index(Some(1));
    assert_eq!(field.value(), 1);

    field.set_value(2);
    assert!(same_object(&selector.selected().unwrap(), &list.get(2).unwrap()));

    field.set_value(-1);
    assert!(selector.selected().is_none());
}

#[test]
fn count_follows_the_items() {
    let (_factory, _items, list, selector) = setup(false);
    let log = ChangeLog::attach(selector.selection_changed());
    let root: ObjectRef = Rc::new(selector.clone());
    let count = PathResolver::resolve("count", Selector::static_type_info());

    list.push(person("d"));
    assert_eq!(count.get_reflect(&root), Some(Value::I32(4)));
    assert_eq!(log.count(Selector::COUNT), 1);
}
