//! Tests for mirroring an item list onto item controls.

use std::cell::Cell;
use std::rc::Rc;

use bindery_test::prelude::*;

fn names(items: &ItemsControl) -> Vec<String> {
    items
        .models()
        .iter()
        .filter_map(|m| m.downcast_ref::<Person>().map(|p| p.name()))
        .collect()
}

fn setup() -> (ItemViewFactory, Rc<RecordingPanel>, ItemsControl, ItemList) {
    let factory = ItemViewFactory::new("row");
    let panel = RecordingPanel::new();
    let items = ItemsControl::new(factory.engine(&panel));
    let list = ItemList::from_vec(vec![person("a"), person("b"), person("c")]);
    items.set_items_source(Some(list.clone()));
    (factory, panel, items, list)
}

#[test]
fn controls_follow_every_kind_of_change() {
    let (factory, panel, items, list) = setup();
    assert_eq!(names(&items), ["a", "b", "c"]);
    assert_eq!(factory.texts(&items.controls()), ["a", "b", "c"]);

    // Added items are appended; replacements and moves are a removal
    // followed by an append.
    list.insert(1, person("x"));
    assert_eq!(names(&items), ["a", "b", "c", "x"]);

    list.remove_at(0);
    assert_eq!(names(&items), ["b", "c", "x"]);

    list.replace(1, person("y"));
    assert_eq!(names(&items), ["c", "x", "y"]);

    list.move_item(0, 2);
    assert_eq!(names(&items), ["c", "y", "x"]);

    list.reset_with(vec![person("z")]);
    assert_eq!(names(&items), ["z"]);
    assert_eq!(factory.texts(&items.controls()), ["z"]);
    assert_eq!(panel.child_count(), 1);
}

#[test]
fn every_item_has_exactly_one_control_presenting_it() {
    let (factory, panel, items, list) = setup();
    list.push(person("d"));
    list.remove_at(1);

    let models = items.models();
    let controls = items.controls();
    assert_eq!(models.len(), list.len());
    assert_eq!(controls.len(), models.len());
    assert_eq!(panel.child_count(), controls.len());
    for (model, control) in models.iter().zip(&controls) {
        let view = factory.view(control).unwrap();
        assert!(same_object(&view.data().unwrap(), model));
    }
    for model in list.snapshot() {
        assert!(items.contains(&model));
    }
}

#[test]
fn released_controls_are_destroyed_without_pooling() {
    let (factory, panel, _items, list) = setup();
    let first = factory.views()[0].clone();

    list.remove_at(0);
    assert!(first.is_destroyed());
    assert_eq!(panel.removed(), 1);
    assert_eq!(panel.child_count(), 2);
}

#[test]
fn reset_twice_gives_the_same_presentation() {
    let (factory, panel, items, list) = setup();
    let contents = list.snapshot();

    list.reset_with(contents.clone());
    let once = (names(&items), factory.texts(&items.controls()), panel.child_count());
    list.reset_with(contents);
    let twice = (names(&items), factory.texts(&items.controls()), panel.child_count());

    assert_eq!(once, twice);
    assert_eq!(once.2, 3);
}

#[test]
fn pool_never_holds_more_controls_than_items_at_once() {
    let factory = ItemViewFactory::new("row");
    let panel = RecordingPanel::new();
    let engine = factory.engine(&panel).with_strategy(Pooling::new());
    let items = ItemsControl::new(engine);
    let list = ItemList::new();
    items.set_items_source(Some(list.clone()));

    for name in ["a", "b", "c"] {
        list.push(person(name));
    }
    assert_eq!(factory.created_count(), 3);

    list.remove_at(0);
    list.remove_at(0);
    list.push(person("d"));
    list.push(person("e"));
    list.reset_with(vec![person("f"), person("g")]);
    list.clear();
    list.push(person("h"));

    assert_eq!(factory.created_count(), 3);
    assert_eq!(panel.child_count(), 3);
    assert!(factory.views().iter().all(|v| !v.is_destroyed()));
    assert_eq!(factory.texts(&items.controls()), ["h"]);

    let active = factory.views().iter().filter(|v| v.is_active()).count();
    assert_eq!(active, 1);
}

#[test]
fn prefilled_pool_serves_first_items_without_instantiating() {
    let factory = ItemViewFactory::new("row");
    let panel = RecordingPanel::new();
    let pool = Pooling::prefilled(&factory.template(), 4, &*panel);
    assert_eq!(factory.created_count(), 4);

    let items = ItemsControl::new(factory.engine(&panel).with_strategy(pool));
    items.set_items_source(Some(ItemList::from_vec(vec![person("a"), person("b")])));

    assert_eq!(factory.created_count(), 4);
    assert_eq!(items.len(), 2);
    assert_eq!(panel.added(), 4);
}

#[test]
fn template_selector_picks_per_item() {
    let rows = ItemViewFactory::new("row");
    let headers = ItemViewFactory::new("header");
    let header_template = headers.template();
    let panel = RecordingPanel::new();
    let engine = rows.engine(&panel).with_template_selector(Rc::new(move |model: &ObjectRef| {
        model
            .downcast_ref::<Person>()
            .filter(|p| p.name().starts_with('#'))
            .map(|_| header_template.clone())
    }));
    let items = ItemsControl::new(engine);
    items.set_items_source(Some(ItemList::from_vec(vec![
        person("#team"),
        person("a"),
        person("b"),
    ])));

    assert_eq!(headers.created_count(), 1);
    assert_eq!(rows.created_count(), 2);
}

#[test]
fn changes_raised_while_applying_are_queued() {
    let factory = ItemViewFactory::new("row");
    let panel = RecordingPanel::new();
    let list = ItemList::new();

    // The first control built appends a footer to the list while the
    // engine is still busy adding the item that caused it.
    let footer_added = Rc::new(Cell::new(false));
    let template = {
        let list = list.clone();
        let inner = factory.template();
        ItemTemplate::new("row-with-footer", move || {
            if !footer_added.replace(true) {
                list.push(person("footer"));
            }
            inner.instantiate()
        })
    };
    let items = ItemsControl::new(CollectionSyncEngine::new(template, panel.clone()));
    items.set_items_source(Some(list.clone()));
    let log = ChangeLog::attach(items.notifier().unwrap());

    list.push(person("a"));

    assert_eq!(names(&items), ["a", "footer"]);
    assert_eq!(names(&items).len(), list.len());
    assert_eq!(items.applied_changes(), 3);
    assert_eq!(log.count(ItemsControl::ITEMS), 1);
}

#[test]
fn reset_raised_while_applying_uses_the_contents_at_that_moment() {
    let factory = ItemViewFactory::new("row");
    let panel = RecordingPanel::new();
    let list = ItemList::new();

    // Building the first control empties the list and refills it, so a
    // reset and an add are queued behind the add being applied.
    let refilled = Rc::new(Cell::new(false));
    let template = {
        let list = list.clone();
        let inner = factory.template();
        ItemTemplate::new("row-with-refill", move || {
            if !refilled.replace(true) {
                list.clear();
                list.push(person("b"));
            }
            inner.instantiate()
        })
    };
    let items = ItemsControl::new(CollectionSyncEngine::new(template, panel.clone()));
    items.set_items_source(Some(list.clone()));

    list.push(person("a"));

    assert_eq!(list.len(), 1);
    assert_eq!(names(&items), ["b"]);
    assert_eq!(panel.child_count(), 1);
    assert_eq!(factory.texts(&items.controls()), ["b"]);
}

#[test]
fn switching_sources_rebuilds_and_unsubscribes() {
    let (_factory, _panel, items, old) = setup();
    assert_eq!(old.handler_count(), 1);

    let log = ChangeLog::attach(items.notifier().unwrap());
    let new = ItemList::from_vec(vec![person("n")]);
    items.set_items_source(Some(new.clone()));

    assert_eq!(old.handler_count(), 0);
    assert_eq!(new.handler_count(), 1);
    assert_eq!(names(&items), ["n"]);
    assert_eq!(log.count(ItemsControl::ITEMS_SOURCE), 1);

    old.push(person("ignored"));
    assert_eq!(names(&items), ["n"]);

    items.set_items_source(None);
    assert!(items.is_empty());
    assert_eq!(new.handler_count(), 0);
}

#[derive(ViewModel, Default)]
#[view_model(rename_all = "PascalCase")]
struct Catalog {
    #[notify]
    changed: PropertyChanged,
    #[property]
    entries: Prop<Option<Rc<ItemList>>>,
}

#[test]
fn items_source_bound_from_a_view_model() {
    let factory = ItemViewFactory::new("row");
    let panel = RecordingPanel::new();
    let items = ItemsControl::new(factory.engine(&panel));
    let catalog = Rc::new(Catalog::default());
    catalog.set_entries(Some(Rc::new(ItemList::from_vec(vec![person("a")]))));

    let _binding = BindingUnit::builder()
        .target(Rc::new(items.clone()), ItemsControl::ITEMS_SOURCE)
        .source(catalog.clone(), "Entries")
        .build()
        .unwrap()
        .bind()
        .unwrap();
    assert_eq!(names(&items), ["a"]);

    let next = ItemList::from_vec(vec![person("b"), person("c")]);
    catalog.set_entries(Some(Rc::new(next.clone())));
    assert_eq!(names(&items), ["b", "c"]);

    next.push(person("d"));
    assert_eq!(names(&items), ["b", "c", "d"]);

    catalog.set_entries(None);
    assert!(items.is_empty());
}

#[test]
fn count_is_readable_through_a_path() {
    let (_factory, _panel, items, list) = setup();
    let root: ObjectRef = Rc::new(items.clone());
    let count = PathResolver::resolve("Count", ItemsControl::static_type_info());

    assert_eq!(count.get_reflect(&root), Some(Value::I32(3)));
    list.push(person("d"));
    assert_eq!(count.get_reflect(&root), Some(Value::I32(4)));
}

#[test]
fn count_changes_reach_bound_properties() {
    let (_factory, _panel, items, list) = setup();
    let log = ChangeLog::attach(items.notifier().unwrap());
    let field = Rc::new(TextField::default());
    let _binding = BindingUnit::builder()
        .target(field.clone(), "Value")
        .source(Rc::new(items.clone()), ItemsControl::COUNT)
        .build()
        .unwrap()
        .bind()
        .unwrap();
    assert_eq!(field.value(), 3);

    list.push(person("d"));
    assert_eq!(field.value(), 4);

    list.replace(0, person("e"));
    assert_eq!(log.count(ItemsControl::COUNT), 1);

    list.clear();
    assert_eq!(field.value(), 0);
    assert_eq!(log.count(ItemsControl::COUNT), 2);
}
