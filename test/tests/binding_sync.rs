//! Tests for keeping a target property in step with a source path.

use std::rc::Rc;

use bindery_test::prelude::*;

fn city_binding(field: &Rc<TextField>, person: &Rc<Person>, mode: BindingMode) -> PropertyBinding {
    BindingUnit::builder()
        .label("Form/CityField")
        .target(field.clone(), "Text")
        .source(person.clone(), "Home.City")
        .mode(mode)
        .build()
        .unwrap()
        .bind()
        .unwrap()
}

#[test]
fn two_way_round_trip_through_nested_path() {
    let person = Rc::new(Person::default());
    person.set_home(Some(Address::new("Paris")));
    let field = Rc::new(TextField::default());
    let _binding = city_binding(&field, &person, BindingMode::TwoWay);

    assert_eq!(field.text(), "Paris");

    field.set_text("Nice".to_string());
    assert_eq!(person.home().unwrap().city(), "Nice");

    person.home().unwrap().set_city("Lille".to_string());
    assert_eq!(field.text(), "Lille");
}

#[test]
fn replaced_intermediate_is_followed_and_old_one_ignored() {
    let person = Rc::new(Person::default());
    let old_home = Address::new("Oslo");
    person.set_home(Some(old_home.clone()));
    let field = Rc::new(TextField::default());
    let _binding = city_binding(&field, &person, BindingMode::OneWay);

    let new_home = Address::new("Bergen");
    person.set_home(Some(new_home.clone()));
    assert_eq!(field.text(), "Bergen");
    assert_eq!(old_home.changed.handler_count(), 0);
    assert_eq!(new_home.changed.handler_count(), 1);

    old_home.set_city("Tromso".to_string());
    assert_eq!(field.text(), "Bergen");

    new_home.set_city("Stavanger".to_string());
    assert_eq!(field.text(), "Stavanger");
}

#[test]
fn cleared_intermediate_writes_empty_text() {
    let person = Rc::new(Person::default());
    person.set_home(Some(Address::new("Rome")));
    let field = Rc::new(TextField::default());
    let _binding = city_binding(&field, &person, BindingMode::OneWay);

    person.set_home(None);
    assert_eq!(field.text(), "");

    person.set_home(Some(Address::new("Milan")));
    assert_eq!(field.text(), "Milan");
}

#[test]
fn text_and_number_are_coerced_both_ways() {
    let person = Rc::new(Person::default());
    person.set_age(41);
    let field = Rc::new(TextField::default());
    let binding = BindingUnit::builder()
        .target(field.clone(), "Text")
        .source(person.clone(), "Age")
        .mode(BindingMode::TwoWay)
        .build()
        .unwrap()
        .bind()
        .unwrap();

    assert_eq!(field.text(), "41");

    field.set_text(" 42 ".to_string());
    assert_eq!(person.age(), 42);

    field.set_text("forty".to_string());
    assert_eq!(person.age(), 42);
    assert_eq!(binding.update_source_from_target(), Ok(Transfer::Rejected));
}

#[test]
fn lost_focus_trigger_commits_typed_text() {
    let person = Rc::new(Person::default());
    person.set_name("Ada".to_string());
    let field = Rc::new(TextField::default());
    let _binding = BindingUnit::builder()
        .target(field.clone(), "Text")
        .target_trigger(UpdateTrigger::Event("LostFocus".into()))
        .source(person.clone(), "Name")
        .mode(BindingMode::TwoWay)
        .build()
        .unwrap()
        .bind()
        .unwrap();

    field.type_text("Ada Lovelace");
    assert_eq!(person.name(), "Ada");

    field.blur();
    assert_eq!(person.name(), "Ada Lovelace");
}

#[test]
fn one_way_to_source_pushes_only_target_changes() {
    let person = Rc::new(Person::default());
    let check = Rc::new(CheckBox::default());
    check.set_checked(true);
    let _binding = BindingUnit::builder()
        .target(check.clone(), "Checked")
        .source(person.clone(), "Active")
        .mode(BindingMode::OneWayToSource)
        .build()
        .unwrap()
        .bind()
        .unwrap();

    assert!(person.active());

    person.set_active(false);
    assert!(check.checked());

    check.set_checked(false);
    check.set_checked(true);
    assert!(person.active());
}

#[test]
fn inverted_flag_with_converter() {
    let person = Rc::new(Person::default());
    let check = Rc::new(CheckBox::default());
    let _binding = BindingUnit::builder()
        .target(check.clone(), "Enabled")
        .source(person.clone(), "Active")
        .mode(BindingMode::TwoWay)
        .converter(InvertBool)
        .build()
        .unwrap()
        .bind()
        .unwrap();

    assert!(check.enabled());

    person.set_active(true);
    assert!(!check.enabled());

    check.set_enabled(true);
    assert!(!person.active());
}

#[test]
fn writes_raise_one_notification_per_side() {
    let person = Rc::new(Person::default());
    person.set_home(Some(Address::new("Paris")));
    let field = Rc::new(TextField::default());
    let _binding = city_binding(&field, &person, BindingMode::TwoWay);

    let field_log = ChangeLog::attach(&field.changed);
    let home_log = ChangeLog::attach(&person.home().unwrap().changed);

    field.set_text("Nice".to_string());
    assert_eq!(field_log.names(), vec!["Text".to_string()]);
    assert_eq!(home_log.names(), vec!["City".to_string()]);
}

#[test]
fn bindings_on_a_shared_context_follow_data_swaps() {
    let context = Rc::new(DataContext::for_type::<Person>());
    let name_field = Rc::new(TextField::default());
    let age_field = Rc::new(TextField::default());
    let _name = BindingUnit::builder()
        .target(name_field.clone(), "Text")
        .source_context(context.clone(), "Name")
        .build()
        .unwrap()
        .bind()
        .unwrap();
    let _age = BindingUnit::builder()
        .target(age_field.clone(), "Text")
        .source_context(context.clone(), "Age")
        .build()
        .unwrap()
        .bind()
        .unwrap();

    let ada = Rc::new(Person::default());
    ada.set_name("Ada".to_string());
    ada.set_age(36);
    context.set_data(Some(ada.clone())).unwrap();
    assert_eq!(name_field.text(), "Ada");
    assert_eq!(age_field.text(), "36");

    let grace = Rc::new(Person::default());
    grace.set_name("Grace".to_string());
    context.set_data(Some(grace.clone())).unwrap();
    assert_eq!(name_field.text(), "Grace");
    assert_eq!(age_field.text(), "0");

    ada.set_name("Augusta".to_string());
    assert_eq!(name_field.text(), "Grace");
    assert_eq!(ada.changed.handler_count(), 0);
}

#[test]
fn context_rejects_data_of_the_wrong_type() {
    let context = DataContext::for_type::<Person>();
    let address: ObjectRef = Address::new("Turin");
    assert!(matches!(
        context.set_data(Some(address)),
        Err(DataContextError::TypeMismatch { .. })
    ));

    let employee: ObjectRef = Rc::new(Employee::default());
    assert_eq!(context.set_data(Some(employee.clone())), Ok(true));
    assert_eq!(context.set_data(Some(employee)), Ok(false));
}

#[test]
fn source_normalising_a_written_value_flows_back_to_the_target() {
    let person = Rc::new(Person::default());
    let weak = Rc::downgrade(&person);
    person.changed.subscribe(Rc::new(move |args: &PropertyChangedArgs| {
        let Some(person) = weak.upgrade() else {
            return;
        };
        if args.affects("Name") {
            let upper = person.name().to_uppercase();
            person.set_name(upper);
        }
    }));
    let field = Rc::new(TextField::default());
    let _binding = BindingUnit::builder()
        .target(field.clone(), "Text")
        .source(person.clone(), "Name")
        .mode(BindingMode::TwoWay)
        .build()
        .unwrap()
        .bind()
        .unwrap();

    field.set_text("ada".to_string());
    assert_eq!(person.name(), "ADA");
    assert_eq!(field.text(), "ADA");

    person.set_name("grace".to_string());
    assert_eq!(field.text(), "GRACE");
}

#[derive(ViewModel, Default)]
#[view_model(rename_all = "PascalCase")]
struct Team {
    #[notify]
    changed: PropertyChanged,
    #[property]
    lead: Prop<Option<Rc<Person>>>,
}

#[test]
fn object_the_property_cannot_hold_is_rejected() {
    let team = Rc::new(Team::default());
    let employee = Rc::new(Employee::default());
    let binding = BindingUnit::builder()
        .label("Team/Lead")
        .target(team.clone(), "Lead")
        .source(employee.clone(), "this")
        .build()
        .unwrap()
        .bind()
        .unwrap();

    assert_eq!(binding.update_target_from_source(), Ok(Transfer::Rejected));
    assert!(team.lead().is_none());

    let lead = Rc::new(Person::default());
    let binding = BindingUnit::builder()
        .target(team.clone(), "Lead")
        .source(lead.clone(), "this")
        .build()
        .unwrap()
        .bind()
        .unwrap();
    assert!(Rc::ptr_eq(&team.lead().unwrap(), &lead));
    assert_eq!(binding.update_target_from_source(), Ok(Transfer::Written));
}

#[test]
fn one_time_binding_waits_for_a_value_to_copy() {
    let context = Rc::new(DataContext::for_type::<Person>());
    let field = Rc::new(TextField::default());
    let binding = BindingUnit::builder()
        .target(field.clone(), "Text")
        .source_context(context.clone(), "Name")
        .mode(BindingMode::OneTime)
        .build()
        .unwrap()
        .bind()
        .unwrap();
    assert_eq!(field.text(), "");

    let ada = Rc::new(Person::default());
    ada.set_name("Ada".to_string());
    context.set_data(Some(ada.clone())).unwrap();
    assert_eq!(binding.update_target_from_source(), Ok(Transfer::Written));
    assert_eq!(field.text(), "Ada");

    ada.set_name("Augusta".to_string());
    assert_eq!(binding.update_target_from_source(), Ok(Transfer::Skipped));
    assert_eq!(field.text(), "Ada");
}
