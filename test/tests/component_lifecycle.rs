//! Tests for binding components activated through a lifecycle host.

use std::rc::Rc;

use bindery_test::prelude::*;

struct Form {
    person: Rc<Person>,
    name: Rc<TextField>,
    city: Rc<TextField>,
}

impl Form {
    fn new() -> Self {
        let person = Rc::new(Person::default());
        person.set_name("Ada".to_string());
        person.set_home(Some(Address::new("London")));
        Self {
            person,
            name: Rc::new(TextField::default()),
            city: Rc::new(TextField::default()),
        }
    }

    fn unit(&self, field: &Rc<TextField>, path: &str) -> BindingUnit {
        BindingUnit::builder()
            .label(format!("Form/{path}"))
            .target(field.clone(), "Text")
            .source(self.person.clone(), path)
            .mode(BindingMode::TwoWay)
            .config(BindingConfig::default().strict())
            .build()
            .unwrap()
    }
}

#[test]
fn activation_creates_bindings_and_deactivation_releases_them() {
    let form = Form::new();
    let component = BindingComponent::new(vec![
        form.unit(&form.name, "Name"),
        form.unit(&form.city, "Home.City"),
    ]);
    let mut host = LifecycleHost::new(component);

    host.activate().unwrap();
    assert_eq!(host.state(), LifecycleState::Active);
    assert_eq!(host.component().bindings().len(), 2);
    assert_eq!(form.name.text(), "Ada");
    assert_eq!(form.city.text(), "London");

    assert!(host.deactivate());
    assert!(host.component().bindings().is_empty());
    assert_eq!(form.person.changed.handler_count(), 0);
    assert_eq!(form.name.changed.handler_count(), 0);

    form.person.set_name("Grace".to_string());
    assert_eq!(form.name.text(), "Ada");
}

#[test]
fn failed_activation_leaves_no_subscriptions() {
    let form = Form::new();
    let component = BindingComponent::new(vec![
        form.unit(&form.name, "Name"),
        form.unit(&form.city, "Home.Town"),
    ]);
    let mut host = LifecycleHost::new(component);

    match host.activate() {
        Err(LifecycleError::Activation(BindingError::Path { binding, source })) => {
            assert_eq!(binding, "Form/Home.Town");
            assert_eq!(source.segment, "Town");
        }
        other => panic!("expected a path error, got {other:?}"),
    }
    assert_eq!(host.state(), LifecycleState::Disposed);
    assert!(host.component().bindings().is_empty());
    assert_eq!(form.person.changed.handler_count(), 0);
    assert_eq!(form.name.changed.handler_count(), 0);
    assert_eq!(
        form.person.home().unwrap().changed.handler_count(),
        0
    );
}

#[test]
fn unsupported_back_conversion_fails_activation() {
    let form = Form::new();
    let unit = BindingUnit::builder()
        .target(form.name.clone(), "Text")
        .source(form.person.clone(), "Name")
        .mode(BindingMode::OneWayToSource)
        .converter(FnConverter::new(|value, _| Ok(value)))
        .build()
        .unwrap();
    let mut host = LifecycleHost::new(BindingComponent::new(vec![unit]));

    assert!(matches!(
        host.activate(),
        Err(LifecycleError::Activation(BindingError::Conversion {
            source: ConversionError::Unsupported,
            ..
        }))
    ));
    assert_eq!(form.name.changed.handler_count(), 0);
}

#[test]
fn dropping_an_active_host_detaches() {
    let form = Form::new();
    {
        let mut host = LifecycleHost::new(BindingComponent::new(vec![form.unit(&form.name, "Name")]));
        host.activate().unwrap();
        assert_eq!(form.person.changed.handler_count(), 1);
    }
    assert_eq!(form.person.changed.handler_count(), 0);
}
