//! Tests for the process-wide accessor registry.
//!
//! The global registry seals on its first lookup after being marked ready,
//! so everything touching it is one ordered scenario.

use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bindery_test::prelude::*;

static FAST_READS: AtomicUsize = AtomicUsize::new(0);

fn city_accessors() -> Accessors {
    Accessors::new(|root: &ObjectRef| {
        FAST_READS.fetch_add(1, Ordering::SeqCst);
        root.downcast_ref::<Person>()
            .and_then(|p| p.home())
            .map_or(Value::Null, |home| Value::Str(home.city()))
    })
    .with_setter(|root: &ObjectRef, value: Value| {
        let (Some(person), Value::Str(city)) = (root.downcast_ref::<Person>(), value) else {
            return false;
        };
        match person.home() {
            Some(home) => {
                home.set_city(city);
                true
            }
            None => false,
        }
    })
}

#[test]
fn registration_before_first_use_is_honoured() {
    let registry = AccessorRegistry::global();
    let person = Rc::new(Person::default());
    person.set_home(Some(Address::new("Quito")));
    let root: ObjectRef = person.clone();
    let path = PathResolver::resolve("Home.City", Person::static_type_info());

    // Bindings may resolve before anything is registered; they use
    // reflection and do not remember the miss.
    assert_eq!(path.get(&root, &registry), Some(Value::from("Quito")));
    assert!(!path.has_cached_lookup());
    assert_eq!(FAST_READS.load(Ordering::SeqCst), 0);

    registry
        .register_path(Person::static_type_info(), "home.city", city_accessors())
        .unwrap();
    registry.mark_ready();
    assert_eq!(registry.phase(), RegistryPhase::Ready);

    assert_eq!(path.get(&root, &registry), Some(Value::from("Quito")));
    assert_eq!(FAST_READS.load(Ordering::SeqCst), 1);
    assert!(path.has_cached_lookup());
    assert_eq!(registry.phase(), RegistryPhase::Sealed);

    assert!(path.set(&root, Value::from("Cuenca"), &registry));
    assert_eq!(person.home().unwrap().city(), "Cuenca");

    // Too late: the registry is sealed.
    assert_eq!(
        registry.register_path(
            Person::static_type_info(),
            "Name",
            Accessors::new(|_: &ObjectRef| Value::Null),
        ),
        Err(RegistryError::Sealed)
    );
    let name = PathResolver::resolve("Name", Person::static_type_info());
    assert_eq!(name.get(&root, &registry), Some(Value::from("")));

    // Bindings created from now on read through the registered accessors.
    let person = Rc::new(Person::default());
    person.set_home(Some(Address::new("Lima")));
    let field = Rc::new(TextField::default());
    let before = FAST_READS.load(Ordering::SeqCst);
    let _binding = BindingUnit::builder()
        .target(field.clone(), "Text")
        .source(person.clone(), "Home.City")
        .build()
        .unwrap()
        .bind()
        .unwrap();

    assert_eq!(field.text(), "Lima");
    assert!(FAST_READS.load(Ordering::SeqCst) > before);

    // Change tracking still follows the replaced intermediate.
    person.set_home(Some(Address::new("Cusco")));
    assert_eq!(field.text(), "Cusco");
}

#[test]
fn private_registry_is_independent_of_the_global_one() {
    let registry = Arc::new(AccessorRegistry::new());
    assert_eq!(registry.phase(), RegistryPhase::Open);
    assert!(registry.is_empty());

    let person = Rc::new(Person::default());
    person.set_name("Ada".to_string());
    let field = Rc::new(TextField::default());
    let _binding = BindingUnit::builder()
        .target(field.clone(), "Text")
        .source(person.clone(), "Name")
        .registry(registry.clone())
        .build()
        .unwrap()
        .bind()
        .unwrap();

    assert_eq!(field.text(), "Ada");
    assert_eq!(registry.phase(), RegistryPhase::Open);
}
