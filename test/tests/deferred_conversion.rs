//! Tests for converters whose results arrive later.

use std::cell::RefCell;
use std::rc::Rc;

use bindery_test::prelude::*;

/// A converter that hands out pending results and lets the test complete
/// them in any order.
#[derive(Clone, Default)]
struct SlowUpper {
    pending: Rc<RefCell<Vec<(String, Completer)>>>,
}

impl SlowUpper {
    fn converter(&self) -> FnConverter {
        let pending = self.pending.clone();
        FnConverter::new(move |value, _target| {
            let text = value.as_str().unwrap_or_default().to_uppercase();
            let (deferred, completer) = Deferred::pending();
            pending.borrow_mut().push((text, completer));
            Ok(deferred.into_value())
        })
    }

    fn outstanding(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Complete the `n`th outstanding request with its converted text.
    fn finish(&self, n: usize) {
        let (text, completer) = self.pending.borrow_mut().remove(n);
        completer.complete(Value::Str(text));
    }
}

fn bound(slow: &SlowUpper) -> (Rc<Person>, Rc<TextField>, PropertyBinding) {
    let person = Rc::new(Person::default());
    person.set_name("ada".to_string());
    let field = Rc::new(TextField::default());
    let binding = BindingUnit::builder()
        .target(field.clone(), "Text")
        .source(person.clone(), "Name")
        .converter(slow.converter())
        .build()
        .unwrap()
        .bind()
        .unwrap();
    (person, field, binding)
}

#[test]
fn pending_result_is_written_on_arrival() {
    let slow = SlowUpper::default();
    let (_person, field, _binding) = bound(&slow);

    assert_eq!(field.text(), "");
    assert_eq!(slow.outstanding(), 1);

    slow.finish(0);
    assert_eq!(field.text(), "ADA");
}

#[test]
fn newer_request_wins_over_late_older_result() {
    let slow = SlowUpper::default();
    let (person, field, _binding) = bound(&slow);

    person.set_name("grace".to_string());
    assert_eq!(slow.outstanding(), 2);

    // The newer request finishes first, then the stale one arrives.
    slow.finish(1);
    assert_eq!(field.text(), "GRACE");
    slow.finish(0);
    assert_eq!(field.text(), "GRACE");
}

#[test]
fn ready_deferred_is_written_immediately() {
    let person = Rc::new(Person::default());
    person.set_name("lin".to_string());
    let field = Rc::new(TextField::default());
    let binding = BindingUnit::builder()
        .target(field.clone(), "Text")
        .source(person.clone(), "Name")
        .converter(FnConverter::new(|value, _| {
            Ok(Deferred::ready(Value::from(format!("<{}>", value.as_str().unwrap_or_default()))).into())
        }))
        .build()
        .unwrap()
        .bind()
        .unwrap();

    assert_eq!(field.text(), "<lin>");
    assert_eq!(binding.update_target_from_source(), Ok(Transfer::Written));
}

#[test]
fn result_arriving_after_drop_is_discarded() {
    let slow = SlowUpper::default();
    let (_person, field, binding) = bound(&slow);

    drop(binding);
    slow.finish(0);
    assert_eq!(field.text(), "");
}

/// A deferred value that breaks its contract: it runs the continuation and
/// also answers ready.
struct Eager;

impl DeferredValue for Eager {
    fn poll_or_register(&self, continuation: Continuation) -> DeferredPoll {
        continuation(Value::from("early"));
        DeferredPoll::Ready(Value::from("ready"))
    }
}

#[test]
fn each_request_writes_at_most_once() {
    let person = Rc::new(Person::default());
    let field = Rc::new(TextField::default());
    let log = ChangeLog::attach(&field.changed);
    let _binding = BindingUnit::builder()
        .target(field.clone(), "Text")
        .source(person.clone(), "Name")
        .converter(FnConverter::new(|_, _| Ok(Value::Deferred(Rc::new(Eager)))))
        .build()
        .unwrap()
        .bind()
        .unwrap();

    assert_eq!(field.text(), "early");
    assert_eq!(log.count("Text"), 1);
}
