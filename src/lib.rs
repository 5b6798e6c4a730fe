//! # Bindery
//! Bindery connects UI component properties to view-model properties through
//! dotted property paths, keeps them in sync as either side changes, and
//! mirrors observable collections onto panels of item controls.
//!
//! ## Example: Two-way binding
//! ```rust
//! use std::rc::Rc;
//! use bindery::{BindingMode, BindingUnit, Prop, PropertyChanged, ViewModel};
//!
//! #[derive(ViewModel, Default)]
//! #[view_model(rename_all = "PascalCase")]
//! struct Address {
//!     #[notify]
//!     changed: PropertyChanged,
//!     #[property]
//!     city: Prop<String>,
//! }
//!
//! #[derive(ViewModel, Default)]
//! #[view_model(rename_all = "PascalCase")]
//! struct Person {
//!     #[notify]
//!     changed: PropertyChanged,
//!     #[property]
//!     home: Prop<Option<Rc<Address>>>,
//! }
//!
//! #[derive(ViewModel, Default)]
//! struct TextField {
//!     #[notify]
//!     changed: PropertyChanged,
//!     #[property]
//!     text: Prop<String>,
//! }
//!
//! let person = Rc::new(Person::default());
//! person.set_home(Some(Rc::new(Address::default())));
//! let field = Rc::new(TextField::default());
//!
//! let binding = BindingUnit::builder()
//!     .label("Window/Form/CityField")
//!     .target(field.clone(), "text")
//!     .source(person.clone(), "Home.City")
//!     .mode(BindingMode::TwoWay)
//!     .build()
//!     .unwrap()
//!     .bind()
//!     .unwrap();
//!
//! field.set_text("Oslo".to_string());
//! assert_eq!(person.home().unwrap().city(), "Oslo");
//!
//! // Replacing an object in the middle of the path re-targets the binding.
//! let moved = Rc::new(Address::default());
//! moved.set_city("Bergen".to_string());
//! person.set_home(Some(moved));
//! assert_eq!(field.text(), "Bergen");
//! # drop(binding);
//! ```
//!
//! ## Parts
//!
//! - [`PathResolver`] turns a path string into a [`ResolvedPath`] against a
//!   type's reflection table ([`TypeInfo`], produced by
//!   `#[derive(ViewModel)]`).
//! - [`AccessorRegistry`] holds pre-generated accessors that replace
//!   reflection for known paths once registration has finished.
//! - [`LiveChainState`] keeps change subscriptions on every object along a
//!   path and re-establishes them when an intermediate object is replaced.
//! - [`PropertyBinding`] moves values between the two ends, with
//!   [`ValueConverter`]s, deferred results, null substitution and coercion.
//! - [`BindingComponent`] and [`LifecycleHost`] tie bindings to a
//!   component's active lifetime.
//! - [`CollectionSyncEngine`] and [`ItemsControl`] keep item controls in step
//!   with an [`ItemList`]; [`Selector`] adds single selection on top.
//!
//! Everything runs on a single UI thread; see [`Runtime`].

extern crate self as bindery;

pub mod accessor;
pub mod binding;
pub mod collection;
pub mod config;
pub mod convert;
pub mod data_context;
pub mod deferred;
pub mod error;
pub mod lifecycle;
pub mod object;
pub mod path;
pub mod selection;
pub mod tracker;
pub mod unit;
pub mod value;

pub use bindery_derive::ViewModel;
pub use bindery_reactive as reactive;
pub use bindery_reactive::{
    CollectionAction, CollectionChangedArgs, HandlerId, NotifyCollectionChanged,
    NotifyPropertyChanged, ObservableList, Prop, PropertyChanged, PropertyChangedArgs, Runtime,
    UiEvents,
};

pub use accessor::{AccessorRegistry, Accessors, Lookup, PathKey, RegistryPhase};
pub use binding::{
    BindingMode, Direction, Endpoint, EndpointHolder, PropertyBinding, Transfer, UpdateTrigger,
};
pub use collection::{
    CollectionItem, CollectionSyncEngine, ControlRef, ControlStrategy, Instantiate, ItemControl,
    ItemList, ItemTemplate, ItemsControl, ItemsPanel, Pooling, TemplateSelector, WeakItemsControl,
};
pub use config::BindingConfig;
pub use convert::{coerce, null_substitute, Culture, FnConverter, InvertBool, ValueConverter};
pub use data_context::DataContext;
pub use deferred::{Completer, Continuation, Deferred, DeferredPoll, DeferredValue};
pub use error::{
    BindingError, ConversionError, DataContextError, LifecycleError, PathResolutionError,
    RegistryError, UnresolvedReason,
};
pub use lifecycle::{Lifecycle, LifecycleHost, LifecycleState};
pub use object::{
    downcast_object, downcast_rc, same_object, Object, ObjectRef, PropertyDescriptor,
    PropertyGetter, PropertyKey, PropertySetter, TypeInfo, TypeInfoBuilder, ViewModel,
    WeakObjectRef,
};
pub use path::{PathResolver, ResolvedPath, IDENTITY_PATH};
pub use selection::Selector;
pub use tracker::LiveChainState;
pub use unit::{BindingComponent, BindingUnit, BindingUnitBuilder};
pub use value::{PropertyValue, Value, ValueType};
