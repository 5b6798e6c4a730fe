//! # bindery_reactive
//!
//! Change-notification primitives shared by every part of the binding
//! framework:
//!
//! - [`PropertyChanged`]: the "notify property changed" capability a
//!   view-model embeds.
//! - [`ObservableList`]: the "notify collection changed" capability.
//! - [`UiEvents`]: named widget events used as binding update triggers.
//! - [`Prop`]: the storage cell behind a view-model property.
//! - [`Runtime`]: single-UI-thread affinity checks.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`) and delivers
//! notifications synchronously and re-entrantly.

mod collection;
mod events;
mod id;
mod notify;
mod prop;
mod runtime;

pub use collection::{
    CollectionAction, CollectionChangedArgs, CollectionChangedHandler, NotifyCollectionChanged,
    ObservableList,
};
pub use events::{UiEventHandler, UiEvents};
pub use id::HandlerId;
pub use notify::{NotifyPropertyChanged, PropertyChanged, PropertyChangedArgs, PropertyChangedHandler};
pub use prop::Prop;
pub use runtime::Runtime;
