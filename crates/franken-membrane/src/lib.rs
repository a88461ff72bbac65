#![forbid(unsafe_code)]

//! Reactive object membrane over an ES2020-style object model.
//!
//! [`membrane::Membrane`] hands out cached reactive and read-only wrappers
//! for plain objects and arrays. Wrappers are [`proxy`] objects whose traps
//! report reads and writes to per-membrane hooks, while the proxy invariant
//! checker keeps every answer consistent with the real object's
//! non-configurable properties and extensibility.

pub mod config;
pub mod membrane;
pub mod object;
pub mod object_model;
pub mod observe;
pub mod proxy;
pub mod reflect;
pub mod snapshot;
pub mod trace_script;

pub use config::{MembraneConfig, ObserveConfig};
pub use membrane::{
    Membrane, MembraneEvent, MembraneEventKind, MembraneOptions, RefusedOperation, WrapperKind,
    default_value_is_observable,
};
pub use object::{JsObject, Realm, WeakObject};
pub use object_model::{ObjectError, PartialDescriptor, PropertyDescriptor, PropertyKey, Value};
pub use observe::{Observed, observe};
