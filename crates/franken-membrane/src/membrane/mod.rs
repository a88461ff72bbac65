//! Reactive membrane: cached reactive and read-only wrappers over plain
//! object graphs.
//!
//! - **Reactive wrapper**: reads fire `value_observed`, changing writes fire
//!   `value_mutated`, children come back wrapped.
//! - **Read-only wrapper**: same read side; every mutation is refused.
//! - **Identity**: each underlying object has at most one live wrapper of
//!   each kind per membrane; `unwrap_proxy` maps a wrapper back.
//! - **Policy**: distortion, observability predicate and both hooks are
//!   per-membrane.
//!
//! The cache and registry hold weak handles only. Dead entries are swept
//! when the cache grows past a threshold that doubles after every sweep.

mod descriptor;
pub mod events;
mod identity;
pub mod observable;
mod reactive_handler;
mod read_only_handler;
mod shadow;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::config::MembraneConfig;
use crate::object::{JsObject, WeakObject};
use crate::object_model::{ObjectError, ObjectId, PropertyKey, Value};
use crate::proxy::ProxyHandler;

pub use events::{MembraneEvent, MembraneEventKind, RefusedOperation, WrapperKind};
pub use observable::default_value_is_observable;

use descriptor::ThunkRole;
use events::EventLog;
use identity::IdentityRegistry;
use reactive_handler::ReactiveHandler;
use read_only_handler::ReadOnlyHandler;

/// `value_observed` / `value_mutated` callback: `(underlying object, key)`.
pub type ValueHook = Rc<dyn Fn(&JsObject, &PropertyKey) -> Result<(), ObjectError>>;
/// Substitution applied to every value before it is wrapped.
pub type ValueDistortion = Rc<dyn Fn(&Value) -> Value>;
/// Decides which values get wrapped.
pub type ObservablePredicate = Rc<dyn Fn(&Value) -> bool>;

// ---------------------------------------------------------------------------
// MembraneOptions
// ---------------------------------------------------------------------------

/// Membrane policy. Absent entries use the defaults: identity distortion,
/// no-op hooks, [`default_value_is_observable`].
#[derive(Clone, Default)]
pub struct MembraneOptions {
    pub value_distortion: Option<ValueDistortion>,
    pub value_mutated: Option<ValueHook>,
    pub value_observed: Option<ValueHook>,
    pub value_is_observable: Option<ObservablePredicate>,
    pub config: MembraneConfig,
}

impl fmt::Debug for MembraneOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MembraneOptions")
            .field("value_distortion", &self.value_distortion.is_some())
            .field("value_mutated", &self.value_mutated.is_some())
            .field("value_observed", &self.value_observed.is_some())
            .field("value_is_observable", &self.value_is_observable.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl MembraneOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value_distortion(mut self, f: impl Fn(&Value) -> Value + 'static) -> Self {
        self.value_distortion = Some(Rc::new(f));
        self
    }

    pub fn with_value_mutated(
        mut self,
        f: impl Fn(&JsObject, &PropertyKey) -> Result<(), ObjectError> + 'static,
    ) -> Self {
        self.value_mutated = Some(Rc::new(f));
        self
    }

    pub fn with_value_observed(
        mut self,
        f: impl Fn(&JsObject, &PropertyKey) -> Result<(), ObjectError> + 'static,
    ) -> Self {
        self.value_observed = Some(Rc::new(f));
        self
    }

    pub fn with_value_is_observable(mut self, f: impl Fn(&Value) -> bool + 'static) -> Self {
        self.value_is_observable = Some(Rc::new(f));
        self
    }

    pub fn with_config(mut self, config: MembraneConfig) -> Self {
        self.config = config;
        self
    }

    /// Read `valueDistortion`, `valueMutated`, `valueObserved` and
    /// `valueIsObservable` from a host options object. Entries that are not
    /// callable keep their defaults. A throwing distortion behaves as the
    /// identity and a throwing predicate as "not observable".
    pub fn from_object(options: &Value) -> Result<Self, ObjectError> {
        let mut result = Self::default();
        let Value::Object(options) = options else {
            return Ok(result);
        };

        if let Some(f) = callable(options.get_value("valueDistortion")?) {
            result.value_distortion = Some(Rc::new(move |value: &Value| {
                f.call(&Value::Undefined, std::slice::from_ref(value))
                    .unwrap_or_else(|_| value.clone())
            }));
        }
        if let Some(f) = callable(options.get_value("valueMutated")?) {
            result.value_mutated = Some(host_hook(f));
        }
        if let Some(f) = callable(options.get_value("valueObserved")?) {
            result.value_observed = Some(host_hook(f));
        }
        if let Some(f) = callable(options.get_value("valueIsObservable")?) {
            result.value_is_observable = Some(Rc::new(move |value: &Value| {
                f.call(&Value::Undefined, std::slice::from_ref(value))
                    .is_ok_and(|result| result.to_boolean())
            }));
        }
        Ok(result)
    }
}

fn callable(value: Value) -> Option<JsObject> {
    match value {
        Value::Object(f) if f.is_callable() => Some(f),
        _ => None,
    }
}

fn host_hook(f: JsObject) -> ValueHook {
    Rc::new(move |target: &JsObject, key: &PropertyKey| {
        f.call(&Value::Undefined, &[Value::from(target), key.to_value()])?;
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Reactive state
// ---------------------------------------------------------------------------

/// Both wrapper halves for one distorted value, each built on first use.
#[derive(Debug)]
struct ReactiveState {
    distorted: WeakObject,
    reactive: Option<WeakObject>,
    read_only: Option<WeakObject>,
}

impl ReactiveState {
    fn new(distorted: &JsObject) -> Self {
        Self {
            distorted: distorted.downgrade(),
            reactive: None,
            read_only: None,
        }
    }

    fn slot(&self, kind: WrapperKind) -> Option<&WeakObject> {
        match kind {
            WrapperKind::Reactive => self.reactive.as_ref(),
            WrapperKind::ReadOnly => self.read_only.as_ref(),
        }
    }

    /// Install `wrapper`, returning the id of a collected wrapper it replaces.
    fn fill(&mut self, kind: WrapperKind, wrapper: &JsObject) -> Option<ObjectId> {
        let slot = match kind {
            WrapperKind::Reactive => &mut self.reactive,
            WrapperKind::ReadOnly => &mut self.read_only,
        };
        let replaced = slot
            .take()
            .filter(|old| !old.is_alive())
            .map(|old| old.id());
        *slot = Some(wrapper.downgrade());
        replaced
    }

    fn is_live(&self) -> bool {
        self.distorted.is_alive()
            && [&self.reactive, &self.read_only]
                .into_iter()
                .flatten()
                .any(WeakObject::is_alive)
    }
}

// ---------------------------------------------------------------------------
// Membrane
// ---------------------------------------------------------------------------

struct MembraneInner {
    value_distortion: Option<ValueDistortion>,
    value_mutated: Option<ValueHook>,
    value_observed: Option<ValueHook>,
    value_is_observable: Option<ObservablePredicate>,
    config: MembraneConfig,
    states: RefCell<BTreeMap<ObjectId, ReactiveState>>,
    registry: RefCell<IdentityRegistry>,
    thunks: RefCell<BTreeMap<(ObjectId, ThunkRole), WeakObject>>,
    events: RefCell<EventLog>,
    next_sweep: Cell<usize>,
}

/// A policy and cache unit producing wrapped views of an object graph.
/// Cloning shares the same membrane.
///
/// Wrappers and accessor thunks are cached weakly. While any handle to a
/// wrapper is alive, every request for the same object and kind returns that
/// wrapper. Once the last handle is dropped, the next request builds a fresh
/// one with a new [`JsObject::id`] and the old registry entry is retired, so
/// repeated reads of a child that nobody keeps do not accumulate entries.
#[derive(Clone)]
pub struct Membrane(Rc<MembraneInner>);

impl fmt::Debug for Membrane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Membrane")
            .field("states", &self.0.states.borrow().len())
            .field("config", &self.0.config)
            .finish_non_exhaustive()
    }
}

impl Default for Membrane {
    fn default() -> Self {
        Self::new(MembraneOptions::default())
    }
}

impl Membrane {
    pub fn new(options: MembraneOptions) -> Self {
        let config = options.config;
        Self(Rc::new(MembraneInner {
            value_distortion: options.value_distortion,
            value_mutated: options.value_mutated,
            value_observed: options.value_observed,
            value_is_observable: options.value_is_observable,
            events: RefCell::new(EventLog::new(config.event_capacity)),
            next_sweep: Cell::new(config.sweep_threshold.max(1)),
            states: RefCell::new(BTreeMap::new()),
            registry: RefCell::new(IdentityRegistry::default()),
            thunks: RefCell::new(BTreeMap::new()),
            config,
        }))
    }

    pub fn config(&self) -> &MembraneConfig {
        &self.0.config
    }

    /// Same membrane (not merely equal policy)?
    pub fn ptr_eq(&self, other: &Membrane) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Reactive view of `value`. Non-observable values come back unchanged
    /// (after distortion); a read-only wrapper is never promoted.
    pub fn get_proxy(&self, value: &Value) -> Value {
        let unwrapped = self.unwrap_proxy(value);
        let distorted = self.distort(&unwrapped);
        if !self.value_is_observable(&distorted) {
            return distorted;
        }
        let Some(target) = distorted.as_object().cloned() else {
            return distorted;
        };
        if let Value::Object(input) = value
            && let Some(read_only) = self.cached(&target, WrapperKind::ReadOnly)
            && read_only.ptr_eq(input)
        {
            return value.clone();
        }
        Value::Object(self.wrapper_for(&unwrapped, &target, WrapperKind::Reactive))
    }

    /// Read-only view of `value`.
    pub fn get_read_only_proxy(&self, value: &Value) -> Value {
        let unwrapped = self.unwrap_proxy(value);
        let distorted = self.distort(&unwrapped);
        if !self.value_is_observable(&distorted) {
            return distorted;
        }
        let Some(target) = distorted.as_object().cloned() else {
            return distorted;
        };
        Value::Object(self.wrapper_for(&unwrapped, &target, WrapperKind::ReadOnly))
    }

    /// The underlying value of a wrapper made by this membrane; anything
    /// else unchanged.
    pub fn unwrap_proxy(&self, value: &Value) -> Value {
        self.0.registry.borrow().resolve(value)
    }

    /// Was `value` produced by this membrane?
    pub fn is_wrapper(&self, value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|obj| self.0.registry.borrow().is_registered(obj))
    }

    /// The membrane's observability predicate.
    pub fn value_is_observable(&self, value: &Value) -> bool {
        match &self.0.value_is_observable {
            Some(predicate) => predicate(value),
            None => default_value_is_observable(value),
        }
    }

    /// Take every recorded event, oldest first.
    pub fn drain_events(&self) -> Vec<MembraneEvent> {
        self.0.events.borrow_mut().drain()
    }

    /// Cached reactive states, including dead ones not yet swept.
    pub fn state_count(&self) -> usize {
        self.0.states.borrow().len()
    }

    /// Registry entries, including dead ones not yet swept.
    pub fn registered_wrappers(&self) -> usize {
        self.0.registry.borrow().len()
    }

    /// Drop cache and registry entries whose objects are gone. Returns the
    /// number of reactive states removed.
    pub fn sweep(&self) -> usize {
        let removed = {
            let mut states = self.0.states.borrow_mut();
            let before = states.len();
            states.retain(|_, state| state.is_live());
            before - states.len()
        };
        self.0.registry.borrow_mut().sweep();
        self.0.thunks.borrow_mut().retain(|_, thunk| thunk.is_alive());
        self.0
            .next_sweep
            .set(self.0.config.sweep_threshold.max(self.cache_load() * 2).max(1));
        if removed > 0 {
            self.record(MembraneEventKind::Swept { removed }, None, None);
        }
        removed
    }

    // -- hooks ---------------------------------------------------------------

    pub(crate) fn value_observed(&self, target: &JsObject, key: &PropertyKey) -> Result<(), ObjectError> {
        self.record(MembraneEventKind::Observed, Some(target.id()), Some(key));
        match &self.0.value_observed {
            Some(hook) => hook(target, key),
            None => Ok(()),
        }
    }

    pub(crate) fn value_mutated(&self, target: &JsObject, key: &PropertyKey) -> Result<(), ObjectError> {
        self.record(MembraneEventKind::Mutated, Some(target.id()), Some(key));
        match &self.0.value_mutated {
            Some(hook) => hook(target, key),
            None => Ok(()),
        }
    }

    pub(crate) fn record(
        &self,
        kind: MembraneEventKind,
        object_id: Option<ObjectId>,
        key: Option<&PropertyKey>,
    ) {
        if self.0.config.record_events {
            self.0
                .events
                .borrow_mut()
                .push(kind, object_id, key.cloned());
        }
    }

    // -- cache -----------------------------------------------------------------

    /// Largest of the three weak tables; drives the sweep threshold.
    fn cache_load(&self) -> usize {
        self.0
            .states
            .borrow()
            .len()
            .max(self.0.registry.borrow().len())
            .max(self.0.thunks.borrow().len())
    }

    /// Thunk standing in for `accessor`, reused while any handle to it is
    /// alive.
    pub(crate) fn accessor_thunk(
        &self,
        accessor: &JsObject,
        role: ThunkRole,
        build: impl FnOnce() -> JsObject,
    ) -> JsObject {
        let key = (accessor.id(), role);
        let existing = self.0.thunks.borrow().get(&key).and_then(WeakObject::upgrade);
        if let Some(thunk) = existing {
            return thunk;
        }
        let thunk = build();
        self.0.thunks.borrow_mut().insert(key, thunk.downgrade());
        thunk
    }

    fn distort(&self, value: &Value) -> Value {
        match &self.0.value_distortion {
            Some(distortion) => distortion(value),
            None => value.clone(),
        }
    }

    fn cached(&self, target: &JsObject, kind: WrapperKind) -> Option<JsObject> {
        let states = self.0.states.borrow();
        states.get(&target.id())?.slot(kind)?.upgrade()
    }

    /// Fetch or build the `kind` wrapper for `target`. Building can run user
    /// code that re-enters the membrane for the same target, so the cache is
    /// checked again before installing and an existing wrapper wins.
    fn wrapper_for(&self, original: &Value, target: &JsObject, kind: WrapperKind) -> JsObject {
        if let Some(existing) = self.cached(target, kind) {
            return existing;
        }
        let shadow = shadow::create_shadow_target(target);
        let handler: Rc<dyn ProxyHandler> = match kind {
            WrapperKind::Reactive => Rc::new(ReactiveHandler::new(self.clone(), target.clone())),
            WrapperKind::ReadOnly => Rc::new(ReadOnlyHandler::new(self.clone(), target.clone())),
        };
        let wrapper = JsObject::proxy_unchecked(shadow, handler);
        if let Some(existing) = self.cached(target, kind) {
            return existing;
        }

        if self.cache_load() >= self.0.next_sweep.get() {
            self.sweep();
        }
        let replaced = self
            .0
            .states
            .borrow_mut()
            .entry(target.id())
            .or_insert_with(|| ReactiveState::new(target))
            .fill(kind, &wrapper);
        {
            let mut registry = self.0.registry.borrow_mut();
            if let Some(stale) = replaced {
                registry.forget(stale);
            }
            registry.register(&wrapper, original, target);
        }
        self.record(
            MembraneEventKind::WrapperCreated { wrapper: kind },
            Some(target.id()),
            None,
        );
        wrapper
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
