//! Wrapper → underlying value registry.
//!
//! A wrapper resolves to the value that was offered to the membrane, before
//! distortion. Entries hold weak handles; a live wrapper keeps its distorted
//! target alive through its handler, which is the fallback when the
//! pre-distortion object has already been collected.

use std::collections::BTreeMap;

use crate::object::{JsObject, WeakObject};
use crate::object_model::{ObjectId, Value};

#[derive(Debug)]
enum Underlying {
    Object(WeakObject),
    /// A primitive that distortion turned into an object.
    Primitive(Value),
}

#[derive(Debug)]
struct Registration {
    wrapper: WeakObject,
    original: Underlying,
    target: WeakObject,
}

#[derive(Debug, Default)]
pub(crate) struct IdentityRegistry {
    entries: BTreeMap<ObjectId, Registration>,
}

impl IdentityRegistry {
    /// Record that `wrapper` stands for `original`, distorted into `target`.
    pub(crate) fn register(&mut self, wrapper: &JsObject, original: &Value, target: &JsObject) {
        let original = match original {
            Value::Object(obj) => Underlying::Object(obj.downgrade()),
            other => Underlying::Primitive(other.clone()),
        };
        self.entries.insert(
            wrapper.id(),
            Registration {
                wrapper: wrapper.downgrade(),
                original,
                target: target.downgrade(),
            },
        );
    }

    /// The underlying value for a registered, live wrapper.
    pub(crate) fn original_of(&self, candidate: &JsObject) -> Option<Value> {
        let entry = self.entries.get(&candidate.id())?;
        if !entry.wrapper.is_alive() {
            return None;
        }
        match &entry.original {
            Underlying::Primitive(value) => Some(value.clone()),
            Underlying::Object(weak) => weak
                .upgrade()
                .or_else(|| entry.target.upgrade())
                .map(Value::Object),
        }
    }

    /// `original` for a registered wrapper, the input unchanged otherwise.
    pub(crate) fn resolve(&self, value: &Value) -> Value {
        match value {
            Value::Object(obj) => self.original_of(obj).unwrap_or_else(|| value.clone()),
            _ => value.clone(),
        }
    }

    pub(crate) fn is_registered(&self, candidate: &JsObject) -> bool {
        self.original_of(candidate).is_some()
    }

    /// Drop entries whose wrapper has been collected.
    pub(crate) fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.wrapper.is_alive());
        before - self.entries.len()
    }

    /// Drop the entry for a wrapper that has been replaced.
    pub(crate) fn forget(&mut self, wrapper: ObjectId) -> bool {
        self.entries.remove(&wrapper).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
