//! Structured membrane events.
//!
//! Each membrane keeps a bounded, sequence-numbered log. Callers drain it
//! with [`crate::membrane::Membrane::drain_events`]; the trace runner prints
//! it as JSON.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::object_model::{ObjectId, PropertyKey};

/// Which half of a reactive state a wrapper belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapperKind {
    Reactive,
    ReadOnly,
}

impl fmt::Display for WrapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reactive => "reactive",
            Self::ReadOnly => "read_only",
        };
        f.write_str(name)
    }
}

/// A mutating operation a read-only wrapper refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefusedOperation {
    Set,
    Delete,
    DefineProperty,
    PreventExtensions,
    SetPrototypeOf,
}

impl fmt::Display for RefusedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Set => "set",
            Self::Delete => "delete",
            Self::DefineProperty => "define_property",
            Self::PreventExtensions => "prevent_extensions",
            Self::SetPrototypeOf => "set_prototype_of",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MembraneEventKind {
    WrapperCreated { wrapper: WrapperKind },
    Observed,
    Mutated,
    Refused { operation: RefusedOperation },
    ShadowLocked { wrapper: WrapperKind },
    Swept { removed: usize },
}

/// Structured event emitted by a membrane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembraneEvent {
    /// Monotonic sequence number for deterministic ordering.
    pub sequence: u64,
    #[serde(flatten)]
    pub kind: MembraneEventKind,
    /// The underlying object the event concerns.
    pub object_id: Option<ObjectId>,
    pub key: Option<PropertyKey>,
}

/// Bounded event log. The sequence keeps counting when old entries fall off.
#[derive(Debug)]
pub(crate) struct EventLog {
    capacity: usize,
    next_sequence: u64,
    events: VecDeque<MembraneEvent>,
}

impl EventLog {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_sequence: 0,
            events: VecDeque::new(),
        }
    }

    pub(crate) fn push(
        &mut self,
        kind: MembraneEventKind,
        object_id: Option<ObjectId>,
        key: Option<PropertyKey>,
    ) {
        if self.capacity == 0 {
            return;
        }
        while self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(MembraneEvent {
            sequence: self.next_sequence,
            kind,
            object_id,
            key,
        });
        self.next_sequence += 1;
    }

    pub(crate) fn drain(&mut self) -> Vec<MembraneEvent> {
        self.events.drain(..).collect()
    }
}
