//! Scripted membrane sessions.
//!
//! A script is `{config?, data, steps}`. `data` is loaded into a fresh
//! realm, wrapped once reactively and once read-only, and each step runs
//! against one of the two roots along a dotted path (`"a.b.0"`). The report
//! carries per-step outcomes, the drained event log and the final state of
//! the real (unwrapped) data.

use serde::{Deserialize, Serialize};

use crate::config::MembraneConfig;
use crate::membrane::{Membrane, MembraneEvent, MembraneEventKind, MembraneOptions};
use crate::object::{JsObject, Realm};
use crate::object_model::{ObjectError, PropertyKey, Value};
use crate::snapshot::{from_json, to_json};

pub const TRACE_SCHEMA_VERSION: &str = "franken-membrane.trace.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceOp {
    Get,
    Set,
    Delete,
    Has,
    Keys,
    Push,
    Freeze,
    PreventExtensions,
    ReadOnlyGet,
    ReadOnlySet,
    ReadOnlyDelete,
}

impl TraceOp {
    fn is_read_only(self) -> bool {
        matches!(self, Self::ReadOnlyGet | Self::ReadOnlySet | Self::ReadOnlyDelete)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub op: TraceOp,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceScript {
    #[serde(default)]
    pub config: MembraneConfig,
    pub data: serde_json::Value,
    #[serde(default)]
    pub steps: Vec<TraceStep>,
}

impl TraceScript {
    pub fn from_json(text: &str) -> Result<Self, ObjectError> {
        serde_json::from_str(text)
            .map_err(|err| ObjectError::type_error(format!("invalid trace script: {err}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: TraceOp,
    pub path: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub steps: usize,
    pub failed_steps: usize,
    pub observed: usize,
    pub mutated: usize,
    pub refused: usize,
    pub wrappers_created: usize,
}

impl TraceSummary {
    fn tally(outcomes: &[StepOutcome], events: &[MembraneEvent]) -> Self {
        let mut summary = Self {
            steps: outcomes.len(),
            failed_steps: outcomes.iter().filter(|step| !step.ok).count(),
            ..Self::default()
        };
        for event in events {
            match event.kind {
                MembraneEventKind::Observed => summary.observed += 1,
                MembraneEventKind::Mutated => summary.mutated += 1,
                MembraneEventKind::Refused { .. } => summary.refused += 1,
                MembraneEventKind::WrapperCreated { .. } => summary.wrappers_created += 1,
                MembraneEventKind::ShadowLocked { .. } | MembraneEventKind::Swept { .. } => {}
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceReport {
    pub schema_version: String,
    pub steps: Vec<StepOutcome>,
    pub events: Vec<MembraneEvent>,
    pub final_data: serde_json::Value,
    pub summary: TraceSummary,
}

/// Run every step in order. A failing step is recorded and the run
/// continues; only a malformed `data` root aborts.
pub fn run_script(script: &TraceScript) -> Result<TraceReport, ObjectError> {
    let realm = Realm::new();
    let config = MembraneConfig {
        record_events: true,
        ..script.config.clone()
    };
    let membrane = Membrane::new(MembraneOptions::new().with_config(config));

    let data = from_json(&realm, &script.data)?;
    let Value::Object(original) = data else {
        return Err(ObjectError::type_error("trace data must be an object or array"));
    };
    let reactive = root(membrane.get_proxy(&Value::from(&original)))?;
    let read_only = root(membrane.get_read_only_proxy(&Value::from(&original)))?;

    let mut steps = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        let start = if step.op.is_read_only() {
            &read_only
        } else {
            &reactive
        };
        let outcome = run_step(&realm, &membrane, start, step);
        steps.push(StepOutcome {
            index,
            op: step.op,
            path: step.path.clone(),
            ok: outcome.is_ok(),
            error: outcome.as_ref().err().map(ToString::to_string),
            result: outcome.ok(),
        });
    }

    let events = membrane.drain_events();
    let summary = TraceSummary::tally(&steps, &events);
    Ok(TraceReport {
        schema_version: TRACE_SCHEMA_VERSION.to_string(),
        steps,
        events,
        final_data: to_json(&Value::from(&original))?,
        summary,
    })
}

fn root(value: Value) -> Result<JsObject, ObjectError> {
    match value {
        Value::Object(obj) => Ok(obj),
        other => Err(ObjectError::type_error(format!(
            "trace data is not observable ({})",
            other.type_name()
        ))),
    }
}

fn run_step(
    realm: &Realm,
    membrane: &Membrane,
    start: &JsObject,
    step: &TraceStep,
) -> Result<serde_json::Value, ObjectError> {
    let segments: Vec<&str> = step.path.split('.').filter(|s| !s.is_empty()).collect();
    match step.op {
        TraceOp::Get | TraceOp::ReadOnlyGet => {
            let (parent, key) = parent_and_key(start, &segments)?;
            to_json(&membrane.unwrap_proxy(&parent.get_value(key)?))
        }
        TraceOp::Set => {
            let (parent, key) = parent_and_key(start, &segments)?;
            parent.put(key, step_value(realm, step)?)?;
            Ok(serde_json::Value::Null)
        }
        TraceOp::ReadOnlySet => {
            let (parent, key) = parent_and_key(start, &segments)?;
            let written = parent.set(&key, step_value(realm, step)?, &Value::from(&parent))?;
            Ok(serde_json::Value::Bool(written))
        }
        TraceOp::Delete => {
            let (parent, key) = parent_and_key(start, &segments)?;
            parent.delete_or_throw(&key)?;
            Ok(serde_json::Value::Null)
        }
        TraceOp::ReadOnlyDelete => {
            let (parent, key) = parent_and_key(start, &segments)?;
            Ok(serde_json::Value::Bool(parent.delete(&key)?))
        }
        TraceOp::Has => {
            let (parent, key) = parent_and_key(start, &segments)?;
            Ok(serde_json::Value::Bool(parent.has_property(&key)?))
        }
        TraceOp::Keys => {
            let target = walk(start, &segments)?;
            let keys = target
                .keys()?
                .into_iter()
                .map(|key| serde_json::Value::String(key.to_string()))
                .collect();
            Ok(serde_json::Value::Array(keys))
        }
        TraceOp::Push => {
            let target = walk(start, &segments)?;
            let len = target.push(std::iter::once(step_value(realm, step)?))?;
            Ok(serde_json::Value::from(len))
        }
        TraceOp::Freeze => {
            walk(start, &segments)?.freeze()?;
            Ok(serde_json::Value::Null)
        }
        TraceOp::PreventExtensions => {
            let done = walk(start, &segments)?.prevent_extensions()?;
            Ok(serde_json::Value::Bool(done))
        }
    }
}

fn step_value(realm: &Realm, step: &TraceStep) -> Result<Value, ObjectError> {
    match &step.value {
        Some(json) => from_json(realm, json),
        None => Ok(Value::Undefined),
    }
}

fn walk(start: &JsObject, segments: &[&str]) -> Result<JsObject, ObjectError> {
    let mut current = start.clone();
    for segment in segments {
        current = match current.get_value(*segment)? {
            Value::Object(next) => next,
            other => {
                return Err(ObjectError::type_error(format!(
                    "path segment '{segment}' is {}, not an object",
                    other.type_name()
                )));
            }
        };
    }
    Ok(current)
}

fn parent_and_key(start: &JsObject, segments: &[&str]) -> Result<(JsObject, PropertyKey), ObjectError> {
    let Some((last, parents)) = segments.split_last() else {
        return Err(ObjectError::type_error("step needs a non-empty path"));
    };
    Ok((walk(start, parents)?, PropertyKey::from(*last)))
}
