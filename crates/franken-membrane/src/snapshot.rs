//! JSON interop.
//!
//! `from_json` builds plain objects and arrays in a realm. `to_json` reads a
//! value through its internal methods with `JSON.stringify` rules, so
//! serializing a wrapper fires the same observations a script would.

use serde_json::{Map, Number};

use crate::object::{JsObject, Realm};
use crate::object_model::{ObjectError, PropertyKey, Value};

/// Largest integer `to_json` emits as an integer literal.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Build a fresh object graph from JSON.
pub fn from_json(realm: &Realm, json: &serde_json::Value) -> Result<Value, ObjectError> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(items) => {
            let items = items
                .iter()
                .map(|item| from_json(realm, item))
                .collect::<Result<Vec<_>, _>>()?;
            Value::from(realm.new_array(items))
        }
        serde_json::Value::Object(fields) => {
            let obj = realm.new_object();
            for (key, value) in fields {
                obj.put(key.as_str(), from_json(realm, value)?)?;
            }
            Value::from(obj)
        }
    })
}

/// Serialize with `JSON.stringify` semantics. A top-level value that
/// stringify would drop (undefined, a function, a symbol) becomes `null`.
pub fn to_json(value: &Value) -> Result<serde_json::Value, ObjectError> {
    let mut stack = Vec::new();
    Ok(serialize(value, &mut stack)?.unwrap_or(serde_json::Value::Null))
}

fn serialize(value: &Value, stack: &mut Vec<JsObject>) -> Result<Option<serde_json::Value>, ObjectError> {
    Ok(Some(match value {
        Value::Undefined | Value::Symbol(_) => return Ok(None),
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => number(*n),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Object(obj) => {
            if obj.is_callable() {
                return Ok(None);
            }
            if let Some(time) = obj.date_value() {
                return Ok(Some(number(time)));
            }
            if stack.iter().any(|seen| seen.ptr_eq(obj)) {
                return Err(ObjectError::type_error(
                    "converting circular structure to JSON",
                ));
            }
            stack.push(obj.clone());
            let result = if obj.is_array() {
                serialize_array(obj, stack)
            } else {
                serialize_object(obj, stack)
            };
            stack.pop();
            result?
        }
    }))
}

fn serialize_array(obj: &JsObject, stack: &mut Vec<JsObject>) -> Result<serde_json::Value, ObjectError> {
    let len = obj.array_length()?;
    let mut items = Vec::with_capacity(len as usize);
    for index in 0..len {
        let item = obj.get_value(PropertyKey::index(index))?;
        items.push(serialize(&item, stack)?.unwrap_or(serde_json::Value::Null));
    }
    Ok(serde_json::Value::Array(items))
}

fn serialize_object(obj: &JsObject, stack: &mut Vec<JsObject>) -> Result<serde_json::Value, ObjectError> {
    let mut fields = Map::new();
    if obj.host_payload().is_some() {
        return Ok(serde_json::Value::Object(fields));
    }
    for key in obj.keys()? {
        let Some(name) = key.as_str() else {
            continue;
        };
        let item = obj.get_value(key.clone())?;
        if let Some(json) = serialize(&item, stack)? {
            fields.insert(name.to_string(), json);
        }
    }
    Ok(serde_json::Value::Object(fields))
}

fn number(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        serde_json::Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}
