//! Default observability predicate: only plain data is wrapped.

use crate::object_model::Value;

/// `true` for arrays and for plain objects whose prototype is null or is
/// itself a root (prototype-less) object. Functions, dates, host objects and
/// class instances pass through unwrapped.
pub fn default_value_is_observable(value: &Value) -> bool {
    let Value::Object(obj) = value else {
        return false;
    };
    if obj.is_callable() {
        return false;
    }
    if obj.is_array() {
        return true;
    }
    if obj.is_exotic() {
        return false;
    }
    match obj.get_prototype_of() {
        Ok(None) => true,
        Ok(Some(proto)) => matches!(proto.get_prototype_of(), Ok(None)),
        Err(_) => false,
    }
}
