//! ES2020 `Reflect` namespace over [`Value`] targets.
//!
//! Each method requires an object target and forwards to the matching
//! internal method, so calling `Reflect` on a membrane wrapper runs the
//! wrapper's trap exactly as a script would.

use crate::object::JsObject;
use crate::object_model::{ObjectError, PartialDescriptor, PropertyDescriptor, PropertyKey, Value};

/// ES2020 `Reflect` namespace: static methods mirroring Proxy traps.
pub struct Reflect;

fn require_object<'a>(target: &'a Value, operation: &str) -> Result<&'a JsObject, ObjectError> {
    target.as_object().ok_or_else(|| {
        ObjectError::type_error(format!(
            "Reflect.{operation} called on non-object ({})",
            target.type_name()
        ))
    })
}

impl Reflect {
    /// `Reflect.get(target, propertyKey)`: ES2020 §26.1.6.
    pub fn get(target: &Value, key: &PropertyKey) -> Result<Value, ObjectError> {
        require_object(target, "get")?.get(key, target)
    }

    /// `Reflect.get(target, propertyKey, receiver)`
    pub fn get_with_receiver(
        target: &Value,
        key: &PropertyKey,
        receiver: &Value,
    ) -> Result<Value, ObjectError> {
        require_object(target, "get")?.get(key, receiver)
    }

    /// `Reflect.set(target, propertyKey, value)`: ES2020 §26.1.13.
    pub fn set(target: &Value, key: &PropertyKey, value: Value) -> Result<bool, ObjectError> {
        require_object(target, "set")?.set(key, value, target)
    }

    /// `Reflect.has(target, propertyKey)`: ES2020 §26.1.9.
    pub fn has(target: &Value, key: &PropertyKey) -> Result<bool, ObjectError> {
        require_object(target, "has")?.has_property(key)
    }

    /// `Reflect.deleteProperty(target, propertyKey)`: ES2020 §26.1.4.
    pub fn delete_property(target: &Value, key: &PropertyKey) -> Result<bool, ObjectError> {
        require_object(target, "deleteProperty")?.delete(key)
    }

    /// `Reflect.ownKeys(target)`: ES2020 §26.1.11.
    pub fn own_keys(target: &Value) -> Result<Vec<PropertyKey>, ObjectError> {
        require_object(target, "ownKeys")?.own_property_keys()
    }

    /// `Reflect.getPrototypeOf(target)`: ES2020 §26.1.8.
    pub fn get_prototype_of(target: &Value) -> Result<Option<JsObject>, ObjectError> {
        require_object(target, "getPrototypeOf")?.get_prototype_of()
    }

    /// `Reflect.setPrototypeOf(target, proto)`: ES2020 §26.1.14.
    pub fn set_prototype_of(target: &Value, proto: Option<JsObject>) -> Result<bool, ObjectError> {
        require_object(target, "setPrototypeOf")?.set_prototype_of(proto)
    }

    /// `Reflect.isExtensible(target)`: ES2020 §26.1.10.
    pub fn is_extensible(target: &Value) -> Result<bool, ObjectError> {
        require_object(target, "isExtensible")?.is_extensible()
    }

    /// `Reflect.preventExtensions(target)`: ES2020 §26.1.12.
    pub fn prevent_extensions(target: &Value) -> Result<bool, ObjectError> {
        require_object(target, "preventExtensions")?.prevent_extensions()
    }

    /// `Reflect.defineProperty(target, propertyKey, attributes)`: ES2020 §26.1.3.
    pub fn define_property(
        target: &Value,
        key: PropertyKey,
        desc: PartialDescriptor,
    ) -> Result<bool, ObjectError> {
        require_object(target, "defineProperty")?.define_own_property(key, desc)
    }

    /// `Reflect.getOwnPropertyDescriptor(target, propertyKey)`: ES2020 §26.1.7.
    pub fn get_own_property_descriptor(
        target: &Value,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, ObjectError> {
        require_object(target, "getOwnPropertyDescriptor")?.get_own_property(key)
    }

    /// `Reflect.apply(target, thisArgument, args)`: ES2020 §26.1.1.
    pub fn apply(target: &Value, this: &Value, args: &[Value]) -> Result<Value, ObjectError> {
        let function = require_object(target, "apply")?;
        if !function.is_callable() {
            return Err(ObjectError::type_error("Reflect.apply target is not callable"));
        }
        function.call(this, args)
    }
}
