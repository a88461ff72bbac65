//! Read-only wrapper traps.
//!
//! Same read side as the reactive wrapper, with read-only children and
//! setter-less accessors. Every mutating trap refuses with `false` and
//! touches neither the real object nor the hooks.

use crate::object::JsObject;
use crate::object_model::{ObjectError, PartialDescriptor, PropertyDescriptor, PropertyKey, Value};
use crate::proxy::ProxyHandler;

use super::descriptor::wrap_descriptor;
use super::shadow::{forget_on_shadow, install_on_shadow, is_pinned};
use super::{Membrane, MembraneEventKind, RefusedOperation, WrapperKind};

pub(crate) struct ReadOnlyHandler {
    membrane: Membrane,
    original: JsObject,
}

impl ReadOnlyHandler {
    pub(crate) fn new(membrane: Membrane, original: JsObject) -> Self {
        Self { membrane, original }
    }

    fn refuse(&self, operation: RefusedOperation, key: Option<&PropertyKey>) -> Result<bool, ObjectError> {
        self.membrane.record(
            MembraneEventKind::Refused { operation },
            Some(self.original.id()),
            key,
        );
        Ok(false)
    }
}

impl ProxyHandler for ReadOnlyHandler {
    fn get(&self, _shadow: &JsObject, key: &PropertyKey, _receiver: &Value) -> Result<Value, ObjectError> {
        let value = self.original.get(key, &Value::from(&self.original))?;
        self.membrane.value_observed(&self.original, key)?;
        Ok(self.membrane.get_read_only_proxy(&value))
    }

    fn set(
        &self,
        _shadow: &JsObject,
        key: &PropertyKey,
        _value: Value,
        _receiver: &Value,
    ) -> Result<bool, ObjectError> {
        self.refuse(RefusedOperation::Set, Some(key))
    }

    fn delete_property(&self, _shadow: &JsObject, key: &PropertyKey) -> Result<bool, ObjectError> {
        self.refuse(RefusedOperation::Delete, Some(key))
    }

    fn define_own_property(
        &self,
        _shadow: &JsObject,
        key: &PropertyKey,
        _desc: PartialDescriptor,
    ) -> Result<bool, ObjectError> {
        self.refuse(RefusedOperation::DefineProperty, Some(key))
    }

    fn prevent_extensions(&self, _shadow: &JsObject) -> Result<bool, ObjectError> {
        self.refuse(RefusedOperation::PreventExtensions, None)
    }

    fn set_prototype_of(
        &self,
        _shadow: &JsObject,
        _proto: Option<JsObject>,
    ) -> Result<bool, ObjectError> {
        self.refuse(RefusedOperation::SetPrototypeOf, None)
    }

    fn has(&self, shadow: &JsObject, key: &PropertyKey) -> Result<bool, ObjectError> {
        self.membrane.value_observed(&self.original, key)?;
        let found = self.original.has_property(key)?;
        if !found {
            forget_on_shadow(shadow, key)?;
        }
        Ok(found)
    }

    fn own_keys(&self, _shadow: &JsObject) -> Result<Vec<PropertyKey>, ObjectError> {
        self.original.own_property_keys()
    }

    fn is_extensible(&self, shadow: &JsObject) -> Result<bool, ObjectError> {
        shadow.is_extensible()
    }

    fn get_own_property(
        &self,
        shadow: &JsObject,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, ObjectError> {
        self.membrane.value_observed(&self.original, key)?;
        let Some(desc) = self.original.get_own_property(key)? else {
            forget_on_shadow(shadow, key)?;
            return Ok(None);
        };
        let existing = shadow.get_own_property(key)?;
        if let Some(pinned) = existing.as_ref().filter(|desc| is_pinned(desc)) {
            return Ok(Some(pinned.clone()));
        }
        let wrapped = wrap_descriptor(&self.membrane, desc, WrapperKind::ReadOnly);
        if !wrapped.is_configurable() || existing.is_some() {
            install_on_shadow(shadow, key, wrapped.clone())?;
        }
        Ok(Some(wrapped))
    }

    fn get_prototype_of(&self, _shadow: &JsObject) -> Result<Option<JsObject>, ObjectError> {
        self.original.get_prototype_of()
    }

    fn apply(&self, _shadow: &JsObject, _this: &Value, _args: &[Value]) -> Result<Value, ObjectError> {
        Ok(Value::Undefined)
    }

    fn construct(&self, _shadow: &JsObject, _args: &[Value]) -> Result<Value, ObjectError> {
        Ok(Value::Undefined)
    }
}
