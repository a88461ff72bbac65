//! Proxy exotic objects (§9.5): a handler with thirteen traps over a target.
//!
//! Every trap result is validated against the target by
//! [`ProxyInvariantChecker`] before it is returned to the caller, so a
//! handler that lies about a non-configurable property or about
//! extensibility surfaces a `TypeError` instead of an inconsistent view.

use std::cell::Ref;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::object::JsObject;
use crate::object_model::{
    ObjectError, OrdinaryObject, PartialDescriptor, PropertyDescriptor, PropertyKey, Value,
    is_compatible_descriptor,
};

// ---------------------------------------------------------------------------
// ProxyHandler: the trap surface
// ---------------------------------------------------------------------------

/// Trap surface of a proxy. Every trap receives the proxy's target; the
/// defaults forward to it.
pub trait ProxyHandler {
    fn get_prototype_of(&self, target: &JsObject) -> Result<Option<JsObject>, ObjectError> {
        target.get_prototype_of()
    }

    fn set_prototype_of(
        &self,
        target: &JsObject,
        proto: Option<JsObject>,
    ) -> Result<bool, ObjectError> {
        target.set_prototype_of(proto)
    }

    fn is_extensible(&self, target: &JsObject) -> Result<bool, ObjectError> {
        target.is_extensible()
    }

    fn prevent_extensions(&self, target: &JsObject) -> Result<bool, ObjectError> {
        target.prevent_extensions()
    }

    fn get_own_property(
        &self,
        target: &JsObject,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, ObjectError> {
        target.get_own_property(key)
    }

    fn define_own_property(
        &self,
        target: &JsObject,
        key: &PropertyKey,
        desc: PartialDescriptor,
    ) -> Result<bool, ObjectError> {
        target.define_own_property(key.clone(), desc)
    }

    fn has(&self, target: &JsObject, key: &PropertyKey) -> Result<bool, ObjectError> {
        target.has_property(key)
    }

    fn get(&self, target: &JsObject, key: &PropertyKey, receiver: &Value) -> Result<Value, ObjectError> {
        target.get(key, receiver)
    }

    fn set(
        &self,
        target: &JsObject,
        key: &PropertyKey,
        value: Value,
        receiver: &Value,
    ) -> Result<bool, ObjectError> {
        target.set(key, value, receiver)
    }

    fn delete_property(&self, target: &JsObject, key: &PropertyKey) -> Result<bool, ObjectError> {
        target.delete(key)
    }

    fn own_keys(&self, target: &JsObject) -> Result<Vec<PropertyKey>, ObjectError> {
        target.own_property_keys()
    }

    fn apply(&self, target: &JsObject, this: &Value, args: &[Value]) -> Result<Value, ObjectError> {
        target.call(this, args)
    }

    fn construct(&self, target: &JsObject, args: &[Value]) -> Result<Value, ObjectError> {
        target.construct(args)
    }
}

// ---------------------------------------------------------------------------
// ProxyObject: trap dispatch
// ---------------------------------------------------------------------------

/// Proxy slots: `[[ProxyTarget]]` and `[[ProxyHandler]]`.
pub(crate) struct ProxyObject {
    target: JsObject,
    handler: Rc<dyn ProxyHandler>,
}

impl fmt::Debug for ProxyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyObject")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl ProxyObject {
    pub(crate) fn new(target: JsObject, handler: Rc<dyn ProxyHandler>) -> Self {
        Self { target, handler }
    }

    pub(crate) fn target(&self) -> &JsObject {
        &self.target
    }

    fn target_slots(&self) -> Result<Ref<'_, OrdinaryObject>, ObjectError> {
        self.target
            .slots()
            .map(|slots| slots.borrow())
            .ok_or_else(|| ObjectError::type_error("proxy target must be an ordinary object"))
    }

    pub(crate) fn get_prototype_of(&self) -> Result<Option<JsObject>, ObjectError> {
        let result = self.handler.get_prototype_of(&self.target)?;
        ProxyInvariantChecker::check_get_prototype_of(&*self.target_slots()?, result.as_ref())?;
        Ok(result)
    }

    pub(crate) fn set_prototype_of(&self, proto: Option<JsObject>) -> Result<bool, ObjectError> {
        let result = self.handler.set_prototype_of(&self.target, proto.clone())?;
        ProxyInvariantChecker::check_set_prototype_of(&*self.target_slots()?, proto.as_ref(), result)?;
        Ok(result)
    }

    pub(crate) fn is_extensible(&self) -> Result<bool, ObjectError> {
        let result = self.handler.is_extensible(&self.target)?;
        ProxyInvariantChecker::check_is_extensible(&*self.target_slots()?, result)?;
        Ok(result)
    }

    pub(crate) fn prevent_extensions(&self) -> Result<bool, ObjectError> {
        let result = self.handler.prevent_extensions(&self.target)?;
        ProxyInvariantChecker::check_prevent_extensions(&*self.target_slots()?, result)?;
        Ok(result)
    }

    pub(crate) fn get_own_property(
        &self,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, ObjectError> {
        let result = self.handler.get_own_property(&self.target, key)?;
        ProxyInvariantChecker::check_get_own_property(&*self.target_slots()?, key, result.as_ref())?;
        Ok(result)
    }

    pub(crate) fn define_own_property(
        &self,
        key: &PropertyKey,
        desc: PartialDescriptor,
    ) -> Result<bool, ObjectError> {
        let result = self
            .handler
            .define_own_property(&self.target, key, desc.clone())?;
        ProxyInvariantChecker::check_define_own_property(&*self.target_slots()?, key, &desc, result)?;
        Ok(result)
    }

    pub(crate) fn has(&self, key: &PropertyKey) -> Result<bool, ObjectError> {
        let result = self.handler.has(&self.target, key)?;
        ProxyInvariantChecker::check_has(&*self.target_slots()?, key, result)?;
        Ok(result)
    }

    pub(crate) fn get(&self, key: &PropertyKey, receiver: &Value) -> Result<Value, ObjectError> {
        let result = self.handler.get(&self.target, key, receiver)?;
        ProxyInvariantChecker::check_get(&*self.target_slots()?, key, &result)?;
        Ok(result)
    }

    pub(crate) fn set(&self, key: &PropertyKey, value: Value, receiver: &Value) -> Result<bool, ObjectError> {
        let result = self
            .handler
            .set(&self.target, key, value.clone(), receiver)?;
        ProxyInvariantChecker::check_set(&*self.target_slots()?, key, &value, result)?;
        Ok(result)
    }

    pub(crate) fn delete(&self, key: &PropertyKey) -> Result<bool, ObjectError> {
        let result = self.handler.delete_property(&self.target, key)?;
        ProxyInvariantChecker::check_delete(&*self.target_slots()?, key, result)?;
        Ok(result)
    }

    pub(crate) fn own_keys(&self) -> Result<Vec<PropertyKey>, ObjectError> {
        let result = self.handler.own_keys(&self.target)?;
        ProxyInvariantChecker::check_own_keys(&*self.target_slots()?, &result)?;
        Ok(result)
    }

    pub(crate) fn call(&self, this: &Value, args: &[Value]) -> Result<Value, ObjectError> {
        if !self.target.is_callable() {
            return Err(ObjectError::type_error("proxy is not a function"));
        }
        self.handler.apply(&self.target, this, args)
    }

    pub(crate) fn construct(&self, args: &[Value]) -> Result<Value, ObjectError> {
        if !self.target.is_callable() {
            return Err(ObjectError::type_error("proxy is not a constructor"));
        }
        let result = self.handler.construct(&self.target, args)?;
        if !result.is_object() {
            return Err(ObjectError::type_error(
                "proxy construct: trap must return an object",
            ));
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// ProxyInvariantChecker: validates Proxy trap results
// ---------------------------------------------------------------------------

/// Proxy invariant checker per ES2020 §9.5.x.
pub struct ProxyInvariantChecker;

impl ProxyInvariantChecker {
    /// Validate `[[GetOwnProperty]]` trap result (§9.5.5).
    pub fn check_get_own_property(
        target: &OrdinaryObject,
        key: &PropertyKey,
        trap_result: Option<&PropertyDescriptor>,
    ) -> Result<(), ObjectError> {
        let target_desc = target.get_own_property(key);

        let Some(reported) = trap_result else {
            return match target_desc {
                Some(td) if !td.is_configurable() => Err(ObjectError::TypeError(format!(
                    "proxy getOwnPropertyDescriptor: cannot report non-configurable property '{key}' as non-existent"
                ))),
                Some(_) if !target.extensible => Err(ObjectError::TypeError(format!(
                    "proxy getOwnPropertyDescriptor: cannot report existing property '{key}' as non-existent on non-extensible target"
                ))),
                _ => Ok(()),
            };
        };

        let as_request = PartialDescriptor::from(reported.clone());
        if !is_compatible_descriptor(target.extensible, &as_request, target_desc) {
            return Err(ObjectError::TypeError(format!(
                "proxy getOwnPropertyDescriptor: descriptor for '{key}' is incompatible with the target"
            )));
        }
        if !reported.is_configurable() {
            match target_desc {
                Some(td) if !td.is_configurable() => {
                    if !reported.is_writable() && reported.is_data() && td.is_writable() {
                        return Err(ObjectError::TypeError(format!(
                            "proxy getOwnPropertyDescriptor: cannot report non-writable '{key}' while target property is writable"
                        )));
                    }
                }
                _ => {
                    return Err(ObjectError::TypeError(format!(
                        "proxy getOwnPropertyDescriptor: cannot return non-configurable descriptor for property '{key}' when target property is configurable or absent"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validate `[[HasProperty]]` trap result (§9.5.7).
    pub fn check_has(
        target: &OrdinaryObject,
        key: &PropertyKey,
        trap_result: bool,
    ) -> Result<(), ObjectError> {
        if !trap_result {
            if let Some(td) = target.get_own_property(key)
                && !td.is_configurable()
            {
                return Err(ObjectError::TypeError(format!(
                    "proxy has: cannot report non-configurable property '{key}' as non-existent"
                )));
            }
            if !target.extensible && target.has_own_property(key) {
                return Err(ObjectError::TypeError(format!(
                    "proxy has: cannot report property '{key}' as non-existent on non-extensible target"
                )));
            }
        }
        Ok(())
    }

    /// Validate `[[Get]]` trap result (§9.5.8).
    pub fn check_get(
        target: &OrdinaryObject,
        key: &PropertyKey,
        trap_result: &Value,
    ) -> Result<(), ObjectError> {
        if let Some(td) = target.get_own_property(key)
            && !td.is_configurable()
        {
            match td {
                PropertyDescriptor::Data {
                    value, writable, ..
                } if !writable => {
                    if !trap_result.same_value(value) {
                        return Err(ObjectError::TypeError(format!(
                            "proxy get: non-configurable non-writable property '{key}' must return same value"
                        )));
                    }
                }
                PropertyDescriptor::Accessor { get: None, .. } => {
                    if !trap_result.is_undefined() {
                        return Err(ObjectError::TypeError(format!(
                            "proxy get: non-configurable accessor property '{key}' with undefined getter must return undefined"
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate `[[Set]]` trap result (§9.5.9).
    pub fn check_set(
        target: &OrdinaryObject,
        key: &PropertyKey,
        value: &Value,
        trap_result: bool,
    ) -> Result<(), ObjectError> {
        if trap_result
            && let Some(td) = target.get_own_property(key)
            && !td.is_configurable()
        {
            match td {
                PropertyDescriptor::Data {
                    value: current_val,
                    writable,
                    ..
                } if !writable => {
                    if !value.same_value(current_val) {
                        return Err(ObjectError::TypeError(format!(
                            "proxy set: cannot set non-configurable non-writable property '{key}' to different value"
                        )));
                    }
                }
                PropertyDescriptor::Accessor { set: None, .. } => {
                    return Err(ObjectError::TypeError(format!(
                        "proxy set: cannot set non-configurable accessor property '{key}' with undefined setter"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate `[[Delete]]` trap result (§9.5.10).
    pub fn check_delete(
        target: &OrdinaryObject,
        key: &PropertyKey,
        trap_result: bool,
    ) -> Result<(), ObjectError> {
        if !trap_result {
            return Ok(());
        }
        if let Some(td) = target.get_own_property(key) {
            if !td.is_configurable() {
                return Err(ObjectError::TypeError(format!(
                    "proxy deleteProperty: cannot delete non-configurable property '{key}'"
                )));
            }
            if !target.extensible {
                return Err(ObjectError::TypeError(format!(
                    "proxy deleteProperty: cannot report '{key}' deleted from non-extensible target"
                )));
            }
        }
        Ok(())
    }

    /// Validate `[[OwnKeys]]` trap result (§9.5.11).
    pub fn check_own_keys(
        target: &OrdinaryObject,
        trap_result: &[PropertyKey],
    ) -> Result<(), ObjectError> {
        let mut seen = BTreeSet::new();
        for key in trap_result {
            if !seen.insert(key) {
                return Err(ObjectError::TypeError(format!(
                    "proxy ownKeys: duplicate key '{key}'"
                )));
            }
        }

        for (key, desc) in &target.properties {
            if !desc.is_configurable() && !seen.contains(key) {
                return Err(ObjectError::TypeError(format!(
                    "proxy ownKeys: must include non-configurable property '{key}'"
                )));
            }
        }

        if !target.extensible {
            let target_keys: BTreeSet<&PropertyKey> = target.properties.keys().collect();
            if target_keys != seen {
                return Err(ObjectError::TypeError(
                    "proxy ownKeys: non-extensible target requires exact key set".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Validate `[[GetPrototypeOf]]` trap result (§9.5.1).
    pub fn check_get_prototype_of(
        target: &OrdinaryObject,
        trap_result: Option<&JsObject>,
    ) -> Result<(), ObjectError> {
        if !target.extensible && trap_result != target.prototype.as_ref() {
            return Err(ObjectError::TypeError(
                "proxy getPrototypeOf: non-extensible target must return same prototype"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Validate `[[SetPrototypeOf]]` trap result (§9.5.2).
    pub fn check_set_prototype_of(
        target: &OrdinaryObject,
        new_proto: Option<&JsObject>,
        trap_result: bool,
    ) -> Result<(), ObjectError> {
        if trap_result && !target.extensible && new_proto != target.prototype.as_ref() {
            return Err(ObjectError::TypeError(
                "proxy setPrototypeOf: non-extensible target can only set to current prototype"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Validate `[[IsExtensible]]` trap result (§9.5.3).
    pub fn check_is_extensible(
        target: &OrdinaryObject,
        trap_result: bool,
    ) -> Result<(), ObjectError> {
        if trap_result != target.extensible {
            return Err(ObjectError::TypeError(
                "proxy isExtensible: must match target extensibility".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate `[[PreventExtensions]]` trap result (§9.5.4).
    pub fn check_prevent_extensions(
        target: &OrdinaryObject,
        trap_result: bool,
    ) -> Result<(), ObjectError> {
        if trap_result && target.extensible {
            return Err(ObjectError::TypeError(
                "proxy preventExtensions: cannot return true when target is still extensible"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Validate `[[DefineOwnProperty]]` trap result (§9.5.6).
    pub fn check_define_own_property(
        target: &OrdinaryObject,
        key: &PropertyKey,
        desc: &PartialDescriptor,
        trap_result: bool,
    ) -> Result<(), ObjectError> {
        if !trap_result {
            return Ok(());
        }
        let setting_non_configurable = desc.configurable == Some(false);
        match target.get_own_property(key) {
            None => {
                if !target.extensible {
                    return Err(ObjectError::TypeError(format!(
                        "proxy defineProperty: cannot add property '{key}' to non-extensible target"
                    )));
                }
                if setting_non_configurable {
                    return Err(ObjectError::TypeError(format!(
                        "proxy defineProperty: cannot define non-configurable property '{key}' when target property is absent"
                    )));
                }
            }
            Some(td) => {
                if !is_compatible_descriptor(target.extensible, desc, Some(td)) {
                    return Err(ObjectError::TypeError(format!(
                        "proxy defineProperty: descriptor for '{key}' is incompatible with the target"
                    )));
                }
                if setting_non_configurable && td.is_configurable() {
                    return Err(ObjectError::TypeError(format!(
                        "proxy defineProperty: cannot define non-configurable property '{key}' when target property is configurable"
                    )));
                }
                if td.is_data()
                    && !td.is_configurable()
                    && td.is_writable()
                    && desc.writable == Some(false)
                {
                    return Err(ObjectError::TypeError(format!(
                        "proxy defineProperty: cannot report '{key}' non-writable while target property is writable"
                    )));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
