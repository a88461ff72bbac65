//! Reactive wrapper traps.
//!
//! Reads fire `value_observed` and return wrapped children. Writes go to the
//! real object with unwrapped values and fire `value_mutated`. The shadow
//! target only ever receives what the invariant checker needs to see.

use crate::object::JsObject;
use crate::object_model::{
    LENGTH, ObjectError, PartialDescriptor, PropertyDescriptor, PropertyKey, Value,
};
use crate::proxy::ProxyHandler;

use super::descriptor::{unwrap_descriptor_value, wrap_descriptor};
use super::shadow::{forget_on_shadow, install_on_shadow, is_pinned, lock_shadow_target};
use super::{Membrane, WrapperKind};

pub(crate) struct ReactiveHandler {
    membrane: Membrane,
    original: JsObject,
}

impl ReactiveHandler {
    pub(crate) fn new(membrane: Membrane, original: JsObject) -> Self {
        Self { membrane, original }
    }

    fn lock(&self, shadow: &JsObject) -> Result<(), ObjectError> {
        lock_shadow_target(&self.membrane, shadow, &self.original, WrapperKind::Reactive)
    }
}

impl ProxyHandler for ReactiveHandler {
    fn get(&self, _shadow: &JsObject, key: &PropertyKey, _receiver: &Value) -> Result<Value, ObjectError> {
        let value = self.original.get(key, &Value::from(&self.original))?;
        self.membrane.value_observed(&self.original, key)?;
        Ok(self.membrane.get_proxy(&value))
    }

    fn set(
        &self,
        _shadow: &JsObject,
        key: &PropertyKey,
        value: Value,
        _receiver: &Value,
    ) -> Result<bool, ObjectError> {
        let old = self.original.get(key, &Value::from(&self.original))?;
        let value = self.membrane.unwrap_proxy(&value);
        if !old.strict_equals(&value) {
            self.original.put(key.clone(), value)?;
            self.membrane.value_mutated(&self.original, key)?;
        } else if key.is(LENGTH) && self.original.is_array() {
            // An append has already grown `length` by the time it is assigned.
            self.membrane.value_mutated(&self.original, key)?;
        }
        Ok(true)
    }

    fn delete_property(&self, shadow: &JsObject, key: &PropertyKey) -> Result<bool, ObjectError> {
        self.original.delete_or_throw(key)?;
        forget_on_shadow(shadow, key)?;
        self.membrane.value_mutated(&self.original, key)?;
        Ok(true)
    }

    fn has(&self, shadow: &JsObject, key: &PropertyKey) -> Result<bool, ObjectError> {
        self.membrane.value_observed(&self.original, key)?;
        let found = self.original.has_property(key)?;
        if !found {
            forget_on_shadow(shadow, key)?;
        }
        Ok(found)
    }

    fn own_keys(&self, shadow: &JsObject) -> Result<Vec<PropertyKey>, ObjectError> {
        let keys = self.original.own_property_keys()?;
        if !shadow.is_extensible()? {
            for stale in shadow.own_property_keys()? {
                if !keys.contains(&stale) {
                    forget_on_shadow(shadow, &stale)?;
                }
            }
        }
        Ok(keys)
    }

    fn is_extensible(&self, shadow: &JsObject) -> Result<bool, ObjectError> {
        if !shadow.is_extensible()? {
            return Ok(false);
        }
        if !self.original.is_extensible()? {
            self.lock(shadow)?;
            return Ok(false);
        }
        Ok(true)
    }

    fn prevent_extensions(&self, shadow: &JsObject) -> Result<bool, ObjectError> {
        if !self.original.prevent_extensions()? {
            return Err(ObjectError::type_error("cannot prevent extensions"));
        }
        self.lock(shadow)?;
        Ok(true)
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
        let wrapped = wrap_descriptor(&self.membrane, desc, WrapperKind::Reactive);
        if !wrapped.is_configurable() || existing.is_some() {
            install_on_shadow(shadow, key, wrapped.clone())?;
        }
        Ok(Some(wrapped))
    }

    fn define_own_property(
        &self,
        shadow: &JsObject,
        key: &PropertyKey,
        mut desc: PartialDescriptor,
    ) -> Result<bool, ObjectError> {
        if desc.writable.is_some()
            && desc.value.is_none()
            && let Some(PropertyDescriptor::Data { value, .. }) = self.original.get_own_property(key)?
        {
            desc.value = Some(value);
        }
        let desc = unwrap_descriptor_value(&self.membrane, desc);
        self.original.define_property_or_throw(key.clone(), desc)?;
        if let Some(applied) = self.original.get_own_property(key)?
            && !applied.is_configurable()
        {
            let wrapped = wrap_descriptor(&self.membrane, applied, WrapperKind::Reactive);
            install_on_shadow(shadow, key, wrapped)?;
        }
        self.membrane.value_mutated(&self.original, key)?;
        Ok(true)
    }

    fn get_prototype_of(&self, _shadow: &JsObject) -> Result<Option<JsObject>, ObjectError> {
        self.original.get_prototype_of()
    }

    fn set_prototype_of(
        &self,
        _shadow: &JsObject,
        _proto: Option<JsObject>,
    ) -> Result<bool, ObjectError> {
        Ok(false)
    }

    fn apply(&self, _shadow: &JsObject, _this: &Value, _args: &[Value]) -> Result<Value, ObjectError> {
        Ok(Value::Undefined)
    }

    fn construct(&self, _shadow: &JsObject, _args: &[Value]) -> Result<Value, ObjectError> {
        Ok(Value::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::membrane::MembraneOptions;
    use crate::object::Realm;

    type Log = Rc<RefCell<Vec<String>>>;

    fn logging_membrane() -> (Membrane, Log, Log) {
        let observed: Log = Rc::default();
        let mutated: Log = Rc::default();
        let (o, m) = (observed.clone(), mutated.clone());
        let membrane = Membrane::new(
            MembraneOptions::new()
                .with_value_observed(move |_, key| {
                    o.borrow_mut().push(key.to_string());
                    Ok(())
                })
                .with_value_mutated(move |_, key| {
                    m.borrow_mut().push(key.to_string());
                    Ok(())
                }),
        );
        (membrane, observed, mutated)
    }

    fn wrap(membrane: &Membrane, obj: &JsObject) -> JsObject {
        membrane.get_proxy(&Value::from(obj)).as_object().cloned().unwrap()
    }

    // -----------------------------------------------------------------------
    // 1. Read side
    // -----------------------------------------------------------------------

    #[test]
    fn get_wraps_children() {
        let realm = Realm::new();
        let (membrane, observed, _) = logging_membrane();
        let original = realm.new_object();
        let child = realm.new_object();
        original.put("child", &child).unwrap();
        let p = wrap(&membrane, &original);

        let got = p.get_value("child").unwrap();
        let got = got.as_object().unwrap();
        assert!(got.is_proxy());
        assert!(got.ptr_eq(&wrap(&membrane, &child)));
        assert_eq!(*observed.borrow(), vec!["child"]);
    }

    #[test]
    fn has_observes_and_own_keys_does_not() {
        let realm = Realm::new();
        let (membrane, observed, _) = logging_membrane();
        let original = realm.new_object();
        original.put("a", 1).unwrap();
        let p = wrap(&membrane, &original);
        assert!(p.has_property(&PropertyKey::from("a")).unwrap());
        assert!(!p.has_property(&PropertyKey::from("b")).unwrap());
        assert_eq!(p.own_property_keys().unwrap(), vec![PropertyKey::from("a")]);
        assert_eq!(*observed.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn descriptor_query_wraps_value() {
        let realm = Realm::new();
        let (membrane, observed, _) = logging_membrane();
        let original = realm.new_object();
        original.put("child", realm.new_object()).unwrap();
        let p = wrap(&membrane, &original);
        let desc = p.get_own_property(&PropertyKey::from("child")).unwrap().unwrap();
        assert!(desc.value().and_then(Value::as_object).unwrap().is_proxy());
        assert!(desc.is_configurable());
        assert_eq!(*observed.borrow(), vec!["child"]);
        assert_eq!(p.get_own_property(&PropertyKey::from("none")).unwrap(), None);
    }

    // -----------------------------------------------------------------------
    // 2. Write side
    // -----------------------------------------------------------------------

    #[test]
    fn set_writes_unwrapped_and_notifies_on_change_only() {
        let realm = Realm::new();
        let (membrane, _, mutated) = logging_membrane();
        let original = realm.new_object();
        let child = realm.new_object();
        let p = wrap(&membrane, &original);

        p.put("x", 1).unwrap();
        p.put("x", 1).unwrap();
        p.put("child", wrap(&membrane, &child)).unwrap();
        assert!(original.get_value("child").unwrap().as_object().unwrap().ptr_eq(&child));
        assert_eq!(*mutated.borrow(), vec!["x", "child"]);
    }

    #[test]
    fn array_push_reports_length() {
        let realm = Realm::new();
        let (membrane, _, mutated) = logging_membrane();
        let array = realm.new_array(vec![Value::from(1), Value::from(2)]);
        let p = wrap(&membrane, &array);
        assert_eq!(p.push(vec![Value::from(3)]).unwrap(), 3);
        assert_eq!(*mutated.borrow(), vec!["2", "length"]);
        assert_eq!(array.array_length().unwrap(), 3);
    }

    #[test]
    fn delete_notifies_and_propagates_refusal() {
        let realm = Realm::new();
        let (membrane, _, mutated) = logging_membrane();
        let original = realm.new_object();
        original.put("a", 1).unwrap();
        original
            .define_property_or_throw(
                PropertyKey::from("fixed"),
                PartialDescriptor::with_value(Value::from(1)).configurable(false),
            )
            .unwrap();
        let p = wrap(&membrane, &original);
        p.delete_or_throw(&PropertyKey::from("a")).unwrap();
        assert!(!original.has_own("a").unwrap());
        assert!(matches!(
            p.delete(&PropertyKey::from("fixed")),
            Err(ObjectError::TypeError(_))
        ));
        assert_eq!(*mutated.borrow(), vec!["a"]);
    }

    #[test]
    fn define_unwraps_and_mirrors_non_configurable() {
        let realm = Realm::new();
        let (membrane, _, mutated) = logging_membrane();
        let original = realm.new_object();
        let child = realm.new_object();
        let p = wrap(&membrane, &original);
        let wrapped_child = wrap(&membrane, &child);
        p.define_property_or_throw(
            PropertyKey::from("k"),
            PartialDescriptor::with_value(Value::from(&wrapped_child))
                .configurable(false)
                .writable(false),
        )
        .unwrap();
        assert!(original.get_value("k").unwrap().as_object().unwrap().ptr_eq(&child));
        let reported = p.get_own_property(&PropertyKey::from("k")).unwrap().unwrap();
        assert!(!reported.is_configurable());
        assert!(reported.value().and_then(Value::as_object).unwrap().ptr_eq(&wrapped_child));
        assert_eq!(*mutated.borrow(), vec!["k"]);
    }

    #[test]
    fn freeze_backfills_values() {
        let realm = Realm::new();
        let (membrane, _, _) = logging_membrane();
        let original = realm.new_object();
        original.put("a", 1).unwrap();
        let p = wrap(&membrane, &original);
        p.freeze().unwrap();
        assert!(original.is_frozen().unwrap());
        assert!(p.is_frozen().unwrap());
        assert_eq!(original.get_value("a").unwrap(), Value::from(1));
        assert_eq!(p.get_value("a").unwrap(), Value::from(1));
    }

    // -----------------------------------------------------------------------
    // 3. Extensibility and prototype
    // -----------------------------------------------------------------------

    #[test]
    fn extensibility_lock_follows_real_object() {
        let realm = Realm::new();
        let (membrane, _, _) = logging_membrane();
        let original = realm.new_object();
        original.put("a", 1).unwrap();
        let p = wrap(&membrane, &original);
        assert!(p.is_extensible().unwrap());
        original.prevent_extensions().unwrap();
        assert!(!p.is_extensible().unwrap());
        assert_eq!(p.own_property_keys().unwrap(), vec![PropertyKey::from("a")]);

        original.delete_or_throw(&PropertyKey::from("a")).unwrap();
        assert!(p.own_property_keys().unwrap().is_empty());
        assert_eq!(p.get_own_property(&PropertyKey::from("a")).unwrap(), None);
    }

    #[test]
    fn prevent_extensions_reaches_real_object() {
        let realm = Realm::new();
        let (membrane, _, _) = logging_membrane();
        let original = realm.new_object();
        let p = wrap(&membrane, &original);
        assert!(p.prevent_extensions().unwrap());
        assert!(!original.is_extensible().unwrap());
        assert!(!p.is_extensible().unwrap());
    }

    #[test]
    fn prototype_reads_real_object_and_cannot_change() {
        let realm = Realm::new();
        let (membrane, _, _) = logging_membrane();
        let original = realm.new_object();
        let p = wrap(&membrane, &original);
        assert_eq!(
            p.get_prototype_of().unwrap(),
            Some(realm.object_prototype.clone())
        );
        assert!(!p.set_prototype_of(None).unwrap());
        assert_eq!(
            original.get_prototype_of().unwrap(),
            Some(realm.object_prototype.clone())
        );
    }
}
