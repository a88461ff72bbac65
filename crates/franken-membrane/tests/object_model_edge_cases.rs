//! Integration tests for object model and proxy edge cases that the membrane
//! relies on but that the inline unit tests do not cover end to end.
//!
//! Focus areas:
//! - Multi-step descriptor workflows through `JsObject`
//! - Array `length` truncation, growth and the 2^32 - 1 ceiling
//! - Prototype chain depth and cycles
//! - Proxy handlers that lie about non-configurable state
//! - Reflect error paths
//! - ObjectError display and serde

use std::rc::Rc;

use frankenengine_membrane::object::{JsObject, MAX_PROTOTYPE_CHAIN_DEPTH, Realm};
use frankenengine_membrane::object_model::{
    ObjectError, PartialDescriptor, PropertyDescriptor, PropertyKey, Value,
};
use frankenengine_membrane::proxy::ProxyHandler;
use frankenengine_membrane::reflect::Reflect;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn str_key(s: &str) -> PropertyKey {
    PropertyKey::String(s.to_string())
}

fn int_val(n: i32) -> Value {
    Value::from(n)
}

/// Handler that claims every property is absent.
struct Hiding;

impl ProxyHandler for Hiding {
    fn get_own_property(
        &self,
        _target: &JsObject,
        _key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, ObjectError> {
        Ok(None)
    }

    fn has(&self, _target: &JsObject, _key: &PropertyKey) -> Result<bool, ObjectError> {
        Ok(false)
    }

    fn own_keys(&self, _target: &JsObject) -> Result<Vec<PropertyKey>, ObjectError> {
        Ok(Vec::new())
    }
}

/// Handler that reports a different value for every read.
struct Lying;

impl ProxyHandler for Lying {
    fn get(&self, _target: &JsObject, _key: &PropertyKey, _receiver: &Value) -> Result<Value, ObjectError> {
        Ok(Value::from("lie"))
    }

    fn is_extensible(&self, _target: &JsObject) -> Result<bool, ObjectError> {
        Ok(true)
    }
}

// ===========================================================================
// 1. Descriptor workflows
// ===========================================================================

#[test]
fn seal_then_freeze_progression() {
    let realm = Realm::new();
    let o = realm.new_object();
    o.put("a", 1).unwrap();
    o.seal().unwrap();
    assert!(o.is_sealed().unwrap());
    assert!(!o.is_frozen().unwrap());
    o.put("a", 2).unwrap();
    assert!(o.put("b", 1).is_err());
    o.freeze().unwrap();
    assert!(o.is_frozen().unwrap());
    assert!(o.put("a", 3).is_err());
    assert_eq!(o.get_value("a").unwrap(), int_val(2));
}

#[test]
fn accessor_to_data_switch_only_while_configurable() {
    let realm = Realm::new();
    let o = realm.new_object();
    let getter = realm.new_function(|_, _| Ok(int_val(1)));
    o.define_property_or_throw(
        str_key("p"),
        PropertyDescriptor::accessor(Some(getter.clone()), None).into(),
    )
    .unwrap();
    o.define_property_or_throw(str_key("p"), PartialDescriptor::with_value(int_val(5)))
        .unwrap();
    let desc = o.get_own_property(&str_key("p")).unwrap().unwrap();
    assert!(desc.is_data());
    assert!(!desc.is_writable());

    o.define_property_or_throw(str_key("p"), PartialDescriptor::default().configurable(false))
        .unwrap();
    let back_to_accessor = PropertyDescriptor::accessor(Some(getter), None).into();
    assert!(matches!(
        o.define_property_or_throw(str_key("p"), back_to_accessor),
        Err(ObjectError::TypeError(_))
    ));
}

#[test]
fn setter_receives_receiver_not_holder() {
    let realm = Realm::new();
    let proto = realm.new_object();
    let setter = realm.new_function(|this, args| {
        this.as_object().unwrap().define_property_or_throw(
            PropertyKey::from("seen"),
            PartialDescriptor::with_value(args[0].clone()),
        )?;
        Ok(Value::Undefined)
    });
    proto
        .define_property_or_throw(
            str_key("slot"),
            PropertyDescriptor::accessor(None, Some(setter)).into(),
        )
        .unwrap();
    let child = realm.new_instance(&proto);
    child.put("slot", 9).unwrap();
    assert_eq!(child.get_value("seen").unwrap(), int_val(9));
    assert!(!proto.has_own("seen").unwrap());
}

// ===========================================================================
// 2. Arrays
// ===========================================================================

#[test]
fn truncating_length_drops_elements() {
    let realm = Realm::new();
    let array = realm.new_array((1..=4).map(int_val));
    array.put("length", 2).unwrap();
    assert_eq!(array.array_length().unwrap(), 2);
    assert!(!array.has_own(PropertyKey::index(2)).unwrap());
    array.put(PropertyKey::index(5), 6).unwrap();
    assert_eq!(array.array_length().unwrap(), 6);
    assert_eq!(array.get_value(PropertyKey::index(3)).unwrap(), Value::Undefined);
}

#[test]
fn invalid_length_is_a_range_error() {
    let realm = Realm::new();
    let array = realm.new_array(Vec::<Value>::new());
    assert!(matches!(
        array.put("length", 1.5),
        Err(ObjectError::RangeError(_))
    ));
    assert!(matches!(
        array.put("length", -1),
        Err(ObjectError::RangeError(_))
    ));
}

#[test]
fn push_at_maximum_length_is_a_type_error() {
    let realm = Realm::new();
    let array = realm.new_array(Vec::<Value>::new());
    array.put("length", 4294967295.0).unwrap();
    assert_eq!(array.array_length().unwrap(), u32::MAX);
    assert!(matches!(
        array.push(vec![int_val(1)]),
        Err(ObjectError::TypeError(_))
    ));
    assert_eq!(array.push(Vec::<Value>::new()).unwrap(), u32::MAX);
}

#[test]
fn oversized_array_like_length_is_a_range_error() {
    let realm = Realm::new();
    let array_like = realm.new_object();
    array_like.put("length", 4294967296.0).unwrap();
    assert!(matches!(
        array_like.array_length(),
        Err(ObjectError::RangeError(_))
    ));
    array_like.put("length", 2.5).unwrap();
    assert_eq!(array_like.array_length().unwrap(), 2);
}

#[test]
fn push_on_frozen_array_fails_without_growing() {
    let realm = Realm::new();
    let array = realm.new_array(vec![int_val(1)]);
    array.freeze().unwrap();
    assert!(array.push(vec![int_val(2)]).is_err());
    assert_eq!(array.array_length().unwrap(), 1);
}

// ===========================================================================
// 3. Prototype chains
// ===========================================================================

#[test]
fn prototype_cycles_are_rejected() {
    let realm = Realm::new();
    let a = realm.new_object();
    let b = realm.new_instance(&a);
    assert_eq!(
        a.set_prototype_of(Some(b.clone())),
        Err(ObjectError::PrototypeCycleDetected)
    );
    assert!(b.set_prototype_of(Some(b.clone())).is_err());
}

#[test]
fn overly_deep_chain_is_an_error() {
    let mut current = JsObject::new_ordinary(None);
    for _ in 0..=MAX_PROTOTYPE_CHAIN_DEPTH {
        current = JsObject::new_ordinary(Some(current));
    }
    assert!(matches!(
        current.get_value("missing"),
        Err(ObjectError::PrototypeChainTooDeep { .. })
    ));
}

#[test]
fn non_extensible_object_keeps_its_prototype() {
    let realm = Realm::new();
    let o = realm.new_object();
    o.prevent_extensions().unwrap();
    assert!(!o.set_prototype_of(None).unwrap());
    assert!(o.set_prototype_of(Some(realm.object_prototype.clone())).unwrap());
}

// ===========================================================================
// 4. Proxy invariants
// ===========================================================================

#[test]
fn hiding_configurable_properties_is_allowed() {
    let realm = Realm::new();
    let target = realm.new_object();
    target.put("a", 1).unwrap();
    let proxy = JsObject::new_proxy(&target, Rc::new(Hiding)).unwrap();
    assert_eq!(proxy.get_own_property(&str_key("a")).unwrap(), None);
    assert!(!proxy.has_property(&str_key("a")).unwrap());
    assert!(proxy.own_property_keys().unwrap().is_empty());
}

#[test]
fn hiding_non_configurable_properties_is_a_type_error() {
    let realm = Realm::new();
    let target = realm.new_object();
    target
        .define_property_or_throw(
            str_key("fixed"),
            PartialDescriptor::with_value(int_val(1)).configurable(false),
        )
        .unwrap();
    let proxy = JsObject::new_proxy(&target, Rc::new(Hiding)).unwrap();
    assert!(matches!(
        proxy.get_own_property(&str_key("fixed")),
        Err(ObjectError::TypeError(_))
    ));
    assert!(proxy.has_property(&str_key("fixed")).is_err());
    assert!(proxy.own_property_keys().is_err());
}

#[test]
fn lying_about_frozen_values_is_a_type_error() {
    let realm = Realm::new();
    let target = realm.new_object();
    target.put("v", 1).unwrap();
    let proxy = JsObject::new_proxy(&target, Rc::new(Lying)).unwrap();
    assert_eq!(proxy.get_value("v").unwrap(), Value::from("lie"));

    target.freeze().unwrap();
    assert!(matches!(
        proxy.get_value("v"),
        Err(ObjectError::TypeError(_))
    ));
    assert!(proxy.is_extensible().is_err());
}

#[test]
fn proxy_of_array_is_an_array() {
    let realm = Realm::new();
    let target = realm.new_array(vec![int_val(1)]);
    struct Forward;
    impl ProxyHandler for Forward {}
    let proxy = JsObject::new_proxy(&target, Rc::new(Forward)).unwrap();
    assert!(proxy.is_array());
    assert_eq!(proxy.array_length().unwrap(), 1);
    let nested = JsObject::new_proxy(&proxy, Rc::new(Forward));
    assert!(nested.is_err());
}

// ===========================================================================
// 5. Reflect and errors
// ===========================================================================

#[test]
fn reflect_rejects_primitive_targets() {
    let err = Reflect::get(&int_val(1), &str_key("x")).unwrap_err();
    assert_eq!(
        err,
        ObjectError::TypeError("Reflect.get called on non-object (number)".to_string())
    );
    assert!(Reflect::own_keys(&Value::Null).is_err());
    assert!(Reflect::apply(&Value::from("f"), &Value::Undefined, &[]).is_err());
}

#[test]
fn reflect_define_and_describe() {
    let realm = Realm::new();
    let o = Value::from(realm.new_object());
    assert!(Reflect::define_property(&o, str_key("x"), PartialDescriptor::with_value(int_val(1))).unwrap());
    let desc = Reflect::get_own_property_descriptor(&o, &str_key("x"))
        .unwrap()
        .unwrap();
    assert!(!desc.is_configurable());
    assert!(!Reflect::delete_property(&o, &str_key("x")).unwrap());
}

#[test]
fn object_error_display_and_serde() {
    let errors = [
        ObjectError::type_error("bad"),
        ObjectError::RangeError("len".to_string()),
        ObjectError::PrototypeCycleDetected,
        ObjectError::PrototypeChainTooDeep { depth: 1025, max: 1024 },
        ObjectError::Thrown("boom".to_string()),
    ];
    assert_eq!(errors[0].to_string(), "TypeError: bad");
    assert_eq!(errors[1].to_string(), "RangeError: len");
    assert_eq!(errors[4].to_string(), "uncaught: boom");
    for error in errors {
        let json = serde_json::to_string(&error).unwrap();
        let back: ObjectError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, error);
    }
}
