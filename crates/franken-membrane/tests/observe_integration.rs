//! Integration tests for `observe`: the bookkeeping contract consumed by a
//! component layer, plus JSON snapshots of observed data.

use std::cell::RefCell;
use std::rc::Rc;

use frankenengine_membrane::config::{MembraneConfig, ObserveConfig};
use frankenengine_membrane::object::{JsObject, Realm};
use frankenengine_membrane::object_model::{ObjectError, PropertyKey, Value};
use frankenengine_membrane::observe::{membrane_of, observe, observe_with_config};
use frankenengine_membrane::snapshot::{from_json, to_json};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Changes = Rc<RefCell<Vec<(JsObject, String)>>>;

fn change_log() -> (Changes, impl Fn(&JsObject, &PropertyKey) -> Result<(), ObjectError>) {
    let changes: Changes = Rc::default();
    let sink = changes.clone();
    let on_change = move |target: &JsObject, key: &PropertyKey| {
        sink.borrow_mut().push((target.clone(), key.to_string()));
        Ok(())
    };
    (changes, on_change)
}

fn keys_of(changes: &Changes) -> Vec<String> {
    changes.borrow().iter().map(|(_, key)| key.clone()).collect()
}

fn object_from(realm: &Realm, json: serde_json::Value) -> JsObject {
    from_json(realm, &json)
        .unwrap()
        .as_object()
        .cloned()
        .unwrap()
}

// ===========================================================================
// 1. Change forwarding
// ===========================================================================

#[test]
fn nested_changes_reach_on_change_with_the_real_object() {
    let realm = Realm::new();
    let target = object_from(&realm, json!({"todo": {"done": false}}));
    let inner = target.get_value("todo").unwrap().as_object().cloned().unwrap();
    let (changes, on_change) = change_log();
    let observed = observe(&realm, &target, on_change).unwrap();

    let todo = observed.data.get_value("todo").unwrap();
    todo.as_object().unwrap().put("done", true).unwrap();

    let log = changes.borrow();
    assert_eq!(log.len(), 1);
    assert!(log[0].0.ptr_eq(&inner));
    assert_eq!(log[0].1, "done");
    assert_eq!(inner.get_value("done").unwrap(), Value::from(true));
}

#[test]
fn bookkeeping_writes_are_invisible() {
    let realm = Realm::new();
    let target = realm.new_object();
    let (changes, on_change) = change_log();
    let observed = observe(&realm, &target, on_change).unwrap();

    observed.data.put("__z_private", 1).unwrap();
    observed.data.put("visible", 1).unwrap();
    assert_eq!(keys_of(&changes), vec!["visible"]);
}

#[test]
fn custom_bookkeeping_keys() {
    let realm = Realm::new();
    let target = realm.new_object();
    let (changes, on_change) = change_log();
    let config = ObserveConfig {
        bookkeeping_prefix: "$$".to_string(),
        membrane_key: "$$membrane".to_string(),
        listeners_key: "$$listeners".to_string(),
    };
    let observed =
        observe_with_config(&realm, &target, config.clone(), MembraneConfig::traced(), on_change)
            .unwrap();

    assert!(target.has_own("$$membrane").unwrap());
    assert!(target.has_own("$$listeners").unwrap());
    assert!(!target.has_own("__z_membrane").unwrap());
    observed.data.put("__z_now_visible", 1).unwrap();
    assert_eq!(keys_of(&changes), vec!["__z_now_visible"]);
    assert!(membrane_of(&observed.data, &config).unwrap().is_some());
    assert!(!observed.membrane.drain_events().is_empty());
}

// ===========================================================================
// 2. Listeners
// ===========================================================================

#[test]
fn listeners_run_before_on_change() {
    let realm = Realm::new();
    let target = realm.new_object();
    let order = Rc::new(RefCell::new(Vec::new()));

    let sink = order.clone();
    let observed = observe(&realm, &target, move |_, key| {
        sink.borrow_mut().push(format!("on_change:{key}"));
        Ok(())
    })
    .unwrap();
    let sink = order.clone();
    let listener = realm.new_function(move |_, args| {
        sink.borrow_mut().push(format!("listener:{}", args[1]));
        Ok(Value::Undefined)
    });
    observed.subscribe(&listener).unwrap();
    order.borrow_mut().clear();

    observed.data.put("x", 1).unwrap();
    assert_eq!(*order.borrow(), vec!["listener:x", "on_change:x"]);
}

#[test]
fn subscribing_is_itself_a_tracked_change() {
    let realm = Realm::new();
    let target = realm.new_object();
    let (changes, on_change) = change_log();
    let observed = observe(&realm, &target, on_change).unwrap();
    let listener = realm.new_function(|_, _| Ok(Value::Undefined));
    assert_eq!(observed.subscribe(&listener).unwrap(), 1);
    assert_eq!(keys_of(&changes), vec!["0", "length"]);
    let listeners = target.get_value("__z_components").unwrap();
    assert!(changes.borrow()[0].0.ptr_eq(listeners.as_object().unwrap()));
}

#[test]
fn listeners_receive_the_mutated_object() {
    let realm = Realm::new();
    let target = realm.new_object();
    let (_, on_change) = change_log();
    let observed = observe(&realm, &target, on_change).unwrap();
    let seen = Rc::new(RefCell::new(None));
    let sink = seen.clone();
    let listener = realm.new_function(move |_, args| {
        *sink.borrow_mut() = args[0].as_object().cloned();
        Ok(Value::Undefined)
    });
    observed.subscribe(&listener).unwrap();
    observed.data.put("y", 2).unwrap();
    assert!(seen.borrow().as_ref().unwrap().ptr_eq(&target));
}

// ===========================================================================
// 3. Snapshots
// ===========================================================================

#[test]
fn snapshot_of_observed_data_skips_host_back_reference_contents() {
    let realm = Realm::new();
    let target = object_from(&realm, json!({"items": [1, 2], "title": "t"}));
    let (_, on_change) = change_log();
    let observed = observe(&realm, &target, on_change).unwrap();
    let items = observed.data.get_value("items").unwrap();
    items.as_object().unwrap().push(vec![Value::from(3)]).unwrap();

    let snapshot = to_json(&Value::from(&observed.data)).unwrap();
    assert_eq!(
        snapshot,
        json!({
            "__z_components": [],
            "__z_membrane": {},
            "items": [1, 2, 3],
            "title": "t"
        })
    );
}
