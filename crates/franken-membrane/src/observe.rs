//! `observe`: one membrane per observed root, with listener fan-out.
//!
//! The change hook ignores bookkeeping keys, notifies every listener
//! registered on the mutated object, then forwards to the caller's
//! `on_change`. Two bookkeeping properties are written through the wrapper:
//! a back-reference to the membrane and an empty listener array.
//!
//! Listener entries are either functions, called as `f(object, key)`, or
//! objects with a callable `modelUpdated` method.

use std::rc::Rc;

use crate::config::{MembraneConfig, ObserveConfig};
use crate::membrane::{Membrane, MembraneOptions};
use crate::object::{JsObject, Realm};
use crate::object_model::{ObjectError, PropertyKey, Value};

const MODEL_UPDATED: &str = "modelUpdated";

/// A reactive root returned by [`observe`].
#[derive(Debug, Clone)]
pub struct Observed {
    /// Reactive wrapper of the observed target.
    pub data: JsObject,
    pub membrane: Membrane,
    config: ObserveConfig,
}

impl Observed {
    pub fn config(&self) -> &ObserveConfig {
        &self.config
    }

    /// Append `listener` to the root's listener array. The push goes through
    /// the wrapper, so it is itself reported to `on_change`.
    pub fn subscribe(&self, listener: &JsObject) -> Result<u32, ObjectError> {
        let listeners = self.data.get_value(self.config.listeners_key.as_str())?;
        let Value::Object(listeners) = listeners else {
            return Err(ObjectError::type_error(format!(
                "'{}' is not a listener array",
                self.config.listeners_key
            )));
        };
        listeners.push(std::iter::once(Value::from(listener)))
    }

    /// The membrane that produced `data`, via its back-reference.
    pub fn membrane_of(&self) -> Result<Option<Membrane>, ObjectError> {
        membrane_of(&self.data, &self.config)
    }
}

/// Observe `target` with the default bookkeeping keys.
pub fn observe(
    realm: &Realm,
    target: &JsObject,
    on_change: impl Fn(&JsObject, &PropertyKey) -> Result<(), ObjectError> + 'static,
) -> Result<Observed, ObjectError> {
    observe_with_config(
        realm,
        target,
        ObserveConfig::default(),
        MembraneConfig::default(),
        on_change,
    )
}

pub fn observe_with_config(
    realm: &Realm,
    target: &JsObject,
    config: ObserveConfig,
    membrane_config: MembraneConfig,
    on_change: impl Fn(&JsObject, &PropertyKey) -> Result<(), ObjectError> + 'static,
) -> Result<Observed, ObjectError> {
    let hook_config = config.clone();
    let membrane = Membrane::new(
        MembraneOptions::new()
            .with_config(membrane_config)
            .with_value_mutated(move |object, key| {
                if key.as_str().is_some_and(|name| hook_config.is_bookkeeping(name)) {
                    return Ok(());
                }
                notify_listeners(object, key, &hook_config.listeners_key)?;
                on_change(object, key)
            }),
    );

    let Value::Object(data) = membrane.get_proxy(&Value::from(target)) else {
        return Err(ObjectError::type_error("observe target must be an object"));
    };
    data.put(
        config.membrane_key.as_str(),
        realm.new_host(Rc::new(membrane.clone())),
    )?;
    data.put(
        config.listeners_key.as_str(),
        realm.new_array(Vec::<Value>::new()),
    )?;

    Ok(Observed {
        data,
        membrane,
        config,
    })
}

fn notify_listeners(object: &JsObject, key: &PropertyKey, listeners_key: &str) -> Result<(), ObjectError> {
    let Value::Object(listeners) = object.get_value(listeners_key)? else {
        return Ok(());
    };
    let args = [Value::from(object), key.to_value()];
    let len = listeners.array_length()?;
    for index in 0..len {
        let Value::Object(listener) = listeners.get_value(PropertyKey::index(index))? else {
            continue;
        };
        if listener.is_callable() {
            listener.call(&Value::Undefined, &args)?;
        } else if let Value::Object(method) = listener.get_value(MODEL_UPDATED)?
            && method.is_callable()
        {
            method.call(&Value::from(&listener), &args)?;
        }
    }
    Ok(())
}

/// Recover the membrane behind an observed root.
pub fn membrane_of(data: &JsObject, config: &ObserveConfig) -> Result<Option<Membrane>, ObjectError> {
    let Value::Object(holder) = data.get_value(config.membrane_key.as_str())? else {
        return Ok(None);
    };
    Ok(holder
        .host_payload()
        .and_then(|payload| payload.downcast::<Membrane>().ok())
        .map(|membrane| membrane.as_ref().clone()))
}
