//! Descriptor transforms between the real object and its wrappers.
//!
//! Outbound descriptors get their `value` wrapped, or their accessors
//! replaced by thunks that run the real accessor against the unwrapped
//! receiver. Inbound descriptors get their `value` unwrapped so the real
//! object never stores a wrapper.

use crate::object::JsObject;
use crate::object_model::{PartialDescriptor, PropertyDescriptor, Value};

use super::{Membrane, WrapperKind};

/// Wrap `value` with the `kind` half of the membrane.
pub(crate) fn wrap_value(membrane: &Membrane, value: &Value, kind: WrapperKind) -> Value {
    match kind {
        WrapperKind::Reactive => membrane.get_proxy(value),
        WrapperKind::ReadOnly => membrane.get_read_only_proxy(value),
    }
}

/// Outbound transform. Read-only descriptors lose their setter.
pub(crate) fn wrap_descriptor(
    membrane: &Membrane,
    desc: PropertyDescriptor,
    kind: WrapperKind,
) -> PropertyDescriptor {
    match desc {
        PropertyDescriptor::Data {
            value,
            writable,
            enumerable,
            configurable,
        } => PropertyDescriptor::Data {
            value: wrap_value(membrane, &value, kind),
            writable,
            enumerable,
            configurable,
        },
        PropertyDescriptor::Accessor {
            get,
            set,
            enumerable,
            configurable,
        } => {
            let get = get.map(|getter| getter_thunk(membrane, getter, kind));
            let set = match kind {
                WrapperKind::Reactive => set.map(|setter| setter_thunk(membrane, setter)),
                WrapperKind::ReadOnly => None,
            };
            PropertyDescriptor::Accessor {
                get,
                set,
                enumerable,
                configurable,
            }
        }
    }
}

/// Which accessor a thunk stands in for. Getter thunks differ per wrapper
/// kind because they wrap their result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum ThunkRole {
    Getter(WrapperKind),
    Setter,
}

fn getter_thunk(membrane: &Membrane, getter: JsObject, kind: WrapperKind) -> JsObject {
    membrane.accessor_thunk(&getter, ThunkRole::Getter(kind), || {
        let membrane = membrane.clone();
        let getter = getter.clone();
        JsObject::new_function(None, move |this, _args| {
            let receiver = membrane.unwrap_proxy(this);
            let value = getter.call(&receiver, &[])?;
            Ok(wrap_value(&membrane, &value, kind))
        })
    })
}

fn setter_thunk(membrane: &Membrane, setter: JsObject) -> JsObject {
    membrane.accessor_thunk(&setter, ThunkRole::Setter, || {
        let membrane = membrane.clone();
        let setter = setter.clone();
        JsObject::new_function(None, move |this, args| {
            let receiver = membrane.unwrap_proxy(this);
            let value = membrane.unwrap_proxy(args.first().unwrap_or(&Value::Undefined));
            setter.call(&receiver, &[value])?;
            Ok(Value::Undefined)
        })
    })
}

/// Inbound transform: strip wrappers from a `value` field.
pub(crate) fn unwrap_descriptor_value(membrane: &Membrane, mut desc: PartialDescriptor) -> PartialDescriptor {
    if let Some(value) = desc.value.take() {
        desc.value = Some(membrane.unwrap_proxy(&value));
    }
    desc
}
