//! Shadow targets.
//!
//! A wrapper's proxy target is an empty stand-in, never the real object. The
//! invariant checker validates every trap against it, so it carries copies
//! of whatever the wrapper has reported as non-configurable, and after a
//! lock the full key set of a non-extensible real object.

use crate::object::JsObject;
use crate::object_model::{ObjectError, PropertyDescriptor, PropertyKey, Value};

use super::descriptor::wrap_descriptor;
use super::{Membrane, MembraneEventKind, WrapperKind};

/// Empty object of the same shape as `original`: an array for arrays, a
/// no-op function for callables, a plain object otherwise. The prototype is
/// shared with `original`.
pub(crate) fn create_shadow_target(original: &JsObject) -> JsObject {
    let proto = original.get_prototype_of().unwrap_or_default();
    if original.is_array() {
        JsObject::new_array(proto, Vec::<Value>::new())
    } else if original.is_callable() {
        JsObject::new_function(proto, |_, _| Ok(Value::Undefined))
    } else {
        JsObject::new_ordinary(proto)
    }
}

/// A shadow entry that can never change again.
pub(crate) fn is_pinned(desc: &PropertyDescriptor) -> bool {
    !desc.is_configurable() && (desc.is_accessor() || !desc.is_writable())
}

/// Copy `desc` onto the shadow unless the existing entry is pinned.
pub(crate) fn install_on_shadow(
    shadow: &JsObject,
    key: &PropertyKey,
    desc: PropertyDescriptor,
) -> Result<(), ObjectError> {
    if let Some(existing) = shadow.get_own_property(key)?
        && is_pinned(&existing)
    {
        return Ok(());
    }
    shadow.define_property_or_throw(key.clone(), desc.into())
}

/// Drop a configurable shadow copy of a property the real object no longer
/// has.
pub(crate) fn forget_on_shadow(shadow: &JsObject, key: &PropertyKey) -> Result<(), ObjectError> {
    if let Some(existing) = shadow.get_own_property(key)?
        && existing.is_configurable()
    {
        shadow.delete(key)?;
    }
    Ok(())
}

/// One-time lock after the real object became non-extensible: copy every
/// own property (wrapped), sync the prototype, then make the shadow
/// non-extensible too.
pub(crate) fn lock_shadow_target(
    membrane: &Membrane,
    shadow: &JsObject,
    original: &JsObject,
    kind: WrapperKind,
) -> Result<(), ObjectError> {
    if !shadow.is_extensible()? {
        return Ok(());
    }
    for key in original.own_property_keys()? {
        let Some(desc) = original.get_own_property(&key)? else {
            continue;
        };
        install_on_shadow(shadow, &key, wrap_descriptor(membrane, desc, kind))?;
    }
    let proto = original.get_prototype_of()?;
    if shadow.get_prototype_of()? != proto {
        shadow.set_prototype_of(proto)?;
    }
    shadow.prevent_extensions()?;
    membrane.record(
        MembraneEventKind::ShadowLocked { wrapper: kind },
        Some(original.id()),
        None,
    );
    Ok(())
}
