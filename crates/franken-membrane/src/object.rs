//! Shared object handles and the ES2020 internal-method surface.
//!
//! A [`JsObject`] is a reference-counted cell holding either ordinary slots
//! or a proxy (target + handler). Every operation goes through the internal
//! methods here, so a proxy is indistinguishable from an ordinary object to
//! callers: `Object.keys`, `Object.freeze` and `Array.prototype.push` are
//! expressed as helpers over `[[OwnPropertyKeys]]`, `[[DefineOwnProperty]]`
//! and `[[Set]]`.
//!
//! No `RefCell` borrow is held while user code (getters, setters, traps,
//! native functions) runs.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::object_model::{
    LENGTH, ObjectError, ObjectId, OrdinaryObject, PartialDescriptor, PropertyDescriptor,
    PropertyKey, Value,
};
use crate::proxy::{ProxyHandler, ProxyObject};

/// Maximum prototype chain depth before a walk is rejected.
pub const MAX_PROTOTYPE_CHAIN_DEPTH: u32 = 1024;

// ---------------------------------------------------------------------------
// Native functions and object classes
// ---------------------------------------------------------------------------

type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value, ObjectError>;

/// Host-implemented callable: receives `this` and the argument list.
#[derive(Clone)]
pub struct NativeFunction(Rc<NativeFn>);

impl NativeFunction {
    pub fn new(f: impl Fn(&Value, &[Value]) -> Result<Value, ObjectError> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn invoke(&self, this: &Value, args: &[Value]) -> Result<Value, ObjectError> {
        (self.0)(this, args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NativeFunction")
    }
}

/// Intrinsic class of an ordinary object.
#[derive(Clone)]
pub enum ObjectClass {
    Plain,
    /// Array exotic: maintains `length`.
    Array,
    Function(NativeFunction),
    /// Date with its time value in milliseconds.
    Date(f64),
    /// Opaque host payload (typed arrays, collections, platform objects).
    Host(Rc<dyn Any>),
}

impl ObjectClass {
    /// Exotic classes whose state lives outside the property table.
    pub fn is_exotic(&self) -> bool {
        matches!(self, Self::Date(_) | Self::Host(_))
    }
}

impl fmt::Debug for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("Plain"),
            Self::Array => f.write_str("Array"),
            Self::Function(_) => f.write_str("Function"),
            Self::Date(t) => write!(f, "Date({t})"),
            Self::Host(_) => f.write_str("Host"),
        }
    }
}

// ---------------------------------------------------------------------------
// JsObject / WeakObject
// ---------------------------------------------------------------------------

pub(crate) enum ObjectBody {
    Ordinary(RefCell<OrdinaryObject>),
    Proxy(ProxyObject),
}

pub(crate) struct ObjectCell {
    id: ObjectId,
    body: ObjectBody,
}

/// Shared handle to an object. Equality is identity.
#[derive(Clone)]
pub struct JsObject(Rc<ObjectCell>);

/// Non-owning handle; does not keep the object alive.
#[derive(Clone)]
pub struct WeakObject {
    id: ObjectId,
    cell: Weak<ObjectCell>,
}

impl WeakObject {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn upgrade(&self) -> Option<JsObject> {
        self.cell.upgrade().map(JsObject)
    }

    pub fn is_alive(&self) -> bool {
        self.cell.strong_count() > 0
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakObject({}, alive={})", self.id, self.is_alive())
    }
}

impl PartialEq for JsObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for JsObject {}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.body {
            ObjectBody::Ordinary(slots) => match slots.try_borrow() {
                Ok(slots) => write!(f, "JsObject({}, {:?})", self.0.id, slots.class),
                Err(_) => write!(f, "JsObject({}, <borrowed>)", self.0.id),
            },
            ObjectBody::Proxy(_) => write!(f, "JsObject({}, Proxy)", self.0.id),
        }
    }
}

impl JsObject {
    fn from_body(body: ObjectBody) -> Self {
        Self(Rc::new(ObjectCell {
            id: ObjectId::fresh(),
            body,
        }))
    }

    pub(crate) fn from_slots(slots: OrdinaryObject) -> Self {
        Self::from_body(ObjectBody::Ordinary(RefCell::new(slots)))
    }

    /// Plain ordinary object.
    pub fn new_ordinary(prototype: Option<JsObject>) -> Self {
        Self::with_class(prototype, ObjectClass::Plain)
    }

    pub fn with_class(prototype: Option<JsObject>, class: ObjectClass) -> Self {
        Self::from_slots(OrdinaryObject::new(prototype, class))
    }

    /// Array populated with `items` at indices `0..n`.
    pub fn new_array(prototype: Option<JsObject>, items: impl IntoIterator<Item = Value>) -> Self {
        let mut slots = OrdinaryObject::new(prototype, ObjectClass::Array);
        let mut len: u32 = 0;
        for item in items {
            slots
                .properties
                .insert(PropertyKey::index(len), PropertyDescriptor::data(item));
            len += 1;
        }
        slots.properties.insert(
            PropertyKey::length(),
            PropertyDescriptor::Data {
                value: Value::Number(f64::from(len)),
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
        Self::from_slots(slots)
    }

    pub fn new_function(
        prototype: Option<JsObject>,
        f: impl Fn(&Value, &[Value]) -> Result<Value, ObjectError> + 'static,
    ) -> Self {
        Self::with_class(prototype, ObjectClass::Function(NativeFunction::new(f)))
    }

    /// Proxy over `target`. The target must be an ordinary object.
    pub fn new_proxy(target: &JsObject, handler: Rc<dyn ProxyHandler>) -> Result<Self, ObjectError> {
        if target.slots().is_none() {
            return Err(ObjectError::type_error(
                "proxy target must be an ordinary object",
            ));
        }
        Ok(Self::proxy_unchecked(target.clone(), handler))
    }

    /// Proxy over a target already known to be ordinary.
    pub(crate) fn proxy_unchecked(target: JsObject, handler: Rc<dyn ProxyHandler>) -> Self {
        Self::from_body(ObjectBody::Proxy(ProxyObject::new(target, handler)))
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    pub fn downgrade(&self) -> WeakObject {
        WeakObject {
            id: self.0.id,
            cell: Rc::downgrade(&self.0),
        }
    }

    pub fn ptr_eq(&self, other: &JsObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.0.body, ObjectBody::Proxy(_))
    }

    pub(crate) fn slots(&self) -> Option<&RefCell<OrdinaryObject>> {
        match &self.0.body {
            ObjectBody::Ordinary(slots) => Some(slots),
            ObjectBody::Proxy(_) => None,
        }
    }

    fn class(&self) -> Option<ObjectClass> {
        self.slots().map(|slots| slots.borrow().class.clone())
    }

    /// IsArray (§7.2.2): sees through proxies to their target.
    pub fn is_array(&self) -> bool {
        match &self.0.body {
            ObjectBody::Ordinary(slots) => slots.borrow().is_array(),
            ObjectBody::Proxy(proxy) => proxy.target().is_array(),
        }
    }

    /// IsCallable (§7.2.3).
    pub fn is_callable(&self) -> bool {
        match &self.0.body {
            ObjectBody::Ordinary(slots) => {
                matches!(slots.borrow().class, ObjectClass::Function(_))
            }
            ObjectBody::Proxy(proxy) => proxy.target().is_callable(),
        }
    }

    /// Date or host-backed object.
    pub fn is_exotic(&self) -> bool {
        self.class().is_some_and(|class| class.is_exotic())
    }

    pub fn date_value(&self) -> Option<f64> {
        match self.class()? {
            ObjectClass::Date(t) => Some(t),
            _ => None,
        }
    }

    pub fn host_payload(&self) -> Option<Rc<dyn Any>> {
        match self.class()? {
            ObjectClass::Host(payload) => Some(payload),
            _ => None,
        }
    }

    fn as_value(&self) -> Value {
        Value::Object(self.clone())
    }

    // -----------------------------------------------------------------------
    // Internal methods (§9.1, §9.5)
    // -----------------------------------------------------------------------

    /// `[[GetPrototypeOf]]`
    pub fn get_prototype_of(&self) -> Result<Option<JsObject>, ObjectError> {
        match &self.0.body {
            ObjectBody::Ordinary(slots) => Ok(slots.borrow().prototype.clone()),
            ObjectBody::Proxy(proxy) => proxy.get_prototype_of(),
        }
    }

    /// `[[SetPrototypeOf]]`. Cycles through ordinary objects are errors.
    pub fn set_prototype_of(&self, proto: Option<JsObject>) -> Result<bool, ObjectError> {
        let slots = match &self.0.body {
            ObjectBody::Ordinary(slots) => slots,
            ObjectBody::Proxy(proxy) => return proxy.set_prototype_of(proto),
        };
        {
            let current = slots.borrow();
            if current.prototype == proto {
                return Ok(true);
            }
            if !current.extensible {
                return Ok(false);
            }
        }
        let mut cursor = proto.clone();
        let mut depth: u32 = 0;
        while let Some(p) = cursor {
            if p.ptr_eq(self) {
                return Err(ObjectError::PrototypeCycleDetected);
            }
            depth += 1;
            if depth > MAX_PROTOTYPE_CHAIN_DEPTH {
                return Err(ObjectError::PrototypeChainTooDeep {
                    depth,
                    max: MAX_PROTOTYPE_CHAIN_DEPTH,
                });
            }
            cursor = match p.slots() {
                Some(next) => next.borrow().prototype.clone(),
                // A proxy ends the cycle walk (§9.1.2.1 step 8.c.i).
                None => None,
            };
        }
        slots.borrow_mut().prototype = proto;
        Ok(true)
    }

    /// `[[IsExtensible]]`
    pub fn is_extensible(&self) -> Result<bool, ObjectError> {
        match &self.0.body {
            ObjectBody::Ordinary(slots) => Ok(slots.borrow().extensible),
            ObjectBody::Proxy(proxy) => proxy.is_extensible(),
        }
    }

    /// `[[PreventExtensions]]`
    pub fn prevent_extensions(&self) -> Result<bool, ObjectError> {
        match &self.0.body {
            ObjectBody::Ordinary(slots) => {
                slots.borrow_mut().prevent_extensions();
                Ok(true)
            }
            ObjectBody::Proxy(proxy) => proxy.prevent_extensions(),
        }
    }

    /// `[[GetOwnProperty]]`
    pub fn get_own_property(
        &self,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, ObjectError> {
        match &self.0.body {
            ObjectBody::Ordinary(slots) => Ok(slots.borrow().get_own_property(key).cloned()),
            ObjectBody::Proxy(proxy) => proxy.get_own_property(key),
        }
    }

    /// `[[DefineOwnProperty]]`
    pub fn define_own_property(
        &self,
        key: PropertyKey,
        desc: PartialDescriptor,
    ) -> Result<bool, ObjectError> {
        match &self.0.body {
            ObjectBody::Ordinary(slots) => slots.borrow_mut().define_own_property(key, desc),
            ObjectBody::Proxy(proxy) => proxy.define_own_property(&key, desc),
        }
    }

    /// `[[HasProperty]]`: own properties, then the prototype chain.
    pub fn has_property(&self, key: &PropertyKey) -> Result<bool, ObjectError> {
        let mut current = self.clone();
        let mut depth: u32 = 0;
        loop {
            let slots = match &current.0.body {
                ObjectBody::Ordinary(slots) => slots,
                ObjectBody::Proxy(proxy) => return proxy.has(key),
            };
            let parent = {
                let slots = slots.borrow();
                if slots.has_own_property(key) {
                    return Ok(true);
                }
                slots.prototype.clone()
            };
            match parent {
                None => return Ok(false),
                Some(parent) => {
                    depth = next_depth(depth)?;
                    current = parent;
                }
            }
        }
    }

    /// `[[Get]]`: accessors run with `receiver` as `this`.
    pub fn get(&self, key: &PropertyKey, receiver: &Value) -> Result<Value, ObjectError> {
        let mut current = self.clone();
        let mut depth: u32 = 0;
        loop {
            let slots = match &current.0.body {
                ObjectBody::Ordinary(slots) => slots,
                ObjectBody::Proxy(proxy) => return proxy.get(key, receiver),
            };
            let (own, parent) = {
                let slots = slots.borrow();
                (slots.get_own_property(key).cloned(), slots.prototype.clone())
            };
            match own {
                Some(PropertyDescriptor::Data { value, .. }) => return Ok(value),
                Some(PropertyDescriptor::Accessor { get: Some(getter), .. }) => {
                    return getter.call(receiver, &[]);
                }
                Some(PropertyDescriptor::Accessor { get: None, .. }) => return Ok(Value::Undefined),
                None => {}
            }
            match parent {
                None => return Ok(Value::Undefined),
                Some(parent) => {
                    depth = next_depth(depth)?;
                    current = parent;
                }
            }
        }
    }

    /// `[[Set]]` (OrdinarySet, §9.1.9.1).
    pub fn set(&self, key: &PropertyKey, value: Value, receiver: &Value) -> Result<bool, ObjectError> {
        let mut current = self.clone();
        let mut depth: u32 = 0;
        let found = loop {
            let slots = match &current.0.body {
                ObjectBody::Ordinary(slots) => slots,
                ObjectBody::Proxy(proxy) => return proxy.set(key, value, receiver),
            };
            let (own, parent) = {
                let slots = slots.borrow();
                (slots.get_own_property(key).cloned(), slots.prototype.clone())
            };
            if own.is_some() {
                break own;
            }
            match parent {
                None => break None,
                Some(parent) => {
                    depth = next_depth(depth)?;
                    current = parent;
                }
            }
        };

        match found.unwrap_or_else(|| PropertyDescriptor::data(Value::Undefined)) {
            PropertyDescriptor::Data {
                writable: false, ..
            } => Ok(false),
            PropertyDescriptor::Data { .. } => {
                let Value::Object(receiver) = receiver else {
                    return Ok(false);
                };
                match receiver.get_own_property(key)? {
                    Some(existing) => {
                        if existing.is_accessor() || !existing.is_writable() {
                            return Ok(false);
                        }
                        receiver.define_own_property(key.clone(), PartialDescriptor::with_value(value))
                    }
                    None => receiver
                        .define_own_property(key.clone(), PropertyDescriptor::data(value).into()),
                }
            }
            PropertyDescriptor::Accessor {
                set: Some(setter), ..
            } => {
                setter.call(receiver, &[value])?;
                Ok(true)
            }
            PropertyDescriptor::Accessor { set: None, .. } => Ok(false),
        }
    }

    /// `[[Delete]]`
    pub fn delete(&self, key: &PropertyKey) -> Result<bool, ObjectError> {
        match &self.0.body {
            ObjectBody::Ordinary(slots) => Ok(slots.borrow_mut().delete(key)),
            ObjectBody::Proxy(proxy) => proxy.delete(key),
        }
    }

    /// `[[OwnPropertyKeys]]`
    pub fn own_property_keys(&self) -> Result<Vec<PropertyKey>, ObjectError> {
        match &self.0.body {
            ObjectBody::Ordinary(slots) => Ok(slots.borrow().own_property_keys()),
            ObjectBody::Proxy(proxy) => proxy.own_keys(),
        }
    }

    /// `[[Call]]`
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, ObjectError> {
        match &self.0.body {
            ObjectBody::Ordinary(slots) => {
                let function = match &slots.borrow().class {
                    ObjectClass::Function(f) => f.clone(),
                    _ => {
                        return Err(ObjectError::type_error(format!(
                            "{} is not a function",
                            self.as_value()
                        )));
                    }
                };
                function.invoke(this, args)
            }
            ObjectBody::Proxy(proxy) => proxy.call(this, args),
        }
    }

    /// `[[Construct]]`: a fresh object inheriting from the function's
    /// `prototype` property is passed as `this`.
    pub fn construct(&self, args: &[Value]) -> Result<Value, ObjectError> {
        if let ObjectBody::Proxy(proxy) = &self.0.body {
            return proxy.construct(args);
        }
        if !self.is_callable() {
            return Err(ObjectError::type_error(format!(
                "{} is not a constructor",
                self.as_value()
            )));
        }
        let proto = match self.get_value("prototype")? {
            Value::Object(proto) => Some(proto),
            _ => None,
        };
        let instance = JsObject::new_ordinary(proto);
        let this = instance.as_value();
        match self.call(&this, args)? {
            result @ Value::Object(_) => Ok(result),
            _ => Ok(this),
        }
    }

    // -----------------------------------------------------------------------
    // Abstract operations (§7.3)
    // -----------------------------------------------------------------------

    /// Get(O, P)
    pub fn get_value(&self, key: impl Into<PropertyKey>) -> Result<Value, ObjectError> {
        self.get(&key.into(), &self.as_value())
    }

    /// Set(O, P, V, true): a refused write is a TypeError.
    pub fn put(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Result<(), ObjectError> {
        let key = key.into();
        if self.set(&key, value.into(), &self.as_value())? {
            Ok(())
        } else {
            Err(ObjectError::type_error(format!(
                "cannot assign to read only property '{key}'"
            )))
        }
    }

    /// DeletePropertyOrThrow
    pub fn delete_or_throw(&self, key: &PropertyKey) -> Result<(), ObjectError> {
        if self.delete(key)? {
            Ok(())
        } else {
            Err(ObjectError::type_error(format!(
                "cannot delete property '{key}'"
            )))
        }
    }

    /// DefinePropertyOrThrow
    pub fn define_property_or_throw(
        &self,
        key: PropertyKey,
        desc: PartialDescriptor,
    ) -> Result<(), ObjectError> {
        let shown = key.to_string();
        if self.define_own_property(key, desc)? {
            Ok(())
        } else {
            Err(ObjectError::type_error(format!(
                "cannot redefine property: {shown}"
            )))
        }
    }

    /// HasOwnProperty
    pub fn has_own(&self, key: impl Into<PropertyKey>) -> Result<bool, ObjectError> {
        Ok(self.get_own_property(&key.into())?.is_some())
    }

    /// `Object.keys`: enumerable own string keys.
    pub fn keys(&self) -> Result<Vec<PropertyKey>, ObjectError> {
        let mut keys = Vec::new();
        for key in self.own_property_keys()? {
            if matches!(key, PropertyKey::Symbol(_)) {
                continue;
            }
            if let Some(desc) = self.get_own_property(&key)?
                && desc.is_enumerable()
            {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// Current `length` of an array-like, read through `[[Get]]`. A length
    /// past `2^32 - 1` is a RangeError.
    pub fn array_length(&self) -> Result<u32, ObjectError> {
        match self.get_value(LENGTH)? {
            Value::Number(n) if n.is_finite() && n > 0.0 => {
                let n = n.trunc();
                if n > f64::from(u32::MAX) {
                    return Err(ObjectError::RangeError(format!("invalid array length: {n}")));
                }
                Ok(n as u32)
            }
            _ => Ok(0),
        }
    }

    /// `Array.prototype.push`: one `[[Set]]` per element, then `length`.
    pub fn push(&self, items: impl IntoIterator<Item = Value>) -> Result<u32, ObjectError> {
        let mut len = self.array_length()?;
        for item in items {
            let next = len
                .checked_add(1)
                .ok_or_else(|| ObjectError::type_error("push past the maximum array length"))?;
            self.put(PropertyKey::index(len), item)?;
            len = next;
        }
        self.put(LENGTH, f64::from(len))?;
        Ok(len)
    }

    /// `Object.freeze` (SetIntegrityLevel frozen, §7.3.14).
    pub fn freeze(&self) -> Result<(), ObjectError> {
        self.set_integrity_level(true)
    }

    /// `Object.seal`
    pub fn seal(&self) -> Result<(), ObjectError> {
        self.set_integrity_level(false)
    }

    fn set_integrity_level(&self, frozen: bool) -> Result<(), ObjectError> {
        if !self.prevent_extensions()? {
            return Err(ObjectError::type_error("cannot prevent extensions"));
        }
        for key in self.own_property_keys()? {
            let desc = if frozen {
                match self.get_own_property(&key)? {
                    None => continue,
                    Some(current) if current.is_accessor() => {
                        PartialDescriptor::default().configurable(false)
                    }
                    Some(_) => PartialDescriptor::default()
                        .configurable(false)
                        .writable(false),
                }
            } else {
                PartialDescriptor::default().configurable(false)
            };
            self.define_property_or_throw(key, desc)?;
        }
        Ok(())
    }

    /// `Object.isFrozen`
    pub fn is_frozen(&self) -> Result<bool, ObjectError> {
        self.test_integrity_level(true)
    }

    /// `Object.isSealed`
    pub fn is_sealed(&self) -> Result<bool, ObjectError> {
        self.test_integrity_level(false)
    }

    fn test_integrity_level(&self, frozen: bool) -> Result<bool, ObjectError> {
        if self.is_extensible()? {
            return Ok(false);
        }
        for key in self.own_property_keys()? {
            if let Some(desc) = self.get_own_property(&key)? {
                if desc.is_configurable() {
                    return Ok(false);
                }
                if frozen && desc.is_writable() {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

fn next_depth(depth: u32) -> Result<u32, ObjectError> {
    let depth = depth + 1;
    if depth > MAX_PROTOTYPE_CHAIN_DEPTH {
        return Err(ObjectError::PrototypeChainTooDeep {
            depth,
            max: MAX_PROTOTYPE_CHAIN_DEPTH,
        });
    }
    Ok(depth)
}

// ---------------------------------------------------------------------------
// Realm: intrinsic prototypes
// ---------------------------------------------------------------------------

/// The intrinsic prototypes objects are created against.
#[derive(Debug, Clone)]
pub struct Realm {
    pub object_prototype: JsObject,
    pub array_prototype: JsObject,
    pub function_prototype: JsObject,
    pub date_prototype: JsObject,
}

impl Realm {
    pub fn new() -> Self {
        let object_prototype = JsObject::new_ordinary(None);
        let derived = || JsObject::new_ordinary(Some(object_prototype.clone()));
        Self {
            array_prototype: derived(),
            function_prototype: derived(),
            date_prototype: derived(),
            object_prototype,
        }
    }

    /// `{}`
    pub fn new_object(&self) -> JsObject {
        JsObject::new_ordinary(Some(self.object_prototype.clone()))
    }

    /// `Object.create(null)`
    pub fn new_null_prototype_object(&self) -> JsObject {
        JsObject::new_ordinary(None)
    }

    /// `[a, b, ...]`
    pub fn new_array(&self, items: impl IntoIterator<Item = Value>) -> JsObject {
        JsObject::new_array(Some(self.array_prototype.clone()), items)
    }

    pub fn new_function(
        &self,
        f: impl Fn(&Value, &[Value]) -> Result<Value, ObjectError> + 'static,
    ) -> JsObject {
        JsObject::new_function(Some(self.function_prototype.clone()), f)
    }

    /// `new Date(ms)`
    pub fn new_date(&self, time_ms: f64) -> JsObject {
        JsObject::with_class(Some(self.date_prototype.clone()), ObjectClass::Date(time_ms))
    }

    /// A class prototype object: `class Foo {}` gives `Foo.prototype`.
    pub fn new_class_prototype(&self) -> JsObject {
        self.new_object()
    }

    /// `new Foo()` where `prototype` is `Foo.prototype`.
    pub fn new_instance(&self, prototype: &JsObject) -> JsObject {
        JsObject::new_ordinary(Some(prototype.clone()))
    }

    /// Opaque host-backed object.
    pub fn new_host(&self, payload: Rc<dyn Any>) -> JsObject {
        JsObject::with_class(Some(self.object_prototype.clone()), ObjectClass::Host(payload))
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn str_key(s: &str) -> PropertyKey {
        PropertyKey::String(s.to_string())
    }

    fn int_val(n: i32) -> Value {
        Value::from(n)
    }

    // -----------------------------------------------------------------------
    // 1. Get / Set through the prototype chain
    // -----------------------------------------------------------------------

    #[test]
    fn get_walks_prototype_chain() {
        let realm = Realm::new();
        realm.object_prototype.put("shared", 7).unwrap();
        let obj = realm.new_object();
        assert_eq!(obj.get_value("shared").unwrap(), int_val(7));
        assert!(obj.has_property(&str_key("shared")).unwrap());
        assert!(!obj.has_own("shared").unwrap());
    }

    #[test]
    fn set_creates_own_property_on_receiver() {
        let realm = Realm::new();
        realm.object_prototype.put("x", 1).unwrap();
        let obj = realm.new_object();
        obj.put("x", 2).unwrap();
        assert_eq!(obj.get_value("x").unwrap(), int_val(2));
        assert_eq!(realm.object_prototype.get_value("x").unwrap(), int_val(1));
    }

    #[test]
    fn inherited_non_writable_blocks_set() {
        let realm = Realm::new();
        realm
            .object_prototype
            .define_own_property(str_key("ro"), PropertyDescriptor::data_frozen(int_val(1)).into())
            .unwrap();
        let obj = realm.new_object();
        assert!(!obj.set(&str_key("ro"), int_val(2), &Value::from(&obj)).unwrap());
        assert!(obj.put("ro", 2).is_err());
    }

    #[test]
    fn accessor_runs_with_receiver() {
        let realm = Realm::new();
        let getter = realm.new_function(|this, _| {
            let this = this.as_object().cloned().ok_or_else(|| ObjectError::type_error("this"))?;
            this.get_value("base")
        });
        let proto = realm.new_class_prototype();
        proto
            .define_own_property(str_key("derived"), PropertyDescriptor::accessor(Some(getter), None).into())
            .unwrap();
        let obj = realm.new_instance(&proto);
        obj.put("base", 42).unwrap();
        assert_eq!(obj.get_value("derived").unwrap(), int_val(42));
    }

    #[test]
    fn setter_receives_value() {
        let realm = Realm::new();
        let seen = Rc::new(Cell::new(0.0));
        let sink = seen.clone();
        let setter = realm.new_function(move |_, args| {
            sink.set(args.first().and_then(Value::as_number).unwrap_or(-1.0));
            Ok(Value::Undefined)
        });
        let obj = realm.new_object();
        obj.define_own_property(str_key("v"), PropertyDescriptor::accessor(None, Some(setter)).into())
            .unwrap();
        obj.put("v", 9).unwrap();
        assert_eq!(seen.get(), 9.0);
    }

    // -----------------------------------------------------------------------
    // 2. Prototype mutation
    // -----------------------------------------------------------------------

    #[test]
    fn prototype_cycle_is_rejected() {
        let a = JsObject::new_ordinary(None);
        let b = JsObject::new_ordinary(Some(a.clone()));
        let err = a.set_prototype_of(Some(b)).unwrap_err();
        assert_eq!(err, ObjectError::PrototypeCycleDetected);
    }

    #[test]
    fn non_extensible_refuses_new_prototype() {
        let obj = JsObject::new_ordinary(None);
        obj.prevent_extensions().unwrap();
        assert!(!obj.set_prototype_of(Some(JsObject::new_ordinary(None))).unwrap());
        assert!(obj.set_prototype_of(None).unwrap());
    }

    // -----------------------------------------------------------------------
    // 3. Integrity levels and array helpers
    // -----------------------------------------------------------------------

    #[test]
    fn freeze_and_is_frozen() {
        let realm = Realm::new();
        let obj = realm.new_object();
        obj.put("a", 1).unwrap();
        assert!(!obj.is_frozen().unwrap());
        obj.freeze().unwrap();
        assert!(obj.is_frozen().unwrap());
        assert!(obj.is_sealed().unwrap());
        assert!(obj.put("a", 2).is_err());
        assert!(obj.put("b", 2).is_err());
    }

    #[test]
    fn seal_keeps_values_writable() {
        let realm = Realm::new();
        let obj = realm.new_object();
        obj.put("a", 1).unwrap();
        obj.seal().unwrap();
        obj.put("a", 2).unwrap();
        assert!(obj.is_sealed().unwrap());
        assert!(!obj.is_frozen().unwrap());
        assert!(obj.delete_or_throw(&str_key("a")).is_err());
    }

    #[test]
    fn push_appends_and_updates_length() {
        let realm = Realm::new();
        let arr = realm.new_array([int_val(1)]);
        assert_eq!(arr.push([int_val(2), int_val(3)]).unwrap(), 3);
        assert_eq!(arr.array_length().unwrap(), 3);
        assert_eq!(arr.get_value(PropertyKey::index(2)).unwrap(), int_val(3));
    }

    #[test]
    fn keys_lists_enumerable_strings_only() {
        let realm = Realm::new();
        let arr = realm.new_array([int_val(1), int_val(2)]);
        assert_eq!(arr.keys().unwrap(), vec![str_key("0"), str_key("1")]);
    }

    // -----------------------------------------------------------------------
    // 4. Call / Construct and classes
    // -----------------------------------------------------------------------

    #[test]
    fn calling_non_function_is_type_error() {
        let obj = JsObject::new_ordinary(None);
        assert!(matches!(
            obj.call(&Value::Undefined, &[]),
            Err(ObjectError::TypeError(_))
        ));
    }

    #[test]
    fn construct_links_prototype_property() {
        let realm = Realm::new();
        let ctor = realm.new_function(|this, args| {
            if let Some(this) = this.as_object() {
                this.put("arg", args.first().cloned().unwrap_or_default())?;
            }
            Ok(Value::Undefined)
        });
        let proto = realm.new_class_prototype();
        ctor.put("prototype", &proto).unwrap();
        let instance = ctor.construct(&[int_val(5)]).unwrap();
        let instance = instance.as_object().unwrap();
        assert_eq!(instance.get_prototype_of().unwrap(), Some(proto));
        assert_eq!(instance.get_value("arg").unwrap(), int_val(5));
    }

    #[test]
    fn date_and_host_are_exotic() {
        let realm = Realm::new();
        let date = realm.new_date(1_000.0);
        assert!(date.is_exotic());
        assert_eq!(date.date_value(), Some(1_000.0));
        let host = realm.new_host(Rc::new(vec![1u8, 2, 3]));
        assert!(host.is_exotic());
        let payload = host.host_payload().unwrap();
        assert_eq!(payload.downcast_ref::<Vec<u8>>(), Some(&vec![1u8, 2, 3]));
        assert!(!realm.new_object().is_exotic());
    }

    #[test]
    fn weak_handle_tracks_liveness() {
        let obj = JsObject::new_ordinary(None);
        let weak = obj.downgrade();
        assert_eq!(weak.id(), obj.id());
        assert!(weak.upgrade().is_some());
        drop(obj);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn deep_prototype_chain_is_bounded() {
        let mut tip = JsObject::new_ordinary(None);
        for _ in 0..(MAX_PROTOTYPE_CHAIN_DEPTH + 2) {
            tip = JsObject::new_ordinary(Some(tip));
        }
        assert!(matches!(
            tip.get_value("missing"),
            Err(ObjectError::PrototypeChainTooDeep { .. })
        ));
    }
}
