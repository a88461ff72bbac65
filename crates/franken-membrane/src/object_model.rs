//! ES2020 object model primitives: property keys, values, property
//! descriptors and ordinary-object property storage.
//!
//! - **Property descriptors**: data vs accessor, configurable/enumerable/writable
//! - **Partial descriptors**: the optional-field form carried by `defineProperty`
//! - **Ordinary storage**: ValidateAndApplyPropertyDescriptor (§9.1.6.3),
//!   including the array exotic `length` rules (§9.4.2)
//! - **Symbol keys**: property keys that are either strings or symbols
//!
//! `BTreeMap` for deterministic ordering.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::object::{JsObject, ObjectClass};

static NEXT_SYMBOL_ID: AtomicU32 = AtomicU32::new(1);
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Name of the array exotic `length` property.
pub const LENGTH: &str = "length";

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Process-unique object identity. Never reused, so it is safe as a key in
/// tables that outlive the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl ObjectId {
    pub(crate) fn fresh() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj-{}", self.0)
    }
}

/// Unique symbol identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    /// Allocate a symbol distinct from every other symbol in the process.
    pub fn fresh() -> Self {
        Self(NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

// ---------------------------------------------------------------------------
// PropertyKey: string or symbol
// ---------------------------------------------------------------------------

/// A property key: either a string or a symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropertyKey {
    /// String key.
    String(String),
    /// Symbol key.
    Symbol(SymbolId),
}

impl PropertyKey {
    /// Key for an array index.
    pub fn index(index: u32) -> Self {
        Self::String(index.to_string())
    }

    /// The `length` key.
    pub fn length() -> Self {
        Self::String(LENGTH.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Symbol(_) => None,
        }
    }

    /// Is this the string key `name`?
    pub fn is(&self, name: &str) -> bool {
        self.as_str() == Some(name)
    }

    /// Is this a string key starting with `prefix`?
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.as_str().is_some_and(|s| s.starts_with(prefix))
    }

    /// Canonical array index (§6.1.7): a decimal string without leading
    /// zeros whose value is below 2^32 - 1.
    pub fn array_index(&self) -> Option<u32> {
        let s = self.as_str()?;
        let n: u32 = s.parse().ok()?;
        if n == u32::MAX || n.to_string() != s {
            return None;
        }
        Some(n)
    }

    /// The key as a value (string or symbol).
    pub fn to_value(&self) -> Value {
        match self {
            Self::String(s) => Value::Str(s.clone()),
            Self::Symbol(id) => Value::Symbol(*id),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Symbol(id) => write!(f, "Symbol({})", id.0),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<SymbolId> for PropertyKey {
    fn from(id: SymbolId) -> Self {
        Self::Symbol(id)
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// Runtime value. Objects are shared handles compared by identity.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Symbol(SymbolId),
    Object(JsObject),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn as_object(&self) -> Option<&JsObject> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        self.as_object().is_some_and(JsObject::is_callable)
    }

    /// ToBoolean (§7.1.2).
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
            Self::Symbol(_) | Self::Object(_) => true,
        }
    }

    /// `typeof` result.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "object",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Object(obj) if obj.is_callable() => "function",
            Self::Object(_) => "object",
        }
    }

    /// Strict equality (`===`, §7.2.15): NaN is unequal to itself, `+0 === -0`.
    pub fn strict_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            _ => self.same_value(other),
        }
    }

    /// SameValue comparison (§7.2.10).
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                a == b && a.is_sign_negative() == b.is_sign_negative()
            }
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Symbol(id) => write!(f, "Symbol({})", id.0),
            Self::Object(obj) => write!(f, "[object#{}]", obj.id().0),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<JsObject> for Value {
    fn from(obj: JsObject) -> Self {
        Self::Object(obj)
    }
}

impl From<&JsObject> for Value {
    fn from(obj: &JsObject) -> Self {
        Self::Object(obj.clone())
    }
}

// ---------------------------------------------------------------------------
// PropertyDescriptor
// ---------------------------------------------------------------------------

/// Complete property descriptor (§6.2.5).
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDescriptor {
    /// Data descriptor: has `value` and `writable`.
    Data {
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    /// Accessor descriptor: has `get` and/or `set` function objects.
    Accessor {
        get: Option<JsObject>,
        set: Option<JsObject>,
        enumerable: bool,
        configurable: bool,
    },
}

impl PropertyDescriptor {
    /// Create a default data descriptor (writable, enumerable, configurable).
    pub fn data(value: Value) -> Self {
        Self::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Create a non-writable, non-enumerable, non-configurable data descriptor.
    pub fn data_frozen(value: Value) -> Self {
        Self::Data {
            value,
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }

    /// Enumerable, configurable accessor.
    pub fn accessor(get: Option<JsObject>, set: Option<JsObject>) -> Self {
        Self::Accessor {
            get,
            set,
            enumerable: true,
            configurable: true,
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => *configurable,
        }
    }

    pub fn is_enumerable(&self) -> bool {
        match self {
            Self::Data { enumerable, .. } | Self::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self, Self::Accessor { .. })
    }

    /// Get the value if this is a data descriptor.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Data { value, .. } => Some(value),
            Self::Accessor { .. } => None,
        }
    }

    /// Is this a data descriptor with writable=true?
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Data { writable, .. } => *writable,
            Self::Accessor { .. } => false,
        }
    }

    pub fn getter(&self) -> Option<&JsObject> {
        match self {
            Self::Accessor { get, .. } => get.as_ref(),
            Self::Data { .. } => None,
        }
    }

    pub fn setter(&self) -> Option<&JsObject> {
        match self {
            Self::Accessor { set, .. } => set.as_ref(),
            Self::Data { .. } => None,
        }
    }

    /// Make this descriptor non-configurable.
    pub fn set_non_configurable(&mut self) {
        match self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => {
                *configurable = false;
            }
        }
    }

    /// Make this data descriptor non-writable (no-op for accessors).
    pub fn set_non_writable(&mut self) {
        if let Self::Data { writable, .. } = self {
            *writable = false;
        }
    }

    /// Make this descriptor non-enumerable.
    pub fn set_non_enumerable(&mut self) {
        match self {
            Self::Data { enumerable, .. } | Self::Accessor { enumerable, .. } => {
                *enumerable = false;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PartialDescriptor: the defineProperty request form
// ---------------------------------------------------------------------------

/// Property descriptor with every field optional, as passed to
/// `[[DefineOwnProperty]]`. `Object.freeze` for example sends
/// `{ configurable: false, writable: false }` with no value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialDescriptor {
    pub value: Option<Value>,
    pub writable: Option<bool>,
    pub get: Option<Option<JsObject>>,
    pub set: Option<Option<JsObject>>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PartialDescriptor {
    /// `{ value }` only.
    pub fn with_value(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = Some(writable);
        self
    }

    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = Some(enumerable);
        self
    }

    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = Some(configurable);
        self
    }

    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_data(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    pub fn is_generic(&self) -> bool {
        !self.is_accessor() && !self.is_data()
    }

    /// CompletePropertyDescriptor (§6.2.5.6): absent fields take defaults.
    pub fn complete(self) -> PropertyDescriptor {
        let enumerable = self.enumerable.unwrap_or(false);
        let configurable = self.configurable.unwrap_or(false);
        if self.is_accessor() {
            PropertyDescriptor::Accessor {
                get: self.get.flatten(),
                set: self.set.flatten(),
                enumerable,
                configurable,
            }
        } else {
            PropertyDescriptor::Data {
                value: self.value.unwrap_or_default(),
                writable: self.writable.unwrap_or(false),
                enumerable,
                configurable,
            }
        }
    }

    /// Apply the present fields on top of `current`. A data request on an
    /// accessor (or the reverse) converts the property, keeping only
    /// `enumerable` and `configurable`.
    pub fn merged_over(self, current: &PropertyDescriptor) -> PropertyDescriptor {
        let enumerable = self.enumerable.unwrap_or(current.is_enumerable());
        let configurable = self.configurable.unwrap_or(current.is_configurable());
        match current {
            PropertyDescriptor::Data {
                value, writable, ..
            } if !self.is_accessor() => PropertyDescriptor::Data {
                value: self.value.unwrap_or_else(|| value.clone()),
                writable: self.writable.unwrap_or(*writable),
                enumerable,
                configurable,
            },
            PropertyDescriptor::Accessor { get, set, .. } if !self.is_data() => {
                PropertyDescriptor::Accessor {
                    get: self.get.unwrap_or_else(|| get.clone()),
                    set: self.set.unwrap_or_else(|| set.clone()),
                    enumerable,
                    configurable,
                }
            }
            PropertyDescriptor::Data { .. } => PropertyDescriptor::Accessor {
                get: self.get.flatten(),
                set: self.set.flatten(),
                enumerable,
                configurable,
            },
            PropertyDescriptor::Accessor { .. } => PropertyDescriptor::Data {
                value: self.value.unwrap_or_default(),
                writable: self.writable.unwrap_or(false),
                enumerable,
                configurable,
            },
        }
    }
}

impl From<PropertyDescriptor> for PartialDescriptor {
    fn from(desc: PropertyDescriptor) -> Self {
        match desc {
            PropertyDescriptor::Data {
                value,
                writable,
                enumerable,
                configurable,
            } => Self {
                value: Some(value),
                writable: Some(writable),
                get: None,
                set: None,
                enumerable: Some(enumerable),
                configurable: Some(configurable),
            },
            PropertyDescriptor::Accessor {
                get,
                set,
                enumerable,
                configurable,
            } => Self {
                value: None,
                writable: None,
                get: Some(get),
                set: Some(set),
                enumerable: Some(enumerable),
                configurable: Some(configurable),
            },
        }
    }
}

/// IsCompatiblePropertyDescriptor (§9.1.6.2): would applying `desc` over
/// `current` be accepted?
pub fn is_compatible_descriptor(
    extensible: bool,
    desc: &PartialDescriptor,
    current: Option<&PropertyDescriptor>,
) -> bool {
    let Some(current) = current else {
        return extensible;
    };
    if current.is_configurable() {
        return true;
    }
    if desc.configurable == Some(true) {
        return false;
    }
    if let Some(enumerable) = desc.enumerable
        && enumerable != current.is_enumerable()
    {
        return false;
    }
    if desc.is_generic() {
        return true;
    }
    if desc.is_accessor() != current.is_accessor() {
        return false;
    }
    match current {
        PropertyDescriptor::Data {
            value,
            writable: false,
            ..
        } => {
            if desc.writable == Some(true) {
                return false;
            }
            if let Some(new_value) = &desc.value
                && !new_value.same_value(value)
            {
                return false;
            }
            true
        }
        PropertyDescriptor::Data { .. } => true,
        PropertyDescriptor::Accessor { get, set, .. } => {
            if let Some(new_get) = &desc.get
                && new_get != get
            {
                return false;
            }
            if let Some(new_set) = &desc.set
                && new_set != set
            {
                return false;
            }
            true
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectError
// ---------------------------------------------------------------------------

/// Errors from object model operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ObjectError {
    /// TypeError per ES2020.
    #[error("TypeError: {0}")]
    TypeError(String),
    /// RangeError per ES2020 (invalid array length).
    #[error("RangeError: {0}")]
    RangeError(String),
    /// Prototype chain cycle detected.
    #[error("TypeError: prototype chain cycle detected")]
    PrototypeCycleDetected,
    /// Maximum prototype chain depth exceeded.
    #[error("TypeError: prototype chain depth {depth} exceeds max {max}")]
    PrototypeChainTooDeep { depth: u32, max: u32 },
    /// Raised by a host function or hook.
    #[error("uncaught: {0}")]
    Thrown(String),
}

impl ObjectError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError(message.into())
    }
}

// ---------------------------------------------------------------------------
// OrdinaryObject: property storage and internal slots
// ---------------------------------------------------------------------------

/// Internal slots of an ordinary (non-proxy) object.
#[derive(Debug, Clone)]
pub struct OrdinaryObject {
    /// `[[Prototype]]` internal slot (None means end of chain).
    pub prototype: Option<JsObject>,
    /// `[[Extensible]]` internal slot.
    pub extensible: bool,
    /// Own properties with descriptors.
    pub properties: BTreeMap<PropertyKey, PropertyDescriptor>,
    /// Intrinsic class: plain, array, function, or an opaque exotic.
    pub class: ObjectClass,
}

impl OrdinaryObject {
    pub fn new(prototype: Option<JsObject>, class: ObjectClass) -> Self {
        let mut properties = BTreeMap::new();
        if matches!(class, ObjectClass::Array) {
            properties.insert(
                PropertyKey::length(),
                PropertyDescriptor::Data {
                    value: Value::Number(0.0),
                    writable: true,
                    enumerable: false,
                    configurable: false,
                },
            );
        }
        Self {
            prototype,
            extensible: true,
            properties,
            class,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.class, ObjectClass::Array)
    }

    // -- [[GetOwnProperty]] (§9.1.5) ---------------------------------------

    pub fn get_own_property(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.properties.contains_key(key)
    }

    // -- [[DefineOwnProperty]] (§9.1.6, §9.4.2.1) ---------------------------

    /// Define or update a property. `Ok(false)` means the request was
    /// refused; `Err` is reserved for RangeError on an invalid array length.
    pub fn define_own_property(
        &mut self,
        key: PropertyKey,
        desc: PartialDescriptor,
    ) -> Result<bool, ObjectError> {
        if self.is_array() {
            if key.is(LENGTH) {
                return self.define_array_length(desc);
            }
            if let Some(index) = key.array_index() {
                return Ok(self.define_array_index(index, key, desc));
            }
        }
        Ok(self.apply_descriptor(key, desc))
    }

    fn apply_descriptor(&mut self, key: PropertyKey, desc: PartialDescriptor) -> bool {
        let current = self.properties.get(&key);
        if !is_compatible_descriptor(self.extensible, &desc, current) {
            return false;
        }
        let next = match current {
            Some(current) => desc.merged_over(current),
            None => desc.complete(),
        };
        self.properties.insert(key, next);
        true
    }

    /// Current array `length` (0 for non-arrays).
    pub fn array_length(&self) -> u32 {
        match self.properties.get(&PropertyKey::length()) {
            Some(PropertyDescriptor::Data {
                value: Value::Number(n),
                ..
            }) => *n as u32,
            _ => 0,
        }
    }

    fn length_is_writable(&self) -> bool {
        self.properties
            .get(&PropertyKey::length())
            .is_some_and(PropertyDescriptor::is_writable)
    }

    fn store_length(&mut self, len: u32) {
        if let Some(PropertyDescriptor::Data { value, .. }) =
            self.properties.get_mut(&PropertyKey::length())
        {
            *value = Value::Number(f64::from(len));
        }
    }

    fn freeze_length(&mut self) {
        if let Some(desc) = self.properties.get_mut(&PropertyKey::length()) {
            desc.set_non_writable();
        }
    }

    fn define_array_index(&mut self, index: u32, key: PropertyKey, desc: PartialDescriptor) -> bool {
        let old_len = self.array_length();
        if index >= old_len && !self.length_is_writable() {
            return false;
        }
        if !self.apply_descriptor(key, desc) {
            return false;
        }
        if index >= old_len {
            self.store_length(index + 1);
        }
        true
    }

    /// ArraySetLength (§9.4.2.4).
    fn define_array_length(&mut self, mut desc: PartialDescriptor) -> Result<bool, ObjectError> {
        let Some(value) = desc.value.take() else {
            return Ok(self.apply_descriptor(PropertyKey::length(), desc));
        };
        let new_len = to_array_length(&value)?;
        desc.value = Some(Value::Number(f64::from(new_len)));

        let old_len = self.array_length();
        if new_len >= old_len {
            return Ok(self.apply_descriptor(PropertyKey::length(), desc));
        }
        if !self.length_is_writable() {
            return Ok(false);
        }

        // Non-writable is applied only once the trailing elements are gone.
        let freeze_after = desc.writable == Some(false);
        if freeze_after {
            desc.writable = Some(true);
        }
        if !self.apply_descriptor(PropertyKey::length(), desc) {
            return Ok(false);
        }

        let mut doomed: Vec<(u32, PropertyKey)> = self
            .properties
            .keys()
            .filter_map(|k| {
                k.array_index()
                    .filter(|i| *i >= new_len)
                    .map(|i| (i, k.clone()))
            })
            .collect();
        doomed.sort_by(|a, b| b.0.cmp(&a.0));
        for (index, key) in doomed {
            if !self.delete(&key) {
                self.store_length(index + 1);
                if freeze_after {
                    self.freeze_length();
                }
                return Ok(false);
            }
        }
        if freeze_after {
            self.freeze_length();
        }
        Ok(true)
    }

    // -- [[Delete]] (§9.1.10) -----------------------------------------------

    /// Delete a property. Returns `false` if non-configurable.
    pub fn delete(&mut self, key: &PropertyKey) -> bool {
        match self.properties.get(key) {
            Some(desc) if !desc.is_configurable() => false,
            Some(_) => {
                self.properties.remove(key);
                true
            }
            // Property doesn't exist: vacuously true.
            None => true,
        }
    }

    // -- [[OwnPropertyKeys]] (§9.1.11) -------------------------------------

    /// Own keys in ES2020 order: integer indices (sorted numerically), then
    /// string keys, then symbol keys.
    pub fn own_property_keys(&self) -> Vec<PropertyKey> {
        let mut int_keys: Vec<(u32, PropertyKey)> = Vec::new();
        let mut str_keys: Vec<PropertyKey> = Vec::new();
        let mut sym_keys: Vec<PropertyKey> = Vec::new();

        for key in self.properties.keys() {
            match key {
                PropertyKey::String(_) => match key.array_index() {
                    Some(n) => int_keys.push((n, key.clone())),
                    None => str_keys.push(key.clone()),
                },
                PropertyKey::Symbol(_) => sym_keys.push(key.clone()),
            }
        }

        int_keys.sort_by_key(|(n, _)| *n);
        let mut result: Vec<PropertyKey> = int_keys.into_iter().map(|(_, k)| k).collect();
        result.extend(str_keys);
        result.extend(sym_keys);
        result
    }

    // -- [[PreventExtensions]] (§9.1.4) ------------------------------------

    pub fn prevent_extensions(&mut self) {
        self.extensible = false;
    }
}

fn to_array_length(value: &Value) -> Result<u32, ObjectError> {
    match value {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX) => {
            Ok(*n as u32)
        }
        other => Err(ObjectError::RangeError(format!(
            "invalid array length: {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
