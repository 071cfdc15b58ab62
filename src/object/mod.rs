//! Host Objects - the ordinary mutable records that get made reactive.
//!
//! An [`Object`] is a cheap-to-clone shared handle to a property table. Each
//! property is either a plain data slot or an accessor slot whose behavior is
//! resolved against the object's administration record at call time. Upgrading
//! a field from data to accessor never changes the handle's identity, so every
//! existing handle sees the reactive field.
//!
//! # Integrity
//!
//! Objects move one way through `Extensible → NonExtensible → Sealed → Frozen`:
//! - non-extensible objects reject new properties and hidden state
//! - sealed objects also mark every property non-configurable
//! - frozen objects also mark every data property non-writable
//!
//! # Hidden state
//!
//! The administration record lives in a hidden slot that is set at most once
//! and is not part of the property table, so it is never enumerable, writable
//! or removable.

pub mod property;
pub mod registry;

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::admin::accessor::{computed_accessor, observable_accessor, Accessor};
use crate::admin::{Administration, CellRef};
use crate::error::{ObjectError, Result};
use crate::types::Value;

pub use property::PropertyFlags;
pub use registry::{live_administrations, next_unique_id, ObjectId};

use property::{Property, PropertyTable, Slot};

/// Deferred field setup, run on first access.
pub type Initializer = Box<dyn FnOnce(&Object)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    /// Plain structural record.
    Plain,
    /// Class-like instance.
    Instance { type_name: Rc<str> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Integrity {
    Extensible,
    NonExtensible,
    Sealed,
    Frozen,
}

struct ObjectInner {
    id: ObjectId,
    kind: ObjectKind,
    integrity: Cell<Integrity>,
    properties: RefCell<PropertyTable>,
    administration: OnceCell<Rc<Administration>>,
    initializers: RefCell<Vec<Initializer>>,
}

/// Shared handle to a host object.
#[derive(Clone)]
pub struct Object {
    inner: Rc<ObjectInner>,
}

/// Non-owning handle to a host object.
#[derive(Clone)]
pub struct WeakObject {
    inner: Weak<ObjectInner>,
}

impl WeakObject {
    pub fn upgrade(&self) -> Option<Object> {
        self.inner.upgrade().map(|inner| Object { inner })
    }

    pub fn points_to(&self, object: &Object) -> bool {
        Weak::ptr_eq(&self.inner, &Rc::downgrade(&object.inner))
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObject")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

// =============================================================================
// Construction & identity
// =============================================================================

impl Object {
    fn with_kind(kind: ObjectKind) -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                id: registry::next_object_id(),
                kind,
                integrity: Cell::new(Integrity::Extensible),
                properties: RefCell::new(PropertyTable::default()),
                administration: OnceCell::new(),
                initializers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Create an empty plain object.
    pub fn new() -> Self {
        Self::with_kind(ObjectKind::Plain)
    }

    /// Create an empty class-like instance of `type_name`.
    pub fn instance(type_name: &str) -> Self {
        Self::with_kind(ObjectKind::Instance {
            type_name: Rc::from(type_name),
        })
    }

    /// Create a plain object with data properties.
    pub fn with_fields<K, I>(fields: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let object = Self::new();
        {
            let mut properties = object.inner.properties.borrow_mut();
            for (name, value) in fields {
                properties.insert(name.as_ref(), Property::data(value, PropertyFlags::DEFAULT));
            }
        }
        object
    }

    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.inner.kind
    }

    /// Is this a plain structural record (not a class-like instance).
    pub fn is_plain(&self) -> bool {
        matches!(self.inner.kind, ObjectKind::Plain)
    }

    pub fn type_name(&self) -> Option<&str> {
        match &self.inner.kind {
            ObjectKind::Plain => None,
            ObjectKind::Instance { type_name } => Some(type_name),
        }
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakObject {
        WeakObject {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Human readable name: the administration label when reactive.
    pub fn describe(&self) -> String {
        if let Some(admin) = self.administration() {
            return admin.label().to_string();
        }
        match &self.inner.kind {
            ObjectKind::Plain => format!("Object#{}", self.inner.id),
            ObjectKind::Instance { type_name } => format!("{}#{}", type_name, self.inner.id),
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Object {}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("integrity", &self.inner.integrity.get())
            .field("reactive", &self.inner.administration.get().is_some())
            .finish()
    }
}

// =============================================================================
// Property access
// =============================================================================

impl Object {
    /// Read a property. Reactive fields are tracked by any running derived or
    /// effect.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.initialize();
        let slot = self.slot(name);
        match slot {
            Some(Slot::Data(value)) => Some(value),
            Some(Slot::Accessor(accessor)) => accessor.get(self),
            None => self.administration()?.read(name),
        }
    }

    /// Read a property without tracking.
    pub fn peek(&self, name: &str) -> Option<Value> {
        self.initialize();
        let slot = self.slot(name);
        match slot {
            Some(Slot::Data(value)) => Some(value),
            Some(Slot::Accessor(accessor)) => self.administration()?.peek(accessor.name()),
            None => self.administration()?.peek(name),
        }
    }

    /// Write a property.
    ///
    /// Data slots are written directly (if writable). Observable accessors go
    /// through the mutation router; computed accessors call the cell's setter.
    /// Unknown names become new plain data properties, if the object is
    /// extensible.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.initialize();
        let value = value.into();
        let current = self
            .inner
            .properties
            .borrow()
            .get(name)
            .map(|p| (p.slot.clone(), p.flags));

        match current {
            Some((Slot::Data(_), flags)) => {
                if !flags.contains(PropertyFlags::WRITABLE) {
                    return Err(ObjectError::ReadOnlyProperty {
                        object: self.describe(),
                        property: name.to_string(),
                    });
                }
                if let Some(property) = self.inner.properties.borrow_mut().get_mut(name) {
                    property.slot = Slot::Data(value);
                }
                Ok(())
            }
            Some((Slot::Accessor(accessor), _)) => accessor.set(self, value),
            None => {
                if let Some(accessor) = self.inherited_accessor(name) {
                    return accessor.set(self, value);
                }
                self.assert_can_define(name)?;
                self.inner
                    .properties
                    .borrow_mut()
                    .insert(name, Property::data(value, PropertyFlags::DEFAULT));
                Ok(())
            }
        }
    }

    /// Define (or redefine) a plain data property with explicit flags.
    pub fn define_data_property(
        &self,
        name: &str,
        value: impl Into<Value>,
        flags: PropertyFlags,
    ) -> Result<()> {
        let existing = self
            .inner
            .properties
            .borrow()
            .get(name)
            .map(|p| (p.is_accessor(), p.flags));

        match existing {
            Some((true, _)) => {
                return Err(ObjectError::RedefinitionConflict {
                    object: self.describe(),
                    property: name.to_string(),
                });
            }
            Some((false, current)) if !current.contains(PropertyFlags::CONFIGURABLE) => {
                return Err(ObjectError::PropertyNotConfigurable {
                    object: self.describe(),
                    property: name.to_string(),
                });
            }
            Some(_) => {}
            None => self.assert_can_define(name)?,
        }

        self.inner
            .properties
            .borrow_mut()
            .insert(name, Property::data(value.into(), flags));
        Ok(())
    }

    /// Own property (data or accessor) exists.
    pub fn has_own(&self, name: &str) -> bool {
        self.inner.properties.borrow().contains(name)
    }

    /// Flags of an own property.
    pub fn property_flags(&self, name: &str) -> Option<PropertyFlags> {
        self.inner.properties.borrow().get(name).map(|p| p.flags)
    }

    /// Is the own property an installed accessor.
    pub fn is_accessor(&self, name: &str) -> bool {
        self.inner
            .properties
            .borrow()
            .get(name)
            .is_some_and(Property::is_accessor)
    }

    /// Enumerable own property names, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.initialize();
        self.inner
            .properties
            .borrow()
            .iter()
            .filter(|(_, p)| p.flags.contains(PropertyFlags::ENUMERABLE))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// All own property names, enumerable or not.
    pub fn own_keys(&self) -> Vec<String> {
        self.initialize();
        self.inner
            .properties
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Deep plain copy of the enumerable fields (untracked reads).
    ///
    /// Nested objects become records. A reference back to an object that is
    /// already being copied becomes `Null`.
    pub fn snapshot(&self) -> Value {
        let mut in_progress = HashSet::new();
        snapshot_object(self, &mut in_progress)
    }

    fn slot(&self, name: &str) -> Option<Slot> {
        self.inner.properties.borrow().get(name).map(|p| p.slot.clone())
    }

    /// Accessor for a cell bound without an own accessor slot.
    fn inherited_accessor(&self, name: &str) -> Option<Rc<Accessor>> {
        let admin = self.administration()?;
        match admin.cell(name)? {
            CellRef::Observable(_) => Some(observable_accessor(name)),
            CellRef::Computed(_) => Some(computed_accessor(name)),
        }
    }
}

fn snapshot_object(object: &Object, in_progress: &mut HashSet<ObjectId>) -> Value {
    if !in_progress.insert(object.id()) {
        return Value::Null;
    }
    let mut record = BTreeMap::new();
    for name in object.keys() {
        if let Some(value) = object.peek(&name) {
            record.insert(name, snapshot_value(value, in_progress));
        }
    }
    in_progress.remove(&object.id());
    Value::Record(record)
}

fn snapshot_value(value: Value, in_progress: &mut HashSet<ObjectId>) -> Value {
    match value {
        Value::Object(object) => snapshot_object(&object, in_progress),
        Value::List(items) => Value::List(
            items
                .into_iter()
                .map(|item| snapshot_value(item, in_progress))
                .collect(),
        ),
        Value::Record(fields) => Value::Record(
            fields
                .into_iter()
                .map(|(name, item)| (name, snapshot_value(item, in_progress)))
                .collect(),
        ),
        other => other,
    }
}

// =============================================================================
// Integrity
// =============================================================================

impl Object {
    pub fn integrity(&self) -> Integrity {
        self.inner.integrity.get()
    }

    pub fn is_extensible(&self) -> bool {
        self.inner.integrity.get() == Integrity::Extensible
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.integrity.get() == Integrity::Frozen
    }

    pub fn prevent_extensions(&self) {
        self.raise_integrity(Integrity::NonExtensible);
    }

    pub fn seal(&self) {
        for property in self.inner.properties.borrow_mut().values_mut() {
            property.flags.remove(PropertyFlags::CONFIGURABLE);
        }
        self.raise_integrity(Integrity::Sealed);
    }

    pub fn freeze(&self) {
        for property in self.inner.properties.borrow_mut().values_mut() {
            property.flags.remove(PropertyFlags::CONFIGURABLE);
            if !property.is_accessor() {
                property.flags.remove(PropertyFlags::WRITABLE);
            }
        }
        self.raise_integrity(Integrity::Frozen);
    }

    fn raise_integrity(&self, level: Integrity) {
        if level > self.inner.integrity.get() {
            self.inner.integrity.set(level);
        }
    }

    /// Fails with `PropertyNotConfigurable` if an own property `name` exists
    /// and is not configurable. Absent properties pass.
    pub fn assert_configurable(&self, name: &str) -> Result<()> {
        let configurable = self
            .inner
            .properties
            .borrow()
            .get(name)
            .is_none_or(|p| p.flags.contains(PropertyFlags::CONFIGURABLE));
        if configurable {
            Ok(())
        } else {
            Err(ObjectError::PropertyNotConfigurable {
                object: self.describe(),
                property: name.to_string(),
            })
        }
    }

    /// Fails with `NotExtensible` if `name` is absent and cannot be added.
    pub(crate) fn assert_can_define(&self, name: &str) -> Result<()> {
        if self.is_extensible() || self.has_own(name) {
            Ok(())
        } else {
            Err(ObjectError::NotExtensible {
                object: self.describe(),
            })
        }
    }

    /// Replace (or create) the slot `name` with an accessor. Callers check
    /// configurability and extensibility first.
    pub(crate) fn install_accessor(
        &self,
        name: &str,
        accessor: Rc<Accessor>,
        flags: PropertyFlags,
    ) {
        self.inner
            .properties
            .borrow_mut()
            .insert(name, Property::accessor(accessor, flags));
    }
}

// =============================================================================
// Hidden administration slot
// =============================================================================

impl Object {
    /// The administration record, if this object has been made reactive.
    pub fn administration(&self) -> Option<Rc<Administration>> {
        self.inner.administration.get().cloned()
    }

    /// Attach the administration record. Happens at most once.
    pub(crate) fn attach_administration(&self, admin: Rc<Administration>) -> Result<()> {
        if !self.is_extensible() {
            return Err(ObjectError::NotExtensible {
                object: self.describe(),
            });
        }
        self.inner.administration.set(admin).map_err(|admin| {
            ObjectError::invariant(format!(
                "'{}' already carries an administration record",
                admin.label()
            ))
        })
    }

    /// Is this object reactive. Runs pending initializers first.
    pub fn is_reactive(&self) -> bool {
        self.initialize();
        self.inner.administration.get().is_some()
    }
}

// =============================================================================
// Deferred initialization
// =============================================================================

impl Object {
    /// Register field setup to run on first access (read, write, key listing
    /// or reactivity check).
    pub fn defer_initializer(&self, initializer: impl FnOnce(&Object) + 'static) {
        self.inner
            .initializers
            .borrow_mut()
            .push(Box::new(initializer));
    }

    pub fn has_pending_initializers(&self) -> bool {
        !self.inner.initializers.borrow().is_empty()
    }

    /// Run pending initializers. Initializers may access the object; they see
    /// it as already initialized.
    pub fn initialize(&self) {
        loop {
            let pending = std::mem::take(&mut *self.inner.initializers.borrow_mut());
            if pending.is_empty() {
                return;
            }
            for initializer in pending {
                initializer(self);
            }
        }
    }
}
