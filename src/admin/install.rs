//! Property Installer - turns descriptors into live accessor properties.
//!
//! | descriptor  | unbound name                        | bound name                         |
//! |-------------|-------------------------------------|------------------------------------|
//! | `Value`     | observable cell, default coercion   | write through the router (value)   |
//! | `Modified`  | observable cell, embedded coercion  | write through the router (value)   |
//! | `Accessor`  | computed cell from the get/set pair | `RedefinitionConflict`             |
//! | `Computed`  | computed property reusing the cell  | `RedefinitionConflict`             |
//!
//! A name bound to a computed cell always conflicts.

use std::fmt;
use std::rc::Rc;

use super::accessor::{computed_accessor, observable_accessor};
use super::{Administration, CellRef};
use crate::cell::{Coercion, ComputedOptions, ComputedValue, Getter, ObservableValue, Setter};
use crate::error::{ObjectError, Result};
use crate::object::{Object, PropertyFlags};
use crate::pipeline::ObjectWillChange;
use crate::types::Value;

/// Initial value paired with the coercion of the cell that will hold it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifiedValue {
    pub value: Value,
    pub coercion: Coercion,
}

impl ModifiedValue {
    pub fn new(value: impl Into<Value>, coercion: Coercion) -> Self {
        Self {
            value: value.into(),
            coercion,
        }
    }

    pub fn deep(value: impl Into<Value>) -> Self {
        Self::new(value, Coercion::Deep)
    }

    pub fn shallow(value: impl Into<Value>) -> Self {
        Self::new(value, Coercion::Shallow)
    }

    pub fn reference(value: impl Into<Value>) -> Self {
        Self::new(value, Coercion::Ref)
    }

    pub fn structural(value: impl Into<Value>) -> Self {
        Self::new(value, Coercion::Structural)
    }
}

/// What to install under a property name.
#[derive(Clone)]
pub enum PropertyDescriptor {
    /// Plain data.
    Value(Value),
    /// Plain data with an explicit coercion.
    Modified(ModifiedValue),
    /// A pre-built computed cell.
    Computed(Rc<ComputedValue>),
    /// Getter with optional setter.
    Accessor { get: Getter, set: Option<Setter> },
}

impl PropertyDescriptor {
    pub fn getter(get: impl Fn(&Object) -> Value + 'static) -> Self {
        PropertyDescriptor::Accessor {
            get: Rc::new(get),
            set: None,
        }
    }

    pub fn accessor(
        get: impl Fn(&Object) -> Value + 'static,
        set: impl Fn(&Object, Value) -> Result<()> + 'static,
    ) -> Self {
        PropertyDescriptor::Accessor {
            get: Rc::new(get),
            set: Some(Rc::new(set)),
        }
    }

    /// Is this a plain value (possibly with a coercion).
    pub fn is_plain_value(&self) -> bool {
        matches!(
            self,
            PropertyDescriptor::Value(_) | PropertyDescriptor::Modified(_)
        )
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyDescriptor::Value(v) => f.debug_tuple("Value").field(v).finish(),
            PropertyDescriptor::Modified(m) => f.debug_tuple("Modified").field(m).finish(),
            PropertyDescriptor::Computed(c) => f.debug_tuple("Computed").field(c).finish(),
            PropertyDescriptor::Accessor { set, .. } => f
                .debug_struct("Accessor")
                .field("has_setter", &set.is_some())
                .finish(),
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for PropertyDescriptor {
                fn from(value: $ty) -> Self {
                    PropertyDescriptor::Value(value.into())
                }
            }
        )*
    };
}

impl_from_value!(Value, bool, i32, i64, f64, &str, String, Vec<Value>, Object);

impl From<ModifiedValue> for PropertyDescriptor {
    fn from(value: ModifiedValue) -> Self {
        PropertyDescriptor::Modified(value)
    }
}

impl From<Rc<ComputedValue>> for PropertyDescriptor {
    fn from(cell: Rc<ComputedValue>) -> Self {
        PropertyDescriptor::Computed(cell)
    }
}

// =============================================================================
// Installation
// =============================================================================

impl Administration {
    /// Install (or, for bound value cells, assign) `name` from a descriptor.
    pub fn define_property(
        &self,
        name: &str,
        descriptor: PropertyDescriptor,
        default_coercion: Coercion,
    ) -> Result<()> {
        if let Some(bound) = self.cell(name) {
            return match (bound, descriptor) {
                (CellRef::Observable(_), PropertyDescriptor::Value(value)) => {
                    self.write(name, value)
                }
                (CellRef::Observable(_), PropertyDescriptor::Modified(modified)) => {
                    self.write(name, modified.value)
                }
                _ => Err(self.redefinition(name)),
            };
        }

        match descriptor {
            PropertyDescriptor::Computed(cell) => self.add_existing_computed(name, cell, true),
            PropertyDescriptor::Modified(ModifiedValue { value, coercion }) => {
                self.add_observable_prop(name, value, coercion, true)
            }
            PropertyDescriptor::Accessor { get, set } => {
                let options = ComputedOptions {
                    get,
                    set,
                    structural: false,
                    name: None,
                };
                self.add_computed_prop(name, options, true)
            }
            PropertyDescriptor::Value(value) => {
                self.add_observable_prop(name, value, default_coercion, true)
            }
        }
    }

    /// Install an observable field backed by a new value cell.
    ///
    /// The addition goes through the object guards first: a veto makes the
    /// whole call a silent no-op, a rewrite replaces the initial value.
    pub fn add_observable_prop(
        &self,
        name: &str,
        initial: Value,
        coercion: Coercion,
        as_accessor: bool,
    ) -> Result<()> {
        if self.cell(name).is_some() {
            return Err(self.redefinition(name));
        }
        let owner = self.owner_or_err()?;
        if as_accessor {
            owner.assert_configurable(name)?;
            owner.assert_can_define(name)?;
        }

        let mut initial = initial;
        if self.has_interceptors() {
            match self
                .interceptors()
                .run(ObjectWillChange::add(owner.clone(), name, initial))
            {
                Some(change) => initial = change.new_value,
                None => {
                    tracing::trace!(object = %self.label(), property = name, "addition vetoed");
                    return Ok(());
                }
            }
        }

        let label = format!("{}.{}", self.label(), name);
        let cell = Rc::new(ObservableValue::new(initial, coercion, label)?);
        self.bind(name, CellRef::Observable(Rc::clone(&cell)))?;
        if as_accessor {
            owner.install_accessor(name, observable_accessor(name), PropertyFlags::OBSERVABLE);
        }
        tracing::debug!(object = %self.label(), property = name, ?coercion, "observable installed");

        self.notify_addition(name, cell.value())
    }

    /// Install a computed field built from `options`. Not interceptable.
    pub fn add_computed_prop(
        &self,
        name: &str,
        options: ComputedOptions,
        as_accessor: bool,
    ) -> Result<()> {
        let mut options = options;
        if options.name.is_none() {
            options.name = Some(format!("{}.{}", self.label(), name));
        }
        let cell = Rc::new(ComputedValue::new(options));
        self.install_computed(name, cell, as_accessor)
    }

    /// Install a computed field reusing an existing cell.
    ///
    /// The cell is renamed after this property. Its scope becomes the owner
    /// unless it already points at the owner; a cell scoped to another live
    /// object is rejected.
    pub fn add_existing_computed(
        &self,
        name: &str,
        cell: Rc<ComputedValue>,
        as_accessor: bool,
    ) -> Result<()> {
        if self.cell(name).is_some() {
            return Err(self.redefinition(name));
        }
        if let Some(scope) = cell.scope() {
            let owned_here = self.owner().is_some_and(|owner| owner.ptr_eq(&scope));
            if !owned_here {
                return Err(ObjectError::invariant(format!(
                    "computed value '{}' is already bound to '{}' and cannot be installed on '{}.{}'",
                    cell.name(),
                    scope.describe(),
                    self.label(),
                    name
                )));
            }
        }
        cell.set_name(format!("{}.{}", self.label(), name));
        self.install_computed(name, cell, as_accessor)
    }

    fn install_computed(
        &self,
        name: &str,
        cell: Rc<ComputedValue>,
        as_accessor: bool,
    ) -> Result<()> {
        if self.cell(name).is_some() {
            return Err(self.redefinition(name));
        }
        let owner = self.owner_or_err()?;
        if as_accessor {
            owner.assert_configurable(name)?;
            owner.assert_can_define(name)?;
        }

        let unscoped = cell.scope().is_none();
        if unscoped {
            cell.set_scope(&owner);
        }
        self.bind(name, CellRef::Computed(cell))?;
        if as_accessor {
            owner.install_accessor(name, computed_accessor(name), PropertyFlags::COMPUTED);
        }
        tracing::debug!(object = %self.label(), property = name, "computed installed");
        Ok(())
    }
}
