//! Accessor Generator - one generic accessor per (property name, cell kind).
//!
//! Accessors carry no per-object state. They look up the administration
//! record of whatever object they are applied to, so the same `Rc<Accessor>`
//! is shared by every object that has a reactive field of that name.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{Administration, CellRef};
use crate::error::{ObjectError, Result};
use crate::object::Object;
use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    Observable,
    Computed,
}

#[derive(Debug)]
pub struct Accessor {
    name: Rc<str>,
    kind: AccessorKind,
}

impl Accessor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AccessorKind {
        self.kind
    }

    /// Tracked read through the record of `object`.
    pub fn get(&self, object: &Object) -> Option<Value> {
        object.administration()?.read(&self.name)
    }

    /// Write through the record of `object`.
    ///
    /// Observable fields go through the mutation router. Computed fields call
    /// the cell's setter directly, skipping interception and notification.
    pub fn set(&self, object: &Object, value: Value) -> Result<()> {
        let admin = self.administration(object)?;
        match self.kind {
            AccessorKind::Observable => admin.write(&self.name, value),
            AccessorKind::Computed => match admin.cell(&self.name) {
                Some(CellRef::Computed(cell)) if cell.has_setter() => cell.set(value),
                Some(CellRef::Computed(_)) => Err(ObjectError::ReadOnlyProperty {
                    object: admin.label().to_string(),
                    property: self.name.to_string(),
                }),
                _ => Err(admin.unknown(&self.name)),
            },
        }
    }

    fn administration(&self, object: &Object) -> Result<Rc<Administration>> {
        object.administration().ok_or_else(|| {
            ObjectError::invariant(format!(
                "accessor '{}' applied to non-reactive object '{}'",
                self.name,
                object.describe()
            ))
        })
    }
}

// =============================================================================
// Memo table
// =============================================================================

thread_local! {
    static ACCESSORS: RefCell<HashMap<(AccessorKind, String), Rc<Accessor>>> =
        RefCell::new(HashMap::new());
}

fn memoized(name: &str, kind: AccessorKind) -> Rc<Accessor> {
    ACCESSORS.with(|table| {
        let mut table = table.borrow_mut();
        let accessor = table
            .entry((kind, name.to_string()))
            .or_insert_with(|| {
                Rc::new(Accessor {
                    name: Rc::from(name),
                    kind,
                })
            });
        Rc::clone(accessor)
    })
}

/// Shared accessor for observable fields called `name`.
pub fn observable_accessor(name: &str) -> Rc<Accessor> {
    memoized(name, AccessorKind::Observable)
}

/// Shared accessor for computed fields called `name`.
pub fn computed_accessor(name: &str) -> Rc<Accessor> {
    memoized(name, AccessorKind::Computed)
}

/// Number of memoized accessors on this thread.
pub fn accessor_cache_len() -> usize {
    ACCESSORS.with(|table| table.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::reactivate;
    use crate::cell::{Coercion, ComputedOptions};

    #[test]
    fn test_accessors_are_memoized_per_name_and_kind() {
        let a = observable_accessor("width");
        let b = observable_accessor("width");
        let c = computed_accessor("width");

        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(c.kind(), AccessorKind::Computed);
        assert_eq!(a.name(), "width");
    }

    #[test]
    fn test_same_accessor_serves_many_objects() {
        let before = accessor_cache_len();
        let first = Object::new();
        let second = Object::new();
        for (obj, value) in [(&first, 1), (&second, 2)] {
            reactivate(obj, None)
                .unwrap()
                .add_observable_prop("shared_field", Value::Int(value), Coercion::Deep, true)
                .unwrap();
        }

        assert_eq!(accessor_cache_len(), before + 1);
        assert_eq!(first.get("shared_field"), Some(Value::Int(1)));
        assert_eq!(second.get("shared_field"), Some(Value::Int(2)));
    }

    #[test]
    fn test_computed_without_setter_is_read_only() {
        let obj = Object::new();
        reactivate(&obj, None)
            .unwrap()
            .add_computed_prop("c", ComputedOptions::new(|_| Value::Int(1)), true)
            .unwrap();
        assert!(matches!(
            obj.set("c", 2),
            Err(ObjectError::ReadOnlyProperty { .. })
        ));
    }

    #[test]
    fn test_accessor_on_plain_object() {
        let obj = Object::new();
        let accessor = observable_accessor("x");
        assert_eq!(accessor.get(&obj), None);
        assert!(matches!(
            accessor.set(&obj, Value::Int(1)),
            Err(ObjectError::InvariantViolation { .. })
        ));
    }
}
