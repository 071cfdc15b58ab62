//! Computed cell - a cached derivation with an optional setter.
//!
//! The cache and its invalidation belong to `spark-signals`: the getter runs
//! inside a `derived`, so every reactive field it reads becomes a dependency.
//! This module only adds the evaluation scope (the object the getter is
//! evaluated against), structural comparison and the setter.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use spark_signals::{derived, signal, Derived, Signal};

use crate::error::{ObjectError, Result};
use crate::object::{next_unique_id, Object, WeakObject};
use crate::types::Value;

/// Getter evaluated against the cell's scope.
pub type Getter = Rc<dyn Fn(&Object) -> Value>;

/// Setter called with the cell's scope and the assigned value.
pub type Setter = Rc<dyn Fn(&Object, Value) -> Result<()>>;

/// Construction options for a [`ComputedValue`].
#[derive(Clone)]
pub struct ComputedOptions {
    pub get: Getter,
    pub set: Option<Setter>,
    /// Suppress propagation when the new result is structurally equal to the
    /// previous one.
    pub structural: bool,
    pub name: Option<String>,
}

impl ComputedOptions {
    pub fn new(get: impl Fn(&Object) -> Value + 'static) -> Self {
        Self {
            get: Rc::new(get),
            set: None,
            structural: false,
            name: None,
        }
    }

    pub fn with_setter(mut self, set: impl Fn(&Object, Value) -> Result<()> + 'static) -> Self {
        self.set = Some(Rc::new(set));
        self
    }

    pub fn structural(mut self) -> Self {
        self.structural = true;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Debug for ComputedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedOptions")
            .field("has_setter", &self.set.is_some())
            .field("structural", &self.structural)
            .field("name", &self.name)
            .finish()
    }
}

// =============================================================================
// Evaluation state shared with the derived
// =============================================================================

struct ComputedState {
    getter: Getter,
    structural: bool,
    scope: RefCell<Option<WeakObject>>,
    scope_revision: Cell<u64>,
    // Re-evaluates the derived when the scope is rebound.
    scope_tracker: Signal<u64>,
    last: RefCell<Option<Value>>,
}

impl ComputedState {
    fn evaluate(&self) -> Value {
        let _ = self.scope_tracker.get();
        let scope = self.scope.borrow().as_ref().and_then(WeakObject::upgrade);
        let Some(scope) = scope else {
            return Value::Null;
        };

        let next = (self.getter)(&scope);
        if !self.structural {
            return next;
        }

        let mut last = self.last.borrow_mut();
        if let Some(previous) = last.as_ref() {
            if previous.structural_eq(&next) {
                return previous.clone();
            }
        }
        *last = Some(next.clone());
        next
    }
}

// =============================================================================
// ComputedValue
// =============================================================================

pub struct ComputedValue {
    name: RefCell<String>,
    state: Rc<ComputedState>,
    derived: Derived<Value>,
    setter: Option<Setter>,
    running_setter: Cell<bool>,
}

impl ComputedValue {
    pub fn new(options: ComputedOptions) -> Self {
        let ComputedOptions {
            get,
            set,
            structural,
            name,
        } = options;
        let name = name.unwrap_or_else(|| format!("ComputedValue@{}", next_unique_id()));

        let state = Rc::new(ComputedState {
            getter: get,
            structural,
            scope: RefCell::new(None),
            scope_revision: Cell::new(0),
            scope_tracker: signal(0),
            last: RefCell::new(None),
        });

        let eval_state = Rc::clone(&state);
        let compute = move || eval_state.evaluate();

        Self {
            name: RefCell::new(name),
            state,
            derived: derived(compute),
            setter: set,
            running_setter: Cell::new(false),
        }
    }

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.borrow_mut() = name.into();
    }

    /// Object the getter is evaluated against, if still alive.
    pub fn scope(&self) -> Option<Object> {
        self.state.scope.borrow().as_ref().and_then(WeakObject::upgrade)
    }

    /// Rebind the evaluation scope. The next read re-evaluates.
    pub fn set_scope(&self, scope: &Object) {
        *self.state.scope.borrow_mut() = Some(scope.downgrade());
        let next = self.state.scope_revision.get() + 1;
        self.state.scope_revision.set(next);
        self.state.scope_tracker.set(next);
    }

    pub fn is_structural(&self) -> bool {
        self.state.structural
    }

    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }

    /// Current (cached or freshly derived) value. Tracked.
    pub fn get(&self) -> Value {
        self.derived.get()
    }

    /// Assign through the setter.
    ///
    /// Fails if there is no setter, no live scope, or the setter re-enters
    /// itself.
    pub fn set(&self, value: Value) -> Result<()> {
        let Some(setter) = self.setter.clone() else {
            return Err(ObjectError::invariant(format!(
                "cannot assign to computed value '{}': it has no setter",
                self.name()
            )));
        };
        if self.running_setter.get() {
            return Err(ObjectError::invariant(format!(
                "cycle detected in setter of computed value '{}'",
                self.name()
            )));
        }
        let scope = self.scope().ok_or_else(|| {
            ObjectError::invariant(format!("computed value '{}' has no scope", self.name()))
        })?;

        self.running_setter.set(true);
        let result = setter(&scope, value);
        self.running_setter.set(false);
        result
    }
}

impl fmt::Debug for ComputedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedValue")
            .field("name", &self.name.borrow())
            .field("structural", &self.state.structural)
            .field("has_setter", &self.setter.is_some())
            .field("scoped", &self.scope().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Coercion, ObservableValue};

    #[test]
    fn test_unscoped_evaluates_to_null() {
        let computed = ComputedValue::new(ComputedOptions::new(|_| Value::Int(1)));
        assert_eq!(computed.get(), Value::Null);
        assert!(computed.name().starts_with("ComputedValue@"));
    }

    #[test]
    fn test_binding_scope_reevaluates() {
        let obj = Object::with_fields([("x", Value::Int(4))]);
        let computed = ComputedValue::new(ComputedOptions::new(|o| {
            Value::Int(o.get("x").and_then(|v| v.as_int()).unwrap_or(0) * 2)
        }));

        assert_eq!(computed.get(), Value::Null);
        computed.set_scope(&obj);
        assert_eq!(computed.get(), Value::Int(8));
        assert!(computed.scope().is_some_and(|s| s.ptr_eq(&obj)));
    }

    #[test]
    fn test_follows_value_cell_dependencies() {
        let source = Rc::new(ObservableValue::new(Value::Int(1), Coercion::Ref, "src").unwrap());
        let source_clone = source.clone();
        let computed = ComputedValue::new(ComputedOptions::new(move |_| {
            Value::Int(source_clone.get().as_int().unwrap_or(0) + 100)
        }));
        computed.set_scope(&Object::new());
        // Scope was dropped right away: evaluation yields Null.
        assert_eq!(computed.get(), Value::Null);

        let scope = Object::new();
        computed.set_scope(&scope);
        assert_eq!(computed.get(), Value::Int(101));
        source.set(Value::Int(2)).unwrap();
        assert_eq!(computed.get(), Value::Int(102));
    }

    #[test]
    fn test_structural_keeps_previous_result() {
        let source = Rc::new(ObservableValue::new(Value::Int(1), Coercion::Ref, "src").unwrap());
        let make = |source: Rc<ObservableValue>, structural: bool| {
            let options = ComputedOptions::new(move |_| {
                let parity = source.get().as_int().unwrap_or(0) % 2;
                Value::Object(Object::with_fields([("parity", Value::Int(parity))]))
            });
            ComputedValue::new(if structural { options.structural() } else { options })
        };
        let scope = Object::new();
        let structural = make(source.clone(), true);
        let plain = make(source.clone(), false);
        structural.set_scope(&scope);
        plain.set_scope(&scope);

        let first = structural.get();
        let first_plain = plain.get();
        source.set(Value::Int(3)).unwrap();

        // Same content: the structural cell hands back the previous object.
        assert_eq!(structural.get(), first);
        assert_ne!(plain.get(), first_plain);

        source.set(Value::Int(4)).unwrap();
        assert_ne!(structural.get(), first);
    }

    #[test]
    fn test_set_without_setter_fails() {
        let computed = ComputedValue::new(ComputedOptions::new(|_| Value::Null));
        let scope = Object::new();
        computed.set_scope(&scope);
        assert!(matches!(
            computed.set(Value::Int(1)),
            Err(ObjectError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_setter_receives_scope() {
        let obj = Object::new();
        let computed = ComputedValue::new(
            ComputedOptions::new(|o| o.get("raw").unwrap_or_default())
                .with_setter(|o, v| o.set("raw", v)),
        );
        computed.set_scope(&obj);
        computed.set(Value::Int(9)).unwrap();
        assert_eq!(obj.get("raw"), Some(Value::Int(9)));
    }

    #[test]
    fn test_reentrant_setter_is_rejected() {
        let obj = Object::new();
        let slot: Rc<RefCell<Option<Rc<ComputedValue>>>> = Rc::new(RefCell::new(None));
        let slot_clone = slot.clone();
        let computed = Rc::new(ComputedValue::new(
            ComputedOptions::new(|_| Value::Null).with_setter(move |_, v| {
                let inner = slot_clone.borrow().clone();
                match inner {
                    Some(cell) => cell.set(v),
                    None => Ok(()),
                }
            }),
        ));
        computed.set_scope(&obj);
        *slot.borrow_mut() = Some(computed.clone());

        assert!(matches!(
            computed.set(Value::Int(1)),
            Err(ObjectError::InvariantViolation { .. })
        ));
        // The guard is released after the failed call.
        *slot.borrow_mut() = None;
        assert!(computed.set(Value::Int(1)).is_ok());
    }
}
