//! Value cell - stores a value, applies its coercion on every write and
//! reports reads/writes to the signal graph.
//!
//! The value itself lives in the cell; a `Signal<u64>` revision acts as the
//! tracking token. Reading through [`get`](ObservableValue::get) subscribes the
//! running derived/effect, committing bumps the revision.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use spark_signals::{signal, Signal};

use super::Coercion;
use crate::error::Result;
use crate::pipeline::{
    ChangeGuard, ChangeObserver, Disposer, InterceptorChain, ListenerSet, ValueDidChange,
    ValueWillChange,
};
use crate::types::Value;

pub struct ObservableValue {
    label: String,
    value: RefCell<Value>,
    coercion: Coercion,
    revision: Cell<u64>,
    tracker: Signal<u64>,
    interceptors: InterceptorChain<ValueWillChange>,
    listeners: ListenerSet<ValueDidChange>,
}

impl ObservableValue {
    /// Create a cell seeded with `initial`, passed through `coercion`.
    pub fn new(initial: Value, coercion: Coercion, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let value = coercion.enhance(initial, None, &label)?;
        Ok(Self {
            label,
            value: RefCell::new(value),
            coercion,
            revision: Cell::new(0),
            tracker: signal(0),
            interceptors: InterceptorChain::new(),
            listeners: ListenerSet::new(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn coercion(&self) -> Coercion {
        self.coercion
    }

    /// Tracked read.
    pub fn get(&self) -> Value {
        let _ = self.tracker.get();
        self.value.borrow().clone()
    }

    /// Untracked read of the current value.
    pub fn value(&self) -> Value {
        self.value.borrow().clone()
    }

    /// Number of commits so far.
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    /// Run the cell's own guards and coercion.
    ///
    /// Returns `None` when a guard cancelled or the coerced value equals the
    /// current one. This is the only place a write is judged a no-op.
    pub fn prepare_new_value(&self, candidate: Value) -> Result<Option<Value>> {
        let mut candidate = candidate;
        if self.interceptors.has_entries() {
            match self.interceptors.run(ValueWillChange { new_value: candidate }) {
                Some(change) => candidate = change.new_value,
                None => return Ok(None),
            }
        }

        let current = self.value();
        let next = self.coercion.enhance(candidate, Some(&current), &self.label)?;
        if self.coercion.equals(&current, &next) {
            Ok(None)
        } else {
            Ok(Some(next))
        }
    }

    /// Commit a prepared value, report it to the signal graph and notify the
    /// cell's own listeners.
    pub fn set_new_value(&self, new_value: Value) {
        let old_value = self.value.replace(new_value.clone());
        self.report_changed();
        if self.listeners.has_entries() {
            self.listeners.notify(&ValueDidChange {
                new_value,
                old_value: Some(old_value),
            });
        }
    }

    /// Prepare and commit.
    pub fn set(&self, candidate: Value) -> Result<()> {
        if let Some(next) = self.prepare_new_value(candidate)? {
            self.set_new_value(next);
        }
        Ok(())
    }

    pub fn intercept<F>(&self, guard: F) -> Disposer
    where
        F: Fn(ValueWillChange) -> Option<ValueWillChange> + 'static,
    {
        self.intercept_with(Rc::new(guard))
    }

    pub fn intercept_with(&self, guard: Rc<dyn ChangeGuard<ValueWillChange>>) -> Disposer {
        self.interceptors.add(guard)
    }

    /// Observe commits. With `fire_immediately` the listener is called once
    /// right away with the current value and no old value.
    pub fn observe<F>(&self, listener: F, fire_immediately: bool) -> Disposer
    where
        F: Fn(&ValueDidChange) + 'static,
    {
        self.observe_with(Rc::new(listener), fire_immediately)
    }

    pub fn observe_with(
        &self,
        listener: Rc<dyn ChangeObserver<ValueDidChange>>,
        fire_immediately: bool,
    ) -> Disposer {
        if fire_immediately {
            listener.on_change(&ValueDidChange {
                new_value: self.value(),
                old_value: None,
            });
        }
        self.listeners.add(listener)
    }

    pub fn has_listeners(&self) -> bool {
        self.listeners.has_entries()
    }

    pub fn has_interceptors(&self) -> bool {
        self.interceptors.has_entries()
    }

    fn report_changed(&self) {
        let next = self.revision.get() + 1;
        self.revision.set(next);
        self.tracker.set(next);
    }
}

impl fmt::Debug for ObservableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("label", &self.label)
            .field("value", &self.value.borrow())
            .field("coercion", &self.coercion)
            .field("revision", &self.revision.get())
            .finish()
    }
}
