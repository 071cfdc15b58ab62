//! Administration Record - per-object registry of reactive cells.
//!
//! Each reactive object carries exactly one [`Administration`] in its hidden
//! slot. The record binds property names to cells, owns the object-level
//! interception and listener pipelines and is what the generic accessors
//! resolve against at call time.
//!
//! ```text
//! Object ──(hidden slot, strong)──► Administration
//!    ▲                                 │ owner (weak)
//!    └─────────────────────────────────┘
//! ```
//!
//! Submodules:
//! - [`install`] - property installation (`define_property`, `add_*_prop`)
//! - [`router`] - write path for observable fields
//! - [`accessor`] - memoized generic accessors

pub mod accessor;
pub mod install;
pub mod router;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use spark_signals::{signal, untrack, Signal};

use crate::cell::{ComputedValue, ObservableValue};
use crate::error::{ObjectError, Result};
use crate::object::{registry, Object, WeakObject};
use crate::pipeline::{
    ChangeGuard, ChangeObserver, Disposer, InterceptorChain, ListenerSet, ObjectDidChange,
    ObjectWillChange,
};
use crate::types::Value;

pub use install::{ModifiedValue, PropertyDescriptor};

/// A cell bound to a property name.
#[derive(Debug, Clone)]
pub enum CellRef {
    Observable(Rc<ObservableValue>),
    Computed(Rc<ComputedValue>),
}

impl CellRef {
    /// Tracked read.
    pub fn get(&self) -> Value {
        match self {
            CellRef::Observable(cell) => cell.get(),
            CellRef::Computed(cell) => cell.get(),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, CellRef::Computed(_))
    }
}

#[derive(Default)]
struct CellTable {
    order: Vec<String>,
    by_name: HashMap<String, CellRef>,
}

pub struct Administration {
    owner: WeakObject,
    label: String,
    cells: RefCell<CellTable>,
    keys_revision: Cell<u64>,
    keys_tracker: Signal<u64>,
    interceptors: InterceptorChain<ObjectWillChange>,
    listeners: ListenerSet<ObjectDidChange>,
}

impl Administration {
    pub(crate) fn new(owner: &Object, label: impl Into<String>) -> Self {
        registry::administration_created();
        Self {
            owner: owner.downgrade(),
            label: label.into(),
            cells: RefCell::new(CellTable::default()),
            keys_revision: Cell::new(0),
            keys_tracker: signal(0),
            interceptors: InterceptorChain::new(),
            listeners: ListenerSet::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The object this record administers. `None` only while the object is
    /// being torn down.
    pub fn owner(&self) -> Option<Object> {
        self.owner.upgrade()
    }

    pub(crate) fn owner_or_err(&self) -> Result<Object> {
        self.owner.upgrade().ok_or_else(|| {
            ObjectError::invariant(format!("object '{}' is no longer alive", self.label))
        })
    }

    // =========================================================================
    // Pipelines
    // =========================================================================

    /// Register an object-level listener.
    ///
    /// Object-level observation cannot fire immediately; that request fails
    /// with `InvariantViolation`. Per-property observation supports it.
    pub fn observe<F>(&self, listener: F, fire_immediately: bool) -> Result<Disposer>
    where
        F: Fn(&ObjectDidChange) + 'static,
    {
        self.observe_with(Rc::new(listener), fire_immediately)
    }

    pub fn observe_with(
        &self,
        listener: Rc<dyn ChangeObserver<ObjectDidChange>>,
        fire_immediately: bool,
    ) -> Result<Disposer> {
        if fire_immediately {
            return Err(ObjectError::invariant(format!(
                "'{}': observing a whole object does not support fire_immediately",
                self.label
            )));
        }
        Ok(self.listeners.add(listener))
    }

    /// Register an object-level guard. Guards run in registration order.
    pub fn intercept<F>(&self, guard: F) -> Disposer
    where
        F: Fn(ObjectWillChange) -> Option<ObjectWillChange> + 'static,
    {
        self.intercept_with(Rc::new(guard))
    }

    pub fn intercept_with(&self, guard: Rc<dyn ChangeGuard<ObjectWillChange>>) -> Disposer {
        self.interceptors.add(guard)
    }

    #[inline]
    pub fn has_listeners(&self) -> bool {
        self.listeners.has_entries()
    }

    #[inline]
    pub fn has_interceptors(&self) -> bool {
        self.interceptors.has_entries()
    }

    // =========================================================================
    // Cells
    // =========================================================================

    /// Is a cell bound to `name`. Tracked on the key set.
    pub fn has(&self, name: &str) -> bool {
        let _ = self.keys_tracker.get();
        self.cells.borrow().by_name.contains_key(name)
    }

    /// Bound names in installation order. Tracked on the key set, so a
    /// derived reading it re-runs when a property is added.
    pub fn keys(&self) -> Vec<String> {
        let _ = self.keys_tracker.get();
        self.cells.borrow().order.clone()
    }

    pub fn cell(&self, name: &str) -> Option<CellRef> {
        self.cells.borrow().by_name.get(name).cloned()
    }

    /// Tracked read of the cell bound to `name`.
    pub fn read(&self, name: &str) -> Option<Value> {
        let cell = self.cell(name)?;
        Some(cell.get())
    }

    /// Untracked read. Computed cells are read through their cache.
    pub fn peek(&self, name: &str) -> Option<Value> {
        match self.cell(name)? {
            CellRef::Observable(cell) => Some(cell.value()),
            CellRef::Computed(cell) => Some(untrack(|| cell.get())),
        }
    }

    /// Bind `name` to `cell`. A name is bound at most once.
    pub(crate) fn bind(&self, name: &str, cell: CellRef) -> Result<()> {
        {
            let mut cells = self.cells.borrow_mut();
            if cells.by_name.contains_key(name) {
                drop(cells);
                return Err(self.redefinition(name));
            }
            cells.order.push(name.to_string());
            cells.by_name.insert(name.to_string(), cell);
        }
        let next = self.keys_revision.get() + 1;
        self.keys_revision.set(next);
        self.keys_tracker.set(next);
        Ok(())
    }

    pub(crate) fn interceptors(&self) -> &InterceptorChain<ObjectWillChange> {
        &self.interceptors
    }

    pub(crate) fn listeners(&self) -> &ListenerSet<ObjectDidChange> {
        &self.listeners
    }

    // =========================================================================
    // Errors
    // =========================================================================

    pub(crate) fn redefinition(&self, name: &str) -> ObjectError {
        tracing::debug!(object = %self.label, property = name, "redefinition conflict");
        ObjectError::RedefinitionConflict {
            object: self.label.clone(),
            property: name.to_string(),
        }
    }

    pub(crate) fn unknown(&self, name: &str) -> ObjectError {
        ObjectError::UnknownProperty {
            object: self.label.clone(),
            property: name.to_string(),
        }
    }
}

impl Drop for Administration {
    fn drop(&mut self) {
        registry::administration_dropped();
    }
}

impl fmt::Debug for Administration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Administration")
            .field("label", &self.label)
            .field("keys", &self.cells.borrow().order)
            .field("interceptors", &self.interceptors.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
