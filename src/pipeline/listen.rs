//! Listener pipeline - post-commit broadcast.
//!
//! Every registered observer receives every change. Delivery order is
//! registration order, but callers must not depend on it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::disposer::Disposer;

/// Post-commit observer of a change.
pub trait ChangeObserver<C> {
    fn on_change(&self, change: &C);
}

impl<C, F> ChangeObserver<C> for F
where
    F: Fn(&C),
{
    fn on_change(&self, change: &C) {
        self(change)
    }
}

type ObserverEntries<C> = Rc<RefCell<Vec<(usize, Rc<dyn ChangeObserver<C>>)>>>;

/// Set of [`ChangeObserver`]s with handle-based removal.
pub struct ListenerSet<C> {
    entries: ObserverEntries<C>,
    next_id: Cell<usize>,
}

impl<C: 'static> ListenerSet<C> {
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    /// Register an observer. Returns the handle that removes it.
    pub fn add(&self, observer: Rc<dyn ChangeObserver<C>>) -> Disposer {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, observer));

        let entries = Rc::downgrade(&self.entries);
        Disposer::new(move || {
            if let Some(entries) = entries.upgrade() {
                entries.borrow_mut().retain(|(observer_id, _)| *observer_id != id);
            }
        })
    }

    #[inline]
    pub fn has_entries(&self) -> bool {
        !self.entries.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_entries()
    }

    /// Deliver `change` to every observer registered at call time.
    pub fn notify(&self, change: &C) {
        let observers: Vec<Rc<dyn ChangeObserver<C>>> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();

        for observer in observers {
            observer.on_change(change);
        }
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl<C: 'static> Default for ListenerSet<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for ListenerSet<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("observers", &self.entries.borrow().len())
            .finish()
    }
}
