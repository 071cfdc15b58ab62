//! Interception pipeline - ordered, short-circuiting guards.
//!
//! Guards run in registration order. Each receives the pending change and
//! returns `Some(change)` to continue (possibly with a rewritten value) or
//! `None` to cancel. The first cancellation wins and the remaining guards do
//! not run.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::disposer::Disposer;

/// Pre-commit veto/transform hook on a pending change.
pub trait ChangeGuard<C> {
    fn intercept(&self, change: C) -> Option<C>;
}

impl<C, F> ChangeGuard<C> for F
where
    F: Fn(C) -> Option<C>,
{
    fn intercept(&self, change: C) -> Option<C> {
        self(change)
    }
}

type GuardEntries<C> = Rc<RefCell<Vec<(usize, Rc<dyn ChangeGuard<C>>)>>>;

/// Ordered chain of [`ChangeGuard`]s with handle-based removal.
pub struct InterceptorChain<C> {
    entries: GuardEntries<C>,
    next_id: Cell<usize>,
}

impl<C: 'static> InterceptorChain<C> {
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    /// Append a guard. Returns the handle that removes it.
    pub fn add(&self, guard: Rc<dyn ChangeGuard<C>>) -> Disposer {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, guard));

        let entries = Rc::downgrade(&self.entries);
        Disposer::new(move || {
            if let Some(entries) = entries.upgrade() {
                entries.borrow_mut().retain(|(guard_id, _)| *guard_id != id);
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

    /// Run the chain. `None` means a guard cancelled the change.
    pub fn run(&self, change: C) -> Option<C> {
        if !self.has_entries() {
            return Some(change);
        }

        // Snapshot so guards may register, dispose or write re-entrantly.
        let guards: Vec<Rc<dyn ChangeGuard<C>>> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, guard)| Rc::clone(guard))
            .collect();

        let mut change = change;
        for guard in guards {
            change = guard.intercept(change)?;
        }
        Some(change)
    }
}

impl<C: 'static> Default for InterceptorChain<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for InterceptorChain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("guards", &self.entries.borrow().len())
            .finish()
    }
}
