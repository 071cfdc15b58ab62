//! Cancellation handles returned by every registration.

use std::cell::RefCell;
use std::fmt;

/// Handle that removes a registered guard, listener or spy.
///
/// Calling [`dispose`](Disposer::dispose) more than once is a no-op. Dropping
/// the handle does NOT deregister; registrations live until disposed or until
/// the pipeline that owns them is dropped.
pub struct Disposer {
    cleanup: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Disposer {
    pub(crate) fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanup: RefCell::new(Some(Box::new(cleanup))),
        }
    }

    /// Deregister. Idempotent.
    pub fn dispose(&self) {
        // Take first so the cleanup may re-enter without a live borrow.
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.cleanup.borrow().is_none()
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
