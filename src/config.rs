//! Per-thread runtime configuration.
//!
//! ```ignore
//! use spark_objects::{configure, Coercion};
//!
//! configure(|c| {
//!     c.default_coercion = Coercion::Ref;
//!     c.trace_changes = true;
//! });
//! ```

use std::cell::RefCell;

use crate::cell::Coercion;

/// Runtime options shared by every object created on this thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Coercion used by `reactive_object` / `extend_reactive` when the caller
    /// does not pick one.
    pub default_coercion: Coercion,
    /// Report changes to the spy layer (and emit `tracing` spans) even when no
    /// spy listener is registered.
    pub trace_changes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_coercion: Coercion::Deep,
            trace_changes: false,
        }
    }
}

thread_local! {
    static CONFIG: RefCell<Config> = RefCell::new(Config::default());
}

/// Current configuration (copy).
pub fn config() -> Config {
    CONFIG.with(|c| c.borrow().clone())
}

/// Update the configuration in place.
pub fn configure(f: impl FnOnce(&mut Config)) {
    CONFIG.with(|c| f(&mut c.borrow_mut()));
    tracing::debug!(config = ?config(), "configuration updated");
}

/// Restore defaults (for testing).
pub fn reset_config() {
    CONFIG.with(|c| *c.borrow_mut() = Config::default());
}
