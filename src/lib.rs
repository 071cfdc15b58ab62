//! # spark-objects
//!
//! Reactive object administration for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for dependency tracking.
//!
//! ## Architecture
//!
//! A host [`Object`] is a shared handle to a property table. Making it reactive
//! attaches an [`Administration`] record that binds field names to cells and
//! replaces the fields with generic accessors:
//!
//! ```text
//! Object.set(name) → Accessor → Administration.write → guards → cell → listeners
//! Object.get(name) → Accessor → Administration.read  → cell (tracked by spark-signals)
//! ```
//!
//! Every change runs through two pipelines: interceptors (ordered, may veto
//! or rewrite) before commit, listeners after it. The spy layer brackets each
//! committed change with a `tracing` span.
//!
//! ## Modules
//!
//! - [`object`] - Host objects, property flags, integrity, identity registry
//! - [`admin`] - Administration record, installer, mutation router, accessors
//! - [`cell`] - Value and computed cells, coercion strategies
//! - [`pipeline`] - Interceptor chains, listener sets, disposers, change payloads
//! - [`spy`] - Change tracing
//! - [`config`] - Per-thread runtime options
//! - [`api`] - Entry points (`reactivate`, `observe`, `intercept`, ...)

pub mod admin;
pub mod api;
pub mod cell;
pub mod config;
pub mod error;
pub mod object;
pub mod pipeline;
pub mod spy;
pub mod types;

// Re-export commonly used items
pub use types::Value;

pub use error::{ObjectError, Result};

pub use config::{config, configure, reset_config, Config};

pub use object::{
    live_administrations, next_unique_id, Integrity, Object, ObjectId, ObjectKind, PropertyFlags,
    WeakObject,
};

pub use object::registry::reset_registry;

pub use admin::{Administration, CellRef, ModifiedValue, PropertyDescriptor};

pub use cell::{Coercion, ComputedOptions, ComputedValue, ObservableValue};

pub use pipeline::{
    ChangeGuard, ChangeKind, ChangeObserver, Disposer, ObjectDidChange, ObjectWillChange,
    ValueDidChange, ValueWillChange,
};

pub use spy::{is_spy_enabled, reset_spy, spy, SpyEvent};

pub use api::{
    administration_of, extend_reactive, intercept, intercept_property, is_reactive_object,
    observe, observe_property, reactivate, reactive_object, set_reactive, snapshot,
};
