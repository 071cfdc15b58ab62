//! Change Pipelines
//!
//! Two distinct pipelines carry every change on a reactive object:
//!
//! ```text
//! write → InterceptorChain (ordered, may veto/rewrite) → commit → ListenerSet (broadcast)
//! ```
//!
//! - [`InterceptorChain`] holds [`ChangeGuard`]s. First cancellation wins.
//! - [`ListenerSet`] holds [`ChangeObserver`]s. Every observer sees every change.
//! - Registration returns a [`Disposer`].
//!
//! Both pipelines snapshot their callbacks before dispatch, so callbacks may
//! register, dispose or write to the same object re-entrantly.

pub mod change;
pub mod disposer;
pub mod intercept;
pub mod listen;

pub use change::{ChangeKind, ObjectDidChange, ObjectWillChange, ValueDidChange, ValueWillChange};
pub use disposer::Disposer;
pub use intercept::{ChangeGuard, InterceptorChain};
pub use listen::{ChangeObserver, ListenerSet};
