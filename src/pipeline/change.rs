//! Change payloads flowing through the pipelines.
//!
//! Payloads are built fresh on the caller's stack for every write and are never
//! stored by the administration layer.

use crate::object::Object;
use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Update,
}

/// Pending change on a reactive object, seen by interceptors.
///
/// Guards may rewrite `new_value`; later guards see the replacement.
#[derive(Debug, Clone)]
pub struct ObjectWillChange {
    pub kind: ChangeKind,
    pub object: Object,
    pub name: String,
    pub new_value: Value,
}

impl ObjectWillChange {
    pub(crate) fn add(object: Object, name: &str, new_value: Value) -> Self {
        Self {
            kind: ChangeKind::Add,
            object,
            name: name.to_string(),
            new_value,
        }
    }

    pub(crate) fn update(object: Object, name: &str, new_value: Value) -> Self {
        Self {
            kind: ChangeKind::Update,
            object,
            name: name.to_string(),
            new_value,
        }
    }
}

/// Committed change on a reactive object, seen by listeners and spies.
#[derive(Debug, Clone)]
pub struct ObjectDidChange {
    pub kind: ChangeKind,
    pub object: Object,
    pub name: String,
    /// Stored value after commit (post coercion, post interception).
    pub new_value: Value,
    /// Stored value before commit. Always `None` for `Add`.
    pub old_value: Option<Value>,
}

/// Pending write on a single value cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueWillChange {
    pub new_value: Value,
}

/// Committed write on a single value cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDidChange {
    pub new_value: Value,
    /// `None` when delivered by `fire_immediately`.
    pub old_value: Option<Value>,
}
