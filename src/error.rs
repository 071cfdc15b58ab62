//! Errors raised by object administration.
//!
//! Every error is a synchronous, programmer-error class failure returned to the
//! immediate caller. Nothing here is retried internally, and every operation that
//! returns one of these has made no observable change.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ObjectError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    #[error("cannot make '{object}' reactive: object is not extensible")]
    NotExtensible { object: String },

    #[error("cannot install property '{property}' on '{object}': property is not configurable")]
    PropertyNotConfigurable { object: String, property: String },

    #[error("property '{property}' of '{object}' is already bound and cannot be redefined")]
    RedefinitionConflict { object: String, property: String },

    #[error("'{object}' has no reactive property '{property}'")]
    UnknownProperty { object: String, property: String },

    #[error("property '{property}' of '{object}' is read-only")]
    ReadOnlyProperty { object: String, property: String },

    #[error("invariant violated: {message}")]
    InvariantViolation { message: String },
}

impl ObjectError {
    #[must_use]
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Name of the property involved, if the error concerns one.
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::PropertyNotConfigurable { property, .. }
            | Self::RedefinitionConflict { property, .. }
            | Self::UnknownProperty { property, .. }
            | Self::ReadOnlyProperty { property, .. } => Some(property),
            Self::NotExtensible { .. } | Self::InvariantViolation { .. } => None,
        }
    }
}
