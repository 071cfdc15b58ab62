//! Coercion strategies applied to every value entering a value cell.
//!
//! A coercion decides two things: how an incoming value is converted before
//! storage, and which equality test decides that a write is a no-op.
//!
//! | strategy     | conversion                                   | equality   |
//! |--------------|----------------------------------------------|------------|
//! | `Deep`       | records → reactive objects (recursively)     | identity   |
//! | `Shallow`    | records → reactive objects with `Ref` fields | identity   |
//! | `Ref`        | none                                         | identity   |
//! | `Structural` | none (keeps the old value if deep-equal)     | structural |

use std::collections::BTreeMap;

use crate::api::reactivate;
use crate::error::Result;
use crate::object::Object;
use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Coercion {
    #[default]
    Deep,
    Shallow,
    Ref,
    Structural,
}

impl Coercion {
    /// Convert `new_value` for storage in the cell labelled `label`.
    pub fn enhance(self, new_value: Value, old_value: Option<&Value>, label: &str) -> Result<Value> {
        match self {
            Coercion::Deep => deep(new_value, label),
            Coercion::Shallow => match new_value {
                Value::Record(fields) => {
                    Ok(Value::Object(object_from_record(fields, Coercion::Ref, label)?))
                }
                other => Ok(other),
            },
            Coercion::Ref => Ok(new_value),
            Coercion::Structural => Ok(match old_value {
                Some(old) if old.structural_eq(&new_value) => old.clone(),
                _ => new_value,
            }),
        }
    }

    /// Does storing `next` over `current` change nothing.
    pub fn equals(self, current: &Value, next: &Value) -> bool {
        match self {
            Coercion::Structural => current.structural_eq(next),
            Coercion::Deep | Coercion::Shallow | Coercion::Ref => current == next,
        }
    }
}

fn deep(value: Value, label: &str) -> Result<Value> {
    match value {
        Value::Record(fields) => Ok(Value::Object(object_from_record(fields, Coercion::Deep, label)?)),
        Value::List(items) => items
            .into_iter()
            .map(|item| deep(item, label))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        other => Ok(other),
    }
}

/// Turn a plain record into a reactive object whose fields use `coercion`.
pub(crate) fn object_from_record(
    fields: BTreeMap<String, Value>,
    coercion: Coercion,
    label: &str,
) -> Result<Object> {
    let object = Object::new();
    let admin = reactivate(&object, Some(label))?;
    for (name, value) in fields {
        admin.add_observable_prop(&name, value, coercion, true)?;
    }
    Ok(object)
}
