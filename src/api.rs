//! Public entry points.
//!
//! ```ignore
//! use spark_objects::{reactive_object, observe, Value};
//!
//! let point = reactive_object([("x", Value::Int(1)), ("y", Value::Int(2))])?;
//! let _stop = observe(&point, |change| println!("{} changed", change.name))?;
//! point.set("x", 10)?;
//! ```

use std::rc::Rc;

use crate::admin::{Administration, CellRef, PropertyDescriptor};
use crate::cell::Coercion;
use crate::config::config;
use crate::error::{ObjectError, Result};
use crate::object::{next_unique_id, Object, ObjectKind};
use crate::pipeline::{Disposer, ObjectDidChange, ObjectWillChange, ValueDidChange, ValueWillChange};
use crate::types::Value;

// =============================================================================
// Reactivation
// =============================================================================

/// Attach an administration record to `target`, or return the one it has.
///
/// Without a `name` the record is labelled `ObservableObject@N` for plain
/// objects and `<TypeName>@N` for instances.
pub fn reactivate(target: &Object, name: Option<&str>) -> Result<Rc<Administration>> {
    if let Some(admin) = target.administration() {
        return Ok(admin);
    }
    if !target.is_extensible() {
        return Err(ObjectError::NotExtensible {
            object: target.describe(),
        });
    }

    let label = match name {
        Some(name) => name.to_string(),
        None => match target.kind() {
            ObjectKind::Plain => format!("ObservableObject@{}", next_unique_id()),
            ObjectKind::Instance { type_name } => format!("{}@{}", type_name, next_unique_id()),
        },
    };
    let admin = Rc::new(Administration::new(target, label));
    target.attach_administration(Rc::clone(&admin))?;
    tracing::debug!(object = %admin.label(), id = %target.id(), "reactivated");
    Ok(admin)
}

/// Is `value` a reactive object. Runs pending initializers of the object
/// first.
pub fn is_reactive_object(value: &Value) -> bool {
    value.as_object().is_some_and(Object::is_reactive)
}

/// Administration record of a reactive object.
pub fn administration_of(target: &Object) -> Result<Rc<Administration>> {
    target.initialize();
    target.administration().ok_or_else(|| {
        ObjectError::invariant(format!("'{}' is not a reactive object", target.describe()))
    })
}

// =============================================================================
// Construction helpers
// =============================================================================

/// Make `target` reactive and install every entry of `props`.
///
/// Uses the configured default coercion when `coercion` is `None`.
pub fn extend_reactive<K, D, I>(target: &Object, props: I, coercion: Option<Coercion>) -> Result<()>
where
    K: AsRef<str>,
    D: Into<PropertyDescriptor>,
    I: IntoIterator<Item = (K, D)>,
{
    let coercion = coercion.unwrap_or_else(|| config().default_coercion);
    let admin = reactivate(target, None)?;
    for (name, descriptor) in props {
        admin.define_property(name.as_ref(), descriptor.into(), coercion)?;
    }
    Ok(())
}

/// Fresh plain reactive object holding `props`.
pub fn reactive_object<K, D, I>(props: I) -> Result<Object>
where
    K: AsRef<str>,
    D: Into<PropertyDescriptor>,
    I: IntoIterator<Item = (K, D)>,
{
    let object = Object::new();
    extend_reactive(&object, props, None)?;
    Ok(object)
}

/// Assign `name`, installing an observable field if it is not bound yet.
pub fn set_reactive(target: &Object, name: &str, value: impl Into<Value>) -> Result<()> {
    let admin = administration_of(target)?;
    let value = value.into();
    if admin.cell(name).is_some() {
        target.set(name, value)
    } else {
        admin.add_observable_prop(name, value, config().default_coercion, true)
    }
}

// =============================================================================
// Observation
// =============================================================================

/// Observe every committed change on `target`.
pub fn observe<F>(target: &Object, listener: F) -> Result<Disposer>
where
    F: Fn(&ObjectDidChange) + 'static,
{
    administration_of(target)?.observe(listener, false)
}

/// Intercept every pending change on `target`.
pub fn intercept<F>(target: &Object, guard: F) -> Result<Disposer>
where
    F: Fn(ObjectWillChange) -> Option<ObjectWillChange> + 'static,
{
    Ok(administration_of(target)?.intercept(guard))
}

/// Observe a single observable field.
pub fn observe_property<F>(
    target: &Object,
    name: &str,
    listener: F,
    fire_immediately: bool,
) -> Result<Disposer>
where
    F: Fn(&ValueDidChange) + 'static,
{
    let admin = administration_of(target)?;
    match admin.cell(name) {
        Some(CellRef::Observable(cell)) => Ok(cell.observe(listener, fire_immediately)),
        Some(CellRef::Computed(_)) => Err(ObjectError::invariant(format!(
            "'{}.{}' is computed; observe the fields it reads instead",
            admin.label(),
            name
        ))),
        None => Err(admin.unknown(name)),
    }
}

/// Intercept writes to a single observable field.
pub fn intercept_property<F>(target: &Object, name: &str, guard: F) -> Result<Disposer>
where
    F: Fn(ValueWillChange) -> Option<ValueWillChange> + 'static,
{
    let admin = administration_of(target)?;
    match admin.cell(name) {
        Some(CellRef::Observable(cell)) => Ok(cell.intercept(guard)),
        Some(CellRef::Computed(_)) => Err(ObjectError::invariant(format!(
            "'{}.{}' is computed and cannot be intercepted",
            admin.label(),
            name
        ))),
        None => Err(admin.unknown(name)),
    }
}

/// Plain deep copy of `value` with reactive objects turned back into records.
pub fn snapshot(value: &Value) -> Value {
    match value {
        Value::Object(object) => object.snapshot(),
        Value::List(items) => Value::List(items.iter().map(snapshot).collect()),
        Value::Record(fields) => Value::Record(
            fields
                .iter()
                .map(|(name, item)| (name.clone(), snapshot(item)))
                .collect(),
        ),
        other => other.clone(),
    }
}
