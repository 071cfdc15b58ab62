//! End-to-end scenarios through the public API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_objects::{
    observe, reactivate, reset_spy, spy, ChangeKind, Coercion, ComputedOptions, Object,
    ObjectError, PropertyDescriptor, SpyEvent, Value,
};
use spark_signals::effect;

fn int(obj: &Object, name: &str) -> i64 {
    obj.get(name).and_then(|v| v.as_int()).unwrap_or(0)
}

#[test]
fn scenario_point_update_notifies_once() {
    let obj = Object::new();
    let admin = reactivate(&obj, Some("Point")).unwrap();
    admin
        .add_observable_prop("x", Value::Int(1), Coercion::Deep, true)
        .unwrap();
    assert_eq!(obj.get("x"), Some(Value::Int(1)));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_clone = seen.clone();
    let _stop = observe(&obj, move |c| seen_clone.borrow_mut().push(c.clone())).unwrap();

    obj.set("x", 2).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].kind, ChangeKind::Update);
    assert_eq!(seen[0].name, "x");
    assert_eq!(seen[0].old_value, Some(Value::Int(1)));
    assert_eq!(seen[0].new_value, Value::Int(2));
}

#[test]
fn scenario_computed_setter_skips_object_guards() {
    let obj = Object::new();
    let admin = reactivate(&obj, Some("Sum")).unwrap();
    admin
        .add_observable_prop("x", Value::Int(2), Coercion::Deep, true)
        .unwrap();
    admin
        .add_observable_prop("y", Value::Int(3), Coercion::Deep, true)
        .unwrap();

    let assigned = Rc::new(RefCell::new(Vec::new()));
    let assigned_clone = assigned.clone();
    admin
        .add_computed_prop(
            "sum",
            ComputedOptions::new(|o| Value::Int(int(o, "x") + int(o, "y"))).with_setter(
                move |_, v| {
                    assigned_clone.borrow_mut().push(v);
                    Ok(())
                },
            ),
            true,
        )
        .unwrap();

    let intercepted = Rc::new(RefCell::new(Vec::new()));
    let intercepted_clone = intercepted.clone();
    let _guard = admin.intercept(move |change| {
        intercepted_clone.borrow_mut().push(change.name.clone());
        Some(change)
    });

    obj.set("sum", 5).unwrap();
    assert!(intercepted.borrow().is_empty());
    assert_eq!(*assigned.borrow(), vec![Value::Int(5)]);
    assert_eq!(obj.get("sum"), Some(Value::Int(5)));

    obj.set("x", 10).unwrap();
    assert_eq!(*intercepted.borrow(), vec!["x".to_string()]);
    assert_eq!(obj.get("sum"), Some(Value::Int(13)));
}

#[test]
fn scenario_interceptor_scales_values() {
    let obj = Object::new();
    let admin = reactivate(&obj, Some("Scaled")).unwrap();
    admin
        .add_observable_prop("x", Value::Int(0), Coercion::Deep, true)
        .unwrap();
    let _guard = admin.intercept(|mut change| {
        if let Some(n) = change.new_value.as_int() {
            change.new_value = Value::Int(n * 10);
        }
        Some(change)
    });

    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_clone = seen.clone();
    let _stop = admin
        .observe(move |c| seen_clone.borrow_mut().push(c.new_value.clone()), false)
        .unwrap();

    obj.set("x", 3).unwrap();
    assert_eq!(obj.get("x"), Some(Value::Int(30)));
    assert_eq!(*seen.borrow(), vec![Value::Int(30)]);
}

#[test]
fn scenario_non_extensible_target_is_rejected() {
    let obj = Object::new();
    obj.prevent_extensions();
    assert!(matches!(
        reactivate(&obj, Some("Frozen")),
        Err(ObjectError::NotExtensible { .. })
    ));
    assert!(obj.administration().is_none());
    assert!(!obj.is_reactive());
}

#[test]
fn write_order_is_trace_commit_notify_trace() {
    reset_spy();
    let obj = Object::new();
    let admin = reactivate(&obj, Some("Ordered")).unwrap();
    admin
        .add_observable_prop("x", Value::Int(1), Coercion::Deep, true)
        .unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));

    let log_spy = log.clone();
    let obj_spy = obj.clone();
    let _spy = spy(move |event| match event {
        SpyEvent::Start { .. } => {
            let visible = obj_spy.peek("x");
            log_spy.borrow_mut().push(format!("trace-start x={visible:?}"));
        }
        SpyEvent::End => log_spy.borrow_mut().push("trace-end".to_string()),
    });

    let log_listener = log.clone();
    let obj_listener = obj.clone();
    let _stop = admin
        .observe(
            move |_| {
                let visible = obj_listener.peek("x");
                log_listener.borrow_mut().push(format!("notify x={visible:?}"));
            },
            false,
        )
        .unwrap();

    obj.set("x", 2).unwrap();
    assert_eq!(
        *log.borrow(),
        vec![
            "trace-start x=Some(Int(1))".to_string(),
            "notify x=Some(Int(2))".to_string(),
            "trace-end".to_string(),
        ]
    );
    reset_spy();
}

#[test]
fn reentrant_writes_from_listener() {
    let obj = Object::new();
    let admin = reactivate(&obj, Some("Mirror")).unwrap();
    admin
        .add_observable_prop("source", Value::Int(0), Coercion::Deep, true)
        .unwrap();
    admin
        .add_observable_prop("mirror", Value::Int(0), Coercion::Deep, true)
        .unwrap();

    let obj_clone = obj.clone();
    let _stop = admin
        .observe(
            move |c| {
                if c.name == "source" {
                    obj_clone.set("mirror", c.new_value.clone()).unwrap();
                }
            },
            false,
        )
        .unwrap();

    obj.set("source", 7).unwrap();
    assert_eq!(obj.get("mirror"), Some(Value::Int(7)));
}

#[test]
fn effects_follow_reactive_fields() {
    let obj = spark_objects::reactive_object([
        ("first", PropertyDescriptor::from("Ada")),
        ("last", PropertyDescriptor::from("Lovelace")),
    ])
    .unwrap();

    let runs = Rc::new(Cell::new(0));
    let full = Rc::new(RefCell::new(String::new()));

    let obj_clone = obj.clone();
    let runs_clone = runs.clone();
    let full_clone = full.clone();
    let _stop = effect(move || {
        let first = obj_clone.get("first").unwrap_or_default();
        let last = obj_clone.get("last").unwrap_or_default();
        *full_clone.borrow_mut() = format!(
            "{} {}",
            first.as_str().unwrap_or(""),
            last.as_str().unwrap_or("")
        );
        runs_clone.set(runs_clone.get() + 1);
    });

    assert_eq!(*full.borrow(), "Ada Lovelace");
    obj.set("last", "King").unwrap();
    assert_eq!(*full.borrow(), "Ada King");

    // Unchanged writes do not re-run effects.
    obj.set("last", "King").unwrap();
    assert_eq!(runs.get(), 2);
}

#[test]
fn handles_see_upgraded_fields() {
    let obj = Object::with_fields([("count", Value::Int(1))]);
    let alias = obj.clone();

    let admin = reactivate(&obj, None).unwrap();
    let current = obj.get("count").unwrap_or_default();
    admin
        .add_observable_prop("count", current, Coercion::Deep, true)
        .unwrap();

    let seen = Rc::new(Cell::new(0));
    let seen_clone = seen.clone();
    let _stop = observe(&obj, move |_| seen_clone.set(seen_clone.get() + 1)).unwrap();

    alias.set("count", 2).unwrap();
    assert_eq!(obj.get("count"), Some(Value::Int(2)));
    assert_eq!(seen.get(), 1);
    assert!(alias.is_accessor("count"));
}
