//! Property-based invariant tests for the change pipelines.
//!
//! These tests verify invariants that must hold for any sequence of writes:
//!
//! 1. A vetoed write leaves the stored value untouched and fires nothing.
//! 2. A write of the current value fires nothing.
//! 3. Update notifications carry the value before and after commit.
//! 4. A name is bound at most once, whatever the descriptor.
//! 5. Guards run in registration order and the first veto wins.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use spark_objects::{
    reactivate, reset_spy, spy, Administration, ChangeKind, Coercion, ComputedOptions, Disposer,
    Object, ObjectError, PropertyDescriptor, Value,
};

// ── Helpers ─────────────────────────────────────────────────────────────

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(Value::Int),
        "[a-z]{0,6}".prop_map(Value::Str),
    ]
}

fn reactive_field(initial: Value) -> (Object, Rc<Administration>) {
    let obj = Object::new();
    let admin = reactivate(&obj, Some("Prop")).unwrap();
    admin
        .add_observable_prop("v", initial, Coercion::Deep, true)
        .unwrap();
    (obj, admin)
}

/// Counts listener notifications and spy starts.
fn count_events(admin: &Administration) -> (Rc<RefCell<usize>>, Disposer, Disposer) {
    let count = Rc::new(RefCell::new(0));
    let listener_count = count.clone();
    let listener = admin
        .observe(move |_| *listener_count.borrow_mut() += 1, false)
        .unwrap();
    let spy_count = count.clone();
    let spy_handle = spy(move |_| *spy_count.borrow_mut() += 1);
    (count, listener, spy_handle)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Veto purity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn vetoed_writes_have_no_effect(
        initial in scalar_strategy(),
        writes in proptest::collection::vec(scalar_strategy(), 1..20),
    ) {
        reset_spy();
        let (obj, admin) = reactive_field(initial.clone());
        let (count, _listener, _spy) = count_events(&admin);
        let _veto = admin.intercept(|_| None);

        for value in writes {
            prop_assert!(obj.set("v", value).is_ok());
            prop_assert_eq!(obj.peek("v"), Some(initial.clone()));
        }
        prop_assert_eq!(*count.borrow(), 0);
        reset_spy();
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Unchanged short-circuit
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rewriting_current_value_is_silent(value in scalar_strategy(), repeats in 1usize..10) {
        reset_spy();
        let (obj, admin) = reactive_field(value.clone());
        let (count, _listener, _spy) = count_events(&admin);

        for _ in 0..repeats {
            prop_assert!(obj.set("v", value.clone()).is_ok());
        }
        prop_assert_eq!(*count.borrow(), 0);
        reset_spy();
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Notification content
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn notifications_report_before_and_after(
        initial in scalar_strategy(),
        writes in proptest::collection::vec(scalar_strategy(), 1..20),
    ) {
        let (obj, admin) = reactive_field(initial.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let _listener = admin
            .observe(move |c| seen_clone.borrow_mut().push(c.clone()), false)
            .unwrap();

        let mut expected = Vec::new();
        let mut current = initial;
        for value in writes {
            if value != current {
                expected.push((current.clone(), value.clone()));
                current = value.clone();
            }
            obj.set("v", value).unwrap();
        }

        let seen = seen.borrow();
        prop_assert_eq!(seen.len(), expected.len());
        for (change, (old, new)) in seen.iter().zip(expected) {
            prop_assert_eq!(change.kind, ChangeKind::Update);
            prop_assert_eq!(&change.name, "v");
            prop_assert_eq!(change.old_value.clone(), Some(old));
            prop_assert_eq!(change.new_value.clone(), new);
        }
        prop_assert_eq!(obj.peek("v"), Some(current));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Single binding
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn names_bind_once(initial in scalar_strategy(), computed_first in any::<bool>()) {
        let obj = Object::new();
        let admin = reactivate(&obj, None).unwrap();

        if computed_first {
            admin
                .add_computed_prop("p", ComputedOptions::new(|_| Value::Null), true)
                .unwrap();
            let redefined = admin.define_property(
                "p",
                PropertyDescriptor::Value(initial),
                Coercion::Deep,
            );
            let conflict = matches!(redefined, Err(ObjectError::RedefinitionConflict { .. }));
            prop_assert!(conflict);
        } else {
            admin
                .add_observable_prop("p", initial, Coercion::Deep, true)
                .unwrap();
            let redefined = admin.define_property(
                "p",
                PropertyDescriptor::getter(|_| Value::Null),
                Coercion::Deep,
            );
            let conflict = matches!(redefined, Err(ObjectError::RedefinitionConflict { .. }));
            prop_assert!(conflict);
        }
        prop_assert_eq!(admin.keys(), vec!["p".to_string()]);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Guard order and first veto
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn guards_run_in_order_until_first_veto(
        verdicts in proptest::collection::vec(any::<bool>(), 1..8),
    ) {
        let (obj, admin) = reactive_field(Value::Int(0));
        let ran = Rc::new(RefCell::new(Vec::new()));

        let mut guards = Vec::new();
        for (index, allow) in verdicts.iter().copied().enumerate() {
            let ran = ran.clone();
            guards.push(admin.intercept(move |change| {
                ran.borrow_mut().push(index);
                allow.then_some(change)
            }));
        }

        obj.set("v", 1).unwrap();

        let first_veto = verdicts.iter().position(|allow| !allow);
        let expected_ran: Vec<usize> = match first_veto {
            Some(stop) => (0..=stop).collect(),
            None => (0..verdicts.len()).collect(),
        };
        prop_assert_eq!(&*ran.borrow(), &expected_ran);

        let expected_value = if first_veto.is_some() { 0 } else { 1 };
        prop_assert_eq!(obj.peek("v"), Some(Value::Int(expected_value)));
    }
}
