//! Spy layer - change tracing for devtools and logs.
//!
//! Every committed change is bracketed by `spy_report_start` / `spy_report_end`.
//! Start opens a `reactive_change` tracing span that stays entered until the
//! matching end, so writes performed by listeners nest inside it.
//!
//! The layer is enabled when a spy listener is registered or when
//! `Config::trace_changes` is set.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::span::EnteredSpan;

use crate::config::config;
use crate::pipeline::{ChangeKind, ChangeObserver, Disposer, ListenerSet, ObjectDidChange};

/// Event delivered to spy listeners.
#[derive(Debug, Clone)]
pub enum SpyEvent {
    /// A change is about to be committed and broadcast.
    Start {
        object: String,
        change: ObjectDidChange,
    },
    /// The change opened by the latest unmatched `Start` is done.
    End,
}

// =============================================================================
// Thread-local state
// =============================================================================

thread_local! {
    static SPY_LISTENERS: ListenerSet<SpyEvent> = ListenerSet::new();
    static SPAN_STACK: RefCell<Vec<EnteredSpan>> = const { RefCell::new(Vec::new()) };
}

/// Should the router build and report change events.
pub fn is_spy_enabled() -> bool {
    config().trace_changes || SPY_LISTENERS.with(ListenerSet::has_entries)
}

/// Register a spy listener.
pub fn spy<F>(listener: F) -> Disposer
where
    F: Fn(&SpyEvent) + 'static,
{
    spy_with(Rc::new(listener))
}

pub fn spy_with(listener: Rc<dyn ChangeObserver<SpyEvent>>) -> Disposer {
    SPY_LISTENERS.with(|listeners| listeners.add(listener))
}

/// Open the span for `change` on the object labelled `object` and tell
/// listeners.
pub fn spy_report_start(object: &str, change: &ObjectDidChange) {
    let kind = match change.kind {
        ChangeKind::Add => "add",
        ChangeKind::Update => "update",
    };
    let span = tracing::trace_span!(
        "reactive_change",
        object = %object,
        property = %change.name,
        kind = kind
    )
    .entered();
    tracing::trace!(new_value = ?change.new_value, old_value = ?change.old_value, "change");
    SPAN_STACK.with(|stack| stack.borrow_mut().push(span));

    let event = SpyEvent::Start {
        object: object.to_string(),
        change: change.clone(),
    };
    SPY_LISTENERS.with(|listeners| listeners.notify(&event));
}

/// Close the innermost open span and tell listeners.
pub fn spy_report_end() {
    SPY_LISTENERS.with(|listeners| listeners.notify(&SpyEvent::End));
    let span = SPAN_STACK.with(|stack| stack.borrow_mut().pop());
    drop(span);
}

/// Depth of currently open change spans.
pub fn open_spans() -> usize {
    SPAN_STACK.with(|stack| stack.borrow().len())
}

/// Drop all spy listeners and open spans (for testing).
pub fn reset_spy() {
    SPY_LISTENERS.with(ListenerSet::clear);
    SPAN_STACK.with(|stack| {
        while let Some(span) = stack.borrow_mut().pop() {
            drop(span);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{configure, reset_config};
    use crate::object::Object;
    use crate::types::Value;
    use std::cell::RefCell;

    fn setup() {
        reset_spy();
        reset_config();
    }

    fn change(name: &str) -> ObjectDidChange {
        ObjectDidChange {
            kind: ChangeKind::Update,
            object: Object::new(),
            name: name.to_string(),
            new_value: Value::Int(2),
            old_value: Some(Value::Int(1)),
        }
    }

    #[test]
    fn test_disabled_without_listeners_or_config() {
        setup();
        assert!(!is_spy_enabled());

        configure(|c| c.trace_changes = true);
        assert!(is_spy_enabled());
        reset_config();
    }

    #[test]
    fn test_listener_sees_start_and_end() {
        setup();
        let events = Rc::new(RefCell::new(Vec::new()));
        let events_clone = events.clone();
        let disposer = spy(move |event| {
            let tag = match event {
                SpyEvent::Start { object, change } => format!("start {object}.{}", change.name),
                SpyEvent::End => "end".to_string(),
            };
            events_clone.borrow_mut().push(tag);
        });
        assert!(is_spy_enabled());

        spy_report_start("Point@1", &change("x"));
        assert_eq!(open_spans(), 1);
        spy_report_end();
        assert_eq!(open_spans(), 0);

        assert_eq!(*events.borrow(), vec!["start Point@1.x", "end"]);

        disposer.dispose();
        assert!(!is_spy_enabled());
    }

    #[test]
    fn test_spans_nest() {
        setup();
        spy_report_start("A@1", &change("x"));
        spy_report_start("A@1", &change("y"));
        assert_eq!(open_spans(), 2);
        spy_report_end();
        spy_report_end();
        assert_eq!(open_spans(), 0);
    }
}
